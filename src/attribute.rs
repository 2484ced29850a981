//! Defines the [`PostAttribute`] type and the logic for reading a post's
//! header line. Every post begins with a single-line HTML comment declaring
//! its title and tags:
//!
//! ```md
//! <!-- Hello, world!; greet, meta -->
//! # Hello
//!
//! World
//! ```
//!
//! The `title=` and `tags=` keys may optionally be spelled out, so
//! `<!-- title=Hello; tags=a,b -->` is equivalent to `<!-- Hello; a, b -->`.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Opens the header comment.
pub const HEADER_OPEN: &str = "<!--";

/// Closes the header comment.
pub const HEADER_CLOSE: &str = "-->";

/// The title and tags declared on a post's first line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostAttribute {
    /// The title of the post. May be empty.
    pub title: String,

    /// The tags, in the order they were written.
    pub tags: Vec<String>,
}

impl PostAttribute {
    /// Reads the first line of `path` and parses it with
    /// [`PostAttribute::parse`]. Nothing past the first line is read.
    pub fn from_file(path: &Path) -> Result<PostAttribute> {
        let mut line = String::new();
        BufReader::new(File::open(path).map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?)
        .read_line(&mut line)
        .map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;

        PostAttribute::parse(&line).ok_or_else(|| Error::MalformedHeader {
            path: path.to_owned(),
            line: line.trim_end().to_owned(),
        })
    }

    /// Parses a header line. Returns [`None`] if the line isn't wrapped in
    /// [`HEADER_OPEN`] and [`HEADER_CLOSE`].
    pub fn parse(line: &str) -> Option<PostAttribute> {
        let line = line.trim_start_matches('\u{feff}').trim();
        let inner = line
            .strip_prefix(HEADER_OPEN)?
            .strip_suffix(HEADER_CLOSE)?
            .trim();

        // Fields past the second `;` are ignored.
        let mut fields = inner.split(';').map(str::trim);
        let title = fields.next().unwrap_or_default();
        let title = strip_key(title, "title");
        let tags = match fields.next().map(|tags| strip_key(tags, "tags")) {
            None | Some("") => Vec::new(),
            Some(tags) => tags.split(',').map(|t| t.trim().to_owned()).collect(),
        };

        Some(PostAttribute {
            title: title.to_owned(),
            tags,
        })
    }
}

/// Strips an optional `key=` prefix off a header field.
fn strip_key<'a>(field: &'a str, key: &str) -> &'a str {
    match field.strip_prefix(key).and_then(|rest| rest.strip_prefix('=')) {
        Some(rest) => rest.trim(),
        None => field,
    }
}

/// Represents the result of reading a post header.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading a post header.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the first line of a post isn't a header comment.
    #[error("post `{}` has no `<!-- title; tags -->` header: {line:?}", .path.display())]
    MalformedHeader { path: PathBuf, line: String },

    /// Returned for I/O errors while reading the post.
    #[error("reading post `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;

    fn attribute(title: &str, tags: &[&str]) -> PostAttribute {
        PostAttribute {
            title: title.to_owned(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_title_and_tags() {
        assert_eq!(
            PostAttribute::parse("<!-- Hello, world!; greet , meta -->\n"),
            Some(attribute("Hello, world!", &["greet", "meta"]))
        );
    }

    #[test]
    fn test_parse_keyed_fields() {
        assert_eq!(
            PostAttribute::parse("<!-- title=Hello; tags=a,b -->"),
            Some(attribute("Hello", &["a", "b"]))
        );
    }

    #[test]
    fn test_parse_title_only() {
        assert_eq!(
            PostAttribute::parse("<!--Lonely-->"),
            Some(attribute("Lonely", &[]))
        );
        assert_eq!(
            PostAttribute::parse("<!-- Lonely; -->"),
            Some(attribute("Lonely", &[]))
        );
    }

    #[test]
    fn test_parse_keeps_written_order() {
        assert_eq!(
            PostAttribute::parse("<!-- T; zeta, alpha, zeta -->"),
            Some(attribute("T", &["zeta", "alpha", "zeta"]))
        );
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        assert_eq!(
            PostAttribute::parse("<!-- T; a; ignored -->"),
            Some(attribute("T", &["a"]))
        );
    }

    #[test]
    fn test_parse_strips_bom() {
        assert_eq!(
            PostAttribute::parse("\u{feff}<!-- T; a -->\r\n"),
            Some(attribute("T", &["a"]))
        );
    }

    #[test]
    fn test_parse_rejects_missing_markers() {
        assert_eq!(PostAttribute::parse("# Just a heading"), None);
        assert_eq!(PostAttribute::parse("<!-- unterminated"), None);
        assert_eq!(PostAttribute::parse(""), None);
    }

    #[test]
    fn test_from_file_reads_first_line_only() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        std::fs::write(&path, "<!-- First; one -->\n<!-- Second; two -->\n").unwrap();
        assert_eq!(
            PostAttribute::from_file(&path)?,
            attribute("First", &["one"])
        );
        Ok(())
    }

    #[test]
    fn test_from_file_malformed_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        std::fs::write(&path, "# No header\n").unwrap();
        match PostAttribute::from_file(&path) {
            Err(Error::MalformedHeader { line, .. }) => assert_eq!(line, "# No header"),
            other => panic!("expected MalformedHeader, got {:?}", other),
        }
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = PostAttribute::from_file(&dir.path().join("absent.md"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
