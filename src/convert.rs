//! Converts post bodies to HTML. The [`Converter`] trait is the seam between
//! the compiler and whatever turns a post file into markup:
//! [`CommandConverter`] runs an external program (`pandoc` by default) and
//! [`MarkdownConverter`] renders Markdown in-process with [`pulldown_cmark`].

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use pulldown_cmark::{html, Options, Parser};
use thiserror::Error;
use tracing::debug;

/// Renders a post file into an HTML fragment.
pub trait Converter {
    fn render(&self, file: &Path) -> Result<String>;
}

/// Runs `{program} {args..} [--from {mode}] {file}` and captures its
/// standard output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandConverter {
    pub program: String,
    pub args: Vec<String>,

    /// The input format, passed as `--from {mode}` when present.
    pub mode: Option<String>,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>) -> CommandConverter {
        CommandConverter {
            program: program.into(),
            args: Vec::new(),
            mode: None,
        }
    }

    /// The full argument list for `file`.
    fn arguments(&self, file: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        if let Some(mode) = &self.mode {
            args.push(OsString::from("--from"));
            args.push(OsString::from(mode));
        }
        args.push(file.as_os_str().to_owned());
        args
    }
}

impl Default for CommandConverter {
    fn default() -> Self {
        CommandConverter::new("pandoc")
    }
}

impl Converter for CommandConverter {
    /// Runs the program to completion. Failing to start it and a non-zero
    /// exit status are both [`Error::ConverterFailed`]. Output that isn't
    /// valid UTF-8 is decoded lossily.
    fn render(&self, file: &Path) -> Result<String> {
        let args = self.arguments(file);
        debug!(program = %self.program, ?args, "running converter");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|err| Error::ConverterFailed {
                program: self.program.clone(),
                reason: format!("could not start: {}", err),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ConverterFailed {
                program: self.program.clone(),
                reason: match stderr.trim() {
                    "" => format!("{}", output.status),
                    stderr => format!("{}: {}", output.status, stderr),
                },
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Renders Markdown with [`pulldown_cmark`], with tables, footnotes,
/// strikethrough, task lists and smart punctuation enabled. Raw HTML,
/// including the header comment, passes through untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    /// Renders a Markdown string.
    pub fn render_str(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, Parser::new_ext(markdown, options));
        out
    }
}

impl Converter for MarkdownConverter {
    fn render(&self, file: &Path) -> Result<String> {
        let markdown = fs::read_to_string(file).map_err(|err| Error::Io {
            path: file.to_owned(),
            err,
        })?;
        Ok(self.render_str(&markdown))
    }
}

/// The result of a fallible conversion.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error converting a post.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the external converter can't be run or exits with a
    /// failure status.
    #[error("converter `{program}` failed: {reason}")]
    ConverterFailed { program: String, reason: String },

    /// Returned when the post can't be read.
    #[error("reading post `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}
