//! Exports the functions that stitch together the high-level steps of
//! compiling a post: reading its header ([`crate::attribute`]), updating the
//! index ([`crate::index`]), folding the index into navigation trees
//! ([`crate::tree`]), rendering the sidebars ([`crate::htmlrenderer`]),
//! converting the body ([`crate::convert`]) and filling in the template
//! ([`crate::template`]).
//!
//! Each command loads the index, changes it in memory and saves it back only
//! if something changed, so recompiling an unchanged post leaves the index
//! file untouched.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::attribute::{self, PostAttribute};
use crate::config::Config;
use crate::convert::{self, Converter};
use crate::htmlrenderer::{posts_sidebar, tag_list, tags_sidebar};
use crate::index::{self, index_key, Change, IndexEntry, PostDate, PostIndex};
use crate::template::{self, date_block, Page, Template};
use crate::tree::{post_location, ChronologicalTree, TagTree};

/// A post file on disk together with its index key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostSource {
    /// The post's path relative to the project root, `/`-separated.
    pub key: String,

    /// Where to read the post from.
    pub path: PathBuf,
}

impl PostSource {
    /// Resolves `file` (absolute, or relative to the working directory)
    /// against the project root. Both are canonicalized first, so every
    /// spelling of a post's path (`..` components, symlinked directories)
    /// yields the same key. Posts outside the root are keyed by the path as
    /// given.
    pub fn locate(config: &Config, file: &Path) -> Result<PostSource> {
        if !file.is_file() {
            return Err(Error::PostNotFound(file.to_owned()));
        }

        let absolute = fs::canonicalize(file)?;
        let root = match fs::canonicalize(&config.root_directory) {
            Ok(root) => root,
            Err(err) => {
                debug!(root = %config.root_directory.display(), %err, "project root not found");
                env::current_dir()?.join(&config.root_directory)
            }
        };
        let key = match absolute.strip_prefix(&root) {
            Ok(relative) => index_key(relative),
            Err(_) => index_key(file),
        };

        Ok(PostSource {
            key,
            path: file.to_owned(),
        })
    }
}

/// Counts what [`scan_posts`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,

    /// Files without a valid header.
    pub skipped: usize,
}

/// Reads the header of `source` and records it in `index` (in memory only).
/// Returns the header and dates alongside the change so callers rendering
/// the post don't have to read them again.
fn record(
    config: &Config,
    index: &mut PostIndex,
    source: &PostSource,
) -> Result<(Change, PostAttribute, PostDate)> {
    let attribute = PostAttribute::from_file(&source.path)?;
    let date = index.date(&source.key, &source.path)?;
    let entry = IndexEntry::new(
        source.key.clone(),
        date.creation_date.clone(),
        attribute.title.clone(),
        attribute.tags.clone(),
    )
    .with_sorted_tags(&config.collator);

    let change = index.insert_or_update(entry);
    debug!(file = %source.key, ?change, "recorded post");
    Ok((change, attribute, date))
}

/// Adds or refreshes the index entry for `file` without rendering anything.
pub fn index_post(config: &Config, file: &Path) -> Result<Change> {
    let source = PostSource::locate(config, file)?;
    let mut index = PostIndex::load(&config.index_file)?;
    let (change, _, _) = record(config, &mut index, &source)?;
    if change.is_changed() {
        index.save()?;
    }
    Ok(change)
}

/// Compiles `file` into the HTML page `output`, updating the index on the
/// way. The template is loaded before anything else so a missing template
/// fails before the index is touched.
pub fn build_post(
    config: &Config,
    converter: &dyn Converter,
    file: &Path,
    output: &Path,
) -> Result<()> {
    let template = Template::load(&config.template)?;
    let source = PostSource::locate(config, file)?;

    let mut index = PostIndex::load(&config.index_file)?;
    let (change, attribute, date) = record(config, &mut index, &source)?;
    if change.is_changed() {
        index.save()?;
    }

    // The entry's tags are sorted and deduplicated, unlike the header's.
    let tags = index
        .get(&source.key)
        .map(|entry| entry.tags.clone())
        .unwrap_or_default();

    let chronological = ChronologicalTree::build(index.entries(), &config.posts_root);
    let posts = posts_sidebar(
        &chronological,
        post_location(&source.key, &config.posts_root),
        &config.posts_root,
    );
    let tag_tree = TagTree::build(index.entries());
    let tags_html = tags_sidebar(&tag_tree, &config.collator, &tags);

    let content = converter.render(&source.path)?;
    let date_html = date_block(&config.labels, &date.creation_date, &date.modified);
    let flat_tags = tag_list(&tags);

    let html = template.fill(&Page {
        content: &content,
        title: &attribute.title,
        date: &date_html,
        posts: &posts,
        tags: &tags_html,
        tag_list: &flat_tags,
    });

    write_output(output, &html)?;
    info!(post = %source.key, output = %output.display(), "compiled post");
    Ok(())
}

/// Walks the posts root and indexes every file with the configured
/// extension. Files without a header are skipped with a warning. The index
/// is saved once, at the end, if anything changed.
pub fn scan_posts(config: &Config) -> Result<ScanSummary> {
    let posts_root = config.root_directory.join(&config.posts_root);
    let mut index = PostIndex::load(&config.index_file)?;
    let mut summary = ScanSummary::default();

    for result in WalkDir::new(&posts_root).sort_by_file_name() {
        let entry = result?;
        let is_post = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .map_or(false, |ext| ext == config.post_extension.as_str());
        if !is_post {
            continue;
        }

        let source = PostSource::locate(config, entry.path())?;
        match record(config, &mut index, &source) {
            Ok((Change::Inserted, _, _)) => summary.inserted += 1,
            Ok((Change::Updated, _, _)) => summary.updated += 1,
            Ok((Change::Unchanged, _, _)) => summary.unchanged += 1,
            Err(Error::Attribute(err @ attribute::Error::MalformedHeader { .. })) => {
                warn!("skipping {}", err);
                summary.skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    if summary.inserted + summary.updated > 0 {
        index.save()?;
    }
    Ok(summary)
}

/// Merges the index files `inputs` into the index at `target` (the
/// configured index when [`None`]). Returns the number of entries added.
pub fn merge_indices(config: &Config, inputs: &[PathBuf], target: Option<&Path>) -> Result<usize> {
    let sources = inputs
        .iter()
        .map(|input| match input.is_file() {
            true => Ok(PostIndex::load(input)?),
            false => Err(Error::IndexNotFound(input.to_owned())),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut index = PostIndex::load(target.unwrap_or(config.index_file.as_path()))?;
    let added = index.merge(sources);
    if added > 0 {
        index.save()?;
    }
    Ok(added)
}

/// Writes `html` to `output`, creating its parent directories.
fn write_output(output: &Path, html: &str) -> Result<()> {
    let write_error = |err| Error::Write {
        path: output.to_owned(),
        err,
    };
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
    }
    fs::write(output, html).map_err(write_error)
}

/// The result of a build step.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for compiling posts. Wraps the errors of every step.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the post to compile or index doesn't exist.
    #[error("post `{}` not found", .0.display())]
    PostNotFound(PathBuf),

    /// Returned when an index file to merge doesn't exist.
    #[error("index `{}` not found", .0.display())]
    IndexNotFound(PathBuf),

    /// Returned for errors reading a post header.
    #[error(transparent)]
    Attribute(#[from] attribute::Error),

    /// Returned for errors loading or saving the index.
    #[error(transparent)]
    Index(#[from] index::Error),

    /// Returned for errors converting the post body.
    #[error(transparent)]
    Convert(#[from] convert::Error),

    /// Returned for errors loading the template.
    #[error(transparent)]
    Template(#[from] template::Error),

    /// Returned when the output page can't be written.
    #[error("writing `{}`: {err}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when the posts directory can't be walked.
    #[error("scanning posts: {0}")]
    Walk(#[from] walkdir::Error),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] io::Error),
}
