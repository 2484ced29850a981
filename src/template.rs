//! Defines the page [`Template`]: an HTML file with literal placeholders that
//! are replaced with the rendered post and its sidebars. This is plain text
//! substitution; placeholders appearing inside substituted content are
//! replaced as well.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use serde::Deserialize;
use thiserror::Error;

pub const CONTENT: &str = "$#content#$";
pub const TITLE: &str = "$#title#$";
pub const DATE: &str = "$#date#$";
pub const POSTS: &str = "$#posts#$";
pub const TAGS: &str = "$#tags#$";
pub const TAG_LIST: &str = "$#taglist#$";

/// The generated pieces of a page, one per placeholder.
#[derive(Clone, Debug, Default)]
pub struct Page<'a> {
    /// The converted post body (`$#content#$`).
    pub content: &'a str,

    /// The post title (`$#title#$`).
    pub title: &'a str,

    /// The date block, see [`date_block`] (`$#date#$`).
    pub date: &'a str,

    /// The archive sidebar (`$#posts#$`).
    pub posts: &'a str,

    /// The tag sidebar (`$#tags#$`).
    pub tags: &'a str,

    /// The post's own tags as a flat list (`$#taglist#$`).
    pub tag_list: &'a str,
}

/// A loaded template.
#[derive(Clone, Debug)]
pub struct Template {
    text: String,
}

impl Template {
    /// Reads the template file at `path`.
    pub fn load(path: &Path) -> Result<Template> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Template { text }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(Error::TemplateMissing(path.to_owned()))
            }
            Err(err) => Err(Error::Io {
                path: path.to_owned(),
                err,
            }),
        }
    }

    /// Fills in every placeholder. Substitution happens in a fixed order:
    /// content, title, date, posts, tags, tag list.
    pub fn fill(&self, page: &Page) -> String {
        self.text
            .replace(CONTENT, page.content)
            .replace(TITLE, page.title)
            .replace(DATE, page.date)
            .replace(POSTS, page.posts)
            .replace(TAGS, page.tags)
            .replace(TAG_LIST, page.tag_list)
    }
}

impl From<String> for Template {
    fn from(text: String) -> Template {
        Template { text }
    }
}

/// The captions of the date block.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Labels {
    pub created: String,
    pub modified: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            created: String::from("Oluşturulma Zamanı"),
            modified: String::from("Değiştirilme Zamanı"),
        }
    }
}

/// Renders the creation and modification dates of a post, one component per
/// line:
///
/// ```html
/// <p>Created<br/>2024-01-31<br/>20:15:00<br/>UTC+0300</p><p>Modified<br/>...</p>
/// ```
///
/// `creation_date` is the stored creation date, whose `\` separators become
/// line breaks.
pub fn date_block<Tz: TimeZone>(
    labels: &Labels,
    creation_date: &str,
    modified: &DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "<p>{}<br/>{}</p><p>{}<br/>{}</p>",
        labels.created,
        creation_date.replace('\\', "<br/>"),
        labels.modified,
        modified.format("%Y-%m-%d<br/>%H:%M:%S<br/>UTC%z"),
    )
}

/// The result of a fallible template operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a template.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the template file doesn't exist.
    #[error("template `{}` not found", .0.display())]
    TemplateMissing(PathBuf),

    /// Returned for other I/O errors.
    #[error("reading template `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}
