//! Loads the project configuration from an optional `almanac.yaml`. Every key
//! is optional; a project without the file uses the defaults relative to the
//! working directory.
//!
//! ```yaml
//! index_file: post-index.csv
//! template: template.html
//! posts_root: posts
//! post_extension: md
//! locale: tr_TR
//! labels:
//!   created: Created
//!   modified: Modified
//! converter:
//!   kind: command
//!   program: pandoc
//!   mode: markdown
//! ```

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::collate::Collator;
use crate::convert::{CommandConverter, Converter, MarkdownConverter};
use crate::template::Labels;

/// The name of the project file.
pub const PROJECT_FILE: &str = "almanac.yaml";

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Project {
    index_file: PathBuf,
    template: PathBuf,
    posts_root: String,
    post_extension: String,
    locale: String,
    labels: Labels,
    converter: ConverterConfig,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            index_file: PathBuf::from("post-index.csv"),
            template: PathBuf::from("template.html"),
            posts_root: String::from("posts"),
            post_extension: String::from("md"),
            locale: String::from("tr_TR"),
            labels: Labels::default(),
            converter: ConverterConfig::default(),
        }
    }
}

/// Selects the [`Converter`] implementation.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConverterConfig {
    /// An external program, see [`CommandConverter`].
    Command {
        #[serde(default = "default_program")]
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        mode: Option<String>,
    },

    /// The built-in [`MarkdownConverter`].
    Markdown,
}

fn default_program() -> String {
    String::from("pandoc")
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig::Command {
            program: default_program(),
            args: Vec::new(),
            mode: None,
        }
    }
}

impl ConverterConfig {
    /// Instantiates the configured converter.
    pub fn build(&self) -> Box<dyn Converter> {
        match self {
            ConverterConfig::Command {
                program,
                args,
                mode,
            } => Box::new(CommandConverter {
                program: program.clone(),
                args: args.clone(),
                mode: mode.clone(),
            }),
            ConverterConfig::Markdown => Box::new(MarkdownConverter),
        }
    }
}

/// The resolved configuration. All paths are absolute or relative to the
/// working directory.
#[derive(Clone, Debug)]
pub struct Config {
    /// The project root. Index keys are post paths relative to it.
    pub root_directory: PathBuf,

    /// The index file.
    pub index_file: PathBuf,

    /// The page template.
    pub template: PathBuf,

    /// The first path segment of posts that appear in the archive.
    pub posts_root: String,

    /// The extension of post files, without the dot. Used when scanning.
    pub post_extension: String,

    /// The collation for tag ordering.
    pub collator: Collator,

    /// The captions of the date block.
    pub labels: Labels,

    /// The body converter.
    pub converter: ConverterConfig,
}

impl Config {
    /// Searches `dir` and its ancestors for [`PROJECT_FILE`] and loads the
    /// first one found. Without one, returns the defaults rooted at `dir`.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        for ancestor in dir.ancestors() {
            let path = ancestor.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path);
            }
        }
        debug!(dir = %dir.display(), "no {} found, using defaults", PROJECT_FILE);
        Ok(Config::from_project(dir, Project::default()))
    }

    /// Loads the project file at `path`. The project root is the directory
    /// containing it.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;
        debug!(path = %path.display(), "loaded project file");

        let root = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        Ok(Config::from_project(root, project))
    }

    /// The defaults, rooted at `root`.
    pub fn with_root(root: &Path) -> Config {
        Config::from_project(root, Project::default())
    }

    fn from_project(root: &Path, project: Project) -> Config {
        Config {
            root_directory: root.to_owned(),
            index_file: root.join(project.index_file),
            template: root.join(project.template),
            posts_root: project.posts_root,
            post_extension: project.post_extension,
            collator: Collator::for_locale(&project.locale),
            labels: project.labels,
            converter: project.converter,
        }
    }
}

/// The result of loading the configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the project file can't be opened.
    #[error("opening project file `{}`: {err}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when the project file isn't valid.
    #[error("loading project file `{}`: {err}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },
}
