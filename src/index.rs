//! Defines the [`PostIndex`] and [`IndexEntry`] types: the persistent record
//! of every post the compiler has seen. The index lives in a flat CSV file
//! with one `file,creation_date,title,tags` record per post, where `tags` is
//! itself a comma-joined list.
//!
//! The index is keyed by the post's path and kept sorted by creation date.
//! A post's creation date is captured from its modification time the first
//! time it's indexed and never changes afterwards; only the title and tags of
//! an existing entry can be updated.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::collate::Collator;

/// The `strftime` pattern for creation dates, e.g.
/// `2024-01-31\20:15:00\UTC+0300`.
pub const CREATION_DATE_FORMAT: &str = "%Y-%m-%d\\%H:%M:%S\\UTC%z";

/// Formats a timestamp as a creation date (see [`CREATION_DATE_FORMAT`]).
pub fn format_creation_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format(CREATION_DATE_FORMAT).to_string()
}

/// Converts a relative post path into its index key: the path's components
/// joined with `/`, with any `.` components dropped. This keeps keys stable
/// across platforms and across `posts/x.md` vs `./posts/x.md` spellings.
pub fn index_key(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some(String::from("..")),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// The 1-based line of the record starting at byte `offset` of `data`. The
/// reader may report a record as starting on the terminator left over from
/// the previous one (the `\n` of a CRLF pair) or on blank lines, so those
/// are skipped first.
fn line_at(data: &[u8], offset: u64) -> u64 {
    let offset = (offset as usize).min(data.len());
    let start = offset
        + data[offset..]
            .iter()
            .take_while(|&&b| b == b'\r' || b == b'\n')
            .count();
    1 + data[..start].iter().filter(|&&b| b == b'\n').count() as u64
}

/// One record of the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// The post's path relative to the project root. Unique in the index.
    pub file: String,

    /// When the post was first indexed. See [`CREATION_DATE_FORMAT`].
    pub creation_date: String,

    /// The post's title.
    pub title: String,

    /// The post's tags.
    pub tags: Vec<String>,
}

impl IndexEntry {
    /// Creates an entry. A tag list holding nothing but one empty string
    /// (what an empty `tags` column splits into) becomes an empty list.
    pub fn new(
        file: impl Into<String>,
        creation_date: impl Into<String>,
        title: impl Into<String>,
        tags: Vec<String>,
    ) -> IndexEntry {
        let tags = match tags.as_slice() {
            [only] if only.is_empty() => Vec::new(),
            _ => tags,
        };
        IndexEntry {
            file: file.into(),
            creation_date: creation_date.into(),
            title: title.into(),
            tags,
        }
    }

    /// Sorts the tags with `collator` and drops duplicates.
    pub fn with_sorted_tags(mut self, collator: &Collator) -> IndexEntry {
        collator.sort(&mut self.tags);
        self.tags.dedup();
        self
    }
}

/// What [`PostIndex::insert_or_update`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    /// The post wasn't indexed; a new entry was added.
    Inserted,

    /// The post's title or tags changed.
    Updated,

    /// The entry already matched.
    Unchanged,
}

impl Change {
    /// Whether the index needs to be saved.
    pub fn is_changed(self) -> bool {
        self != Change::Unchanged
    }
}

/// The timestamps of a post as seen by the index. Returned by
/// [`PostIndex::date`].
#[derive(Clone, Debug)]
pub struct PostDate {
    /// The post's position in the index, if it's indexed.
    pub position: Option<usize>,

    /// The post's current modification time.
    pub modified: DateTime<Local>,

    /// The stored creation date if the post is indexed, otherwise
    /// `modified` formatted as a creation date.
    pub creation_date: String,
}

/// The in-memory copy of the index file.
#[derive(Debug)]
pub struct PostIndex {
    /// The index file this was loaded from and will be saved to.
    path: PathBuf,

    /// Entries sorted by creation date.
    entries: Vec<IndexEntry>,

    /// Maps each entry's `file` to its position in `entries`.
    positions: HashMap<String, usize>,
}

impl PostIndex {
    /// Loads the index at `path`, creating an empty file if there isn't one.
    /// Every record must have exactly four fields. If a `file` appears more
    /// than once, the first record wins.
    pub fn load(path: &Path) -> Result<PostIndex> {
        let io_error = |err| Error::Io {
            path: path.to_owned(),
            err,
        };
        let mut data = Vec::new();
        OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .and_then(|mut file| file.read_to_end(&mut data))
            .map_err(io_error)?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data.as_slice());

        let mut index = PostIndex {
            path: path.to_owned(),
            entries: Vec::new(),
            positions: HashMap::new(),
        };

        for result in reader.records() {
            let record = result.map_err(|err| Error::Csv {
                path: path.to_owned(),
                err,
            })?;
            let line = record
                .position()
                .map(|p| line_at(&data, p.byte()))
                .unwrap_or_default();
            if record.len() != 4 {
                return Err(Error::MalformedIndexRecord {
                    path: path.to_owned(),
                    line,
                    found: record.len(),
                });
            }

            let entry = IndexEntry::new(
                &record[0],
                &record[1],
                &record[2],
                record[3].split(',').map(str::to_owned).collect(),
            );
            if index.positions.contains_key(&entry.file) {
                warn!(file = %entry.file, line, "dropping duplicate index record");
                continue;
            }
            index.positions.insert(entry.file.clone(), index.entries.len());
            index.entries.push(entry);
        }

        index.sort();
        debug!(path = %path.display(), entries = index.entries.len(), "loaded post index");
        Ok(index)
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the position of the entry for `file`.
    pub fn find(&self, file: &str) -> Option<usize> {
        self.positions.get(file).copied()
    }

    /// Returns the entry for `file`.
    pub fn get(&self, file: &str) -> Option<&IndexEntry> {
        self.find(file).map(|i| &self.entries[i])
    }

    /// Reads the modification time of `source`, the post on disk whose index
    /// key is `file`. The creation date is the stored one if `file` is
    /// indexed; the modification time is only used for new posts.
    pub fn date(&self, file: &str, source: &Path) -> Result<PostDate> {
        let modified: DateTime<Local> = fs::metadata(source)
            .and_then(|metadata| metadata.modified())
            .map_err(|err| Error::Io {
                path: source.to_owned(),
                err,
            })?
            .into();

        let position = self.find(file);
        let creation_date = match position {
            Some(i) => self.entries[i].creation_date.clone(),
            None => format_creation_date(&modified),
        };

        Ok(PostDate {
            position,
            modified,
            creation_date,
        })
    }

    /// Adds `entry` if its `file` isn't indexed yet, keeping the index sorted
    /// by creation date (ties keep their insertion order). Otherwise replaces
    /// the title and tags of the existing entry; its creation date is kept.
    pub fn insert_or_update(&mut self, entry: IndexEntry) -> Change {
        match self.find(&entry.file) {
            None => {
                debug!(file = %entry.file, "indexing new post");
                self.entries.push(entry);
                self.sort();
                Change::Inserted
            }
            Some(i) => {
                let existing = &mut self.entries[i];
                if existing.title == entry.title && existing.tags == entry.tags {
                    return Change::Unchanged;
                }
                debug!(file = %entry.file, "updating indexed post");
                existing.title = entry.title;
                existing.tags = entry.tags;
                Change::Updated
            }
        }
    }

    /// Folds the entries of `sources` into this index. Posts already indexed
    /// keep their entry; when several sources share a post, the entry with
    /// the earliest creation date wins. Returns the number of entries added.
    pub fn merge<I>(&mut self, sources: I) -> usize
    where
        I: IntoIterator<Item = PostIndex>,
    {
        let mut incoming: Vec<IndexEntry> =
            sources.into_iter().flat_map(|index| index.entries).collect();
        incoming.sort_by(|a, b| a.creation_date.cmp(&b.creation_date));

        let mut added = 0;
        for entry in incoming {
            if self.positions.contains_key(&entry.file) {
                continue;
            }
            self.positions.insert(entry.file.clone(), self.entries.len());
            self.entries.push(entry);
            added += 1;
        }
        self.sort();
        added
    }

    /// Writes every entry back to the index file. The records go to a
    /// temporary file next to the index which then replaces it, so readers
    /// see either the old or the new index.
    pub fn save(&self) -> Result<()> {
        let io_error = |err| Error::Io {
            path: self.path.clone(),
            err,
        };
        let csv_error = |err| Error::Csv {
            path: self.path.clone(),
            err,
        };

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
        if let Ok(metadata) = fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(io_error)?;
        }

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .terminator(csv::Terminator::CRLF)
                .from_writer(&mut tmp);
            for entry in &self.entries {
                writer
                    .write_record([
                        entry.file.as_str(),
                        entry.creation_date.as_str(),
                        entry.title.as_str(),
                        entry.tags.join(",").as_str(),
                    ])
                    .map_err(csv_error)?;
            }
            writer.flush().map_err(io_error)?;
        }

        tmp.persist(&self.path).map_err(|e| io_error(e.error))?;
        info!(path = %self.path.display(), entries = self.entries.len(), "saved post index");
        Ok(())
    }

    /// Stable-sorts the entries by creation date and rebuilds the key map.
    fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| a.creation_date.cmp(&b.creation_date));
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.file.clone(), i))
            .collect();
    }
}

/// The result of a fallible index operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or saving the index.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a record doesn't have exactly four fields.
    #[error("{}:{line}: malformed index record: expected 4 fields, found {found}", .path.display())]
    MalformedIndexRecord {
        path: PathBuf,
        line: u64,
        found: usize,
    },

    /// Returned when the CSV reader or writer fails.
    #[error("index `{}`: {err}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        err: csv::Error,
    },

    /// Returned for other I/O errors.
    #[error("`{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}
