//! Navigation trees derived from the [`PostIndex`](crate::index::PostIndex):
//! the [`ChronologicalTree`] behind the archive sidebar and the [`TagTree`]
//! behind the tag sidebar. Both are built by folding over the index entries
//! in order, so their keys come out in creation-date order rather than
//! lexicographic order.

use indexmap::IndexMap;

use crate::index::IndexEntry;

/// Where an archive post lives, decoded from its index key
/// `{root}/{year}/{month}/{slug}/{file name}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostLocation<'a> {
    pub year: &'a str,
    pub month: &'a str,
    pub slug: &'a str,
}

/// Decodes `file` into a [`PostLocation`]. Returns [`None`] unless `file` has
/// exactly five `/`-separated segments and the first one is `root`.
pub fn post_location<'a>(file: &'a str, root: &str) -> Option<PostLocation<'a>> {
    match file.split('/').collect::<Vec<_>>().as_slice() {
        [first, year, month, slug, _] if *first == root => Some(PostLocation {
            year: *year,
            month: *month,
            slug: *slug,
        }),
        _ => None,
    }
}

/// A post link in the archive: the post's slug (its directory name) and
/// title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchivedPost {
    pub slug: String,
    pub title: String,
}

/// year → month → posts, each level in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChronologicalTree {
    years: IndexMap<String, IndexMap<String, Vec<ArchivedPost>>>,
}

impl ChronologicalTree {
    /// Builds the tree from `entries`. Entries whose file doesn't decode to a
    /// [`PostLocation`] under `root` are left out.
    pub fn build<'a, I>(entries: I, root: &str) -> ChronologicalTree
    where
        I: IntoIterator<Item = &'a IndexEntry>,
    {
        let mut tree = ChronologicalTree::default();
        for entry in entries {
            if let Some(location) = post_location(&entry.file, root) {
                tree.years
                    .entry(location.year.to_owned())
                    .or_default()
                    .entry(location.month.to_owned())
                    .or_default()
                    .push(ArchivedPost {
                        slug: location.slug.to_owned(),
                        title: entry.title.clone(),
                    });
            }
        }
        tree
    }

    /// Iterates over the years and their months.
    pub fn years(
        &self,
    ) -> impl Iterator<Item = (&str, &IndexMap<String, Vec<ArchivedPost>>)> {
        self.years.iter().map(|(year, months)| (year.as_str(), months))
    }

    /// Returns the posts of one month.
    pub fn month(&self, year: &str, month: &str) -> Option<&[ArchivedPost]> {
        self.years
            .get(year)
            .and_then(|months| months.get(month))
            .map(Vec::as_slice)
    }
}

/// A post link under a tag: the post's index key and title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedPost {
    pub file: String,
    pub title: String,
}

/// tag → posts carrying it, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagTree {
    tags: IndexMap<String, Vec<TaggedPost>>,
}

impl TagTree {
    /// Builds the tree from `entries`. An entry is appended once to the list
    /// of every tag it carries.
    pub fn build<'a, I>(entries: I) -> TagTree
    where
        I: IntoIterator<Item = &'a IndexEntry>,
    {
        let mut tree = TagTree::default();
        for entry in entries {
            for tag in &entry.tags {
                tree.tags.entry(tag.clone()).or_default().push(TaggedPost {
                    file: entry.file.clone(),
                    title: entry.title.clone(),
                });
            }
        }
        tree
    }

    /// Returns the posts carrying `tag`.
    pub fn posts(&self, tag: &str) -> Option<&[TaggedPost]> {
        self.tags.get(tag).map(Vec::as_slice)
    }

    /// Iterates over every tag, including the empty one if some entry has
    /// it.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }}
