//! Renders the navigation trees ([`crate::tree`]) into the HTML fragments that
//! go into the page sidebars. Both sidebars are built from nested
//! `<details>`/`<summary>` sections so they collapse without any scripting.
//! Titles and tags are inserted verbatim, the same way the template
//! placeholders are.

use std::fmt::Write;

use crate::collate::Collator;
use crate::tree::{ChronologicalTree, PostLocation, TagTree};

const DETAILS_CLASS: &str = "collapsable-details";
const SUMMARY_CLASS: &str = "collapsable-summary";
const LINK_CLASS: &str = "sidebar-link";

/// Marks the tag sections of the tags carried by the current post.
const CURRENT_TAG_CLASS: &str = "current-tag";

/// Renders the archive sidebar: one section per year, one per month inside
/// it, and a link per post. The year and month of `active` (the post being
/// rendered) are expanded. Links point at `/{root}/{year}/{month}/{slug}`.
pub fn posts_sidebar(
    tree: &ChronologicalTree,
    active: Option<PostLocation>,
    root: &str,
) -> String {
    let mut out = String::new();
    for (year, months) in tree.years() {
        let year_open = active.map_or(false, |a| a.year == year);
        open_section(&mut out, year_open, None, "", year);
        for (month, posts) in months {
            let month_open = year_open && active.map_or(false, |a| a.month == month.as_str());
            open_section(&mut out, month_open, None, "", month);
            let links: Vec<String> = posts
                .iter()
                .map(|post| {
                    format!(
                        r#"<a href="/{}/{}/{}/{}" class="{}">{}</a>"#,
                        root, year, month, post.slug, LINK_CLASS, post.title
                    )
                })
                .collect();
            out.push_str(&links.join("<br/>\n"));
            out.push_str("\n</details>\n");
        }
        out.push_str("</details>\n");
    }
    out
}

/// Renders the tag sidebar: one section per non-empty tag, in `collator`
/// order, with the number of posts in its summary and a link to each post's
/// directory. Sections for tags in `current` get the `current-tag` class.
pub fn tags_sidebar(tree: &TagTree, collator: &Collator, current: &[String]) -> String {
    let mut tags: Vec<&str> = tree.tags().filter(|tag| !tag.is_empty()).collect();
    collator.sort(&mut tags);

    let mut out = String::new();
    for tag in tags {
        let posts = tree.posts(tag).unwrap_or_default();
        let class = match current.iter().any(|c| c == tag) {
            true => CURRENT_TAG_CLASS,
            false => "",
        };
        let summary = format!("{} ({})", tag, posts.len());
        let id = format!("tag-{}", slug::slugify(tag));
        open_section(&mut out, false, Some(&id), class, &summary);

        out.push_str("<sidebar-link-container>");
        for post in posts {
            let _ = write!(
                out,
                r#"<a href="/{}" class="{}">&numsp;&numsp;⊡ {}</a>"#,
                post_directory(&post.file),
                LINK_CLASS,
                post.title
            );
        }
        out.push_str("</sidebar-link-container>\n</details>\n");
    }
    out
}

/// Joins the current post's tags into the flat list shown on the page.
pub fn tag_list(tags: &[String]) -> String {
    tags.join(", ")
}

/// Writes an opening `<details>` and its `<summary>`. `extra_class` is added
/// in front of the summary's own class.
fn open_section(out: &mut String, open: bool, id: Option<&str>, extra_class: &str, summary: &str) {
    let _ = write!(out, r#"<details class="{}""#, DETAILS_CLASS);
    if let Some(id) = id {
        let _ = write!(out, r#" id="{}""#, id);
    }
    if open {
        out.push_str(" open");
    }
    out.push_str(">\n<summary class=\"");
    if !extra_class.is_empty() {
        out.push_str(extra_class);
        out.push(' ');
    }
    let _ = writeln!(out, "{}\">{}</summary>", SUMMARY_CLASS, summary);
}

/// The directory part of an index key: `posts/2024/01/hello/index.md` becomes
/// `posts/2024/01/hello`.
fn post_directory(file: &str) -> &str {
    file.rsplit_once('/').map_or("", |(dir, _)| dir)
}
