//! The library code for the `almanac` blog-post compiler. Compiling a post
//! can be broken down into two distinct steps:
//!
//! 1. Recording the post in the persistent post index ([`crate::index`])
//! 2. Rendering the post page from the index and the post ([`crate::build`])
//!
//! The first step reads the post's header line ([`crate::attribute`]) and
//! adds or refreshes the post's entry in the index, which is kept sorted by
//! creation date. A post's creation date is fixed the first time it is seen.
//!
//! The second step is the more involved. The whole index is folded into two
//! navigation trees ([`crate::tree`]): a year/month archive and a tag index.
//! Both trees are rendered into sidebar fragments ([`crate::htmlrenderer`]),
//! the post body is converted to HTML ([`crate::convert`]), and everything is
//! substituted into the page template ([`crate::template`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod attribute;
pub mod build;
pub mod collate;
pub mod config;
pub mod convert;
pub mod htmlrenderer;
pub mod index;
pub mod template;
pub mod tree;
