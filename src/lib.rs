//! # Treesite
//!
//! A static site generator for directory trees of markdown. The content
//! directory is the data source: every `.md` file becomes an HTML page in the
//! mirrored output directory, directories without an `index.md` get a
//! generated index with a search box, and configured *sections* (a blog, a
//! notes folder) additionally get tag pages and RSS feeds.
//!
//! # Architecture: One Recursive Walk
//!
//! ```text
//! site::build(content/, dist/)
//!   ├── copy assets, write default stylesheet/script
//!   ├── walk::Walker::run()
//!   │     per directory, children in parallel (rayon):
//!   │       documents → pages          (document, landing)
//!   │       subdirectories → recurse   (returns DirOutcome)
//!   │       index + search + tags + feed  (aggregate, feed)
//!   ├── robots.txt
//!   └── sitemap.xml                    (sitemap)
//! ```
//!
//! Post records travel up the recursion by return value: each directory
//! returns the posts of its whole subtree, and its parent concatenates them
//! in a fixed order. No state is shared between worker threads, so the
//! parallel walk produces the same output as a sequential one.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Top-level `build` and `check`, asset copying, robots.txt |
//! | [`walk`] | Recursive directory walk, per-directory frame and outcome |
//! | [`document`] | One markdown file → one rendered page and its post record |
//! | [`landing`] | Landing-page template: sections, recent posts, link lists |
//! | [`aggregate`] | Index pages, search index, tag pages for a directory |
//! | [`feed`] | RSS 2.0 feeds for sections and categories |
//! | [`sitemap`] | `sitemap.xml` over the finished output tree |
//! | [`templates`] | Maud page templates |
//! | [`markdown`] | pulldown-cmark rendering, plain-text extraction |
//! | [`links`] | Rewriting `.md` links to their `.html` outputs |
//! | [`metadata`] | Front-matter parsing and field resolution |
//! | [`naming`] | File name → slug and display title |
//! | [`paths`] | Position classification and relative asset paths |
//! | [`dates`] | Lenient date parsing and formatting |
//! | [`vcs`] | Last-commit lookup in the enclosing git repository (`gix`) |
//! | [`minify`] | HTML/CSS/JS/XML minification |
//! | [`config`] | `config.toml` loading, validation, and stock defaults |
//! | [`types`] | Shared records (`BlogPost`, `BuildReport`, ...) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), so malformed
//! markup is a compile error and every interpolation is escaped unless it is
//! explicitly rendered markdown.
//!
//! ## Relative Links Everywhere
//!
//! Every href in the output is relative to the page containing it. The site
//! works from any sub-path of a web server, and from `file://`, without
//! knowing where it will be deployed. Only feeds and the sitemap need
//! `site.url`.
//!
//! ## History as Metadata
//!
//! When the content lives in a git repository, a page's last commit supplies
//! its date and author unless front matter says otherwise. Outside a
//! repository the build still works; those fields simply fall back.

pub mod aggregate;
pub mod config;
pub mod dates;
pub mod document;
pub mod feed;
pub mod landing;
pub mod links;
pub mod markdown;
pub mod metadata;
pub mod minify;
pub mod naming;
pub mod output;
pub mod paths;
pub mod site;
pub mod sitemap;
pub mod templates;
pub mod types;
pub mod vcs;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;
