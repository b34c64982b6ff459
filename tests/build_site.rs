//! End-to-end build over a small content tree.
//!
//! Exercises the public API only: `site::build` with a repository reader
//! that knows no history, writing into a temporary directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use treesite::config::SiteConfig;
use treesite::site;
use treesite::vcs::NoRepository;
use walkdir::WalkDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    let path = root.join(rel);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

fn fixture(input: &Path) {
    write(input, "index.md", "<!--\nTemplate: landing\nTitle: Welcome\n-->\n<!-- Section: whoami -->\nA person who writes.\n");
    write(input, "about.md", "<!--\nTitle: About\n-->\nSee [[blog/First Post]].\n");
    write(
        input,
        "blog/First Post.md",
        "<!--\nDate: 2024-01-10\nTags: rust, cli\nDescription: The first one\n-->\n# Hello\n\nFirst body.\n",
    );
    write(
        input,
        "blog/Linux/Kernel Notes.md",
        "<!--\nDate: 2024-03-02\nTags: linux, rust\n-->\nModules and more.\n",
    );
    write(input, "notes/scratch.md", "undated scratch notes");
    write(input, ".drafts/secret.md", "never published");
}

fn configured() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.site.title = "Test Site".into();
    config.site.url = "https://example.com/".into();
    config.build.rss = true;
    config
}

#[test]
fn builds_the_whole_tree() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("content");
    let output = tmp.path().join("dist");
    fixture(&input);

    let report = site::build(&input, &output, &configured(), &NoRepository).unwrap();

    assert_eq!(report.pages, 4);
    assert_eq!(report.landing_pages, 1);
    assert_eq!(report.feeds, 2);
    // blog/, blog/Linux/, notes/ (root has a landing page)
    assert_eq!(report.index_pages, 3);

    for rel in [
        "about.html",
        "blog/First-Post.html",
        "blog/Linux/Kernel-Notes.html",
        "notes/scratch.html",
        "blog/index.html",
        "blog/search-index.json",
        "blog/tags/index.html",
        "blog/tags/rust.html",
        "blog/feed.xml",
        "blog/Linux/feed.xml",
        "css/style.css",
        "js/script.js",
        "robots.txt",
        "sitemap.xml",
    ] {
        assert!(output.join(rel).exists(), "missing {rel}");
    }
    assert!(!output.join(".drafts").exists());
}

#[test]
fn landing_page_lists_recent_section_posts() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("content");
    let output = tmp.path().join("dist");
    fixture(&input);
    site::build(&input, &output, &configured(), &NoRepository).unwrap();

    let home = read(&output, "index.html");
    assert!(home.contains("<title>Welcome</title>"));
    assert!(home.contains("$ whoami"));
    let newer = home.find("blog/Linux/Kernel-Notes.html").unwrap();
    let older = home.find("blog/First-Post.html").unwrap();
    assert!(newer < older);
}

#[test]
fn markdown_links_point_at_html_outputs() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("content");
    let output = tmp.path().join("dist");
    fixture(&input);
    site::build(&input, &output, &configured(), &NoRepository).unwrap();

    let about = read(&output, "about.html");
    assert!(about.contains(r#"href="blog/First-Post.html""#));
    assert!(about.contains(r#"href="css/style.css""#));
}

#[test]
fn section_index_is_newest_first_with_categories() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("content");
    let output = tmp.path().join("dist");
    fixture(&input);
    site::build(&input, &output, &configured(), &NoRepository).unwrap();

    let index = read(&output, "blog/index.html");
    let newer = index.find("Linux/Kernel-Notes.html").unwrap();
    let older = index.find("First-Post.html").unwrap();
    assert!(newer < older);
    assert!(index.contains(r#"href="Linux/index.html""#));

    let search: serde_json::Value = serde_json::from_str(&read(&output, "blog/search-index.json")).unwrap();
    assert_eq!(search.as_array().unwrap().len(), 2);
    assert_eq!(search[1]["description"], "The first one");
}

#[test]
fn tag_pages_link_back_into_the_section() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("content");
    let output = tmp.path().join("dist");
    fixture(&input);
    site::build(&input, &output, &configured(), &NoRepository).unwrap();

    let rust = read(&output, "blog/tags/rust.html");
    assert!(rust.contains(r#"href="../Linux/Kernel-Notes.html""#));
    assert!(rust.contains(r#"href="../First-Post.html""#));
    let overview = read(&output, "blog/tags/index.html");
    assert!(overview.contains(r#"href="linux.html""#));
    assert!(overview.contains(r#"href="cli.html""#));
}

#[test]
fn feeds_and_sitemap_use_the_site_url() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("content");
    let output = tmp.path().join("dist");
    fixture(&input);
    site::build(&input, &output, &configured(), &NoRepository).unwrap();

    let feed = read(&output, "blog/feed.xml");
    assert!(feed.contains("<title>Test Site</title>"));
    assert!(feed.contains("https://example.com/blog/First-Post.html"));
    let category = read(&output, "blog/Linux/feed.xml");
    assert!(category.contains("Test Site - Linux"));
    assert!(!category.contains("First-Post.html"));

    let sitemap = read(&output, "sitemap.xml");
    assert!(sitemap.contains("<loc>https://example.com/index.html</loc>"));
    assert!(sitemap.contains("<lastmod>2024-03-02</lastmod>"));
    assert!(!sitemap.contains("search-index.json"));
}

#[test]
fn no_site_url_means_no_feeds_or_sitemap() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("content");
    let output = tmp.path().join("dist");
    fixture(&input);

    let mut config = configured();
    config.site.url.clear();
    let report = site::build(&input, &output, &config, &NoRepository).unwrap();

    assert_eq!(report.feeds, 0);
    assert_eq!(report.sitemap_urls, 0);
    assert!(!output.join("blog/feed.xml").exists());
    assert!(!output.join("sitemap.xml").exists());
    assert!(!read(&output, "robots.txt").contains("Sitemap"));
}

/// Every output file keyed by its path under `root`. Feed build times are
/// blanked since they change on every run.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry.path().strip_prefix(root).unwrap().to_path_buf();
            let text = fs::read_to_string(entry.path()).unwrap();
            (rel, without_build_date(&text))
        })
        .collect()
}

fn without_build_date(text: &str) -> String {
    const OPEN: &str = "<lastBuildDate>";
    const CLOSE: &str = "</lastBuildDate>";
    match (text.find(OPEN), text.find(CLOSE)) {
        (Some(start), Some(end)) if start < end => {
            format!("{}{}", &text[..start], &text[end + CLOSE.len()..])
        }
        _ => text.to_string(),
    }
}

#[test]
fn rebuilding_is_stable() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("content");
    let output = tmp.path().join("dist");
    fixture(&input);

    site::build(&input, &output, &configured(), &NoRepository).unwrap();
    let first = snapshot(&output);
    let report = site::build(&input, &output, &configured(), &NoRepository).unwrap();
    assert_eq!(report.pages, 4);
    let second = snapshot(&output);

    assert!(first.contains_key(Path::new("blog/feed.xml")));
    assert_eq!(first.keys().collect::<Vec<_>>(), second.keys().collect::<Vec<_>>());
    for (path, contents) in &first {
        assert_eq!(&second[path], contents, "{} changed between builds", path.display());
    }
}

#[test]
fn check_lists_documents_without_writing() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("content");
    fixture(&input);

    let documents = site::check(&input, &configured()).unwrap();
    assert_eq!(documents.len(), 5);
    assert!(documents.iter().any(|d| d.landing && d.title == "Welcome"));
    assert!(documents.iter().all(|d| !d.source.starts_with(".drafts")));
}
