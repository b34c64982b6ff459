//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by an optional `config.toml` at the content root, and the CLI
//! can override a handful of build switches on top of that.
//!
//! ## Config File Location
//!
//! ```text
//! content/
//! ├── config.toml              # Site config (overrides stock defaults)
//! ├── index.md
//! └── blog/
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "My Site"
//! url = ""                  # Absolute base URL; required for feeds and sitemap
//! author = "Anonymous"      # Fallback author when neither front matter nor git has one
//! email = ""                # Feed author email; synthesized from author + domain when empty
//! language = "en-us"
//! theme = "nord"
//!
//! [assets]
//! css = "css/style.css"     # Stylesheet path relative to the site root (or an absolute URL)
//! js = "js/script.js"       # Script path relative to the site root (or an absolute URL)
//! source_dir = ""           # Directory under the content root copied verbatim to the output
//!
//! [build]
//! recursive = true          # Descend into subdirectories outside of sections
//! generate_list = false     # Generate index pages even where an index.md exists
//! rss = false
//! sitemap = true
//! robots = true
//! search_index = true
//! minify = false
//! commit_info = false       # Show last-commit metadata on pages
//! git_web_url = ""          # e.g. "https://github.com/me/site/commit"
//!
//! [render]
//! allow_html = false        # UNSAFE: pass raw HTML through unsanitized
//!
//! [sections.blog]           # One entry per section directory name
//! tags = true
//! feeds = true
//!
//! [processing]
//! max_processes = 4         # Max parallel directory workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity: title, base URL, default author.
    pub site: SiteInfo,
    /// Stylesheet/script references and the static asset directory.
    pub assets: AssetsConfig,
    /// Which artifacts a build emits.
    pub build: BuildConfig,
    /// Markdown rendering options.
    pub render: RenderConfig,
    /// Section policy table keyed by directory name.
    pub sections: BTreeMap<String, SectionConfig>,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteInfo::default(),
            assets: AssetsConfig::default(),
            build: BuildConfig::default(),
            render: RenderConfig::default(),
            sections: BTreeMap::from([("blog".to_string(), SectionConfig::default())]),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.title.trim().is_empty() {
            return Err(ConfigError::Validation("site.title must not be empty".into()));
        }
        if !self.site.url.is_empty()
            && !(self.site.url.starts_with("http://") || self.site.url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(
                "site.url must start with http:// or https://".into(),
            ));
        }
        if self.assets.css.trim().is_empty() || self.assets.js.trim().is_empty() {
            return Err(ConfigError::Validation(
                "assets.css and assets.js must not be empty".into(),
            ));
        }
        for name in self.sections.keys() {
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(ConfigError::Validation(format!(
                    "section name '{name}' must be a single directory name"
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash, or `None` when unset.
    pub fn base_url(&self) -> Option<&str> {
        let url = self.site.url.trim_end_matches('/');
        (!url.is_empty()).then_some(url)
    }
}

/// Site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Title used for the root index, feeds, and the landing page fallback.
    pub title: String,
    /// Absolute base URL, e.g. `https://example.com`. Empty disables feeds and sitemap.
    pub url: String,
    /// Author used when neither front matter nor version control has one.
    pub author: String,
    /// Explicit feed author email.
    pub email: String,
    /// Feed channel language.
    pub language: String,
    /// Value of the `data-theme` attribute on every page.
    pub theme: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "My Site".to_string(),
            url: String::new(),
            author: "Anonymous".to_string(),
            email: String::new(),
            language: "en-us".to_string(),
            theme: "nord".to_string(),
        }
    }
}

/// Stylesheet and script references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub css: String,
    pub js: String,
    /// Directory (relative to the content root) copied into the output root.
    /// Skipped by the document walk.
    pub source_dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            css: "css/style.css".to_string(),
            js: "js/script.js".to_string(),
            source_dir: String::new(),
        }
    }
}

/// Build switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub recursive: bool,
    pub generate_list: bool,
    pub rss: bool,
    pub sitemap: bool,
    pub robots: bool,
    pub search_index: bool,
    pub minify: bool,
    pub commit_info: bool,
    pub git_web_url: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            generate_list: false,
            rss: false,
            sitemap: true,
            robots: true,
            search_index: true,
            minify: false,
            commit_info: false,
            git_web_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Pass raw HTML in markdown through verbatim. Nothing is sanitized:
    /// `<script>`, event handler attributes and `javascript:` URLs all reach
    /// the page. Only enable for fully trusted content.
    pub allow_html: bool,
}

/// Aggregation rules for one section directory (e.g. `blog`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectionConfig {
    /// Emit `tags/` pages at the section root.
    pub tags: bool,
    /// Emit `feed.xml` at the section root and each category (needs `build.rss`).
    pub feeds: bool,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            tags: true,
            feeds: true,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel directory workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the content root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# treesite configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Place this file at the content root.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
title = "My Site"

# Absolute base URL. Feeds and the sitemap are only written when this is set.
url = ""

# Fallback author when neither the front matter nor git knows one.
author = "Anonymous"

# Feed author email. When empty one is synthesized from the author name and
# the domain of `url`.
email = ""

language = "en-us"
theme = "nord"

# ---------------------------------------------------------------------------
# Assets
# ---------------------------------------------------------------------------
[assets]
# Paths relative to the site root, or absolute http(s) URLs. Every page gets
# a "../" prefix matching its depth.
css = "css/style.css"
js = "js/script.js"

# Directory under the content root copied to the output root (CSS/JS are
# minified when build.minify is on). Empty disables the copy.
source_dir = ""

# ---------------------------------------------------------------------------
# Build
# ---------------------------------------------------------------------------
[build]
recursive = true
generate_list = false
rss = false
sitemap = true
robots = true
search_index = true
minify = false
commit_info = false
git_web_url = ""

# ---------------------------------------------------------------------------
# Markdown rendering
# ---------------------------------------------------------------------------
[render]
# UNSAFE when content is not fully trusted: raw HTML (including <script>
# and on* attributes) is copied into pages without sanitizing. When false,
# raw HTML is shown escaped as text.
allow_html = false

# ---------------------------------------------------------------------------
# Sections
# ---------------------------------------------------------------------------
# A section is a directory (matched by name anywhere in the tree) whose pages
# take their assets from next to the section, and whose root aggregates tag
# pages and feeds over the whole sub-tree.
[sections.blog]
tags = true
feeds = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel directory workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
