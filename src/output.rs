//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Pages       12
//! Indexes     4 (4 searchable)
//! Tag pages   6
//! Feeds       2
//! Landing     1
//! Sitemap     19 URLs
//! Assets      2
//!
//! Built 12 pages → dist/
//! ```
//!
//! ## Check
//!
//! ```text
//! Documents
//! 001 Home (landing) → index.html
//! 002 Kernel → blog/Linux/Kernel-Notes.html
//!     Source: blog/Linux/Kernel Notes.md
//!     Date: someday (not a date, sorted last)
//!
//! 2 documents, 1 warning
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::site::CheckedDocument;
use crate::types::BuildReport;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format the summary printed after a build.
///
/// Zero-count rows other than pages are omitted.
pub fn format_build_report(report: &BuildReport, output: &Path) -> Vec<String> {
    let mut lines = vec![format!("{:<12}{}", "Pages", report.pages)];

    let optional = [
        ("Indexes", report.index_pages, Some(report.search_indexes)),
        ("Tag pages", report.tag_pages, None),
        ("Feeds", report.feeds, None),
        ("Landing", report.landing_pages, None),
        ("Assets", report.assets, None),
    ];
    for (label, count, searchable) in optional {
        if count == 0 {
            continue;
        }
        match searchable {
            Some(n) if n > 0 => lines.push(format!("{label:<12}{count} ({n} searchable)")),
            _ => lines.push(format!("{label:<12}{count}")),
        }
    }
    if report.sitemap_urls > 0 {
        lines.push(format!("{:<12}{} URLs", "Sitemap", report.sitemap_urls));
    }

    lines.push(String::new());
    lines.push(format!(
        "Built {} → {}",
        plural(report.pages, "page", "pages"),
        output.display()
    ));
    lines
}

pub fn print_build_report(report: &BuildReport, output: &Path) {
    for line in format_build_report(report, output) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the document inventory produced by `check`.
///
/// Documents whose `Date` cannot be parsed are flagged: they still build
/// but sort after every dated post.
pub fn format_check_output(documents: &[CheckedDocument]) -> Vec<String> {
    let mut lines = vec!["Documents".to_string()];
    let mut warnings = 0;

    for (i, doc) in documents.iter().enumerate() {
        let kind = if doc.landing { " (landing)" } else { "" };
        lines.push(format!("{} {}{} → {}", format_index(i + 1), doc.title, kind, doc.site_path));
        lines.push(format!("{}Source: {}", indent(1), doc.source.display()));
        if let Some(date) = &doc.date {
            if doc.date_parsed {
                lines.push(format!("{}Date: {}", indent(1), date));
            } else {
                warnings += 1;
                lines.push(format!("{}Date: {} (not a date, sorted last)", indent(1), date));
            }
        }
    }

    lines.push(String::new());
    let mut summary = plural(documents.len(), "document", "documents");
    if warnings > 0 {
        summary.push_str(&format!(", {}", plural(warnings, "warning", "warnings")));
    }
    lines.push(summary);
    lines
}

pub fn print_check_output(documents: &[CheckedDocument]) {
    for line in format_check_output(documents) {
        println!("{}", line);
    }
}
