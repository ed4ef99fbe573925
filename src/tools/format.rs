//! Text rendering for tool results
//!
//! Turns backend records into the human/LLM-readable blocks the tools
//! return. Backend result order is preserved verbatim.

use std::collections::BTreeMap;

use crate::backend::types::{EngineInfo, SearchResult};

/// Bucket for engines that declare no category
const UNCATEGORIZED: &str = "uncategorized";

/// Render a search result sequence
pub fn format_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let mut out = format!("Found {} results:\n", results.len());
    for (index, result) in results.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!("{}. {}\n", index + 1, result.title));
        out.push_str(&format!("   URL: {}\n", result.url));
        if let Some(engine) = result.engine.as_deref().filter(|e| !e.is_empty()) {
            out.push_str(&format!("   Engine: {engine}\n"));
        }
        if let Some(date) = result.published_date.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!("   Published: {date}\n"));
        }
        if let Some(snippet) = result.content.as_deref().filter(|c| !c.is_empty()) {
            out.push_str(&format!("   {snippet}\n"));
        }
    }
    out
}

/// Render the engine list grouped by category
///
/// An engine appears under every category it belongs to; headings are
/// sorted lexicographically via the BTreeMap.
pub fn format_engines(engines: &[EngineInfo]) -> String {
    if engines.is_empty() {
        return "No engines available.".to_string();
    }

    let mut groups: BTreeMap<&str, Vec<&EngineInfo>> = BTreeMap::new();
    for engine in engines {
        if engine.categories.is_empty() {
            groups.entry(UNCATEGORIZED).or_default().push(engine);
        } else {
            for category in &engine.categories {
                groups.entry(category.as_str()).or_default().push(engine);
            }
        }
    }

    let mut out = "Available engines by category:\n".to_string();
    for (category, members) in &groups {
        out.push('\n');
        out.push_str(&format!("{category}:\n"));
        for engine in members {
            let marker = if engine.enabled { "enabled" } else { "disabled" };
            out.push_str(&format!("  {} [{}]\n", engine.name, marker));
        }
    }
    out
}
