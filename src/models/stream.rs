use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single typed block of a streamfield body (`{"type": "...", "value": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub value: Value,
}

impl StreamBlock {
    pub fn new(block_type: impl Into<String>, value: Value) -> Self {
        Self {
            block_type: block_type.into(),
            value,
        }
    }
}

/// The structured body of a page: an ordered list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamValue(pub Vec<StreamBlock>);

impl StreamValue {
    /// Searchable text fragments in block order.
    ///
    /// Every string leaf of every block contributes one fragment with its
    /// markup stripped. Link-like values (URLs, site paths) and strings that
    /// are empty after stripping are skipped.
    pub fn searchable_content(&self) -> Vec<String> {
        let mut fragments = Vec::new();
        for block in &self.0 {
            collect_text(&block.value, &mut fragments);
        }
        fragments
    }
}

fn collect_text(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(raw) => {
            if is_link_like(raw) {
                return;
            }
            let text = strip_html(raw);
            if !text.is_empty() {
                out.push(text);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_text(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_text(item, out)),
        _ => {}
    }
}

fn is_link_like(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
        || trimmed.starts_with("mailto:")
        || (trimmed.starts_with('/') && !trimmed.contains(char::is_whitespace))
}

/// Strip all markup from a rich text fragment and collapse whitespace.
fn strip_html(raw: &str) -> String {
    // A space before each tag keeps words in adjacent elements apart.
    let spaced = raw.replace('<', " <");

    let mut builder = ammonia::Builder::empty();
    builder.clean_content_tags(HashSet::from(["script", "style"]));
    let cleaned = builder.clean(&spaced).to_string();

    let decoded = cleaned
        .replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
