//! JSON response types and text formatting for CLI output.

use serde::Serialize;

use crate::memory_types::ScoredMemory;
use crate::sqlite::Memory;

/// Characters of summary shown in a result preview.
pub const PREVIEW_CHARS: usize = 200;

/// First `PREVIEW_CHARS` characters of `content`, with `...` when truncated.
///
/// Counts Unicode scalar values, so multi-byte text is never split mid-character.
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((byte_index, _)) => format!("{}...", &content[..byte_index]),
        None => content.to_string(),
    }
}

/// Response for database initialization.
#[derive(Serialize)]
pub struct InitResponse {
    pub status: String,
    pub path: String,
    pub dimension: usize,
    pub model: Option<String>,
}

/// Response for a saved memory.
#[derive(Serialize)]
pub struct SaveResponse {
    pub status: String,
    pub id: String,
}

/// Response for search results.
#[derive(Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<ScoredMemory>,
}

/// Response for listing memories.
#[derive(Serialize)]
pub struct ListResponse {
    pub memories: Vec<ListItem>,
}

/// Individual list item.
#[derive(Serialize)]
pub struct ListItem {
    pub id: String,
    pub title: String,
    pub tags: String,
    pub created_at: String,
}

impl From<Memory> for ListItem {
    fn from(memory: Memory) -> Self {
        ListItem {
            id: memory.id,
            title: memory.title,
            tags: memory.tags,
            created_at: memory.created_at,
        }
    }
}

/// Response for errors.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Print a value as formatted JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

fn display_tags(tags: &str) -> &str {
    if tags.is_empty() { "(none)" } else { tags }
}

/// Render one query result block (1-based `rank`), ending with a blank line.
pub fn format_result(rank: usize, result: &ScoredMemory) -> String {
    let mut out = format!(
        "--- Result {rank} (score: {:.1}) ---\nID: {}\nTitle: {}\nTags: {}\nDate: {}\n",
        result.similarity,
        result.id,
        result.title,
        display_tags(&result.tags),
        result.created_at
    );
    match &result.full_content {
        Some(full) => {
            out.push_str(&format!("\n## Summary:\n{}\n", result.content));
            out.push_str(&format!("\n## Full Conversation:\n{full}\n"));
        }
        None => out.push_str(&format!("Preview: {}\n", preview(&result.content))),
    }
    out
}

/// Render a full query report: header, one block per result and the count.
pub fn format_query(query: &str, results: &[ScoredMemory]) -> String {
    let mut out = format!("Semantic search for: {query}\n\n");
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format_result(i + 1, result));
        out.push('\n');
    }
    out.push_str(&format!("Found {} results", results.len()));
    out
}

/// Render a single stored memory.
pub fn format_memory(memory: &Memory) -> String {
    let mut out = format!(
        "ID: {}\nTitle: {}\nTags: {}\nCreated: {}\nUpdated: {}\n\n## Summary:\n{}\n",
        memory.id,
        memory.title,
        display_tags(&memory.tags),
        memory.created_at,
        memory.updated_at,
        memory.content
    );
    if let Some(full) = &memory.full_content {
        out.push_str(&format!("\n## Full Conversation:\n{full}\n"));
    }
    out
}
