//! Session transcript export for the `full_content` field.
//!
//! The transcript is opaque to the repository: it is stored and returned
//! verbatim, never embedded.

use std::process::Command;

use serde::Deserialize;

use crate::errors::Error;

/// Prefix of the prompt that asks the agent to summarize the session.
pub const SUMMARY_PROMPT_PREFIX: &str = "You are tasked with summarizing the current conversation";

/// Source of a session's full conversation text.
pub trait TranscriptSource {
    /// Export the conversation for `session_id` as plain text.
    fn export(&self, session_id: &str) -> Result<String, Error>;
}

/// Exports sessions through the `opencode export <id>` command.
#[derive(Debug, Clone)]
pub struct OpencodeExporter {
    program: String,
}

impl OpencodeExporter {
    pub fn new() -> Self {
        Self::with_program("opencode")
    }

    /// Use another executable with the same `export <id>` interface.
    pub fn with_program(program: impl Into<String>) -> Self {
        OpencodeExporter {
            program: program.into(),
        }
    }
}

impl Default for OpencodeExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptSource for OpencodeExporter {
    fn export(&self, session_id: &str) -> Result<String, Error> {
        tracing::debug!(program = %self.program, session_id, "exporting session");

        let output = Command::new(&self.program)
            .arg("export")
            .arg(session_id)
            .output()
            .map_err(|e| Error::Transcript(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(Error::Transcript(format!(
                "failed to export session: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        format_transcript(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Debug, Deserialize)]
struct Export {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    info: MessageInfo,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageInfo {
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

impl Message {
    fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|part| part.kind == "text")
            .map(|part| part.text.as_str())
            .collect()
    }

    fn is_summary_request(&self) -> bool {
        self.text().starts_with(SUMMARY_PROMPT_PREFIX)
    }
}

/// Turn an exported session document into `ROLE: text` lines.
///
/// A trailing summary request is dropped: the last message when it is the
/// request, or the last two when the request is followed by its reply.
///
/// # Errors
///
/// Returns `Error::Json` for malformed JSON and `Error::Transcript` when the
/// session has no messages.
pub fn format_transcript(export_json: &str) -> Result<String, Error> {
    let export: Export = serde_json::from_str(export_json)?;
    let mut messages = export.messages;
    if messages.is_empty() {
        return Err(Error::Transcript("session has no messages".to_string()));
    }

    let len = messages.len();
    if messages[len - 1].is_summary_request() {
        messages.truncate(len - 1);
    } else if len >= 2 && messages[len - 2].is_summary_request() {
        messages.truncate(len - 2);
    }

    let lines: Vec<String> = messages
        .iter()
        .map(|message| {
            let role = message.info.role.as_deref().unwrap_or("unknown");
            format!("{}: {}", role.to_uppercase(), message.text())
        })
        .collect();

    Ok(lines.join("\n"))
}
