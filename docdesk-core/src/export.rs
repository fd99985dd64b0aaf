//! Saving chat transcripts and analysis results to disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ExportError;
use crate::types::{AnalysisResult, ChatMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
        }
    }
}

/// Context recorded alongside an exported conversation.
#[derive(Debug, Clone)]
pub struct ExportMeta<'a> {
    pub model: &'a str,
    pub documents: &'a [String],
    pub at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatExport<'a> {
    export_date: String,
    model: &'a str,
    messages: &'a [ChatMessage],
    document_count: usize,
    documents: &'a [String],
}

/// Encodes the conversation in `format`.
pub fn render_chat(
    messages: &[ChatMessage],
    format: ExportFormat,
    meta: &ExportMeta<'_>,
) -> Result<String, ExportError> {
    if messages.is_empty() {
        return Err(ExportError::Empty);
    }
    match format {
        ExportFormat::Json => {
            let payload = ChatExport {
                export_date: meta.at.to_rfc3339(),
                model: meta.model,
                messages,
                document_count: meta.documents.len(),
                documents: meta.documents,
            };
            Ok(serde_json::to_string_pretty(&payload)?)
        }
        ExportFormat::Text => Ok(transcript(messages)),
    }
}

/// `[USER]: ...` / `[BOT]: ...` blocks separated by blank lines.
pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("[{}]: {}\n", m.sender.as_str().to_uppercase(), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_analysis(result: &AnalysisResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(result)?)
}

pub fn chat_file_name(format: ExportFormat, at: DateTime<Utc>) -> String {
    format!("chat-history-{}.{}", at.format("%Y-%m-%d"), format.extension())
}

pub fn analysis_file_name(at: DateTime<Utc>) -> String {
    format!("analysis-{}.json", at.format("%Y-%m-%d"))
}

/// Writes `contents` to `dir/name`, creating `dir` if needed.
pub fn save(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(name);
    let io_err = |source| ExportError::Io {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    std::fs::write(&path, contents).map_err(io_err)?;
    tracing::info!(path = %path.display(), "export written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn conversation() -> Vec<ChatMessage> {
        vec![ChatMessage::user("Total?"), ChatMessage::bot("42 EUR")]
    }

    #[test]
    fn transcript_marks_senders() {
        assert_eq!(transcript(&conversation()), "[USER]: Total?\n\n[BOT]: 42 EUR\n");
    }

    #[test]
    fn json_export_carries_metadata() {
        let docs = vec!["a.pdf".to_string(), "b.pdf".to_string()];
        let meta = ExportMeta {
            model: "openai",
            documents: &docs,
            at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };
        let raw = render_chat(&conversation(), ExportFormat::Json, &meta).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["model"], "openai");
        assert_eq!(json["documentCount"], 2);
        assert_eq!(json["messages"][1]["sender"], "bot");
        assert!(json["exportDate"].as_str().unwrap().starts_with("2024-05-01"));
    }

    #[test]
    fn empty_conversation_is_refused() {
        let meta = ExportMeta {
            model: "openai",
            documents: &[],
            at: Utc::now(),
        };
        assert!(matches!(
            render_chat(&[], ExportFormat::Text, &meta),
            Err(ExportError::Empty)
        ));
    }

    #[test]
    fn file_names_are_dated() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(chat_file_name(ExportFormat::Text, at), "chat-history-2024-05-01.txt");
        assert_eq!(analysis_file_name(at), "analysis-2024-05-01.json");
    }

    #[test]
    fn save_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("exports");
        let path = save(&dir, "x.txt", "hello").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }
}
