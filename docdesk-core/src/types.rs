use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a document in the remote store.
pub type DocumentId = u64;

/// One row handed over by the feed view.
///
/// `document_id` stays string-encoded exactly as the feed delivers it; it is
/// parsed to a [`DocumentId`] only when a run is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEntry {
    pub document_id: String,
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default = "default_selected")]
    pub selected: bool,
    #[serde(default)]
    pub date: String,
}

fn default_selected() -> bool {
    true
}

impl SelectionEntry {
    /// Builds an entry for a bare id, as passed on the command line.
    pub fn from_id(id: DocumentId) -> Self {
        Self {
            document_id: id.to_string(),
            name: format!("document-{id}"),
            source: String::new(),
            selected: true,
            date: String::new(),
        }
    }
}

/// Ordered selection of documents chosen in the feed view.
///
/// Owned by the caller; the workspace only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentSelection {
    pub entries: Vec<SelectionEntry>,
}

impl DocumentSelection {
    pub fn new(entries: Vec<SelectionEntry>) -> Self {
        Self { entries }
    }

    /// Entries the user actually ticked.
    pub fn selected(&self) -> impl Iterator<Item = &SelectionEntry> {
        self.entries.iter().filter(|e| e.selected)
    }

    pub fn is_empty(&self) -> bool {
        self.selected().next().is_none()
    }

    /// Parsed, de-duplicated ids in selection order.
    ///
    /// Entries whose id does not parse are skipped with a warning.
    pub fn document_ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> = Vec::new();
        for entry in self.selected() {
            match entry.document_id.trim().parse::<DocumentId>() {
                Ok(id) if !ids.contains(&id) => ids.push(id),
                Ok(_) => {}
                Err(_) => tracing::warn!(
                    document_id = %entry.document_id,
                    "skipping selection entry with malformed id"
                ),
            }
        }
        ids
    }

    /// Display names of the selected documents, for exports.
    pub fn names(&self) -> Vec<String> {
        self.selected().map(|e| e.name.clone()).collect()
    }
}

/// Overall tone of the analysed documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    #[serde(other)]
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}

/// Sentiment block of an analysis.
///
/// `confidence` is in `[0, 1]`, `score` in `[0, 100]`. When the backend omits
/// either, [`crate::parse::parse_analysis`] fills in a label-dependent
/// placeholder; those values are cosmetic and not derived from the documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub reasoning: String,
    pub confidence: f64,
    pub score: f64,
}

/// A single extracted fact. `value` may be a string or any JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDetail {
    pub key: String,
    pub value: serde_json::Value,
}

impl KeyDetail {
    /// Strings are shown bare, everything else JSON-encoded.
    pub fn display_value(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Result of one analysis run. Replaced wholesale on re-analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub key_details: Vec<KeyDetail>,
    pub sentiment: Sentiment,
    pub actionable_items: Vec<String>,
    pub delay_indicators: Vec<String>,
    pub suggested_questions: Vec<String>,
}

/// Progress state of a flow step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Completed,
    InProgress,
    Issue,
    #[default]
    #[serde(other)]
    Neutral,
}

impl FlowStatus {
    /// Badge text, e.g. `IN PROGRESS`.
    pub fn badge(self) -> &'static str {
        match self {
            FlowStatus::Completed => "COMPLETED",
            FlowStatus::InProgress => "IN PROGRESS",
            FlowStatus::Issue => "ISSUE",
            FlowStatus::Neutral => "NEUTRAL",
        }
    }
}

/// Icon vocabulary understood by the timeline. Unknown tags become `Merge`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowIcon {
    FilePlus,
    FileText,
    Send,
    Truck,
    CheckCircle,
    XCircle,
    Mail,
    FileCheck,
    Package,
    Receipt,
    UserCheck,
    #[default]
    #[serde(other)]
    Merge,
}

/// One node of the document-relationship timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowItem {
    pub id: String,
    pub date: String, // ISO 8601, e.g. 2023-10-27T10:00:00Z
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub document_source: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub icon: FlowIcon,
    #[serde(default)]
    pub status: FlowStatus,
    #[serde(default)]
    pub related_to: Vec<String>,
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// One conversation turn. `id` is `<role>-<unix millis>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::stamped("user", Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::stamped("bot", Sender::Bot, text)
    }

    pub fn bot_error(message: &str) -> Self {
        Self::stamped(
            "bot-error",
            Sender::Bot,
            format!("Sorry, an error occurred: {message}"),
        )
    }

    /// When the message was created, read back from the id's millis suffix.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        let millis = self.id.rsplit('-').next()?.parse::<i64>().ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    fn stamped(prefix: &str, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: format!("{prefix}-{}", Utc::now().timestamp_millis()),
            sender,
            text: text.into(),
        }
    }
}

/// Monotonic token of an analysis run. Results tagged with an older token are stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(pub u64);

impl RunId {
    pub fn next(self) -> Self {
        RunId(self.0 + 1)
    }
}

/// Token of one chat turn, same role as [`RunId`] for chat replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TurnId(pub u64);

impl TurnId {
    pub fn next(self) -> Self {
        TurnId(self.0 + 1)
    }
}

/// In-flight flags and cosmetic progress counters for the active view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    pub is_analyzing: bool,
    pub analysis_progress: u8,
    pub analysis_error: Option<String>,
    pub is_fetching_flow: bool,
    pub flow_progress: u8,
    pub flow_error: Option<String>,
    pub is_bot_typing: bool,
    pub chat_progress: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_ids_skip_malformed_and_duplicates() {
        let mut bad = SelectionEntry::from_id(1);
        bad.document_id = "abc".into();
        let mut unticked = SelectionEntry::from_id(7);
        unticked.selected = false;
        let selection = DocumentSelection::new(vec![
            SelectionEntry::from_id(101),
            bad,
            SelectionEntry::from_id(102),
            SelectionEntry::from_id(101),
            unticked,
        ]);
        assert_eq!(selection.document_ids(), vec![101, 102]);
    }

    #[test]
    fn selection_reads_feed_shape() {
        let raw = r#"[{"documentId":"42","name":"invoice.pdf","source":"Outlook","selected":true,"date":"2024-01-02"}]"#;
        let selection: DocumentSelection = serde_json::from_str(raw).unwrap();
        assert_eq!(selection.document_ids(), vec![42]);
        assert_eq!(selection.names(), vec!["invoice.pdf".to_string()]);
    }

    #[test]
    fn message_time_comes_from_id() {
        let mut message = ChatMessage::bot_error("boom");
        message.id = "bot-error-1700000000123".into();
        let at = message.sent_at().unwrap();
        assert_eq!(at.timestamp_millis(), 1_700_000_000_123);

        message.id = "imported".into();
        assert_eq!(message.sent_at(), None);
    }

    #[test]
    fn unknown_flow_tags_fall_back() {
        let raw = r#"{"id":"f1","date":"2023-10-27T10:00:00Z","title":"t","icon":"rocket","status":"weird"}"#;
        let item: FlowItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.icon, FlowIcon::Merge);
        assert_eq!(item.status, FlowStatus::Neutral);
    }

    #[test]
    fn key_detail_display_encodes_objects() {
        let detail = KeyDetail {
            key: "Amount".into(),
            value: serde_json::json!({"net": 10}),
        };
        assert_eq!(detail.display_value(), r#"{"net":10}"#);
        let plain = KeyDetail {
            key: "Vendor".into(),
            value: serde_json::json!("ACME"),
        };
        assert_eq!(plain.display_value(), "ACME");
    }
}
