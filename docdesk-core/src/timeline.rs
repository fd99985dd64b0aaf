//! Projection of flow state onto the five mutually exclusive timeline states.

use chrono::{DateTime, NaiveDate};

use crate::types::{FlowIcon, FlowItem, FlowStatus};

/// What the flow view shows. Variants are checked in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineView {
    Fetching { progress: u8 },
    Failed { message: String },
    /// No flow data yet; retry is only offered when documents are selected.
    NotRun { has_selection: bool },
    Empty,
    Populated(Vec<TimelineEntry>),
}

/// A flow item prepared for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub id: String,
    pub date_label: String,
    pub title: String,
    pub description: String,
    pub source: String,
    pub status: FlowStatus,
    pub badge: &'static str,
    pub icon: FlowIcon,
    pub participants: Vec<String>,
}

impl From<&FlowItem> for TimelineEntry {
    fn from(item: &FlowItem) -> Self {
        Self {
            id: item.id.clone(),
            date_label: format_date(&item.date),
            title: item.title.clone(),
            description: item.description.clone(),
            source: item.document_source.clone(),
            status: item.status,
            badge: item.status.badge(),
            icon: item.icon,
            participants: item.participants.clone(),
        }
    }
}

/// Picks the timeline state. Items keep server order.
pub fn project(
    flow: Option<&[FlowItem]>,
    fetching: bool,
    error: Option<&str>,
    progress: u8,
    has_selection: bool,
) -> TimelineView {
    if fetching {
        return TimelineView::Fetching { progress };
    }
    if let Some(message) = error {
        return TimelineView::Failed {
            message: message.to_owned(),
        };
    }
    match flow {
        None => TimelineView::NotRun { has_selection },
        Some([]) => TimelineView::Empty,
        Some(items) => TimelineView::Populated(items.iter().map(TimelineEntry::from).collect()),
    }
}

/// `2023-10-27T10:00:00Z` -> `October 27, 2023`. Unparseable input is returned as is.
pub fn format_date(raw: &str) -> String {
    const LABEL: &str = "%B %-d, %Y";
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(LABEL).to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format(LABEL).to_string();
    }
    raw.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, status: FlowStatus) -> FlowItem {
        FlowItem {
            id: id.into(),
            date: "2023-10-27T10:00:00Z".into(),
            title: format!("step {id}"),
            description: String::new(),
            document_source: "invoice.pdf".into(),
            participants: vec!["ACME".into()],
            icon: FlowIcon::Receipt,
            status,
            related_to: Vec::new(),
        }
    }

    #[test]
    fn fetching_wins_over_everything() {
        let items = [item("a", FlowStatus::Completed)];
        let view = project(Some(&items), true, Some("boom"), 40, true);
        assert_eq!(view, TimelineView::Fetching { progress: 40 });
    }

    #[test]
    fn error_before_data() {
        let view = project(None, false, Some("timeout"), 0, true);
        assert_eq!(
            view,
            TimelineView::Failed {
                message: "timeout".into()
            }
        );
    }

    #[test]
    fn not_run_and_empty_are_distinct() {
        assert_eq!(
            project(None, false, None, 0, false),
            TimelineView::NotRun { has_selection: false }
        );
        assert_eq!(project(Some(&[]), false, None, 0, true), TimelineView::Empty);
    }

    #[test]
    fn populated_keeps_server_order() {
        let items = [
            item("late", FlowStatus::Issue),
            item("early", FlowStatus::InProgress),
        ];
        let TimelineView::Populated(entries) = project(Some(&items), false, None, 0, true) else {
            panic!("expected entries");
        };
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["late", "early"]);
        assert_eq!(entries[1].badge, "IN PROGRESS");
        assert_eq!(entries[0].date_label, "October 27, 2023");
    }

    #[test]
    fn dates_fall_back_to_raw_text() {
        assert_eq!(format_date("2024-03-05"), "March 5, 2024");
        assert_eq!(format_date("last tuesday"), "last tuesday");
    }
}
