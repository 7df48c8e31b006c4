use super::{Identified, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identified for Announcement {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Single-line preview for the list view.
    pub fn preview(&self, max_chars: usize) -> String {
        let body = self.message.as_deref().unwrap_or_default();
        let mut preview: String = body.lines().next().unwrap_or_default().chars().take(max_chars).collect();
        if preview.len() < body.len() {
            preview.push('…');
        }
        preview
    }
}

impl Identified for Notification {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(message: Option<&str>) -> Notification {
        Notification {
            id: RecordId::new("n1"),
            title: "Lab moved".to_string(),
            message: message.map(str::to_string),
            is_read: false,
            created_at: None,
        }
    }

    #[test]
    fn preview_truncates_long_messages() {
        let n = notification(Some("Lab 3 session moved to Lab 5 on Friday"));
        assert_eq!(n.preview(10), "Lab 3 sess…");
        assert_eq!(n.preview(100), "Lab 3 session moved to Lab 5 on Friday");
        assert_eq!(notification(None).preview(10), "");
    }
}
