use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FOLDER: &str = "inbox";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: i32,
    pub subject: String,
    pub body: String,
    pub sender_email: String,
    pub recipient_email: String,
    pub is_read: bool,
    pub folder: String,
    pub sent_at: DateTime<Utc>,
}

impl Email {
    /// The message as the extraction model sees it.
    pub fn as_prompt(&self) -> String {
        format!(
            "Subject: {}\nFrom: {}\nTo: {}\nBody: {}",
            self.subject, self.sender_email, self.recipient_email, self.body
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEmail {
    pub subject: String,
    pub body: String,
    pub sender_email: String,
    pub recipient_email: String,
    pub folder: String,
    pub is_read: bool,
    pub sent_at: Option<DateTime<Utc>>,
}
