use serde::{Deserialize, Serialize};

pub const ATTENDANCE_TOPIC: &str = "scheduler_attendance";
pub const CHANGED_MARKER: &str = "changed";

/// A message delivered over the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub topic: String,
    pub content: String,
}

impl PushMessage {
    pub fn new(topic: impl Into<String>, content: impl Into<String>) -> Self {
        PushMessage {
            topic: topic.into(),
            content: content.into(),
        }
    }

    pub fn is_attendance_change(&self) -> bool {
        self.topic.contains(ATTENDANCE_TOPIC) && self.content.contains(CHANGED_MARKER)
    }
}
