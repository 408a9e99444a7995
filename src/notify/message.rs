use serde::Serialize;

use crate::timer::SessionKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
}

impl NotificationMessage {
    fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    pub fn for_kind(kind: SessionKind) -> Self {
        Self::for_label(kind.as_str())
    }

    /// Looks up the completion message by session label; unknown labels get a
    /// generic message.
    pub fn for_label(label: &str) -> Self {
        match label {
            "focus" => Self::new(
                "Focus session complete",
                "Nice work. Take a breather before the next round.",
            ),
            "shortBreak" => Self::new(
                "Break is over",
                "Back to it: your next focus session is ready.",
            ),
            "longBreak" => Self::new(
                "Long break complete",
                "Recharged? Time to pick up the next batch of tasks.",
            ),
            _ => Self::new("Timer complete", "Ready for the next session."),
        }
    }
}
