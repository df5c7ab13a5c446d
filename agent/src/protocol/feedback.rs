//! Feedback and config-push documents (`FeedbackMessage`, `ConfigMessage`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    Closed,
    Proceeding,
    Canceled,
    Scheduled,
    Rejected,
    Resumed,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finished {
    Success,
    Failure,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub id: String,
    pub time: String,
    pub status: FeedbackStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackStatus {
    pub execution: Execution,
    pub result: FeedbackResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub finished: Finished,
}

impl FeedbackMessage {
    /// The `{closed, success}` feedback body posted for cancellation acks
    /// and "already installed" acks.
    pub fn closed_success(id: impl Into<String>, time: impl Into<String>) -> Self {
        FeedbackMessage {
            id: id.into(),
            time: time.into(),
            status: FeedbackStatus {
                execution: Execution::Closed,
                result: FeedbackResult {
                    finished: Finished::Success,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMessage {
    /// Always `"merge"`.
    pub mode: String,
    pub data: ConfigData,
    pub id: String,
    pub time: String,
    pub status: FeedbackStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(rename = "VIN")]
    pub vin: String,
    #[serde(rename = "hwRevision")]
    pub hw_revision: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_message_round_trips() {
        let message = FeedbackMessage::closed_success("42", "20260101T000000");
        let encoded = serde_json::to_string(&message).unwrap();
        let decoded: FeedbackMessage = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.id, "42");
        assert_eq!(decoded.status.execution, Execution::Closed);
        assert_eq!(decoded.status.result.finished, Finished::Success);
    }

    #[test]
    fn config_message_serializes_merge_mode() {
        let message = ConfigMessage {
            mode: "merge".into(),
            data: ConfigData {
                vin: "dev01".into(),
                hw_revision: "3".into(),
            },
            id: "dev01".into(),
            time: "20260101T000000".into(),
            status: FeedbackStatus {
                execution: Execution::Closed,
                result: FeedbackResult {
                    finished: Finished::Success,
                },
            },
        };
        let encoded = serde_json::to_value(&message).unwrap();
        assert_eq!(encoded["mode"], "merge");
        assert_eq!(encoded["data"]["VIN"], "dev01");
        assert_eq!(encoded["data"]["hwRevision"], "3");
    }
}
