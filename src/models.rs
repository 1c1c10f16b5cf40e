use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default lead time offered by the task form.
pub const DEFAULT_REMINDER_MINUTES: u32 = 5;

/// A task with a due time and a reminder lead time. The persisted snapshot is
/// a bare JSON array of these records; field names and the RFC 3339 time
/// encoding are part of the stored format and must stay stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    /// Absolute instant the task is due.
    pub time: DateTime<Utc>,
    /// Minutes before `time` that the reminder fires.
    pub reminder_minutes: u32,
    /// Derived: `time - reminder_minutes`. Recomputed on every create/update,
    /// never edited directly.
    pub reminder_time: DateTime<Utc>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// What the task form submits. `time` is optional so a missing value is a
/// validation error instead of a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub name: String,
    pub time: Option<DateTime<Utc>>,
    #[serde(default = "default_reminder_minutes")]
    pub reminder_minutes: u32,
}

fn default_reminder_minutes() -> u32 {
    DEFAULT_REMINDER_MINUTES
}

pub fn reminder_time(time: DateTime<Utc>, reminder_minutes: u32) -> DateTime<Utc> {
    time - Duration::minutes(i64::from(reminder_minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn task_serialization_uses_camel_case_and_rfc3339_times() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let task = Task {
            id: "1709290000000".to_string(),
            name: "Pay rent".to_string(),
            time,
            reminder_minutes: 5,
            reminder_time: reminder_time(time, 5),
            completed: false,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap(),
        };

        let value = serde_json::to_value(&task).expect("serialize task");
        assert_eq!(
            value,
            serde_json::json!({
              "id": "1709290000000",
              "name": "Pay rent",
              "time": "2024-03-01T12:00:00Z",
              "reminderMinutes": 5,
              "reminderTime": "2024-03-01T11:55:00Z",
              "completed": false,
              "createdAt": "2024-03-01T11:00:00Z"
            })
        );

        let back: Task = serde_json::from_value(value).expect("deserialize task");
        assert_eq!(back, task);
    }

    #[test]
    fn draft_defaults_reminder_minutes_when_missing() {
        let json = r#"{ "name": "walk dog", "time": "2024-03-01T12:00:00Z" }"#;
        let draft: TaskDraft = serde_json::from_str(json).expect("draft should deserialize");
        assert_eq!(draft.reminder_minutes, DEFAULT_REMINDER_MINUTES);
        assert!(draft.time.is_some());
    }

    #[test]
    fn draft_tolerates_missing_time() {
        let json = r#"{ "name": "walk dog" }"#;
        let draft: TaskDraft = serde_json::from_str(json).expect("draft should deserialize");
        assert_eq!(draft.time, None);
    }

    #[test]
    fn reminder_time_is_exactly_lead_minutes_before_due() {
        let due = Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap();
        assert_eq!(reminder_time(due, 0), due);
        assert_eq!(
            reminder_time(due, 60),
            Utc.with_ymd_and_hms(2024, 6, 15, 8, 30, 0).unwrap()
        );
    }
}
