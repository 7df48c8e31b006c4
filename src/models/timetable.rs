use super::{Identified, RecordId};
use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Teaching days use the backend's upper-case weekday names.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

pub const TEACHING_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSlot {
    pub id: RecordId,
    pub day: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub course_code: String,
    #[serde(default)]
    pub lecturer: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl Identified for TimetableSlot {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// Lookup of the slots running on a given day at a given time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotQuery {
    pub day: String,
    pub time: String,
}

impl SlotQuery {
    pub fn new(day: Weekday, time: NaiveTime) -> Self {
        Self {
            day: weekday_name(day).to_string(),
            time: time.format("%H:%M").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lecturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl Identified for Room {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// A lecturer's report that two timetable entries collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRequest {
    pub id: RecordId,
    pub course_code: String,
    pub day: String,
    pub time: String,
    pub description: String,
    #[serde(default)]
    pub reported_by: Option<String>,
    #[serde(default)]
    pub viewed: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identified for ConflictRequest {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConflictRequest {
    pub course_code: String,
    pub day: String,
    pub time: String,
    pub description: String,
}
