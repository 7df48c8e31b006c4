use super::{Identified, RecordId};
use crate::utils::validation::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 3] = [
        ClaimStatus::Pending,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClaimStatus::Pending => "PENDING",
            ClaimStatus::Approved => "APPROVED",
            ClaimStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for ClaimStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::new("status", format!("unknown claim status {s}")))
    }
}

/// Kinds of examination duty that can be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    PaperSetting,
    Moderation,
    Marking,
    Invigilation,
    Supervision,
}

impl ClaimType {
    pub const ALL: [ClaimType; 5] = [
        ClaimType::PaperSetting,
        ClaimType::Moderation,
        ClaimType::Marking,
        ClaimType::Invigilation,
        ClaimType::Supervision,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClaimType::PaperSetting => "PAPER_SETTING",
            ClaimType::Moderation => "MODERATION",
            ClaimType::Marking => "MARKING",
            ClaimType::Invigilation => "INVIGILATION",
            ClaimType::Supervision => "SUPERVISION",
        }
    }
}

impl FromStr for ClaimType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace([' ', '-'], "_");
        ClaimType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ValidationError::new("items", format!("unknown claim type {}", s.trim())))
    }
}

/// Header of a claim submission; line items hang off it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamClaim {
    pub id: RecordId,
    pub academic_year: String,
    pub semester: u8,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<ExamClaimItem>,
}

impl Identified for ExamClaim {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamClaimItem {
    pub id: RecordId,
    #[serde(default)]
    pub claim_id: Option<RecordId>,
    pub course_code: String,
    pub claim_type: ClaimType,
    pub quantity: u32,
    pub status: ClaimStatus,
    #[serde(default)]
    pub claimant_email: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl Identified for ExamClaimItem {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// Items of one review column (pending, approved or rejected).
pub fn items_with_status(items: &[ExamClaimItem], status: ClaimStatus) -> Vec<&ExamClaimItem> {
    items.iter().filter(|item| item.status == status).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExamClaim {
    pub academic_year: String,
    pub semester: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimItemDraft {
    pub course_code: String,
    pub claim_type: ClaimType,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatusUpdate {
    pub status: ClaimStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// A claim batch as typed by the claimant, before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimDraft {
    pub academic_year: String,
    pub semester: u8,
    pub items: Vec<ClaimItemDraft>,
}

impl ClaimDraft {
    /// Parses one item per line as `COURSE_CODE, CLAIM_TYPE, QUANTITY`.
    /// Blank lines are ignored.
    pub fn parse_items(text: &str) -> Result<Vec<ClaimItemDraft>, ValidationError> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                let fields: Vec<&str> = line.split(',').map(str::trim).collect();
                let [course_code, claim_type, quantity] = fields.as_slice() else {
                    return Err(ValidationError::new(
                        "items",
                        format!("line {}: expected course code, claim type and quantity", index + 1),
                    ));
                };
                let quantity = quantity.parse::<u32>().map_err(|_| {
                    ValidationError::new("items", format!("line {}: quantity must be a number", index + 1))
                })?;
                Ok(ClaimItemDraft {
                    course_code: course_code.to_uppercase(),
                    claim_type: claim_type.parse()?,
                    quantity,
                })
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.academic_year.trim().is_empty() {
            return Err(ValidationError::new("academicYear", "academic year is required"));
        }
        if !(1..=2).contains(&self.semester) {
            return Err(ValidationError::new("semester", "semester must be 1 or 2"));
        }
        if self.items.is_empty() {
            return Err(ValidationError::new("items", "add at least one claim item"));
        }
        for item in &self.items {
            if item.course_code.trim().len() < 3 {
                return Err(ValidationError::new(
                    "items",
                    format!("course code {:?} is too short", item.course_code),
                ));
            }
            if item.quantity == 0 {
                return Err(ValidationError::new(
                    "items",
                    format!("quantity for {} must be at least 1", item.course_code),
                ));
            }
        }
        Ok(())
    }

    pub fn header(&self) -> NewExamClaim {
        NewExamClaim {
            academic_year: self.academic_year.trim().to_string(),
            semester: self.semester,
        }
    }
}
