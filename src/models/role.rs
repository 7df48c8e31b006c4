use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Landing page for role strings the dashboard does not know.
pub const DEFAULT_DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Student,
    Developer,
    TimeTableAdmin,
    ExamClaimsAdmin,
    LabAllocationAdmin,
    Academic,
    NonAcademic,
    FirstYearStudent,
    User,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::Admin,
        Role::Student,
        Role::Developer,
        Role::TimeTableAdmin,
        Role::ExamClaimsAdmin,
        Role::LabAllocationAdmin,
        Role::Academic,
        Role::NonAcademic,
        Role::FirstYearStudent,
        Role::User,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Student => "STUDENT",
            Role::Developer => "DEVELOPER",
            Role::TimeTableAdmin => "TIME_TABLE_ADMIN",
            Role::ExamClaimsAdmin => "EXAM_CLAIMS_ADMIN",
            Role::LabAllocationAdmin => "LAB_ALLOCATION_ADMIN",
            Role::Academic => "ACADEMIC",
            Role::NonAcademic => "NON_ACADEMIC",
            Role::FirstYearStudent => "FIRST_YEAR_STUDENT",
            Role::User => "USER",
        }
    }

    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::Admin => "/ADMIN",
            Role::TimeTableAdmin => "/TIME_TABLE_ADMIN",
            Role::ExamClaimsAdmin => "/EXAM_CLAIMS_ADMIN",
            Role::LabAllocationAdmin => "/LAB_ALLOCATION_ADMIN",
            Role::Developer => "/DEVELOPER",
            Role::User => "/USER",
            Role::Student | Role::FirstYearStudent => "/student",
            Role::Academic => "/academic",
            Role::NonAcademic => "/non-academic",
        }
    }

    /// Panels shown on this role's dashboard, in sidebar order.
    pub fn tabs(self) -> &'static [Tab] {
        use Tab::*;
        match self {
            Role::Developer => &Tab::ALL,
            Role::Admin => &[
                Users,
                Labs,
                Computers,
                LabSessions,
                ClaimReview,
                Timetable,
                Conflicts,
                Announcements,
                Notifications,
                Sessions,
                Profile,
            ],
            Role::LabAllocationAdmin => &[
                Labs,
                Computers,
                LabSessions,
                Notifications,
                Sessions,
                Profile,
            ],
            Role::TimeTableAdmin => &[
                Timetable,
                Conflicts,
                Announcements,
                Notifications,
                Sessions,
                Profile,
            ],
            Role::ExamClaimsAdmin => &[ClaimReview, Notifications, Sessions, Profile],
            Role::Academic => &[
                ExamClaims,
                LabBookings,
                LabSessions,
                Timetable,
                Conflicts,
                Announcements,
                Notifications,
                Sessions,
                Profile,
            ],
            Role::Student | Role::FirstYearStudent => &[
                Timetable,
                LabSessions,
                Notifications,
                Sessions,
                Profile,
            ],
            Role::NonAcademic => &[Announcements, Notifications, Sessions, Profile],
            Role::User => &[Notifications, Sessions, Profile],
        }
    }

    /// Whether this role may change the panel's data, not just view it.
    pub fn manages(self, tab: Tab) -> bool {
        use Role::*;
        match tab {
            Tab::Labs | Tab::Computers | Tab::LabSessions => {
                matches!(self, Admin | LabAllocationAdmin | Developer)
            }
            Tab::Timetable | Tab::Conflicts => matches!(self, Admin | TimeTableAdmin | Developer),
            Tab::ClaimReview => matches!(self, Admin | ExamClaimsAdmin | Developer),
            Tab::Users => matches!(self, Admin | Developer),
            _ => tab.visible_to(self),
        }
    }

    /// Roles that resolve to the given dashboard path.
    pub fn for_dashboard_path(path: &str) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| role.dashboard_path() == path)
            .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Resolves a raw role string from the backend to a dashboard path.
pub fn dashboard_path_for(role: &str) -> &'static str {
    match role.parse::<Role>() {
        Ok(role) => role.dashboard_path(),
        Err(_) => DEFAULT_DASHBOARD_PATH,
    }
}

/// Panels for a session whose role string may be unfamiliar.
pub fn tabs_for(role: Option<Role>) -> &'static [Tab] {
    match role {
        Some(role) => role.tabs(),
        None => &[Tab::Notifications, Tab::Sessions, Tab::Profile],
    }
}

/// Dashboard panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Users,
    Labs,
    Computers,
    LabSessions,
    LabBookings,
    ExamClaims,
    ClaimReview,
    Timetable,
    Conflicts,
    Announcements,
    Notifications,
    Sessions,
    Profile,
}

impl Tab {
    pub const ALL: [Tab; 13] = [
        Tab::Users,
        Tab::Labs,
        Tab::Computers,
        Tab::LabSessions,
        Tab::LabBookings,
        Tab::ExamClaims,
        Tab::ClaimReview,
        Tab::Timetable,
        Tab::Conflicts,
        Tab::Announcements,
        Tab::Notifications,
        Tab::Sessions,
        Tab::Profile,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Tab::Users => "users",
            Tab::Labs => "labs",
            Tab::Computers => "computers",
            Tab::LabSessions => "lab-sessions",
            Tab::LabBookings => "lab-bookings",
            Tab::ExamClaims => "exam-claims",
            Tab::ClaimReview => "claim-review",
            Tab::Timetable => "timetable",
            Tab::Conflicts => "conflicts",
            Tab::Announcements => "announcements",
            Tab::Notifications => "notifications",
            Tab::Sessions => "sessions",
            Tab::Profile => "profile",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Users => "User Management",
            Tab::Labs => "Computer Labs",
            Tab::Computers => "Computers",
            Tab::LabSessions => "Lab Sessions",
            Tab::LabBookings => "Lab Bookings",
            Tab::ExamClaims => "My Exam Claims",
            Tab::ClaimReview => "Exam Claim Review",
            Tab::Timetable => "Timetable",
            Tab::Conflicts => "Time Conflicts",
            Tab::Announcements => "Announcements",
            Tab::Notifications => "Notifications",
            Tab::Sessions => "Active Sessions",
            Tab::Profile => "Profile",
        }
    }

    pub fn href(self) -> String {
        format!("/tabs/{}", self.slug())
    }

    pub fn visible_to(self, role: Role) -> bool {
        role.tabs().contains(&self)
    }
}
