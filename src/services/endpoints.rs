//! Backend paths, relative to the configured API base URL.

use crate::models::RecordId;

pub const LOGIN: &str = "/auth/login";
pub const SIGNUP: &str = "/auth/signup";
pub const VALIDATE_SESSION: &str = "/auth/validate-session";
pub const LOGOUT: &str = "/auth/logout";
pub const LOGOUT_ALL: &str = "/auth/logout-all";
pub const SESSIONS: &str = "/auth/sessions";

pub fn logout_device(session_id: &RecordId) -> String {
    format!("/auth/logout-device/{session_id}")
}

pub const USERS: &str = "/user";
pub const USER_SEARCH: &str = "/user/search";

pub const PROFILE: &str = "/user-profile";
pub const CHANGE_PASSWORD: &str = "/user-profile/change-password";

pub const EMAIL_SEND_OTP: &str = "/email-validation/send-otp";
pub const EMAIL_VERIFY_OTP: &str = "/email-validation/verify-otp";
pub const PASSWORD_RESET_SEND_OTP: &str = "/password-reset/send-otp";
pub const PASSWORD_RESET_VERIFY_OTP: &str = "/password-reset/verify-otp";

pub const LABS: &str = "/computer-labs";

pub fn lab(id: &RecordId) -> String {
    format!("{LABS}/{id}")
}

pub const COMPUTERS: &str = "/computers";

pub fn computer(id: &RecordId) -> String {
    format!("{COMPUTERS}/{id}")
}

pub fn computers_in_lab(lab_id: &RecordId) -> String {
    format!("{COMPUTERS}/lab/{lab_id}")
}

pub const LAB_SESSIONS: &str = "/lab-sessions";

pub fn lab_session(id: &RecordId) -> String {
    format!("{LAB_SESSIONS}/{id}")
}

pub fn lab_sessions_in_lab(lab_id: &RecordId) -> String {
    format!("{LAB_SESSIONS}/lab/{lab_id}")
}

pub const LAB_BOOKINGS: &str = "/lab-bookings";
pub const MY_LAB_BOOKINGS: &str = "/lab-bookings/my";

pub const EXAM_CLAIMS: &str = "/exam-claims";
pub const MY_EXAM_CLAIMS: &str = "/exam-claims/my";
pub const EXAM_CLAIM_ITEMS: &str = "/exam-claims/items";

pub fn exam_claim_items(claim_id: &RecordId) -> String {
    format!("{EXAM_CLAIMS}/{claim_id}/items")
}

pub fn exam_claim_item(item_id: &RecordId) -> String {
    format!("{EXAM_CLAIM_ITEMS}/{item_id}")
}

pub fn exam_claim_item_status(item_id: &RecordId) -> String {
    format!("{EXAM_CLAIM_ITEMS}/{item_id}/status")
}

pub const CONFLICT_REQUESTS: &str = "/time-conflict-requests";

pub fn conflict_request_viewed(id: &RecordId) -> String {
    format!("{CONFLICT_REQUESTS}/{id}/viewed")
}

pub const TIMETABLE: &str = "/timetable";
pub const TIMETABLE_ROOMS: &str = "/timetable/rooms";

pub fn timetable_slot(id: &RecordId) -> String {
    format!("{TIMETABLE}/{id}")
}

pub const ANNOUNCEMENTS: &str = "/announcements";
pub const MY_ANNOUNCEMENTS: &str = "/announcements/my";

pub const NOTIFICATIONS: &str = "/notifications";

pub fn notification(id: &RecordId) -> String {
    format!("{NOTIFICATIONS}/{id}")
}

pub fn notification_read(id: &RecordId) -> String {
    format!("{NOTIFICATIONS}/{id}/read")
}

pub fn notification_unread(id: &RecordId) -> String {
    format!("{NOTIFICATIONS}/{id}/unread")
}
