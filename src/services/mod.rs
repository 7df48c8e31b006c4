pub mod auth;
pub mod claims;
pub mod client;
pub mod endpoints;
pub mod labs;
pub mod notices;
pub mod panel;
pub mod session;
pub mod timetable;
pub mod users;
