use crate::models::auth::{AuthData, UserProfile, UserSession, UserSummary};
use crate::models::claims::ExamClaimItem;
use crate::models::labs::{Computer, Lab, LabBooking, LabSession};
use crate::models::notices::{Announcement, Notification};
use crate::models::role::{tabs_for, Role, Tab};
use crate::models::timetable::{ConflictRequest, TimetableSlot};
use crate::models::Identified;
use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, NaiveTime, Utc};
use tracing::error;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub email: String,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub email: String,
    pub otp: String,
    pub otp_sent: bool,
    pub verified: bool,
}

#[derive(Template)]
#[template(path = "forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub email: String,
    pub otp_sent: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub nav: NavView,
    pub summary: Vec<SummaryLine>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "panel.html")]
pub struct PanelTemplate {
    pub nav: NavView,
    pub page: PanelPage,
}

#[derive(Template)]
#[template(path = "message.html")]
pub struct MessageTemplate {
    pub nav: Option<NavView>,
    pub title: String,
    pub message: String,
}

pub fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template render failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

pub fn render_status<T: Template>(status: StatusCode, template: &T) -> Response {
    let mut response = render(template);
    if response.status().is_success() {
        *response.status_mut() = status;
    }
    response
}

pub struct NavLink {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

/// Header and sidebar shared by every signed-in page.
pub struct NavView {
    pub email: String,
    pub role: String,
    pub home: &'static str,
    pub links: Vec<NavLink>,
}

impl NavView {
    pub fn new(auth: &AuthData, active: Option<Tab>) -> Self {
        let links = tabs_for(auth.user.role())
            .iter()
            .map(|&tab| NavLink {
                label: tab.title(),
                href: tab.href(),
                active: Some(tab) == active,
            })
            .collect();
        Self {
            email: auth.user.email.clone(),
            role: auth.user.role.clone(),
            home: auth.user.dashboard_path(),
            links,
        }
    }
}

pub struct SummaryLine {
    pub label: String,
    pub value: String,
    pub href: Option<String>,
}

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: &'static str,
    pub value: String,
    pub required: bool,
    pub options: Vec<SelectOption>,
}

impl FieldView {
    fn of_kind(kind: &'static str, name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind,
            value: String::new(),
            required: true,
            options: Vec::new(),
        }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::of_kind("text", name, label)
    }

    pub fn number(name: &'static str, label: &'static str) -> Self {
        Self::of_kind("number", name, label)
    }

    pub fn date(name: &'static str, label: &'static str) -> Self {
        Self::of_kind("date", name, label)
    }

    pub fn time(name: &'static str, label: &'static str) -> Self {
        Self::of_kind("time", name, label)
    }

    pub fn email(name: &'static str, label: &'static str) -> Self {
        Self::of_kind("email", name, label)
    }

    pub fn password(name: &'static str, label: &'static str) -> Self {
        Self::of_kind("password", name, label)
    }

    pub fn hidden(name: &'static str, value: impl Into<String>) -> Self {
        Self::of_kind("hidden", name, "").value(value)
    }

    pub fn textarea(name: &'static str, label: &'static str) -> Self {
        Self::of_kind("textarea", name, label)
    }

    pub fn select<I, V, L>(name: &'static str, label: &'static str, options: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        let mut field = Self::of_kind("select", name, label);
        field.options = options
            .into_iter()
            .map(|(value, label)| SelectOption {
                value: value.into(),
                label: label.into(),
                selected: false,
            })
            .collect();
        field
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        let value = &self.value;
        for option in &mut self.options {
            option.selected = &option.value == value;
        }
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

pub struct FormView {
    pub title: &'static str,
    pub action: String,
    pub method: &'static str,
    pub submit: &'static str,
    pub fields: Vec<FieldView>,
}

impl FormView {
    pub fn post(title: &'static str, action: impl Into<String>, submit: &'static str) -> Self {
        Self {
            title,
            action: action.into(),
            method: "post",
            submit,
            fields: Vec::new(),
        }
    }

    /// A filter form; submitting it reloads the panel with query parameters.
    pub fn filter(title: &'static str, action: impl Into<String>) -> Self {
        Self {
            method: "get",
            ..Self::post(title, action, "Show")
        }
    }

    pub fn field(mut self, field: FieldView) -> Self {
        self.fields.push(field);
        self
    }
}

pub struct RowAction {
    pub label: &'static str,
    pub href: String,
    pub post: bool,
}

impl RowAction {
    pub fn post(label: &'static str, href: impl Into<String>) -> Self {
        Self {
            label,
            href: href.into(),
            post: true,
        }
    }

    pub fn link(label: &'static str, href: impl Into<String>) -> Self {
        Self {
            label,
            href: href.into(),
            post: false,
        }
    }
}

pub struct RowView {
    pub cells: Vec<String>,
    pub actions: Vec<RowAction>,
}

pub struct Pager {
    pub label: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// One rendered resource panel: a table, its forms and a status line.
pub struct PanelPage {
    pub title: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<RowView>,
    pub forms: Vec<FormView>,
    pub pager: Option<Pager>,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub empty: &'static str,
}

impl PanelPage {
    pub fn new(tab: Tab) -> Self {
        Self {
            title: tab.title(),
            columns: Vec::new(),
            rows: Vec::new(),
            forms: Vec::new(),
            pager: None,
            error: None,
            notice: None,
            empty: "Nothing to show yet.",
        }
    }

    pub fn table<T, F>(mut self, items: &[T], actions: F) -> Self
    where
        T: Tabular,
        F: Fn(&T) -> Vec<RowAction>,
    {
        self.columns = T::columns();
        let has_actions = items.iter().any(|item| !actions(item).is_empty());
        if has_actions {
            self.columns.push("");
        }
        self.rows = items
            .iter()
            .map(|item| RowView {
                cells: item.cells(),
                actions: actions(item),
            })
            .collect();
        self
    }

    pub fn rows(mut self, columns: Vec<&'static str>, rows: Vec<Vec<String>>) -> Self {
        self.columns = columns;
        self.rows = rows
            .into_iter()
            .map(|cells| RowView {
                cells,
                actions: Vec::new(),
            })
            .collect();
        self
    }

    pub fn form(mut self, form: FormView) -> Self {
        self.forms.push(form);
        self
    }

    pub fn pager(mut self, pager: Pager) -> Self {
        self.pager = Some(pager);
        self
    }

    pub fn error(mut self, error: Option<&str>) -> Self {
        self.error = error.map(str::to_string);
        self
    }

    pub fn notice(mut self, notice: Option<String>) -> Self {
        self.notice = notice;
        self
    }

    pub fn empty(mut self, message: &'static str) -> Self {
        self.empty = message;
        self
    }
}

/// Rows a resource contributes to a panel table.
pub trait Tabular: Identified {
    fn columns() -> Vec<&'static str>;
    fn cells(&self) -> Vec<String>;
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl Tabular for Lab {
    fn columns() -> Vec<&'static str> {
        vec!["ID", "Name", "Location", "Capacity", "Description"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt(&self.location),
            self.capacity.to_string(),
            opt(&self.description),
        ]
    }
}

impl Tabular for Computer {
    fn columns() -> Vec<&'static str> {
        vec!["ID", "Name", "Lab", "Status", "Specs"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.lab_id.to_string(),
            self.status.as_str().to_string(),
            opt(&self.specs),
        ]
    }
}

impl Tabular for LabSession {
    fn columns() -> Vec<&'static str> {
        vec!["Title", "Lab", "Date", "Time", "Instructor"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.lab_id.to_string(),
            self.date.to_string(),
            format!("{} - {}", hhmm(self.start_time), hhmm(self.end_time)),
            opt(&self.instructor),
        ]
    }
}

impl Tabular for LabBooking {
    fn columns() -> Vec<&'static str> {
        vec!["Lab", "Date", "Time", "Purpose", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.lab_id.to_string(),
            self.date.to_string(),
            format!("{} - {}", hhmm(self.start_time), hhmm(self.end_time)),
            self.purpose.clone(),
            self.status.as_str().to_string(),
        ]
    }
}

impl Tabular for ExamClaimItem {
    fn columns() -> Vec<&'static str> {
        vec!["Course", "Type", "Quantity", "Status", "Claimant", "Remarks"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.course_code.clone(),
            self.claim_type.as_str().to_string(),
            self.quantity.to_string(),
            self.status.as_str().to_string(),
            opt(&self.claimant_email),
            opt(&self.remarks),
        ]
    }
}

impl Tabular for TimetableSlot {
    fn columns() -> Vec<&'static str> {
        vec!["ID", "Day", "Time", "Course", "Lecturer", "Room", "Group"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.day.clone(),
            format!("{} - {}", hhmm(self.start_time), hhmm(self.end_time)),
            self.course_code.clone(),
            opt(&self.lecturer),
            opt(&self.room),
            opt(&self.group),
        ]
    }
}

impl Tabular for ConflictRequest {
    fn columns() -> Vec<&'static str> {
        vec!["Course", "Day", "Time", "Description", "Reported by", "Viewed"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.course_code.clone(),
            self.day.clone(),
            self.time.clone(),
            self.description.clone(),
            opt(&self.reported_by),
            if self.viewed { "Yes" } else { "No" }.to_string(),
        ]
    }
}

impl Tabular for Announcement {
    fn columns() -> Vec<&'static str> {
        vec!["Title", "Content", "Audience", "Posted"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.content.clone(),
            opt(&self.audience),
            timestamp(self.created_at),
        ]
    }
}

impl Tabular for Notification {
    fn columns() -> Vec<&'static str> {
        vec!["Title", "Message", "Received", "Read"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.preview(80),
            timestamp(self.created_at),
            if self.is_read { "Read" } else { "Unread" }.to_string(),
        ]
    }
}

impl Tabular for UserSummary {
    fn columns() -> Vec<&'static str> {
        vec!["ID", "Name", "Email", "Role", "Joined"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.display_name(),
            self.email.clone(),
            self.role.clone(),
            timestamp(self.created_at),
        ]
    }
}

impl Tabular for UserSession {
    fn columns() -> Vec<&'static str> {
        vec!["Device", "IP address", "Signed in", "Last active"]
    }

    fn cells(&self) -> Vec<String> {
        let device = opt(&self.device_name);
        vec![
            if self.is_current {
                format!("{device} (this device)")
            } else {
                device
            },
            opt(&self.ip_address),
            timestamp(self.created_at),
            timestamp(self.last_active_at),
        ]
    }
}

/// Profile fields as label/value rows.
pub fn profile_rows(profile: &UserProfile) -> Vec<Vec<String>> {
    vec![
        vec!["Email".to_string(), profile.email.clone()],
        vec!["First name".to_string(), opt(&profile.first_name)],
        vec!["Last name".to_string(), opt(&profile.last_name)],
        vec!["Phone".to_string(), opt(&profile.phone)],
        vec!["Department".to_string(), opt(&profile.department)],
        vec!["Role".to_string(), profile.role.clone()],
    ]
}

pub fn role_options() -> impl Iterator<Item = (&'static str, &'static str)> {
    Role::ALL.into_iter().map(|role| (role.as_str(), role.as_str()))
}
