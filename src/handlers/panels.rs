use super::view::{
    profile_rows, role_options, FieldView, FormView, Pager, PanelPage, RowAction,
};
use super::{AppState, Viewer};
use crate::models::auth::{ChangePasswordRequest, NewUser, ProfileUpdate, UserProfile, UserSummary};
use crate::models::claims::{items_with_status, ClaimDraft, ClaimStatus, ExamClaimItem};
use crate::models::labs::{
    Computer, ComputerStatus, ComputerUpdate, Lab, LabSession, LabUpdate, NewComputer, NewLab,
    NewLabBooking, NewLabSession,
};
use crate::models::notices::NewAnnouncement;
use crate::models::role::{Role, Tab};
use crate::models::timetable::{
    weekday_name, NewConflictRequest, Room, SlotQuery, SlotUpdate, TimetableSlot, TEACHING_DAYS,
};
use crate::models::RecordId;
use crate::services::claims::{AllClaimItems, PartialBatch};
use crate::services::client::ApiError;
use crate::services::panel::ResourcePanel;
use crate::services::users::DEFAULT_PAGE_SIZE;
use crate::utils::validation::{non_empty, ValidationError};
use axum::{
    extract::{Path, Query},
    response::Response,
    routing::{get, post},
    Form, Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::{info, warn};

type PanelResult = Result<Response, Response>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tabs/users", get(users_page).post(create_user))
        .route("/tabs/labs", get(labs_page).post(create_lab))
        .route("/tabs/labs/update", post(update_lab))
        .route("/tabs/computers", get(computers_page).post(create_computer))
        .route("/tabs/computers/status", post(update_computer_status))
        .route("/tabs/computers/:id/delete", post(delete_computer))
        .route("/tabs/lab-sessions", get(lab_sessions_page).post(create_lab_session))
        .route("/tabs/lab-sessions/:id/delete", post(delete_lab_session))
        .route("/tabs/lab-bookings", get(lab_bookings_page).post(create_lab_booking))
        .route("/tabs/exam-claims", get(exam_claims_page).post(submit_exam_claim))
        .route("/tabs/exam-claims/items/:id/delete", post(delete_claim_item))
        .route("/tabs/claim-review", get(claim_review_page))
        .route("/tabs/claim-review/:id/delete", post(delete_reviewed_item))
        .route("/tabs/claim-review/:id/:status", post(review_claim_item))
        .route("/tabs/timetable", get(timetable_page))
        .route("/tabs/timetable/update", post(update_timetable_slot))
        .route("/tabs/conflicts", get(conflicts_page).post(report_conflict))
        .route("/tabs/conflicts/:id/viewed", post(mark_conflict_viewed))
        .route("/tabs/announcements", get(announcements_page).post(create_announcement))
        .route("/tabs/notifications", get(notifications_page))
        .route("/tabs/notifications/:id", get(notification_detail))
        .route("/tabs/notifications/:id/read", post(mark_notification_read))
        .route("/tabs/notifications/:id/unread", post(mark_notification_unread))
        .route("/tabs/notifications/:id/delete", post(delete_notification))
        .route("/tabs/sessions", get(sessions_page))
        .route("/tabs/sessions/:id/logout", post(logout_session))
        .route("/tabs/profile", get(profile_page).post(update_profile))
        .route("/tabs/profile/password", post(change_password))
}

// Form parsing
fn parse_count(field: &'static str, value: &str) -> Result<u32, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::new(field, format!("{field} must be a whole number")))
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new(field, format!("{field} must be a date (YYYY-MM-DD)")))
}

/// Accepts `HH:MM` as sent by time inputs, or `HH:MM:SS`.
fn parse_time(field: &'static str, value: &str) -> Result<NaiveTime, ValidationError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ValidationError::new(field, format!("{field} must be a time (HH:MM)")))
}

fn parse_teaching_day(value: &str) -> Result<chrono::Weekday, ValidationError> {
    TEACHING_DAYS
        .into_iter()
        .find(|day| weekday_name(*day).eq_ignore_ascii_case(value.trim()))
        .ok_or_else(|| ValidationError::new("day", "pick a teaching day"))
}

/// Runs a write only when its input parsed; parse failures never reach the backend.
async fn send_parsed<I, T, F, Fut>(input: Result<I, ValidationError>, send: F) -> Result<T, ApiError>
where
    F: FnOnce(I) -> Fut,
    Fut: std::future::Future<Output = Result<T, ApiError>>,
{
    match input {
        Ok(input) => send(input).await,
        Err(e) => Err(e.into()),
    }
}

fn day_options() -> impl Iterator<Item = (&'static str, &'static str)> {
    TEACHING_DAYS
        .into_iter()
        .map(|day| (weekday_name(day), weekday_name(day)))
}

fn lab_options(labs: &[Lab]) -> Vec<(String, String)> {
    labs.iter()
        .map(|lab| (lab.id.to_string(), lab.name.clone()))
        .collect()
}

fn status_options() -> impl Iterator<Item = (&'static str, &'static str)> {
    ComputerStatus::ALL
        .into_iter()
        .map(|status| (status.as_str(), status.as_str()))
}

fn confirmed(ok: bool, message: &str) -> Option<String> {
    ok.then(|| message.to_string())
}

#[derive(Debug, Default, Deserialize)]
struct LabFilter {
    lab: Option<String>,
}

impl LabFilter {
    fn lab_id(&self) -> Option<RecordId> {
        non_empty(self.lab.clone()).map(RecordId::new)
    }
}

async fn all_labs(viewer: &Viewer) -> Vec<Lab> {
    let labs = viewer.api.labs();
    labs.list().await.unwrap_or_else(|e| {
        warn!("Lab list unavailable: {}", e);
        Vec::new()
    })
}

// Users
#[derive(Debug, Default, Deserialize)]
struct UsersQuery {
    page: Option<u32>,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserForm {
    email: String,
    first_name: String,
    last_name: String,
    role: Role,
    password: String,
}

struct UserListing {
    panel: ResourcePanel<UserSummary>,
    page: u32,
    total_pages: u64,
    role: Option<Role>,
}

async fn list_users(viewer: &Viewer, page: u32, role: Option<Role>) -> UserListing {
    let users = viewer.api.users();
    let mut panel = ResourcePanel::new();
    let ticket = panel.begin_load();
    let result = match role {
        Some(role) => users.search_by_role(role, page, DEFAULT_PAGE_SIZE).await,
        None => users.list(page, DEFAULT_PAGE_SIZE).await,
    };
    let mut total_pages = 0;
    let result = result.map(|listing| {
        total_pages = listing.total_pages();
        listing.data
    });
    panel.finish_load(ticket, result);
    UserListing {
        panel,
        page: page.max(1),
        total_pages,
        role,
    }
}

fn users_view(listing: &UserListing, notice: Option<String>) -> PanelPage {
    let href = |page: u32| match listing.role {
        Some(role) => format!("/tabs/users?page={page}&role={role}"),
        None => format!("/tabs/users?page={page}"),
    };
    let pager = Pager {
        label: format!("Page {} of {}", listing.page, listing.total_pages.max(1)),
        prev: (listing.page > 1).then(|| href(listing.page - 1)),
        next: (u64::from(listing.page) < listing.total_pages).then(|| href(listing.page + 1)),
    };

    PanelPage::new(Tab::Users)
        .form(
            FormView::filter("Filter by role", Tab::Users.href()).field(
                FieldView::select("role", "Role", role_options())
                    .optional()
                    .value(listing.role.map(Role::as_str).unwrap_or_default()),
            ),
        )
        .form(
            FormView::post("Create user", Tab::Users.href(), "Create user")
                .field(FieldView::email("email", "Email"))
                .field(FieldView::text("first_name", "First name"))
                .field(FieldView::text("last_name", "Last name"))
                .field(FieldView::select("role", "Role", role_options()))
                .field(FieldView::password("password", "Initial password")),
        )
        .table(listing.panel.items(), |_| Vec::new())
        .pager(pager)
        .error(listing.panel.error())
        .notice(notice)
        .empty("No users match.")
}

async fn users_page(viewer: Viewer, Query(query): Query<UsersQuery>) -> PanelResult {
    viewer.require(Tab::Users)?;
    let role = non_empty(query.role).and_then(|raw| raw.parse().ok());
    let listing = list_users(&viewer, query.page.unwrap_or(1), role).await;
    viewer.show(Tab::Users, users_view(&listing, None))
}

async fn create_user(viewer: Viewer, Form(form): Form<UserForm>) -> PanelResult {
    viewer.require_manage(Tab::Users)?;
    let mut listing = list_users(&viewer, 1, None).await;
    let user = NewUser {
        email: form.email.trim().to_string(),
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        role: form.role,
        password: form.password,
    };

    listing.panel.begin_submit();
    let ok = listing.panel.confirm_created(viewer.api.users().create(&user).await);
    if ok {
        info!(email = %user.email, role = %user.role, "User created");
    }
    let notice = ok.then(|| format!("Created {} as {}.", user.email, user.role));
    viewer.show(Tab::Users, users_view(&listing, notice))
}

// Labs
#[derive(Debug, Deserialize)]
struct LabForm {
    name: String,
    location: Option<String>,
    capacity: String,
    description: Option<String>,
}

impl LabForm {
    fn parse(self) -> Result<NewLab, ValidationError> {
        Ok(NewLab {
            name: self.name.trim().to_string(),
            location: non_empty(self.location),
            capacity: parse_count("capacity", &self.capacity)?,
            description: non_empty(self.description),
        })
    }
}

#[derive(Debug, Deserialize)]
struct LabUpdateForm {
    lab_id: String,
    name: Option<String>,
    location: Option<String>,
    capacity: Option<String>,
    description: Option<String>,
}

impl LabUpdateForm {
    fn parse(self) -> Result<(RecordId, LabUpdate), ValidationError> {
        let capacity = non_empty(self.capacity)
            .map(|raw| parse_count("capacity", &raw))
            .transpose()?;
        let update = LabUpdate {
            name: non_empty(self.name),
            location: non_empty(self.location),
            capacity,
            description: non_empty(self.description),
        };
        Ok((RecordId::new(self.lab_id), update))
    }
}

fn labs_view(viewer: &Viewer, panel: &ResourcePanel<Lab>, notice: Option<String>) -> PanelPage {
    let mut page = PanelPage::new(Tab::Labs);
    if viewer.manages(Tab::Labs) {
        page = page
            .form(
                FormView::post("Add lab", Tab::Labs.href(), "Create lab")
                    .field(FieldView::text("name", "Name"))
                    .field(FieldView::text("location", "Location").optional())
                    .field(FieldView::number("capacity", "Capacity"))
                    .field(FieldView::textarea("description", "Description").optional()),
            )
            .form(
                FormView::post("Update lab", "/tabs/labs/update", "Save changes")
                    .field(FieldView::select("lab_id", "Lab", lab_options(panel.items())))
                    .field(FieldView::text("name", "New name").optional())
                    .field(FieldView::text("location", "New location").optional())
                    .field(FieldView::number("capacity", "New capacity").optional())
                    .field(FieldView::textarea("description", "New description").optional()),
            );
    }
    page.table(panel.items(), |_| Vec::new())
        .error(panel.error())
        .notice(notice)
        .empty("No labs registered yet.")
}

async fn load_labs(viewer: &Viewer) -> ResourcePanel<Lab> {
    let mut panel = ResourcePanel::new();
    panel.refresh(&viewer.api.labs()).await;
    panel
}

async fn labs_page(viewer: Viewer) -> PanelResult {
    viewer.require(Tab::Labs)?;
    let panel = load_labs(&viewer).await;
    viewer.show(Tab::Labs, labs_view(&viewer, &panel, None))
}

async fn create_lab(viewer: Viewer, Form(form): Form<LabForm>) -> PanelResult {
    viewer.require_manage(Tab::Labs)?;
    let mut panel = load_labs(&viewer).await;
    let labs = viewer.api.labs();

    panel.begin_submit();
    let result = send_parsed(form.parse(), |lab| async move { labs.create(&lab).await }).await;
    let notice = confirmed(panel.confirm_created(result), "Lab created.");
    viewer.show(Tab::Labs, labs_view(&viewer, &panel, notice))
}

async fn update_lab(viewer: Viewer, Form(form): Form<LabUpdateForm>) -> PanelResult {
    viewer.require_manage(Tab::Labs)?;
    let mut panel = load_labs(&viewer).await;
    let labs = viewer.api.labs();

    panel.begin_submit();
    let result = send_parsed(form.parse(), |(id, update)| async move { labs.update(&id, &update).await }).await;
    let notice = confirmed(panel.confirm_updated(result), "Lab updated.");
    viewer.show(Tab::Labs, labs_view(&viewer, &panel, notice))
}

// Computers
#[derive(Debug, Deserialize)]
struct ComputerForm {
    name: String,
    lab_id: String,
    status: ComputerStatus,
    specs: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ComputerStatusForm {
    computer_id: String,
    status: ComputerStatus,
}

async fn load_computers(viewer: &Viewer, lab: Option<&RecordId>) -> (ResourcePanel<Computer>, Vec<Lab>) {
    let computers = viewer.api.computers();
    let mut panel = ResourcePanel::new();
    let ticket = panel.begin_load();
    let (result, labs) = futures::join!(
        async {
            match lab {
                Some(id) => computers.list_in_lab(id).await,
                None => computers.list().await,
            }
        },
        all_labs(viewer)
    );
    panel.finish_load(ticket, result);
    (panel, labs)
}

fn computers_view(
    viewer: &Viewer,
    panel: &ResourcePanel<Computer>,
    labs: &[Lab],
    filter: Option<&RecordId>,
    notice: Option<String>,
) -> PanelPage {
    let manages = viewer.manages(Tab::Computers);
    let mut page = PanelPage::new(Tab::Computers).form(
        FormView::filter("Filter by lab", Tab::Computers.href()).field(
            FieldView::select("lab", "Lab", lab_options(labs))
                .optional()
                .value(filter.map(RecordId::to_string).unwrap_or_default()),
        ),
    );
    if manages {
        let computers: Vec<(String, String)> = panel
            .items()
            .iter()
            .map(|pc| (pc.id.to_string(), pc.name.clone()))
            .collect();
        page = page
            .form(
                FormView::post("Add computer", Tab::Computers.href(), "Add computer")
                    .field(FieldView::text("name", "Name"))
                    .field(FieldView::select("lab_id", "Lab", lab_options(labs)))
                    .field(FieldView::select("status", "Status", status_options()).value("AVAILABLE"))
                    .field(FieldView::text("specs", "Specs").optional()),
            )
            .form(
                FormView::post("Change status", "/tabs/computers/status", "Update status")
                    .field(FieldView::select("computer_id", "Computer", computers))
                    .field(FieldView::select("status", "Status", status_options())),
            );
    }
    page.table(panel.items(), |pc| {
        if manages {
            vec![RowAction::post("Delete", format!("/tabs/computers/{}/delete", pc.id))]
        } else {
            Vec::new()
        }
    })
    .error(panel.error())
    .notice(notice)
    .empty("No computers found.")
}

async fn computers_page(viewer: Viewer, Query(filter): Query<LabFilter>) -> PanelResult {
    viewer.require(Tab::Computers)?;
    let lab = filter.lab_id();
    let (panel, labs) = load_computers(&viewer, lab.as_ref()).await;
    viewer.show(Tab::Computers, computers_view(&viewer, &panel, &labs, lab.as_ref(), None))
}

async fn create_computer(viewer: Viewer, Form(form): Form<ComputerForm>) -> PanelResult {
    viewer.require_manage(Tab::Computers)?;
    let (mut panel, labs) = load_computers(&viewer, None).await;
    let computer = NewComputer {
        name: form.name.trim().to_string(),
        lab_id: RecordId::new(form.lab_id),
        status: form.status,
        specs: non_empty(form.specs),
    };

    panel.begin_submit();
    let ok = panel.confirm_created(viewer.api.computers().create(&computer).await);
    let notice = confirmed(ok, "Computer added.");
    viewer.show(Tab::Computers, computers_view(&viewer, &panel, &labs, None, notice))
}

async fn update_computer_status(viewer: Viewer, Form(form): Form<ComputerStatusForm>) -> PanelResult {
    viewer.require_manage(Tab::Computers)?;
    let (mut panel, labs) = load_computers(&viewer, None).await;
    let id = RecordId::new(form.computer_id);
    let update = ComputerUpdate {
        status: Some(form.status),
        ..ComputerUpdate::default()
    };

    panel.begin_submit();
    let ok = panel.confirm_updated(viewer.api.computers().update(&id, &update).await);
    let notice = ok.then(|| format!("Computer {id} is now {}.", form.status.as_str()));
    viewer.show(Tab::Computers, computers_view(&viewer, &panel, &labs, None, notice))
}

async fn delete_computer(viewer: Viewer, Path(id): Path<String>) -> PanelResult {
    viewer.require_manage(Tab::Computers)?;
    let (mut panel, labs) = load_computers(&viewer, None).await;
    let id = RecordId::new(id);

    panel.begin_submit();
    let ok = panel.confirm_removed(&id, viewer.api.computers().delete(&id).await);
    let notice = confirmed(ok, "Computer removed.");
    viewer.show(Tab::Computers, computers_view(&viewer, &panel, &labs, None, notice))
}

// Lab sessions
#[derive(Debug, Deserialize)]
struct LabSessionForm {
    lab_id: String,
    title: String,
    date: String,
    start_time: String,
    end_time: String,
    instructor: Option<String>,
}

impl LabSessionForm {
    fn parse(self) -> Result<NewLabSession, ValidationError> {
        Ok(NewLabSession {
            lab_id: RecordId::new(self.lab_id),
            title: self.title.trim().to_string(),
            date: parse_date("date", &self.date)?,
            start_time: parse_time("startTime", &self.start_time)?,
            end_time: parse_time("endTime", &self.end_time)?,
            instructor: non_empty(self.instructor),
        })
    }
}

async fn load_lab_sessions(viewer: &Viewer, lab: Option<&RecordId>) -> (ResourcePanel<LabSession>, Vec<Lab>) {
    let sessions = viewer.api.lab_sessions();
    let mut panel = ResourcePanel::new();
    let ticket = panel.begin_load();
    let (result, labs) = futures::join!(
        async {
            match lab {
                Some(id) => sessions.list_in_lab(id).await,
                None => sessions.list().await,
            }
        },
        all_labs(viewer)
    );
    panel.finish_load(ticket, result);
    (panel, labs)
}

fn lab_sessions_view(
    viewer: &Viewer,
    panel: &ResourcePanel<LabSession>,
    labs: &[Lab],
    filter: Option<&RecordId>,
    notice: Option<String>,
) -> PanelPage {
    let manages = viewer.manages(Tab::LabSessions);
    let mut page = PanelPage::new(Tab::LabSessions).form(
        FormView::filter("Filter by lab", Tab::LabSessions.href()).field(
            FieldView::select("lab", "Lab", lab_options(labs))
                .optional()
                .value(filter.map(RecordId::to_string).unwrap_or_default()),
        ),
    );
    if manages {
        page = page.form(
            FormView::post("Schedule session", Tab::LabSessions.href(), "Schedule")
                .field(FieldView::select("lab_id", "Lab", lab_options(labs)))
                .field(FieldView::text("title", "Title"))
                .field(FieldView::date("date", "Date"))
                .field(FieldView::time("start_time", "Starts"))
                .field(FieldView::time("end_time", "Ends"))
                .field(FieldView::text("instructor", "Instructor").optional()),
        );
    }
    page.table(panel.items(), |session| {
        if manages {
            vec![RowAction::post("Delete", format!("/tabs/lab-sessions/{}/delete", session.id))]
        } else {
            Vec::new()
        }
    })
    .error(panel.error())
    .notice(notice)
    .empty("No lab sessions scheduled.")
}

async fn lab_sessions_page(viewer: Viewer, Query(filter): Query<LabFilter>) -> PanelResult {
    viewer.require(Tab::LabSessions)?;
    let lab = filter.lab_id();
    let (panel, labs) = load_lab_sessions(&viewer, lab.as_ref()).await;
    viewer.show(Tab::LabSessions, lab_sessions_view(&viewer, &panel, &labs, lab.as_ref(), None))
}

async fn create_lab_session(viewer: Viewer, Form(form): Form<LabSessionForm>) -> PanelResult {
    viewer.require_manage(Tab::LabSessions)?;
    let (mut panel, labs) = load_lab_sessions(&viewer, None).await;
    let sessions = viewer.api.lab_sessions();

    panel.begin_submit();
    let result = send_parsed(form.parse(), |session| async move { sessions.create(&session).await }).await;
    let notice = confirmed(panel.confirm_created(result), "Lab session scheduled.");
    viewer.show(Tab::LabSessions, lab_sessions_view(&viewer, &panel, &labs, None, notice))
}

async fn delete_lab_session(viewer: Viewer, Path(id): Path<String>) -> PanelResult {
    viewer.require_manage(Tab::LabSessions)?;
    let (mut panel, labs) = load_lab_sessions(&viewer, None).await;
    let id = RecordId::new(id);

    panel.begin_submit();
    let ok = panel.confirm_removed(&id, viewer.api.lab_sessions().delete(&id).await);
    if ok {
        info!(session = %id, "Lab session deleted");
    }
    let notice = confirmed(ok, "Lab session deleted.");
    viewer.show(Tab::LabSessions, lab_sessions_view(&viewer, &panel, &labs, None, notice))
}

// Lab bookings
#[derive(Debug, Deserialize)]
struct BookingForm {
    lab_id: String,
    date: String,
    start_time: String,
    end_time: String,
    purpose: String,
}

impl BookingForm {
    fn parse(self) -> Result<NewLabBooking, ValidationError> {
        Ok(NewLabBooking {
            lab_id: RecordId::new(self.lab_id),
            date: parse_date("date", &self.date)?,
            start_time: parse_time("startTime", &self.start_time)?,
            end_time: parse_time("endTime", &self.end_time)?,
            purpose: self.purpose.trim().to_string(),
        })
    }
}

async fn lab_bookings_page(viewer: Viewer) -> PanelResult {
    viewer.require(Tab::LabBookings)?;
    let mut panel = ResourcePanel::new();
    let bookings = viewer.api.lab_bookings();
    let (_, labs) = futures::join!(panel.refresh(&bookings), all_labs(&viewer));
    viewer.show(Tab::LabBookings, lab_bookings_view(&panel, &labs, None))
}

fn lab_bookings_view(
    panel: &ResourcePanel<crate::models::labs::LabBooking>,
    labs: &[Lab],
    notice: Option<String>,
) -> PanelPage {
    PanelPage::new(Tab::LabBookings)
        .form(
            FormView::post("Request a booking", Tab::LabBookings.href(), "Request booking")
                .field(FieldView::select("lab_id", "Lab", lab_options(labs)))
                .field(FieldView::date("date", "Date"))
                .field(FieldView::time("start_time", "From"))
                .field(FieldView::time("end_time", "To"))
                .field(FieldView::textarea("purpose", "Purpose")),
        )
        .table(panel.items(), |_| Vec::new())
        .error(panel.error())
        .notice(notice)
        .empty("You have no lab bookings.")
}

async fn create_lab_booking(viewer: Viewer, Form(form): Form<BookingForm>) -> PanelResult {
    viewer.require_manage(Tab::LabBookings)?;
    let mut panel = ResourcePanel::new();
    let bookings = viewer.api.lab_bookings();
    let (_, labs) = futures::join!(panel.refresh(&bookings), all_labs(&viewer));

    panel.begin_submit();
    let result = send_parsed(form.parse(), |booking| async move { bookings.create(&booking).await }).await;
    let notice = confirmed(panel.confirm_created(result), "Booking requested.");
    viewer.show(Tab::LabBookings, lab_bookings_view(&panel, &labs, notice))
}

// Exam claims
#[derive(Debug, Deserialize)]
struct ClaimForm {
    academic_year: String,
    semester: String,
    items: String,
}

impl ClaimForm {
    fn parse(self) -> Result<ClaimDraft, ValidationError> {
        let semester = self
            .semester
            .trim()
            .parse()
            .map_err(|_| ValidationError::new("semester", "semester must be 1 or 2"))?;
        Ok(ClaimDraft {
            academic_year: self.academic_year,
            semester,
            items: ClaimDraft::parse_items(&self.items)?,
        })
    }
}

fn exam_claims_view(panel: &ResourcePanel<ExamClaimItem>, notice: Option<String>) -> PanelPage {
    PanelPage::new(Tab::ExamClaims)
        .form(
            FormView::post("Submit a claim", Tab::ExamClaims.href(), "Submit claim")
                .field(FieldView::text("academic_year", "Academic year (e.g. 2023/2024)"))
                .field(FieldView::select("semester", "Semester", [("1", "1"), ("2", "2")]))
                .field(FieldView::textarea(
                    "items",
                    "Items, one per line: COURSE CODE, TYPE, QUANTITY",
                )),
        )
        .table(panel.items(), |item| {
            if item.status == ClaimStatus::Pending {
                vec![RowAction::post(
                    "Withdraw",
                    format!("/tabs/exam-claims/items/{}/delete", item.id),
                )]
            } else {
                Vec::new()
            }
        })
        .error(panel.error())
        .notice(notice)
        .empty("You have not claimed anything yet.")
}

async fn load_my_claims(viewer: &Viewer) -> ResourcePanel<ExamClaimItem> {
    let mut panel = ResourcePanel::new();
    panel.refresh(&viewer.api.claims()).await;
    panel
}

async fn exam_claims_page(viewer: Viewer) -> PanelResult {
    viewer.require(Tab::ExamClaims)?;
    let panel = load_my_claims(&viewer).await;
    viewer.show(Tab::ExamClaims, exam_claims_view(&panel, None))
}

async fn submit_exam_claim(viewer: Viewer, Form(form): Form<ClaimForm>) -> PanelResult {
    viewer.require_manage(Tab::ExamClaims)?;
    let mut panel = load_my_claims(&viewer).await;
    let claims = viewer.api.claims();

    panel.begin_submit();
    let result = match form.parse() {
        Ok(draft) => claims.submit_batch(&draft).await,
        Err(e) => Err(PartialBatch::from(ApiError::from(e))),
    };
    let notice = match result {
        Ok(items) => {
            let count = items.len();
            panel
                .confirm_created_many(Ok(items))
                .then(|| format!("Claim submitted with {count} item(s)."))
        }
        Err(PartialBatch { created, source }) => {
            let count = created.len();
            panel.confirm_partial(created, source);
            (count > 0).then(|| format!("{count} item(s) were saved before the error."))
        }
    };
    viewer.show(Tab::ExamClaims, exam_claims_view(&panel, notice))
}

async fn delete_claim_item(viewer: Viewer, Path(id): Path<String>) -> PanelResult {
    viewer.require_manage(Tab::ExamClaims)?;
    let mut panel = load_my_claims(&viewer).await;
    let id = RecordId::new(id);

    panel.begin_submit();
    let ok = panel.confirm_removed(&id, viewer.api.claims().delete_item(&id).await);
    viewer.show(Tab::ExamClaims, exam_claims_view(&panel, confirmed(ok, "Claim item withdrawn.")))
}

// Claim review
#[derive(Debug, Default, Deserialize)]
struct ReviewQuery {
    status: Option<String>,
}

fn claim_review_view(
    panel: &ResourcePanel<ExamClaimItem>,
    status: ClaimStatus,
    notice: Option<String>,
) -> PanelPage {
    let shown: Vec<ExamClaimItem> = items_with_status(panel.items(), status)
        .into_iter()
        .cloned()
        .collect();
    let options = ClaimStatus::ALL.into_iter().map(|s| {
        let count = items_with_status(panel.items(), s).len();
        (s.as_str(), format!("{} ({count})", s.as_str()))
    });

    PanelPage::new(Tab::ClaimReview)
        .form(
            FormView::filter("Review queue", Tab::ClaimReview.href())
                .field(FieldView::select("status", "Status", options).value(status.as_str())),
        )
        .table(&shown, |item| {
            let mut actions = Vec::new();
            if item.status == ClaimStatus::Pending {
                actions.push(RowAction::post("Approve", format!("/tabs/claim-review/{}/approved", item.id)));
                actions.push(RowAction::post("Reject", format!("/tabs/claim-review/{}/rejected", item.id)));
            }
            actions.push(RowAction::post("Delete", format!("/tabs/claim-review/{}/delete", item.id)));
            actions
        })
        .error(panel.error())
        .notice(notice)
        .empty("No claim items in this state.")
}

async fn load_review_queue(viewer: &Viewer) -> ResourcePanel<ExamClaimItem> {
    let mut panel = ResourcePanel::new();
    panel.refresh(&AllClaimItems(viewer.api.claims())).await;
    panel
}

async fn claim_review_page(viewer: Viewer, Query(query): Query<ReviewQuery>) -> PanelResult {
    viewer.require(Tab::ClaimReview)?;
    let status = non_empty(query.status)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(ClaimStatus::Pending);
    let panel = load_review_queue(&viewer).await;
    viewer.show(Tab::ClaimReview, claim_review_view(&panel, status, None))
}

async fn review_claim_item(viewer: Viewer, Path((id, status)): Path<(String, String)>) -> PanelResult {
    viewer.require_manage(Tab::ClaimReview)?;
    let mut panel = load_review_queue(&viewer).await;
    let id = RecordId::new(id);
    let claims = viewer.api.claims();

    panel.begin_submit();
    let parsed = status.parse::<ClaimStatus>();
    let result = send_parsed(parsed, |status| {
        let id = &id;
        async move { claims.update_item_status(id, status, None).await }
    })
    .await;
    let notice = result
        .as_ref()
        .ok()
        .map(|item| format!("{} {} is now {}.", item.course_code, item.claim_type.as_str(), item.status.as_str()));
    if panel.confirm_updated(result) {
        info!(item = %id, status = %status, "Claim item reviewed");
    }
    viewer.show(Tab::ClaimReview, claim_review_view(&panel, ClaimStatus::Pending, notice))
}

async fn delete_reviewed_item(viewer: Viewer, Path(id): Path<String>) -> PanelResult {
    viewer.require_manage(Tab::ClaimReview)?;
    let mut panel = load_review_queue(&viewer).await;
    let id = RecordId::new(id);

    panel.begin_submit();
    let ok = panel.confirm_removed(&id, viewer.api.claims().delete_item(&id).await);
    let notice = confirmed(ok, "Claim item deleted.");
    viewer.show(Tab::ClaimReview, claim_review_view(&panel, ClaimStatus::Pending, notice))
}

// Timetable
#[derive(Debug, Default, Deserialize)]
struct SlotLookup {
    day: Option<String>,
    time: Option<String>,
}

impl SlotLookup {
    fn query(&self) -> Option<Result<SlotQuery, ValidationError>> {
        let day = non_empty(self.day.clone())?;
        let time = non_empty(self.time.clone())?;
        Some(parse_teaching_day(&day).and_then(|day| Ok(SlotQuery::new(day, parse_time("time", &time)?))))
    }
}

#[derive(Debug, Deserialize)]
struct SlotUpdateForm {
    day: String,
    time: String,
    slot_id: String,
    course_code: Option<String>,
    lecturer: Option<String>,
    room: Option<String>,
}

impl SlotUpdateForm {
    fn lookup(&self) -> SlotLookup {
        SlotLookup {
            day: Some(self.day.clone()),
            time: Some(self.time.clone()),
        }
    }

    fn parse(self) -> Result<(RecordId, SlotUpdate), ValidationError> {
        let update = SlotUpdate {
            course_code: non_empty(self.course_code).map(|code| code.to_uppercase()),
            lecturer: non_empty(self.lecturer),
            room: non_empty(self.room),
        };
        if update.course_code.is_none() && update.lecturer.is_none() && update.room.is_none() {
            return Err(ValidationError::new("slot", "change at least one field"));
        }
        Ok((RecordId::new(self.slot_id), update))
    }
}

struct SlotListing {
    panel: ResourcePanel<TimetableSlot>,
    query: Option<SlotQuery>,
    rooms: Vec<Room>,
}

async fn load_slots(viewer: &Viewer, lookup: &SlotLookup) -> SlotListing {
    let timetable = viewer.api.timetable();
    let mut panel = ResourcePanel::new();
    let ticket = panel.begin_load();
    let (query, result) = match lookup.query() {
        Some(Ok(query)) => {
            let result = timetable.lookup(&query).await;
            (Some(query), result)
        }
        Some(Err(e)) => (None, Err(e.into())),
        None => (None, Ok(Vec::new())),
    };
    panel.finish_load(ticket, result);

    let rooms = if viewer.manages(Tab::Timetable) && query.is_some() {
        timetable.rooms().await.unwrap_or_else(|e| {
            warn!("Room list unavailable: {}", e);
            Vec::new()
        })
    } else {
        Vec::new()
    };
    SlotListing { panel, query, rooms }
}

fn timetable_view(viewer: &Viewer, listing: &SlotListing, notice: Option<String>) -> PanelPage {
    let (day, time) = listing
        .query
        .as_ref()
        .map(|q| (q.day.clone(), q.time.clone()))
        .unwrap_or_default();
    let mut page = PanelPage::new(Tab::Timetable).form(
        FormView::filter("Find classes", Tab::Timetable.href())
            .field(FieldView::select("day", "Day", day_options()).value(day.clone()))
            .field(FieldView::time("time", "Time").value(time.clone())),
    );

    if viewer.manages(Tab::Timetable) && !listing.panel.items().is_empty() {
        let slots: Vec<(String, String)> = listing
            .panel
            .items()
            .iter()
            .map(|slot| (slot.id.to_string(), format!("{} {}", slot.course_code, slot.start_time.format("%H:%M"))))
            .collect();
        let rooms: Vec<(String, String)> = listing
            .rooms
            .iter()
            .map(|room| (room.name.clone(), room.name.clone()))
            .collect();
        page = page.form(
            FormView::post("Edit slot", "/tabs/timetable/update", "Save slot")
                .field(FieldView::hidden("day", day))
                .field(FieldView::hidden("time", time))
                .field(FieldView::select("slot_id", "Slot", slots))
                .field(FieldView::text("course_code", "Course code").optional())
                .field(FieldView::text("lecturer", "Lecturer").optional())
                .field(FieldView::select("room", "Room", rooms).optional()),
        );
    }

    let empty = if listing.query.is_some() {
        "No classes at that time."
    } else {
        "Pick a day and time to see which classes are running."
    };
    page.table(listing.panel.items(), |_| Vec::new())
        .error(listing.panel.error())
        .notice(notice)
        .empty(empty)
}

async fn timetable_page(viewer: Viewer, Query(lookup): Query<SlotLookup>) -> PanelResult {
    viewer.require(Tab::Timetable)?;
    let listing = load_slots(&viewer, &lookup).await;
    viewer.show(Tab::Timetable, timetable_view(&viewer, &listing, None))
}

async fn update_timetable_slot(viewer: Viewer, Form(form): Form<SlotUpdateForm>) -> PanelResult {
    viewer.require_manage(Tab::Timetable)?;
    let mut listing = load_slots(&viewer, &form.lookup()).await;
    let timetable = viewer.api.timetable();

    listing.panel.begin_submit();
    let result = send_parsed(form.parse(), |(id, update)| async move {
        timetable.update_slot(&id, &update).await
    })
    .await;
    let notice = confirmed(listing.panel.confirm_updated(result), "Timetable slot updated.");
    viewer.show(Tab::Timetable, timetable_view(&viewer, &listing, notice))
}

// Conflicts
#[derive(Debug, Deserialize)]
struct ConflictForm {
    course_code: String,
    day: String,
    time: String,
    description: String,
}

impl ConflictForm {
    fn parse(self) -> Result<NewConflictRequest, ValidationError> {
        let day = parse_teaching_day(&self.day)?;
        let time = parse_time("time", &self.time)?;
        Ok(NewConflictRequest {
            course_code: self.course_code.trim().to_uppercase(),
            day: weekday_name(day).to_string(),
            time: time.format("%H:%M").to_string(),
            description: self.description.trim().to_string(),
        })
    }
}

fn conflicts_view(
    viewer: &Viewer,
    panel: &ResourcePanel<crate::models::timetable::ConflictRequest>,
    notice: Option<String>,
) -> PanelPage {
    let manages = viewer.manages(Tab::Conflicts);
    PanelPage::new(Tab::Conflicts)
        .form(
            FormView::post("Report a clash", Tab::Conflicts.href(), "Report")
                .field(FieldView::text("course_code", "Course code"))
                .field(FieldView::select("day", "Day", day_options()))
                .field(FieldView::time("time", "Time"))
                .field(FieldView::textarea("description", "What clashes?")),
        )
        .table(panel.items(), |conflict| {
            if manages && !conflict.viewed {
                vec![RowAction::post("Mark viewed", format!("/tabs/conflicts/{}/viewed", conflict.id))]
            } else {
                Vec::new()
            }
        })
        .error(panel.error())
        .notice(notice)
        .empty("No conflicts reported.")
}

async fn load_conflicts(viewer: &Viewer) -> ResourcePanel<crate::models::timetable::ConflictRequest> {
    let mut panel = ResourcePanel::new();
    panel.refresh(&viewer.api.conflicts()).await;
    panel
}

async fn conflicts_page(viewer: Viewer) -> PanelResult {
    viewer.require(Tab::Conflicts)?;
    let panel = load_conflicts(&viewer).await;
    viewer.show(Tab::Conflicts, conflicts_view(&viewer, &panel, None))
}

async fn report_conflict(viewer: Viewer, Form(form): Form<ConflictForm>) -> PanelResult {
    viewer.require(Tab::Conflicts)?;
    let mut panel = load_conflicts(&viewer).await;
    let conflicts = viewer.api.conflicts();

    panel.begin_submit();
    let result = send_parsed(form.parse(), |request| async move { conflicts.create(&request).await }).await;
    let notice = confirmed(panel.confirm_created(result), "Conflict reported.");
    viewer.show(Tab::Conflicts, conflicts_view(&viewer, &panel, notice))
}

async fn mark_conflict_viewed(viewer: Viewer, Path(id): Path<String>) -> PanelResult {
    viewer.require_manage(Tab::Conflicts)?;
    let mut panel = load_conflicts(&viewer).await;
    let id = RecordId::new(id);

    panel.begin_submit();
    let ok = panel.confirm_updated(viewer.api.conflicts().mark_viewed(&id).await);
    viewer.show(Tab::Conflicts, conflicts_view(&viewer, &panel, confirmed(ok, "Marked as viewed.")))
}

// Announcements
#[derive(Debug, Deserialize)]
struct AnnouncementForm {
    title: String,
    content: String,
    audience: Option<String>,
}

fn announcements_view(
    panel: &ResourcePanel<crate::models::notices::Announcement>,
    notice: Option<String>,
) -> PanelPage {
    let audiences = std::iter::once(("ALL", "Everyone")).chain(role_options());
    PanelPage::new(Tab::Announcements)
        .form(
            FormView::post("New announcement", Tab::Announcements.href(), "Publish")
                .field(FieldView::text("title", "Title"))
                .field(FieldView::textarea("content", "Message"))
                .field(FieldView::select("audience", "Audience", audiences).optional()),
        )
        .table(panel.items(), |_| Vec::new())
        .error(panel.error())
        .notice(notice)
        .empty("You have not published any announcements.")
}

async fn load_announcements(viewer: &Viewer) -> ResourcePanel<crate::models::notices::Announcement> {
    let mut panel = ResourcePanel::new();
    panel.refresh(&viewer.api.announcements()).await;
    panel
}

async fn announcements_page(viewer: Viewer) -> PanelResult {
    viewer.require(Tab::Announcements)?;
    let panel = load_announcements(&viewer).await;
    viewer.show(Tab::Announcements, announcements_view(&panel, None))
}

async fn create_announcement(viewer: Viewer, Form(form): Form<AnnouncementForm>) -> PanelResult {
    viewer.require_manage(Tab::Announcements)?;
    let mut panel = load_announcements(&viewer).await;
    let announcement = NewAnnouncement {
        title: form.title.trim().to_string(),
        content: form.content.trim().to_string(),
        audience: non_empty(form.audience),
    };

    panel.begin_submit();
    let ok = panel.confirm_created(viewer.api.announcements().create(&announcement).await);
    viewer.show(Tab::Announcements, announcements_view(&panel, confirmed(ok, "Announcement published.")))
}

// Notifications
fn notifications_view(
    panel: &ResourcePanel<crate::models::notices::Notification>,
    notice: Option<String>,
) -> PanelPage {
    PanelPage::new(Tab::Notifications)
        .table(panel.items(), |note| {
            let base = format!("{}/{}", Tab::Notifications.href(), note.id);
            let toggle = if note.is_read {
                RowAction::post("Mark unread", format!("{base}/unread"))
            } else {
                RowAction::post("Mark read", format!("{base}/read"))
            };
            vec![
                RowAction::link("Open", base.clone()),
                toggle,
                RowAction::post("Delete", format!("{base}/delete")),
            ]
        })
        .error(panel.error())
        .notice(notice)
        .empty("You have no notifications.")
}

async fn load_notifications(viewer: &Viewer) -> ResourcePanel<crate::models::notices::Notification> {
    let mut panel = ResourcePanel::new();
    panel.refresh(&viewer.api.notifications()).await;
    panel
}

async fn notifications_page(viewer: Viewer) -> PanelResult {
    viewer.require(Tab::Notifications)?;
    let panel = load_notifications(&viewer).await;
    viewer.show(Tab::Notifications, notifications_view(&panel, None))
}

/// Opening a notification marks it read.
async fn notification_detail(viewer: Viewer, Path(id): Path<String>) -> PanelResult {
    viewer.require(Tab::Notifications)?;
    let notifications = viewer.api.notifications();
    let id = RecordId::new(id);

    match notifications.get(&id).await {
        Ok(note) => {
            if !note.is_read {
                if let Err(e) = notifications.mark_read(&id).await {
                    warn!(notification = %id, "Could not mark notification read: {}", e);
                }
            }
            let body = note.message.unwrap_or_default();
            viewer.message(note.title, body)
        }
        Err(e) => {
            let panel = load_notifications(&viewer).await;
            viewer.show(Tab::Notifications, notifications_view(&panel, None).error(Some(&e.to_string())))
        }
    }
}

async fn mark_notification_read(viewer: Viewer, Path(id): Path<String>) -> PanelResult {
    viewer.require(Tab::Notifications)?;
    let mut panel = load_notifications(&viewer).await;
    let id = RecordId::new(id);

    panel.begin_submit();
    panel.confirm_updated(viewer.api.notifications().mark_read(&id).await);
    viewer.show(Tab::Notifications, notifications_view(&panel, None))
}

async fn mark_notification_unread(viewer: Viewer, Path(id): Path<String>) -> PanelResult {
    viewer.require(Tab::Notifications)?;
    let mut panel = load_notifications(&viewer).await;
    let id = RecordId::new(id);

    panel.begin_submit();
    panel.confirm_updated(viewer.api.notifications().mark_unread(&id).await);
    viewer.show(Tab::Notifications, notifications_view(&panel, None))
}

async fn delete_notification(viewer: Viewer, Path(id): Path<String>) -> PanelResult {
    viewer.require(Tab::Notifications)?;
    let mut panel = load_notifications(&viewer).await;
    let id = RecordId::new(id);

    panel.begin_submit();
    let ok = panel.confirm_removed(&id, viewer.api.notifications().delete(&id).await);
    viewer.show(Tab::Notifications, notifications_view(&panel, confirmed(ok, "Notification deleted.")))
}

// Sessions
fn sessions_view(
    panel: &ResourcePanel<crate::models::auth::UserSession>,
    notice: Option<String>,
) -> PanelPage {
    PanelPage::new(Tab::Sessions)
        .form(FormView::post("Sign out everywhere", "/logout/all", "Log out of all devices"))
        .table(panel.items(), |session| {
            if session.is_current {
                Vec::new()
            } else {
                vec![RowAction::post("Log out", format!("/tabs/sessions/{}/logout", session.id))]
            }
        })
        .error(panel.error())
        .notice(notice)
        .empty("No active sessions.")
}

async fn load_sessions(viewer: &Viewer) -> ResourcePanel<crate::models::auth::UserSession> {
    let mut panel = ResourcePanel::new();
    let ticket = panel.begin_load();
    let result = viewer.api.auth().sessions().await;
    panel.finish_load(ticket, result);
    panel
}

async fn sessions_page(viewer: Viewer) -> PanelResult {
    viewer.require(Tab::Sessions)?;
    let panel = load_sessions(&viewer).await;
    viewer.show(Tab::Sessions, sessions_view(&panel, None))
}

async fn logout_session(viewer: Viewer, Path(id): Path<String>) -> PanelResult {
    viewer.require(Tab::Sessions)?;
    let mut panel = load_sessions(&viewer).await;
    let id = RecordId::new(id);

    panel.begin_submit();
    let ok = panel.confirm_removed(&id, viewer.api.auth().logout_device(&id).await);
    if ok {
        info!(session = %id, "Remote device logged out");
    }
    viewer.show(Tab::Sessions, sessions_view(&panel, confirmed(ok, "Device logged out.")))
}

// Profile
#[derive(Debug, Deserialize)]
struct ProfileForm {
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    department: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PasswordForm {
    current_password: String,
    new_password: String,
    confirm_password: String,
}

fn profile_view(profile: Option<&UserProfile>, error: Option<String>, notice: Option<String>) -> PanelPage {
    let current = |value: Option<&Option<String>>| value.cloned().flatten().unwrap_or_default();
    PanelPage::new(Tab::Profile)
        .rows(vec!["Field", "Value"], profile.map(profile_rows).unwrap_or_default())
        .form(
            FormView::post("Edit profile", Tab::Profile.href(), "Save profile")
                .field(FieldView::text("first_name", "First name").optional().value(current(profile.map(|p| &p.first_name))))
                .field(FieldView::text("last_name", "Last name").optional().value(current(profile.map(|p| &p.last_name))))
                .field(FieldView::text("phone", "Phone").optional().value(current(profile.map(|p| &p.phone))))
                .field(FieldView::text("department", "Department").optional().value(current(profile.map(|p| &p.department)))),
        )
        .form(
            FormView::post("Change password", "/tabs/profile/password", "Change password")
                .field(FieldView::password("current_password", "Current password"))
                .field(FieldView::password("new_password", "New password"))
                .field(FieldView::password("confirm_password", "Confirm new password")),
        )
        .error(error.as_deref())
        .notice(notice)
        .empty("Profile unavailable.")
}

async fn profile_page(viewer: Viewer) -> PanelResult {
    viewer.require(Tab::Profile)?;
    let result = viewer.api.profile().get().await;
    let error = result.as_ref().err().map(ToString::to_string);
    viewer.show(Tab::Profile, profile_view(result.as_ref().ok(), error, None))
}

async fn update_profile(viewer: Viewer, Form(form): Form<ProfileForm>) -> PanelResult {
    viewer.require(Tab::Profile)?;
    let profile = viewer.api.profile();
    let update = ProfileUpdate {
        first_name: non_empty(form.first_name),
        last_name: non_empty(form.last_name),
        phone: non_empty(form.phone),
        department: non_empty(form.department),
    };

    match profile.update(&update).await {
        Ok(updated) => viewer.show(
            Tab::Profile,
            profile_view(Some(&updated), None, Some("Profile saved.".to_string())),
        ),
        Err(e) => {
            let current = profile.get().await.ok();
            viewer.show(Tab::Profile, profile_view(current.as_ref(), Some(e.to_string()), None))
        }
    }
}

async fn change_password(viewer: Viewer, Form(form): Form<PasswordForm>) -> PanelResult {
    viewer.require(Tab::Profile)?;
    let profile = viewer.api.profile();
    let request = ChangePasswordRequest {
        current_password: form.current_password,
        new_password: form.new_password,
        confirm_password: form.confirm_password,
    };

    let (error, notice) = match profile.change_password(&request).await {
        Ok(_) => {
            info!(user = %viewer.auth.user.email, "Password changed");
            (None, Some("Password changed.".to_string()))
        }
        Err(e) => (Some(e.to_string()), None),
    };
    let current = profile.get().await.ok();
    viewer.show(Tab::Profile, profile_view(current.as_ref(), error, notice))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{app_for, body_text, form_post, get_as, location, session_cookie, set_cookies};
    use axum::http::StatusCode;
    use httpmock::prelude::*;
    use serde_json::json;
    use tower::ServiceExt;

    fn session_json(id: u32, title: &str) -> serde_json::Value {
        json!({
            "id": id, "labId": 1, "title": title, "date": "2024-05-06",
            "startTime": "09:00:00", "endTime": "11:00:00"
        })
    }

    fn item_json(id: u32, course: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id, "claimId": 50, "courseCode": course, "claimType": "MARKING",
            "quantity": 40, "status": status
        })
    }

    #[tokio::test]
    async fn panels_outside_the_role_are_forbidden() {
        let server = MockServer::start_async().await;
        let list = server
            .mock_async(|when, then| {
                when.path("/user");
                then.status(200).json_body(json!({ "data": [], "total": 0 }));
            })
            .await;

        let response = app_for(&server).oneshot(get_as("/tabs/users", "STUDENT")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        list.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn viewers_cannot_write_to_panels_they_only_read() {
        let server = MockServer::start_async().await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/lab-sessions/1");
                then.status(200);
            })
            .await;

        let response = app_for(&server)
            .oneshot(form_post("/tabs/lab-sessions/1/delete", Some(session_cookie("STUDENT")), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        delete.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn deleting_a_lab_session_renders_remaining_sessions() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/lab-sessions");
                then.status(200).json_body(json!([
                    session_json(1, "Databases practical"),
                    session_json(2, "Networks practical"),
                    session_json(3, "OS practical"),
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/computer-labs");
                then.status(200).json_body(json!([{ "id": 1, "name": "Lab A", "capacity": 40 }]));
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/lab-sessions/2");
                then.status(200).json_body(json!({ "message": "Deleted" }));
            })
            .await;

        let response = app_for(&server)
            .oneshot(form_post(
                "/tabs/lab-sessions/2/delete",
                Some(session_cookie("LAB_ALLOCATION_ADMIN")),
                "",
            ))
            .await
            .unwrap();

        delete.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Databases practical"));
        assert!(html.contains("OS practical"));
        assert!(!html.contains("Networks practical"));
        assert!(html.contains("Lab session deleted."));
    }

    #[tokio::test]
    async fn claim_batch_from_textarea_adds_pending_items() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/exam-claims/my");
                then.status(200).json_body(json!([
                    { "id": 40, "academicYear": "2022/2023", "semester": 2, "items": [item_json(1, "CSC1111", "APPROVED")] }
                ]));
            })
            .await;
        let header = server
            .mock_async(|when, then| {
                when.method(POST).path("/exam-claims");
                then.status(201).json_body(json!({ "id": 50, "academicYear": "2023/2024", "semester": 1 }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/exam-claims/50/items")
                    .json_body(json!({ "courseCode": "CSC2213", "claimType": "MARKING", "quantity": 40 }));
                then.status(201).json_body(item_json(2, "CSC2213", "PENDING"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/exam-claims/50/items")
                    .json_body(json!({ "courseCode": "CSC3321", "claimType": "MARKING", "quantity": 40 }));
                then.status(201).json_body(item_json(3, "CSC3321", "PENDING"));
            })
            .await;

        let body = "academic_year=2023%2F2024&semester=1&items=csc2213%2C+marking%2C+40%0D%0ACSC3321%2C+MARKING%2C+40";
        let response = app_for(&server)
            .oneshot(form_post("/tabs/exam-claims", Some(session_cookie("ACADEMIC")), body))
            .await
            .unwrap();

        header.assert_async().await;
        let html = body_text(response).await;
        assert!(html.contains("Claim submitted with 2 item(s)."), "{html}");
        assert!(html.contains("CSC1111"));
        assert!(html.contains("CSC2213"));
        assert!(html.contains("CSC3321"));
    }

    #[tokio::test]
    async fn claim_items_saved_before_a_rejection_stay_listed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/exam-claims/my");
                then.status(200).json_body(json!([]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/exam-claims");
                then.status(201).json_body(json!({ "id": 51, "academicYear": "2023/2024", "semester": 1 }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/exam-claims/51/items")
                    .json_body(json!({ "courseCode": "CSC2213", "claimType": "MARKING", "quantity": 40 }));
                then.status(201).json_body(item_json(4, "CSC2213", "PENDING"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/exam-claims/51/items")
                    .json_body(json!({ "courseCode": "CSC9999", "claimType": "MARKING", "quantity": 40 }));
                then.status(400).json_body(json!({ "message": "Course CSC9999 does not exist" }));
            })
            .await;

        let body = "academic_year=2023%2F2024&semester=1&items=CSC2213%2C+MARKING%2C+40%0D%0ACSC9999%2C+MARKING%2C+40";
        let response = app_for(&server)
            .oneshot(form_post("/tabs/exam-claims", Some(session_cookie("ACADEMIC")), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("CSC2213"), "{html}");
        assert!(html.contains("Course CSC9999 does not exist"));
        assert!(html.contains("1 item(s) were saved before the error."));
    }

    #[tokio::test]
    async fn created_lab_still_shows_why_the_list_did_not_load() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/computer-labs");
                then.status(503).json_body(json!({ "message": "Lab directory unavailable" }));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/computer-labs");
                then.status(201).json_body(json!({ "id": 8, "name": "Lab C", "capacity": 30 }));
            })
            .await;

        let response = app_for(&server)
            .oneshot(form_post(
                "/tabs/labs",
                Some(session_cookie("LAB_ALLOCATION_ADMIN")),
                "name=Lab+C&location=&capacity=30&description=",
            ))
            .await
            .unwrap();

        create.assert_async().await;
        let html = body_text(response).await;
        assert!(html.contains("Lab created."), "{html}");
        assert!(html.contains("Lab C"));
        assert!(html.contains("Lab directory unavailable"));
    }

    #[tokio::test]
    async fn empty_claim_batch_is_refused_locally() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/exam-claims/my");
                then.status(200).json_body(json!([]));
            })
            .await;
        let header = server
            .mock_async(|when, then| {
                when.method(POST).path("/exam-claims");
                then.status(201);
            })
            .await;

        let response = app_for(&server)
            .oneshot(form_post(
                "/tabs/exam-claims",
                Some(session_cookie("ACADEMIC")),
                "academic_year=2023%2F2024&semester=1&items=",
            ))
            .await
            .unwrap();

        header.assert_hits_async(0).await;
        let html = body_text(response).await;
        assert!(html.contains("add at least one claim item"));
    }

    #[tokio::test]
    async fn approving_a_claim_item_removes_it_from_pending_queue() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/exam-claims/items");
                then.status(200).json_body(json!([
                    item_json(7, "CSC2213", "PENDING"),
                    item_json(8, "CSC3321", "PENDING"),
                ]));
            })
            .await;
        let approve = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/exam-claims/items/7/status")
                    .json_body(json!({ "status": "APPROVED" }));
                then.status(200).json_body(item_json(7, "CSC2213", "APPROVED"));
            })
            .await;

        let response = app_for(&server)
            .oneshot(form_post(
                "/tabs/claim-review/7/approved",
                Some(session_cookie("EXAM_CLAIMS_ADMIN")),
                "",
            ))
            .await
            .unwrap();

        approve.assert_async().await;
        let html = body_text(response).await;
        assert!(html.contains("PENDING (1)"), "{html}");
        assert!(html.contains("APPROVED (1)"));
        assert!(html.contains("CSC2213 MARKING is now APPROVED."));
        assert!(html.contains("CSC3321"));
    }

    #[tokio::test]
    async fn users_page_shows_pager_links() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/user").query_param("page", "2").query_param("limit", "10");
                then.status(200).json_body(json!({
                    "data": [{ "id": 11, "email": "a@uni.test", "role": "STUDENT" }],
                    "total": 25, "page": 2, "limit": 10
                }));
            })
            .await;

        let response = app_for(&server)
            .oneshot(get_as("/tabs/users?page=2", "ADMIN"))
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Page 2 of 3"));
        assert!(html.contains("Previous"));
        assert!(html.contains("Next"));
    }

    #[tokio::test]
    async fn opening_an_unread_notification_marks_it_read() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/notifications/4");
                then.status(200).json_body(json!({
                    "id": 4, "title": "Room change", "message": "CSC2213 moves to Hall B", "isRead": false
                }));
            })
            .await;
        let read = server
            .mock_async(|when, then| {
                when.method(PATCH).path("/notifications/4/read");
                then.status(200).json_body(json!({ "id": 4, "title": "Room change", "isRead": true }));
            })
            .await;

        let response = app_for(&server)
            .oneshot(get_as("/tabs/notifications/4", "STUDENT"))
            .await
            .unwrap();

        read.assert_async().await;
        let html = body_text(response).await;
        assert!(html.contains("CSC2213 moves to Hall B"));
    }

    #[tokio::test]
    async fn expired_backend_session_mid_panel_sends_to_login() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/computer-labs");
                then.status(401).json_body(json!({ "message": "Unauthorized" }));
            })
            .await;

        let response = app_for(&server).oneshot(get_as("/tabs/labs", "ADMIN")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login?expired=1");
        assert!(set_cookies(&response).iter().any(|c| c.starts_with("rms_auth=;")));
    }

    #[tokio::test]
    async fn timetable_lookup_uses_day_and_time_filter() {
        let server = MockServer::start_async().await;
        let lookup = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/timetable")
                    .query_param("day", "TUESDAY")
                    .query_param("time", "10:00");
                then.status(200).json_body(json!([{
                    "id": 9, "day": "TUESDAY", "startTime": "10:00:00", "endTime": "12:00:00",
                    "courseCode": "CSC2213", "room": "Hall B"
                }]));
            })
            .await;

        let response = app_for(&server)
            .oneshot(get_as("/tabs/timetable?day=TUESDAY&time=10%3A00", "STUDENT"))
            .await
            .unwrap();

        lookup.assert_async().await;
        let html = body_text(response).await;
        assert!(html.contains("CSC2213"));
        assert!(!html.contains("Edit slot"));
    }
}
