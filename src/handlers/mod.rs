pub mod panels;
pub mod view;

use crate::models::auth::{AuthData, LoginRequest, OtpVerification, PasswordResetRequest, SignupRequest};
use crate::models::config::AppConfig;
use crate::models::role::{tabs_for, Role, Tab, DEFAULT_DASHBOARD_PATH};
use crate::services::client::{ApiClient, ApiError};
use crate::services::session::{CookieSessionStore, MemorySessionStore, SessionStore};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_cookies::cookie::time::Duration as CookieDuration;
use tower_cookies::{Cookie, CookieManagerLayer, Cookies};
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};
use view::{
    render, render_status, timestamp, DashboardTemplate, ForgotPasswordTemplate, LoginTemplate,
    MessageTemplate, NavView, PanelPage, PanelTemplate, SignupTemplate, SummaryLine,
};

const DEVICE_COOKIE_DAYS: i64 = 365;
const MAX_DEVICE_NAME_LEN: usize = 120;

// State
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: ApiClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, ApiError> {
        // Requests never use this store; each one gets its own cookie store.
        let api = ApiClient::new(&config.api, Arc::new(MemorySessionStore::new()))?;
        Ok(Self::with_client(config, api))
    }

    pub fn with_client(config: AppConfig, api: ApiClient) -> Self {
        Self {
            config: Arc::new(config),
            api,
        }
    }

    pub fn session_store(&self, cookies: Cookies) -> CookieSessionStore {
        let session = &self.config.session;
        CookieSessionStore::new(
            cookies,
            session.cookie_name.clone(),
            session.max_age_hours,
            session.secure_cookies,
        )
    }

    /// API client bound to the caller's session cookie.
    pub fn client_for(&self, cookies: Cookies) -> ApiClient {
        self.api.with_session(Arc::new(self.session_store(cookies)))
    }

    /// Stable per-browser identifier reported to the backend at login.
    fn device_id(&self, cookies: &Cookies) -> String {
        let name = &self.config.session.device_cookie_name;
        if let Some(existing) = cookies.get(name) {
            return existing.value().to_string();
        }
        let id = uuid::Uuid::new_v4().to_string();
        let cookie = Cookie::build((name.clone(), id.clone()))
            .http_only(true)
            .secure(self.config.session.secure_cookies)
            .path("/")
            .max_age(CookieDuration::days(DEVICE_COOKIE_DAYS));
        cookies.add(cookie.into());
        id
    }
}

pub fn create_app(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        .route("/", get(root))
        .route("/login", get(login_page).post(login_handler))
        .route("/signup", get(signup_page).post(signup_handler))
        .route("/signup/otp", post(signup_send_otp))
        .route("/signup/verify", post(signup_verify_otp))
        .route("/forgot-password", get(forgot_password_page).post(forgot_password_handler))
        .route("/reset-password", post(reset_password_handler))
        .route("/logout", get(logout_handler))
        .route("/logout/all", post(logout_all_handler))
        .route("/dashboard", get(default_dashboard))
        .route("/:dashboard", get(role_dashboard))
        .merge(panels::routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

/// A signed-in caller. Extraction redirects to the login page when the
/// session cookie is missing or its token has expired.
pub struct Viewer {
    pub api: ApiClient,
    pub auth: AuthData,
}

#[async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let api = state.client_for(cookies);
        let Some(auth) = api.session().get() else {
            return Err(Redirect::to("/login").into_response());
        };
        if auth.is_expired_at(Utc::now()) {
            info!(user = %auth.user.email, "Session token expired");
            api.session().remove();
            return Err(Redirect::to("/login?expired=1").into_response());
        }
        Ok(Self { api, auth })
    }
}

impl Viewer {
    pub fn role(&self) -> Option<Role> {
        self.auth.user.role()
    }

    pub fn nav(&self, active: Option<Tab>) -> NavView {
        NavView::new(&self.auth, active)
    }

    pub fn can_view(&self, tab: Tab) -> bool {
        tabs_for(self.role()).contains(&tab)
    }

    pub fn manages(&self, tab: Tab) -> bool {
        match self.role() {
            Some(role) => role.manages(tab),
            None => self.can_view(tab),
        }
    }

    pub fn require(&self, tab: Tab) -> Result<(), Response> {
        if self.can_view(tab) {
            return Ok(());
        }
        warn!(user = %self.auth.user.email, role = %self.auth.user.role, tab = tab.slug(), "Panel not permitted");
        Err(self.forbidden())
    }

    pub fn require_manage(&self, tab: Tab) -> Result<(), Response> {
        self.require(tab)?;
        if self.manages(tab) {
            return Ok(());
        }
        warn!(user = %self.auth.user.email, role = %self.auth.user.role, tab = tab.slug(), "Write not permitted");
        Err(self.forbidden())
    }

    fn forbidden(&self) -> Response {
        render_status(
            StatusCode::FORBIDDEN,
            &MessageTemplate {
                nav: Some(self.nav(None)),
                title: "Not allowed".to_string(),
                message: "Your role does not have access to this page.".to_string(),
            },
        )
    }

    /// Fails when an API call in this request dropped the session.
    pub fn still_signed_in(&self) -> Result<(), Response> {
        match self.api.session().get() {
            Some(_) => Ok(()),
            None => Err(Redirect::to("/login?expired=1").into_response()),
        }
    }

    /// Renders a panel page, or sends the caller to login if the backend
    /// rejected their session along the way.
    pub fn show(&self, tab: Tab, page: PanelPage) -> Result<Response, Response> {
        self.still_signed_in()?;
        Ok(render(&PanelTemplate {
            nav: self.nav(Some(tab)),
            page,
        }))
    }

    pub fn message(&self, title: impl Into<String>, message: impl Into<String>) -> Result<Response, Response> {
        self.still_signed_in()?;
        Ok(render(&MessageTemplate {
            nav: Some(self.nav(None)),
            title: title.into(),
            message: message.into(),
        }))
    }
}

// Routes
async fn root(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    let store = state.session_store(cookies);
    match store.get() {
        Some(auth) if !auth.is_expired_at(Utc::now()) => Redirect::to(auth.user.dashboard_path()),
        _ => Redirect::to("/login"),
    }
}

#[derive(Debug, Default, Deserialize)]
struct LoginQuery {
    expired: Option<String>,
    registered: Option<String>,
    reset: Option<String>,
}

impl LoginQuery {
    fn notice(&self) -> Option<String> {
        let message = if self.expired.is_some() {
            "Your session has expired. Please sign in again."
        } else if self.registered.is_some() {
            "Account created. You can sign in now."
        } else if self.reset.is_some() {
            "Password updated. Sign in with your new password."
        } else {
            return None;
        };
        Some(message.to_string())
    }
}

async fn login_page(State(state): State<AppState>, cookies: Cookies, Query(query): Query<LoginQuery>) -> Response {
    if let Some(auth) = state.session_store(cookies).get() {
        if !auth.is_expired_at(Utc::now()) {
            return Redirect::to(auth.user.dashboard_path()).into_response();
        }
    }
    render(&LoginTemplate {
        error: None,
        notice: query.notice(),
        email: String::new(),
    })
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

fn device_name(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|agent| agent.chars().take(MAX_DEVICE_NAME_LEN).collect())
        .unwrap_or_else(|| "Web browser".to_string())
}

async fn login_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let request = LoginRequest {
        email: form.email.trim().to_string(),
        password: form.password,
        device_id: Some(state.device_id(&cookies)),
        device_name: Some(device_name(&headers)),
    };
    let api = state.client_for(cookies);

    match api.auth().login(&request).await {
        Ok(auth) => Redirect::to(auth.user.dashboard_path()).into_response(),
        Err(e) => {
            warn!(email = %request.email, "Login failed: {}", e);
            render(&LoginTemplate {
                error: Some(e.to_string()),
                notice: None,
                email: request.email,
            })
        }
    }
}

async fn logout_handler(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    let api = state.client_for(cookies);
    if api.session().get().is_some() {
        if let Err(e) = api.auth().logout().await {
            warn!("Backend logout failed: {}", e);
        }
    }
    Redirect::to("/login")
}

async fn logout_all_handler(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    let api = state.client_for(cookies);
    if api.session().get().is_some() {
        match api.auth().logout_all().await {
            Ok(_) => info!("Logged out of all devices"),
            Err(e) => warn!("Backend logout-all failed: {}", e),
        }
    }
    Redirect::to("/login")
}

#[derive(Debug, Deserialize)]
struct EmailForm {
    email: String,
}

#[derive(Debug, Deserialize)]
struct OtpForm {
    email: String,
    otp: String,
}

#[derive(Debug, Deserialize)]
struct SignupForm {
    email: String,
    otp: String,
    first_name: String,
    last_name: String,
    password: String,
    confirm_password: String,
}

fn signup_view(email: String) -> SignupTemplate {
    SignupTemplate {
        error: None,
        notice: None,
        email,
        otp: String::new(),
        otp_sent: false,
        verified: false,
    }
}

async fn signup_page() -> Response {
    render(&signup_view(String::new()))
}

async fn signup_send_otp(State(state): State<AppState>, Form(form): Form<EmailForm>) -> Response {
    let email = form.email.trim().to_string();
    let mut page = signup_view(email.clone());
    match state.api.auth().send_email_otp(&email).await {
        Ok(_) => {
            page.otp_sent = true;
            page.notice = Some(format!("We sent a verification code to {email}."));
        }
        Err(e) => page.error = Some(e.to_string()),
    }
    render(&page)
}

async fn signup_verify_otp(State(state): State<AppState>, Form(form): Form<OtpForm>) -> Response {
    let verification = OtpVerification {
        email: form.email.trim().to_string(),
        otp: form.otp.trim().to_string(),
    };
    let mut page = signup_view(verification.email.clone());
    page.otp_sent = true;
    match state.api.auth().verify_email_otp(&verification).await {
        Ok(_) => {
            page.verified = true;
            page.otp = verification.otp;
        }
        Err(e) => page.error = Some(e.to_string()),
    }
    render(&page)
}

async fn signup_handler(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Response {
    let request = SignupRequest {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email: form.email.trim().to_string(),
        password: form.password,
        confirm_password: form.confirm_password,
        otp: form.otp.trim().to_string(),
    };
    match state.api.auth().signup(&request).await {
        Ok(_) => {
            info!(email = %request.email, "Account created");
            Redirect::to("/login?registered=1").into_response()
        }
        Err(e) => {
            let mut page = signup_view(request.email);
            page.error = Some(e.to_string());
            page.otp_sent = true;
            page.verified = true;
            page.otp = request.otp;
            render(&page)
        }
    }
}

fn forgot_view(email: String) -> ForgotPasswordTemplate {
    ForgotPasswordTemplate {
        error: None,
        notice: None,
        email,
        otp_sent: false,
    }
}

async fn forgot_password_page() -> Response {
    render(&forgot_view(String::new()))
}

async fn forgot_password_handler(State(state): State<AppState>, Form(form): Form<EmailForm>) -> Response {
    let email = form.email.trim().to_string();
    let mut page = forgot_view(email.clone());
    match state.api.auth().send_password_reset_otp(&email).await {
        Ok(_) => {
            page.otp_sent = true;
            page.notice = Some(format!("If {email} has an account, a reset code is on its way."));
        }
        Err(e) => page.error = Some(e.to_string()),
    }
    render(&page)
}

#[derive(Debug, Deserialize)]
struct ResetForm {
    email: String,
    otp: String,
    new_password: String,
    confirm_password: String,
}

async fn reset_password_handler(State(state): State<AppState>, Form(form): Form<ResetForm>) -> Response {
    let request = PasswordResetRequest {
        email: form.email.trim().to_string(),
        otp: form.otp.trim().to_string(),
        new_password: form.new_password,
        confirm_password: form.confirm_password,
    };
    match state.api.auth().reset_password(&request).await {
        Ok(_) => {
            info!(email = %request.email, "Password reset");
            Redirect::to("/login?reset=1").into_response()
        }
        Err(e) => {
            let mut page = forgot_view(request.email);
            page.otp_sent = true;
            page.error = Some(e.to_string());
            render(&page)
        }
    }
}

async fn default_dashboard(viewer: Viewer) -> Result<Response, Response> {
    dashboard(viewer, DEFAULT_DASHBOARD_PATH).await
}

async fn role_dashboard(viewer: Viewer, Path(segment): Path<String>) -> Result<Response, Response> {
    let requested = format!("/{segment}");
    if Role::for_dashboard_path(&requested).is_empty() {
        return Err(render_status(
            StatusCode::NOT_FOUND,
            &MessageTemplate {
                nav: Some(viewer.nav(None)),
                title: "Not found".to_string(),
                message: format!("There is no page at {requested}."),
            },
        ));
    }
    dashboard(viewer, &requested).await
}

/// Landing page for the caller's role. Visiting another role's dashboard
/// sends the caller to their own.
async fn dashboard(viewer: Viewer, requested: &str) -> Result<Response, Response> {
    let home = viewer.auth.user.dashboard_path();
    if requested != home {
        return Ok(Redirect::to(home).into_response());
    }

    let shows_announcements = viewer.can_view(Tab::Announcements);
    let auth_api = viewer.api.auth();
    let notifications_api = viewer.api.notifications();
    let announcements_api = viewer.api.announcements();
    let (validation, notifications, announcements) = futures::join!(
        auth_api.validate_session(),
        notifications_api.list(),
        async {
            if shows_announcements {
                Some(announcements_api.list_mine().await)
            } else {
                None
            }
        }
    );

    if let Ok(validation) = &validation {
        if !validation.valid {
            info!(user = %viewer.auth.user.email, "Backend reports session invalid");
            viewer.api.session().remove();
        }
    }
    viewer.still_signed_in()?;

    let mut errors = Vec::new();
    let mut summary = vec![SummaryLine {
        label: "Role".to_string(),
        value: viewer.auth.user.role.clone(),
        href: None,
    }];
    match notifications {
        Ok(items) => summary.push(SummaryLine {
            label: "Unread notifications".to_string(),
            value: items.iter().filter(|n| !n.is_read).count().to_string(),
            href: Some(Tab::Notifications.href()),
        }),
        Err(e) => errors.push(e.to_string()),
    }
    match announcements {
        Some(Ok(items)) => summary.push(SummaryLine {
            label: "Your announcements".to_string(),
            value: items.len().to_string(),
            href: Some(Tab::Announcements.href()),
        }),
        Some(Err(e)) => errors.push(e.to_string()),
        None => {}
    }
    summary.push(SummaryLine {
        label: "Session expires".to_string(),
        value: timestamp(viewer.auth.token_expiry()),
        href: None,
    });

    Ok(render(&DashboardTemplate {
        nav: viewer.nav(None),
        summary,
        error: (!errors.is_empty()).then(|| errors.join("; ")),
    }))
}
