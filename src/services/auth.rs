use super::client::{ApiClient, ApiError, ApiRequest};
use super::endpoints;
use crate::models::auth::{
    Ack, AuthData, ChangePasswordRequest, LoginRequest, LoginResponse, OtpRequest,
    OtpVerification, PasswordResetRequest, ProfileUpdate, SessionValidation, SignupRequest,
    UserProfile, UserSession,
};
use crate::models::RecordId;
use crate::utils::validation::{
    require_min_len, validate_email, validate_new_password, validate_otp, ValidationError,
    MAX_PASSWORD_LEN,
};
use reqwest::Method;
use tracing::info;

/// Login, logout, signup, OTP and device-session calls.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }

    pub fn profile(&self) -> ProfileApi<'_> {
        ProfileApi { client: self }
    }
}

impl AuthApi<'_> {
    /// Logs in and stores the returned session.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthData, ApiError> {
        validate_email(&request.email)?;
        if request.password.is_empty() || request.password.len() > MAX_PASSWORD_LEN {
            return Err(ValidationError::new("password", "enter your password").into());
        }

        let response: LoginResponse = self
            .client
            .send_public(ApiRequest::new(Method::POST, endpoints::LOGIN).json(request)?)
            .await?;
        let auth = AuthData::from(response);
        self.client.session().save(&auth)?;
        info!(user = %auth.user.email, role = %auth.user.role, "Logged in");
        Ok(auth)
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<Ack, ApiError> {
        require_min_len("firstName", &request.first_name, 2)?;
        require_min_len("lastName", &request.last_name, 2)?;
        validate_email(&request.email)?;
        validate_new_password(&request.password, &request.confirm_password)?;
        validate_otp(&request.otp)?;
        self.client
            .send_public(ApiRequest::new(Method::POST, endpoints::SIGNUP).json(request)?)
            .await
    }

    pub async fn validate_session(&self) -> Result<SessionValidation, ApiError> {
        self.client.get(endpoints::VALIDATE_SESSION).await
    }

    /// Logs this device out. The local session is cleared even when the
    /// backend call fails.
    pub async fn logout(&self) -> Result<Ack, ApiError> {
        let result = self.client.post(endpoints::LOGOUT, &serde_json::json!({})).await;
        self.client.session().remove();
        result
    }

    pub async fn logout_all(&self) -> Result<Ack, ApiError> {
        let result = self.client.post(endpoints::LOGOUT_ALL, &serde_json::json!({})).await;
        self.client.session().remove();
        result
    }

    pub async fn logout_device(&self, session_id: &RecordId) -> Result<Ack, ApiError> {
        self.client.delete(endpoints::logout_device(session_id)).await
    }

    pub async fn sessions(&self) -> Result<Vec<UserSession>, ApiError> {
        self.client.get(endpoints::SESSIONS).await
    }

    pub async fn send_email_otp(&self, email: &str) -> Result<Ack, ApiError> {
        validate_email(email)?;
        let body = OtpRequest {
            email: email.trim().to_string(),
        };
        self.client
            .send_public(ApiRequest::new(Method::POST, endpoints::EMAIL_SEND_OTP).json(&body)?)
            .await
    }

    pub async fn verify_email_otp(&self, verification: &OtpVerification) -> Result<Ack, ApiError> {
        validate_otp(&verification.otp)?;
        self.client
            .send_public(ApiRequest::new(Method::POST, endpoints::EMAIL_VERIFY_OTP).json(verification)?)
            .await
    }

    pub async fn send_password_reset_otp(&self, email: &str) -> Result<Ack, ApiError> {
        validate_email(email)?;
        let body = OtpRequest {
            email: email.trim().to_string(),
        };
        self.client
            .send_public(ApiRequest::new(Method::POST, endpoints::PASSWORD_RESET_SEND_OTP).json(&body)?)
            .await
    }

    pub async fn reset_password(&self, request: &PasswordResetRequest) -> Result<Ack, ApiError> {
        validate_email(&request.email)?;
        validate_otp(&request.otp)?;
        validate_new_password(&request.new_password, &request.confirm_password)?;
        self.client
            .send_public(ApiRequest::new(Method::POST, endpoints::PASSWORD_RESET_VERIFY_OTP).json(request)?)
            .await
    }
}

pub struct ProfileApi<'a> {
    client: &'a ApiClient,
}

impl ProfileApi<'_> {
    pub async fn get(&self) -> Result<UserProfile, ApiError> {
        self.client.get(endpoints::PROFILE).await
    }

    pub async fn update(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        self.client.patch(endpoints::PROFILE, update).await
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<Ack, ApiError> {
        if request.current_password.is_empty() {
            return Err(ValidationError::new("currentPassword", "enter your current password").into());
        }
        validate_new_password(&request.new_password, &request.confirm_password)?;
        self.client.post(endpoints::CHANGE_PASSWORD, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::client::tests::{auth, logged_in_client};
    use crate::services::session::{MemorySessionStore, SessionStore};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    fn login_request(password: &str) -> LoginRequest {
        LoginRequest {
            email: "hod@uni.test".to_string(),
            password: password.to_string(),
            device_id: Some("device-1".to_string()),
            device_name: None,
        }
    }

    #[tokio::test]
    async fn login_persists_returned_session() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/login")
                    .json_body(json!({ "email": "hod@uni.test", "password": "pa55word!", "deviceId": "device-1" }));
                then.status(201).json_body(json!({
                    "accessToken": "fresh",
                    "user": { "id": 3, "email": "hod@uni.test", "role": "ACADEMIC" }
                }));
            })
            .await;
        let store = Arc::new(MemorySessionStore::new());
        let client = ApiClient::from_parts(reqwest::Client::new(), &server.base_url(), store.clone());

        let data = client.auth().login(&login_request("pa55word!")).await.unwrap();

        login.assert_async().await;
        assert_eq!(data.user.dashboard_path(), "/academic");
        assert_eq!(store.get(), Some(data));
    }

    #[tokio::test]
    async fn login_with_empty_password_never_leaves_the_client() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.path("/auth/login");
                then.status(500);
            })
            .await;
        let client = ApiClient::from_parts(
            reqwest::Client::new(),
            &server.base_url(),
            Arc::new(MemorySessionStore::new()),
        );

        let err = client.auth().login(&login_request("")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        login.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn logout_clears_local_session_even_on_backend_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/logout");
                then.status(500).json_body(json!({ "message": "Internal server error" }));
            })
            .await;
        let (client, store) = logged_in_client(&server);

        assert!(client.auth().logout().await.is_err());
        assert_eq!(store.get(), None);
    }

    #[tokio::test]
    async fn logout_device_targets_one_session() {
        let server = MockServer::start_async().await;
        let revoke = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/auth/logout-device/s-9");
                then.status(200).json_body(json!({ "message": "Device logged out" }));
            })
            .await;
        let (client, store) = logged_in_client(&server);

        let ack = client.auth().logout_device(&RecordId::new("s-9")).await.unwrap();
        assert_eq!(ack.message.as_deref(), Some("Device logged out"));
        assert_eq!(store.get(), Some(auth("ADMIN")));
        revoke.assert_async().await;
    }

    #[tokio::test]
    async fn reset_password_checks_confirmation_before_sending() {
        let server = MockServer::start_async().await;
        let reset = server
            .mock_async(|when, then| {
                when.path("/password-reset/verify-otp");
                then.status(200);
            })
            .await;
        let (client, _) = logged_in_client(&server);

        let request = PasswordResetRequest {
            email: "hod@uni.test".to_string(),
            otp: "123456".to_string(),
            new_password: "new-password".to_string(),
            confirm_password: "other-password".to_string(),
        };
        let err = client.auth().reset_password(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "passwords do not match");
        reset.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn profile_update_patches_changed_fields() {
        let server = MockServer::start_async().await;
        let patch = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/user-profile")
                    .json_body(json!({ "phone": "+94 77 000 0000" }));
                then.status(200).json_body(json!({
                    "id": 7, "email": "staff@uni.test", "phone": "+94 77 000 0000", "role": "ADMIN"
                }));
            })
            .await;
        let (client, _) = logged_in_client(&server);

        let update = ProfileUpdate {
            phone: Some("+94 77 000 0000".to_string()),
            ..Default::default()
        };
        let profile = client.profile().update(&update).await.unwrap();
        assert_eq!(profile.phone.as_deref(), Some("+94 77 000 0000"));
        patch.assert_async().await;
    }
}
