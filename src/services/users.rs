use super::client::{ApiClient, ApiError, ApiRequest};
use super::endpoints;
use crate::models::auth::{NewUser, UserSummary};
use crate::models::role::Role;
use crate::models::Page;
use crate::utils::validation::{require_min_len, validate_email, validate_new_password};
use reqwest::Method;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub struct UsersApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi { client: self }
    }
}

impl UsersApi<'_> {
    pub async fn create(&self, user: &NewUser) -> Result<UserSummary, ApiError> {
        validate_email(&user.email)?;
        require_min_len("firstName", &user.first_name, 2)?;
        require_min_len("lastName", &user.last_name, 2)?;
        validate_new_password(&user.password, &user.password)?;
        self.client.post(endpoints::USERS, user).await
    }

    pub async fn list(&self, page: u32, limit: u32) -> Result<Page<UserSummary>, ApiError> {
        let request = ApiRequest::new(Method::GET, endpoints::USERS)
            .query("page", page.max(1))
            .query("limit", limit);
        self.client.send(request).await
    }

    pub async fn search_by_role(&self, role: Role, page: u32, limit: u32) -> Result<Page<UserSummary>, ApiError> {
        let request = ApiRequest::new(Method::GET, endpoints::USER_SEARCH)
            .query("role", role)
            .query("page", page.max(1))
            .query("limit", limit);
        self.client.send(request).await
    }
}
