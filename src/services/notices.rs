use super::client::{ApiClient, ApiError};
use super::endpoints;
use super::panel::ResourceSource;
use crate::models::notices::{Announcement, NewAnnouncement, Notification};
use crate::models::RecordId;
use crate::utils::validation::require_min_len;
use async_trait::async_trait;

pub struct AnnouncementsApi<'a> {
    client: &'a ApiClient,
}

pub struct NotificationsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn announcements(&self) -> AnnouncementsApi<'_> {
        AnnouncementsApi { client: self }
    }

    pub fn notifications(&self) -> NotificationsApi<'_> {
        NotificationsApi { client: self }
    }
}

impl AnnouncementsApi<'_> {
    pub async fn create(&self, announcement: &NewAnnouncement) -> Result<Announcement, ApiError> {
        require_min_len("title", &announcement.title, 3)?;
        require_min_len("content", &announcement.content, 10)?;
        self.client.post(endpoints::ANNOUNCEMENTS, announcement).await
    }

    pub async fn list_mine(&self) -> Result<Vec<Announcement>, ApiError> {
        self.client.get(endpoints::MY_ANNOUNCEMENTS).await
    }
}

#[async_trait]
impl ResourceSource<Announcement> for AnnouncementsApi<'_> {
    async fn fetch_all(&self) -> Result<Vec<Announcement>, ApiError> {
        self.list_mine().await
    }
}

impl NotificationsApi<'_> {
    pub async fn list(&self) -> Result<Vec<Notification>, ApiError> {
        self.client.get(endpoints::NOTIFICATIONS).await
    }

    pub async fn get(&self, id: &RecordId) -> Result<Notification, ApiError> {
        self.client.get(endpoints::notification(id)).await
    }

    pub async fn mark_read(&self, id: &RecordId) -> Result<Notification, ApiError> {
        self.client
            .patch(endpoints::notification_read(id), &serde_json::json!({}))
            .await
    }

    pub async fn mark_unread(&self, id: &RecordId) -> Result<Notification, ApiError> {
        self.client
            .patch(endpoints::notification_unread(id), &serde_json::json!({}))
            .await
    }

    pub async fn delete(&self, id: &RecordId) -> Result<(), ApiError> {
        self.client
            .delete::<serde_json::Value>(endpoints::notification(id))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceSource<Notification> for NotificationsApi<'_> {
    async fn fetch_all(&self) -> Result<Vec<Notification>, ApiError> {
        self.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::client::tests::logged_in_client;
    use crate::services::panel::ResourcePanel;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn read_state_toggles_in_place() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/notifications");
                then.status(200).json_body(json!([
                    { "id": "n1", "title": "Claim approved", "isRead": false },
                    { "id": "n2", "title": "Lab moved", "isRead": true }
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PATCH).path("/notifications/n1/read");
                then.status(200).json_body(json!({ "id": "n1", "title": "Claim approved", "isRead": true }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PATCH).path("/notifications/n2/unread");
                then.status(200).json_body(json!({ "id": "n2", "title": "Lab moved", "isRead": false }));
            })
            .await;
        let (client, _) = logged_in_client(&server);
        let api = client.notifications();

        let mut panel: ResourcePanel<Notification> = ResourcePanel::new();
        panel.refresh(&api).await;
        panel.confirm_updated(api.mark_read(&RecordId::new("n1")).await);
        panel.confirm_updated(api.mark_unread(&RecordId::new("n2")).await);

        let read: Vec<bool> = panel.items().iter().map(|n| n.is_read).collect();
        assert_eq!(read, [true, false]);
    }

    #[tokio::test]
    async fn announcement_content_is_checked_before_posting() {
        let server = MockServer::start_async().await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST).path("/announcements");
                then.status(201);
            })
            .await;
        let (client, _) = logged_in_client(&server);

        let announcement = NewAnnouncement {
            title: "Exam venues".to_string(),
            content: "TBA".to_string(),
            audience: None,
        };
        let err = client.announcements().create(&announcement).await.unwrap_err();
        assert_eq!(err.to_string(), "content must be at least 10 characters");
        post.assert_hits_async(0).await;
    }
}
