use super::client::{ApiClient, ApiError, ApiRequest};
use super::endpoints;
use super::panel::ResourceSource;
use crate::models::timetable::{
    ConflictRequest, NewConflictRequest, Room, SlotQuery, SlotUpdate, TimetableSlot,
};
use crate::models::RecordId;
use crate::utils::validation::require_min_len;
use async_trait::async_trait;
use reqwest::Method;

pub struct TimetableApi<'a> {
    client: &'a ApiClient,
}

pub struct ConflictsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn timetable(&self) -> TimetableApi<'_> {
        TimetableApi { client: self }
    }

    pub fn conflicts(&self) -> ConflictsApi<'_> {
        ConflictsApi { client: self }
    }
}

impl TimetableApi<'_> {
    pub async fn lookup(&self, query: &SlotQuery) -> Result<Vec<TimetableSlot>, ApiError> {
        let request = ApiRequest::new(Method::GET, endpoints::TIMETABLE)
            .query("day", &query.day)
            .query("time", &query.time);
        self.client.send(request).await
    }

    pub async fn update_slot(&self, id: &RecordId, update: &SlotUpdate) -> Result<TimetableSlot, ApiError> {
        self.client.patch(endpoints::timetable_slot(id), update).await
    }

    pub async fn rooms(&self) -> Result<Vec<Room>, ApiError> {
        self.client.get(endpoints::TIMETABLE_ROOMS).await
    }
}

impl ConflictsApi<'_> {
    pub async fn create(&self, request: &NewConflictRequest) -> Result<ConflictRequest, ApiError> {
        require_min_len("courseCode", &request.course_code, 3)?;
        require_min_len("description", &request.description, 10)?;
        self.client.post(endpoints::CONFLICT_REQUESTS, request).await
    }

    pub async fn list(&self) -> Result<Vec<ConflictRequest>, ApiError> {
        self.client.get(endpoints::CONFLICT_REQUESTS).await
    }

    pub async fn mark_viewed(&self, id: &RecordId) -> Result<ConflictRequest, ApiError> {
        self.client
            .patch(endpoints::conflict_request_viewed(id), &serde_json::json!({}))
            .await
    }
}

#[async_trait]
impl ResourceSource<ConflictRequest> for ConflictsApi<'_> {
    async fn fetch_all(&self) -> Result<Vec<ConflictRequest>, ApiError> {
        self.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::client::tests::logged_in_client;
    use crate::services::panel::ResourcePanel;
    use chrono::{NaiveTime, Weekday};
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn lookup_filters_by_day_and_time() {
        let server = MockServer::start_async().await;
        let lookup = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/timetable")
                    .query_param("day", "TUESDAY")
                    .query_param("time", "10:00");
                then.status(200).json_body(json!([{
                    "id": 9, "day": "TUESDAY", "startTime": "10:00:00", "endTime": "12:00:00",
                    "courseCode": "CSC2233", "room": "LT1"
                }]));
            })
            .await;
        let (client, _) = logged_in_client(&server);

        let query = SlotQuery::new(Weekday::Tue, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        let slots = client.timetable().lookup(&query).await.unwrap();
        assert_eq!(slots[0].room.as_deref(), Some("LT1"));
        lookup.assert_async().await;
    }

    #[tokio::test]
    async fn marking_conflict_viewed_updates_it_in_place() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/time-conflict-requests");
                then.status(200).json_body(json!([
                    { "id": 1, "courseCode": "CSC3311", "day": "MONDAY", "time": "08:00", "description": "Clashes with MAT3312" },
                    { "id": 2, "courseCode": "CSC3322", "day": "FRIDAY", "time": "13:00", "description": "Room double booked" }
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PATCH).path("/time-conflict-requests/2/viewed");
                then.status(200).json_body(json!(
                    { "id": 2, "courseCode": "CSC3322", "day": "FRIDAY", "time": "13:00", "description": "Room double booked", "viewed": true }
                ));
            })
            .await;
        let (client, _) = logged_in_client(&server);
        let api = client.conflicts();

        let mut panel: ResourcePanel<ConflictRequest> = ResourcePanel::new();
        panel.refresh(&api).await;
        let id = RecordId::new("2");
        assert!(panel.confirm_updated(api.mark_viewed(&id).await));

        let viewed: Vec<bool> = panel.items().iter().map(|c| c.viewed).collect();
        assert_eq!(viewed, [false, true]);
    }
}
