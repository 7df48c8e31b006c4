use super::client::{ApiClient, ApiError};
use super::endpoints;
use super::panel::ResourceSource;
use crate::models::claims::{
    ClaimDraft, ClaimItemDraft, ClaimStatus, ClaimStatusUpdate, ExamClaim, ExamClaimItem,
    NewExamClaim,
};
use crate::models::RecordId;
use async_trait::async_trait;
use tracing::{info, warn};

/// A claim batch that stopped early. `created` holds the items the backend
/// stored before `source` ended the batch.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct PartialBatch {
    pub created: Vec<ExamClaimItem>,
    pub source: ApiError,
}

impl From<ApiError> for PartialBatch {
    fn from(source: ApiError) -> Self {
        Self {
            created: Vec::new(),
            source,
        }
    }
}

pub struct ClaimsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn claims(&self) -> ClaimsApi<'_> {
        ClaimsApi { client: self }
    }
}

impl ClaimsApi<'_> {
    pub async fn create(&self, claim: &NewExamClaim) -> Result<ExamClaim, ApiError> {
        self.client.post(endpoints::EXAM_CLAIMS, claim).await
    }

    pub async fn add_item(&self, claim_id: &RecordId, item: &ClaimItemDraft) -> Result<ExamClaimItem, ApiError> {
        self.client.post(endpoints::exam_claim_items(claim_id), item).await
    }

    pub async fn list_mine(&self) -> Result<Vec<ExamClaim>, ApiError> {
        self.client.get(endpoints::MY_EXAM_CLAIMS).await
    }

    /// Line items of the caller's own claims.
    pub async fn list_my_items(&self) -> Result<Vec<ExamClaimItem>, ApiError> {
        let claims = self.list_mine().await?;
        Ok(claims.into_iter().flat_map(|claim| claim.items).collect())
    }

    pub async fn list_all_items(&self) -> Result<Vec<ExamClaimItem>, ApiError> {
        self.client.get(endpoints::EXAM_CLAIM_ITEMS).await
    }

    pub async fn update_item_status(
        &self,
        item_id: &RecordId,
        status: ClaimStatus,
        remarks: Option<String>,
    ) -> Result<ExamClaimItem, ApiError> {
        let body = ClaimStatusUpdate { status, remarks };
        self.client
            .patch(endpoints::exam_claim_item_status(item_id), &body)
            .await
    }

    pub async fn delete_item(&self, item_id: &RecordId) -> Result<(), ApiError> {
        self.client
            .delete::<serde_json::Value>(endpoints::exam_claim_item(item_id))
            .await?;
        Ok(())
    }

    /// Validates the whole batch locally, then creates the claim and adds its
    /// items one by one. Returns the items as the backend stored them; on a
    /// failed item the error carries the ones already stored.
    pub async fn submit_batch(&self, draft: &ClaimDraft) -> Result<Vec<ExamClaimItem>, PartialBatch> {
        draft.validate().map_err(ApiError::from)?;

        let claim = self.create(&draft.header()).await?;
        let mut created = Vec::with_capacity(draft.items.len());
        for item in &draft.items {
            match self.add_item(&claim.id, item).await {
                Ok(stored) => created.push(stored),
                Err(source) => {
                    warn!(claim = %claim.id, stored = created.len(), "Exam claim batch stopped: {}", source);
                    return Err(PartialBatch { created, source });
                }
            }
        }
        info!(claim = %claim.id, items = created.len(), "Exam claim submitted");
        Ok(created)
    }
}

/// Review queue: every item, across claimants.
pub struct AllClaimItems<'a>(pub ClaimsApi<'a>);

#[async_trait]
impl ResourceSource<ExamClaimItem> for AllClaimItems<'_> {
    async fn fetch_all(&self) -> Result<Vec<ExamClaimItem>, ApiError> {
        self.0.list_all_items().await
    }
}

#[async_trait]
impl ResourceSource<ExamClaimItem> for ClaimsApi<'_> {
    async fn fetch_all(&self) -> Result<Vec<ExamClaimItem>, ApiError> {
        self.list_my_items().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::claims::{items_with_status, ClaimType};
    use crate::services::client::tests::logged_in_client;
    use crate::services::panel::ResourcePanel;
    use httpmock::prelude::*;
    use serde_json::json;

    fn item_json(id: u32, course: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "claimId": 50,
            "courseCode": course,
            "claimType": "MARKING",
            "quantity": 40,
            "status": status
        })
    }

    fn draft(items: Vec<ClaimItemDraft>) -> ClaimDraft {
        ClaimDraft {
            academic_year: "2023/2024".to_string(),
            semester: 1,
            items,
        }
    }

    fn marking(course: &str) -> ClaimItemDraft {
        ClaimItemDraft {
            course_code: course.to_string(),
            claim_type: ClaimType::Marking,
            quantity: 40,
        }
    }

    #[tokio::test]
    async fn batch_of_two_items_grows_the_list_by_two_pending_items() {
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
                when.method(POST)
                    .path("/exam-claims")
                    .json_body(json!({ "academicYear": "2023/2024", "semester": 1 }));
                then.status(201).json_body(json!({ "id": 50, "academicYear": "2023/2024", "semester": 1 }));
            })
            .await;
        let first = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/exam-claims/50/items")
                    .json_body(json!({ "courseCode": "CSC2213", "claimType": "MARKING", "quantity": 40 }));
                then.status(201).json_body(item_json(2, "CSC2213", "PENDING"));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/exam-claims/50/items")
                    .json_body(json!({ "courseCode": "CSC3321", "claimType": "MARKING", "quantity": 40 }));
                then.status(201).json_body(item_json(3, "CSC3321", "PENDING"));
            })
            .await;
        let (client, _) = logged_in_client(&server);
        let api = client.claims();

        let mut panel: ResourcePanel<ExamClaimItem> = ResourcePanel::new();
        panel.refresh(&api).await;
        assert_eq!(panel.items().len(), 1);

        panel.begin_submit();
        let created = api
            .submit_batch(&draft(vec![marking("CSC2213"), marking("CSC3321")]))
            .await
            .unwrap();
        assert!(panel.confirm_created_many(Ok(created)));

        header.assert_async().await;
        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(panel.items().len(), 3);
        assert_eq!(items_with_status(panel.items(), ClaimStatus::Pending).len(), 2);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_without_network_call() {
        let server = MockServer::start_async().await;
        let header = server
            .mock_async(|when, then| {
                when.method(POST).path("/exam-claims");
                then.status(201).json_body(json!({ "id": 50, "academicYear": "2023/2024", "semester": 1 }));
            })
            .await;
        let (client, _) = logged_in_client(&server);

        let mut panel: ResourcePanel<ExamClaimItem> = ResourcePanel::new();
        let err = client.claims().submit_batch(&draft(Vec::new())).await.unwrap_err();
        assert!(matches!(err.source, ApiError::Validation(_)));
        assert!(err.created.is_empty());
        panel.confirm_partial(err.created, err.source);

        header.assert_hits_async(0).await;
        assert!(panel.items().is_empty());
        assert_eq!(panel.error(), Some("add at least one claim item"));
    }

    #[tokio::test]
    async fn approving_moves_item_from_pending_to_approved_view() {
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
        let (client, _) = logged_in_client(&server);
        let api = client.claims();

        let mut panel: ResourcePanel<ExamClaimItem> = ResourcePanel::new();
        panel.refresh(&AllClaimItems(client.claims())).await;

        let id = RecordId::new("7");
        let result = api.update_item_status(&id, ClaimStatus::Approved, None).await;
        assert!(panel.confirm_updated(result));
        approve.assert_async().await;

        let ids = |status: ClaimStatus| -> Vec<String> {
            items_with_status(panel.items(), status)
                .into_iter()
                .map(|item| item.id.to_string())
                .collect()
        };
        assert_eq!(ids(ClaimStatus::Pending), ["8"]);
        assert_eq!(ids(ClaimStatus::Approved), ["7"]);
        assert!(ids(ClaimStatus::Rejected).is_empty());
    }

    #[tokio::test]
    async fn failed_item_in_batch_surfaces_backend_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/exam-claims");
                then.status(201).json_body(json!({ "id": 51, "academicYear": "2023/2024", "semester": 1 }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/exam-claims/51/items");
                then.status(400).json_body(json!({ "message": "Course CSC9999 does not exist" }));
            })
            .await;
        let (client, _) = logged_in_client(&server);

        let err = client
            .claims()
            .submit_batch(&draft(vec![marking("CSC9999")]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Course CSC9999 does not exist");
        assert!(err.created.is_empty());
    }

    #[tokio::test]
    async fn items_stored_before_a_failure_still_reach_the_panel() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/exam-claims");
                then.status(201).json_body(json!({ "id": 60, "academicYear": "2023/2024", "semester": 1 }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/exam-claims/60/items")
                    .json_body(json!({ "courseCode": "CSC2213", "claimType": "MARKING", "quantity": 40 }));
                then.status(201).json_body(item_json(9, "CSC2213", "PENDING"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/exam-claims/60/items")
                    .json_body(json!({ "courseCode": "CSC9999", "claimType": "MARKING", "quantity": 40 }));
                then.status(400).json_body(json!({ "message": "no such course" }));
            })
            .await;
        let (client, _) = logged_in_client(&server);

        let mut panel: ResourcePanel<ExamClaimItem> = ResourcePanel::new();
        let err = client
            .claims()
            .submit_batch(&draft(vec![marking("CSC2213"), marking("CSC9999")]))
            .await
            .unwrap_err();
        assert_eq!(err.created.len(), 1);
        panel.confirm_partial(err.created, err.source);

        let ids: Vec<&str> = panel.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["9"]);
        assert_eq!(panel.error(), Some("no such course"));
    }
}
