use super::client::{ApiClient, ApiError};
use super::endpoints;
use super::panel::ResourceSource;
use crate::models::labs::{
    Computer, ComputerUpdate, Lab, LabBooking, LabSession, LabUpdate, NewComputer, NewLab,
    NewLabBooking, NewLabSession,
};
use crate::models::RecordId;
use crate::utils::validation::{require_min_len, ValidationError};
use async_trait::async_trait;

pub struct LabsApi<'a> {
    client: &'a ApiClient,
}

pub struct ComputersApi<'a> {
    client: &'a ApiClient,
}

pub struct LabSessionsApi<'a> {
    client: &'a ApiClient,
}

pub struct LabBookingsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn labs(&self) -> LabsApi<'_> {
        LabsApi { client: self }
    }

    pub fn computers(&self) -> ComputersApi<'_> {
        ComputersApi { client: self }
    }

    pub fn lab_sessions(&self) -> LabSessionsApi<'_> {
        LabSessionsApi { client: self }
    }

    pub fn lab_bookings(&self) -> LabBookingsApi<'_> {
        LabBookingsApi { client: self }
    }
}

fn check_time_range(start: chrono::NaiveTime, end: chrono::NaiveTime) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError::new("endTime", "end time must be after start time"));
    }
    Ok(())
}

impl LabsApi<'_> {
    pub async fn create(&self, lab: &NewLab) -> Result<Lab, ApiError> {
        require_min_len("name", &lab.name, 2)?;
        if lab.capacity == 0 {
            return Err(ValidationError::new("capacity", "capacity must be at least 1").into());
        }
        self.client.post(endpoints::LABS, lab).await
    }

    pub async fn list(&self) -> Result<Vec<Lab>, ApiError> {
        self.client.get(endpoints::LABS).await
    }

    pub async fn update(&self, id: &RecordId, update: &LabUpdate) -> Result<Lab, ApiError> {
        self.client.patch(endpoints::lab(id), update).await
    }
}

#[async_trait]
impl ResourceSource<Lab> for LabsApi<'_> {
    async fn fetch_all(&self) -> Result<Vec<Lab>, ApiError> {
        self.list().await
    }
}

impl ComputersApi<'_> {
    pub async fn create(&self, computer: &NewComputer) -> Result<Computer, ApiError> {
        require_min_len("name", &computer.name, 2)?;
        self.client.post(endpoints::COMPUTERS, computer).await
    }

    pub async fn list(&self) -> Result<Vec<Computer>, ApiError> {
        self.client.get(endpoints::COMPUTERS).await
    }

    pub async fn list_in_lab(&self, lab_id: &RecordId) -> Result<Vec<Computer>, ApiError> {
        self.client.get(endpoints::computers_in_lab(lab_id)).await
    }

    pub async fn update(&self, id: &RecordId, update: &ComputerUpdate) -> Result<Computer, ApiError> {
        self.client.patch(endpoints::computer(id), update).await
    }

    pub async fn delete(&self, id: &RecordId) -> Result<(), ApiError> {
        self.client.delete::<serde_json::Value>(endpoints::computer(id)).await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceSource<Computer> for ComputersApi<'_> {
    async fn fetch_all(&self) -> Result<Vec<Computer>, ApiError> {
        self.list().await
    }
}

impl LabSessionsApi<'_> {
    pub async fn create(&self, session: &NewLabSession) -> Result<LabSession, ApiError> {
        require_min_len("title", &session.title, 3)?;
        check_time_range(session.start_time, session.end_time)?;
        self.client.post(endpoints::LAB_SESSIONS, session).await
    }

    pub async fn list(&self) -> Result<Vec<LabSession>, ApiError> {
        self.client.get(endpoints::LAB_SESSIONS).await
    }

    pub async fn list_in_lab(&self, lab_id: &RecordId) -> Result<Vec<LabSession>, ApiError> {
        self.client.get(endpoints::lab_sessions_in_lab(lab_id)).await
    }

    pub async fn delete(&self, id: &RecordId) -> Result<(), ApiError> {
        self.client.delete::<serde_json::Value>(endpoints::lab_session(id)).await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceSource<LabSession> for LabSessionsApi<'_> {
    async fn fetch_all(&self) -> Result<Vec<LabSession>, ApiError> {
        self.list().await
    }
}

impl LabBookingsApi<'_> {
    pub async fn create(&self, booking: &NewLabBooking) -> Result<LabBooking, ApiError> {
        require_min_len("purpose", &booking.purpose, 5)?;
        check_time_range(booking.start_time, booking.end_time)?;
        self.client.post(endpoints::LAB_BOOKINGS, booking).await
    }

    pub async fn list_mine(&self) -> Result<Vec<LabBooking>, ApiError> {
        self.client.get(endpoints::MY_LAB_BOOKINGS).await
    }
}

#[async_trait]
impl ResourceSource<LabBooking> for LabBookingsApi<'_> {
    async fn fetch_all(&self) -> Result<Vec<LabBooking>, ApiError> {
        self.list_mine().await
    }
}
