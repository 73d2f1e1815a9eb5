use super::ServiceError;
use crate::domain::clock::{Clock, LocalZone};
use crate::domain::punch::{punch_message, PunchDirection, PunchInput, MISSING_FIELDS_MESSAGE};
use crate::repositories::punches::{PunchParams, PunchRepository};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct PunchReceipt {
    pub action: PunchDirection,
    pub name: String,
    pub phone_number: String,
    pub is_logged_in: bool,
    /// `2024-05-10 17:30:00 IST`
    pub punched_at: String,
    pub time_log_id: Option<i32>,
    pub total_hours: Option<f64>,
    pub message: String,
}

#[async_trait]
pub trait PunchService: Send + Sync {
    async fn punch(
        &self,
        name: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<PunchReceipt, ServiceError>;
}

pub struct PunchServiceImpl {
    repo: Arc<dyn PunchRepository>,
    clock: Arc<dyn Clock>,
    zone: LocalZone,
}

impl PunchServiceImpl {
    pub fn new(repo: Arc<dyn PunchRepository>, clock: Arc<dyn Clock>, zone: LocalZone) -> Self {
        Self { repo, clock, zone }
    }
}

#[async_trait]
impl PunchService for PunchServiceImpl {
    async fn punch(
        &self,
        name: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<PunchReceipt, ServiceError> {
        let input = PunchInput::parse(name, phone_number)
            .ok_or_else(|| ServiceError::bad_request(MISSING_FIELDS_MESSAGE))?;

        let now = self.clock.now();
        let at = now.naive_utc();

        let record = self
            .repo
            .punch(PunchParams {
                phone_number: &input.phone_number,
                name: &input.name,
                at,
                local_date: self.zone.local_date(now),
            })
            .await?;

        let total_hours = match record.direction {
            PunchDirection::Login => None,
            PunchDirection::Logout => record.time_log.as_ref().map(|log| log.total_hours),
        };

        tracing::info!(
            phone = %input.phone_number,
            action = record.direction.as_str(),
            "punch recorded"
        );

        Ok(PunchReceipt {
            action: record.direction,
            message: punch_message(
                record.direction,
                &input.name,
                &self.zone.format_clock(at),
                total_hours,
            ),
            name: input.name,
            phone_number: input.phone_number,
            is_logged_in: record.employee.is_logged_in,
            punched_at: self.zone.format_stamp(Some(at)),
            time_log_id: record.time_log.map(|log| log.id),
            total_hours,
        })
    }
}
