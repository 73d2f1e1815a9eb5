use super::ServiceError;
use crate::domain::clock::{parse_local_date, LocalZone};
use crate::repositories::time_logs::TimeLogRepository;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

pub const INVALID_DATE_MESSAGE: &str = "Invalid date format";
pub const STILL_WORKING: &str = "Still working";

#[derive(Debug, Serialize)]
pub struct ExportRecord {
    pub name: String,
    pub phone_number: String,
    /// Local `HH:MM:SS`.
    pub login_time: String,
    /// Local `HH:MM:SS`, or [`STILL_WORKING`] for an open log.
    pub logout_time: String,
    pub total_hours: f64,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct DayExport {
    pub date: String,
    pub data: Vec<ExportRecord>,
    pub total_records: usize,
    pub timezone: String,
}

#[async_trait]
pub trait ExportService: Send + Sync {
    async fn export_date(&self, raw_date: &str) -> Result<DayExport, ServiceError>;
}

pub struct ExportServiceImpl {
    time_log_repo: Arc<dyn TimeLogRepository>,
    zone: LocalZone,
}

impl ExportServiceImpl {
    pub fn new(time_log_repo: Arc<dyn TimeLogRepository>, zone: LocalZone) -> Self {
        Self {
            time_log_repo,
            zone,
        }
    }
}

#[async_trait]
impl ExportService for ExportServiceImpl {
    async fn export_date(&self, raw_date: &str) -> Result<DayExport, ServiceError> {
        let date = parse_local_date(raw_date)
            .ok_or_else(|| ServiceError::bad_request(INVALID_DATE_MESSAGE))?;

        let data: Vec<ExportRecord> = self
            .time_log_repo
            .list_for_date(date)
            .await?
            .into_iter()
            .map(|item| ExportRecord {
                name: item.employee.name,
                phone_number: item.employee.phone_number,
                login_time: self.zone.format_time(Some(item.log.login_time)),
                logout_time: match item.log.logout_time {
                    Some(logout) => self.zone.format_time(Some(logout)),
                    None => STILL_WORKING.to_string(),
                },
                total_hours: item.log.total_hours,
                date: raw_date.to_string(),
            })
            .collect();

        tracing::info!("exported {} time logs for {}", data.len(), date);

        Ok(DayExport {
            date: raw_date.to_string(),
            total_records: data.len(),
            data,
            timezone: self.zone.description(),
        })
    }
}
