use super::ServiceError;
use crate::domain::clock::{parse_local_date, LocalZone};
use crate::entities::employees;
use crate::repositories::employees::EmployeeRepository;
use crate::repositories::time_logs::{TimeLogFilter, TimeLogRepository, TimeLogWithEmployee};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub date: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceRow {
    pub id: i32,
    pub name: String,
    pub phone_number: String,
    pub date: chrono::NaiveDate,
    pub login_time: chrono::NaiveDateTime,
    pub logout_time: Option<chrono::NaiveDateTime>,
    pub login_local: String,
    pub logout_local: String,
    pub total_hours: f64,
    pub is_open: bool,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub time_logs: Vec<AttendanceRow>,
    pub active_employees: Vec<employees::Model>,
    pub unique_dates: Vec<chrono::NaiveDate>,
    pub selected_date: Option<String>,
    pub selected_name: String,
    pub timezone: String,
}

#[async_trait]
pub trait AttendanceService: Send + Sync {
    async fn dashboard(&self, query: DashboardQuery) -> Result<DashboardView, ServiceError>;
}

pub struct AttendanceServiceImpl {
    employee_repo: Arc<dyn EmployeeRepository>,
    time_log_repo: Arc<dyn TimeLogRepository>,
    zone: LocalZone,
}

impl AttendanceServiceImpl {
    pub fn new(
        employee_repo: Arc<dyn EmployeeRepository>,
        time_log_repo: Arc<dyn TimeLogRepository>,
        zone: LocalZone,
    ) -> Self {
        Self {
            employee_repo,
            time_log_repo,
            zone,
        }
    }

    fn to_row(&self, item: TimeLogWithEmployee) -> AttendanceRow {
        let TimeLogWithEmployee { log, employee } = item;
        AttendanceRow {
            id: log.id,
            name: employee.name,
            phone_number: employee.phone_number,
            date: log.date,
            login_local: self.zone.format_stamp(Some(log.login_time)),
            logout_local: self.zone.format_stamp(log.logout_time),
            is_open: log.is_open(),
            login_time: log.login_time,
            logout_time: log.logout_time,
            total_hours: log.total_hours,
        }
    }
}

#[async_trait]
impl AttendanceService for AttendanceServiceImpl {
    async fn dashboard(&self, query: DashboardQuery) -> Result<DashboardView, ServiceError> {
        let selected_date = query.date.filter(|d| !d.trim().is_empty());
        let selected_name = query.name.unwrap_or_default().trim().to_string();

        // An unparseable date leaves the listing unfiltered.
        let date = selected_date.as_deref().and_then(parse_local_date);
        if selected_date.is_some() && date.is_none() {
            tracing::debug!("ignoring malformed dashboard date filter {:?}", selected_date);
        }

        let filter = TimeLogFilter {
            date,
            name: Some(selected_name.as_str()).filter(|n| !n.is_empty()),
        };

        let time_logs = self
            .time_log_repo
            .list_filtered(filter)
            .await?
            .into_iter()
            .map(|item| self.to_row(item))
            .collect();

        let active_employees = self.employee_repo.list_logged_in().await?;
        let unique_dates = self.time_log_repo.distinct_dates().await?;

        Ok(DashboardView {
            time_logs,
            active_employees,
            unique_dates,
            selected_date,
            selected_name,
            timezone: self.zone.description(),
        })
    }
}
