use crate::domain::clock::{Clock, ClockError, LocalZone, SystemClock};
use crate::repositories::{
    employees::EmployeeRepositoryImpl, punches::PunchRepositoryImpl,
    time_logs::TimeLogRepositoryImpl,
};
use crate::services::{
    attendance::AttendanceServiceImpl, export::ExportServiceImpl, punch::PunchServiceImpl,
};
use crate::settings::Settings;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct Repositories {
    pub employee_repo: Arc<dyn crate::repositories::employees::EmployeeRepository>,
    pub time_log_repo: Arc<dyn crate::repositories::time_logs::TimeLogRepository>,
    pub punch_repo: Arc<dyn crate::repositories::punches::PunchRepository>,
}

#[derive(Clone)]
pub struct Services {
    pub punch_service: Arc<dyn crate::services::punch::PunchService>,
    pub attendance_service: Arc<dyn crate::services::attendance::AttendanceService>,
    pub export_service: Arc<dyn crate::services::export::ExportService>,
    pub zone: LocalZone,
    pub clock: Arc<dyn Clock>,
}

pub fn build_repositories(db: Arc<DatabaseConnection>) -> Repositories {
    Repositories {
        employee_repo: Arc::new(EmployeeRepositoryImpl::new(db.clone())),
        time_log_repo: Arc::new(TimeLogRepositoryImpl::new(db.clone())),
        punch_repo: Arc::new(PunchRepositoryImpl::new(db)),
    }
}

pub fn build_services(repos: &Repositories, zone: LocalZone, clock: Arc<dyn Clock>) -> Services {
    let punch_service = Arc::new(PunchServiceImpl::new(
        repos.punch_repo.clone(),
        clock.clone(),
        zone.clone(),
    ));

    let attendance_service = Arc::new(AttendanceServiceImpl::new(
        repos.employee_repo.clone(),
        repos.time_log_repo.clone(),
        zone.clone(),
    ));

    let export_service = Arc::new(ExportServiceImpl::new(
        repos.time_log_repo.clone(),
        zone.clone(),
    ));

    Services {
        punch_service,
        attendance_service,
        export_service,
        zone,
        clock,
    }
}

pub fn build_all_with_clock(
    db: Arc<DatabaseConnection>,
    settings: &Settings,
    clock: Arc<dyn Clock>,
) -> Result<(Repositories, Services), ClockError> {
    let zone = settings.local_zone()?;
    let repos = build_repositories(db);
    let services = build_services(&repos, zone, clock);
    Ok((repos, services))
}

pub fn build_all(
    db: Arc<DatabaseConnection>,
    settings: &Settings,
) -> Result<(Repositories, Services), ClockError> {
    build_all_with_clock(db, settings, Arc::new(SystemClock))
}
