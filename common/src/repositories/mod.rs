pub mod employees;
pub mod punches;
pub mod time_logs;

pub use employees::{EmployeeRepository, EmployeeRepositoryImpl};
pub use punches::{PunchRepository, PunchRepositoryImpl};
pub use time_logs::{TimeLogRepository, TimeLogRepositoryImpl};
