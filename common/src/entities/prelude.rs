pub use super::employees::Entity as Employees;
pub use super::time_logs::Entity as TimeLogs;
