pub mod employees;
pub mod prelude;
pub mod time_logs;
