pub mod attendance;
pub mod export;
pub mod punch;

use crate::repositories::punches::PunchError;
use sea_orm::DbErr;

#[derive(Debug)]
pub struct ServiceError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, message)
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        Self::new(500, format!("Database error: {}", err))
    }
}

impl From<PunchError> for ServiceError {
    fn from(err: PunchError) -> Self {
        match err {
            PunchError::OpenLogExists { phone_number } => Self::conflict(
                "An open time log already exists for this phone number",
            )
            .with_data(serde_json::json!({ "phone_number": phone_number })),
            PunchError::Db(e) => e.into(),
        }
    }
}
