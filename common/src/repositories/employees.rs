use crate::entities::{employees, prelude::*};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;

#[async_trait::async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn list_logged_in(&self) -> Result<Vec<employees::Model>, DbErr>;
}

pub struct EmployeeRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl EmployeeRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl EmployeeRepository for EmployeeRepositoryImpl {
    async fn list_logged_in(&self) -> Result<Vec<employees::Model>, DbErr> {
        Employees::find()
            .filter(employees::Column::IsLoggedIn.eq(true))
            .order_by_asc(employees::Column::Name)
            .all(self.db.as_ref())
            .await
    }
}
