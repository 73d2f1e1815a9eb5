use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One login/logout pair. Timestamps are naive UTC; `date` is the local civil
/// date of `login_time`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "time_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub employee_phone: String,
    pub login_time: DateTime,
    #[sea_orm(nullable)]
    pub logout_time: Option<DateTime>,
    pub total_hours: f64,
    pub date: Date,
}

impl Model {
    pub fn is_open(&self) -> bool {
        self.logout_time.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employees::Entity",
        from = "Column::EmployeePhone",
        to = "super::employees::Column::PhoneNumber"
    )]
    Employee,
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
