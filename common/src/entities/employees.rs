use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub phone_number: String,
    pub name: String,
    pub is_logged_in: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::time_logs::Entity")]
    TimeLogs,
}

impl Related<super::time_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimeLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
