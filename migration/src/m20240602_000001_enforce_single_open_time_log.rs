use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Partial index: an employee may hold at most one time log without a logout.
// Both SQLite and Postgres accept the same statement.
const CREATE_OPEN_LOG_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     ux_time_logs_open_per_employee ON time_logs (employee_phone) \
     WHERE logout_time IS NULL";

const DROP_OPEN_LOG_INDEX: &str = "DROP INDEX IF EXISTS ux_time_logs_open_per_employee";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(CREATE_OPEN_LOG_INDEX)
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DROP_OPEN_LOG_INDEX)
            .await?;
        Ok(())
    }
}
