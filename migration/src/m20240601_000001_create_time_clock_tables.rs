use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(string_len(Employees::PhoneNumber, 20).primary_key())
                    .col(string_len(Employees::Name, 100))
                    .col(boolean(Employees::IsLoggedIn).default(false))
                    .col(date_time(Employees::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TimeLogs::Table)
                    .if_not_exists()
                    .col(pk_auto(TimeLogs::Id))
                    .col(string_len(TimeLogs::EmployeePhone, 20))
                    .col(date_time(TimeLogs::LoginTime))
                    .col(date_time_null(TimeLogs::LogoutTime))
                    .col(double(TimeLogs::TotalHours).default(0.0))
                    .col(date(TimeLogs::Date))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_time_logs_employee_phone")
                            .from(TimeLogs::Table, TimeLogs::EmployeePhone)
                            .to(Employees::Table, Employees::PhoneNumber),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_time_logs_date")
                    .table(TimeLogs::Table)
                    .col(TimeLogs::Date)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_time_logs_employee_phone")
                    .table(TimeLogs::Table)
                    .col(TimeLogs::EmployeePhone)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TimeLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    PhoneNumber,
    Name,
    IsLoggedIn,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TimeLogs {
    Table,
    Id,
    EmployeePhone,
    LoginTime,
    LogoutTime,
    TotalHours,
    Date,
}
