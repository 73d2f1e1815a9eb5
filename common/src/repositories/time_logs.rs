use crate::entities::{employees, prelude::*, time_logs};
use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, DatabaseBackend, DatabaseConnection, DbErr, EntityTrait, ExprTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, SelectTwo,
};
use std::sync::Arc;

pub struct TimeLogWithEmployee {
    pub log: time_logs::Model,
    pub employee: employees::Model,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TimeLogFilter<'a> {
    pub date: Option<NaiveDate>,
    /// Case-insensitive substring of the employee name.
    pub name: Option<&'a str>,
}

/// The employee's log without a logout time. At most one exists.
pub fn open_log_query(phone_number: &str) -> Select<TimeLogs> {
    TimeLogs::find()
        .filter(time_logs::Column::EmployeePhone.eq(phone_number))
        .filter(time_logs::Column::LogoutTime.is_null())
}

#[async_trait::async_trait]
pub trait TimeLogRepository: Send + Sync {
    /// Newest login first.
    async fn list_filtered(
        &self,
        filter: TimeLogFilter<'_>,
    ) -> Result<Vec<TimeLogWithEmployee>, DbErr>;

    /// Oldest login first.
    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<TimeLogWithEmployee>, DbErr>;

    /// Newest date first.
    async fn distinct_dates(&self) -> Result<Vec<NaiveDate>, DbErr>;
}

pub struct TimeLogRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl TimeLogRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn with_employee(query: Select<TimeLogs>) -> SelectTwo<TimeLogs, Employees> {
        query.find_also_related(Employees)
    }

    fn pair_rows(
        rows: Vec<(time_logs::Model, Option<employees::Model>)>,
    ) -> Vec<TimeLogWithEmployee> {
        rows.into_iter()
            .filter_map(|(log, employee)| match employee {
                Some(employee) => Some(TimeLogWithEmployee { log, employee }),
                None => {
                    tracing::warn!(
                        "time log {} references unknown employee {}",
                        log.id,
                        log.employee_phone
                    );
                    None
                }
            })
            .collect()
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Unicode case-insensitive substring match. SQLite's `lower()` and `LIKE`
/// only fold ASCII, so names are matched here on that backend.
fn name_matches(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(needle)
}

#[async_trait::async_trait]
impl TimeLogRepository for TimeLogRepositoryImpl {
    async fn list_filtered(
        &self,
        filter: TimeLogFilter<'_>,
    ) -> Result<Vec<TimeLogWithEmployee>, DbErr> {
        let mut query = TimeLogs::find();

        if let Some(date) = filter.date {
            query = query.filter(time_logs::Column::Date.eq(date));
        }

        let mut query = Self::with_employee(query);

        let needle = filter
            .name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_lowercase);
        let in_database = self.db.get_database_backend() == DatabaseBackend::Postgres;

        if let Some(needle) = needle.as_deref().filter(|_| in_database) {
            let pattern = format!("%{}%", escape_like(needle));
            query = query.filter(
                Expr::expr(Func::lower(Expr::col((
                    employees::Entity,
                    employees::Column::Name,
                ))))
                .like(LikeExpr::new(pattern).escape('\\')),
            );
        }

        let rows = query
            .order_by_desc(time_logs::Column::LoginTime)
            .order_by_desc(time_logs::Column::Id)
            .all(self.db.as_ref())
            .await?;

        let mut rows = Self::pair_rows(rows);
        if let Some(needle) = needle.as_deref().filter(|_| !in_database) {
            rows.retain(|item| name_matches(&item.employee.name, needle));
        }
        Ok(rows)
    }

    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<TimeLogWithEmployee>, DbErr> {
        let rows = Self::with_employee(TimeLogs::find().filter(time_logs::Column::Date.eq(date)))
            .order_by_asc(time_logs::Column::LoginTime)
            .order_by_asc(time_logs::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(Self::pair_rows(rows))
    }

    async fn distinct_dates(&self) -> Result<Vec<NaiveDate>, DbErr> {
        TimeLogs::find()
            .select_only()
            .column(time_logs::Column::Date)
            .distinct()
            .order_by_desc(time_logs::Column::Date)
            .into_tuple::<NaiveDate>()
            .all(self.db.as_ref())
            .await
    }
}
