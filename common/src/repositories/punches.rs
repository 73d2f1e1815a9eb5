use crate::domain::clock::elapsed_hours;
use crate::domain::punch::PunchDirection;
use crate::entities::{employees, prelude::*, time_logs};
use crate::repositories::time_logs::open_log_query;
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, SqlErr, TransactionTrait,
};
use std::sync::Arc;

pub struct PunchParams<'a> {
    pub phone_number: &'a str,
    pub name: &'a str,
    /// Instant of the punch, UTC.
    pub at: NaiveDateTime,
    /// Local civil date of `at`.
    pub local_date: NaiveDate,
}

#[derive(Debug)]
pub struct PunchRecord {
    pub direction: PunchDirection,
    pub employee: employees::Model,
    /// Opened log on login, closed log on logout. `None` when a logout found
    /// nothing to close.
    pub time_log: Option<time_logs::Model>,
}

#[derive(Debug, thiserror::Error)]
pub enum PunchError {
    #[error("employee {phone_number} already has an open time log")]
    OpenLogExists { phone_number: String },
    #[error(transparent)]
    Db(#[from] DbErr),
}

#[async_trait::async_trait]
pub trait PunchRepository: Send + Sync {
    /// Toggles the employee's state and records the matching ledger change in
    /// one transaction. Unknown phone numbers are registered first.
    async fn punch(&self, params: PunchParams<'_>) -> Result<PunchRecord, PunchError>;
}

pub struct PunchRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl PunchRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl PunchRepository for PunchRepositoryImpl {
    async fn punch(&self, params: PunchParams<'_>) -> Result<PunchRecord, PunchError> {
        let txn = self.db.begin().await?;

        let employee = match Employees::find_by_id(params.phone_number.to_string())
            .one(&txn)
            .await?
        {
            Some(existing) => existing,
            None => {
                tracing::info!("registering employee {}", params.phone_number);
                employees::ActiveModel {
                    phone_number: Set(params.phone_number.to_string()),
                    name: Set(params.name.to_string()),
                    is_logged_in: Set(false),
                    created_at: Set(params.at),
                }
                .insert(&txn)
                .await?
            }
        };

        let open_log = open_log_query(params.phone_number).one(&txn).await?;

        let direction = PunchDirection::from_state(employee.is_logged_in);

        let mut active: employees::ActiveModel = employee.into();
        active.is_logged_in = Set(direction.logged_in_after());

        let record = match direction {
            PunchDirection::Login => {
                if open_log.is_some() {
                    return Err(PunchError::OpenLogExists {
                        phone_number: params.phone_number.to_string(),
                    });
                }

                active.name = Set(params.name.to_string());
                let employee = active.update(&txn).await?;

                let time_log = time_logs::ActiveModel {
                    employee_phone: Set(params.phone_number.to_string()),
                    login_time: Set(params.at),
                    logout_time: Set(None),
                    total_hours: Set(0.0),
                    date: Set(params.local_date),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| conflict_or_db(e, params.phone_number))?;

                PunchRecord {
                    direction,
                    employee,
                    time_log: Some(time_log),
                }
            }
            PunchDirection::Logout => {
                let employee = active.update(&txn).await?;

                let time_log = match open_log {
                    Some(open) => {
                        if params.at < open.login_time {
                            tracing::warn!(
                                "logout for {} precedes its login at {}; recording zero hours",
                                params.phone_number,
                                open.login_time
                            );
                        }
                        let hours = elapsed_hours(open.login_time, params.at);
                        let mut closing: time_logs::ActiveModel = open.into();
                        closing.logout_time = Set(Some(params.at));
                        closing.total_hours = Set(hours);
                        Some(closing.update(&txn).await?)
                    }
                    None => {
                        tracing::warn!(
                            "employee {} was logged in without an open time log; flag cleared only",
                            params.phone_number
                        );
                        None
                    }
                };

                PunchRecord {
                    direction,
                    employee,
                    time_log,
                }
            }
        };

        txn.commit().await?;
        Ok(record)
    }
}

fn conflict_or_db(err: DbErr, phone_number: &str) -> PunchError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => PunchError::OpenLogExists {
            phone_number: phone_number.to_string(),
        },
        _ => PunchError::Db(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::MigratorTrait;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn open_log(phone_number: &str, login: NaiveDateTime) -> time_logs::ActiveModel {
        time_logs::ActiveModel {
            employee_phone: Set(phone_number.to_string()),
            login_time: Set(login),
            logout_time: Set(None),
            total_hours: Set(0.0),
            date: Set(login.date()),
            ..Default::default()
        }
    }

    async fn setup() -> DatabaseConnection {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        employees::ActiveModel {
            phone_number: Set("111".to_string()),
            name: Set("Asha".to_string()),
            is_logged_in: Set(true),
            created_at: Set(at(3)),
        }
        .insert(&db)
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn duplicate_open_log_insert_maps_to_conflict() {
        let db = setup().await;
        open_log("111", at(3)).insert(&db).await.unwrap();

        let err = open_log("111", at(4)).insert(&db).await.unwrap_err();

        match conflict_or_db(err, "111") {
            PunchError::OpenLogExists { phone_number } => assert_eq!(phone_number, "111"),
            other => panic!("expected open log conflict, got {:?}", other),
        }
    }

    #[test]
    fn other_database_errors_are_not_conflicts() {
        let err = DbErr::Custom("connection reset".to_string());
        assert!(matches!(conflict_or_db(err, "111"), PunchError::Db(_)));
    }

    #[tokio::test]
    async fn backwards_clock_closes_log_with_zero_hours() {
        let db = Arc::new(setup().await);
        open_log("111", at(5)).insert(db.as_ref()).await.unwrap();

        let repo = PunchRepositoryImpl::new(db.clone());
        let record = repo
            .punch(PunchParams {
                phone_number: "111",
                name: "Asha",
                at: at(4),
                local_date: at(4).date(),
            })
            .await
            .unwrap();

        assert_eq!(record.direction, PunchDirection::Logout);
        let closed = record.time_log.unwrap();
        assert_eq!(closed.logout_time, Some(at(4)));
        assert_eq!(closed.total_hours, 0.0);
        assert!(open_log_query("111").one(db.as_ref()).await.unwrap().is_none());
    }
}
