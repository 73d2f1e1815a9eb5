use crate::models::{ApiError, ApiResponse};
use crate::session::{self, HrSession};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use common::domain::clock::Clock;
use common::domain::password::{check_shared_password, PasswordCheck};
use common::services::attendance::{DashboardQuery, DashboardView};
use common::services::export::DayExport;
use common::services::punch::PunchReceipt;
use common::services::ServiceError;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub async fn index() -> &'static str {
    "Time Clock API"
}

pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    state
        .db
        .execute_unprepared("SELECT 1")
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::success("ok")))
}

#[derive(Serialize)]
pub struct PunchFormDto {
    pub fields: [&'static str; 2],
    pub timezone: String,
    pub local_time: String,
}

pub async fn punch_form(State(state): State<Arc<AppState>>) -> Json<ApiResponse<PunchFormDto>> {
    let services = &state.services;
    Json(ApiResponse::success(PunchFormDto {
        fields: ["name", "phone_number"],
        timezone: services.zone.description(),
        local_time: services
            .zone
            .format_stamp(Some(services.clock.now().naive_utc())),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PunchForm {
    pub name: Option<String>,
    pub phone_number: Option<String>,
}

pub async fn punch(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PunchForm>,
) -> Result<Json<ApiResponse<PunchReceipt>>, ApiError> {
    let receipt = state
        .services
        .punch_service
        .punch(form.name.as_deref(), form.phone_number.as_deref())
        .await?;

    let message = receipt.message.clone();
    Ok(Json(ApiResponse::with_message(receipt, message)))
}

#[derive(Serialize)]
pub struct HrLoginStatus {
    pub authenticated: bool,
    pub expires_at: Option<i64>,
}

pub async fn hr_login_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Json<ApiResponse<HrLoginStatus>> {
    let session = HrSession::from_jar(&state, &jar);
    Json(ApiResponse::success(HrLoginStatus {
        authenticated: session.is_some(),
        expires_at: session.map(|s| s.expires_at),
    }))
}

#[derive(Deserialize)]
pub struct HrLoginForm {
    pub password: Option<String>,
}

pub async fn hr_login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<HrLoginForm>,
) -> Result<(CookieJar, Redirect), ApiError> {
    if !session::request_origin_permitted(&state, &headers) {
        return Err(ServiceError::new(403, "origin not allowed").into());
    }

    let auth = &state.settings.auth;
    let check = check_shared_password(
        form.password.as_deref().unwrap_or_default(),
        auth.hr_password_hash.as_deref(),
        auth.hr_password.as_deref(),
    );

    match check {
        PasswordCheck::Accepted => {}
        PasswordCheck::Rejected => {
            tracing::info!("rejected HR login attempt");
            return Err(ServiceError::new(401, "Invalid password").into());
        }
        PasswordCheck::NotConfigured => {
            return Err(ServiceError::new(503, "HR password is not configured").into());
        }
    }

    let token = state.sessions.issue(chrono::Utc::now()).map_err(|e| {
        tracing::error!("failed to sign HR session: {}", e);
        ServiceError::new(500, "failed to start HR session")
    })?;

    tracing::info!("HR session started");
    let jar = jar.add(session::build_session_cookie(&state, &token));
    Ok((jar, Redirect::to("/hr-dashboard")))
}

pub async fn hr_dashboard(
    State(state): State<Arc<AppState>>,
    _session: HrSession,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardView>>, ApiError> {
    let view = state.services.attendance_service.dashboard(query).await?;
    Ok(Json(ApiResponse::success(view)))
}

pub async fn export_date(
    State(state): State<Arc<AppState>>,
    _session: HrSession,
    Path(date): Path<String>,
) -> Response {
    match state.services.export_service.export_date(&date).await {
        Ok(export) => Json::<DayExport>(export).into_response(),
        Err(err) if err.code == 400 => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": err.message })),
        )
            .into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

pub async fn hr_logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.remove(session::clear_session_cookie(&state));
    (jar, Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::{NaiveDate, TimeZone, Utc};
    use common::domain::clock::{Clock, LocalZone, ManualClock};
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use tower::ServiceExt;

    struct TestApp {
        router: axum::Router,
        clock: Arc<ManualClock>,
    }

    fn local(h: u32, m: u32) -> chrono::DateTime<Utc> {
        let naive = NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap();
        LocalZone::default().to_utc(naive).unwrap()
    }

    fn test_settings() -> common::settings::Settings {
        let mut settings = common::settings::Settings::default();
        settings.database.url = Some("sqlite::memory:".to_string());
        settings.auth.hr_password = Some("eb123".to_string());
        settings.auth.session.signing_key = Some("test-signing-key".to_string());
        settings.debug = true;
        settings
    }

    async fn setup(settings: common::settings::Settings) -> TestApp {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let db = Arc::new(db);

        let clock = Arc::new(ManualClock::new(local(9, 0)));
        let (_repos, services) =
            common::build_all_with_clock(db.clone(), &settings, clock.clone() as Arc<dyn Clock>)
                .unwrap();

        let state = Arc::new(AppState {
            db,
            sessions: crate::session::SessionKeys::from_settings(&settings.auth.session),
            settings,
            services,
        });

        TestApp {
            router: crate::router().with_state(state),
            clock,
        }
    }

    fn form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn hr_cookie(app: &TestApp) -> String {
        let resp = app
            .router
            .clone()
            .oneshot(form("/hr-login", "password=eb123"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/hr-dashboard");

        let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn punch_in_and_out_reports_worked_hours() {
        let app = setup(test_settings()).await;

        let resp = app
            .router
            .clone()
            .oneshot(form("/employee", "name=Asha&phone_number=111"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["code"], 200);
        assert_eq!(json["data"]["action"], "login");
        assert_eq!(
            json["message"],
            "Welcome Asha! You are now logged in at 09:00:00 IST."
        );

        app.clock.set(local(17, 30));
        let resp = app
            .router
            .clone()
            .oneshot(form("/employee", "name=Asha&phone_number=111"))
            .await
            .unwrap();
        let json = json_body(resp).await;
        assert_eq!(json["data"]["action"], "logout");
        assert_eq!(json["data"]["total_hours"], 8.5);
        assert_eq!(json["data"]["is_logged_in"], false);
    }

    #[tokio::test]
    async fn punch_with_missing_fields_is_a_client_error() {
        let app = setup(test_settings()).await;

        let resp = app
            .router
            .clone()
            .oneshot(form("/employee", "name=+&phone_number=111"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_body(resp).await;
        assert_eq!(json["message"], "Please enter both name and phone number");

        let resp = app
            .router
            .oneshot(form("/employee", "name=Asha"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn punch_form_describes_required_fields() {
        let app = setup(test_settings()).await;

        let resp = app.router.oneshot(get("/employee", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["data"]["fields"][0], "name");
        assert_eq!(json["data"]["fields"][1], "phone_number");
        assert_eq!(json["data"]["timezone"], "Asia/Kolkata (IST)");
        assert_eq!(json["data"]["local_time"], "2024-05-10 09:00:00 IST");
    }

    #[tokio::test]
    async fn hr_routes_redirect_without_session() {
        let app = setup(test_settings()).await;

        for uri in ["/hr-dashboard", "/export-date/2024-05-10"] {
            let resp = app.router.clone().oneshot(get(uri, None)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{}", uri);
            assert_eq!(resp.headers()[header::LOCATION], "/hr-login");
        }

        let forged = "tc_hr_session=not-a-token";
        let resp = app
            .router
            .oneshot(get("/hr-dashboard", Some(forged)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = setup(test_settings()).await;

        let resp = app
            .router
            .oneshot(form("/hr-login", "password=nope"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
        let json = json_body(resp).await;
        assert_eq!(json["message"], "Invalid password");
    }

    #[tokio::test]
    async fn hr_login_without_configured_password_is_unavailable() {
        let mut settings = test_settings();
        settings.auth.hr_password = None;
        let app = setup(settings).await;

        let resp = app
            .router
            .oneshot(form("/hr-login", "password=eb123"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn hr_login_enforces_origin_allow_list() {
        let mut settings = test_settings();
        settings.debug = false;
        settings.auth.frontend_origin = Some("https://hr.example.com".to_string());
        let app = setup(settings).await;

        let mut req = form("/hr-login", "password=eb123");
        req.headers_mut()
            .insert(header::ORIGIN, "https://evil.example.com".parse().unwrap());
        let resp = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let mut req = form("/hr-login", "password=eb123");
        req.headers_mut()
            .insert(header::ORIGIN, "https://hr.example.com".parse().unwrap());
        let resp = app.router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn hr_session_unlocks_dashboard_and_export() {
        let app = setup(test_settings()).await;

        app.router
            .clone()
            .oneshot(form("/employee", "name=Asha&phone_number=111"))
            .await
            .unwrap();
        app.clock.set(local(17, 30));
        app.router
            .clone()
            .oneshot(form("/employee", "name=Asha&phone_number=111"))
            .await
            .unwrap();
        app.router
            .clone()
            .oneshot(form("/employee", "name=Ravi&phone_number=222"))
            .await
            .unwrap();

        let cookie = hr_cookie(&app).await;

        let resp = app
            .router
            .clone()
            .oneshot(get("/hr-login", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(json_body(resp).await["data"]["authenticated"], true);

        let resp = app
            .router
            .clone()
            .oneshot(get("/hr-dashboard?date=2024-05-10&name=ash", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        let logs = json["data"]["time_logs"].as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["name"], "Asha");
        assert_eq!(logs[0]["total_hours"], 8.5);
        assert_eq!(json["data"]["active_employees"][0]["name"], "Ravi");
        assert_eq!(json["data"]["unique_dates"][0], "2024-05-10");

        let resp = app
            .router
            .clone()
            .oneshot(get("/export-date/2024-05-10", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["date"], "2024-05-10");
        assert_eq!(json["total_records"], 2);
        assert_eq!(json["timezone"], "Asia/Kolkata (IST)");
        assert_eq!(json["data"][0]["login_time"], "09:00:00");
        assert_eq!(json["data"][0]["logout_time"], "17:30:00");
        assert_eq!(json["data"][1]["logout_time"], "Still working");

        let resp = app
            .router
            .oneshot(get("/export-date/2024-13-01", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_body(resp).await;
        assert_eq!(json["error"], "Invalid date format");
    }

    #[tokio::test]
    async fn hr_logout_clears_the_session_cookie() {
        let app = setup(test_settings()).await;
        let cookie = hr_cookie(&app).await;

        let resp = app
            .router
            .clone()
            .oneshot(get("/hr-logout", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/");
        let cleared = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cleared.starts_with("tc_hr_session=;"));
        assert!(cleared.contains("Max-Age=0"));

        let resp = app
            .router
            .oneshot(get("/hr-login", None))
            .await
            .unwrap();
        assert_eq!(json_body(resp).await["data"]["authenticated"], false);
    }

    #[tokio::test]
    async fn health_pings_the_database() {
        let app = setup(test_settings()).await;

        let resp = app.router.oneshot(get("/health", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["data"], "ok");
    }

    #[test]
    fn fixed_instants_render_in_local_time() {
        let zone = LocalZone::default();
        let instant = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(zone.format_clock(instant.naive_utc()), "17:30:00 IST");
    }
}
