mod handlers;
mod models;
mod session;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use common::db;
use common::settings::Settings;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub settings: Settings,
    pub services: common::Services,
    pub sessions: session::SessionKeys,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api=debug,common=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new().context("failed to load configuration")?;

    let db = db::establish_connection(settings.database_url()?).await?;
    migration::Migrator::up(&db, None)
        .await
        .context("failed to apply migrations")?;
    let db = Arc::new(db);

    let (_repos, services) =
        common::build_all(db.clone(), &settings).context("invalid clock settings")?;
    tracing::info!("displaying times in {}", services.zone.description());

    let sessions = session::SessionKeys::from_settings(&settings.auth.session);
    let cors = build_cors(&settings);
    let port = settings.port;

    let state = Arc::new(AppState {
        db,
        settings,
        services,
        sessions,
    });

    let app = router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/employee",
            get(handlers::punch_form).post(handlers::punch),
        )
        .route(
            "/hr-login",
            get(handlers::hr_login_status).post(handlers::hr_login),
        )
        .route("/hr-dashboard", get(handlers::hr_dashboard))
        .route("/export-date/:date", get(handlers::export_date))
        .route("/hr-logout", get(handlers::hr_logout))
}

fn build_cors(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = session::allowed_origins(settings.auth.frontend_origin.as_deref())
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if settings.debug || origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST])
}
