use crate::domain::clock::{ClockError, LocalZone, DEFAULT_TIMEZONE, DEFAULT_TIMEZONE_LABEL};
use dotenvy::dotenv;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, PartialEq, Eq)]
struct Cli {
    port: Option<u16>,
    config: Option<String>,
}

/// Picks `--port` and `--config` out of the argument list, in either
/// `--flag value` or `--flag=value` form. Anything else is ignored so test
/// harness flags pass through.
fn parse_cli_from_args<I, S>(args: I) -> Cli
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut cli = Cli::default();
    let mut iter = args.into_iter().map(Into::into).skip(1);

    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };

        match flag.as_str() {
            "--port" => {
                let value = inline.or_else(|| iter.next());
                cli.port = value.and_then(|v| v.parse().ok()).or(cli.port);
            }
            "--config" => {
                let value = inline.or_else(|| iter.next());
                cli.config = value.filter(|v| !v.is_empty()).or(cli.config);
            }
            _ => {}
        }
    }

    cli
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("database url is not configured; set DATABASE_URL or TIMECLOCK_DATABASE__URL")]
    MissingDatabaseUrl,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub port: u16,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub clock: ClockSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClockSettings {
    pub timezone: String,
    pub label: String,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            label: DEFAULT_TIMEZONE_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AuthSettings {
    /// Comma-separated list of origins allowed to post the HR login form.
    pub frontend_origin: Option<String>,
    pub cookie_domain: Option<String>,
    /// Argon2 PHC string. Takes precedence over `hr_password`.
    pub hr_password_hash: Option<String>,
    pub hr_password: Option<String>,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionSettings {
    pub issuer: String,
    pub signing_key: Option<String>,
    #[serde(default = "default_session_ttl_seconds")]
    pub ttl_seconds: i64,
}

fn default_session_ttl_seconds() -> i64 {
    8 * 60 * 60
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            issuer: "timeclock".to_string(),
            signing_key: None,
            ttl_seconds: default_session_ttl_seconds(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, SettingsError> {
        dotenv().ok();
        let cli = parse_cli_from_args(std::env::args());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        figment = figment.merge(Toml::file("/etc/timeclock/config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            figment = figment.merge(Toml::file(config_dir.join("timeclock/config.toml")));
        }

        figment = figment.merge(Toml::file("timeclock.toml"));

        let config_path = cli
            .config
            .or_else(|| std::env::var("TIMECLOCK_CONFIG_PATH").ok());
        if let Some(config_path) = config_path {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(
            Env::raw()
                .only(&["DATABASE_URL"])
                .map(|_| "database.url".into()),
        );
        figment = figment.merge(Env::prefixed("TIMECLOCK_").split("__"));

        if let Some(port) = cli.port {
            figment = figment.merge(("port", port));
        }

        Self::from_figment(figment)
    }

    /// Extracts and validates. A missing database url is fatal.
    pub fn from_figment(figment: Figment) -> Result<Self, SettingsError> {
        let settings: Settings = figment.extract().map_err(Box::new)?;
        settings.database_url()?;
        Ok(settings)
    }

    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    pub fn local_zone(&self) -> Result<LocalZone, ClockError> {
        LocalZone::new(&self.clock.timezone, &self.clock.label)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: 5000,
            debug: false,
            database: DatabaseSettings::default(),
            clock: ClockSettings::default(),
            auth: AuthSettings::default(),
        }
    }
}
