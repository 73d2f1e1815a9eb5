use crate::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::ORIGIN, request::Parts, HeaderMap},
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use common::settings::{AuthSettings, SessionSettings};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SESSION_COOKIE_NAME: &str = "tc_hr_session";
pub const HR_LOGIN_PATH: &str = "/hr-login";
const HR_ROLE: &str = "hr";
const MIN_SESSION_TTL_SECONDS: i64 = 60;
const MAX_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    iss: String,
    aud: String,
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// Signs and checks HR session tokens.
pub struct SessionKeys {
    issuer: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn from_settings(settings: &SessionSettings) -> Self {
        let secret = match settings.signing_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => key.to_string(),
            None => {
                tracing::warn!(
                    "no session signing key configured; generated an ephemeral one, HR sessions end on restart"
                );
                random_secret()
            }
        };

        Self {
            issuer: settings.issuer.clone(),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: session_ttl(settings.ttl_seconds),
        }
    }

    pub fn issue(&self, now: DateTime<Utc>) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            aud: HR_ROLE.to_string(),
            sub: HR_ROLE.to_string(),
            role: HR_ROLE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Returns the token's expiry when it is a valid HR session.
    pub fn verify(&self, token: &str) -> Option<i64> {
        let mut validation = Validation::default();
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_audience(&[HR_ROLE]);

        let decoded = decode::<SessionClaims>(token, &self.decoding, &validation).ok()?;
        (decoded.claims.role == HR_ROLE).then_some(decoded.claims.exp)
    }
}

fn session_ttl(configured: i64) -> Duration {
    let seconds = configured.clamp(MIN_SESSION_TTL_SECONDS, MAX_SESSION_TTL_SECONDS);
    if seconds != configured {
        tracing::warn!(
            "session ttl of {}s is out of range; using {}s",
            configured,
            seconds
        );
    }
    Duration::try_seconds(seconds).unwrap_or_else(|| Duration::hours(8))
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Proof that the request carries a valid HR session. Handlers that take it
/// are HR-only; anything else is sent to the login page.
#[derive(Clone, Debug)]
pub struct HrSession {
    pub expires_at: i64,
}

impl HrSession {
    pub fn from_jar(state: &AppState, jar: &CookieJar) -> Option<Self> {
        let cookie = jar.get(SESSION_COOKIE_NAME)?;
        state
            .sessions
            .verify(cookie.value())
            .map(|expires_at| Self { expires_at })
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for HrSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Self::from_jar(state, &jar).ok_or_else(|| {
            tracing::debug!("rejected {} without HR session", parts.uri.path());
            Redirect::to(HR_LOGIN_PATH)
        })
    }
}

pub fn build_session_cookie(state: &AppState, token: &str) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, token.to_string());
    apply_cookie_policy(&mut cookie, &state.settings.auth, state.settings.debug);
    cookie
}

pub fn clear_session_cookie(state: &AppState) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    apply_cookie_policy(&mut cookie, &state.settings.auth, state.settings.debug);
    cookie.make_removal();
    cookie
}

fn apply_cookie_policy(cookie: &mut Cookie<'static>, auth: &AuthSettings, debug: bool) {
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(!debug);
    if let Some(domain) = auth.cookie_domain.clone().filter(|d| !d.is_empty()) {
        cookie.set_domain(domain);
    }
}

fn normalize_origin(value: &str) -> Option<&str> {
    let normalized = value.trim().trim_end_matches('/');
    (!normalized.is_empty()).then_some(normalized)
}

/// Configured origins, trimmed and de-duplicated in order.
pub fn allowed_origins(raw: Option<&str>) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    for origin in raw.unwrap_or_default().split(',').filter_map(normalize_origin) {
        if !origins.iter().any(|o| o == origin) {
            origins.push(origin.to_string());
        }
    }
    origins
}

/// Cross-origin form posts are refused unless the origin is listed. Debug
/// mode and an empty list allow everything.
pub fn origin_permitted(debug: bool, configured: Option<&str>, request_origin: Option<&str>) -> bool {
    if debug {
        return true;
    }

    let allowed = allowed_origins(configured);
    if allowed.is_empty() {
        return true;
    }

    request_origin
        .and_then(normalize_origin)
        .is_some_and(|origin| allowed.iter().any(|a| a == origin))
}

pub fn request_origin_permitted(state: &AppState, headers: &HeaderMap) -> bool {
    let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());
    origin_permitted(
        state.settings.debug,
        state.settings.auth.frontend_origin.as_deref(),
        origin,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_with_ttl(signing_key: &str, ttl_seconds: i64) -> SessionKeys {
        SessionKeys::from_settings(&SessionSettings {
            issuer: "timeclock".to_string(),
            signing_key: Some(signing_key.to_string()),
            ttl_seconds,
        })
    }

    fn keys(signing_key: &str) -> SessionKeys {
        keys_with_ttl(signing_key, 3600)
    }

    #[test]
    fn out_of_range_ttl_is_clamped() {
        let now = Utc::now();

        let token = keys_with_ttl("k", i64::MAX).issue(now).unwrap();
        let exp = keys_with_ttl("k", 3600).verify(&token).unwrap();
        assert_eq!(exp, now.timestamp() + MAX_SESSION_TTL_SECONDS);

        let token = keys_with_ttl("k", -5).issue(now).unwrap();
        let exp = keys_with_ttl("k", 3600).verify(&token).unwrap();
        assert_eq!(exp, now.timestamp() + MIN_SESSION_TTL_SECONDS);
    }

    #[test]
    fn issued_token_verifies_until_expiry() {
        let keys = keys("test-key");
        let now = Utc::now();
        let token = keys.issue(now).unwrap();

        assert_eq!(keys.verify(&token), Some((now + Duration::hours(1)).timestamp()));

        let stale = keys.issue(now - Duration::hours(3)).unwrap();
        assert_eq!(keys.verify(&stale), None);
    }

    #[test]
    fn token_from_other_key_is_rejected() {
        let token = keys("one").issue(Utc::now()).unwrap();
        assert_eq!(keys("two").verify(&token), None);
        assert_eq!(keys("one").verify("garbage"), None);
    }

    #[test]
    fn allowed_origins_trims_and_deduplicates() {
        let origins = allowed_origins(Some(
            " https://a.example/ , https://a.example , , https://b.example/ ",
        ));
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
        assert!(allowed_origins(None).is_empty());
    }

    #[test]
    fn origin_check_respects_allow_list() {
        let configured = Some("https://hr.example.com,https://kiosk.example.com");
        assert!(origin_permitted(false, configured, Some("https://kiosk.example.com/")));
        assert!(!origin_permitted(false, configured, Some("https://evil.example.com")));
        assert!(!origin_permitted(false, configured, None));
        assert!(origin_permitted(true, configured, None));
        assert!(origin_permitted(false, None, Some("https://anything.example")));
    }
}
