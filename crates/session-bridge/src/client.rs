use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bridge::{CookieWrite, CookieWriteOutcome, SessionCookieBridge};
use crate::error::SessionError;
use crate::jar::CookieStore;
use crate::policy::{CookiePolicy, DeploymentEnv};

const SESSION_VALUE_PREFIX: &str = "base64-";
const USER_PATH: &str = "/auth/v1/user";
const LOGOUT_PATH: &str = "/auth/v1/logout";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the session backend lives and how to identify this app to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBackendConfig {
    url: String,
    anon_key: String,
    project_ref: String,
    deployment: DeploymentEnv,
    request_timeout: Duration,
}

impl SessionBackendConfig {
    pub fn new(
        url: &str,
        anon_key: impl Into<String>,
        deployment: DeploymentEnv,
    ) -> Result<Self, SessionError> {
        let parsed = reqwest::Url::parse(url.trim())
            .map_err(|error| SessionError::InvalidConfig(format!("backend url: {error}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SessionError::InvalidConfig(
                "backend url must use http:// or https://".to_string(),
            ));
        }
        let project_ref = parsed
            .host_str()
            .and_then(|host| host.split('.').next())
            .filter(|label| !label.is_empty())
            .ok_or_else(|| SessionError::InvalidConfig("backend url has no host".to_string()))?
            .to_string();

        Ok(Self {
            url: url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            project_ref,
            deployment,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Upper bound for each call to the backend.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn project_ref(&self) -> &str {
        &self.project_ref
    }

    pub fn deployment(&self) -> DeploymentEnv {
        self.deployment
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn session_cookie_name(&self) -> String {
        format!("sb-{}-auth-token", self.project_ref)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

pub fn encode_session_cookie(session: &StoredSession) -> Result<String, SessionError> {
    let json = serde_json::to_vec(session)
        .map_err(|error| SessionError::InvalidPayload(error.to_string()))?;
    Ok(format!("{SESSION_VALUE_PREFIX}{}", URL_SAFE_NO_PAD.encode(json)))
}

/// Decodes a session cookie value. Empty or malformed values mean no session.
pub fn decode_session_cookie(value: &str) -> Option<StoredSession> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let json = match value.strip_prefix(SESSION_VALUE_PREFIX) {
        Some(encoded) => URL_SAFE_NO_PAD.decode(encoded).ok()?,
        None => value.as_bytes().to_vec(),
    };
    match serde_json::from_slice::<StoredSession>(&json) {
        Ok(session) if !session.access_token.is_empty() => Some(session),
        Ok(_) => None,
        Err(error) => {
            debug!(%error, "ignoring malformed session cookie");
            None
        }
    }
}

/// Builds the session client for one request, wired to that request's jar.
pub fn create_session_client(
    config: &SessionBackendConfig,
    http: reqwest::Client,
    store: Arc<dyn CookieStore>,
) -> SessionClient {
    let bridge = SessionCookieBridge::new(store, CookiePolicy::for_deployment(config.deployment));
    SessionClient {
        config: config.clone(),
        http,
        bridge,
    }
}

#[derive(Debug, Clone)]
pub struct SessionClient {
    config: SessionBackendConfig,
    http: reqwest::Client,
    bridge: SessionCookieBridge,
}

impl SessionClient {
    pub fn bridge(&self) -> &SessionCookieBridge {
        &self.bridge
    }

    pub fn session(&self) -> Option<StoredSession> {
        let name = self.config.session_cookie_name();
        self.bridge
            .read_all()
            .into_iter()
            .rev()
            .find(|cookie| cookie.name == name)
            .and_then(|cookie| decode_session_cookie(&cookie.value))
    }

    /// Current user according to the backend. `None` without a session or
    /// when the backend no longer accepts the access token.
    pub async fn get_user(&self) -> Result<Option<SessionUser>, SessionError> {
        let Some(session) = self.session() else {
            return Ok(None);
        };

        let response = self
            .http
            .get(self.config.endpoint(USER_PATH))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&session.access_token)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|error| SessionError::Transport(error.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(error) => format!("<unreadable body: {error}>"),
            };
            return Err(SessionError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<SessionUser>()
            .await
            .map(Some)
            .map_err(|error| SessionError::InvalidPayload(error.to_string()))
    }

    pub fn set_session(&self, session: &StoredSession) -> Result<CookieWriteOutcome, SessionError> {
        let value = encode_session_cookie(session)?;
        Ok(self
            .bridge
            .write_all([CookieWrite::new(self.config.session_cookie_name(), value)]))
    }

    /// Revokes the session at the backend, then blanks the session cookie.
    /// Backend failures are logged and do not keep the cookie alive.
    pub async fn sign_out(&self) -> CookieWriteOutcome {
        if let Some(session) = self.session() {
            let result = self
                .http
                .post(self.config.endpoint(LOGOUT_PATH))
                .header("apikey", &self.config.anon_key)
                .bearer_auth(&session.access_token)
                .timeout(self.config.request_timeout)
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    warn!(status = response.status().as_u16(), "session backend logout rejected");
                }
                Err(error) => warn!(%error, "session backend logout failed"),
            }
        }

        self.bridge
            .write_all([CookieWrite::new(self.config.session_cookie_name(), "")])
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use anyhow::Result;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;

    use super::{
        SessionBackendConfig, SessionUser, StoredSession, create_session_client,
        decode_session_cookie, encode_session_cookie,
    };
    use crate::error::SessionError;
    use crate::jar::{JarPhase, RequestCookieJar};
    use crate::policy::DeploymentEnv;

    fn session(token: &str) -> StoredSession {
        StoredSession {
            access_token: token.to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Some(1_900_000_000),
            token_type: "bearer".to_string(),
            user: None,
        }
    }

    async fn start_backend_stub(
        captured: Arc<Mutex<Vec<String>>>,
    ) -> Result<(SocketAddr, JoinHandle<()>)> {
        let user_captured = captured.clone();
        let app = Router::new()
            .route(
                "/auth/v1/user",
                get(move |headers: HeaderMap| {
                    let captured = user_captured.clone();
                    async move {
                        let apikey = header(&headers, "apikey");
                        let auth = header(&headers, "authorization");
                        captured.lock().await.push(format!("user {apikey} {auth}"));
                        if auth != "Bearer good-token" {
                            return (StatusCode::UNAUTHORIZED, String::new());
                        }
                        (
                            StatusCode::OK,
                            r#"{"id":"user-1","email":"ada@example.test","aud":"authenticated"}"#
                                .to_string(),
                        )
                    }
                }),
            )
            .route(
                "/auth/v1/logout",
                post(move |headers: HeaderMap| {
                    let captured = captured.clone();
                    async move {
                        let auth = header(&headers, "authorization");
                        captured.lock().await.push(format!("logout {auth}"));
                        StatusCode::NO_CONTENT
                    }
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .await
                .expect("session backend stub server failed");
        });
        Ok((addr, handle))
    }

    fn header(headers: &HeaderMap, name: &str) -> String {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    fn config(addr: SocketAddr) -> Result<SessionBackendConfig> {
        Ok(SessionBackendConfig::new(
            &format!("http://{addr}/"),
            "anon-key",
            DeploymentEnv::Development,
        )?)
    }

    #[test]
    fn config_derives_cookie_name_from_project_host() -> Result<()> {
        let config = SessionBackendConfig::new(
            " https://abcd1234.backend.example/ ",
            "anon",
            DeploymentEnv::Production,
        )?;
        assert_eq!(config.url(), "https://abcd1234.backend.example");
        assert_eq!(config.project_ref(), "abcd1234");
        assert_eq!(config.session_cookie_name(), "sb-abcd1234-auth-token");
        Ok(())
    }

    #[test]
    fn config_rejects_non_http_urls() {
        let error = SessionBackendConfig::new("ftp://host", "anon", DeploymentEnv::Development);
        assert!(matches!(error, Err(SessionError::InvalidConfig(_))));
        let error = SessionBackendConfig::new("not a url", "anon", DeploymentEnv::Development);
        assert!(matches!(error, Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn session_cookie_encoding_survives_the_jar() -> Result<()> {
        let encoded = encode_session_cookie(&session("tok"))?;
        assert!(encoded.starts_with("base64-"));
        assert!(!encoded.contains(';'));
        assert_eq!(decode_session_cookie(&encoded), Some(session("tok")));
        assert_eq!(decode_session_cookie(""), None);
        assert_eq!(decode_session_cookie("base64-!!!"), None);
        assert_eq!(decode_session_cookie(r#"{"access_token":""}"#), None);
        Ok(())
    }

    #[tokio::test]
    async fn get_user_without_session_skips_backend() -> Result<()> {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let (addr, handle) = start_backend_stub(captured.clone()).await?;
        let jar = Arc::new(RequestCookieJar::empty(JarPhase::ReadOnly));
        let client = create_session_client(&config(addr)?, reqwest::Client::new(), jar);

        assert_eq!(client.get_user().await?, None);
        assert!(captured.lock().await.is_empty());
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn get_user_forwards_apikey_and_access_token() -> Result<()> {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let (addr, handle) = start_backend_stub(captured.clone()).await?;
        let config = config(addr)?;
        let cookie = format!(
            "{}={}",
            config.session_cookie_name(),
            encode_session_cookie(&session("good-token"))?
        );
        let jar = Arc::new(RequestCookieJar::from_cookie_header(
            Some(&cookie),
            JarPhase::ReadOnly,
        ));
        let client = create_session_client(&config, reqwest::Client::new(), jar);

        let user = client.get_user().await?;
        assert_eq!(
            user,
            Some(SessionUser {
                id: "user-1".to_string(),
                email: Some("ada@example.test".to_string()),
                role: None,
            })
        );
        assert_eq!(
            captured.lock().await.as_slice(),
            ["user anon-key Bearer good-token".to_string()]
        );
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn rejected_access_token_reads_as_signed_out() -> Result<()> {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let (addr, handle) = start_backend_stub(captured).await?;
        let config = config(addr)?;
        let cookie = format!(
            "{}={}",
            config.session_cookie_name(),
            encode_session_cookie(&session("stale-token"))?
        );
        let jar = Arc::new(RequestCookieJar::from_cookie_header(
            Some(&cookie),
            JarPhase::ReadOnly,
        ));
        let client = create_session_client(&config, reqwest::Client::new(), jar);

        assert_eq!(client.get_user().await?, None);
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn sign_out_revokes_and_blanks_cookie() -> Result<()> {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let (addr, handle) = start_backend_stub(captured.clone()).await?;
        let config = config(addr)?;
        let cookie = format!(
            "{}={}",
            config.session_cookie_name(),
            encode_session_cookie(&session("good-token"))?
        );
        let jar = Arc::new(RequestCookieJar::from_cookie_header(
            Some(&cookie),
            JarPhase::Mutable,
        ));
        let client = create_session_client(&config, reqwest::Client::new(), jar.clone());

        let outcome = client.sign_out().await;
        assert!(!outcome.is_deferred());
        assert_eq!(client.session(), None);
        assert_eq!(
            captured.lock().await.as_slice(),
            ["logout Bearer good-token".to_string()]
        );
        assert_eq!(
            jar.set_cookie_headers(),
            vec![format!(
                "{}=; Path=/; Max-Age=604800; HttpOnly; SameSite=Lax",
                config.session_cookie_name()
            )]
        );
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn slow_backend_times_out_as_transport_error() -> Result<()> {
        let app = Router::new().route(
            "/auth/v1/user",
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                StatusCode::OK
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .await
                .expect("slow backend stub server failed");
        });

        let config =
            config(addr)?.with_request_timeout(std::time::Duration::from_millis(50));
        assert_eq!(config.request_timeout().as_millis(), 50);
        let cookie = format!(
            "{}={}",
            config.session_cookie_name(),
            encode_session_cookie(&session("good-token"))?
        );
        let jar = Arc::new(RequestCookieJar::from_cookie_header(
            Some(&cookie),
            JarPhase::ReadOnly,
        ));
        let client = create_session_client(&config, reqwest::Client::new(), jar);

        let error = client.get_user().await.err();
        assert!(matches!(error, Some(SessionError::Transport(_))), "{error:?}");
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn set_session_in_read_only_phase_is_deferred() -> Result<()> {
        let config = SessionBackendConfig::new(
            "https://proj.backend.example",
            "anon",
            DeploymentEnv::Development,
        )?;
        let jar = Arc::new(RequestCookieJar::empty(JarPhase::ReadOnly));
        let client = create_session_client(&config, reqwest::Client::new(), jar);

        let outcome = client.set_session(&session("tok"))?;
        assert!(outcome.is_deferred());
        assert_eq!(client.session(), None);
        Ok(())
    }
}
