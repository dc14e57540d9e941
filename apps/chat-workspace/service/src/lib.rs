use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::extract::{Path, Query, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use secondary_panels::{FileType, PanelContext, SecondaryPanelTable, SecondaryView};
use serde::{Deserialize, Serialize};
use session_bridge::{
    CookieWrite, CookieWriteOutcome, JarPhase, RequestCookieJar, SessionClient, SessionUser,
    StoredSession, create_session_client,
};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

pub mod api_envelope;
pub mod config;
pub mod web_htmx;
pub mod web_maud;

use crate::api_envelope::{ApiErrorTuple, ok_data, panel_error, session_error};
use crate::config::Config;
use crate::web_htmx::{fragment_response, page_response, wants_fragment};
use crate::web_maud::{
    FilePage, SecondaryRegion, SessionView, render_file_page, render_main_fragment,
    render_secondary_region,
};

const SERVICE_NAME: &str = "chat-workspace-service";

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    panels: Arc<SecondaryPanelTable>,
    http: reqwest::Client,
    started_at: SystemTime,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    deployment: &'static str,
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    status: &'static str,
    static_dir: String,
}

#[derive(Debug, Default, Deserialize)]
struct FilePageQuery {
    secondary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PanelFragmentQuery {
    file_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SessionStatusResponse {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<SessionUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
}

#[derive(Debug, Serialize)]
struct CookieWriteResponse {
    written: usize,
    deferred: bool,
    rejected: bool,
}

impl From<&CookieWriteOutcome> for CookieWriteResponse {
    fn from(outcome: &CookieWriteOutcome) -> Self {
        match outcome {
            CookieWriteOutcome::Written { count } => Self {
                written: *count,
                deferred: false,
                rejected: false,
            },
            CookieWriteOutcome::Deferred { written, .. } => Self {
                written: *written,
                deferred: true,
                rejected: false,
            },
            CookieWriteOutcome::Rejected { written, .. } => Self {
                written: *written,
                deferred: false,
                rejected: true,
            },
        }
    }
}

pub fn build_router(config: Config) -> Router {
    build_router_with_panels(config, Arc::new(SecondaryPanelTable::builtin()))
}

pub fn build_router_with_panels(config: Config, panels: Arc<SecondaryPanelTable>) -> Router {
    let request_timeout = Duration::from_millis(config.request_timeout_ms);
    let assets = ServeDir::new(config.static_dir.join("assets"));
    let state = AppState {
        config: Arc::new(config),
        panels,
        http: reqwest::Client::new(),
        started_at: SystemTime::now(),
    };

    Router::new()
        .route("/healthz", get(health))
        .route("/readyz", get(readiness))
        .route("/files/:file_type/:file_id", get(file_page))
        .route(
            "/files/:file_type/:file_id/secondary/:view",
            get(secondary_region),
        )
        .route("/panels/:file_type/:view", get(panel_fragment))
        .route("/api/session", get(session_show).post(session_store))
        .route("/api/session/sign-out", post(session_sign_out))
        .nest_service("/assets", assets)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout)),
        )
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = match state.started_at.elapsed() {
        Ok(duration) => duration.as_secs(),
        Err(_) => 0,
    };

    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds,
        deployment: state.config.deployment.as_str(),
    })
}

async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let static_dir = state.config.static_dir.to_string_lossy().to_string();

    if state.config.static_dir.is_dir() {
        return (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                static_dir,
            }),
        );
    }

    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ReadinessResponse {
            status: "not_ready",
            static_dir,
        }),
    )
}

async fn file_page(
    State(state): State<AppState>,
    Path((file_type, file_id)): Path<(String, String)>,
    Query(query): Query<FilePageQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiErrorTuple> {
    let request_id = request_id(&headers);
    let file_type = FileType::parse(&file_type).map_err(|error| {
        debug!(request_id = %request_id, %error, "file page for unknown file type");
        panel_error(&error)
    })?;
    let secondary = query
        .secondary
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| SecondaryView::parse(file_type, key))
        .transpose()
        .map_err(|error| panel_error(&error))?;

    // Page renders cannot change cookies; any write here comes back deferred.
    let jar = request_jar(&headers, JarPhase::ReadOnly);
    let session = render_session(&state, &jar, &request_id).await;

    let context = PanelContext::for_file(file_id.clone());
    let page = FilePage {
        file_type,
        file_id,
        session,
        secondary: secondary.map(|view| mount_secondary(&state.panels, view, &context)),
    };

    if wants_fragment(&headers) {
        return Ok(fragment_response(
            render_main_fragment(&page),
            StatusCode::OK,
        ));
    }
    Ok(page_response(render_file_page(&page)))
}

async fn secondary_region(
    State(state): State<AppState>,
    Path((file_type, file_id, view)): Path<(String, String, String)>,
) -> Result<Response, ApiErrorTuple> {
    let view = parse_view(&file_type, &view)?;
    let context = PanelContext::for_file(file_id);
    let region = mount_secondary(&state.panels, view, &context);
    Ok(fragment_response(
        render_secondary_region(&region).into_string(),
        StatusCode::OK,
    ))
}

async fn panel_fragment(
    State(state): State<AppState>,
    Path((file_type, view)): Path<(String, String)>,
    Query(query): Query<PanelFragmentQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiErrorTuple> {
    let view = parse_view(&file_type, &view)?;
    let context = query
        .file_id
        .filter(|file_id| !file_id.is_empty())
        .map(PanelContext::for_file)
        .unwrap_or_default();

    match state.panels.resolve(view, &context).await {
        Ok(markup) => Ok(fragment_response(markup.into_string(), StatusCode::OK)),
        Err(error) => {
            warn!(
                request_id = %request_id(&headers),
                view = %view,
                %error,
                "secondary panel failed to resolve"
            );
            Err(panel_error(&error))
        }
    }
}

async fn session_show(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let jar = request_jar(&headers, JarPhase::Mutable);
    let client = session_client(&state, &jar);

    let response = match client.get_user().await {
        Ok(user) => {
            let expires_at = user
                .as_ref()
                .and_then(|_| client.session())
                .and_then(|session| session.expires_at);
            ok_data(SessionStatusResponse {
                authenticated: user.is_some(),
                user,
                expires_at,
            })
            .into_response()
        }
        Err(error) => {
            warn!(request_id = %request_id(&headers), %error, "session lookup failed");
            session_error(&error).into_response()
        }
    };
    apply_set_cookies(response, &jar)
}

async fn session_store(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(session): Json<StoredSession>,
) -> Response {
    let jar = request_jar(&headers, JarPhase::Mutable);
    let client = session_client(&state, &jar);

    let response = match client.set_session(&session) {
        Ok(outcome) => {
            log_cookie_outcome("session_store", &outcome);
            ok_data(CookieWriteResponse::from(&outcome)).into_response()
        }
        Err(error) => session_error(&error).into_response(),
    };
    apply_set_cookies(response, &jar)
}

async fn session_sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let jar = request_jar(&headers, JarPhase::Mutable);
    let client = session_client(&state, &jar);

    let outcome = client.sign_out().await;
    log_cookie_outcome("session_sign_out", &outcome);
    apply_set_cookies(
        ok_data(CookieWriteResponse::from(&outcome)).into_response(),
        &jar,
    )
}

fn parse_view(file_type: &str, view: &str) -> Result<SecondaryView, ApiErrorTuple> {
    FileType::parse(file_type)
        .and_then(|file_type| SecondaryView::parse(file_type, view))
        .map_err(|error| panel_error(&error))
}

/// Hidden views keep their slot in the layout but never mount content.
fn mount_secondary(
    panels: &SecondaryPanelTable,
    view: SecondaryView,
    context: &PanelContext,
) -> SecondaryRegion {
    let mounted = panels.should_render(view);
    let content = if mounted {
        panels.render(view, context).into_markup()
    } else {
        maud::html! {}
    };
    SecondaryRegion {
        view,
        mounted,
        content,
    }
}

async fn render_session(
    state: &AppState,
    jar: &Arc<RequestCookieJar>,
    request_id: &str,
) -> Option<SessionView> {
    let client = session_client(state, jar);
    client.session()?;
    match client.get_user().await {
        Ok(Some(user)) => Some(SessionView {
            user_id: user.id,
            email: user.email,
        }),
        Ok(None) => {
            let outcome = client.bridge().write_all([CookieWrite::new(
                state.config.session_backend.session_cookie_name(),
                "",
            )]);
            debug!(request_id = %request_id, "session cookie rejected by backend");
            log_cookie_outcome("file_page", &outcome);
            None
        }
        Err(error) => {
            warn!(request_id = %request_id, %error, "session lookup failed during page render");
            None
        }
    }
}

fn session_client(state: &AppState, jar: &Arc<RequestCookieJar>) -> SessionClient {
    create_session_client(
        &state.config.session_backend,
        state.http.clone(),
        jar.clone(),
    )
}

fn request_jar(headers: &HeaderMap, phase: JarPhase) -> Arc<RequestCookieJar> {
    let raw = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    let raw = (!raw.is_empty()).then_some(raw);
    Arc::new(RequestCookieJar::from_cookie_header(raw.as_deref(), phase))
}

fn apply_set_cookies(mut response: Response, jar: &RequestCookieJar) -> Response {
    for cookie in jar.take_set_cookie_headers() {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(error) => warn!(%error, "dropping unrepresentable set-cookie header"),
        }
    }
    response
}

fn log_cookie_outcome(route: &'static str, outcome: &CookieWriteOutcome) {
    match outcome {
        CookieWriteOutcome::Written { count } => {
            debug!(route, count, "session cookies written");
        }
        CookieWriteOutcome::Deferred { written, reason } => {
            debug!(route, written, %reason, "session cookie write deferred");
        }
        CookieWriteOutcome::Rejected { written, reason } => {
            warn!(route, written, %reason, "session cookie write rejected");
        }
    }
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("req_{}", uuid::Uuid::new_v4().simple()))
}
