use axum::Json;
use axum::http::StatusCode;
use secondary_panels::PanelError;
use serde::Serialize;
use session_bridge::SessionError;

pub type ApiErrorTuple = (StatusCode, Json<ApiErrorResponse>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    InvalidRequest,
    NotFound,
    SessionBackendUnavailable,
    InternalError,
}

impl ApiErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::NotFound => "not_found",
            Self::SessionBackendUnavailable => "session_backend_unavailable",
            Self::InternalError => "internal_error",
        }
    }

    pub const fn default_status(self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::SessionBackendUnavailable => StatusCode::BAD_GATEWAY,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub message: String,
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ApiDataEnvelope<T> {
    pub data: T,
}

pub fn ok_data<T: Serialize>(data: T) -> (StatusCode, Json<ApiDataEnvelope<T>>) {
    (StatusCode::OK, Json(ApiDataEnvelope { data }))
}

pub fn error_response(code: ApiErrorCode, message: impl Into<String>) -> ApiErrorTuple {
    let message = message.into();
    (
        code.default_status(),
        Json(ApiErrorResponse {
            message: message.clone(),
            error: ApiErrorDetail {
                code: code.as_str(),
                message,
            },
        }),
    )
}

pub fn not_found_error(message: impl Into<String>) -> ApiErrorTuple {
    error_response(ApiErrorCode::NotFound, message)
}

/// Unmapped keys are routing errors; anything else is a server fault.
pub fn panel_error(error: &PanelError) -> ApiErrorTuple {
    if error.is_unmapped() {
        return not_found_error(error.to_string());
    }
    error_response(ApiErrorCode::InternalError, error.to_string())
}

pub fn session_error(error: &SessionError) -> ApiErrorTuple {
    match error {
        SessionError::InvalidPayload(_) => {
            error_response(ApiErrorCode::InvalidRequest, error.to_string())
        }
        SessionError::Transport(_) | SessionError::Backend { .. } => {
            error_response(ApiErrorCode::SessionBackendUnavailable, error.to_string())
        }
        SessionError::InvalidConfig(_) => {
            error_response(ApiErrorCode::InternalError, error.to_string())
        }
    }
}
