#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CookieWriteError {
    #[error("cookie '{name}' cannot be set while the response is read-only")]
    ReadOnly { name: String },
    #[error("cookie '{name}' has an invalid name or value")]
    Invalid { name: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session backend configuration: {0}")]
    InvalidConfig(String),
    #[error("session backend request failed: {0}")]
    Transport(String),
    #[error("session backend rejected request ({status}): {body}")]
    Backend { status: u16, body: String },
    #[error("invalid session payload: {0}")]
    InvalidPayload(String),
}
