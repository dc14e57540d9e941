//! Cookie bridge between a request's cookie jar and the session backend
//! client.
//!
//! The request owns the jar. The bridge reads through to it and applies a
//! fixed [`CookiePolicy`] to every write; writes attempted while the response
//! is read-only come back as [`CookieWriteOutcome::Deferred`] instead of an
//! error.

pub mod bridge;
pub mod client;
pub mod error;
pub mod jar;
pub mod policy;

pub use bridge::{CookieWrite, CookieWriteOutcome, SessionCookieBridge};
pub use client::{
    SessionBackendConfig, SessionClient, SessionUser, StoredSession, create_session_client,
    decode_session_cookie, encode_session_cookie,
};
pub use error::{CookieWriteError, SessionError};
pub use jar::{CookiePair, CookieStore, JarPhase, RequestCookieJar};
pub use policy::{
    CookieOptions, CookiePolicy, DeploymentEnv, SESSION_COOKIE_MAX_AGE_SECONDS, SameSite,
};
