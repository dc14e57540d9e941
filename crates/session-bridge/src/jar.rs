use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::CookieWriteError;
use crate::policy::CookieOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiePair {
    pub name: String,
    pub value: String,
}

impl CookiePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Whether the response can still carry `Set-Cookie` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JarPhase {
    Mutable,
    /// Rendering phase: headers are committed, writes are refused.
    ReadOnly,
}

/// The cookie jar owned by the current request.
pub trait CookieStore: Send + Sync {
    fn get_all(&self) -> Vec<CookiePair>;

    fn set(&self, name: &str, value: &str, options: &CookieOptions)
    -> Result<(), CookieWriteError>;
}

#[derive(Debug, Default)]
struct JarState {
    cookies: Vec<CookiePair>,
    set_cookie: Vec<String>,
}

/// Cookie jar built from one request's `Cookie` header.
///
/// Accepted writes are visible to later reads and queued as `Set-Cookie`
/// header values for the response.
#[derive(Debug)]
pub struct RequestCookieJar {
    phase: JarPhase,
    state: Mutex<JarState>,
}

impl RequestCookieJar {
    pub fn from_cookie_header(raw: Option<&str>, phase: JarPhase) -> Self {
        Self {
            phase,
            state: Mutex::new(JarState {
                cookies: raw.map(parse_cookie_header).unwrap_or_default(),
                set_cookie: Vec::new(),
            }),
        }
    }

    pub fn empty(phase: JarPhase) -> Self {
        Self::from_cookie_header(None, phase)
    }

    pub fn phase(&self) -> JarPhase {
        self.phase
    }

    /// `Set-Cookie` values queued so far, oldest first.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.lock().set_cookie.clone()
    }

    pub fn take_set_cookie_headers(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().set_cookie)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JarState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CookieStore for RequestCookieJar {
    fn get_all(&self) -> Vec<CookiePair> {
        self.lock().cookies.clone()
    }

    fn set(
        &self,
        name: &str,
        value: &str,
        options: &CookieOptions,
    ) -> Result<(), CookieWriteError> {
        if self.phase == JarPhase::ReadOnly {
            return Err(CookieWriteError::ReadOnly {
                name: name.to_string(),
            });
        }
        validate_cookie(name, value)?;

        let header = render_set_cookie(name, value, options);
        let mut state = self.lock();
        state.cookies.retain(|cookie| cookie.name != name);
        state.cookies.push(CookiePair::new(name, value));
        state.set_cookie.push(header);
        Ok(())
    }
}

pub fn parse_cookie_header(raw: &str) -> Vec<CookiePair> {
    raw.split(';')
        .filter_map(|part| {
            let (name, value) = part.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(CookiePair::new(name, value.trim()))
        })
        .collect()
}

pub fn render_set_cookie(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut header = format!("{name}={value}");
    if let Some(path) = &options.path {
        header.push_str(&format!("; Path={path}"));
    }
    if let Some(domain) = &options.domain {
        header.push_str(&format!("; Domain={domain}"));
    }
    if let Some(max_age) = options.max_age {
        header.push_str(&format!("; Max-Age={max_age}"));
    }
    if let Some(expires) = options.expires {
        header.push_str(&format!(
            "; Expires={}",
            expires.format("%a, %d %b %Y %H:%M:%S GMT")
        ));
    }
    if options.http_only == Some(true) {
        header.push_str("; HttpOnly");
    }
    if options.secure == Some(true) {
        header.push_str("; Secure");
    }
    if let Some(same_site) = options.same_site {
        header.push_str(&format!("; SameSite={}", same_site.as_str()));
    }
    header
}

fn validate_cookie(name: &str, value: &str) -> Result<(), CookieWriteError> {
    let name_ok = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_graphic() && !matches!(ch, ';' | '=' | ',' | '"'));
    let value_ok = value
        .chars()
        .all(|ch| ch.is_ascii_graphic() && !matches!(ch, ';' | ',' | '"' | '\\'));
    if name_ok && value_ok {
        Ok(())
    } else {
        Err(CookieWriteError::Invalid {
            name: name.to_string(),
        })
    }
}
