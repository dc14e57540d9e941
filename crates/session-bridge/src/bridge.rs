use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CookieWriteError;
use crate::jar::{CookiePair, CookieStore};
use crate::policy::{CookieOptions, CookiePolicy};

/// A cookie the session client wants written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieWrite {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub options: CookieOptions,
}

impl CookieWrite {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options: CookieOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CookieOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieWriteOutcome {
    Written {
        count: usize,
    },
    /// The jar is read-only for this phase. Entries before the refused one
    /// were written; the rest were skipped. Sessions stay current through a
    /// later mutable request.
    Deferred {
        written: usize,
        reason: CookieWriteError,
    },
    /// A cookie name or value cannot be carried in a header. No later
    /// request fixes this; entries after it were skipped.
    Rejected {
        written: usize,
        reason: CookieWriteError,
    },
}

impl CookieWriteOutcome {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred { .. })
    }
}

/// Read/write cookie surface handed to the session client.
///
/// Holds no cookies of its own: every call goes straight to the request's
/// store, with the policy applied to each write.
#[derive(Clone)]
pub struct SessionCookieBridge {
    store: Arc<dyn CookieStore>,
    policy: CookiePolicy,
}

impl SessionCookieBridge {
    pub fn new(store: Arc<dyn CookieStore>, policy: CookiePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &CookiePolicy {
        &self.policy
    }

    pub fn read_all(&self) -> Vec<CookiePair> {
        self.store.get_all()
    }

    pub fn write_all<I>(&self, entries: I) -> CookieWriteOutcome
    where
        I: IntoIterator<Item = CookieWrite>,
    {
        let mut written = 0;
        for entry in entries {
            let effective = self.policy.apply(&entry.options);
            match self.store.set(&entry.name, &entry.value, &effective) {
                Ok(()) => {}
                Err(reason @ CookieWriteError::ReadOnly { .. }) => {
                    return CookieWriteOutcome::Deferred { written, reason };
                }
                Err(reason @ CookieWriteError::Invalid { .. }) => {
                    return CookieWriteOutcome::Rejected { written, reason };
                }
            }
            written += 1;
        }
        CookieWriteOutcome::Written { count: written }
    }
}

impl std::fmt::Debug for SessionCookieBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookieBridge")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
