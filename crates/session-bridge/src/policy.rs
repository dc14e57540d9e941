use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE_PATH: &str = "/";
/// One week.
pub const SESSION_COOKIE_MAX_AGE_SECONDS: u64 = 60 * 60 * 24 * 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentEnv {
    #[default]
    Development,
    Production,
}

impl DeploymentEnv {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Cookie attributes. Unset fields are left to the browser default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CookieOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    /// Returns `self` with every attribute set on `overrides` replaced.
    pub fn merged_with(&self, overrides: &CookieOptions) -> CookieOptions {
        CookieOptions {
            path: overrides.path.clone().or_else(|| self.path.clone()),
            domain: overrides.domain.clone().or_else(|| self.domain.clone()),
            expires: overrides.expires.or(self.expires),
            max_age: overrides.max_age.or(self.max_age),
            secure: overrides.secure.or(self.secure),
            http_only: overrides.http_only.or(self.http_only),
            same_site: overrides.same_site.or(self.same_site),
        }
    }
}

/// Attributes forced onto every session cookie write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    overrides: CookieOptions,
}

impl CookiePolicy {
    pub fn for_deployment(deployment: DeploymentEnv) -> Self {
        Self {
            overrides: CookieOptions {
                path: Some(SESSION_COOKIE_PATH.to_string()),
                secure: Some(deployment.is_production()),
                same_site: Some(SameSite::Lax),
                http_only: Some(true),
                max_age: Some(SESSION_COOKIE_MAX_AGE_SECONDS),
                ..CookieOptions::default()
            },
        }
    }

    pub fn overrides(&self) -> &CookieOptions {
        &self.overrides
    }

    /// Effective attributes for a write: the policy wins on every attribute
    /// it sets, the rest come from `requested`.
    pub fn apply(&self, requested: &CookieOptions) -> CookieOptions {
        requested.merged_with(&self.overrides)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{
        CookieOptions, CookiePolicy, DeploymentEnv, SESSION_COOKIE_MAX_AGE_SECONDS, SameSite,
    };

    #[test]
    fn policy_overrides_caller_attributes() {
        let policy = CookiePolicy::for_deployment(DeploymentEnv::Development);
        let requested = CookieOptions {
            path: Some("/auth".to_string()),
            max_age: Some(0),
            http_only: Some(false),
            same_site: Some(SameSite::None),
            secure: Some(true),
            ..CookieOptions::default()
        };

        let effective = policy.apply(&requested);
        assert_eq!(effective.path.as_deref(), Some("/"));
        assert_eq!(effective.max_age, Some(SESSION_COOKIE_MAX_AGE_SECONDS));
        assert_eq!(effective.max_age, Some(604_800));
        assert_eq!(effective.http_only, Some(true));
        assert_eq!(effective.same_site, Some(SameSite::Lax));
        assert_eq!(effective.secure, Some(false));
    }

    #[test]
    fn policy_keeps_attributes_it_does_not_set() {
        let policy = CookiePolicy::for_deployment(DeploymentEnv::Production);
        let expires = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).single();
        let requested = CookieOptions {
            domain: Some("example.test".to_string()),
            expires,
            ..CookieOptions::default()
        };

        let effective = policy.apply(&requested);
        assert_eq!(effective.domain.as_deref(), Some("example.test"));
        assert_eq!(effective.expires, expires);
        assert_eq!(effective.secure, Some(true));
    }

    #[test]
    fn deployment_env_only_recognises_production() {
        assert!(DeploymentEnv::parse(" Production ").is_production());
        assert!(DeploymentEnv::parse("prod").is_production());
        assert!(!DeploymentEnv::parse("staging").is_production());
        assert!(!DeploymentEnv::parse("").is_production());
    }

    #[test]
    fn options_deserialize_from_camel_case() -> anyhow::Result<()> {
        let options: CookieOptions =
            serde_json::from_str(r#"{"maxAge":10,"httpOnly":false,"sameSite":"strict"}"#)?;
        assert_eq!(options.max_age, Some(10));
        assert_eq!(options.http_only, Some(false));
        assert_eq!(options.same_site, Some(SameSite::Strict));
        assert_eq!(options.path, None);
        Ok(())
    }
}
