use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PanelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Metric,
    Dashboard,
}

impl FileType {
    pub const ALL: [Self; 2] = [Self::Metric, Self::Dashboard];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Dashboard => "dashboard",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, PanelError> {
        match raw.trim() {
            "metric" => Ok(Self::Metric),
            "dashboard" => Ok(Self::Dashboard),
            other => Err(PanelError::UnknownFileType {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricView {
    ChartEdit,
    SqlEdit,
    VersionHistory,
}

impl MetricView {
    pub const ALL: [Self; 3] = [Self::ChartEdit, Self::SqlEdit, Self::VersionHistory];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChartEdit => "chart-edit",
            Self::SqlEdit => "sql-edit",
            Self::VersionHistory => "version-history",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|view| view.as_str() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardView {
    DashboardEdit,
    VersionHistory,
}

impl DashboardView {
    pub const ALL: [Self; 2] = [Self::DashboardEdit, Self::VersionHistory];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DashboardEdit => "dashboard-edit",
            Self::VersionHistory => "version-history",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|view| view.as_str() == key)
    }
}

/// A secondary view key, scoped to the file type whose record defines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryView {
    Metric(MetricView),
    Dashboard(DashboardView),
}

impl SecondaryView {
    /// Parses a wire key for the given file type.
    ///
    /// Keys outside the file type's enumeration are rejected rather than
    /// rendered as nothing, so a stale link or a mistyped route surfaces as
    /// an error instead of an empty pane.
    pub fn parse(file_type: FileType, key: &str) -> Result<Self, PanelError> {
        let key = key.trim();
        let view = match file_type {
            FileType::Metric => MetricView::from_key(key).map(Self::Metric),
            FileType::Dashboard => DashboardView::from_key(key).map(Self::Dashboard),
        };
        view.ok_or_else(|| PanelError::UnknownView {
            file_type: file_type.as_str(),
            key: key.to_string(),
        })
    }

    pub const fn file_type(self) -> FileType {
        match self {
            Self::Metric(_) => FileType::Metric,
            Self::Dashboard(_) => FileType::Dashboard,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Metric(view) => view.as_str(),
            Self::Dashboard(view) => view.as_str(),
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        MetricView::ALL
            .into_iter()
            .map(Self::Metric)
            .chain(DashboardView::ALL.into_iter().map(Self::Dashboard))
    }
}

impl fmt::Display for SecondaryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.file_type(), self.key())
    }
}
