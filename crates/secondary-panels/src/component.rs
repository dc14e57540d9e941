use std::sync::Arc;

use async_trait::async_trait;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::error::PanelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    MetricEditController,
    VersionHistoryPanel,
}

impl ComponentId {
    pub const ALL: [Self; 2] = [Self::MetricEditController, Self::VersionHistoryPanel];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MetricEditController => "metric-edit-controller",
            Self::VersionHistoryPanel => "version-history-panel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Metric,
    Dashboard,
}

impl AssetType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Dashboard => "dashboard",
        }
    }
}

/// Props a table entry passes to its component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelProps {
    MetricEdit {
        metric_id: String,
    },
    VersionHistory {
        asset_id: String,
        asset_type: AssetType,
    },
}

impl PanelProps {
    pub const fn component(&self) -> ComponentId {
        match self {
            Self::MetricEdit { .. } => ComponentId::MetricEditController,
            Self::VersionHistory { .. } => ComponentId::VersionHistoryPanel,
        }
    }
}

pub trait PanelComponent: Send + Sync {
    fn id(&self) -> ComponentId;

    fn render(&self, props: &PanelProps) -> Markup;
}

/// Source of panel component implementations.
///
/// Loading may be slow (feature code fetched or initialised on first use);
/// the table memoizes each successful load, so implementations do not need
/// their own cache.
#[async_trait]
pub trait ComponentLoader: Send + Sync {
    async fn load(&self, id: ComponentId) -> Result<Arc<dyn PanelComponent>, PanelError>;
}

/// Loader backed by the shells compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinComponentLoader;

#[async_trait]
impl ComponentLoader for BuiltinComponentLoader {
    async fn load(&self, id: ComponentId) -> Result<Arc<dyn PanelComponent>, PanelError> {
        let component: Arc<dyn PanelComponent> = match id {
            ComponentId::MetricEditController => Arc::new(MetricEditController),
            ComponentId::VersionHistoryPanel => Arc::new(VersionHistoryPanel),
        };
        Ok(component)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricEditController;

impl PanelComponent for MetricEditController {
    fn id(&self) -> ComponentId {
        ComponentId::MetricEditController
    }

    fn render(&self, props: &PanelProps) -> Markup {
        let PanelProps::MetricEdit { metric_id } = props else {
            return html! {};
        };
        html! {
            section class="cw-panel cw-metric-edit"
                data-component=(self.id().as_str())
                data-metric-id=(metric_id) {
                header class="cw-panel-header" { "Edit chart" }
                div class="cw-panel-body" id="metric-edit-controller" {}
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VersionHistoryPanel;

impl PanelComponent for VersionHistoryPanel {
    fn id(&self) -> ComponentId {
        ComponentId::VersionHistoryPanel
    }

    fn render(&self, props: &PanelProps) -> Markup {
        let PanelProps::VersionHistory {
            asset_id,
            asset_type,
        } = props
        else {
            return html! {};
        };
        html! {
            section class="cw-panel cw-version-history"
                data-component=(self.id().as_str())
                data-asset-id=(asset_id)
                data-asset-type=(asset_type.as_str()) {
                header class="cw-panel-header" { "Version history" }
                ol class="cw-version-list" {}
            }
        }
    }
}
