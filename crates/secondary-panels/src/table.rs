use std::sync::Arc;

use maud::{Markup, html};

use crate::component::{
    AssetType, BuiltinComponentLoader, ComponentId, ComponentLoader, PanelProps,
};
use crate::context::PanelContext;
use crate::error::PanelError;
use crate::lazy::LazyComponent;
use crate::placeholder::{fragment_url, loading};
use crate::view::{DashboardView, MetricView, SecondaryView};

/// Views the secondary layout region must not mount. Absent keys are visible.
const RENDER_OVERRIDES: &[(SecondaryView, bool)] = &[
    (SecondaryView::Metric(MetricView::SqlEdit), false),
    (SecondaryView::Dashboard(DashboardView::DashboardEdit), false),
];

/// Whether the layout should mount the panel for `view` at all.
pub fn should_render(view: SecondaryView) -> bool {
    RENDER_OVERRIDES
        .iter()
        .find(|(key, _)| *key == view)
        .is_none_or(|(_, visible)| *visible)
}

#[derive(Debug, Clone)]
pub enum PanelNode {
    /// The entry deliberately renders nothing.
    Empty,
    /// Component not resolved yet; the placeholder fetches `fragment_url`.
    Pending {
        component: ComponentId,
        fragment_url: String,
    },
    Ready(Markup),
}

impl PanelNode {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn into_markup(self) -> Markup {
        match self {
            Self::Empty => html! {},
            Self::Pending { fragment_url, .. } => loading(&fragment_url),
            Self::Ready(markup) => markup,
        }
    }
}

/// Dispatch table from secondary view keys to deferred panel components.
///
/// Built once and shared; the only interior state is each component's
/// resolve-once cell.
#[derive(Debug)]
pub struct SecondaryPanelTable {
    metric_edit_controller: LazyComponent,
    version_history_panel: LazyComponent,
}

impl SecondaryPanelTable {
    pub fn new(loader: Arc<dyn ComponentLoader>) -> Self {
        Self {
            metric_edit_controller: LazyComponent::new(
                ComponentId::MetricEditController,
                loader.clone(),
            ),
            version_history_panel: LazyComponent::new(ComponentId::VersionHistoryPanel, loader),
        }
    }

    pub fn builtin() -> Self {
        Self::new(Arc::new(BuiltinComponentLoader))
    }

    pub fn should_render(&self, view: SecondaryView) -> bool {
        should_render(view)
    }

    pub fn render(&self, view: SecondaryView, context: &PanelContext) -> PanelNode {
        let Some((lazy, props)) = self.entry(view, context) else {
            return PanelNode::Empty;
        };
        match lazy.get() {
            Some(component) => PanelNode::Ready(component.render(&props)),
            None => PanelNode::Pending {
                component: lazy.id(),
                fragment_url: fragment_url(view, context),
            },
        }
    }

    pub async fn resolve(
        &self,
        view: SecondaryView,
        context: &PanelContext,
    ) -> Result<Markup, PanelError> {
        let Some((lazy, props)) = self.entry(view, context) else {
            return Ok(html! {});
        };
        let component = lazy.resolve().await?;
        Ok(component.render(&props))
    }

    fn entry(
        &self,
        view: SecondaryView,
        context: &PanelContext,
    ) -> Option<(&LazyComponent, PanelProps)> {
        let file_id = context.selected_file_id().to_string();
        match view {
            SecondaryView::Metric(MetricView::ChartEdit) => Some((
                &self.metric_edit_controller,
                PanelProps::MetricEdit { metric_id: file_id },
            )),
            // Vertical splitter: the SQL editor already owns the horizontal pane.
            SecondaryView::Metric(MetricView::SqlEdit) => None,
            SecondaryView::Metric(MetricView::VersionHistory) => Some((
                &self.version_history_panel,
                PanelProps::VersionHistory {
                    asset_id: file_id,
                    asset_type: AssetType::Metric,
                },
            )),
            // The dashboard editor lives in the primary pane.
            SecondaryView::Dashboard(DashboardView::DashboardEdit) => None,
            SecondaryView::Dashboard(DashboardView::VersionHistory) => Some((
                &self.version_history_panel,
                PanelProps::VersionHistory {
                    asset_id: file_id,
                    asset_type: AssetType::Dashboard,
                },
            )),
        }
    }
}

impl Default for SecondaryPanelTable {
    fn default() -> Self {
        Self::builtin()
    }
}
