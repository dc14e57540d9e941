use maud::{Markup, html};

use crate::context::PanelContext;
use crate::view::SecondaryView;

pub const PANEL_FRAGMENT_PREFIX: &str = "/panels";
pub const LOADING_CLASS: &str = "cw-panel-loading";

/// Path of the fragment that swaps in the resolved component.
pub fn fragment_url(view: SecondaryView, context: &PanelContext) -> String {
    format!(
        "{PANEL_FRAGMENT_PREFIX}/{}/{}?file_id={}",
        view.file_type(),
        view.key(),
        urlencoding::encode(context.selected_file_id())
    )
}

/// Shared loading placeholder. Fetches its replacement as soon as it mounts.
pub fn loading(fragment_url: &str) -> Markup {
    html! {
        div class=(LOADING_CLASS)
            role="status"
            aria-busy="true"
            hx-get=(fragment_url)
            hx-trigger="load"
            hx-swap="outerHTML" {
            span class="cw-spinner" {}
            span class="cw-sr-only" { "Loading…" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fragment_url, loading};
    use crate::context::PanelContext;
    use crate::view::{MetricView, SecondaryView};

    #[test]
    fn fragment_url_encodes_file_id() {
        let view = SecondaryView::Metric(MetricView::ChartEdit);
        let url = fragment_url(view, &PanelContext::for_file("a b/c"));
        assert_eq!(url, "/panels/metric/chart-edit?file_id=a%20b%2Fc");
        assert_eq!(
            fragment_url(view, &PanelContext::default()),
            "/panels/metric/chart-edit?file_id="
        );
    }

    #[test]
    fn loading_swaps_itself_out_on_load() {
        let html = loading("/panels/metric/chart-edit?file_id=1").into_string();
        assert!(html.contains("hx-get=\"/panels/metric/chart-edit?file_id=1\""));
        assert!(html.contains("hx-trigger=\"load\""));
        assert!(html.contains("hx-swap=\"outerHTML\""));
        assert!(html.contains("aria-busy=\"true\""));
    }
}
