use maud::{DOCTYPE, Markup, PreEscaped, html};
use secondary_panels::{FileType, SecondaryView, should_render};

pub const HTMX_ASSET_PATH: &str = "/assets/htmx-2_0_8.min.js";
pub const SECONDARY_REGION_ID: &str = "cw-secondary";

#[derive(Debug, Clone)]
pub struct SessionView {
    pub user_id: String,
    pub email: Option<String>,
}

/// The secondary pane as the layout decided to mount it.
#[derive(Debug, Clone)]
pub struct SecondaryRegion {
    pub view: SecondaryView,
    pub mounted: bool,
    pub content: Markup,
}

#[derive(Debug, Clone)]
pub struct FilePage {
    pub file_type: FileType,
    pub file_id: String,
    pub session: Option<SessionView>,
    pub secondary: Option<SecondaryRegion>,
}

impl FilePage {
    fn title(&self) -> String {
        match self.file_type {
            FileType::Metric => format!("Metric {}", self.file_id),
            FileType::Dashboard => format!("Dashboard {}", self.file_id),
        }
    }
}

pub fn render_file_page(page: &FilePage) -> String {
    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (page.title()) " | Chat Workspace" }
                style { (PreEscaped(styles())) }
                script src=(HTMX_ASSET_PATH) defer {}
            }
            body {
                div class="cw-app" id="cw-shell" {
                    (topbar(page.session.as_ref()))
                    (render_main_fragment_markup(page))
                }
            }
        }
    };
    markup.into_string()
}

pub fn render_main_fragment(page: &FilePage) -> String {
    render_main_fragment_markup(page).into_string()
}

pub fn render_secondary_region(region: &SecondaryRegion) -> Markup {
    html! {
        aside id=(SECONDARY_REGION_ID)
            class="cw-secondary"
            data-view=(region.view.to_string())
            data-mounted=(region.mounted) {
            @if region.mounted {
                (region.content)
            }
        }
    }
}

fn topbar(session: Option<&SessionView>) -> Markup {
    html! {
        header class="cw-topbar" {
            div class="cw-brand" { "Chat Workspace" }
            div class="cw-session" {
                @if let Some(session) = session {
                    span class="cw-session-label" {
                        (session.email.as_deref().unwrap_or(session.user_id.as_str()))
                    }
                    button type="button"
                        class="cw-btn subtle"
                        hx-post="/api/session/sign-out"
                        hx-swap="none"
                        hx-on--after-request="window.location.reload()" {
                        "Sign out"
                    }
                } @else {
                    span class="cw-session-label muted" { "Signed out" }
                }
            }
        }
    }
}

fn render_main_fragment_markup(page: &FilePage) -> Markup {
    let active = page.secondary.as_ref().map(|region| region.view);
    html! {
        main id="cw-main-shell" class="cw-main" {
            div class="cw-split" {
                section class="cw-primary"
                    data-file-type=(page.file_type.as_str())
                    data-file-id=(page.file_id) {
                    h1 { (page.title()) }
                    (secondary_nav(page.file_type, &page.file_id, active))
                }
                @if let Some(region) = &page.secondary {
                    (render_secondary_region(region))
                } @else {
                    aside id=(SECONDARY_REGION_ID) class="cw-secondary" data-mounted="false" {}
                }
            }
        }
    }
}

fn secondary_nav(file_type: FileType, file_id: &str, active: Option<SecondaryView>) -> Markup {
    let encoded_id = urlencoding::encode(file_id);
    html! {
        nav class="cw-secondary-nav" {
            @for view in SecondaryView::all().filter(|view| view.file_type() == file_type) {
                @if should_render(view) {
                    @let href = format!("/files/{file_type}/{encoded_id}?secondary={}", view.key());
                    @let fragment = format!("/files/{file_type}/{encoded_id}/secondary/{}", view.key());
                    a class={(if active == Some(view) { "cw-tab active" } else { "cw-tab" })}
                        href=(href)
                        hx-get=(fragment)
                        hx-target={"#" (SECONDARY_REGION_ID)}
                        hx-swap="outerHTML" {
                        (view.key())
                    }
                }
            }
        }
    }
}

fn styles() -> &'static str {
    r#"
:root { color-scheme: light; font-family: ui-sans-serif, system-ui, sans-serif; }
body { margin: 0; background: #f6f7f9; color: #1d2330; }
.cw-topbar { display: flex; justify-content: space-between; align-items: center; padding: 0.75rem 1.25rem; border-bottom: 1px solid #e1e4ea; background: #fff; }
.cw-brand { font-weight: 600; }
.cw-session { display: flex; gap: 0.75rem; align-items: center; }
.cw-session-label.muted { color: #6b7280; }
.cw-btn { border: 1px solid #cfd4dc; background: #fff; border-radius: 6px; padding: 0.3rem 0.7rem; cursor: pointer; }
.cw-split { display: grid; grid-template-columns: minmax(0, 1fr) minmax(320px, 38%); min-height: calc(100vh - 3.5rem); }
.cw-primary { padding: 1.25rem; }
.cw-secondary { border-left: 1px solid #e1e4ea; background: #fff; }
.cw-secondary[data-mounted="false"] { display: none; }
.cw-secondary-nav { display: flex; gap: 0.5rem; margin-top: 1rem; }
.cw-tab { padding: 0.25rem 0.6rem; border-radius: 6px; color: inherit; text-decoration: none; }
.cw-tab.active { background: #e8edf7; }
.cw-panel-header { padding: 0.75rem 1rem; font-weight: 600; border-bottom: 1px solid #eef0f4; }
.cw-panel-loading { display: flex; justify-content: center; padding: 2rem; }
.cw-spinner { width: 1.25rem; height: 1.25rem; border: 2px solid #cfd4dc; border-top-color: #3b5bdb; border-radius: 50%; animation: cw-spin 0.8s linear infinite; }
.cw-sr-only { position: absolute; width: 1px; height: 1px; overflow: hidden; clip: rect(0 0 0 0); }
@keyframes cw-spin { to { transform: rotate(360deg); } }
@media (max-width: 980px) {
  .cw-split { grid-template-columns: 1fr; }
  .cw-secondary { border-left: none; border-top: 1px solid #e1e4ea; }
}
"#
}

#[cfg(test)]
mod tests {
    use maud::html;
    use secondary_panels::{FileType, MetricView, SecondaryView};

    use super::{
        FilePage, HTMX_ASSET_PATH, SecondaryRegion, SessionView, render_file_page,
        render_main_fragment, render_secondary_region,
    };

    fn page(secondary: Option<SecondaryRegion>) -> FilePage {
        FilePage {
            file_type: FileType::Metric,
            file_id: "m 1".to_string(),
            session: Some(SessionView {
                user_id: "user-1".to_string(),
                email: Some("ada@example.test".to_string()),
            }),
            secondary,
        }
    }

    #[test]
    fn render_file_page_uses_pinned_htmx_asset() {
        let html = render_file_page(&page(None));
        assert!(html.contains(&format!("src=\"{HTMX_ASSET_PATH}\"")));
        assert!(html.contains("Metric m 1 | Chat Workspace"));
        assert!(html.contains("ada@example.test"));
    }

    #[test]
    fn sign_out_posts_through_htmx_only() {
        let html = render_file_page(&page(None));
        assert!(html.contains("hx-post=\"/api/session/sign-out\""));
        assert!(!html.contains("action=\"/api/session/sign-out\""));
        assert!(!html.contains("<form"));
    }

    #[test]
    fn tab_target_exists_without_selected_view() {
        let html = render_main_fragment(&page(None));
        assert!(html.contains("hx-target=\"#cw-secondary\""));
        assert!(html.contains("<aside id=\"cw-secondary\" class=\"cw-secondary\" data-mounted=\"false\">"));
    }

    #[test]
    fn secondary_nav_skips_hidden_views() {
        let html = render_main_fragment(&page(None));
        assert!(html.contains("href=\"/files/metric/m%201?secondary=chart-edit\""));
        assert!(html.contains("?secondary=version-history"));
        assert!(!html.contains("?secondary=sql-edit"));
        assert!(html.starts_with("<main id=\"cw-main-shell\""));
        assert!(!html.contains("<html"));
    }

    #[test]
    fn unmounted_region_drops_its_content() {
        let region = SecondaryRegion {
            view: SecondaryView::Metric(MetricView::SqlEdit),
            mounted: false,
            content: html! { p { "never shown" } },
        };
        let html = render_secondary_region(&region).into_string();
        assert!(html.contains("data-mounted=\"false\""));
        assert!(html.contains("data-view=\"metric/sql-edit\""));
        assert!(!html.contains("never shown"));
    }
}
