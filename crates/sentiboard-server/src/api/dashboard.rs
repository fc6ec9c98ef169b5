use axum::{extract::State, response::Html};

use super::AppState;

const PAGE: &str = include_str!("dashboard.html");
const BANNER_SLOT: &str = "<!-- initialization-error -->";

/// GET /
pub(super) async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render(state.init_error.as_deref()))
}

fn render(init_error: Option<&str>) -> String {
    match init_error {
        Some(reason) => PAGE.replace(
            BANNER_SLOT,
            &format!(
                r#"<div class="banner">Initialization failed: {}. Showing sample data.</div>"#,
                escape_html(reason)
            ),
        ),
        None => PAGE.to_string(),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
