//! Second render phase: full document composition

use crate::chunks::{render_tags, resolve_chunks};
use crate::manifest::Manifest;
use crate::state::State;
use crate::utils::escape_script_json;

use super::{RenderError, Rendered};

/// Global the client bundle reads its initial state from
pub const INITIAL_STATE_GLOBAL: &str = "window.__INITIAL_STATE__";

/// Document-level settings that do not depend on the request
#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    /// Title used when the page sets none
    pub default_title: Option<String>,

    /// Markup appended at the end of the body (development HMR client)
    pub body_suffix: Option<String>,
}

/// Compose the final document from the first-phase output
pub fn compose_document(
    rendered: &Rendered,
    manifest: &Manifest,
    state: &State,
    options: &DocumentOptions,
) -> Result<String, RenderError> {
    let head = &rendered.head;
    let styles = render_tags(&resolve_chunks(manifest, "css"));
    let scripts = render_tags(&resolve_chunks(manifest, "js"));
    let state_json = escape_script_json(&serde_json::to_string(state)?);

    let mut html = String::with_capacity(rendered.body.len() + 1024);
    html.push_str("<!DOCTYPE html>");
    html.push_str(&format!("<html{}>", head.html_attributes()));

    html.push_str("<head>");
    html.push_str(r#"<meta charset="UTF-8"/>"#);
    html.push_str(&head.title_tag(options.default_title.as_deref()));
    html.push_str(&head.meta_tags());
    html.push_str(&head.link_tags());
    html.push_str(&styles);
    html.push_str(&format!(
        r#"<script charset="UTF-8">{}={};</script>"#,
        INITIAL_STATE_GLOBAL, state_json
    ));
    html.push_str("</head>");

    html.push_str(&format!("<body{}>", head.body_attributes()));
    html.push_str(&format!(r#"<div id="app">{}</div>"#, rendered.body));
    html.push_str(&scripts);
    if let Some(suffix) = &options.body_suffix {
        html.push_str(suffix);
    }
    html.push_str("</body></html>");

    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ChunkAssets, ChunkMap};
    use crate::render::Head;
    use crate::state::User;

    fn manifest() -> Manifest {
        let mut chunks = ChunkMap::new();
        chunks.insert(
            "main",
            ChunkAssets::Many(vec![
                "main.11aa.js".to_string(),
                "main.11aa.css".to_string(),
                "main.0000.hot-update.js".to_string(),
            ]),
        );
        chunks.insert("vendor", ChunkAssets::Single("vendor.22bb.js".to_string()));
        Manifest::new("/static/", chunks)
    }

    fn rendered() -> Rendered {
        let mut head = Head::new();
        head.title("Posts").html_attr("lang", "en").body_attr("class", "app");
        Rendered {
            body: "<h3>hi</h3>".to_string(),
            head,
        }
    }

    #[test]
    fn test_document_layout() {
        let html = compose_document(
            &rendered(),
            &manifest(),
            &State::default(),
            &DocumentOptions::default(),
        )
        .unwrap();

        assert!(html.starts_with(r#"<!DOCTYPE html><html lang="en"><head>"#));
        assert!(html.contains("<title>Posts</title>"));
        assert!(html.contains(r#"<body class="app"><div id="app"><h3>hi</h3></div>"#));
        assert!(html.ends_with("</body></html>"));
    }

    #[test]
    fn test_styles_in_head_scripts_in_body() {
        let html = compose_document(
            &rendered(),
            &manifest(),
            &State::default(),
            &DocumentOptions::default(),
        )
        .unwrap();

        let head_end = html.find("</head>").unwrap();
        let css = html.find(r#"<link rel="stylesheet" href="/static/main.11aa.css"/>"#).unwrap();
        assert!(css < head_end);

        let app = html.find(r#"<div id="app">"#).unwrap();
        let main_js = html.find(r#"<script src="/static/main.11aa.js"></script>"#).unwrap();
        let vendor_js = html.find(r#"<script src="/static/vendor.22bb.js"></script>"#).unwrap();
        assert!(app < main_js && main_js < vendor_js);
        assert!(!html.contains("hot-update"));
    }

    #[test]
    fn test_initial_state_is_embedded_safely() {
        let state = State {
            users: vec![User { name: "</script><script>x()".to_string() }],
            posts: Vec::new(),
        };
        let html =
            compose_document(&rendered(), &manifest(), &state, &DocumentOptions::default())
                .unwrap();

        assert!(html.contains(r#"window.__INITIAL_STATE__={"users":[{"name":"\u003C\u002Fscript"#));
        assert_eq!(html.matches("</script>").count(), 3);
    }

    #[test]
    fn test_default_title_and_body_suffix() {
        let options = DocumentOptions {
            default_title: Some("dace app".to_string()),
            body_suffix: Some("<!-- hmr -->".to_string()),
        };
        let rendered = Rendered {
            body: String::new(),
            head: Head::new(),
        };
        let html = compose_document(&rendered, &manifest(), &State::default(), &options).unwrap();

        assert!(html.contains("<title>dace app</title>"));
        assert!(html.ends_with("<!-- hmr --></body></html>"));
    }
}
