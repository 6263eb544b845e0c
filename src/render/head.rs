//! Document metadata collected while a page renders

use crate::utils::escape_html;

/// Head metadata emitted by a page during the first render phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Head {
    title: Option<String>,
    meta: Vec<(String, String)>,
    links: Vec<(String, String)>,
    html_attrs: Vec<(String, String)>,
    body_attrs: Vec<(String, String)>,
}

impl Head {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document title; the last call wins
    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    /// Add a `<meta name=… content=…>` tag
    pub fn meta(&mut self, name: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.meta.push((name.into(), content.into()));
        self
    }

    /// Add a `<link rel=… href=…>` tag
    pub fn link(&mut self, rel: impl Into<String>, href: impl Into<String>) -> &mut Self {
        self.links.push((rel.into(), href.into()));
        self
    }

    pub fn html_attr(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        set_attr(&mut self.html_attrs, name.into(), value.into());
        self
    }

    pub fn body_attr(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        set_attr(&mut self.body_attrs, name.into(), value.into());
        self
    }

    pub fn get_title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn title_tag(&self, fallback: Option<&str>) -> String {
        match self.title.as_deref().or(fallback) {
            Some(title) => format!("<title>{}</title>", escape_html(title)),
            None => String::new(),
        }
    }

    pub fn meta_tags(&self) -> String {
        self.meta
            .iter()
            .map(|(name, content)| {
                format!(
                    r#"<meta name="{}" content="{}"/>"#,
                    escape_html(name),
                    escape_html(content)
                )
            })
            .collect()
    }

    pub fn link_tags(&self) -> String {
        self.links
            .iter()
            .map(|(rel, href)| {
                format!(r#"<link rel="{}" href="{}"/>"#, escape_html(rel), escape_html(href))
            })
            .collect()
    }

    pub fn html_attributes(&self) -> String {
        render_attrs(&self.html_attrs)
    }

    pub fn body_attributes(&self) -> String {
        render_attrs(&self.body_attrs)
    }
}

fn set_attr(attrs: &mut Vec<(String, String)>, name: String, value: String) {
    match attrs.iter_mut().find(|(existing, _)| *existing == name) {
        Some(attr) => attr.1 = value,
        None => attrs.push((name, value)),
    }
}

/// Attributes with a leading space each, ready to follow a tag name
fn render_attrs(attrs: &[(String, String)]) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!(r#" {}="{}""#, escape_html(name), escape_html(value)))
        .collect()
}
