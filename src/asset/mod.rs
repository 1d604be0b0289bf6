//! Live assets: classification, construction and lookup.
//!
//! An asset is a script or stylesheet that can be patched into a running
//! page without a reload. Everything else is "unpatchable" and forces a full
//! reload when it changes.

mod kind;
pub mod resolve;

pub use kind::AssetKind;
pub use resolve::{build, cache_token, classify, find};

/// A document-insertable element for a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub kind: AssetKind,
    /// Identity marker, always the change path.
    pub id: String,
    /// Content locator (`src`/`href`), usually cache-busted.
    pub locator: String,
}

impl Asset {
    /// Render as a `<head>` element.
    pub fn to_html(&self) -> String {
        render_element(self.kind, Some(&self.id), &self.locator)
    }
}

/// Render a head element for `kind`. Shared with documents that hold
/// elements not created by this client (no identity marker).
pub fn render_element(kind: AssetKind, id: Option<&str>, locator: &str) -> String {
    let id = id
        .map(|id| format!(r#" id="{}""#, escape_attr(id)))
        .unwrap_or_default();
    let locator = escape_attr(locator);
    match kind {
        AssetKind::Script => format!(r#"<script{id} src="{locator}"></script>"#),
        AssetKind::Stylesheet => format!(r#"<link{id} rel="stylesheet" href="{locator}">"#),
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
