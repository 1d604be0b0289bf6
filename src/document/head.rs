//! In-memory model of a page's `<head>` assets.
//!
//! Seeded from HTML markup (scripts with `src`, stylesheet links with
//! `href`) and reloaded from the same source, so a headless session sees
//! the same asset graph a browser tab would.

use std::fs;
use std::path::{Path, PathBuf};

use super::{Document, ElementRef};
use crate::asset::{Asset, AssetKind, render_element};

/// One script or stylesheet element in the head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadElement {
    key: ElementRef,
    pub kind: AssetKind,
    /// Identity marker (`id` attribute), if any.
    pub id: Option<String>,
    /// `src` for scripts, `href` for stylesheets.
    pub locator: String,
}

impl HeadElement {
    pub fn key(&self) -> ElementRef {
        self.key
    }

    pub fn to_html(&self) -> String {
        render_element(self.kind, self.id.as_deref(), &self.locator)
    }
}

/// Where a reload reads the page from.
#[derive(Debug, Clone)]
enum PageSource {
    Markup(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct HeadDocument {
    elements: Vec<HeadElement>,
    /// Keys are never reused, even across reloads
    next_key: u64,
    source: PageSource,
    reloads: usize,
}

impl HeadDocument {
    /// Document with no assets; reloading keeps it empty.
    pub fn empty() -> Self {
        Self::from_html("")
    }

    /// Document seeded from in-memory markup.
    pub fn from_html(html: &str) -> Self {
        let mut doc = Self {
            elements: Vec::new(),
            next_key: 0,
            source: PageSource::Markup(html.to_string()),
            reloads: 0,
        };
        doc.load(html);
        doc
    }

    /// Document seeded from an HTML file, re-read on every reload.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let html = fs::read_to_string(path)?;
        let mut doc = Self::from_html(&html);
        doc.source = PageSource::File(path.to_path_buf());
        Ok(doc)
    }

    pub fn elements(&self) -> &[HeadElement] {
        &self.elements
    }

    pub fn element(&self, key: ElementRef) -> Option<&HeadElement> {
        self.elements.iter().find(|e| e.key == key)
    }

    /// Number of full reloads performed so far.
    pub fn reloads(&self) -> usize {
        self.reloads
    }

    /// Elements that belong to `path`: marked with it, or pointing at it
    /// (with or without a cache-busting query).
    pub fn elements_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a HeadElement> {
        self.elements.iter().filter(move |e| {
            e.id.as_deref() == Some(path)
                || e.locator.split('?').next().unwrap_or(&e.locator) == path
        })
    }

    /// Render the asset set as head markup, one element per line.
    pub fn render(&self) -> String {
        self.elements
            .iter()
            .map(HeadElement::to_html)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn load(&mut self, html: &str) {
        self.elements.clear();
        for (kind, id, locator) in scan_assets(html) {
            self.push(kind, id, locator);
        }
    }

    fn push(&mut self, kind: AssetKind, id: Option<String>, locator: String) {
        let key = ElementRef::new(self.next_key);
        self.next_key += 1;
        self.elements.push(HeadElement {
            key,
            kind,
            id,
            locator,
        });
    }
}

impl Document for HeadDocument {
    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        self.elements
            .iter()
            .find(|e| e.id.as_deref() == Some(id))
            .map(|e| e.key)
    }

    fn element_by_locator(&self, kind: AssetKind, locator: &str) -> Option<ElementRef> {
        self.elements
            .iter()
            .find(|e| e.kind == kind && e.locator == locator)
            .map(|e| e.key)
    }

    fn set_element_id(&mut self, element: ElementRef, id: &str) {
        if let Some(e) = self.elements.iter_mut().find(|e| e.key == element) {
            e.id = Some(id.to_string());
        }
    }

    fn append(&mut self, asset: Asset) {
        self.push(asset.kind, Some(asset.id), asset.locator);
    }

    fn remove(&mut self, element: ElementRef) {
        self.elements.retain(|e| e.key != element);
    }

    fn reload(&mut self) {
        self.reloads += 1;
        let html = match &self.source {
            PageSource::Markup(html) => html.clone(),
            PageSource::File(path) => match fs::read_to_string(path) {
                Ok(html) => html,
                Err(e) => {
                    // Keep the current state; the next reload retries the file
                    crate::log!("error"; "failed to reload {}: {}", path.display(), e);
                    return;
                }
            },
        };
        self.load(&html);
        crate::debug!("page"; "reloaded ({} assets)", self.elements.len());
    }
}

/// Collect `(kind, id, locator)` for every script/stylesheet in the markup.
fn scan_assets(html: &str) -> Vec<(AssetKind, Option<String>, String)> {
    let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for node in dom.nodes() {
        let Some(tag) = node.as_tag() else {
            continue;
        };
        let name = tag.name().as_utf8_str().to_ascii_lowercase();

        let attrs: Vec<(String, String)> = tag
            .attributes()
            .iter()
            .map(|(key, value)| {
                let key_str: &str = key.as_ref();
                let value = value.map(|v| v.to_string()).unwrap_or_default();
                (key_str.to_ascii_lowercase(), value)
            })
            .collect();
        let attr = |name: &str| {
            attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        };

        let kind = match name.as_str() {
            "script" => AssetKind::Script,
            "link" => {
                let is_stylesheet = attr("rel").is_some_and(|rel| {
                    rel.split_ascii_whitespace()
                        .any(|r| r.eq_ignore_ascii_case("stylesheet"))
                });
                if !is_stylesheet {
                    continue;
                }
                AssetKind::Stylesheet
            }
            _ => continue,
        };

        if let Some(locator) = attr(kind.locator_attr()).filter(|l| !l.is_empty()) {
            found.push((kind, attr("id"), locator));
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <link rel="icon" href="/favicon.ico">
  <link rel="stylesheet" href="/static/app.css">
  <link id="/static/theme.css" rel="Stylesheet preload" href="/static/theme.css?v=1">
  <script src="/static/app.js"></script>
  <script>console.log("inline")</script>
</head>
<body></body>
</html>"#;

    #[test]
    fn test_scan_assets() {
        let doc = HeadDocument::from_html(PAGE);
        let elements = doc.elements();

        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].kind, AssetKind::Stylesheet);
        assert_eq!(elements[0].locator, "/static/app.css");
        assert_eq!(elements[0].id, None);
        assert_eq!(elements[1].id.as_deref(), Some("/static/theme.css"));
        assert_eq!(elements[2].kind, AssetKind::Script);
        assert_eq!(elements[2].locator, "/static/app.js");
    }

    #[test]
    fn test_append_and_remove() {
        let mut doc = HeadDocument::from_html(PAGE);
        doc.append(Asset {
            kind: AssetKind::Script,
            id: "/static/extra.js".to_string(),
            locator: "/static/extra.js?5".to_string(),
        });
        assert_eq!(doc.elements().len(), 4);

        let key = doc.element_by_id("/static/extra.js").unwrap();
        doc.remove(key);
        assert_eq!(doc.elements().len(), 3);
        assert!(doc.element(key).is_none());

        // Removing twice is harmless
        doc.remove(key);
        assert_eq!(doc.elements().len(), 3);
    }

    #[test]
    fn test_set_element_id() {
        let mut doc = HeadDocument::from_html(PAGE);
        let key = doc
            .element_by_locator(AssetKind::Script, "/static/app.js")
            .unwrap();
        doc.set_element_id(key, "/static/app.js");
        assert_eq!(doc.element_by_id("/static/app.js"), Some(key));
    }

    #[test]
    fn test_reload_restores_markup() {
        let mut doc = HeadDocument::from_html(PAGE);
        let key = doc
            .element_by_locator(AssetKind::Stylesheet, "/static/app.css")
            .unwrap();
        doc.remove(key);
        assert_eq!(doc.elements().len(), 2);

        doc.reload();
        assert_eq!(doc.reloads(), 1);
        assert_eq!(doc.elements().len(), 3);
        // Fresh keys after reload
        assert!(doc.element(key).is_none());
    }

    #[test]
    fn test_reload_rereads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, r#"<script src="/a.js"></script>"#).unwrap();

        let mut doc = HeadDocument::open(&path).unwrap();
        assert_eq!(doc.elements().len(), 1);

        fs::write(
            &path,
            r#"<script src="/a.js"></script><link rel="stylesheet" href="/b.css">"#,
        )
        .unwrap();
        doc.reload();
        assert_eq!(doc.elements().len(), 2);
    }

    #[test]
    fn test_reload_keeps_state_when_file_vanishes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, r#"<script src="/a.js"></script>"#).unwrap();

        let mut doc = HeadDocument::open(&path).unwrap();
        fs::remove_file(&path).unwrap();
        doc.reload();
        assert_eq!(doc.reloads(), 1);
        assert_eq!(doc.elements().len(), 1);
    }

    #[test]
    fn test_elements_for_and_render() {
        let mut doc = HeadDocument::from_html(r#"<script src="/a.js"></script>"#);
        doc.append(Asset {
            kind: AssetKind::Stylesheet,
            id: "/b.css".to_string(),
            locator: "/b.css?9".to_string(),
        });

        assert_eq!(doc.elements_for("/a.js").count(), 1);
        assert_eq!(doc.elements_for("/b.css").count(), 1);
        assert_eq!(doc.elements_for("/c.css").count(), 0);
        assert_eq!(
            doc.render(),
            "<script src=\"/a.js\"></script>\n<link id=\"/b.css\" rel=\"stylesheet\" href=\"/b.css?9\">"
        );
    }
}
