//! Change application.
//!
//! Turns an ordered change batch into the minimal set of document
//! mutations, or a full reload.
//!
//! Per descriptor, left to right:
//!
//! | action    | effect                                        |
//! |-----------|-----------------------------------------------|
//! | `ignore`  | skip                                          |
//! | `reload`  | full reload, rest of the batch is dropped     |
//! | `inject`  | kind-based patch (below)                      |
//! | other     | same as `inject`                              |
//!
//! | kind      | patch                                         |
//! |-----------|-----------------------------------------------|
//! | `create`  | inject (or refresh identity if already there) |
//! | `delete`  | remove if present                             |
//! | `modify`  | remove, then inject with a fresh locator      |
//!
//! A path that cannot be turned into an asset falls back to a full reload.

use std::fmt;
use std::ops::ControlFlow;

use super::message::{Action, ChangeDescriptor, ChangeKind};
use crate::asset;
use crate::document::Document;

/// Why a batch ended in a full reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadCause {
    /// The server asked for it
    Requested { path: String },
    /// No asset representation exists for this path
    Unpatchable { path: String },
}

impl ReloadCause {
    pub fn path(&self) -> &str {
        match self {
            Self::Requested { path } | Self::Unpatchable { path } => path,
        }
    }
}

impl fmt::Display for ReloadCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested { path } => write!(f, "reload requested by {path}"),
            Self::Unpatchable { path } => write!(f, "cannot patch {path} in place"),
        }
    }
}

/// What a single `apply` did to the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Paths appended as new elements
    pub injected: Vec<String>,
    /// Paths whose existing element only had its identity marker refreshed
    pub refreshed: Vec<String>,
    /// Paths whose element was detached
    pub removed: Vec<String>,
    /// Descriptors skipped by `ignore`
    pub ignored: usize,
    /// Set when the batch ended in a full reload
    pub reload: Option<ReloadCause>,
}

impl ApplyReport {
    /// True when the document was not touched at all.
    pub fn is_noop(&self) -> bool {
        self.injected.is_empty()
            && self.refreshed.is_empty()
            && self.removed.is_empty()
            && self.reload.is_none()
    }

    /// One-line description for the status display.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.injected.is_empty() {
            parts.push(format!("injected {}", self.injected.join(", ")));
        }
        if !self.refreshed.is_empty() {
            parts.push(format!("refreshed {}", self.refreshed.join(", ")));
        }
        if !self.removed.is_empty() {
            parts.push(format!("removed {}", self.removed.join(", ")));
        }
        if let Some(cause) = &self.reload {
            parts.push(format!("reloaded ({cause})"));
        }
        if parts.is_empty() {
            return "no changes".to_string();
        }
        parts.join("; ")
    }
}

/// Applies change batches to a document.
#[derive(Debug, Clone, Copy)]
pub struct ChangeApplier {
    /// Source of cache-busting tokens
    clock: fn() -> u64,
}

impl Default for ChangeApplier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeApplier {
    pub fn new() -> Self {
        Self {
            clock: asset::cache_token,
        }
    }

    /// Use a custom token source (deterministic locators in tests).
    pub fn with_clock(clock: fn() -> u64) -> Self {
        Self { clock }
    }

    /// Apply `changes` in order.
    pub fn apply<D: Document + ?Sized>(
        &self,
        document: &mut D,
        changes: &[ChangeDescriptor],
    ) -> ApplyReport {
        let mut report = ApplyReport::default();

        for change in changes {
            match change.action {
                Action::Ignore => {
                    report.ignored += 1;
                    continue;
                }
                Action::Reload => {
                    crate::debug!("reload"; "server requested reload for {}", change.path);
                    document.reload();
                    report.reload = Some(ReloadCause::Requested {
                        path: change.path.clone(),
                    });
                    return report;
                }
                Action::Inject | Action::Unknown => {}
            }

            crate::debug!("reload"; "live updating {}", change.path);
            let flow = match change.kind {
                ChangeKind::Create => self.inject(document, &change.path, &mut report),
                ChangeKind::Delete => {
                    Self::remove(document, &change.path, &mut report);
                    ControlFlow::Continue(())
                }
                ChangeKind::Modify => {
                    Self::remove(document, &change.path, &mut report);
                    self.inject(document, &change.path, &mut report)
                }
                ChangeKind::Unknown => {
                    crate::debug!("reload"; "no handler for change kind of {}", change.path);
                    ControlFlow::Continue(())
                }
            };

            if flow.is_break() {
                return report;
            }
        }

        report
    }

    /// Add the asset for `path`, or refresh the identity marker of the
    /// element already serving it. Breaks after falling back to a reload.
    fn inject<D: Document + ?Sized>(
        &self,
        document: &mut D,
        path: &str,
        report: &mut ApplyReport,
    ) -> ControlFlow<()> {
        if let Some(element) = asset::find(document, path) {
            document.set_element_id(element, path);
            report.refreshed.push(path.to_string());
            return ControlFlow::Continue(());
        }

        match asset::build(path, (self.clock)()) {
            Some(asset) => {
                document.append(asset);
                report.injected.push(path.to_string());
                ControlFlow::Continue(())
            }
            None => {
                crate::debug!("reload"; "don't know how to handle {}, reloading page", path);
                document.reload();
                report.reload = Some(ReloadCause::Unpatchable {
                    path: path.to_string(),
                });
                ControlFlow::Break(())
            }
        }
    }

    fn remove<D: Document + ?Sized>(document: &mut D, path: &str, report: &mut ApplyReport) {
        if let Some(element) = asset::find(document, path) {
            document.remove(element);
            report.removed.push(path.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetKind;
    use crate::document::HeadDocument;

    const PAGE: &str = r#"<head>
        <link rel="stylesheet" href="app.css">
        <script src="app.js"></script>
    </head>"#;

    fn fixed_clock() -> u64 {
        1000
    }

    fn applier() -> ChangeApplier {
        ChangeApplier::with_clock(fixed_clock)
    }

    #[test]
    fn test_all_ignore_leaves_document_untouched() {
        let mut doc = HeadDocument::from_html(PAGE);
        let before = doc.elements().to_vec();

        let report = applier().apply(
            &mut doc,
            &[
                ChangeDescriptor::ignore("app.css", ChangeKind::Modify),
                ChangeDescriptor::ignore("app.js", ChangeKind::Delete),
                ChangeDescriptor::ignore("new.js", ChangeKind::Create),
            ],
        );

        assert_eq!(doc.elements(), &before[..]);
        assert_eq!(doc.reloads(), 0);
        assert_eq!(report.ignored, 3);
        assert!(report.is_noop());
    }

    #[test]
    fn test_reload_aborts_rest_of_batch() {
        let mut doc = HeadDocument::from_html(PAGE);

        let report = applier().apply(
            &mut doc,
            &[
                ChangeDescriptor::inject("new.js", ChangeKind::Create),
                ChangeDescriptor::reload("index.html"),
                ChangeDescriptor::inject("later.css", ChangeKind::Create),
                ChangeDescriptor::inject("app.js", ChangeKind::Delete),
            ],
        );

        assert_eq!(doc.reloads(), 1);
        assert_eq!(report.injected, vec!["new.js".to_string()]);
        assert!(report.removed.is_empty());
        assert_eq!(
            report.reload,
            Some(ReloadCause::Requested {
                path: "index.html".to_string()
            })
        );
        // Nothing after the reload touched the reloaded document
        assert_eq!(doc.elements_for("later.css").count(), 0);
        assert_eq!(doc.elements_for("app.js").count(), 1);
    }

    #[test]
    fn test_create_twice_is_idempotent() {
        let mut doc = HeadDocument::from_html(PAGE);
        let change = ChangeDescriptor::inject("extra.js", ChangeKind::Create);

        let first = applier().apply(&mut doc, std::slice::from_ref(&change));
        let second = applier().apply(&mut doc, std::slice::from_ref(&change));

        assert_eq!(first.injected, vec!["extra.js".to_string()]);
        assert_eq!(second.refreshed, vec!["extra.js".to_string()]);
        assert!(second.injected.is_empty());
        assert_eq!(doc.elements_for("extra.js").count(), 1);
    }

    #[test]
    fn test_create_on_markup_asset_marks_identity() {
        let mut doc = HeadDocument::from_html(PAGE);

        let report = applier().apply(
            &mut doc,
            &[ChangeDescriptor::inject("app.js", ChangeKind::Create)],
        );

        assert_eq!(report.refreshed, vec!["app.js".to_string()]);
        assert_eq!(doc.elements().len(), 2);
        let element = doc.elements_for("app.js").next().unwrap();
        assert_eq!(element.id.as_deref(), Some("app.js"));
        assert_eq!(element.locator, "app.js");
    }

    #[test]
    fn test_modify_replaces_with_fresh_locator() {
        let mut doc = HeadDocument::from_html(PAGE);
        let old = doc
            .element_by_locator(AssetKind::Stylesheet, "app.css")
            .unwrap();

        let report = applier().apply(
            &mut doc,
            &[ChangeDescriptor::inject("app.css", ChangeKind::Modify)],
        );

        assert!(doc.element(old).is_none());
        let fresh: Vec<_> = doc.elements_for("app.css").collect();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].locator, "app.css?1000");
        assert_eq!(fresh[0].id.as_deref(), Some("app.css"));
        assert_eq!(report.removed, vec!["app.css".to_string()]);
        assert_eq!(report.injected, vec!["app.css".to_string()]);
    }

    #[test]
    fn test_modify_of_injected_asset() {
        let mut doc = HeadDocument::empty();
        let clock_a = ChangeApplier::with_clock(|| 1);
        let clock_b = ChangeApplier::with_clock(|| 2);

        clock_a.apply(
            &mut doc,
            &[ChangeDescriptor::inject("a.js", ChangeKind::Create)],
        );
        clock_b.apply(
            &mut doc,
            &[ChangeDescriptor::inject("a.js", ChangeKind::Modify)],
        );

        let locators: Vec<_> = doc.elements().iter().map(|e| e.locator.as_str()).collect();
        assert_eq!(locators, vec!["a.js?2"]);
    }

    #[test]
    fn test_delete() {
        let mut doc = HeadDocument::from_html(PAGE);

        let report = applier().apply(
            &mut doc,
            &[
                ChangeDescriptor::inject("app.js", ChangeKind::Delete),
                ChangeDescriptor::inject("missing.js", ChangeKind::Delete),
                ChangeDescriptor::inject("missing.txt", ChangeKind::Delete),
            ],
        );

        assert_eq!(report.removed, vec!["app.js".to_string()]);
        assert_eq!(doc.elements().len(), 1);
        // Deleting something unpatchable is a no-op, not a reload
        assert_eq!(doc.reloads(), 0);
    }

    #[test]
    fn test_modify_then_unknown_asset_reloads() {
        let mut doc = HeadDocument::from_html(PAGE);

        let report = applier().apply(
            &mut doc,
            &[
                ChangeDescriptor::inject("app.css", ChangeKind::Modify),
                ChangeDescriptor::inject("x.unknown", ChangeKind::Create),
            ],
        );

        // app.css was re-added with a new locator before the reload
        assert_eq!(report.removed, vec!["app.css".to_string()]);
        assert_eq!(report.injected, vec!["app.css".to_string()]);
        assert_eq!(
            report.reload,
            Some(ReloadCause::Unpatchable {
                path: "x.unknown".to_string()
            })
        );
        assert_eq!(doc.reloads(), 1);
        assert_eq!(doc.elements_for("x.unknown").count(), 0);
    }

    #[test]
    fn test_unpatchable_aborts_rest_of_batch() {
        let mut doc = HeadDocument::empty();

        let report = applier().apply(
            &mut doc,
            &[
                ChangeDescriptor::inject("page.html", ChangeKind::Modify),
                ChangeDescriptor::inject("after.js", ChangeKind::Create),
            ],
        );

        assert!(report.reload.is_some());
        assert!(report.injected.is_empty());
        assert_eq!(doc.elements().len(), 0);
    }

    #[test]
    fn test_unknown_action_falls_through_to_kind() {
        let mut doc = HeadDocument::empty();
        let change = ChangeDescriptor::new("a.css", Action::Unknown, ChangeKind::Create);

        let report = applier().apply(&mut doc, &[change]);

        assert_eq!(report.injected, vec!["a.css".to_string()]);
        assert_eq!(doc.elements().len(), 1);
    }

    #[test]
    fn test_unknown_kind_is_noop() {
        let mut doc = HeadDocument::from_html(PAGE);

        let report = applier().apply(
            &mut doc,
            &[ChangeDescriptor::inject("app.css", ChangeKind::Unknown)],
        );

        assert!(report.is_noop());
        assert_eq!(doc.elements().len(), 2);
    }

    #[test]
    fn test_summary() {
        let mut report = ApplyReport::default();
        assert_eq!(report.summary(), "no changes");

        report.removed.push("a.css".to_string());
        report.injected.push("a.css".to_string());
        assert_eq!(report.summary(), "injected a.css; removed a.css");

        report.reload = Some(ReloadCause::Unpatchable {
            path: "b.txt".to_string(),
        });
        assert!(report.summary().ends_with("reloaded (cannot patch b.txt in place)"));
    }
}
