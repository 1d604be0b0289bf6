//! Path -> asset resolution.
//!
//! Pure functions over a change path, except [`find`] which reads the
//! document it is given.

use std::time::{SystemTime, UNIX_EPOCH};

use super::{Asset, AssetKind};
use crate::document::{Document, ElementRef};

/// Final extension of `path` including the dot, or `""`.
///
/// Only the last `.` counts, so `vendor.min.js` is `.js` and `dir.v2/file`
/// is `.v2/file` (unpatchable).
pub fn extension(path: &str) -> &str {
    path.rfind('.').map(|i| &path[i..]).unwrap_or("")
}

/// Derive the asset kind from the path's final extension.
pub fn classify(path: &str) -> Option<AssetKind> {
    AssetKind::from_extension(extension(path))
}

/// Build a fresh asset for `path`, tagged with `path` as identity marker.
///
/// The locator is suffixed with `?token` so the document refetches instead
/// of reusing a cached copy.
pub fn build(path: &str, token: u64) -> Option<Asset> {
    let kind = classify(path)?;
    Some(Asset {
        kind,
        id: path.to_string(),
        locator: format!("{path}?{token}"),
    })
}

/// Locate the live element for `path`.
///
/// Identity marker first, then the kind's locator attribute. The second
/// lookup catches elements written by the page markup itself.
pub fn find<D: Document + ?Sized>(document: &D, path: &str) -> Option<ElementRef> {
    if let Some(element) = document.element_by_id(path) {
        return Some(element);
    }
    let kind = classify(path)?;
    document.element_by_locator(kind, path)
}

/// Cache-busting token: current time in milliseconds.
pub fn cache_token() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
