//! Live document abstraction.
//!
//! The client never tracks page elements on its own. It locates and mutates
//! them through [`Document`], which a browser binding or the in-memory
//! [`HeadDocument`] implements.

mod head;

pub use head::{HeadDocument, HeadElement};

use crate::asset::{Asset, AssetKind};

/// Opaque handle to an element currently attached to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(u64);

impl ElementRef {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Mutable view of the running document's asset set.
///
/// Handles are only valid until the next mutation that removes them or the
/// next [`Document::reload`].
pub trait Document {
    /// Element whose identity marker equals `id`.
    fn element_by_id(&self, id: &str) -> Option<ElementRef>;

    /// Element of `kind` whose locator attribute equals `locator` exactly.
    fn element_by_locator(&self, kind: AssetKind, locator: &str) -> Option<ElementRef>;

    /// Set (or overwrite) the identity marker of `element`.
    fn set_element_id(&mut self, element: ElementRef, id: &str);

    /// Append a new element to the document head.
    fn append(&mut self, asset: Asset);

    /// Detach `element`. Unknown handles are ignored.
    fn remove(&mut self, element: ElementRef);

    /// Full reload: every in-place mutation is discarded.
    fn reload(&mut self);
}
