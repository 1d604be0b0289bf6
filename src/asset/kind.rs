//! Asset kind definitions.

/// Kind of live-patchable asset, implied by the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// `.js` file, inserted as `<script src>`.
    Script,
    /// `.css` file, inserted as `<link rel="stylesheet" href>`.
    Stylesheet,
}

impl AssetKind {
    /// Map a path extension (including the leading dot) to a kind.
    ///
    /// Matching is exact: `.JS` or `.mjs` are not patchable.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".js" => Some(Self::Script),
            ".css" => Some(Self::Stylesheet),
            _ => None,
        }
    }

    /// Element tag name used in the document.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Stylesheet => "link",
        }
    }

    /// Attribute holding the content locator.
    pub const fn locator_attr(self) -> &'static str {
        match self {
            Self::Script => "src",
            Self::Stylesheet => "href",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(AssetKind::from_extension(".js"), Some(AssetKind::Script));
        assert_eq!(
            AssetKind::from_extension(".css"),
            Some(AssetKind::Stylesheet)
        );
        assert_eq!(AssetKind::from_extension(".JS"), None);
        assert_eq!(AssetKind::from_extension(".html"), None);
        assert_eq!(AssetKind::from_extension(""), None);
    }

    #[test]
    fn test_tag_and_locator() {
        assert_eq!(AssetKind::Script.tag(), "script");
        assert_eq!(AssetKind::Script.locator_attr(), "src");
        assert_eq!(AssetKind::Stylesheet.tag(), "link");
        assert_eq!(AssetKind::Stylesheet.locator_attr(), "href");
    }
}
