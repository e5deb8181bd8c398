//! Dotted module names and the source file kinds they are derived from.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::module::ModuleKind;

/// Source file kinds recognised on the module path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Ordinary class source (`.gs`).
    Class,
    /// Enhancement source adding members to an existing type (`.gsx`).
    Enhancement,
    /// Template source (`.gst`).
    Template,
}

impl SourceKind {
    /// Every recognised kind in lookup order.
    pub const ALL: [Self; 3] = [Self::Class, Self::Enhancement, Self::Template];

    /// Maps a file extension to a source kind. Matching is exact.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "gs" => Some(Self::Class),
            "gsx" => Some(Self::Enhancement),
            "gst" => Some(Self::Template),
            _ => None,
        }
    }

    /// Maps a path to a source kind using its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension)
    }

    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Class => "gs",
            Self::Enhancement => "gsx",
            Self::Template => "gst",
        }
    }

    /// Verification category of modules produced from this kind.
    #[must_use]
    pub const fn module_kind(self) -> ModuleKind {
        match self {
            Self::Class | Self::Enhancement => ModuleKind::OrdinaryType,
            Self::Template => ModuleKind::TemplateType,
        }
    }
}

/// Fully qualified, dot-separated module name such as `com.acme.Foo`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleName(String);

impl ModuleName {
    /// Parses a dotted name, rejecting empty segments and whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw
                .split('.')
                .all(|segment| !segment.is_empty() && !segment.contains(char::is_whitespace));
        valid.then(|| Self(raw.to_owned()))
    }

    /// Derives a name from a path relative to a source tree root.
    ///
    /// The last extension is stripped and the remaining components are joined
    /// with `.`, so `com/acme/Foo.gs` becomes `com.acme.Foo`.
    #[must_use]
    pub fn from_relative_path(relative: &Path) -> Option<Self> {
        let stem = relative.with_extension("");
        let mut segments = Vec::new();
        for component in stem.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if segments.is_empty() {
            return None;
        }
        Self::parse(&segments.join("."))
    }

    /// The full dotted name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Package portion, empty for names without a dot.
    #[must_use]
    pub fn package(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(package, _)| package)
    }

    /// Final segment of the name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(_, simple)| simple)
    }

    /// Relative file path of this name with the given extension.
    #[must_use]
    pub fn relative_path(&self, extension: &str) -> PathBuf {
        let mut path: PathBuf = self.0.split('.').collect();
        path.set_extension(extension);
        path
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("com/acme/Foo.gs", "com.acme.Foo")]
    #[case("Foo.gst", "Foo")]
    #[case("a/b/Ext.gsx", "a.b.Ext")]
    #[case("a/b/Weird.tar.gs", "a.b.Weird.tar")]
    fn derives_names_from_relative_paths(#[case] path: &str, #[case] expected: &str) {
        let name = ModuleName::from_relative_path(Path::new(path)).expect("derive name");
        assert_eq!(name.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("../escape.gs")]
    #[case("/absolute/Foo.gs")]
    fn rejects_paths_outside_the_tree(#[case] path: &str) {
        assert!(ModuleName::from_relative_path(Path::new(path)).is_none());
    }

    #[test]
    fn splits_package_and_simple_name() {
        let name = ModuleName::parse("com.acme.Foo").expect("parse name");
        assert_eq!(name.package(), "com.acme");
        assert_eq!(name.simple_name(), "Foo");

        let bare = ModuleName::parse("Foo").expect("parse name");
        assert_eq!(bare.package(), "");
        assert_eq!(bare.simple_name(), "Foo");
    }

    #[test]
    fn relative_path_inverts_the_mapping() {
        let name = ModuleName::parse("com.acme.Foo").expect("parse name");
        assert_eq!(
            name.relative_path("gs"),
            PathBuf::from("com").join("acme").join("Foo.gs")
        );
    }

    #[rstest]
    #[case("gs", Some(SourceKind::Class))]
    #[case("gsx", Some(SourceKind::Enhancement))]
    #[case("gst", Some(SourceKind::Template))]
    #[case("GS", None)]
    #[case("java", None)]
    fn maps_extensions(#[case] extension: &str, #[case] expected: Option<SourceKind>) {
        assert_eq!(SourceKind::from_extension(extension), expected);
    }

    #[test]
    fn templates_are_their_own_category() {
        assert_eq!(SourceKind::Template.module_kind(), ModuleKind::TemplateType);
        assert_eq!(SourceKind::Enhancement.module_kind(), ModuleKind::OrdinaryType);
    }
}
