use std::path::PathBuf;

/// A dependency already satisfied by the package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledSpec {
    pub name: String,
}

impl InstalledSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Source,
    Native,
}

/// Outcome of resolving a feature name against the load path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFeature {
    pub kind: FeatureKind,
    pub path: PathBuf,
}
