use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use std::path::{Path, PathBuf};

use crate::types::{FeatureKind, ResolvedFeature};

/// Resolves a feature name (`csv`, `bigdecimal/util`) to the file a load
/// would pick. Failure to resolve is `None`, never an error.
pub trait FeatureResolver: Send + Sync {
    fn resolve_feature_path(&self, feature: &str) -> Option<ResolvedFeature>;
}

impl<F> FeatureResolver for F
where
    F: Fn(&str) -> Option<ResolvedFeature> + Send + Sync,
{
    fn resolve_feature_path(&self, feature: &str) -> Option<ResolvedFeature> {
        self(feature)
    }
}

/// Searches an ordered load path on disk, memoizing every answer.
#[derive(Debug)]
pub struct LoadPathResolver {
    load_paths: Vec<PathBuf>,
    native_suffixes: Vec<String>,
    cache: DashMap<String, Option<ResolvedFeature>>,
}

impl LoadPathResolver {
    pub fn new(load_paths: Vec<PathBuf>, native_suffixes: Vec<String>) -> Self {
        debug!("Load path resolver over {} directories", load_paths.len());
        Self { load_paths, native_suffixes, cache: DashMap::new() }
    }

    fn resolve_uncached(&self, feature: &str) -> Option<ResolvedFeature> {
        if feature.starts_with('/') {
            trace!("Resolving '{}' as an absolute path", feature);
            return self.resolve_file(Path::new(&clean(feature)));
        }

        for dir in &self.load_paths {
            let base = clean(dir.join(feature).to_string_lossy().to_string());
            if let Some(resolved) = self.resolve_file(Path::new(&base)) {
                trace!("Resolved '{}' in {}", feature, dir.display());
                return Some(resolved);
            }
        }
        None
    }

    fn resolve_file(&self, p: &Path) -> Option<ResolvedFeature> {
        // Explicit suffix given
        if p.is_file() {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or_default();
            if ext == "rb" {
                return Some(ResolvedFeature { kind: FeatureKind::Source, path: p.to_path_buf() });
            }
            if self.native_suffixes.iter().any(|s| s == ext) {
                return Some(ResolvedFeature { kind: FeatureKind::Native, path: p.to_path_buf() });
            }
        }

        let source = PathBuf::from(format!("{}.rb", p.display()));
        if source.is_file() {
            return Some(ResolvedFeature { kind: FeatureKind::Source, path: source });
        }

        for ext in &self.native_suffixes {
            let candidate = PathBuf::from(format!("{}.{}", p.display(), ext));
            if candidate.is_file() {
                return Some(ResolvedFeature { kind: FeatureKind::Native, path: candidate });
            }
        }

        None
    }
}

impl FeatureResolver for LoadPathResolver {
    fn resolve_feature_path(&self, feature: &str) -> Option<ResolvedFeature> {
        if let Some(v) = self.cache.get(feature) {
            trace!("Cache hit for feature '{}'", feature);
            return v.clone();
        }
        let resolved = self.resolve_uncached(feature);
        if resolved.is_none() {
            trace!("Failed to resolve feature '{}'", feature);
        }
        self.cache.insert(feature.to_string(), resolved.clone());
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn resolver(dirs: &[&Path]) -> LoadPathResolver {
        LoadPathResolver::new(
            dirs.iter().map(|d| d.to_path_buf()).collect(),
            vec!["so".to_string()],
        )
    }

    #[test]
    fn test_resolves_source_file() {
        let temp_dir = TempDir::new().unwrap();
        let lib = temp_dir.path().join("lib");
        let expected = create_test_file(&lib, "csv.rb", "# csv");

        let r = resolver(&[&lib]).resolve_feature_path("csv").unwrap();
        assert_eq!(r.kind, FeatureKind::Source);
        assert_eq!(r.path, expected);
    }

    #[test]
    fn test_resolves_nested_feature_and_native() {
        let temp_dir = TempDir::new().unwrap();
        let arch = temp_dir.path().join("arch");
        let expected = create_test_file(&arch, "bigdecimal/util.so", "");

        let r = resolver(&[&arch]).resolve_feature_path("bigdecimal/util").unwrap();
        assert_eq!(r.kind, FeatureKind::Native);
        assert_eq!(r.path, expected);
    }

    #[test]
    fn test_explicit_suffix() {
        let temp_dir = TempDir::new().unwrap();
        let lib = temp_dir.path().join("lib");
        create_test_file(&lib, "abbrev.rb", "");

        let r = resolver(&[&lib]).resolve_feature_path("abbrev.rb").unwrap();
        assert_eq!(r.kind, FeatureKind::Source);
    }

    #[test]
    fn test_load_path_order() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("gems/csv-3.2.8/lib");
        let second = temp_dir.path().join("lib");
        let expected = create_test_file(&first, "csv.rb", "");
        create_test_file(&second, "csv.rb", "");

        let r = resolver(&[&first, &second]).resolve_feature_path("csv").unwrap();
        assert_eq!(r.path, expected);
    }

    #[test]
    fn test_unresolvable_is_cached_none() {
        let temp_dir = TempDir::new().unwrap();
        let r = resolver(&[temp_dir.path()]);
        assert!(r.resolve_feature_path("missing").is_none());
        assert!(r.cache.contains_key("missing"));
        assert!(r.resolve_feature_path("missing").is_none());
    }

    #[test]
    fn test_closure_resolver() {
        let r = |feature: &str| {
            (feature == "csv").then(|| ResolvedFeature {
                kind: FeatureKind::Source,
                path: PathBuf::from("/lib/csv.rb"),
            })
        };
        assert!(r.resolve_feature_path("csv").is_some());
        assert!(r.resolve_feature_path("json").is_none());
    }
}
