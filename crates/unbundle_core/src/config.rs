use anyhow::{Context, Result, anyhow, bail};
use log::{debug, trace};
use semver::Version;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Native extension suffix every platform can load, regardless of its own `DLEXT`.
pub const DEFAULT_NATIVE_SUFFIX: &str = "so";

/// Installation layout of the running runtime.
///
/// Read once at startup; everything classified afterwards is relative to
/// these two directories.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Directory holding pure-source standard libraries (`rubylibdir`).
    pub standard_library_dir: String,
    /// Directory holding compiled extensions (`rubyarchdir`).
    pub architecture_library_dir: String,
    /// File suffixes of compiled extensions, without the leading dot.
    #[serde(default)]
    pub native_extension_suffixes: Vec<String>,
}

impl PlatformConfig {
    pub fn new(
        standard_library_dir: impl Into<String>,
        architecture_library_dir: impl Into<String>,
        native_extension_suffix: impl Into<String>,
    ) -> Self {
        Self {
            standard_library_dir: standard_library_dir.into(),
            architecture_library_dir: architecture_library_dir.into(),
            native_extension_suffixes: vec![native_extension_suffix.into()],
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        debug!("Reading platform config from {}", path.display());
        let txt = fs::read_to_string(path)
            .with_context(|| format!("Failed to read platform config {}", path.display()))?;
        let cfg: PlatformConfig = serde_json::from_str(&txt)
            .with_context(|| format!("Malformed platform config {}", path.display()))?;
        cfg.validate()
    }

    /// Checks the layout and returns it in canonical form: directories use
    /// `/` and end in exactly one, suffixes carry no dot, and `so` is always
    /// present.
    pub fn validate(self) -> Result<Self> {
        let standard_library_dir = normalize_dir("standard library", &self.standard_library_dir)?;
        let architecture_library_dir =
            normalize_dir("architecture library", &self.architecture_library_dir)?;

        let mut suffixes: Vec<String> = Vec::new();
        for raw in &self.native_extension_suffixes {
            let s = raw.trim().trim_start_matches('.');
            if s.is_empty() {
                bail!("Native extension suffix must not be empty");
            }
            if !suffixes.iter().any(|x| x == s) {
                suffixes.push(s.to_string());
            }
        }
        if !suffixes.iter().any(|x| x == DEFAULT_NATIVE_SUFFIX) {
            suffixes.push(DEFAULT_NATIVE_SUFFIX.to_string());
        }
        trace!("Native extension suffixes: {:?}", suffixes);

        Ok(Self { standard_library_dir, architecture_library_dir, native_extension_suffixes: suffixes })
    }
}

fn normalize_dir(label: &str, dir: &str) -> Result<String> {
    let slashed = dir.trim().replace('\\', "/");
    let trimmed = slashed.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(anyhow!("No {} directory configured", label));
    }
    if !Path::new(trimmed).is_absolute() {
        return Err(anyhow!("The {} directory must be absolute, got '{}'", label, dir));
    }
    Ok(format!("{}/", trimmed))
}

/// Signals from the embedding runtime that shape the rendered message.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub runtime_version: Version,
    /// Whether a manifest-based dependency manager (Bundler) is loaded.
    pub manifest_manager_active: bool,
    /// Package installation roots (`Gem.path`), searched in order.
    pub package_roots: Vec<PathBuf>,
}

impl HostContext {
    pub fn new(runtime_version: &str) -> Result<Self> {
        Ok(Self {
            runtime_version: parse_runtime_version(runtime_version)?,
            manifest_manager_active: false,
            package_roots: Vec::new(),
        })
    }

    pub fn with_manifest_manager(mut self, active: bool) -> Self {
        self.manifest_manager_active = active;
        self
    }

    pub fn with_package_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.package_roots = roots;
        self
    }
}

/// Parses `3.4`, `3.4.0` or `3.4.0-preview1` into a comparable version.
pub fn parse_runtime_version(raw: &str) -> Result<Version> {
    let raw = raw.trim();
    let (core, pre) = match raw.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (raw, None),
    };
    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        bail!("Invalid runtime version '{}'", raw);
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    let mut padded = parts.join(".");
    if let Some(pre) = pre {
        padded.push('-');
        padded.push_str(pre);
    }
    Version::parse(&padded).with_context(|| format!("Invalid runtime version '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    #[test]
    fn test_validate_normalizes_directories() {
        let cfg = PlatformConfig::new("/opt/ruby/lib/3.3.0//", "/opt/ruby/lib/3.3.0/x86_64-linux", "bundle")
            .validate()
            .unwrap();
        assert_eq!(cfg.standard_library_dir, "/opt/ruby/lib/3.3.0/");
        assert_eq!(cfg.architecture_library_dir, "/opt/ruby/lib/3.3.0/x86_64-linux/");
        assert_eq!(cfg.native_extension_suffixes, vec!["bundle".to_string(), "so".to_string()]);
    }

    #[test]
    fn test_validate_does_not_duplicate_so() {
        let cfg = PlatformConfig::new("/lib", "/arch", ".so").validate().unwrap();
        assert_eq!(cfg.native_extension_suffixes, vec!["so".to_string()]);
    }

    #[test]
    fn test_validate_rejects_missing_directory() {
        let err = PlatformConfig::new("", "/arch", "so").validate().unwrap_err();
        assert!(err.to_string().contains("standard library"));
    }

    #[test]
    fn test_validate_rejects_relative_directory() {
        assert!(PlatformConfig::new("/lib", "arch", "so").validate().is_err());
    }

    #[cfg(windows)]
    #[test]
    fn test_validate_accepts_windows_directories() {
        let cfg = PlatformConfig::new(r"C:\Ruby33\lib\ruby\3.3.0\", r"C:\Ruby33\lib\ruby\3.3.0\x64-mingw-ucrt", "so")
            .validate()
            .unwrap();
        assert_eq!(cfg.standard_library_dir, "C:/Ruby33/lib/ruby/3.3.0/");
        assert_eq!(cfg.architecture_library_dir, "C:/Ruby33/lib/ruby/3.3.0/x64-mingw-ucrt/");
    }

    #[test]
    fn test_validate_rewrites_backslashes() {
        let cfg = PlatformConfig::new("/opt\\ruby\\lib\\", "/opt/ruby/lib/arch", "so").validate().unwrap();
        assert_eq!(cfg.standard_library_dir, "/opt/ruby/lib/");
    }

    #[test]
    fn test_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(
            temp_dir.path(),
            "platform.json",
            r#"{
  "standard_library_dir": "/usr/lib/ruby/3.3.0",
  "architecture_library_dir": "/usr/lib/ruby/3.3.0/arm64-darwin",
  "native_extension_suffixes": ["bundle"]
}"#,
        );

        let cfg = PlatformConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.standard_library_dir, "/usr/lib/ruby/3.3.0/");
        assert!(cfg.native_extension_suffixes.contains(&"bundle".to_string()));
        assert!(cfg.native_extension_suffixes.contains(&"so".to_string()));
    }

    #[test]
    fn test_from_json_file_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(temp_dir.path(), "platform.json", "{ not json");
        assert!(PlatformConfig::from_json_file(&path).is_err());
    }

    #[test]
    fn test_parse_runtime_version_pads_missing_parts() {
        assert_eq!(parse_runtime_version("3.4").unwrap(), Version::new(3, 4, 0));
        assert_eq!(parse_runtime_version("3.3.9").unwrap(), Version::new(3, 3, 9));
    }

    #[test]
    fn test_parse_runtime_version_prerelease_sorts_before_release() {
        let pre = parse_runtime_version("3.4.0-preview1").unwrap();
        assert!(pre < Version::new(3, 4, 0));
    }

    #[test]
    fn test_parse_runtime_version_rejects_garbage() {
        assert!(parse_runtime_version("three").is_err());
        assert!(parse_runtime_version("3..1").is_err());
        assert!(parse_runtime_version("").is_err());
    }
}
