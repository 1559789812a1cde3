//! Static data describing which libraries left the default distribution.
//!
//! ## Match strategies
//!
//! - **Exact**: the whole path below a library directory (suffix stripped)
//!   must equal the name, e.g. `abbrev.rb` → `abbrev`.
//! - **PrefixOfPath**: the first segment of that path is enough, e.g.
//!   `csv/parser.rb` → `csv`. Every prefix entry is also an exact entry.
//! - **Unmatched**: known for messages only, never derived from a path.

use anyhow::{Result, bail};
use log::{debug, trace};
use semver::Version;
use std::collections::BTreeMap;

use crate::config::PlatformConfig;

/// Runtime version at which each library stopped being a default gem.
pub const UNBUNDLED_SINCE: &[(&str, &str)] = &[
    ("rexml", "3.0.0"),
    ("rss", "3.0.0"),
    ("webrick", "3.0.0"),
    ("matrix", "3.1.0"),
    ("net-ftp", "3.1.0"),
    ("net-imap", "3.1.0"),
    ("net-pop", "3.1.0"),
    ("net-smtp", "3.1.0"),
    ("prime", "3.1.0"),
    ("abbrev", "3.4.0"),
    ("base64", "3.4.0"),
    ("bigdecimal", "3.4.0"),
    ("csv", "3.4.0"),
    ("drb", "3.4.0"),
    ("getoptlong", "3.4.0"),
    ("mutex_m", "3.4.0"),
    ("nkf", "3.4.0"),
    ("observer", "3.4.0"),
    ("racc", "3.4.0"),
    ("resolv-replace", "3.4.0"),
    ("rinda", "3.4.0"),
    ("syslog", "3.4.0"),
];

/// Names matched against the whole path below a library directory.
pub const EXACT_NAMES: &[&str] = &[
    "abbrev",
    "base64",
    "bigdecimal",
    "csv",
    "drb",
    "getoptlong",
    "mutex_m",
    "nkf",
    "observer",
    "resolv-replace",
    "rinda",
    "syslog",
];

/// Files that live in another gem: `(file name, owning gem)`.
pub const ALIASES: &[(&str, &str)] = &[("kconv", "nkf")];

/// Names whose whole directory belongs to the library.
pub const PREFIXED_NAMES: &[&str] = &["bigdecimal", "csv", "drb", "rinda", "syslog"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Unmatched,
    Exact,
    PrefixOfPath,
}

impl MatchStrategy {
    pub fn matches_exact(self) -> bool {
        matches!(self, MatchStrategy::Exact | MatchStrategy::PrefixOfPath)
    }

    pub fn matches_prefix(self) -> bool {
        self == MatchStrategy::PrefixOfPath
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStrategy::Unmatched => "none",
            MatchStrategy::Exact => "exact",
            MatchStrategy::PrefixOfPath => "prefix",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRecord {
    pub name: String,
    pub unbundled_since: Version,
    pub match_strategy: MatchStrategy,
    /// Gem that actually ships this file, when it is not `name` itself.
    pub alias: Option<String>,
}

impl LibraryRecord {
    /// The gem a user has to add for this record.
    pub fn gem_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Immutable lookup tables plus the platform layout they are matched against.
#[derive(Debug, Clone)]
pub struct ClassificationTables {
    records: BTreeMap<String, LibraryRecord>,
    pub standard_library_dir: String,
    pub architecture_library_dir: String,
    /// Compiled-extension suffixes, e.g. `["bundle", "so"]`.
    pub native_extension_suffixes: Vec<String>,
}

impl ClassificationTables {
    /// Builds the built-in tables for the given platform layout.
    pub fn new(platform: PlatformConfig) -> Result<Self> {
        let platform = platform.validate()?;
        let mut records = BTreeMap::new();

        for (name, since) in UNBUNDLED_SINCE {
            let strategy = if PREFIXED_NAMES.contains(name) {
                MatchStrategy::PrefixOfPath
            } else if EXACT_NAMES.contains(name) {
                MatchStrategy::Exact
            } else {
                MatchStrategy::Unmatched
            };
            records.insert(
                name.to_string(),
                LibraryRecord {
                    name: name.to_string(),
                    unbundled_since: Version::parse(since)?,
                    match_strategy: strategy,
                    alias: None,
                },
            );
        }

        for (name, target) in ALIASES {
            let Some(owner) = records.get(*target) else {
                bail!("Alias '{}' points at unknown library '{}'", name, target);
            };
            let record = LibraryRecord {
                name: name.to_string(),
                unbundled_since: owner.unbundled_since.clone(),
                match_strategy: MatchStrategy::Exact,
                alias: Some(target.to_string()),
            };
            trace!("Registered alias '{}' -> '{}'", name, target);
            records.insert(name.to_string(), record);
        }

        debug!(
            "Built classification tables with {} records (stdlib: {}, arch: {})",
            records.len(),
            platform.standard_library_dir,
            platform.architecture_library_dir
        );

        Ok(Self {
            records,
            standard_library_dir: platform.standard_library_dir,
            architecture_library_dir: platform.architecture_library_dir,
            native_extension_suffixes: platform.native_extension_suffixes,
        })
    }

    pub fn get(&self, name: &str) -> Option<&LibraryRecord> {
        self.records.get(name)
    }

    pub fn exact(&self, name: &str) -> Option<&LibraryRecord> {
        self.records.get(name).filter(|r| r.match_strategy.matches_exact())
    }

    pub fn prefixed(&self, name: &str) -> Option<&LibraryRecord> {
        self.records.get(name).filter(|r| r.match_strategy.matches_prefix())
    }

    pub fn records(&self) -> impl Iterator<Item = &LibraryRecord> {
        self.records.values()
    }

    /// Strips a trailing native-extension suffix (`.so`, `.bundle`, ...).
    pub fn strip_native_suffix<'a>(&self, name: &'a str) -> &'a str {
        for ext in &self.native_extension_suffixes {
            if let Some(stem) = name.strip_suffix(ext.as_str())
                && let Some(stem) = stem.strip_suffix('.')
            {
                return stem;
            }
        }
        name
    }

    /// Strips `.rb` or any native-extension suffix.
    pub fn strip_library_suffix<'a>(&self, name: &'a str) -> &'a str {
        match name.strip_suffix(".rb") {
            Some(stem) => stem,
            None => self.strip_native_suffix(name),
        }
    }
}
