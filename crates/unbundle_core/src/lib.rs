//! Core of the unbundled-library warning engine.
//!
//! Given a requested load, this crate decides whether it pulls in a library
//! that was removed from the runtime's default distribution, and renders a
//! warning telling the user to declare the dependency:
//! - Classification tables for the unbundled libraries and their versions
//! - Classifying resolved load paths into library names (exact or prefix)
//! - A warned-names ledger guaranteeing one warning per name
//! - Caller attribution, including blaming an installed package

mod classifier;
mod config;
mod engine;
mod frames;
mod ledger;
mod message;
mod resolver;
mod tables;
mod types;

// Re-export public API
pub use classifier::{Classification, MatchKind, classify};
pub use config::{DEFAULT_NATIVE_SUFFIX, HostContext, PlatformConfig, parse_runtime_version};
pub use engine::{ATTRIBUTION_SKIP, CALLER_SKIP, CALLER_WINDOW, WarningEngine, normalize_feature};
pub use frames::{CallerFrame, CallerStack, RecordedStack};
pub use ledger::WarnedLedger;
pub use message::{attribute_package, build_message, package_name};
pub use resolver::{FeatureResolver, LoadPathResolver};
pub use tables::{ClassificationTables, LibraryRecord, MatchStrategy};
pub use types::{FeatureKind, InstalledSpec, ResolvedFeature};
