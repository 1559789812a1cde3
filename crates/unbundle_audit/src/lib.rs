//! Audits a project for requires of libraries that left the default
//! distribution.
//!
//! Every literal `require` in the project's source files is fed through the
//! [`unbundle_core::WarningEngine`] with the requiring file as the caller, so
//! the report matches what the runtime would warn about at load time.
//!
//! # Examples
//!
//! ```no_run
//! use unbundle_audit::{Config, PlatformArgs, run_audit};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config {
//!     root: Some(std::path::PathBuf::from("/path/to/project")),
//!     platform: PlatformArgs {
//!         platform: None,
//!         libdir: Some("/usr/lib/ruby/3.3.0".to_string()),
//!         archdir: Some("/usr/lib/ruby/3.3.0/x86_64-linux".to_string()),
//!         dlext: "so".to_string(),
//!         runtime_version: "3.3.0".to_string(),
//!         manifest: false,
//!         gem_paths: vec![],
//!         load_paths: vec![],
//!     },
//!     specs: vec![],
//!     manifest_present: false,
//! };
//!
//! let result = run_audit(cfg)?;
//!
//! if !result.findings.is_empty() {
//!     let mut stdout = BufWriter::new(std::io::stdout());
//!     unbundle_audit::print_findings_tree(&mut stdout, &result.findings)?;
//!     stdout.flush()?;
//! }
//! # Ok(())
//! # }
//! ```

mod checker;
mod collector;
mod config;
mod parser;
mod reporter;
mod types;

// Re-export public API
pub use checker::run_audit;
pub use collector::{SOURCE_EXTENSIONS, collect_sources};
pub use config::{Config, PlatformArgs, find_git_root, has_manifest, read_locked_specs};
pub use parser::{requires_for, requires_in};
pub use reporter::{print_findings_tree, print_no_findings_message};
pub use types::{AuditResult, Finding, FindingKind, Request};
