use log::{debug, trace};
use std::sync::Arc;

use crate::{
    classifier::classify,
    config::HostContext,
    frames::{CallerFrame, CallerStack},
    ledger::WarnedLedger,
    message::build_message,
    resolver::FeatureResolver,
    tables::ClassificationTables,
    types::InstalledSpec,
};

/// Frames between the engine's entry point and the code that issued the load.
pub const CALLER_SKIP: usize = 3;
/// How many frames past `CALLER_SKIP` may supply the requester's location.
pub const CALLER_WINDOW: usize = 3;
/// The frame checked for an installed package to blame.
pub const ATTRIBUTION_SKIP: usize = CALLER_SKIP + 1;

/// Decides whether a load should be flagged and renders the warning.
///
/// Each display name (and each owning gem) warns at most once over the
/// lifetime of the ledger, also under concurrent loads. The engine never
/// prints; callers surface the returned message.
pub struct WarningEngine {
    tables: Arc<ClassificationTables>,
    ledger: Arc<WarnedLedger>,
    resolver: Box<dyn FeatureResolver>,
    host: HostContext,
}

impl WarningEngine {
    pub fn new(
        tables: Arc<ClassificationTables>,
        resolver: impl FeatureResolver + 'static,
        host: HostContext,
    ) -> Self {
        Self { tables, ledger: Arc::new(WarnedLedger::new()), resolver: Box::new(resolver), host }
    }

    /// Shares an existing ledger instead of starting from an empty one.
    pub fn with_ledger(mut self, ledger: Arc<WarnedLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn tables(&self) -> &ClassificationTables {
        &self.tables
    }

    pub fn ledger(&self) -> &WarnedLedger {
        &self.ledger
    }

    pub fn host(&self) -> &HostContext {
        &self.host
    }

    pub fn resolver(&self) -> &dyn FeatureResolver {
        self.resolver.as_ref()
    }

    /// Evaluates one load request.
    ///
    /// `requested` is a feature name or a file path; `specs` are the
    /// dependencies the package manager already satisfies.
    pub fn evaluate_load(
        &self,
        requested: &str,
        specs: &[InstalledSpec],
        stack: &dyn CallerStack,
    ) -> Option<String> {
        let name = normalize_feature(requested);
        let display = self.tables.strip_library_suffix(&name);

        if specs.iter().any(|s| s.name == display) {
            trace!("'{}' is satisfied by an installed spec", display);
            return None;
        }

        let Some(resolved) = self.resolver.resolve_feature_path(&name) else {
            trace!("Could not resolve '{}'", name);
            return None;
        };
        let path = normalize_feature(&resolved.path.to_string_lossy());
        let classification = classify(&self.tables, Some(&path))?;

        let window = stack.frames(CALLER_SKIP, CALLER_WINDOW);
        let caller = window.iter().find_map(|f| f.absolute_path.as_deref());
        if let Some(caller) = caller
            && classify(&self.tables, Some(&normalize_feature(&caller.to_string_lossy()))).is_some()
        {
            trace!("'{}' requested from unbundled library file {}", name, caller.display());
            return None;
        }

        if !self.ledger.try_mark(display) {
            trace!("Already warned about '{}'", display);
            return None;
        }

        let attribution = stack.frames(ATTRIBUTION_SKIP, 1).into_iter().next();
        let msg = self.render(display, classification.gem_name(), attribution.as_ref())?;
        debug!("Warning for '{}' ({})", display, classification.record.name);
        Some(msg)
    }

    /// Notice for a load that failed outright because the library is no
    /// longer bundled. Only used when no manifest manager is active, since
    /// the manager reports such failures itself.
    pub fn missing_feature_notice(&self, feature: &str) -> Option<String> {
        if self.host.manifest_manager_active {
            return None;
        }
        let record = self.tables.get(feature)?;
        if !self.ledger.try_mark(feature) {
            return None;
        }
        let msg = self.render(feature, record.gem_name(), None)?;
        debug!("Missing feature notice for '{}'", feature);
        Some(msg)
    }

    /// `display` is already marked. When the file belongs to another gem,
    /// that gem is marked too and named in the message.
    fn render(&self, display: &str, gem: &str, attribution: Option<&CallerFrame>) -> Option<String> {
        let head = if gem == display {
            display.to_string()
        } else {
            if !self.ledger.try_mark(gem) {
                trace!("Already warned about owning gem '{}'", gem);
                return None;
            }
            format!("{} is found in {}", display, gem)
        };
        let tail = build_message(&self.tables, &self.host, gem, attribution)?;
        Some(head + &tail)
    }
}

/// Accepts feature names and file paths alike; both use `/` afterwards, as
/// do the configured library directories.
pub fn normalize_feature(requested: &str) -> String {
    requested.replace('\\', "/")
}
