use dashmap::DashSet;
use log::trace;

/// Names that have already been warned about.
///
/// Display names and gem names share one namespace: warning about `kconv`
/// through `nkf` also silences a later direct `nkf` request. Insert-only.
#[derive(Debug, Default)]
pub struct WarnedLedger {
    names: DashSet<String>,
}

impl WarnedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` and reports whether this call was the first to do so.
    pub fn try_mark(&self, name: &str) -> bool {
        let first = self.names.insert(name.to_string());
        trace!("Ledger mark '{}': first={}", name, first);
        first
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
