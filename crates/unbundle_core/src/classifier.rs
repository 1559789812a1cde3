use log::trace;

use crate::tables::{ClassificationTables, LibraryRecord};

/// How a path was attributed to a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
}

#[derive(Debug, Clone, Copy)]
pub struct Classification<'a> {
    pub record: &'a LibraryRecord,
    pub kind: MatchKind,
}

impl<'a> Classification<'a> {
    /// Name of the gem that owns the classified file.
    pub fn gem_name(&self) -> &'a str {
        self.record.gem_name()
    }
}

/// Maps a resolved load path to the unbundled library it belongs to.
///
/// Returns `None` for paths outside the two library directories and for
/// names the tables do not track. An exact match always wins over a prefix
/// match on the first path segment.
pub fn classify<'a>(
    tables: &'a ClassificationTables,
    path: Option<&str>,
) -> Option<Classification<'a>> {
    let path = path?;

    let candidate = if let Some(rest) = path.strip_prefix(tables.architecture_library_dir.as_str())
    {
        tables.strip_native_suffix(rest)
    } else if let Some(rest) = path.strip_prefix(tables.standard_library_dir.as_str()) {
        rest.strip_suffix(".rb").unwrap_or(rest)
    } else {
        trace!("Path outside library directories: {}", path);
        return None;
    };

    if let Some(record) = tables.exact(candidate) {
        trace!("Exact match '{}' for {}", record.name, path);
        return Some(Classification { record, kind: MatchKind::Exact });
    }

    let (head, _) = candidate.split_once('/')?;
    let record = tables.prefixed(head)?;
    trace!("Prefix match '{}' for {}", record.name, path);
    Some(Classification { record, kind: MatchKind::Prefix })
}
