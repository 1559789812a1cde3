#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub feature: String,
    /// 1-based line of the `require` call
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    /// The request resolves to an unbundled library still on disk.
    Unbundled,
    /// The request cannot be resolved and names an unbundled library.
    Missing,
}

#[derive(Debug, Clone)]
pub struct Finding {
    pub file: String,
    pub line: usize,
    pub request: String,
    pub kind: FindingKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct AuditResult {
    pub findings: Vec<Finding>,
    pub files_analyzed: usize,
}
