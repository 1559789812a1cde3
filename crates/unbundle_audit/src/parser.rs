use anyhow::{Context, Result};
use log::{debug, trace};
use regex::Regex;
use std::{fs, path::Path, sync::LazyLock};

use crate::types::Request;

static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"^\s*(?:Kernel\.)?require\s*\(?\s*(?:"([^"#]+)"|'([^']+)')"##)
        .expect("valid require regex")
});

/// Extracts literal `require "feature"` calls from a source file.
pub fn requires_for(file: &Path) -> Result<Vec<Request>> {
    trace!("Parsing file for requires: {}", file.display());
    let src =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let requests = requires_in(&src);
    debug!("Found {} requires in {}", requests.len(), file.display());
    Ok(requests)
}

pub fn requires_in(src: &str) -> Vec<Request> {
    let mut requests = Vec::new();
    let mut in_block_comment = false;

    for (idx, line) in src.lines().enumerate() {
        if line.starts_with("=begin") {
            in_block_comment = true;
            continue;
        }
        if in_block_comment {
            in_block_comment = !line.starts_with("=end");
            continue;
        }
        if line.starts_with("__END__") {
            break;
        }

        if let Some(caps) = REQUIRE.captures(line)
            && let Some(m) = caps.get(1).or_else(|| caps.get(2))
        {
            requests.push(Request { feature: m.as_str().to_string(), line: idx + 1 });
        }
    }
    requests
}
