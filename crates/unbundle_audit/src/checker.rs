use anyhow::{Result, anyhow};
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use std::{path::Path, sync::Arc, thread};
use unbundle_core::{CallerFrame, RecordedStack, WarningEngine, classify, normalize_feature};

use crate::{
    collector::collect_sources,
    config::Config,
    parser::requires_for,
    types::{AuditResult, Finding, FindingKind, Request},
};

pub fn run_audit(mut cfg: Config) -> Result<AuditResult> {
    info!("Starting unbundled library audit");

    cfg.initialize()?;
    let root = cfg.root()?.clone();

    let engine = Arc::new(cfg.platform.engine(cfg.manifest_present)?);
    let libdir = Path::new(&engine.tables().standard_library_dir).to_path_buf();

    let files = collect_sources(&root, Some(&libdir))?;
    if files.is_empty() {
        warn!("No source files found under {}", root.display());
        return Err(anyhow!("No source files found under {}", root.display()));
    }
    info!("Parsing {} source files in parallel", files.len());

    // Parsing is parallel; evaluation stays in path order so the first
    // requester of a library always owns its finding.
    let parsed: Vec<Vec<Request>> = files
        .par_iter()
        .map(|file| {
            let thread_id = thread::current().id();
            debug!("Thread {:?} parsing: {}", thread_id, file.display());
            requires_for(file).unwrap_or_else(|e| {
                warn!("Error parsing requires for {}: {}", file.display(), e);
                vec![]
            })
        })
        .collect();

    let mut findings: Vec<Finding> = Vec::new();
    for (file, requests) in files.iter().zip(parsed) {
        let rel_file = file.strip_prefix(&root).unwrap_or(file).to_string_lossy().to_string();
        // The `require` builtin sits between the engine and the file.
        let stack =
            RecordedStack::above_engine(vec![CallerFrame::unknown(), CallerFrame::at(file)]);

        for request in requests {
            trace!("Evaluating '{}' from {}:{}", request.feature, rel_file, request.line);
            if let Some((kind, message)) = evaluate_request(&engine, &cfg, &request.feature, &stack)
            {
                findings.push(Finding {
                    file: rel_file.clone(),
                    line: request.line,
                    request: request.feature,
                    kind,
                    message,
                });
            }
        }
    }

    info!("Audit complete. Found {} findings", findings.len());
    debug!("Ledger holds {} names", engine.ledger().len());

    Ok(AuditResult { findings, files_analyzed: files.len() })
}

fn evaluate_request(
    engine: &WarningEngine,
    cfg: &Config,
    feature: &str,
    stack: &RecordedStack,
) -> Option<(FindingKind, String)> {
    let resolved = engine.resolver().resolve_feature_path(feature);

    // A locked gem's own lib dir would shadow the stdlib copy at runtime.
    if let Some(resolved) = &resolved
        && let Some(c) = classify(engine.tables(), Some(&normalize_feature(&resolved.path.to_string_lossy())))
        && cfg.specs.iter().any(|s| s.name == c.gem_name())
    {
        trace!("'{}' belongs to locked gem '{}'", feature, c.gem_name());
        return None;
    }

    if let Some(msg) = engine.evaluate_load(feature, &cfg.specs, stack) {
        return Some((FindingKind::Unbundled, msg));
    }
    if resolved.is_some() {
        return None;
    }
    engine.missing_feature_notice(feature).map(|msg| (FindingKind::Missing, msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformArgs;
    use std::{fs, path::PathBuf};
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    /// Project under `<tmp>/app`, runtime libraries under `<tmp>/ruby`.
    fn setup() -> (TempDir, Config) {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        create_test_file(base, "ruby/lib/csv.rb", "");
        create_test_file(base, "ruby/lib/csv/parser.rb", "");
        create_test_file(base, "ruby/lib/json.rb", "");
        create_test_file(base, "ruby/lib/base64.rb", "");
        create_test_file(base, "ruby/lib/arch/bigdecimal.so", "");

        let cfg = Config {
            root: Some(base.join("app")),
            platform: PlatformArgs {
                platform: None,
                libdir: Some(base.join("ruby/lib").to_string_lossy().to_string()),
                archdir: Some(base.join("ruby/lib/arch").to_string_lossy().to_string()),
                dlext: "so".to_string(),
                runtime_version: "3.3.0".to_string(),
                manifest: false,
                gem_paths: vec![],
                load_paths: vec![],
            },
            specs: vec![],
            manifest_present: false,
        };
        (temp_dir, cfg)
    }

    #[test]
    fn test_audit_reports_each_library_once() {
        let (temp_dir, cfg) = setup();
        let app = temp_dir.path().join("app");
        create_test_file(&app, "lib/a.rb", "require 'csv'\nrequire 'json'\n");
        create_test_file(&app, "lib/b.rb", "require 'csv'\nrequire 'bigdecimal'\n");

        let result = run_audit(cfg).unwrap();
        assert_eq!(result.files_analyzed, 2);

        let csv: Vec<_> = result.findings.iter().filter(|f| f.request == "csv").collect();
        assert_eq!(csv.len(), 1);
        assert!(csv[0].message.contains("Install csv from RubyGems."));

        let big = result.findings.iter().find(|f| f.request == "bigdecimal").unwrap();
        assert_eq!(big.file, "lib/b.rb");
        assert_eq!(big.line, 2);
        assert_eq!(big.kind, FindingKind::Unbundled);
        assert!(result.findings.iter().all(|f| f.request != "json"));
    }

    #[test]
    fn test_audit_respects_lock_file() {
        let (temp_dir, cfg) = setup();
        let app = temp_dir.path().join("app");
        create_test_file(&app, "Gemfile", "gem 'base64'\n");
        create_test_file(&app, "Gemfile.lock", "GEM\n  specs:\n    base64 (0.2.0)\n");
        create_test_file(&app, "main.rb", "require 'base64'\nrequire 'csv/parser'\n");

        let result = run_audit(cfg).unwrap();
        assert_eq!(result.findings.len(), 1);
        let f = &result.findings[0];
        assert_eq!(f.request, "csv/parser");
        assert!(f.message.starts_with("csv/parser is found in csv"));
        assert!(f.message.contains("Add csv to your Gemfile or gemspec."));
    }

    #[test]
    fn test_audit_skips_namespaced_require_of_locked_gem() {
        let (temp_dir, cfg) = setup();
        let app = temp_dir.path().join("app");
        create_test_file(&app, "Gemfile", "gem 'csv'\n");
        create_test_file(&app, "Gemfile.lock", "GEM\n  specs:\n    csv (3.2.8)\n");
        create_test_file(&app, "main.rb", "require 'csv/parser'\nrequire 'csv'\n");

        let result = run_audit(cfg).unwrap();
        assert!(result.findings.is_empty(), "{:?}", result.findings);
    }

    #[test]
    fn test_audit_first_file_in_path_order_owns_finding() {
        let (temp_dir, cfg) = setup();
        let app = temp_dir.path().join("app");
        // The first file is the slowest to parse.
        let padding = "# padding\n".repeat(20_000);
        create_test_file(&app, "f000.rb", &format!("{}require 'csv'\n", padding));
        for i in 1..32 {
            create_test_file(&app, &format!("f{:03}.rb", i), "require 'csv'\n");
        }

        for _ in 0..5 {
            let result = run_audit(cfg.clone()).unwrap();
            assert_eq!(result.findings.len(), 1);
            assert_eq!(result.findings[0].file, "f000.rb");
            assert_eq!(result.findings[0].line, 20_001);
        }
    }

    #[test]
    fn test_audit_missing_library_notice() {
        let (temp_dir, cfg) = setup();
        let app = temp_dir.path().join("app");
        create_test_file(&app, "server.rb", "require 'webrick'\n");

        let result = run_audit(cfg).unwrap();
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].kind, FindingKind::Missing);
        assert!(result.findings[0].message.starts_with("webrick which is not part"));
    }

    #[test]
    fn test_audit_empty_project() {
        let (temp_dir, cfg) = setup();
        fs::create_dir_all(temp_dir.path().join("app")).unwrap();
        assert!(run_audit(cfg).is_err());
    }
}
