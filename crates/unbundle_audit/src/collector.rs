use anyhow::Result;
use ignore::WalkBuilder;
use log::{debug, trace};
use std::path::{Path, PathBuf};

/// Extensions of source files that may issue `require` calls
pub const SOURCE_EXTENSIONS: &[&str] = &["rb", "rake", "gemspec"];

/// Collects source files under `root`, honouring ignore files.
///
/// Files below `skip_dir` (the runtime's own library directory when it sits
/// inside the project) are left out.
pub fn collect_sources(root: &Path, skip_dir: Option<&Path>) -> Result<Vec<PathBuf>> {
    debug!("Walking directory tree from root: {}", root.display());
    let walker = WalkBuilder::new(root).hidden(false).ignore(true).git_ignore(true).build();

    let mut files: Vec<PathBuf> = Vec::new();
    for res in walker {
        let dent = res?;
        let p = dent.path();
        if !p.is_file() {
            continue;
        }
        if let Some(skip) = skip_dir
            && p.starts_with(skip)
        {
            trace!("Skipping library file: {}", p.display());
            continue;
        }

        let is_source = match p.extension().and_then(|e| e.to_str()) {
            Some(ext) => SOURCE_EXTENSIONS.contains(&ext),
            None => p.file_name().and_then(|n| n.to_str()) == Some("Rakefile"),
        };
        if is_source {
            trace!("Found source file: {}", p.display());
            files.push(p.to_path_buf());
        }
    }
    files.sort();
    debug!("Collected {} source files", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
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
    fn test_collects_ruby_sources() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "lib/app.rb", "");
        create_test_file(root, "Rakefile", "");
        create_test_file(root, "tasks/db.rake", "");
        create_test_file(root, "README.md", "");
        create_test_file(root, "bin/setup", "");

        let files = collect_sources(root, None).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["Rakefile", "lib/app.rb", "tasks/db.rake"]);
    }

    #[test]
    fn test_skips_library_dir() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "app.rb", "");
        create_test_file(root, "ruby/lib/csv.rb", "");

        let files = collect_sources(root, Some(&root.join("ruby/lib"))).unwrap();
        assert_eq!(files, vec![root.join("app.rb")]);
    }
}
