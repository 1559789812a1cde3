use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser};
use log::{debug, info, trace};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use unbundle_core::{
    ClassificationTables, HostContext, InstalledSpec, LoadPathResolver, PlatformConfig,
    WarningEngine,
};

/// Runtime layout and host signals shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct PlatformArgs {
    /// JSON file with `standard_library_dir`, `architecture_library_dir`
    /// and `native_extension_suffixes`
    #[arg(long, conflicts_with_all = ["libdir", "archdir"])]
    pub platform: Option<PathBuf>,

    /// Standard library directory (rubylibdir)
    #[arg(long)]
    pub libdir: Option<String>,

    /// Compiled extension directory (rubyarchdir)
    #[arg(long)]
    pub archdir: Option<String>,

    /// Compiled extension suffix (DLEXT)
    #[arg(long, default_value = "so")]
    pub dlext: String,

    /// Version of the runtime the code will run on
    #[arg(long)]
    pub runtime_version: String,

    /// Treat a manifest-based dependency manager as active
    #[arg(long)]
    pub manifest: bool,

    /// Package installation roots used to blame installed packages
    #[arg(long = "gem-path")]
    pub gem_paths: Vec<PathBuf>,

    /// Extra load-path directories searched before the library directories
    #[arg(long = "load-path")]
    pub load_paths: Vec<PathBuf>,
}

impl PlatformArgs {
    pub fn platform_config(&self) -> Result<PlatformConfig> {
        if let Some(path) = &self.platform {
            return PlatformConfig::from_json_file(path);
        }
        let libdir = self.libdir.clone().ok_or_else(|| anyhow!("Missing --libdir or --platform"))?;
        let archdir =
            self.archdir.clone().ok_or_else(|| anyhow!("Missing --archdir or --platform"))?;
        PlatformConfig::new(libdir, archdir, self.dlext.clone()).validate()
    }

    pub fn tables(&self) -> Result<Arc<ClassificationTables>> {
        let tables = ClassificationTables::new(self.platform_config()?)
            .context("Invalid platform configuration")?;
        Ok(Arc::new(tables))
    }

    pub fn host(&self, manifest_present: bool) -> Result<HostContext> {
        Ok(HostContext::new(&self.runtime_version)?
            .with_manifest_manager(self.manifest || manifest_present)
            .with_package_roots(self.gem_paths.clone()))
    }

    /// Builds an engine resolving against `--load-path` then the library dirs.
    pub fn engine(&self, manifest_present: bool) -> Result<WarningEngine> {
        let tables = self.tables()?;
        let mut load_paths = self.load_paths.clone();
        load_paths.push(PathBuf::from(&tables.standard_library_dir));
        load_paths.push(PathBuf::from(&tables.architecture_library_dir));
        debug!("Load path: {:?}", load_paths);

        let resolver = LoadPathResolver::new(load_paths, tables.native_extension_suffixes.clone());
        Ok(WarningEngine::new(tables, resolver, self.host(manifest_present)?))
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "audit")]
#[command(about = "Find requires of libraries that left the default distribution")]
pub struct Config {
    /// Root directory of the project (defaults to git root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    #[command(flatten)]
    pub platform: PlatformArgs,

    #[clap(skip)]
    pub specs: Vec<InstalledSpec>,

    #[clap(skip)]
    pub manifest_present: bool,
}

impl Config {
    /// Resolves the root directory and reads the project's manifest files
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for git root");
            find_git_root()?
        };
        info!("Using root directory: {}", root.display());

        self.manifest_present = has_manifest(&root);
        debug!("Manifest present: {}", self.manifest_present);
        self.specs = read_locked_specs(&root)?;
        debug!("Found {} locked specs", self.specs.len());

        self.root = Some(root);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }
}

pub fn find_git_root() -> Result<PathBuf> {
    debug!("Searching for git root");
    let mut current_dir = env::current_dir()?;
    trace!("Starting search from: {:?}", current_dir);

    loop {
        if current_dir.join(".git").exists() {
            debug!("Found git root at: {:?}", current_dir);
            return Ok(current_dir);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(anyhow!("Could not find .git directory in any parent folder")),
        }
    }
}

pub fn has_manifest(root: &Path) -> bool {
    ["Gemfile", "gems.rb"].iter().any(|f| root.join(f).is_file())
}

/// Reads spec names from `Gemfile.lock` (or `gems.locked`).
///
/// Only the `name (version)` lines indented by exactly four spaces are
/// specs; deeper lines are their dependencies.
pub fn read_locked_specs(root: &Path) -> Result<Vec<InstalledSpec>> {
    let Some(lock) = ["Gemfile.lock", "gems.locked"].iter().map(|f| root.join(f)).find(|p| p.is_file())
    else {
        trace!("No lock file under {}", root.display());
        return Ok(Vec::new());
    };
    let content =
        fs::read_to_string(&lock).with_context(|| format!("Failed to read {}", lock.display()))?;

    let mut specs: Vec<InstalledSpec> = Vec::new();
    for line in content.lines() {
        let Some(rest) = line.strip_prefix("    ") else {
            continue;
        };
        if rest.starts_with(' ') {
            continue;
        }
        if let Some((name, version)) = rest.split_once(" (")
            && version.ends_with(')')
            && !specs.iter().any(|s| s.name == name)
        {
            trace!("Locked spec: {}", name);
            specs.push(InstalledSpec::new(name));
        }
    }
    Ok(specs)
}
