use log::trace;
use regex::Regex;
use std::{
    path::{Component, Path},
    sync::LazyLock,
};

use crate::{
    config::HostContext, engine::normalize_feature, frames::CallerFrame,
    tables::ClassificationTables,
};

static GEM_DIR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)-(\d+(?:\.[0-9A-Za-z]+)*)(?:-[\w.\-]+)?$").expect("valid gem dir regex")
});

/// Renders the deprecation clause for `gem`, starting with `" which"` so it
/// can follow the name being explained.
///
/// `attribution` is the frame examined to blame an installed package for the
/// request. Returns `None` when `gem` has no unbundled version.
pub fn build_message(
    tables: &ClassificationTables,
    host: &HostContext,
    gem: &str,
    attribution: Option<&CallerFrame>,
) -> Option<String> {
    let record = tables.get(gem)?;
    let since = &record.unbundled_since;
    let tense = if host.runtime_version < *since { "will no longer be" } else { "is not" };
    let mut msg = format!(" which {} part of the default gems since Ruby {}.", tense, since);

    if host.manifest_manager_active {
        msg.push_str(&format!(" Add {} to your Gemfile or gemspec.", gem));
        if let Some(caller_gem) = attribution.and_then(|f| attribute_package(tables, host, f)) {
            msg.push_str(&format!(
                " Also contact author of {} to add {} into its gemspec.",
                caller_gem, gem
            ));
        }
    } else {
        msg.push_str(&format!(" Install {} from RubyGems.", gem));
    }

    Some(msg)
}

/// Finds the installed package whose directory contains the frame's file.
///
/// Best effort: the first matching package root wins, and anything that is
/// not an existing file outside the standard library yields `None`.
pub fn attribute_package(
    tables: &ClassificationTables,
    host: &HostContext,
    frame: &CallerFrame,
) -> Option<String> {
    let location = frame.absolute_path.as_deref()?;
    if !location.is_file() {
        trace!("Attribution frame is not a file: {}", location.display());
        return None;
    }
    if normalize_feature(&location.to_string_lossy()).starts_with(tables.standard_library_dir.as_str()) {
        return None;
    }

    for root in &host.package_roots {
        if let Some(dir) = gem_dir_under(location, &root.join("gems")) {
            trace!("Attributed {} to package dir '{}'", location.display(), dir);
            return Some(package_name(&dir).to_string());
        }
    }
    None
}

fn gem_dir_under(location: &Path, gems_dir: &Path) -> Option<String> {
    let rest = location.strip_prefix(gems_dir).ok()?;
    match rest.components().next()? {
        Component::Normal(seg) => seg.to_str().map(str::to_string),
        _ => None,
    }
}

/// `nokogiri-1.16.0-x86_64-linux` → `nokogiri`; a segment without a version
/// is returned unchanged.
pub fn package_name(dir: &str) -> &str {
    match GEM_DIR_NAME.captures(dir).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => dir,
    }
}
