use globset::{Glob, GlobSet};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub classes: Vec<String>,
    pub files_scanned: usize,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan requires at least one pattern")]
    NoPatterns,
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("failed to build glob set: {0}")]
    GlobSet(#[source] globset::Error),
    #[error("path not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanGlobOptions {
    pub base_path: PathBuf,
    pub respect_gitignore: bool,
    pub include_node_modules: bool,
    pub include_css_files: bool,
}

impl Default for ScanGlobOptions {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            respect_gitignore: true,
            include_node_modules: false,
            include_css_files: false,
        }
    }
}

/// Class names the generator can emit rules for, besides the `-cols` family.
const FIXED_CLASSES: [&str; 14] = [
    "container",
    "container-reset",
    "breakout",
    "breakout-reset",
    "cols-container",
    "ml-0",
    "px-outer-gutter",
    "pr-outer-gutter",
    "pl-outer-gutter",
    "w-outer-gutter",
    "layout-overlay",
    "layout-overlay-toggle",
    "layout-overlay-grid",
    "grid-container",
];

const COLUMN_SUFFIXES: [&str; 4] = ["-cols", "-cols-vw", "-cols-no-gutter", "-cols-no-gutter-vw"];

const GRID_LINE_PREFIXES: [&str; 3] = ["grid-col-span-", "grid-col-start-", "grid-col-end-"];

pub fn scan(paths: &[PathBuf]) -> Result<ScanResult, ScanError> {
    let mut classes = Vec::new();
    let mut seen = HashSet::new();
    let mut files_scanned = 0;

    for path in paths {
        scan_path(path, &mut classes, &mut seen, &mut files_scanned)?;
    }

    Ok(ScanResult {
        classes,
        files_scanned,
    })
}

pub fn scan_globs_with_ignore(
    patterns: &[String],
    ignore_patterns: &[String],
) -> Result<ScanResult, ScanError> {
    scan_globs_with_options(patterns, ignore_patterns, &ScanGlobOptions::default())
}

pub fn scan_globs_with_options(
    patterns: &[String],
    ignore_patterns: &[String],
    options: &ScanGlobOptions,
) -> Result<ScanResult, ScanError> {
    if patterns.is_empty() {
        return Err(ScanError::NoPatterns);
    }

    let globset = build_globset(patterns)?;
    let ignore_set = build_globset(ignore_patterns)?;
    let wanted = |path: &Path| {
        let relative = path.strip_prefix(&options.base_path).unwrap_or(path);
        (globset.is_match(relative) || globset.is_match(path))
            && !(ignore_set.is_match(relative) || ignore_set.is_match(path))
            && !should_skip_file(path, options)
    };

    let roots = walk_roots(patterns, &options.base_path);
    let mut builder = WalkBuilder::new(&roots[0]);
    for root in &roots[1..] {
        builder.add(root);
    }
    builder
        .hidden(false)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore);

    let mut seen = HashSet::new();
    let paths: Vec<PathBuf> = builder
        .build()
        .filter_map(|entry| {
            entry
                .map_err(|err| log::debug!("skipping unreadable entry: {}", err))
                .ok()
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| wanted(path) && seen.insert(path.clone()))
        .collect();

    scan(&paths)
}

/// Walk roots for a pattern list: relative patterns share `base`, absolute
/// ones are walked from their own literal prefix.
fn walk_roots(patterns: &[String], base: &Path) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    for pattern in patterns {
        let root = if Path::new(pattern).is_absolute() {
            glob_root(pattern)
        } else {
            base.to_path_buf()
        };
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}

/// Directory a glob pattern is anchored at: everything before the first
/// wildcard, cut back to a path separator.
pub fn glob_root(pattern: &str) -> PathBuf {
    let Some(first_meta) = pattern.find(['*', '?', '[', '{']) else {
        if pattern.ends_with('/') || pattern.ends_with('\\') {
            return PathBuf::from(pattern);
        }
        let path = Path::new(pattern);
        if path.extension().is_some() {
            return path.parent().unwrap_or(Path::new(".")).to_path_buf();
        }
        return path.to_path_buf();
    };

    match pattern[..first_meta].rfind(['/', '\\']) {
        Some(idx) => PathBuf::from(&pattern[..=idx]),
        None => PathBuf::from("."),
    }
}

fn should_skip_file(path: &Path, options: &ScanGlobOptions) -> bool {
    if !options.include_node_modules
        && path
            .components()
            .any(|component| component.as_os_str() == "node_modules")
    {
        return true;
    }

    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase());
    match ext.as_deref() {
        Some(ext) if !options.include_css_files && is_css_extension(ext) => true,
        Some(ext) => is_binary_extension(ext),
        None => false,
    }
}

fn is_css_extension(ext: &str) -> bool {
    matches!(ext, "css" | "scss" | "sass" | "less" | "styl" | "pcss")
}

fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "ico" | "avif" | "mp4" | "webm" | "zip" | "gz"
            | "pdf" | "woff" | "woff2" | "ttf" | "otf"
    )
}

fn scan_path(
    path: &Path,
    classes: &mut Vec<String>,
    seen: &mut HashSet<String>,
    files_scanned: &mut usize,
) -> Result<(), ScanError> {
    if !path.exists() {
        return Err(ScanError::Missing(path.to_path_buf()));
    }

    if path.is_dir() {
        let entries = fs::read_dir(path).map_err(|source| ScanError::ReadDir {
            path: path.to_path_buf(),
            source,
        })?;
        for entry in entries.flatten() {
            scan_path(&entry.path(), classes, seen, files_scanned)?;
        }
        return Ok(());
    }

    if path.is_file() {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                log::debug!("skipping {}: {}", path.display(), err);
                return Ok(());
            }
        };
        *files_scanned += 1;
        for class in extract_classes(&text) {
            if seen.insert(class.clone()) {
                classes.push(class);
            }
        }
    }

    Ok(())
}

/// Layout class names mentioned anywhere in `text`, in first-seen order.
///
/// Variant prefixes such as `md:` or `hover:` are stripped; the unprefixed
/// rule is what this generator can provide.
pub fn extract_classes(text: &str) -> Vec<String> {
    let mut results = Vec::new();
    let mut seen = HashSet::new();

    for token in tokenize_class_list(text) {
        let base = token.rsplit(':').next().unwrap_or(token.as_str());
        let base = base.strip_prefix('!').unwrap_or(base);
        if is_layout_class(base) && seen.insert(base.to_string()) {
            results.push(base.to_string());
        }
    }

    results
}

pub fn is_layout_class(class: &str) -> bool {
    if FIXED_CLASSES.contains(&class) {
        return true;
    }
    if let Some(number) = GRID_LINE_PREFIXES
        .iter()
        .find_map(|prefix| class.strip_prefix(prefix))
    {
        return !number.is_empty() && number.chars().all(|ch| ch.is_ascii_digit());
    }
    COLUMN_SUFFIXES.iter().any(|suffix| {
        class
            .strip_suffix(suffix)
            .and_then(|head| head.rsplit_once('-'))
            .is_some_and(|(name, variant)| !name.is_empty() && is_column_variant(variant))
    })
}

/// `3` or `2/3`.
fn is_column_variant(variant: &str) -> bool {
    let is_number = |part: &str| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit());
    match variant.split_once('/') {
        Some((numerator, denominator)) => is_number(numerator) && is_number(denominator),
        None => is_number(variant),
    }
}

/// Splits on whitespace, quotes and markup punctuation, keeping bracketed
/// segments intact.
fn tokenize_class_list(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth: usize = 0;

    for ch in input.chars() {
        match ch {
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            _ => {}
        }

        let separator = ch.is_whitespace()
            || matches!(ch, '"' | '\'' | '`' | '<' | '>' | '=' | '{' | '}' | ',' | ';' | '(' | ')');
        if separator && bracket_depth == 0 {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

pub fn build_globset(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ScanError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(ScanError::GlobSet)
}
