use serde::Serialize;

use crate::types::tree::TreeEntry;

/// Dependency-manager and build-output directories. Any entry below one of
/// these is noise.
pub const VENDOR_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "env",
    "dist",
    "build",
    "target",
    ".next",
    ".nuxt",
    "coverage",
    ".tox",
    ".nox",
    ".eggs",
    "eggs",
    ".mypy_cache",
    ".pytest_cache",
    "bower_components",
    "jspm_packages",
    ".terraform",
    ".gradle",
];

/// Exact lock-file names.
pub const LOCK_FILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Pipfile.lock",
    "poetry.lock",
    "composer.lock",
    "Gemfile.lock",
    "Cargo.lock",
    "go.sum",
];

/// Operating-system metadata files (`.DS_Store` is already a dotfile).
pub const OS_JUNK_FILES: &[&str] = &["Thumbs.db", "ehthumbs.db", "desktop.ini"];

/// Binary, media, archive and compiled-artifact suffixes (compared lowercase).
/// Multi-dot suffixes such as `.min.js` are matched on the whole file name.
pub const BINARY_SUFFIXES: &[&str] = &[
    ".pyc", ".pyo", ".so", ".o", ".a", ".dylib", ".dll", ".exe", ".class", ".wasm",
    ".bin", ".dat", ".db", ".sqlite", ".sqlite3",
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".ico", ".svg", ".webp",
    ".ttf", ".woff", ".woff2", ".eot", ".otf",
    ".zip", ".tar", ".gz", ".bz2", ".7z", ".rar", ".jar", ".war",
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
    ".mp3", ".mp4", ".avi", ".mov", ".wav", ".flac",
    ".min.js", ".min.css", ".map",
    ".lock", ".sum",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    Included,
    Directory,
    VendorDirectory,
    Dotfile,
    LockFile,
    OsJunk,
    BinaryArtifact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDecision {
    pub include: bool,
    pub reason: FilterReason,
}

impl FilterDecision {
    fn include() -> Self {
        Self {
            include: true,
            reason: FilterReason::Included,
        }
    }

    fn exclude(reason: FilterReason) -> Self {
        Self {
            include: false,
            reason,
        }
    }
}

/// Table-driven include/exclude rules.
///
/// The decision for an entry depends only on that entry's own path, so
/// entries can be judged in any order or in parallel.
#[derive(Debug, Clone)]
pub struct FilterRules {
    pub vendor_dirs: Vec<String>,
    pub lock_files: Vec<String>,
    pub os_junk_files: Vec<String>,
    pub binary_suffixes: Vec<String>,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            vendor_dirs: VENDOR_DIRS.iter().map(|s| s.to_string()).collect(),
            lock_files: LOCK_FILES.iter().map(|s| s.to_string()).collect(),
            os_junk_files: OS_JUNK_FILES.iter().map(|s| s.to_string()).collect(),
            binary_suffixes: BINARY_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FilterRules {
    /// First matching rule wins.
    pub fn decide(&self, entry: &TreeEntry) -> FilterDecision {
        if entry.is_dir() {
            return FilterDecision::exclude(FilterReason::Directory);
        }

        if entry
            .parent_segments()
            .any(|seg| self.vendor_dirs.iter().any(|d| d == seg))
        {
            return FilterDecision::exclude(FilterReason::VendorDirectory);
        }

        // Hidden files, and anything under a hidden directory.
        if entry.path.split('/').any(|seg| seg.starts_with('.')) {
            return FilterDecision::exclude(FilterReason::Dotfile);
        }

        let name = entry.file_name();
        if self.lock_files.iter().any(|l| l == name) {
            return FilterDecision::exclude(FilterReason::LockFile);
        }
        if self.os_junk_files.iter().any(|j| j.eq_ignore_ascii_case(name)) {
            return FilterDecision::exclude(FilterReason::OsJunk);
        }

        let lower = name.to_lowercase();
        if self.binary_suffixes.iter().any(|ext| lower.ends_with(ext.as_str())) {
            return FilterDecision::exclude(FilterReason::BinaryArtifact);
        }

        FilterDecision::include()
    }

    pub fn includes(&self, entry: &TreeEntry) -> bool {
        self.decide(entry).include
    }
}

/// Decide with the built-in tables.
pub fn decide(entry: &TreeEntry) -> FilterDecision {
    FilterRules::default().decide(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_order_first_match_wins() {
        let rules = FilterRules::default();
        // vendor beats dotfile and binary
        let d = rules.decide(&TreeEntry::file("node_modules/.bin/x.png", None));
        assert_eq!(d.reason, FilterReason::VendorDirectory);
        // lock file beats the `.lock` suffix rule
        let d = rules.decide(&TreeEntry::file("yarn.lock", None));
        assert_eq!(d.reason, FilterReason::LockFile);
    }

    #[test]
    fn vendor_match_is_segment_exact() {
        let rules = FilterRules::default();
        assert!(rules.includes(&TreeEntry::file("src/builder.rs", None)));
        assert!(rules.includes(&TreeEntry::file("vendored/lib.go", None)));
        // a file literally named like a vendor dir is not inside one
        assert!(rules.includes(&TreeEntry::file("build", None)));
    }
}
