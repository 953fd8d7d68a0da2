use serde::{Deserialize, Serialize};

use crate::types::tree::TreeEntry;

/// Package manifests and build configuration files, compared lowercase.
pub const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "cargo.toml",
    "go.mod",
    "gemfile",
    "composer.json",
    "makefile",
    "dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "tsconfig.json",
    "webpack.config.js",
    "vite.config.ts",
    "vite.config.js",
    "cmakelists.txt",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
];

/// Extensions counted as source code for root-level files, without the dot.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "mjs", "cjs", "ts", "tsx", "go", "java", "kt", "kts", "scala",
    "rb", "php", "c", "h", "cc", "cpp", "hpp", "cs", "swift", "m", "ex", "exs", "erl", "hs",
    "ml", "clj", "lua", "pl", "r", "dart", "zig", "nim", "sh", "vue", "svelte",
];

/// Relevance rank; lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    Readme = 0,
    Manifest = 1,
    TopLevelSource = 2,
    Deep = 3,
}

pub trait TierAssigner {
    fn assign_tier(&self, entry: &TreeEntry) -> PriorityTier;
}

/// v0: name- and depth-based tiers.
#[derive(Debug, Clone)]
pub struct NameTierAssigner {
    pub manifests: Vec<String>,
    pub source_extensions: Vec<String>,
}

impl Default for NameTierAssigner {
    fn default() -> Self {
        Self {
            manifests: MANIFEST_FILES.iter().map(|s| s.to_string()).collect(),
            source_extensions: SOURCE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TierAssigner for NameTierAssigner {
    fn assign_tier(&self, entry: &TreeEntry) -> PriorityTier {
        let name = entry.file_name().to_lowercase();

        // `readme`, `README.md`, `Readme.rst`...
        let stem = name.split('.').next().unwrap_or(&name);
        if stem == "readme" {
            return PriorityTier::Readme;
        }

        if self.manifests.iter().any(|m| *m == name) {
            return PriorityTier::Manifest;
        }

        if entry.depth() == 0 {
            let is_source = name
                .rsplit_once('.')
                .map(|(_, ext)| self.source_extensions.iter().any(|e| e == ext))
                .unwrap_or(false);
            if is_source {
                return PriorityTier::TopLevelSource;
            }
        }

        PriorityTier::Deep
    }
}

/// Stable sort by tier ascending. Entries sharing a tier keep their input
/// (tree) order.
pub fn prioritize<A: TierAssigner>(assigner: &A, entries: Vec<TreeEntry>) -> Vec<(PriorityTier, TreeEntry)> {
    let mut tiered: Vec<(PriorityTier, TreeEntry)> = entries
        .into_iter()
        .map(|e| (assigner.assign_tier(&e), e))
        .collect();

    // `sort_by_key` is a stable sort
    tiered.sort_by_key(|(tier, _)| *tier);

    debug_assert!(tiered.windows(2).all(|w| w[0].0 <= w[1].0));

    tiered
}
