use repo_digest::selection::{decide, FilterReason, FilterRules};
use repo_digest::types::TreeEntry;

#[test]
fn invariant_directories_never_included() {
    let rules = FilterRules::default();
    for path in ["src", "README.md", "docs/guide", "package.json", "a/b/c.rs"] {
        let decision = rules.decide(&TreeEntry::directory(path));
        assert!(!decision.include, "directory {path} must be excluded");
        assert_eq!(decision.reason, FilterReason::Directory);
    }
}

#[test]
fn invariant_dot_paths_excluded_regardless_of_extension() {
    for path in [".env", ".gitignore", ".eslintrc.json", ".github/workflows/ci.yml", ".cargo/config.toml", ".main.rs"] {
        let decision = decide(&TreeEntry::file(path, Some(10)));
        assert!(!decision.include, "{path} must be excluded");
    }
    assert_eq!(decide(&TreeEntry::file(".env", None)).reason, FilterReason::Dotfile);
}

#[test]
fn vendor_and_build_directories_excluded_at_any_depth() {
    for path in [
        "node_modules/x/index.js",
        "vendor/lib.go",
        "packages/web/node_modules/react/index.js",
        "target/debug/build.rs",
        "py/__pycache__/mod.py",
        "dist/app.js",
    ] {
        let decision = decide(&TreeEntry::file(path, None));
        assert_eq!(decision.reason, FilterReason::VendorDirectory, "{path}");
    }
}

#[test]
fn lock_files_excluded_by_exact_name() {
    for path in ["package-lock.json", "web/yarn.lock", "Cargo.lock", "go.sum", "poetry.lock"] {
        let decision = decide(&TreeEntry::file(path, None));
        assert_eq!(decision.reason, FilterReason::LockFile, "{path}");
    }
    // similar but not a lock file
    assert!(decide(&TreeEntry::file("package.json", None)).include);
}

#[test]
fn os_metadata_files_have_their_own_reason() {
    for path in ["Thumbs.db", "assets/img/thumbs.db", "docs/desktop.ini"] {
        let decision = decide(&TreeEntry::file(path, None));
        assert!(!decision.include, "{path}");
        assert_eq!(decision.reason, FilterReason::OsJunk, "{path}");
    }
    // still a dotfile, which matches first
    assert_eq!(decide(&TreeEntry::file("src/.DS_Store", None)).reason, FilterReason::Dotfile);
}

#[test]
fn binary_and_generated_artifacts_excluded() {
    for path in ["logo.PNG", "assets/font.woff2", "lib/app.min.js", "dist2/app.js.map", "bin/tool.exe", "data.sqlite3"] {
        let decision = decide(&TreeEntry::file(path, None));
        assert_eq!(decision.reason, FilterReason::BinaryArtifact, "{path}");
    }
    assert!(decide(&TreeEntry::file("lib/app.js", None)).include);
}

#[test]
fn decision_is_independent_of_traversal_order() {
    let entries = vec![
        TreeEntry::file("README.md", None),
        TreeEntry::file(".env", None),
        TreeEntry::directory("src"),
        TreeEntry::file("src/main.rs", None),
        TreeEntry::file("node_modules/a.js", None),
    ];
    let forward: Vec<bool> = entries.iter().map(|e| decide(e).include).collect();
    let mut backward: Vec<bool> = entries.iter().rev().map(|e| decide(e).include).collect();
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn scenario_a_included_set() {
    let tree = [
        "README.md",
        "package.json",
        "src/index.js",
        "node_modules/x/index.js",
        ".env",
    ];
    let included: Vec<&str> = tree
        .iter()
        .copied()
        .filter(|p| decide(&TreeEntry::file(*p, None)).include)
        .collect();
    assert_eq!(included, vec!["README.md", "package.json", "src/index.js"]);
}

#[test]
fn rules_tables_are_data_driven() {
    let mut rules = FilterRules::default();
    rules.vendor_dirs.push("third_party".to_string());
    assert!(!rules.includes(&TreeEntry::file("third_party/zlib/zlib.c", None)));
    assert!(decide(&TreeEntry::file("third_party/zlib/zlib.c", None)).include);
}
