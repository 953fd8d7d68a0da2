mod common;

use std::time::Duration;

use common::{assemble, assemble_with, StubHost};
use repo_digest::selection::{apply_budget, BudgetStep, ContentAccumulator};
use repo_digest::types::{FileBlock, SkipReason, TreeEntry};
use repo_digest::DigestConfig;

fn block(path: &str, len: usize) -> FileBlock {
    FileBlock {
        path: path.to_string(),
        content: "x".repeat(len),
    }
}

#[tokio::test]
async fn scenario_c_strict_prefix_under_budget() {
    // 80,000 characters of content against a 60,000 budget
    let sizes = [10_000, 10_000, 10_000, 10_000, 10_000, 15_000, 5_000, 10_000];
    let mut host = StubHost::new();
    for (i, size) in sizes.iter().enumerate() {
        host = host.with_file(&format!("src/f{i}.rs"), &"x".repeat(*size));
    }

    let mut config = DigestConfig::default();
    config.max_file_bytes = 100_000;
    let content = assemble_with(&host, &config).await;

    let paths: Vec<&str> = content.blocks().iter().map(|b| b.path.as_str()).collect();
    assert_eq!(paths, vec!["src/f0.rs", "src/f1.rs", "src/f2.rs", "src/f3.rs", "src/f4.rs"]);

    let used: usize = content.blocks().iter().map(FileBlock::char_len).sum();
    assert_eq!(used, content.chars_used());
    assert!(content.chars_used() <= 60_000);

    // the 15k block overflowed; the later 5k block would have fit but is not
    // allowed to backfill
    let stats = content.stats();
    assert_eq!(stats.files_included, 5);
    assert_eq!(stats.files_excluded_by_budget, 3);
    assert_eq!(stats.budget, 60_000);
    assert!(content.blocks().iter().all(|b| b.content.len() == 10_000), "no truncated blocks");
}

#[test]
fn overflowing_block_is_omitted_not_truncated() {
    let blocks = vec![block("a", 40), block("b", 100), block("c", 1)];
    let budget = blocks[0].char_len() + 10;

    let result = apply_budget(blocks, budget);

    assert_eq!(result.files_selected, 1);
    assert_eq!(result.files_excluded_by_budget, 2);
    assert_eq!(result.selected[0].content.len(), 40);
    assert!(result.chars_used <= budget);
}

#[test]
fn accumulator_seals_on_first_overflow() {
    let small = block("small", 1);
    let mut acc = ContentAccumulator::new(small.char_len() * 2);

    assert_eq!(acc.try_append(small.clone()), BudgetStep::Appended);
    assert_eq!(acc.try_append(block("big", 1_000)), BudgetStep::Exhausted);
    assert!(acc.is_sealed());
    assert_eq!(acc.try_append(small), BudgetStep::Exhausted);
    assert_eq!(acc.into_blocks().len(), 1);
}

#[test]
fn exact_fit_is_accepted() {
    let b = block("a.rs", 10);
    let result = apply_budget(vec![b.clone()], b.char_len());
    assert_eq!(result.files_selected, 1);
    assert_eq!(result.chars_used, b.char_len());
}

#[tokio::test]
async fn order_follows_priority_not_fetch_completion() {
    let host = StubHost::new()
        .with_file("src/slow.rs", "fn slow() {}")
        .with_file("src/fast.rs", "fn fast() {}")
        .with_file("README.md", "# demo")
        .with_delay("README.md", Duration::from_millis(80))
        .with_delay("src/slow.rs", Duration::from_millis(40));

    let content = assemble(&host).await;
    let paths: Vec<&str> = content.blocks().iter().map(|b| b.path.as_str()).collect();
    assert_eq!(paths, vec!["README.md", "src/slow.rs", "src/fast.rs"]);
}

#[tokio::test]
async fn single_file_failure_is_skipped_and_assembly_continues() {
    let host = StubHost::new()
        .with_file("README.md", "# demo")
        .with_entry(TreeEntry::file("src/missing.rs", Some(10)))
        .with_file("src/lib.rs", "pub fn f() {}");

    let content = assemble(&host).await;

    let paths: Vec<&str> = content.blocks().iter().map(|b| b.path.as_str()).collect();
    assert_eq!(paths, vec!["README.md", "src/lib.rs"]);
    assert_eq!(content.skipped().len(), 1);
    assert_eq!(content.skipped()[0].path, "src/missing.rs");
    assert!(matches!(content.skipped()[0].reason, SkipReason::FetchFailed { .. }));
    assert_eq!(content.stats().files_skipped, 1);
    assert_eq!(content.stats().files_excluded_by_budget, 0);
}

#[tokio::test]
async fn slow_file_times_out_as_skip() {
    let host = StubHost::new()
        .with_file("README.md", "# demo")
        .with_file("src/hang.rs", "never")
        .with_delay("src/hang.rs", Duration::from_secs(5));

    let mut config = DigestConfig::default();
    config.file_timeout = Duration::from_millis(20);
    let content = assemble_with(&host, &config).await;

    assert_eq!(content.blocks().len(), 1);
    assert!(matches!(
        &content.skipped()[0].reason,
        SkipReason::FetchFailed { message } if message.contains("timed out")
    ));
}

#[tokio::test]
async fn empty_binary_and_oversized_files_are_skipped() {
    let host = StubHost::new()
        .with_file("README.md", "# demo")
        .with_file("src/blank.rs", "  \n\t\n")
        .with_bytes("src/data.txt", vec![0xff, 0xfe, 0x00, 0x9f])
        .with_file("src/huge.rs", &"y".repeat(200))
        .with_entry(TreeEntry::file("src/unsized.rs", None));

    let mut config = DigestConfig::default();
    config.max_file_bytes = 100;
    let content = assemble_with(&host, &config).await;

    assert_eq!(content.blocks().len(), 1);
    let reasons: Vec<(&str, &SkipReason)> = content
        .skipped()
        .iter()
        .map(|s| (s.path.as_str(), &s.reason))
        .collect();
    assert_eq!(reasons[0], ("src/blank.rs", &SkipReason::Empty));
    assert_eq!(reasons[1], ("src/data.txt", &SkipReason::NotText));
    assert_eq!(reasons[2], ("src/huge.rs", &SkipReason::Oversized { bytes: 200 }));
    assert!(matches!(reasons[3].1, SkipReason::FetchFailed { .. }));
}

#[tokio::test]
async fn oversized_by_tree_size_is_never_fetched() {
    let host = StubHost::new().with_entry(TreeEntry::file("src/big.rs", Some(1_000_000)));
    let content = assemble(&host).await;
    assert!(content.is_empty());
    assert_eq!(host.file_calls(), 0);
}

#[tokio::test]
async fn scenario_b_nothing_includable_yields_empty_content() {
    let host = StubHost::new()
        .with_file("vendor/lib.go", "package lib")
        .with_file(".gitignore", "target/");

    let content = assemble(&host).await;

    assert!(content.is_empty());
    assert_eq!(content.chars_used(), 0);
    assert_eq!(content.stats().files_considered, 0);
    assert_eq!(content.stats().entries_listed, 2);
    assert_eq!(host.file_calls(), 0);
}
