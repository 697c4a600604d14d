//! Integration tests for full snapshot runs
//!
//! These run `SnapshotExecutor::run` end to end against a temporary
//! directory tree, with rsync and cp replaced by in-process fakes.

mod common;

use common::fixtures::*;
use engine::{DirectoryMapping, EngineError, SnapshotExecutor};
use rstest::rstest;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

fn executor() -> (SnapshotExecutor, Arc<FsMirror>, Arc<HardlinkClone>) {
    let sync = FsMirror::shared();
    let clone = HardlinkClone::shared();
    let executor = SnapshotExecutor::new(sync.clone(), clone.clone());
    (executor, sync, clone)
}

#[tokio::test]
async fn test_first_run_creates_generation_zero_only() {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "hello");
    let (executor, sync, clone) = executor();

    let report = executor.run(&tree.config(3)).await.unwrap();

    assert_eq!(tree.generation_numbers(), vec![0]);
    assert_eq!(report.newest_generation, tree.generation(0));
    assert!(report.pruned.is_empty());
    assert_eq!(clone.call_count(), 0, "nothing to clone on first run");
    assert_eq!(sync.call_count(), 1);
    assert_eq!(
        read(tree.generation(0).join("home/alice/notes.txt")),
        "hello"
    );
    assert!(tree.scratch_dirs().is_empty());
}

#[tokio::test]
async fn test_full_retention_window_shifts_and_prunes() {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "current");
    for n in 0..3 {
        tree.seed_generation(n);
    }
    let (executor, _, clone) = executor();

    let report = executor.run(&tree.config(3)).await.unwrap();

    assert_eq!(tree.generation_numbers(), vec![0, 1, 2]);
    assert_eq!(clone.call_count(), 1);
    // Old generation 0 and 1 moved up one step, old 2 fell off the end
    assert_eq!(read(tree.generation(1).join("home/alice/marker")), "0");
    assert_eq!(read(tree.generation(2).join("home/alice/marker")), "1");
    assert_eq!(report.pruned.len(), 1);
    assert_eq!(report.pruned[0].number, 3);
    assert!(report.pruned[0].is_removed());
    // Mirror deleted what the source no longer has
    assert!(!tree.generation(0).join("home/alice/marker").exists());
    assert_eq!(
        read(tree.generation(0).join("home/alice/notes.txt")),
        "current"
    );
}

#[tokio::test]
async fn test_missing_source_is_skipped() {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "hello");
    let mut config = tree.config(3);
    config
        .dirs
        .push(DirectoryMapping::new(tree.dir.path().join("gone"), "gone"));
    let (executor, sync, _) = executor();

    executor.run(&config).await.unwrap();

    assert_eq!(tree.generation_numbers(), vec![0]);
    assert!(tree.generation(0).join("home/alice/notes.txt").exists());
    assert!(!tree.generation(0).join("gone").exists());
    assert_eq!(sync.call_count(), 1);
}

#[tokio::test]
async fn test_sync_failure_leaves_generations_untouched() {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "new content");
    tree.seed_generation(0);
    tree.seed_generation(1);
    let executor = SnapshotExecutor::new(
        FailingMirror::shared(tree.source()),
        HardlinkClone::shared(),
    );

    let err = executor.run(&tree.config(3)).await.unwrap_err();

    assert!(matches!(err, EngineError::CommandFailed { .. }));
    assert_eq!(tree.generation_numbers(), vec![0, 1]);
    assert_eq!(read(tree.generation(0).join("home/alice/marker")), "0");
    assert_eq!(read(tree.generation(1).join("home/alice/marker")), "1");
    assert!(tree.scratch_dirs().is_empty(), "scratch dir must be removed");
}

#[tokio::test]
async fn test_abandoned_run_discards_scratch_build() {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "hello");
    tree.seed_generation(0);
    let sync = StallingMirror::shared();
    let executor = SnapshotExecutor::new(sync.clone(), HardlinkClone::shared());

    let config = tree.config(3);
    let outcome = tokio::time::timeout(Duration::from_millis(200), executor.run(&config)).await;

    assert!(outcome.is_err(), "run should still be waiting on the mirror");
    let destination = sync.destination().expect("mirror was reached");
    assert!(destination.starts_with(tree.root()));
    assert!(!destination.exists());
    assert!(tree.scratch_dirs().is_empty());
    assert_eq!(tree.generation_numbers(), vec![0]);
}

#[tokio::test]
async fn test_invalid_name_rejected_before_anything_runs() {
    let tree = TestTree::new();
    let marker = tree.dir.path().join("pre-hook-ran");
    let mut config = tree.config(3);
    config.name = "my home".to_string();
    config.pre_snapshot_commands = vec![format!("touch '{}'", marker.display())];
    let (executor, sync, _) = executor();

    let err = executor.run(&config).await.unwrap_err();

    assert!(err.is_config_error());
    assert!(!marker.exists());
    assert_eq!(sync.call_count(), 0);
    assert!(fs::read_dir(tree.root()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_older_generations_keep_their_content() {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "version 1");
    let (executor, _, _) = executor();
    let config = tree.config(5);

    executor.run(&config).await.unwrap();
    tree.write_source("notes.txt", "version 2");
    executor.run(&config).await.unwrap();

    assert_eq!(tree.generation_numbers(), vec![0, 1]);
    assert_eq!(
        read(tree.generation(1).join("home/alice/notes.txt")),
        "version 1"
    );
    assert_eq!(
        read(tree.generation(0).join("home/alice/notes.txt")),
        "version 2"
    );
}

#[tokio::test]
async fn test_excludes_are_passed_to_sync() {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "keep");
    tree.write_source("debug.log", "skip");
    let mut config = tree.config(3);
    config.dirs[0].excludes = vec!["*.log".to_string()];
    let (executor, _, _) = executor();

    executor.run(&config).await.unwrap();

    assert!(tree.generation(0).join("home/alice/notes.txt").exists());
    assert!(!tree.generation(0).join("home/alice/debug.log").exists());
}

#[rstest]
#[case(1, 3, 1)]
#[case(3, 3, 3)]
#[case(5, 3, 3)]
#[case(4, 1, 1)]
#[tokio::test]
async fn test_generation_count_bounded_by_retention(
    #[case] runs: u32,
    #[case] retention: u32,
    #[case] expected: u32,
) {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "hello");
    let (executor, _, _) = executor();
    let config = tree.config(retention);

    for _ in 0..runs {
        executor.run(&config).await.unwrap();
    }

    assert_eq!(
        tree.generation_numbers(),
        (0..expected).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_zero_retention_prunes_new_generation() {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "hello");
    let (executor, _, _) = executor();

    let report = executor.run(&tree.config(0)).await.unwrap();

    assert!(tree.generation_numbers().is_empty());
    assert_eq!(report.pruned.len(), 1);
    assert_eq!(report.pruned[0].number, 0);
}

#[tokio::test]
async fn test_newest_generation_mtime_is_run_time() {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "hello");
    tree.seed_generation(0);
    let old = SystemTime::now() - Duration::from_secs(86_400);
    fs::File::open(tree.generation(0))
        .unwrap()
        .set_modified(old)
        .unwrap();
    let (executor, _, _) = executor();

    let before = SystemTime::now() - Duration::from_secs(5);
    executor.run(&tree.config(3)).await.unwrap();

    let modified = fs::metadata(tree.generation(0)).unwrap().modified().unwrap();
    assert!(modified >= before, "generation 0 should carry the run time");
    let shifted = fs::metadata(tree.generation(1)).unwrap().modified().unwrap();
    assert!(shifted < before, "shifted generation keeps its own time");
}

#[tokio::test]
async fn test_leftover_scratch_dir_is_not_a_generation() {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "hello");
    let leftover = tree.root().join("tmpInterrupted");
    fs::create_dir(&leftover).unwrap();
    let (executor, _, _) = executor();

    executor.run(&tree.config(3)).await.unwrap();

    assert_eq!(tree.generation_numbers(), vec![0]);
    assert!(leftover.exists(), "leftovers are reported, not deleted");
}

#[tokio::test]
async fn test_other_interval_in_same_root_untouched() {
    let tree = TestTree::new();
    tree.write_source("notes.txt", "hello");
    let weekly = tree.root().join("home.weekly.4");
    fs::create_dir(&weekly).unwrap();
    let (executor, _, _) = executor();

    executor.run(&tree.config(1)).await.unwrap();
    executor.run(&tree.config(1)).await.unwrap();

    assert!(weekly.exists());
    assert_eq!(tree.generation_numbers(), vec![0]);
}
