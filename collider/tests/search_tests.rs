use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use md5_collider::search::{find_block0, find_block1, Search, BLOCK0_CHECKPOINTS};
use md5_collider::{
    compress, find_collision, verify_block0, verify_block1, CancellationToken, ChainingValue,
    CollisionPair, CollisionRequest, Md5Collider, NeverCancel, PathVariant, Progress, Xrng64,
    WANG_COLLISION_0,
};
use rayon::prelude::*;

/// Cancels once it has been polled `limit` times.
struct CancelAfter {
    polls: AtomicU32,
    limit: u32,
}

impl CancelAfter {
    fn new(limit: u32) -> Self {
        Self { polls: AtomicU32::new(0), limit }
    }
}

impl CancellationToken for CancelAfter {
    fn is_cancelled(&self) -> bool {
        self.polls.fetch_add(1, Ordering::Relaxed) >= self.limit
    }
}

#[test]
fn test_cancelled_before_start() {
    let request = CollisionRequest::default().with_seed("never runs");
    let cancel = AtomicBool::new(true);
    assert!(find_collision(&request, &cancel, &Progress::new()).is_none());
}

#[test]
fn test_cancelled_mid_search() {
    let request = CollisionRequest::default().with_seed("collider-seed-1");
    let cancel = CancelAfter::new(100);
    let progress = Progress::new();

    assert!(find_collision(&request, &cancel, &progress).is_none());
    let (current, max) = progress.snapshot();
    assert_eq!(max, BLOCK0_CHECKPOINTS);
    assert!(current <= max);
}

#[test]
fn test_same_seed_same_collision() {
    let request = CollisionRequest::default().with_seed("collider-seed-1");
    let first = find_collision(&request, &NeverCancel, &Progress::new()).unwrap();
    let second = find_collision(&request, &NeverCancel, &Progress::new()).unwrap();

    assert!(first.is_collision());
    assert_eq!(first, second);

    let (h1, h2) = first.md5_digests();
    assert_eq!(h1, h2);
    assert_ne!(first.message1, first.message2);
}

#[test]
fn test_collision_from_custom_ihv() {
    let ihv = ChainingValue::new(0x01234567, 0x1c3d5e00, 0x10203040, 0x04050607);
    let request = CollisionRequest::default().with_seed("custom ihv").with_ihv(ihv);

    let pair = find_collision(&request, &NeverCancel, &Progress::new()).unwrap();
    assert_eq!(pair.ihv, ihv);
    assert!(pair.is_collision());
}

#[test]
fn test_second_block_completes_published_first_block() {
    let example = WANG_COLLISION_0;
    let cv = example.intermediate_state_0();
    assert_eq!(PathVariant::select(cv), PathVariant::Wang);

    let progress = Progress::new();
    let mut rng = Xrng64::from_seed(b"second block");
    let mut search = Search::new(&mut rng, &NeverCancel, &progress);
    let block1 = find_block1(cv, &mut search).unwrap();

    // A fresh second block yields a new collision sharing the published first block.
    let pair = CollisionPair::from_blocks(ChainingValue::STANDARD, &example.m0, &block1);
    assert!(pair.is_collision());
    let (h1, h2) = pair.md5_digests();
    assert_eq!(h1, h2);
}

#[test]
fn test_phases_run_separately() {
    let ihv = ChainingValue::STANDARD;
    let progress = Progress::new();
    let mut rng = Xrng64::from_seed(b"collider-seed-1");
    let mut search = Search::new(&mut rng, &NeverCancel, &progress);

    let block0 = find_block0(ihv, &mut search).unwrap();
    assert!(verify_block0(ihv, &block0));
    let cv = compress(ihv, &block0);
    let block1 = find_block1(cv, &mut search).unwrap();
    assert!(verify_block1(cv, &block1));

    // Both phases share one generator, exactly as the orchestrator runs them.
    let request = CollisionRequest::default().with_seed("collider-seed-1");
    let pair = find_collision(&request, &NeverCancel, &Progress::new()).unwrap();
    assert_eq!(pair, CollisionPair::from_blocks(ihv, &block0, &block1));
}

#[test]
fn test_independent_searches_in_parallel() {
    let pairs: Vec<_> = (0..4)
        .into_par_iter()
        .map(|i| {
            let request = CollisionRequest::default().with_seed(format!("parallel-{i}"));
            find_collision(&request, &NeverCancel, &Progress::new())
        })
        .collect();

    for pair in pairs {
        let pair = pair.unwrap();
        assert!(pair.is_collision());
        let (h1, h2) = pair.md5_digests();
        assert_eq!(h1, h2);
    }
}

#[test]
fn test_stop_from_another_thread() {
    let collider = Md5Collider::new();
    let runner = collider.clone();
    let handle = thread::spawn(move || {
        runner.run(&CollisionRequest::default().with_seed("stop me"))
    });

    // Wait for the search to report a phase, then stop it.
    while collider.progress().1 == 0 && !handle.is_finished() {
        thread::sleep(Duration::from_millis(1));
    }
    collider.stop();

    // A search that won the race must still be a valid collision.
    if let Some(pair) = handle.join().unwrap() {
        assert!(pair.is_collision());
    }
    assert!(collider.is_stopped());
}

#[test]
fn test_shared_token_through_arc() {
    let flag = Arc::new(AtomicBool::new(false));
    let request = CollisionRequest::default().with_seed("arc");
    flag.store(true, Ordering::Relaxed);
    assert!(find_collision(&request, &flag, &Progress::new()).is_none());
}
