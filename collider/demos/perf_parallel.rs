use std::time::Instant;

use rayon::prelude::*;
use md5_collider::{find_collision, print_box, CollisionRequest, NeverCancel, PathVariant, Progress};
use md5_collider::md5::compress;

fn main() {
    println!("=== Parallel Collision Search (using Rayon) ===\n");

    let num_threads = rayon::current_num_threads();
    println!("System information:");
    println!("  CPU cores available: {}", num_threads);
    println!();

    let count = 2 * num_threads;
    println!("Searching {} independent collisions", count);
    println!();

    // ═══════════════════════════════════════════════════════════
    // Sequential baseline
    // ═══════════════════════════════════════════════════════════
    print_box("SEQUENTIAL (Single-threaded Baseline)");

    let start = Instant::now();
    for i in 0..num_threads {
        let request = CollisionRequest::default().with_seed(format!("perf-{}", i));
        let _ = find_collision(&request, &NeverCancel, &Progress::new());
    }
    let seq_duration = start.elapsed();
    let seq_per_collision = seq_duration.as_secs_f64() / num_threads as f64;
    println!("  Collisions:    {}", num_threads);
    println!("  Total time:    {:.3} seconds", seq_duration.as_secs_f64());
    println!("  Per collision: {:.3} seconds", seq_per_collision);
    println!();

    // ═══════════════════════════════════════════════════════════
    // Parallel search (one seed per task)
    // ═══════════════════════════════════════════════════════════
    print_box("PARALLEL (Multi-threaded with Rayon)");

    let start = Instant::now();
    let results: Vec<_> = (0..count)
        .into_par_iter()
        .map(|i| {
            let request = CollisionRequest::default().with_seed(format!("perf-{}", i));
            let started = Instant::now();
            let pair = find_collision(&request, &NeverCancel, &Progress::new());
            (pair, started.elapsed())
        })
        .collect();
    let par_duration = start.elapsed();
    let par_per_collision = par_duration.as_secs_f64() / count as f64;

    println!("  Collisions:    {}", count);
    println!("  Total time:    {:.3} seconds", par_duration.as_secs_f64());
    println!("  Per collision: {:.3} seconds", par_per_collision);
    println!("  Speedup:       {:.2}x", seq_per_collision / par_per_collision);
    println!();

    println!("Per-seed results:");
    for (i, (pair, elapsed)) in results.iter().enumerate() {
        match pair {
            Some(pair) => {
                let cv = compress(pair.ihv, &first_block(&pair.message1));
                println!("  perf-{:<3} {:>8.3} s  {:<10} {}",
                         i, elapsed.as_secs_f64(), PathVariant::select(cv).to_string(),
                         if pair.is_collision() { "✓" } else { "✗" });
            }
            None => println!("  perf-{:<3} stopped", i),
        }
    }
}

fn first_block(message: &[u8; 128]) -> [u32; 16] {
    let mut bytes = [0u8; 64];
    bytes.copy_from_slice(&message[..64]);
    md5_collider::md5::block_from_le_bytes(&bytes)
}
