use std::thread;
use std::time::{Duration, Instant};

use md5_collider::{md5_to_hex, print_box, CollisionRequest, Md5Collider};

fn main() {
    env_logger::init();
    print_box("Generate an MD5 Collision");

    let seed = std::env::args().nth(1).unwrap_or_else(|| "demo".to_string());
    let request = CollisionRequest::default().with_seed(seed.as_bytes());
    println!("Seed: {:?}\n", seed);

    let collider = Md5Collider::new();
    let runner = collider.clone();
    let start = Instant::now();
    let search = thread::spawn(move || runner.run(&request));

    // Poll the shared progress counters the way a UI would.
    while !search.is_finished() {
        let (current, max) = collider.progress();
        println!("  [{:>6.1} s] checkpoint {:>2}/{}", start.elapsed().as_secs_f64(), current, max);
        thread::sleep(Duration::from_millis(250));
    }

    let pair = match search.join() {
        Ok(Some(pair)) => pair,
        Ok(None) => {
            println!("Search stopped");
            return;
        }
        Err(_) => {
            println!("Search thread panicked");
            return;
        }
    };

    println!("\nFound in {:.3} s\n", start.elapsed().as_secs_f64());
    println!("Message 1:");
    for chunk in pair.message1.chunks(32) {
        println!("  {}", md5_to_hex(chunk));
    }
    println!("Message 2:");
    for chunk in pair.message2.chunks(32) {
        println!("  {}", md5_to_hex(chunk));
    }

    let (h1, h2) = pair.md5_digests();
    println!("\nMD5(message 1) = {}", md5_to_hex(&h1));
    println!("MD5(message 2) = {}", md5_to_hex(&h2));
    println!("\n{} Collision: {}",
             if pair.is_collision() { "✓" } else { "✗" },
             if pair.is_collision() { "VERIFIED" } else { "FAILED" });
}
