use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::info;
use rand::Rng;

use md5_collider::md5::parse_hex;
use md5_collider::{print_box, ChainingValue, CollisionRequest, Md5Collider};

#[derive(Debug, Parser)]
#[command(
    name = "md5-collider",
    about = "Find two 128-byte messages with the same MD5 chaining value.",
    after_help = "\
Both messages start from IHV, so any common prefix ending in IHV and any
common suffix can be wrapped around them. Equal seeds give equal results.")
]
struct Opt {
    /// seed for the search; a random one is drawn when omitted
    #[arg(short, long)]
    seed: Option<String>,

    /// starting chaining value as 32 hex digits (little-endian digest layout)
    #[arg(long, value_parser = parse_ihv, default_value = "0123456789abcdeffedcba9876543210")]
    ihv: ChainingValue,

    /// stop the search after this many seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// write the collision report as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,
}

fn parse_ihv(text: &str) -> md5_collider::Result<ChainingValue> {
    ChainingValue::try_from_slice(&parse_hex(text)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let options = Opt::parse();

    print_box("MD5 Identical-Prefix Collision Search");
    println!("⚠️  Educational Use Only - MD5 is Cryptographically Broken ⚠️");
    println!();

    // Without a seed every run searches a different part of the space.
    let seed = options
        .seed
        .unwrap_or_else(|| format!("{:016x}", rand::rng().random::<u64>()));
    let request = CollisionRequest::default()
        .with_seed(seed.as_bytes())
        .with_ihv(options.ihv);

    println!("Seed: {}", seed);
    println!("IHV:  {:08x?}", request.ihv.words());
    println!();

    let collider = Md5Collider::new();
    if let Some(timeout) = options.timeout.map(Duration::from_secs) {
        let watchdog = collider.clone();
        thread::spawn(move || {
            thread::sleep(timeout);
            info!("timeout of {:?} reached, stopping search", timeout);
            watchdog.stop();
        });
    }

    let start = Instant::now();
    let Some(pair) = collider.run(&request) else {
        let (current, max) = collider.progress();
        println!("✗ Search stopped after {:.3} s (checkpoint {}/{})",
                 start.elapsed().as_secs_f64(), current, max);
        return Ok(());
    };
    let elapsed = start.elapsed();

    let report = pair.report();
    println!("Found in {:.3} s", elapsed.as_secs_f64());
    println!();
    println!("Message 1: {}", report.message1);
    println!("Message 2: {}", report.message2);
    println!("Chaining value: {}", report.chaining_value);
    if request.ihv == ChainingValue::STANDARD {
        println!("MD5(message 1) = {}", report.md5_message1);
        println!("MD5(message 2) = {}", report.md5_message2);
    }
    println!();
    println!("{} Collision: {}",
             if pair.is_collision() { "✓" } else { "✗" },
             if pair.is_collision() { "VERIFIED" } else { "FAILED" });

    if let Some(path) = options.json {
        fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}
