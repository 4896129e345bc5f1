//! # MD5 Collider
//!
//! Identical-prefix collision search for MD5 after Wang and Stevens.
//!
//! Given a chaining value and a seed, the search finds two 128-byte messages
//! that differ in a handful of fixed bits yet leave MD5 in the same state.
//! Any common prefix that ends in that chaining value, and any common suffix,
//! can be wrapped around the pair.
//!
//! ## Modules
//!
//! - **md5**: compression function, step primitives and hashing helpers
//! - **search**: the two near-collision block searches and the path variants
//! - **collider**: request type, [`find_collision`] and the [`Md5Collider`] handle
//! - **collision**: message differences, verification and the result pair
//! - **control**: cancellation and progress reporting
//!
//! ## Security Warning
//!
//! MD5 is cryptographically broken. This is for educational use only.
//!
//! ## Examples
//!
//! ```rust
//! use md5_collider::{md5, md5_to_hex};
//!
//! let hash = md5(b"Hello, world!");
//! assert_eq!(md5_to_hex(&hash), "6cd3556deb0da54bca060b4c39479839");
//! ```

pub mod collider;
pub mod collision;
pub mod control;
pub mod error;
pub mod mask;
pub mod md5;
pub mod rng;
pub mod search;
pub mod state;

// Re-export commonly used items
pub use collider::{find_collision, CollisionRequest, Md5Collider};
pub use collision::{
    verify_block0, verify_block1, CollisionPair, CollisionReport, WangCollisionExample,
    BLOCK0_MESSAGE_DELTA, BLOCK0_OUTPUT_DELTA, BLOCK1_MESSAGE_DELTA, WANG_COLLISION_0,
    WANG_COLLISION_1,
};
pub use control::{CancellationToken, NeverCancel, Progress};
pub use error::{ColliderError, Result};
pub use md5::{
    compress, hash as md5, hash_with_iv as md5_with_iv, to_hex as md5_to_hex, ChainingValue,
    MessageBlock,
};
pub use rng::Xrng64;
pub use search::PathVariant;

/// Print text in a nice box with automatic sizing
pub fn print_box(text: &str) {
    let text_len = text.chars().count();
    let total_width = text_len + 4; // 2 spaces padding on each side

    println!("\n╔{}╗", "═".repeat(total_width));
    println!("║  {}  ║", text);
    println!("╚{}╝\n", "═".repeat(total_width));
}
