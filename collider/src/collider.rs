//! Two-block collision search from a host's point of view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

use crate::collision::CollisionPair;
use crate::control::{CancellationToken, Progress};
use crate::error::Result;
use crate::md5::{compress, ChainingValue};
use crate::rng::Xrng64;
use crate::search::{find_block0, find_block1, Search};

/// Inputs of one collision search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionRequest {
    /// Seed for the bit generator; equal seeds give equal results
    pub seed: Vec<u8>,
    /// Chaining value both messages start from
    pub ihv: ChainingValue,
}

impl Default for CollisionRequest {
    fn default() -> Self {
        Self {
            seed: Vec::new(),
            ihv: ChainingValue::STANDARD,
        }
    }
}

impl CollisionRequest {
    pub fn with_seed(mut self, seed: impl Into<Vec<u8>>) -> Self {
        self.seed = seed.into();
        self
    }

    pub fn with_ihv(mut self, ihv: ChainingValue) -> Self {
        self.ihv = ihv;
        self
    }

    /// Decodes host input: any seed and a 16-byte little-endian chaining value.
    ///
    /// # Errors
    /// [`ColliderError::InvalidChainingValueLength`](crate::ColliderError::InvalidChainingValueLength)
    /// when `ihv` is not 16 bytes.
    pub fn from_bytes(seed: &[u8], ihv: &[u8]) -> Result<Self> {
        Ok(Self {
            seed: seed.to_vec(),
            ihv: ChainingValue::try_from_slice(ihv)?,
        })
    }
}

/// Runs both phases and assembles the collision.
///
/// The generator is seeded once from `request.seed` and shared by both
/// phases, so the result depends only on the request. Returns `None` if
/// `cancel` fires first.
///
/// # Example
///
/// ```rust,no_run
/// use md5_collider::{find_collision, CollisionRequest, NeverCancel, Progress};
///
/// let request = CollisionRequest::default().with_seed("example");
/// let pair = find_collision(&request, &NeverCancel, &Progress::new()).unwrap();
/// assert!(pair.is_collision());
/// ```
pub fn find_collision<C: CancellationToken + ?Sized>(
    request: &CollisionRequest,
    cancel: &C,
    progress: &Progress,
) -> Option<CollisionPair> {
    let mut rng = Xrng64::from_seed(&request.seed);
    let mut search = Search::new(&mut rng, cancel, progress);

    let block0 = find_block0(request.ihv, &mut search)?;
    let block1 = find_block1(compress(request.ihv, &block0), &mut search)?;

    let pair = CollisionPair::from_blocks(request.ihv, &block0, &block1);
    info!("collision found: {:08x?}", pair.chaining_value.words());
    Some(pair)
}

/// Host handle around [`find_collision`].
///
/// Clones share the stop flag and progress counters, so one clone can run
/// the search while another stops or watches it.
#[derive(Debug, Clone, Default)]
pub struct Md5Collider {
    stop: Arc<AtomicBool>,
    progress: Arc<Progress>,
}

impl Md5Collider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one search.
    ///
    /// A stop requested earlier, even before this call, makes it return
    /// `None`; call [`reset`](Self::reset) to search again.
    pub fn run(&self, request: &CollisionRequest) -> Option<CollisionPair> {
        find_collision(request, &self.stop, &self.progress)
    }

    /// Asks the current or next search to return `None` at its next check.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Withdraws a stop request.
    pub fn reset(&self) {
        self.stop.store(false, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// `(current, max)` checkpoint of the running phase.
    pub fn progress(&self) -> (u32, u32) {
        self.progress.snapshot()
    }
}
