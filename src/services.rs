//! Named component lookup.
//!
//! The sink is configured with names, not objects: anodes and the random
//! source are looked up through a [`ComponentResolver`] when the sink is
//! built. [`Registry`] is a plain in-memory resolver.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;

use crate::geometry::Anode;

// ─── Random source ──────────────────────────────────────────────────────────

/// A source of uniformly distributed random numbers, shared between
/// components.
pub trait RandomSource: Send + Sync {
    /// Uniform deviate in `[0, 1)`.
    fn uniform(&self) -> f64;

    /// Uniform deviate in `[lo, hi)`.
    fn range(&self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.uniform()
    }

    /// Normal deviate (Box–Muller).
    fn normal(&self, mean: f64, sigma: f64) -> f64 {
        let u1 = self.uniform().max(f64::MIN_POSITIVE);
        let u2 = self.uniform();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * core::f64::consts::PI * u2).cos();
        mean + sigma * z
    }
}

/// SplitMix64 generator with atomic state.
#[derive(Debug)]
pub struct SplitMix64 {
    state: AtomicU64,
}

impl SplitMix64 {
    /// Generator seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self { state: AtomicU64::new(seed) }
    }

    fn next_u64(&self) -> u64 {
        let mut z = self
            .state
            .fetch_add(0x9E37_79B9_7F4A_7C15, Ordering::Relaxed)
            .wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl RandomSource for SplitMix64 {
    fn uniform(&self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

// ─── Resolver ───────────────────────────────────────────────────────────────

/// Looks up configured components by name.
pub trait ComponentResolver {
    /// Anode type produced.
    type Anode: Anode;

    /// The anode named `name`.
    fn find_anode(&self, name: &str) -> Option<Arc<Self::Anode>>;

    /// The random source named `name`.
    fn find_random(&self, name: &str) -> Option<Arc<dyn RandomSource>>;
}

/// In-memory name → component table.
pub struct Registry<A: Anode> {
    anodes: HashMap<String, Arc<A>>,
    randoms: HashMap<String, Arc<dyn RandomSource>>,
}

impl<A: Anode> Registry<A> {
    /// Empty registry.
    pub fn new() -> Self {
        Self { anodes: HashMap::new(), randoms: HashMap::new() }
    }

    /// Register an anode under `name`.
    pub fn add_anode(&mut self, name: impl Into<String>, anode: A) -> &mut Self {
        self.anodes.insert(name.into(), Arc::new(anode));
        self
    }

    /// Register a random source under `name`.
    pub fn add_random(&mut self, name: impl Into<String>, rng: Arc<dyn RandomSource>) -> &mut Self {
        self.randoms.insert(name.into(), rng);
        self
    }
}

impl<A: Anode> Default for Registry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Anode> ComponentResolver for Registry<A> {
    type Anode = A;

    fn find_anode(&self, name: &str) -> Option<Arc<A>> {
        self.anodes.get(name).cloned()
    }

    fn find_random(&self, name: &str) -> Option<Arc<dyn RandomSource>> {
        self.randoms.get(name).cloned()
    }
}
