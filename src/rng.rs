//! Seeded random streams, one per named consumer.
//!
//! Each stream is derived from the master generator the first time it is asked
//! for, so replays match as long as the seed and the order in which streams are
//! first requested stay the same.

use std::collections::BTreeMap;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct RngManager {
    master: ChaCha8Rng,
    streams: BTreeMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: BTreeMap::new(),
        }
    }

    pub fn stream(&mut self, name: &str) -> StreamRng<'_> {
        let master = &mut self.master;
        let inner = self
            .streams
            .entry(name.to_string())
            .or_insert_with(|| ChaCha8Rng::seed_from_u64(master.next_u64()));
        StreamRng { inner }
    }
}

pub struct StreamRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl RngCore for StreamRng<'_> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}
