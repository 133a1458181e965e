//! Reusable scratch buffers for primitive reads.
//!
//! Primitive values are staged in an 8-byte buffer before the big-endian
//! conversion. [`ScratchPool`] hands those buffers out and takes them back
//! so a busy decode loop does not allocate per primitive. Buffers are
//! returned automatically when the [`ScratchBuffer`] guard drops.

use crate::error::{Error, Result};
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Size of every scratch buffer; fits the widest primitive
pub const SCRATCH_SIZE: usize = 8;

type Block = Box<[u8; SCRATCH_SIZE]>;

#[derive(Debug, Default)]
struct PoolState {
    free: Vec<Block>,
    outstanding: usize,
}

/// Bounded, thread-safe pool of scratch buffers
#[derive(Debug)]
pub struct ScratchPool {
    state: Mutex<PoolState>,
    capacity: usize,
}

impl ScratchPool {
    /// Creates a pool that allows up to `capacity` buffers in use at once.
    ///
    /// Buffers are allocated lazily on first demand.
    pub fn new(capacity: usize) -> Self {
        Self::with_preallocated(capacity, 0)
    }

    /// Creates a pool with `warm` buffers allocated up front
    pub fn with_preallocated(capacity: usize, warm: usize) -> Self {
        let free = (0..warm.min(capacity))
            .map(|_| Box::new([0u8; SCRATCH_SIZE]))
            .collect();
        Self {
            state: Mutex::new(PoolState {
                free,
                outstanding: 0,
            }),
            capacity,
        }
    }

    /// Maximum number of buffers that can be in use at once
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffers currently handed out
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// Number of allocated buffers waiting in the free list
    pub fn available(&self) -> usize {
        self.lock().free.len()
    }

    /// Takes a zeroed buffer from the pool.
    ///
    /// Fails with [`Error::PoolExhaustion`] when `capacity` buffers are
    /// already in use.
    pub fn acquire(&self) -> Result<ScratchBuffer<'_>> {
        let mut state = self.lock();

        let block = match state.free.pop() {
            Some(block) => block,
            None if state.outstanding < self.capacity => {
                trace!(
                    "Allocating scratch buffer ({} outstanding)",
                    state.outstanding
                );
                Box::new([0u8; SCRATCH_SIZE])
            }
            None => {
                debug!("Scratch pool exhausted at {} buffers", self.capacity);
                return Err(Error::PoolExhaustion {
                    capacity: self.capacity,
                });
            }
        };

        state.outstanding += 1;
        Ok(ScratchBuffer {
            pool: self,
            block: Some(block),
        })
    }

    /// Returns a buffer to the pool. Equivalent to dropping the guard.
    pub fn release(&self, buffer: ScratchBuffer<'_>) {
        drop(buffer);
    }

    fn put_back(&self, mut block: Block) {
        block.fill(0);
        let mut state = self.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        state.free.push(block);
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A scratch buffer on loan from a [`ScratchPool`]
#[derive(Debug)]
pub struct ScratchBuffer<'a> {
    pool: &'a ScratchPool,
    block: Option<Block>,
}

impl Deref for ScratchBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.block
            .as_deref()
            .map_or_else(Default::default, |block| block.as_slice())
    }
}

impl DerefMut for ScratchBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.block
            .as_deref_mut()
            .map_or_else(Default::default, |block| block.as_mut_slice())
    }
}

impl Drop for ScratchBuffer<'_> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            self.pool.put_back(block);
        }
    }
}
