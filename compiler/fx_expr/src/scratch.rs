//! Per-context pool of reusable string buffers.
//!
//! Formatting a value for a trace event needs a temporary buffer. Buffers
//! are taken from the evaluation context's pool and handed back when the
//! guard is dropped, which covers early returns, `?` propagation and
//! unwinding alike.

use std::cell::{Cell, RefCell};
use std::ops::{Deref, DerefMut};

/// Pool of scratch buffers owned by one evaluation context.
#[derive(Default)]
pub struct ScratchBuffers {
    free: RefCell<Vec<String>>,
    in_use: Cell<usize>,
}

impl ScratchBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an empty buffer from the pool, allocating if none is free.
    pub fn acquire(&self) -> ScratchBuffer<'_> {
        let buf = self.free.borrow_mut().pop().unwrap_or_default();
        self.in_use.set(self.in_use.get().saturating_add(1));
        ScratchBuffer { pool: self, buf }
    }

    /// Number of buffers currently handed out.
    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }

    /// Number of buffers waiting in the pool.
    pub fn available(&self) -> usize {
        self.free.borrow().len()
    }
}

/// A buffer borrowed from a [`ScratchBuffers`] pool.
pub struct ScratchBuffer<'a> {
    pool: &'a ScratchBuffers,
    buf: String,
}

impl Deref for ScratchBuffer<'_> {
    type Target = String;

    fn deref(&self) -> &String {
        &self.buf
    }
}

impl DerefMut for ScratchBuffer<'_> {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.buf
    }
}

impl Drop for ScratchBuffer<'_> {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        self.pool.free.borrow_mut().push(buf);
        self.pool.in_use.set(self.pool.in_use.get().saturating_sub(1));
    }
}
