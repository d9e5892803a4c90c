// src/ring_buffer.rs
//! Bounded in-memory advisory sink.
//!
//! Keeps the most recent collision notices in a fixed-size FIFO buffer so
//! tests and diagnostics endpoints can inspect them without a `tracing`
//! subscriber. Oldest notices are evicted first; evictions are counted.
//!
//! # Design Principles
//!
//! - **Bounded memory**: capacity fixed at construction, no growth
//! - **Per-entry caps**: names and rendered text are truncated at a byte limit
//! - **RwLock-based**: concurrent readers, exclusive writers, poison-tolerant
//! - **Shared state**: clones observe and feed the same buffer
//!
//! # Example
//!
//! ```rust
//! use standard_errors::{ErrorDefinition, Registry, RingBufferSink};
//! use std::sync::Arc;
//!
//! let sink = RingBufferSink::new(64);
//! let mut registry = Registry::builder().sink(Arc::new(sink.clone())).build();
//!
//! let def = ErrorDefinition::new("Conflict", "Conflict")
//!     .domain("app")
//!     .title("Conflict")
//!     .namespace("orders");
//! registry.register(def.clone())?;
//! registry.register(def)?;
//!
//! let recent = sink.get_recent(1);
//! assert_eq!(recent[0].name.as_ref(), "Conflict");
//! # Ok::<(), standard_errors::RaisedError>(())
//! ```

use crate::advisory::{Advisory, AdvisoryKind, AdvisorySink};
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::UNIX_EPOCH;

/// Default per-entry byte cap for names and rendered text.
pub const DEFAULT_MAX_ENTRY_BYTES: usize = 512;

/// One retained advisory.
///
/// String data is `Arc<str>` so reads clone by refcount.
#[derive(Clone, Debug)]
pub struct AdvisoryEntry {
    /// Unix timestamp (seconds) the notice was raised.
    pub timestamp: u64,
    /// Trigger.
    pub kind: AdvisoryKind,
    /// Colliding error name.
    pub name: Arc<str>,
    /// Namespace of the incoming definition.
    pub namespace: Arc<str>,
    /// Namespace already owning the name, for shadowing notices.
    pub existing_namespace: Option<Arc<str>>,
    /// Rendered notice text.
    pub message: Arc<str>,
}

/// Fixed-capacity circular storage.
struct RingBuffer {
    slots: Box<[Option<AdvisoryEntry>]>,
    head: usize,
    tail: usize,
    len: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Returns the evicted entry when the buffer was full.
    fn push(&mut self, entry: AdvisoryEntry) -> Option<AdvisoryEntry> {
        let cap = self.slots.len();
        let evicted = self.slots[self.tail].replace(entry);
        self.tail = (self.tail + 1) % cap;
        if self.len < cap {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % cap;
        }
        evicted
    }

    /// Oldest to newest.
    fn iter(&self) -> impl DoubleEndedIterator<Item = &AdvisoryEntry> {
        let cap = self.slots.len();
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % cap].as_ref())
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

/// Advisory sink retaining the most recent notices.
pub struct RingBufferSink {
    buffer: Arc<RwLock<RingBuffer>>,
    capacity: usize,
    max_entry_bytes: usize,
    eviction_count: Arc<AtomicU64>,
}

impl RingBufferSink {
    /// Create a sink holding at most `capacity` notices (minimum one).
    pub fn new(capacity: usize) -> Self {
        Self::with_entry_cap(capacity, DEFAULT_MAX_ENTRY_BYTES)
    }

    /// Create a sink with an explicit per-entry byte cap.
    pub fn with_entry_cap(capacity: usize, max_entry_bytes: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Arc::new(RwLock::new(RingBuffer::new(capacity))),
            capacity,
            max_entry_bytes,
            eviction_count: Arc::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    fn read_buffer(&self) -> RwLockReadGuard<'_, RingBuffer> {
        match self.buffer.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[inline]
    fn write_buffer(&self) -> RwLockWriteGuard<'_, RingBuffer> {
        match self.buffer.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn entry_for(&self, advisory: &Advisory) -> AdvisoryEntry {
        let cap = self.max_entry_bytes;
        AdvisoryEntry {
            timestamp: advisory
                .timestamp
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            kind: advisory.kind,
            name: Arc::from(truncate_to_bytes(&advisory.name, cap).as_ref()),
            namespace: Arc::from(truncate_to_bytes(advisory.namespace.as_str(), cap).as_ref()),
            existing_namespace: advisory
                .existing_namespace
                .as_ref()
                .map(|ns| Arc::from(truncate_to_bytes(ns.as_str(), cap).as_ref())),
            message: Arc::from(truncate_to_bytes(&advisory.to_string(), cap).as_ref()),
        }
    }

    /// The `count` most recent notices, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<AdvisoryEntry> {
        self.read_buffer().iter().rev().take(count).cloned().collect()
    }

    /// Every retained notice, newest first.
    pub fn get_all(&self) -> Vec<AdvisoryEntry> {
        self.read_buffer().iter().rev().cloned().collect()
    }

    /// Retained notices matching `predicate`, oldest first.
    ///
    /// ```rust
    /// # use standard_errors::{RingBufferSink, AdvisoryKind};
    /// # let sink = RingBufferSink::new(8);
    /// let shadowed = sink.get_filtered(|e| e.kind == AdvisoryKind::Shadowed);
    /// assert!(shadowed.is_empty());
    /// ```
    pub fn get_filtered<F>(&self, predicate: F) -> Vec<AdvisoryEntry>
    where
        F: Fn(&AdvisoryEntry) -> bool,
    {
        self.read_buffer().iter().filter(|e| predicate(e)).cloned().collect()
    }

    /// Number of retained notices.
    #[inline]
    pub fn len(&self) -> usize {
        self.read_buffer().len
    }

    /// Check whether nothing is retained.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notices dropped to make room since creation.
    #[inline]
    pub fn eviction_count(&self) -> u64 {
        self.eviction_count.load(Ordering::Relaxed)
    }

    /// Drop every retained notice. The eviction count is kept.
    pub fn clear(&self) {
        self.write_buffer().clear();
    }

    /// Maximum number of retained notices.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check whether the next notice will evict one.
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }
}

impl AdvisorySink for RingBufferSink {
    fn notify(&self, advisory: &Advisory) {
        let entry = self.entry_for(advisory);
        if self.write_buffer().push(entry).is_some() {
            self.eviction_count.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Clone for RingBufferSink {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
            capacity: self.capacity,
            max_entry_bytes: self.max_entry_bytes,
            eviction_count: Arc::clone(&self.eviction_count),
        }
    }
}

/// Truncate to at most `max_bytes`, on a char boundary, marking the cut.
fn truncate_to_bytes(s: &str, max_bytes: usize) -> Cow<'_, str> {
    const MARK: &str = "...";
    if s.len() <= max_bytes {
        return Cow::Borrowed(s);
    }
    if max_bytes <= MARK.len() {
        return Cow::Borrowed(&MARK[..max_bytes]);
    }

    let mut idx = max_bytes - MARK.len();
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    let mut out = String::with_capacity(idx + MARK.len());
    out.push_str(&s[..idx]);
    out.push_str(MARK);
    Cow::Owned(out)
}
