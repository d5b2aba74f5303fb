//! Test fixtures for segdeque development.
//!
//! Provides drop-tracked elements ([`Tracked`]), constructors that fail
//! on a chosen call ([`FailingFactory`]), an element whose `Clone` panics
//! ([`PanicOnClone`]), and a [`CountingProvider`] that records every
//! allocation and can be told to refuse further requests.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::alloc::Layout;
use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use segdeque_arena::{Global, MemoryProvider};
use segdeque_core::DequeError;

// ── Drop-tracked elements ───────────────────────────────────────

/// Shared count of live [`Tracked`] / [`PanicOnClone`] values.
#[derive(Clone, Debug, Default)]
pub struct LiveCounter(Rc<Cell<isize>>);

impl LiveCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values created and not yet dropped.
    pub fn live(&self) -> isize {
        self.0.get()
    }

    fn inc(&self) {
        self.0.set(self.0.get() + 1);
    }

    fn dec(&self) {
        self.0.set(self.0.get() - 1);
    }
}

/// An element that bumps a [`LiveCounter`] on creation and clone, and
/// decrements it on drop. Compares by `value` only.
pub struct Tracked {
    pub value: i64,
    counter: LiveCounter,
}

impl Tracked {
    pub fn new(value: i64, counter: &LiveCounter) -> Self {
        counter.inc();
        Self {
            value,
            counter: counter.clone(),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self::new(self.value, &self.counter)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.counter.dec();
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracked({})", self.value)
    }
}

/// An element whose `Clone` panics once a shared countdown reaches zero.
pub struct PanicOnClone {
    pub value: i32,
    countdown: Rc<Cell<usize>>,
    counter: LiveCounter,
}

impl PanicOnClone {
    /// `countdown` is shared by every value and its clones; the clone that
    /// brings it to zero panics.
    pub fn new(value: i32, countdown: &Rc<Cell<usize>>, counter: &LiveCounter) -> Self {
        counter.inc();
        Self {
            value,
            countdown: countdown.clone(),
            counter: counter.clone(),
        }
    }
}

impl Clone for PanicOnClone {
    fn clone(&self) -> Self {
        let left = self.countdown.get().saturating_sub(1);
        self.countdown.set(left);
        if left == 0 {
            panic!("PanicOnClone: clone of {} refused", self.value);
        }
        Self::new(self.value, &self.countdown, &self.counter)
    }
}

impl Drop for PanicOnClone {
    fn drop(&mut self) {
        self.counter.dec();
    }
}

// ── Failing constructors ────────────────────────────────────────

/// Element constructor that refuses its `fail_on`-th call (1-based).
#[derive(Debug)]
pub struct FailingFactory {
    calls: Cell<usize>,
    fail_on: usize,
}

impl FailingFactory {
    pub fn new(fail_on: usize) -> Self {
        Self {
            calls: Cell::new(0),
            fail_on,
        }
    }

    /// A factory that never fails.
    pub fn never() -> Self {
        Self::new(0)
    }

    /// Produce `value`, unless this is the failing call.
    pub fn make<T>(&self, value: T) -> Result<T, DequeError> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call == self.fail_on {
            return Err(DequeError::ElementConstruction {
                reason: format!("factory refused call {call}"),
            });
        }
        Ok(value)
    }

    /// Number of calls so far, including the failed one.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

// ── Counting memory provider ────────────────────────────────────

#[derive(Debug, Default)]
struct ProviderLog {
    allocations: Cell<usize>,
    deallocations: Cell<usize>,
    live_bytes: Cell<usize>,
    /// Total allocations permitted before refusing.
    limit: Cell<Option<usize>>,
}

/// Memory provider that counts requests and can simulate exhaustion.
///
/// Clones share one log. With [`fresh_on_copy`](Self::fresh_on_copy),
/// `select_on_copy` hands copies a provider with a new, empty log.
#[derive(Clone, Debug, Default)]
pub struct CountingProvider {
    log: Rc<ProviderLog>,
    fresh_on_copy: bool,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose copies start their own log.
    pub fn fresh_on_copy() -> Self {
        Self {
            log: Rc::default(),
            fresh_on_copy: true,
        }
    }

    /// Allow `n` more allocations, then refuse.
    pub fn fail_after(&self, n: usize) {
        self.log.limit.set(Some(self.log.allocations.get() + n));
    }

    /// Lift any allocation limit.
    pub fn allow_all(&self) {
        self.log.limit.set(None);
    }

    pub fn allocations(&self) -> usize {
        self.log.allocations.get()
    }

    pub fn deallocations(&self) -> usize {
        self.log.deallocations.get()
    }

    /// Allocations not yet returned.
    pub fn live_allocations(&self) -> usize {
        self.allocations() - self.deallocations()
    }

    pub fn live_bytes(&self) -> usize {
        self.log.live_bytes.get()
    }

    /// Whether both providers record into the same log.
    pub fn shares_log_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.log, &other.log)
    }
}

#[allow(unsafe_code)]
impl MemoryProvider for CountingProvider {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, DequeError> {
        if let Some(limit) = self.log.limit.get() {
            if self.log.allocations.get() >= limit {
                return Err(DequeError::AllocationFailed {
                    bytes: layout.size(),
                });
            }
        }
        let ptr = Global.allocate(layout)?;
        self.log.allocations.set(self.log.allocations.get() + 1);
        self.log
            .live_bytes
            .set(self.log.live_bytes.get() + layout.size());
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.log.deallocations.set(self.log.deallocations.get() + 1);
        self.log
            .live_bytes
            .set(self.log.live_bytes.get() - layout.size());
        // SAFETY: every pointer handed out came from `Global` with `layout`.
        unsafe { Global.deallocate(ptr, layout) }
    }

    fn select_on_copy(&self) -> Self {
        if self.fresh_on_copy {
            Self::fresh_on_copy()
        } else {
            self.clone()
        }
    }
}
