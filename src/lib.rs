//! # `tether` - Checked Indirect References
//!
//! A small toolkit for referring to heap-resident objects through compact,
//! copyable handles instead of pointers. A [`SlotPool<T>`] owns a fixed
//! number of storage slots; [`Handle<T>`] is a packed 64-bit value naming
//! one allocation in one pool. Dereferencing a handle whose object has been
//! freed (or whose slot has since been reused) is *detected*, never
//! undefined behavior.
//!
//! ## Safety Guarantees
//!
//! - **Stale-handle detection**: every slot carries a generation value
//!   written at allocation time. Resolution checks occupancy *and*
//!   generation equality, so a handle to a freed-then-reused slot does not
//!   alias the new occupant.
//! - **Typed handles**: `Handle<Foo>` and `Handle<Bar>` are unrelated
//!   types; mixing them is a compile error, not a runtime check.
//! - **No hidden state**: a handle carries no allocator pointer. Resolution
//!   is explicit — the pool is passed at the call site, and it is the sole
//!   authority on validity.
//!
//! ## Access Tiers
//!
//! Three ways to reach the object behind a handle, ordered by how loudly
//! they fail:
//!
//! 1. [`SlotPool::get`] / [`SlotPool::get_mut`] — returns `Option`;
//!    the recoverable path for callers that expect staleness.
//! 2. Indexing (`&pool[handle]`) — panics on an invalid handle; for
//!    callers that have already verified the handle and want bugs loud.
//! 3. [`SlotPool::with`] / [`SlotPool::with_mut`] — runs a closure only
//!    while the object is live, silently skipping it otherwise. The
//!    recommended guarded pattern: the reference never escapes the call.
//!
//! ## Concurrency
//!
//! Pools are single-threaded by design: there is no internal
//! synchronization, and none is needed — mutation requires `&mut SlotPool`,
//! so Rust's borrow rules already provide the coarse-grained exclusion a
//! shared pool would require (wrap it in a `Mutex` to share it). Handles
//! themselves are plain `Copy` data and may cross threads freely.
//!
//! ## Example
//!
//! ```rust
//! use tether::SlotPool;
//!
//! let mut pool = SlotPool::with_capacity(8);
//!
//! let h = pool.allocate("hello");
//! assert_eq!(pool.get(h), Some(&"hello"));
//!
//! pool.deallocate(h);
//! assert_eq!(pool.get(h), None);
//!
//! // The slot may be reused, but the stale handle stays dead.
//! let fresh = pool.allocate("world");
//! assert_eq!(h.index(), fresh.index());
//! assert_eq!(pool.get(h), None);
//! assert_eq!(pool.get(fresh), Some(&"world"));
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod handle;
pub mod pool;

pub use handle::Handle;
pub use pool::{CapacityError, SlotPool};

// Compile-time layout assertions.
const _: () = {
    use core::mem;

    // A handle is exactly one machine word of payload, regardless of `T`:
    // the type parameter is phantom and must not widen or re-align it.
    assert!(mem::size_of::<Handle<u8>>() == mem::size_of::<u64>());
    assert!(mem::size_of::<Handle<[u128; 4]>>() == mem::size_of::<u64>());
    assert!(mem::align_of::<Handle<u8>>() == mem::align_of::<u64>());
};
