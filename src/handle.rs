//! `Handle` — a compact, copyable reference that owns nothing.
//!
//! A handle packs a slot index and a generation into a single `u64`: index
//! in the high 32 bits, generation in the low 32. The all-zero encoding is
//! the null sentinel; a pool never issues it, because generations start at
//! 1 and skip 0 on wraparound.
//!
//! Handles are plain data. Copying, comparing, hashing, or discarding one
//! has no effect on the object it names; validity is decided exclusively by
//! the pool that issued it (see [`SlotPool::get`](crate::SlotPool::get)).

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

const INDEX_SHIFT: u32 = 32;
const GENERATION_MASK: u64 = 0xFFFF_FFFF;

/// A typed reference to one allocation in a [`SlotPool<T>`](crate::SlotPool).
///
/// The type parameter ties the handle to one element type, so a
/// `Handle<Foo>` cannot be compared with or resolved against a pool of
/// `Bar` — that is rejected at compile time. The marker is a
/// function-pointer phantom: handles are `Send`, `Sync`, and covariant in
/// `T` no matter what `T` is.
///
/// Equality, ordering, and hashing are defined over the raw 64-bit
/// encoding, making handles cheap keys for sets and maps.
pub struct Handle<T> {
    raw: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// The canonical invalid handle: the all-zero encoding.
    ///
    /// Never returned by a successful allocation. Resolving it always
    /// fails; deallocating it is a no-op.
    pub const NULL: Self = Self {
        raw: 0,
        _marker: PhantomData,
    };

    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self {
            raw: ((index as u64) << INDEX_SHIFT) | generation as u64,
            _marker: PhantomData,
        }
    }

    /// Returns `true` if this is the null sentinel.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.raw == 0
    }

    /// The slot index encoded in the high 32 bits.
    #[inline]
    pub const fn index(self) -> u32 {
        (self.raw >> INDEX_SHIFT) as u32
    }

    /// The generation encoded in the low 32 bits.
    #[inline]
    pub const fn generation(self) -> u32 {
        (self.raw & GENERATION_MASK) as u32
    }

    /// The raw 64-bit encoding, for packing handles into external storage.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.raw
    }

    /// Rebuilds a handle from its raw encoding.
    ///
    /// Safe even for forged or corrupted values: a pool rejects any
    /// encoding it did not issue.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }
}

// Manual impls: the derived ones would bound `T`, and a handle's identity
// is its encoding, not its target.

impl<T> Clone for Handle<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Default for Handle<T> {
    #[inline]
    fn default() -> Self {
        Self::NULL
    }
}

impl<T> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for Handle<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Handle::NULL")
        } else {
            f.debug_struct("Handle")
                .field("index", &self.index())
                .field("generation", &self.generation())
                .finish()
        }
    }
}
