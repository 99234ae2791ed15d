//! `SlotPool` — a fixed-capacity slot allocator issuing generational handles.
//!
//! The pool owns an array of storage slots sized once at construction; it
//! never grows and never moves a live object. Allocation is a deterministic
//! first-fit scan (lowest free index wins), tracked by an occupancy bitset.
//! Each slot stores the generation it was last allocated under, and every
//! resolution compares the handle's generation against it, so a stale
//! handle to a reused slot is rejected instead of aliasing the new
//! occupant.
//!
//! Generations come from a pool-wide 32-bit counter that starts at 1,
//! increments on every successful allocation, and skips 0 on wraparound.
//! After `2^32 - 1` allocations the counter has wrapped and a sufficiently
//! old handle *can* collide with a fresh generation and resolve to the
//! wrong object. That exhaustion threshold is a documented limit of the
//! 32-bit field, not detected at runtime.

use core::fmt;
use core::mem::MaybeUninit;
use core::ops::{Index, IndexMut};

use crate::handle::Handle;

// Occupancy bitset: one bit per slot in u64 words.
const BIT_SHIFT: usize = 6;
const BIT_MASK: usize = 63;

/// One storage cell: a generation stamp plus room for a `T`.
///
/// `value` is initialized if and only if the slot's occupancy bit is set.
struct Slot<T> {
    generation: u32,
    value: MaybeUninit<T>,
}

/// A fixed-capacity slot allocator with generational handles.
///
/// See the [crate docs](crate) for the three access tiers. All operations
/// are synchronous and non-blocking: resolution is O(1), allocation is a
/// linear scan over the occupancy bitset (64 slots per word).
///
/// The pool is the sole authority on handle validity. A handle resolves
/// while, and only while, all of the following hold: it is not
/// [`Handle::NULL`], its index is within this pool, the slot is occupied,
/// and the slot's stored generation equals the handle's.
pub struct SlotPool<T> {
    slots: Box<[Slot<T>]>,
    occupied: Box<[u64]>,
    counter: u32,
    len: usize,
}

impl<T> SlotPool<T> {
    /// Creates a pool with room for exactly `capacity` objects.
    ///
    /// The capacity is fixed for the pool's lifetime.
    ///
    /// # Panics
    /// Panics if `capacity` does not fit the 32-bit slot index space.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity <= u32::MAX as usize,
            "capacity exceeds the 32-bit slot index space"
        );
        let words = (capacity + BIT_MASK) >> BIT_SHIFT;
        Self {
            slots: (0..capacity)
                .map(|_| Slot {
                    generation: 0,
                    value: MaybeUninit::uninit(),
                })
                .collect(),
            occupied: vec![0u64; words].into_boxed_slice(),
            counter: 1,
            len: 0,
        }
    }

    /// Total number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live objects.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocates `value` into the lowest free slot and returns its handle.
    ///
    /// Returns [`Handle::NULL`] when every slot is occupied — capacity
    /// exhaustion is an expected condition, reported rather than fatal,
    /// and the caller must check [`Handle::is_null`] before use. The value
    /// is dropped in that case; use [`try_allocate`](Self::try_allocate)
    /// to get it back.
    pub fn allocate(&mut self, value: T) -> Handle<T> {
        match self.try_allocate(value) {
            Ok(handle) => handle,
            Err(_) => Handle::NULL,
        }
    }

    /// Allocates `value`, or hands it back in a [`CapacityError`] when the
    /// pool is full.
    ///
    /// # Errors
    /// Fails only on capacity exhaustion; [`CapacityError::into_inner`]
    /// recovers the rejected value.
    pub fn try_allocate(&mut self, value: T) -> Result<Handle<T>, CapacityError<T>> {
        let Some(index) = self.first_vacant() else {
            return Err(CapacityError(value));
        };

        let generation = self.counter;
        let slot = &mut self.slots[index];
        slot.generation = generation;
        slot.value.write(value);
        self.occupied[index >> BIT_SHIFT] |= 1 << (index & BIT_MASK);
        self.len += 1;

        // Bump the pool counter, skipping 0 so the null encoding is never
        // issued even after wraparound.
        self.counter = self.counter.wrapping_add(1);
        if self.counter == 0 {
            self.counter = 1;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(index, generation, "slot allocated");

        #[allow(clippy::cast_possible_truncation)] // capacity <= u32::MAX
        let handle = Handle::new(index as u32, generation);
        Ok(handle)
    }

    /// Frees the object behind `handle`, if it is still live.
    ///
    /// Idempotent: the null sentinel, an out-of-range index, an already
    /// vacant slot, or a stale generation are all silently ignored. The
    /// pool counter is not touched, so the freed slot's next occupant gets
    /// a fresh generation.
    pub fn deallocate(&mut self, handle: Handle<T>) {
        let _ = self.remove(handle);
    }

    /// Frees the slot behind `handle` and moves the object out.
    ///
    /// Returns `None` under exactly the conditions [`deallocate`](Self::deallocate)
    /// ignores.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let index = self.live_index(handle)?;
        self.occupied[index >> BIT_SHIFT] &= !(1 << (index & BIT_MASK));
        self.len -= 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(index, generation = handle.generation(), "slot freed");

        // Bit was set, so the value is initialized; clearing it first means
        // no other path can observe the slot as live while we move out.
        Some(unsafe { self.slots[index].value.assume_init_read() })
    }

    /// Resolves `handle` to a shared reference, or `None` if it is stale.
    ///
    /// This is the recoverable access tier: callers that expect staleness
    /// check the `Option`.
    #[inline]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        let index = self.live_index(handle)?;
        // Safety: live_index checked the occupancy bit.
        Some(unsafe { self.slots[index].value.assume_init_ref() })
    }

    /// Resolves `handle` to a mutable reference, or `None` if it is stale.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let index = self.live_index(handle)?;
        // Safety: live_index checked the occupancy bit.
        Some(unsafe { self.slots[index].value.assume_init_mut() })
    }

    /// Returns `true` if `handle` currently resolves.
    #[inline]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.live_index(handle).is_some()
    }

    /// Runs `f` on the object behind `handle` only if it is live.
    ///
    /// The guarded access tier: an invalid handle skips the closure and
    /// returns `None` without raising any error. The reference is scoped
    /// to the call and cannot be stored by the closure.
    #[inline]
    pub fn with<R>(&self, handle: Handle<T>, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.get(handle).map(f)
    }

    /// Mutable counterpart of [`with`](Self::with).
    #[inline]
    pub fn with_mut<R>(&mut self, handle: Handle<T>, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.get_mut(handle).map(f)
    }

    /// Drops every live object and marks all slots vacant.
    ///
    /// Every handle issued so far becomes stale. Capacity and the pool
    /// counter are unchanged.
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            if self.is_occupied(index) {
                // Safety: occupancy bit set, value initialized; the bits
                // are wiped below so nothing drops twice.
                unsafe { self.slots[index].value.assume_init_drop() };
            }
        }
        self.occupied.fill(0);
        self.len = 0;

        #[cfg(feature = "tracing")]
        tracing::trace!("pool cleared");
    }

    /// Iterates live entries in slot-index order.
    ///
    /// Each item pairs the object with a handle that currently resolves
    /// to it.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            pool: self,
            index: 0,
            remaining: self.len,
        }
    }

    /// Maps `handle` to its slot index if it currently resolves.
    ///
    /// Sole validity check: null sentinel, bounds, occupancy, then the
    /// generation comparison against the slot's stamp.
    #[inline]
    fn live_index(&self, handle: Handle<T>) -> Option<usize> {
        if handle.is_null() {
            return None;
        }
        let index = handle.index() as usize;
        if index >= self.slots.len() || !self.is_occupied(index) {
            return None;
        }
        if self.slots[index].generation != handle.generation() {
            return None;
        }
        Some(index)
    }

    #[inline]
    fn is_occupied(&self, index: usize) -> bool {
        (self.occupied[index >> BIT_SHIFT] >> (index & BIT_MASK)) & 1 != 0
    }

    /// First-fit scan: the lowest vacant slot index, word-wise over the
    /// bitset.
    fn first_vacant(&self) -> Option<usize> {
        for (word_index, &word) in self.occupied.iter().enumerate() {
            if word != u64::MAX {
                let index = (word_index << BIT_SHIFT) | word.trailing_ones() as usize;
                // Clear bits past the last slot belong to bitset padding.
                return (index < self.slots.len()).then_some(index);
            }
        }
        None
    }
}

impl<T> Drop for SlotPool<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> fmt::Debug for SlotPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// Panicking access tier: `&pool[handle]`.
///
/// # Panics
/// Panics if `handle` does not resolve — by contract the caller has
/// verified the handle, and an unverified dereference is a bug that must
/// fail loudly (release builds abort, matching the `panic = "abort"`
/// profile).
impl<T> Index<Handle<T>> for SlotPool<T> {
    type Output = T;

    #[inline]
    fn index(&self, handle: Handle<T>) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => invalid_handle(handle.index(), handle.generation()),
        }
    }
}

/// Panicking mutable access tier: `&mut pool[handle]`.
///
/// # Panics
/// Same contract as the [`Index`] impl.
impl<T> IndexMut<Handle<T>> for SlotPool<T> {
    #[inline]
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => invalid_handle(handle.index(), handle.generation()),
        }
    }
}

#[cold]
#[inline(never)]
fn invalid_handle(index: u32, generation: u32) -> ! {
    panic!("dereferenced an invalid handle (slot {index}, generation {generation})");
}

impl<'a, T> IntoIterator for &'a SlotPool<T> {
    type Item = (Handle<T>, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a pool's live entries, lowest slot index first.
pub struct Iter<'a, T> {
    pool: &'a SlotPool<T>,
    index: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle<T>, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        while self.index < self.pool.slots.len() {
            let index = self.index;
            self.index += 1;
            if self.pool.is_occupied(index) {
                self.remaining -= 1;
                let slot = &self.pool.slots[index];
                #[allow(clippy::cast_possible_truncation)] // capacity <= u32::MAX
                let handle = Handle::new(index as u32, slot.generation);
                // Safety: occupancy bit checked above.
                return Some((handle, unsafe { slot.value.assume_init_ref() }));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// The error returned by [`SlotPool::try_allocate`] when every slot is
/// occupied.
///
/// Carries the rejected value so the caller can retry elsewhere or dispose
/// of it.
pub struct CapacityError<T>(T);

impl<T> CapacityError<T> {
    /// Recovers the value that did not fit.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for CapacityError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CapacityError(..)")
    }
}

impl<T> fmt::Display for CapacityError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("slot pool is at capacity")
    }
}

impl<T> std::error::Error for CapacityError<T> {}
