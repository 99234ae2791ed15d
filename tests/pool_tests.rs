//! Integration tests for `SlotPool` allocation, deallocation, and resolution.

use std::cell::Cell;
use std::rc::Rc;

use tether::{Handle, SlotPool};

#[test]
fn test_round_trip() {
    let mut pool = SlotPool::with_capacity(8);
    let h = pool.allocate(String::from("payload"));
    assert!(!h.is_null());
    assert_eq!(pool.get(h).map(String::as_str), Some("payload"));
}

#[test]
fn test_live_handles_have_distinct_slots() {
    let mut pool = SlotPool::with_capacity(16);
    let handles: Vec<_> = (0..16).map(|i| pool.allocate(i)).collect();

    for (i, a) in handles.iter().enumerate() {
        assert!(!a.is_null());
        for b in &handles[i + 1..] {
            assert_ne!(a.index(), b.index());
        }
    }
}

#[test]
fn test_capacity_boundary() {
    let mut pool = SlotPool::with_capacity(4);
    let handles: Vec<_> = (0..4).map(|i| pool.allocate(i * 10)).collect();

    // The (capacity + 1)-th allocation reports exhaustion via the sentinel.
    let overflow = pool.allocate(999);
    assert!(overflow.is_null());
    assert_eq!(pool.len(), 4);

    // Every prior handle is still independently valid.
    for (i, h) in handles.iter().enumerate() {
        assert_eq!(pool.get(*h), Some(&(i * 10)));
    }
}

#[test]
fn test_try_allocate_returns_value_on_exhaustion() {
    let mut pool = SlotPool::with_capacity(1);
    pool.allocate(String::from("resident"));

    let err = pool
        .try_allocate(String::from("rejected"))
        .expect_err("pool is full");
    assert_eq!(err.to_string(), "slot pool is at capacity");
    assert_eq!(err.into_inner(), "rejected");
}

#[test]
fn test_deallocate_is_idempotent() {
    let mut pool = SlotPool::with_capacity(3);
    let keep = pool.allocate(1);
    let gone = pool.allocate(2);

    pool.deallocate(gone);
    assert_eq!(pool.get(gone), None);
    assert_eq!(pool.len(), 1);

    // Double free: a no-op that disturbs no other slot.
    pool.deallocate(gone);
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.get(keep), Some(&1));

    // So are the sentinel and out-of-range or stale encodings.
    pool.deallocate(Handle::NULL);
    pool.deallocate(Handle::from_raw((99u64 << 32) | 1));
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.get(keep), Some(&1));
}

#[test]
fn test_stale_handle_cannot_free_new_occupant() {
    let mut pool = SlotPool::with_capacity(1);
    let old = pool.allocate("first");
    pool.deallocate(old);

    let new = pool.allocate("second");
    assert_eq!(old.index(), new.index());

    // The stale handle's generation no longer matches: freeing through it
    // must not evict the slot's new occupant.
    pool.deallocate(old);
    assert_eq!(pool.get(new), Some(&"second"));
}

#[test]
fn test_first_fit_reuses_lowest_free_slot() {
    let mut pool = SlotPool::with_capacity(4);
    let h0 = pool.allocate('a');
    let h1 = pool.allocate('b');
    let h2 = pool.allocate('c');
    assert_eq!((h0.index(), h1.index(), h2.index()), (0, 1, 2));

    pool.deallocate(h1);
    assert_eq!(pool.allocate('d').index(), 1);
    assert_eq!(pool.allocate('e').index(), 3);
}

#[test]
fn test_generation_scenario() {
    // capacity = 2: allocate A, B; free A; allocate C reusing A's slot.
    let mut pool = SlotPool::with_capacity(2);

    let h1 = pool.allocate('A');
    let h2 = pool.allocate('B');
    assert_eq!((h1.index(), h1.generation()), (0, 1));
    assert_eq!((h2.index(), h2.generation()), (1, 2));

    pool.deallocate(h1);

    let h3 = pool.allocate('C');
    assert_eq!((h3.index(), h3.generation()), (0, 3));

    assert_eq!(pool.get(h1), None);
    assert_eq!(pool.get(h3), Some(&'C'));
    assert_eq!(pool.get(h2), Some(&'B'));
}

#[test]
fn test_zero_capacity_pool() {
    let mut pool = SlotPool::<u32>::with_capacity(0);
    assert_eq!(pool.capacity(), 0);
    assert!(pool.allocate(1).is_null());
    assert!(pool.try_allocate(2).is_err());
    assert!(pool.is_empty());
}

#[test]
fn test_iteration_in_slot_order() {
    let mut pool = SlotPool::with_capacity(8);
    let handles: Vec<_> = (0..5).map(|i| pool.allocate(i)).collect();
    pool.deallocate(handles[1]);
    pool.deallocate(handles[3]);

    let entries: Vec<_> = pool.iter().map(|(h, v)| (h.index(), *v)).collect();
    assert_eq!(entries, vec![(0, 0), (2, 2), (4, 4)]);
    assert_eq!(pool.iter().len(), 3);

    // Iteration yields handles that resolve.
    for (h, v) in &pool {
        assert_eq!(pool.get(h), Some(v));
    }
}

/// Bumps a shared counter when dropped.
struct DropProbe(Rc<Cell<usize>>);

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn test_drop_destroys_each_live_object_once() {
    let drops = Rc::new(Cell::new(0));
    {
        let mut pool = SlotPool::with_capacity(4);
        let _a = pool.allocate(DropProbe(Rc::clone(&drops)));
        let b = pool.allocate(DropProbe(Rc::clone(&drops)));
        let _c = pool.allocate(DropProbe(Rc::clone(&drops)));

        pool.deallocate(b);
        assert_eq!(drops.get(), 1);
    }
    // Pool drop destroys the two remaining objects, and nothing twice.
    assert_eq!(drops.get(), 3);
}

#[test]
fn test_clear_drops_everything_and_invalidates_handles() {
    let drops = Rc::new(Cell::new(0));
    let mut pool = SlotPool::with_capacity(4);
    let handles: Vec<_> = (0..3)
        .map(|_| pool.allocate(DropProbe(Rc::clone(&drops))))
        .collect();

    pool.clear();
    assert_eq!(drops.get(), 3);
    assert!(pool.is_empty());
    assert!(handles.iter().all(|h| !pool.contains(*h)));

    // The pool is reusable afterwards, and fresh handles stay distinct
    // from the stale ones thanks to the untouched counter.
    let fresh = pool.allocate(DropProbe(Rc::clone(&drops)));
    assert_eq!(fresh.index(), 0);
    assert!(fresh.generation() > handles[0].generation());
}

#[test]
fn test_remove_moves_the_value_out() {
    let mut pool = SlotPool::with_capacity(2);
    let h = pool.allocate(vec![1, 2, 3]);

    assert_eq!(pool.remove(h), Some(vec![1, 2, 3]));
    assert_eq!(pool.remove(h), None);
}
