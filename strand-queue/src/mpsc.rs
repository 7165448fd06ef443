//! Multi-producer single-consumer FIFO queue.
//!
//! A [`PopAllStack`] shared by the producers, plus a consumer-private
//! `STailList` acting as a reversing buffer. The consumer drains the
//! stack in one atomic swap, reverses the captured LIFO chain into the
//! buffer (restoring FIFO order), and then serves pops from the buffer
//! with plain pointer chases until it runs dry. The cost of the atomic
//! operation is amortized over every item captured by the drain.
//!
//! Ordering: items from a single producer are delivered in push order.
//! Across producers, order follows the CAS linearization on the shared
//! stack; inversions are limited to items pushed between two drains.

use core::cell::UnsafeCell;
use core::fmt;
use core::ptr::NonNull;

use strand_collections::{Linked, STailList};

use crate::{PopAllStack, VALIDATE_LINKS};

/// A lock-free MPSC FIFO queue threading slot `SLOT` of the node type.
///
/// Any number of threads may call the producer operations concurrently;
/// the consumer operations ([`pop`](Self::pop),
/// [`consumer_empty`](Self::consumer_empty)) must all come from one
/// thread at a time — that is what their `unsafe` contracts pin down.
/// The reversing buffer reuses the same link slot as the shared stack:
/// a node is only ever in one of the two at a time.
pub struct MpscQueue<T: Linked<SLOT>, const SLOT: usize> {
    shared: PopAllStack<T, SLOT>,
    reversing: UnsafeCell<STailList<T, SLOT>>,
}

// Safety: the shared stack synchronizes producer/consumer handoff; the
// reversing buffer is only touched under the single-consumer contract.
unsafe impl<T: Linked<SLOT> + Send, const SLOT: usize> Send for MpscQueue<T, SLOT> {}
unsafe impl<T: Linked<SLOT> + Send, const SLOT: usize> Sync for MpscQueue<T, SLOT> {}

impl<T: Linked<SLOT>, const SLOT: usize> MpscQueue<T, SLOT> {
    /// Creates an empty queue.
    #[inline]
    pub const fn new() -> Self {
        Self {
            shared: PopAllStack::new(),
            reversing: UnsafeCell::new(STailList::new()),
        }
    }

    /// Pushes one node. Producer operation; any thread.
    ///
    /// # Safety
    ///
    /// As for [`PopAllStack::push`].
    #[inline]
    pub unsafe fn push(&self, n: NonNull<T>) {
        // Safety: contract above.
        unsafe { self.shared.push(n) }
    }

    /// Pushes one node, reporting whether the *producer-shared stack* was
    /// empty immediately before the push. Producer operation; any thread.
    ///
    /// Known limitation, kept deliberately: the flag consults only the
    /// shared stack, so it can read `true` while the consumer's reversing
    /// buffer still holds undelivered items. Treat it purely as a
    /// wake-the-consumer hint that may over-trigger; never infer from it
    /// that the consumer has nothing to do.
    ///
    /// # Safety
    ///
    /// As for [`PopAllStack::push`].
    #[inline]
    pub unsafe fn push_was_empty(&self, n: NonNull<T>) -> bool {
        // Safety: contract above.
        unsafe { self.shared.push_was_empty(n) }
    }

    /// Pushes a pre-linked chain `front -> ... -> back`; `back` will be
    /// the first of the chain to be dequeued. Producer operation; any
    /// thread. The was-empty report carries the same limitation as
    /// [`push_was_empty`](Self::push_was_empty).
    ///
    /// # Safety
    ///
    /// As for [`PopAllStack::push_multiple`].
    #[inline]
    pub unsafe fn push_multiple_was_empty(&self, front: NonNull<T>, back: NonNull<T>) -> bool {
        // Safety: contract above.
        unsafe { self.shared.push_multiple_was_empty(front, back) }
    }

    /// Returns `true` if both the reversing buffer and the shared stack
    /// appear empty. Consumer operation.
    ///
    /// # Safety
    ///
    /// May only be called from the single consumer thread.
    #[inline]
    pub unsafe fn consumer_empty(&self) -> bool {
        // Safety: single-consumer contract makes the buffer access exclusive.
        let reversing = unsafe { &*self.reversing.get() };
        reversing.is_empty() && self.shared.empty()
    }

    /// Pops the next node in FIFO order, or `None` if nothing is
    /// available. Consumer operation.
    ///
    /// # Safety
    ///
    /// May only be called from the single consumer thread. Returned nodes
    /// are relinquished to the caller with their slot nulled (in
    /// validating builds).
    pub unsafe fn pop(&self) -> Option<NonNull<T>> {
        // Safety: single-consumer contract makes the buffer access exclusive.
        let reversing = unsafe { &mut *self.reversing.get() };

        if !reversing.is_empty() {
            // Safety: non-empty checked.
            return Some(unsafe { reversing.pop_front() });
        }

        if self.shared.empty() {
            return None;
        }

        let mut n = self.shared.pop_all()?;

        // The captured chain is LIFO. Push all but its last node onto the
        // front of the reversing buffer — that reverses them into FIFO
        // order — and return the last node, which is next in FIFO order.
        // Safety: the consumer owns the whole captured chain.
        unsafe {
            loop {
                let next = <T as Linked<SLOT>>::link(n.as_ref());
                let Some(next) = NonNull::new(next) else {
                    break;
                };
                if VALIDATE_LINKS {
                    <T as Linked<SLOT>>::set_link(n.as_mut(), core::ptr::null_mut());
                }
                reversing.push_front(n);
                n = next;
            }
        }

        // The chain's last node was pushed onto an empty stack, so its
        // link is already null.
        Some(n)
    }
}

impl<T: Linked<SLOT>, const SLOT: usize> Default for MpscQueue<T, SLOT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Linked<SLOT>, const SLOT: usize> fmt::Debug for MpscQueue<T, SLOT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpscQueue")
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}
