//! Single-producer single-consumer unordered result queue.
//!
//! The reply half of a request/response pair: the consumer dispatches
//! requests (bumping its expected-result count), the producer pushes
//! each reply node here, and the consumer pops until the count reaches
//! zero. Delivery order within a captured batch is LIFO — deliberately
//! unordered — because a client that can identify each reply by payload
//! has no use for FIFO and shouldn't pay for it.
//!
//! The queue is plain data with a `const fn new()`, so it can live
//! inside a request node itself: the server replies through the queue
//! embedded in the very message it received, with no allocation and no
//! shared registry.

use core::cell::Cell;
use core::fmt;
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicPtr, Ordering};

use strand_collections::Linked;

use crate::VALIDATE_LINKS;

/// A lock-free SPSC relaxed-order result queue threading slot `SLOT` of
/// the node type.
///
/// Exactly one thread may act as producer and one as consumer; the
/// `unsafe` contracts on each operation name its role. The producer and
/// consumer may run concurrently with each other.
pub struct ResultQueue<T: Linked<SLOT>, const SLOT: usize> {
    /// LIFO shared by producer and consumer; same algorithm as
    /// [`PopAllStack`](crate::PopAllStack).
    top: AtomicPtr<T>,
    /// Tail of the most recently captured batch. Consumer-private.
    consumer_head: Cell<*mut T>,
    /// Outstanding results: incremented on dispatch, decremented by every
    /// successful pop. Consumer-private.
    expected: Cell<usize>,
}

// Safety: `top` synchronizes the producer/consumer handoff; the Cell
// fields are only touched under the single-consumer contract.
unsafe impl<T: Linked<SLOT> + Send, const SLOT: usize> Send for ResultQueue<T, SLOT> {}
unsafe impl<T: Linked<SLOT> + Send, const SLOT: usize> Sync for ResultQueue<T, SLOT> {}

impl<T: Linked<SLOT>, const SLOT: usize> ResultQueue<T, SLOT> {
    /// Creates an empty queue with an expected-result count of zero.
    #[inline]
    pub const fn new() -> Self {
        Self {
            top: AtomicPtr::new(ptr::null_mut()),
            consumer_head: Cell::new(ptr::null_mut()),
            expected: Cell::new(0),
        }
    }

    /// Pushes one result node. Producer operation.
    ///
    /// # Safety
    ///
    /// May only be called from the single producer thread. `n` must point
    /// to a node that is valid until the consumer pops and relinquishes
    /// it, exclusively owned by the caller, and not currently in any
    /// container on slot `SLOT`.
    pub unsafe fn push(&self, n: NonNull<T>) {
        // Safety (throughout): the producer owns n exclusively until the
        // publishing store succeeds.
        unsafe {
            if VALIDATE_LINKS {
                assert!(
                    <T as Linked<SLOT>>::link(n.as_ref()).is_null(),
                    "node is already linked"
                );
                // The consumer-local queue can't be consulted from here
                // without racing the consumer; the slot-null check above
                // already catches everything but a node parked at top.
                assert!(
                    n.as_ptr() != self.top.load(Ordering::Relaxed),
                    "node is already on this queue"
                );
            }

            let top = self.top.load(Ordering::Relaxed);
            <T as Linked<SLOT>>::set_link(&mut *n.as_ptr(), top);

            // Release publishes the node payload and its just-written link.
            if self
                .top
                .compare_exchange(top, n.as_ptr(), Ordering::Release, Ordering::Relaxed)
                .is_err()
            {
                // With a single producer the CAS can only lose to the
                // consumer's capture, which swapped in null. Re-link to
                // null and publish with a plain store: no other producer
                // exists to race it, and the consumer synchronizes on its
                // acquire swap.
                <T as Linked<SLOT>>::set_link(&mut *n.as_ptr(), ptr::null_mut());
                self.top.store(n.as_ptr(), Ordering::Release);
            }
        }
    }

    /// Pops one result node, or `None` if nothing is available. Consumer
    /// operation. Order within a captured batch is LIFO; no order is
    /// guaranteed overall.
    ///
    /// # Safety
    ///
    /// May only be called from the single consumer thread.
    pub unsafe fn pop(&self) -> Option<NonNull<T>> {
        let local = self.consumer_head.get();
        let result = if local.is_null() {
            // Local queue is dry; poll the shared top passively before
            // paying for the atomic swap.
            if self.top.load(Ordering::Relaxed).is_null() {
                return None;
            }

            // Capture the whole batch; acquire pairs with the producer's
            // release publishes.
            let captured = self.top.swap(ptr::null_mut(), Ordering::Acquire);
            // Safety: the consumer now owns the captured chain.
            unsafe {
                self.consumer_head
                    .set(<T as Linked<SLOT>>::link(&*captured));
            }
            captured
        } else {
            // Safety: the consumer owns everything reachable from its head.
            unsafe {
                self.consumer_head.set(<T as Linked<SLOT>>::link(&*local));
            }
            local
        };

        // Safety: result is owned by the consumer now.
        unsafe {
            if VALIDATE_LINKS {
                <T as Linked<SLOT>>::set_link(&mut *result, ptr::null_mut());
            }
            debug_assert!(self.expected.get() > 0, "popped more results than expected");
            self.expected.set(self.expected.get() - 1);
            Some(NonNull::new_unchecked(result))
        }
    }

    /// Returns the number of dispatched requests whose results have not
    /// been popped yet. Consumer operation.
    ///
    /// # Safety
    ///
    /// May only be called from the single consumer thread.
    #[inline]
    pub unsafe fn expected_result_count(&self) -> usize {
        self.expected.get()
    }

    /// Records `k` further dispatched requests. Consumer operation,
    /// called when handing request(s) to the producer side.
    ///
    /// # Safety
    ///
    /// May only be called from the single consumer thread.
    #[inline]
    pub unsafe fn increment_expected_result_count(&self, k: usize) {
        self.expected.set(self.expected.get() + k);
    }
}

impl<T: Linked<SLOT>, const SLOT: usize> Default for ResultQueue<T, SLOT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Linked<SLOT>, const SLOT: usize> fmt::Debug for ResultQueue<T, SLOT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultQueue")
            .field("top", &self.top.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_collections::{impl_linked, Links};

    struct TestNode {
        links: Links<TestNode, 2>,
        value: i32,
    }

    impl_linked!(TestNode, links, 0, 1);

    fn nodes(n: usize) -> Vec<TestNode> {
        (0..n)
            .map(|i| TestNode {
                links: Links::new(),
                value: i as i32,
            })
            .collect()
    }

    fn ptrs(nodes: &mut [TestNode]) -> Vec<NonNull<TestNode>> {
        nodes.iter_mut().map(NonNull::from).collect()
    }

    #[test]
    fn new_queue_is_empty_with_zero_expected() {
        let q: ResultQueue<TestNode, 0> = ResultQueue::new();
        unsafe {
            assert_eq!(q.expected_result_count(), 0);
            assert!(q.pop().is_none());
        }
    }

    #[test]
    fn single_round_trip_decrements_count() {
        let mut storage = nodes(1);
        let p = ptrs(&mut storage);
        let q: ResultQueue<TestNode, 0> = ResultQueue::new();

        unsafe {
            q.increment_expected_result_count(1);
            q.push(p[0]);
            assert_eq!(q.expected_result_count(), 1);
            assert_eq!(q.pop(), Some(p[0]));
            assert_eq!(q.expected_result_count(), 0);
            assert!(q.pop().is_none());
            assert!(p[0].as_ref().links.is_unlinked(0));
        }
    }

    #[test]
    fn three_results_arrive_in_some_order() {
        let mut storage = nodes(3);
        let p = ptrs(&mut storage);
        let q: ResultQueue<TestNode, 0> = ResultQueue::new();

        unsafe {
            q.increment_expected_result_count(3);
            q.push(p[0]);
            q.push(p[1]);
            q.push(p[2]);

            assert_eq!(q.expected_result_count(), 3);

            // No delivery order is guaranteed, only that each node shows
            // up exactly once.
            let mut seen = Vec::new();
            for remaining in (0..3).rev() {
                let n = q.pop().expect("expected a result");
                assert!(p.contains(&n));
                assert!(!seen.contains(&n));
                seen.push(n);
                assert_eq!(q.expected_result_count(), remaining);
            }

            // The fourth pop finds nothing and leaves the count at zero.
            assert!(q.pop().is_none());
            assert_eq!(q.expected_result_count(), 0);
        }
    }

    #[test]
    fn batch_capture_interleaved_with_pushes() {
        let mut storage = nodes(4);
        let p = ptrs(&mut storage);
        let q: ResultQueue<TestNode, 0> = ResultQueue::new();

        unsafe {
            q.increment_expected_result_count(4);
            q.push(p[0]);
            q.push(p[1]);

            // First pop captures the batch {b, a} and returns its head.
            assert_eq!(q.pop(), Some(p[1]));

            // New pushes land on the shared top while a is still retained
            // in the consumer-local queue.
            q.push(p[2]);
            q.push(p[3]);

            // Local queue drains first, then the next batch is captured.
            assert_eq!(q.pop(), Some(p[0]));
            assert_eq!(q.pop(), Some(p[3]));
            assert_eq!(q.pop(), Some(p[2]));
            assert_eq!(q.expected_result_count(), 0);
        }
    }
}
