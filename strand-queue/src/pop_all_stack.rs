//! Multi-producer multi-consumer pop-all LIFO stack.
//!
//! The classic IBM-freelist LIFO, minus the single-node pop. Push links
//! the incoming node to the observed top and CASes the top pointer;
//! [`pop_all`](PopAllStack::pop_all) swaps the top with null and hands
//! the caller the whole captured chain.
//!
//! Because the only pop primitive swaps in null — it never compares
//! against a non-null pointer — the ABA hazard of the classic freelist
//! cannot arise and no version tag is needed. Adding a single-node `pop`
//! would forfeit that property; the tagged stack in `strand-pool` is the
//! template for what that costs.

use core::fmt;
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicPtr, Ordering};

use strand_collections::Linked;

use crate::VALIDATE_LINKS;

/// A lock-free MPMC LIFO stack with pop-all as the only pop primitive,
/// threading slot `SLOT` of the node type.
///
/// All operations may be invoked concurrently from any thread. The link
/// slot needs no atomicity: a node's slot is only ever written by the one
/// thread that currently owns the node, and ownership transfer is
/// mediated by the CAS on `top` (release on push, acquire on pop-all).
pub struct PopAllStack<T: Linked<SLOT>, const SLOT: usize> {
    top: AtomicPtr<T>,
}

// Safety: the stack holds client-owned nodes by pointer and synchronizes
// all handoff through `top`.
unsafe impl<T: Linked<SLOT> + Send, const SLOT: usize> Send for PopAllStack<T, SLOT> {}
unsafe impl<T: Linked<SLOT> + Send, const SLOT: usize> Sync for PopAllStack<T, SLOT> {}

impl<T: Linked<SLOT>, const SLOT: usize> PopAllStack<T, SLOT> {
    /// Creates an empty stack.
    #[inline]
    pub const fn new() -> Self {
        Self {
            top: AtomicPtr::new(ptr::null_mut()),
        }
    }

    #[inline]
    unsafe fn check_unlinked(&self, n: NonNull<T>) {
        if VALIDATE_LINKS {
            // Safety: caller guarantees n is live and owned by this thread.
            unsafe {
                assert!(
                    <T as Linked<SLOT>>::link(n.as_ref()).is_null(),
                    "node is already linked"
                );
            }
            // An unlinked node can still be the current top; catch that too.
            assert!(
                n.as_ptr() != self.top.load(Ordering::Relaxed),
                "node is already on this stack"
            );
        }
    }

    /// Returns `true` if the stack appeared empty. Advisory only: another
    /// thread may push or pop at any moment.
    #[inline]
    pub fn empty(&self) -> bool {
        self.top.load(Ordering::Relaxed).is_null()
    }

    /// Pushes one node.
    ///
    /// Lock-free: retries only when another push or pop-all won the CAS.
    ///
    /// # Safety
    ///
    /// `n` must point to a node that is valid until it is popped and
    /// relinquished by the popping thread, must be exclusively owned by
    /// the caller, and must not currently be in any container on slot
    /// `SLOT`.
    pub unsafe fn push(&self, n: NonNull<T>) {
        // Safety: contract above.
        unsafe {
            self.push_was_empty(n);
        }
    }

    /// Pushes one node, reporting whether the stack was empty immediately
    /// before this push (a producer-side wake-up hint).
    ///
    /// # Safety
    ///
    /// As for [`push`](Self::push).
    pub unsafe fn push_was_empty(&self, n: NonNull<T>) -> bool {
        // Safety: contract above.
        unsafe { self.push_chain(n, n) }
    }

    /// Atomically prepends a pre-linked chain running `front -> ... ->
    /// back` through slot `SLOT`. After the push, `front` is the top of
    /// the stack.
    ///
    /// # Safety
    ///
    /// Every node of the chain satisfies the [`push`](Self::push)
    /// contract; the chain must already be linked front-to-back, and
    /// `back`'s slot is overwritten here.
    pub unsafe fn push_multiple(&self, front: NonNull<T>, back: NonNull<T>) {
        // Safety: contract above.
        unsafe {
            self.push_multiple_was_empty(front, back);
        }
    }

    /// [`push_multiple`](Self::push_multiple) with the was-empty report
    /// of [`push_was_empty`](Self::push_was_empty).
    ///
    /// # Safety
    ///
    /// As for [`push_multiple`](Self::push_multiple).
    pub unsafe fn push_multiple_was_empty(&self, front: NonNull<T>, back: NonNull<T>) -> bool {
        // Safety: contract above.
        unsafe { self.push_chain(front, back) }
    }

    // All four push variants share this loop; they differ only in chain
    // length and in whether the caller looks at the result.
    unsafe fn push_chain(&self, front: NonNull<T>, back: NonNull<T>) -> bool {
        // Safety (throughout): until the CAS succeeds the chain is owned
        // exclusively by this thread, so plain link stores are fine; the
        // release ordering on success publishes both the payload and
        // back's just-written link to whoever pop-alls.
        unsafe {
            self.check_unlinked(back);

            let mut top = self.top.load(Ordering::Relaxed);
            loop {
                <T as Linked<SLOT>>::set_link(&mut *back.as_ptr(), top);
                match self.top.compare_exchange(
                    top,
                    front.as_ptr(),
                    Ordering::Release,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => return top.is_null(),
                    Err(observed) => top = observed,
                }
            }
        }
    }

    /// Atomically removes and returns every node currently on the stack,
    /// or `None` if it was empty. Wait-free.
    ///
    /// The returned chain is in LIFO order (most recently pushed first)
    /// with its links intact; walk it through slot `SLOT`. The caller
    /// now owns every node in the chain and, in validating builds, must
    /// null each node's slot before reinserting it anywhere.
    #[inline]
    pub fn pop_all(&self) -> Option<NonNull<T>> {
        // Acquire pairs with the release CAS of every prior push, making
        // all captured node data visible.
        NonNull::new(self.top.swap(ptr::null_mut(), Ordering::Acquire))
    }
}

impl<T: Linked<SLOT>, const SLOT: usize> Default for PopAllStack<T, SLOT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Linked<SLOT>, const SLOT: usize> fmt::Debug for PopAllStack<T, SLOT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopAllStack")
            .field("top", &self.top.load(Ordering::Relaxed))
            .finish()
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

    /// Walks a popped chain, clearing links as it goes, returning values
    /// in chain order.
    fn drain_chain(head: Option<NonNull<TestNode>>) -> Vec<i32> {
        let mut out = Vec::new();
        let mut current = head;
        while let Some(mut n) = current {
            unsafe {
                current = NonNull::new(<TestNode as Linked<0>>::link(n.as_ref()));
                <TestNode as Linked<0>>::set_link(n.as_mut(), core::ptr::null_mut());
                out.push(n.as_ref().value);
            }
        }
        out
    }

    #[test]
    fn new_stack_is_empty() {
        let stack: PopAllStack<TestNode, 0> = PopAllStack::new();
        assert!(stack.empty());
        assert!(stack.pop_all().is_none());
    }

    #[test]
    fn pop_all_returns_lifo_order() {
        let mut storage = nodes(10);
        let p = ptrs(&mut storage);
        let stack: PopAllStack<TestNode, 0> = PopAllStack::new();

        unsafe {
            stack.push(p[0]);
            assert!(!stack.empty());
            assert_eq!(stack.pop_all(), Some(p[0]));
            assert!(stack.empty());
            assert!(stack.pop_all().is_none());
            <TestNode as Linked<0>>::set_link(&mut *p[0].as_ptr(), core::ptr::null_mut());

            for &n in &p {
                stack.push(n);
            }
        }

        assert_eq!(drain_chain(stack.pop_all()), vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
        assert!(stack.empty());
    }

    #[test]
    fn push_reports_was_empty() {
        let mut storage = nodes(2);
        let p = ptrs(&mut storage);
        let stack: PopAllStack<TestNode, 0> = PopAllStack::new();

        unsafe {
            assert!(stack.push_was_empty(p[0]));
            assert!(!stack.push_was_empty(p[1]));
        }
        assert_eq!(drain_chain(stack.pop_all()), vec![1, 0]);
    }

    #[test]
    fn push_multiple_preserves_chain_order() {
        let mut storage = nodes(4);
        let p = ptrs(&mut storage);
        let stack: PopAllStack<TestNode, 0> = PopAllStack::new();

        unsafe {
            // Pre-link a -> b -> c, then push the chain.
            <TestNode as Linked<0>>::set_link(&mut *p[0].as_ptr(), p[1].as_ptr());
            <TestNode as Linked<0>>::set_link(&mut *p[1].as_ptr(), p[2].as_ptr());
            stack.push_multiple(p[0], p[2]);
            assert!(!stack.empty());
        }

        // The chain comes back exactly as pushed, head to tail.
        assert_eq!(drain_chain(stack.pop_all()), vec![0, 1, 2]);
    }

    #[test]
    fn push_multiple_then_single_chain_stacks_lifo() {
        let mut storage = nodes(4);
        let p = ptrs(&mut storage);
        let stack: PopAllStack<TestNode, 0> = PopAllStack::new();

        unsafe {
            <TestNode as Linked<0>>::set_link(&mut *p[0].as_ptr(), p[1].as_ptr());
            <TestNode as Linked<0>>::set_link(&mut *p[1].as_ptr(), p[2].as_ptr());

            assert!(stack.push_multiple_was_empty(p[0], p[2]));
            // A one-node chain is pushed with front == back.
            assert!(!stack.push_multiple_was_empty(p[3], p[3]));
        }

        assert_eq!(drain_chain(stack.pop_all()), vec![3, 0, 1, 2]);
        assert!(stack.empty());
    }
}
