//! Singly-linked intrusive list.
//!
//! Usable as a LIFO stack (push and pop at the front). The chain is
//! terminated by a null link; there is no back pointer, so `push_back`
//! does not exist and removing by node value is O(n).
//!
//! Head-position insertion and removal are uniform with interior
//! positions through [`SListCursorMut`], which carries an explicit
//! "previous node" (null at the before-front position) instead of the
//! offset-aliased sentinel a pointer-reinterpreting implementation would
//! use.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use crate::{Linked, VALIDATE_LINKS};

/// A single-threaded singly-linked intrusive list threading slot `NEXT`.
///
/// The list stores only a head pointer; nodes live wherever the caller
/// put them. See the crate docs for the ownership contract shared by all
/// containers.
pub struct SList<T: Linked<NEXT>, const NEXT: usize> {
    front: *mut T,
}

// Safety: the list is just a pointer into client-owned nodes; moving it to
// another thread is fine whenever the nodes themselves may be accessed there.
unsafe impl<T: Linked<NEXT> + Send, const NEXT: usize> Send for SList<T, NEXT> {}

impl<T: Linked<NEXT>, const NEXT: usize> SList<T, NEXT> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            front: ptr::null_mut(),
        }
    }

    #[inline]
    pub(crate) unsafe fn next_of(n: *mut T) -> *mut T {
        // Safety: caller guarantees n points to a live node.
        unsafe { <T as Linked<NEXT>>::link(&*n) }
    }

    #[inline]
    pub(crate) unsafe fn set_next_of(n: *mut T, x: *mut T) {
        // Safety: caller guarantees n points to a live node it may mutate.
        unsafe { <T as Linked<NEXT>>::set_link(&mut *n, x) }
    }

    #[inline]
    unsafe fn check_unlinked(&self, n: NonNull<T>) {
        if VALIDATE_LINKS {
            // Safety: caller guarantees n is live.
            unsafe {
                assert!(
                    Self::next_of(n.as_ptr()).is_null(),
                    "node is already linked"
                );
            }
            // An unlinked node can still be the current front; catch that too.
            assert!(n.as_ptr() != self.front, "node is already the list front");
        }
    }

    #[inline]
    unsafe fn clear_link(n: *mut T) {
        if VALIDATE_LINKS {
            // Safety: caller guarantees n is live.
            unsafe { Self::set_next_of(n, ptr::null_mut()) };
        }
    }

    /// Returns `true` if the list has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.front.is_null()
    }

    /// Returns `true` if the list has exactly one element.
    ///
    /// No size is stored; this inspects at most one link.
    #[inline]
    pub fn size_is_1(&self) -> bool {
        // Safety: front, when non-null, points to a linked (hence live) node.
        !self.front.is_null() && unsafe { Self::next_of(self.front) }.is_null()
    }

    /// Returns `true` if the list has two or more elements.
    #[inline]
    pub fn size_is_greater_than_1(&self) -> bool {
        // Safety: as in size_is_1.
        !self.front.is_null() && !unsafe { Self::next_of(self.front) }.is_null()
    }

    /// Returns the first node, or `None` if the list is empty.
    #[inline]
    pub fn front(&self) -> Option<NonNull<T>> {
        NonNull::new(self.front)
    }

    /// Pushes `n` at the front.
    ///
    /// # Safety
    ///
    /// `n` must point to a live node that stays valid while linked, must
    /// not currently be in any container on slot `NEXT`, and (in
    /// validating builds) must have a null `NEXT` slot.
    #[inline]
    pub unsafe fn push_front(&mut self, n: NonNull<T>) {
        // Safety: contract above.
        unsafe {
            self.check_unlinked(n);
            Self::set_next_of(n.as_ptr(), self.front);
        }
        self.front = n.as_ptr();
    }

    /// Pops the front node.
    ///
    /// Calling this on an empty list is a contract violation; check
    /// [`is_empty`](Self::is_empty) first.
    ///
    /// # Safety
    ///
    /// The list must be non-empty.
    #[inline]
    pub unsafe fn pop_front(&mut self) -> NonNull<T> {
        debug_assert!(!self.is_empty(), "pop_front on empty list");

        let result = self.front;
        // Safety: result is the linked front node.
        unsafe {
            self.front = Self::next_of(result);
            Self::clear_link(result);
            NonNull::new_unchecked(result)
        }
    }

    /// Inserts `n` after `before`.
    ///
    /// # Safety
    ///
    /// `before` must be linked in this list; `n` as in
    /// [`push_front`](Self::push_front).
    #[inline]
    pub unsafe fn insert_after(&mut self, before: NonNull<T>, n: NonNull<T>) {
        // Safety: contract above.
        unsafe {
            self.check_unlinked(n);
            Self::set_next_of(n.as_ptr(), Self::next_of(before.as_ptr()));
            Self::set_next_of(before.as_ptr(), n.as_ptr());
        }
    }

    /// Removes and returns the node after `before`.
    ///
    /// # Safety
    ///
    /// `before` must be linked in this list and must not be the last
    /// element.
    #[inline]
    pub unsafe fn remove_after(&mut self, before: NonNull<T>) -> NonNull<T> {
        // Safety: contract above.
        unsafe {
            let result = Self::next_of(before.as_ptr());
            debug_assert!(!result.is_null(), "remove_after the last element");
            Self::set_next_of(before.as_ptr(), Self::next_of(result));
            Self::clear_link(result);
            NonNull::new_unchecked(result)
        }
    }

    /// Removes `n` from the list by linear search.
    ///
    /// O(n); prefer [`remove_after`](Self::remove_after) when the
    /// predecessor is known.
    ///
    /// # Safety
    ///
    /// `n` must be linked in this list.
    pub unsafe fn remove(&mut self, n: NonNull<T>) {
        if self.front == n.as_ptr() {
            // Safety: list is non-empty (n is linked in it).
            unsafe { self.pop_front() };
            return;
        }

        let mut prev = self.front;
        // Safety: walking linked (live) nodes.
        unsafe {
            while !prev.is_null() {
                if Self::next_of(prev) == n.as_ptr() {
                    self.remove_after(NonNull::new_unchecked(prev));
                    return;
                }
                prev = Self::next_of(prev);
            }
        }
        debug_assert!(false, "node is not in this list");
    }

    /// Unlinks every node.
    ///
    /// In validating builds each node's `NEXT` slot is zeroed; otherwise
    /// the nodes are abandoned with stale links and only the head is
    /// reset.
    pub fn clear(&mut self) {
        if VALIDATE_LINKS {
            // Safety: popping linked nodes.
            while !self.is_empty() {
                unsafe { self.pop_front() };
            }
        } else {
            self.front = ptr::null_mut();
        }
    }

    /// Swaps the contents of two lists. O(1).
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(&mut self.front, &mut other.front);
    }

    /// Returns a forward iterator over the nodes.
    #[inline]
    pub fn iter(&self) -> SListIter<'_, T, NEXT> {
        SListIter {
            current: self.front,
            _marker: PhantomData,
        }
    }

    /// Returns a cursor positioned so that the current element is the
    /// front (the cursor itself sits at the before-front position).
    #[inline]
    pub fn cursor_mut(&mut self) -> SListCursorMut<'_, T, NEXT> {
        SListCursorMut {
            list: self,
            prev: ptr::null_mut(),
        }
    }
}

impl<T: Linked<NEXT>, const NEXT: usize> Default for SList<T, NEXT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Linked<NEXT>, const NEXT: usize> fmt::Debug for SList<T, NEXT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SList").field("front", &self.front).finish()
    }
}

/// Forward iterator over an [`SList`]. Yields node pointers.
pub struct SListIter<'a, T: Linked<NEXT>, const NEXT: usize> {
    current: *mut T,
    _marker: PhantomData<&'a SList<T, NEXT>>,
}

impl<'a, T: Linked<NEXT>, const NEXT: usize> Iterator for SListIter<'a, T, NEXT> {
    type Item = NonNull<T>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let n = NonNull::new(self.current)?;
        // Safety: linked nodes are live by the insertion contract.
        self.current = unsafe { SList::<T, NEXT>::next_of(self.current) };
        Some(n)
    }
}

/// A mutating cursor over an [`SList`].
///
/// The cursor stores the node *before* the one it refers to; at creation
/// that is the before-front position, so [`insert`](Self::insert) there is
/// a `push_front` and the head needs no special casing. After
/// [`remove_current`](Self::remove_current) the cursor refers to the next
/// remaining element.
pub struct SListCursorMut<'a, T: Linked<NEXT>, const NEXT: usize> {
    list: &'a mut SList<T, NEXT>,
    prev: *mut T,
}

impl<'a, T: Linked<NEXT>, const NEXT: usize> SListCursorMut<'a, T, NEXT> {
    /// Returns the node the cursor refers to, or `None` at the end.
    #[inline]
    pub fn current(&self) -> Option<NonNull<T>> {
        if self.prev.is_null() {
            NonNull::new(self.list.front)
        } else {
            // Safety: prev is linked, hence live.
            NonNull::new(unsafe { SList::<T, NEXT>::next_of(self.prev) })
        }
    }

    /// Advances the cursor past the current element. No-op at the end.
    #[inline]
    pub fn move_next(&mut self) {
        if let Some(c) = self.current() {
            self.prev = c.as_ptr();
        }
    }

    /// Inserts `n` at the cursor position; `n` becomes the current
    /// element.
    ///
    /// # Safety
    ///
    /// As for [`SList::push_front`].
    #[inline]
    pub unsafe fn insert(&mut self, n: NonNull<T>) {
        // Safety: contract above; prev, when non-null, is linked.
        unsafe {
            if self.prev.is_null() {
                self.list.push_front(n);
            } else {
                self.list.insert_after(NonNull::new_unchecked(self.prev), n);
            }
        }
    }

    /// Removes and returns the current element, or `None` at the end.
    ///
    /// # Safety
    ///
    /// The usual node contract; the removed node leaves the list.
    #[inline]
    pub unsafe fn remove_current(&mut self) -> Option<NonNull<T>> {
        self.current()?;
        // Safety: current exists, so the list is non-empty and prev (when
        // non-null) has a successor.
        unsafe {
            if self.prev.is_null() {
                Some(self.list.pop_front())
            } else {
                Some(self.list.remove_after(NonNull::new_unchecked(self.prev)))
            }
        }
    }
}
