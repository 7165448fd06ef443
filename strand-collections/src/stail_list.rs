//! Singly-linked intrusive list with a tail pointer.
//!
//! Adds O(1) `push_back` to the singly-linked list, making it a FIFO
//! queue when pushed at the back and popped at the front. Still no
//! `pop_back` (that needs the doubly-linked [`DList`](crate::DList)).
//!
//! The `strand-queue` MPSC queue uses one of these as its consumer-side
//! reversing buffer.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use crate::{Linked, VALIDATE_LINKS};

/// A single-threaded singly-linked list with front and back pointers,
/// threading slot `NEXT`.
pub struct STailList<T: Linked<NEXT>, const NEXT: usize> {
    front: *mut T,
    back: *mut T,
}

// Safety: pointers into client-owned nodes; see SList.
unsafe impl<T: Linked<NEXT> + Send, const NEXT: usize> Send for STailList<T, NEXT> {}

impl<T: Linked<NEXT>, const NEXT: usize> STailList<T, NEXT> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            front: ptr::null_mut(),
            back: ptr::null_mut(),
        }
    }

    #[inline]
    unsafe fn next_of(n: *mut T) -> *mut T {
        // Safety: caller guarantees n points to a live node.
        unsafe { <T as Linked<NEXT>>::link(&*n) }
    }

    #[inline]
    unsafe fn set_next_of(n: *mut T, x: *mut T) {
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
            // back has a null next link, so check membership separately.
            assert!(n.as_ptr() != self.front, "node is already the list front");
            assert!(n.as_ptr() != self.back, "node is already the list back");
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
    #[inline]
    pub fn size_is_1(&self) -> bool {
        !self.front.is_null() && self.front == self.back
    }

    /// Returns `true` if the list has two or more elements.
    #[inline]
    pub fn size_is_greater_than_1(&self) -> bool {
        !self.front.is_null() && self.front != self.back
    }

    /// Returns the first node, or `None` if the list is empty.
    #[inline]
    pub fn front(&self) -> Option<NonNull<T>> {
        NonNull::new(self.front)
    }

    /// Returns the last node, or `None` if the list is empty.
    #[inline]
    pub fn back(&self) -> Option<NonNull<T>> {
        NonNull::new(self.back)
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
        if self.front.is_null() {
            self.back = n.as_ptr();
        }
        self.front = n.as_ptr();
    }

    /// Pushes `n` at the back.
    ///
    /// # Safety
    ///
    /// As for [`push_front`](Self::push_front).
    #[inline]
    pub unsafe fn push_back(&mut self, n: NonNull<T>) {
        // Safety: contract above.
        unsafe {
            self.check_unlinked(n);
            Self::set_next_of(n.as_ptr(), ptr::null_mut());
            if self.is_empty() {
                self.front = n.as_ptr();
            } else {
                Self::set_next_of(self.back, n.as_ptr());
            }
        }
        self.back = n.as_ptr();
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
            if self.front.is_null() {
                self.back = ptr::null_mut();
            }
            Self::clear_link(result);
            NonNull::new_unchecked(result)
        }
    }

    /// Inserts `n` after `before`, updating the tail if `before` was the
    /// last element.
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
            let after = Self::next_of(before.as_ptr());
            Self::set_next_of(n.as_ptr(), after);
            Self::set_next_of(before.as_ptr(), n.as_ptr());
            if after.is_null() {
                self.back = n.as_ptr();
            }
        }
    }

    /// Removes and returns the node after `before`, updating the tail if
    /// the removed node was the last element.
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
            let after = Self::next_of(result);
            Self::set_next_of(before.as_ptr(), after);
            if after.is_null() {
                self.back = before.as_ptr();
            }
            Self::clear_link(result);
            NonNull::new_unchecked(result)
        }
    }

    /// Unlinks every node. See [`SList::clear`](crate::SList::clear).
    pub fn clear(&mut self) {
        if VALIDATE_LINKS {
            // Safety: popping linked nodes.
            while !self.is_empty() {
                unsafe { self.pop_front() };
            }
        } else {
            self.front = ptr::null_mut();
            self.back = ptr::null_mut();
        }
    }

    /// Swaps the contents of two lists. O(1).
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(&mut self.front, &mut other.front);
        core::mem::swap(&mut self.back, &mut other.back);
    }

    /// Returns a forward iterator over the nodes.
    #[inline]
    pub fn iter(&self) -> STailListIter<'_, T, NEXT> {
        STailListIter {
            current: self.front,
            _marker: PhantomData,
        }
    }

    /// Returns a cursor positioned so that the current element is the
    /// front.
    #[inline]
    pub fn cursor_mut(&mut self) -> STailListCursorMut<'_, T, NEXT> {
        STailListCursorMut {
            list: self,
            prev: ptr::null_mut(),
        }
    }
}

impl<T: Linked<NEXT>, const NEXT: usize> Default for STailList<T, NEXT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Linked<NEXT>, const NEXT: usize> fmt::Debug for STailList<T, NEXT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("STailList")
            .field("front", &self.front)
            .field("back", &self.back)
            .finish()
    }
}

/// Forward iterator over an [`STailList`]. Yields node pointers.
pub struct STailListIter<'a, T: Linked<NEXT>, const NEXT: usize> {
    current: *mut T,
    _marker: PhantomData<&'a STailList<T, NEXT>>,
}

impl<'a, T: Linked<NEXT>, const NEXT: usize> Iterator for STailListIter<'a, T, NEXT> {
    type Item = NonNull<T>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let n = NonNull::new(self.current)?;
        // Safety: linked nodes are live by the insertion contract.
        self.current = unsafe { <T as Linked<NEXT>>::link(n.as_ref()) };
        Some(n)
    }
}

/// A mutating cursor over an [`STailList`]; see
/// [`SListCursorMut`](crate::SListCursorMut) for the position model.
pub struct STailListCursorMut<'a, T: Linked<NEXT>, const NEXT: usize> {
    list: &'a mut STailList<T, NEXT>,
    prev: *mut T,
}

impl<'a, T: Linked<NEXT>, const NEXT: usize> STailListCursorMut<'a, T, NEXT> {
    /// Returns the node the cursor refers to, or `None` at the end.
    #[inline]
    pub fn current(&self) -> Option<NonNull<T>> {
        if self.prev.is_null() {
            NonNull::new(self.list.front)
        } else {
            // Safety: prev is linked, hence live.
            NonNull::new(unsafe { STailList::<T, NEXT>::next_of(self.prev) })
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
    /// element. Maintains the list tail.
    ///
    /// # Safety
    ///
    /// As for [`STailList::push_front`].
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
    /// Maintains the list tail.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Links;

    struct TestNode {
        links: Links<TestNode, 2>,
        value: i32,
    }

    crate::impl_linked!(TestNode, links, 0, 1);

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

    fn values(list: &STailList<TestNode, 0>) -> Vec<i32> {
        list.iter().map(|n| unsafe { n.as_ref().value }).collect()
    }

    #[test]
    fn new_list_is_empty() {
        let list: STailList<TestNode, 0> = STailList::new();
        assert!(list.is_empty());
        assert!(list.front().is_none());
        assert!(list.back().is_none());
    }

    #[test]
    fn push_back_is_fifo() {
        let mut storage = nodes(3);
        let p = ptrs(&mut storage);
        let mut list: STailList<TestNode, 0> = STailList::new();

        unsafe {
            for &n in &p {
                list.push_back(n);
            }
            assert_eq!(values(&list), vec![0, 1, 2]);
            assert_eq!(list.front(), Some(p[0]));
            assert_eq!(list.back(), Some(p[2]));

            assert_eq!(list.pop_front(), p[0]);
            assert_eq!(list.pop_front(), p[1]);
            assert_eq!(list.pop_front(), p[2]);
        }
        assert!(list.is_empty());
        assert!(list.back().is_none());
    }

    #[test]
    fn single_element_front_is_back() {
        let mut storage = nodes(1);
        let p = ptrs(&mut storage);
        let mut list: STailList<TestNode, 0> = STailList::new();

        unsafe {
            list.push_back(p[0]);
        }
        assert!(list.size_is_1());
        assert!(!list.size_is_greater_than_1());
        assert_eq!(list.front(), list.back());

        unsafe {
            assert_eq!(list.pop_front(), p[0]);
            assert!(p[0].as_ref().links.is_unlinked(0));
        }
    }

    #[test]
    fn push_front_sets_back_on_empty() {
        let mut storage = nodes(2);
        let p = ptrs(&mut storage);
        let mut list: STailList<TestNode, 0> = STailList::new();

        unsafe {
            list.push_front(p[1]);
            assert_eq!(list.back(), Some(p[1]));
            list.push_front(p[0]);
            assert_eq!(list.back(), Some(p[1]));
            assert_eq!(values(&list), vec![0, 1]);
            list.pop_front();
            list.pop_front();
        }
    }

    #[test]
    fn insert_after_tail_updates_back() {
        let mut storage = nodes(3);
        let p = ptrs(&mut storage);
        let mut list: STailList<TestNode, 0> = STailList::new();

        unsafe {
            list.push_back(p[0]);
            list.insert_after(p[0], p[2]);
            assert_eq!(list.back(), Some(p[2]));
            list.insert_after(p[0], p[1]);
            assert_eq!(list.back(), Some(p[2]));
            assert_eq!(values(&list), vec![0, 1, 2]);
        }
    }

    #[test]
    fn remove_after_last_updates_back() {
        let mut storage = nodes(3);
        let p = ptrs(&mut storage);
        let mut list: STailList<TestNode, 0> = STailList::new();

        unsafe {
            for &n in &p {
                list.push_back(n);
            }

            assert_eq!(list.remove_after(p[1]), p[2]);
            assert_eq!(list.back(), Some(p[1]));
            assert!(p[2].as_ref().links.is_unlinked(0));

            assert_eq!(list.remove_after(p[0]), p[1]);
            assert_eq!(list.back(), Some(p[0]));
            assert!(list.size_is_1());
        }
    }

    #[test]
    fn cursor_drains_and_maintains_back() {
        let mut storage = nodes(3);
        let p = ptrs(&mut storage);
        let mut list: STailList<TestNode, 0> = STailList::new();

        unsafe {
            for &n in &p {
                list.push_back(n);
            }

            let mut cursor = list.cursor_mut();
            cursor.move_next(); // at element 1
            assert_eq!(cursor.remove_current(), Some(p[1]));
            assert_eq!(cursor.remove_current(), Some(p[2]));
            assert_eq!(cursor.current(), None);
            // Tail removal through the cursor must fix up back.
            assert_eq!(list.back(), Some(p[0]));
        }
    }

    #[test]
    fn swap_lists() {
        let mut storage = nodes(3);
        let p = ptrs(&mut storage);
        let mut a: STailList<TestNode, 0> = STailList::new();
        let mut b: STailList<TestNode, 0> = STailList::new();

        unsafe {
            a.push_back(p[0]);
            b.push_back(p[1]);
            b.push_back(p[2]);
        }

        a.swap(&mut b);
        assert_eq!(values(&a), vec![1, 2]);
        assert_eq!(values(&b), vec![0]);
        assert_eq!(a.back(), Some(p[2]));
        assert_eq!(b.back(), Some(p[0]));
    }

    #[test]
    fn clear_unlinks_all() {
        let mut storage = nodes(3);
        let p = ptrs(&mut storage);
        let mut list: STailList<TestNode, 0> = STailList::new();

        unsafe {
            for &n in &p {
                list.push_back(n);
            }
        }
        list.clear();
        assert!(list.is_empty());
        assert!(list.back().is_none());
        for &n in &p {
            assert!(unsafe { n.as_ref() }.links.is_unlinked(0));
        }
    }
}
