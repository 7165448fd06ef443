//! Intrusive singly- and doubly-linked lists over client-owned nodes.
//!
//! Every container in this crate is *intrusive*: the client's node type
//! embeds an array of link slots, and each container is parameterized by
//! the node type and by the compile-time index of the slot it threads
//! through. One node can therefore sit in several disjoint containers at
//! once (one slot each), and a single slot can be reused by different
//! containers at different phases of the node's life. No allocation ever
//! happens on insertion.
//!
//! The containers never own node storage. They link and unlink nodes the
//! caller hands them as [`NonNull`](core::ptr::NonNull) pointers, which is
//! why every inserting or removing operation is an `unsafe fn` with an
//! explicit contract: the node must be valid for as long as it is linked,
//! and must be in at most one container at a time.
//!
//! # Quick start
//!
//! ```
//! use std::ptr::NonNull;
//! use strand_collections::{impl_linked, Links, SList};
//!
//! struct Job {
//!     links: Links<Job, 1>,
//!     id: u32,
//! }
//!
//! impl_linked!(Job, links, 0);
//!
//! let mut a = Job { links: Links::new(), id: 1 };
//! let mut b = Job { links: Links::new(), id: 2 };
//!
//! let mut pending: SList<Job, 0> = SList::new();
//! unsafe {
//!     pending.push_front(NonNull::from(&mut a));
//!     pending.push_front(NonNull::from(&mut b));
//!
//!     assert_eq!(pending.pop_front().as_ref().id, 2);
//!     assert_eq!(pending.pop_front().as_ref().id, 1);
//! }
//! assert!(pending.is_empty());
//! ```
//!
//! # Validation
//!
//! In debug builds (or with the `validate-links` feature) inserts assert
//! that the incoming node's slots are null and removals zero the outgoing
//! node's slots, catching double-insertion bugs early. Release builds
//! compile the checks out entirely.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

mod dlist;
mod link;
mod slist;
mod stail_list;

pub use dlist::{DList, DListIter};
pub use link::{AtomicLinked, AtomicLinks, Linked, Links};
pub use slist::{SList, SListCursorMut, SListIter};
pub use stail_list::{STailList, STailListCursorMut, STailListIter};

/// Link validation: on in debug builds, or anywhere via the
/// `validate-links` feature.
pub(crate) const VALIDATE_LINKS: bool =
    cfg!(debug_assertions) || cfg!(feature = "validate-links");
