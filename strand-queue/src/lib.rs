//! Lock-free intrusive queues for real-time message passing.
//!
//! Three primitives, all allocation-free and non-blocking, all threading
//! their items through a link slot the client's node type embeds (see
//! `strand-collections` for the slot model):
//!
//! - [`PopAllStack`] — multi-producer multi-consumer LIFO stack whose only
//!   pop primitive atomically takes *everything*. The building block for
//!   the other two.
//! - [`MpscQueue`] — multi-producer single-consumer FIFO built from a
//!   [`PopAllStack`] plus a consumer-private reversing buffer.
//! - [`ResultQueue`] — single-producer single-consumer queue with relaxed
//!   delivery order and outstanding-request counting, meant to be
//!   embedded in a request node so a server can reply without allocating.
//!
//! A typical server wires them together like this: clients allocate
//! request nodes from a `strand-pool`, push them onto a worker's
//! [`MpscQueue`], the worker pops in FIFO order and replies through the
//! [`ResultQueue`] embedded in each request, and the client drains
//! replies and returns nodes to the pool. No step blocks, and nothing
//! allocates after startup.
//!
//! # Roles, not handles
//!
//! These containers are designed to be embedded in client structures
//! (often inside nodes themselves), so they are single objects rather
//! than split producer/consumer handles. Operations that are only sound
//! from one role's thread — the MPSC consumer side, both sides of the
//! SPSC queue — are `unsafe fn`s whose contracts name the role; the
//! caller pins each role to a thread exactly as it would in any
//! single-consumer discipline.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, missing_debug_implementations)]

mod mpsc;
mod pop_all_stack;
mod result_queue;

pub use mpsc::MpscQueue;
pub use pop_all_stack::PopAllStack;
pub use result_queue::ResultQueue;

/// Link validation: on in debug builds, or anywhere via the
/// `validate-links` feature.
pub(crate) const VALIDATE_LINKS: bool =
    cfg!(debug_assertions) || cfg!(feature = "validate-links");
