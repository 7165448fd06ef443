//! Request/reply between a client and a worker thread, allocation-free
//! after startup.
//!
//! The client allocates request nodes from a pool, pushes them onto the
//! worker's MPSC queue, and counts each dispatch on a result queue. The
//! worker pops requests in FIFO order, fills in the answer, and pushes
//! the same node back through the result queue. The client drains
//! replies until nothing is outstanding and returns every node to the
//! pool.
//!
//! Run with: `cargo run --example request_reply`

use std::ptr::NonNull;

use strand_collections::{impl_linked, Links};
use strand_pool::NodePool;
use strand_queue::{MpscQueue, ResultQueue};

const REQUESTS: usize = 32;

#[derive(Default)]
struct Request {
    // Slot 0 carries the node through the submit queue, then through the
    // reply queue; it is in at most one of them at a time.
    links: Links<Request, 1>,
    input: u64,
    output: u64,
}

impl_linked!(Request, links, 0);

// Safety: requests are plain data handed between threads by pointer; the
// queues mediate all ownership transfer.
unsafe impl Send for Request {}

fn main() {
    let pool: NodePool<Request> = NodePool::new(REQUESTS).unwrap();
    let submit: MpscQueue<Request, 0> = MpscQueue::new();
    let replies: ResultQueue<Request, 0> = ResultQueue::new();

    std::thread::scope(|s| {
        let submit = &submit;
        let replies = &replies;

        // Worker: consumer of the submit queue, producer of replies.
        s.spawn(move || {
            let mut served = 0;
            while served < REQUESTS {
                // Safety: this thread is the only submit-queue consumer
                // and the only reply producer.
                match unsafe { submit.pop() } {
                    Some(mut node) => {
                        let request = unsafe { node.as_mut() };
                        request.output = request.input * request.input;
                        unsafe { replies.push(node) };
                        served += 1;
                    }
                    None => std::hint::spin_loop(),
                }
            }
        });

        // Client: producer of requests, consumer of replies.
        for i in 0..REQUESTS {
            let mut node = pool.allocate().expect("pool sized for all requests");
            unsafe {
                node.as_mut().input = i as u64;
                // Count the dispatch before the worker can possibly reply.
                replies.increment_expected_result_count(1);
                submit.push(node);
            }
        }

        let mut total = 0u64;
        // Safety: this thread is the only reply consumer.
        while unsafe { replies.expected_result_count() } > 0 {
            match unsafe { replies.pop() } {
                Some(node) => {
                    let request = unsafe { node.as_ref() };
                    total += request.output;
                    unsafe { pool.deallocate(node) };
                }
                None => std::hint::spin_loop(),
            }
        }

        // sum of squares 0^2..31^2
        assert_eq!(total, (0..REQUESTS as u64).map(|i| i * i).sum());
        println!("served {REQUESTS} requests, sum of squares = {total}");
    });
}
