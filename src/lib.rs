//! A bounded, blocking, multi-producer / multi-consumer FIFO queue.
//!
//! `Queue<T>` is a two-lock (Michael & Scott style) linked-list queue:
//! producers and consumers contend on separate mutexes except for one
//! brief cross-lock read on the pop path, back-pressure blocks a
//! producer once the queue reaches its configured capacity, and a
//! cooperative stop/wake protocol lets a caller release a blocked
//! thread without ever delivering it an item. See `SPEC_FULL.md` for
//! the full design.
//!
//! # Example
//!
//! ```
//! use boundedq::{Queue, QueueConfig};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(Queue::<u32>::new(QueueConfig::new(4)));
//!
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         for i in 0..10 {
//!             queue.wait_push(i);
//!         }
//!     })
//! };
//!
//! let mut received = Vec::new();
//! while received.len() < 10 {
//!     if let Some(item) = queue.wait_pop() {
//!         received.push(item);
//!     }
//! }
//! producer.join().unwrap();
//!
//! assert_eq!(received, (0..10).collect::<Vec<_>>());
//! ```
//!
//! Snapshotting to and restoring from disk is available whenever `T`
//! implements the relevant `serde` trait:
//!
//! ```
//! use boundedq::{Queue, QueueConfig};
//!
//! let queue = Queue::<u32>::new(QueueConfig::new(16));
//! queue.try_push(1);
//! queue.try_push(2);
//!
//! let dir = tempfile::tempdir().unwrap();
//! let prefix = dir.path().join("snapshot-").to_string_lossy().into_owned();
//! let path = queue.store_to_disk(&prefix).unwrap();
//!
//! let restored = Queue::<u32>::new(QueueConfig::new(16));
//! restored.try_read_from_disk(&path).unwrap();
//! assert_eq!(restored.try_pop(), Some(1));
//! assert_eq!(restored.try_pop(), Some(2));
//! ```

mod config;
mod error;
mod invariants;
mod node;
mod persist;
mod queue;

pub use config::QueueConfig;
pub use error::PersistError;
pub use queue::Queue;
