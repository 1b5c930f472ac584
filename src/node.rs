//! The linked-list node type shared by the head and tail sides of the
//! queue.
//!
//! # Ownership model
//!
//! The chain of nodes from `head` to `tail` is owned, one `Box` at a
//! time, by whatever currently holds the head pointer (see `queue.rs`).
//! The tail side holds a raw, non-owning pointer into the same chain —
//! this is the classic two-lock queue shape (Michael & Scott), and the
//! reason `tail` must be a raw pointer rather than a second owning
//! reference: Rust has no built-in way to express "two live references
//! into the same owned structure, one of which may outlive shrinking
//! from the other end" without `unsafe`.
//!
//! Every node except the one `tail` currently points to holds a live
//! item. The node `tail` points to is the *sentinel*: it carries no
//! payload and exists so that `head == tail` is a sufficient emptiness
//! test without ever needing to inspect `Option`
//! state through two different locks at once.

/// One link in the queue's singly-linked list.
pub(crate) struct Node<T> {
    /// `None` for the sentinel node pointed to by `tail`; `Some` for
    /// every other node in the chain.
    pub(crate) item: Option<T>,
    /// The next node, owned by this one. `None` only ever appears on
    /// the sentinel (the last node in the chain).
    pub(crate) next: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    /// Creates a fresh sentinel: no payload, no successor.
    pub(crate) fn sentinel() -> Self {
        Self {
            item: None,
            next: None,
        }
    }
}
