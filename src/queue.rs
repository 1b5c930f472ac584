use crate::config::QueueConfig;
use crate::invariants::{
    debug_assert_bounded_occupancy, debug_assert_empty_matches_count, debug_assert_no_underflow,
};
use crate::node::Node;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::{Arc, Condvar, Mutex};

// =============================================================================
// LOCK ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// This is a two-lock (Michael & Scott style) blocking queue. Producers
// touch only `tail`; consumers touch only `head`, except for one brief
// cross-lock read on the pop path.
//
// **Lock ordering**: `head` is always acquired before `tail` whenever a
// single operation needs both (the consumer's occupancy decrement).
// Producers never acquire `head`. This pair of rules is sufficient to
// prove deadlock freedom: a cycle would require some operation to hold
// `tail` while waiting on `head`, and no such operation exists.
//
// **Condvar predicates read no foreign lock.** `room_cv`'s predicate
// reads `tail.count`, which is already covered by the same mutex the
// condvar parks on. `data_cv`'s predicate would naturally need `tail`
// to test `head == tail`, which -- taken inside the predicate while
// `head` is held -- is legal under the ordering above but still an
// extra lock acquisition on every spurious wakeup. Instead, `tail_cached`
// mirrors the tail sentinel pointer with a single relaxed-write/acquire-read
// atomic, updated by the producer in the same critical section that
// updates the real tail pointer. The predicate reads only that atomic;
// the actual pop path re-confirms occupancy under the real `tail` lock
// before committing, so a stale read can only cost an extra spin, never
// an incorrect pop.
//
// =============================================================================

/// Tail-side state: the sentinel pointer and the occupancy counter,
/// both guarded by `tail_mutex`.
pub(crate) struct TailState<T> {
    /// Raw, non-owning pointer to the current sentinel node. The node
    /// it points to is owned by the `head` chain; it stays valid
    /// because the only way for a node to be freed is for `head` to
    /// advance past it, and `head` can reach this particular node only
    /// once `head == tail`, at which point every pop path returns
    /// before touching it.
    pub(crate) sentinel: *mut Node<T>,
    /// Number of items between `head` and `tail`, exclusive of the
    /// sentinel itself. The authoritative occupancy counter.
    pub(crate) count: usize,
}

/// A bounded, blocking, multi-producer / multi-consumer FIFO queue.
///
/// Producers call [`try_push`](Queue::try_push) or
/// [`wait_push`](Queue::wait_push); consumers call
/// [`try_pop`](Queue::try_pop) or [`wait_pop`](Queue::wait_pop) (or their
/// `_shared` variants, which hand back an `Arc<T>` instead of moving the
/// item out). [`stop_waiting`](Queue::stop_waiting) releases whichever
/// side is currently blocked without delivering data. See
/// `SPEC_FULL.md` for the full concurrency protocol.
pub struct Queue<T> {
    pub(crate) capacity: usize,
    pub(crate) head: Mutex<Box<Node<T>>>,
    pub(crate) tail: Mutex<TailState<T>>,
    tail_cached: AtomicPtr<Node<T>>,
    pub(crate) data_cv: Condvar,
    pub(crate) room_cv: Condvar,
    stop_wait_for_data: AtomicBool,
    stop_wait_for_room: AtomicBool,
}

// SAFETY: all mutation of the node chain happens through `head_mutex`
// or `tail_mutex`; the only unsynchronized field is `tail_cached`,
// which is itself atomic. `Queue<T>` is Send+Sync whenever `T` is Send
// (items are moved or read by one thread at a time, never shared
// without synchronization).
unsafe impl<T: Send> Send for Queue<T> {}
unsafe impl<T: Send> Sync for Queue<T> {}

impl<T> Queue<T> {
    /// Creates an empty queue with the given configuration.
    #[must_use]
    pub fn new(config: QueueConfig) -> Self {
        let mut sentinel_box = Box::new(Node::sentinel());
        let sentinel_ptr: *mut Node<T> = sentinel_box.as_mut();
        Self {
            capacity: config.capacity,
            head: Mutex::new(sentinel_box),
            tail: Mutex::new(TailState {
                sentinel: sentinel_ptr,
                count: 0,
            }),
            tail_cached: AtomicPtr::new(sentinel_ptr),
            data_cv: Condvar::new(),
            room_cv: Condvar::new(),
            stop_wait_for_data: AtomicBool::new(false),
            stop_wait_for_room: AtomicBool::new(false),
        }
    }

    /// The configured capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if the queue currently holds no items.
    ///
    /// Racy against concurrent pushes/pops by design: a `true` result
    /// can be stale by the time the caller acts on it.
    pub fn is_empty(&self) -> bool {
        let head = self.head.lock().unwrap();
        let tail = self.tail.lock().unwrap();
        let is_empty = std::ptr::eq(head.as_ref() as *const Node<T>, tail.sentinel.cast_const());
        debug_assert_empty_matches_count!(is_empty, tail.count);
        is_empty
    }

    /// Returns true if the queue is at capacity.
    ///
    /// Racy against concurrent pushes/pops, same caveat as
    /// [`is_empty`](Queue::is_empty).
    pub fn is_full(&self) -> bool {
        self.tail.lock().unwrap().count >= self.capacity
    }

    /// Current occupancy: number of items available to be popped.
    pub fn len(&self) -> usize {
        self.tail.lock().unwrap().count
    }

    // -------------------------------------------------------------------
    // PUSH
    // -------------------------------------------------------------------

    /// Attempts to enqueue `item` without blocking.
    ///
    /// Returns `false` if the queue is at capacity; `item` is dropped in
    /// that case (mirrors the original `try_push`, whose rejected value
    /// the caller already owns and can re-offer).
    pub fn try_push(&self, item: T) -> bool {
        let mut tail = self.tail.lock().unwrap();
        if tail.count >= self.capacity {
            return false;
        }
        self.push_locked(&mut tail, item);
        drop(tail);
        self.data_cv.notify_one();
        true
    }

    /// Enqueues `item`, blocking while the queue is full.
    ///
    /// If released by [`stop_waiting`](Queue::stop_waiting) instead of
    /// room becoming available, `item` is dropped without being
    /// enqueued.
    pub fn wait_push(&self, item: T) {
        let mut tail = self.tail.lock().unwrap();
        tail = self
            .room_cv
            .wait_while(tail, |t| {
                t.count >= self.capacity && !self.stop_wait_for_room.load(Ordering::Acquire)
            })
            .unwrap();

        if self.stop_wait_for_room.swap(false, Ordering::AcqRel) {
            return;
        }

        self.push_locked(&mut tail, item);
        drop(tail);
        self.data_cv.notify_one();
    }

    /// Writes `item` into the current sentinel, links a fresh sentinel
    /// after it, and advances the tail. Caller holds `tail_mutex` and
    /// has already confirmed `count < capacity`.
    fn push_locked(&self, tail: &mut TailState<T>, item: T) {
        let mut new_sentinel = Box::new(Node::sentinel());
        let new_sentinel_ptr: *mut Node<T> = new_sentinel.as_mut();

        // SAFETY: `tail.sentinel` is the node this `TailState` owns the
        // right to mutate: it was written by the last producer to hold
        // `tail_mutex`, and a consumer only ever reaches this exact
        // node by first observing `head == tail`, in which case it
        // returns without touching the node's fields. We hold
        // `tail_mutex`, so no other producer can race us here.
        unsafe {
            let sentinel = &mut *tail.sentinel;
            sentinel.item = Some(item);
            sentinel.next = Some(new_sentinel);
        }

        tail.sentinel = new_sentinel_ptr;
        tail.count += 1;
        debug_assert_bounded_occupancy!(tail.count, self.capacity);

        // Publish the new tail pointer for data_cv's lock-free
        // predicate. Release pairs with the Acquire load in wait_pop.
        self.tail_cached.store(new_sentinel_ptr, Ordering::Release);
    }

    // -------------------------------------------------------------------
    // POP
    // -------------------------------------------------------------------

    /// Attempts to dequeue an item without blocking.
    ///
    /// Returns `None` if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        let mut head = self.head.lock().unwrap();
        {
            let mut tail = self.tail.lock().unwrap();
            if std::ptr::eq(head.as_ref() as *const Node<T>, tail.sentinel.cast_const()) {
                return None;
            }
            debug_assert_no_underflow!(tail.count);
            tail.count -= 1;
        }
        let item = self.pop_locked(&mut head);
        drop(head);
        self.room_cv.notify_one();
        Some(item)
    }

    /// Dequeues an item, blocking while the queue is empty.
    ///
    /// Returns `None` if released by
    /// [`stop_waiting`](Queue::stop_waiting) instead of an item
    /// becoming available.
    pub fn wait_pop(&self) -> Option<T> {
        let mut head = self.head.lock().unwrap();
        head = self
            .data_cv
            .wait_while(head, |h| {
                let empty = std::ptr::eq(
                    h.as_ref() as *const Node<T>,
                    self.tail_cached.load(Ordering::Acquire).cast_const(),
                );
                empty && !self.stop_wait_for_data.load(Ordering::Acquire)
            })
            .unwrap();

        if self.stop_wait_for_data.swap(false, Ordering::AcqRel) {
            return None;
        }

        {
            let mut tail = self.tail.lock().unwrap();
            // `head` has been held continuously since before the
            // predicate last observed non-emptiness, and only a pop
            // (which requires `head_mutex`) could make the queue empty
            // again -- so this cannot actually be empty here. Checked
            // rather than assumed, since a stale `tail_cached` read can
            // still land us here when the real tail has since grown
            // further, never shrunk back.
            debug_assert!(!std::ptr::eq(
                head.as_ref() as *const Node<T>,
                tail.sentinel.cast_const()
            ));
            debug_assert_no_underflow!(tail.count);
            tail.count -= 1;
        }

        let item = self.pop_locked(&mut head);
        drop(head);
        self.room_cv.notify_one();
        Some(item)
    }

    /// Returns a popped item wrapped in `Arc`, for callers that want
    /// shared ownership of the result instead of taking it by value.
    pub fn try_pop_shared(&self) -> Option<Arc<T>> {
        self.try_pop().map(Arc::new)
    }

    /// `Arc`-returning variant of [`wait_pop`](Queue::wait_pop).
    pub fn wait_pop_shared(&self) -> Option<Arc<T>> {
        self.wait_pop().map(Arc::new)
    }

    /// Detaches the current head node and returns its payload. Caller
    /// holds `head_mutex` and has already confirmed (and accounted for,
    /// under `tail_mutex`) that `head != tail`.
    fn pop_locked(&self, head: &mut Box<Node<T>>) -> T {
        let next = head
            .next
            .take()
            .expect("a non-sentinel head always has a successor");
        let mut old_head = std::mem::replace(head, next);
        old_head
            .item
            .take()
            .expect("a non-sentinel head always carries an item")
    }

    // -------------------------------------------------------------------
    // STOP / WAKE
    // -------------------------------------------------------------------

    /// Releases whichever side is currently blocked, without delivering
    /// data: if the queue is empty, wakes every `wait_pop`; if it is
    /// full, wakes every `wait_push`. Does nothing if neither extreme
    /// currently holds -- this check is itself racy against
    /// concurrent mutation, so callers that need a guaranteed wake
    /// should call this only when a waiter is known to be parked.
    pub fn stop_waiting(&self) {
        if self.is_empty() {
            self.stop_wait_for_data.store(true, Ordering::Release);
            self.data_cv.notify_all();
        } else if self.is_full() {
            self.stop_wait_for_room.store(true, Ordering::Release);
            self.room_cv.notify_all();
        }
    }

    /// Unconditionally releases every blocked waiter on both sides,
    /// regardless of current occupancy. Useful for an unambiguous
    /// shutdown signal where `stop_waiting`'s "only the extreme side"
    /// rule would otherwise require the caller to guess which side (if
    /// either) is parked.
    pub fn stop_all(&self) {
        self.stop_wait_for_data.store(true, Ordering::Release);
        self.data_cv.notify_all();
        self.stop_wait_for_room.store(true, Ordering::Release);
        self.room_cv.notify_all();
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        // Walk the remaining chain iteratively so dropping a long queue
        // doesn't recurse once per node through the derived `Drop` on
        // nested `Box<Node<T>>`.
        let mut next = self.head.get_mut().unwrap().next.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}
