//! Two producers and one consumer sharing a small bounded queue, with
//! a stop signal used to shut the consumer down cleanly once both
//! producers are done.

use boundedq::{Queue, QueueConfig};
use std::sync::Arc;
use std::thread;

fn main() {
    let queue = Arc::new(Queue::<u32>::new(QueueConfig::new(4)));

    let producers: Vec<_> = (0u32..2)
        .map(|id| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..10 {
                    queue.wait_push(id * 100 + i);
                }
            })
        })
        .collect();

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut received = Vec::new();
            while received.len() < 20 {
                if let Some(item) = queue.wait_pop() {
                    received.push(item);
                }
            }
            received
        })
    };

    for producer in producers {
        producer.join().unwrap();
    }

    // Every item the producers were going to send has already been
    // enqueued by the time their threads join, so the consumer will
    // reach 20 items on its own; stop_waiting here demonstrates the
    // shutdown path rather than being load-bearing for this demo.
    queue.stop_waiting();

    let received = consumer.join().unwrap();
    println!("consumer received {} items", received.len());
    println!("queue empty: {}", queue.is_empty());
}
