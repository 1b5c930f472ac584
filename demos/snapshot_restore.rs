//! Writes a queue's contents to disk and restores them into a fresh
//! queue, demonstrating the snapshot/restore round trip.

use boundedq::{Queue, QueueConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Reading {
    sensor_id: u32,
    value: f64,
}

fn main() {
    let queue = Queue::<Reading>::new(QueueConfig::new(16));
    for i in 0..5 {
        queue.try_push(Reading {
            sensor_id: i,
            value: f64::from(i) * 1.5,
        });
    }

    let path = queue
        .store_to_disk("snapshot-")
        .expect("snapshot write should succeed");
    println!("wrote snapshot to {}", path.display());

    let restored = Queue::<Reading>::new(QueueConfig::new(16));
    restored
        .try_read_from_disk(&path)
        .expect("snapshot read should succeed");

    while let Some(reading) = restored.try_pop() {
        println!("restored sensor {} = {}", reading.sensor_id, reading.value);
    }

    std::fs::remove_file(&path).ok();
}
