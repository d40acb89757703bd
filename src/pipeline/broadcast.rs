//! Bounded multi subscriber broadcast, dropping oldest items on overflow
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::warn;
use tokio::sync::Notify;

#[derive(Debug)]
struct Ring<T> {
    items: VecDeque<T>,
    /// Sequence number of the front item
    head: u64,
    capacity: usize,
    replay: usize,
    overflows: u64,
    closed: bool,
}

impl<T> Ring<T> {
    /// Sequence number the next published item will get
    fn tail(&self) -> u64 {
        self.head + self.items.len() as u64
    }
}

#[derive(Debug)]
struct Shared<T> {
    name: String,
    ring: Mutex<Ring<T>>,
    notify: Notify,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// [Broadcast] channel: producers never block. Once `capacity` items are
/// retained, publishing drops the oldest one, whether subscribers consumed
/// it or not. Each [Subscriber] owns an independent cursor.
#[derive(Debug)]
pub struct Broadcast<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone> Broadcast<T> {
    /// Creates a new [Broadcast] retaining up to `capacity` items.
    /// New subscribers replay up to `replay` most recent items.
    pub fn new(name: &str, replay: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                name: name.to_string(),
                notify: Notify::new(),
                ring: Mutex::new(Ring {
                    capacity,
                    replay: replay.min(capacity),
                    head: 0,
                    overflows: 0,
                    closed: false,
                    items: VecDeque::with_capacity(capacity),
                }),
            }),
        }
    }

    /// Publishes one item. Returns false if this channel is closed.
    pub fn publish(&self, item: T) -> bool {
        {
            let mut ring = self.shared.lock();
            if ring.closed {
                return false;
            }
            if ring.items.len() == ring.capacity {
                ring.items.pop_front();
                ring.head += 1;
                ring.overflows += 1;
                warn!(
                    "{}: overflow, oldest item dropped ({} total)",
                    self.shared.name, ring.overflows
                );
            }
            ring.items.push_back(item);
        }
        self.shared.notify.notify_waiters();
        true
    }

    /// Creates a new [Subscriber], that will first replay retained items
    pub fn subscribe(&self) -> Subscriber<T> {
        let ring = self.shared.lock();
        let replayed = (ring.items.len() as u64).min(ring.replay as u64);
        Subscriber {
            shared: Arc::clone(&self.shared),
            cursor: ring.tail() - replayed,
            missed: 0,
        }
    }

    /// Closes this channel: subscribers drain what remains then terminate
    pub fn close(&self) {
        self.shared.lock().closed = true;
        self.shared.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Number of items dropped on overflow so far
    pub fn overflows(&self) -> u64 {
        self.shared.lock().overflows
    }

    /// Number of items currently retained
    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [Broadcast] consumer
#[derive(Debug)]
pub struct Subscriber<T> {
    shared: Arc<Shared<T>>,
    cursor: u64,
    missed: u64,
}

impl<T: Clone> Subscriber<T> {
    /// Number of items this [Subscriber] lost to overflows
    pub fn missed(&self) -> u64 {
        self.missed
    }

    /// Returns the next item, if one is available
    pub fn try_recv(&mut self) -> Option<T> {
        let ring = self.shared.lock();
        if self.cursor < ring.head {
            self.missed += ring.head - self.cursor;
            self.cursor = ring.head;
        }
        let item = ring.items.get((self.cursor - ring.head) as usize)?.clone();
        self.cursor += 1;
        Some(item)
    }

    /// Waits for the next item. Returns None once the channel
    /// is closed and drained. Cancel safe.
    pub async fn recv(&mut self) -> Option<T> {
        let shared = Arc::clone(&self.shared);
        loop {
            let notified = shared.notify.notified();
            if let Some(item) = self.try_recv() {
                return Some(item);
            }
            if shared.lock().closed {
                return None;
            }
            notified.await;
        }
    }
}
