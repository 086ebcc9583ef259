// In-memory queue storage

use hopper_core::domain::Message;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::Notify;

/// One named queue: a deque under its own lock plus a wakeup for waiting consumers
#[derive(Debug, Default)]
pub(crate) struct MemoryQueue {
    items: Mutex<VecDeque<Message>>,
    pub(crate) available: Notify,
}

impl MemoryQueue {
    pub(crate) fn push_back(&self, message: Message) {
        self.items().push_back(message);
        self.available.notify_one();
    }

    /// Nack path: the message is redelivered ahead of everything pending
    pub(crate) fn push_front(&self, message: Message) {
        self.items().push_front(message);
        self.available.notify_one();
    }

    pub(crate) fn pop_front(&self) -> Option<Message> {
        self.items().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.items().len()
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<Message>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// State shared by a broker and every handle it created
#[derive(Debug, Default)]
pub(crate) struct SharedState {
    queues: RwLock<HashMap<String, Arc<MemoryQueue>>>,
    closed: AtomicBool,
}

impl SharedState {
    /// Get the queue called `name`, creating it on first use
    pub(crate) fn queue(&self, name: &str) -> Arc<MemoryQueue> {
        if let Some(queue) = self.read().get(name) {
            return Arc::clone(queue);
        }

        let mut queues = self.queues.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(queues.entry(name.to_string()).or_default())
    }

    pub(crate) fn existing(&self, name: &str) -> Option<Arc<MemoryQueue>> {
        self.read().get(name).cloned()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns false if the broker was already closed
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        for queue in self.read().values() {
            queue.available.notify_waiters();
        }
        true
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<MemoryQueue>>> {
        self.queues.read().unwrap_or_else(PoisonError::into_inner)
    }
}
