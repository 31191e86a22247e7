use crate::runtime::{
    data_structures::{dictionary::Word, value::Value},
    interpreter::ThreadSummary,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Condvar, Mutex,
    },
    thread::JoinHandle,
};

/// An unbounded FIFO of values shared between two interpreter threads.  Pushes never block, pops
/// block until a value is available.  One mutex and one condition variable, exactly the shape a
/// blocking queue wants.
pub struct BlockingQueue {
    items: Mutex<VecDeque<Value>>,
    available: Condvar,
}

impl Default for BlockingQueue {
    fn default() -> Self {
        BlockingQueue::new()
    }
}

impl BlockingQueue {
    pub fn new() -> BlockingQueue {
        BlockingQueue {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    pub fn new_ptr() -> Arc<BlockingQueue> {
        Arc::new(BlockingQueue::new())
    }

    /// How many values are waiting.
    pub fn depth(&self) -> usize {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    /// Enqueue a value and wake one blocked consumer.
    pub fn push(&self, value: Value) {
        let mut items = self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        items.push_back(value);
        self.available.notify_one();
    }

    /// Dequeue the oldest value, blocking until one is available.  Values from a single producer
    /// come out in the order they were pushed.
    pub fn pop(&self) -> Value {
        let mut items = self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        loop {
            if let Some(value) = items.pop_front() {
                return value;
            }

            items = self
                .available
                .wait(items)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

/// The record kept for one running, or recently finished, sub-thread.
pub struct SubThread {
    /// The word the thread was started to run.
    pub word: Word,

    /// The join handle, present until the thread is reaped.
    pub handle: Option<JoinHandle<()>>,

    /// Set when the thread has finished but still has undrained outputs.  The entry is reaped
    /// when the last output is popped.
    pub finished: bool,

    /// Values sent to the thread, popped by its thread.pop word.
    pub inputs: Arc<BlockingQueue>,

    /// Values the thread produced, popped by thread.pop-from in other threads.
    pub outputs: Arc<BlockingQueue>,
}

/// The thread bookkeeping shared by an interpreter and all of its sub-thread clones.  The root
/// ancestor creates it and every clone holds the same Arc, so sub-threads spawned from
/// sub-threads still register in one place.
pub struct ThreadState {
    threads: Mutex<HashMap<u64, SubThread>>,
    next_id: AtomicU64,
}

pub type ThreadStatePtr = Arc<ThreadState>;

impl Default for ThreadState {
    fn default() -> Self {
        ThreadState::new()
    }
}

impl ThreadState {
    pub fn new() -> ThreadState {
        ThreadState {
            threads: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn new_ptr() -> ThreadStatePtr {
        Arc::new(ThreadState::new())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, SubThread>> {
        self.threads.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Allocate an id and register a new sub-thread entry for it.  The join handle is attached
    /// separately once the thread has been spawned.
    pub fn register(
        &self,
        word: Word,
        inputs: Arc<BlockingQueue>,
        outputs: Arc<BlockingQueue>,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.lock().insert(
            id,
            SubThread {
                word,
                handle: None,
                finished: false,
                inputs,
                outputs,
            },
        );

        id
    }

    /// Attach the join handle to a registered entry.  The entry can already be gone if the
    /// thread ran to completion with no outputs first, in which case the handle is simply
    /// dropped and the finished thread is detached.
    pub fn attach_handle(&self, id: u64, handle: JoinHandle<()>) {
        if let Some(entry) = self.lock().get_mut(&id) {
            entry.handle = Some(handle);
        }
    }

    /// Called by a sub-thread as it finishes.  The entry is dropped right away when its outputs
    /// have been drained, otherwise it is marked finished and lingers until the last output is
    /// popped.
    pub fn finish(&self, id: u64) {
        let mut threads = self.lock();

        if let Some(entry) = threads.get_mut(&id) {
            if entry.outputs.depth() == 0 {
                threads.remove(&id);
            } else {
                entry.finished = true;
            }
        }
    }

    /// The input queue of a thread, if that thread is known.
    pub fn inputs_of(&self, id: u64) -> Option<Arc<BlockingQueue>> {
        self.lock().get(&id).map(|entry| entry.inputs.clone())
    }

    /// The output queue of a thread, if that thread is known.
    pub fn outputs_of(&self, id: u64) -> Option<Arc<BlockingQueue>> {
        self.lock().get(&id).map(|entry| entry.outputs.clone())
    }

    /// Drop the entry for a finished thread whose outputs have been fully drained.  Returns the
    /// join handle so the caller can join outside the map lock.
    pub fn reap_if_drained(&self, id: u64) -> Option<JoinHandle<()>> {
        let mut threads = self.lock();

        match threads.get(&id) {
            Some(entry) if entry.finished && entry.outputs.depth() == 0 => threads
                .remove(&id)
                .and_then(|mut removed| removed.handle.take()),

            _ => None,
        }
    }

    /// Snapshot every live entry for the `.t` listing.
    pub fn summaries(&self) -> Vec<ThreadSummary> {
        let threads = self.lock();
        let mut summaries: Vec<ThreadSummary> = threads
            .iter()
            .map(|(id, entry)| ThreadSummary {
                id: *id,
                word_name: entry.word.name.clone(),
                finished: entry.finished,
                pending_inputs: entry.inputs.depth(),
                pending_outputs: entry.outputs.depth(),
            })
            .collect();

        summaries.sort_by_key(|summary| summary.id);
        summaries
    }
}
