use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

/// Multi-producer, single-consumer queue of finished work.
///
/// Workers hold a [`CompletionSender`]; the owning simulation thread calls
/// [`CompletionQueue::drain`] once per tick. Items come out in the order they
/// were pushed.
pub struct CompletionQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

/// Cloneable producer half handed to worker jobs.
pub struct CompletionSender<T> {
    sender: Sender<T>,
}

impl<T> Clone for CompletionSender<T> {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

impl<T> CompletionSender<T> {
    /// Push a finished item. Returns false if the queue was dropped, in which
    /// case nobody is left to apply the result.
    pub fn push(&self, item: T) -> bool {
        self.sender.send(item).is_ok()
    }
}

impl<T> CompletionQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> CompletionSender<T> {
        CompletionSender { sender: self.sender.clone() }
    }

    /// Take everything queued so far, oldest first. Never blocks.
    pub fn drain(&self) -> Vec<T> {
        let mut drained = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(item) => drained.push(item),
                // The queue owns a sender, so Disconnected cannot happen while
                // `self` is alive; treat it like Empty anyway.
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        drained
    }
}

impl<T> Default for CompletionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
