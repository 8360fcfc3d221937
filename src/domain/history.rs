//! Bounded message history window.
//!
//! [`MessageHistory`] retains the most recent chat messages in insertion
//! order, evicting the oldest entry once capacity is reached. The window is
//! replayed verbatim to every newly joined participant as part of the
//! welcome. Messages outlive their author's disconnect.

use std::collections::VecDeque;

use super::ChatMessage;

/// Default number of retained messages.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Insertion-ordered, bounded chat history.
///
/// Append-only except for eviction at the head when the window is full.
#[derive(Debug)]
pub struct MessageHistory {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl MessageHistory {
    /// Creates an empty history retaining at most `capacity` messages.
    ///
    /// A capacity of zero retains nothing.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Appends a message, evicting the oldest entry when over capacity.
    pub fn push(&mut self, message: ChatMessage) {
        if self.capacity == 0 {
            return;
        }
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Iterates the retained window in original insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Returns the number of retained messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no messages are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
