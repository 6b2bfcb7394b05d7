//! Agent message log
//!
//! Append-only list of advisor messages shown in the side panel.
//! Rebuilt every session; never written to the durable slot.

use crate::models::AgentMessage;
use std::collections::VecDeque;

/// Number of entries the side panel displays
pub const RECENT_WINDOW: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct AgentLog {
    messages: VecDeque<AgentMessage>,
}

impl AgentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: AgentMessage) {
        self.messages.push_back(message);
    }

    /// Most recent `count` entries, newest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &AgentMessage> {
        self.messages.iter().rev().take(count)
    }

    pub fn messages(&self) -> impl Iterator<Item = &AgentMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
