//! Priority queue for tracking margin health (min-heap by health)

use crate::health::MarginHealth;
use priority_queue::PriorityQueue;
use solana_sdk::pubkey::Pubkey;
use std::cmp::Reverse;
use std::collections::HashMap;
use zod_common::Fixed;

/// Health-based priority queue (min-heap: lowest health first)
pub struct HealthQueue {
    /// Priority queue (using Reverse for min-heap)
    queue: PriorityQueue<Pubkey, Reverse<Fixed>>,
    /// Map for O(1) lookups
    map: HashMap<Pubkey, MarginHealth>,
}

impl HealthQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            map: HashMap::new(),
        }
    }

    /// Push or update a margin account's health
    pub fn push(&mut self, health: MarginHealth) {
        let margin = health.margin;
        let priority = Reverse(health.health);

        self.map.insert(margin, health);
        self.queue.push(margin, priority);
    }

    /// Pop the account with the lowest health
    pub fn pop(&mut self) -> Option<MarginHealth> {
        let (margin, _priority) = self.queue.pop()?;
        self.map.remove(&margin)
    }

    /// Peek at the account with the lowest health without removing
    pub fn peek(&self) -> Option<&MarginHealth> {
        let (margin, _priority) = self.queue.peek()?;
        self.map.get(margin)
    }

    /// Remove an account from the queue
    pub fn remove(&mut self, margin: &Pubkey) -> Option<MarginHealth> {
        self.queue.remove(margin);
        self.map.remove(margin)
    }

    /// Get an account's health by margin address
    pub fn get(&self, margin: &Pubkey) -> Option<&MarginHealth> {
        self.map.get(margin)
    }

    /// Check if queue contains an account
    pub fn contains(&self, margin: &Pubkey) -> bool {
        self.map.contains_key(margin)
    }

    /// Get number of accounts in queue
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Accounts whose omf has crossed below mmf (liquidatable)
    pub fn get_liquidatable(&self) -> Vec<MarginHealth> {
        self.map
            .values()
            .filter(|h| h.needs_liquidation())
            .cloned()
            .collect()
    }

    /// Accounts that carry debt but no seizable collateral; these need
    /// bankruptcy settlement instead of liquidation
    pub fn get_bankrupt(&self) -> Vec<MarginHealth> {
        self.map
            .values()
            .filter(|h| h.bankrupt)
            .cloned()
            .collect()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.queue.clear();
        self.map.clear();
    }
}

impl Default for HealthQueue {
    fn default() -> Self {
        Self::new()
    }
}
