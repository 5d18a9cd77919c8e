//! Bounded in-memory map from phone number to latest execution id.

use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Entries {
    by_number: HashMap<String, String>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

/// Remembers the most recent execution started for each phone number.
///
/// Holds at most `capacity` numbers; recording a new number when full
/// evicts the number that was recorded longest ago. Process-local only.
#[derive(Debug)]
pub struct ExecutionRegistry {
    capacity: usize,
    entries: RwLock<Entries>,
}

impl ExecutionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(Entries::default()),
        }
    }

    /// Record `execution_id` as the latest execution for `number`.
    pub async fn record(&self, number: &str, execution_id: &str) {
        let mut entries = self.entries.write().await;

        if entries
            .by_number
            .insert(number.to_string(), execution_id.to_string())
            .is_some()
        {
            entries.order.retain(|n| n != number);
        } else if entries.order.len() >= self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.by_number.remove(&oldest);
            }
        }

        entries.order.push_back(number.to_string());
    }

    /// Latest execution id recorded for `number`.
    pub async fn latest(&self, number: &str) -> Option<String> {
        self.entries.read().await.by_number.get(number).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.by_number.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_lookup() {
        let registry = ExecutionRegistry::new(4);
        assert!(registry.is_empty().await);

        registry.record("+1", "exec-1").await;
        assert_eq!(registry.latest("+1").await.as_deref(), Some("exec-1"));
        assert!(registry.latest("+2").await.is_none());
    }

    #[tokio::test]
    async fn test_newer_execution_replaces_older() {
        let registry = ExecutionRegistry::new(4);
        registry.record("+1", "exec-1").await;
        registry.record("+1", "exec-2").await;

        assert_eq!(registry.latest("+1").await.as_deref(), Some("exec-2"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_evicts_oldest_when_full() {
        let registry = ExecutionRegistry::new(2);
        registry.record("+1", "exec-1").await;
        registry.record("+2", "exec-2").await;
        registry.record("+3", "exec-3").await;

        assert!(registry.latest("+1").await.is_none());
        assert_eq!(registry.latest("+2").await.as_deref(), Some("exec-2"));
        assert_eq!(registry.latest("+3").await.as_deref(), Some("exec-3"));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_rerecording_refreshes_position() {
        let registry = ExecutionRegistry::new(2);
        registry.record("+1", "exec-1").await;
        registry.record("+2", "exec-2").await;
        registry.record("+1", "exec-3").await;
        registry.record("+4", "exec-4").await;

        // "+2" was the oldest after "+1" was refreshed
        assert!(registry.latest("+2").await.is_none());
        assert_eq!(registry.latest("+1").await.as_deref(), Some("exec-3"));
        assert_eq!(registry.latest("+4").await.as_deref(), Some("exec-4"));
    }

    #[tokio::test]
    async fn test_zero_capacity_keeps_one() {
        let registry = ExecutionRegistry::new(0);
        registry.record("+1", "exec-1").await;
        registry.record("+2", "exec-2").await;

        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.latest("+2").await.as_deref(), Some("exec-2"));
    }
}
