use dashmap::DashMap;
use tracing::debug;

use super::emitter::{EmitResult, EmitterError};
use super::listener::{same_handler, ListenerHandle};

/// One registered listener within an event's sequence.
#[derive(Clone)]
pub(crate) struct ListenerRecord {
    pub handler: ListenerHandle,
    pub one_shot: bool,
}

/// A slot observed by the dispatcher at a given index of a sequence.
pub(crate) enum SlotView {
    /// The index is past the live end of the sequence.
    End,
    /// A tombstone left by removal; skipped by walks.
    Hole,
    /// A live record, cloned out of the registry lock.
    Active(ListenerRecord),
}

/// Concurrent storage for listener sequences, keyed by event name.
///
/// An entry, once created, persists as an empty-or-nonempty sequence for the
/// lifetime of the emitter. Removal never compacts a sequence: it clears the
/// slot to `None`, preserving the indices of the remaining records so that
/// walks in flight observe a stable ordering.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    entries: DashMap<String, Vec<Option<ListenerRecord>>>,
}

impl ListenerRegistry {
    fn validate_name(name: &str) -> EmitResult<()> {
        if name.is_empty() {
            return Err(EmitterError::InvalidEventName);
        }
        Ok(())
    }

    /// Appends a record for `name`, creating the sequence if absent.
    pub fn add(
        &self,
        name: &str,
        handler: ListenerHandle,
        one_shot: bool,
    ) -> EmitResult<()> {
        Self::validate_name(name)?;
        self.entries
            .entry(name.to_string())
            .or_default()
            .push(Some(ListenerRecord { handler, one_shot }));
        debug!("Registered listener for event: {} (once: {})", name, one_shot);
        Ok(())
    }

    /// Validated removal, used by `off`.
    pub fn remove(&self, name: &str, handler: &ListenerHandle) -> EmitResult<()> {
        Self::validate_name(name)?;
        self.remove_first(name, handler);
        Ok(())
    }

    /// Clears the first slot holding `handler`, creating the sequence if
    /// absent. A missing match is a no-op.
    pub fn remove_first(&self, name: &str, handler: &ListenerHandle) {
        let mut sequence = self.entries.entry(name.to_string()).or_default();
        let found = sequence.iter_mut().find(
            |slot| matches!(slot, Some(record) if same_handler(&record.handler, handler)),
        );
        if let Some(slot) = found {
            *slot = None;
            debug!("Removed listener for event: {}", name);
        }
    }

    /// Ensures an (empty) sequence exists for `name` without validating it.
    pub fn ensure(&self, name: &str) {
        self.entries.entry(name.to_string()).or_default();
    }

    /// Reads the slot at `index` of the live sequence for `name`.
    ///
    /// The shard lock is released before this returns; the record, if any,
    /// is a clone.
    pub fn slot_at(&self, name: &str, index: usize) -> SlotView {
        let Some(sequence) = self.entries.get(name) else {
            return SlotView::End;
        };
        match sequence.get(index) {
            None => SlotView::End,
            Some(None) => SlotView::Hole,
            Some(Some(record)) => SlotView::Active(record.clone()),
        }
    }

    /// Number of live (non-tombstone) records registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.entries
            .get(name)
            .map(|sequence| sequence.iter().filter(|slot| slot.is_some()).count())
            .unwrap_or(0)
    }

    /// Names with an existing entry, including empty ones.
    pub fn event_names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::listener::listener_fn;
    use crate::event::value::Value;

    fn noop() -> ListenerHandle {
        listener_fn(|_| async { Ok(Value::Null) })
    }

    #[test]
    fn test_add_rejects_empty_name() {
        let registry = ListenerRegistry::default();
        let result = registry.add("", noop(), false);
        assert!(matches!(result, Err(EmitterError::InvalidEventName)));
    }

    #[test]
    fn test_remove_leaves_tombstone() {
        let registry = ListenerRegistry::default();
        let first = noop();
        let second = noop();
        registry.add("tick", first.clone(), false).unwrap();
        registry.add("tick", second, false).unwrap();

        registry.remove("tick", &first).unwrap();

        // index 0 is now a hole, index 1 still live
        assert!(matches!(registry.slot_at("tick", 0), SlotView::Hole));
        assert!(matches!(registry.slot_at("tick", 1), SlotView::Active(_)));
        assert_eq!(registry.listener_count("tick"), 1);
    }

    #[test]
    fn test_remove_first_only_clears_first_match() {
        let registry = ListenerRegistry::default();
        let handler = noop();
        registry.add("tick", handler.clone(), false).unwrap();
        registry.add("tick", handler.clone(), false).unwrap();

        registry.remove_first("tick", &handler);
        assert_eq!(registry.listener_count("tick"), 1);

        registry.remove_first("tick", &handler);
        assert_eq!(registry.listener_count("tick"), 0);

        // no match left: no-op
        registry.remove_first("tick", &handler);
        assert_eq!(registry.listener_count("tick"), 0);
    }

    #[test]
    fn test_remove_creates_entry_for_unknown_name() {
        let registry = ListenerRegistry::default();
        registry.remove("never-registered", &noop()).unwrap();
        assert!(registry
            .event_names()
            .contains(&"never-registered".to_string()));
        assert_eq!(registry.listener_count("never-registered"), 0);
    }

    #[test]
    fn test_entry_persists_after_all_removals() {
        let registry = ListenerRegistry::default();
        let handler = noop();
        registry.add("tick", handler.clone(), false).unwrap();
        registry.remove("tick", &handler).unwrap();

        assert!(registry.event_names().contains(&"tick".to_string()));
        assert!(matches!(registry.slot_at("tick", 0), SlotView::Hole));
    }
}
