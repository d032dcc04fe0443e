//! In-memory ordered event collection.

use crate::event::Event;

/// Events of the session in insertion order.
///
/// Positions are insertion positions, not chronological ones. Index-based
/// operations require a valid position; check with [`EventStore::get`] first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn append(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Overwrites the event at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn replace_at(&mut self, index: usize, event: Event) {
        self.events[index] = event;
    }

    /// Removes and returns the event at `index`, shifting later events down.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn remove_at(&mut self, index: usize) -> Event {
        self.events.remove(index)
    }

    pub fn all(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub const fn len(&self) -> usize {
        self.events.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Replaces the whole collection.
    pub fn replace_all(&mut self, events: Vec<Event>) {
        self.events = events;
    }

    /// Folds a freshly loaded remote collection into the store.
    ///
    /// The result is the remote events in remote order followed by every
    /// local event that has no equal remote counterpart, in local order.
    /// Returns how many local-only events were kept.
    pub fn merge_loaded(&mut self, remote: Vec<Event>) -> usize {
        let local = std::mem::replace(&mut self.events, remote);
        let mut kept = 0;
        for event in local {
            if !self.events.contains(&event) {
                self.events.push(event);
                kept += 1;
            }
        }
        tracing::debug!(total = self.events.len(), kept, "merged loaded events");
        kept
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};

    fn event(type_name: &str, hour: u32) -> Event {
        Event {
            type_name: type_name.to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap(),
            duration: 60,
            volume: None,
            side: None,
            fields: BTreeMap::new(),
        }
    }

    #[test]
    fn positions_follow_insertion_order() {
        let mut store = EventStore::new();
        store.append(event("Sleeping", 9));
        store.append(event("Pumping", 3));
        store.append(event("Sleeping", 9));

        assert_eq!(store.len(), 3);
        assert_eq!(store.get(1).unwrap().type_name, "Pumping");
        assert_eq!(store.all()[0], store.all()[2]);
    }

    #[test]
    fn replace_and_remove_by_position() {
        let mut store = EventStore::from_events(vec![
            event("Sleeping", 1),
            event("Pumping", 2),
            event("Breastfeeding", 3),
        ]);

        store.replace_at(1, event("Snack", 4));
        assert_eq!(store.all()[1].type_name, "Snack");

        let removed = store.remove_at(0);
        assert_eq!(removed.type_name, "Sleeping");
        let names: Vec<_> = store.all().iter().map(|e| e.type_name.as_str()).collect();
        assert_eq!(names, vec!["Snack", "Breastfeeding"]);
    }

    #[test]
    #[should_panic(expected = "index")]
    fn remove_out_of_range_panics() {
        let mut store = EventStore::new();
        store.remove_at(0);
    }

    #[test]
    fn merge_keeps_remote_then_local_only() {
        let mut store = EventStore::from_events(vec![event("Sleeping", 1), event("Pumping", 5)]);
        let kept = store.merge_loaded(vec![event("Breastfeeding", 0), event("Sleeping", 1)]);

        assert_eq!(kept, 1);
        let names: Vec<_> = store.all().iter().map(|e| e.type_name.as_str()).collect();
        assert_eq!(names, vec!["Breastfeeding", "Sleeping", "Pumping"]);
    }

    #[test]
    fn merge_into_empty_store_is_replace() {
        let mut store = EventStore::new();
        let kept = store.merge_loaded(vec![event("Sleeping", 1)]);
        assert_eq!(kept, 0);
        assert_eq!(store.len(), 1);
    }
}
