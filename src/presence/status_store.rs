use std::collections::HashMap;

use crate::models::{LiveParticipant, StatusUpdate};

/// In-memory membership map for one observer. Insert-if-absent on JOIN and
/// SYNC_RES, field-level merge on UPDATE_STATUS, removal on LEAVE; all of it
/// idempotent so duplicated or reordered deliveries cannot corrupt the set.
///
/// Confined to the reconciler's event loop; callers that share it across
/// tasks wrap it in a single mutex.
#[derive(Default)]
pub struct ParticipantStatusStore {
    records: HashMap<String, LiveParticipant>,
    join_order: Vec<String>,
}

impl ParticipantStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the record if its id is unknown. Returns whether it was
    /// inserted; a duplicate is a no-op, never an overwrite, because the
    /// owner's later UPDATE_STATUS messages carry the fresher state.
    pub fn upsert(&mut self, record: LiveParticipant) -> bool {
        if self.records.contains_key(&record.id) {
            return false;
        }
        self.join_order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
        true
    }

    /// Merge a partial update into the matching record, field by field.
    /// Unknown ids are ignored.
    pub fn merge(&mut self, id: &str, updates: &StatusUpdate) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                updates.apply_to(record);
                true
            }
            None => false,
        }
    }

    /// Remove the record for `id`, if present.
    pub fn remove(&mut self, id: &str) -> Option<LiveParticipant> {
        let removed = self.records.remove(id);
        if removed.is_some() {
            self.join_order.retain(|known| known != id);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&LiveParticipant> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current membership in local arrival order, for rendering.
    pub fn snapshot(&self) -> Vec<LiveParticipant> {
        self.join_order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect()
    }

    /// Membership ids, unordered.
    pub fn ids(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConnectionQuality, User, UserRole};

    fn member(id: &str) -> LiveParticipant {
        let user = User {
            id: id.to_string(),
            full_name: format!("User {}", id),
            avatar: format!("https://cdn.test/{}.png", id),
            role: UserRole::Member,
        };
        LiveParticipant::on_join(&user, "s-1", false, false)
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut store = ParticipantStatusStore::new();
        assert!(store.upsert(member("a")));
        assert!(!store.upsert(member("a")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_upsert_does_not_overwrite() {
        let mut store = ParticipantStatusStore::new();
        store.upsert(member("a"));
        store.merge("a", &StatusUpdate::muted(true));

        // A stale copy of A's initial record arrives again.
        store.upsert(member("a"));
        assert!(store.get("a").unwrap().is_muted);
    }

    #[test]
    fn merge_touches_only_named_fields() {
        let mut store = ParticipantStatusStore::new();
        store.upsert(member("a"));
        let before = store.get("a").unwrap().clone();

        assert!(store.merge("a", &StatusUpdate::hand_raised(true)));

        let after = store.get("a").unwrap();
        assert!(after.is_hand_raised);
        assert_eq!(after.is_muted, before.is_muted);
        assert_eq!(after.is_camera_off, before.is_camera_off);
        assert_eq!(after.is_screen_sharing, before.is_screen_sharing);
        assert_eq!(after.connection_quality, before.connection_quality);
        assert_eq!(after.joined_at, before.joined_at);
        assert_eq!(after.name, before.name);
    }

    #[test]
    fn merge_against_unknown_id_is_ignored() {
        let mut store = ParticipantStatusStore::new();
        assert!(!store.merge("ghost", &StatusUpdate::muted(true)));
        assert!(store.is_empty());
    }

    #[test]
    fn remove_unknown_is_a_noop() {
        let mut store = ParticipantStatusStore::new();
        store.upsert(member("a"));
        assert!(store.remove("ghost").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_preserves_arrival_order() {
        let mut store = ParticipantStatusStore::new();
        store.upsert(member("c"));
        store.upsert(member("a"));
        store.upsert(member("b"));
        store.remove("a");
        store.upsert(member("d"));

        let ids: Vec<String> = store.snapshot().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["c", "b", "d"]);

        store.merge("b", &StatusUpdate::camera_off(true));
        assert_eq!(store.snapshot()[1].connection_quality, ConnectionQuality::Good);
    }
}
