use std::collections::HashMap;

use system::{PresencePatch, PresenceRecord, SessionId};

use crate::palette::pick_color;

/// Presence records of live sessions, at most one per session id.
///
/// Owned by the relay task; nothing else mutates it.
pub struct PresenceRegistry {
    records: HashMap<SessionId, PresenceRecord>,
    join_order: Vec<SessionId>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            join_order: Vec::new(),
        }
    }

    /// Merges `patch` into the record of `id`. A missing record is created
    /// with the patch color, or a freshly picked one.
    pub fn upsert(&mut self, id: &str, patch: PresencePatch) -> &PresenceRecord {
        let join_order = &mut self.join_order;
        let record = self.records.entry(id.to_string()).or_insert_with(|| {
            join_order.push(id.to_string());
            let color = patch.color.clone().unwrap_or_else(pick_color);
            PresenceRecord::new(id.to_string(), color)
        });
        record.apply(patch);
        record
    }

    pub fn remove(&mut self, id: &str) -> Option<PresenceRecord> {
        let removed = self.records.remove(id);
        if removed.is_some() {
            self.join_order.retain(|e| e != id);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&PresenceRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Owned snapshot in join order.
    pub fn all(&self) -> Vec<PresenceRecord> {
        self.join_order
            .iter()
            .filter_map(|id| self.records.get(id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PALETTE;
    use system::Point;

    fn named(name: &str) -> PresencePatch {
        PresencePatch {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn it_creates_record_with_palette_color() {
        let mut registry = PresenceRegistry::new();
        let record = registry.upsert("a", named("Alice"));
        assert!(PALETTE.contains(&record.color.as_str()));
        assert_eq!(record.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn it_updates_existing_record_in_place() {
        let mut registry = PresenceRegistry::new();
        registry.upsert("a", named("Alice"));
        registry.upsert(
            "a",
            PresencePatch {
                cursor: Some(Point::new(1.0, 2.0)),
                color: Some("#000000".into()),
                ..Default::default()
            },
        );

        assert_eq!(registry.len(), 1);
        let record = registry.get("a").expect("");
        assert_eq!(record.name.as_deref(), Some("Alice"));
        assert_eq!(record.color, "#000000");
        assert_eq!(record.cursor, Some(Point::new(1.0, 2.0)));
    }

    #[test]
    fn it_ignores_removal_of_unknown_id() {
        let mut registry = PresenceRegistry::new();
        registry.upsert("a", named("Alice"));
        assert!(registry.remove("b").is_none());
        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn it_lists_records_in_join_order() {
        let mut registry = PresenceRegistry::new();
        registry.upsert("c", named("Carol"));
        registry.upsert("a", named("Alice"));
        registry.upsert("b", named("Bob"));
        registry.remove("a");
        registry.upsert("a", named("Alice again"));

        let ids = registry
            .all()
            .into_iter()
            .map(|r| r.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn it_tracks_joins_minus_leaves() {
        let mut registry = PresenceRegistry::new();
        let ids = (0..20).map(|i| format!("s{}", i)).collect::<Vec<_>>();
        for (i, id) in ids.iter().enumerate() {
            registry.upsert(id, named(id));
            if i % 3 == 0 {
                registry.upsert(id, PresencePatch::default());
            }
        }
        for id in ids.iter().step_by(2) {
            registry.remove(id);
            registry.remove(id);
        }
        assert_eq!(registry.len(), 10);
        assert_eq!(registry.all().len(), 10);
    }
}
