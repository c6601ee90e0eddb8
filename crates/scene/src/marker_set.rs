use std::collections::HashMap;

use foundation::arena::Arena;
use foundation::handles::Handle;
use foundation::ids::StationId;

use crate::marker::{MarkerKey, RenderedMarker};

/// Live markers, addressable by handle or by key.
///
/// Handles are generational: once a marker is removed its handle never
/// resolves again, even after the slot is reused.
#[derive(Debug, Default)]
pub struct MarkerSet {
    markers: Arena<RenderedMarker>,
    by_key: HashMap<MarkerKey, Handle>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Inserts `marker`, replacing any marker with the same key.
    pub fn insert(&mut self, marker: RenderedMarker) -> Handle {
        if let Some(old) = self.by_key.remove(&marker.key) {
            self.markers.remove(old);
        }
        let key = marker.key.clone();
        let handle = self.markers.alloc(marker);
        self.by_key.insert(key, handle);
        handle
    }

    pub fn get(&self, handle: Handle) -> Option<&RenderedMarker> {
        self.markers.get(handle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut RenderedMarker> {
        self.markers.get_mut(handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.markers.contains(handle)
    }

    pub fn handle_of(&self, key: &MarkerKey) -> Option<Handle> {
        self.by_key.get(key).copied()
    }

    pub fn remove(&mut self, handle: Handle) -> Option<RenderedMarker> {
        let marker = self.markers.remove(handle)?;
        self.by_key.remove(&marker.key);
        Some(marker)
    }

    /// Removes every marker whose station fails `keep`, returning the
    /// removed handles in slot order.
    pub fn retain_stations(&mut self, mut keep: impl FnMut(&StationId) -> bool) -> Vec<Handle> {
        let doomed: Vec<Handle> = self
            .markers
            .iter()
            .filter(|(_, m)| !keep(&m.key.station))
            .map(|(h, _)| h)
            .collect();
        for &h in &doomed {
            self.remove(h);
        }
        doomed
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &RenderedMarker)> + '_ {
        self.markers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut RenderedMarker)> + '_ {
        self.markers.iter_mut()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
        self.by_key.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::MarkerSet;
    use crate::dataset::MetricKind;
    use crate::marker::{MarkerKey, RenderedMarker};
    use foundation::math::Vec2;

    fn marker(station: &str, kind: MetricKind) -> RenderedMarker {
        RenderedMarker::new(MarkerKey::new(station.into(), kind), Vec2::ZERO)
    }

    #[test]
    fn insert_indexes_by_key() {
        let mut set = MarkerSet::new();
        let a = set.insert(marker("a", MetricKind::Moderate));
        let b = set.insert(marker("a", MetricKind::Tolerant));
        assert_ne!(a, b);
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.handle_of(&MarkerKey::new("a".into(), MetricKind::Tolerant)),
            Some(b)
        );
    }

    #[test]
    fn reinserting_a_key_replaces_the_old_marker() {
        let mut set = MarkerSet::new();
        let first = set.insert(marker("a", MetricKind::Moderate));
        let second = set.insert(marker("a", MetricKind::Moderate));
        assert_eq!(set.len(), 1);
        assert!(!set.contains(first));
        assert!(set.contains(second));
    }

    #[test]
    fn removed_handles_go_stale() {
        let mut set = MarkerSet::new();
        let h = set.insert(marker("a", MetricKind::Sensitive));
        assert!(set.remove(h).is_some());
        let reused = set.insert(marker("b", MetricKind::Sensitive));
        assert_eq!(reused.index(), h.index());
        assert!(set.get(h).is_none());
        assert!(set.remove(h).is_none());
    }

    #[test]
    fn retain_stations_drops_missing_ones() {
        let mut set = MarkerSet::new();
        set.insert(marker("a", MetricKind::Moderate));
        let gone = set.insert(marker("b", MetricKind::Moderate));
        set.insert(marker("c", MetricKind::Moderate));

        let removed = set.retain_stations(|s| s.as_str() != "b");
        assert_eq!(removed, vec![gone]);
        assert_eq!(set.len(), 2);
        assert!(
            set.handle_of(&MarkerKey::new("b".into(), MetricKind::Moderate))
                .is_none()
        );
    }
}
