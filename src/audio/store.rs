//! Device reconciliation store.
//!
//! Single source of truth for the playback device list. Owns the cache of
//! the last successful fetch plus the user's enabled/known device sets, and
//! exposes the view every UI surface renders from. Created once in `main`
//! and mutated only on the UI thread; surfaces receive cloned projections,
//! never references into the cache.

use std::collections::HashSet;

use tracing::{debug, info};

use super::device::PlaybackDevice;

#[derive(Debug, Default)]
pub struct DeviceStore {
    /// Devices from the last successful fetch, in OS-reported order
    devices: Vec<PlaybackDevice>,

    /// Snapshot of the user's enabled set; `None` means all enabled
    enabled_ids: Option<HashSet<String>>,

    /// Every device id ever observed
    known_ids: HashSet<String>,

    /// Bumped on every mutation; surfaces re-pull when it moves
    revision: u64,

    /// Message from the most recent failed fetch, cleared on success
    last_error: Option<String>,
}

impl DeviceStore {
    pub fn new(enabled_ids: Option<HashSet<String>>, known_ids: HashSet<String>) -> Self {
        Self {
            enabled_ids,
            known_ids,
            ..Self::default()
        }
    }

    /// Replace the cached list with a successful fetch result.
    pub fn apply_fetch(&mut self, devices: Vec<PlaybackDevice>) {
        info!(count = devices.len(), "Reconciled device list");
        self.devices = devices;
        self.last_error = None;
        self.revision += 1;
    }

    /// Record a failed fetch. The previous cache is kept untouched: a stale
    /// list beats an empty one.
    pub fn record_error(&mut self, message: String) {
        self.last_error = Some(message);
        self.revision += 1;
    }

    /// Mark exactly one cached device as default, clearing the flag on all
    /// others. Used after a successful switch instead of a refetch. An id
    /// absent from the cache changes nothing.
    pub fn mark_default(&mut self, id: &str) {
        if !self.devices.iter().any(|d| d.id == id) {
            debug!(id, "mark_default: id not in cache");
            return;
        }
        for device in &mut self.devices {
            device.is_default = device.id == id;
        }
        self.revision += 1;
    }

    /// Cached devices filtered by the enabled set, in fetch order.
    pub fn visible_devices(&self) -> Vec<PlaybackDevice> {
        match &self.enabled_ids {
            None => self.devices.clone(),
            Some(enabled) => self
                .devices
                .iter()
                .filter(|d| enabled.contains(&d.id))
                .cloned()
                .collect(),
        }
    }

    /// All cached devices regardless of the enabled filter, for the
    /// device-management view.
    pub fn all_devices(&self) -> Vec<PlaybackDevice> {
        self.devices.clone()
    }

    /// Ids in `fetched` that have never been observed before. Idempotent
    /// until [`DeviceStore::remember_devices`] updates the known set.
    pub fn detect_new_devices(&self, fetched: &[PlaybackDevice]) -> HashSet<String> {
        fetched
            .iter()
            .filter(|d| !self.known_ids.contains(&d.id))
            .map(|d| d.id.clone())
            .collect()
    }

    /// Fold ids into the known set. The caller persists the result.
    pub fn remember_devices<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.known_ids.extend(ids);
        self.revision += 1;
    }

    /// Drop known ids that are not in the current cache. Invoked from the
    /// device-management UI; never runs automatically, so temporarily
    /// unplugged hardware is not re-flagged as new.
    pub fn prune_known_devices(&mut self) {
        let current: HashSet<&str> = self.devices.iter().map(|d| d.id.as_str()).collect();
        let before = self.known_ids.len();
        self.known_ids.retain(|id| current.contains(id.as_str()));
        info!(pruned = before - self.known_ids.len(), "Pruned known devices");
        self.revision += 1;
    }

    /// Replace the enabled-set snapshot. `None` enables everything.
    pub fn set_enabled_devices(&mut self, enabled: Option<HashSet<String>>) {
        self.enabled_ids = enabled;
        self.revision += 1;
    }

    pub fn enabled_ids(&self) -> Option<&HashSet<String>> {
        self.enabled_ids.as_ref()
    }

    pub fn known_ids(&self) -> &HashSet<String> {
        &self.known_ids
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The cached default device, if any survives the enabled filter.
    pub fn default_device(&self) -> Option<PlaybackDevice> {
        self.visible_devices().into_iter().find(|d| d.is_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched() -> Vec<PlaybackDevice> {
        vec![
            PlaybackDevice {
                id: "a".into(),
                name: "Speakers (Realtek Audio)".into(),
                is_default: true,
            },
            PlaybackDevice {
                id: "b".into(),
                name: "Headphones (USB DAC)".into(),
                is_default: false,
            },
            PlaybackDevice {
                id: "c".into(),
                name: "Digital Output".into(),
                is_default: false,
            },
        ]
    }

    #[test]
    fn visible_equals_cache_when_all_enabled() {
        let mut store = DeviceStore::default();
        store.apply_fetch(fetched());
        assert_eq!(store.visible_devices(), fetched());
    }

    #[test]
    fn visible_is_subset_filtered_by_enabled_set() {
        let enabled = Some(HashSet::from(["a".to_string(), "c".to_string(), "ghost".to_string()]));
        let mut store = DeviceStore::new(enabled, HashSet::new());
        store.apply_fetch(fetched());

        let visible = store.visible_devices();
        let ids: Vec<&str> = visible.iter().map(|d| d.id.as_str()).collect();
        // Fetch order preserved, "ghost" silently dropped from display
        assert_eq!(ids, vec!["a", "c"]);
        // The set itself still holds the absent id
        assert!(store.enabled_ids().unwrap().contains("ghost"));
    }

    #[test]
    fn failed_fetch_keeps_previous_cache() {
        let mut store = DeviceStore::default();
        store.apply_fetch(fetched());
        store.record_error("command failed".into());

        assert_eq!(store.visible_devices(), fetched());
        assert_eq!(store.last_error(), Some("command failed"));
    }

    #[test]
    fn successful_fetch_clears_error() {
        let mut store = DeviceStore::default();
        store.record_error("boom".into());
        store.apply_fetch(fetched());
        assert_eq!(store.last_error(), None);
    }

    #[test]
    fn mark_default_flips_exactly_one_flag() {
        let mut store = DeviceStore::default();
        store.apply_fetch(fetched());
        store.mark_default("b");

        let devices = store.visible_devices();
        let defaults: Vec<&str> = devices
            .iter()
            .filter(|d| d.is_default)
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(defaults, vec!["b"]);
    }

    #[test]
    fn mark_default_with_unknown_id_changes_nothing() {
        let mut store = DeviceStore::default();
        store.apply_fetch(fetched());
        let before = store.visible_devices();
        let revision = store.revision();

        store.mark_default("nope");

        assert_eq!(store.visible_devices(), before);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn detect_new_devices_is_idempotent_until_remembered() {
        let known = HashSet::from(["a".to_string()]);
        let mut store = DeviceStore::new(None, known);

        let first = store.detect_new_devices(&fetched());
        let second = store.detect_new_devices(&fetched());
        assert_eq!(first, second);
        assert_eq!(first, HashSet::from(["b".to_string(), "c".to_string()]));

        store.remember_devices(first);
        assert!(store.detect_new_devices(&fetched()).is_empty());
    }

    #[test]
    fn prune_retains_only_fetched_ids() {
        let known = HashSet::from(["a".to_string(), "old".to_string()]);
        let mut store = DeviceStore::new(None, known);
        store.apply_fetch(fetched());

        store.prune_known_devices();

        assert!(store.known_ids().contains("a"));
        assert!(!store.known_ids().contains("old"));
    }

    #[test]
    fn revision_moves_on_every_mutation() {
        let mut store = DeviceStore::default();
        let r0 = store.revision();
        store.apply_fetch(fetched());
        let r1 = store.revision();
        store.mark_default("b");
        let r2 = store.revision();
        store.set_enabled_devices(Some(HashSet::from(["a".to_string()])));
        let r3 = store.revision();

        assert!(r0 < r1 && r1 < r2 && r2 < r3);
    }

    #[test]
    fn default_device_respects_enabled_filter() {
        let mut store = DeviceStore::default();
        store.apply_fetch(fetched());
        assert_eq!(store.default_device().map(|d| d.id), Some("a".to_string()));

        // Filtering out the OS default leaves no selection
        store.set_enabled_devices(Some(HashSet::from(["b".to_string()])));
        assert_eq!(store.default_device(), None);
    }
}
