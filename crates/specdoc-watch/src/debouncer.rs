//! Event debouncing.
//!
//! Coalesces raw filesystem events per path and releases them as one batch
//! once no new event has arrived for the debounce duration. Editors emit
//! several events per save; a batch covers the whole burst.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::event::ChangeKind;

struct Pending {
    events: BTreeMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
}

/// Thread-safe event debouncer.
pub(crate) struct EventDebouncer {
    pending: Mutex<Pending>,
    quiet_period: Duration,
}

impl EventDebouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            pending: Mutex::new(Pending {
                events: BTreeMap::new(),
                last_event: None,
            }),
            quiet_period,
        }
    }

    /// Record an event and restart the quiet period.
    ///
    /// Called from the notify callback thread.
    pub fn record(&self, path: PathBuf, kind: ChangeKind) {
        let mut pending = self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        pending.last_event = Some(Instant::now());

        match pending.events.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(kind);
            }
            Entry::Occupied(mut entry) => match Self::coalesce(*entry.get(), kind) {
                Some(kind) => {
                    entry.insert(kind);
                }
                // Created then removed within one burst: nothing happened.
                None => {
                    entry.remove();
                }
            },
        }
    }

    /// Coalesce two event kinds for the same path.
    ///
    /// Returns `None` if both events cancel out (Created + Removed).
    #[allow(clippy::match_same_arms)]
    fn coalesce(existing: ChangeKind, new: ChangeKind) -> Option<ChangeKind> {
        use ChangeKind::{Created, Modified, Removed};

        match (existing, new) {
            // Created + anything
            (Created, Created) => Some(Created),
            (Created, Modified) => Some(Created),
            (Created, Removed) => None,

            // Modified + anything
            (Modified, Created) => Some(Created),
            (Modified, Modified) => Some(Modified),
            (Modified, Removed) => Some(Removed),

            // Removed + anything
            (Removed, Created) => Some(Modified),
            (Removed, Modified) => Some(Removed),
            (Removed, Removed) => Some(Removed),
        }
    }

    /// Take the pending batch if the quiet period has elapsed.
    ///
    /// Returns an empty batch while events are still arriving or when
    /// everything coalesced away. Events are sorted by path.
    pub fn drain_ready(&self) -> Vec<(PathBuf, ChangeKind)> {
        let mut pending = self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match pending.last_event {
            Some(last) if last.elapsed() >= self.quiet_period => {
                pending.last_event = None;
                std::mem::take(&mut pending.events).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread;

    #[test]
    fn test_single_event_emitted_after_quiet_period() {
        let debouncer = EventDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("index.html");

        debouncer.record(path.clone(), ChangeKind::Modified);

        // Still inside the quiet period
        assert!(debouncer.drain_ready().is_empty());

        thread::sleep(Duration::from_millis(15));

        assert_eq!(debouncer.drain_ready(), vec![(path, ChangeKind::Modified)]);
        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_burst_is_one_batch() {
        let debouncer = EventDebouncer::new(Duration::from_millis(10));

        debouncer.record(PathBuf::from("b.html"), ChangeKind::Modified);
        debouncer.record(PathBuf::from("a.html"), ChangeKind::Created);
        debouncer.record(PathBuf::from("b.html"), ChangeKind::Modified);

        thread::sleep(Duration::from_millis(15));

        assert_eq!(
            debouncer.drain_ready(),
            vec![
                (PathBuf::from("a.html"), ChangeKind::Created),
                (PathBuf::from("b.html"), ChangeKind::Modified),
            ]
        );
    }

    #[test]
    fn test_new_event_restarts_quiet_period() {
        let debouncer = EventDebouncer::new(Duration::from_millis(30));

        debouncer.record(PathBuf::from("a.html"), ChangeKind::Modified);
        thread::sleep(Duration::from_millis(20));
        debouncer.record(PathBuf::from("b.html"), ChangeKind::Modified);
        thread::sleep(Duration::from_millis(20));

        // 40ms since the first event but only 20ms since the last one.
        assert!(debouncer.drain_ready().is_empty());

        thread::sleep(Duration::from_millis(20));
        assert_eq!(debouncer.drain_ready().len(), 2);
    }

    #[test]
    fn test_created_then_removed_discards_both() {
        let debouncer = EventDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("scratch.html");

        debouncer.record(path.clone(), ChangeKind::Created);
        debouncer.record(path, ChangeKind::Removed);

        thread::sleep(Duration::from_millis(15));

        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_coalesce_all_combinations() {
        use ChangeKind::{Created, Modified, Removed};

        // Created + *
        assert_eq!(EventDebouncer::coalesce(Created, Created), Some(Created));
        assert_eq!(EventDebouncer::coalesce(Created, Modified), Some(Created));
        assert_eq!(EventDebouncer::coalesce(Created, Removed), None);

        // Modified + *
        assert_eq!(EventDebouncer::coalesce(Modified, Created), Some(Created));
        assert_eq!(EventDebouncer::coalesce(Modified, Modified), Some(Modified));
        assert_eq!(EventDebouncer::coalesce(Modified, Removed), Some(Removed));

        // Removed + *
        assert_eq!(EventDebouncer::coalesce(Removed, Created), Some(Modified));
        assert_eq!(EventDebouncer::coalesce(Removed, Modified), Some(Removed));
        assert_eq!(EventDebouncer::coalesce(Removed, Removed), Some(Removed));
    }
}
