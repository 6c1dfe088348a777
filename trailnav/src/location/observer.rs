//! Weak observer registrations.
//!
//! The hub never keeps an observer alive: registrations hold [`Weak`]
//! handles keyed by allocation identity, and dead entries are pruned
//! whenever the registry is walked.

use std::sync::{Arc, Weak};

use super::state::{HeadingFix, LocationFix};

/// Consumer of fixes broadcast by the hub.
///
/// Both methods default to no-ops so a consumer only implements what it needs.
/// Callbacks run on whatever thread delivered the fix; UI consumers must
/// marshal onto their own context.
pub trait LocationObserver: Send + Sync {
    /// A new location fix is available.
    fn on_location_updated(&self, _fix: &LocationFix) {}

    /// A new heading fix is available.
    fn on_heading_updated(&self, _heading: &HeadingFix) {}
}

/// Set of weakly-held observers.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    entries: Vec<Weak<dyn LocationObserver>>,
}

impl ObserverRegistry {
    /// Register an observer. Returns false if it was already registered.
    pub fn add(&mut self, observer: &Arc<dyn LocationObserver>) -> bool {
        self.prune();
        let key = identity(observer);
        if self.entries.iter().any(|w| weak_identity(w) == key) {
            return false;
        }
        self.entries.push(Arc::downgrade(observer));
        true
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn remove(&mut self, observer: &Arc<dyn LocationObserver>) -> bool {
        let key = identity(observer);
        let before = self.entries.len();
        self.entries.retain(|w| weak_identity(w) != key);
        self.prune();
        self.entries.len() != before
    }

    /// Upgrade every live observer, dropping dead registrations.
    pub fn live(&mut self) -> Vec<Arc<dyn LocationObserver>> {
        let mut live = Vec::with_capacity(self.entries.len());
        self.entries.retain(|w| match w.upgrade() {
            Some(observer) => {
                live.push(observer);
                true
            }
            None => false,
        });
        live
    }

    /// Number of registrations, including ones not yet pruned.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn prune(&mut self) {
        self.entries.retain(|w| w.strong_count() > 0);
    }
}

fn identity(observer: &Arc<dyn LocationObserver>) -> *const () {
    Arc::as_ptr(observer) as *const ()
}

fn weak_identity(observer: &Weak<dyn LocationObserver>) -> *const () {
    observer.as_ptr() as *const ()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl LocationObserver for Counter {
        fn on_location_updated(&self, _fix: &LocationFix) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_add_is_keyed_by_identity() {
        let mut registry = ObserverRegistry::default();
        let a: Arc<dyn LocationObserver> = Arc::new(Counter::default());
        let b: Arc<dyn LocationObserver> = Arc::new(Counter::default());

        assert!(registry.add(&a));
        assert!(!registry.add(&a));
        assert!(!registry.add(&a.clone()));
        assert!(registry.add(&b));
        assert_eq!(registry.live().len(), 2);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut registry = ObserverRegistry::default();
        let a: Arc<dyn LocationObserver> = Arc::new(Counter::default());
        assert!(!registry.remove(&a));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registration_does_not_keep_observer_alive() {
        let mut registry = ObserverRegistry::default();
        let a: Arc<dyn LocationObserver> = Arc::new(Counter::default());
        let b: Arc<dyn LocationObserver> = Arc::new(Counter::default());
        registry.add(&a);
        registry.add(&b);

        let weak = Arc::downgrade(&a);
        drop(a);
        assert!(weak.upgrade().is_none());

        let live = registry.live();
        assert_eq!(live.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_then_add_again() {
        let mut registry = ObserverRegistry::default();
        let a: Arc<dyn LocationObserver> = Arc::new(Counter::default());
        registry.add(&a);
        assert!(registry.remove(&a));
        assert!(registry.live().is_empty());
        assert!(registry.add(&a));
    }
}
