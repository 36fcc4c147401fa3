// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Branch registry
//!
//! Process-wide map from a transaction branch to the session that holds it.
//! A pinned resource manager consults the registry to find the owning session
//! for every verb, so a branch can be driven through any pooled connection.
//!
//! ## Invariants
//!
//! - At most one entry per [`Xid`]. Publication is insert-if-absent and
//!   atomic: concurrent publishers of the same branch all observe one winner.
//! - Entries are never updated in place, only inserted and removed.
//! - Entries are removed by commit, rollback and forget, never by end or
//!   prepare.

use crate::session::{same_session, SessionHandle};
use crate::xid::Xid;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide registry shared by every pinned resource manager
static GLOBAL_BRANCH_REGISTRY: Lazy<Arc<BranchRegistry>> =
    Lazy::new(|| Arc::new(BranchRegistry::new()));

/// Branch slot of a pinned resource manager
///
/// A pin published with a holder keeps a reference to the slot. Whoever
/// removes the pin clears the slot, so the publishing instance stops treating
/// the branch as its own.
pub type Association = Arc<Mutex<Option<Xid>>>;

/// One registry entry
#[derive(Clone)]
pub struct Pin {
    session: SessionHandle,
    holder: Option<Association>,
    serial: u64,
}

impl Pin {
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Publication number, unique within one registry
    pub fn serial(&self) -> u64 {
        self.serial
    }

    fn detach(&self, xid: &Xid) {
        if let Some(holder) = &self.holder {
            let mut slot = holder.lock();
            if slot.as_ref() == Some(xid) {
                *slot = None;
            }
        }
    }
}

/// Concurrent map from branch identifier to owning session
#[derive(Default)]
pub struct BranchRegistry {
    pins: DashMap<Xid, Pin>,
    next_serial: AtomicU64,
}

impl BranchRegistry {
    pub fn new() -> Self {
        Self {
            pins: DashMap::new(),
            next_serial: AtomicU64::new(0),
        }
    }

    /// The process-wide registry
    pub fn global() -> Arc<BranchRegistry> {
        GLOBAL_BRANCH_REGISTRY.clone()
    }

    /// Session currently holding `xid`
    pub fn lookup(&self, xid: &Xid) -> Option<SessionHandle> {
        self.lookup_pin(xid).map(|pin| pin.session)
    }

    pub fn lookup_pin(&self, xid: &Xid) -> Option<Pin> {
        let pin = self.pins.get(xid).map(|entry| entry.value().clone());
        log::trace!(
            "Registry lookup {} -> {}",
            xid,
            if pin.is_some() { "pinned" } else { "absent" }
        );
        pin
    }

    /// Pin `xid` to `session` unless it is already pinned
    ///
    /// Returns the session that owns the branch afterwards, which is the
    /// existing owner if another publisher won.
    pub fn publish(&self, xid: &Xid, session: SessionHandle) -> SessionHandle {
        self.publish_pin(xid, session, None).0.session
    }

    /// Insert-if-absent publication that also reports whether this call won
    ///
    /// When this call inserts the pin, `holder` is set to `xid` before the
    /// entry becomes visible to other threads.
    pub fn publish_pin(
        &self,
        xid: &Xid,
        session: SessionHandle,
        holder: Option<&Association>,
    ) -> (Pin, bool) {
        match self.pins.entry(xid.clone()) {
            Entry::Occupied(entry) => {
                log::trace!("Publish of {} lost to an existing pin", xid);
                (entry.get().clone(), false)
            }
            Entry::Vacant(entry) => {
                let pin = Pin {
                    session,
                    holder: holder.cloned(),
                    serial: self.next_serial.fetch_add(1, Ordering::Relaxed),
                };
                if let Some(holder) = &pin.holder {
                    *holder.lock() = Some(xid.clone());
                }
                entry.insert(pin.clone());
                log::trace!("Pinned {} (serial {})", xid, pin.serial);
                (pin, true)
            }
        }
    }

    /// Remove the pin for `xid`
    pub fn release(&self, xid: &Xid) -> Option<SessionHandle> {
        let (_, pin) = self.pins.remove(xid)?;
        pin.detach(xid);
        log::trace!("Released {}", xid);
        Some(pin.session)
    }

    /// Remove the pin for `xid` only if it still points at `session`
    pub fn release_if_owned(&self, xid: &Xid, session: &SessionHandle) -> bool {
        let removed = self
            .pins
            .remove_if(xid, |_, pin| same_session(&pin.session, session));
        self.finish_release(xid, removed)
    }

    /// Remove the pin for `xid` only if it is still exactly `pin`
    pub fn release_pin(&self, xid: &Xid, pin: &Pin) -> bool {
        let removed = self
            .pins
            .remove_if(xid, |_, current| current.serial == pin.serial);
        self.finish_release(xid, removed)
    }

    fn finish_release(&self, xid: &Xid, removed: Option<(Xid, Pin)>) -> bool {
        match removed {
            Some((_, pin)) => {
                pin.detach(xid);
                log::trace!("Released {}", xid);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, xid: &Xid) -> bool {
        self.pins.contains_key(xid)
    }

    /// Whether `xid` is pinned to exactly `session`
    pub fn owner_of(&self, xid: &Xid, session: &SessionHandle) -> bool {
        self.pins
            .get(xid)
            .map(|entry| same_session(&entry.value().session, session))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Drop every pin
    pub fn clear(&self) {
        self.pins.retain(|xid, pin| {
            pin.detach(xid);
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NativeError;
    use crate::session::{Row, Session, SessionGuard};
    use parking_lot::ReentrantMutex;

    struct NullSession {
        lock: ReentrantMutex<()>,
    }

    impl Session for NullSession {
        fn execute(&self, _command: &str) -> Result<Vec<Row>, NativeError> {
            Ok(Vec::new())
        }

        fn lock(&self) -> SessionGuard<'_> {
            self.lock.lock()
        }
    }

    fn session() -> SessionHandle {
        Arc::new(NullSession {
            lock: ReentrantMutex::new(()),
        })
    }

    fn xid(n: u8) -> Xid {
        Xid::new(1, vec![n], vec![0])
    }

    #[test]
    fn test_publish_is_insert_if_absent() {
        let registry = BranchRegistry::new();
        let first = session();
        let second = session();

        let owner = registry.publish(&xid(1), first.clone());
        assert!(same_session(&owner, &first));

        let owner = registry.publish(&xid(1), second.clone());
        assert!(same_session(&owner, &first));
        assert!(registry.owner_of(&xid(1), &first));
        assert!(!registry.owner_of(&xid(1), &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_and_release() {
        let registry = BranchRegistry::new();
        let s = session();
        assert!(registry.lookup(&xid(1)).is_none());

        registry.publish(&xid(1), s.clone());
        let found = registry.lookup(&xid(1)).unwrap();
        assert!(same_session(&found, &s));

        assert!(registry.release(&xid(1)).is_some());
        assert!(registry.release(&xid(1)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_release_if_owned_respects_owner() {
        let registry = BranchRegistry::new();
        let owner = session();
        let other = session();
        registry.publish(&xid(2), owner.clone());

        assert!(!registry.release_if_owned(&xid(2), &other));
        assert!(registry.contains(&xid(2)));
        assert!(registry.release_if_owned(&xid(2), &owner));
        assert!(!registry.contains(&xid(2)));
    }

    #[test]
    fn test_concurrent_publish_has_single_winner() {
        let registry = Arc::new(BranchRegistry::new());
        let sessions: Vec<SessionHandle> = (0..8).map(|_| session()).collect();
        let barrier = Arc::new(std::sync::Barrier::new(sessions.len()));

        let handles: Vec<_> = sessions
            .iter()
            .cloned()
            .map(|s| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.publish(&xid(9), s)
                })
            })
            .collect();

        let owners: Vec<SessionHandle> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(registry.len(), 1);
        for owner in &owners {
            assert!(same_session(owner, &owners[0]));
        }
    }

    #[test]
    fn test_release_by_other_owner_clears_holder() {
        let registry = BranchRegistry::new();
        let owner = session();
        let holder: Association = Arc::new(Mutex::new(None));

        let (_, inserted) = registry.publish_pin(&xid(3), owner.clone(), Some(&holder));
        assert!(inserted);
        assert_eq!(*holder.lock(), Some(xid(3)));

        // A different resource manager completes the branch
        assert!(registry.release_if_owned(&xid(3), &owner));
        assert_eq!(*holder.lock(), None);
    }

    #[test]
    fn test_holder_tracking_another_branch_is_untouched() {
        let registry = BranchRegistry::new();
        let holder: Association = Arc::new(Mutex::new(None));

        registry.publish_pin(&xid(4), session(), Some(&holder));
        registry.publish_pin(&xid(5), session(), Some(&holder));
        assert_eq!(*holder.lock(), Some(xid(5)));

        registry.release(&xid(4));
        assert_eq!(*holder.lock(), Some(xid(5)));
        registry.clear();
        assert_eq!(*holder.lock(), None);
    }

    #[test]
    fn test_release_pin_matches_only_its_publication() {
        let registry = BranchRegistry::new();
        let s = session();

        let (first, inserted) = registry.publish_pin(&xid(6), s.clone(), None);
        assert!(inserted);
        let (again, inserted) = registry.publish_pin(&xid(6), session(), None);
        assert!(!inserted);
        assert_eq!(again.serial(), first.serial());

        // Same session pinned again under a new publication
        registry.release(&xid(6));
        let (second, _) = registry.publish_pin(&xid(6), s.clone(), None);
        assert_ne!(second.serial(), first.serial());

        assert!(!registry.release_pin(&xid(6), &first));
        assert!(registry.owner_of(&xid(6), &s));
        assert!(registry.release_pin(&xid(6), &second));
        assert!(registry.is_empty());
    }
}
