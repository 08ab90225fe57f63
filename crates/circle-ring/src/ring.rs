//! Consistent hashing ring implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use crate::config::RingConfig;
use crate::error::RingError;
use crate::hash::{HashStrategy, PositionHasher};

/// A member name paired with the replica count it should join with.
///
/// Used by [`Ring::set_with_replicas`]. A `replicas` of 0 selects the
/// ring's default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    /// Member name.
    pub name: String,
    /// Number of positions the member occupies on the ring.
    pub replicas: usize,
}

impl MemberEntry {
    /// Create an entry for `name` with `replicas` positions.
    pub fn new(name: impl Into<String>, replicas: usize) -> Self {
        Self {
            name: name.into(),
            replicas,
        }
    }
}

/// Consistent hashing ring mapping string keys to named members.
///
/// Each member is placed at several positions (replicas) on a `u32` ring.
/// A key belongs to the member owning the first position strictly after the
/// key's hash, wrapping around past the highest position.
///
/// All state sits behind one reader/writer lock: lookups share it, mutations
/// hold it exclusively for their whole duration, so a reader never observes
/// a half-applied membership change.
#[derive(Debug)]
pub struct Ring {
    state: RwLock<RingState>,
    hash: HashStrategy,
    default_replicas: usize,
}

#[derive(Debug, Default)]
struct RingState {
    /// Ring position -> owning member.
    positions: HashMap<u32, String>,
    /// Active members and their replica counts.
    replicas: HashMap<String, usize>,
    /// Keys of `positions`, ascending.
    sorted: Vec<u32>,
}

impl Default for Ring {
    fn default() -> Self {
        Self::new(RingConfig::default())
    }
}

impl Ring {
    /// Create a new empty ring.
    pub fn new(config: RingConfig) -> Self {
        Self {
            state: RwLock::new(RingState::default()),
            default_replicas: config.default_replicas(),
            hash: config.hash,
        }
    }

    /// Replica count used when a member joins without an explicit count.
    pub fn default_replicas(&self) -> usize {
        self.default_replicas
    }

    /// Add a member with the default replica count.
    ///
    /// Does nothing if the member is already on the ring.
    pub fn add(&self, name: &str) {
        self.add_with_replicas(name, self.default_replicas);
    }

    /// Add a member occupying `replicas` positions.
    ///
    /// Does nothing if the member is already on the ring; its existing
    /// replica count is kept.
    pub fn add_with_replicas(&self, name: &str, replicas: usize) {
        let mut state = self.write();
        if state.replicas.contains_key(name) {
            return;
        }

        state.insert_member(&self.hash, name, replicas);
        state.rebuild_sorted();
        debug!(member = name, replicas, "added member to ring");
    }

    /// Remove a member and all of its positions.
    ///
    /// Returns `false` if the member was not on the ring.
    pub fn remove(&self, name: &str) -> bool {
        let mut state = self.write();
        if !state.remove_member(&self.hash, name) {
            return false;
        }

        state.rebuild_sorted();
        debug!(member = name, "removed member from ring");
        true
    }

    /// Make the membership exactly `names`.
    ///
    /// Members not listed are removed. Listed names not yet present join
    /// with the default replica count. Members already present are left
    /// untouched.
    pub fn set<S: AsRef<str>>(&self, names: &[S]) {
        let wanted: Vec<(&str, usize)> = names
            .iter()
            .map(|name| (name.as_ref(), self.default_replicas))
            .collect();
        self.reconcile(&wanted);
    }

    /// Like [`set`](Self::set), but new members join with the replica count
    /// from their entry (0 selects the default).
    pub fn set_with_replicas(&self, entries: &[MemberEntry]) {
        let wanted: Vec<(&str, usize)> = entries
            .iter()
            .map(|entry| {
                let replicas = if entry.replicas == 0 {
                    self.default_replicas
                } else {
                    entry.replicas
                };
                (entry.name.as_str(), replicas)
            })
            .collect();
        self.reconcile(&wanted);
    }

    fn reconcile(&self, wanted: &[(&str, usize)]) {
        let mut state = self.write();
        let keep: HashSet<&str> = wanted.iter().map(|(name, _)| *name).collect();

        let stale: Vec<String> = state
            .replicas
            .keys()
            .filter(|member| !keep.contains(member.as_str()))
            .cloned()
            .collect();
        for member in &stale {
            state.remove_member(&self.hash, member);
        }

        let mut added = 0usize;
        for &(name, replicas) in wanted {
            if !state.replicas.contains_key(name) {
                state.insert_member(&self.hash, name, replicas);
                added += 1;
            }
        }

        if added > 0 || !stale.is_empty() {
            state.rebuild_sorted();
        }
        debug!(
            added,
            removed = stale.len(),
            members = state.replicas.len(),
            "reconciled ring membership"
        );
    }

    /// Return the member owning `key`.
    pub fn get(&self, key: &str) -> Result<String, RingError> {
        let state = self.read();
        let start = state.search(self.hash.hash(key))?;
        Ok(state.owner_at(start).to_owned())
    }

    /// Return the owner of `key` and the next distinct member clockwise.
    ///
    /// The second member is `None` when the ring has a single member.
    pub fn get_two(&self, key: &str) -> Result<(String, Option<String>), RingError> {
        let state = self.read();
        let start = state.search(self.hash.hash(key))?;
        let first = state.owner_at(start).to_owned();
        if state.replicas.len() == 1 {
            return Ok((first, None));
        }

        let second = state
            .walk_distinct(start, 2)
            .get(1)
            .map(|member| (*member).to_owned());
        Ok((first, second))
    }

    /// Return up to `n` distinct members for `key`, walking clockwise from
    /// its owner.
    ///
    /// `n` is capped at the number of members, so asking for more than exist
    /// returns all of them rather than failing.
    pub fn get_n(&self, key: &str, n: usize) -> Result<Vec<String>, RingError> {
        let state = self.read();
        let start = state.search(self.hash.hash(key))?;
        let n = n.min(state.replicas.len());

        Ok(state
            .walk_distinct(start, n)
            .into_iter()
            .map(str::to_owned)
            .collect())
    }

    /// Snapshot of the current member names, in no particular order.
    pub fn members(&self) -> Vec<String> {
        self.read().replicas.keys().cloned().collect()
    }

    /// Snapshot of each member's configured replica count.
    pub fn member_replicas(&self) -> HashMap<String, usize> {
        self.read().replicas.clone()
    }

    /// Whether `name` is currently a member.
    pub fn contains(&self, name: &str) -> bool {
        self.read().replicas.contains_key(name)
    }

    /// Number of members on the ring.
    pub fn member_count(&self) -> usize {
        self.read().replicas.len()
    }

    /// Number of occupied positions on the ring.
    pub fn position_count(&self) -> usize {
        self.read().positions.len()
    }

    /// Whether the ring has no positions (every lookup would fail).
    pub fn is_empty(&self) -> bool {
        self.read().positions.is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, RingState> {
        self.state.read().expect("ring lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, RingState> {
        self.state.write().expect("ring lock poisoned")
    }
}

impl RingState {
    /// Place `replicas` positions for `name`. Caller rebuilds the index.
    ///
    /// A position already held by another member is taken over; collisions
    /// are rare and cost the earlier member one effective replica.
    fn insert_member(&mut self, hash: &HashStrategy, name: &str, replicas: usize) {
        let mut hasher = PositionHasher::new(hash);
        for index in 0..replicas {
            let pos = hasher.replica_position(name, index);
            self.positions.insert(pos, name.to_owned());
        }
        self.replicas.insert(name.to_owned(), replicas);
    }

    /// Drop `name` and the positions it still owns. Caller rebuilds the index.
    fn remove_member(&mut self, hash: &HashStrategy, name: &str) -> bool {
        let Some(replicas) = self.replicas.remove(name) else {
            return false;
        };

        let mut hasher = PositionHasher::new(hash);
        for index in 0..replicas {
            let pos = hasher.replica_position(name, index);
            // Leave positions a later member took over through a collision.
            if self.positions.get(&pos).is_some_and(|owner| owner == name) {
                self.positions.remove(&pos);
            }
        }
        true
    }

    /// Recompute the sorted position index, reusing its allocation unless it
    /// has grown to more than four times what the ring needs.
    fn rebuild_sorted(&mut self) {
        let needed = self.positions.len();
        self.sorted.clear();
        if self.sorted.capacity() > needed.saturating_mul(4) {
            trace!(
                capacity = self.sorted.capacity(),
                needed, "shrinking sorted position index"
            );
            self.sorted.shrink_to(needed);
        }

        self.sorted.extend(self.positions.keys().copied());
        self.sorted.sort_unstable();
    }

    /// Index of the first position strictly greater than `hash`, wrapping to
    /// 0 past the end.
    fn search(&self, hash: u32) -> Result<usize, RingError> {
        if self.sorted.is_empty() {
            return Err(RingError::EmptyCircle);
        }

        let idx = self.sorted.partition_point(|&pos| pos <= hash);
        Ok(if idx == self.sorted.len() { 0 } else { idx })
    }

    fn owner_at(&self, idx: usize) -> &str {
        &self.positions[&self.sorted[idx]]
    }

    /// Collect up to `n` distinct members walking clockwise from `start`,
    /// visiting each position at most once.
    fn walk_distinct(&self, start: usize, n: usize) -> Vec<&str> {
        let mut found: Vec<&str> = Vec::with_capacity(n);
        if n == 0 {
            return found;
        }

        for idx in (start..self.sorted.len()).chain(0..start) {
            let member = self.owner_at(idx);
            if !found.contains(&member) {
                found.push(member);
                if found.len() == n {
                    break;
                }
            }
        }
        found
    }
}
