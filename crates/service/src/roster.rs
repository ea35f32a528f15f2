use std::net::SocketAddr;
use std::time::Instant;

use ahash::{HashMap, HashSet, HashSetExt};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("name already taken")]
    NameTaken,
    #[error("address already connected")]
    AddressTaken,
    #[error("address is not connected")]
    NotConnected,
    #[error("no such entry")]
    NotFound,
    #[error("entry already uses this name")]
    Noop,
}

/// One connected client.
///
/// The muted set is owned by its entry and dies with it; it holds the display
/// names of senders whose broadcasts this client does not want delivered.
#[derive(Debug, PartialEq)]
pub struct Entry {
    pub name: String,
    pub addr: SocketAddr,
    pub admin: bool,
    pub last_active: Instant,
    pub muted: HashSet<String>,
}

/// The two roster indexes. They live behind a single lock so every mutation
/// keeps them consistent with each other.
#[derive(Default)]
pub(crate) struct RosterTable {
    entries: HashMap<SocketAddr, Entry>,
    names: HashMap<String, SocketAddr>,
}

impl RosterTable {
    pub(crate) fn add(
        &mut self,
        name: &str,
        addr: SocketAddr,
        admin: bool,
        now: Instant,
    ) -> Result<(), RosterError> {
        if self.names.contains_key(name) {
            return Err(RosterError::NameTaken);
        }

        if self.entries.contains_key(&addr) {
            return Err(RosterError::AddressTaken);
        }

        self.names.insert(name.to_string(), addr);
        self.entries.insert(
            addr,
            Entry {
                name: name.to_string(),
                addr,
                admin,
                last_active: now,
                muted: HashSet::new(),
            },
        );

        Ok(())
    }

    pub(crate) fn find_by_addr(&self, addr: &SocketAddr) -> Option<&Entry> {
        self.entries.get(addr)
    }

    pub(crate) fn addr_of(&self, name: &str) -> Option<SocketAddr> {
        self.names.get(name).copied()
    }

    pub(crate) fn find_by_name(&self, name: &str) -> Option<&Entry> {
        self.entries.get(self.names.get(name)?)
    }

    pub(crate) fn remove_by_addr(&mut self, addr: &SocketAddr) -> Option<Entry> {
        let entry = self.entries.remove(addr)?;
        self.names.remove(&entry.name);
        Some(entry)
    }

    pub(crate) fn remove_by_name(&mut self, name: &str) -> Option<Entry> {
        let addr = self.names.remove(name)?;
        self.entries.remove(&addr)
    }

    pub(crate) fn rename(
        &mut self,
        addr: &SocketAddr,
        new_name: &str,
        now: Instant,
    ) -> Result<String, RosterError> {
        let entry = self.entries.get_mut(addr).ok_or(RosterError::NotConnected)?;

        if entry.name == new_name {
            return Err(RosterError::Noop);
        }

        if self.names.contains_key(new_name) {
            return Err(RosterError::NameTaken);
        }

        let old = std::mem::replace(&mut entry.name, new_name.to_string());
        entry.last_active = now;
        self.names.remove(&old);
        self.names.insert(new_name.to_string(), *addr);

        Ok(old)
    }

    pub(crate) fn touch(&mut self, addr: &SocketAddr, now: Instant) {
        if let Some(entry) = self.entries.get_mut(addr) {
            entry.last_active = now;
        }
    }

    /// Silent by contract: self-mute and unknown targets are no-ops, but the
    /// requester's timestamp still advances like on any other inbound frame.
    pub(crate) fn mute(&mut self, addr: &SocketAddr, target: &str, now: Instant) {
        let target_exists = self.names.contains_key(target);

        if let Some(entry) = self.entries.get_mut(addr) {
            entry.last_active = now;
            if target_exists && entry.name != target {
                entry.muted.insert(target.to_string());
            }
        }
    }

    pub(crate) fn unmute(&mut self, addr: &SocketAddr, target: &str, now: Instant) {
        if let Some(entry) = self.entries.get_mut(addr) {
            entry.last_active = now;
            entry.muted.remove(target);
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub(crate) fn addrs(&self) -> impl Iterator<Item = SocketAddr> + '_ {
        self.entries.keys().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// The roster of connected clients: address-keyed entries plus a name index,
/// reader/writer locked. Readers run in parallel; every mutation takes the
/// write lock, including mute-set edits, which are logically part of their
/// entry.
///
/// No caller holds the lock across a socket send: the routing layer copies
/// the addresses it needs under the lock and sends after release.
#[derive(Default)]
pub struct Roster {
    table: RwLock<RosterTable>,
}

impl Roster {
    /// Insert a new entry.
    ///
    /// # Test
    ///
    /// ```
    /// use std::time::Instant;
    /// use ichat_service::roster::{Roster, RosterError};
    ///
    /// let roster = Roster::default();
    /// let addr = "127.0.0.1:4000".parse().unwrap();
    /// let now = Instant::now();
    ///
    /// roster.add("Alice", addr, false, now).unwrap();
    /// assert!(roster.contains_name("Alice"));
    ///
    /// let other = "127.0.0.1:4001".parse().unwrap();
    /// assert_eq!(roster.add("Alice", other, false, now), Err(RosterError::NameTaken));
    /// assert_eq!(roster.add("Bob", addr, false, now), Err(RosterError::AddressTaken));
    /// ```
    pub fn add(
        &self,
        name: &str,
        addr: SocketAddr,
        admin: bool,
        now: Instant,
    ) -> Result<(), RosterError> {
        self.table.write().add(name, addr, admin, now)
    }

    pub fn remove_by_addr(&self, addr: &SocketAddr) -> Result<Entry, RosterError> {
        self.table
            .write()
            .remove_by_addr(addr)
            .ok_or(RosterError::NotFound)
    }

    pub fn remove_by_name(&self, name: &str) -> Result<Entry, RosterError> {
        self.table
            .write()
            .remove_by_name(name)
            .ok_or(RosterError::NotFound)
    }

    /// Atomically change an entry's display name, keeping both indexes in
    /// step. Returns the old name.
    ///
    /// # Test
    ///
    /// ```
    /// use std::time::Instant;
    /// use ichat_service::roster::{Roster, RosterError};
    ///
    /// let roster = Roster::default();
    /// let addr = "127.0.0.1:4000".parse().unwrap();
    /// let now = Instant::now();
    ///
    /// roster.add("Alice", addr, false, now).unwrap();
    /// assert_eq!(roster.rename(&addr, "Alicia", now), Ok("Alice".to_string()));
    /// assert!(!roster.contains_name("Alice"));
    /// assert!(roster.contains_name("Alicia"));
    /// assert_eq!(roster.rename(&addr, "Alicia", now), Err(RosterError::Noop));
    /// ```
    pub fn rename(
        &self,
        addr: &SocketAddr,
        new_name: &str,
        now: Instant,
    ) -> Result<String, RosterError> {
        self.table.write().rename(addr, new_name, now)
    }

    pub fn touch(&self, addr: &SocketAddr, now: Instant) {
        self.table.write().touch(addr, now);
    }

    pub fn mute(&self, addr: &SocketAddr, target: &str, now: Instant) {
        self.table.write().mute(addr, target, now);
    }

    pub fn unmute(&self, addr: &SocketAddr, target: &str, now: Instant) {
        self.table.write().unmute(addr, target, now);
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.table.read().addr_of(name).is_some()
    }

    pub fn name_of(&self, addr: &SocketAddr) -> Option<String> {
        Some(self.table.read().find_by_addr(addr)?.name.clone())
    }

    pub fn addr_of(&self, name: &str) -> Option<SocketAddr> {
        self.table.read().addr_of(name)
    }

    pub fn is_muted(&self, addr: &SocketAddr, sender: &str) -> bool {
        self.table
            .read()
            .find_by_addr(addr)
            .is_some_and(|entry| entry.muted.contains(sender))
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, RosterTable> {
        self.table.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, RosterTable> {
        self.table.write()
    }
}
