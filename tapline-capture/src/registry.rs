//! Session registry
//!
//! An append-only arena of sessions keyed by [`SessionId`]. Slots are never
//! removed or reused: closing a session drops its capture context and leaves
//! a `Closed` record behind, so a stale handle can never alias a newer
//! session.

use std::path::PathBuf;

use tapline_core::{CaptureMode, Error, NetMask, Result, SessionId, SessionState};

use crate::filters::FilterProgram;
use crate::stats::DeliveryCounters;

/// Where a session's packets come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSource {
    Device(String),
    File(PathBuf),
}

impl std::fmt::Display for SessionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionSource::Device(name) => write!(f, "{}", name),
            SessionSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One capture session record
pub struct Session<S> {
    id: SessionId,
    mode: CaptureMode,
    source: SessionSource,
    netmask: NetMask,
    filter: Option<FilterProgram>,
    state: SessionState,
    handle: Option<S>,
    delivery: DeliveryCounters,
}

impl<S> Session<S> {
    /// Build an open session around an activated capture context
    pub fn open(
        id: SessionId,
        mode: CaptureMode,
        source: SessionSource,
        netmask: NetMask,
        filter: FilterProgram,
        handle: S,
    ) -> Self {
        Self {
            id,
            mode,
            source,
            netmask,
            filter: Some(filter),
            state: SessionState::Open,
            handle: Some(handle),
            delivery: DeliveryCounters::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn source(&self) -> &SessionSource {
        &self.source
    }

    pub fn netmask(&self) -> NetMask {
        self.netmask
    }

    pub fn filter(&self) -> Option<&FilterProgram> {
        self.filter.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn delivery(&self) -> &DeliveryCounters {
        &self.delivery
    }

    /// Capture context of an open session
    pub fn handle(&self) -> Result<&S> {
        self.handle.as_ref().ok_or(Error::SessionClosed(self.id))
    }

    /// Capture context of an open session, mutably
    pub fn handle_mut(&mut self) -> Result<&mut S> {
        self.handle.as_mut().ok_or(Error::SessionClosed(self.id))
    }

    /// Capture context and delivery counters, borrowed together
    pub(crate) fn dispatch_parts(&mut self) -> Result<(&mut S, &mut DeliveryCounters)> {
        match self.handle.as_mut() {
            Some(handle) => Ok((handle, &mut self.delivery)),
            None => Err(Error::SessionClosed(self.id)),
        }
    }

    /// Swap in a new filter program; the previous one is discarded
    pub(crate) fn replace_filter(&mut self, program: FilterProgram) -> Option<FilterProgram> {
        self.filter.replace(program)
    }

    /// Release the capture context and mark the session closed
    ///
    /// Returns false when the session was already closed.
    pub(crate) fn close(&mut self) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }
        self.handle = None;
        self.state = SessionState::Closed;
        true
    }

    /// Read-only summary of this session
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            mode: self.mode,
            source: self.source.clone(),
            netmask: self.netmask,
            filter: self.filter.as_ref().map(|f| f.expression().to_string()),
            state: self.state,
        }
    }
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("source", &self.source)
            .field("netmask", &self.netmask)
            .field("filter", &self.filter)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Information about a registered session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: SessionId,
    pub mode: CaptureMode,
    pub source: SessionSource,
    pub netmask: NetMask,
    pub filter: Option<String>,
    pub state: SessionState,
}

/// Append-only table of sessions
///
/// Not synchronized; the owner drives it from one thread.
pub struct SessionRegistry<S> {
    slots: Vec<Session<S>>,
}

impl<S> SessionRegistry<S> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Handle the next created session will receive
    pub fn next_id(&self) -> SessionId {
        SessionId::new(self.slots.len() as u32)
    }

    /// Append a session built for the next free handle
    pub fn create<F>(&mut self, build: F) -> SessionId
    where
        F: FnOnce(SessionId) -> Session<S>,
    {
        let id = self.next_id();
        let session = build(id);
        debug_assert_eq!(session.id(), id);
        self.slots.push(session);
        id
    }

    pub fn get(&self, id: SessionId) -> Result<&Session<S>> {
        self.slots
            .get(id.index())
            .ok_or(Error::InvalidHandle(i64::from(id)))
    }

    pub fn get_mut(&mut self, id: SessionId) -> Result<&mut Session<S>> {
        self.slots
            .get_mut(id.index())
            .ok_or(Error::InvalidHandle(i64::from(id)))
    }

    /// Resolve a raw caller-supplied handle
    pub fn resolve(&self, raw: i32) -> Result<SessionId> {
        let id = SessionId::try_from(raw)?;
        self.get(id).map(|_| id)
    }

    /// Number of slots, open or closed
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of sessions still open
    pub fn open_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state() == SessionState::Open)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session<S>> {
        self.slots.iter()
    }
}

impl<S> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: SessionId) -> Session<u8> {
        Session::open(
            id,
            CaptureMode::Offline,
            SessionSource::File(PathBuf::from("trace.pcap")),
            NetMask::UNKNOWN,
            FilterProgram::new("", NetMask::UNKNOWN, 1),
            0,
        )
    }

    #[test]
    fn test_ids_are_dense_from_zero() {
        let mut registry = SessionRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.create(session), SessionId::new(0));
        assert_eq!(registry.create(session), SessionId::new(1));
        assert_eq!(registry.create(session), SessionId::new(2));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_get_out_of_range() {
        let mut registry = SessionRegistry::new();
        registry.create(session);
        match registry.get(SessionId::new(1)) {
            Err(Error::InvalidHandle(1)) => {}
            other => panic!("Expected InvalidHandle, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_raw_handles() {
        let mut registry = SessionRegistry::new();
        registry.create(session);
        assert_eq!(registry.resolve(0).unwrap(), SessionId::new(0));
        assert!(matches!(registry.resolve(-3), Err(Error::InvalidHandle(-3))));
        assert!(matches!(registry.resolve(1), Err(Error::InvalidHandle(1))));
    }

    #[test]
    fn test_close_keeps_slot() {
        let mut registry = SessionRegistry::new();
        let id = registry.create(session);

        let slot = registry.get_mut(id).unwrap();
        assert!(slot.close());
        assert!(!slot.close());
        assert_eq!(slot.state(), SessionState::Closed);
        assert!(matches!(slot.handle(), Err(Error::SessionClosed(_))));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.open_count(), 0);
        assert_eq!(registry.create(session), SessionId::new(1));
    }

    #[test]
    fn test_replace_filter() {
        let mut registry = SessionRegistry::new();
        let id = registry.create(session);
        let slot = registry.get_mut(id).unwrap();

        let old = slot.replace_filter(FilterProgram::new("tcp", NetMask::UNKNOWN, 4));
        assert_eq!(old.unwrap().expression(), "");
        assert_eq!(slot.filter().unwrap().expression(), "tcp");
        assert_eq!(slot.info().filter.as_deref(), Some("tcp"));
    }
}
