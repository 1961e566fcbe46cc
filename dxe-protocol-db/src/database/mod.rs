//! Protocol database
//!
//! This module provides protocol installation and lookup functionality.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use dxe_api::error::{self, Result};
use dxe_api::{dxe_debug, dxe_trace, Guid, ProtocolLookup};
use hashbrown::HashMap;
use spin::Mutex;

use crate::notify::{NotifyFn, NotifyId, NotifyList};

/// An installed protocol interface.
pub type Interface = Arc<dyn Any + Send + Sync>;

/// Opaque handle protocols are installed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    /// Raw handle number
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.0)
    }
}

/// Interfaces installed on one handle, in install order
type HandleEntry = Vec<(Guid, Interface)>;

#[derive(Default)]
struct DatabaseInner {
    /// Installed interfaces by handle
    handles: HashMap<Handle, HandleEntry>,
    /// Handles carrying each protocol, in install order
    protocols: HashMap<Guid, Vec<Handle>>,
    /// Install notifications
    notifies: NotifyList,
    /// Next handle number to hand out
    next_handle: u64,
    /// Bumped on every successful install
    generation: u64,
}

/// Capability registry
pub struct ProtocolDatabase {
    inner: Mutex<DatabaseInner>,
}

impl ProtocolDatabase {
    /// Create an empty protocol database
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(DatabaseInner::default()),
        }
    }

    /// Install a protocol interface
    ///
    /// With `handle == None` a new handle is created. Installing a protocol a
    /// handle already carries, or installing on an unknown handle, fails with
    /// `InvalidParameter`. Notifications registered for `protocol` run after
    /// the interface is visible.
    pub fn install_protocol_interface(
        &self,
        handle: Option<Handle>,
        protocol: Guid,
        interface: Interface,
    ) -> Result<Handle> {
        let (handle, callbacks) = {
            let mut inner = self.inner.lock();

            let handle = match handle {
                Some(handle) => {
                    let entry = inner
                        .handles
                        .get(&handle)
                        .ok_or_else(|| error::invalid_parameter("unknown handle"))?;
                    if entry.iter().any(|(installed, _)| *installed == protocol) {
                        return Err(error::invalid_parameter(
                            "protocol already installed on handle",
                        ));
                    }
                    handle
                }
                None => {
                    inner.next_handle += 1;
                    let handle = Handle(inner.next_handle);
                    inner.handles.insert(handle, Vec::new());
                    handle
                }
            };

            if let Some(entry) = inner.handles.get_mut(&handle) {
                entry.push((protocol, interface));
            }
            inner.protocols.entry(protocol).or_default().push(handle);
            inner.generation += 1;

            (handle, inner.notifies.callbacks_for(&protocol))
        };

        dxe_debug!("InstallProtocolInterface: {} on {}", protocol, handle);

        // Lock released; callbacks may re-enter the database.
        for callback in callbacks {
            callback(&protocol, handle);
        }

        Ok(handle)
    }

    /// Locate the first installed interface for a protocol
    pub fn locate_protocol(&self, protocol: &Guid) -> Result<Interface> {
        let inner = self.inner.lock();
        let handle = inner
            .protocols
            .get(protocol)
            .and_then(|handles| handles.first())
            .ok_or_else(|| error::not_found("protocol not installed"))?;
        Self::interface_on(&inner, *handle, protocol)
    }

    /// Get the interface for a protocol on a specific handle
    pub fn handle_protocol(&self, handle: Handle, protocol: &Guid) -> Result<Interface> {
        let inner = self.inner.lock();
        Self::interface_on(&inner, handle, protocol)
    }

    /// List the handles carrying a protocol, in install order
    pub fn locate_handles(&self, protocol: &Guid) -> Vec<Handle> {
        self.inner
            .lock()
            .protocols
            .get(protocol)
            .cloned()
            .unwrap_or_default()
    }

    /// Register a callback for future installs of `protocol`
    pub fn register_protocol_notify<F>(&self, protocol: Guid, callback: F) -> NotifyId
    where
        F: Fn(&Guid, Handle) + Send + Sync + 'static,
    {
        let callback: NotifyFn = Arc::new(callback);
        let id = self.inner.lock().notifies.register(protocol, callback);
        dxe_trace!("RegisterProtocolNotify: {} as {}", protocol, id.as_u64());
        id
    }

    /// Remove a notify registration
    pub fn unregister_protocol_notify(&self, id: NotifyId) -> Result<()> {
        if self.inner.lock().notifies.unregister(id) {
            Ok(())
        } else {
            Err(error::not_found("notify registration"))
        }
    }

    /// Number of installs since the database was created
    ///
    /// An unchanged value means nothing new can have become satisfiable.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Number of live handles
    pub fn handle_count(&self) -> usize {
        self.inner.lock().handles.len()
    }

    fn interface_on(inner: &DatabaseInner, handle: Handle, protocol: &Guid) -> Result<Interface> {
        inner
            .handles
            .get(&handle)
            .ok_or_else(|| error::invalid_parameter("unknown handle"))?
            .iter()
            .find(|(installed, _)| installed == protocol)
            .map(|(_, interface)| Arc::clone(interface))
            .ok_or_else(|| error::not_found("protocol not on handle"))
    }
}

impl Default for ProtocolDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolLookup for ProtocolDatabase {
    fn is_installed(&self, protocol: &Guid) -> bool {
        self.inner
            .lock()
            .protocols
            .get(protocol)
            .is_some_and(|handles| !handles.is_empty())
    }
}

impl fmt::Debug for ProtocolDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ProtocolDatabase")
            .field("handles", &inner.handles.len())
            .field("protocols", &inner.protocols.len())
            .field("notifies", &inner.notifies.len())
            .field("generation", &inner.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use dxe_api::guid::{CPU_ARCH_PROTOCOL, METRONOME_ARCH_PROTOCOL, TIMER_ARCH_PROTOCOL};
    use dxe_api::Error;

    #[test]
    fn test_install_and_locate() {
        let db = ProtocolDatabase::new();
        assert!(!db.is_installed(&CPU_ARCH_PROTOCOL));

        let handle = db
            .install_protocol_interface(None, CPU_ARCH_PROTOCOL, Arc::new(7u32))
            .unwrap();
        assert!(db.is_installed(&CPU_ARCH_PROTOCOL));

        let interface = db.locate_protocol(&CPU_ARCH_PROTOCOL).unwrap();
        assert_eq!(interface.downcast_ref::<u32>(), Some(&7));

        let same = db.handle_protocol(handle, &CPU_ARCH_PROTOCOL).unwrap();
        assert!(Arc::ptr_eq(&interface, &same));
    }

    #[test]
    fn test_locate_missing_protocol() {
        let db = ProtocolDatabase::new();
        assert!(matches!(db.locate_protocol(&TIMER_ARCH_PROTOCOL), Err(Error::NotFound(_))));
        assert!(db.locate_handles(&TIMER_ARCH_PROTOCOL).is_empty());
    }

    #[test]
    fn test_duplicate_on_same_handle_rejected() {
        let db = ProtocolDatabase::new();
        let handle = db
            .install_protocol_interface(None, CPU_ARCH_PROTOCOL, Arc::new(()))
            .unwrap();
        let result = db.install_protocol_interface(Some(handle), CPU_ARCH_PROTOCOL, Arc::new(()));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        // A second protocol on the same handle is fine.
        let again = db
            .install_protocol_interface(Some(handle), TIMER_ARCH_PROTOCOL, Arc::new(()))
            .unwrap();
        assert_eq!(again, handle);
        assert_eq!(db.handle_count(), 1);
    }

    #[test]
    fn test_unknown_handle_rejected() {
        let db = ProtocolDatabase::new();
        let result =
            db.install_protocol_interface(Some(Handle(99)), CPU_ARCH_PROTOCOL, Arc::new(()));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
        assert_eq!(db.generation(), 0);
    }

    #[test]
    fn test_notify_fires_for_matching_protocol_only() {
        static FIRED: AtomicUsize = AtomicUsize::new(0);

        let db = ProtocolDatabase::new();
        db.register_protocol_notify(TIMER_ARCH_PROTOCOL, |_, _| {
            FIRED.fetch_add(1, Ordering::SeqCst);
        });

        db.install_protocol_interface(None, METRONOME_ARCH_PROTOCOL, Arc::new(()))
            .unwrap();
        assert_eq!(FIRED.load(Ordering::SeqCst), 0);

        db.install_protocol_interface(None, TIMER_ARCH_PROTOCOL, Arc::new(()))
            .unwrap();
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_generation_counts_installs() {
        let db = ProtocolDatabase::new();
        assert_eq!(db.generation(), 0);
        db.install_protocol_interface(None, CPU_ARCH_PROTOCOL, Arc::new(()))
            .unwrap();
        db.install_protocol_interface(None, CPU_ARCH_PROTOCOL, Arc::new(()))
            .unwrap();
        assert_eq!(db.generation(), 2);
        assert_eq!(db.locate_handles(&CPU_ARCH_PROTOCOL).len(), 2);
    }
}
