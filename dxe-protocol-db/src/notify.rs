//! Protocol install notifications
//!
//! A notification is a callback bound to one protocol GUID. It runs once for
//! every interface of that protocol installed after the registration, with the
//! database lock released so the callback may itself install or locate
//! protocols.

use alloc::sync::Arc;
use alloc::vec::Vec;
use dxe_api::Guid;

use crate::database::Handle;

/// Callback invoked with the protocol and the handle it was installed on.
pub type NotifyFn = Arc<dyn Fn(&Guid, Handle) + Send + Sync>;

/// Identifies a notify registration so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotifyId(u64);

impl NotifyId {
    /// Raw registration number
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

struct NotifyEntry {
    id: NotifyId,
    protocol: Guid,
    callback: NotifyFn,
}

/// Registered notifications, in registration order.
#[derive(Default)]
pub(crate) struct NotifyList {
    entries: Vec<NotifyEntry>,
    next_id: u64,
}

impl NotifyList {
    pub(crate) fn register(&mut self, protocol: Guid, callback: NotifyFn) -> NotifyId {
        self.next_id += 1;
        let id = NotifyId(self.next_id);
        self.entries.push(NotifyEntry { id, protocol, callback });
        id
    }

    /// Removes a registration, returning `false` if `id` is unknown.
    pub(crate) fn unregister(&mut self, id: NotifyId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Clones out the callbacks registered for `protocol`.
    pub(crate) fn callbacks_for(&self, protocol: &Guid) -> Vec<NotifyFn> {
        self.entries
            .iter()
            .filter(|entry| entry.protocol == *protocol)
            .map(|entry| Arc::clone(&entry.callback))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
