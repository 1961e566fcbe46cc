//! Protocol database tests

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dxe_api::guid::{BDS_ARCH_PROTOCOL, CPU_ARCH_PROTOCOL, RUNTIME_ARCH_PROTOCOL};
use dxe_api::{Error, Guid, ProtocolLookup};
use dxe_protocol_db::{protocol_db, ProtocolDatabase};

#[test]
fn test_notify_callback_may_reenter_database() {
    let db = Arc::new(ProtocolDatabase::new());

    // Installing the CPU protocol publishes the runtime protocol from inside
    // the notification, the way a driver reacting to a dependency would.
    let inner = Arc::clone(&db);
    db.register_protocol_notify(CPU_ARCH_PROTOCOL, move |_, _| {
        inner
            .install_protocol_interface(None, RUNTIME_ARCH_PROTOCOL, Arc::new(()))
            .unwrap();
    });

    db.install_protocol_interface(None, CPU_ARCH_PROTOCOL, Arc::new(()))
        .unwrap();
    assert!(db.is_installed(&RUNTIME_ARCH_PROTOCOL));
    assert_eq!(db.generation(), 2);
}

#[test]
fn test_notify_receives_protocol_and_handle() {
    let db = ProtocolDatabase::new();
    let seen: Arc<Mutex<Vec<(Guid, u64)>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    db.register_protocol_notify(BDS_ARCH_PROTOCOL, move |protocol, handle| {
        sink.lock().unwrap().push((*protocol, handle.as_u64()));
    });

    let handle = db
        .install_protocol_interface(None, BDS_ARCH_PROTOCOL, Arc::new("bds"))
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![(BDS_ARCH_PROTOCOL, handle.as_u64())]);
}

#[test]
fn test_unregistered_notify_stops_firing() {
    let db = ProtocolDatabase::new();
    let count = Arc::new(AtomicU64::new(0));

    let counter = Arc::clone(&count);
    let id = db.register_protocol_notify(CPU_ARCH_PROTOCOL, move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    db.install_protocol_interface(None, CPU_ARCH_PROTOCOL, Arc::new(()))
        .unwrap();
    db.unregister_protocol_notify(id).unwrap();
    db.install_protocol_interface(None, CPU_ARCH_PROTOCOL, Arc::new(()))
        .unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(matches!(db.unregister_protocol_notify(id), Err(Error::NotFound(_))));
}

#[test]
fn test_locate_returns_first_installed() {
    let db = ProtocolDatabase::new();
    db.install_protocol_interface(None, CPU_ARCH_PROTOCOL, Arc::new(1u8))
        .unwrap();
    db.install_protocol_interface(None, CPU_ARCH_PROTOCOL, Arc::new(2u8))
        .unwrap();

    let first = db.locate_protocol(&CPU_ARCH_PROTOCOL).unwrap();
    assert_eq!(first.downcast_ref::<u8>(), Some(&1));
}

#[test]
fn test_global_database() {
    let db = protocol_db();
    let before = db.generation();
    db.install_protocol_interface(None, BDS_ARCH_PROTOCOL, Arc::new(()))
        .unwrap();
    assert!(protocol_db().is_installed(&BDS_ARCH_PROTOCOL));
    assert_eq!(protocol_db().generation(), before + 1);
}
