use parqtodo_core::{
    BridgeConfig, BridgeError, EngineBundle, LifecycleState, MemorySnapshotCache,
    PersistenceBridge, StoreHandle,
};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn inline_config() -> BridgeConfig {
    BridgeConfig {
        bundle: Some(EngineBundle::Inline),
        ..BridgeConfig::default()
    }
}

#[test]
fn new_handle_is_uninitialized_and_not_started() {
    let handle = StoreHandle::new();
    assert_eq!(handle.state(), LifecycleState::Uninitialized);
    assert!(matches!(handle.wait_ready(), Err(BridgeError::NotStarted)));
    assert!(handle.try_ready().is_none());
}

#[test]
fn background_start_reaches_ready_for_every_waiter() {
    let handle = StoreHandle::new();
    handle
        .start(inline_config(), Arc::new(MemorySnapshotCache::new()))
        .unwrap();

    let waiters = (0..4)
        .map(|_| {
            let handle = handle.clone();
            thread::spawn(move || {
                handle
                    .wait_ready()
                    .map(|bridge| bridge.snapshot_key().to_string())
            })
        })
        .collect::<Vec<_>>();
    for waiter in waiters {
        assert_eq!(waiter.join().unwrap().unwrap(), "todos");
    }

    assert_eq!(handle.state(), LifecycleState::Ready);
    assert!(handle.try_ready().is_some());
}

#[test]
fn second_start_is_rejected() {
    let handle = StoreHandle::new();
    let cache = Arc::new(MemorySnapshotCache::new());
    handle.initialize_now(&inline_config(), cache.clone()).unwrap();

    assert!(matches!(
        handle.start(inline_config(), cache),
        Err(BridgeError::AlreadyStarted)
    ));
}

#[test]
fn failed_initialization_is_terminal_and_visible() {
    let handle = StoreHandle::new();
    let err = handle
        .initialize_now_with(|| Err(BridgeError::InitFailed("bundle fetch failed".to_string())))
        .err()
        .expect("initializer failure must surface");
    assert!(matches!(
        err,
        BridgeError::InitFailed(reason) if reason.contains("bundle fetch failed")
    ));

    assert!(matches!(handle.state(), LifecycleState::Failed(_)));
    assert!(matches!(handle.wait_ready(), Err(BridgeError::InitFailed(_))));
}

#[test]
fn bounded_wait_times_out_while_initializing() {
    let handle = StoreHandle::new();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    handle
        .start_with(move || {
            let _ = release_rx.recv();
            PersistenceBridge::initialize(&inline_config(), Arc::new(MemorySnapshotCache::new()))
        })
        .unwrap();

    assert_eq!(handle.state(), LifecycleState::Initializing);
    assert!(matches!(
        handle.wait_ready_timeout(Duration::from_millis(20)),
        Err(BridgeError::NotReady)
    ));

    release_tx.send(()).unwrap();
    assert!(handle.wait_ready_timeout(Duration::from_secs(10)).is_ok());
}
