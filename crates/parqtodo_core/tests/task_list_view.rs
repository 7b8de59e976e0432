use parqtodo_core::{
    BridgeConfig, BridgeError, BridgeResult, EngineBundle, MemorySnapshotCache, PersistenceBridge,
    StoreHandle, Task, TaskId, TaskListView, TaskStore, ViewStatus,
};
use std::sync::Arc;

fn inline_config() -> BridgeConfig {
    BridgeConfig {
        bundle: Some(EngineBundle::Inline),
        ..BridgeConfig::default()
    }
}

/// Store that knows one task and rejects every mutation.
struct RejectingStore {
    task: Task,
}

impl RejectingStore {
    fn reject<T>(&self) -> BridgeResult<T> {
        Err(BridgeError::InvalidData("storage offline".to_string()))
    }
}

impl TaskStore for RejectingStore {
    fn load_tasks(&self) -> BridgeResult<Vec<Task>> {
        Ok(vec![self.task.clone()])
    }

    fn add(&self, _title: &str) -> BridgeResult<Task> {
        self.reject()
    }

    fn edit(&self, _id: TaskId, _title: &str) -> BridgeResult<Task> {
        self.reject()
    }

    fn delete(&self, _id: TaskId) -> BridgeResult<()> {
        self.reject()
    }

    fn toggle_completed(&self, _id: TaskId) -> BridgeResult<Task> {
        self.reject()
    }

    fn clear(&self) -> BridgeResult<usize> {
        self.reject()
    }
}

#[test]
fn buy_milk_scenario_survives_reload() {
    let cache = Arc::new(MemorySnapshotCache::new());
    let handle = StoreHandle::new();
    handle.start(inline_config(), cache.clone()).unwrap();
    let bridge = handle.wait_ready().unwrap();

    let mut view = TaskListView::new();
    view.load(&*bridge).unwrap();
    assert!(view.tasks().is_empty());
    assert_eq!(view.status(), &ViewStatus::Ready);

    let task = view.add(&*bridge, "Buy milk").unwrap();
    assert_eq!(view.tasks().len(), 1);
    assert!(!view.tasks()[0].completed);
    assert_eq!(view.remaining_count(), 1);

    view.toggle_completed(&*bridge, task.id).unwrap();
    assert!(view.tasks()[0].completed);
    assert_eq!(view.remaining_count(), 0);
    assert_eq!(view.completed_count(), 1);

    let reloaded = PersistenceBridge::initialize(&inline_config(), cache.clone()).unwrap();
    let mut fresh_view = TaskListView::new();
    fresh_view.load(&reloaded).unwrap();
    assert_eq!(fresh_view.tasks(), view.tasks());
    assert_eq!(fresh_view.tasks()[0].title, "Buy milk");
    assert!(fresh_view.tasks()[0].completed);
}

#[test]
fn failed_mutations_roll_back_and_surface_error() {
    let task = Task {
        id: TaskId(1),
        title: "steady".to_string(),
        completed: false,
    };
    let store = RejectingStore { task: task.clone() };
    let mut view = TaskListView::new();
    view.load(&store).unwrap();

    assert!(view.toggle_completed(&store, task.id).is_err());
    assert!(view.edit(&store, task.id, "changed").is_err());
    assert!(view.delete(&store, task.id).is_err());
    assert!(view.clear(&store).is_err());
    assert!(view.add(&store, "new").is_err());

    assert_eq!(view.tasks(), &[task]);
    assert_eq!(view.last_error(), Some("invalid persisted task data: storage offline"));
    assert!(view
        .render_lines()
        .iter()
        .any(|line| line.starts_with("error: ")));
}

#[test]
fn successful_mutation_clears_previous_error() {
    let cache = Arc::new(MemorySnapshotCache::new());
    let bridge = PersistenceBridge::initialize(&inline_config(), cache).unwrap();
    let mut view = TaskListView::new();
    view.load(&bridge).unwrap();

    assert!(view.add(&bridge, "  ").is_err());
    assert!(view.last_error().is_some());

    view.add(&bridge, "real").unwrap();
    assert_eq!(view.last_error(), None);
}

#[test]
fn rendering_lists_tasks_with_counter() {
    let cache = Arc::new(MemorySnapshotCache::new());
    let bridge = PersistenceBridge::initialize(&inline_config(), cache).unwrap();
    let mut view = TaskListView::new();
    view.load(&bridge).unwrap();

    let empty = view.render_lines();
    assert_eq!(empty[1], "0 tasks left");
    assert!(empty.contains(&"Empty task".to_string()));

    let first = view.add(&bridge, "first").unwrap();
    view.add(&bridge, "second").unwrap();
    view.toggle_completed(&bridge, first.id).unwrap();

    let lines = view.render_lines();
    assert_eq!(lines[1], "1 tasks left");
    assert!(lines.contains(&format!("[x] first  #{}", first.id)));
    assert!(!lines.contains(&"Empty task".to_string()));
}

#[test]
fn clear_and_delete_update_the_list() {
    let cache = Arc::new(MemorySnapshotCache::new());
    let bridge = PersistenceBridge::initialize(&inline_config(), cache).unwrap();
    let mut view = TaskListView::new();
    view.load(&bridge).unwrap();

    let a = view.add(&bridge, "a").unwrap();
    view.add(&bridge, "b").unwrap();
    view.add(&bridge, "c").unwrap();

    view.delete(&bridge, a.id).unwrap();
    assert_eq!(view.tasks().len(), 2);

    assert_eq!(view.clear(&bridge).unwrap(), 2);
    assert!(view.tasks().is_empty());
    assert!(bridge.load_tasks().unwrap().is_empty());
}
