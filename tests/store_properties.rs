//! Property tests for the task store and grid engine.
//!
//! Uses proptest to verify:
//! 1. Every task carries exactly the registered custom fields after any edit sequence.
//! 2. Undoing every change returns to the loaded state; redoing returns to the final one.
//! 3. Live task ids stay unique under both id policies; monotonic ids are never reissued.
//! 4. Pages partition the sorted rows, and there is always at least one page.

use proptest::prelude::*;
use taskgrid::io::storage::MemoryStorage;
use taskgrid::model::config::{IdPolicy, StoreSection};
use taskgrid::model::field::{CustomFieldDefinition, FieldType};
use taskgrid::model::registry::CustomFieldRegistry;
use taskgrid::model::task::{Priority, Status, Task, TaskDraft, TaskPatch};
use taskgrid::ops::columns::{COL_PRIORITY, COL_TITLE, task_table};
use taskgrid::store::TaskStore;
use taskgrid::table::{PageSize, TableState};

const FIELD_NAMES: [&str; 3] = ["Owner", "Points", "Done"];

#[derive(Debug, Clone)]
enum Op {
    Add(String, Priority),
    Update(usize, Status),
    Delete(usize),
    AddField(usize, FieldType),
    RemoveField(usize),
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::None),
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
        Just(Priority::Urgent),
    ]
}

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::NotStarted),
        Just(Status::InProgress),
        Just(Status::Completed),
    ]
}

fn arb_field_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::Text),
        Just(FieldType::Number),
        Just(FieldType::Checkbox),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        ("[a-zA-Z ]{1,12}", arb_priority()).prop_map(|(t, p)| Op::Add(t, p)),
        (0..8usize, arb_status()).prop_map(|(i, s)| Op::Update(i, s)),
        (0..8usize).prop_map(Op::Delete),
        (0..FIELD_NAMES.len(), arb_field_type()).prop_map(|(i, t)| Op::AddField(i, t)),
        (0..FIELD_NAMES.len()).prop_map(Op::RemoveField),
    ]
}

fn open_store() -> TaskStore<MemoryStorage> {
    open_store_with(IdPolicy::Monotonic)
}

fn open_store_with(id_policy: IdPolicy) -> TaskStore<MemoryStorage> {
    let config = StoreSection {
        history_limit: 0,
        id_policy,
    };
    TaskStore::open(MemoryStorage::new(), config).unwrap()
}

/// Apply one op if it targets something that exists. Returns whether the
/// store recorded a change.
fn apply(store: &mut TaskStore<MemoryStorage>, op: &Op) -> bool {
    match op {
        Op::Add(title, priority) => {
            store
                .add_task(TaskDraft::new(title.clone()).with_priority(*priority))
                .unwrap();
            true
        }
        Op::Update(i, status) => {
            let Some(id) = store.tasks().get(*i).map(|t| t.id) else {
                return false;
            };
            let patch = TaskPatch {
                status: Some(*status),
                ..Default::default()
            };
            store.update_task(id, patch).unwrap();
            true
        }
        Op::Delete(i) => {
            let Some(id) = store.tasks().get(*i).map(|t| t.id) else {
                return false;
            };
            store.delete_task(id).unwrap();
            true
        }
        Op::AddField(i, field_type) => {
            store
                .add_custom_field(CustomFieldDefinition::with_type(FIELD_NAMES[*i], *field_type))
                .unwrap();
            true
        }
        Op::RemoveField(i) => {
            if !store.fields().contains(FIELD_NAMES[*i]) {
                return false;
            }
            store.remove_custom_field(FIELD_NAMES[*i]).unwrap();
            true
        }
    }
}

fn state_of(store: &TaskStore<MemoryStorage>) -> (Vec<Task>, CustomFieldRegistry) {
    (store.tasks().to_vec(), store.fields().clone())
}

proptest! {
    #[test]
    fn fields_stay_in_lockstep(ops in prop::collection::vec(arb_op(), 0..30)) {
        let mut store = open_store();
        for op in &ops {
            apply(&mut store, op);
            prop_assert!(store.snapshot().fields_in_lockstep());
        }
    }

    #[test]
    fn undo_all_then_redo_all(ops in prop::collection::vec(arb_op(), 1..25)) {
        let mut store = open_store();
        let initial = state_of(&store);

        let changes = ops.iter().filter(|op| apply(&mut store, op)).count();
        let last = state_of(&store);

        for _ in 0..changes {
            prop_assert!(store.undo().unwrap());
        }
        prop_assert!(!store.can_undo());
        prop_assert_eq!(state_of(&store), initial);

        for _ in 0..changes {
            prop_assert!(store.redo().unwrap());
        }
        prop_assert!(!store.can_redo());
        prop_assert_eq!(state_of(&store), last);
    }

    #[test]
    fn live_ids_stay_unique(
        ops in prop::collection::vec(arb_op(), 0..30),
        size_policy in any::<bool>(),
    ) {
        let policy = if size_policy { IdPolicy::Size } else { IdPolicy::Monotonic };
        let mut store = open_store_with(policy);
        let mut issued = Vec::new();
        for op in &ops {
            if let Op::Add(title, _) = op {
                issued.push(store.add_task(TaskDraft::new(title.clone())).unwrap());
            } else {
                apply(&mut store, op);
            }
        }
        if policy == IdPolicy::Monotonic {
            let mut sorted = issued.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), issued.len());
        }

        let mut ids: Vec<_> = store.tasks().iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), store.tasks().len());
    }

    #[test]
    fn pages_partition_sorted_rows(
        titles in prop::collection::vec("[a-zA-Z]{1,8}", 0..120),
        size in prop_oneof![Just(10usize), Just(20), Just(50)],
        clicks in 0..3usize,
        by_priority in any::<bool>(),
    ) {
        let tasks: Vec<Task> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| Task {
                id: i as u64 + 1,
                title: title.clone(),
                priority: Priority::Medium,
                status: Status::NotStarted,
                custom_fields: vec![],
            })
            .collect();

        let table = task_table(&CustomFieldRegistry::new());
        let mut state = TableState::new(PageSize::new(size).unwrap());
        let column = if by_priority { COL_PRIORITY } else { COL_TITLE };
        for _ in 0..clicks {
            table.click_header(&mut state, column);
        }

        let first = table.project(&tasks, &state);
        prop_assert!(first.total_pages >= 1);
        prop_assert_eq!(first.total_rows, tasks.len());

        let mut seen: Vec<u64> = Vec::new();
        for page in 1..=first.total_pages {
            state.set_page(page, tasks.len());
            let view = table.project(&tasks, &state);
            prop_assert_eq!(view.current_page, page);
            prop_assert!(view.rows.len() <= size);
            seen.extend(view.rows.iter().map(|r| r.original.id));
        }
        seen.sort_unstable();
        let all: Vec<u64> = (1..=tasks.len() as u64).collect();
        prop_assert_eq!(seen, all);

        // A page size change always lands on page 1
        state.set_page_size(PageSize::new(20).unwrap());
        prop_assert_eq!(state.current_page, 1);
    }
}
