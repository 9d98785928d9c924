use std::rc::Rc;

use crate::model::config::IdPolicy;
use crate::model::field::CustomFieldDefinition;
use crate::model::snapshot::Snapshot;
use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch};

/// A mutation of the store, applied by [`apply`]
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Prepend a new task. The id is chosen by the caller via [`next_id`].
    AddTask { id: TaskId, draft: TaskDraft },
    /// Shallow-merge a patch onto the task with this id
    UpdateTask { id: TaskId, patch: TaskPatch },
    /// Remove the task with this id
    DeleteTask { id: TaskId },
    /// Register (or overwrite) a field and seed it on every task
    AddField(CustomFieldDefinition),
    /// Unregister a field and strip it from every task
    RemoveField(String),
}

impl Command {
    /// Short name used in log events
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddTask { .. } => "add_task",
            Command::UpdateTask { .. } => "update_task",
            Command::DeleteTask { .. } => "delete_task",
            Command::AddField(_) => "add_custom_field",
            Command::RemoveField(_) => "remove_custom_field",
        }
    }

    /// Which durable records this command rewrites
    pub fn records(&self) -> Records {
        match self {
            Command::AddTask { .. } | Command::UpdateTask { .. } | Command::DeleteTask { .. } => {
                Records::TASKS
            }
            Command::AddField(_) | Command::RemoveField(_) => Records::BOTH,
        }
    }
}

/// Set of durable records: the task list and the field registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Records {
    pub tasks: bool,
    pub fields: bool,
}

impl Records {
    pub const NONE: Records = Records {
        tasks: false,
        fields: false,
    };
    pub const TASKS: Records = Records {
        tasks: true,
        fields: false,
    };
    pub const FIELDS: Records = Records {
        tasks: false,
        fields: true,
    };
    pub const BOTH: Records = Records {
        tasks: true,
        fields: true,
    };

    pub fn union(self, other: Records) -> Records {
        Records {
            tasks: self.tasks || other.tasks,
            fields: self.fields || other.fields,
        }
    }

    pub fn is_empty(self) -> bool {
        !self.tasks && !self.fields
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Pure transition: old snapshot + command → new snapshot.
///
/// Never fails. Unknown ids and unknown field names leave the affected half
/// unchanged. The half a command does not touch is shared with `state`.
pub fn apply(state: &Snapshot, command: &Command) -> Snapshot {
    match command {
        Command::AddTask { id, draft } => add_task(state, *id, draft),
        Command::UpdateTask { id, patch } => update_task(state, *id, patch),
        Command::DeleteTask { id } => delete_task(state, *id),
        Command::AddField(def) => add_field(state, def),
        Command::RemoveField(name) => remove_field(state, name),
    }
}

fn add_task(state: &Snapshot, id: TaskId, draft: &TaskDraft) -> Snapshot {
    let task = Task {
        id,
        title: draft.title.clone(),
        priority: draft.priority,
        status: draft.status,
        custom_fields: state.fields.seed_values(),
    };
    let mut tasks = Vec::with_capacity(state.tasks.len() + 1);
    tasks.push(task);
    tasks.extend(state.tasks.iter().cloned());
    Snapshot {
        tasks: Rc::new(tasks),
        fields: Rc::clone(&state.fields),
    }
}

fn update_task(state: &Snapshot, id: TaskId, patch: &TaskPatch) -> Snapshot {
    if state.task(id).is_none() {
        return state.clone();
    }
    let tasks = state
        .tasks
        .iter()
        .map(|task| {
            let mut task = task.clone();
            if task.id == id {
                task.merge(patch);
            }
            task
        })
        .collect();
    Snapshot {
        tasks: Rc::new(tasks),
        fields: Rc::clone(&state.fields),
    }
}

fn delete_task(state: &Snapshot, id: TaskId) -> Snapshot {
    if state.task(id).is_none() {
        return state.clone();
    }
    let tasks = state.tasks.iter().filter(|t| t.id != id).cloned().collect();
    Snapshot {
        tasks: Rc::new(tasks),
        fields: Rc::clone(&state.fields),
    }
}

/// Registering a new name appends its default to every task. Re-registering an
/// existing name keeps each task's value in place when the type is unchanged
/// and resets it to the new default when the type changed.
fn add_field(state: &Snapshot, def: &CustomFieldDefinition) -> Snapshot {
    let mut fields = (*state.fields).clone();
    let previous = fields.register(def.clone());

    let tasks = state
        .tasks
        .iter()
        .map(|task| {
            let mut task = task.clone();
            match task.custom_fields.iter_mut().find(|v| v.name == def.name) {
                Some(existing) => {
                    let same_type = previous
                        .as_ref()
                        .is_some_and(|p| p.field_type == def.field_type)
                        && existing.field_type == def.field_type;
                    if !same_type {
                        *existing = def.seed_value();
                    }
                }
                None => task.custom_fields.push(def.seed_value()),
            }
            task
        })
        .collect();

    Snapshot {
        tasks: Rc::new(tasks),
        fields: Rc::new(fields),
    }
}

fn remove_field(state: &Snapshot, name: &str) -> Snapshot {
    let mut fields = (*state.fields).clone();
    fields.unregister(name);
    let tasks = state
        .tasks
        .iter()
        .map(|task| {
            let mut task = task.clone();
            task.custom_fields.retain(|v| v.name != name);
            task
        })
        .collect();
    Snapshot {
        tasks: Rc::new(tasks),
        fields: Rc::new(fields),
    }
}

// ---------------------------------------------------------------------------
// Id generation
// ---------------------------------------------------------------------------

/// Choose the id for the next task.
///
/// `counter` is the caller's monotonic counter (the next id it has not yet
/// handed out). Under [`IdPolicy::Size`] it is ignored: the id starts at
/// `len + 1` and steps past any id a live task still holds.
pub fn next_id(state: &Snapshot, policy: IdPolicy, counter: TaskId) -> TaskId {
    match policy {
        IdPolicy::Size => {
            let mut id = state.tasks.len() as TaskId + 1;
            while state.task(id).is_some() {
                id += 1;
            }
            id
        }
        IdPolicy::Monotonic => counter.max(state.max_id() + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::{CustomFieldValue, FieldType, FieldValue};
    use crate::model::registry::CustomFieldRegistry;
    use crate::model::task::{Priority, Status};
    use pretty_assertions::assert_eq;

    fn titles(state: &Snapshot) -> Vec<&str> {
        state.tasks.iter().map(|t| t.title.as_str()).collect()
    }

    fn add(state: &Snapshot, id: TaskId, title: &str) -> Snapshot {
        apply(
            state,
            &Command::AddTask {
                id,
                draft: TaskDraft::new(title),
            },
        )
    }

    #[test]
    fn test_add_task_prepends() {
        let s = add(&Snapshot::default(), 1, "X");
        let s = add(&s, 2, "Y");
        assert_eq!(titles(&s), vec!["Y", "X"]);
        assert_eq!(s.tasks[0].id, 2);
        assert_eq!(s.tasks[0].priority, Priority::Medium);
        assert_eq!(s.tasks[0].status, Status::NotStarted);
    }

    #[test]
    fn test_add_task_seeds_registered_fields() {
        let s = apply(
            &Snapshot::default(),
            &Command::AddField(CustomFieldDefinition::with_type("Owner", FieldType::Text)),
        );
        let s = add(&s, 1, "X");
        assert_eq!(
            s.tasks[0].custom_fields,
            vec![CustomFieldValue::new("Owner", FieldValue::Text(String::new()))]
        );
        assert!(s.fields_in_lockstep());
    }

    #[test]
    fn test_task_only_commands_share_registry() {
        let s = apply(
            &Snapshot::default(),
            &Command::AddField(CustomFieldDefinition::with_type("Owner", FieldType::Text)),
        );
        let s2 = add(&s, 1, "X");
        assert!(Rc::ptr_eq(&s.fields, &s2.fields));
    }

    #[test]
    fn test_update_merges_patch() {
        let s = add(&Snapshot::default(), 1, "X");
        let s = apply(
            &s,
            &Command::UpdateTask {
                id: 1,
                patch: TaskPatch {
                    title: Some("X2".into()),
                    priority: Some(Priority::Urgent),
                    ..Default::default()
                },
            },
        );
        assert_eq!(s.tasks[0].title, "X2");
        assert_eq!(s.tasks[0].priority, Priority::Urgent);
        assert_eq!(s.tasks[0].status, Status::NotStarted);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let s = add(&Snapshot::default(), 1, "X");
        let s2 = apply(
            &s,
            &Command::UpdateTask {
                id: 42,
                patch: TaskPatch {
                    title: Some("nope".into()),
                    ..Default::default()
                },
            },
        );
        assert_eq!(s2, s);
        assert!(Rc::ptr_eq(&s.tasks, &s2.tasks));
    }

    #[test]
    fn test_delete_task() {
        let s = add(&add(&Snapshot::default(), 1, "X"), 2, "Y");
        let s = apply(&s, &Command::DeleteTask { id: 2 });
        assert_eq!(titles(&s), vec!["X"]);
        let same = apply(&s, &Command::DeleteTask { id: 2 });
        assert_eq!(same, s);
    }

    #[test]
    fn test_add_then_remove_field_restores_tasks() {
        let base = add(&add(&Snapshot::default(), 1, "X"), 2, "Y");
        let with = apply(
            &base,
            &Command::AddField(CustomFieldDefinition::new("Points", FieldValue::Number(3.0))),
        );
        assert!(with.tasks.iter().all(|t| t.field("Points").is_some()));
        let without = apply(&with, &Command::RemoveField("Points".into()));
        assert_eq!(without, base);
    }

    #[test]
    fn test_reregister_same_type_keeps_values() {
        let s = add(&Snapshot::default(), 1, "X");
        let s = apply(
            &s,
            &Command::AddField(CustomFieldDefinition::with_type("Owner", FieldType::Text)),
        );
        let s = apply(
            &s,
            &Command::UpdateTask {
                id: 1,
                patch: TaskPatch {
                    custom_fields: Some(vec![CustomFieldValue::new(
                        "Owner",
                        FieldValue::Text("ann".into()),
                    )]),
                    ..Default::default()
                },
            },
        );
        let s = apply(
            &s,
            &Command::AddField(CustomFieldDefinition::new(
                "Owner",
                FieldValue::Text("nobody".into()),
            )),
        );
        assert_eq!(s.tasks[0].custom_fields.len(), 1);
        assert_eq!(
            s.tasks[0].field("Owner").unwrap().value,
            FieldValue::Text("ann".into())
        );
        assert_eq!(
            s.fields.get("Owner").unwrap().default_value,
            FieldValue::Text("nobody".into())
        );
    }

    #[test]
    fn test_reregister_new_type_resets_values() {
        let s = add(&Snapshot::default(), 1, "X");
        let s = apply(
            &s,
            &Command::AddField(CustomFieldDefinition::with_type("Done", FieldType::Text)),
        );
        let s = apply(
            &s,
            &Command::AddField(CustomFieldDefinition::with_type("Done", FieldType::Checkbox)),
        );
        assert_eq!(s.fields.len(), 1);
        assert_eq!(
            s.tasks[0].field("Done").unwrap().value,
            FieldValue::Checkbox(false)
        );
        assert!(s.fields_in_lockstep());
    }

    #[test]
    fn test_remove_unknown_field_keeps_tasks() {
        let s = add(&Snapshot::default(), 1, "X");
        let s2 = apply(&s, &Command::RemoveField("Ghost".into()));
        assert_eq!(s2, s);
    }

    #[test]
    fn test_next_id_size_policy_reissues() {
        let s = add(&add(&Snapshot::default(), 1, "X"), 2, "Y");
        let s = apply(&s, &Command::DeleteTask { id: 2 });
        assert_eq!(next_id(&s, IdPolicy::Size, 3), 2);
    }

    #[test]
    fn test_next_id_size_policy_skips_live_ids() {
        let s = add(&add(&Snapshot::default(), 1, "X"), 2, "Y");
        let s = apply(&s, &Command::DeleteTask { id: 1 });
        // len + 1 is 2, which Y still holds
        assert_eq!(next_id(&s, IdPolicy::Size, 3), 3);
    }

    #[test]
    fn test_next_id_monotonic_never_reissues() {
        let s = add(&add(&Snapshot::default(), 1, "X"), 2, "Y");
        let s = apply(&s, &Command::DeleteTask { id: 2 });
        assert_eq!(next_id(&s, IdPolicy::Monotonic, 3), 3);
        // Counter behind the data (e.g. loaded from an older file)
        assert_eq!(next_id(&s, IdPolicy::Monotonic, 1), 2);
    }

    #[test]
    fn test_records_per_command() {
        assert_eq!(Command::DeleteTask { id: 1 }.records(), Records::TASKS);
        assert_eq!(Command::RemoveField("a".into()).records(), Records::BOTH);
        assert!(Records::NONE.is_empty());
        assert_eq!(Records::TASKS.union(Records::FIELDS), Records::BOTH);
    }

    #[test]
    fn test_registry_type_untouched_by_task_patch() {
        let mut fields = CustomFieldRegistry::new();
        fields.register(CustomFieldDefinition::with_type("Owner", FieldType::Text));
        let s = Snapshot::new(vec![], fields);
        let s = add(&s, 1, "X");
        let s = apply(&s, &Command::DeleteTask { id: 1 });
        assert_eq!(s.fields.len(), 1);
    }
}
