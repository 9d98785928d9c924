use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::registry::CustomFieldRegistry;
use super::task::{Task, TaskId};

/// Immutable view of the whole store at one instant.
///
/// Both halves sit behind `Rc`, so a transition that only touches the task
/// list shares the registry with the previous snapshot (and vice versa), and
/// pushing a snapshot onto the undo stack never copies task data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tasks: Rc<Vec<Task>>,
    pub fields: Rc<CustomFieldRegistry>,
}

impl Snapshot {
    pub fn new(tasks: Vec<Task>, fields: CustomFieldRegistry) -> Self {
        Snapshot {
            tasks: Rc::new(tasks),
            fields: Rc::new(fields),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn fields(&self) -> &CustomFieldRegistry {
        &self.fields
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Highest id in the collection, 0 when empty
    pub fn max_id(&self) -> TaskId {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0)
    }

    /// Every task carries exactly the registered fields, with matching types
    pub fn fields_in_lockstep(&self) -> bool {
        self.tasks.iter().all(|task| {
            task.custom_fields.len() == self.fields.len()
                && task.custom_fields.iter().all(|value| {
                    value.is_consistent()
                        && self
                            .fields
                            .get(&value.name)
                            .is_some_and(|def| def.field_type == value.field_type)
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::{CustomFieldDefinition, CustomFieldValue, FieldType, FieldValue};
    use crate::model::task::{Priority, Status};

    fn task(id: TaskId, fields: Vec<CustomFieldValue>) -> Task {
        Task {
            id,
            title: format!("Task {id}"),
            priority: Priority::Medium,
            status: Status::NotStarted,
            custom_fields: fields,
        }
    }

    #[test]
    fn test_clone_shares_storage() {
        let snap = Snapshot::new(vec![task(1, vec![])], CustomFieldRegistry::new());
        let copy = snap.clone();
        assert!(Rc::ptr_eq(&snap.tasks, &copy.tasks));
        assert_eq!(snap, copy);
    }

    #[test]
    fn test_max_id_and_lookup() {
        let snap = Snapshot::new(
            vec![task(4, vec![]), task(9, vec![]), task(2, vec![])],
            CustomFieldRegistry::new(),
        );
        assert_eq!(snap.max_id(), 9);
        assert_eq!(snap.task(2).map(|t| t.id), Some(2));
        assert!(snap.task(5).is_none());
        assert_eq!(Snapshot::default().max_id(), 0);
    }

    #[test]
    fn test_lockstep_detection() {
        let mut fields = CustomFieldRegistry::new();
        fields.register(CustomFieldDefinition::with_type("Owner", FieldType::Text));
        let good = Snapshot::new(
            vec![task(1, vec![CustomFieldValue::new("Owner", FieldValue::Text("x".into()))])],
            fields.clone(),
        );
        assert!(good.fields_in_lockstep());

        let missing = Snapshot::new(vec![task(1, vec![])], fields.clone());
        assert!(!missing.fields_in_lockstep());

        let wrong_type = Snapshot::new(
            vec![task(1, vec![CustomFieldValue::new("Owner", FieldValue::Number(1.0))])],
            fields,
        );
        assert!(!wrong_type.fields_in_lockstep());
    }
}
