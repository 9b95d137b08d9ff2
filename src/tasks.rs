use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{CategoryId, Direction, Task, TaskLevel, swap_with_neighbor};

pub type PriorityMap = BTreeMap<CategoryId, bool>;

pub fn is_priority(priorities: &PriorityMap, category_id: &str) -> bool {
    priorities.get(category_id).copied().unwrap_or(false)
}

/// Ordered task lists for one mode, keyed by category.
///
/// Lists that become empty are dropped, so every key holds at least one task.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaskStore {
    lists: BTreeMap<CategoryId, Vec<Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self, category_id: &str) -> &[Task] {
        self.lists
            .get(category_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CategoryId, &Vec<Task>)> {
        self.lists.iter()
    }

    pub fn contains_category(&self, category_id: &str) -> bool {
        self.lists.contains_key(category_id)
    }

    pub fn contains_text(&self, category_id: &str, text: &str) -> bool {
        self.tasks(category_id).iter().any(|task| task.text == text)
    }

    pub fn is_empty(&self) -> bool {
        self.lists.values().all(Vec::is_empty)
    }

    pub fn total_tasks(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn add_task(&mut self, category_id: &CategoryId, text: &str, level: TaskLevel) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        self.lists
            .entry(category_id.clone())
            .or_default()
            .push(Task::new(text, level));
        true
    }

    pub fn add_quick_task(&mut self, category_id: &CategoryId, preset: &str) -> bool {
        let preset = preset.trim();
        if self.contains_text(category_id.as_str(), preset) {
            return false;
        }
        self.add_task(category_id, preset, TaskLevel::Top)
    }

    pub fn remove_task(&mut self, category_id: &str, index: usize) -> bool {
        let Some(tasks) = self.lists.get_mut(category_id) else {
            return false;
        };
        if index >= tasks.len() {
            return false;
        }

        tasks.remove(index);
        if tasks.is_empty() {
            self.lists.remove(category_id);
        }
        true
    }

    pub fn toggle_level(&mut self, category_id: &str, index: usize) -> bool {
        match self.task_mut(category_id, index) {
            Some(task) => {
                task.level = task.level.toggled();
                true
            }
            None => false,
        }
    }

    pub fn move_task(&mut self, category_id: &str, index: usize, direction: Direction) -> bool {
        self.lists
            .get_mut(category_id)
            .is_some_and(|tasks| swap_with_neighbor(tasks, index, direction))
    }

    /// Replaces the task text; blank replacements leave the task untouched.
    pub fn edit_task(&mut self, category_id: &str, index: usize, new_text: &str) -> bool {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return false;
        }

        match self.task_mut(category_id, index) {
            Some(task) => {
                task.text = new_text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove_category(&mut self, category_id: &str) -> bool {
        self.lists.remove(category_id).is_some()
    }

    pub fn clear(&mut self) {
        self.lists.clear();
    }

    pub(crate) fn set_tasks(&mut self, category_id: CategoryId, tasks: Vec<Task>) {
        if tasks.is_empty() {
            self.lists.remove(&category_id);
        } else {
            self.lists.insert(category_id, tasks);
        }
    }

    fn task_mut(&mut self, category_id: &str, index: usize) -> Option<&mut Task> {
        self.lists.get_mut(category_id)?.get_mut(index)
    }
}

impl FromIterator<(CategoryId, Vec<Task>)> for TaskStore {
    fn from_iter<I: IntoIterator<Item = (CategoryId, Vec<Task>)>>(iter: I) -> Self {
        let mut store = TaskStore::new();
        for (category_id, tasks) in iter {
            store.set_tasks(category_id, tasks);
        }
        store
    }
}
