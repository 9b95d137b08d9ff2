use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{CategoryId, Task, TaskLevel},
    tasks::TaskStore,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredTask {
    Legacy(String),
    Record {
        text: String,
        #[serde(default)]
        level: TaskLevel,
    },
}

impl From<StoredTask> for Task {
    fn from(stored: StoredTask) -> Self {
        match stored {
            StoredTask::Legacy(text) => Task::top(text),
            StoredTask::Record { text, level } => Task::new(text, level),
        }
    }
}

pub type StoredTaskStore = BTreeMap<CategoryId, Vec<StoredTask>>;

pub fn migrate_store(stored: StoredTaskStore) -> TaskStore {
    stored
        .into_iter()
        .map(|(category_id, tasks)| {
            let tasks: Vec<Task> = tasks.into_iter().map(Task::from).collect();
            (category_id, tasks)
        })
        .collect()
}
