use crate::{domain::ImportPolicy, tasks::TaskStore};

// Merge only dedupes against each category's pre-import list.
pub fn import_tasks(current: &mut TaskStore, imported: &TaskStore, policy: ImportPolicy) -> usize {
    match policy {
        ImportPolicy::Replace => {
            *current = imported.clone();
            current.total_tasks()
        }
        ImportPolicy::Merge => {
            let mut added = 0;
            for (category_id, tasks) in imported.iter() {
                let existing = current.tasks(category_id.as_str());
                let fresh: Vec<_> = tasks
                    .iter()
                    .filter(|task| !existing.iter().any(|e| e.text == task.text))
                    .cloned()
                    .collect();
                if fresh.is_empty() {
                    continue;
                }

                added += fresh.len();
                let mut merged = existing.to_vec();
                merged.extend(fresh);
                current.set_tasks(category_id.clone(), merged);
            }
            added
        }
    }
}
