use itertools::Itertools;

use crate::{
    constants::EXPORT_FORMAT,
    domain::{Category, Mode, Task},
    tasks::{PriorityMap, TaskStore, is_priority},
};

pub fn format_checkin(
    mode: Mode,
    categories: &[Category],
    tasks: &TaskStore,
    priorities: &PriorityMap,
) -> String {
    let filled = categories
        .iter()
        .filter(|category| !tasks.tasks(category.id.as_str()).is_empty());

    let (priority, normal): (Vec<&Category>, Vec<&Category>) = match mode {
        Mode::Daily => (Vec::new(), filled.collect()),
        Mode::Weekly => filled.partition(|category| is_priority(priorities, category.id.as_str())),
    };

    let mut lines = Vec::new();
    if !priority.is_empty() {
        lines.push(EXPORT_FORMAT.priority_header.to_string());
        for category in priority {
            push_block(&mut lines, category, tasks.tasks(category.id.as_str()), 1);
        }
    }
    for category in normal {
        push_block(&mut lines, category, tasks.tasks(category.id.as_str()), 0);
    }

    lines.join("\n")
}

fn push_block(lines: &mut Vec<String>, category: &Category, tasks: &[Task], depth: usize) {
    lines.push(format!(
        "{}{} {}:",
        EXPORT_FORMAT.indent.repeat(depth),
        EXPORT_FORMAT.category_prefix,
        category.label
    ));
    lines.extend(tasks.iter().map(|task| task_line(task, depth)));
}

fn task_line(task: &Task, depth: usize) -> String {
    format!(
        "{}{} {}{}",
        EXPORT_FORMAT.indent.repeat(depth + 1 + task.level.depth()),
        EXPORT_FORMAT.bullet,
        task.text,
        EXPORT_FORMAT.terminator
    )
}

pub fn summarize(categories: &[Category], tasks: &TaskStore) -> String {
    categories
        .iter()
        .filter_map(|category| {
            let count = tasks.tasks(category.id.as_str()).len();
            (count > 0).then(|| format!("{} ({})", category.label, count))
        })
        .join(", ")
}
