use std::{borrow::Borrow, fmt};

use chrono::{Datelike, Local, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        CategoryId(id.into())
    }

    /// Derives the identifier a user-supplied category name maps to.
    pub fn from_name(name: &str) -> Self {
        CategoryId(slugify(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CategoryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub label: String,
    pub icon: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum TaskLevel {
    #[default]
    Top,
    Sub,
}

impl TaskLevel {
    pub fn toggled(self) -> Self {
        match self {
            TaskLevel::Top => TaskLevel::Sub,
            TaskLevel::Sub => TaskLevel::Top,
        }
    }

    pub fn depth(self) -> usize {
        match self {
            TaskLevel::Top => 0,
            TaskLevel::Sub => 1,
        }
    }
}

// Persisted levels deeper than one collapse onto the single supported sub-level.
impl From<u8> for TaskLevel {
    fn from(value: u8) -> Self {
        if value == 0 {
            TaskLevel::Top
        } else {
            TaskLevel::Sub
        }
    }
}

impl From<TaskLevel> for u8 {
    fn from(level: TaskLevel) -> Self {
        level.depth() as u8
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub text: String,
    #[serde(default)]
    pub level: TaskLevel,
}

impl Task {
    pub fn new(text: impl Into<String>, level: TaskLevel) -> Self {
        Task {
            text: text.into(),
            level,
        }
    }

    pub fn top(text: impl Into<String>) -> Self {
        Task::new(text, TaskLevel::Top)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Daily,
    Weekly,
}

impl Mode {
    /// Period key identifying the working period `date` falls in for this mode.
    pub fn period_key(self, date: NaiveDate) -> String {
        match self {
            Mode::Daily => day_key(date),
            Mode::Weekly => week_label(date),
        }
    }

    pub fn has_priorities(self) -> bool {
        matches!(self, Mode::Weekly)
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Daily => "daily",
            Mode::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Index of the neighbor `index` would swap with, if it lies inside `0..len`.
    pub fn neighbor(self, index: usize, len: usize) -> Option<usize> {
        if index >= len {
            return None;
        }
        match self {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|&next| next < len),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ImportPolicy {
    Merge,
    Replace,
}

pub fn swap_with_neighbor<T>(items: &mut [T], index: usize, direction: Direction) -> bool {
    match direction.neighbor(index, items.len()) {
        Some(other) => {
            items.swap(index, other);
            true
        }
        None => false,
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn week_label(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_whitespace = false;

    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            slug.push(ch);
        }
    }

    slug
}
