use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    categories::CategoryStore,
    config::Settings,
    confirm::{ClearStep, ConfirmGuard},
    constants::STORAGE_KEYS,
    domain::{Category, CategoryId, Direction, ImportPolicy, Mode, TaskLevel},
    error::{CategoryError, CheckinError},
    history::{HistoryArchive, HistoryEntry, StoredHistoryEntry},
    import::import_tasks,
    migrate::{StoredTaskStore, migrate_store},
    output::format_checkin,
    storage::Storage,
    tasks::{PriorityMap, TaskStore},
};

#[derive(Serialize)]
struct PeriodRecord<'a> {
    tasks: &'a TaskStore,
    #[serde(skip_serializing_if = "Option::is_none")]
    priorities: Option<&'a PriorityMap>,
    date: &'a str,
}

#[derive(Serialize, Deserialize)]
struct StoredPeriodRecord {
    #[serde(default)]
    tasks: StoredTaskStore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priorities: Option<PriorityMap>,
    #[serde(default)]
    date: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stats {
    pub total_tasks: usize,
    pub active_categories: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuickTask<'a> {
    pub text: &'a str,
    pub used: bool,
}

pub struct Composer {
    storage: Storage,
    settings: Settings,
    today: NaiveDate,
    mode: Mode,
    categories: CategoryStore,
    tasks: TaskStore,
    priorities: PriorityMap,
    history: HistoryArchive,
    collapsed: BTreeMap<CategoryId, bool>,
}

fn record_key(mode: Mode) -> &'static str {
    match mode {
        Mode::Daily => STORAGE_KEYS.daily,
        Mode::Weekly => STORAGE_KEYS.weekly,
    }
}

impl Composer {
    pub fn open(storage: Storage, settings: Settings, today: NaiveDate) -> Self {
        let mode: Mode = storage.read_or_default(STORAGE_KEYS.mode);
        let categories: CategoryStore = storage.read_or_default(STORAGE_KEYS.categories);
        let stored_history: Vec<StoredHistoryEntry> =
            storage.read_or_default(STORAGE_KEYS.history);
        let history = HistoryArchive::from_stored(stored_history, settings.history_limit);
        let collapsed = storage.read_or_default(STORAGE_KEYS.collapsed);
        let (tasks, priorities) = load_period(&storage, mode, today);

        debug!(
            mode = %mode,
            categories = categories.len(),
            tasks = tasks.total_tasks(),
            history = history.len(),
            "composer loaded"
        );

        Self {
            storage,
            settings,
            today,
            mode,
            categories,
            tasks,
            priorities,
            history,
            collapsed,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn period_key(&self) -> String {
        self.mode.period_key(self.today)
    }

    pub fn categories(&self) -> &[Category] {
        self.categories.as_slice()
    }

    pub fn category_store(&self) -> &CategoryStore {
        &self.categories
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn priorities(&self) -> &PriorityMap {
        &self.priorities
    }

    pub fn history(&self) -> &HistoryArchive {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_priority(&self, category_id: &str) -> bool {
        self.mode.has_priorities() && crate::tasks::is_priority(&self.priorities, category_id)
    }

    pub fn is_collapsed(&self, category_id: &str) -> bool {
        self.collapsed.get(category_id).copied().unwrap_or(false)
    }

    pub fn stats(&self) -> Stats {
        Stats {
            total_tasks: self.tasks.total_tasks(),
            active_categories: self
                .categories
                .as_slice()
                .iter()
                .filter(|c| !self.tasks.tasks(c.id.as_str()).is_empty())
                .count(),
        }
    }

    pub fn output(&self) -> String {
        format_checkin(
            self.mode,
            self.categories.as_slice(),
            &self.tasks,
            &self.priorities,
        )
    }

    pub fn render_entry(&self, entry: &HistoryEntry) -> String {
        let no_priorities = PriorityMap::new();
        format_checkin(
            entry.mode,
            self.categories.as_slice(),
            &entry.tasks,
            entry.priorities.as_ref().unwrap_or(&no_priorities),
        )
    }

    pub fn quick_tasks(&self, category_id: &str) -> Vec<QuickTask<'_>> {
        self.settings
            .quick_tasks
            .presets(self.mode, category_id)
            .iter()
            .map(|text| {
                let text = text.trim();
                QuickTask {
                    text,
                    used: self.tasks.contains_text(category_id, text),
                }
            })
            .collect()
    }

    pub fn add_category(&mut self, name: &str) -> Result<Category, CategoryError> {
        let category = self.categories.add(name)?.clone();
        info!(id = %category.id, "category added");
        self.persist_categories();
        Ok(category)
    }

    pub fn remove_category(&mut self, category_id: &str) -> Option<Category> {
        let removed = self.categories.remove(category_id)?;

        self.tasks.remove_category(category_id);
        self.priorities.remove(category_id);
        self.collapsed.remove(category_id);
        self.prune_inactive_record(category_id);

        self.persist_categories();
        self.persist_tasks();
        self.persist_collapsed();
        info!(id = %removed.id, "category removed");
        Some(removed)
    }

    pub fn move_category(&mut self, index: usize, direction: Direction) -> bool {
        let moved = self.categories.reorder(index, direction);
        if moved {
            self.persist_categories();
        }
        moved
    }

    pub fn add_task(&mut self, category_id: &str, text: &str, level: TaskLevel) -> bool {
        let Some(category) = self.categories.get(category_id) else {
            return false;
        };
        let id = category.id.clone();
        let changed = self.tasks.add_task(&id, text, level);
        self.persist_if(changed)
    }

    pub fn add_quick_task(&mut self, category_id: &str, preset: &str) -> bool {
        let Some(category) = self.categories.get(category_id) else {
            return false;
        };
        let id = category.id.clone();
        let changed = self.tasks.add_quick_task(&id, preset);
        self.persist_if(changed)
    }

    pub fn remove_task(&mut self, category_id: &str, index: usize) -> bool {
        let changed = self.tasks.remove_task(category_id, index);
        self.persist_if(changed)
    }

    pub fn toggle_level(&mut self, category_id: &str, index: usize) -> bool {
        let changed = self.tasks.toggle_level(category_id, index);
        self.persist_if(changed)
    }

    pub fn move_task(&mut self, category_id: &str, index: usize, direction: Direction) -> bool {
        let changed = self.tasks.move_task(category_id, index, direction);
        self.persist_if(changed)
    }

    pub fn edit_task(&mut self, category_id: &str, index: usize, new_text: &str) -> bool {
        let changed = self.tasks.edit_task(category_id, index, new_text);
        self.persist_if(changed)
    }

    pub fn toggle_priority(&mut self, category_id: &str) -> bool {
        if !self.mode.has_priorities() {
            return false;
        }
        let Some(category) = self.categories.get(category_id) else {
            return false;
        };

        let id = category.id.clone();
        let flag = self.priorities.entry(id).or_insert(false);
        *flag = !*flag;
        self.persist_tasks();
        true
    }

    pub fn toggle_collapsed(&mut self, category_id: &str) -> bool {
        let Some(category) = self.categories.get(category_id) else {
            return false;
        };

        let id = category.id.clone();
        let flag = self.collapsed.entry(id).or_insert(false);
        *flag = !*flag;
        self.persist_collapsed();
        true
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.priorities.clear();
        self.persist_tasks();
        info!(mode = %self.mode, "period cleared");
    }

    pub fn request_clear(&mut self, now: DateTime<Utc>) -> ClearStep {
        let armed_at: Option<DateTime<Utc>> =
            self.storage.read(STORAGE_KEYS.clear_armed, None);
        let mut guard = ConfirmGuard::new(self.settings.clear_confirm_seconds, armed_at);

        let step = guard.press(now);
        match step {
            ClearStep::Armed => self.storage.write(STORAGE_KEYS.clear_armed, &guard.armed_at()),
            ClearStep::Confirmed => {
                self.storage.remove(STORAGE_KEYS.clear_armed);
                self.clear();
            }
        }
        step
    }

    pub fn checkpoint(&mut self) -> bool {
        if self.tasks.is_empty() {
            return false;
        }

        let entry = HistoryEntry {
            period_key: self.period_key(),
            mode: self.mode,
            tasks: self.tasks.clone(),
            priorities: self.mode.has_priorities().then(|| self.priorities.clone()),
        };
        info!(period = %entry.period_key, mode = %entry.mode, "checkpoint recorded");
        self.history.record(entry);
        self.persist_history();
        true
    }

    pub fn copy(&mut self) -> String {
        self.checkpoint();
        self.output()
    }

    pub fn switch_mode(&mut self, target: Mode) -> bool {
        if target == self.mode {
            return false;
        }

        self.checkpoint();
        self.mode = target;
        self.storage.write(STORAGE_KEYS.mode, &self.mode);

        let (tasks, priorities) = load_period(&self.storage, self.mode, self.today);
        self.tasks = tasks;
        self.priorities = priorities;
        info!(mode = %self.mode, period = %self.period_key(), "mode switched");
        true
    }

    pub fn import_sources(&self) -> Vec<&HistoryEntry> {
        self.history
            .import_sources(&Mode::Daily.period_key(self.today))
    }

    pub fn import_day(
        &mut self,
        period_key: &str,
        policy: ImportPolicy,
    ) -> Result<usize, CheckinError> {
        if self.mode != Mode::Daily {
            return Err(CheckinError::ImportUnavailable);
        }

        let today_key = Mode::Daily.period_key(self.today);
        let entry = self
            .history
            .import_sources(&today_key)
            .into_iter()
            .find(|entry| entry.period_key == period_key)
            .ok_or_else(|| CheckinError::HistoryEntryNotFound {
                period_key: period_key.to_string(),
                mode: Mode::Daily,
            })?;

        let imported: TaskStore = entry
            .tasks
            .iter()
            .filter(|(id, _)| self.categories.get(id.as_str()).is_some())
            .map(|(id, tasks)| (id.clone(), tasks.clone()))
            .collect();

        let count = import_tasks(&mut self.tasks, &imported, policy);
        info!(period = %period_key, ?policy, count, "history imported");
        self.persist_tasks();
        Ok(count)
    }

    fn persist_if(&mut self, changed: bool) -> bool {
        if changed {
            self.persist_tasks();
        }
        changed
    }

    fn persist_tasks(&mut self) {
        let period_key = self.period_key();
        let record = PeriodRecord {
            tasks: &self.tasks,
            priorities: self.mode.has_priorities().then_some(&self.priorities),
            date: &period_key,
        };
        self.storage.write(record_key(self.mode), &record);
    }

    fn persist_categories(&mut self) {
        self.storage.write(STORAGE_KEYS.categories, &self.categories);
    }

    fn persist_history(&mut self) {
        self.storage.write(STORAGE_KEYS.history, self.history.entries());
    }

    fn persist_collapsed(&mut self) {
        self.storage.write(STORAGE_KEYS.collapsed, &self.collapsed);
    }

    fn prune_inactive_record(&mut self, category_id: &str) {
        let inactive = match self.mode {
            Mode::Daily => Mode::Weekly,
            Mode::Weekly => Mode::Daily,
        };
        let key = record_key(inactive);

        let Some(mut record) = self.storage.read::<Option<StoredPeriodRecord>>(key, None) else {
            return;
        };
        let had_tasks = record.tasks.remove(category_id).is_some();
        let had_priority = record
            .priorities
            .as_mut()
            .is_some_and(|priorities| priorities.remove(category_id).is_some());

        if had_tasks || had_priority {
            debug!(category = category_id, mode = %inactive, "pruned inactive record");
            self.storage.write(key, &record);
        }
    }
}

fn load_period(storage: &Storage, mode: Mode, today: NaiveDate) -> (TaskStore, PriorityMap) {
    let period_key = mode.period_key(today);
    let Some(record) = storage.read::<Option<StoredPeriodRecord>>(record_key(mode), None) else {
        return (TaskStore::new(), PriorityMap::new());
    };

    if record.date != period_key {
        debug!(mode = %mode, stored = %record.date, current = %period_key, "discarding stale period");
        return (TaskStore::new(), PriorityMap::new());
    }

    let priorities = if mode.has_priorities() {
        record.priorities.unwrap_or_default()
    } else {
        PriorityMap::new()
    };
    (migrate_store(record.tasks), priorities)
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use crate::{
        domain::{Task, week_label},
        storage::{KeyValueStore, MemoryStore},
    };

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn composer_on(storage: Storage, today: NaiveDate) -> Composer {
        Composer::open(storage, Settings::default(), today)
    }

    fn fresh(today: NaiveDate) -> Composer {
        composer_on(Storage::in_memory(), today)
    }

    /// Reopens the same backing storage, as a new process would.
    fn reopen(composer: Composer, today: NaiveDate) -> Composer {
        let Composer {
            storage, settings, ..
        } = composer;
        Composer::open(storage, settings, today)
    }

    #[test]
    fn test_defaults_on_empty_storage() {
        let composer = fresh(day(10));
        assert_eq!(composer.mode(), Mode::Daily);
        assert_eq!(composer.categories().len(), 6);
        assert!(composer.tasks().is_empty());
        assert!(composer.history().is_empty());
        assert_eq!(composer.period_key(), "2026-03-10");
    }

    #[test]
    fn test_mutations_survive_reopen() {
        let mut composer = fresh(day(10));
        assert!(composer.add_task("meta", "Revisei templates", TaskLevel::Top));
        assert!(composer.add_task("meta", "Detalhe", TaskLevel::Top));
        assert!(composer.toggle_level("meta", 1));
        assert!(composer.move_category(0, Direction::Down));

        let composer = reopen(composer, day(10));
        assert_eq!(
            composer.tasks().tasks("meta"),
            &[
                Task::top("Revisei templates"),
                Task::new("Detalhe", TaskLevel::Sub)
            ]
        );
        assert_eq!(composer.categories()[1].id.as_str(), "meta");
    }

    #[test]
    fn test_unknown_category_rejects_tasks() {
        let mut composer = fresh(day(10));
        assert!(!composer.add_task("ghost", "x", TaskLevel::Top));
        assert!(!composer.add_quick_task("ghost", "x"));
        assert!(composer.tasks().is_empty());
    }

    #[test]
    fn test_stale_daily_record_is_discarded() {
        let mut composer = fresh(day(9));
        composer.add_task("meta", "ontem", TaskLevel::Top);

        let composer = reopen(composer, day(10));
        assert!(composer.tasks().is_empty());
    }

    #[test]
    fn test_legacy_daily_record_is_migrated() {
        let mut store = MemoryStore::new();
        store
            .set(
                STORAGE_KEYS.daily,
                r#"{"tasks": {"meta": ["Revisei templates"]}, "date": "2026-03-10"}"#,
            )
            .unwrap();

        let composer = composer_on(Storage::new(store), day(10));
        assert_eq!(
            composer.tasks().tasks("meta"),
            &[Task::top("Revisei templates")]
        );
    }

    #[test]
    fn test_remove_category_cascades_to_both_modes() {
        let mut composer = fresh(day(10));
        composer.add_category("x").unwrap();
        composer.switch_mode(Mode::Weekly);
        composer.add_task("x", "semanal", TaskLevel::Top);
        composer.toggle_priority("x");
        composer.switch_mode(Mode::Daily);
        composer.add_task("x", "diário", TaskLevel::Top);
        composer.toggle_collapsed("x");

        assert!(composer.remove_category("x").is_some());
        assert!(!composer.tasks().contains_category("x"));
        assert!(!composer.is_collapsed("x"));
        assert!(!composer.output().contains("x:"));

        composer.switch_mode(Mode::Weekly);
        assert!(!composer.tasks().contains_category("x"));
        assert!(!composer.priorities().contains_key("x"));
    }

    #[test]
    fn test_duplicate_category_is_rejected() {
        let mut composer = fresh(day(10));
        assert_eq!(
            composer.add_category("Outros").unwrap_err(),
            CategoryError::DuplicateId(CategoryId::new("outros"))
        );
        assert_eq!(composer.categories().len(), 6);
    }

    #[test]
    fn test_quick_task_duplicate_suppression() {
        let mut composer = fresh(day(10));
        let preset = composer.quick_tasks("meta")[0].text.to_string();

        assert!(composer.add_quick_task("meta", &preset));
        assert!(!composer.add_quick_task("meta", &preset));
        assert_eq!(composer.tasks().tasks("meta").len(), 1);
        assert!(composer.quick_tasks("meta")[0].used);
    }

    #[test]
    fn test_switch_mode_archives_and_loads_target_period() {
        let mut composer = fresh(day(10));
        composer.add_task("meta", "diário", TaskLevel::Top);

        assert!(composer.switch_mode(Mode::Weekly));
        assert!(!composer.switch_mode(Mode::Weekly));
        assert!(composer.tasks().is_empty());
        assert_eq!(composer.period_key(), week_label(day(10)));

        let archived = composer.history().get("2026-03-10", Mode::Daily).unwrap();
        assert_eq!(archived.tasks.tasks("meta"), &[Task::top("diário")]);
        assert!(archived.priorities.is_none());

        assert!(composer.switch_mode(Mode::Daily));
        assert_eq!(composer.tasks().tasks("meta"), &[Task::top("diário")]);

        let composer = reopen(composer, day(10));
        assert_eq!(composer.mode(), Mode::Daily);
    }

    #[test]
    fn test_empty_store_is_not_archived() {
        let mut composer = fresh(day(10));
        composer.switch_mode(Mode::Weekly);
        assert!(composer.history().is_empty());
    }

    #[test]
    fn test_weekly_priorities_persist_within_week() {
        let mut composer = fresh(day(9));
        composer.switch_mode(Mode::Weekly);
        composer.add_task("meta", "Revisei templates", TaskLevel::Top);
        assert!(composer.toggle_priority("meta"));

        let composer = reopen(composer, day(11));
        assert!(composer.is_priority("meta"));
        assert!(composer.output().starts_with("->> Prioridades:"));

        let composer = reopen(composer, day(17));
        assert!(composer.tasks().is_empty());
        assert!(composer.priorities().is_empty());
    }

    #[test]
    fn test_priority_toggle_ignored_in_daily_mode() {
        let mut composer = fresh(day(10));
        assert!(!composer.toggle_priority("meta"));
        assert!(composer.priorities().is_empty());
    }

    #[test]
    fn test_copy_checkpoints_and_overwrites_same_day() {
        let mut composer = fresh(day(10));
        assert_eq!(composer.copy(), "");
        assert!(composer.history().is_empty());

        composer.add_task("outros", "um", TaskLevel::Top);
        composer.copy();
        composer.add_task("outros", "dois", TaskLevel::Top);
        let text = composer.copy();

        assert_eq!(text, "-> Outros:\n\t- um;\n\t- dois;");
        assert_eq!(composer.history().len(), 1);
        assert_eq!(
            composer
                .history()
                .get("2026-03-10", Mode::Daily)
                .unwrap()
                .tasks
                .total_tasks(),
            2
        );
    }

    #[test]
    fn test_import_previous_day_merge() {
        let mut composer = fresh(day(9));
        composer.add_task("meta", "X", TaskLevel::Top);
        composer.add_task("meta", "Y", TaskLevel::Top);
        composer.copy();

        let mut composer = reopen(composer, day(10));
        composer.add_task("meta", "X", TaskLevel::Top);
        let sources: Vec<String> = composer
            .import_sources()
            .iter()
            .map(|e| e.period_key.clone())
            .collect();
        assert_eq!(sources, vec!["2026-03-09".to_string()]);

        let added = composer.import_day("2026-03-09", ImportPolicy::Merge).unwrap();
        assert_eq!(added, 1);
        assert_eq!(
            composer.tasks().tasks("meta"),
            &[Task::top("X"), Task::top("Y")]
        );

        let composer = reopen(composer, day(10));
        assert_eq!(composer.tasks().total_tasks(), 2);
    }

    #[test]
    fn test_import_rejects_today_weekly_and_missing() {
        let mut composer = fresh(day(10));
        composer.add_task("meta", "X", TaskLevel::Top);
        composer.copy();

        assert!(matches!(
            composer.import_day("2026-03-10", ImportPolicy::Replace),
            Err(CheckinError::HistoryEntryNotFound { .. })
        ));
        assert!(matches!(
            composer.import_day("2026-01-01", ImportPolicy::Merge),
            Err(CheckinError::HistoryEntryNotFound { .. })
        ));

        composer.switch_mode(Mode::Weekly);
        assert!(matches!(
            composer.import_day("2026-03-10", ImportPolicy::Merge),
            Err(CheckinError::ImportUnavailable)
        ));
    }

    #[test]
    fn test_import_skips_deleted_categories() {
        let mut composer = fresh(day(9));
        composer.add_category("Temp").unwrap();
        composer.add_task("temp", "X", TaskLevel::Top);
        composer.add_task("meta", "Y", TaskLevel::Top);
        composer.copy();

        let mut composer = reopen(composer, day(10));
        composer.remove_category("temp");
        composer
            .import_day("2026-03-09", ImportPolicy::Replace)
            .unwrap();
        assert!(!composer.tasks().contains_category("temp"));
        assert_eq!(composer.tasks().tasks("meta"), &[Task::top("Y")]);
    }

    #[test]
    fn test_request_clear_needs_confirmation() {
        let mut composer = fresh(day(10));
        composer.add_task("meta", "X", TaskLevel::Top);
        let start = DateTime::from_timestamp(1_773_100_800, 0).unwrap();

        assert_eq!(composer.request_clear(start), ClearStep::Armed);
        assert!(!composer.tasks().is_empty());

        let late = start + ChronoDuration::seconds(10);
        assert_eq!(composer.request_clear(late), ClearStep::Armed);
        assert!(!composer.tasks().is_empty());

        let mut composer = reopen(composer, day(10));
        let confirm = late + ChronoDuration::seconds(2);
        assert_eq!(composer.request_clear(confirm), ClearStep::Confirmed);
        assert!(composer.tasks().is_empty());

        let composer = reopen(composer, day(10));
        assert!(composer.tasks().is_empty());
    }

    #[test]
    fn test_request_clear_with_oversized_window_uses_default() {
        let settings = Settings {
            clear_confirm_seconds: 10_000_000_000_000_000,
            ..Settings::default()
        };
        let mut composer = Composer::open(Storage::in_memory(), settings, day(10));
        composer.add_task("meta", "X", TaskLevel::Top);
        let start = DateTime::from_timestamp(1_773_100_800, 0).unwrap();

        assert_eq!(composer.request_clear(start), ClearStep::Armed);
        let late = start + ChronoDuration::seconds(10);
        assert_eq!(composer.request_clear(late), ClearStep::Armed);
        assert_eq!(
            composer.request_clear(late + ChronoDuration::seconds(1)),
            ClearStep::Confirmed
        );
        assert!(composer.tasks().is_empty());
    }

    #[test]
    fn test_padded_preset_is_added_once_and_marked_used() {
        let mut settings = Settings::default();
        settings
            .quick_tasks
            .daily
            .insert(CategoryId::new("meta"), vec!["  Monitoramento ".to_string()]);
        let mut composer = Composer::open(Storage::in_memory(), settings, day(10));

        let preset = composer.quick_tasks("meta")[0].text.to_string();
        assert_eq!(preset, "Monitoramento");
        assert!(composer.add_quick_task("meta", "  Monitoramento "));
        assert!(!composer.add_quick_task("meta", "  Monitoramento "));
        assert_eq!(composer.tasks().tasks("meta"), &[Task::top("Monitoramento")]);
        assert!(composer.quick_tasks("meta")[0].used);
    }

    #[test]
    fn test_stats_count_only_existing_categories() {
        let mut composer = fresh(day(10));
        composer.add_task("meta", "X", TaskLevel::Top);
        composer.add_task("meta", "Y", TaskLevel::Sub);
        composer.add_task("outros", "Z", TaskLevel::Top);

        assert_eq!(
            composer.stats(),
            Stats {
                total_tasks: 3,
                active_categories: 2
            }
        );
    }
}
