use std::{
    collections::BTreeMap,
    env,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    constants::{LIMITS, QUICK_TASKS, SETTINGS_FILE},
    domain::{CategoryId, Mode},
    storage,
};

pub const DATA_DIR_ENV: &str = "CHECKIN_DATA_DIR";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub history_limit: usize,
    pub clear_confirm_seconds: u64,
    pub quick_tasks: QuickTaskCatalog,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_limit: LIMITS.history_entries,
            clear_confirm_seconds: LIMITS.clear_confirm_seconds,
            quick_tasks: QuickTaskCatalog::builtin(),
        }
    }
}

/// Preset task texts offered per mode and category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickTaskCatalog {
    pub daily: BTreeMap<CategoryId, Vec<String>>,
    pub weekly: BTreeMap<CategoryId, Vec<String>>,
}

impl QuickTaskCatalog {
    pub fn builtin() -> Self {
        let presets: BTreeMap<CategoryId, Vec<String>> = QUICK_TASKS
            .iter()
            .map(|preset| {
                (
                    CategoryId::new(preset.category_id),
                    preset.texts.iter().map(ToString::to_string).collect(),
                )
            })
            .collect();

        Self {
            daily: presets.clone(),
            weekly: presets,
        }
    }

    pub fn presets(&self, mode: Mode, category_id: &str) -> &[String] {
        let by_category = match mode {
            Mode::Daily => &self.daily,
            Mode::Weekly => &self.weekly,
        };
        by_category
            .get(category_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub struct Config {
    pub data_dir: PathBuf,
    pub settings: Settings,
}

impl Config {
    pub fn load(data_dir_override: Option<PathBuf>) -> Self {
        let data_dir = resolve_data_dir(data_dir_override);
        let settings = load_settings(&data_dir);
        Self { data_dir, settings }
    }
}

pub fn resolve_data_dir(data_dir_override: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = data_dir_override {
        return dir;
    }

    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return PathBuf::from(dir);
    }

    ProjectDirs::from("com", "checkin", "checkin")
        .map(|proj_dirs| proj_dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn load_settings(data_dir: &Path) -> Settings {
    let path = data_dir.join(SETTINGS_FILE);
    if !path.exists() {
        return Settings::default();
    }

    match storage::read_json::<Settings>(&path) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
            Settings::default()
        }
    }
}
