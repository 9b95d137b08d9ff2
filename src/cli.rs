use std::{
    io::{self, Write},
    path::PathBuf,
};

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::warn;

use crate::{
    composer::Composer,
    config::Config,
    confirm::ClearStep,
    constants::LIMITS,
    domain::{CategoryId, Direction, ImportPolicy, Mode, TaskLevel, today},
    error::CheckinError,
    history::HistoryEntry,
    logging,
    output,
    storage::{self, FileStore, Storage},
};

#[derive(Parser, Debug)]
#[command(name = "checkin")]
#[command(about = "Compose daily and weekly check-in notes", long_about = None)]
pub struct Cli {
    #[arg(long, global = true, help = "Directory holding the check-in data")]
    data_dir: Option<PathBuf>,

    #[arg(long, short, global = true, help = "Log debug details to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Show categories and tasks of the current period")]
    Show,

    #[command(about = "Print the check-in text")]
    Preview,

    #[command(about = "Print the check-in text for the clipboard and archive it")]
    Copy,

    #[command(about = "Show task counters")]
    Stats,

    #[command(about = "Show or switch the working mode")]
    Mode {
        #[arg(value_enum, help = "Mode to switch to")]
        mode: Option<Mode>,
    },

    #[command(about = "Manage categories")]
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    #[command(about = "Add a task to a category")]
    Add {
        #[arg(help = "Category id or label")]
        category: String,

        #[arg(required = true, num_args = 1.., help = "Task text")]
        text: Vec<String>,

        #[arg(long, help = "Add as a sub-item")]
        sub: bool,
    },

    #[command(about = "List quick tasks of a category, or add one by number")]
    Quick {
        #[arg(help = "Category id or label")]
        category: String,

        #[arg(help = "Preset number to add")]
        number: Option<usize>,
    },

    #[command(about = "Remove a task")]
    Remove {
        #[arg(help = "Category id or label")]
        category: String,

        #[arg(help = "Task number")]
        number: usize,
    },

    #[command(about = "Toggle a task between top level and sub-item")]
    Indent {
        #[arg(help = "Category id or label")]
        category: String,

        #[arg(help = "Task number")]
        number: usize,
    },

    #[command(about = "Move a task up or down")]
    Move {
        #[arg(help = "Category id or label")]
        category: String,

        #[arg(help = "Task number")]
        number: usize,

        #[arg(value_enum)]
        direction: Direction,
    },

    #[command(about = "Replace a task's text")]
    Edit {
        #[arg(help = "Category id or label")]
        category: String,

        #[arg(help = "Task number")]
        number: usize,

        #[arg(required = true, num_args = 1.., help = "New text")]
        text: Vec<String>,
    },

    #[command(about = "Toggle a category's priority flag (weekly mode)")]
    Priority {
        #[arg(help = "Category id or label")]
        category: String,
    },

    #[command(about = "Collapse or expand a category in `show`")]
    Collapse {
        #[arg(help = "Category id or label")]
        category: String,
    },

    #[command(about = "Clear the current period (run twice to confirm)")]
    Clear,

    #[command(about = "List archived check-ins")]
    History {
        #[arg(long, value_enum, help = "Mode to list (defaults to the current one)")]
        mode: Option<Mode>,

        #[arg(long, default_value_t = LIMITS.recent_entries)]
        limit: usize,

        #[arg(long, help = "Render each entry as check-in text")]
        render: bool,
    },

    #[command(about = "Load an earlier day's tasks into today")]
    Import {
        #[arg(help = "Day to import (defaults to the most recent one)")]
        period: Option<String>,

        #[arg(long, help = "Replace today's tasks instead of merging")]
        replace: bool,
    },

    #[command(about = "Export archived check-ins")]
    ExportHistory {
        #[arg(long, value_enum, help = "Export format")]
        format: ExportFormat,

        #[arg(long, short, help = "Output path")]
        out: Option<PathBuf>,
    },

    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(help = "Shell type (bash, zsh, fish)")]
        shell: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryAction {
    #[command(about = "List categories in export order")]
    List,

    #[command(about = "Add a category")]
    Add {
        #[arg(required = true, num_args = 1.., help = "Category name")]
        name: Vec<String>,
    },

    #[command(about = "Delete a category and its tasks")]
    Remove {
        #[arg(help = "Category id or label")]
        category: String,
    },

    #[command(about = "Move a category up or down")]
    Move {
        #[arg(help = "Category id or label")]
        category: String,

        #[arg(value_enum)]
        direction: Direction,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    period_key: &'a str,
    mode: Mode,
    category_id: &'a str,
    level: u8,
    text: &'a str,
}

fn resolve_category(composer: &Composer, key: &str) -> Result<CategoryId, CheckinError> {
    composer
        .category_store()
        .find(key)
        .map(|category| category.id.clone())
        .ok_or_else(|| CheckinError::UnknownCategory(key.to_string()))
}

fn to_index(number: usize) -> Result<usize, CheckinError> {
    number.checked_sub(1).ok_or(CheckinError::InvalidIndex(number))
}

fn report_change(changed: bool) {
    if !changed {
        println!("Nothing changed");
    }
}

pub fn open_composer(data_dir: Option<PathBuf>) -> Composer {
    let config = Config::load(data_dir);
    let storage = match FileStore::open(&config.data_dir) {
        Ok(store) => Storage::new(store),
        Err(e) => {
            warn!(error = %e, "data directory unavailable, changes will not be saved");
            Storage::in_memory()
        }
    };
    Composer::open(storage, config.settings, today())
}

pub fn show(composer: &Composer) {
    let stats = composer.stats();
    println!(
        "check-in {} ({})  tasks: {}  seções: {}",
        composer.period_key(),
        composer.mode(),
        stats.total_tasks,
        stats.active_categories
    );
    println!("{}", "-".repeat(40));

    for category in composer.categories() {
        let id = category.id.as_str();
        let tasks = composer.tasks().tasks(id);
        let priority = if composer.is_priority(id) { " *" } else { "" };
        println!("{} {}{} ({})", category.icon, category.label, priority, tasks.len());

        if composer.is_collapsed(id) {
            if !tasks.is_empty() {
                println!("    ...");
            }
            continue;
        }
        for (i, task) in tasks.iter().enumerate() {
            println!(
                "  {:>2}. {}{}",
                i + 1,
                "  ".repeat(task.level.depth()),
                task.text
            );
        }
    }
}

pub fn list_quick_tasks(composer: &Composer, category_id: &CategoryId) {
    let presets = composer.quick_tasks(category_id.as_str());
    if presets.is_empty() {
        println!("No quick tasks for '{}'", category_id);
        return;
    }
    for (i, preset) in presets.iter().enumerate() {
        let marker = if preset.used { "✓" } else { "+" };
        println!("{:>2}. {} {}", i + 1, marker, preset.text);
    }
}

pub fn print_history(composer: &Composer, mode: Mode, limit: usize, render: bool) {
    let entries = composer.history().recent(mode, limit);
    if entries.is_empty() {
        println!("No {} history", mode);
        return;
    }

    for entry in entries {
        println!(
            "{}  {}",
            entry.period_key,
            output::summarize(composer.categories(), &entry.tasks)
        );
        if render {
            println!("{}\n", composer.render_entry(entry));
        }
    }
}

pub fn import_history(
    composer: &mut Composer,
    period: Option<String>,
    policy: ImportPolicy,
) -> Result<(), CheckinError> {
    let period_key = match period {
        Some(key) => key,
        None => composer
            .import_sources()
            .first()
            .map(|entry| entry.period_key.clone())
            .ok_or_else(|| CheckinError::HistoryEntryNotFound {
                period_key: "previous day".to_string(),
                mode: Mode::Daily,
            })?,
    };

    let count = composer.import_day(&period_key, policy)?;
    println!("Imported {} task(s) from {}", count, period_key);
    Ok(())
}

fn history_rows(entries: &[HistoryEntry]) -> Vec<HistoryRow<'_>> {
    entries
        .iter()
        .flat_map(|entry| {
            entry.tasks.iter().flat_map(move |(category_id, tasks)| {
                tasks.iter().map(move |task| HistoryRow {
                    period_key: &entry.period_key,
                    mode: entry.mode,
                    category_id: category_id.as_str(),
                    level: task.level.into(),
                    text: &task.text,
                })
            })
        })
        .collect()
}

pub fn export_history(
    composer: &Composer,
    format: ExportFormat,
    out_path: Option<PathBuf>,
) -> Result<(), CheckinError> {
    let entries = composer.history().entries();

    match format {
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(entries)?;
            if let Some(path) = out_path {
                storage::write_text_file(&path, &json)?;
                println!("Exported to {}", path.display());
            } else {
                println!("{}", json);
            }
        }
        ExportFormat::Csv => {
            let rows = history_rows(entries);
            if let Some(path) = out_path {
                let mut writer = csv::Writer::from_path(&path)?;
                for row in &rows {
                    writer.serialize(row)?;
                }
                writer.flush().map_err(csv::Error::from)?;
                println!("Exported to {}", path.display());
            } else {
                let mut writer = csv::Writer::from_writer(io::stdout());
                for row in &rows {
                    writer.serialize(row)?;
                }
                writer.flush().map_err(csv::Error::from)?;
            }
        }
    }

    Ok(())
}

pub fn print_completions(shell: &str) -> Result<(), CheckinError> {
    use clap_complete::Shell;
    let shell = match shell {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        _ => return Err(CheckinError::UnsupportedShell(shell.to_string())),
    };
    clap_complete::generate(shell, &mut Cli::command(), "checkin", &mut io::stdout());
    Ok(())
}

fn execute(command: Command, data_dir: Option<PathBuf>) -> Result<(), CheckinError> {
    if let Command::Completions { shell } = &command {
        return print_completions(shell);
    }

    let mut composer = open_composer(data_dir);

    match command {
        Command::Show => show(&composer),
        Command::Preview => println!("{}", composer.output()),
        Command::Copy => {
            let text = composer.copy();
            print!("{}", text);
            io::stdout().flush().map_err(crate::error::StorageError::from)?;
        }
        Command::Stats => {
            let stats = composer.stats();
            println!("tasks: {}", stats.total_tasks);
            println!("seções: {}", stats.active_categories);
        }
        Command::Mode { mode } => match mode {
            Some(mode) => {
                composer.switch_mode(mode);
                println!("Mode: {} ({})", composer.mode(), composer.period_key());
            }
            None => println!("{} ({})", composer.mode(), composer.period_key()),
        },
        Command::Category { action } => match action {
            CategoryAction::List => {
                for category in composer.categories() {
                    println!("{} {:<16} {}", category.icon, category.id, category.label);
                }
            }
            CategoryAction::Add { name } => {
                let category = composer.add_category(&name.join(" "))?;
                println!("Added category '{}' ({})", category.label, category.id);
            }
            CategoryAction::Remove { category } => {
                let id = resolve_category(&composer, &category)?;
                if let Some(removed) = composer.remove_category(id.as_str()) {
                    println!("Removed category '{}'", removed.label);
                }
            }
            CategoryAction::Move {
                category,
                direction,
            } => {
                let id = resolve_category(&composer, &category)?;
                let index = composer
                    .category_store()
                    .position(id.as_str())
                    .ok_or_else(|| CheckinError::UnknownCategory(category.clone()))?;
                report_change(composer.move_category(index, direction));
            }
        },
        Command::Add {
            category,
            text,
            sub,
        } => {
            let id = resolve_category(&composer, &category)?;
            let level = if sub { TaskLevel::Sub } else { TaskLevel::Top };
            report_change(composer.add_task(id.as_str(), &text.join(" "), level));
        }
        Command::Quick { category, number } => {
            let id = resolve_category(&composer, &category)?;
            match number {
                None => list_quick_tasks(&composer, &id),
                Some(number) => {
                    let index = to_index(number)?;
                    let preset = composer
                        .quick_tasks(id.as_str())
                        .get(index)
                        .map(|preset| preset.text.to_string())
                        .ok_or(CheckinError::InvalidIndex(number))?;
                    report_change(composer.add_quick_task(id.as_str(), &preset));
                }
            }
        }
        Command::Remove { category, number } => {
            let id = resolve_category(&composer, &category)?;
            report_change(composer.remove_task(id.as_str(), to_index(number)?));
        }
        Command::Indent { category, number } => {
            let id = resolve_category(&composer, &category)?;
            report_change(composer.toggle_level(id.as_str(), to_index(number)?));
        }
        Command::Move {
            category,
            number,
            direction,
        } => {
            let id = resolve_category(&composer, &category)?;
            report_change(composer.move_task(id.as_str(), to_index(number)?, direction));
        }
        Command::Edit {
            category,
            number,
            text,
        } => {
            let id = resolve_category(&composer, &category)?;
            report_change(composer.edit_task(id.as_str(), to_index(number)?, &text.join(" ")));
        }
        Command::Priority { category } => {
            let id = resolve_category(&composer, &category)?;
            if composer.toggle_priority(id.as_str()) {
                let state = if composer.is_priority(id.as_str()) { "on" } else { "off" };
                println!("Priority for '{}': {}", id, state);
            } else {
                println!("Priorities only apply in weekly mode");
            }
        }
        Command::Collapse { category } => {
            let id = resolve_category(&composer, &category)?;
            report_change(composer.toggle_collapsed(id.as_str()));
        }
        Command::Clear => match composer.request_clear(Utc::now()) {
            ClearStep::Armed => println!(
                "Run `checkin clear` again within {}s to clear {}",
                composer.settings().clear_confirm_seconds,
                composer.period_key()
            ),
            ClearStep::Confirmed => println!("Cleared {}", composer.period_key()),
        },
        Command::History {
            mode,
            limit,
            render,
        } => {
            let mode = mode.unwrap_or(composer.mode());
            print_history(&composer, mode, limit, render);
        }
        Command::Import { period, replace } => {
            let policy = if replace {
                ImportPolicy::Replace
            } else {
                ImportPolicy::Merge
            };
            import_history(&mut composer, period, policy)?;
        }
        Command::ExportHistory { format, out } => export_history(&composer, format, out)?,
        Command::Completions { .. } => {}
    }

    Ok(())
}

pub fn run_cli() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(e) = execute(cli.command, cli.data_dir) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
