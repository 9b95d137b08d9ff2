mod categories;
mod cli;
mod composer;
mod config;
mod confirm;
mod constants;
mod domain;
mod error;
mod history;
mod import;
mod logging;
mod migrate;
mod output;
mod storage;
mod tasks;

fn main() {
    cli::run_cli();
}
