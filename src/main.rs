// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use std::env;

use expense_tracker::ExpenseStore;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut store = ExpenseStore::new();

    // Optional CSV path argument preloads the store
    if let Some(path) = args.get(1) {
        let count = store.load_from_path(std::path::Path::new(path))?;
        println!("Loaded {} records from {}", count, path);
    }

    run_ui_mode(store)
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: ExpenseStore) -> Result<()> {
    let mut app = ui::App::new(store);
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: ExpenseStore) -> Result<()> {
    eprintln!("TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}
