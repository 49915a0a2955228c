//! Initialize focusflow: database, configuration and next steps

use anyhow::{Context, Result};
use focusflow_core::{config::CONFIG_FILE_NAME, CoreConfig};
use focusflow_storage::Database;
use std::{fs, path::Path};

/// Initialize focusflow with complete setup
///
/// # Errors
///
/// Returns an error if the data directory, database or config file cannot be created
pub fn init_command(data_dir: &Path) -> Result<()> {
    println!("Initializing FocusFlow...\n");

    // Step 1: Database setup
    println!("Step 1/2: Database Setup");
    println!("{}", "-".repeat(40));
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;
    let db = Database::new(None)?;
    drop(db);
    println!("Database ready at: {}", Database::default_db_path().display());

    // Step 2: Configuration
    println!("\nStep 2/2: Configuration");
    println!("{}", "-".repeat(40));
    write_default_config(data_dir)?;

    println!("\n========================================");
    println!("  Setup Complete!");
    println!("========================================");
    println!("\nStart the daemon with: focusflow start");
    println!("Then begin a session with: focusflow focus start");

    Ok(())
}

fn write_default_config(data_dir: &Path) -> Result<()> {
    let config_path = data_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        // Validate the existing file instead of overwriting it
        CoreConfig::load_from(&config_path)?;
        println!("Using existing config: {}", config_path.display());
        return Ok(());
    }

    let path = CoreConfig::default().save(data_dir)?;
    println!("Created: {}", path.display());
    Ok(())
}
