//! Preference commands

use anyhow::Result;
use focusflow_storage::{Database, SettingsPatch, SiteType, UiTheme};

/// # Errors
///
/// Returns an error if the settings cannot be read
pub fn show_prefs() -> Result<()> {
    let settings = Database::new(None)?.get_settings()?;
    let permanent = settings
        .blocked_domains
        .iter()
        .filter(|s| s.site_type == SiteType::Permanent)
        .count();
    let presets: Vec<String> = settings
        .duration_presets
        .iter()
        .map(|m| format!("{m}m"))
        .collect();

    println!("\nPreferences");
    println!("{}", "=".repeat(40));
    println!("  Theme:            {}", settings.ui_theme);
    println!("  Duration presets: {}", presets.join(", "));
    println!(
        "  Blocked sites:    {} ({permanent} permanent)",
        settings.blocked_domains.len()
    );
    Ok(())
}

/// # Errors
///
/// Returns an error if the write fails
pub fn set_theme(theme: UiTheme) -> Result<()> {
    Database::new(None)?.set_settings(SettingsPatch {
        ui_theme: Some(theme),
        ..SettingsPatch::default()
    })?;
    println!("Theme set to {theme}");
    Ok(())
}

/// # Errors
///
/// Returns an error if a preset is zero or the write fails
pub fn set_presets(minutes: Vec<u32>) -> Result<()> {
    let settings = Database::new(None)?.set_settings(SettingsPatch {
        duration_presets: Some(minutes),
        ..SettingsPatch::default()
    })?;
    println!("Duration presets: {:?}", settings.duration_presets);
    Ok(())
}
