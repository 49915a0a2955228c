//! Focus session commands, sent to the daemon over IPC

use anyhow::{bail, Result};
use focusflow_core::ipc::IpcRequest;
use focusflow_storage::Database;
use std::path::Path;

use super::helpers::send_session_command;

/// Pick the session length from an explicit value, a 1-based preset index,
/// or the first preset.
pub fn resolve_duration(
    minutes: Option<u32>,
    preset: Option<usize>,
    presets: &[u32],
) -> Result<u32> {
    if let Some(minutes) = minutes {
        if minutes == 0 {
            bail!("Session length must be at least one minute");
        }
        return Ok(minutes);
    }

    let index = preset.unwrap_or(1);
    match index.checked_sub(1).and_then(|i| presets.get(i)) {
        Some(minutes) => Ok(*minutes),
        None => bail!(
            "No preset #{index}; {} presets are configured",
            presets.len()
        ),
    }
}

/// # Errors
///
/// Returns an error if the duration is invalid or the daemon rejects the request
pub async fn start_focus(data_dir: &Path, minutes: Option<u32>, preset: Option<usize>) -> Result<()> {
    let presets = if minutes.is_some() {
        Vec::new()
    } else {
        Database::new(None)?.get_settings()?.duration_presets
    };
    let duration_minutes = resolve_duration(minutes, preset, &presets)?;

    send_session_command(data_dir, IpcRequest::StartSession { duration_minutes }).await?;
    println!("Focus session started: {duration_minutes} minutes. Stay focused!");
    Ok(())
}

/// # Errors
///
/// Returns an error if the daemon is unreachable or fails to end the session
pub async fn stop_focus(data_dir: &Path) -> Result<()> {
    send_session_command(data_dir, IpcRequest::StopSession).await?;
    println!("Focus session ended.");
    Ok(())
}
