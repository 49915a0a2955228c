//! Helper utility functions for CLI commands

use anyhow::{bail, Result};
use focusflow_core::{
    daemon::SOCKET_FILE_NAME,
    ipc::{IpcClient, IpcRequest, IpcResponse},
};
use std::path::Path;

/// Client for the running daemon, or `None` when no socket exists
pub fn daemon_client(data_dir: &Path) -> Option<IpcClient> {
    let sock_path = data_dir.join(SOCKET_FILE_NAME);
    sock_path.exists().then(|| IpcClient::new(&sock_path))
}

/// Send a session command and turn the daemon's reply into a result
pub async fn send_session_command(data_dir: &Path, request: IpcRequest) -> Result<()> {
    let Some(client) = daemon_client(data_dir) else {
        bail!("Daemon is not running. Start it with: focusflow start");
    };

    match client.send_command(request).await? {
        IpcResponse::Ack { success: true } => Ok(()),
        IpcResponse::Error(message) => bail!("Daemon error: {message}"),
        other => bail!("Unexpected response from daemon: {other:?}"),
    }
}

/// Ask a running daemon to re-apply rules now instead of on its next poll
pub async fn notify_settings_changed(data_dir: &Path) {
    let Some(client) = daemon_client(data_dir) else {
        log::debug!("Daemon not running, rules will sync on next start");
        return;
    };

    match client.send_command(IpcRequest::SettingsChanged).await {
        Ok(IpcResponse::Ack { success: true }) => log::debug!("Daemon re-applied rules"),
        Ok(other) => log::warn!("Daemon did not re-apply rules: {other:?}"),
        Err(e) => log::warn!("Could not reach daemon: {e}"),
    }
}

/// Safely truncate a string to a maximum number of characters (not bytes).
/// This avoids panics when slicing multi-byte UTF-8 characters.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_short() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_str_long() {
        assert_eq!(truncate_str("hello world", 5), "hello...");
    }

    #[test]
    fn test_no_client_without_socket() {
        let dir = tempfile::tempdir().unwrap();
        assert!(daemon_client(dir.path()).is_none());
    }

    #[tokio::test]
    async fn test_session_command_requires_daemon() {
        let dir = tempfile::tempdir().unwrap();
        let err = send_session_command(dir.path(), IpcRequest::StopSession)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not running"));
    }
}
