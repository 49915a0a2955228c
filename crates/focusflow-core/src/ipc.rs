use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
    sync::{mpsc::UnboundedSender, oneshot},
};

use crate::{
    controller::SessionStatus,
    events::{Command, CommandReply, Event},
};

/// IPC request from CLI to daemon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum IpcRequest {
    Status,
    StartSession { duration_minutes: u32 },
    StopSession,
    /// Settings were edited by another process
    SettingsChanged,
    Shutdown,
}

/// IPC response from daemon to CLI
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum IpcResponse {
    Status(SessionStatus),
    Ack { success: bool },
    Error(String),
    Shutdown,
}

#[derive(Debug)]
pub struct IpcClient {
    sock_path: PathBuf,
}

impl IpcClient {
    #[must_use]
    pub fn new(sock_path: &Path) -> Self {
        Self {
            sock_path: sock_path.to_path_buf(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the daemon cannot be reached or its reply cannot be decoded
    pub async fn send_command(&self, request: IpcRequest) -> Result<IpcResponse> {
        let mut stream = UnixStream::connect(&self.sock_path).await?;

        let encoded = bincode::serialize(&request)?;
        stream.write_all(&encoded).await?;
        stream.shutdown().await?;

        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await?;
        let response: IpcResponse = bincode::deserialize(&buffer)?;

        Ok(response)
    }
}

/// Forwards requests to the daemon event loop and waits for the reply
pub struct DaemonIpcHandler {
    events: UnboundedSender<Event>,
    shutdown_signal: Arc<AtomicBool>,
}

impl DaemonIpcHandler {
    #[must_use]
    pub fn new(events: UnboundedSender<Event>, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            events,
            shutdown_signal,
        }
    }

    pub async fn respond(&self, request: IpcRequest) -> IpcResponse {
        let command = match request {
            IpcRequest::Shutdown => {
                self.shutdown_signal.store(true, Ordering::SeqCst);
                return IpcResponse::Shutdown;
            }
            IpcRequest::Status => Command::Status,
            IpcRequest::StartSession { duration_minutes } => {
                Command::StartSession { duration_minutes }
            }
            IpcRequest::StopSession => Command::StopSession,
            IpcRequest::SettingsChanged => Command::SettingsChanged,
        };

        let (reply, reply_rx) = oneshot::channel();
        if self.events.send(Event::Command { command, reply }).is_err() {
            return IpcResponse::Error("daemon event loop is not running".to_string());
        }

        match reply_rx.await {
            Ok(CommandReply::Done) => IpcResponse::Ack { success: true },
            Ok(CommandReply::Status(status)) => IpcResponse::Status(status),
            Ok(CommandReply::Failed(message)) => IpcResponse::Error(message),
            Err(_) => IpcResponse::Error("daemon dropped the request".to_string()),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the response cannot be written back
    pub async fn handle(&self, stream: &mut UnixStream, request: IpcRequest) -> Result<()> {
        let response = self.respond(request).await;
        let encoded = bincode::serialize(&response)?;
        stream.write_all(&encoded).await?;
        Ok(())
    }
}

/// Accept connections on `sock_path` until the task is dropped
///
/// # Errors
///
/// Returns an error if the socket cannot be bound
pub async fn listen(handler: Arc<DaemonIpcHandler>, sock_path: &Path) -> io::Result<()> {
    if sock_path.exists() {
        fs::remove_file(sock_path)?;
    }
    let listener = UnixListener::bind(sock_path)?;

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    match stream.read_to_end(&mut buf).await {
                        Ok(n) if n > 0 => match bincode::deserialize::<IpcRequest>(&buf) {
                            Ok(request) => {
                                if let Err(e) = handler.handle(&mut stream, request).await {
                                    log::error!("IPC handle error: {e}");
                                }
                            }
                            Err(e) => {
                                log::error!("IPC deserialize error: {e}");
                            }
                        },
                        Ok(_) => {} // Connection closed
                        Err(e) => {
                            log::error!("IPC read error: {e}");
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("IPC accept error: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_shutdown_sets_signal_without_event_loop() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let signal = Arc::new(AtomicBool::new(false));
        let handler = DaemonIpcHandler::new(tx, signal.clone());

        assert_eq!(handler.respond(IpcRequest::Shutdown).await, IpcResponse::Shutdown);
        assert!(signal.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_stopped_event_loop_reports_error() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let handler = DaemonIpcHandler::new(tx, Arc::new(AtomicBool::new(false)));

        assert!(matches!(
            handler.respond(IpcRequest::StopSession).await,
            IpcResponse::Error(_)
        ));
    }

    #[tokio::test]
    async fn test_round_trip_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let sock_path = dir.path().join("focusflow.sock");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = Arc::new(DaemonIpcHandler::new(tx, Arc::new(AtomicBool::new(false))));

        let listen_path = sock_path.clone();
        tokio::spawn(async move { listen(handler, &listen_path).await });
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Event::Command { command, reply } = event {
                    let answer = match command {
                        Command::StartSession { duration_minutes: 0 } => {
                            CommandReply::Failed("bad duration".to_string())
                        }
                        _ => CommandReply::Done,
                    };
                    let _ = reply.send(answer);
                }
            }
        });

        while !sock_path.exists() {
            tokio::task::yield_now().await;
        }

        let client = IpcClient::new(&sock_path);
        assert_eq!(
            client
                .send_command(IpcRequest::StartSession {
                    duration_minutes: 25
                })
                .await
                .unwrap(),
            IpcResponse::Ack { success: true }
        );
        assert_eq!(
            client
                .send_command(IpcRequest::StartSession {
                    duration_minutes: 0
                })
                .await
                .unwrap(),
            IpcResponse::Error("bad duration".to_string())
        );
    }
}
