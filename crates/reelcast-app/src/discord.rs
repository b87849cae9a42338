//! Discord Rich Presence client.
//!
//! Runs a `DiscordIpcClient` on a dedicated OS thread (IPC is blocking) and
//! exposes it as a [`PresenceClient`]: each call is a command over an MPSC
//! channel with a oneshot reply.

use std::future::Future;
use std::sync::mpsc;

use discord_rich_presence::{activity, DiscordIpc, DiscordIpcClient};
use reelcast_core::error::PresenceError;
use reelcast_core::publisher::{PresenceClient, PresencePayload};
use tokio::sync::oneshot;

type Reply = oneshot::Sender<Result<(), PresenceError>>;

/// Commands sent to the Discord actor thread.
enum DiscordCommand {
    Connect { client_id: String, reply: Reply },
    SetActivity { payload: PresencePayload, reply: Reply },
    Clear { reply: Reply },
    Disconnect { reply: Reply },
    Shutdown,
}

/// Handle to the Discord actor thread. Dropping it stops the thread.
pub struct DiscordPresence {
    tx: mpsc::Sender<DiscordCommand>,
}

impl DiscordPresence {
    /// Spawn the Discord actor thread and return a handle.
    pub fn start() -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("discord-rpc".into())
            .spawn(move || actor_loop(rx))?;

        Ok(Self { tx })
    }

    fn request(
        &self,
        command: impl FnOnce(Reply) -> DiscordCommand,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let (reply, rx) = oneshot::channel();
        let sent = self.tx.send(command(reply));

        async move {
            sent.map_err(|_| PresenceError::Closed)?;
            rx.await.map_err(|_| PresenceError::Closed)?
        }
    }
}

impl Drop for DiscordPresence {
    fn drop(&mut self) {
        let _ = self.tx.send(DiscordCommand::Shutdown);
    }
}

impl PresenceClient for DiscordPresence {
    fn connect(&mut self, identity: &str) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let client_id = identity.to_string();
        self.request(|reply| DiscordCommand::Connect { client_id, reply })
    }

    fn set_status(
        &mut self,
        payload: &PresencePayload,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let payload = payload.clone();
        self.request(|reply| DiscordCommand::SetActivity { payload, reply })
    }

    fn clear_status(&mut self) -> impl Future<Output = Result<(), PresenceError>> + Send {
        self.request(|reply| DiscordCommand::Clear { reply })
    }

    fn disconnect(&mut self) -> impl Future<Output = Result<(), PresenceError>> + Send {
        self.request(|reply| DiscordCommand::Disconnect { reply })
    }
}

/// The actor loop: owns the IPC client and processes commands.
fn actor_loop(rx: mpsc::Receiver<DiscordCommand>) {
    let mut client: Option<DiscordIpcClient> = None;

    for cmd in rx {
        match cmd {
            DiscordCommand::Connect { client_id, reply } => {
                if let Some(mut old) = client.take() {
                    let _ = old.close();
                }
                let mut ipc = DiscordIpcClient::new(&client_id);
                let result = ipc
                    .connect()
                    .map_err(|e| PresenceError::Connect(e.to_string()));
                if result.is_ok() {
                    tracing::info!(client_id = %client_id, "Connected to Discord IPC");
                    client = Some(ipc);
                }
                let _ = reply.send(result);
            }
            DiscordCommand::SetActivity { payload, reply } => {
                let result = match client.as_mut() {
                    Some(ipc) => ipc
                        .set_activity(build_activity(&payload))
                        .map_err(|e| PresenceError::Send(e.to_string())),
                    None => Err(PresenceError::Send("not connected".into())),
                };
                if result.is_err() {
                    // Pipe is probably dead; the next Connect starts over.
                    client = None;
                }
                let _ = reply.send(result);
            }
            DiscordCommand::Clear { reply } => {
                let result = match client.as_mut() {
                    Some(ipc) => ipc
                        .clear_activity()
                        .map_err(|e| PresenceError::Send(e.to_string())),
                    None => Err(PresenceError::Send("not connected".into())),
                };
                if result.is_err() {
                    client = None;
                }
                let _ = reply.send(result);
            }
            DiscordCommand::Disconnect { reply } => {
                let result = match client.take() {
                    Some(mut ipc) => ipc
                        .close()
                        .map_err(|e| PresenceError::Send(e.to_string())),
                    None => Ok(()),
                };
                let _ = reply.send(result);
            }
            DiscordCommand::Shutdown => {
                if let Some(mut ipc) = client.take() {
                    let _ = ipc.clear_activity();
                    let _ = ipc.close();
                }
                break;
            }
        }
    }
}

fn build_activity(payload: &PresencePayload) -> activity::Activity<'_> {
    let mut assets = activity::Assets::new()
        .large_image(&payload.large_image)
        .large_text(&payload.large_text);
    if let Some(small) = &payload.small_image {
        assets = assets.small_image(small);
    }
    if let Some(text) = &payload.small_text {
        assets = assets.small_text(text);
    }

    let mut activity = activity::Activity::new()
        .activity_type(activity::ActivityType::Watching)
        .details(&payload.details)
        .state(&payload.state)
        .timestamps(activity::Timestamps::new().start(payload.started_at))
        .assets(assets);
    if let Some(button) = &payload.button {
        activity = activity.buttons(vec![activity::Button::new(&button.label, &button.url)]);
    }
    activity
}
