//! Session registry backed by a single worker task.
//!
//! Every request travels over one bounded queue to the worker, which is the
//! only code that ever reads or writes the session table. Callers hold a
//! [`SessionHandle`] and wait on a per-call reply channel.

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::table::SessionTable;

/// Tokens longer than this are rejected without consulting the worker.
pub const MAX_TOKEN_LEN: usize = 128;

/// Number of requests that may wait in the queue before callers block.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Session registry error.
///
/// The registry itself never fails a well-formed call; these only surface
/// when the worker is gone.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Session registry is closed")]
    Closed,
    #[error("Session registry worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Lookup,
    End,
    Shutdown,
}

#[derive(Debug)]
struct Request {
    command: Command,
    data: String,
    reply: oneshot::Sender<Reply>,
}

#[derive(Debug)]
struct Reply {
    data: String,
    ok: bool,
}

impl Reply {
    const fn found(data: String) -> Self {
        Self { data, ok: true }
    }

    const fn ack() -> Self {
        Self {
            data: String::new(),
            ok: true,
        }
    }

    const fn missing() -> Self {
        Self {
            data: String::new(),
            ok: false,
        }
    }
}

/// Caller side of the registry.
///
/// Cheap to clone; every clone feeds the same worker.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Request>,
}

impl SessionHandle {
    async fn rpc(&self, command: Command, data: String) -> Result<Reply, RegistryError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request {
                command,
                data,
                reply,
            })
            .await
            .map_err(|_| RegistryError::Closed)?;
        rx.await.map_err(|_| RegistryError::Closed)
    }

    /// Create a session for `owner` and return its token.
    ///
    /// # Errors
    /// Returns error if the registry has been shut down.
    pub async fn start(&self, owner: &str) -> Result<String, RegistryError> {
        let reply = self.rpc(Command::Start, owner.to_owned()).await?;
        Ok(reply.data)
    }

    /// Resolve a token to its owner.
    ///
    /// # Errors
    /// Returns error if the registry has been shut down.
    pub async fn lookup(&self, token: &str) -> Result<Option<String>, RegistryError> {
        if token.len() > MAX_TOKEN_LEN {
            return Ok(None);
        }
        let reply = self.rpc(Command::Lookup, token.to_owned()).await?;
        Ok(reply.ok.then_some(reply.data))
    }

    /// Remove a session. Unknown and oversized tokens still report `true`.
    ///
    /// # Errors
    /// Returns error if the registry has been shut down.
    pub async fn end(&self, token: &str) -> Result<bool, RegistryError> {
        if token.len() > MAX_TOKEN_LEN {
            return Ok(true);
        }
        let reply = self.rpc(Command::End, token.to_owned()).await?;
        Ok(reply.ok)
    }
}

/// Owner of the session worker.
///
/// Must be created inside a tokio runtime.
pub struct SessionRegistry {
    handle: SessionHandle,
    worker: JoinHandle<()>,
}

impl SessionRegistry {
    /// Spawn a registry with the default queue capacity.
    #[must_use]
    pub fn spawn() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Spawn a registry whose request queue holds `capacity` entries.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::spawn_with_table(capacity, SessionTable::new())
    }

    fn spawn_with_table(capacity: usize, table: SessionTable) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let worker = tokio::spawn(run(rx, table));
        Self {
            handle: SessionHandle { tx },
            worker,
        }
    }

    /// Get a handle for issuing requests.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stop the worker after every request queued ahead of this call is served.
    ///
    /// Outstanding handles keep working until then and return
    /// [`RegistryError::Closed`] afterwards.
    ///
    /// # Errors
    /// Returns error if the worker task panicked.
    pub async fn shutdown(self) -> Result<(), RegistryError> {
        // Closed here just means the worker already exited.
        let _ = self.handle.rpc(Command::Shutdown, String::new()).await;
        self.worker.await?;
        Ok(())
    }
}

async fn run(mut rx: mpsc::Receiver<Request>, mut table: SessionTable) {
    tracing::debug!("Session registry started");

    while let Some(Request {
        command,
        data,
        reply,
    }) = rx.recv().await
    {
        let response = match command {
            Command::Start => {
                let token = table.start(&data);
                tracing::debug!(owner = %data, "Session started");
                Reply::found(token)
            }
            Command::Lookup => table
                .lookup(&data)
                .map_or_else(Reply::missing, |owner| Reply::found(owner.to_owned())),
            Command::End => {
                if table.end(&data) {
                    tracing::debug!("Session ended");
                }
                Reply::ack()
            }
            Command::Shutdown => {
                let _ = reply.send(Reply::ack());
                break;
            }
        };

        // The caller may have been dropped while waiting; that is not our problem.
        let _ = reply.send(response);
    }

    tracing::debug!(active = table.len(), "Session registry stopped");
}
