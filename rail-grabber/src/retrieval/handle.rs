//! Background task driving a [`JourneyRetrieval`].

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::domain::Trip;
use crate::ojp::JourneySource;
use crate::store::KeyValueStore;

use super::error::RetrievalError;
use super::response::JourneyResponse;
use super::state::{JourneyRetrieval, Mode};

/// Commands queued on the task's channel before senders wait.
const COMMAND_CAPACITY: usize = 16;

type Reply = oneshot::Sender<Result<(), RetrievalError>>;

enum Command {
    Get { trip: Trip, reply: Reply },
    Update { reply: Reply },
    More { reply: Reply },
    Cancel,
    Mode { reply: oneshot::Sender<Mode> },
}

/// Cloneable handle onto a spawned retrieval.
///
/// The task stops once every handle is dropped, cancelling any request in
/// flight.
#[derive(Debug, Clone)]
pub struct RetrievalHandle {
    commands: mpsc::Sender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Get { .. } => "Get",
            Command::Update { .. } => "Update",
            Command::More { .. } => "More",
            Command::Cancel => "Cancel",
            Command::Mode { .. } => "Mode",
        };
        f.write_str(name)
    }
}

impl RetrievalHandle {
    /// Get fresh journeys for `trip`.
    pub async fn get_journeys(&self, trip: Trip) -> Result<(), RetrievalError> {
        self.request(|reply| Command::Get { trip, reply }).await
    }

    /// Refresh the held journeys.
    pub async fn update_journeys(&self) -> Result<(), RetrievalError> {
        self.request(|reply| Command::Update { reply }).await
    }

    /// Fetch journeys after the last held one.
    pub async fn more_journeys(&self) -> Result<(), RetrievalError> {
        self.request(|reply| Command::More { reply }).await
    }

    /// Cancel the request in flight, if any.
    pub async fn cancel_request(&self) -> Result<(), RetrievalError> {
        self.commands
            .send(Command::Cancel)
            .await
            .map_err(|_| RetrievalError::Closed)
    }

    /// What the retrieval is currently doing.
    pub async fn mode(&self) -> Result<Mode, RetrievalError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Mode { reply })
            .await
            .map_err(|_| RetrievalError::Closed)?;
        rx.await.map_err(|_| RetrievalError::Closed)
    }

    async fn request(&self, command: impl FnOnce(Reply) -> Command) -> Result<(), RetrievalError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| RetrievalError::Closed)?;
        rx.await.map_err(|_| RetrievalError::Closed)?
    }
}

impl<R, C, S> JourneyRetrieval<R, C, S>
where
    R: JourneySource,
    C: JourneyResponse,
    S: KeyValueStore,
{
    /// Move the retrieval onto a background task.
    pub fn spawn(self) -> RetrievalHandle {
        let (commands, rx) = mpsc::channel(COMMAND_CAPACITY);
        tokio::spawn(self.run(rx));
        RetrievalHandle { commands }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(outcome) = self.recv_outcome(), if self.is_busy() => {
                    self.complete(outcome);
                }
            }
        }

        debug!("retrieval handles dropped, stopping");
        self.cancel_request();
    }

    fn handle(&mut self, command: Command) {
        debug!(?command, "retrieval command");
        match command {
            Command::Get { trip, reply } => {
                let _ = reply.send(self.get_journeys(trip));
            }
            Command::Update { reply } => {
                let _ = reply.send(self.update_journeys());
            }
            Command::More { reply } => {
                let _ = reply.send(self.more_journeys());
            }
            Command::Cancel => self.cancel_request(),
            Command::Mode { reply } => {
                let _ = reply.send(self.mode());
            }
        }
    }
}
