//! Cooperative asset fetching.
//!
//! Every fetch is a local future spawned on a [`LocalPool`]. When a read
//! finishes, its bytes are sent over a `flume` channel tagged with the
//! [`FetchTicket`] that requested them. The scene drains the channel once per
//! frame and routes each [`Completion`] to the owning model, if that model
//! still exists.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

use crate::assets::io::AssetReader;
use crate::errors::Result;
use crate::model::ModelHandle;

/// What a fetch is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRequest {
    Setting,
    Moc,
    Expression { index: usize },
    Physics,
    Pose,
    UserData,
    /// A motion clip. `preload` fetches belong to the load state machine,
    /// the rest are lazy fetches issued by `get_motion`.
    Motion {
        group: String,
        index: usize,
        preload: bool,
    },
    Texture { slot: usize },
    /// Voice-over bytes for lip-sync analysis.
    Voice { generation: u64 },
}

/// Identifies the requester of a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub model: ModelHandle,
    pub request: AssetRequest,
}

pub struct Completion {
    pub ticket: FetchTicket,
    pub path: String,
    pub result: Result<Vec<u8>>,
}

pub struct AssetLoader {
    reader: Rc<dyn AssetReader>,
    pool: LocalPool,
    spawner: LocalSpawner,
    sender: flume::Sender<Completion>,
    receiver: flume::Receiver<Completion>,
    in_flight: Rc<Cell<usize>>,
}

impl AssetLoader {
    pub fn new(reader: Rc<dyn AssetReader>) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let (sender, receiver) = flume::unbounded();
        Self {
            reader,
            pool,
            spawner,
            sender,
            receiver,
            in_flight: Rc::new(Cell::new(0)),
        }
    }

    #[must_use]
    pub fn reader(&self) -> &Rc<dyn AssetReader> {
        &self.reader
    }

    /// Starts reading `path`; the result arrives through [`AssetLoader::poll`].
    pub fn fetch(&self, ticket: FetchTicket, path: String) {
        let future = self.reader.read_bytes(&path);
        let sender = self.sender.clone();
        let in_flight = self.in_flight.clone();
        in_flight.set(in_flight.get() + 1);

        let task = async move {
            let result = future.await;
            in_flight.set(in_flight.get().saturating_sub(1));
            if sender.send(Completion { ticket, path, result }).is_err() {
                log::debug!("Asset loader dropped before a fetch completed");
            }
        };

        if let Err(err) = self.spawner.spawn_local(task) {
            log::error!("Failed to spawn asset fetch: {err}");
            self.in_flight.set(self.in_flight.get().saturating_sub(1));
        }
    }

    /// Runs a fire-and-forget task. Failures are logged and never propagated.
    pub fn spawn_detached<F>(&self, label: &str, future: F)
    where
        F: Future<Output = Result<()>> + 'static,
    {
        let label = label.to_string();
        let task = async move {
            if let Err(err) = future.await {
                log::warn!("{label} failed: {err}");
            }
        };
        if let Err(err) = self.spawner.spawn_local(task) {
            log::error!("Failed to spawn background task: {err}");
        }
    }

    /// Drives all ready tasks and returns the completions produced so far.
    pub fn poll(&mut self) -> Vec<Completion> {
        self.pool.run_until_stalled();
        self.receiver.try_iter().collect()
    }

    /// Blocks until every spawned task has finished.
    ///
    /// Only safe when every pending read is guaranteed to resolve (file or
    /// memory readers); a reader that never resolves blocks forever.
    pub fn run_to_completion(&mut self) -> Vec<Completion> {
        self.pool.run();
        self.receiver.try_iter().collect()
    }

    /// Number of fetches that have not produced a completion yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }
}
