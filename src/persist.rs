//! Background writer for the todo mapping.
//!
//! Every publish bumps a generation and replaces the pending snapshot in a
//! watch channel. A single task owns the storage backend and writes whatever
//! snapshot is newest when it wakes, so a burst of mutations collapses into
//! one write of the latest state. Save failures are logged and dropped.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use log::{debug, error, info, warn};
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::store::{SnapshotSink, TodoMap};
use crate::repo::{self, KeyValueStorage};

type SharedStorage = Arc<Mutex<Box<dyn KeyValueStorage + Send>>>;

#[derive(Default)]
struct Pending {
    generation: u64,
    todos: Option<Arc<TodoMap>>,
}

pub struct Persister {
    runtime: Runtime,
    storage: SharedStorage,
    pending: watch::Sender<Pending>,
    written: watch::Receiver<u64>,
    worker: JoinHandle<()>,
}

impl Persister {
    pub fn start(storage: Box<dyn KeyValueStorage + Send>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("tsumiki-persist")
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;
        let storage: SharedStorage = Arc::new(Mutex::new(storage));
        let (pending, pending_rx) = watch::channel(Pending::default());
        let (written_tx, written) = watch::channel(0);
        let worker = runtime.spawn(write_loop(pending_rx, Arc::clone(&storage), written_tx));
        Ok(Self {
            runtime,
            storage,
            pending,
            written,
            worker,
        })
    }

    /// Read the saved mapping off the UI thread. The receiver yields exactly
    /// one mapping, empty if nothing usable was stored.
    pub fn load(&self) -> mpsc::Receiver<TodoMap> {
        let (tx, rx) = mpsc::channel();
        let storage = Arc::clone(&self.storage);
        self.runtime.spawn_blocking(move || {
            let todos = match storage.lock() {
                Ok(guard) => repo::load_todos(&**guard),
                Err(_) => {
                    warn!("event=load module=persist status=error error=storage_lock_poisoned");
                    TodoMap::new()
                }
            };
            // The app may already be gone.
            let _ = tx.send(todos);
        });
        rx
    }

    /// Block until the newest published snapshot has been written, or the
    /// writer has stopped.
    pub fn flush(&self) {
        let target = self.pending.borrow().generation;
        let mut written = self.written.clone();
        self.runtime.block_on(async move {
            let _ = written.wait_for(|generation| *generation >= target).await;
        });
    }

    /// Wait for the last snapshot to be written, then stop the writer. A
    /// process killed before this returns may lose the final write.
    pub fn shutdown(self) {
        self.flush();
        let Self {
            runtime,
            pending,
            worker,
            ..
        } = self;
        drop(pending);
        if let Err(err) = runtime.block_on(worker) {
            error!("event=shutdown module=persist status=error error={err}");
        }
        info!("event=shutdown module=persist status=ok");
    }
}

impl SnapshotSink for Persister {
    fn publish(&self, todos: &TodoMap) {
        let snapshot = Arc::new(todos.clone());
        self.pending.send_modify(|pending| {
            pending.generation += 1;
            pending.todos = Some(snapshot);
        });
    }
}

async fn write_loop(
    mut pending: watch::Receiver<Pending>,
    storage: SharedStorage,
    written: watch::Sender<u64>,
) {
    let mut last_written = 0;
    while pending.changed().await.is_ok() {
        let (generation, todos) = latest(&mut pending);
        if let Some(todos) = todos {
            write(&storage, generation, todos).await;
        }
        last_written = generation;
        written.send_replace(generation);
    }

    // Sender dropped: store anything published after the last wake-up.
    let (generation, todos) = latest(&mut pending);
    if generation > last_written {
        if let Some(todos) = todos {
            write(&storage, generation, todos).await;
        }
        written.send_replace(generation);
    }
}

fn latest(pending: &mut watch::Receiver<Pending>) -> (u64, Option<Arc<TodoMap>>) {
    let current = pending.borrow_and_update();
    (current.generation, current.todos.clone())
}

async fn write(storage: &SharedStorage, generation: u64, todos: Arc<TodoMap>) {
    let storage = Arc::clone(storage);
    let count = todos.len();
    let outcome = tokio::task::spawn_blocking(move || -> Result<()> {
        let mut guard = storage
            .lock()
            .map_err(|_| anyhow!("storage lock poisoned"))?;
        repo::save_todos(&mut **guard, &todos)
    })
    .await;

    match outcome {
        Ok(Ok(())) => {
            debug!("event=save module=persist status=ok generation={generation} count={count}")
        }
        Ok(Err(err)) => {
            error!("event=save module=persist status=error generation={generation} error={err:#}")
        }
        Err(err) => {
            error!("event=save module=persist status=panicked generation={generation} error={err}")
        }
    }
}
