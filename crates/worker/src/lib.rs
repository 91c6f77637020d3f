//! Runs the viewport hosts of one graph context on a dedicated thread.
//!
//! The worker thread owns the hosts and exposes a [`ViewportService`] as the
//! root object of its endpoint. The calling context talks to it through a
//! [`ViewportClient`].

mod client;
mod service;

use std::rc::Rc;
use std::thread;

use bpview_core::{GraphContext, ViewError};
use bpview_rpc::{Endpoint, port_pair};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, info};

pub use client::ViewportClient;
pub use service::ViewportService;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to build worker runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("viewport hosts could not be created: {0}")]
    View(#[from] ViewError),
    #[error("worker thread exited before it was ready")]
    Exited,
    #[error("worker thread panicked")]
    Panicked,
}

/// Main-side handle to a running worker.
pub struct WorkerHandle {
    endpoint: Endpoint,
    thread: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn client(&self) -> ViewportClient {
        ViewportClient::new(&self.endpoint)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Close the port and wait for the worker thread to finish.
    ///
    /// Pending calls resolve to a teardown error; bridged subscriptions on
    /// both sides are dropped.
    pub fn shutdown(mut self) -> Result<(), WorkerError> {
        self.endpoint.close();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| WorkerError::Panicked),
            None => Ok(()),
        }
    }
}

/// Start a worker for `context` and connect to it.
///
/// Must be called from inside a [`tokio::task::LocalSet`]: the main-side
/// endpoint's dispatch loop is spawned onto it.
pub async fn spawn_worker(context: GraphContext) -> Result<WorkerHandle, WorkerError> {
    let (main_port, worker_port) = port_pair();
    let (ready_tx, ready_rx) = oneshot::channel::<Result<(), ViewError>>();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(WorkerError::Runtime)?;

    let thread = thread::Builder::new()
        .name("bpview-worker".into())
        .spawn(move || {
            let local = tokio::task::LocalSet::new();
            local.block_on(&runtime, async move {
                let endpoint = Endpoint::new(worker_port);
                match ViewportService::new(context) {
                    Ok(service) => {
                        endpoint.expose_root(Rc::new(service));
                        let _ = ready_tx.send(Ok(()));
                    }
                    Err(err) => {
                        error!(%err, "worker could not build its hosts");
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                }
                info!("worker ready");
                endpoint.run().await;
                info!("worker stopped");
            });
        })
        .map_err(WorkerError::Spawn)?;

    let endpoint = Endpoint::new(main_port);
    endpoint.spawn();
    let handle = WorkerHandle {
        endpoint,
        thread: Some(thread),
    };
    match ready_rx.await {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(err)) => {
            handle.shutdown()?;
            Err(err.into())
        }
        Err(_) => {
            handle.shutdown()?;
            Err(WorkerError::Exited)
        }
    }
}
