// ── Serialized request queue ──
//
// All requests to Indigo are funnelled through one worker task that
// drains an mpsc channel strictly in FIFO order, awaiting each response
// before dequeuing the next. Callers get their answer on a oneshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{IndigoClient, Method, Params};
use crate::error::Error;

const QUEUE_CAPACITY: usize = 256;

/// One queued request plus the channel its result goes back on.
struct QueuedRequest {
    path: String,
    method: Method,
    params: Params,
    response_tx: oneshot::Sender<Result<String, Error>>,
}

#[derive(Default)]
struct QueueStats {
    pending: AtomicUsize,
    issued: AtomicU64,
}

/// Handle to the serialized request channel.
///
/// Cheaply cloneable; every clone feeds the same worker. The worker exits
/// once every handle is dropped or [`shutdown()`](Self::shutdown) is called.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    tx: mpsc::Sender<QueuedRequest>,
    stats: Arc<QueueStats>,
    cancel: CancellationToken,
}

impl RequestQueue {
    /// Spawn the worker task on the current Tokio runtime.
    pub fn spawn(client: IndigoClient) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let stats = Arc::new(QueueStats::default());
        let cancel = CancellationToken::new();

        tokio::spawn(worker_task(client, rx, Arc::clone(&stats), cancel.clone()));

        Self {
            inner: Arc::new(QueueInner { tx, stats, cancel }),
        }
    }

    /// Enqueue a request and wait for its raw response body.
    pub async fn request(&self, path: &str, method: Method, params: Params) -> Result<String, Error> {
        let (response_tx, response_rx) = oneshot::channel();
        let queued = QueuedRequest {
            path: path.to_owned(),
            method,
            params,
            response_tx,
        };

        self.inner.stats.pending.fetch_add(1, Ordering::SeqCst);
        if self.inner.tx.send(queued).await.is_err() {
            self.inner.stats.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::ChannelClosed);
        }

        response_rx.await.map_err(|_| Error::ChannelClosed)?
    }

    /// Enqueue a request and parse the response body as JSON.
    ///
    /// A body that is not valid JSON yields [`Error::Deserialization`]
    /// carrying the raw body, distinct from transport failures.
    pub async fn request_json(
        &self,
        path: &str,
        method: Method,
        params: Params,
    ) -> Result<Value, Error> {
        let body = self.request(path, method, params).await.inspect_err(|e| {
            warn!(path, error = %e, "indigo request failed");
        })?;

        serde_json::from_str(&body).map_err(|e| {
            warn!(path, error = %e, body = %body, "failed to parse indigo response");
            Error::Deserialization {
                message: format!("{e} (for {path})"),
                body,
            }
        })
    }

    /// Requests enqueued but not yet picked up by the worker.
    pub fn pending(&self) -> usize {
        self.inner.stats.pending.load(Ordering::SeqCst)
    }

    /// Requests the worker has dequeued since the queue was spawned.
    pub fn issued(&self) -> u64 {
        self.inner.stats.issued.load(Ordering::SeqCst)
    }

    /// Stop the worker once the in-flight request (if any) completes.
    /// Requests still queued fail with `ChannelClosed`.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }
}

/// Drain the channel one request at a time.
async fn worker_task(
    client: IndigoClient,
    mut rx: mpsc::Receiver<QueuedRequest>,
    stats: Arc<QueueStats>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            queued = rx.recv() => {
                let Some(queued) = queued else { break };
                stats.pending.fetch_sub(1, Ordering::SeqCst);
                stats.issued.fetch_add(1, Ordering::SeqCst);

                let result = client.send(&queued.path, queued.method, &queued.params).await;
                // The caller may have given up; nothing to do if so.
                let _ = queued.response_tx.send(result);
            }
        }
    }

    // Fail whatever is still queued; dropping each sender wakes its caller.
    rx.close();
    let mut dropped = 0_usize;
    while let Ok(_queued) = rx.try_recv() {
        stats.pending.fetch_sub(1, Ordering::SeqCst);
        dropped += 1;
    }
    debug!(dropped, "indigo request queue stopped");
}
