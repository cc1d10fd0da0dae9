//! Offload worker thread.
//!
//! The worker owns no sheet state. It receives [`WorkerRequest`]s over a
//! channel, computes them, and sends back one [`WorkerResponse`] per request.
//! The caller correlates responses by `request_id`.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;

use cellgrid_protocol::{ComputeResult, WorkerRequest, WorkerResponse, WorkerTask};
use thiserror::Error;

use crate::compute;

#[derive(Debug, Error)]
pub enum OffloadError {
    #[error("offload worker channel closed")]
    ChannelClosed,
    #[error("offload worker did not respond within {0:?}")]
    Timeout(Duration),
    #[error("offload computation failed: {0}")]
    Computation(String),
    #[error("failed to spawn offload worker: {0}")]
    Spawn(#[from] io::Error),
}

/// Computation run for each request on the worker thread.
pub type TaskHandler = Box<dyn Fn(&WorkerTask) -> Result<ComputeResult, String> + Send + 'static>;

pub struct OffloadWorker {
    tx: Option<Sender<WorkerRequest>>,
    rx: Receiver<WorkerResponse>,
    handle: Option<JoinHandle<()>>,
}

impl OffloadWorker {
    /// Spawn a worker that runs the paste/fill computations.
    pub fn spawn() -> Result<Self, OffloadError> {
        Self::spawn_with(Box::new(|task: &WorkerTask| {
            compute::compute_task(task).map_err(|e| e.to_string())
        }))
    }

    /// Spawn a worker with a custom handler.
    pub fn spawn_with(handler: TaskHandler) -> Result<Self, OffloadError> {
        let (req_tx, req_rx) = mpsc::channel::<WorkerRequest>();
        let (resp_tx, resp_rx) = mpsc::channel::<WorkerResponse>();

        let handle = std::thread::Builder::new()
            .name("cellgrid-offload".to_string())
            .spawn(move || worker_main(handler, req_rx, resp_tx))?;

        log::info!("offload worker started");
        Ok(Self { tx: Some(req_tx), rx: resp_rx, handle: Some(handle) })
    }

    /// Queue a task. Returns the request id its response will carry.
    pub fn submit(&self, task: WorkerTask) -> Result<String, OffloadError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.send(WorkerRequest { request_id: request_id.clone(), task })?;
        Ok(request_id)
    }

    /// Queue a request whose id the caller chose.
    pub fn send(&self, request: WorkerRequest) -> Result<(), OffloadError> {
        let tx = self.tx.as_ref().ok_or(OffloadError::ChannelClosed)?;
        tx.send(request).map_err(|_| OffloadError::ChannelClosed)
    }

    /// Next finished response, if any, without blocking.
    pub fn try_recv(&self) -> Result<Option<WorkerResponse>, OffloadError> {
        match self.rx.try_recv() {
            Ok(resp) => Ok(Some(resp)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(OffloadError::ChannelClosed),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<WorkerResponse, OffloadError> {
        match self.rx.recv_timeout(timeout) {
            Ok(resp) => Ok(resp),
            Err(RecvTimeoutError::Timeout) => Err(OffloadError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(OffloadError::ChannelClosed),
        }
    }
}

impl Drop for OffloadWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        log::info!("offload worker stopped");
    }
}

fn worker_main(handler: TaskHandler, requests: Receiver<WorkerRequest>, responses: Sender<WorkerResponse>) {
    for req in requests {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&req.task)));
        let response = match outcome {
            Ok(Ok(result)) => WorkerResponse::success(req.request_id, result),
            Ok(Err(e)) => WorkerResponse::failure(req.request_id, e),
            Err(_) => WorkerResponse::failure(req.request_id, "worker panicked"),
        };
        if responses.send(response).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgrid_core::CellRange;
    use cellgrid_engine::{CellRecord, CellValue};
    use cellgrid_protocol::{FillPayload, PastePayload};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const WAIT: Duration = Duration::from_secs(10);

    fn paste_task() -> WorkerTask {
        WorkerTask::ComputePaste(PastePayload {
            start_row: 0,
            start_col: 0,
            data: vec![vec![CellRecord::new(CellValue::Number(1.0))]],
            is_cut: false,
            cut_range: None,
            values_only: false,
        })
    }

    #[test]
    fn test_round_trip() {
        let worker = OffloadWorker::spawn().unwrap();
        let id = worker.submit(paste_task()).unwrap();
        let resp = worker.recv_timeout(WAIT).unwrap();
        assert_eq!(resp.request_id, id);
        let result = resp.into_result().unwrap();
        assert_eq!(result.updates.len(), 1);
    }

    #[test]
    fn test_failure_is_reported_not_panicked() {
        let worker = OffloadWorker::spawn().unwrap();
        let bad = WorkerTask::ComputeFill(FillPayload {
            source: vec![],
            source_rows: 1,
            source_cols: 1,
            source_row: 0,
            source_col: 0,
            target: CellRange::new(0, 0, 5, 0),
            shift_formulas: false,
        });
        worker.submit(bad).unwrap();
        let resp = worker.recv_timeout(WAIT).unwrap();
        assert!(!resp.ok);
        assert!(resp.error.unwrap().contains("expected 1x1"));
    }

    #[test]
    fn test_panicking_handler_yields_failure() {
        let worker = OffloadWorker::spawn_with(Box::new(|_: &WorkerTask| -> Result<ComputeResult, String> { panic!("boom") })).unwrap();
        worker.submit(paste_task()).unwrap();
        let resp = worker.recv_timeout(WAIT).unwrap();
        assert_eq!(resp.error.as_deref(), Some("worker panicked"));

        // The thread survives and keeps serving
        worker.submit(paste_task()).unwrap();
        assert!(!worker.recv_timeout(WAIT).unwrap().ok);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let worker = OffloadWorker::spawn_with(Box::new(move |_: &WorkerTask| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(ComputeResult::default())
        }))
        .unwrap();

        let a = worker.submit(paste_task()).unwrap();
        let b = worker.submit(paste_task()).unwrap();
        assert_ne!(a, b);
        let mut got = vec![worker.recv_timeout(WAIT).unwrap().request_id, worker.recv_timeout(WAIT).unwrap().request_id];
        got.sort();
        let mut want = vec![a, b];
        want.sort();
        assert_eq!(got, want);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_try_recv_empty() {
        let worker = OffloadWorker::spawn_with(Box::new(|_: &WorkerTask| Ok::<_, String>(ComputeResult::default()))).unwrap();
        assert!(worker.try_recv().unwrap().is_none());
    }
}
