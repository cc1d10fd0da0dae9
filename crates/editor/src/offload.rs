//! Dispatching paste/fill computations, on the worker or inline.
//!
//! Large operations are sent to the offload worker and applied when their
//! response arrives. Each pending request remembers the sheet revision at
//! issuance; a response that arrives after the sheet changed is recomputed
//! against the current contents instead of being applied as-is. A failed
//! request is recomputed inline. Either way the result lands as one command.

use std::time::Duration;

use cellgrid_core::CellRange;
use cellgrid_protocol::{ComputeResult, WorkerResponse, WorkerTask};

use crate::compute::{self, fill_payload};
use crate::editor::{GridEditor, OpStatus};
use crate::history::Command;
use crate::worker::OffloadError;

/// A request in flight on the offload worker.
#[derive(Debug, Clone)]
pub struct PendingOp {
    pub task: WorkerTask,
    /// Sheet revision when the request was sent.
    pub revision: u64,
}

impl PendingOp {
    /// The same operation with inputs re-read from the sheet. Fill sources
    /// may have changed; paste data is a clipboard snapshot and does not.
    fn refreshed(&self, sheet: &cellgrid_engine::Sheet) -> WorkerTask {
        match &self.task {
            WorkerTask::ComputeFill(f) => {
                let mut payload = fill_payload(sheet, f.source_range(), f.target);
                payload.shift_formulas = f.shift_formulas;
                WorkerTask::ComputeFill(payload)
            }
            paste @ WorkerTask::ComputePaste(_) => paste.clone(),
        }
    }
}

impl GridEditor {
    /// Run a paste/fill computation: offloaded when enabled and larger than
    /// the threshold, inline otherwise.
    pub(crate) fn dispatch(&mut self, task: WorkerTask) -> OpStatus {
        if self.settings.offload_enabled && task.target_cells() > self.settings.offload_threshold {
            if let Some(worker) = &self.worker {
                let revision = self.sheet.revision();
                match worker.submit(task.clone()) {
                    Ok(request_id) => {
                        log::debug!("{} offloaded as {} ({} cells)", task.kind(), request_id, task.target_cells());
                        self.pending.insert(request_id.clone(), PendingOp { task, revision });
                        self.status_message = Some("Computing...".to_string());
                        return OpStatus::Pending(request_id);
                    }
                    Err(e) => {
                        log::warn!("{}; computing inline", e);
                        self.worker = None;
                    }
                }
            }
        }
        self.compute_inline(&task)
    }

    fn compute_inline(&mut self, task: &WorkerTask) -> OpStatus {
        match compute::compute_task(task) {
            Ok(result) => self.apply_result(task, &result),
            Err(e) => {
                log::warn!("{} failed: {}", task.kind(), e);
                self.status_message = Some(e.to_string());
                OpStatus::NoChange
            }
        }
    }

    /// Apply a computed result as a single Paste or Fill command.
    fn apply_result(&mut self, task: &WorkerTask, result: &ComputeResult) -> OpStatus {
        let (changes, is_paste) = match task {
            WorkerTask::ComputePaste(p) => (compute::result_changes(&self.sheet, result, p.values_only), true),
            WorkerTask::ComputeFill(_) => (compute::result_changes(&self.sheet, result, false), false),
        };
        let command = if is_paste {
            Command::from_changes(changes, |changes| Command::Paste { changes })
        } else {
            Command::from_changes(changes, |changes| Command::Fill { changes })
        };
        match command.and_then(|cmd| self.commit(cmd)) {
            Some(description) => OpStatus::Applied(description),
            None => OpStatus::NoChange,
        }
    }

    /// Settle one worker response. Responses for unknown request ids
    /// (already settled, or never issued) are ignored.
    pub fn handle_response(&mut self, response: WorkerResponse) -> Option<OpStatus> {
        let Some(op) = self.pending.remove(&response.request_id) else {
            log::debug!("ignoring response for unknown request {}", response.request_id);
            return None;
        };
        let request_id = response.request_id.clone();

        let result = match response.into_result().map_err(OffloadError::Computation) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("{} ({}); computing inline", e, request_id);
                let task = op.refreshed(&self.sheet);
                return Some(self.compute_inline(&task));
            }
        };

        if op.revision != self.sheet.revision() {
            log::debug!(
                "response {} is stale (revision {} -> {}); recomputing",
                request_id,
                op.revision,
                self.sheet.revision()
            );
            let task = op.refreshed(&self.sheet);
            return Some(self.compute_inline(&task));
        }

        Some(self.apply_result(&op.task, &result))
    }

    /// Apply every response that has arrived, without blocking.
    pub fn poll_offload(&mut self) -> Vec<OpStatus> {
        let mut statuses = Vec::new();
        loop {
            let next = match &self.worker {
                Some(worker) => worker.try_recv(),
                None => break,
            };
            match next {
                Ok(Some(response)) => statuses.extend(self.handle_response(response)),
                Ok(None) => break,
                Err(e) => {
                    log::warn!("{}; computing pending operations inline", e);
                    self.worker = None;
                    break;
                }
            }
        }
        if self.worker.is_none() {
            statuses.extend(self.flush_pending());
        }
        statuses
    }

    /// Block until every pending request is settled. A request the worker
    /// does not answer within the configured timeout is computed inline.
    pub fn finish_offload(&mut self) -> Vec<OpStatus> {
        let timeout: Duration = self.settings.worker_timeout();
        let mut statuses = Vec::new();
        while !self.pending.is_empty() {
            let next = match &self.worker {
                Some(worker) => worker.recv_timeout(timeout),
                None => break,
            };
            match next {
                Ok(response) => statuses.extend(self.handle_response(response)),
                Err(e) => {
                    log::warn!("{}; computing pending operations inline", e);
                    break;
                }
            }
        }
        statuses.extend(self.flush_pending());
        statuses
    }

    // Compute everything still pending on this thread, oldest revision first.
    fn flush_pending(&mut self) -> Vec<OpStatus> {
        let mut ops: Vec<PendingOp> = self.pending.drain().map(|(_, op)| op).collect();
        ops.sort_by_key(|op| op.revision);
        ops.into_iter()
            .map(|op| {
                let task = op.refreshed(&self.sheet);
                self.compute_inline(&task)
            })
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Target rectangles of in-flight requests, for a progress overlay.
    pub fn pending_ranges(&self) -> Vec<CellRange> {
        self.pending
            .values()
            .map(|op| match &op.task {
                WorkerTask::ComputeFill(f) => f.target,
                WorkerTask::ComputePaste(p) => {
                    let rows = p.data.len().max(1);
                    let cols = p.data.iter().map(Vec::len).max().unwrap_or(0).max(1);
                    CellRange::new(p.start_row, p.start_col, p.start_row + rows - 1, p.start_col + cols - 1)
                }
            })
            .collect()
    }
}
