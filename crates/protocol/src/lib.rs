//! Offload worker protocol.
//!
//! Heavy paste/fill computations run on a worker thread that never sees the
//! cell store. The caller sends a [`WorkerRequest`] and eventually receives a
//! [`WorkerResponse`] carrying the same `requestId`; responses may arrive in
//! any order relative to issuance.
//!
//! Field names are camelCase on the wire:
//!
//! ```text
//! {"requestId":"…","type":"computePaste","payload":{"startRow":0,"startCol":0,"data":[[{"value":1}]]}}
//! {"requestId":"…","ok":true,"result":{"updates":[{"row":0,"col":0,"value":1}],"clears":[]}}
//! ```

use cellgrid_core::CellRange;
use cellgrid_engine::{CellFormat, CellRecord, CellValue};
use serde::{Deserialize, Serialize};

// =============================================================================
// Requests
// =============================================================================

/// A unit of work for the offload worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub request_id: String,
    #[serde(flatten)]
    pub task: WorkerTask,
}

/// The operation to compute, tagged by `type` with its `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum WorkerTask {
    ComputePaste(PastePayload),
    ComputeFill(FillPayload),
}

impl WorkerTask {
    /// Cells the computation writes, used to decide whether to offload.
    pub fn target_cells(&self) -> usize {
        match self {
            WorkerTask::ComputePaste(p) => p.data.iter().map(|row| row.len()).sum(),
            WorkerTask::ComputeFill(f) => f.target.cell_count(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkerTask::ComputePaste(_) => "computePaste",
            WorkerTask::ComputeFill(_) => "computeFill",
        }
    }
}

/// Paste a block of records with its top-left corner at (`startRow`, `startCol`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastePayload {
    pub start_row: usize,
    pub start_col: usize,
    /// Row-major block; ragged rows are allowed (text pastes).
    pub data: Vec<Vec<CellRecord>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_cut: bool,
    /// Source range of a pending cut. Cells in it but outside the paste
    /// footprint are cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_range: Option<CellRange>,
    /// Write values only; destination formatting is left alone.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub values_only: bool,
}

/// Tile a source pattern across a target rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillPayload {
    /// Source records, row-major, `sourceRows * sourceCols` long.
    pub source: Vec<CellRecord>,
    pub source_rows: usize,
    pub source_cols: usize,
    /// Top-left cell of the source rectangle.
    pub source_row: usize,
    pub source_col: usize,
    /// Rectangle to fill. Cells inside the source rectangle are skipped.
    pub target: CellRange,
    /// Shift relative references in formula sources.
    #[serde(default)]
    pub shift_formulas: bool,
}

impl FillPayload {
    pub fn source_range(&self) -> CellRange {
        CellRange::new(
            self.source_row,
            self.source_col,
            self.source_row + self.source_rows.saturating_sub(1),
            self.source_col + self.source_cols.saturating_sub(1),
        )
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Worker reply. Exactly one of `result`/`error` is set, matching `ok`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResponse {
    pub request_id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ComputeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerResponse {
    pub fn success(request_id: impl Into<String>, result: ComputeResult) -> Self {
        Self { request_id: request_id.into(), ok: true, result: Some(result), error: None }
    }

    pub fn failure(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self { request_id: request_id.into(), ok: false, result: None, error: Some(error.into()) }
    }

    /// The result if the worker succeeded, otherwise its error message.
    pub fn into_result(self) -> Result<ComputeResult, String> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err("worker reported success without a result".to_string()),
            (false, _) => Err(self.error.unwrap_or_else(|| "unknown worker error".to_string())),
        }
    }
}

/// Writes and clears to apply as one command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResult {
    pub updates: Vec<CellUpdate>,
    #[serde(default)]
    pub clears: Vec<CellCoord>,
}

impl ComputeResult {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.clears.is_empty()
    }
}

/// One destination write. `formatting: None` leaves the cell's format alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<CellFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}
