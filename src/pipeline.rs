use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::columns::{self, ResolvedColumns};
use crate::error::{PipelineError, ValuationError};
use crate::models::{
    ComputeSummary, Export, Table, ValuationInput, EXPORT_FILE_NAME, EXPORT_MEDIA_TYPE,
    VALUE_COLUMN,
};
use crate::table;
use crate::valuation;

/// What to do with a row whose valuation denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum ZeroPolicy {
    /// Keep the row and leave its value empty.
    #[default]
    Blank,
    /// Drop the row from the output.
    Skip,
    /// Fail the whole computation.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    FileUploaded,
    Loaded,
    Computed,
    Exported,
}

/// Normalizes headers and applies the declared renames.
pub fn normalize_table(mut table: Table) -> Table {
    let mut headers = columns::normalize_headers(&table.headers);
    columns::apply_renames(&mut headers);
    table.headers = headers;
    table
}

/// Adds (or overwrites) the value column on a normalized table.
pub fn compute_values(
    mut table: Table,
    policy: ZeroPolicy,
) -> Result<(Table, ComputeSummary), PipelineError> {
    let resolved = columns::resolve_columns(&table.headers)?;

    let value_index = match table.column_index(VALUE_COLUMN) {
        Some(index) => index,
        None => {
            table.headers.push(VALUE_COLUMN.to_string());
            table.headers.len() - 1
        }
    };

    let mut summary = ComputeSummary {
        rows_read: table.rows.len(),
        rows_valued: 0,
        rows_blank: 0,
        rows_dropped: 0,
    };
    let mut kept = Vec::with_capacity(table.rows.len());

    for (i, mut row) in std::mem::take(&mut table.rows).into_iter().enumerate() {
        let row_number = i + 1;
        row.resize(table.headers.len(), String::new());
        let input = read_input(&table.headers, &row, &resolved, row_number)?;

        match valuation::four_star_value(&input) {
            Ok(value) => {
                row[value_index] = valuation::format_value(value);
                summary.rows_valued += 1;
                kept.push(row);
            }
            Err(ValuationError::InvalidInput { field, reason }) => {
                return Err(PipelineError::InvalidValue {
                    row: row_number,
                    column: field.to_string(),
                    value: String::new(),
                    reason,
                });
            }
            Err(ValuationError::DivisionByZero) => match policy {
                ZeroPolicy::Blank => {
                    warn!(row = row_number, "zero denominator, leaving value blank");
                    row[value_index] = String::new();
                    summary.rows_blank += 1;
                    kept.push(row);
                }
                ZeroPolicy::Skip => {
                    warn!(row = row_number, "zero denominator, dropping row");
                    summary.rows_dropped += 1;
                }
                ZeroPolicy::Abort => {
                    return Err(PipelineError::DivisionByZero { row: row_number });
                }
            },
        }
    }

    table.rows = kept;
    Ok((table, summary))
}

fn read_input(
    headers: &[String],
    row: &[String],
    resolved: &ResolvedColumns,
    row_number: usize,
) -> Result<ValuationInput, PipelineError> {
    let cell = |index: usize| row.get(index).map(String::as_str).unwrap_or("");
    let invalid = |index: usize, reason: String| PipelineError::InvalidValue {
        row: row_number,
        column: headers.get(index).cloned().unwrap_or_default(),
        value: cell(index).to_string(),
        reason,
    };

    Ok(ValuationInput {
        mainstream_allocation: valuation::parse_allocation(cell(resolved.allocation))
            .map_err(|reason| invalid(resolved.allocation, reason))?,
        outputs_required: valuation::parse_count(cell(resolved.outputs_required))
            .map_err(|reason| invalid(resolved.outputs_required, reason))?,
        three_star_activity: valuation::parse_percentage(cell(resolved.three_star))
            .map_err(|reason| invalid(resolved.three_star, reason))?,
        four_star_activity: valuation::parse_percentage(cell(resolved.four_star))
            .map_err(|reason| invalid(resolved.four_star, reason))?,
    })
}

pub fn content_digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[derive(Debug, Default)]
struct CacheEntry {
    loaded: Option<Table>,
    exports: HashMap<ZeroPolicy, Vec<u8>>,
}

/// One user's walk from upload to download.
///
/// Stages only move forward; `upload` starts over from any stage. Loaded
/// tables and exported bytes are memoized by the SHA-256 of the upload so
/// re-uploading the same file skips the parse and the serialization.
#[derive(Debug)]
pub struct Session {
    stage: Stage,
    policy: ZeroPolicy,
    upload: Option<(Vec<u8>, [u8; 32])>,
    table: Option<Table>,
    summary: Option<ComputeSummary>,
    cache: HashMap<[u8; 32], CacheEntry>,
}

impl Session {
    pub fn new(policy: ZeroPolicy) -> Self {
        Self {
            stage: Stage::Idle,
            policy,
            upload: None,
            table: None,
            summary: None,
            cache: HashMap::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn summary(&self) -> Option<&ComputeSummary> {
        self.summary.as_ref()
    }

    pub fn upload(&mut self, data: Vec<u8>) {
        let digest = content_digest(&data);
        info!(bytes = data.len(), "file uploaded");
        self.upload = Some((data, digest));
        self.table = None;
        self.summary = None;
        self.stage = Stage::FileUploaded;
    }

    pub fn load(&mut self) -> Result<&Table, PipelineError> {
        self.require("load", &[Stage::FileUploaded])?;
        let (data, digest) = self.upload.as_ref().ok_or(PipelineError::Stage {
            operation: "load",
            stage: self.stage,
        })?;

        let entry = self.cache.entry(*digest).or_default();
        let loaded = match &entry.loaded {
            Some(cached) => {
                debug!("load served from cache");
                cached.clone()
            }
            None => {
                let loaded = normalize_table(table::load_csv(data)?);
                entry.loaded = Some(loaded.clone());
                loaded
            }
        };

        info!(
            rows = loaded.rows.len(),
            columns = loaded.headers.len(),
            "table loaded"
        );
        self.stage = Stage::Loaded;
        Ok(self.table.insert(loaded))
    }

    pub fn compute(&mut self) -> Result<&ComputeSummary, PipelineError> {
        self.require("compute", &[Stage::Loaded])?;
        let loaded = self.table.take().ok_or(PipelineError::Stage {
            operation: "compute",
            stage: self.stage,
        })?;

        let (computed, summary) = match compute_values(loaded.clone(), self.policy) {
            Ok(result) => result,
            Err(err) => {
                self.table = Some(loaded);
                return Err(err);
            }
        };

        info!(
            valued = summary.rows_valued,
            blank = summary.rows_blank,
            dropped = summary.rows_dropped,
            "values computed"
        );
        self.table = Some(computed);
        self.stage = Stage::Computed;
        Ok(self.summary.insert(summary))
    }

    pub fn export(&mut self) -> Result<Export, PipelineError> {
        self.require("export", &[Stage::Computed, Stage::Exported])?;
        let stage = self.stage;
        let missing = || PipelineError::Stage {
            operation: "export",
            stage,
        };
        let digest = self.upload.as_ref().map(|(_, digest)| *digest).ok_or_else(missing)?;
        let computed = self.table.as_ref().ok_or_else(missing)?;

        let entry = self.cache.entry(digest).or_default();
        let data = match entry.exports.get(&self.policy) {
            Some(cached) => {
                debug!("export served from cache");
                cached.clone()
            }
            None => {
                let data = table::write_csv(computed)?;
                entry.exports.insert(self.policy, data.clone());
                data
            }
        };

        self.stage = Stage::Exported;
        Ok(Export {
            file_name: EXPORT_FILE_NAME,
            media_type: EXPORT_MEDIA_TYPE,
            data,
        })
    }

    fn require(&self, operation: &'static str, allowed: &[Stage]) -> Result<(), PipelineError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(PipelineError::Stage {
                operation,
                stage: self.stage,
            })
        }
    }
}
