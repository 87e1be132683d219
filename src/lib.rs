//! Values 4* research outputs and impact case studies under the REF
//! mainstream QR funding formula, row by row over an uploaded CSV file.

pub mod columns;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod table;
pub mod valuation;

pub use error::{PipelineError, ValuationError};
pub use models::{ComputeSummary, Export, Table, ValuationInput};
pub use pipeline::{Session, Stage, ZeroPolicy};
pub use valuation::four_star_value;
