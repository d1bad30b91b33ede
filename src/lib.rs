//! tss-converter - Step 1 template generation for TSS workbooks
//!
//! Takes one uploaded Excel workbook (`.xlsx` or `.xls`), finds the sheets
//! that hold any data, and produces for each of them a formatted "Step 1"
//! template workbook plus one ZIP archive bundling all templates:
//! - Upload validation (size, extension, signature, readability)
//! - `.xlsx` parsing with quick-xml, `.xls` through calamine
//! - Deterministic template output, verified by reading it back
//! - Everything in memory; callers decide where artifacts go
//!
//! # Usage
//!
//! ```no_run
//! use tss_converter::{ConverterConfig, NoProgress, Pipeline, Upload};
//!
//! let bytes = std::fs::read("Sample File.xlsx")?;
//! let config = ConverterConfig::default();
//! let upload = Upload::new("Sample File.xlsx", &bytes);
//! let outcome = Pipeline::new(&config).run(upload, &mut NoProgress);
//! if let Some(bundle) = outcome.bundle() {
//!     for template in &bundle.templates {
//!         println!("{}", template.file_name);
//!     }
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod archive;
pub mod cell_ref;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod keepalive;
pub mod parser;
pub mod pipeline;
pub mod template;
pub mod types;
pub mod validation;
pub mod xml_helpers;

pub use archive::{package, ArchiveBundle, DownloadSummary, PackagingError};
pub use classify::qualifying_sheets;
pub use config::{ConverterConfig, HexColor, KeepAliveSettings, SecurityMode, TemplateStyle};
pub use error::{ConvertError, Result, UserMessage};
pub use pipeline::{
    NoProgress, Outcome, OutputBundle, Pipeline, Progress, ProgressSink, RunReport, Stage,
};
pub use template::{inspect_template, ConstructionError, TemplateBuilder, TemplateFile};
pub use types::*;
pub use validation::{Gate, Upload, ValidationError};

/// Parse workbook bytes and return a JSON string representing the workbook.
///
/// # Errors
/// Returns an error if the bytes are not a readable workbook.
pub fn parse_to_json(data: &[u8], source_name: &str) -> Result<String> {
    let workbook = parser::parse(data, source_name)?;
    serde_json::to_string_pretty(&workbook)
        .map_err(|e| ConvertError::Parse(format!("JSON serialization error: {e}")))
}

/// Get the library version
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
