//! Error types for part analysis and quoting with rich diagnostics.
//!
//! This module provides error handling with:
//! - Machine-readable error codes for programmatic handling
//! - Recovery suggestions the calling workflow can show to users
//! - Terminal display via miette
//!
//! # Error Codes
//!
//! Each error has a unique code in the format `PART-XXXX`:
//! - `PART-1xxx`: Ingestion errors (file structure, size, reading)
//! - `PART-2xxx`: Mesh errors (empty or inconsistent geometry)
//! - `PART-3xxx`: Catalog and quote configuration errors
//! - `PART-4xxx`: Cache and runtime errors
//!
//! # Example
//!
//! ```
//! use mesh_quote::{ErrorCode, QuoteError};
//!
//! let err = QuoteError::unknown_material("unobtainium");
//! assert_eq!(err.code(), ErrorCode::UnknownMaterial);
//! println!("Recovery: {}", err.recovery_suggestion());
//! ```

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for analysis and quoting operations.
pub type QuoteResult<T> = Result<T, QuoteError>;

/// Machine-readable error codes.
///
/// Codes follow the pattern `PART-XXXX` where:
/// - 1xxx = Ingestion errors
/// - 2xxx = Mesh errors
/// - 3xxx = Catalog/configuration errors
/// - 4xxx = Cache/runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Ingestion errors (1xxx)
    /// PART-1001: Unparseable or corrupt file structure
    Format = 1001,
    /// PART-1002: File type is not a supported mesh format
    UnsupportedFormat = 1002,
    /// PART-1003: File exceeds the configured size cap
    SizeLimit = 1003,
    /// PART-1004: Failed to read a file from disk
    IoRead = 1004,

    // Mesh errors (2xxx)
    /// PART-2001: Mesh has no triangles
    EmptyMesh = 2001,
    /// PART-2002: Mesh has missing or inconsistent vertex data
    InvalidMesh = 2002,

    // Catalog errors (3xxx)
    /// PART-3001: Material identifier not in catalog
    UnknownMaterial = 3001,
    /// PART-3002: Finish identifier not in catalog
    UnknownFinish = 3002,
    /// PART-3003: Quote or analysis configuration is invalid
    InvalidConfig = 3003,
    /// PART-3004: Catalog file could not be parsed
    CatalogParse = 3004,

    // Cache/runtime errors (4xxx)
    /// PART-4001: Cache backing store unavailable or corrupt
    CacheIo = 4001,
    /// PART-4002: Background worker terminated abnormally
    WorkerFailed = 4002,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `PART-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Format => "PART-1001",
            ErrorCode::UnsupportedFormat => "PART-1002",
            ErrorCode::SizeLimit => "PART-1003",
            ErrorCode::IoRead => "PART-1004",
            ErrorCode::EmptyMesh => "PART-2001",
            ErrorCode::InvalidMesh => "PART-2002",
            ErrorCode::UnknownMaterial => "PART-3001",
            ErrorCode::UnknownFinish => "PART-3002",
            ErrorCode::InvalidConfig => "PART-3003",
            ErrorCode::CatalogParse => "PART-3004",
            ErrorCode::CacheIo => "PART-4001",
            ErrorCode::WorkerFailed => "PART-4002",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Re-export the file from the CAD tool, optionally in a given variant.
    ReexportFile { format: Option<String> },
    /// Use a different file format.
    UseDifferentFormat { suggested: Vec<String> },
    /// Reduce the file before resubmitting.
    ReduceFileSize { limit_bytes: u64 },
    /// Pick a value from the catalog.
    ChooseFromCatalog { kind: String, available: Vec<String> },
    /// Fix a configuration value.
    AdjustParameters { parameters: Vec<(String, String)> },
    /// Check a file or directory on disk.
    CheckPath { checks: Vec<String> },
    /// Submit the same request again.
    Resubmit,
    /// No automatic recovery available.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::ReexportFile { format } => {
                if let Some(fmt) = format {
                    write!(f, "Try re-exporting the part as {} from the CAD tool", fmt)
                } else {
                    write!(f, "Try re-exporting the part from the CAD tool")
                }
            }
            RecoverySuggestion::UseDifferentFormat { suggested } => {
                write!(f, "Try using a different format: {}", suggested.join(", "))
            }
            RecoverySuggestion::ReduceFileSize { limit_bytes } => {
                write!(
                    f,
                    "Reduce the triangle count or use binary STL to stay under {} bytes",
                    limit_bytes
                )
            }
            RecoverySuggestion::ChooseFromCatalog { kind, available } => {
                write!(f, "Choose a {} from: {}", kind, available.join(", "))
            }
            RecoverySuggestion::AdjustParameters { parameters } => {
                let params: Vec<String> = parameters
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, v))
                    .collect();
                write!(f, "Try adjusting: {}", params.join(", "))
            }
            RecoverySuggestion::CheckPath { checks } => {
                write!(f, "Check: {}", checks.join(", "))
            }
            RecoverySuggestion::Resubmit => write!(f, "Submit the request again"),
            RecoverySuggestion::None => write!(f, "No automatic recovery available"),
        }
    }
}

/// Errors that can occur while ingesting, analyzing or quoting a part.
#[derive(Debug, Error, Diagnostic)]
pub enum QuoteError {
    /// Unparseable or unsupported file structure.
    #[error("malformed mesh file: {details}")]
    #[diagnostic(
        code(part::ingest::format),
        help("The file may be truncated or corrupted. Try re-exporting it as binary STL.")
    )]
    Format { details: String },

    /// The file type is not a supported mesh format.
    #[error("unsupported mesh format: {extension:?}")]
    #[diagnostic(
        code(part::ingest::unsupported),
        help("Supported formats: STL (binary and ASCII)")
    )]
    UnsupportedFormat { extension: Option<String> },

    /// File exceeds the configured size cap.
    #[error("file is {size} bytes, which exceeds the {limit} byte limit")]
    #[diagnostic(
        code(part::ingest::size_limit),
        help("Decimate the mesh or export it as binary STL before uploading again.")
    )]
    SizeLimit { size: u64, limit: u64 },

    /// Failed to read a file from disk.
    #[error("failed to read {path}")]
    #[diagnostic(code(part::io::read), help("Check that the file exists and is readable."))]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The mesh has no triangles.
    #[error("mesh is empty: {details}")]
    #[diagnostic(
        code(part::mesh::empty),
        help("The file must contain at least one facet. Check the CAD export settings.")
    )]
    EmptyMesh { details: String },

    /// The mesh has missing or inconsistent vertex data.
    #[error("invalid mesh: {details}")]
    #[diagnostic(
        code(part::mesh::invalid),
        help("Vertex data is missing or face indices are out of range.")
    )]
    InvalidMesh { details: String },

    /// Material identifier not present in the catalog.
    #[error("unknown material: {id}")]
    #[diagnostic(
        code(part::catalog::material),
        help("Run `partquote materials` to list available materials.")
    )]
    UnknownMaterial { id: String, available: Vec<String> },

    /// Finish identifier not present in the catalog.
    #[error("unknown finish: {id}")]
    #[diagnostic(
        code(part::catalog::finish),
        help("Run `partquote materials` to list available finishes.")
    )]
    UnknownFinish { id: String, available: Vec<String> },

    /// Quote or analysis configuration is invalid.
    #[error("invalid configuration: {details}")]
    #[diagnostic(code(part::config::invalid))]
    InvalidConfig { details: String },

    /// Catalog file could not be parsed.
    #[error("failed to parse catalog: {details}")]
    #[diagnostic(
        code(part::catalog::parse),
        help("Catalog files are TOML or JSON with `materials`, `finishes`, `machine_rates` and `setup_fees` tables.")
    )]
    CatalogParse { details: String },

    /// Cache backing store unavailable or holding corrupt data.
    #[error("geometry cache {operation} failed")]
    #[diagnostic(
        code(part::cache::io),
        help("The cache is optional; analysis continues without it.")
    )]
    CacheIo {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Background worker terminated abnormally.
    #[error("analysis worker failed: {details}")]
    #[diagnostic(code(part::worker::failed))]
    WorkerFailed { details: String },
}

impl QuoteError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            QuoteError::Format { .. } => ErrorCode::Format,
            QuoteError::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            QuoteError::SizeLimit { .. } => ErrorCode::SizeLimit,
            QuoteError::IoRead { .. } => ErrorCode::IoRead,
            QuoteError::EmptyMesh { .. } => ErrorCode::EmptyMesh,
            QuoteError::InvalidMesh { .. } => ErrorCode::InvalidMesh,
            QuoteError::UnknownMaterial { .. } => ErrorCode::UnknownMaterial,
            QuoteError::UnknownFinish { .. } => ErrorCode::UnknownFinish,
            QuoteError::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            QuoteError::CatalogParse { .. } => ErrorCode::CatalogParse,
            QuoteError::CacheIo { .. } => ErrorCode::CacheIo,
            QuoteError::WorkerFailed { .. } => ErrorCode::WorkerFailed,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            QuoteError::Format { .. } => RecoverySuggestion::ReexportFile {
                format: Some("binary STL".into()),
            },
            QuoteError::UnsupportedFormat { .. } => RecoverySuggestion::UseDifferentFormat {
                suggested: vec!["STL (binary)".into(), "STL (ASCII)".into()],
            },
            QuoteError::SizeLimit { limit, .. } => RecoverySuggestion::ReduceFileSize {
                limit_bytes: *limit,
            },
            QuoteError::IoRead { .. } => RecoverySuggestion::CheckPath {
                checks: vec!["file exists".into(), "file permissions".into()],
            },
            QuoteError::EmptyMesh { .. } => RecoverySuggestion::ReexportFile { format: None },
            QuoteError::InvalidMesh { .. } => RecoverySuggestion::ReexportFile { format: None },
            QuoteError::UnknownMaterial { available, .. } => {
                RecoverySuggestion::ChooseFromCatalog {
                    kind: "material".into(),
                    available: available.clone(),
                }
            }
            QuoteError::UnknownFinish { available, .. } => RecoverySuggestion::ChooseFromCatalog {
                kind: "finish".into(),
                available: available.clone(),
            },
            QuoteError::InvalidConfig { details } => RecoverySuggestion::AdjustParameters {
                parameters: vec![("configuration".into(), details.clone())],
            },
            QuoteError::CatalogParse { .. } => RecoverySuggestion::CheckPath {
                checks: vec!["catalog syntax".into(), "required tables".into()],
            },
            QuoteError::CacheIo { .. } => RecoverySuggestion::CheckPath {
                checks: vec!["cache directory exists".into(), "write permissions".into()],
            },
            QuoteError::WorkerFailed { .. } => RecoverySuggestion::Resubmit,
        }
    }

    /// Whether resubmitting the identical input could succeed.
    ///
    /// Nothing in the pipeline retries on its own; only worker crashes are
    /// transient, every other failure is determined by the input.
    pub fn is_transient(&self) -> bool {
        matches!(self, QuoteError::WorkerFailed { .. })
    }

    /// Create a Format error.
    pub fn format(details: impl Into<String>) -> Self {
        QuoteError::Format {
            details: details.into(),
        }
    }

    /// Create an EmptyMesh error.
    pub fn empty_mesh(details: impl Into<String>) -> Self {
        QuoteError::EmptyMesh {
            details: details.into(),
        }
    }

    /// Create an InvalidMesh error.
    pub fn invalid_mesh(details: impl Into<String>) -> Self {
        QuoteError::InvalidMesh {
            details: details.into(),
        }
    }

    /// Create an UnknownMaterial error without a list of alternatives.
    pub fn unknown_material(id: impl Into<String>) -> Self {
        QuoteError::UnknownMaterial {
            id: id.into(),
            available: Vec::new(),
        }
    }

    /// Create an UnknownFinish error without a list of alternatives.
    pub fn unknown_finish(id: impl Into<String>) -> Self {
        QuoteError::UnknownFinish {
            id: id.into(),
            available: Vec::new(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(details: impl Into<String>) -> Self {
        QuoteError::InvalidConfig {
            details: details.into(),
        }
    }

    /// Create a CatalogParse error.
    pub fn catalog_parse(details: impl Into<String>) -> Self {
        QuoteError::CatalogParse {
            details: details.into(),
        }
    }

    /// Create a CacheIo error.
    pub fn cache_io(operation: &'static str, source: std::io::Error) -> Self {
        QuoteError::CacheIo { operation, source }
    }

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QuoteError::IoRead {
            path: path.into(),
            source,
        }
    }
}
