use thiserror::Error;

/// Unified error type for pdf-overlay-core
///
/// Grouped by the component that raises it:
/// - PDF access (opening, page lookup, text extraction)
/// - Rasterization and overlay drawing resources
/// - Translation backends
/// - The persistent project store
/// - Translation passes and PDF export
/// - Configuration and I/O
///
/// The overlay renderer and selection controller never produce errors;
/// degenerate geometry simply draws degenerate boxes.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to open or parse a PDF file
    #[error("failed to open PDF: {0}")]
    PdfOpen(String),

    /// Invalid 1-based page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    PdfInvalidPage { page: u32, total: u32 },

    /// Failed to extract positioned text from a PDF page
    #[error("failed to extract text from page {page}: {reason}")]
    PdfTextExtraction { page: u32, reason: String },

    /// Failed to render a PDF page
    #[error("failed to render page {page}: {reason}")]
    PdfRender { page: u32, reason: String },

    /// Error from the lopdf library while composing output
    #[error("lopdf error: {0}")]
    Lopdf(String),

    // ==========================================================================
    // Raster Errors
    // ==========================================================================
    /// Stored page image could not be decoded
    #[error("failed to decode page image: {0}")]
    ImageDecode(String),

    /// Frame or page image could not be encoded
    #[error("failed to encode image: {0}")]
    ImageEncode(String),

    /// No usable font for drawing overlay text
    #[error("overlay font unavailable: {0}")]
    FontUnavailable(String),

    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// Translation API request failed
    #[error("translation API request failed: {0}")]
    TranslationRequest(String),

    /// Invalid response from translation API
    #[error("invalid translation API response: {0}")]
    TranslationInvalidResponse(String),

    /// Rate limited by translation API
    #[error("translation rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    TranslationRateLimited { retry_after: Option<u64> },

    /// Translation request timed out
    #[error("translation request timed out")]
    TranslationTimeout,

    /// Maximum retry attempts exceeded for translation
    #[error("translation failed after maximum retries")]
    TranslationMaxRetriesExceeded,

    // ==========================================================================
    // Store Errors
    // ==========================================================================
    /// Failed to open the project store
    #[error("failed to open store: {0}")]
    StoreOpen(String),

    /// Failed to read from the project store
    #[error("failed to read from store: {0}")]
    StoreRead(String),

    /// Failed to write to the project store
    #[error("failed to write to store: {0}")]
    StoreWrite(String),

    /// Project id is not present in the store
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// PDF bytes for a project are missing from the store
    #[error("source PDF missing for project {0}")]
    BlobNotFound(String),

    // ==========================================================================
    // Pass / Export Errors
    // ==========================================================================
    /// A translation pass stopped at `page`; `completed` pages stay persisted
    #[error("translation pass aborted at page {page} after {} completed page(s): {reason}", completed.len())]
    PassAborted {
        page: u32,
        completed: Vec<u32>,
        reason: String,
    },

    /// Failed to compose an exported PDF
    #[error("failed to export PDF: {0}")]
    Export(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
