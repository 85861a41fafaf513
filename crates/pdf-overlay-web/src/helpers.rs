//! Helper types and traits for cleaner route handlers.
//!
//! Provides extension traits for converting `Option` and `Result` types
//! into HTTP-appropriate error responses, reducing boilerplate in routes.

use axum::http::StatusCode;
use pdf_overlay_core::{Error, util::parse_page_list};

/// Widest frame a client may request, in pixels
pub const MAX_FRAME_WIDTH: u32 = 8192;

/// Standard result type for route handlers.
pub type RouteResult<T> = Result<T, (StatusCode, String)>;

/// Extension trait for converting `Option<T>` to `RouteResult<T>`.
pub trait OptionExt<T> {
    /// Returns the contained value or a 404 Not Found error.
    fn or_not_found(self, msg: &str) -> RouteResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> RouteResult<T> {
        self.ok_or_else(|| (StatusCode::NOT_FOUND, msg.to_string()))
    }
}

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Converts the error to 500 Internal Server Error.
    fn or_internal_error(self) -> RouteResult<T>;

    /// Converts the error to 400 Bad Request.
    fn or_bad_request(self) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_internal_error(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }

    fn or_bad_request(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
    }
}

/// Status code matching a core error.
pub const fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::ProjectNotFound(_) | Error::BlobNotFound(_) => StatusCode::NOT_FOUND,
        Error::PdfOpen(_) | Error::PdfInvalidPage { .. } => StatusCode::BAD_REQUEST,
        Error::TranslationRateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        Error::TranslationTimeout => StatusCode::GATEWAY_TIMEOUT,
        Error::TranslationRequest(_)
        | Error::TranslationInvalidResponse(_)
        | Error::TranslationMaxRetriesExceeded
        | Error::PassAborted { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Extension trait mapping core results onto their HTTP status.
pub trait CoreResultExt<T> {
    fn or_status(self) -> RouteResult<T>;
}

impl<T> CoreResultExt<T> for pdf_overlay_core::Result<T> {
    fn or_status(self) -> RouteResult<T> {
        self.map_err(|e| (status_for(&e), e.to_string()))
    }
}

/// Validate a 1-based page number.
///
/// Returns 400 Bad Request if page is outside 1..=page_count.
pub fn validate_page(page: u32, page_count: u32) -> RouteResult<()> {
    if page == 0 || page > page_count {
        Err((
            StatusCode::BAD_REQUEST,
            format!("Page {page} out of range (1..={page_count})"),
        ))
    } else {
        Ok(())
    }
}

/// Validate a frame width override.
///
/// `None` or `0` keeps the configured display width; anything above
/// [`MAX_FRAME_WIDTH`] is rejected with 400 Bad Request.
pub fn frame_width(requested: Option<u32>) -> RouteResult<Option<u32>> {
    match requested {
        Some(width) if width > MAX_FRAME_WIDTH => Err((
            StatusCode::BAD_REQUEST,
            format!("Frame width {width} exceeds {MAX_FRAME_WIDTH} pixels"),
        )),
        Some(width) if width > 0 => Ok(Some(width)),
        _ => Ok(None),
    }
}

/// Pages selected by an export query.
///
/// No query means every translated page (empty list). A query that keeps
/// no page of the document is rejected instead of widening to all pages.
pub fn export_pages(query: Option<&str>, page_count: u32) -> RouteResult<Vec<u32>> {
    let Some(spec) = query else {
        return Ok(Vec::new());
    };
    let pages = parse_page_list(spec, page_count).or_bad_request()?;
    if pages.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("No valid pages in '{spec}' (document has {page_count} pages)"),
        ));
    }
    Ok(pages)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_width_bounds() {
        assert_eq!(frame_width(None).unwrap(), None);
        assert_eq!(frame_width(Some(0)).unwrap(), None);
        assert_eq!(frame_width(Some(800)).unwrap(), Some(800));
        assert_eq!(frame_width(Some(MAX_FRAME_WIDTH)).unwrap(), Some(MAX_FRAME_WIDTH));
        assert_eq!(
            frame_width(Some(60_000)).unwrap_err().0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_export_pages_outside_document_rejected() {
        assert_eq!(export_pages(None, 5).unwrap(), Vec::<u32>::new());
        assert_eq!(export_pages(Some("2,4"), 5).unwrap(), vec![2, 4]);

        let (status, msg) = export_pages(Some("7"), 5).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(msg.contains("No valid pages"));

        assert_eq!(
            export_pages(Some("x-2"), 5).unwrap_err().0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_validate_page() {
        assert!(validate_page(1, 3).is_ok());
        assert!(validate_page(3, 3).is_ok());
        assert_eq!(validate_page(0, 3).unwrap_err().0, StatusCode::BAD_REQUEST);
        assert!(validate_page(4, 3).is_err());
    }

    #[test]
    fn test_status_for_core_errors() {
        assert_eq!(
            status_for(&Error::ProjectNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&Error::TranslationRateLimited { retry_after: None }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_for(&Error::StoreWrite("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_or_status_keeps_message() {
        let result: pdf_overlay_core::Result<()> = Err(Error::PdfOpen("bad".into()));
        let (status, msg) = result.or_status().unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(msg.contains("bad"));
    }
}
