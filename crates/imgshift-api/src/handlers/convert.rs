//! Conversion handler.

use axum::body::Body;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::Response;

use imgshift_convert::{ConversionError, Upload};
use imgshift_core::error::{AppError, ErrorKind};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /convert
///
/// Multipart fields: `image` (file), `target_format`, and optionally
/// `quality`. Responds with the converted bytes as an attachment.
pub async fn convert(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Request body is not multipart");
        ConversionError::MissingInput
    })?;

    let upload = read_upload(&mut multipart).await?;
    let result = state.service.convert(upload).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", result.filename),
        )
        .header(header::CONTENT_LENGTH, result.data.len())
        .body(Body::from(result.data))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}

/// Collect the multipart fields into an [`Upload`]. Unknown fields are
/// skipped; a repeated field keeps its last value.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, AppError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => {
                upload.filename = field.file_name().map(String::from);
                upload.content_type = field.content_type().map(String::from);
                upload.data = Some(field.bytes().await.map_err(multipart_error)?);
            }
            "target_format" => {
                upload.target_format = Some(field.text().await.map_err(multipart_error)?);
            }
            "quality" => {
                upload.quality = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => tracing::debug!(field = %name, "Ignoring multipart field"),
        }
    }

    Ok(upload)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("Uploaded file exceeds the size limit")
    } else {
        AppError::with_source(ErrorKind::MissingInput, "No image file provided", err)
    }
}
