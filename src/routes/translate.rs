//! Translate route
//!
//! `POST /translate` takes a multipart form:
//! - `file`: the PDF (required, non-empty)
//! - `data`: optional JSON object of parameters
//! - any other text field: one parameter each, overriding `data`
//!
//! The response body is the translator's stdout, byte for byte.

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::translator::{StagedFile, TranslationParams};

pub const FILE_FIELD: &str = "file";
pub const DATA_FIELD: &str = "data";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Create the translate router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(translate))
}

/// A fully read translate form
#[derive(Debug)]
struct TranslateForm {
    file_name: Option<String>,
    file: Bytes,
    params: TranslationParams,
}

/// POST /translate
async fn translate(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let mut multipart = multipart.map_err(|rejection| {
        AppError::BadRequest(format!(
            "Expected a multipart/form-data upload: {}",
            rejection.body_text()
        ))
    })?;

    let form = read_form(&mut multipart, state.config().upload.allowed_params.clone()).await?;

    tracing::debug!(
        file_name = ?form.file_name,
        bytes = form.file.len(),
        params = form.params.len(),
        "Received translate request"
    );

    let params = form.params.serialize()?;

    // Removed on drop, whichever way this function exits
    let staged = StagedFile::write(&state.config().upload.staging_dir(), &form.file)
        .await
        .map_err(AppError::Staging)?;

    let translator = state.translator();
    let output = translator.translate(staged.path(), &params).await?;

    if let Err(e) = staged.remove() {
        tracing::warn!("Failed to remove staging file: {}", e);
    }

    tracing::info!(
        translator = translator.name(),
        input_bytes = form.file.len(),
        output_bytes = output.bytes.len(),
        elapsed_ms = output.elapsed.as_millis() as u64,
        "Translation complete"
    );
    if !output.stderr.is_empty() {
        tracing::debug!(stderr = %output.stderr, "Translator diagnostics");
    }

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, PDF_CONTENT_TYPE)],
        output.bytes,
    )
        .into_response())
}

/// Read every field before anything is launched
async fn read_form(
    multipart: &mut Multipart,
    allowed_params: Option<Vec<String>>,
) -> Result<TranslateForm> {
    let mut file: Option<(Option<String>, Bytes)> = None;
    let mut data: Option<String> = None;
    let mut params = TranslationParams::with_allow_list(allowed_params);

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(str::to_string);

        match name.as_str() {
            FILE_FIELD => {
                if file.is_some() {
                    return Err(AppError::BadRequest(
                        "Only one 'file' field is allowed".to_string(),
                    ));
                }
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, bytes));
            }
            _ if file_name.is_some() => {
                return Err(AppError::BadRequest(format!(
                    "Unexpected file upload in field '{}'",
                    name
                )));
            }
            "" => {
                return Err(AppError::BadRequest("Form field without a name".to_string()));
            }
            DATA_FIELD => {
                data = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {
                let value = field.text().await.map_err(multipart_error)?;
                params.insert(&name, value)?;
            }
        }
    }

    // Explicit fields win over `data`, whatever the field order was
    if let Some(raw) = data {
        params.merge_json(&raw, false)?;
    }

    let (file_name, file) = file.ok_or_else(|| {
        AppError::BadRequest("Missing 'file' field: upload the PDF as multipart field 'file'".to_string())
    })?;

    if file.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    Ok(TranslateForm {
        file_name,
        file,
        params,
    })
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("Failed to read upload: {}", e.body_text()))
    }
}
