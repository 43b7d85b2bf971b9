//! API handlers for the sift server
//!
//! - `POST /upload`: extract, refine the search term, filter
//! - `POST /generate_pdf`, `POST /generate_docx`: build a report download
//! - `POST /extract`: summarize an uploaded PDF

use std::path::Path;

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sift_pdf::PdfExtractor;
use sift_types::{FilteredResult, ReportFormat, SearchMode, SearchSpec};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ServerError;
use crate::state::AppState;
use crate::storage::{image_name, resolve_image, save_upload};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "sift-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Fields of an upload form
#[derive(Default)]
struct UploadForm {
    file_name: Option<String>,
    file: Option<Bytes>,
    search_term: String,
    search_type: String,
}

async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm, ServerError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                form.file = Some(field.bytes().await?);
            }
            "search_term" => form.search_term = field.text().await?,
            "search_type" => form.search_type = field.text().await?,
            other => debug!("Ignoring form field '{}'", other),
        }
    }
    Ok(form)
}

fn required_file(form: &mut UploadForm) -> Result<Bytes, ServerError> {
    form.file
        .take()
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ServerError::InvalidRequest("No file uploaded".to_string()))
}

/// Upload response
#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    /// Filtered text, newline-joined
    pub extracted_text: String,
    pub search: SearchSpec,
    /// Image names relative to the images directory, for the generate endpoints
    pub images: Vec<String>,
    pub page_count: u32,
    pub warnings: Vec<String>,
}

/// Handler: POST /upload
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let mut form = read_upload_form(&mut multipart).await?;
    let bytes = required_file(&mut form)?;
    let mode: SearchMode = form
        .search_type
        .parse()
        .map_err(|e: sift_types::UnknownVariant| ServerError::InvalidRequest(e.to_string()))?;
    let filename = form
        .file_name
        .clone()
        .unwrap_or_else(|| "document.pdf".to_string());

    let upload_id = Uuid::new_v4().to_string();
    let image_dir = state.dirs.images.join(&upload_id);
    info!(
        "Upload {}: '{}' ({} bytes), mode={}",
        upload_id,
        filename,
        bytes.len(),
        mode
    );

    let uploads = state.dirs.uploads.clone();
    let extractor = PdfExtractor::new(image_dir.clone());
    let extraction = tokio::task::spawn_blocking(move || {
        let upload = save_upload(&uploads, &bytes)?;
        Ok::<_, ServerError>(extractor.extract_file(upload.path())?)
    });

    let resources = state.resources.clone();
    let raw_term = form.search_term.clone();
    let refinement = tokio::task::spawn_blocking(move || resources.refine(&raw_term, mode));

    let (extraction, refinement) = tokio::join!(extraction, refinement);

    let document = extraction??;
    let searched = refinement?.and_then(|spec| {
        let filtered = sift_search::filter(&document.raw_text, &spec)?;
        Ok((spec, filtered))
    });
    let (spec, filtered) = match searched {
        Ok(searched) => searched,
        Err(e) => {
            discard_images(&image_dir).await;
            return Err(e.into());
        }
    };

    for warning in &document.warnings {
        warn!("Upload {}: {}", upload_id, warning);
    }
    info!(
        "Upload {}: {} lines kept, {} images",
        upload_id,
        filtered.len(),
        document.images.len()
    );

    Ok(Json(UploadResponse {
        success: true,
        filename,
        extracted_text: filtered.to_text(),
        search: spec,
        images: document
            .images
            .iter()
            .map(|asset| image_name(&state.dirs.images, asset))
            .collect(),
        page_count: document.page_count,
        warnings: document.warnings.iter().map(ToString::to_string).collect(),
    }))
}

/// Remove the images of an upload that produced no response
async fn discard_images(image_dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(image_dir).await {
        debug!("No image directory to clean up: {}", e);
    }
}

/// Report request, as echoed back from an upload response
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub filename: String,
}

/// Handler: POST /generate_pdf
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, ServerError> {
    generate_report(&state, request, ReportFormat::Pdf).await
}

/// Handler: POST /generate_docx
pub async fn handle_generate_docx(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, ServerError> {
    generate_report(&state, request, ReportFormat::Docx).await
}

/// Keep a download name safe for a quoted Content-Disposition value
fn attachment_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn generate_report(
    state: &AppState,
    request: GenerateRequest,
    format: ReportFormat,
) -> Result<Response, ServerError> {
    let images = request
        .images
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| resolve_image(&state.dirs.images, name))
        .collect::<Result<Vec<_>, _>>()?;

    let file_name = attachment_name(&format.output_file_name(&request.filename));
    let output_path = state.dirs.outputs.join(&file_name);
    let content = FilteredResult::from_text(&request.extracted_text);

    // Served from memory; the output file may be replaced by a concurrent request
    let bytes = tokio::task::spawn_blocking(move || {
        let report = sift_report::render(format, &content, &images)?;
        report.persist(format, &content, &output_path)?;
        Ok::<_, ServerError>(report.bytes)
    })
    .await??;
    info!("Serving {} ({} bytes)", file_name, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Summary response
#[derive(Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Handler: POST /extract
pub async fn handle_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SummaryResponse>, ServerError> {
    let mut form = read_upload_form(&mut multipart).await?;
    let bytes = required_file(&mut form)?;

    let summarizer = state.summarizer.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let text = sift_pdf::extract_text(&bytes)?;
        Ok::<_, ServerError>(summarizer.summarize(&text)?)
    })
    .await??;

    Ok(Json(SummaryResponse { summary }))
}
