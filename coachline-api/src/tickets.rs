use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use coachline_core::mailer::TicketEmail;
use coachline_core::render::RenderOptions;
use coachline_ticket::artifact::artifact_filename;
use coachline_ticket::ResolveOptions;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    /// Force a fresh render, bypassing the cache read.
    #[serde(default)]
    pub regen: bool,
    /// Either flag requests a multi-artifact archive instead of one PDF.
    #[serde(default)]
    pub zip: bool,
    #[serde(default)]
    pub split: bool,
    // Rendering hints, passed through to the render engine untouched.
    #[serde(default)]
    pub thermal: bool,
    pub paper: Option<String>,
    pub width: Option<u32>,
    /// attachment vs inline disposition.
    #[serde(default)]
    pub download: bool,
}

impl TicketQuery {
    fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            force_regen: self.regen,
            wants_zip: self.zip || self.split,
            render: RenderOptions {
                thermal: self.thermal,
                paper: self.paper.clone(),
                width: self.width,
            },
        }
    }
}

/// GET /v1/tickets/{pnr}
/// Resolve and serve the printable artifact for a booking reference.
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(pnr): Path<String>,
    Query(query): Query<TicketQuery>,
) -> Result<Response, AppError> {
    let resolved = state.tickets.resolve(&pnr, &query.resolve_options()).await?;

    let content_type = if resolved.kind.is_pdf() {
        "application/pdf"
    } else {
        "application/zip"
    };
    let disposition = if query.download { "attachment" } else { "inline" };
    let filename = artifact_filename(resolved.kind, &pnr);

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type),
        ),
        (
            header::CONTENT_LENGTH,
            HeaderValue::from_str(&resolved.bytes.len().to_string())
                .map_err(AppError::internal)?,
        ),
        (
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&format!("{}; filename=\"{}\"", disposition, filename))
                .map_err(AppError::internal)?,
        ),
        (
            header::ETAG,
            HeaderValue::from_str(&format!("\"{}\"", resolved.content_hash))
                .map_err(AppError::internal)?,
        ),
    ];

    Ok((headers, resolved.bytes).into_response())
}

#[derive(Debug, Deserialize)]
pub struct EmailTicketRequest {
    pub to: String,
}

/// POST /v1/tickets/{pnr}/email
/// Resolve the artifact and hand it to the mail collaborator.
pub async fn email_ticket(
    State(state): State<AppState>,
    Path(pnr): Path<String>,
    Json(request): Json<EmailTicketRequest>,
) -> Result<StatusCode, AppError> {
    if request.to.trim().is_empty() {
        return Err(AppError::ValidationError("recipient address is required".to_string()));
    }

    let resolved = state
        .tickets
        .resolve(&pnr, &ResolveOptions::default())
        .await?;

    let content_type = if resolved.kind.is_pdf() {
        "application/pdf"
    } else {
        "application/zip"
    };
    let email = TicketEmail {
        to: request.to,
        subject: format!("Your coach ticket {}", pnr),
        body: format!("Your ticket for booking {} is attached.", pnr),
        attachment_name: artifact_filename(resolved.kind, &pnr),
        attachment: resolved.bytes,
        content_type: content_type.to_string(),
    };
    state.mailer.send(&email).await?;

    Ok(StatusCode::ACCEPTED)
}
