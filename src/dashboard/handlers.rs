use axum::{
    body::Bytes,
    extract::{
        rejection::JsonRejection, ConnectInfo, FromRequest, Multipart, Path, Query, Request, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    Form,
};
use chrono::Local;
use serde_json::{json, Value};
use std::net::SocketAddr;

use super::models::*;
use super::server::AppState;
use crate::error::{IntakeError, Result};
use crate::export::{self, ExportFormat};
use crate::intake;
use crate::log_record_operation;
use crate::records::{sort_newest_first, RecordKind};
use crate::search::{self, RecordFilter};
use crate::stats;
use crate::uploads::{self, PHOTO_FIELD};

fn body_error(state: &AppState, status: StatusCode, text: String) -> IntakeError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        IntakeError::PayloadTooLarge(state.body_limit)
    } else {
        IntakeError::InvalidInput(text)
    }
}

fn json_body<T>(
    state: &AppState,
    payload: std::result::Result<Json<T>, JsonRejection>,
) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| body_error(state, e.status(), e.body_text()))
}

fn client_ip(addr: Option<ConnectInfo<SocketAddr>>) -> Option<String> {
    addr.map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn parse_kind(raw: Option<&str>) -> Result<RecordKind> {
    raw.map(str::parse::<RecordKind>)
        .transpose()
        .map(|kind| kind.unwrap_or(RecordKind::Registration))
}

// ── Public submissions ──────────────────────────────────────────────

/// Photo part of a multipart registration, held until the form is fully read
struct PhotoUpload {
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

fn registration_body_error(state: &AppState, status: StatusCode, text: String) -> IntakeError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        IntakeError::PayloadTooLarge(uploads::registration_body_limit(state.body_limit))
    } else {
        IntakeError::InvalidInput(text)
    }
}

async fn read_multipart(
    state: &AppState,
    request: Request,
) -> Result<(Vec<(String, String)>, Option<PhotoUpload>)> {
    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| registration_body_error(state, e.status(), e.body_text()))?;

    let mut pairs = Vec::new();
    let mut photo = None;
    loop {
        let next = multipart
            .next_field()
            .await
            .map_err(|e| registration_body_error(state, e.status(), e.body_text()))?;
        let Some(field) = next else {
            break;
        };

        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| registration_body_error(state, e.status(), e.body_text()))?;
            // A file input left empty still arrives, with an empty file name
            if name == PHOTO_FIELD && !file_name.is_empty() && !data.is_empty() {
                photo = Some(PhotoUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| registration_body_error(state, e.status(), e.body_text()))?;
        pairs.push((name, value));
    }
    Ok((pairs, photo))
}

/// Accept the registration form, url-encoded or multipart with an `id_photo`
pub async fn submit_registration(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Result<Json<SubmissionResponse>> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with("multipart/form-data"));

    let (pairs, photo) = if is_multipart {
        read_multipart(&state, request).await?
    } else {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &state)
            .await
            .map_err(|e| registration_body_error(&state, e.status(), e.body_text()))?;
        (pairs, None)
    };

    let mut record = intake::new_registration(pairs, client_ip(addr), Local::now());
    if let Some(photo) = photo {
        let saved = state
            .photos
            .save(&photo.file_name, photo.content_type.as_deref(), &photo.data)
            .await?;
        saved.attach_to(&mut record);
    }
    let stored = state.datastore.registrations().append(record).await?;

    let id = stored.id().cloned().unwrap_or(Value::Null);
    log_record_operation!(
        "submit",
        RecordKind::Registration,
        id,
        stored.get_str("name").unwrap_or_default()
    );

    Ok(Json(SubmissionResponse {
        success: true,
        message: "Registration submitted".to_string(),
        id,
    }))
}

/// Accept a JSON contact request
pub async fn submit_contact(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmissionResponse>> {
    let body = json_body(&state, payload)?;
    let record = intake::new_contact(body, client_ip(addr), Local::now())?;
    let stored = state.datastore.contacts().append(record).await?;

    let id = stored.id().cloned().unwrap_or(Value::Null);
    log_record_operation!("submit", RecordKind::Contact, id);

    Ok(Json(SubmissionResponse {
        success: true,
        message: "Contact request submitted".to_string(),
        id,
    }))
}

// ── Record browsing ─────────────────────────────────────────────────

async fn list_records(state: &AppState, kind: RecordKind) -> Result<Response> {
    let mut records = state.datastore.store(kind).load().await?;
    sort_newest_first(&mut records);
    Ok(Json(records).into_response())
}

pub async fn list_registrations(State(state): State<AppState>) -> Result<Response> {
    list_records(&state, RecordKind::Registration).await
}

pub async fn list_contacts(State(state): State<AppState>) -> Result<Response> {
    list_records(&state, RecordKind::Contact).await
}

pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let record = state
        .datastore
        .registrations()
        .find(&id)
        .await?
        .ok_or(IntakeError::RecordNotFound {
            kind: RecordKind::Registration,
            id,
        })?;
    Ok(Json(record).into_response())
}

/// Merge fields into a registration (status changes, remarks)
pub async fn update_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let Value::Object(patch) = json_body(&state, payload)? else {
        return Err(IntakeError::InvalidInput(
            "Update body must be a JSON object".to_string(),
        ));
    };
    let updated = state.datastore.registrations().update(&id, patch).await?;
    Ok(Json(updated).into_response())
}

// ── Deletion ────────────────────────────────────────────────────────

async fn delete_record(state: &AppState, kind: RecordKind, id: &str) -> Result<Response> {
    let removed = state.datastore.store(kind).delete(id).await?;
    log_record_operation!("delete", kind, id);
    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Deleted {} {}", kind, id),
        data: removed,
    })
    .into_response())
}

pub async fn delete_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    delete_record(&state, RecordKind::Registration, &id).await
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    delete_record(&state, RecordKind::Contact, &id).await
}

async fn batch_delete(
    state: &AppState,
    kind: RecordKind,
    payload: std::result::Result<Json<BatchDeleteRequest>, JsonRejection>,
) -> Result<Response> {
    let req = json_body(state, payload)?;
    let keys = id_keys(&req.ids);
    let deleted = state.datastore.store(kind).delete_many(&keys).await?;
    Ok(Json(BatchDeleteResponse {
        deleted,
        message: format!("Deleted {} {} record(s)", deleted, kind),
    })
    .into_response())
}

pub async fn batch_delete_registrations(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BatchDeleteRequest>, JsonRejection>,
) -> Result<Response> {
    batch_delete(&state, RecordKind::Registration, payload).await
}

pub async fn batch_delete_contacts(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BatchDeleteRequest>, JsonRejection>,
) -> Result<Response> {
    batch_delete(&state, RecordKind::Contact, payload).await
}

// ── Statistics ──────────────────────────────────────────────────────

pub async fn get_stats(State(state): State<AppState>) -> Result<Response> {
    let registrations = state.datastore.registrations().load().await?;
    let contacts = state.datastore.contacts().load().await?;
    let summary = stats::summarize(&registrations, &contacts, Local::now().date_naive());
    Ok(Json(summary).into_response())
}

pub async fn get_trends(
    State(state): State<AppState>,
    Query(query): Query<TrendsQuery>,
) -> Result<Response> {
    let days = query
        .days
        .as_deref()
        .map(|d| {
            d.trim()
                .parse::<u32>()
                .map_err(|_| IntakeError::InvalidInput(format!("Invalid days value '{}'", d)))
        })
        .transpose()?;
    let days = stats::trend_days(days)?;

    let registrations = state.datastore.registrations().load().await?;
    let points = stats::trends(&registrations, days, Local::now().date_naive());
    Ok(Json(points).into_response())
}

pub async fn get_courses(State(state): State<AppState>) -> Result<Response> {
    let registrations = state.datastore.registrations().load().await?;
    Ok(Json(stats::courses(&registrations)).into_response())
}

// ── Search and export ───────────────────────────────────────────────

pub async fn search_records(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let kind = parse_kind(query.kind.as_deref())?;
    let filter = RecordFilter::from_raw(
        query.q.as_deref(),
        query.status.as_deref(),
        query.course.as_deref(),
        query.date_from.as_deref(),
        query.date_to.as_deref(),
    )?;

    let records = state.datastore.store(kind).load().await?;
    Ok(Json(search::search(records, &filter)).into_response())
}

pub async fn export_records(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response> {
    let kind = parse_kind(query.kind.as_deref())?;
    let format = query
        .format
        .as_deref()
        .map(str::parse::<ExportFormat>)
        .transpose()?
        .unwrap_or_default();
    let filter = RecordFilter::from_raw(
        None,
        query.status.as_deref(),
        query.course.as_deref(),
        query.date_from.as_deref(),
        query.date_to.as_deref(),
    )?;

    let records = filter.apply(state.datastore.store(kind).load().await?);
    let body = export::render(kind, format, &records)?;
    let file_name = export::export_file_name(kind, format, Local::now().date_naive());

    tracing::info!(kind = %kind, format = format.extension(), count = records.len(), "Export");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response())
}

// ── Import ──────────────────────────────────────────────────────────

async fn import(
    state: &AppState,
    kind: RecordKind,
    payload: std::result::Result<Json<ImportRequest>, JsonRejection>,
) -> Result<Response> {
    let req = json_body(state, payload)?;
    let Value::Array(items) = req.data else {
        return Err(IntakeError::InvalidInput(
            "Import data must be a JSON array".to_string(),
        ));
    };

    let records = intake::prepare_import(kind, items, Local::now())?;
    let imported = records.len();
    let total = state.datastore.store(kind).import(records, req.replace).await?;

    Ok(Json(ImportResponse {
        success: true,
        imported,
        total,
        message: format!("Imported {} {} record(s)", imported, kind),
    })
    .into_response())
}

pub async fn import_registrations(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ImportRequest>, JsonRejection>,
) -> Result<Response> {
    import(&state, RecordKind::Registration, payload).await
}

pub async fn import_contacts(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ImportRequest>, JsonRejection>,
) -> Result<Response> {
    import(&state, RecordKind::Contact, payload).await
}

// ── Backups ─────────────────────────────────────────────────────────

pub async fn create_backup(State(state): State<AppState>) -> Result<Response> {
    let info = state.backups.create().await?;
    Ok(Json(BackupResponse {
        success: true,
        message: format!("Backup {} created", info.name),
        data: info,
    })
    .into_response())
}

pub async fn list_backups(State(state): State<AppState>) -> Result<Response> {
    let data = state.backups.list().await?;
    Ok(Json(BackupListResponse {
        success: true,
        data,
    })
    .into_response())
}

/// Service info: data location and record counts
pub async fn get_info(State(state): State<AppState>) -> Result<Response> {
    let registrations = state.datastore.registrations().load().await?.len();
    let contacts = state.datastore.contacts().load().await?.len();
    Ok(Json(json!({
        "service": "intake-desk",
        "version": env!("CARGO_PKG_VERSION"),
        "dataDir": state.datastore.data_dir().display().to_string(),
        "registrations": registrations,
        "contacts": contacts,
    }))
    .into_response())
}
