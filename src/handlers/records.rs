use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    models::{new_record_id, McqPayload, McqRecord},
    names,
    rejections::AppError,
    store::SheetBackend,
    validation::validate_payload,
    AppState,
};

pub fn routes<B: SheetBackend + 'static>() -> Router<AppState<B>> {
    Router::new()
        .route(
            names::RECORDS_URL,
            get(list_records::<B>).post(create_record::<B>),
        )
        .route(
            names::RECORD_URL,
            get(get_record::<B>)
                .put(update_record::<B>)
                .delete(delete_record::<B>),
        )
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    q: Option<String>,
}

fn validated(body: &Bytes) -> Result<McqPayload, AppError> {
    let value: Value = super::json_body(body)?;
    validate_payload(&value).map_err(AppError::Validation)
}

async fn list_records<B: SheetBackend>(
    State(state): State<AppState<B>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<McqRecord>>, AppError> {
    let mut records = state.store.list().await?;
    if let Some(needle) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        records.retain(|r| r.matches(needle));
    }
    Ok(Json(records))
}

async fn get_record<B: SheetBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<McqRecord>, AppError> {
    Ok(Json(state.store.get(&id).await?))
}

async fn create_record<B: SheetBackend>(
    State(state): State<AppState<B>>,
    body: Bytes,
) -> Result<(StatusCode, Json<McqRecord>), AppError> {
    let record = validated(&body)?.into_record(new_record_id());
    state.store.create(&record).await?;
    tracing::info!(id = %record.id, "created record");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_record<B: SheetBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let payload = validated(&body)?;
    state.store.update(&id, payload).await?;
    tracing::info!(%id, "updated record");
    Ok(Json(json!({ "success": true })))
}

async fn delete_record<B: SheetBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.store.delete(&id).await?;
    tracing::info!(%id, "deleted record");
    Ok(Json(json!({ "success": true })))
}
