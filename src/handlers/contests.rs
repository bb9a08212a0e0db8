use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::{
    contest::{self, ContestManifest},
    names,
    rejections::AppError,
    store::SheetBackend,
    AppState,
};

pub fn routes<B: SheetBackend + 'static>() -> Router<AppState<B>> {
    Router::new().route(names::CONTESTS_URL, post(create_contest::<B>))
}

#[derive(Deserialize)]
struct ContestBody {
    #[serde(default)]
    contest_name: String,
    /// Free text, ids separated by commas or newlines.
    #[serde(default)]
    mcq_ids: String,
}

async fn create_contest<B: SheetBackend>(
    State(state): State<AppState<B>>,
    body: Bytes,
) -> Result<Json<ContestManifest>, AppError> {
    let body: ContestBody = super::json_body(&body)?;
    let records = state.store.list().await?;
    let manifest = contest::assemble(&body.contest_name, &body.mcq_ids, &records)?;
    tracing::info!(
        contest = %manifest.contest_name,
        questions = manifest.mcq_ids.len(),
        "assembled contest manifest"
    );
    Ok(Json(manifest))
}
