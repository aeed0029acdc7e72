//! Dataset and dataset source routes.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use super::helpers::{Created, Id, JsonBody};
use crate::error::AppResult;
use crate::models::{CreateDataset, CreateDatasetSource, Dataset, DatasetSource};
use crate::state::AppState;
use crate::validation::require_len;

#[derive(Serialize)]
struct DatasetsResponse {
    datasets: Vec<Dataset>,
}

#[derive(Serialize)]
struct SourcesResponse {
    sources: Vec<DatasetSource>,
}

async fn list_datasets(State(state): State<AppState>) -> AppResult<Json<DatasetsResponse>> {
    let mut conn = state.db().acquire().await?;
    let datasets = Dataset::list_all(&mut conn).await?;
    Ok(Json(DatasetsResponse { datasets }))
}

async fn get_dataset(
    State(state): State<AppState>,
    Id(id): Id,
) -> AppResult<Json<DatasetsResponse>> {
    let mut conn = state.db().acquire().await?;
    let datasets = Dataset::find(&mut conn, id).await?;
    Ok(Json(DatasetsResponse { datasets }))
}

async fn create_dataset(
    State(state): State<AppState>,
    Id(source): Id,
    JsonBody(body): JsonBody<CreateDataset>,
) -> AppResult<Created> {
    let mut tx = state.db().begin().await?;
    let id = Dataset::create(&mut tx, source, &body).await?;
    tx.commit().await?;
    Ok(Created { id })
}

async fn list_sources(State(state): State<AppState>) -> AppResult<Json<SourcesResponse>> {
    let mut conn = state.db().acquire().await?;
    let sources = DatasetSource::list(&mut conn).await?;
    Ok(Json(SourcesResponse { sources }))
}

async fn create_source(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateDatasetSource>,
) -> AppResult<Created> {
    require_len("name", &body.name, 1, Some(255))?;

    let mut tx = state.db().begin().await?;
    let id = DatasetSource::create(&mut tx, &body).await?;
    tx.commit().await?;
    Ok(Created { id })
}

/// Create the dataset router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/datasets", get(list_datasets))
        .route("/dataset/{id}", get(get_dataset))
        .route("/dataset_source/{id}/datasets", post(create_dataset))
        .route("/dataset_sources", get(list_sources).post(create_source))
}
