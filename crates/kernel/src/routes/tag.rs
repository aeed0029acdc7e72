//! Tag and setting routes.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::helpers::{Created, Empty, Id, JsonBody, QueryParams};
use crate::error::AppResult;
use crate::models::{CreateTag, Setting, Suggestion, Tag};
use crate::state::AppState;
use crate::validation::require_len;

const NAME_SETTING: &str = "name";

#[derive(Debug, Deserialize)]
struct TagsQuery {
    #[serde(default)]
    query: Option<String>,
}

#[derive(Serialize)]
struct TagsResponse {
    tags: Vec<Tag>,
}

#[derive(Serialize)]
struct SuggestionsResponse {
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NameBody {
    name: String,
}

async fn list_or_suggest(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<TagsQuery>,
) -> AppResult<Response> {
    let mut conn = state.db().acquire().await?;
    if let Some(prefix) = params.query {
        require_len("query", &prefix, 1, None)?;
        let suggestions = Tag::suggest(&mut conn, &prefix).await?;
        return Ok(Json(SuggestionsResponse { suggestions }).into_response());
    }

    let tags = Tag::list(&mut conn).await?;
    Ok(Json(TagsResponse { tags }).into_response())
}

async fn create_tag(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateTag>,
) -> AppResult<Created> {
    require_len("name", &body.name, 1, Some(255))?;

    let mut tx = state.db().begin().await?;
    let id = Tag::create(&mut tx, &body).await?;
    tx.commit().await?;
    Ok(Created { id })
}

async fn tag_name(State(state): State<AppState>, Id(id): Id) -> AppResult<Json<NameBody>> {
    let mut conn = state.db().acquire().await?;
    let name = Tag::name(&mut conn, id).await?;
    Ok(Json(NameBody { name }))
}

async fn get_ledger_name(State(state): State<AppState>) -> AppResult<Json<NameBody>> {
    let mut conn = state.db().acquire().await?;
    let name = Setting::get(&mut conn, NAME_SETTING).await?;
    Ok(Json(NameBody { name }))
}

async fn set_ledger_name(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NameBody>,
) -> AppResult<Empty> {
    require_len("name", &body.name, 1, Some(255))?;

    let mut tx = state.db().begin().await?;
    Setting::set(&mut tx, NAME_SETTING, &body.name).await?;
    tx.commit().await?;
    Ok(Empty {})
}

/// Create the tag and setting router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_or_suggest).post(create_tag))
        .route("/tag/{id}/name", get(tag_name))
        .route("/setting/name", get(get_ledger_name).put(set_ledger_name))
}
