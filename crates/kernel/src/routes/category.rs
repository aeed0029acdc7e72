//! Category routes.
//!
//! - `POST /categories` - insert into the tree
//! - `GET /categories` - pre-order listing, or `?query=` prefix suggestions
//! - `GET /categories/totals` - amounts rolled up the tree
//! - `GET /category/{id}/name`, `GET /category/{id}/path`
//! - `PATCH /category/{id}` - rename / re-comment

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::helpers::{Created, Empty, Id, JsonBody, QueryParams};
use crate::error::AppResult;
use crate::models::{
    Category, CategoryTotal, CreateCategory, PathEntry, Suggestion, TransactionFilter,
    UpdateCategory,
};
use crate::state::AppState;
use crate::validation::{check_filter, parse_mode, require_len, require_min_opt};

const NAME_MAX_LEN: usize = 255;

#[derive(Debug, Deserialize)]
struct CreateCategoryRequest {
    name: String,
    #[serde(default)]
    target: Option<i64>,
    mode: String,
}

#[derive(Debug, Deserialize)]
struct CategoriesQuery {
    #[serde(default)]
    query: Option<String>,
}

#[derive(Serialize)]
struct CategoriesResponse {
    categories: Vec<Category>,
}

#[derive(Serialize)]
struct SuggestionsResponse {
    suggestions: Vec<Suggestion>,
}

#[derive(Serialize)]
struct NameResponse {
    name: String,
}

#[derive(Serialize)]
struct PathResponse {
    path: Vec<PathEntry>,
}

#[derive(Serialize)]
struct TotalsResponse {
    totals: Vec<CategoryTotal>,
}

async fn create_category(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateCategoryRequest>,
) -> AppResult<Created> {
    require_len("name", &body.name, 1, Some(NAME_MAX_LEN))?;
    require_min_opt("target", body.target, 0)?;
    let mode = match parse_mode(&body.mode) {
        Ok(mode) => mode,
        Err(e) => {
            // A missing target is reported before a bad mode.
            if let Some(target) = body.target {
                state.categories().name(target).await?;
            }
            return Err(e);
        }
    };

    let id = state
        .categories()
        .insert(CreateCategory {
            name: body.name,
            target: body.target,
            mode,
        })
        .await?;
    Ok(Created { id })
}

async fn list_or_suggest(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<CategoriesQuery>,
) -> AppResult<Response> {
    if let Some(prefix) = params.query {
        require_len("query", &prefix, 1, None)?;
        let suggestions = state.categories().suggest(&prefix).await?;
        return Ok(Json(SuggestionsResponse { suggestions }).into_response());
    }

    let categories = state.categories().list().await?;
    Ok(Json(CategoriesResponse { categories }).into_response())
}

async fn totals(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<TransactionFilter>,
) -> AppResult<Json<TotalsResponse>> {
    check_filter(&filter)?;
    let totals = state.categories().totals(&filter).await?;
    Ok(Json(TotalsResponse { totals }))
}

async fn category_name(State(state): State<AppState>, Id(id): Id) -> AppResult<Json<NameResponse>> {
    let name = state.categories().name(id).await?;
    Ok(Json(NameResponse { name }))
}

async fn category_path(State(state): State<AppState>, Id(id): Id) -> AppResult<Json<PathResponse>> {
    let path = state.categories().path(id).await?;
    Ok(Json(PathResponse { path }))
}

async fn update_category(
    State(state): State<AppState>,
    Id(id): Id,
    JsonBody(body): JsonBody<UpdateCategory>,
) -> AppResult<Empty> {
    if let Some(ref name) = body.name {
        require_len("name", name, 1, Some(NAME_MAX_LEN))?;
    }
    state.categories().update(id, body).await?;
    Ok(Empty {})
}

/// Create the category router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create_category).get(list_or_suggest))
        .route("/categories/totals", get(totals))
        .route("/category/{id}", patch(update_category))
        .route("/category/{id}/name", get(category_name))
        .route("/category/{id}/path", get(category_path))
}
