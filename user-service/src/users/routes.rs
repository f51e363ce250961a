//! HTTP handlers for the user collection
//!
//! | Method | Path          | Operation                  |
//! |--------|---------------|----------------------------|
//! | GET    | /users        | paginated, filtered list   |
//! | GET    | /users/all    | whole collection           |
//! | POST   | /users        | create (201)               |
//! | GET    | /users/{id}   | fetch one                  |
//! | PATCH  | /users/{id}   | partial update             |
//! | DELETE | /users/{id}   | delete (204)               |
//!
//! List filters come from the query string; `age[gte]=18` becomes a
//! comparison on `age`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::error::{ServiceError, ServiceOperation};
use crate::pagination::{PaginatedResponse, RawQuery};
use crate::state::AppState;
use crate::store::DocumentStore;

use super::model::{NewUser, User, UserPatch};

/// Routes for the user collection, to be given state by the caller
pub fn router<S>() -> Router<AppState<S>>
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/users", get(list_users::<S>).post(create_user::<S>))
        .route("/users/all", get(all_users::<S>))
        .route(
            "/users/{id}",
            get(get_user::<S>)
                .patch(update_user::<S>)
                .delete(delete_user::<S>),
        )
}

async fn list_users<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<PaginatedResponse<User>, ServiceError> {
    let Query(pairs) = query.map_err(|rejection| {
        ServiceError::malformed_query(ServiceOperation::FindAllWithPagination, rejection.body_text())
    })?;
    let raw = RawQuery::from_pairs(pairs);
    state.users().find_all_with_pagination(&raw).await
}

async fn all_users<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<User>>, ServiceError> {
    state.users().find_all().await.map(Json)
}

async fn create_user<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(input) = body.map_err(|rejection| {
        ServiceError::malformed_query(ServiceOperation::Create, rejection.body_text())
    })?;
    input
        .validate()
        .map_err(|msg| ServiceError::malformed_query(ServiceOperation::Create, msg))?;
    let user = state.users().create(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ServiceError> {
    state.users().find_by_id(&id).await.map(Json)
}

async fn update_user<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<User>, ServiceError> {
    let Json(patch) = body.map_err(|rejection| {
        ServiceError::malformed_query(ServiceOperation::UpdateById, rejection.body_text())
    })?;
    state.users().update_by_id(&id, patch).await.map(Json)
}

async fn delete_user<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    state.users().delete_by_id(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
