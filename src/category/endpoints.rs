//! Route handlers for creating, reading, renaming and deleting categories.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    extract::{Json, Path},
    auth::UserID,
    category::core::{
        CategoryId, CategoryState, create_category, delete_categories, delete_category,
        get_categories, get_category, update_category,
    },
    database_id::{BulkDeleteForm, DeletedRow},
    name::{Name, NameForm},
    response::render_data,
};

/// A route handler that lists the logged in user's categories ordered by ID.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories(user_id, &connection)?;

    Ok(render_data(StatusCode::OK, categories))
}

/// A route handler that fetches one of the logged in user's categories.
pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let category = get_category(category_id, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, category))
}

/// A route handler for creating a category, responds with 201 and the new category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<NameForm>,
) -> Result<Response, Error> {
    let name = Name::new(&form.name)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(name, user_id, &connection)?;

    Ok(render_data(StatusCode::CREATED, category))
}

/// A route handler for renaming one of the logged in user's categories.
pub async fn edit_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
    Json(form): Json<NameForm>,
) -> Result<Response, Error> {
    let name = Name::new(&form.name)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let category = update_category(category_id, name, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, category))
}

/// A route handler for deleting one of the logged in user's categories.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_category(category_id, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, DeletedRow { id: category_id }))
}

/// A route handler for deleting many categories, responds with the deleted IDs.
pub async fn bulk_delete_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<BulkDeleteForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let deleted = delete_categories(&form.ids, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, deleted))
}
