use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{CreateTagRequest, DeleteTagParams, UpdateTagRequest};
use crate::server::response::{
    ApiError, ApiResponse, FieldErrors, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::validate_tag_name;
use crate::store::Store;
use crate::tree::build_tree;
use crate::types::Tag;

pub async fn list_tags(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let tags = state
        .store
        .list_tags(&auth.user.id)
        .api_err("Failed to list tags")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(tags)))
}

pub async fn tag_tree(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let tags = state
        .store
        .list_tags(&auth.user.id)
        .api_err("Failed to list tags")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(build_tree(&tags))))
}

pub async fn create_tag(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTagRequest>,
) -> impl IntoResponse {
    let user_id = &auth.user.id;
    let store = state.store.as_ref();

    let mut errors = FieldErrors::new();
    if let Err(message) = validate_tag_name(&req.name) {
        errors.insert("name", message);
    }
    if let Some(parent_id) = req.parent_id {
        if store
            .get_tag(user_id, parent_id)
            .api_err("Failed to check parent tag")?
            .is_none()
        {
            errors.insert("parent_id", "Parent tag does not exist".to_string());
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    if store
        .get_tag_by_name(user_id, req.parent_id, &req.name)
        .api_err("Failed to check tag")?
        .is_some()
    {
        return Err(ApiError::conflict("Tag already exists"));
    }

    let now = Utc::now();
    let mut tag = Tag {
        id: 0,
        user_id: user_id.clone(),
        name: req.name,
        parent_id: req.parent_id,
        created_at: now,
        updated_at: now,
    };
    tag.id = store.create_tag(&tag).api_err("Failed to create tag")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(tag))))
}

pub async fn get_tag(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let tag = state
        .store
        .get_tag(&auth.user.id, id)
        .api_err("Failed to get tag")?
        .or_not_found("Tag not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(tag)))
}

pub async fn update_tag(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTagRequest>,
) -> impl IntoResponse {
    let user_id = &auth.user.id;
    let store = state.store.as_ref();

    let mut tag = store
        .get_tag(user_id, id)
        .api_err("Failed to get tag")?
        .or_not_found("Tag not found")?;

    if let Some(name) = req.name {
        let mut errors = FieldErrors::new();
        if let Err(message) = validate_tag_name(&name) {
            errors.insert("name", message);
            return Err(ApiError::validation(errors));
        }
        tag.name = name;
    }

    if let Some(parent_id) = req.parent_id {
        if let Some(new_parent) = parent_id {
            let mut errors = FieldErrors::new();
            if new_parent == tag.id {
                errors.insert("parent_id", "A tag cannot be its own parent".to_string());
            } else if store
                .get_tag(user_id, new_parent)
                .api_err("Failed to check parent tag")?
                .is_none()
            {
                errors.insert("parent_id", "Parent tag does not exist".to_string());
            } else if creates_cycle(store, user_id, tag.id, new_parent)? {
                errors.insert(
                    "parent_id",
                    "Moving here would create a cycle".to_string(),
                );
            }
            if !errors.is_empty() {
                return Err(ApiError::validation(errors));
            }
        }
        tag.parent_id = parent_id;
    }

    if let Some(existing) = store
        .get_tag_by_name(user_id, tag.parent_id, &tag.name)
        .api_err("Failed to check tag name")?
    {
        if existing.id != tag.id {
            return Err(ApiError::conflict("Tag name already exists"));
        }
    }

    tag.updated_at = Utc::now();
    store.update_tag(&tag).api_err("Failed to update tag")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(tag)))
}

pub async fn delete_tag(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<DeleteTagParams>,
) -> impl IntoResponse {
    let user_id = &auth.user.id;
    let store = state.store.as_ref();

    let tag = store
        .get_tag(user_id, id)
        .api_err("Failed to get tag")?
        .or_not_found("Tag not found")?;

    let child_count = store
        .count_tag_children(tag.id)
        .api_err("Failed to count children")?;

    if child_count > 0 {
        if params.force != Some(true) {
            return Err(ApiError::conflict(
                "Tag has child tags. Use ?force=true to delete and reparent them",
            ));
        }
        // One transaction: children move up to the deleted tag's parent and
        // the tag goes away together. Notes keep their other assignments.
        store
            .delete_tag_reparenting_children(tag.id, tag.parent_id)
            .api_err("Failed to delete tag")?;
    } else {
        store.delete_tag(tag.id).api_err("Failed to delete tag")?;
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

/// Walks the ancestor chain of `new_parent`; placing `tag_id` under it would
/// close a loop if the chain passes through `tag_id`.
fn creates_cycle(
    store: &dyn Store,
    user_id: &str,
    tag_id: i64,
    new_parent: i64,
) -> Result<bool, ApiError> {
    let mut current = Some(new_parent);
    // Bounded in case the stored data already contains a loop.
    let mut remaining = 10_000;

    while let Some(ancestor_id) = current {
        if ancestor_id == tag_id {
            return Ok(true);
        }
        if remaining == 0 {
            return Ok(true);
        }
        remaining -= 1;

        current = store
            .get_tag(user_id, ancestor_id)
            .api_err("Failed to walk ancestors")?
            .and_then(|t| t.parent_id);
    }

    Ok(false)
}
