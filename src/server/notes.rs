use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{CreateNoteRequest, NoteTagsRequest};
use crate::server::response::{
    ApiError, ApiResponse, FieldErrors, StoreOptionExt, StoreResultExt,
};
use crate::store::Store;
use crate::types::{Note, NoteWithTags};

pub async fn create_note(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNoteRequest>,
) -> impl IntoResponse {
    let user_id = &auth.user.id;
    let store = state.store.as_ref();

    if req.title.trim().is_empty() {
        let mut errors = FieldErrors::new();
        errors.insert("title", "Note title cannot be empty".to_string());
        return Err(ApiError::validation(errors));
    }
    check_tags_exist(store, user_id, &req.tag_ids)?;

    let now = Utc::now();
    let note = Note {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.clone(),
        title: req.title,
        body: req.body,
        created_at: now,
        updated_at: now,
    };
    store.create_note(&note).api_err("Failed to create note")?;
    store
        .set_note_tags(&note.id, &req.tag_ids)
        .api_err("Failed to assign tags")?;

    let tags = store
        .list_note_tags(&note.id)
        .api_err("Failed to list note tags")?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(NoteWithTags { note, tags })),
    ))
}

pub async fn list_notes(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let notes = state
        .store
        .list_notes(&auth.user.id)
        .api_err("Failed to list notes")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(notes)))
}

pub async fn get_note(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let note = store
        .get_note(&auth.user.id, &id)
        .api_err("Failed to get note")?
        .or_not_found("Note not found")?;
    let tags = store
        .list_note_tags(&note.id)
        .api_err("Failed to list note tags")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(NoteWithTags { note, tags })))
}

pub async fn set_note_tags(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<NoteTagsRequest>,
) -> impl IntoResponse {
    let user_id = &auth.user.id;
    let store = state.store.as_ref();

    let note = store
        .get_note(user_id, &id)
        .api_err("Failed to get note")?
        .or_not_found("Note not found")?;
    check_tags_exist(store, user_id, &req.tag_ids)?;

    store
        .set_note_tags(&note.id, &req.tag_ids)
        .api_err("Failed to assign tags")?;
    let tags = store
        .list_note_tags(&note.id)
        .api_err("Failed to list note tags")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(NoteWithTags { note, tags })))
}

pub async fn delete_note(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let note = store
        .get_note(&auth.user.id, &id)
        .api_err("Failed to get note")?
        .or_not_found("Note not found")?;

    store.delete_note(&note.id).api_err("Failed to delete note")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

fn check_tags_exist(store: &dyn Store, user_id: &str, tag_ids: &[i64]) -> Result<(), ApiError> {
    for &tag_id in tag_ids {
        if store
            .get_tag(user_id, tag_id)
            .api_err("Failed to check tag")?
            .is_none()
        {
            let mut errors = FieldErrors::new();
            errors.insert("tag_ids", format!("Tag {tag_id} does not exist"));
            return Err(ApiError::validation(errors));
        }
    }
    Ok(())
}
