//! Meme submission, moderation and voting handlers
//!
//! Handlers that publish or change a visible meme announce it through the
//! [`BroadcastService`](crate::broadcast::BroadcastService), so push and
//! polling clients see approvals, votes and removals as they happen.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use bossme_core::{
    AuthContext, EventKind, Meme, MemeError, MemeStatus, NewMeme, Role, VoteDirection,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::{require_identity, require_role};

/// A meme as returned by the API, with its derived score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemeView {
    #[serde(flatten)]
    pub meme: Meme,
    pub score: i64,
}

impl From<Meme> for MemeView {
    fn from(meme: Meme) -> Self {
        let score = meme.score();
        Self { meme, score }
    }
}

/// Query parameters for `GET /api/memes`
#[derive(Debug, Default, Deserialize)]
pub struct ListMemesQuery {
    pub status: Option<String>,
}

/// Body of `POST /api/memes/:id/vote`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub direction: VoteDirection,
}

fn caller(auth: Option<Extension<AuthContext>>) -> AuthContext {
    auth.map(|Extension(ctx)| ctx)
        .unwrap_or(AuthContext::Anonymous)
}

/// Whether the caller may see a meme that is not published
fn can_see_unpublished(auth: &AuthContext, meme: &Meme) -> bool {
    auth.identity()
        .is_some_and(|identity| identity.role.satisfies(Role::Moderator) || identity.user_id == meme.author)
}

/// GET /api/memes - Published memes, or a moderation queue for moderators
pub async fn list_memes(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthContext>>,
    Query(params): Query<ListMemesQuery>,
) -> Result<Json<Vec<MemeView>>, ApiError> {
    let status = match params.status.as_deref() {
        None => MemeStatus::Approved,
        Some(raw) => MemeStatus::parse(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown status: {}", raw)))?,
    };

    if status != MemeStatus::Approved {
        require_role(&caller(auth), Role::Moderator)?;
    }

    let memes = state.memes.list(Some(status)).await;
    Ok(Json(memes.into_iter().map(MemeView::from).collect()))
}

/// GET /api/memes/:id - A single meme
pub async fn get_meme(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MemeView>, ApiError> {
    let meme = state
        .memes
        .get(id)
        .await
        .ok_or_else(|| MemeError::NotFound(id.to_string()))?;

    // Unpublished memes look missing to everyone but the author and moderators
    if !meme.is_published() && !can_see_unpublished(&caller(auth), &meme) {
        return Err(MemeError::NotFound(id.to_string()).into());
    }

    Ok(Json(meme.into()))
}

/// POST /api/memes - Submit a meme for moderation
pub async fn create_meme(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthContext>>,
    Json(request): Json<NewMeme>,
) -> Result<(StatusCode, Json<MemeView>), ApiError> {
    let auth = caller(auth);
    let identity = require_identity(&auth)?;

    let meme = request.into_meme(identity.user_id.clone())?;
    let meme = state.memes.insert(meme).await?;
    tracing::info!(meme = %meme.id, author = %meme.author, "Meme submitted");

    Ok((StatusCode::CREATED, Json(meme.into())))
}

/// POST /api/memes/:id/approve - Publish a pending meme
pub async fn approve_meme(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MemeView>, ApiError> {
    let auth = caller(auth);
    let moderator = require_role(&auth, Role::Moderator)?;

    let _ordered = state.meme_events.lock().await;
    let meme = state
        .memes
        .set_status(id, MemeStatus::Approved, Utc::now())
        .await?;
    tracing::info!(meme = %id, moderator = %moderator.user_id, "Meme approved");

    let view = MemeView::from(meme);
    state.broadcaster.broadcast_new_item(&view);
    Ok(Json(view))
}

/// POST /api/memes/:id/reject - Turn down a pending meme
pub async fn reject_meme(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MemeView>, ApiError> {
    let auth = caller(auth);
    let moderator = require_role(&auth, Role::Moderator)?;

    let meme = state
        .memes
        .set_status(id, MemeStatus::Rejected, Utc::now())
        .await?;
    tracing::info!(meme = %id, moderator = %moderator.user_id, "Meme rejected");

    Ok(Json(meme.into()))
}

/// POST /api/memes/:id/vote - Cast, switch or withdraw a vote
pub async fn vote_meme(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<MemeView>, ApiError> {
    let auth = caller(auth);
    let identity = require_identity(&auth)?;

    let _ordered = state.meme_events.lock().await;
    let outcome = state
        .memes
        .apply_vote(id, &identity.user_id, request.direction)
        .await?;

    let view = MemeView::from(outcome.meme);
    if outcome.changed {
        state.broadcaster.broadcast_item_updated(&view);
    }
    Ok(Json(view))
}

/// DELETE /api/memes/:id - Remove a meme (author or moderator)
pub async fn delete_meme(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let auth = caller(auth);
    let identity = require_identity(&auth)?;

    let meme = state
        .memes
        .get(id)
        .await
        .ok_or_else(|| MemeError::NotFound(id.to_string()))?;
    if meme.author != identity.user_id && !identity.role.satisfies(Role::Moderator) {
        return Err(ApiError::Forbidden(Role::Moderator));
    }

    let _ordered = state.meme_events.lock().await;
    let removed = state.memes.delete(id).await?;
    tracing::info!(meme = %id, by = %identity.user_id, "Meme deleted");

    if removed.is_published() {
        state
            .broadcaster
            .broadcast(EventKind::MemeDeleted, json!({ "id": id }));
    }
    Ok(StatusCode::NO_CONTENT)
}
