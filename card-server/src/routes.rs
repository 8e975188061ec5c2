//! API route handlers.
//!
//! The authenticated user arrives as an opaque id in the `x-user-id`
//! header (session handling itself is an external collaborator). Unknown
//! cards and cards owned by someone else produce the same generic
//! not-found signal.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use card_core::DesignerDocument;

use crate::error::{ServiceError, ServiceResult};
use crate::records::{current_timestamp_ms, CardRecord, DeliveryRecord};
use crate::storage::{asset_path, SIGNED_URL_TTL};
use crate::{export, metrics, tokens, validation, AppState, CardId};

/// Default title for cards created without one.
const DEFAULT_TITLE: &str = "Untitled Card";

/// Placeholder sender shown to recipients until profiles exist.
const DEFAULT_SENDER_NAME: &str = "Someone";

/// Default recipient name for public share links.
const DEFAULT_RECIPIENT_NAME: &str = "Friend";

/// Body for card creation.
#[derive(Debug, Default, Deserialize)]
pub struct CreateCardRequest {
    /// Optional card title.
    pub title: Option<String>,
}

/// Query parameters for asset upload.
#[derive(Debug, Deserialize)]
pub struct AssetUploadQuery {
    /// File extension of the uploaded asset.
    pub ext: String,
}

/// Response for asset upload: the stable path to persist in the design.
#[derive(Debug, Serialize)]
pub struct AssetUploadResponse {
    /// Stable storage path of the uploaded asset.
    pub path: String,
}

/// Response for delivery creation.
#[derive(Debug, Serialize)]
pub struct DeliverResponse {
    /// The share token.
    pub token: String,
    /// Full share URL for the recipient.
    pub url: String,
}

/// Card metadata in the viewer response.
#[derive(Debug, Serialize)]
pub struct ViewerCard {
    /// Card title.
    pub title: String,
    /// Sender display name.
    #[serde(rename = "senderName")]
    pub sender_name: String,
}

/// Freshly minted face URLs in the viewer response.
#[derive(Debug, Serialize)]
pub struct ViewerFaces {
    /// Signed URL of the front bitmap.
    pub front: String,
    /// Signed URL of the inside-left bitmap.
    pub inside_left: String,
    /// Signed URL of the inside-right bitmap.
    pub inside_right: String,
}

/// The response consumed by the 3D presentation layer.
#[derive(Debug, Serialize)]
pub struct ViewerResponse {
    /// Card metadata.
    pub card: ViewerCard,
    /// Directly fetchable face image URLs (short-lived).
    pub faces: ViewerFaces,
}

/// Extract and validate the authenticated user id.
fn authed_user(headers: &HeaderMap) -> ServiceResult<String> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or(ServiceError::Unauthorized)?;
    if validation::validate_user_id(user_id).is_err() {
        metrics::record_validation_failure("user_id");
        return Err(ServiceError::Unauthorized);
    }
    Ok(user_id.to_string())
}

/// Fetch a card the caller owns, or the generic not-found signal.
async fn owned_card(
    state: &AppState,
    user_id: &str,
    card_id: CardId,
) -> ServiceResult<CardRecord> {
    let card = state
        .cards
        .get_card(card_id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    if card.user_id != user_id {
        // Same signal as "does not exist": no existence leaks.
        return Err(ServiceError::NotFound);
    }
    Ok(card)
}

/// Load and gate a card's saved design.
async fn load_design(state: &AppState, card_id: CardId) -> ServiceResult<DesignerDocument> {
    let value = state
        .cards
        .get_design(card_id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    let design: DesignerDocument =
        serde_json::from_value(value).map_err(|e| ServiceError::Validation(e.to_string()))?;
    design.validate()?;
    Ok(design)
}

/// `POST /api/cards` - create a card together with its empty design.
#[tracing::instrument(name = "create_card", skip(state, headers, body))]
pub async fn create_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateCardRequest>,
) -> ServiceResult<Json<CardRecord>> {
    let user_id = authed_user(&headers)?;

    let title = body.title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
    if let Err(e) = validation::validate_title(&title) {
        metrics::record_validation_failure("title");
        return Err(e.into());
    }

    let card = CardRecord {
        id: CardId::new(),
        user_id,
        title,
        created_at: current_timestamp_ms(),
    };
    state.cards.insert_card(card.clone()).await?;

    // Every card starts from an empty version-1 design.
    let design = serde_json::to_value(DesignerDocument::new())
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    state.cards.put_design(card.id, design).await?;

    metrics::record_card_created();
    tracing::info!("created card {} for {}", card.id, card.user_id);
    Ok(Json(card))
}

/// `GET /api/cards` - list the caller's cards, newest first.
#[tracing::instrument(name = "list_cards", skip(state, headers))]
pub async fn list_cards(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServiceResult<Json<Vec<CardRecord>>> {
    let user_id = authed_user(&headers)?;
    let cards = state.cards.list_cards(&user_id).await?;
    Ok(Json(cards))
}

/// `GET /api/cards/{card_id}/design` - the stored design value.
#[tracing::instrument(name = "get_design", skip(state, headers))]
pub async fn get_design(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(card_id): Path<CardId>,
) -> ServiceResult<Json<serde_json::Value>> {
    let user_id = authed_user(&headers)?;
    owned_card(&state, &user_id, card_id).await?;

    let value = state
        .cards
        .get_design(card_id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(value))
}

/// `PUT /api/cards/{card_id}/design` - replace the design wholesale.
#[tracing::instrument(name = "put_design", skip(state, headers, value))]
pub async fn put_design(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(card_id): Path<CardId>,
    Json(value): Json<serde_json::Value>,
) -> ServiceResult<Json<serde_json::Value>> {
    let user_id = authed_user(&headers)?;
    owned_card(&state, &user_id, card_id).await?;

    // Gate shape, version, and content limits before anything is written.
    let design: DesignerDocument = serde_json::from_value(value.clone())
        .map_err(|e| ServiceError::Validation(e.to_string()))?;
    design.validate()?;
    if let Err(e) = validation::validate_design(&design) {
        metrics::record_validation_failure("design");
        return Err(e.into());
    }

    state.cards.put_design(card_id, value).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// `POST /api/cards/{card_id}/assets?ext=png` - upload a raw asset.
#[tracing::instrument(name = "upload_asset", skip(state, headers, body))]
pub async fn upload_asset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(card_id): Path<CardId>,
    Query(query): Query<AssetUploadQuery>,
    body: Bytes,
) -> ServiceResult<Json<AssetUploadResponse>> {
    let user_id = authed_user(&headers)?;
    owned_card(&state, &user_id, card_id).await?;

    if let Err(e) = validation::validate_asset_upload(&query.ext, body.len()) {
        metrics::record_validation_failure("asset");
        return Err(e.into());
    }

    let ext = query.ext.to_lowercase();
    let path = asset_path(&user_id, &card_id, &ext);
    state
        .objects
        .upload(&path, body.to_vec(), asset_content_type(&ext))
        .await?;

    Ok(Json(AssetUploadResponse { path }))
}

/// `POST /api/cards/{card_id}/export` - rasterize and publish all faces.
#[tracing::instrument(name = "export_card", skip(state, headers))]
pub async fn export_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(card_id): Path<CardId>,
) -> ServiceResult<Json<crate::records::CardFacesRecord>> {
    let user_id = authed_user(&headers)?;
    owned_card(&state, &user_id, card_id).await?;

    let design = load_design(&state, card_id).await?;
    let record = export::export_card_faces(
        state.objects.as_ref(),
        state.cards.as_ref(),
        &user_id,
        card_id,
        &design,
    )
    .await?;
    Ok(Json(record))
}

/// `POST /api/cards/{card_id}/deliver` - idempotent share link creation.
#[tracing::instrument(name = "deliver_card", skip(state, headers))]
pub async fn deliver_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(card_id): Path<CardId>,
) -> ServiceResult<Json<DeliverResponse>> {
    let user_id = authed_user(&headers)?;
    owned_card(&state, &user_id, card_id).await?;

    // An existing delivery keeps its token; no second record is minted.
    let token = match state.cards.get_delivery_by_card(card_id).await? {
        Some(existing) => existing.share_token,
        None => {
            let token = tokens::generate_share_token();
            state
                .cards
                .insert_delivery(DeliveryRecord {
                    card_id,
                    share_token: token.clone(),
                    recipient_name: DEFAULT_RECIPIENT_NAME.to_string(),
                    open_count: 0,
                    created_at: current_timestamp_ms(),
                })
                .await?;
            metrics::record_delivery_created();
            token
        }
    };

    let url = format!("{}/c/{token}", state.config.public_base_url);
    Ok(Json(DeliverResponse { token, url }))
}

/// `GET /api/viewer/{token}` - resolve a share token for the 3D viewer.
///
/// Anonymous: recipients have no session. Face URLs are minted fresh with
/// a short expiry on every resolution.
#[tracing::instrument(name = "view_card", skip(state))]
pub async fn view_card(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ServiceResult<Json<ViewerResponse>> {
    let delivery = state
        .cards
        .get_delivery_by_token(&token)
        .await?
        .ok_or(ServiceError::NotFound)?;

    // Best-effort read-then-write: an approximate counter, not an audit log.
    if let Err(e) = state
        .cards
        .set_open_count(&token, delivery.open_count + 1)
        .await
    {
        tracing::warn!("open count update failed for {token}: {e}");
    }

    let faces = state
        .cards
        .get_card_faces(delivery.card_id)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let title = state
        .cards
        .get_card(delivery.card_id)
        .await?
        .map_or_else(|| "Card".to_string(), |c| c.title);

    let front = state
        .objects
        .create_signed_url(&faces.front_url, SIGNED_URL_TTL)
        .await?;
    let inside_left = state
        .objects
        .create_signed_url(&faces.inside_left_url, SIGNED_URL_TTL)
        .await?;
    let inside_right = state
        .objects
        .create_signed_url(&faces.inside_right_url, SIGNED_URL_TTL)
        .await?;

    metrics::record_card_view();
    Ok(Json(ViewerResponse {
        card: ViewerCard {
            title,
            sender_name: DEFAULT_SENDER_NAME.to_string(),
        },
        faces: ViewerFaces {
            front,
            inside_left,
            inside_right,
        },
    }))
}

/// Content type for an allowed asset extension.
fn asset_content_type(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_content_types() {
        assert_eq!(asset_content_type("png"), "image/png");
        assert_eq!(asset_content_type("jpg"), "image/jpeg");
        assert_eq!(asset_content_type("jpeg"), "image/jpeg");
        assert_eq!(asset_content_type("webp"), "image/webp");
    }
}
