//! The headless export pipeline.
//!
//! Reads a saved design fresh (never an on-screen render), rasterizes all
//! three faces at the canonical size, uploads each bitmap to its stable
//! path, and finally writes the face-lookup row in one atomic upsert.
//!
//! Failure handling is split by blast radius and the two policies must
//! never be merged:
//! - resolving/fetching/decoding an individual asset fails → that asset's
//!   layers are skipped, the export continues;
//! - rasterizing a face, uploading a bitmap, or writing the lookup row
//!   fails → the whole export aborts and the lookup row is not touched.

use card_core::{DesignerDocument, FaceId};
use card_renderer::raster::PixelSource;
use card_renderer::{decode_pixels, FaceRasterizer};

use crate::error::ServiceResult;
use crate::metrics;
use crate::records::{current_timestamp_ms, CardFacesRecord, CardStore};
use crate::storage::{face_path, ObjectStore, SIGNED_URL_TTL};
use crate::CardId;

/// Export all three faces of a design and update the face-lookup row.
///
/// Faces are processed sequentially in the fixed `front`, `inside_left`,
/// `inside_right` order. On success the returned record is exactly what
/// was upserted. Bitmaps uploaded by a run that later aborts are left
/// behind as garbage; the lookup row is the source of truth.
///
/// # Errors
///
/// Returns an error if any face fails to rasterize or upload, or if the
/// final record upsert fails. No partial record update occurs.
pub async fn export_card_faces(
    objects: &dyn ObjectStore,
    cards: &dyn CardStore,
    user_id: &str,
    card_id: CardId,
    design: &DesignerDocument,
) -> ServiceResult<CardFacesRecord> {
    let pixels = resolve_assets(objects, design).await;

    let rasterizer = FaceRasterizer::new();
    for face_id in FaceId::ALL {
        let face = design.faces.get(face_id);
        let png = match rasterizer.render_png(face, &pixels) {
            Ok(png) => png,
            Err(e) => {
                metrics::record_export_failure("render");
                return Err(e.into());
            }
        };

        let path = face_path(user_id, &card_id, face_id);
        if let Err(e) = objects.upload(&path, png, "image/png").await {
            metrics::record_export_failure("upload");
            return Err(e.into());
        }
        tracing::debug!("exported face {face_id} of card {card_id} to {path}");
        metrics::record_face_exported(face_id.as_str());
    }

    let record = CardFacesRecord {
        card_id,
        front_url: face_path(user_id, &card_id, FaceId::Front),
        inside_left_url: face_path(user_id, &card_id, FaceId::InsideLeft),
        inside_right_url: face_path(user_id, &card_id, FaceId::InsideRight),
        updated_at: current_timestamp_ms(),
    };

    // One upsert for all three paths. A run that failed earlier never
    // reaches this point, so the row is all-or-nothing.
    if let Err(e) = cards.upsert_card_faces(record.clone()).await {
        metrics::record_export_failure("record");
        return Err(e.into());
    }

    tracing::info!("export complete for card {card_id}");
    Ok(record)
}

/// Resolve every distinct image reference in the document to decoded
/// pixels, each exactly once even when reused across layers and faces.
///
/// An asset that cannot be resolved, fetched, or decoded is logged and
/// left unbound; its layers will simply not paint.
async fn resolve_assets(objects: &dyn ObjectStore, design: &DesignerDocument) -> PixelSource {
    let mut pixels = PixelSource::new();

    for src in design.image_srcs() {
        let url = match objects.create_signed_url(src, SIGNED_URL_TTL).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("could not resolve asset {src}: {e}, skipping");
                continue;
            }
        };

        let bytes = match objects.fetch(&url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("could not fetch asset {src}: {e}, skipping");
                continue;
            }
        };

        match decode_pixels(&bytes) {
            Ok(decoded) => pixels.insert(src, decoded),
            Err(e) => {
                tracing::warn!("could not decode asset {src}: {e}, skipping");
            }
        }
    }

    pixels
}
