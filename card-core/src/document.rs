//! The versioned card design document.
//!
//! A [`DesignerDocument`] is the unit of persistence for one card: three
//! fixed faces, each an ordered stack of layers. It is read and replaced
//! wholesale; readers reject unknown schema versions instead of guessing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{DesignError, DesignResult, Layer};

/// Schema version written by this crate.
pub const DESIGNER_VERSION: u32 = 1;

/// Fixed export width in pixels (portrait), for all version-1 documents.
pub const CARD_WIDTH_PX: u32 = 1536;

/// Fixed export height in pixels (portrait), for all version-1 documents.
pub const CARD_HEIGHT_PX: u32 = 2048;

/// One of the three paintable card panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceId {
    /// The card front.
    Front,
    /// The left inside panel.
    InsideLeft,
    /// The right inside panel.
    InsideRight,
}

impl FaceId {
    /// All faces in canonical processing order.
    ///
    /// Export walks faces in this order so storage uploads stay
    /// deterministic for diagnostics.
    pub const ALL: [Self; 3] = [Self::Front, Self::InsideLeft, Self::InsideRight];

    /// The wire/storage name of the face.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::InsideLeft => "inside_left",
            Self::InsideRight => "inside_right",
        }
    }
}

impl std::fmt::Display for FaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One paintable surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Stacking order: index 0 is furthest back, the last index is on top.
    /// Array order is part of the persisted contract.
    pub layers: Vec<Layer>,
}

/// The three faces of a card. All three are always present; faces are
/// never added or removed at runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Faces {
    /// The card front.
    pub front: Face,
    /// The left inside panel.
    pub inside_left: Face,
    /// The right inside panel.
    pub inside_right: Face,
}

impl Faces {
    /// Get a face by ID.
    #[must_use]
    pub fn get(&self, id: FaceId) -> &Face {
        match id {
            FaceId::Front => &self.front,
            FaceId::InsideLeft => &self.inside_left,
            FaceId::InsideRight => &self.inside_right,
        }
    }

    /// Get a mutable face by ID.
    pub fn get_mut(&mut self, id: FaceId) -> &mut Face {
        match id {
            FaceId::Front => &mut self.front,
            FaceId::InsideLeft => &mut self.inside_left,
            FaceId::InsideRight => &mut self.inside_right,
        }
    }

    /// Iterate faces in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        FaceId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }
}

/// Fixed document metadata. Frozen for all version-1 documents; changing
/// the canvas dimensions requires a new version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Monotonically increasing schema version tag.
    pub version: u32,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
}

/// The full saved design for one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignerDocument {
    /// Version and canvas dimensions.
    pub meta: DocumentMeta,
    /// The three faces.
    pub faces: Faces,
}

impl DesignerDocument {
    /// Create an empty version-1 document (all faces with zero layers).
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: DocumentMeta {
                version: DESIGNER_VERSION,
                width: CARD_WIDTH_PX,
                height: CARD_HEIGHT_PX,
            },
            faces: Faces::default(),
        }
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> DesignResult<String> {
        serde_json::to_string(self).map_err(DesignError::Serialization)
    }

    /// Deserialize and validate a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::UnsupportedVersion`] for any version other
    /// than the one this build writes, and [`DesignError::InvalidDocument`]
    /// for structural violations. Never best-effort interprets.
    pub fn from_json(json: &str) -> DesignResult<Self> {
        let doc: Self = serde_json::from_str(json)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Check the document against the version-1 invariants.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported version, unexpected canvas
    /// dimensions, or duplicate layer IDs.
    pub fn validate(&self) -> DesignResult<()> {
        if self.meta.version != DESIGNER_VERSION {
            return Err(DesignError::UnsupportedVersion(self.meta.version));
        }
        if self.meta.width != CARD_WIDTH_PX || self.meta.height != CARD_HEIGHT_PX {
            return Err(DesignError::InvalidDocument(format!(
                "unexpected canvas size {}x{} for version {}",
                self.meta.width, self.meta.height, self.meta.version
            )));
        }

        let mut seen = HashSet::new();
        for (face_id, face) in self.faces.iter() {
            for layer in &face.layers {
                if !seen.insert(layer.id()) {
                    return Err(DesignError::InvalidDocument(format!(
                        "duplicate layer id {} on face {face_id}",
                        layer.id()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Distinct image storage references across all three faces, in
    /// first-seen face/stacking order.
    #[must_use]
    pub fn image_srcs(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut srcs = Vec::new();
        for (_, face) in self.faces.iter() {
            for layer in &face.layers {
                if let Layer::Image(image) = layer {
                    if seen.insert(image.src.as_str()) {
                        srcs.push(image.src.as_str());
                    }
                }
            }
        }
        srcs
    }
}

impl Default for DesignerDocument {
    fn default() -> Self {
        Self::new()
    }
}
