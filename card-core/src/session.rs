//! Interactive editing session state.
//!
//! A [`DesignerSession`] owns the single mutable document for one open
//! editing session plus the transient UI state (active face, selection).
//! It is an explicit context object: pass it to renderer and toolbox code
//! rather than holding it in a global, so parallel sessions (and parallel
//! tests) stay independent.

use serde::{Deserialize, Serialize};

use crate::{DesignerDocument, FaceId, Layer, LayerId, LayerPatch};

/// Direction for a stacking-order swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDirection {
    /// Swap with the next index (toward the top/foreground).
    Up,
    /// Swap with the previous index (toward the bottom/background).
    Down,
}

/// The mutable state for one open editing session.
#[derive(Debug, Clone)]
pub struct DesignerSession {
    design: DesignerDocument,
    active_face: FaceId,
    selected_layer: Option<LayerId>,
}

impl DesignerSession {
    /// Start a session on a fresh empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::with_design(DesignerDocument::new())
    }

    /// Start a session on an existing document.
    #[must_use]
    pub fn with_design(design: DesignerDocument) -> Self {
        Self {
            design,
            active_face: FaceId::Front,
            selected_layer: None,
        }
    }

    /// The current document.
    #[must_use]
    pub fn design(&self) -> &DesignerDocument {
        &self.design
    }

    /// The face currently being edited.
    #[must_use]
    pub fn active_face(&self) -> FaceId {
        self.active_face
    }

    /// The currently selected layer, if any.
    #[must_use]
    pub fn selected_layer(&self) -> Option<&LayerId> {
        self.selected_layer.as_ref()
    }

    /// The layers of the active face, back to front.
    #[must_use]
    pub fn active_layers(&self) -> &[Layer] {
        &self.design.faces.get(self.active_face).layers
    }

    /// Replace the whole document (initial load). Clears the selection.
    pub fn set_design(&mut self, design: DesignerDocument) {
        self.design = design;
        self.selected_layer = None;
    }

    /// Switch the face being edited.
    ///
    /// Clears the selection: selection is scoped to a face, and it must
    /// not survive pointing at a layer the user can no longer see.
    pub fn set_active_face(&mut self, face: FaceId) {
        self.active_face = face;
        self.selected_layer = None;
    }

    /// Set the selection. The id is not validated against the active
    /// face; callers pass only ids they obtained from it, or `None`.
    pub fn select_layer(&mut self, id: Option<LayerId>) {
        self.selected_layer = id;
    }

    /// Append a layer to the active face (it becomes topmost) and select it.
    pub fn add_layer(&mut self, layer: Layer) {
        let id = layer.id().clone();
        tracing::debug!("add layer {id} on {}", self.active_face);

        let mut layers = self.active_layers().to_vec();
        layers.push(layer);
        self.replace_active_face(layers);
        self.selected_layer = Some(id);
    }

    /// Merge a partial update into the matching layer of the active face.
    ///
    /// No-op when the id is not found there: edits never cross faces.
    pub fn update_layer(&mut self, id: &LayerId, patch: &LayerPatch) {
        let Some(index) = self.position_of(id) else {
            return;
        };
        let mut layers = self.active_layers().to_vec();
        layers[index].apply(patch);
        self.replace_active_face(layers);
    }

    /// Remove the matching layer from the active face.
    ///
    /// Clears the selection unconditionally, even if the removed layer
    /// was not the selected one.
    pub fn remove_layer(&mut self, id: &LayerId) {
        let layers: Vec<Layer> = self
            .active_layers()
            .iter()
            .filter(|l| l.id() != id)
            .cloned()
            .collect();
        self.replace_active_face(layers);
        self.selected_layer = None;
    }

    /// Swap the targeted layer with its immediate stacking neighbor.
    ///
    /// `Up` moves toward the foreground, `Down` toward the background.
    /// At either boundary the call is a no-op and the layer sequence is
    /// left untouched.
    pub fn reorder_layer(&mut self, id: &LayerId, direction: ReorderDirection) {
        let Some(index) = self.position_of(id) else {
            return;
        };
        let mut layers = self.active_layers().to_vec();
        match direction {
            ReorderDirection::Up if index + 1 < layers.len() => layers.swap(index, index + 1),
            ReorderDirection::Down if index > 0 => layers.swap(index, index - 1),
            _ => return,
        }
        self.replace_active_face(layers);
    }

    fn position_of(&self, id: &LayerId) -> Option<usize> {
        self.active_layers().iter().position(|l| l.id() == id)
    }

    /// Rebuild the document with only the active face replaced.
    ///
    /// Mutations go through value replacement rather than in-place edits:
    /// renderers detect changes by document identity, and history tooling
    /// can later be layered on without touching these operations.
    fn replace_active_face(&mut self, layers: Vec<Layer>) {
        let mut faces = self.design.faces.clone();
        faces.get_mut(self.active_face).layers = layers;
        self.design = DesignerDocument {
            meta: self.design.meta,
            faces,
        };
    }
}

impl Default for DesignerSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BaseLayer, ImageLayer, TextAlign, TextLayer};
    use proptest::prelude::*;

    fn text_layer(id: &str) -> Layer {
        Layer::Text(TextLayer {
            base: BaseLayer::at(LayerId::from(id), 10.0, 10.0),
            text: "Hi".to_string(),
            font_family: "serif".to_string(),
            font_size: 40.0,
            color: "#000".to_string(),
            align: TextAlign::Center,
            font_weight: None,
            line_height: None,
            letter_spacing: None,
            shadow_color: None,
            shadow_blur: None,
            shadow_offset_x: None,
            shadow_offset_y: None,
            stroke_color: None,
            stroke_width: None,
        })
    }

    fn image_layer(id: &str) -> Layer {
        Layer::Image(ImageLayer {
            base: BaseLayer::at(LayerId::from(id), 0.0, 0.0),
            src: format!("cards/u/c/assets/{id}.png"),
            width: None,
            height: None,
            crop: None,
        })
    }

    fn layer_ids(session: &DesignerSession) -> Vec<&str> {
        session
            .active_layers()
            .iter()
            .map(|l| l.id().as_str())
            .collect()
    }

    #[test]
    fn test_add_reorder_remove_scenario() {
        let mut session = DesignerSession::new();
        session.add_layer(text_layer("t1"));
        session.add_layer(image_layer("i1"));
        assert_eq!(layer_ids(&session), vec!["t1", "i1"]);
        assert_eq!(session.selected_layer().map(LayerId::as_str), Some("i1"));

        session.reorder_layer(&LayerId::from("i1"), ReorderDirection::Down);
        assert_eq!(layer_ids(&session), vec!["i1", "t1"]);

        session.remove_layer(&LayerId::from("t1"));
        assert_eq!(layer_ids(&session), vec!["i1"]);
        assert_eq!(session.selected_layer(), None);
    }

    #[test]
    fn test_reorder_at_boundaries_is_byte_identical_noop() {
        let mut session = DesignerSession::new();
        session.add_layer(text_layer("bottom"));
        session.add_layer(text_layer("top"));
        let before = session.design().to_json().expect("serialize");

        session.reorder_layer(&LayerId::from("top"), ReorderDirection::Up);
        session.reorder_layer(&LayerId::from("bottom"), ReorderDirection::Down);

        let after = session.design().to_json().expect("serialize");
        assert_eq!(before, after);
    }

    #[test]
    fn test_update_layer_is_scoped_to_active_face() {
        let mut session = DesignerSession::new();
        session.add_layer(text_layer("t1"));
        session.set_active_face(FaceId::InsideLeft);
        let before = session.design().clone();

        // t1 lives on front; editing from inside_left must not touch it.
        session.update_layer(
            &LayerId::from("t1"),
            &LayerPatch {
                x: Some(500.0),
                ..LayerPatch::default()
            },
        );
        assert_eq!(session.design(), &before);
    }

    #[test]
    fn test_update_layer_merges_fields() {
        let mut session = DesignerSession::new();
        session.add_layer(text_layer("t1"));
        session.update_layer(
            &LayerId::from("t1"),
            &LayerPatch {
                x: Some(42.0),
                rotation: Some(90.0),
                ..LayerPatch::default()
            },
        );

        let layer = &session.active_layers()[0];
        assert!((layer.base().x - 42.0).abs() < f32::EPSILON);
        assert!((layer.base().rotation - 90.0).abs() < f32::EPSILON);
        // Untouched fields survive the merge.
        assert!((layer.base().y - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_face_switch_clears_selection() {
        let mut session = DesignerSession::new();
        session.add_layer(text_layer("t1"));
        assert!(session.selected_layer().is_some());

        session.set_active_face(FaceId::InsideRight);
        assert_eq!(session.selected_layer(), None);
        assert_eq!(session.active_face(), FaceId::InsideRight);
    }

    #[test]
    fn test_set_design_clears_selection() {
        let mut session = DesignerSession::new();
        session.add_layer(text_layer("t1"));
        session.set_design(DesignerDocument::new());
        assert_eq!(session.selected_layer(), None);
        assert!(session.active_layers().is_empty());
    }

    #[test]
    fn test_remove_unknown_id_still_deselects() {
        let mut session = DesignerSession::new();
        session.add_layer(text_layer("t1"));
        session.remove_layer(&LayerId::from("missing"));
        assert_eq!(layer_ids(&session), vec!["t1"]);
        assert_eq!(session.selected_layer(), None);
    }

    #[test]
    fn test_mutation_replaces_document_value() {
        let mut session = DesignerSession::new();
        let before = session.design().clone();
        session.add_layer(text_layer("t1"));
        assert_ne!(session.design(), &before);
    }

    proptest! {
        // An interior layer moved up then back down lands exactly where
        // it started, for any stack the two swaps fit into.
        #[test]
        fn reorder_up_then_down_is_identity(count in 3usize..8, pos in any::<prop::sample::Index>()) {
            let mut session = DesignerSession::new();
            for i in 0..count {
                session.add_layer(text_layer(&format!("l{i}")));
            }
            let index = 1 + pos.index(count - 2);
            let id = LayerId::from(format!("l{index}"));
            let before = session.design().to_json().expect("serialize");

            session.reorder_layer(&id, ReorderDirection::Up);
            session.reorder_layer(&id, ReorderDirection::Down);

            let after = session.design().to_json().expect("serialize");
            prop_assert_eq!(before, after);
        }
    }
}
