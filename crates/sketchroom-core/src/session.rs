//! Editor session: wires the document, history, snapping and relay
//! together and exposes the editing commands.
//!
//! One session owns one open document. Dependencies (renderer handle,
//! persistence gateway) are constructor-injected and the lifecycle is
//! explicit: [`open`](EditorSession::open) / [`close`](EditorSession::close).
//! Every committed mutation runs the same pipeline: recompute the layer
//! index, snapshot the document, record it in history, publish it to the
//! document's room.

use crate::history::HistoryManager;
use crate::layers::{LayerDirection, LayerEntry};
use crate::scene::{DocumentError, PropertyValue, SceneDocument, ShapeField};
use crate::shapes::{Ellipse, Image, Rectangle, Shape, ShapeId, ShapeKind, Text};
use crate::snap::{Guideline, SNAP_THRESHOLD, snap_bounds};
use crate::storage::{Persistence, PersistenceError};
use crate::sync::{ClientMessage, RelayClient, RelayEvent};
use kurbo::{Point, Rect, Vec2};
use thiserror::Error;

/// Default placement for newly created shapes.
const RECTANGLE_POSITION: Point = Point::new(50.0, 100.0);
const ELLIPSE_POSITION: Point = Point::new(50.0, 100.0);
const TEXT_POSITION: Point = Point::new(50.0, 150.0);
const IMAGE_POSITION: Point = Point::new(150.0, 100.0);

/// Renderer load failure (e.g. a corrupt payload the renderer rejects).
#[derive(Debug, Error)]
#[error("renderer failed to load scene: {0}")]
pub struct RenderError(pub String);

/// Handle to the external rendering engine.
///
/// The session owns the scene document; the renderer only mirrors it.
/// Direct-manipulation edits made inside the renderer come back through
/// [`EditorSession::notify_mutation`].
pub trait SceneRenderer {
    /// Replace the rendered scene with the given document.
    fn reload(&mut self, document: &SceneDocument) -> Result<(), RenderError>;

    /// Encode the current view as a PNG, if the renderer supports it.
    fn thumbnail(&self) -> Option<Vec<u8>> {
        None
    }
}

/// A renderer that renders nothing. Used headless and in tests.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl SceneRenderer for NullRenderer {
    fn reload(&mut self, _document: &SceneDocument) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Errors surfaced to the embedding UI.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no document is open")]
    NotOpen,
    #[error("failed to load document: {0}")]
    Load(#[source] PersistenceError),
    #[error("failed to apply snapshot: {0}")]
    Apply(#[from] DocumentError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to save document: {0}")]
    Save(#[source] PersistenceError),
}

/// In-progress drag gesture state. Guides live and die with it.
#[derive(Debug)]
struct DragState {
    shape: ShapeId,
    origin: Point,
    guides: Vec<Guideline>,
}

/// One user's editing session over one document.
pub struct EditorSession<R: SceneRenderer, P: Persistence> {
    renderer: R,
    persistence: P,
    document_id: Option<String>,
    document: SceneDocument,
    history: HistoryManager,
    /// Messages queued for the relay; drained by the transport glue.
    outgoing: Vec<ClientMessage>,
    selected: Option<ShapeId>,
    drag: Option<DragState>,
    /// While > 0, commit notifications are swallowed: a snapshot is being
    /// applied and must not re-record or re-broadcast itself.
    suppress: u32,
}

impl<R: SceneRenderer, P: Persistence> EditorSession<R, P> {
    pub fn new(renderer: R, persistence: P) -> Self {
        Self {
            renderer,
            persistence,
            document_id: None,
            document: SceneDocument::new(),
            history: HistoryManager::new(),
            outgoing: Vec::new(),
            selected: None,
            drag: None,
            suppress: 0,
        }
    }

    // --- Lifecycle ---

    /// Open a document: load it from persistence, seed history with the
    /// loaded state and join the document's relay room.
    ///
    /// On failure nothing is opened and no history is initialized.
    pub async fn open(&mut self, document_id: &str) -> Result<(), SessionError> {
        let mut document = self
            .persistence
            .load(document_id)
            .await
            .map_err(SessionError::Load)?;
        document.recompute_z_indices();

        self.suppress += 1;
        let loaded = self.renderer.reload(&document);
        self.suppress -= 1;
        loaded?;

        let snapshot = document.to_snapshot().map_err(DocumentError::Snapshot)?;
        self.document = document;
        self.history.reset(snapshot);
        self.document_id = Some(document_id.to_string());
        self.outgoing.push(ClientMessage::JoinDocument {
            document: document_id.to_string(),
        });
        Ok(())
    }

    /// Close the session, leaving the relay room. Unsaved changes are
    /// dropped (durable state is written only by [`save`](Self::save)).
    pub fn close(&mut self) {
        if self.document_id.take().is_some() {
            self.outgoing.push(ClientMessage::LeaveDocument);
        }
        self.document = SceneDocument::new();
        self.history = HistoryManager::new();
        self.selected = None;
        self.drag = None;
    }

    pub fn is_open(&self) -> bool {
        self.document_id.is_some()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    fn require_open(&self) -> Result<&str, SessionError> {
        self.document_id.as_deref().ok_or(SessionError::NotOpen)
    }

    // --- Shape creation ---

    pub fn add_rectangle(&mut self) -> Result<ShapeId, SessionError> {
        self.require_open()?;
        let id = self.document.add_shape(Shape::new(
            RECTANGLE_POSITION,
            ShapeKind::Rectangle(Rectangle::default()),
        ));
        self.commit();
        Ok(id)
    }

    pub fn add_ellipse(&mut self) -> Result<ShapeId, SessionError> {
        self.require_open()?;
        let id = self.document.add_shape(Shape::new(
            ELLIPSE_POSITION,
            ShapeKind::Ellipse(Ellipse::default()),
        ));
        self.commit();
        Ok(id)
    }

    pub fn add_text(&mut self) -> Result<ShapeId, SessionError> {
        self.require_open()?;
        let id = self
            .document
            .add_shape(Shape::new(TEXT_POSITION, ShapeKind::Text(Text::default())));
        self.commit();
        Ok(id)
    }

    /// Place an image by source reference. Starts at a quarter of its
    /// source size.
    pub fn add_image(
        &mut self,
        source: impl Into<String>,
        source_width: u32,
        source_height: u32,
    ) -> Result<ShapeId, SessionError> {
        self.require_open()?;
        let shape = Shape::new(
            IMAGE_POSITION,
            ShapeKind::Image(Image::new(source, source_width, source_height)),
        )
        .with_scale(Vec2::new(Image::DEFAULT_SCALE, Image::DEFAULT_SCALE));
        let id = self.document.add_shape(shape);
        self.commit();
        Ok(id)
    }

    // --- Editing commands ---

    /// Update one shape field; validated against the variant's legal set.
    pub fn update_property(
        &mut self,
        id: ShapeId,
        field: ShapeField,
        value: PropertyValue,
    ) -> Result<(), SessionError> {
        self.require_open()?;
        self.document.update_property(id, field, value)?;
        self.commit();
        Ok(())
    }

    pub fn rename_layer(
        &mut self,
        id: ShapeId,
        name: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.require_open()?;
        self.document.rename(id, name)?;
        self.commit();
        Ok(())
    }

    /// Delete a shape. Unknown ids are a no-op.
    pub fn delete_layer(&mut self, id: ShapeId) {
        if self.document.remove_shape(id).is_some() {
            if self.selected == Some(id) {
                self.selected = None;
            }
            self.commit();
        }
    }

    /// Move a shape one step in rendering order. No-op at the boundary.
    pub fn reorder_layer(&mut self, id: ShapeId, direction: LayerDirection) {
        if self.document.reorder(id, direction) {
            self.commit();
        }
    }

    pub fn select_layer(&mut self, id: Option<ShapeId>) {
        self.selected = id.filter(|id| self.document.get(*id).is_some());
    }

    pub fn selected(&self) -> Option<ShapeId> {
        self.selected
    }

    pub fn layers(&self) -> Vec<LayerEntry> {
        self.document.list_layers()
    }

    pub fn set_canvas_width(&mut self, width: f64) {
        self.document.set_width(width);
        self.commit();
    }

    pub fn set_canvas_height(&mut self, height: f64) {
        self.document.set_height(height);
        self.commit();
    }

    // --- Drag & snap ---

    /// Start dragging a shape. Snapping runs on every
    /// [`drag_to`](Self::drag_to) until the gesture ends.
    pub fn begin_drag(&mut self, id: ShapeId) -> Result<(), SessionError> {
        self.require_open()?;
        let shape = self
            .document
            .get(id)
            .ok_or(DocumentError::UnknownShape(id))?;
        self.drag = Some(DragState {
            shape: id,
            origin: shape.position,
            guides: Vec::new(),
        });
        Ok(())
    }

    /// Move the dragged shape, snapping its edges/centers to siblings
    /// within [`SNAP_THRESHOLD`]. Ignored outside a drag gesture.
    pub fn drag_to(&mut self, position: Point) {
        let Some(id) = self.drag.as_ref().map(|d| d.shape) else {
            return;
        };
        let siblings: Vec<Rect> = self
            .document
            .shapes
            .iter()
            .filter(|s| s.id != id)
            .map(Shape::bounds)
            .collect();
        let Some(shape) = self.document.get_mut(id) else {
            self.drag = None;
            return;
        };
        shape.position = position;
        let result = snap_bounds(shape.bounds(), &siblings, SNAP_THRESHOLD);
        shape.position += result.correction;
        if let Some(drag) = &mut self.drag {
            drag.guides = result.guides;
        }
    }

    /// Guides for the in-progress drag, at most one per axis.
    pub fn active_guides(&self) -> &[Guideline] {
        self.drag.as_ref().map(|d| d.guides.as_slice()).unwrap_or(&[])
    }

    /// Commit the drag. Guides are discarded unconditionally.
    pub fn end_drag(&mut self) {
        if self.drag.take().is_some() {
            self.commit();
        }
    }

    /// Abandon the drag: restore the original position, discard guides.
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            if let Some(shape) = self.document.get_mut(drag.shape) {
                shape.position = drag.origin;
            }
        }
    }

    // --- History ---

    pub fn undo(&mut self) -> Result<(), SessionError> {
        let Some(snapshot) = self.history.undo() else {
            return Ok(());
        };
        self.apply_snapshot(&snapshot)?;
        self.publish(snapshot);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), SessionError> {
        let Some(snapshot) = self.history.redo() else {
            return Ok(());
        };
        self.apply_snapshot(&snapshot)?;
        self.publish(snapshot);
        Ok(())
    }

    pub fn is_history_empty(&self) -> bool {
        self.history.is_history_empty()
    }

    pub fn is_redo_empty(&self) -> bool {
        self.history.is_redo_empty()
    }

    // --- Persistence ---

    /// Save the document durably, with a thumbnail when the renderer can
    /// produce one. Failure leaves the local document and history intact.
    pub async fn save(&self) -> Result<(), SessionError> {
        use base64::{Engine, engine::general_purpose::STANDARD};

        let id = self.require_open()?;
        let thumbnail = self
            .renderer
            .thumbnail()
            .map(|png| format!("data:image/png;base64,{}", STANDARD.encode(png)));
        self.persistence
            .save(id, &self.document, thumbnail.as_deref())
            .await
            .map_err(SessionError::Save)
    }

    /// PNG export of the current view, when the renderer supports it.
    pub fn export_png(&self) -> Option<Vec<u8>> {
        self.renderer.thumbnail()
    }

    // --- Renderer notifications ---

    /// Entry point for renderer-driven mutation notifications (the user
    /// finished a direct manipulation in the view). Suppressed while a
    /// snapshot is being applied, so applying a state never re-records or
    /// re-broadcasts itself.
    pub fn notify_mutation(&mut self) {
        self.commit();
    }

    /// Load a snapshot into the document and renderer without recording
    /// it. On failure the snapshot is discarded, the previous document
    /// stays in place and the suppression flag is restored — the session
    /// keeps receiving its own mutation feed.
    pub fn apply_snapshot(&mut self, snapshot: &str) -> Result<(), SessionError> {
        self.suppress += 1;
        let result = self.apply_snapshot_inner(snapshot);
        self.suppress -= 1;
        result
    }

    fn apply_snapshot_inner(&mut self, snapshot: &str) -> Result<(), SessionError> {
        let document = SceneDocument::from_snapshot(snapshot)?;
        self.renderer.reload(&document)?;
        if let Some(selected) = self.selected {
            if document.get(selected).is_none() {
                self.selected = None;
            }
        }
        self.document = document;
        Ok(())
    }

    // --- Relay plumbing ---

    /// Handle one relay event. Remote snapshots are applied without
    /// re-recording, then recorded as new committed states — they join
    /// the local undo history and invalidate any pending redo.
    pub fn handle_relay_event(&mut self, event: RelayEvent) -> Result<(), SessionError> {
        match event {
            RelayEvent::Connected => {
                // (Re-)join on every connect so a reconnect fetches the
                // latest cached state.
                if let Some(document) = self.document_id.clone() {
                    self.outgoing.push(ClientMessage::JoinDocument { document });
                }
                Ok(())
            }
            RelayEvent::Disconnected => {
                log::info!("relay disconnected; editing continues locally");
                Ok(())
            }
            RelayEvent::State { document, snapshot }
            | RelayEvent::Update { document, snapshot } => {
                if self.document_id.as_deref() != Some(document.as_str()) {
                    return Ok(());
                }
                self.apply_snapshot(&snapshot)?;
                self.history.record(snapshot);
                Ok(())
            }
            RelayEvent::Error { message } => {
                log::warn!("relay error: {message}");
                Ok(())
            }
        }
    }

    /// Drain queued messages into the relay client and feed received
    /// events back in. With no connection, publishes are dropped and the
    /// session is effectively single-user until connectivity resumes.
    pub fn sync_with(&mut self, relay: &mut RelayClient) {
        for message in self.take_outgoing() {
            if let Err(e) = relay.send(&message) {
                log::debug!("relay unavailable, dropping message: {e}");
            }
        }
        for event in relay.poll_events() {
            if let Err(e) = self.handle_relay_event(event) {
                log::warn!("failed to apply relay event: {e}");
            }
        }
    }

    /// Take pending outgoing messages (drains the queue).
    pub fn take_outgoing(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    // --- Commit pipeline ---

    fn commit(&mut self) {
        if self.suppress > 0 {
            return;
        }
        let Some(document_id) = self.document_id.clone() else {
            return;
        };
        self.document.recompute_z_indices();
        let snapshot = match self.document.to_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("failed to serialize document: {e}");
                return;
            }
        };
        self.history.record(snapshot.clone());
        self.outgoing.push(ClientMessage::DocumentUpdate {
            document: document_id,
            snapshot,
        });
    }

    fn publish(&mut self, snapshot: String) {
        if let Some(document) = self.document_id.clone() {
            self.outgoing
                .push(ClientMessage::DocumentUpdate { document, snapshot });
        }
    }
}
