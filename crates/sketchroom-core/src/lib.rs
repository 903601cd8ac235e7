//! Sketchroom Core Library
//!
//! Scene document, edit history, alignment snapping and relay
//! synchronization for the Sketchroom collaborative canvas.

pub mod history;
pub mod layers;
pub mod scene;
pub mod session;
pub mod shapes;
pub mod snap;
pub mod storage;
pub mod sync;

pub use history::HistoryManager;
pub use layers::{LayerDirection, LayerEntry};
pub use scene::{DocumentError, PropertyValue, SceneDocument, ShapeField};
pub use session::{EditorSession, NullRenderer, RenderError, SceneRenderer, SessionError};
pub use shapes::{Ellipse, Image, Rectangle, Rgba, Shape, ShapeId, ShapeKind, Text};
pub use snap::{Axis, Guideline, SNAP_THRESHOLD, SnapResult, snap_bounds};
pub use sync::{ClientMessage, ConnectionState, RelayClient, RelayEvent, ServerMessage};
