pub mod config;
pub mod debounce;
pub mod gesture;
pub mod input;
pub mod rect_select;
pub mod selection;

pub use config::BatchSelectConfig;
pub use gesture::{BatchSelect, GesturePhase, TapTracker};
pub use input::{TouchEvent, TouchPhase, TouchTarget};
pub use rect_select::{ElementCache, RectSelection};
pub use selection::{SelectionListener, SelectionSnapshot, SelectionStore, SnapshotIds};
