//! Selection: click picking, marquee dragging and top-level resolution

mod manager;
pub mod marquee;

pub use manager::{resolve_top_level, top_level_selectable, Selection, SelectionManager};
pub use marquee::{Marquee, ScreenRect};
