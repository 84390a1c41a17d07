/// State management module
///
/// All mutable application state lives here, owned by the top-level view
/// and changed only through the named operations on `GalleryState`.
pub mod gallery;

pub use gallery::{GalleryState, LoadPhase, Tile};
