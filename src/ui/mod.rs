/// UI building blocks
///
/// - Grid layout and visibility geometry (grid.rs)
/// - Full-size preview overlay (preview.rs)
pub mod grid;
pub mod preview;
