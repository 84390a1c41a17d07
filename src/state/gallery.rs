use crate::fetch::LoadedImage;
use crate::listing::ImageRecord;

/// Lazy-activation state machine for one grid tile.
///
/// Strictly one-way: `Pending` → `Triggered` → `Loaded`. A tile whose load
/// fails simply stays `Triggered`, indicator showing; there is no error
/// state and nothing ever goes back to `Pending`.
#[derive(Debug, Clone)]
pub enum LoadPhase {
    /// Placeholder mounted, image bytes not yet requested
    Pending,
    /// Tile crossed the visibility threshold; a fetch is (or was) in flight
    Triggered,
    /// Image decoded and ready to draw at its natural size
    Loaded(LoadedImage),
}

/// One grid cell: an image record plus its load phase
#[derive(Debug, Clone)]
pub struct Tile {
    pub record: ImageRecord,
    pub phase: LoadPhase,
}

/// The whole gallery: current tiles, preview selection, and the submission
/// generation used to discard results from superseded submissions.
#[derive(Debug, Default)]
pub struct GalleryState {
    tiles: Vec<Tile>,
    preview: Option<usize>,
    generation: u64,
}

impl GalleryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new submission cycle: clears the current tiles and preview
    /// and returns the new generation. Async completions stamped with an
    /// older generation are rejected by `accept_listing`/`complete_load`.
    pub fn begin_submission(&mut self) -> u64 {
        self.generation += 1;
        self.tiles.clear();
        self.preview = None;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Install freshly resolved records as pending tiles.
    /// Returns false (and changes nothing) if `generation` is stale.
    pub fn accept_listing(&mut self, generation: u64, records: Vec<ImageRecord>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.tiles = records
            .into_iter()
            .map(|record| Tile {
                record,
                phase: LoadPhase::Pending,
            })
            .collect();
        self.preview = None;
        true
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// One-shot trigger: moves a `Pending` tile to `Triggered` and returns
    /// the URL to fetch. Any other phase (already triggered, already loaded,
    /// index out of range) is a no-op returning `None`.
    pub fn mark_triggered(&mut self, index: usize) -> Option<String> {
        let tile = self.tiles.get_mut(index)?;
        match tile.phase {
            LoadPhase::Pending => {
                tile.phase = LoadPhase::Triggered;
                Some(tile.record.url.clone())
            }
            _ => None,
        }
    }

    /// Record a finished image load. Ignored when the generation is stale or
    /// the tile is not waiting on a load.
    pub fn complete_load(&mut self, generation: u64, index: usize, image: LoadedImage) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.tiles.get_mut(index) {
            Some(tile) if matches!(tile.phase, LoadPhase::Triggered) => {
                tile.phase = LoadPhase::Loaded(image);
                true
            }
            _ => false,
        }
    }

    /// Select a tile for full-size preview, replacing any current selection.
    /// Only loaded tiles can be previewed.
    pub fn open_preview(&mut self, index: usize) {
        if matches!(
            self.tiles.get(index).map(|t| &t.phase),
            Some(LoadPhase::Loaded(_))
        ) {
            self.preview = Some(index);
        }
    }

    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    /// The currently previewed image, if any
    pub fn preview(&self) -> Option<&LoadedImage> {
        let index = self.preview?;
        match &self.tiles.get(index)?.phase {
            LoadPhase::Loaded(image) => Some(image),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use iced::widget::image::Handle;

    fn record(url: &str) -> ImageRecord {
        ImageRecord {
            url: url.to_string(),
            last_modified: DateTime::UNIX_EPOCH,
        }
    }

    fn pixel() -> LoadedImage {
        LoadedImage {
            handle: Handle::from_rgba(1, 1, vec![0, 0, 0, 255]),
            width: 1,
            height: 1,
        }
    }

    fn gallery_with(urls: &[&str]) -> (GalleryState, u64) {
        let mut state = GalleryState::new();
        let generation = state.begin_submission();
        assert!(state.accept_listing(generation, urls.iter().map(|u| record(u)).collect()));
        (state, generation)
    }

    #[test]
    fn trigger_is_one_shot() {
        let (mut state, _) = gallery_with(&["https://x/a.png"]);
        assert_eq!(state.mark_triggered(0).as_deref(), Some("https://x/a.png"));
        // Second visibility event for the same tile does nothing
        assert_eq!(state.mark_triggered(0), None);
        assert_eq!(state.mark_triggered(7), None);
    }

    #[test]
    fn stale_listing_is_discarded() {
        let mut state = GalleryState::new();
        let first = state.begin_submission();
        let second = state.begin_submission();

        // The slow first fetch resolves after the second submission started
        assert!(!state.accept_listing(first, vec![record("https://x/old.png")]));
        assert!(state.is_empty());

        assert!(state.accept_listing(second, vec![record("https://x/new.png")]));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn stale_image_load_is_discarded() {
        let (mut state, generation) = gallery_with(&["https://x/a.png"]);
        state.mark_triggered(0);

        let newer = state.begin_submission();
        assert!(!state.complete_load(generation, 0, pixel()));

        assert!(state.accept_listing(newer, vec![record("https://x/b.png")]));
        state.mark_triggered(0);
        assert!(state.complete_load(newer, 0, pixel()));
    }

    #[test]
    fn load_requires_a_triggered_tile() {
        let (mut state, generation) = gallery_with(&["https://x/a.png"]);
        // Still pending: nothing requested this image
        assert!(!state.complete_load(generation, 0, pixel()));

        state.mark_triggered(0);
        assert!(state.complete_load(generation, 0, pixel()));
        // Terminal: a second completion is ignored
        assert!(!state.complete_load(generation, 0, pixel()));
    }

    #[test]
    fn preview_holds_at_most_one_loaded_tile() {
        let (mut state, generation) = gallery_with(&["https://x/a.png", "https://x/b.png"]);

        // Not loaded yet: opening is a no-op
        state.open_preview(0);
        assert!(state.preview().is_none());

        state.mark_triggered(0);
        state.complete_load(generation, 0, pixel());
        state.open_preview(0);
        assert!(state.preview().is_some());

        // Opening another replaces, closing clears
        state.mark_triggered(1);
        state.complete_load(generation, 1, pixel());
        state.open_preview(1);
        assert!(state.preview().is_some());
        state.close_preview();
        assert!(state.preview().is_none());
    }

    #[test]
    fn new_submission_clears_tiles_and_preview() {
        let (mut state, generation) = gallery_with(&["https://x/a.png"]);
        state.mark_triggered(0);
        state.complete_load(generation, 0, pixel());
        state.open_preview(0);

        state.begin_submission();
        assert!(state.is_empty());
        assert!(state.preview().is_none());
    }
}
