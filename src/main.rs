use iced::widget::{button, column, container, row, scrollable, text, text_input};
use iced::{Element, Length, Rectangle, Size, Subscription, Task, Theme};

mod fetch;
mod listing;
mod state;
mod ui;

use fetch::{FetchError, LoadedImage};
use listing::ImageRecord;
use state::GalleryState;

/// Initial window size; also seeds the viewport estimate at startup
const WINDOW_SIZE: Size = Size::new(1100.0, 800.0);

/// Estimated height of the header (title, form, status line) above the
/// grid. Used to size the visibility window until the first scroll event
/// reports the scrollable's real geometry.
const HEADER_HEIGHT: f32 = 160.0;

/// Main application state
struct Gallery {
    /// Contents of the URL input field
    input_url: String,
    /// Status line shown under the form
    status: String,
    /// Submission lock: true while a listing fetch is in flight
    fetching: bool,
    /// Tiles, preview selection, and submission generation
    state: GalleryState,
    /// Vertical scroll offset of the grid, in content coordinates
    scroll_offset: f32,
    /// Size of the visible grid area (estimated until the first scroll)
    viewport_size: Size,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User edited the URL field
    UrlChanged(String),
    /// User submitted the form
    Submit,
    /// Listing fetch for the stamped generation finished
    ListingFetched(u64, Result<Vec<ImageRecord>, FetchError>),
    /// The grid scrollable moved or was resized
    GridScrolled(scrollable::Viewport),
    /// The window was resized
    WindowResized(Size),
    /// Image fetch for one tile of the stamped generation finished
    ImageLoaded(u64, usize, Result<LoadedImage, FetchError>),
    /// User clicked a loaded tile
    OpenPreview(usize),
    /// User clicked the preview backdrop
    ClosePreview,
}

impl Gallery {
    fn new() -> (Self, Task<Message>) {
        (
            Gallery {
                input_url: String::new(),
                status: String::from("Paste a bucket listing URL to get started."),
                fetching: false,
                state: GalleryState::new(),
                scroll_offset: 0.0,
                viewport_size: Size::new(WINDOW_SIZE.width, WINDOW_SIZE.height - HEADER_HEIGHT),
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::UrlChanged(url) => {
                self.input_url = url;
                Task::none()
            }
            Message::Submit => {
                if self.fetching || self.input_url.trim().is_empty() {
                    return Task::none();
                }
                self.fetching = true;
                self.status = String::from("Fetching listing...");
                self.scroll_offset = 0.0;

                let generation = self.state.begin_submission();
                let url = self.input_url.trim().to_string();
                Task::perform(fetch::load_listing(url), move |result| {
                    Message::ListingFetched(generation, result)
                })
            }
            Message::ListingFetched(generation, result) => {
                if generation != self.state.generation() {
                    // A newer submission owns the UI now
                    return Task::none();
                }
                self.fetching = false;
                match result {
                    Ok(records) => {
                        let count = records.len();
                        self.state.accept_listing(generation, records);
                        if count == 0 {
                            self.status =
                                String::from("No images found in the provided listing.");
                            Task::none()
                        } else {
                            println!("🖼️  Resolved {} images from listing", count);
                            self.status =
                                format!("Showing {} images, most recent first.", count);
                            self.sweep_visibility()
                        }
                    }
                    Err(e) => {
                        eprintln!("⚠️  Listing fetch failed: {}", e);
                        self.status =
                            String::from("Failed to fetch or parse the bucket listing.");
                        Task::none()
                    }
                }
            }
            Message::GridScrolled(viewport) => {
                self.scroll_offset = viewport.absolute_offset().y;
                self.viewport_size = viewport.bounds().size();
                self.sweep_visibility()
            }
            Message::WindowResized(size) => {
                self.viewport_size =
                    Size::new(size.width, (size.height - HEADER_HEIGHT).max(0.0));
                self.sweep_visibility()
            }
            Message::ImageLoaded(generation, index, result) => {
                match result {
                    Ok(image) => {
                        self.state.complete_load(generation, index, image);
                    }
                    Err(e) => {
                        // No error tile: the placeholder keeps its indicator
                        eprintln!("⚠️  Image load failed: {}", e);
                    }
                }
                Task::none()
            }
            Message::OpenPreview(index) => {
                self.state.open_preview(index);
                Task::none()
            }
            Message::ClosePreview => {
                self.state.close_preview();
                Task::none()
            }
        }
    }

    /// Trigger loads for pending tiles that crossed the visibility
    /// threshold, given the current scroll offset and viewport estimate
    fn sweep_visibility(&mut self) -> Task<Message> {
        let columns = ui::grid::columns_for_width(self.viewport_size.width);
        let window = Rectangle {
            x: 0.0,
            y: self.scroll_offset,
            width: self.viewport_size.width,
            height: self.viewport_size.height,
        };
        let generation = self.state.generation();

        let loads: Vec<Task<Message>> = ui::grid::newly_visible(self.state.tiles(), columns, window)
            .into_iter()
            .filter_map(|index| {
                let url = self.state.mark_triggered(index)?;
                Some(Task::perform(fetch::load_image(url), move |result| {
                    Message::ImageLoaded(generation, index, result)
                }))
            })
            .collect();

        Task::batch(loads)
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let can_submit = !self.fetching && !self.input_url.trim().is_empty();

        let mut url_field = text_input("Paste your bucket listing URL (XML)", &self.input_url)
            .on_input(Message::UrlChanged)
            .padding(10);
        if can_submit {
            url_field = url_field.on_submit(Message::Submit);
        }

        let submit = button(text(if self.fetching { "Loading..." } else { "Show Gallery" }))
            .on_press_maybe(can_submit.then_some(Message::Submit))
            .padding(10);

        let header = column![
            text("S3 Image Gallery").size(32),
            row![url_field, submit].spacing(10),
            text(&self.status).size(14),
        ]
        .spacing(12);

        let columns = ui::grid::columns_for_width(self.viewport_size.width);
        let grid = scrollable(ui::grid::view(self.state.tiles(), columns))
            .on_scroll(Message::GridScrolled)
            .width(Length::Fill)
            .height(Length::Fill);

        let base: Element<'_, Message> = container(column![header, grid].spacing(10))
            .padding(20)
            .width(Length::Fill)
            .height(Length::Fill)
            .into();

        match self.state.preview() {
            Some(selected) => ui::preview::overlay(base, selected),
            None => base,
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::window::resize_events().map(|(_id, size)| Message::WindowResized(size))
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    iced::application("S3 Image Gallery", Gallery::update, Gallery::view)
        .subscription(Gallery::subscription)
        .theme(Gallery::theme)
        .window_size(WINDOW_SIZE)
        .centered()
        .run_with(Gallery::new)
}
