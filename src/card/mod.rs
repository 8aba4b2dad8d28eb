/// Issue card
///
/// Renders one issue as a clickable card: photo area with status and
/// priority badges, category icon, title, description, location,
/// reporter and a relative timestamp.
///
/// A card owns its photo state. It is created when the issue first
/// appears on the board and thrown away when the issue changes or
/// leaves; nothing is shared between cards.

pub mod photo;

use chrono::{DateTime, Utc};
use iced::alignment::{Horizontal, Vertical};
use iced::widget::image::Handle;
use iced::widget::{column, container, mouse_area, row, stack, text, Space};
use iced::{Background, Border, Color, ContentFit, Element, Font, Length, Shadow, Task, Theme, Vector};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::state::data::{BadgeStyle, Issue};
use crate::time_ago::time_ago;

const CARD_WIDTH: f32 = 320.0;
const PHOTO_HEIGHT: f32 = 192.0;
const TITLE_MAX_CHARS: usize = 80;
const DESCRIPTION_MAX_CHARS: usize = 140;

/// What the photo area of a card is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageDisplay {
    /// The issue has no photos
    NoImages,
    /// Showing (or loading) the photo at this index
    ShowingImage(usize),
    /// The selected photo failed to load; terminal for this card
    ImageFailed,
}

impl ImageDisplay {
    pub fn initial(photo_count: usize) -> Self {
        if photo_count == 0 {
            ImageDisplay::NoImages
        } else {
            ImageDisplay::ShowingImage(0)
        }
    }

    /// Record that the photo at `index` failed to load.
    /// Returns true if this moved the card into `ImageFailed`.
    pub fn fail(&mut self, index: usize) -> bool {
        match *self {
            ImageDisplay::ShowingImage(current) if current == index => {
                *self = ImageDisplay::ImageFailed;
                true
            }
            _ => false,
        }
    }
}

/// Fixed placeholder shown instead of a photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    NoImage,
    Unavailable,
}

impl Placeholder {
    pub fn icon(&self) -> &'static str {
        match self {
            Placeholder::NoImage => "📷",
            Placeholder::Unavailable => "🖼️",
        }
    }

    pub fn caption(&self) -> &'static str {
        match self {
            Placeholder::NoImage => "No image provided",
            Placeholder::Unavailable => "Image unavailable",
        }
    }
}

/// How photos are fetched, taken from the config
#[derive(Debug, Clone, Copy)]
pub struct PhotoSettings {
    pub max_dimension: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub enum CardMessage {
    /// The card surface was clicked; handled by the host
    Clicked,
    /// A photo fetch finished
    PhotoLoaded {
        index: usize,
        result: Result<Handle, String>,
    },
}

#[derive(Debug)]
pub struct IssueCard {
    issue: Issue,
    display: ImageDisplay,
    photo: Option<Handle>,
}

impl IssueCard {
    /// Mount a card and start loading its first photo
    pub fn new(issue: Issue, settings: PhotoSettings) -> (Self, Task<CardMessage>) {
        let display = ImageDisplay::initial(issue.photo_urls.len());
        let card = IssueCard { issue, display, photo: None };
        let task = card.load_current_photo(settings);
        (card, task)
    }

    fn load_current_photo(&self, settings: PhotoSettings) -> Task<CardMessage> {
        let ImageDisplay::ShowingImage(index) = self.display else {
            return Task::none();
        };
        let Some(url) = self.issue.photo_urls.get(index).cloned() else {
            return Task::none();
        };

        Task::perform(
            photo::load_photo(url, settings.max_dimension, settings.timeout),
            move |result| CardMessage::PhotoLoaded {
                index,
                result: result.map_err(|e| e.to_string()),
            },
        )
    }

    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    pub fn display(&self) -> ImageDisplay {
        self.display
    }

    pub fn update(&mut self, message: CardMessage) {
        match message {
            CardMessage::Clicked => {}
            CardMessage::PhotoLoaded { index, result } => match result {
                Ok(handle) => {
                    if self.display == ImageDisplay::ShowingImage(index) {
                        self.photo = Some(handle);
                    }
                }
                Err(e) => {
                    if self.display.fail(index) {
                        self.photo = None;
                        warn!(
                            "⚠️  Photo {} of issue {} failed to load: {}",
                            index, self.issue.id, e
                        );
                    }
                }
            },
        }
    }

    /// "{i+1} / {n}" while showing photo i of several
    pub fn index_badge(&self) -> Option<String> {
        let count = self.issue.photo_urls.len();
        match self.display {
            ImageDisplay::ShowingImage(index) if count > 1 => {
                Some(format!("{} / {}", index + 1, count))
            }
            _ => None,
        }
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        match self.display {
            ImageDisplay::NoImages => Some(Placeholder::NoImage),
            ImageDisplay::ImageFailed => Some(Placeholder::Unavailable),
            ImageDisplay::ShowingImage(_) => None,
        }
    }

    /// `selected` outlines the card the user last clicked
    pub fn view(&self, now: DateTime<Utc>, selected: bool) -> Element<'_, CardMessage> {
        let issue = &self.issue;

        let heading = row![
            text(issue.category.icon()).size(24),
            column![
                text(truncate(&issue.title, TITLE_MAX_CHARS))
                    .size(18)
                    .font(Font { weight: iced::font::Weight::Bold, ..Font::DEFAULT })
                    .color(Color::from_rgb8(0x1e, 0x3a, 0x8a)),
                text(issue.category.label()).size(13).color(MUTED),
            ]
            .spacing(4)
            .width(Length::Fill),
        ]
        .spacing(12);

        let details = column![
            detail_line("📍", truncate(&issue.location, 48)),
            detail_line("👤", issue.user_name.clone()),
            detail_line("🕒", time_ago(issue.created_at, now)),
        ]
        .spacing(8);

        let body = column![
            heading,
            text(truncate(&issue.description, DESCRIPTION_MAX_CHARS))
                .size(14)
                .color(Color::from_rgb8(0x40, 0x40, 0x40)),
            details,
        ]
        .spacing(14)
        .padding(24);

        let card = container(column![self.photo_area(), body])
            .width(Length::Fixed(CARD_WIDTH))
            .style(move |_theme: &Theme| card_style(selected));

        mouse_area(card).on_press(CardMessage::Clicked).into()
    }

    fn photo_area(&self) -> Element<'_, CardMessage> {
        let base: Element<'_, CardMessage> = match (self.placeholder(), &self.photo) {
            (Some(placeholder), _) => placeholder_surface(placeholder),
            (None, Some(handle)) => iced::widget::image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Cover)
                .into(),
            // Still loading
            (None, None) => container(Space::new(Length::Fill, Length::Fill))
                .style(|_theme: &Theme| surface(Color::from_rgb8(0xe5, 0xe5, 0xe5)))
                .into(),
        };

        let badges = container(
            row![
                badge(self.issue.status.label(), self.issue.status.badge()),
                badge(self.issue.priority.label().to_string(), self.issue.priority.badge()),
            ]
            .spacing(8),
        )
        .width(Length::Fill)
        .align_x(Horizontal::Right)
        .padding(16);

        let mut layers = stack![base, badges];

        if let Some(index_text) = self.index_badge() {
            let pill = container(text(format!("📷 {}", index_text)).size(12).color(Color::WHITE))
                .padding([6, 12])
                .style(|_theme: &Theme| container::Style {
                    background: Some(Background::Color(Color::from_rgba(0.0, 0.0, 0.0, 0.5))),
                    border: pill_border(),
                    ..container::Style::default()
                });

            layers = layers.push(
                container(pill)
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .align_y(Vertical::Bottom)
                    .padding(16),
            );
        }

        container(layers)
            .width(Length::Fill)
            .height(Length::Fixed(PHOTO_HEIGHT))
            .into()
    }
}

/// Rebuild the card list for a fresh set of issues.
///
/// Cards whose issue is unchanged keep their state; new or changed issues
/// get a freshly mounted card. The returned task carries the photo loads
/// of the new cards, tagged with their issue ID.
pub fn reconcile(
    old_cards: Vec<IssueCard>,
    issues: Vec<Issue>,
    settings: PhotoSettings,
) -> (Vec<IssueCard>, Task<(String, CardMessage)>) {
    let mut existing: HashMap<String, IssueCard> = old_cards
        .into_iter()
        .map(|card| (card.issue.id.clone(), card))
        .collect();

    let mut cards = Vec::with_capacity(issues.len());
    let mut tasks = Vec::new();

    for issue in issues {
        match existing.remove(&issue.id) {
            Some(card) if card.issue == issue => cards.push(card),
            _ => {
                debug!("Mounting card for issue {}", issue.id);
                let id = issue.id.clone();
                let (card, task) = IssueCard::new(issue, settings);
                tasks.push(task.map(move |message| (id.clone(), message)));
                cards.push(card);
            }
        }
    }

    (cards, Task::batch(tasks))
}

/// Cut `value` to at most `max_chars` characters, marking the cut with an ellipsis
pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let kept: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}

const MUTED: Color = Color::from_rgb(0.32, 0.32, 0.32);

fn detail_line<'a>(icon: &'a str, value: String) -> Element<'a, CardMessage> {
    row![text(icon).size(14), text(value).size(14).color(MUTED)]
        .spacing(8)
        .into()
}

fn badge<'a>(label: String, style: BadgeStyle) -> Element<'a, CardMessage> {
    container(text(label).size(12).color(style.text))
        .padding([4, 12])
        .style(move |_theme: &Theme| container::Style {
            background: Some(Background::Color(style.background)),
            border: pill_border(),
            ..container::Style::default()
        })
        .into()
}

fn placeholder_surface<'a>(placeholder: Placeholder) -> Element<'a, CardMessage> {
    let background = match placeholder {
        Placeholder::NoImage => Color::from_rgb8(0xdb, 0xea, 0xfe),
        Placeholder::Unavailable => Color::from_rgb8(0xd4, 0xd4, 0xd4),
    };

    container(
        column![
            text(placeholder.icon()).size(40),
            text(placeholder.caption()).size(12).color(MUTED),
        ]
        .spacing(8)
        .align_x(iced::Alignment::Center),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .align_x(Horizontal::Center)
    .align_y(Vertical::Center)
    .style(move |_theme: &Theme| surface(background))
    .into()
}

fn surface(color: Color) -> container::Style {
    container::Style {
        background: Some(Background::Color(color)),
        ..container::Style::default()
    }
}

fn pill_border() -> Border {
    Border {
        radius: 999.0.into(),
        ..Border::default()
    }
}

fn card_style(selected: bool) -> container::Style {
    let border_color = if selected {
        Color::from_rgb8(0x25, 0x63, 0xeb)
    } else {
        Color::TRANSPARENT
    };

    container::Style {
        background: Some(Background::Color(Color::from_rgba(1.0, 1.0, 1.0, 0.9))),
        border: Border {
            color: border_color,
            width: 2.0,
            radius: 12.0.into(),
        },
        shadow: Shadow {
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.15),
            offset: Vector::new(0.0, 4.0),
            blur_radius: 12.0,
        },
        ..container::Style::default()
    }
}
