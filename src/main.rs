use chrono::Utc;
use iced::widget::{button, column, container, row, scrollable, text, Row};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use walkdir::WalkDir;

mod card;
mod config;
mod error;
mod state;
mod time_ago;

use card::{CardMessage, IssueCard, PhotoSettings};
use config::Config;
use state::catalog::{self, Catalog, InsertOutcome};
use state::data::Issue;

/// Issues read from an import folder, not yet in the catalog
#[derive(Debug, Clone, Default)]
struct ImportBatch {
    issues: Vec<Issue>,
    /// Records that did not match the issue shape
    rejected_count: usize,
    /// JSON files that could not be read or parsed at all
    unreadable_count: usize,
}

/// Outcome of writing an import batch into the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ImportSummary {
    imported_count: usize,
    skipped_count: usize,
    failed_count: usize,
}

/// Main application state
struct IssueBoard {
    /// The issue catalog
    catalog: Catalog,
    config: Config,
    /// One card per issue, newest first
    cards: Vec<IssueCard>,
    /// ID of the last clicked card
    selected: Option<String>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the "Import Folder" button
    ImportFolder,
    /// Background folder scan finished
    ImportComplete(ImportBatch),
    /// Message for the card of the issue with this ID
    Card(String, CardMessage),
    /// Periodic re-render so relative times stay current
    Tick,
}

impl IssueBoard {
    fn new() -> (Self, Task<Message>) {
        let config = Config::load();

        let (catalog, status) = match open_catalog(&config) {
            Ok(catalog) => (catalog, String::from("Ready.")),
            Err(e) => {
                error!("Cannot open the issue catalog: {}", e);
                // Keep the board usable; imports then live only for this session
                match Catalog::open_in_memory() {
                    Ok(catalog) => (catalog, format!("⚠️  Catalog unavailable ({}), using a temporary one.", e)),
                    Err(e) => panic!("SQLite is unusable: {}", e),
                }
            }
        };

        let mut board = IssueBoard {
            catalog,
            config,
            cards: Vec::new(),
            selected: None,
            status,
        };

        let task = board.reload();
        info!(
            "🏙️  Issue board initialized with {} issues from {}",
            board.catalog.issue_count().unwrap_or(0),
            board.catalog.path().display()
        );

        (board, task)
    }

    fn photo_settings(&self) -> PhotoSettings {
        PhotoSettings {
            max_dimension: self.config.photo_max_dimension,
            timeout: Duration::from_secs(self.config.request_timeout_secs),
        }
    }

    /// Re-read the catalog and remount cards whose issue changed
    fn reload(&mut self) -> Task<Message> {
        let issues = match self.catalog.get_all_issues() {
            Ok(issues) => issues,
            Err(e) => {
                error!("Failed to load issues: {}", e);
                self.status = format!("❌ Failed to load issues: {}", e);
                return Task::none();
            }
        };

        let (cards, task) = card::reconcile(
            std::mem::take(&mut self.cards),
            issues,
            self.photo_settings(),
        );
        self.cards = cards;

        task.map(|(id, message)| Message::Card(id, message))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ImportFolder => {
                let folder = FileDialog::new()
                    .set_title("Select Folder with Issue Exports")
                    .pick_folder();

                if let Some(folder_path) = folder {
                    self.status = format!("Importing from {}...", folder_path.display());
                    return Task::perform(
                        import_folder_async(folder_path),
                        Message::ImportComplete,
                    );
                }

                Task::none()
            }
            Message::ImportComplete(batch) => {
                let summary = apply_import(&self.catalog, &batch);

                self.status = format!(
                    "✅ Import complete! Added {} issues, skipped {} duplicates, rejected {}.",
                    summary.imported_count,
                    summary.skipped_count,
                    batch.rejected_count + batch.unreadable_count + summary.failed_count,
                );
                info!(
                    "📊 Import summary: {} new, {} skipped, {} rejected, {} unreadable files",
                    summary.imported_count,
                    summary.skipped_count,
                    batch.rejected_count + summary.failed_count,
                    batch.unreadable_count,
                );

                self.reload()
            }
            Message::Card(id, CardMessage::Clicked) => {
                if let Some(card) = self.cards.iter().find(|card| card.issue().id == id) {
                    info!("Issue {} selected", id);
                    self.status = format!("Selected: {}", card.issue().title);
                    self.selected = Some(id);
                }
                Task::none()
            }
            Message::Card(id, message) => {
                // Results for cards that were unmounted meanwhile are dropped
                if let Some(card) = self.cards.iter_mut().find(|card| card.issue().id == id) {
                    card.update(message);
                }
                Task::none()
            }
            Message::Tick => Task::none(),
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let now = Utc::now();

        let header = row![
            text("Civic Issues").size(32).width(Length::Fill),
            button("Import Folder")
                .on_press(Message::ImportFolder)
                .padding(10),
        ]
        .spacing(20)
        .align_y(Alignment::Center);

        let board: Element<Message> = if self.cards.is_empty() {
            container(text("No issues yet. Import a folder of issue exports to get started.").size(16))
                .width(Length::Fill)
                .center_x(Length::Fill)
                .padding(40)
                .into()
        } else {
            let cards: Vec<Element<Message>> = self
                .cards
                .iter()
                .map(|card| {
                    let id = card.issue().id.clone();
                    let selected = self.selected.as_deref() == Some(id.as_str());
                    card.view(now, selected)
                        .map(move |message| Message::Card(id.clone(), message))
                })
                .collect();

            // Cards flow left to right and break onto new lines
            scrollable(Row::with_children(cards).spacing(16).wrap())
                .height(Length::Fill)
                .into()
        };

        let content = column![header, text(&self.status).size(14), board]
            .spacing(20)
            .padding(32);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let every = Duration::from_secs(self.config.refresh_interval_secs.max(1));
        iced::time::every(every).map(|_| Message::Tick)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Light
    }
}

fn open_catalog(config: &Config) -> error::Result<Catalog> {
    let path = match &config.database_path {
        Some(path) => path.clone(),
        None => Catalog::default_path()?,
    };
    Catalog::open(path)
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "civic_issues=info".into()),
        )
        .init();

    iced::application("Civic Issues", IssueBoard::update, IssueBoard::view)
        .theme(IssueBoard::theme)
        .subscription(IssueBoard::subscription)
        .centered()
        .run_with(IssueBoard::new)
}

/// Scan a folder recursively for `*.json` issue exports.
/// Runs in the background so the board stays responsive.
async fn import_folder_async(folder_path: PathBuf) -> ImportBatch {
    let mut batch = ImportBatch::default();

    info!("🔍 Scanning folder: {}", folder_path.display());

    for entry in WalkDir::new(&folder_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let is_json = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if !is_json {
            continue;
        }

        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) => {
                warn!("⚠️  Cannot read {}: {}", path.display(), e);
                batch.unreadable_count += 1;
                continue;
            }
        };

        match catalog::parse_issue_export(&json) {
            Ok((issues, rejected)) => {
                batch.issues.extend(issues);
                batch.rejected_count += rejected;
            }
            Err(e) => {
                warn!("⚠️  Skipping {}: {}", path.display(), e);
                batch.unreadable_count += 1;
            }
        }
    }

    batch
}

/// Write a scanned batch into the catalog
fn apply_import(catalog: &Catalog, batch: &ImportBatch) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for issue in &batch.issues {
        match catalog.insert_issue(issue) {
            Ok(InsertOutcome::Inserted) => summary.imported_count += 1,
            Ok(InsertOutcome::Duplicate) => summary.skipped_count += 1,
            Err(e) => {
                error!("⚠️  Error importing issue {}: {}", issue.id, e);
                summary.failed_count += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn export(id: &str) -> String {
        format!(
            r#"{{
                "id": "{}",
                "title": "Broken bench",
                "description": "Slats missing",
                "category": "infrastructure",
                "status": "open",
                "priority": "low",
                "location": "Harbor Walk",
                "user_name": "Alex",
                "created_at": "2024-06-01T08:30:00Z",
                "photo_urls": []
            }}"#,
            id
        )
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("civic-issues-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("nested")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_import_folder_collects_json_exports() {
        let dir = scratch_dir("import");
        fs::write(dir.join("one.json"), export("i-1")).unwrap();
        fs::write(
            dir.join("nested").join("many.JSON"),
            format!("[{}, {}]", export("i-2"), export("i-3")),
        )
        .unwrap();
        fs::write(dir.join("broken.json"), "{ not json").unwrap();
        fs::write(dir.join("notes.txt"), export("i-4")).unwrap();

        let batch = import_folder_async(dir.clone()).await;

        let mut ids: Vec<String> = batch.issues.iter().map(|i| i.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["i-1", "i-2", "i-3"]);
        assert_eq!(batch.unreadable_count, 1);
        assert_eq!(batch.rejected_count, 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_apply_import_counts_duplicates() {
        let catalog = Catalog::open_in_memory().unwrap();
        let (issues, _) = catalog::parse_issue_export(&format!(
            "[{}, {}, {}]",
            export("a"),
            export("b"),
            export("a")
        ))
        .unwrap();
        let batch = ImportBatch { issues, ..ImportBatch::default() };

        let summary = apply_import(&catalog, &batch);
        assert_eq!(
            summary,
            ImportSummary { imported_count: 2, skipped_count: 1, failed_count: 0 }
        );
        assert_eq!(catalog.issue_count().unwrap(), 2);
    }
}
