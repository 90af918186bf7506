use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use url::Url;

use crate::classifier::{classify_file, format_result, Classifier};
use crate::db::HistoryStore;
use crate::error::{AppError, Result};
use crate::models::{
    ArticleSummary, Category, ClassificationStatus, HistoryRecord, NewHistoryRecord,
};
use crate::news::HeadlineFetcher;
use crate::tui::AppAction;

pub const SAVE_OK: &str = "Data saved successfully!";
pub const SAVE_FAILED: &str = "Failed to save data. Please try again.";
pub const NO_IMAGE: &str = "No image selected. Press 'p' to pick one.";
pub const NO_CLASSIFIER: &str = "No classifier configured. Set classifier_command in config.toml.";
pub const HEADLINES_FAILED: &str = "Could not load headlines.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Home,
    Articles,
    History,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Home, Tab::Articles, Tab::History];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Articles => "Articles",
            Tab::History => "History",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Home => 0,
            Tab::Articles => 1,
            Tab::History => 2,
        }
    }

    pub fn next(&self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

// Message for a finished classification
pub struct ClassificationResult {
    pub image: PathBuf,
    pub result: std::result::Result<Vec<Category>, String>,
}

// Message for a finished headline fetch
pub struct HeadlineResult {
    pub request_id: u64,
    pub result: std::result::Result<Vec<ArticleSummary>, String>,
}

pub struct App {
    pub tab: Tab,
    pub show_help: bool,
    pub notice: Option<String>,

    // Home
    pub image_input_active: bool,
    pub image_input: String,
    pub current_image: Option<PathBuf>,
    pub categories: Vec<Category>,
    pub result_label: Option<String>,
    pub classification_status: ClassificationStatus,

    // Articles
    pub articles: Vec<ArticleSummary>,
    pub is_fetching_headlines: bool,
    headline_request_id: u64,

    // History
    pub history: Vec<HistoryRecord>,

    pub selected_index: usize,

    classification_rx: mpsc::Receiver<ClassificationResult>,
    classification_tx: mpsc::Sender<ClassificationResult>,
    headline_rx: mpsc::Receiver<HeadlineResult>,
    headline_tx: mpsc::Sender<HeadlineResult>,

    // Services
    store: HistoryStore,
    fetcher: Arc<HeadlineFetcher>,
    classifier: Option<Arc<dyn Classifier>>,
    max_image_side: u32,
}

impl App {
    pub fn new(
        store: HistoryStore,
        fetcher: HeadlineFetcher,
        classifier: Option<Arc<dyn Classifier>>,
        max_image_side: u32,
    ) -> Self {
        let (classification_tx, classification_rx) = mpsc::channel(1);
        let (headline_tx, headline_rx) = mpsc::channel(1);

        Self {
            tab: Tab::Home,
            show_help: false,
            notice: None,
            image_input_active: false,
            image_input: String::new(),
            current_image: None,
            categories: Vec::new(),
            result_label: None,
            classification_status: ClassificationStatus::Idle,
            articles: Vec::new(),
            is_fetching_headlines: false,
            headline_request_id: 0,
            history: Vec::new(),
            selected_index: 0,
            classification_rx,
            classification_tx,
            headline_rx,
            headline_tx,
            store,
            fetcher: Arc::new(fetcher),
            classifier,
            max_image_side,
        }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    fn list_len(&self) -> usize {
        match self.tab {
            Tab::Home => self.categories.len(),
            Tab::Articles => self.articles.len(),
            Tab::History => self.history.len(),
        }
    }

    pub fn selected_article(&self) -> Option<&ArticleSummary> {
        self.articles.get(self.selected_index)
    }

    pub fn selected_record(&self) -> Option<&HistoryRecord> {
        self.history.get(self.selected_index)
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        // Notices live until the next keypress
        self.notice = None;

        match action {
            AppAction::Quit => return Ok(true),

            AppAction::NextTab => self.switch_tab(self.tab.next()).await?,
            AppAction::PrevTab => self.switch_tab(self.tab.prev()).await?,
            AppAction::ShowTab(tab) => self.switch_tab(tab).await?,

            AppAction::MoveUp => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }

            AppAction::MoveDown => {
                let len = self.list_len();
                if len > 0 && self.selected_index < len - 1 {
                    self.selected_index += 1;
                }
            }

            AppAction::PickImage => {
                self.image_input_active = true;
                self.image_input.clear();
            }

            AppAction::ImageInputChar(c) => {
                self.image_input.push(c);
            }

            AppAction::ImageInputBackspace => {
                self.image_input.pop();
            }

            AppAction::ImageInputConfirm => {
                let input = self.image_input.trim().to_string();
                self.image_input_active = false;
                self.image_input.clear();
                self.select_image(&input);
            }

            AppAction::ImageInputCancel => {
                self.image_input_active = false;
                self.image_input.clear();
            }

            AppAction::Analyze => {
                self.start_classification();
            }

            AppAction::SaveResult => {
                self.save_result().await;
            }

            AppAction::Reload => match self.tab {
                Tab::Home => {}
                Tab::Articles => self.start_headline_fetch(),
                Tab::History => self.reload_history().await?,
            },

            AppAction::OpenSelected => {
                let target = match self.tab {
                    Tab::Home => None,
                    Tab::Articles => self.selected_article().and_then(|a| a.url.clone()),
                    Tab::History => self.selected_record().map(|r| r.image_location.clone()),
                };
                if let Some(target) = target {
                    if let Err(e) = open::that(&target) {
                        tracing::warn!("Failed to open {}: {}", target, e);
                        self.notice = Some(format!("Could not open {}", target));
                    }
                }
            }

            AppAction::DeleteSelected => {
                if self.tab == Tab::History {
                    self.delete_selected().await?;
                }
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }
        }

        Ok(false)
    }

    async fn switch_tab(&mut self, tab: Tab) -> Result<()> {
        if tab == self.tab {
            return Ok(());
        }
        self.tab = tab;
        self.selected_index = 0;

        match tab {
            Tab::Home => {}
            Tab::Articles => self.start_headline_fetch(),
            Tab::History => self.reload_history().await?,
        }
        Ok(())
    }

    fn select_image(&mut self, input: &str) {
        if input.is_empty() {
            return;
        }
        match std::fs::canonicalize(input) {
            Ok(path) => {
                self.current_image = Some(path);
                self.categories.clear();
                self.result_label = None;
                self.classification_status = ClassificationStatus::Idle;
            }
            Err(e) => {
                tracing::debug!("Rejected image path {}: {}", input, e);
                self.notice = Some(format!("Invalid image path: {}", input));
            }
        }
    }

    fn start_classification(&mut self) {
        let Some(image) = self.current_image.clone() else {
            self.notice = Some(NO_IMAGE.to_string());
            return;
        };

        let Some(classifier) = &self.classifier else {
            self.notice = Some(NO_CLASSIFIER.to_string());
            return;
        };

        self.classification_status = ClassificationStatus::Running;
        self.categories.clear();
        self.result_label = None;

        let classifier = Arc::clone(classifier);
        let max_side = self.max_image_side;
        let tx = self.classification_tx.clone();

        tokio::spawn(async move {
            let path = image.clone();
            let result = tokio::task::spawn_blocking(move || {
                classify_file(classifier.as_ref(), &path, max_side)
            })
            .await;

            let result = match result {
                Ok(Ok(categories)) => Ok(categories),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("classifier task failed: {}", e)),
            };

            let _ = tx.send(ClassificationResult { image, result }).await;
        });
    }

    /// Poll for a finished classification (non-blocking)
    pub fn poll_classification_result(&mut self) {
        if let Ok(result) = self.classification_rx.try_recv() {
            // A newer image was picked while this one was running
            if self.current_image.as_ref() != Some(&result.image) {
                return;
            }
            match result.result {
                Ok(categories) => {
                    self.result_label = categories.first().map(format_result);
                    self.categories = categories;
                    self.classification_status = ClassificationStatus::Done;
                }
                Err(e) => {
                    tracing::error!("Classification failed: {}", e);
                    self.classification_status = ClassificationStatus::Failed;
                    self.notice = Some(format!("Error: {}", e));
                }
            }
        }
    }

    async fn save_result(&mut self) {
        let (Some(image), Some(label)) = (&self.current_image, &self.result_label) else {
            self.notice = Some(SAVE_FAILED.to_string());
            return;
        };

        let record = NewHistoryRecord::new(image_location(image), label.clone());
        match self.store.insert(record).await {
            Ok(id) => {
                tracing::info!("Saved classification as history record {}", id);
                self.notice = Some(SAVE_OK.to_string());
            }
            Err(e) => {
                tracing::error!("Failed to save history: {}", e);
                self.notice = Some(SAVE_FAILED.to_string());
            }
        }
    }

    fn start_headline_fetch(&mut self) {
        self.headline_request_id += 1;
        self.is_fetching_headlines = true;

        let request_id = self.headline_request_id;
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.headline_tx.clone();

        tokio::spawn(async move {
            let result = fetcher.fetch_headlines().await.map_err(|e| e.to_string());
            let _ = tx.send(HeadlineResult { request_id, result }).await;
        });
    }

    /// Poll for a finished headline fetch (non-blocking)
    pub fn poll_headline_result(&mut self) {
        if let Ok(result) = self.headline_rx.try_recv() {
            if result.request_id != self.headline_request_id {
                return;
            }
            self.is_fetching_headlines = false;
            match result.result {
                Ok(articles) => {
                    self.articles = articles;
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch headlines: {}", e);
                    self.articles.clear();
                    self.notice = Some(HEADLINES_FAILED.to_string());
                }
            }
            if self.tab == Tab::Articles {
                self.clamp_selection();
            }
        }
    }

    async fn reload_history(&mut self) -> Result<()> {
        match self.store.list_all().await {
            Ok(records) => self.history = records,
            Err(e) => {
                tracing::error!("Failed to load history: {}", e);
                self.notice = Some("Could not load history.".to_string());
            }
        }
        self.clamp_selection();
        Ok(())
    }

    async fn delete_selected(&mut self) -> Result<()> {
        let Some(id) = self.selected_record().map(|r| r.id) else {
            return Ok(());
        };

        match self.store.delete(id).await {
            Ok(()) | Err(AppError::NotFound(_)) => {
                self.history.retain(|r| r.id != id);
                self.clamp_selection();
            }
            Err(e) => {
                tracing::error!("Failed to delete history record {}: {}", id, e);
                self.notice = Some("Failed to delete record.".to_string());
            }
        }
        Ok(())
    }

    fn clamp_selection(&mut self) {
        let len = self.list_len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }
}

/// The string stored as a record's image location: a `file://` URI when the
/// path is absolute, the plain path otherwise.
pub fn image_location(path: &Path) -> String {
    Url::from_file_path(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::Category;
    use image::{DynamicImage, RgbImage};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixed;

    impl Classifier for Fixed {
        fn classify(&self, _image: &DynamicImage) -> Result<Vec<Category>> {
            Ok(vec![
                Category {
                    label: "Cancer".to_string(),
                    score: 0.075,
                },
                Category {
                    label: "Benign".to_string(),
                    score: 0.925,
                },
            ])
        }
    }

    /// Holds every classification until the test sends on the paired channel.
    struct Gated(Mutex<std::sync::mpsc::Receiver<()>>);

    impl Classifier for Gated {
        fn classify(&self, _image: &DynamicImage) -> Result<Vec<Category>> {
            let _ = self.0.lock().unwrap().recv();
            Ok(vec![Category {
                label: "Benign".to_string(),
                score: 0.9,
            }])
        }
    }

    async fn app_with(classifier: Option<Arc<dyn Classifier>>) -> App {
        app_with_news(classifier, "http://127.0.0.1:9").await
    }

    async fn app_with_news(classifier: Option<Arc<dyn Classifier>>, news_api_base: &str) -> App {
        let store = HistoryStore::open_in_memory().await.unwrap();
        let config = Config {
            news_api_base: news_api_base.to_string(),
            ..Config::default()
        };
        let fetcher = HeadlineFetcher::new(&config).unwrap();
        App::new(store, fetcher, classifier, 1080)
    }

    fn headline(title: &str) -> ArticleSummary {
        ArticleSummary {
            title: Some(title.to_string()),
            description: None,
            image_url: None,
            url: None,
            source_name: None,
            published_at: None,
        }
    }

    async fn wait_for_classification(app: &mut App) {
        for _ in 0..200 {
            app.poll_classification_result();
            if app.classification_status != ClassificationStatus::Running {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("classification did not finish");
    }

    async fn pick(app: &mut App, path: &Path) {
        app.handle_action(AppAction::PickImage).await.unwrap();
        for c in path.to_str().unwrap().chars() {
            app.handle_action(AppAction::ImageInputChar(c)).await.unwrap();
        }
        app.handle_action(AppAction::ImageInputConfirm).await.unwrap();
    }

    #[tokio::test]
    async fn result_for_replaced_image_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.png");
        let second = dir.path().join("second.png");
        RgbImage::new(4, 4).save(&first).unwrap();
        RgbImage::new(4, 4).save(&second).unwrap();

        let (release, gate) = std::sync::mpsc::channel();
        let mut app = app_with(Some(Arc::new(Gated(Mutex::new(gate))))).await;

        pick(&mut app, &first).await;
        app.handle_action(AppAction::Analyze).await.unwrap();
        assert_eq!(app.classification_status, ClassificationStatus::Running);

        pick(&mut app, &second).await;
        assert_eq!(app.classification_status, ClassificationStatus::Idle);
        release.send(()).unwrap();

        // Wait for the first image's result, then hand it to the poller
        let late = tokio::time::timeout(Duration::from_secs(5), app.classification_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(late.image, std::fs::canonicalize(&first).unwrap());
        app.classification_tx.send(late).await.unwrap();
        app.poll_classification_result();

        assert_eq!(app.classification_status, ClassificationStatus::Idle);
        assert!(app.result_label.is_none());
        assert!(app.categories.is_empty());
        assert_eq!(app.current_image, Some(std::fs::canonicalize(&second).unwrap()));
    }

    #[tokio::test]
    async fn only_latest_headline_fetch_is_applied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "articles": [{ "title": "Served" }]
            })))
            .mount(&server)
            .await;

        let mut app = app_with_news(None, &server.uri()).await;
        app.start_headline_fetch();
        app.start_headline_fetch();
        assert_eq!(app.headline_request_id, 2);

        // Drain both in-flight fetches so only hand-made results reach the poller
        for _ in 0..2 {
            tokio::time::timeout(Duration::from_secs(5), app.headline_rx.recv())
                .await
                .unwrap()
                .unwrap();
        }

        app.headline_tx
            .send(HeadlineResult {
                request_id: 1,
                result: Ok(vec![headline("Stale")]),
            })
            .await
            .unwrap();
        app.poll_headline_result();
        assert!(app.articles.is_empty());
        assert!(app.is_fetching_headlines);

        app.headline_tx
            .send(HeadlineResult {
                request_id: 2,
                result: Ok(vec![headline("Fresh")]),
            })
            .await
            .unwrap();
        app.poll_headline_result();
        assert_eq!(app.articles, vec![headline("Fresh")]);
        assert!(!app.is_fetching_headlines);
    }

    #[tokio::test]
    async fn failed_headline_fetch_shows_notice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut app = app_with_news(None, &server.uri()).await;
        app.handle_action(AppAction::ShowTab(Tab::Articles))
            .await
            .unwrap();
        assert!(app.is_fetching_headlines);

        for _ in 0..500 {
            app.poll_headline_result();
            if !app.is_fetching_headlines {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(!app.is_fetching_headlines);
        assert!(app.articles.is_empty());
        assert_eq!(app.notice.as_deref(), Some(HEADLINES_FAILED));
    }

    #[test]
    fn tabs_cycle_both_ways() {
        assert_eq!(Tab::Home.next(), Tab::Articles);
        assert_eq!(Tab::History.next(), Tab::Home);
        assert_eq!(Tab::Home.prev(), Tab::History);
    }

    #[tokio::test]
    async fn analyze_without_image_warns() {
        let mut app = app_with(Some(Arc::new(Fixed))).await;
        app.handle_action(AppAction::Analyze).await.unwrap();
        assert_eq!(app.notice.as_deref(), Some(NO_IMAGE));
        assert_eq!(app.classification_status, ClassificationStatus::Idle);
    }

    #[tokio::test]
    async fn save_without_result_fails() {
        let mut app = app_with(Some(Arc::new(Fixed))).await;
        app.handle_action(AppAction::SaveResult).await.unwrap();
        assert_eq!(app.notice.as_deref(), Some(SAVE_FAILED));
    }

    #[tokio::test]
    async fn classify_then_save_shows_up_in_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesion.png");
        RgbImage::new(8, 8).save(&path).unwrap();

        let mut app = app_with(Some(Arc::new(Fixed))).await;
        pick(&mut app, &path).await;
        assert!(app.current_image.is_some());

        app.handle_action(AppAction::Analyze).await.unwrap();
        wait_for_classification(&mut app).await;
        assert_eq!(app.classification_status, ClassificationStatus::Done);
        assert_eq!(app.result_label.as_deref(), Some("Benign 92.50%"));

        app.handle_action(AppAction::SaveResult).await.unwrap();
        assert_eq!(app.notice.as_deref(), Some(SAVE_OK));

        app.handle_action(AppAction::ShowTab(Tab::History)).await.unwrap();
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.history[0].result_label, "Benign 92.50%");
        assert!(app.history[0].image_location.starts_with("file://"));
        assert!(app.history[0].image_location.ends_with("lesion.png"));

        app.handle_action(AppAction::DeleteSelected).await.unwrap();
        assert!(app.history.is_empty());
    }

    #[tokio::test]
    async fn decode_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"nope").unwrap();

        let mut app = app_with(Some(Arc::new(Fixed))).await;
        pick(&mut app, &path).await;
        app.handle_action(AppAction::Analyze).await.unwrap();
        wait_for_classification(&mut app).await;

        assert_eq!(app.classification_status, ClassificationStatus::Failed);
        assert!(app.notice.as_deref().unwrap().starts_with("Error:"));
        assert!(app.result_label.is_none());
    }

    #[tokio::test]
    async fn missing_image_path_is_rejected() {
        let mut app = app_with(None).await;
        pick(&mut app, Path::new("/definitely/not/here.png")).await;
        assert!(app.current_image.is_none());
        assert!(app.notice.is_some());
    }

    #[tokio::test]
    async fn unconfigured_classifier_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesion.png");
        RgbImage::new(2, 2).save(&path).unwrap();

        let mut app = app_with(None).await;
        pick(&mut app, &path).await;
        app.handle_action(AppAction::Analyze).await.unwrap();
        assert_eq!(app.notice.as_deref(), Some(NO_CLASSIFIER));
    }

    #[test]
    fn absolute_paths_become_file_uris() {
        let location = image_location(Path::new("/tmp/img1.jpg"));
        if cfg!(unix) {
            assert_eq!(location, "file:///tmp/img1.jpg");
        }
        assert_eq!(image_location(Path::new("rel.jpg")), "rel.jpg");
    }
}
