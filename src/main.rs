use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

mod app;
mod classifier;
mod config;
mod db;
mod error;
mod models;
mod news;
mod tui;

use app::{image_location, App};
use classifier::{classify_file, format_result, Classifier, CommandClassifier};
use config::Config;
use db::HistoryStore;
use error::{AppError, Result};
use models::NewHistoryRecord;
use news::HeadlineFetcher;
use tui::{draw, handle_key_event, UNTITLED};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let config = Config::load()?;

    // Composition root: every service is built once here and handed down
    let store = HistoryStore::open(&config.db_path).await?;
    let fetcher = HeadlineFetcher::new(&config)?;
    let classifier: Option<Arc<dyn Classifier>> = if config.classifier_command.is_empty() {
        None
    } else {
        Some(Arc::new(CommandClassifier::new(&config.classifier_command)?))
    };

    match args.get(1).map(String::as_str) {
        Some("--classify") => {
            let path = args.get(2).ok_or_else(|| {
                AppError::Config("usage: asclepius --classify <image> [--save]".to_string())
            })?;
            let save = args.iter().skip(3).any(|a| a == "--save");
            return classify_headless(&config, &store, classifier, Path::new(path), save).await;
        }
        Some("--history") => {
            let records = store.list_all().await?;
            if records.is_empty() {
                println!("No history found.");
                return Ok(());
            }
            println!("{} records", store.count().await?);
            for record in records {
                println!("{}\t{}\t{}", record.id, record.result_label, record.image_location);
            }
            return Ok(());
        }
        Some("--delete") => {
            let id: i64 = args
                .get(2)
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| AppError::Config("usage: asclepius --delete <id>".to_string()))?;
            let record = store.get(id).await?.ok_or(AppError::NotFound(id))?;
            store.delete(id).await?;
            println!("Deleted {} ({})", record.result_label, record.image_location);
            return Ok(());
        }
        Some("--headlines") => {
            for article in fetcher.fetch_or_empty().await {
                println!("{}", article.title.as_deref().unwrap_or(UNTITLED));
                if let Some(url) = article.url {
                    println!("  {}", url);
                }
            }
            return Ok(());
        }
        _ => {}
    }

    let mut app = App::new(store, fetcher, classifier, config.max_image_side);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn classify_headless(
    config: &Config,
    store: &HistoryStore,
    classifier: Option<Arc<dyn Classifier>>,
    path: &Path,
    save: bool,
) -> Result<()> {
    let classifier = classifier.ok_or_else(|| {
        AppError::Config(format!(
            "classifier_command is not set in {}",
            Config::config_path().display()
        ))
    })?;

    let image = std::fs::canonicalize(path)
        .map_err(|e| AppError::Decode(format!("{}: {}", path.display(), e)))?;
    let max_side = config.max_image_side;
    let worker_path = image.clone();
    let categories = tokio::task::spawn_blocking(move || {
        classify_file(classifier.as_ref(), &worker_path, max_side)
    })
    .await
    .map_err(|e| anyhow::anyhow!("classifier task failed: {}", e))??;

    for category in &categories {
        println!("{}", format_result(category));
    }

    if save {
        // rank() guarantees at least one category
        let label = format_result(&categories[0]);
        let id = store
            .insert(NewHistoryRecord::new(image_location(&image), label))
            .await?;
        println!("Saved as history record {}", id);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        app.poll_classification_result();
        app.poll_headline_result();

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) =
                        handle_key_event(key, app.tab, app.image_input_active, app.show_help)
                    {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
