use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{image_location, App, Tab};
use crate::classifier::format_result;
use crate::models::{ArticleSummary, ClassificationStatus, HistoryRecord};

pub const UNTITLED: &str = "(untitled)";

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Tab body
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_tabs(frame, app, chunks[0]);

    match app.tab {
        Tab::Home => render_home(frame, app, chunks[1]),
        Tab::Articles => render_articles(frame, app, chunks[1]),
        Tab::History => render_history(frame, app, chunks[1]),
    }

    render_status(frame, app, chunks[2]);

    if app.image_input_active {
        render_image_input(frame, app);
    }

    if app.show_help {
        render_help(frame);
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!(" {} {} ", i + 1, tab.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(" Asclepius ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .select(app.tab.index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_home(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Selected image
            Constraint::Length(3), // Top result
            Constraint::Min(0),    // All categories
        ])
        .split(area);

    let image = app
        .current_image
        .as_deref()
        .map(image_location)
        .unwrap_or_else(|| "No image selected".to_string());
    let image_block = Block::default()
        .title(" Image ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    frame.render_widget(
        Paragraph::new(image).block(image_block).wrap(Wrap { trim: true }),
        chunks[0],
    );

    let (result, style) = match app.classification_status {
        ClassificationStatus::Idle if !app.has_classifier() => (
            "Classifier not configured (classifier_command in config.toml)".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        ClassificationStatus::Idle => (
            "Press 'a' to analyze".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        ClassificationStatus::Running => (
            "Analyzing...".to_string(),
            Style::default().fg(Color::Yellow),
        ),
        ClassificationStatus::Failed => (
            "Analysis failed. Press 'a' to retry.".to_string(),
            Style::default().fg(Color::Red),
        ),
        ClassificationStatus::Done => (
            app.result_label
                .clone()
                .unwrap_or_else(|| "No results found. Please try again.".to_string()),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    };
    let result_block = Block::default()
        .title(" Result ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));
    frame.render_widget(
        Paragraph::new(result).style(style).block(result_block),
        chunks[1],
    );

    let items: Vec<ListItem> = app
        .categories
        .iter()
        .map(|c| ListItem::new(format_result(c)))
        .collect();
    render_list(frame, items, " Categories ", app.selected_index, chunks[2]);
}

fn render_articles(frame: &mut Frame, app: &App, area: Rect) {
    if app.is_fetching_headlines && app.articles.is_empty() {
        render_placeholder(frame, " Articles ", "Loading headlines...", area);
        return;
    }
    if app.articles.is_empty() {
        render_placeholder(frame, " Articles ", "No articles found. Press 'r' to reload.", area);
        return;
    }

    let items: Vec<ListItem> = app.articles.iter().map(article_item).collect();
    render_list(frame, items, " Articles ", app.selected_index, area);
}

fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    if app.history.is_empty() {
        render_placeholder(frame, " History ", "No history found.", area);
        return;
    }

    let items: Vec<ListItem> = app.history.iter().map(history_item).collect();
    render_list(frame, items, " History ", app.selected_index, area);
}

pub fn article_item(article: &ArticleSummary) -> ListItem<'_> {
    let mut title_line = vec![Span::styled(
        article.title.as_deref().unwrap_or(UNTITLED),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];
    if let Some(source) = &article.source_name {
        title_line.push(Span::styled(
            format!("  [{source}]"),
            Style::default().fg(Color::Blue),
        ));
    }
    if let Some(published) = article.published_at {
        title_line.push(Span::styled(
            format!("  {}", published.format("%Y-%m-%d")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let description = article.description.as_deref().unwrap_or("");
    ListItem::new(vec![
        Line::from(title_line),
        Line::from(Span::styled(description, Style::default().fg(Color::Gray))),
    ])
}

pub fn history_item(record: &HistoryRecord) -> ListItem<'_> {
    ListItem::new(Line::from(vec![
        Span::styled(
            format!("#{:<4} ", record.id),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            record.result_label.as_str(),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  "),
        Span::styled(
            record.image_location.as_str(),
            Style::default().fg(Color::Blue),
        ),
    ]))
}

fn render_list(frame: &mut Frame, items: Vec<ListItem>, title: &str, selected: usize, area: Rect) {
    let has_items = !items.is_empty();
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if has_items {
        state.select(Some(selected));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_placeholder(frame: &mut Frame, title: &str, text: &str, area: Rect) {
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(notice) = &app.notice {
        let paragraph = Paragraph::new(notice.as_str()).style(Style::default().fg(Color::Yellow));
        frame.render_widget(paragraph, area);
        return;
    }

    let hints = match app.tab {
        Tab::Home => "p:pick image  a:analyze  s:save  tab:next  ?:help  q:quit",
        Tab::Articles => "j/k:nav  o:open  r:reload  tab:next  ?:help  q:quit",
        Tab::History => "j/k:nav  o:open image  d:delete  r:reload  tab:next  ?:help  q:quit",
    };

    let paragraph = Paragraph::new(hints).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_image_input(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, frame.area());

    let block = Block::default()
        .title(" Pick image - Enter a file path ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);

    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(block, area);

    let input_text = format!("> {}_", app.image_input);
    let paragraph = Paragraph::new(input_text).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = vec![
        "",
        " Navigation:",
        "   Tab / S-Tab  Next / previous tab",
        "   1 2 3        Home / Articles / History",
        "   j / ↓        Move down",
        "   k / ↑        Move up",
        "",
        " Home:",
        "   p            Pick image",
        "   a / Enter    Analyze image",
        "   s            Save result to history",
        "",
        " Articles / History:",
        "   o / Enter    Open in browser",
        "   r            Reload",
        "   d            Delete history entry",
        "",
        " General:",
        "   ?            Toggle this help",
        "   q            Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
