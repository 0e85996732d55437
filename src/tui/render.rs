use super::app::{App, BrowseMode, Pane, Status, View};
use super::filter::GRID_COLUMNS;
use crate::engine::briefing::{greeting, Card};
use crate::engine::classify::Category;
use crate::feed::normalize::truncate;
use crate::store::Article;
use chrono::{DateTime, Local, Timelike, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;

const LOGO: &[&str] = &[
    "██████╗ ███████╗██╗   ██╗███╗   ██╗███████╗██╗    ██╗███████╗",
    "██╔══██╗██╔════╝██║   ██║████╗  ██║██╔════╝██║    ██║██╔════╝",
    "██║  ██║█████╗  ██║   ██║██╔██╗ ██║█████╗  ██║ █╗ ██║███████╗",
    "██║  ██║██╔══╝  ╚██╗ ██╔╝██║╚██╗██║██╔══╝  ██║███╗██║╚════██║",
    "██████╔╝███████╗ ╚████╔╝ ██║ ╚████║███████╗╚███╔███╔╝███████║",
    "╚═════╝ ╚══════╝  ╚═══╝  ╚═╝  ╚═══╝╚══════╝ ╚══╝╚══╝ ╚══════╝",
];

const HOME_HINTS: &[(&str, &str)] = &[("b", "briefing"), ("e", "browse"), ("q", "quit")];
const INTRO_HINTS: &[(&str, &str)] = &[
    ("enter", "start"),
    ("e", "browse"),
    ("h", "home"),
    ("q", "quit"),
];
const CARD_HINTS: &[(&str, &str)] = &[
    ("n", "next"),
    ("p", "prev"),
    ("o", "open"),
    ("i", "info"),
    ("e", "browse"),
    ("h", "home"),
    ("q", "quit"),
];
const BROWSE_HINTS: &[(&str, &str)] = &[
    ("h", "home"),
    ("/", "search"),
    ("f", "filter"),
    ("?", "help"),
    ("q", "quit"),
];
const SEARCH_HINTS: &[(&str, &str)] = &[("esc", "cancel"), ("enter", "search")];

const HELP_SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/↓", "move down"),
            ("k/↑", "move up"),
            ("tab", "switch pane"),
        ],
    ),
    (
        "Actions",
        &[
            ("o/enter", "open in browser"),
            ("/", "search"),
            ("r", "refresh feeds"),
        ],
    ),
    (
        "Filter Mode",
        &[
            ("f", "open filter"),
            ("space", "toggle source"),
            ("a", "all sources"),
            ("1-9", "toggle by number"),
        ],
    ),
    (
        "General",
        &[("h", "home"), ("?", "toggle help"), ("q", "quit")],
    ),
];

pub fn draw(f: &mut Frame, app: &App) {
    let now = Utc::now();
    match app.view {
        View::Home => draw_home(f, app, now),
        View::BriefingIntro => draw_intro(f, app),
        View::BriefingCard => draw_card(f, app),
        View::Browsing(mode) => {
            draw_browse(f, app, mode, now);
            match mode {
                BrowseMode::Help => draw_help_overlay(f),
                BrowseMode::Filtering => draw_filter_overlay(f, app),
                BrowseMode::Normal | BrowseMode::Searching => {}
            }
        }
    }
}

/// Content area plus a one-line bottom bar.
fn split_bottom(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

fn draw_home(f: &mut Frame, app: &App, now: DateTime<Utc>) {
    let (body, bar) = split_bottom(f.area());
    let logo_style = Style::default().fg(ACCENT);
    let key_style = Style::default().fg(ACCENT).add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = LOGO
        .iter()
        .map(|l| Line::from(Span::styled(*l, logo_style)))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        greeting(now.with_timezone(&Local).hour()),
        Style::default().fg(DIM),
    )));
    if let Some(n) = app.new_since_last_open.filter(|n| *n > 0) {
        lines.push(Line::from(Span::styled(
            format!("{} new {} since your last visit", n, if n == 1 { "post" } else { "posts" }),
            Style::default().fg(DIM),
        )));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(vec![
        Span::styled("[b]", key_style),
        Span::raw("  Today's Briefing"),
    ]));
    lines.push(Line::from(vec![
        Span::styled("[e]", key_style),
        Span::raw("  Browse / Explore"),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[q]", key_style),
        Span::raw("  Quit"),
    ]));

    if let Some(version) = &app.update_available {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Update available: v{}", version),
            logo_style,
        )));
    }

    let area = top_third(body, lines.len() as u16);
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    draw_bottom_bar(f, bar, app, HOME_HINTS);
}

fn draw_intro(f: &mut Frame, app: &App) {
    let (body, bar) = split_bottom(f.area());
    let Some(b) = &app.briefing else {
        draw_bottom_bar(f, bar, app, INTRO_HINTS);
        return;
    };
    let meta = Style::default().fg(DIM);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("DevNews · {}", b.date_label),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(format!("Posts scanned: {}", b.scanned), meta)),
    ];
    if let Some(focus) = b.focus {
        lines.push(Line::from(Span::styled(
            format!("{} articles: {}", focus, b.selected),
            meta,
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("Selected for briefing: {}", b.selected),
        meta,
    )));
    if !b.active_sources.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Most active: {}", b.active_sources),
            meta,
        )));
    }
    lines.push(Line::from(""));

    if !b.themes.is_empty() {
        lines.push(Line::from("Detected themes:"));
        for theme in &b.themes {
            lines.push(Line::from(format!("  {}", theme)));
        }
    }

    let area = top_third(body, lines.len() as u16);
    let area = Rect {
        x: area.x + 2,
        width: area.width.saturating_sub(2),
        ..area
    };
    f.render_widget(Paragraph::new(lines), area);
    draw_bottom_bar(f, bar, app, INTRO_HINTS);
}

fn draw_card(f: &mut Frame, app: &App) {
    let (body, bar) = split_bottom(f.area());
    let (Some(b), Some(card)) = (&app.briefing, app.current_card()) else {
        draw_bottom_bar(f, bar, app, CARD_HINTS);
        return;
    };

    let card_width = body.width.saturating_sub(8).max(30).min(body.width);
    let inner_width = card_width.saturating_sub(4) as usize;
    let lines = card_lines(card, inner_width);
    let card_height = lines.len() as u16 + 2;
    let breakdown_height = if app.show_breakdown { 9 } else { 0 };

    let top = top_third(body, 1 + card_height + breakdown_height);
    let counter = Rect {
        x: body.x + 2,
        y: top.y,
        width: card_width,
        height: 1,
    };
    f.render_widget(
        Paragraph::new(Span::styled(
            format!("{}/{}", card.index, b.cards.len()),
            Style::default().fg(DIM),
        )),
        counter,
    );

    let card_area = clamp_rect(
        Rect {
            x: body.x + 2,
            y: top.y + 1,
            width: card_width,
            height: card_height,
        },
        body,
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT));
    f.render_widget(Paragraph::new(lines).block(block), card_area);

    if app.show_breakdown {
        let area = clamp_rect(
            Rect {
                x: body.x + 2,
                y: card_area.y + card_area.height + 1,
                width: card_width,
                height: breakdown_height - 1,
            },
            body,
        );
        f.render_widget(Paragraph::new(breakdown_lines(card)), area);
    }

    draw_bottom_bar(f, bar, app, CARD_HINTS);
}

fn card_lines(card: &Card, width: usize) -> Vec<Line<'static>> {
    let a = &card.article;
    let meta = Style::default().fg(DIM);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} · {}", a.source, a.published.format("%b %-d")),
            meta,
        )),
        Line::from(Span::styled(
            a.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(a.category.label(), Style::default().fg(category_color(a.category))),
            Span::styled(
                format!("  ·  {} min  ·  Signal {:.1}", card.reading_time, a.signal_score),
                meta,
            ),
        ]),
    ];
    if !a.why_it_matters.is_empty() {
        let why = Style::default().fg(Color::White).add_modifier(Modifier::ITALIC);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Why it matters:", why)));
        for l in wrap_text(&a.why_it_matters, width) {
            lines.push(Line::from(Span::styled(l, why)));
        }
    }
    lines
}

fn breakdown_lines(card: &Card) -> Vec<Line<'static>> {
    let b = &card.breakdown;
    vec![
        Line::from(Span::styled(
            "Signal Score Breakdown",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Source weight:         {:.2}", b.source_weight)),
        Line::from(format!("Depth score:           {:.2}", b.depth)),
        Line::from(format!("Recency score:         {:.2}", b.recency)),
        Line::from(format!("Keyword density score: {:.2}", b.keyword_density)),
        Line::from(""),
        Line::from(format!("Final: {:.1}", b.final_score)),
    ]
}

fn draw_browse(f: &mut Frame, app: &App, mode: BrowseMode, now: DateTime<Utc>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    if mode == BrowseMode::Searching || !app.search.is_empty() {
        draw_search_line(f, app, mode, chunks[0]);
    } else {
        draw_filter_bar(f, app, chunks[0]);
    }

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);
    draw_list(f, app, panes[0], now);
    draw_preview(f, app, panes[1]);
    draw_status_bar(f, app, mode, chunks[2]);
}

fn draw_filter_bar(f: &mut Frame, app: &App, area: Rect) {
    let hint = "f to filter";
    let prefix = " Filter: ";
    let max_label = (area.width as usize).saturating_sub(prefix.len() + hint.len() + 4);
    let label = app.filter.collapsed_label(max_label);
    let used = prefix.chars().count() + label.chars().count() + hint.len() + 1;
    let gap = (area.width as usize).saturating_sub(used).max(1);
    let line = Line::from(vec![
        Span::raw(prefix),
        Span::styled(label, Style::default().fg(ACCENT)),
        Span::raw(" ".repeat(gap)),
        Span::styled(hint, Style::default().fg(DIM)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_search_line(f: &mut Frame, app: &App, mode: BrowseMode, area: Rect) {
    let mut spans = vec![
        Span::styled(" / ", Style::default().fg(ACCENT)),
        Span::raw(app.search.clone()),
    ];
    if mode == BrowseMode::Searching {
        spans.push(Span::styled("█", Style::default().fg(ACCENT)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_list(f: &mut Frame, app: &App, area: Rect, now: DateTime<Utc>) {
    let focused = app.pane == Pane::List;
    let block = Block::default()
        .title(" Articles ")
        .borders(Borders::ALL)
        .border_style(pane_border(focused));
    let inner_width = area.width.saturating_sub(4) as usize;
    let visible_items = (area.height.saturating_sub(2) as usize / 3).max(1);

    if app.articles.is_empty() {
        let msg = if app.search.is_empty() {
            "No articles. Press r to refresh."
        } else {
            "No matches."
        };
        let para = Paragraph::new(Span::styled(msg, Style::default().fg(DIM))).block(block);
        f.render_widget(para, area);
        return;
    }

    let offset = app.cursor.saturating_sub(visible_items - 1);
    let mut lines: Vec<Line> = Vec::with_capacity(visible_items * 3);
    for (i, a) in app.articles.iter().enumerate().skip(offset).take(visible_items) {
        let selected = i == app.cursor;
        let (marker, title_style) = if selected {
            ("> ", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        } else {
            ("  ", Style::default())
        };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(ACCENT)),
            Span::styled(truncate(&a.title, inner_width).into_owned(), title_style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("  {} · {}", a.source, relative_time(a.published, now)),
            Style::default().fg(DIM),
        )));
        lines.push(Line::from(""));
    }
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_preview(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Preview ")
        .borders(Borders::ALL)
        .border_style(pane_border(app.pane == Pane::Preview));
    let Some(a) = app.selected() else {
        let para = Paragraph::new(Span::styled("Select an article", Style::default().fg(DIM)))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(para, area);
        return;
    };
    let para = Paragraph::new(preview_lines(a))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll, 0));
    f.render_widget(para, area);
}

fn preview_lines(a: &Article) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            a.title.clone(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{} · {}", a.source, a.published.format("%b %-d, %Y")),
            Style::default().fg(DIM),
        )),
        Line::from(""),
    ];
    if !a.summary.is_empty() {
        lines.push(Line::from(Span::styled(
            a.summary.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
        let tags = a.tag_list();
        if !tags.is_empty() {
            lines.push(Line::from(Span::styled(
                tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" "),
                Style::default().fg(Color::Magenta),
            )));
        }
        lines.push(Line::from(""));
    }
    let desc = if a.description.is_empty() {
        "(No description available)".to_string()
    } else {
        a.description.clone()
    };
    lines.push(Line::from(desc));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Read more: {}", a.link),
        Style::default().fg(Color::Blue),
    )));
    lines
}

fn draw_status_bar(f: &mut Frame, app: &App, mode: BrowseMode, area: Rect) {
    let mut left = vec![Span::raw(format!(" {} articles", app.articles.len()))];
    let label = app.filter.active_label();
    if label != "All" {
        left.push(Span::raw(format!(" · {}", label)));
    }
    if app.streak >= 1 {
        left.push(Span::raw(" · "));
        left.push(Span::styled(
            "streak",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ));
        left.push(Span::raw(format!(" {}d", app.streak)));
    }
    if app.is_refreshing() {
        let ch = SPINNER_FRAMES[app.spinner_frame % SPINNER_FRAMES.len()];
        left.push(Span::styled(
            format!(" {} refreshing...", ch),
            Style::default().fg(ACCENT),
        ));
    }
    match &app.status {
        Some(Status::Error(e)) => {
            left = vec![Span::styled(format!(" {}", e), Style::default().fg(Color::Red))];
        }
        Some(Status::Info(s)) => {
            left.push(Span::styled(format!(" · {}", s), Style::default().fg(Color::Green)));
        }
        None => {}
    }
    let hints = if mode == BrowseMode::Searching {
        SEARCH_HINTS
    } else {
        BROWSE_HINTS
    };
    draw_bar(f, area, left, hints);
}

fn draw_bottom_bar(f: &mut Frame, area: Rect, app: &App, hints: &[(&str, &str)]) {
    let mut left = Vec::new();
    if app.streak >= 1 {
        left.push(Span::raw(" "));
        left.push(Span::styled(
            "streak",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ));
        left.push(Span::raw(format!(" {}d", app.streak)));
    }
    match &app.status {
        Some(Status::Error(e)) => {
            left.push(Span::styled(format!(" {}", e), Style::default().fg(Color::Red)));
        }
        Some(Status::Info(s)) => left.push(Span::styled(format!(" {}", s), Style::default().fg(DIM))),
        None => {}
    }
    draw_bar(f, area, left, hints);
}

fn draw_bar(f: &mut Frame, area: Rect, left: Vec<Span<'static>>, hints: &[(&str, &str)]) {
    let mut right: Vec<Span> = Vec::new();
    for (key, label) in hints {
        right.push(Span::styled(format!("{} ", key), Style::default().fg(Color::Yellow)));
        right.push(Span::raw(format!("{}  ", label)));
    }
    let left_width: usize = left.iter().map(|s| s.width()).sum();
    let right_width: usize = right.iter().map(|s| s.width()).sum();
    let gap = (area.width as usize).saturating_sub(left_width + right_width);

    let mut spans = left;
    spans.push(Span::raw(" ".repeat(gap)));
    spans.extend(right);
    let para = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    f.render_widget(para, area);
}

fn draw_help_overlay(f: &mut Frame) {
    let mut lines = Vec::new();
    for (section, keys) in HELP_SECTIONS {
        lines.push(Line::from(Span::styled(
            *section,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )));
        for (key, desc) in *keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<10}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*desc),
            ]));
        }
        lines.push(Line::from(""));
    }
    let area = centered(f.area(), 44, lines.len() as u16 + 2);
    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT));
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_filter_overlay(f: &mut Frame, app: &App) {
    let filter = &app.filter;
    let rows = filter.rows();
    let total = filter.total_items();
    let name_width = (0..total)
        .filter_map(|i| filter.item(i))
        .map(|s| s.chars().count())
        .max()
        .unwrap_or(3);
    // "> [x] name" plus a gap between columns
    let cell_width = 2 + 4 + name_width + 2;

    let mut lines: Vec<Line> = Vec::with_capacity(rows + 4);
    for row in 0..rows {
        let mut spans = Vec::new();
        for col in 0..GRID_COLUMNS {
            let idx = col * rows + row;
            let Some(name) = filter.item(idx) else {
                continue;
            };
            let active = filter.is_item_active(idx);
            let cursor = if idx == filter.cursor { "> " } else { "  " };
            let check = if active { "[x] " } else { "[ ] " };
            let name_style = if active {
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(cursor, Style::default().fg(ACCENT)));
            spans.push(Span::styled(
                check,
                Style::default().fg(if active { ACCENT } else { DIM }),
            ));
            spans.push(Span::styled(
                format!("{:<width$}", name, width = name_width + 2),
                name_style,
            ));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "↑↓←→ navigate  space toggle  a all  esc close",
        Style::default().fg(DIM),
    )));

    let width = (cell_width * GRID_COLUMNS + 4).max(50) as u16;
    let area = centered(f.area(), width, lines.len() as u16 + 2);
    let block = Block::default()
        .title(" Filter Sources ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT));
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn pane_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(DIM)
    }
}

fn category_color(c: Category) -> Color {
    match c {
        Category::AiMl => Color::Magenta,
        Category::Infrastructure => Color::Blue,
        Category::Databases => Color::Green,
        Category::DistributedSystems => Color::Yellow,
        Category::Security => Color::Red,
        Category::DeveloperTools => Color::Cyan,
        Category::Platform => Color::Gray,
    }
}

/// `height` rows starting a third of the way down the spare space.
fn top_third(area: Rect, height: u16) -> Rect {
    let pad = area.height.saturating_sub(height) / 3;
    Rect {
        x: area.x,
        y: area.y + pad,
        width: area.width,
        height: height.min(area.height.saturating_sub(pad)),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn clamp_rect(r: Rect, bounds: Rect) -> Rect {
    let bottom = bounds.y + bounds.height;
    let right = bounds.x + bounds.width;
    let y = r.y.min(bottom);
    let x = r.x.min(right);
    Rect {
        x,
        y,
        width: r.width.min(right - x),
        height: r.height.min(bottom - y),
    }
}

/// Compact age: "just now", "5m", "3h", "2d", then the date.
pub fn relative_time(t: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let d = now.signed_duration_since(t);
    if d.num_minutes() < 1 {
        "just now".to_string()
    } else if d.num_hours() < 1 {
        format!("{}m", d.num_minutes())
    } else if d.num_hours() < 24 {
        format!("{}h", d.num_hours())
    } else if d.num_days() < 7 {
        format!("{}d", d.num_days())
    } else {
        t.format("%b %-d").to_string()
    }
}

/// Greedy word wrap at `width` columns. Words longer than a line stay whole.
pub fn wrap_text(s: &str, width: usize) -> Vec<String> {
    let mut words = s.split_whitespace();
    let Some(first) = words.next() else {
        return Vec::new();
    };
    if width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    let mut line = first.to_string();
    for w in words {
        if line.chars().count() + 1 + w.chars().count() > width {
            lines.push(std::mem::take(&mut line));
            line.push_str(w);
        } else {
            line.push(' ');
            line.push_str(w);
        }
    }
    lines.push(line);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::AppOptions;
    use chrono::{Duration, TimeZone};
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_relative_time() {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        assert_eq!(relative_time(now - Duration::seconds(30), now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(5), now), "5m");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3h");
        assert_eq!(relative_time(now - Duration::days(2), now), "2d");
        let old = Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap();
        assert_eq!(relative_time(old, now), "Jun 15");
    }

    #[test]
    fn test_wrap_text() {
        assert!(wrap_text("", 10).is_empty());
        assert_eq!(
            wrap_text("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
        assert_eq!(wrap_text("supercalifragilistic word", 5), vec!["supercalifragilistic", "word"]);
    }

    #[test]
    fn test_top_third_and_centered_stay_in_bounds() {
        let area = Rect::new(0, 0, 20, 10);
        let r = top_third(area, 40);
        assert!(r.y + r.height <= 10);
        let c = centered(area, 100, 100);
        assert_eq!(c, area);
        let clipped = clamp_rect(Rect::new(5, 8, 30, 30), area);
        assert_eq!(clipped, Rect::new(5, 8, 15, 2));
    }

    #[test]
    fn test_draw_home_and_browse() {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let mut app = App::new(AppOptions {
            sources: vec!["Netflix".into()],
            streak: 3,
            new_since_last_open: Some(7),
            ..AppOptions::default()
        });
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Browse / Explore"));
        assert!(text.contains("Today's Briefing"));
        assert!(text.contains("7 new posts since your last visit"));
        assert!(text.contains("streak"));

        app.update(crate::tui::message::Message::Key(
            crossterm::event::KeyEvent::new(
                crossterm::event::KeyCode::Char('e'),
                crossterm::event::KeyModifiers::NONE,
            ),
        ));
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Filter: All sources"));
        assert!(text.contains("0 articles"));
    }

    #[test]
    fn test_draw_tiny_terminal_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(10, 4)).unwrap();
        let app = App::new(AppOptions::default());
        terminal.draw(|f| draw(f, &app)).unwrap();
    }
}
