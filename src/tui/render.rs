use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::catalog::ServerStatus;
use crate::gateway::EventStatus;
use crate::manifest::{BufferState, ConfigEditor};
use crate::store::{NoticeKind, Store};
use crate::tui::controller::{config_rows, dashboard_rows, live_rows, marketplace_rows};
use crate::tui::state::{AppState, Mode, Tab};
use crate::tui::theme::Theme;
use crate::vault::MASK;

pub fn draw(frame: &mut Frame, store: &Store, editor: &ConfigEditor, state: &AppState, theme: &Theme) {
    let area = frame.size();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    draw_header(frame, layout[0], store, theme);
    draw_tabs(frame, layout[1], state, theme);
    match state.tab {
        Tab::Dashboard => draw_dashboard(frame, layout[2], store, state, theme),
        Tab::Marketplace => draw_marketplace(frame, layout[2], store, state, theme),
        Tab::Config => draw_config(frame, layout[2], store, editor, state, theme),
        Tab::Vault => draw_vault(frame, layout[2], store, state, theme),
        Tab::Live => draw_live(frame, layout[2], store, state, theme),
    }
    draw_status(frame, layout[3], store, state, theme);
}

/// Left-aligns `text` in `width` terminal columns, truncating if needed.
pub fn pad(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

fn draw_header(frame: &mut Frame, area: Rect, store: &Store, theme: &Theme) {
    let project = store.active_project();
    let stats = store.stats();
    let line = Line::from(vec![
        Span::styled(" mcpdeck ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        Span::styled("│ ", Style::default().fg(theme.border)),
        Span::styled(project.name.clone(), Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" ({}) ", project.id), Style::default().fg(theme.muted)),
        Span::styled("│ ", Style::default().fg(theme.border)),
        Span::styled(
            format!("{} installed · {} active", stats.installed, stats.active),
            Style::default().fg(theme.highlight),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_tabs(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)))
        .select(state.tab.index())
        .style(Style::default().fg(theme.muted))
        .highlight_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn panel<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
}

fn render_list(frame: &mut Frame, area: Rect, block: Block, items: Vec<ListItem>, selected: usize, theme: &Theme) {
    let empty = items.is_empty();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.highlight).add_modifier(Modifier::REVERSED));
    let mut list_state = ListState::default().with_selected(if empty { None } else { Some(selected) });
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn status_color(status: ServerStatus, theme: &Theme) -> Color {
    match status {
        ServerStatus::Active => theme.success,
        ServerStatus::Inactive => theme.muted,
        ServerStatus::Error => theme.error,
    }
}

fn draw_dashboard(frame: &mut Frame, area: Rect, store: &Store, state: &AppState, theme: &Theme) {
    let items: Vec<ListItem> = dashboard_rows(store)
        .into_iter()
        .map(|row| {
            ListItem::new(Line::from(vec![
                Span::styled(pad(&row.server.name, 24), Style::default().fg(theme.text)),
                Span::styled(pad(&row.status.to_string(), 10), Style::default().fg(status_color(row.status, theme))),
                Span::styled(pad(&row.server.category.to_string(), 14), Style::default().fg(theme.muted)),
                Span::styled(row.server.config.command_line(), Style::default().fg(theme.muted)),
            ]))
        })
        .collect();
    let block = panel(" Installed servers · Space uninstall · p project · n new project ", theme);
    if items.is_empty() {
        let hint = Paragraph::new("No servers installed. Browse the Marketplace tab to add some.")
            .style(Style::default().fg(theme.muted))
            .block(block);
        frame.render_widget(hint, area);
        return;
    }
    render_list(frame, area, block, items, state.cursor(), theme);
}

fn draw_marketplace(frame: &mut Frame, area: Rect, store: &Store, state: &AppState, theme: &Theme) {
    let (servers, blueprints) = marketplace_rows(store, &state.search);
    let mut items: Vec<ListItem> = servers
        .iter()
        .map(|row| {
            let mark = if row.installed { "[x] " } else { "[ ] " };
            let stars = row.server.stars.map(|s| format!("★{}", s)).unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(mark, Style::default().fg(theme.accent)),
                Span::styled(pad(&row.server.name, 24), Style::default().fg(theme.text)),
                Span::styled(pad(&format!("v{}", row.server.version), 9), Style::default().fg(theme.muted)),
                Span::styled(pad(&row.server.author, 14), Style::default().fg(theme.muted)),
                Span::styled(pad(&stars, 8), Style::default().fg(theme.pending)),
                Span::styled(row.server.description.clone(), Style::default().fg(theme.muted)),
            ]))
        })
        .collect();
    items.extend(blueprints.iter().map(|bp| {
        ListItem::new(Line::from(vec![
            Span::styled(pad(&bp.icon, 4), Style::default()),
            Span::styled(pad(&bp.name, 24), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
            Span::styled(pad(&bp.category, 14), Style::default().fg(theme.muted)),
            Span::styled(format!("{} servers", bp.server_ids.len()), Style::default().fg(theme.muted)),
        ]))
    }));

    let title = if state.search.is_empty() {
        " Marketplace · / search · Space install · b deploy blueprint ".to_string()
    } else {
        format!(" Marketplace · search: {} ", state.search)
    };
    render_list(frame, area, panel(&title, theme), items, state.cursor(), theme);
}

fn draw_config(
    frame: &mut Frame,
    area: Rect,
    store: &Store,
    editor: &ConfigEditor,
    state: &AppState,
    theme: &Theme,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(20)].as_ref())
        .split(area);

    let items: Vec<ListItem> = config_rows(store)
        .into_iter()
        .map(|server| ListItem::new(Line::from(pad(&server.name, 24))))
        .collect();
    render_list(frame, columns[0], panel(" Installed ", theme), items, state.cursor(), theme);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(6)].as_ref())
        .split(columns[1]);

    let editing = state.mode == Mode::RawEdit;
    let (title, border) = match editor.state() {
        _ if !editing => (" config.json · e edit ".to_string(), theme.border),
        BufferState::Valid(_) => (" config.json · Ctrl-S save · Esc abandon ".to_string(), theme.success),
        BufferState::Empty => (" config.json · empty ".to_string(), theme.pending),
        BufferState::Invalid(message) => (format!(" invalid JSON: {} ", message), theme.error),
    };
    let mut text = editor.text().to_string();
    if editing {
        text.push('▏');
    }
    let body = Paragraph::new(text)
        .style(Style::default().fg(theme.text))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        );
    frame.render_widget(body, right[0]);

    let skills: Vec<Line> = editor
        .selected()
        .and_then(|id| store.server(id))
        .map(|server| {
            server
                .skills
                .iter()
                .enumerate()
                .map(|(i, skill)| {
                    Line::from(vec![
                        Span::styled(format!("{} ", i), Style::default().fg(theme.muted)),
                        Span::styled(skill.name.clone(), Style::default().fg(theme.accent)),
                        Span::styled(format!("  {}", skill.description), Style::default().fg(theme.muted)),
                    ])
                })
                .collect()
        })
        .unwrap_or_default();
    let overrides = store
        .active_project()
        .secrets
        .keys()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let skills_title = format!(" Skills · overrides: {} ", if overrides.is_empty() { "none" } else { overrides.as_str() });
    frame.render_widget(Paragraph::new(skills).block(panel(&skills_title, theme)), right[1]);
}

fn draw_vault(frame: &mut Frame, area: Rect, store: &Store, state: &AppState, theme: &Theme) {
    let items: Vec<ListItem> = store
        .vault()
        .secrets()
        .iter()
        .map(|secret| {
            let value = match &state.revealed {
                Some((id, value)) if *id == secret.id => value.clone(),
                _ => MASK.to_string(),
            };
            let accessed = secret
                .last_accessed
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string());
            ListItem::new(Line::from(vec![
                Span::styled(pad(&secret.key, 22), Style::default().fg(theme.accent)),
                Span::styled(pad(&value, 16), Style::default().fg(theme.text)),
                Span::styled(pad(&accessed, 18), Style::default().fg(theme.muted)),
                Span::styled(secret.description.clone(), Style::default().fg(theme.muted)),
            ]))
        })
        .collect();
    let orphans = store.orphaned_overrides();
    let title = if orphans.is_empty() {
        format!(" Vault ({}) · a add · r reveal · x delete ", store.vault().backend_name())
    } else {
        format!(" Vault · overrides without a secret: {} ", orphans.join(", "))
    };
    render_list(frame, area, panel(&title, theme), items, state.cursor(), theme);
}

fn draw_live(frame: &mut Frame, area: Rect, store: &Store, state: &AppState, theme: &Theme) {
    let events = live_rows(store);
    let block = panel(" Live gateway · g start/stop ", theme);
    if events.is_empty() {
        let waiting = Paragraph::new("Waiting for protocol calls...")
            .style(Style::default().fg(theme.muted))
            .block(block);
        frame.render_widget(waiting, area);
        return;
    }
    let items: Vec<ListItem> = events
        .into_iter()
        .map(|event| {
            let color = match event.status {
                EventStatus::Success => theme.success,
                EventStatus::Error => theme.error,
                EventStatus::Pending => theme.pending,
            };
            ListItem::new(Line::from(vec![
                Span::styled(event.timestamp.format("%H:%M:%S ").to_string(), Style::default().fg(theme.muted)),
                Span::styled(pad(&event.server_name, 20), Style::default().fg(theme.text)),
                Span::styled(pad(&event.method, 22), Style::default().fg(theme.accent)),
                Span::styled(format!("{:>5}ms ", event.latency_ms), Style::default().fg(theme.muted)),
                Span::styled(event.status.to_string(), Style::default().fg(color)),
            ]))
        })
        .collect();
    render_list(frame, area, block, items, state.cursor(), theme);
}

fn draw_status(frame: &mut Frame, area: Rect, store: &Store, state: &AppState, theme: &Theme) {
    let left = match (&state.mode, store.notice()) {
        (Mode::Input(prompt), _) => Span::styled(
            format!("{}: {}▏", prompt.label(), state.input),
            Style::default().fg(theme.highlight),
        ),
        (_, Some(notice)) => {
            let color = match notice.kind {
                NoticeKind::Success => theme.success,
                NoticeKind::Error => theme.error,
            };
            Span::styled(notice.message.clone(), Style::default().fg(color))
        }
        _ => Span::styled("Tab switch · j/k move · q quit", Style::default().fg(theme.muted)),
    };
    frame.render_widget(Paragraph::new(Line::from(left)), area);

    let right = if state.status_client.is_empty() {
        format!("build {}", state.status_build)
    } else {
        format!("{} · build {}", state.status_client, state.status_build)
    };
    let build = Paragraph::new(right)
        .alignment(Alignment::Right)
        .style(Style::default().fg(theme.muted));
    frame.render_widget(build, area);
}
