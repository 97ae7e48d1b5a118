pub mod backdrop;

use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::app::{App, InputMode};
use crate::domain::store::SnapshotSink;
use crate::domain::todo::Todo;
use backdrop::Palette;

const CREATED_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

pub fn run<S: SnapshotSink>(app: &mut App<S>, tick_rate: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut last_tick = Instant::now();
    let res = loop {
        app.poll_load();
        if let Err(err) = terminal.draw(|f| draw(f, app)) {
            break Err(err.into());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        match next_key(timeout) {
            Ok(Some(code)) if handle_key(app, code) => break Ok(()),
            Ok(_) => {}
            Err(err) => break Err(err),
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    };

    cleanup_terminal(&mut terminal)?;
    res
}

fn next_key(timeout: Duration) -> Result<Option<KeyCode>> {
    if event::poll(timeout)?
        && let Event::Key(key) = event::read()?
        && key.kind == KeyEventKind::Press
    {
        return Ok(Some(key.code));
    }
    Ok(None)
}

/// Returns true when the app should quit.
fn handle_key<S: SnapshotSink>(app: &mut App<S>, code: KeyCode) -> bool {
    if !app.ready() {
        return matches!(code, KeyCode::Char('q') | KeyCode::Esc);
    }
    match app.mode {
        InputMode::Normal => match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => app.select_next(),
            KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
            KeyCode::Char('a') | KeyCode::Char('n') => app.begin_add(),
            KeyCode::Char('e') => app.begin_edit(),
            KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
            _ => {}
        },
        InputMode::Adding | InputMode::Editing(_) => match code {
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Enter => app.submit_input(),
            KeyCode::Backspace => app.pop_char(),
            KeyCode::Char(c) => app.push_char(c),
            _ => {}
        },
    }

    false
}

fn draw<S: SnapshotSink>(f: &mut ratatui::Frame, app: &App<S>) {
    let size = f.area();
    let palette = app.backdrop.palette();
    f.render_widget(
        Block::default().style(Style::default().bg(palette.background)),
        size,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(size);

    f.render_widget(render_header(app, &palette), chunks[0]);

    if !app.ready() {
        let loading = Paragraph::new("Loading your tasks...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(palette.title))
            .block(card("Tasks", &palette));
        f.render_widget(loading, chunks[1]);
        return;
    }

    if !app.has_todos() {
        let empty = Paragraph::new("No tasks yet. Press a to add one.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(palette.title))
            .block(card("Tasks", &palette));
        f.render_widget(empty, chunks[1]);
        f.render_widget(render_footer(app, &palette), chunks[2]);
        return;
    }

    let todos = app.visible_todos();
    let mut list_state = ListState::default();
    if !todos.is_empty() {
        list_state.select(Some(app.selected));
    }
    let list = render_list(&todos, app.selected, &palette);
    f.render_stateful_widget(list, chunks[1], &mut list_state);

    f.render_widget(render_footer(app, &palette), chunks[2]);
}

fn card<'a>(title: &'a str, palette: &Palette) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
}

fn render_header<S: SnapshotSink>(app: &App<S>, palette: &Palette) -> Paragraph<'static> {
    let mut spans = vec![Span::styled(
        "tsumiki",
        Style::default()
            .fg(palette.title)
            .add_modifier(Modifier::BOLD),
    )];
    if app.ready() {
        let total = app.total_count();
        let summary = format!("Open: {} / All: {}", app.open_count(), total);
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(summary, Style::default().fg(palette.accent)));
    }
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        app.backdrop.name(),
        Style::default().fg(palette.border),
    ));
    Paragraph::new(Line::from(spans))
        .block(card("Overview", palette))
        .wrap(Wrap { trim: true })
}

fn render_list<'a>(todos: &[&'a Todo], selected: usize, palette: &Palette) -> List<'a> {
    let items: Vec<ListItem> = todos
        .iter()
        .enumerate()
        .map(|(idx, todo)| {
            let symbol = if todo.is_completed { "✔" } else { "•" };
            let line = vec![
                Span::raw(format!(" {symbol} {}", todo.text)),
                Span::styled(
                    format!("  {}", created_label(todo.created_at)),
                    Style::default().fg(Color::DarkGray),
                ),
            ];

            let style = if idx == selected {
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else if todo.is_completed {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(palette.title)
            };

            ListItem::new(Line::from(line)).style(style)
        })
        .collect();

    List::new(items)
        .block(card(
            "Tasks (j/k move ; a add ; e edit ; Space/Enter toggle ; d delete)",
            palette,
        ))
        .highlight_symbol("➤ ")
}

fn render_footer<'a, S: SnapshotSink>(app: &'a App<S>, palette: &Palette) -> Paragraph<'a> {
    let prompt = match app.mode {
        InputMode::Normal => {
            let msg = app.status.as_deref().unwrap_or("q quit ; a add new task");
            return Paragraph::new(msg).block(card("Normal", palette));
        }
        InputMode::Adding => ("New task: ", "Add (Enter to save / Esc to cancel)"),
        InputMode::Editing(_) => ("Edit task: ", "Edit (Enter to save / Esc to cancel)"),
    };
    let line = Line::from(vec![
        Span::raw(prompt.0),
        Span::styled(&app.input, Style::default().fg(palette.accent)),
        Span::raw("█"),
    ]);
    Paragraph::new(line).block(card(prompt.1, palette))
}

fn created_label(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|at| at.format(CREATED_FORMAT).ok())
        .unwrap_or_default()
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    use super::*;
    use crate::domain::store::{Recorder, TodoMap, TodoStore};
    use super::backdrop::Backdrop;

    fn screen<S: SnapshotSink>(app: &App<S>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn buffer_text(buffer: &Buffer) -> String {
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    fn app_with(todos: Option<TodoMap>) -> App<Recorder> {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(TodoStore::new(Recorder::default()), rx, Backdrop::Winter);
        if let Some(todos) = todos {
            tx.send(todos).unwrap();
            app.poll_load();
        }
        app
    }

    #[test]
    fn shows_loading_until_ready() {
        let app = app_with(None);
        let text = screen(&app);
        assert!(text.contains("Loading your tasks"));
        assert!(!text.contains("Open:"));
    }

    #[test]
    fn lists_tasks_oldest_first() {
        let todos: TodoMap = [
            Todo::with_created_at("third", 300),
            Todo::with_created_at("first", 100),
            Todo::with_created_at("second", 200),
        ]
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
        let app = app_with(Some(todos));
        let text = screen(&app);

        let first = text.find("first").unwrap();
        let second = text.find("second").unwrap();
        let third = text.find("third").unwrap();
        assert!(first < second && second < third);
        assert!(text.contains("Open: 3 / All: 3"));
    }

    #[test]
    fn empty_list_shows_hint() {
        let app = app_with(Some(TodoMap::new()));
        assert!(screen(&app).contains("No tasks yet"));
    }

    #[test]
    fn quit_works_while_loading() {
        let mut app = app_with(None);
        assert!(!handle_key(&mut app, KeyCode::Char('a')));
        assert_eq!(app.mode, InputMode::Normal);
        assert!(handle_key(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn keys_drive_add_and_toggle() {
        let mut app = app_with(Some(TodoMap::new()));
        handle_key(&mut app, KeyCode::Char('a'));
        for c in "milk".chars() {
            handle_key(&mut app, KeyCode::Char(c));
        }
        assert!(!handle_key(&mut app, KeyCode::Char('q')));
        handle_key(&mut app, KeyCode::Backspace);
        handle_key(&mut app, KeyCode::Enter);

        let todos = app.visible_todos();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].text, "milk");

        handle_key(&mut app, KeyCode::Char(' '));
        assert!(app.visible_todos()[0].is_completed);
    }

    #[test]
    fn created_label_formats_utc_minutes() {
        assert_eq!(created_label(0), "1970-01-01 00:00");
        assert_eq!(created_label(1_700_000_000_000), "2023-11-14 22:13");
    }
}
