use crate::dashboard::{DailySummary, Dashboard};
use crate::mood_entry::Mood;
use crate::sheet::{MOOD_COLUMN, NOTE_COLUMN, TIMESTAMP_COLUMN};
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, ListState, Paragraph, Row,
        Table},
    Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::Duration,
};
use unicode_width::UnicodeWidthChar;

const INPUT_POLL: Duration = Duration::from_millis(250);
const NOTE_PREVIEW_WIDTH: usize = 48;

pub enum Action {
    LogMood,
    PrevDay,
    NextDay,
    Today,
    Refresh,
    Quit,
}

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI { terminal })
    }

    pub fn display(&mut self, dashboard: &Dashboard) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(10),
                        Constraint::Length(9),
                        Constraint::Length(2),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            let title = Paragraph::new("Mood of the Queue")
                .style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .alignment(ratatui::layout::Alignment::Center);
            f.render_widget(title, chunks[0]);

            let summary_block = Block::default()
                .borders(Borders::ALL)
                .title(format!("📊 Mood Count on {}", dashboard.selected_date));
            if dashboard.is_empty() {
                let warning = Paragraph::new("Sheet is empty. Log some moods!")
                    .style(Style::default().fg(Color::Yellow))
                    .block(summary_block);
                f.render_widget(warning, chunks[1]);
            } else {
                match dashboard.summary() {
                    Ok(DailySummary::Counts(counts)) => {
                        let bars: Vec<Bar> = counts
                            .iter()
                            .map(|c| {
                                Bar::default()
                                    .label(Line::from(c.mood.clone()))
                                    .value(c.count)
                            })
                            .collect();
                        let chart = BarChart::default()
                            .block(summary_block)
                            .data(BarGroup::default().bars(&bars))
                            .bar_width(4)
                            .bar_gap(2)
                            .bar_style(Style::default().fg(Color::Cyan))
                            .value_style(
                                Style::default()
                                    .fg(Color::Black)
                                    .bg(Color::Cyan)
                                    .add_modifier(Modifier::BOLD),
                            );
                        f.render_widget(chart, chunks[1]);
                    }
                    Ok(DailySummary::NoData) => {
                        let info = Paragraph::new("No mood data for selected date.")
                            .style(Style::default().fg(Color::Blue))
                            .block(summary_block);
                        f.render_widget(info, chunks[1]);
                    }
                    Err(e) => {
                        let error = Paragraph::new(format!("Error reading data: {e}"))
                            .style(Style::default().fg(Color::Red))
                            .block(summary_block);
                        f.render_widget(error, chunks[1]);
                    }
                }
            }

            let logs_block = Block::default()
                .borders(Borders::ALL)
                .title("📃 Recent Mood Logs");
            if dashboard.is_empty() {
                let warning = Paragraph::new("No moods logged yet.")
                    .style(Style::default().fg(Color::Yellow))
                    .block(logs_block);
                f.render_widget(warning, chunks[2]);
            } else {
                let rows: Vec<Row> = dashboard
                    .recent()
                    .iter()
                    .map(|record| {
                        let cell = |column: &str| {
                            record.get(column).map(String::as_str).unwrap_or("")
                        };
                        Row::new(vec![
                            cell(TIMESTAMP_COLUMN).to_string(),
                            cell(MOOD_COLUMN).to_string(),
                            clip(cell(NOTE_COLUMN), NOTE_PREVIEW_WIDTH),
                        ])
                    })
                    .collect();
                let table = Table::new(
                    rows,
                    [
                        Constraint::Length(19),
                        Constraint::Length(6),
                        Constraint::Min(10),
                    ],
                )
                .header(
                    Row::new(vec![TIMESTAMP_COLUMN, MOOD_COLUMN, NOTE_COLUMN])
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                )
                .block(logs_block);
                f.render_widget(table, chunks[2]);
            }

            let status = if let Some(error) = &dashboard.remote_error {
                Line::from(Span::styled(
                    error.clone(),
                    Style::default().fg(Color::Red),
                ))
            } else if let Some(flash) = &dashboard.flash {
                Line::from(Span::styled(
                    flash.clone(),
                    Style::default().fg(Color::Green),
                ))
            } else {
                Line::default()
            };
            let controls = Line::from(vec![
                Span::raw("Press "),
                Span::styled("l", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" to log a mood, "),
                Span::styled("←/→", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" to change date, "),
                Span::styled("t", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" for today, "),
                Span::styled("r", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" to refresh, "),
                Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" to quit"),
            ]);
            let footer = Paragraph::new(vec![status, controls])
                .style(Style::default().fg(Color::Yellow))
                .alignment(ratatui::layout::Alignment::Center);
            f.render_widget(footer, chunks[3]);
        })?;

        Ok(())
    }

    /// Polls briefly so the caller's loop keeps ticking for the timed
    /// refresh even when nobody touches the keyboard.
    pub fn handle_input(&self) -> Result<Option<Action>> {
        if !event::poll(INPUT_POLL)? {
            return Ok(None);
        }
        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('l') => Ok(Some(Action::LogMood)),
                KeyCode::Left => Ok(Some(Action::PrevDay)),
                KeyCode::Right => Ok(Some(Action::NextDay)),
                KeyCode::Char('t') => Ok(Some(Action::Today)),
                KeyCode::Char('r') => Ok(Some(Action::Refresh)),
                KeyCode::Char('q') => Ok(Some(Action::Quit)),
                _ => Ok(None),
            }
        } else {
            Ok(None)
        }
    }

    /// Mood form: single-select over the fixed categories plus an optional
    /// note. Only Enter writes anything; Esc leaves without a row.
    pub fn log_mood_form(&mut self) -> Result<Option<(Mood, String)>> {
        let mut selected = 0;
        let mut note = String::new();

        loop {
            self.terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints(
                        [
                            Constraint::Length(3),
                            Constraint::Length(7),
                            Constraint::Length(3),
                            Constraint::Length(3),
                        ]
                        .as_ref(),
                    )
                    .split(f.area());

                let title = Paragraph::new("📝 Log a Mood")
                    .style(
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    )
                    .alignment(ratatui::layout::Alignment::Center);
                f.render_widget(title, chunks[0]);

                let moods: Vec<ListItem> = Mood::ALL
                    .iter()
                    .map(|mood| ListItem::new(mood.label()))
                    .collect();
                let mood_list = List::new(moods)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title("What's the vibe?"),
                    )
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");
                f.render_stateful_widget(
                    mood_list,
                    chunks[1],
                    &mut ListState::default().with_selected(Some(selected)),
                );

                let note_input = Paragraph::new(note.clone()).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Optional Note"),
                );
                f.render_widget(note_input, chunks[2]);

                let instructions =
                    Paragraph::new("Up/Down: Select mood, Enter: Submit, Esc: Cancel")
                        .style(Style::default().fg(Color::Yellow))
                        .alignment(ratatui::layout::Alignment::Center);
                f.render_widget(instructions, chunks[3]);
            })?;

            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Up => selected = selected.saturating_sub(1),
                    KeyCode::Down => {
                        if selected < Mood::ALL.len() - 1 {
                            selected += 1;
                        }
                    }
                    KeyCode::Char(c) => {
                        note.push(c);
                    }
                    KeyCode::Backspace => {
                        note.pop();
                    }
                    KeyCode::Enter => return Ok(Some((Mood::ALL[selected], note))),
                    KeyCode::Esc => return Ok(None),
                    _ => {}
                }
            }
        }
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        disable_raw_mode().unwrap();
        stdout().execute(LeaveAlternateScreen).unwrap();
    }
}

/// Truncates to a display-cell limit so emoji and wide glyphs in notes
/// cannot push the table off the row.
fn clip(text: &str, max_width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return text.to_string();
    }
    let mut width = 0;
    let mut clipped = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width.saturating_sub(1) {
            break;
        }
        width += w;
        clipped.push(c);
    }
    clipped.push('…');
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_leaves_short_text_alone() {
        assert_eq!(clip("fine", 10), "fine");
    }

    #[test]
    fn clip_truncates_by_display_width_not_chars() {
        // Each emoji occupies two cells.
        assert_eq!(clip("😊😊😊😊", 6), "😊😊…");
    }
}
