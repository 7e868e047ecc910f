use crate::application::SessionState;
use crate::domain::{CropRecommendation, QaResponse, TipEntry};
use crate::presentation::input::{Field, Screen};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub const PROFIT_BAR_MAX_INR: f64 = 500_000.0;
pub const YIELD_BAR_MAX_KG: f64 = 80_000.0;
const BAR_WIDTH: usize = 12;

pub fn render_ui(f: &mut Frame, state: &SessionState, screen: &Screen, locale: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, locale, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(columns[0]);
    render_setup(f, state, screen, left[0]);
    render_recommendations(f, state, left[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(columns[1]);
    render_ask(f, state, screen, right[0]);
    render_tips(f, state, screen, right[1]);

    render_status_bar(f, state, screen, chunks[2]);

    if screen.show_help {
        render_help_popup(f);
    }
}

fn render_header(f: &mut Frame, locale: &str, area: Rect) {
    let header = Paragraph::new(format!(
        "AgroMind Smart - weather-aware crop advisor | Locale: {}",
        locale
    ))
    .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD));
    f.render_widget(header, area);
}

fn field_line<'a>(label: &'a str, value: String, field: Field, screen: &Screen) -> Line<'a> {
    let style = if screen.focus == field {
        Style::default().bg(Color::Green).fg(Color::Black)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{:<22}", label), Style::default().fg(Color::Gray)),
        Span::styled(value, style),
    ])
}

fn render_setup(f: &mut Frame, state: &SessionState, screen: &Screen, area: Rect) {
    let lines = vec![
        Line::from(vec![
            Span::styled(format!("{:<22}", "Detected location"), Style::default().fg(Color::Gray)),
            Span::raw(location_label(state)),
        ]),
        field_line("Or enter city", state.city.clone(), Field::City, screen),
        field_line(
            "Water availability",
            format!("< {} >", state.form.water_access.label()),
            Field::WaterAccess,
            screen,
        ),
        field_line("Goal", format!("< {} >", state.form.goal.label()), Field::Goal, screen),
        field_line("Farm size (acres)", state.form.farm_acres.clone(), Field::FarmAcres, screen),
        Line::from(Span::styled(
            submit_label(state.loading),
            if state.loading {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Green)
            },
        )),
    ];
    let setup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Quick Setup"),
    );
    f.render_widget(setup, area);
}

fn render_recommendations(f: &mut Frame, state: &SessionState, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    if let Some(error) = &state.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }

    if let Some(recs) = &state.recommendation {
        lines.push(Line::from(vec![
            Span::raw("Primary: "),
            Span::styled(recs.primary.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" | Backup: "),
            Span::styled(recs.backup.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]));
        for rec in &recs.recommendations {
            lines.push(Line::raw(""));
            lines.extend(recommendation_lines(rec));
        }
    } else if state.error.is_none() && !state.loading {
        lines.push(Line::from(Span::styled(
            "Allow location for best results (optional), or type your city name.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Recommendations"));
    f.render_widget(widget, area);
}

pub fn recommendation_lines(rec: &CropRecommendation) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                rec.crop.clone(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  Score {}", rec.final_score)),
        ]),
        Line::from(Span::styled(
            rec.explanations.join(" • "),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
        Line::raw(format!(
            "Profit ₹{:<12} {}",
            format_amount(rec.estimated_profit_inr),
            bar(rec.estimated_profit_inr, PROFIT_BAR_MAX_INR)
        )),
        Line::raw(format!(
            "Yield  {:<9} kg {}",
            format_amount(rec.estimated_yield_kg),
            bar(rec.estimated_yield_kg, YIELD_BAR_MAX_KG)
        )),
        Line::raw(format!(
            "Sustainability {}% {}",
            rec.sustainability,
            bar(rec.sustainability / 100.0, 1.0)
        )),
        Line::raw(format!("Risks: {}", risk_summary(&rec.warnings))),
    ];
    for year in &rec.sim_projection {
        lines.push(Line::from(Span::styled(
            format!(
                "  Year {}  Yield: {} kg • ₹{}",
                year.year,
                format_amount(year.yield_kg),
                format_amount(year.profit_inr)
            ),
            Style::default().fg(Color::Gray),
        )));
    }
    lines
}

fn render_ask(f: &mut Frame, state: &SessionState, screen: &Screen, area: Rect) {
    let mut lines = vec![field_line("Question", state.question.clone(), Field::Question, screen)];
    match &state.qa {
        Some(QaResponse::Answer { answer, source }) => {
            lines.push(Line::from(Span::styled(
                format!("Source: {}", source),
                Style::default().fg(Color::DarkGray),
            )));
            lines.push(Line::raw(answer.clone()));
        }
        Some(QaResponse::Failure { error }) => {
            lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
        }
        None => {}
    }
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Ask AgroMind"));
    f.render_widget(widget, area);
}

fn render_tips(f: &mut Frame, state: &SessionState, screen: &Screen, area: Rect) {
    let mut lines = vec![
        field_line("Your name (optional)", state.tip_author.clone(), Field::TipAuthor, screen),
        field_line("Share a tip", state.tip_text.clone(), Field::TipText, screen),
        Line::raw(""),
    ];
    if state.tips.is_empty() {
        lines.push(Line::from(Span::styled("No tips yet.", Style::default().fg(Color::DarkGray))));
    }
    for tip in &state.tips {
        lines.push(Line::raw(tip.tip.clone()));
        lines.push(Line::from(Span::styled(
            format!("— {} • {}", tip.author, tip_time_label(tip)),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Community Tips"));
    f.render_widget(widget, area);
}

fn render_status_bar(f: &mut Frame, state: &SessionState, screen: &Screen, area: Rect) {
    let text = if state.loading {
        "Analyzing... | Tab: next field | F1: help | Esc: quit".to_string()
    } else {
        let hint = match screen.focus {
            Field::WaterAccess | Field::Goal => "←→: change | Enter: get recommendations",
            Field::City | Field::FarmAcres => "Enter: get recommendations | Ctrl+R: reset",
            Field::Question => "Enter: ask | Ctrl+L: clear",
            Field::TipAuthor | Field::TipText => "Enter: share | Ctrl+K: clear",
        };
        format!("{} | Tab: next field | F1: help | Esc: quit", hint)
    };
    let status = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, area);
}

fn render_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 5,
        y: area.height / 5,
        width: area.width * 3 / 5,
        height: area.height * 3 / 5,
    };

    f.render_widget(Clear, popup_area);
    let help = Paragraph::new(HELP_TEXT)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("AgroMind Help")
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));
    f.render_widget(help, popup_area);
}

const HELP_TEXT: &str = "Tab / Shift+Tab   Move between fields
←→                Change water availability or goal
Enter             Submit the focused panel
Ctrl+R            Reset recommendations
Ctrl+L            Clear question and answer
Ctrl+K            Clear tip inputs
F1 / Esc          Close this help
Esc / Ctrl+C      Quit";

pub fn submit_label(loading: bool) -> &'static str {
    if loading {
        "[ Analyzing... ]"
    } else {
        "[ Get Recommendations ]"
    }
}

pub fn location_label(state: &SessionState) -> String {
    match state.coords {
        Some(coords) => format!("{:.3}, {:.3}", coords.lat, coords.lon),
        None => "Not available".to_string(),
    }
}

pub fn risk_summary(warnings: &[String]) -> String {
    if warnings.is_empty() {
        "Low".to_string()
    } else {
        warnings.join("; ")
    }
}

pub fn tip_time_label(tip: &TipEntry) -> String {
    tip.posted_at()
        .map(|t| t.format("%d %b %Y %H:%M").to_string())
        .unwrap_or_else(|| tip.time.clone())
}

/// Fraction of `max` as a percentage, clamped to `0..=100`.
pub fn bar_percent(value: f64, max: f64) -> u16 {
    if max <= 0.0 || !value.is_finite() {
        return 0;
    }
    ((value / max) * 100.0).round().clamp(0.0, 100.0) as u16
}

fn bar(value: f64, max: f64) -> String {
    let filled = usize::from(bar_percent(value, max)) * BAR_WIDTH / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Rounds to a whole number and groups thousands with commas.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
