// Screen composition: turns an `AppState` into styled text rows. Pure, so the
// layout can be tested without a terminal; `terminal.rs` does the drawing.

use chrono::{Local, TimeZone};

use crate::app::{AppState, Status, View};
use crate::models::{Datapoint, Goal};

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Title,
    Header,
    Selected,
    Info,
    Error,
    Footer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub tone: Tone,
}

impl Line {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Line {
            text: text.into(),
            tone,
        }
    }

    fn blank() -> Self {
        Line::new("", Tone::Plain)
    }
}

const COLUMNS: [(&str, usize); 8] = [
    ("Slug", 15),
    ("Title", 25),
    ("Current", 10),
    ("Target", 10),
    ("Derails", 16),
    ("Left", 9),
    ("Buffer", 7),
    ("Status", 7),
];

const LIST_KEYS: &str =
    "↑↓: Navigate | i: Details | r: Refresh | c: Add datapoint | w: Open in browser | q: Quit";
const DETAIL_KEYS: &str =
    "↑↓: Scroll | b: Back | r: Refresh | c: Add datapoint | w: Open in browser | q: Quit";

/// Rows title, (body...), status, footer. Always returns exactly `height`
/// lines, each at most `width` characters.
pub fn compose(state: &AppState, now: i64, width: u16, height: u16) -> Vec<Line> {
    let width = width as usize;
    let height = height as usize;
    // title + status + footer
    let body_rows = height.saturating_sub(3);

    let (title, mut body, keys) = match &state.view {
        View::List => (
            format!("Beeminder goals ({})", state.goals.len()),
            list_body(state, now, body_rows),
            LIST_KEYS,
        ),
        View::Detail { goal, scroll } => (
            format!("Goal: {}", goal.slug),
            detail_body(goal, *scroll, now, body_rows),
            DETAIL_KEYS,
        ),
    };
    body.resize(body_rows, Line::blank());

    let status = match &state.status {
        Some(Status::Info(msg)) => Line::new(msg.clone(), Tone::Info),
        Some(Status::Error(msg)) => Line::new(format!("Error: {msg}"), Tone::Error),
        None => Line::blank(),
    };

    let mut lines = Vec::with_capacity(height);
    lines.push(Line::new(center(&title, width), Tone::Title));
    lines.extend(body);
    lines.push(status);
    lines.push(Line::new(keys, Tone::Footer));
    lines.truncate(height);
    for line in &mut lines {
        line.text = clip(&line.text, width);
    }
    lines
}

fn list_body(state: &AppState, now: i64, rows: usize) -> Vec<Line> {
    let header = COLUMNS
        .iter()
        .map(|(name, w)| fit(name, *w))
        .collect::<Vec<_>>()
        .join("  ");
    let rule = "─".repeat(header.chars().count());
    let mut body = vec![Line::new(header, Tone::Header), Line::new(rule, Tone::Plain)];

    if state.goals.is_empty() {
        body.push(Line::new("No goals. Press r to refresh.", Tone::Plain));
        return body;
    }

    let visible = rows.saturating_sub(2).max(1);
    let offset = (state.selected + 1).saturating_sub(visible);
    for (idx, goal) in state.goals.iter().enumerate().skip(offset).take(visible) {
        let tone = if idx == state.selected {
            Tone::Selected
        } else {
            Tone::Plain
        };
        body.push(Line::new(goal_row(goal, now), tone));
    }
    body
}

fn goal_row(goal: &Goal, now: i64) -> String {
    let cells = [
        goal.slug.clone(),
        goal.display_title().to_string(),
        format_number(goal.curval),
        format_number(goal.goalval),
        format_date(goal.losedate),
        format_time_left(goal.losedate, now),
        goal.safebuf.map_or_else(|| "-".to_string(), |d| format!("{d}d")),
        goal.status().to_string(),
    ];
    cells
        .iter()
        .zip(COLUMNS.iter())
        .map(|(cell, (_, w))| fit(cell, *w))
        .collect::<Vec<_>>()
        .join("  ")
}

fn detail_body(goal: &Goal, scroll: usize, now: i64, rows: usize) -> Vec<Line> {
    let rate = match (goal.rate, goal.runits.as_deref()) {
        (Some(rate), Some(unit)) => format!("{rate:.2}/{unit}"),
        (Some(rate), None) => format!("{rate:.2}"),
        _ => "-".to_string(),
    };
    let fields = [
        ("Title", goal.title.clone()),
        ("Description", goal.description.clone()),
        ("Current value", goal.curval.map(|v| format_number(Some(v)))),
        ("Target value", goal.goalval.map(|v| format_number(Some(v)))),
        ("Target date", goal.goaldate.map(|t| format_date(Some(t)))),
        ("Rate", Some(rate)),
        ("Units", goal.gunits.clone()),
        ("Goal type", goal.goal_type.clone()),
        ("Pledge", goal.pledge.map(|p| format!("${p:.2}"))),
        ("Derails", goal.losedate.map(|t| format_date(Some(t)))),
        ("Time left", Some(format_time_left(goal.losedate, now))),
        ("Safe buffer", goal.safebuf.map(|d| format!("{d} days"))),
        ("Delta", goal.delta_text.clone()),
        ("Summary", goal.limsum.clone()),
        ("Status", Some(goal.status().to_string())),
        ("Auto data", goal.autodata.clone()),
        ("Fine print", goal.fineprint.clone()),
        ("Weekends off", goal.weekends_off.map(|w| if w { "Yes" } else { "No" }.to_string())),
        ("Tags", goal.tags.as_ref().map(|t| t.join(", "))),
        ("Last updated", goal.updated_at.map(|t| format_date(Some(t)))),
    ];

    let field_lines: Vec<Line> = fields
        .into_iter()
        .map(|(key, value)| {
            let value = value.filter(|v| !v.is_empty()).unwrap_or_else(|| "-".into());
            Line::new(format!("{:<16}{}", format!("{key}:"), value), Tone::Plain)
        })
        .collect();

    let mut point_lines = Vec::new();
    match &goal.datapoints {
        None => point_lines.push(Line::new("Datapoints not loaded.", Tone::Header)),
        Some(_) => {
            let points = goal.recent_datapoints();
            point_lines.push(Line::new(
                format!("Datapoints ({}), newest first", points.len()),
                Tone::Header,
            ));
            point_lines.extend(
                points
                    .iter()
                    .skip(scroll)
                    .map(|p| Line::new(datapoint_row(p), Tone::Plain)),
            );
        }
    }

    // Fields give way to the first few datapoints on short terminals.
    let reserved = point_lines.len().min(5) + 1;
    let mut body: Vec<Line> = field_lines
        .into_iter()
        .take(rows.saturating_sub(reserved))
        .collect();
    body.push(Line::blank());
    body.extend(point_lines);
    body.truncate(rows);
    body
}

fn datapoint_row(point: &Datapoint) -> String {
    let day = match (&point.daystamp, point.timestamp) {
        (Some(day), _) => day.clone(),
        (None, Some(ts)) => format_day(ts),
        (None, None) => "-".to_string(),
    };
    format!(
        "{:<10}  {:>10}  {}",
        day,
        format_number(Some(point.value)),
        point.comment.as_deref().unwrap_or("")
    )
}

pub fn format_number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

/// Local date and time of a unix timestamp.
pub fn format_date(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| Local.timestamp_opt(ts, 0).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn format_day(timestamp: i64) -> String {
    Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.format("%Y%m%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Remaining time until `losedate`, relative to `now` (both unix seconds).
pub fn format_time_left(losedate: Option<i64>, now: i64) -> String {
    let Some(losedate) = losedate else {
        return "N/A".to_string();
    };
    let left = losedate - now;
    if left < 0 {
        return "EXPIRED".to_string();
    }

    let days = left / 86_400;
    let hours = (left % 86_400) / 3_600;
    let minutes = (left % 3_600) / 60;
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Pad or truncate (with an ellipsis) to exactly `width` characters.
pub fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return format!("{text:<width$}");
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }
    let mut out: String = text.chars().take(width - 3).collect();
    out.push_str("...");
    out
}

fn clip(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let pad = width.saturating_sub(len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}
