use crate::dates;
use crate::models::{Task, TaskStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct GanttRow {
    pub label: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub status: TaskStatus,
}

/// Column spans for one row: `offset` blank cells, then `duration` bar cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarSpan {
    pub offset: usize,
    pub duration: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GanttLayout {
    pub domain_start: i64,
    pub domain_end: i64,
    pub bars: Vec<BarSpan>,
}

/// Chart rows for a task list. Unreadable dates fall back to `now_ms`.
pub fn derive_rows(tasks: &[Task], now_ms: i64) -> Vec<GanttRow> {
    tasks
        .iter()
        .map(|task| GanttRow {
            label: task.title.clone(),
            start_ms: dates::to_epoch_millis(&task.start_date).unwrap_or(now_ms),
            end_ms: dates::to_epoch_millis(&task.end_date).unwrap_or(now_ms),
            status: task.status,
        })
        .collect()
}

pub fn layout(rows: &[GanttRow], width: usize) -> Option<GanttLayout> {
    if rows.is_empty() || width == 0 {
        return None;
    }

    let domain_start = rows.iter().map(|r| r.start_ms.min(r.end_ms)).min()?;
    let domain_end = rows.iter().map(|r| r.end_ms.max(r.start_ms)).max()?;
    let span = (domain_end - domain_start).max(1) as f64;
    let cells = width as f64;

    let column = |ms: i64| -> usize {
        let fraction = (ms - domain_start) as f64 / span;
        ((fraction * cells).round() as usize).min(width - 1)
    };

    let bars = rows
        .iter()
        .map(|row| {
            let offset = column(row.start_ms);
            let end = if row.end_ms > row.start_ms {
                column(row.end_ms)
            } else {
                offset
            };
            BarSpan {
                offset,
                duration: (end - offset).max(1).min(width - offset),
            }
        })
        .collect();

    Some(GanttLayout {
        domain_start,
        domain_end,
        bars,
    })
}

/// Plain-text chart for terminals without the TUI.
pub fn render_text(rows: &[GanttRow], width: usize) -> Vec<String> {
    let Some(layout) = layout(rows, width) else {
        return Vec::new();
    };
    let label_width = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0).min(24);

    let mut lines: Vec<String> = rows
        .iter()
        .zip(&layout.bars)
        .map(|(row, bar)| {
            let label: String = row.label.chars().take(label_width).collect();
            format!(
                "{:<label_width$} |{}{}",
                label,
                "░".repeat(bar.offset),
                "█".repeat(bar.duration),
            )
        })
        .collect();

    lines.push(format!(
        "{:<label_width$} {} .. {}",
        "",
        dates::axis_label(layout.domain_start),
        dates::axis_label(layout.domain_end),
    ));
    lines
}
