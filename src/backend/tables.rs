//! Table detection from text positions.
//!
//! Tables are found without ruling lines: spans are grouped into rows by
//! baseline, column edges are the left-edge positions that recur across
//! rows, and runs of consecutive rows aligned to those edges form a table.

use std::collections::{HashMap, HashSet};

use super::content::TextSpan;
use super::TableGrid;

/// Left edges within this distance share a bucket.
const EDGE_BUCKET: f32 = 5.0;
/// Distance within which a span counts as aligned to a column edge.
const ALIGN_TOLERANCE: f32 = 5.0;

/// A detected table region.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Baseline of the first row (PDF coordinates)
    pub top_y: f32,
    /// Baseline of the last row
    pub bottom_y: f32,
    pub left_x: f32,
    pub right_x: f32,
    /// Column left edges, ascending
    pub columns: Vec<f32>,
    pub rows: Vec<TableRowData>,
}

impl DetectedTable {
    /// Convert to a row-major cell grid, one cell per column.
    ///
    /// Spans falling into the same cell are joined with a space.
    pub fn to_grid(&self) -> TableGrid {
        self.rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Vec<&str>> = vec![Vec::new(); self.columns.len()];
                for span in &row.spans {
                    let col = column_for(span.x, &self.columns);
                    if let Some(cell) = cells.get_mut(col) {
                        cell.push(span.text.trim());
                    }
                }
                cells.into_iter().map(|parts| parts.join(" ")).collect()
            })
            .collect()
    }
}

/// Spans sharing a baseline.
#[derive(Debug, Clone)]
pub struct TableRowData {
    /// Mean baseline of the row
    pub y: f32,
    /// Spans sorted by X
    pub spans: Vec<TextSpan>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    pub min_rows: usize,
    pub min_columns: usize,
    /// Above this many columns the alignment is most likely word-level splitting
    pub max_columns: usize,
    /// Row grouping tolerance as a fraction of font size
    pub y_tolerance_factor: f32,
    /// Minimum fraction of a row's spans that must sit on column edges
    pub min_alignment_ratio: f32,
    /// Minimum distance between two column edges (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Detects tables in the spans of one page.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect table regions, top to bottom.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<DetectedTable> {
        let cfg = &self.config;
        if spans.len() < cfg.min_rows * cfg.min_columns {
            return Vec::new();
        }

        let rows = self.group_into_rows(spans);
        if rows.len() < cfg.min_rows {
            return Vec::new();
        }

        let page_columns = self.detect_columns(&rows);
        log::debug!(
            "TableDetector: {} spans, {} rows, column edges {:?}",
            spans.len(),
            rows.len(),
            page_columns
        );
        if page_columns.len() < cfg.min_columns {
            return Vec::new();
        }

        let mut tables = Vec::new();
        for (start, end) in self.find_table_regions(&rows, &page_columns) {
            let table_rows = rows[start..=end].to_vec();
            let columns = self.detect_columns(&table_rows);

            if columns.len() < cfg.min_columns {
                continue;
            }
            if columns.len() > cfg.max_columns {
                log::debug!(
                    "TableDetector: skipping region with {} columns (max {})",
                    columns.len(),
                    cfg.max_columns
                );
                continue;
            }
            if is_list_pattern(&table_rows, &columns) {
                log::debug!("TableDetector: skipping region that looks like a list");
                continue;
            }

            let all_spans = || table_rows.iter().flat_map(|r| r.spans.iter());
            let left_x = all_spans().map(|s| s.x).fold(f32::INFINITY, f32::min);
            let right_x = all_spans().map(|s| s.x + s.width).fold(f32::NEG_INFINITY, f32::max);

            tables.push(DetectedTable {
                top_y: table_rows[0].y,
                bottom_y: table_rows[table_rows.len() - 1].y,
                left_x,
                right_x,
                columns,
                rows: table_rows,
            });
        }

        tables
    }

    /// Group spans into rows by baseline, top to bottom.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<TableRowData> {
        let mut sorted = spans.to_vec();
        sorted.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current: Vec<TextSpan> = Vec::new();
        let mut anchor_y: Option<f32> = None;

        let flush = |current: &mut Vec<TextSpan>, rows: &mut Vec<TableRowData>| {
            if !current.is_empty() {
                let y = current.iter().map(|s| s.y).sum::<f32>() / current.len() as f32;
                rows.push(TableRowData {
                    y,
                    spans: std::mem::take(current),
                });
            }
        };

        for span in sorted {
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            if !anchor_y.is_some_and(|y| (span.y - y).abs() <= tolerance) {
                flush(&mut current, &mut rows);
                anchor_y = Some(span.y);
            }
            current.push(span);
        }
        flush(&mut current, &mut rows);

        rows
    }

    /// Column edges: bucketed left edges that recur in enough rows.
    ///
    /// Rows with at least two spans carry the column signal; when too few
    /// such rows exist every row is counted instead.
    fn detect_columns(&self, rows: &[TableRowData]) -> Vec<f32> {
        let multi_span: Vec<&TableRowData> = rows.iter().filter(|r| r.spans.len() >= 2).collect();
        let considered: Vec<&TableRowData> = if multi_span.len() >= self.config.min_rows {
            multi_span
        } else {
            rows.iter().collect()
        };
        if considered.is_empty() {
            return Vec::new();
        }

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &considered {
            let buckets: HashSet<i32> = row
                .spans
                .iter()
                .map(|s| (s.x / EDGE_BUCKET).round() as i32)
                .collect();
            for bucket in buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((considered.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(bucket, _)| bucket as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut merged: Vec<f32> = Vec::with_capacity(edges.len());
        for edge in edges {
            if merged
                .last()
                .map_or(true, |last| edge - last >= self.config.min_column_gap)
            {
                merged.push(edge);
            }
        }
        merged
    }

    /// Inclusive row ranges where consecutive rows align with the columns.
    fn find_table_regions(&self, rows: &[TableRowData], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if alignment_score(row, columns) >= self.config.min_alignment_ratio {
                start.get_or_insert(i);
            } else if let Some(s) = start.take() {
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }
}

/// Fraction of a row's spans starting on a column edge.
fn alignment_score(row: &TableRowData, columns: &[f32]) -> f32 {
    if row.spans.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .spans
        .iter()
        .filter(|s| columns.iter().any(|c| (s.x - c).abs() <= ALIGN_TOLERANCE))
        .count();
    aligned as f32 / row.spans.len() as f32
}

/// Index of the column a span's left edge falls into.
fn column_for(x: f32, columns: &[f32]) -> usize {
    // Spans may start slightly left of their column edge
    const SLACK: f32 = 10.0;
    columns
        .iter()
        .rposition(|&edge| x >= edge - SLACK)
        .unwrap_or(0)
}

/// Whether the "table" is really a bulleted or numbered list.
///
/// A list marker and its item text become two spans at different X
/// positions, which looks like a two-column table.
fn is_list_pattern(rows: &[TableRowData], columns: &[f32]) -> bool {
    if columns.len() < 2 || rows.is_empty() {
        return false;
    }

    let (mut bullets, mut numbers) = (0usize, 0usize);
    for row in rows {
        let first = row
            .spans
            .iter()
            .min_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        match first.map(|s| s.text.trim()) {
            Some(text) if is_bullet_marker(text) => bullets += 1,
            Some(text) if is_number_marker(text) => numbers += 1,
            _ => {}
        }
    }

    let total = rows.len() as f32;
    let bullet_ratio = bullets as f32 / total;
    let marker_ratio = (bullets + numbers) as f32 / total;

    // Numbered first columns are common in real tables, so only
    // two-column regions are rejected on numbers alone
    bullet_ratio >= 0.5 || (columns.len() == 2 && marker_ratio >= 0.5)
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "※"
            | "□" | "◆" | "◇" | "▶" | "▷" | "☞" | "➤" | "➜"
    )
}

/// "1.", "12)", "3", "a.", "B)".
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    let digits = cleaned.chars().take_while(|c| c.is_ascii_digit()).count();
    let rest = &cleaned[digits..];
    if digits > 0 && (rest.is_empty() || rest == "." || rest == ")") {
        return true;
    }

    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}
