//! SVG rendering of the summary charts.
//!
//! Charts are plain SVG text so the HTML report is a single self-contained
//! file. Every bucket label is drawn on the x axis, including zero buckets.

use crate::bucketizer::{Dimension, SummaryTable};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 56.0;
const TARGET_TICKS: usize = 5;
const BAR_COLOR: &str = "#3b6ea5";
const LINE_COLOR: &str = "#b5443b";
const GRID_COLOR: &str = "#dddddd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
}

/// A titled chart over one summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
    pub points: Vec<(String, usize)>,
}

impl Chart {
    /// Line chart for the yearly summary, bar chart for every other dimension.
    pub fn from_summary(summary: &SummaryTable) -> Self {
        let (title, kind) = match summary.dimension {
            Dimension::Year => ("Shooting Incidents per Year", ChartKind::Line),
            Dimension::Month => ("Shooting Incidents by Month", ChartKind::Bar),
            Dimension::DayOfWeek => ("Shooting Incidents by Day of Week", ChartKind::Bar),
            Dimension::Hour => ("Shooting Incidents by Hour of Day", ChartKind::Bar),
        };
        Self {
            title: title.to_string(),
            x_label: summary.dimension.display_name().to_string(),
            y_label: "Incidents".to_string(),
            kind,
            points: summary
                .buckets
                .iter()
                .map(|b| (b.label.clone(), b.count))
                .collect(),
        }
    }

    /// Render as a standalone `<svg>` element.
    pub fn render_svg(&self, width: u32, height: u32) -> String {
        let mut svg = String::new();
        // Writing to a String cannot fail.
        self.write_svg(&mut svg, width, height).ok();
        svg
    }

    fn write_svg(&self, out: &mut impl Write, width: u32, height: u32) -> fmt::Result {
        let w = width as f64;
        let h = height as f64;
        let plot_w = (w - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
        let plot_h = (h - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);
        let base_y = MARGIN_TOP + plot_h;

        let max_count = self.points.iter().map(|(_, c)| *c).max().unwrap_or(0);
        let (step, top) = y_axis_scale(max_count);
        let y_of = |count: usize| base_y - (count as f64 / top as f64) * plot_h;

        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif" font-size="11" role="img" aria-label="{}">"#,
            escape_xml(&self.title)
        )?;
        writeln!(
            out,
            r#"<text x="{:.1}" y="20" text-anchor="middle" font-size="15" font-weight="bold">{}</text>"#,
            w / 2.0,
            escape_xml(&self.title)
        )?;

        // Gridlines and y tick labels
        let mut tick = 0;
        while tick <= top {
            let y = y_of(tick);
            writeln!(
                out,
                r#"<line x1="{MARGIN_LEFT:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{GRID_COLOR}"/>"#,
                MARGIN_LEFT + plot_w
            )?;
            writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{tick}</text>"#,
                MARGIN_LEFT - 6.0,
                y + 4.0
            )?;
            tick += step;
        }

        writeln!(
            out,
            r#"<line x1="{MARGIN_LEFT:.1}" y1="{base_y:.1}" x2="{:.1}" y2="{base_y:.1}" stroke="black"/>"#,
            MARGIN_LEFT + plot_w
        )?;
        writeln!(
            out,
            r#"<line x1="{MARGIN_LEFT:.1}" y1="{MARGIN_TOP:.1}" x2="{MARGIN_LEFT:.1}" y2="{base_y:.1}" stroke="black"/>"#
        )?;

        let n = self.points.len().max(1) as f64;
        let slot = plot_w / n;
        let center_of = |i: usize| MARGIN_LEFT + slot * (i as f64 + 0.5);

        match self.kind {
            ChartKind::Bar => {
                let bar_w = slot * 0.7;
                for (i, (label, count)) in self.points.iter().enumerate() {
                    let y = y_of(*count);
                    writeln!(
                        out,
                        r#"<rect x="{:.1}" y="{y:.1}" width="{bar_w:.1}" height="{:.1}" fill="{BAR_COLOR}"><title>{}: {count}</title></rect>"#,
                        center_of(i) - bar_w / 2.0,
                        base_y - y,
                        escape_xml(label)
                    )?;
                }
            }
            ChartKind::Line => {
                let path: Vec<String> = self
                    .points
                    .iter()
                    .enumerate()
                    .map(|(i, (_, count))| format!("{:.1},{:.1}", center_of(i), y_of(*count)))
                    .collect();
                if !path.is_empty() {
                    writeln!(
                        out,
                        r#"<polyline points="{}" fill="none" stroke="{LINE_COLOR}" stroke-width="2"/>"#,
                        path.join(" ")
                    )?;
                }
                for (i, (label, count)) in self.points.iter().enumerate() {
                    writeln!(
                        out,
                        r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="{LINE_COLOR}"><title>{}: {count}</title></circle>"#,
                        center_of(i),
                        y_of(*count),
                        escape_xml(label)
                    )?;
                }
            }
        }

        // Dense axes get rotated labels so all of them stay readable.
        let rotate = self.points.len() > 12;
        for (i, (label, _)) in self.points.iter().enumerate() {
            let x = center_of(i);
            let y = base_y + 16.0;
            if rotate {
                writeln!(
                    out,
                    r#"<text x="{x:.1}" y="{y:.1}" text-anchor="end" transform="rotate(-45 {x:.1} {y:.1})">{}</text>"#,
                    escape_xml(label)
                )?;
            } else {
                writeln!(
                    out,
                    r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle">{}</text>"#,
                    escape_xml(label)
                )?;
            }
        }

        writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>"#,
            MARGIN_LEFT + plot_w / 2.0,
            h - 8.0,
            escape_xml(&self.x_label)
        )?;
        writeln!(
            out,
            r#"<text x="14" y="{:.1}" text-anchor="middle" font-size="12" transform="rotate(-90 14 {:.1})">{}</text>"#,
            MARGIN_TOP + plot_h / 2.0,
            MARGIN_TOP + plot_h / 2.0,
            escape_xml(&self.y_label)
        )?;
        if self.points.is_empty() {
            writeln!(
                out,
                r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" fill="#888888">No data</text>"##,
                MARGIN_LEFT + plot_w / 2.0,
                MARGIN_TOP + plot_h / 2.0
            )?;
        }
        writeln!(out, "</svg>")
    }
}

/// Tick step and axis maximum for counts up to `max`.
///
/// The step is 1, 2 or 5 times a power of ten, and the axis top is the
/// smallest multiple of the step that is at least `max`.
pub(crate) fn y_axis_scale(max: usize) -> (usize, usize) {
    if max == 0 {
        return (1, 1);
    }
    let rough = (max as f64 / TARGET_TICKS as f64).max(1.0);
    let magnitude = 10f64.powf(rough.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= rough)
        .unwrap_or(10.0 * magnitude) as usize;
    let step = step.max(1);
    let top = max.div_ceil(step) * step;
    (step, top)
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucketizer::{BucketCount, HOURS_PER_DAY};
    use pretty_assertions::assert_eq;

    fn table(dimension: Dimension, counts: &[(&str, usize)]) -> SummaryTable {
        SummaryTable {
            dimension,
            buckets: counts
                .iter()
                .map(|(label, count)| BucketCount {
                    label: label.to_string(),
                    count: *count,
                })
                .collect(),
        }
    }

    #[test]
    fn test_year_is_line_chart_others_are_bars() {
        let year = Chart::from_summary(&table(Dimension::Year, &[("2019", 1)]));
        assert_eq!(year.kind, ChartKind::Line);
        let month = Chart::from_summary(&table(Dimension::Month, &[("Jan", 1)]));
        assert_eq!(month.kind, ChartKind::Bar);
    }

    #[test]
    fn test_every_hour_label_drawn() {
        let counts: Vec<(String, usize)> = (0..HOURS_PER_DAY).map(|h| (h.to_string(), h % 3)).collect();
        let refs: Vec<(&str, usize)> = counts.iter().map(|(l, c)| (l.as_str(), *c)).collect();
        let svg = Chart::from_summary(&table(Dimension::Hour, &refs)).render_svg(760, 360);

        assert_eq!(svg.matches("<rect").count(), HOURS_PER_DAY);
        for h in 0..HOURS_PER_DAY {
            assert!(svg.contains(&format!(">{}</text>", h)), "hour {h} missing");
        }
    }

    #[test]
    fn test_line_chart_has_one_marker_per_point() {
        let svg = Chart::from_summary(&table(
            Dimension::Year,
            &[("2018", 5), ("2019", 0), ("2020", 9)],
        ))
        .render_svg(600, 300);
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_empty_chart_renders_placeholder() {
        let svg = Chart::from_summary(&table(Dimension::Year, &[])).render_svg(600, 300);
        assert!(svg.contains("No data"));
        assert!(!svg.contains("<polyline"));
    }

    #[test]
    fn test_y_axis_scale() {
        assert_eq!(y_axis_scale(0), (1, 1));
        assert_eq!(y_axis_scale(3), (1, 3));
        assert_eq!(y_axis_scale(9), (2, 10));
        assert_eq!(y_axis_scale(47), (10, 50));
        assert_eq!(y_axis_scale(2011), (500, 2500));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
