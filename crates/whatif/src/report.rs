//! Plain-text rendering of shaped results

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;
use whatif_core::analysis::{heatmap_axes, heatmap_value};
use whatif_core::model::{HeatmapPoint, ParamValue, RowMetrics, ScenarioRow};

const CELL_WIDTH: usize = 9;

/// Format a probability as a percentage
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Format a currency value in compact form (e.g., $2.1M, $450K, $50)
pub fn format_compact_currency(value: f64) -> String {
    let abs_value = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };

    if abs_value >= 1_000_000.0 {
        format!("{sign}${:.1}M", abs_value / 1_000_000.0)
    } else if abs_value >= 1_000.0 {
        format!("{sign}${:.0}K", abs_value / 1_000.0)
    } else {
        format!("{sign}${abs_value:.0}")
    }
}

fn format_value(value: &ParamValue) -> String {
    match value {
        ParamValue::Number(n) => format!("{n:+}"),
        ParamValue::Flag(b) => b.to_string(),
        ParamValue::Choice(s) => s.clone(),
    }
}

/// `field change` pairs joined by commas, or `(baseline)` when empty
pub fn format_changes(changes: &BTreeMap<String, ParamValue>) -> String {
    if changes.is_empty() {
        return "(baseline)".to_string();
    }
    changes
        .iter()
        .map(|(field, value)| format!("{field} {}", format_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Scenario comparison table, one line per row in input order
pub fn render_scenario_table(rows: &[ScenarioRow]) -> String {
    let name_width = rows
        .iter()
        .map(|r| r.name.len())
        .chain(std::iter::once("Scenario".len()))
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<name_width$}  {:>CELL_WIDTH$}  {:>CELL_WIDTH$}  Changes",
        "Scenario", "Success", "Median"
    );

    for row in rows {
        let (success, median, note) = match &row.metrics {
            RowMetrics::Available {
                success_probability,
                ending_median,
            } => (
                format_percentage(*success_probability),
                format_compact_currency(*ending_median),
                String::new(),
            ),
            RowMetrics::Unavailable { error } => (
                "n/a".to_string(),
                "n/a".to_string(),
                format!("  (unavailable: {error})"),
            ),
        };
        let _ = writeln!(
            out,
            "{:<name_width$}  {success:>CELL_WIDTH$}  {median:>CELL_WIDTH$}  {}{note}",
            row.name,
            format_changes(&row.changes)
        );
    }
    out
}

/// Parameter x variation grid of success probabilities.
///
/// Rows follow the order parameters first appear in; columns are the sorted
/// union of variations. Missing points are blank cells.
pub fn render_heatmap(points: &[HeatmapPoint]) -> String {
    let axes = heatmap_axes(points);
    if axes.is_empty() {
        return "no sensitivity points\n".to_string();
    }

    let label_width = axes
        .parameters
        .iter()
        .map(String::len)
        .chain(std::iter::once("Parameter".len()))
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    let _ = write!(out, "{:<label_width$}", "Parameter");
    for variation in &axes.variations {
        let _ = write!(out, "  {:>CELL_WIDTH$}", format!("{variation:+.2}"));
    }
    out.push('\n');

    for parameter in &axes.parameters {
        let _ = write!(out, "{parameter:<label_width$}");
        for &variation in &axes.variations {
            let cell = heatmap_value(points, parameter, variation)
                .map(format_percentage)
                .unwrap_or_default();
            let _ = write!(out, "  {cell:>CELL_WIDTH$}");
        }
        // No trailing padding after the last cell
        let trimmed = out.trim_end_matches(' ').len();
        out.truncate(trimmed);
        out.push('\n');
    }
    out
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use whatif_core::error::ErrorKind;

    fn point(parameter: &str, variation: f64, p: f64) -> HeatmapPoint {
        HeatmapPoint {
            parameter: parameter.into(),
            variation,
            success_probability: p,
        }
    }

    #[test]
    fn test_format_compact_currency() {
        assert_eq!(format_compact_currency(1_234_567.0), "$1.2M");
        assert_eq!(format_compact_currency(450_000.0), "$450K");
        assert_eq!(format_compact_currency(-14_000.0), "-$14K");
        assert_eq!(format_compact_currency(50.0), "$50");
    }

    #[test]
    fn test_format_changes() {
        let mut changes = BTreeMap::new();
        assert_eq!(format_changes(&changes), "(baseline)");

        changes.insert("monthly_spending".to_string(), ParamValue::Number(-0.1));
        changes.insert("adjust_for_inflation".to_string(), ParamValue::Flag(false));
        assert_eq!(
            format_changes(&changes),
            "adjust_for_inflation false, monthly_spending -0.1"
        );
    }

    #[test]
    fn test_scenario_table_marks_unavailable_rows() {
        let rows = vec![
            ScenarioRow {
                name: "Pessimistic".into(),
                changes: BTreeMap::from([(
                    "equity_return_annual".to_string(),
                    ParamValue::Number(-0.02),
                )]),
                metrics: RowMetrics::Available {
                    success_probability: 0.62,
                    ending_median: 1_200_000.0,
                },
            },
            ScenarioRow {
                name: "Lavish".into(),
                changes: BTreeMap::new(),
                metrics: RowMetrics::Unavailable {
                    error: ErrorKind::EngineRejection,
                },
            },
        ];

        let table = render_scenario_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Scenario"));
        assert!(lines[1].starts_with("Pessimistic"));
        assert!(lines[1].contains("62.00%"));
        assert!(lines[1].contains("$1.2M"));
        assert!(lines[1].ends_with("equity_return_annual -0.02"));
        assert!(lines[2].contains("n/a"));
        assert!(lines[2].ends_with("(baseline)  (unavailable: engine rejection)"));
    }

    #[test]
    fn test_heatmap_grid_leaves_missing_cells_blank() {
        let points = vec![
            point("monthly_spending", -0.1, 0.9),
            point("monthly_spending", 0.1, 0.7),
            point("equity_return_annual", 0.1, 0.85),
        ];

        let grid = render_heatmap(&points);
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("-0.10"));
        assert!(lines[0].contains("+0.10"));
        assert!(lines[1].starts_with("monthly_spending"));
        assert!(lines[1].contains("90.00%"));
        assert!(lines[1].contains("70.00%"));

        // equity has no -0.1 point: its first cell is blank
        let equity = lines[2];
        assert!(equity.starts_with("equity_return_annual"));
        assert_eq!(equity.matches('%').count(), 1);
        assert!(equity.ends_with("85.00%"));
    }

    #[test]
    fn test_empty_heatmap() {
        assert_eq!(render_heatmap(&[]), "no sensitivity points\n");
    }

    #[test]
    fn test_json_output_is_tagged() {
        let rows = vec![ScenarioRow {
            name: "Lavish".into(),
            changes: BTreeMap::new(),
            metrics: RowMetrics::Unavailable {
                error: ErrorKind::Transport,
            },
        }];
        let json = to_json(&rows).unwrap();
        assert!(json.contains("\"status\": \"unavailable\""));
        assert!(json.contains("\"error\": \"transport\""));
    }
}
