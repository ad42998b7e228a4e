//! Colored terminal rendering of a [`ResultView`].

use std::fmt::Write;

use colored::{ColoredString, Colorize};

use super::format::{
    NA, format_grouped, format_percent, format_signed_count, format_signed_weight, format_weight,
};
use super::{
    AnnualSection, ComparisonRow, ComparisonSection, DashboardView, Metric, ResultView, RunMode,
    Share, Tone,
};

/// Width of the longest bar in horizontal charts.
const BAR_WIDTH: usize = 30;

/// Render a view as terminal text.
pub fn render(view: &ResultView) -> String {
    let mut out = String::new();
    match view {
        ResultView::Failure { message } => {
            let _ = writeln!(out, "{}", "Optimization Failed".bold().red());
            let _ = writeln!(out, "{}", "=".repeat(60));
            let _ = writeln!(out, "  {message}");
        }
        ResultView::Success(dashboard) => render_dashboard(&mut out, dashboard),
    }
    out
}

fn render_dashboard(out: &mut String, view: &DashboardView) {
    let summary = &view.summary;
    let _ = writeln!(
        out,
        "{} {}",
        summary.flight_number.bold().cyan(),
        summary.route.bold()
    );
    let _ = writeln!(out, "{}", "=".repeat(60));
    let mut line = format!("  Date: {}", summary.date);
    if let Some(aircraft) = &summary.aircraft {
        let _ = write!(line, "  Aircraft: {aircraft}");
    }
    let _ = writeln!(out, "{line}");

    match summary.run_mode {
        RunMode::Optimizer => {
            let _ = writeln!(out, "  {}", RunMode::Optimizer.label().green());
        }
        RunMode::Fallback => {
            let banner = format!(
                "{} used: the solver did not produce this plan",
                RunMode::Fallback.label()
            );
            let _ = writeln!(out, "  {}", banner.yellow().bold());
        }
        RunMode::Unknown => {}
    }
    metric_grid(out, &summary.metrics);
    if !summary.warnings.is_empty() {
        let _ = writeln!(out, "  {}", "Warnings:".yellow());
        for warning in &summary.warnings {
            let _ = writeln!(out, "    - {warning}");
        }
    }

    if let Some(perf) = &view.performance {
        heading(out, "Performance");
        metric_grid(out, &perf.metrics);
    }
    if let Some(solver) = &view.solver {
        heading(out, "Solver");
        metric_grid(out, &solver.metrics);
    }

    heading(out, "Weight Distribution");
    metric_grid(out, &view.weight.metrics);
    share_chart(out, "By compartment", &view.weight.by_compartment, |v| {
        format_weight(Some(v))
    });
    share_chart(out, "By side", &view.weight.by_side, |v| format_weight(Some(v)));

    heading(out, "ULD Utilization");
    metric_grid(out, &view.uld.metrics);
    share_chart(out, "By type", &view.uld.by_type, |v| format!("{v:.0}"));
    if !view.uld.items_per_uld.is_empty() {
        sub_heading(out, "Items per ULD");
        let max = view
            .uld
            .items_per_uld
            .iter()
            .map(|r| r.items as f64)
            .fold(0.0, f64::max);
        for row in &view.uld.items_per_uld {
            let _ = writeln!(
                out,
                "    {:<12} {} {} ({})",
                row.label,
                bar(row.items as f64, max),
                row.items,
                format_weight(row.weight)
            );
        }
    }
    if !view.uld.weight_per_uld.is_empty() {
        sub_heading(out, "Weight per ULD");
        let max = view
            .uld
            .weight_per_uld
            .iter()
            .map(|r| r.weight)
            .fold(0.0, f64::max);
        for row in &view.uld.weight_per_uld {
            let _ = writeln!(
                out,
                "    {:<12} {} {}",
                row.label,
                bar(row.weight, max),
                format_weight(Some(row.weight))
            );
        }
    }

    if let Some(cargo) = &view.cargo {
        heading(out, "Cargo");
        metric_grid(out, &cargo.metrics);
        share_chart(out, "Items by weight range", &cargo.weight_ranges, |v| {
            format!("{v:.0}")
        });
        if !cargo.top_commodities.is_empty() {
            sub_heading(out, "Weight by commodity");
            let max = cargo
                .top_commodities
                .iter()
                .map(|c| c.weight)
                .fold(0.0, f64::max);
            for c in &cargo.top_commodities {
                let _ = writeln!(
                    out,
                    "    {:<18} {} {} kg",
                    c.label,
                    bar(c.weight, max),
                    format_grouped(c.weight, 0)
                );
            }
        }
        if !cargo.largest_items.is_empty() {
            sub_heading(out, "Largest items");
            let _ = writeln!(out, "    {:<16} {:>12}  Commodity", "Serial", "Weight");
            for (i, item) in cargo.largest_items.iter().enumerate() {
                let line = format!(
                    "    {:<16} {:>12}  {}",
                    item.serialnumber, item.weight, item.commodity
                );
                if i % 2 == 0 {
                    let _ = writeln!(out, "{line}");
                } else {
                    let _ = writeln!(out, "{}", line.dimmed());
                }
            }
        }
    }

    if let Some(safety) = &view.safety {
        heading(out, "Safety");
        if let Some(score) = &safety.score {
            metric_grid(out, std::slice::from_ref(score));
        }
        let mut group = "";
        for check in &safety.checks {
            if check.group != group {
                group = &check.group;
                sub_heading(out, group);
            }
            let status = if check.compliant {
                "OK".green()
            } else {
                "VIOLATION".red().bold()
            };
            let _ = writeln!(out, "    {:<20} {}", check.label, status);
        }
        metric_grid(out, &safety.alerts);
    }

    if let Some(comparison) = &view.comparison {
        render_comparison(out, comparison);
    }
}

fn render_comparison(out: &mut String, c: &ComparisonSection) {
    heading(out, "Comparison with Actual Loading");
    if !c.baseline_available {
        let _ = writeln!(
            out,
            "  {}",
            "Actual loading data not available for this flight.".yellow()
        );
    }
    metric_grid(out, &c.savings);

    if !c.key_metrics.is_empty() {
        sub_heading(out, "Key metrics");
        comparison_header(out, "Metric");
        for row in &c.key_metrics {
            let (baseline, optimized, diff) = match row.key.as_str() {
                "Total ULDs" => (
                    row.baseline.map_or_else(|| NA.to_string(), |v| format!("{v:.0}")),
                    row.optimized.map_or_else(|| NA.to_string(), |v| format!("{v:.0}")),
                    format_signed_count(row.difference.map(|v| v as i64)),
                ),
                "MAC ZFW" => (
                    format_percent(row.baseline, 2),
                    format_percent(row.optimized, 2),
                    row.difference
                        .map_or_else(|| NA.to_string(), |v| format!("{v:+.2}")),
                ),
                _ => (
                    format_weight(row.baseline),
                    format_weight(row.optimized),
                    format_signed_weight(row.difference),
                ),
            };
            comparison_line(out, &row.key, &baseline, &optimized, &diff);
        }
    }
    comparison_rows(out, "By compartment", "Compartment", &c.by_compartment);
    comparison_rows(out, "By side", "Side", &c.by_side);

    if let Some(annual) = &c.annual {
        render_annual(out, annual);
    }
}

fn comparison_rows(out: &mut String, title: &str, column: &str, rows: &[ComparisonRow]) {
    if rows.is_empty() {
        return;
    }
    sub_heading(out, title);
    comparison_header(out, column);
    for row in rows {
        comparison_line(
            out,
            &row.key,
            &format_weight(row.baseline),
            &format_weight(row.optimized),
            &format_signed_weight(row.difference),
        );
    }
}

fn comparison_header(out: &mut String, column: &str) {
    let _ = writeln!(
        out,
        "    {:<14} {:>14} {:>14} {:>14}",
        column, "Actual", "Optimized", "Difference"
    );
    let _ = writeln!(out, "    {}", "-".repeat(59));
}

fn comparison_line(out: &mut String, key: &str, baseline: &str, optimized: &str, diff: &str) {
    let _ = writeln!(
        out,
        "    {key:<14} {baseline:>14} {optimized:>14} {diff:>14}"
    );
}

fn render_annual(out: &mut String, annual: &AnnualSection) {
    let title = match annual.flights_per_year {
        Some(n) => format!("Annual impact ({} flights/year)", format_grouped(n as f64, 0)),
        None => "Annual impact".to_string(),
    };
    sub_heading(out, &title);
    if annual.negative {
        let _ = writeln!(
            out,
            "    {}",
            "The optimized loading uses more fuel than the actual loading.".red()
        );
    }
    metric_grid(out, &annual.metrics);
    if let Some(price) = annual.fuel_price_per_kg {
        let _ = writeln!(out, "    {}", format!("Fuel price: ${price:.2}/kg").dimmed());
    }
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", title.bold().cyan());
}

fn sub_heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "  {}", title.bold());
}

fn metric_grid(out: &mut String, metrics: &[Metric]) {
    for metric in metrics {
        let _ = writeln!(
            out,
            "  {:<24} {}",
            format!("{}:", metric.label),
            toned(&metric.value, metric.tone)
        );
    }
}

fn share_chart(out: &mut String, title: &str, shares: &[Share], value: impl Fn(f64) -> String) {
    if shares.is_empty() {
        return;
    }
    sub_heading(out, title);
    let max = shares.iter().map(|s| s.value).fold(0.0, f64::max);
    for share in shares {
        let _ = writeln!(
            out,
            "    {:<12} {} {} ({})",
            share.label,
            bar(share.value, max),
            value(share.value),
            format_percent(share.percent, 1)
        );
    }
}

fn bar(value: f64, max: f64) -> String {
    let len = if max > 0.0 && value > 0.0 {
        ((value / max) * BAR_WIDTH as f64).round().max(1.0) as usize
    } else {
        0
    };
    format!("{:<width$}", "█".repeat(len), width = BAR_WIDTH)
}

fn toned(value: &str, tone: Tone) -> ColoredString {
    match tone {
        Tone::Neutral => value.normal(),
        Tone::Good => value.green(),
        Tone::Warning => value.yellow(),
        Tone::Bad => value.red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DisplayConfig;
    use crate::model::OptimizationResult;
    use crate::present::build_view;

    #[test]
    fn failure_renders_only_message() {
        let view = build_view(&OptimizationResult::failure("No feasible plan"), &DisplayConfig::default());
        let text = render(&view);
        assert!(text.contains("No feasible plan"));
        assert!(!text.contains("Weight Distribution"));
    }

    #[test]
    fn bar_scales_to_max() {
        assert_eq!(bar(10.0, 10.0).trim_end().chars().count(), BAR_WIDTH);
        assert_eq!(bar(0.0, 10.0).trim_end(), "");
        assert_eq!(bar(0.01, 10.0).trim_end().chars().count(), 1);
    }
}
