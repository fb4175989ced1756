//! Plain-text rendering of analysis results.

use std::fmt::Write;

use sensa_core::{ConvergenceCurve, DesignKind, MetricKind, SensitivityResult, SobolIndices};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::Analysis;

#[derive(Debug, Tabled)]
struct SummaryRow {
    factor: String,
    #[tabled(rename = "Si mean")]
    si_mean: String,
    #[tabled(rename = "Si std")]
    si_std: String,
    #[tabled(rename = "STi mean")]
    st_mean: String,
    #[tabled(rename = "STi std")]
    st_std: String,
}

#[derive(Debug, Tabled)]
struct LegendRow {
    symbol: &'static str,
    metric: &'static str,
    meaning: &'static str,
}

fn fixed(v: f64) -> String {
    format!("{v:.4}")
}

fn finish(builder: Builder) -> String {
    let mut table = builder.build();
    table.with(Style::psql());
    table.to_string()
}

fn value_table(result: &SensitivityResult) -> String {
    let metrics: Vec<MetricKind> = MetricKind::for_result(result)
        .into_iter()
        .filter(|&m| result.values(m).is_some())
        .collect();

    let mut builder = Builder::default();
    builder.push_record(
        std::iter::once("factor".to_string()).chain(metrics.iter().map(|m| m.symbol().to_string())),
    );
    for (i, name) in result.names().iter().enumerate() {
        let values = metrics
            .iter()
            .map(|&m| result.values(m).map_or(f64::NAN, |vals| vals[i]))
            .map(fixed);
        builder.push_record(std::iter::once(name.clone()).chain(values));
    }
    finish(builder)
}

/// Upper-triangular pair matrix; the diagonal and lower triangle print as "-".
fn pair_table(names: &[String], matrix: &[Vec<f64>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(std::iter::once("factor".to_string()).chain(names.iter().cloned()));
    for (i, name) in names.iter().enumerate() {
        let cells = matrix[i]
            .iter()
            .enumerate()
            .map(|(j, &v)| if j > i { fixed(v) } else { "-".to_string() });
        builder.push_record(std::iter::once(name.clone()).chain(cells));
    }
    finish(builder)
}

fn convergence_table(curves: &[ConvergenceCurve]) -> String {
    let Some(first) = curves.first() else {
        return String::new();
    };
    let mut builder = Builder::default();
    builder.push_record(
        std::iter::once("factor".to_string())
            .chain(first.sample_sizes.iter().map(|n| format!("N={n}"))),
    );
    for curve in curves {
        let cells = curve
            .si
            .iter()
            .zip(&curve.st)
            .map(|(si, st)| format!("{si:.3}/{st:.3}"));
        builder.push_record(std::iter::once(curve.name.clone()).chain(cells));
    }
    finish(builder)
}

fn sobol_details(out: &mut String, replicates: &[SobolIndices]) {
    let Some(first) = replicates.first() else {
        return;
    };
    let _ = writeln!(out, "\n{}", MetricKind::SecondOrderTotal.label());
    let _ = writeln!(out, "{}", pair_table(&first.names, &first.stij));
    let _ = writeln!(out, "\nPair interaction (STi + STj - STij)");
    let _ = writeln!(out, "{}", pair_table(&first.names, &first.interaction));

    if replicates.len() > 1
        && let Ok(summary) = SobolIndices::summarize(replicates)
    {
        let rows: Vec<SummaryRow> = summary
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| SummaryRow {
                factor: name.clone(),
                si_mean: fixed(summary.si_mean[i]),
                si_std: fixed(summary.si_std[i]),
                st_mean: fixed(summary.st_mean[i]),
                st_std: fixed(summary.st_std[i]),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::psql());
        let _ = writeln!(out, "\nAcross {} replicates", summary.replicates);
        let _ = writeln!(out, "{table}");
    }
}

/// Render the result tables, design diagnostics and metric legend.
#[must_use]
pub fn render(analysis: &Analysis) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} design, {} rows\n",
        analysis.design.kind().name(),
        analysis.design.rows()
    );

    let _ = writeln!(out, "{}", value_table(&analysis.result));

    if let SensitivityResult::Sobol(replicates) = &analysis.result {
        sobol_details(&mut out, replicates);
    }

    if let DesignKind::Morris(layout) = analysis.design.kind() {
        let d = &layout.diagnostics;
        let _ = writeln!(
            out,
            "\n{} of {} candidates kept ({} unique), spread {:.3}, level coverage {:.3} -> {:.3}",
            d.selected, d.candidates, d.unique_candidates, d.score, d.quality_before, d.quality_after
        );
    }

    if let Some(curves) = &analysis.convergence {
        let _ = writeln!(out, "\nConvergence of Si / STi");
        let _ = writeln!(out, "{}", convergence_table(curves));
    }

    let legend: Vec<LegendRow> = MetricKind::for_result(&analysis.result)
        .into_iter()
        .map(|m| LegendRow {
            symbol: m.symbol(),
            metric: m.label(),
            meaning: m.description(),
        })
        .collect();
    let mut table = Table::new(legend);
    table.with(Style::psql());
    let _ = writeln!(out, "\n{table}");
    out
}
