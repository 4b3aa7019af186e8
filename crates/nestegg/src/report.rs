//! Rendering of simulation outcomes

use std::fmt::Write;

use clap::ValueEnum;
use color_eyre::eyre::Result;
use nestegg_core::monte_carlo::MonteCarloSummary;
use nestegg_core::simulation::SimulationResult;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

fn serialize<T: Serialize>(value: &T, format: OutputFormat) -> Result<Option<String>> {
    Ok(match format {
        OutputFormat::Table => None,
        OutputFormat::Json => Some(serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => Some(serde_saphyr::to_string(value)?),
    })
}

pub fn render_result(result: &SimulationResult, format: OutputFormat) -> Result<String> {
    if let Some(out) = serialize(result, format)? {
        return Ok(out);
    }

    let mut out = String::new();
    writeln!(
        out,
        "{:>4} {:>10} {:>12} {:>12} {:>10} {:>10} {:>10} {:>10} {:>10} {:>14}",
        "Age",
        "Date",
        "Income",
        "Expenses",
        "Saved",
        "Employer",
        "Withdrawn",
        "Tax",
        "Shortfall",
        "Net worth"
    )?;
    for record in &result.history {
        let date = record
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = if record.retired { "*" } else { " " };
        writeln!(
            out,
            "{:>3}{} {:>10} {:>12.0} {:>12.0} {:>10.0} {:>10.0} {:>10.0} {:>10.0} {:>10.0} {:>14.0}",
            record.age,
            marker,
            date,
            record.income,
            record.expenses,
            record.contributions,
            record.employer_contributions,
            record.withdrawals,
            record.taxes.total(),
            record.shortfall,
            record.net_worth
        )?;
    }

    writeln!(out)?;
    for (key, balance) in &result.final_balances {
        writeln!(out, "{:<20} {:>14.0}", key, balance)?;
    }
    writeln!(out, "{:<20} {:>14.0}", "Net worth", result.final_net_worth)?;
    if let Some(age) = result.retired_at {
        writeln!(out, "Retired at {age} (* marks retired periods)")?;
    }
    match result.depleted_at {
        Some(age) => writeln!(out, "Savings ran short at {age}")?,
        None => writeln!(out, "Expenses and tax covered in every period")?,
    }
    Ok(out)
}

pub fn render_summary(summary: &MonteCarloSummary, format: OutputFormat) -> Result<String> {
    if let Some(out) = serialize(summary, format)? {
        return Ok(out);
    }

    let mut out = String::new();
    writeln!(
        out,
        "{:>4} {:>14} {:>14} {:>14} {:>14}",
        "Age", "P10", "Median", "P90", "Mean"
    )?;
    for band in &summary.bands {
        writeln!(
            out,
            "{:>4} {:>14.0} {:>14.0} {:>14.0} {:>14.0}",
            band.age, band.p10, band.p50, band.p90, band.mean
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Iterations:   {}", summary.iterations)?;
    writeln!(out, "Success rate: {:.1}%", summary.success_rate * 100.0)?;
    writeln!(
        out,
        "Final net worth: p10 {:.0}, median {:.0}, p90 {:.0}",
        summary.final_net_worth.p10, summary.final_net_worth.p50, summary.final_net_worth.p90
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestegg_core::config::{AccountBuilder, PortfolioBuilder, RunConfig};
    use nestegg_core::monte_carlo::{MonteCarloConfig, monte_carlo};
    use nestegg_core::simulation::simulate;

    fn result() -> SimulationResult {
        let portfolio = PortfolioBuilder::new()
            .income(60_000.0)
            .expenses(30_000.0)
            .age(60)
            .tax_free()
            .start(2025, 1, 1)
            .account(AccountBuilder::roth_ira("Roth").balance(10_000.0))
            .build()
            .unwrap();
        let run = RunConfig {
            periods: 3,
            retire_at_age: Some(61),
            ..RunConfig::default()
        };
        simulate(portfolio, &run, 0).unwrap()
    }

    #[test]
    fn test_table_has_row_per_period() {
        let table = render_result(&result(), OutputFormat::Table).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].contains("Net worth"));
        assert!(lines[1].contains("2026-01-01"));
        assert!(lines[2].trim_start().starts_with("62*"));
        assert!(table.contains("Roth"));
        assert!(table.contains("Retired at 61"));
    }

    #[test]
    fn test_json_round_trips() {
        let result = result();
        let json = render_result(&result, OutputFormat::Json).unwrap();
        let parsed: SimulationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.history.len(), 3);
        assert_eq!(parsed.retired_at, Some(61));
    }

    #[test]
    fn test_summary_table() {
        let portfolio = PortfolioBuilder::new()
            .income(50_000.0)
            .expenses(20_000.0)
            .tax_free()
            .build()
            .unwrap();
        let run = RunConfig {
            periods: 2,
            ..RunConfig::default()
        };
        let config = MonteCarloConfig {
            iterations: 10,
            seed: 1,
        };
        let summary = monte_carlo(&portfolio, &run, &config).unwrap();

        let table = render_summary(&summary, OutputFormat::Table).unwrap();
        assert!(table.contains("Success rate: 100.0%"));
        assert_eq!(table.lines().count(), 1 + 2 + 1 + 3);
    }
}
