//! Analysis command implementations (analysis, targets, quick wins)

use anyhow::{Context, Result};
use pare_core::models::ExpenseAnalysis;
use pare_core::{
    compute_default_target, project_pie_series, target_presets, Config, ExpenseService,
    ServiceClient,
};

use super::{format_currency, truncate};

pub async fn cmd_analysis(
    service: &ServiceClient,
    config: &Config,
    months: u32,
    json: bool,
) -> Result<()> {
    let analysis = service
        .expense_analysis(months)
        .await
        .context("Failed to load expense analysis")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    print_analysis(&analysis, months, &config.currency, config.pie_limit);
    Ok(())
}

pub fn print_analysis(analysis: &ExpenseAnalysis, months: u32, currency: &str, pie_limit: usize) {
    println!();
    println!("📊 Expense Analysis (last {} months)", months);
    println!("   ─────────────────────────────────────────────────────────────");

    let Some(summary) = analysis.summary.as_ref() else {
        println!(
            "   {}",
            analysis
                .message
                .as_deref()
                .unwrap_or("Not enough data to analyze. Add more transactions.")
        );
        return;
    };

    println!(
        "   Average monthly expenses: {}",
        format_currency(summary.total_monthly_expenses, currency)
    );
    if summary.potential_savings > 0.0 {
        println!(
            "   Potential savings:        {} ({:.1}%)",
            format_currency(summary.potential_savings, currency),
            summary.potential_savings_percent
        );
    }

    let slices = project_pie_series(Some(analysis), pie_limit);
    if !slices.is_empty() {
        println!();
        println!("   Where the money goes:");
        for slice in &slices {
            let share = if summary.total_monthly_expenses > 0.0 {
                slice.value / summary.total_monthly_expenses * 100.0
            } else {
                0.0
            };
            let bar = "█".repeat((share / 2.0).round() as usize);
            println!("   {:18} {:>5.1}% {}", truncate(&slice.name, 18), share, bar);
        }
    }

    if !analysis.suggestions.is_empty() {
        println!();
        println!(
            "   {:20} │ {:>14} │ {:>6} │ {:>14}",
            "Category", "Current", "Cut", "Savings"
        );
        println!("   ─────────────────────┼────────────────┼────────┼───────────────");
        for s in &analysis.suggestions {
            println!(
                "   {:20} │ {:>14} │ {:>5.0}% │ {:>14}",
                truncate(&s.category, 20),
                format_currency(s.monthly_avg, currency),
                s.suggested_cut,
                format_currency(s.savings, currency)
            );
        }
    }

    if !analysis.general_recommendations.is_empty() {
        println!();
        println!("   💡 Recommendations:");
        for rec in &analysis.general_recommendations {
            println!("      • {}", rec);
        }
    }

    let default_target = compute_default_target(analysis);
    if default_target > 0.0 {
        println!();
        println!(
            "   Suggested monthly goal: {}",
            format_currency(default_target, currency)
        );
    }
}

pub async fn cmd_targets(service: &ServiceClient, config: &Config, months: u32) -> Result<()> {
    let analysis = service
        .expense_analysis(months)
        .await
        .context("Failed to load expense analysis")?;

    print_targets(&analysis, &config.currency);
    Ok(())
}

pub fn print_targets(analysis: &ExpenseAnalysis, currency: &str) {
    let presets = target_presets(analysis);

    println!();
    println!("🎯 Suggested Savings Targets");
    println!("   ─────────────────────────────────────────────────────────────");
    if presets.is_empty() {
        println!("   No monthly expenses to base a target on.");
        return;
    }

    for p in &presets {
        println!(
            "   {:12} {:>4.0}%   {:>14}/month",
            p.preset.as_str(),
            p.preset.ratio() * 100.0,
            format_currency(p.target.amount(), currency)
        );
    }
    println!();
    println!("   Use: pare plan --preset <name>  or  pare plan --target <amount>");
}

pub async fn cmd_quick_wins(service: &ServiceClient, config: &Config, json: bool) -> Result<()> {
    let wins = service
        .quick_wins()
        .await
        .context("Failed to load quick wins")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&wins)?);
        return Ok(());
    }

    println!();
    println!("⚡ Quick Wins");
    println!("   ─────────────────────────────────────────────────────────────");
    if wins.quick_wins.is_empty() {
        println!("   No quick wins found for the last month.");
        return Ok(());
    }

    for win in &wins.quick_wins {
        let savings = win
            .potential_monthly_savings
            .map(|s| format!("{}/month", format_currency(s, &config.currency)))
            .unwrap_or_else(|| "varies".to_string());
        println!("   • {}", win.suggestion);
        println!("     {} · potential savings {}", win.kind, savings);
    }
    Ok(())
}
