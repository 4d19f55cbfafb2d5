//! Cut plan command implementation

use anyhow::{Context, Result};
use pare_core::models::CutPlan;
use pare_core::{
    category_deltas, project_chart_series, Config, SavingsPlanner, ServiceClient, TargetPreset,
};

use super::{format_currency, truncate};

pub async fn cmd_plan(
    service: ServiceClient,
    config: &Config,
    months: u32,
    target: Option<&str>,
    preset: Option<&str>,
    json: bool,
) -> Result<()> {
    let planner = SavingsPlanner::new(service, months);
    planner
        .load_analysis(months)
        .await
        .context("Failed to load expense analysis")?;

    let resolution = match (target, preset) {
        (Some(input), _) => planner.submit_target(input).await,
        (None, Some(name)) => {
            let preset: TargetPreset = name.parse().map_err(anyhow::Error::msg)?;
            planner.submit_preset(preset).await
        }
        (None, None) => {
            let Some(default) = planner.snapshot().target else {
                anyhow::bail!(
                    "No monthly expenses to derive a default target from. Pass --target <amount>."
                );
            };
            planner.request_plan(default).await
        }
    }
    .context("Failed to generate savings plan")?;

    // Only one request is ever in flight here, so it cannot be superseded
    let Some(plan) = resolution.applied() else {
        anyhow::bail!("Plan request was superseded");
    };

    if json {
        let output = serde_json::json!({
            "plan": &*plan,
            "chart": project_chart_series(Some(&*plan)),
            "deltas": category_deltas(&plan),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_plan(&plan, &config.currency);
    Ok(())
}

pub fn print_plan(plan: &CutPlan, currency: &str) {
    println!();
    println!("📋 Savings Plan");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Goal:              {}/month",
        format_currency(plan.target_savings, currency)
    );
    if plan.achievable {
        println!("   Status:            ✅ Achievable");
    } else {
        println!("   Status:            ⚠️  Challenging");
    }
    println!(
        "   Estimated savings: {} ({:.1}% of expenses)",
        format_currency(plan.estimated_savings, currency),
        plan.percent_of_expenses
    );

    if let Some(headline) = plan.headline() {
        println!();
        println!("   💡 {}", headline);
    }

    if plan.spending_plan.is_empty() {
        println!();
        println!("   No categories to cut.");
        return;
    }

    println!();
    println!(
        "   {:20} │ {:>14} │ {:>6} │ {:>14} │ {:>14}",
        "Category", "Current", "Cut", "New budget", "Savings"
    );
    println!("   ─────────────────────┼────────────────┼────────┼────────────────┼───────────────");
    for item in &plan.spending_plan {
        println!(
            "   {:20} │ {:>14} │ {:>5.1}% │ {:>14} │ {:>14}",
            truncate(&item.category, 20),
            format_currency(item.current_spending, currency),
            item.suggested_cut_percent,
            format_currency(item.new_budget, currency),
            format_currency(item.monthly_savings, currency)
        );
    }

    let with_actions: Vec<_> = plan
        .spending_plan
        .iter()
        .filter(|i| !i.actions.is_empty())
        .collect();
    if !with_actions.is_empty() {
        println!();
        println!("   How to get there:");
        for item in with_actions {
            println!("   {}", item.category);
            for action in &item.actions {
                println!("      • {}", action);
            }
        }
    }
}
