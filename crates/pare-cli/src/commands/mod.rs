//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `setup` - Config loading, service construction, `config` command
//! - `analysis` - Expense analysis, target suggestions, quick wins
//! - `plan` - One-shot cut plan requests
//! - `session` - Interactive planning session

pub mod analysis;
pub mod plan;
pub mod session;
pub mod setup;

// Re-export command functions for main.rs
pub use analysis::*;
pub use plan::*;
pub use session::*;
pub use setup::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount with a currency symbol and thousands separators
pub fn format_currency(value: f64, symbol: &str) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{} {}.{}", sign, symbol, grouped, cents)
}
