use crate::models::{OptionKind, Recommendation, ScoredContract};
use crate::processor::{RunReport, SymbolEvaluation};
use colored::Colorize;
use std::time::Duration;

/// Plain-text lines describing one scored contract
pub fn contract_lines(c: &ScoredContract) -> Vec<String> {
    let q = &c.quote;
    let p = &c.pricing;
    vec![
        format!(
            "Symbol: {} | Expiry: {} | Type: {} | Strike: {} | CMP: ₹{:.2} | Model: ₹{:.2}",
            q.symbol, q.expiry, q.kind, q.strike, q.last_traded_price, p.theoretical_price
        ),
        format!(
            "IV: {:.2}% | Δ: {:.2} | θ: {:.2} | Vega: {:.2}",
            q.implied_volatility, p.delta, p.theta, p.vega
        ),
        format!("Volume: {} | Score: {:.0}", q.total_traded_volume, c.score),
        format!("🎯 Target: ₹{:.2} | 🛑 Stop Loss: ₹{:.2}", c.target, c.stop_loss),
    ]
}

/// Message body handed to the notifier
pub fn render_recommendation(rec: &Recommendation) -> String {
    let mut text = format!("🏆 Best Overall Recommendation ({} Trend):", rec.trend);
    for line in contract_lines(&rec.contract) {
        text.push_str("\n  ");
        text.push_str(&line);
    }
    text
}

pub fn print_header(title: &str) {
    println!("{}", "=".repeat(60).blue());
    println!("{}", title.green().bold());
    println!("{}", "=".repeat(60).blue());
    println!();
}

/// Best call and put of one symbol
pub fn print_symbol_evaluation(eval: &SymbolEvaluation) {
    println!("📊 {}", eval.symbol.yellow().bold());
    println!(
        "  {} Spot: {:.2} | Expiry: {} | T: {:.4} years | Trend: {}",
        "→".cyan(),
        eval.spot,
        eval.expiry,
        eval.time_to_expiry_years,
        eval.trend
    );

    for (kind, best) in [(OptionKind::Call, &eval.best.call), (OptionKind::Put, &eval.best.put)] {
        match best {
            Some(contract) => {
                println!("  {} Best {} option:", "✓".green(), kind);
                for line in contract_lines(contract) {
                    println!("    {}", line);
                }
            }
            None => println!("  {} No suitable {} option found", "ℹ".blue(), kind),
        }
    }
    println!();
}

/// Final pick, or why there is none
pub fn print_final(report: &RunReport) {
    if !report.has_contracts() {
        println!("{} No option data available", "✗".red());
        return;
    }

    match &report.recommendation {
        Some(rec) => {
            println!("{}", render_recommendation(rec).green());
        }
        None => println!("{} No final recommendation matched the market trend", "✗".red()),
    }
    println!();
}

pub fn print_summary(report: &RunReport, elapsed: Duration) {
    println!("{}", "=".repeat(60).blue());
    println!("{}", "Summary".cyan().bold());
    println!("{}", "=".repeat(60).blue());
    println!("{} Evaluated: {}", "✓".green(), report.evaluations.len());
    println!("{} Failed: {}", "✗".red(), report.failures.len());
    println!("{} Time taken: {:.2}s", "⏱".yellow(), elapsed.as_secs_f64());

    if !report.failures.is_empty() {
        println!("{}", "Failed Symbols:".red());
        for failure in &report.failures {
            println!(
                "  {} {} → {}",
                "✗".red(),
                failure.symbol.yellow(),
                failure.error.chars().take(80).collect::<String>()
            );
        }
    }
    println!();
}
