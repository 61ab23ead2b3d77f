use crate::config::{self, EngineConfig};
use crate::nse_client::NSEClient;
use crate::processor::{self, MarketSnapshot, RunReport, SymbolEvaluation};
use crate::report;
use crate::telegram::TelegramNotifier;
use crate::yahoo_client::YahooClient;

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, Utc};
use colored::Colorize;
use tracing::{info, warn};

/// Command handler for one evaluation run
pub struct AnalyzerCommands;

impl AnalyzerCommands {
    /// Fetch, evaluate and report every configured symbol, then notify the final pick
    pub async fn run(notify: bool) -> Result<RunReport> {
        report::print_header("NSE Options Picker");

        let engine = EngineConfig::from_env();
        let symbols = config::get_symbols();
        let now = ist_now()?;
        let today = now.date_naive();

        println!("{} Symbols: {}", "ℹ".blue(), symbols.join(", ").yellow());
        println!("{} Date: {}", "ℹ".blue(), today);
        println!();

        let nse = NSEClient::new()?;
        let yahoo = YahooClient::new()?;
        let start_time = std::time::Instant::now();

        // Step 1: Evaluate each symbol in turn
        let mut outcomes = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            if config::enforce_trading_window() && !engine.trading_window.contains(now.time()) {
                println!(
                    "{} Outside trading window, skipping {}",
                    "⏳".yellow(),
                    symbol.yellow()
                );
                continue;
            }

            let outcome = Self::evaluate(&nse, &yahoo, symbol, now, &engine).await;
            match &outcome {
                Ok(evaluation) => report::print_symbol_evaluation(evaluation),
                Err(e) => println!("{} Failed to process {}: {:#}\n", "✗".red(), symbol.yellow(), e),
            }
            outcomes.push((symbol.clone(), outcome));
        }

        // Step 2: Trend-aware final pick
        let run_report = processor::build_report(outcomes);
        report::print_final(&run_report);
        report::print_summary(&run_report, start_time.elapsed());

        // Step 3: Deliver
        if notify {
            Self::notify(&run_report).await;
        }

        Ok(run_report)
    }

    async fn evaluate(
        nse: &NSEClient,
        yahoo: &YahooClient,
        symbol: &str,
        now: DateTime<FixedOffset>,
        engine: &EngineConfig,
    ) -> Result<SymbolEvaluation> {
        let proxy = config::index_proxy_ticker(symbol);
        let bars = match yahoo.fetch_intraday_bars(proxy).await {
            Ok(bars) => bars,
            Err(e) => {
                // Same as having no bars: trend falls back to sideways
                warn!(symbol, proxy, error = %format!("{:#}", e), "Failed to fetch intraday bars");
                Vec::new()
            }
        };

        let (expiry, chain) = nse.fetch_nearest_chain(symbol, now.date_naive()).await?;

        let snapshot = MarketSnapshot {
            symbol: symbol.to_string(),
            expiry,
            bars,
            chain,
        };
        processor::evaluate_symbol(&snapshot, now, engine)
    }

    /// Single delivery attempt; failures are logged, not propagated
    async fn notify(run_report: &RunReport) {
        let Some(rec) = &run_report.recommendation else {
            return;
        };

        let notifier = match TelegramNotifier::from_env() {
            Ok(Some(n)) => n,
            Ok(None) => {
                warn!("TELEGRAM_SECRET_TOKEN or TELEGRAM_CHAT_ID not set, skipping notification");
                return;
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Failed to build Telegram notifier");
                return;
            }
        };

        match notifier.send_message(&report::render_recommendation(rec)).await {
            Ok(()) => {
                info!(symbol = %rec.contract.quote.symbol, "Recommendation sent to Telegram");
                println!("{} Recommendation sent to Telegram", "✓".green());
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Failed to send Telegram message");
                println!("{} Failed to send Telegram message", "✗".red());
            }
        }
    }

    /// Print usage instructions
    pub fn print_usage() {
        eprintln!("Set OPT_MODE environment variable to control execution mode");
        eprintln!("Examples:");
        eprintln!("  OPT_MODE=run cargo run                        # Evaluate and notify Telegram");
        eprintln!("  OPT_MODE=dry-run cargo run                    # Evaluate only");
        eprintln!("  OPT_SYMBOLS=NIFTY,BANKNIFTY OPT_IV_THRESHOLD=30 cargo run");
    }
}

/// Wall clock in exchange time
fn ist_now() -> Result<DateTime<FixedOffset>> {
    let ist = FixedOffset::east_opt(config::IST_OFFSET_SECS)
        .ok_or_else(|| anyhow!("Invalid IST offset"))?;
    Ok(Utc::now().with_timezone(&ist))
}
