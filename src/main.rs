use anyhow::Result;
use nse_options_picker::commands::AnalyzerCommands;
use nse_options_picker::{config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging()?;

    let mode = config::get_execution_mode();

    match mode.as_str() {
        "run" => {
            AnalyzerCommands::run(true).await?;
        }
        "dry-run" => {
            AnalyzerCommands::run(false).await?;
        }
        _ => {
            eprintln!("Invalid mode '{}'. Use 'run' or 'dry-run'", mode);
            AnalyzerCommands::print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
