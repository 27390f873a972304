use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod assemble;
mod dates;
mod output;
mod pipeline;
mod prompts;
mod providers;
mod render;
mod types;
mod utils;

use dates::{DateRange, Diagnostics};
use output::{OutputWriter, OUTPUT_DIR};
use pipeline::Job;
use providers::{AnthropicClient, CompletionClient, OpenAiClient};
use render::{ChromeEngine, Viewport};
use types::{Provider, Variant};
use utils::osc8_file_link;

#[derive(Parser)]
#[command(name = "weather-alert")]
#[command(about = "Southeastern US 5-day severe weather bulletin generator")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the model for threats and render the bulletin into the output directory
    Generate {
        #[command(flatten)]
        report: ReportArgs,

        /// Output directory for the HTML, PNG and redirect page
        #[arg(short, long, default_value = OUTPUT_DIR)]
        output: String,

        /// Override the variant's model id
        #[arg(long)]
        model: Option<String>,

        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        openai_api_key: Option<String>,

        #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
        anthropic_api_key: Option<String>,
    },
    /// Print the prompt a variant would send, without calling any provider
    Prompt {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Remove the generated files from the output directory
    Clean {
        #[arg(short, long, default_value = OUTPUT_DIR)]
        output: String,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Which bulletin job to run
    #[arg(long, value_enum, default_value_t = Variant::default())]
    variant: Variant,

    /// First day of the outlook (YYYY-MM-DD); defaults to today in local time
    #[arg(long, value_name = "YYYY-MM-DD")]
    date: Option<NaiveDate>,
}

impl ReportArgs {
    fn dates(&self) -> Result<DateRange> {
        match self.date {
            Some(date) => DateRange::starting(date)
                .with_context(|| format!("--date {} leaves no room for a 5-day outlook", date)),
            None => DateRange::today().context("local date is at the end of the calendar"),
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn log_clock(dates: &DateRange) {
    let diag = Diagnostics::capture();
    tracing::info!("local clock: {}", diag.local);
    tracing::info!("local UTC offset: {}", diag.utc_offset);
    tracing::info!("UTC instant: {}", diag.utc_iso);
    tracing::info!(
        "outlook: {} through {}",
        dates.short_start(),
        dates.short_end()
    );
}

fn run_generate(
    report: ReportArgs,
    output: String,
    model: Option<String>,
    openai_api_key: Option<String>,
    anthropic_api_key: Option<String>,
) -> Result<()> {
    generate(report, output, model, openai_api_key, anthropic_api_key)
        .context("Error generating weather report")
}

fn generate(
    report: ReportArgs,
    output: String,
    model: Option<String>,
    openai_api_key: Option<String>,
    anthropic_api_key: Option<String>,
) -> Result<()> {
    let dates = report.dates()?;
    log_clock(&dates);

    let variant = report.variant;
    let provider = variant.provider();
    let client: Box<dyn CompletionClient> = match provider {
        Provider::OpenAi => Box::new(OpenAiClient::new(openai_api_key)?),
        Provider::Anthropic => Box::new(AnthropicClient::new(anthropic_api_key)?),
    };
    tracing::info!("using {} key from {}", provider, provider.api_key_var());

    let mut params = variant.model_params();
    if let Some(model) = model {
        params.model = model;
    }

    let writer = OutputWriter::new(&output);
    let job = Job {
        variant,
        params,
        viewport: Viewport::default(),
        client: client.as_ref(),
        engine: &ChromeEngine,
        output: &writer,
    };
    let artifacts = job.run(dates)?;

    println!("  Saved: {}", osc8_file_link(&artifacts.report_html));
    println!("  Saved: {}", osc8_file_link(&artifacts.png));
    println!("  Saved: {}", osc8_file_link(&artifacts.index_html));
    println!("Weather report generated successfully!");
    Ok(())
}

fn run_prompt(report: ReportArgs) -> Result<()> {
    let dates = report.dates()?;
    let prompt = prompts::build_prompt(report.variant, &dates);
    let params = report.variant.model_params();

    println!(
        "# {} via {} ({})",
        report.variant,
        report.variant.provider(),
        params.model
    );
    if let Some(system) = &prompt.system {
        println!("\n## system\n{}", system);
    }
    println!("\n## user\n{}", prompt.user);
    Ok(())
}

fn run_clean(output: String) -> Result<()> {
    let writer = OutputWriter::new(&output);
    println!("Cleaning generated files in {}...", writer.dir().display());
    let removed = writer
        .clean()
        .with_context(|| format!("Failed to clean {}", output))?;
    for path in removed {
        println!("  Removed {}", path.display());
    }
    println!("Clean complete!");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            report,
            output,
            model,
            openai_api_key,
            anthropic_api_key,
        } => run_generate(report, output, model, openai_api_key, anthropic_api_key),
        Commands::Prompt { report } => run_prompt(report),
        Commands::Clean { output } => run_clean(output),
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["weather-alert", "generate"]).unwrap();
        match cli.command {
            Commands::Generate { report, output, model, .. } => {
                assert_eq!(report.variant, Variant::OpenaiPlain);
                assert_eq!(report.date, None);
                assert_eq!(output, "output");
                assert_eq!(model, None);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_prompt_with_variant_and_date() {
        let cli = Cli::try_parse_from([
            "weather-alert",
            "prompt",
            "--variant",
            "claude-spc",
            "--date",
            "2024-06-01",
        ])
        .unwrap();
        match cli.command {
            Commands::Prompt { report } => {
                assert_eq!(report.variant, Variant::ClaudeSpc);
                assert_eq!(report.dates().unwrap().short_end(), "June 5, 2024");
            }
            _ => panic!("expected prompt"),
        }
    }

    #[test]
    fn test_date_at_end_of_calendar_is_an_error() {
        let report = ReportArgs {
            variant: Variant::OpenaiPlain,
            date: Some(NaiveDate::MAX),
        };
        let err = report.dates().unwrap_err();
        assert!(err.to_string().contains("--date"));
    }

    #[test]
    fn test_rejects_unknown_variant() {
        assert!(Cli::try_parse_from(["weather-alert", "prompt", "--variant", "gemini"]).is_err());
    }
}
