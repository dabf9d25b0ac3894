use std::path::PathBuf;

use clap::{Parser, Subcommand};
use whatif::commands::{self, OutputFormat};
use whatif::{PlanFile, init_logging};
use whatif_core::analysis::Orchestrator;
use whatif_core::client::HttpSimulationClient;

#[derive(Parser, Debug)]
#[command(name = "whatif")]
#[command(about = "Run what-if scenarios and sensitivity sweeps against a retirement simulation engine")]
struct Args {
    /// Path to the YAML plan file
    plan: PathBuf,

    #[command(subcommand)]
    command: Command,

    /// Path to the data directory (default: ~/.whatif/)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Skip checking the field table against the engine schema
    #[arg(long)]
    skip_schema_check: bool,

    /// Save scenario outcomes back into the plan file
    #[arg(long)]
    write_back: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run every scenario in the plan
    Scenarios,
    /// Run every sweep in the plan as one batch
    Sweep,
    /// Show the engine schema and check the field table against it
    Schema,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".whatif")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);
    init_logging(&data_dir, &args.log_level)?;

    let mut plan = PlanFile::load(&args.plan)?;
    let client = HttpSimulationClient::new(plan.engine.url.clone(), plan.timeout())?;
    let orchestrator = Orchestrator::new(client, plan.rules()?).with_config(plan.orchestrator);

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let output = match args.command {
        Command::Schema => {
            let schema = commands::check_schema(&orchestrator).await?;
            commands::render_schema(&orchestrator, &schema, format)?
        }
        Command::Scenarios | Command::Sweep => {
            if !args.skip_schema_check {
                commands::check_schema(&orchestrator).await?;
            }
            if args.command == Command::Scenarios {
                let write_back = args.write_back.then_some(args.plan.as_path());
                commands::run_scenarios(&orchestrator, &mut plan, write_back, format).await?
            } else {
                commands::run_sweeps(&orchestrator, &plan, format).await?
            }
        }
    };

    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }

    tracing::info!("whatif finished");
    Ok(())
}
