use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ref_four_star_value::{four_star_value, report, Session, ValuationInput, ZeroPolicy};

#[derive(Parser)]
#[command(name = "ref-four-star-value")]
#[command(about = "REF 4* output and impact case study value calculator", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value every row of a CSV file and write four_star_value.csv
    Calculate {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Handling for rows whose formula denominator is zero
        #[arg(long, value_enum, default_value_t = ZeroPolicy::Blank)]
        on_zero: ZeroPolicy,
        /// Print the augmented table
        #[arg(long)]
        show: bool,
        /// Maximum rows to print with --show
        #[arg(long)]
        limit: Option<usize>,
        /// Print the run summary as JSON
        #[arg(long)]
        json_summary: bool,
    },
    /// Value a single sub-profile
    Value {
        #[arg(long)]
        allocation: f64,
        #[arg(long)]
        outputs: u32,
        #[arg(long)]
        three_star: f64,
        #[arg(long)]
        four_star: f64,
    },
    /// List the columns an upload must contain
    Columns,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose {
        "ref_four_star_value=debug"
    } else {
        "ref_four_star_value=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Calculate {
            csv,
            out_dir,
            on_zero,
            show,
            limit,
            json_summary,
        } => {
            let data = std::fs::read(&csv)
                .with_context(|| format!("failed to read {}", csv.display()))?;

            let mut session = Session::new(on_zero);
            session.upload(data);
            session
                .load()
                .with_context(|| format!("failed to load {}", csv.display()))?;
            let summary = session.compute()?.clone();

            if show {
                if let Some(table) = session.table() {
                    print!("{}", report::render_table(table, limit));
                    println!();
                }
            }

            let export = session.export()?;
            let out = out_dir.join(export.file_name);
            std::fs::write(&out, &export.data)
                .with_context(|| format!("failed to write {}", out.display()))?;

            if json_summary {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", report::render_summary(&summary));
            }
            println!("Written to {} ({}).", out.display(), export.media_type);
        }
        Commands::Value {
            allocation,
            outputs,
            three_star,
            four_star,
        } => {
            let input = ValuationInput {
                mainstream_allocation: allocation,
                outputs_required: outputs,
                three_star_activity: three_star,
                four_star_activity: four_star,
            };
            let value = four_star_value(&input).context("cannot value this sub-profile")?;
            println!("{value:.2}");
        }
        Commands::Columns => {
            print!("{}", report::render_expected_columns());
        }
    }

    Ok(())
}
