use std::path::PathBuf;

use clap::Parser;
use sensa::{AnalysisFile, init_logging, report, run};

#[derive(Parser, Debug)]
#[command(name = "sensa")]
#[command(about = "Global sensitivity analysis of analytic test models")]
struct Args {
    /// Path to the analysis file (YAML)
    config: PathBuf,

    /// Override the method named in the file (morris, sobol, random, lhs, local)
    #[arg(short, long)]
    method: Option<String>,

    /// Override the base sample size
    #[arg(short = 'n', long)]
    samples: Option<usize>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level)?;

    let mut file = AnalysisFile::load(&args.config)?;
    if let Some(method) = args.method {
        file.analysis.method = method;
    }
    if let Some(samples) = args.samples {
        file.analysis.samples = samples;
    }

    let analysis = run(&file)?;
    print!("{}", report::render(&analysis));

    tracing::info!("analysis finished");
    Ok(())
}
