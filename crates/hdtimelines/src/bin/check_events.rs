use anyhow::Result;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

use hdtimelines::{DateOrder, DateResolver, check_events};

#[derive(Parser)]
#[command(author, version, about = "Check event CSV files before charting them", long_about = None)]
struct Args {
    /// Event CSV files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// How slash-separated dates are read: default, mdy or dmy
    #[arg(long = "date-order", default_value = "default", value_parser = parse_order)]
    date_order: DateOrder,
}

fn parse_order(s: &str) -> std::result::Result<DateOrder, String> {
    match s {
        "default" => Ok(DateOrder::Default),
        "mdy" => Ok(DateOrder::Mdy),
        "dmy" => Ok(DateOrder::Dmy),
        _ => Err(format!("date order must be default, mdy or dmy, not '{}'", s)),
    }
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
    let args = Args::parse();
    let resolver = DateResolver::new(args.date_order);

    let mut failures = 0;
    for path in &args.files {
        match check_events(path, &resolver) {
            Ok(count) => info!("{}: OK, {} events", path.display(), count),
            Err(e) => {
                error!("{}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        error!("{} of {} files failed", failures, args.files.len());
        std::process::exit(1);
    }
    Ok(())
}
