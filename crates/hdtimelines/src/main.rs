use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use hdtimelines::{Chart, ChartConfig, Timeline, save_svg};

#[derive(Parser)]
#[command(author, version, about = "Render historical-event timelines to SVG", long_about = None)]
struct Args {
    /// Chart configuration file
    #[arg(short = 'c', long = "config", default_value = "config/chart.toml")]
    config: PathBuf,

    /// Saved timeline (JSON); its topics are drawn first, in order
    #[arg(short = 't', long = "timeline")]
    timelines: Vec<PathBuf>,

    /// Topic from an event CSV file, as TITLE=PATH
    #[arg(long = "topic", value_parser = parse_topic)]
    topics: Vec<(String, PathBuf)>,

    /// Chart title (overrides the config file)
    #[arg(long)]
    title: Option<String>,

    /// Start of the initially visible range
    #[arg(long)]
    mindate: Option<String>,

    /// End of the initially visible range
    #[arg(long)]
    maxdate: Option<String>,

    /// Fit the x axis to the events drawn
    #[arg(long)]
    fit: bool,

    /// Also write the combined timeline as JSON
    #[arg(long = "save-timeline")]
    save_timeline: Option<PathBuf>,

    /// Output SVG path
    #[arg(short = 'o', long = "output", default_value = "timeline.svg")]
    output: PathBuf,
}

fn parse_topic(s: &str) -> std::result::Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((title, path)) if !path.trim().is_empty() => {
            Ok((title.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => Err(format!("expected TITLE=PATH, got '{}'", s)),
    }
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
    let args = Args::parse();

    let mut config = if args.config.exists() {
        ChartConfig::load_from_file(&args.config)?
    } else {
        warn!(
            "Config file not found: {}, using default settings",
            args.config.display()
        );
        ChartConfig::default()
    };
    if let Some(title) = args.title {
        config.chart.title = title;
    }
    if args.mindate.is_some() {
        config.chart.mindate = args.mindate;
    }
    if args.maxdate.is_some() {
        config.chart.maxdate = args.maxdate;
    }
    config.validate()?;

    let mut timeline = Timeline::new(&config.chart.title);
    for path in &args.timelines {
        let saved = Timeline::load(path)
            .with_context(|| format!("Failed to load timeline {}", path.display()))?;
        if timeline.title.is_empty() {
            timeline.title = saved.title.clone();
        }
        for topic in saved.topics {
            timeline.add_topic(&topic.title, topic.events);
        }
    }
    for (title, path) in &args.topics {
        timeline
            .add_topic_csv(title, path)
            .with_context(|| format!("Failed to load topic '{}'", title))?;
    }
    if timeline.topics.is_empty() {
        bail!("No topics given; use --topic TITLE=PATH or --timeline FILE");
    }
    if config.chart.title.is_empty() {
        config.chart.title = timeline.title.clone();
    }

    let mut chart = Chart::new(&config.chart)?;
    for topic in &timeline.topics {
        chart
            .add_topic(topic, &config.topics)
            .with_context(|| format!("Failed to lay out topic '{}'", topic.title))?;
    }
    if args.fit && !chart.fit_to_data() {
        warn!("Nothing to fit the x axis to");
    }

    save_svg(&chart, &config.render, &args.output)?;
    info!("Timeline saved to: {}", args.output.display());
    info!(
        "{} topics, {} events drawn",
        chart.bands().len(),
        chart.events().len()
    );

    if let Some(path) = &args.save_timeline {
        timeline.save(path)?;
        info!("Timeline data saved to: {}", path.display());
    }

    Ok(())
}
