use anyhow::{Context, Result};
use clap::Parser;
use pronunciation_scorer::audio::decoder::{decode_audio, load_for_analysis};
use pronunciation_scorer::config::load_engine_config;
use pronunciation_scorer::pronunciation::cli::{
    AnalyzeArgs, BatchArgs, Cli, Command, CompareArgs, EngineArgs, InfoArgs,
};
use pronunciation_scorer::pronunciation::worker::compare_batch;
use pronunciation_scorer::pronunciation::{Comparison, PronunciationEngine};
use serde_json::json;
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Compare(args) => handle_compare(&args),
        Command::Batch(args) => handle_batch(&args),
        Command::Analyze(args) => handle_analyze(&args),
        Command::Info(args) => handle_info(&args),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine(args: &EngineArgs) -> Result<PronunciationEngine> {
    let config = load_engine_config(args.config.as_deref())?;
    PronunciationEngine::new(config).context("Failed to build pronunciation engine")
}

fn handle_compare(args: &CompareArgs) -> Result<()> {
    let engine = build_engine(&args.engine)?;
    let rate = engine.config().extraction.sample_rate;
    let user = load_for_analysis(&args.user, rate)
        .with_context(|| format!("Failed to load learner audio {:?}", args.user))?;
    let reference = load_for_analysis(&args.reference, rate)
        .with_context(|| format!("Failed to load reference audio {:?}", args.reference))?;
    let comparison = engine
        .compare(&user, &reference, args.level())
        .context("Pronunciation comparison failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print_report(&comparison);
    }
    Ok(())
}

fn handle_batch(args: &BatchArgs) -> Result<()> {
    let engine = build_engine(&args.engine)?;
    let rate = engine.config().extraction.sample_rate;
    let reference = load_for_analysis(&args.reference, rate)
        .with_context(|| format!("Failed to load reference audio {:?}", args.reference))?;
    let takes = args
        .takes
        .iter()
        .map(|path| {
            load_for_analysis(path, rate)
                .with_context(|| format!("Failed to load learner audio {:?}", path))
        })
        .collect::<Result<Vec<_>>>()?;

    info!(takes = takes.len(), level = %args.level(), "scoring batch");
    let results = compare_batch(&engine, &reference, &takes, args.level());
    for (path, result) in args.takes.iter().zip(results) {
        let line = match result {
            Ok(comparison) => json!({
                "file": path.display().to_string(),
                "final_score": comparison.final_score(),
                "rating": comparison.feedback.rating,
            }),
            Err(err) => json!({
                "file": path.display().to_string(),
                "error": err.to_string(),
            }),
        };
        println!("{line}");
    }
    Ok(())
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<()> {
    let engine = build_engine(&args.engine)?;
    let buffer = load_for_analysis(&args.input, engine.config().extraction.sample_rate)
        .with_context(|| format!("Failed to load audio {:?}", args.input))?;
    let features = engine
        .analyze(&buffer)
        .context("Feature extraction failed")?;
    let report = json!({
        "summary": features.summary(),
        "mfcc_mean": features.mfcc_mean.to_vec(),
        "mfcc_std": features.mfcc_std.to_vec(),
        "spectral_centroid_std": features.spectral_centroid_std,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn handle_info(args: &InfoArgs) -> Result<()> {
    let decoded =
        decode_audio(&args.input).with_context(|| format!("Failed to decode {:?}", args.input))?;
    println!("{}", serde_json::to_string_pretty(&decoded.info())?);
    Ok(())
}

fn print_report(comparison: &Comparison) {
    let feedback = &comparison.feedback;
    println!(
        "Score: {:.2} / 100 ({})",
        comparison.final_score(),
        feedback.rating.label()
    );
    println!("{}", feedback.overall);
    for detail in &feedback.details {
        println!(
            "  {:<7} {:>5.1}  {}",
            detail.aspect.label(),
            detail.score,
            detail.comment
        );
    }
    println!("Tip: {}", feedback.tip);
}
