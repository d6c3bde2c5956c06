//! Responder CLI binary.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use responder_core::{OccasionCalendar, Responder, ResponderConfig, Strategy, Vocabulary};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "responder", version, about = "Pattern-based persona chat responder")]
struct Args {
    /// Base vocabulary document
    #[arg(long)]
    vocab: PathBuf,

    /// Overlay vocabulary, optionally with a merge priority (FILE[:PRIORITY])
    #[arg(long = "overlay")]
    overlays: Vec<String>,

    /// Directory holding `<occasion>.json` overlays for today's occasions
    #[arg(long)]
    occasion_dir: Option<PathBuf>,

    /// Built-in locale profile (en, fr, it, es, zh, ja)
    #[arg(long, default_value = "en")]
    locale: String,

    /// Scoring strategy (overlap, sequence, tfidf, bayes)
    #[arg(long, default_value = "sequence")]
    strategy: String,

    /// JSON engine configuration; overrides --locale and --strategy
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prefer questions on low-confidence matches
    #[arg(long)]
    question_bias: bool,

    /// Print per-pattern diagnostics instead of a response
    #[arg(long)]
    debug: bool,

    /// Answer one utterance and exit
    #[arg(long)]
    say: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_config(args: &Args) -> Result<ResponderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ResponderConfig::from_json(&json)?
        }
        None => {
            let strategy: Strategy = args.strategy.parse()?;
            ResponderConfig::for_locale(&args.locale, strategy)?
        }
    };
    config.question_bias |= args.question_bias;
    Ok(config)
}

/// `FILE[:PRIORITY]`; a missing priority means 0.
fn parse_overlay(arg: &str) -> Result<(PathBuf, i64)> {
    if let Some((path, priority)) = arg.rsplit_once(':') {
        if let Ok(priority) = priority.parse::<i64>() {
            return Ok((PathBuf::from(path), priority));
        }
    }
    Ok((PathBuf::from(arg), 0))
}

fn overlay_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_responder(args: &Args) -> Result<Responder> {
    let config = build_config(args)?;
    let vocabulary = Vocabulary::from_file(&args.vocab)
        .with_context(|| format!("loading vocabulary {}", args.vocab.display()))?;
    let responder = Responder::with_vocabulary(config, vocabulary)?;

    for arg in &args.overlays {
        let (path, priority) = parse_overlay(arg)?;
        let overlay = Vocabulary::from_file(&path)
            .with_context(|| format!("loading overlay {}", path.display()))?;
        responder.apply_overlay(&overlay_name(&path), &overlay, priority);
    }

    if let Some(dir) = &args.occasion_dir {
        let today = chrono::Local::now().date_naive();
        for occasion in OccasionCalendar::default().due(today) {
            let path = dir.join(format!("{}.json", occasion.name));
            // A missing occasion file only costs the occasion
            match Vocabulary::from_file(&path) {
                Ok(overlay) => {
                    responder.apply_overlay(&occasion.name, &overlay, occasion.priority)
                }
                Err(e) => {
                    tracing::warn!(occasion = %occasion.name, error = %e, "skipping occasion overlay")
                }
            }
        }
    }

    for warning in responder.warnings() {
        eprintln!(
            "warning: pattern {:?} in intent '{}' never matches: {}",
            warning.pattern, warning.intent, warning.reason
        );
    }
    Ok(responder)
}

fn answer(responder: &Responder, utterance: &str, debug: bool) -> Result<String> {
    if debug {
        Ok(serde_json::to_string_pretty(&responder.debug_match(utterance))?)
    } else {
        Ok(responder.generate_response(utterance))
    }
}

fn run(args: Args) -> Result<()> {
    let responder = build_responder(&args)?;

    if let Some(utterance) = &args.say {
        println!("{}", answer(&responder, utterance, args.debug)?);
        return Ok(());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        writeln!(stdout, "{}", answer(&responder, &line, args.debug)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
