use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use services::{AppServices, AudioService, LocalPurchaseApi, SilentAudio, TracingAudio};
use storage::DirectoryBundle;
use tracing_subscriber::{EnvFilter, fmt as log_fmt, prelude::*};

mod console;

const DEFAULT_DATA_DIR: &str = "./trivia-data";
const DEFAULT_BUNDLE_DIR: &str = "./crates/app/assets";

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSeed { raw: String },
    EmptyPath { flag: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::EmptyPath { flag } => write!(f, "{flag} cannot be empty"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_path(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<PathBuf, ArgsError> {
    let value = require_value(args, flag)?;
    if value.trim().is_empty() {
        return Err(ArgsError::EmptyPath { flag });
    }
    Ok(PathBuf::from(value))
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--data-dir <path>] [--bundle-dir <path>]");
    eprintln!("                      [--seed <u64>] [--silent]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --data-dir {DEFAULT_DATA_DIR}");
    eprintln!("  --bundle-dir {DEFAULT_BUNDLE_DIR}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TRIVIA_DATA_DIR, TRIVIA_BUNDLE_DIR, TRIVIA_SEED, RUST_LOG");
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    data_dir: PathBuf,
    bundle_dir: PathBuf,
    seed: Option<u64>,
    silent: bool,
    help: bool,
}

impl Args {
    /// Flags win over environment values, which win over defaults.
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut data_dir = env("TRIVIA_DATA_DIR")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);
        let mut bundle_dir = env("TRIVIA_BUNDLE_DIR")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_BUNDLE_DIR), PathBuf::from);
        let mut seed = env("TRIVIA_SEED").and_then(|value| value.parse::<u64>().ok());
        let mut silent = false;
        let mut help = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data-dir" => data_dir = require_path(args, "--data-dir")?,
                "--bundle-dir" => bundle_dir = require_path(args, "--bundle-dir")?,
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    seed = Some(parsed);
                }
                "--silent" => silent = true,
                "--help" | "-h" => help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            data_dir,
            bundle_dir,
            seed,
            silent,
            help,
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(log_fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if args.help {
        print_usage();
        return Ok(());
    }

    init_tracing();
    tracing::info!(
        data_dir = %args.data_dir.display(),
        bundle_dir = %args.bundle_dir.display(),
        "starting trivia"
    );

    let audio: Arc<dyn AudioService> = if args.silent {
        Arc::new(SilentAudio)
    } else {
        Arc::new(TracingAudio)
    };
    let bundle = DirectoryBundle::new(&args.bundle_dir);
    let mut app = AppServices::open(
        &args.data_dir,
        &bundle,
        Arc::new(LocalPurchaseApi::new()),
        audio,
        args.seed,
    )
    .await;

    let result = console::run(&mut app).await;
    app.shutdown();
    result?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
