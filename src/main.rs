use anyhow::{bail, Context, Result};
use nba_parlay::config::Config;
use nba_parlay::engine::eligibility::{self, Window};
use nba_parlay::engine::explain;
use nba_parlay::feed::fixture::{Fixture, FixtureSource};
use nba_parlay::pipeline::{self, PoolOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    legs: Option<usize>,
    wager: Option<f64>,
    window: Option<Window>,
    seed: Option<u64>,
    explain: bool,
    json: bool,
    rules: bool,
}

const USAGE: &str = "usage: nba-parlay [--config <path>] [--legs <2-10>] [--wager <amount>] \
[--window <5|10|15>] [--seed <n>] [--explain] [--json] [--rules]";

fn value<'a>(flag: &str, iter: &mut impl Iterator<Item = &'a String>) -> Result<&'a String> {
    iter.next().with_context(|| format!("{flag} needs a value\n{USAGE}"))
}

fn parse_args(raw: &[String]) -> Result<Args> {
    let mut args = Args::default();
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(PathBuf::from(value(arg, &mut iter)?)),
            "--legs" => {
                args.legs = Some(value(arg, &mut iter)?.parse().context("--legs must be a whole number")?)
            }
            "--wager" => {
                args.wager = Some(value(arg, &mut iter)?.parse().context("--wager must be a number")?)
            }
            "--window" => {
                let games: u32 = value(arg, &mut iter)?.parse().context("--window must be 5, 10 or 15")?;
                args.window = Some(Window::try_from(games)?);
            }
            "--seed" => {
                args.seed = Some(value(arg, &mut iter)?.parse().context("--seed must be a whole number")?)
            }
            "--explain" => args.explain = true,
            "--json" => args.json = true,
            "--rules" => args.rules = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => bail!("unknown argument {other}\n{USAGE}"),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&raw)?;

    if args.rules {
        println!("{}", eligibility::rules_summary());
        return Ok(());
    }

    let config_path = args.config.clone().unwrap_or_else(|| PathBuf::from("config.toml"));
    let config = Config::load(&config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let fixture = Fixture::load(&config.data.fixture)?;
    let source = FixtureSource::from_fixture(&fixture);
    let request = config.request(args.legs, args.wager, args.window, args.seed)?;
    let options = PoolOptions {
        history_depth: config.generation.history_depth,
        head_to_head_days: config.generation.head_to_head_days,
        ..PoolOptions::new(request.window, fixture.as_of)
    };

    tracing::debug!(
        games = fixture.slate.len(),
        legs = request.legs,
        window = %request.window,
        "generating parlay"
    );
    let (parlay, report) = pipeline::generate_parlay(&source, &fixture.slate, &request, &options)
        .await
        .with_context(|| format!("could not build a {}-leg parlay from the slate", request.legs))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&parlay)?);
        return Ok(());
    }

    println!("{}", explain::explain_parlay(&parlay));
    if args.explain {
        for leg in &parlay.legs {
            println!();
            println!("{}", explain::explain_leg(leg));
        }
    }
    tracing::debug!(
        accepted = report.accepted,
        rejected = report.rejected,
        failed = report.failed,
        "done"
    );
    Ok(())
}
