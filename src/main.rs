mod terminal;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use stackpeek::config::normalize_origin;
use stackpeek::view::NoopRenderer;
use stackpeek::{HttpFetcher, Navigator, Settings, SubmitOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

use terminal::{render_item, TerminalRenderer};

#[derive(Parser)]
#[command(name = "stackpeek", about = "Peek at the top Stack Overflow answers for a question")]
struct Cli {
    /// Site origin to scrape (default: https://stackoverflow.com)
    #[arg(long, global = true)]
    origin: Option<String>,
    /// Delay before loading an answer while paging, in ms
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search once and print the first answered result
    Search {
        /// Query words
        #[arg(required = true)]
        query: Vec<String>,
        /// Print the viewer state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive viewer: type a query, `n`/`p` to page, `q` to quit
    Browse,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(origin) = cli.origin {
        settings.origin = normalize_origin(&origin)?;
    }
    if let Some(ms) = cli.debounce_ms {
        settings.debounce_ms = ms;
    }
    let fetcher = Arc::new(HttpFetcher::new(&settings).context("Failed to build HTTP client")?);

    match cli.command {
        Commands::Search { query, json } => {
            let t0 = Instant::now();
            let query = query.join(" ");
            let nav = Navigator::new(fetcher, &settings, Arc::new(NoopRenderer));

            let spinner = spinner("Searching...");
            let outcome = nav.submit_query(&query).await;
            nav.settle().await;
            spinner.finish_and_clear();

            let snapshot = nav.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            match outcome {
                SubmitOutcome::Skipped => bail!(
                    "Query must be longer than {} characters",
                    settings.min_query_len
                ),
                SubmitOutcome::Failed => bail!("{}", snapshot.error_message),
                SubmitOutcome::Committed | SubmitOutcome::Superseded => {
                    if !json {
                        println!("{}", render_item(&snapshot));
                        let others: Vec<_> = nav.items().into_iter().skip(1).collect();
                        if !others.is_empty() {
                            println!("--- More results ---");
                            for (i, item) in others.iter().enumerate() {
                                println!("{:>3}. [{:>4}] {}", i + 2, item.vote_count, item.title);
                            }
                        }
                    }
                }
            }

            let elapsed = t0.elapsed();
            if elapsed.as_secs() >= 1 && !json {
                println!("\nDone in {:.1}s", elapsed.as_secs_f64());
            }
            Ok(())
        }
        Commands::Browse => browse(fetcher, &settings).await,
    }
}

async fn browse(fetcher: Arc<HttpFetcher>, settings: &Settings) -> anyhow::Result<()> {
    let nav = Navigator::new(fetcher, settings, Arc::new(TerminalRenderer::default()));
    println!("Type a question and hit enter. n = next, p = previous, q = quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "q" | "quit" => break,
            "n" | "next" => nav.on_next_click(),
            "p" | "prev" => nav.on_previous_click(),
            query => {
                let spinner = spinner("Searching...");
                let outcome = nav.on_query_submit(query).await;
                spinner.finish_and_clear();
                if outcome == SubmitOutcome::Skipped {
                    println!(
                        "(query must be longer than {} characters and differ from the last one)",
                        settings.min_query_len
                    );
                }
            }
        }
    }

    nav.settle().await;
    Ok(())
}

fn spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
