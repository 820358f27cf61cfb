use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use recipedb_core::config::Config;
use recipedb_embed::provider_from_config;
use recipedb_search::{SearchEngine, SearchOutcome};

const PROMPT: &str = "🔍 Enter search phrase (blank to exit): ";

fn print_outcome(outcome: &SearchOutcome) {
    if outcome.results.is_empty() {
        println!("No matching recipes.");
        return;
    }
    for r in &outcome.results {
        println!("[{:.3}] {} (ID {})", r.score, r.name, r.id);
    }
}

fn spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    let backend = config.settings().embedding.backend;

    let pb = spinner(format!("Loading {backend} embedding backend..."));
    let (config, provider) = tokio::task::spawn_blocking(move || {
        let provider = provider_from_config(&config);
        (config, provider)
    })
    .await?;
    let provider = match provider {
        Ok(p) => p,
        Err(e) => {
            pb.abandon_with_message("❌ embedding backend failed to load");
            return Err(e.into());
        }
    };
    pb.finish_with_message(format!("✅ {} ready", provider.embedder_id()));

    let engine = SearchEngine::from_config(&config, Arc::from(provider)).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{PROMPT}");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let input = line.trim();
        if input.is_empty() {
            break;
        }
        if input == "/refresh" {
            match engine.refresh_expansions().await {
                Ok(n) => println!("Expansion table reloaded ({n} entries)."),
                Err(e) if e.is_recoverable() => eprintln!("❌ {e}"),
                Err(e) => return Err(e.into()),
            }
            continue;
        }
        match engine.search(input).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) if e.is_recoverable() => eprintln!("❌ {e}"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
