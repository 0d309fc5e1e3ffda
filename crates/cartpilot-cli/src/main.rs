mod discover;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;

use cartpilot_api::StorefrontClient;
use cartpilot_browser::PageSession;
use cartpilot_ui::{read_csrf_token, CartController, PageView, UiConfig};

/// Cartpilot -- wire a storefront cart page to its JSON API.
#[derive(Parser, Debug)]
#[command(name = "cartpilot", version, about)]
struct Cli {
    /// DevTools HTTP endpoint of the running browser
    #[arg(long, global = true, default_value = "http://127.0.0.1:9222")]
    devtools: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List debuggable page targets
    Targets,

    /// Attach to a cart page and serve its controls until Ctrl-C
    Attach {
        /// Select the first page whose URL starts with this prefix
        #[arg(long, conflicts_with = "ws_url")]
        page: Option<String>,

        /// Attach to an explicit WebSocket debugger URL instead
        #[arg(long)]
        ws_url: Option<String>,

        /// Shop origin for API requests (defaults to the page's origin)
        #[arg(long)]
        base_url: Option<String>,

        /// TOML file overriding the page's selectors and timings
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Targets => cmd_targets(&cli.devtools).await,
        Commands::Attach {
            page,
            ws_url,
            base_url,
            config,
        } => cmd_attach(&cli.devtools, page, ws_url, base_url, config).await,
    }
}

async fn cmd_targets(devtools: &str) -> Result<()> {
    let targets = discover::list_page_targets(devtools).await?;
    if targets.is_empty() {
        println!("No debuggable pages at {devtools}.");
        return Ok(());
    }
    for target in targets {
        println!("{}\t{}", target.url, target.title);
    }
    Ok(())
}

async fn cmd_attach(
    devtools: &str,
    page: Option<String>,
    ws_url: Option<String>,
    base_url: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (ws, page_url) = match ws_url {
        Some(ws) => (ws, None),
        None => {
            let targets = discover::list_page_targets(devtools).await?;
            let target = discover::select_target(&targets, page.as_deref())
                .context("no matching page target; run `cartpilot targets` to list candidates")?;
            let ws = target
                .ws_url
                .clone()
                .context("selected target exposes no WebSocket debugger URL")?;
            (ws, Some(target.url.clone()))
        }
    };

    let ui_config = match config_path {
        Some(path) => UiConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => UiConfig::default(),
    };

    let (session, mut events) = PageSession::attach(&ws).await?;

    let base = resolve_base(&session, base_url, page_url.as_deref()).await?;
    let config = Arc::new(ui_config);
    let view = Arc::new(PageView::new(
        session.clone(),
        Arc::clone(&config),
        base.clone(),
    ));

    let csrf_token = read_csrf_token(view.as_ref(), &config.csrf_meta_name).await?;
    let api = StorefrontClient::new(base.as_str(), &csrf_token)?;

    let mut controller = CartController::new(api, view, (*config).clone());
    controller.attach().await?;

    tracing::info!(shop = %base, "attached; serving cart controls (Ctrl-C to stop)");

    tokio::select! {
        result = controller.run(&mut events) => {
            result?;
            tracing::info!("page session ended");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }
    Ok(())
}

/// Work out the shop origin: an explicit flag wins, then the discovered
/// target URL, then whatever the page itself reports.
async fn resolve_base(
    session: &PageSession,
    base_url: Option<String>,
    page_url: Option<&str>,
) -> Result<Url> {
    let raw = match (base_url, page_url) {
        (Some(base), _) => base,
        (None, Some(page_url)) => origin_of(page_url)?,
        (None, None) => {
            let value = session.evaluate("window.location.origin").await?;
            value
                .as_str()
                .map(str::to_string)
                .context("page reported no origin")?
        }
    };
    Url::parse(&raw).with_context(|| format!("invalid shop origin `{raw}`"))
}

fn origin_of(page_url: &str) -> Result<String> {
    let url =
        Url::parse(page_url).with_context(|| format!("invalid page URL `{page_url}`"))?;
    Ok(url.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_of_strips_path_and_query() {
        assert_eq!(
            origin_of("http://127.0.0.1:5000/cart?from=nav").unwrap(),
            "http://127.0.0.1:5000"
        );
    }

    #[test]
    fn origin_of_rejects_garbage() {
        assert!(origin_of("not a url").is_err());
    }
}
