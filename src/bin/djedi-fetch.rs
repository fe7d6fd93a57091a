//! djedi-fetch - resolve Djedi nodes from the command line
//!
//! Every URI argument is looked up through the batching client, so all of
//! them travel in one `load_many` request. Prefixes are loaded with
//! `load_by_prefix`. The result is printed as a JSON object.

use clap::Parser;
use djedi_client::{config::interval_from_millis, ClientOptions, ContentClient, HttpTransport, Node};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Fetch Djedi content nodes and print them as JSON
#[derive(Parser, Debug)]
#[command(name = "djedi-fetch")]
#[command(about = "Fetch Djedi content nodes and print them as JSON")]
struct Args {
    /// Base URL of the CMS serving /djedi/load_many and /djedi/load_by_prefix
    #[arg(long, env = "DJEDI_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Batch window in milliseconds (0 or less sends one request per node)
    #[arg(long, env = "DJEDI_BATCH_INTERVAL_MS", default_value = "10", allow_hyphen_values = true)]
    batch_interval_ms: i64,

    /// Request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    request_timeout_ms: u64,

    /// URI prefix to load (repeatable)
    #[arg(long = "prefix")]
    prefixes: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Node URIs, optionally with a default value: `home/title=Welcome`
    uris: Vec<String>,
}

fn parse_node(arg: &str) -> Node {
    match arg.split_once('=') {
        Some((uri, default)) => Node::with_default(uri, default),
        None => Node::new(arg),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("djedi_client={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if args.uris.is_empty() && args.prefixes.is_empty() {
        anyhow::bail!("nothing to fetch: pass node URIs and/or --prefix");
    }

    let options = ClientOptions::default()
        .with_base_url(args.base_url.clone())
        .with_batch_interval(interval_from_millis(args.batch_interval_ms));
    let transport = HttpTransport::with_timeout(Duration::from_millis(args.request_timeout_ms))?;
    let client = ContentClient::with_transport(options, Arc::new(transport));

    info!("Fetching from {}", args.base_url);

    let mut output: BTreeMap<String, Option<String>> = BTreeMap::new();

    if !args.prefixes.is_empty() {
        let loaded = client.load_by_prefix(&args.prefixes).await?;
        info!("Loaded {} node(s) by prefix", loaded.len());
        for (uri, value) in loaded {
            output.insert(client.canonical_uri(&uri), value);
        }
    }

    let nodes: Vec<Node> = args.uris.iter().map(|arg| parse_node(arg)).collect();
    let results = join_all(nodes.iter().cloned().map(|node| client.get_batched(node))).await;

    let mut failures = 0;
    for (node, result) in nodes.iter().zip(results) {
        match result {
            Ok(resolved) => {
                output.insert(resolved.uri, resolved.value);
            }
            Err(ref e) => {
                failures += 1;
                error!("{}: {}", node.uri, e);
                output.insert(client.canonical_uri(&node.uri), client.render_result(&result));
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&output)?);

    if failures > 0 {
        anyhow::bail!("{} node(s) could not be resolved", failures);
    }
    Ok(())
}
