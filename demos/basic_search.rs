//! Runs one search and prints the legacy result list.
//!
//! Run with: `cargo run --example basic_search -- "site:github.com yagooglesearch"`

use yagooglesearch::{SearchClient, SearchConfig, SearchItem};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("yagooglesearch=info").init();

    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "site:github.com yagooglesearch".to_string());

    let config = SearchConfig::new(query)
        .with_tld("com")
        .with_max_results(10)
        .with_manages_http_429s(false)
        .with_verbose_output(true);
    let mut client = SearchClient::new(config)?;

    for item in client.search_items().await? {
        if item.is_http_429_marker() {
            eprintln!("HTTP 429 detected, try again later or switch proxies");
            continue;
        }
        match item {
            SearchItem::Record(record) => println!("{}. {} ({})", record.rank, record.title, record.url),
            SearchItem::Url(url) => println!("{}", url),
        }
    }
    Ok(())
}
