//! Live searches against Google.
//!
//! These tests are marked with `#[ignore]` by default because they require
//! network access, are slow and may be throttled.
//!
//! Run with: `cargo test --test integration -- --ignored`

use yagooglesearch::{SearchClient, SearchConfig, SessionStatus};

#[tokio::test]
#[ignore]
async fn test_live_search() {
    let config = SearchConfig::new("site:github.com rust-lang")
        .with_num(10)
        .with_max_results(10)
        .with_manages_http_429s(false);
    let mut client = SearchClient::new(config).unwrap();

    let outcome = client.search().await.unwrap();
    println!("Live search ended with {:?}", outcome.status);
    for record in outcome.results.iter().take(3) {
        println!("  {}. {} - {}", record.rank, record.title, record.url);
    }

    if outcome.status == SessionStatus::ThrottledUnhandled {
        println!("Throttled by Google, nothing more to check");
        return;
    }
    assert!(!outcome.is_empty(), "Google should return results");
    assert!(outcome.urls().iter().all(|url| !url.contains("google")));
}

#[tokio::test]
#[ignore]
async fn test_live_search_past_day_verbose() {
    let config = SearchConfig::new("rust programming language")
        .with_tbs(yagooglesearch::Tbs::Past(yagooglesearch::TimeRange::Day))
        .with_num(10)
        .with_max_results(5)
        .with_verbose_output(true)
        .with_manages_http_429s(false);
    let mut client = SearchClient::new(config).unwrap();

    let items = client.search_items().await.unwrap();
    println!("Past-day search returned {} items", items.len());
    assert!(items.len() <= 6);
}
