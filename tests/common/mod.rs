//! Scripted fetcher and recording sleeper shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use yagooglesearch::fetcher::{FetchResponse, PageFetcher};
use yagooglesearch::sleeper::Sleeper;
use yagooglesearch::{Result, SearchClient, SearchConfig};

/// Replays canned responses and records every requested URL.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<FetchResponse>>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new(responses: Vec<Result<FetchResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            urls: Mutex::new(Vec::new()),
        })
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        self.urls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(FetchResponse::new(200, "<html></html>")))
    }
}

/// Records requested sleeps without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

pub fn home() -> Result<FetchResponse> {
    Ok(FetchResponse::new(200, "<html><body>Google</body></html>"))
}

pub fn throttled() -> Result<FetchResponse> {
    Ok(FetchResponse::new(429, "<html><body>unusual traffic</body></html>"))
}

/// A modern-layout result page linking to each URL in order.
pub fn page(urls: &[&str]) -> Result<FetchResponse> {
    let blocks: String = urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            format!(
                r#"<div class="g"><a href="{url}"><h3>Result {n}</h3></a><div class="VwiC3b">Snippet {n}</div></div>"#,
                url = url,
                n = i + 1
            )
        })
        .collect();
    Ok(FetchResponse::new(
        200,
        format!(r#"<html><body><div id="search">{}</div></body></html>"#, blocks),
    ))
}

pub fn fixture(html: &str) -> Result<FetchResponse> {
    Ok(FetchResponse::new(200, html))
}

/// A client wired to the given fakes with a fixed seed.
pub fn client(
    config: SearchConfig,
    fetcher: &Arc<ScriptedFetcher>,
    sleeper: &Arc<RecordingSleeper>,
) -> SearchClient {
    SearchClient::new(config)
        .unwrap()
        .with_fetcher(fetcher.clone())
        .with_sleeper(sleeper.clone())
        .with_rng_seed(7)
}
