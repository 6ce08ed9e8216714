//! Search client facade.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::cookie::Jar;
use tracing::{debug, info};

use crate::fetcher::PageFetcher;
use crate::fetcher_http::HttpFetcher;
use crate::parser::ResultParser;
use crate::session::Session;
use crate::sleeper::{Sleeper, TokioSleeper};
use crate::user_agents::random_user_agent;
use crate::{Result, SearchConfig, SearchItem, SessionOutcome};

/// A configured Google search client.
///
/// The client owns one cookie jar for its lifetime. `search` takes `&mut self`,
/// so a client never runs two sessions at once; use separate clients for
/// concurrent searches.
pub struct SearchClient {
    config: SearchConfig,
    user_agent: String,
    jar: Arc<Jar>,
    fetcher: Arc<dyn PageFetcher>,
    custom_fetcher: bool,
    sleeper: Arc<dyn Sleeper>,
    parser: ResultParser,
    rng: StdRng,
}

impl SearchClient {
    /// Creates a client, normalizing and validating the configuration.
    ///
    /// Without a configured user agent a random one is picked from the pool.
    pub fn new(config: SearchConfig) -> Result<Self> {
        let config = config.normalized();
        config.validate()?;

        let mut rng = StdRng::from_entropy();
        let user_agent = match &config.user_agent {
            Some(user_agent) => user_agent.clone(),
            None => random_user_agent(&mut rng).to_string(),
        };
        debug!("Using user agent: {}", user_agent);

        let jar = Arc::new(Jar::default());
        let fetcher = HttpFetcher::with_jar(&config, &user_agent, Arc::clone(&jar))?;

        Ok(Self {
            config,
            user_agent,
            jar,
            fetcher: Arc::new(fetcher),
            custom_fetcher: false,
            sleeper: Arc::new(TokioSleeper),
            parser: ResultParser::new()?,
            rng,
        })
    }

    /// Replaces the HTTP fetcher, e.g. with a scripted one in tests.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self.custom_fetcher = true;
        self
    }

    /// Replaces the sleeper used for page delays and cool-offs.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Seeds the random source used for delays and user agent picks.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The user agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Edits the configuration between searches.
    ///
    /// The edited configuration goes through the same normalization and
    /// validation as [`SearchClient::new`]; on error the client is unchanged.
    /// Changing transport settings rebuilds the HTTP fetcher, keeping cookies.
    pub fn update<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut SearchConfig),
    {
        let mut config = self.config.clone();
        edit(&mut config);
        let config = config.normalized();
        config.validate()?;

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| self.user_agent.clone());
        let transport_changed = user_agent != self.user_agent
            || config.tld != self.config.tld
            || config.headers != self.config.headers
            || config.proxy != self.config.proxy
            || config.verify_ssl != self.config.verify_ssl
            || config.google_exemption != self.config.google_exemption;

        if transport_changed && !self.custom_fetcher {
            self.fetcher = Arc::new(HttpFetcher::with_jar(&config, &user_agent, Arc::clone(&self.jar))?);
        }

        self.config = config;
        self.user_agent = user_agent;
        Ok(())
    }

    /// Picks a new random user agent from the pool and returns it.
    pub fn assign_random_user_agent(&mut self) -> Result<&str> {
        let user_agent = random_user_agent(&mut self.rng).to_string();
        info!("Assigned random user agent: {}", user_agent);
        self.update(|config| config.user_agent = Some(user_agent))?;
        Ok(&self.user_agent)
    }

    /// Runs one search session.
    pub async fn search(&mut self) -> Result<SessionOutcome> {
        info!("Searching for: {}", self.config.query);
        Session::new(
            &self.config,
            self.fetcher.as_ref(),
            self.sleeper.as_ref(),
            &self.parser,
            &mut self.rng,
        )
        .run()
        .await
    }

    /// Runs one search and returns the legacy flat list, ending with the
    /// [`HTTP_429_DETECTED`](crate::HTTP_429_DETECTED) marker when a 429 was
    /// left to the caller.
    pub async fn search_items(&mut self) -> Result<Vec<SearchItem>> {
        Ok(self.search().await?.into_items())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_agents::user_agents;
    use crate::SearchError;

    #[test]
    fn test_client_new() {
        let client = SearchClient::new(SearchConfig::new("rust")).unwrap();
        assert_eq!(client.config().query, "rust");
        assert!(user_agents().contains(&client.user_agent()));
    }

    #[test]
    fn test_client_uses_configured_user_agent() {
        let client = SearchClient::new(SearchConfig::new("rust").with_user_agent("my-agent/1.0")).unwrap();
        assert_eq!(client.user_agent(), "my-agent/1.0");
    }

    #[test]
    fn test_client_normalizes_config() {
        let config = SearchConfig::new("rust").with_num(250).with_languages("en", "lang_xx");
        let client = SearchClient::new(config).unwrap();
        assert_eq!(client.config().num, 100);
        assert_eq!(client.config().lang_result, "lang_en");
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        assert!(matches!(
            SearchClient::new(SearchConfig::new("  ")),
            Err(SearchError::InvalidQuery(_))
        ));
        assert!(matches!(
            SearchClient::new(SearchConfig::new("rust").with_extra_param("q", "x")),
            Err(SearchError::Configuration(_))
        ));
    }

    #[test]
    fn test_update_applies_and_validates() {
        let mut client = SearchClient::new(SearchConfig::new("rust")).unwrap();
        client.update(|config| config.query = "tokio".into()).unwrap();
        assert_eq!(client.config().query, "tokio");

        let err = client.update(|config| config.query.clear());
        assert!(err.is_err());
        assert_eq!(client.config().query, "tokio");
    }

    #[test]
    fn test_update_rebuilds_fetcher_on_proxy_change() {
        let mut client = SearchClient::new(SearchConfig::new("rust")).unwrap();
        let before = Arc::as_ptr(&client.fetcher) as *const ();
        client
            .update(|config| config.proxy = Some("socks5h://127.0.0.1:9050".into()))
            .unwrap();
        let after = Arc::as_ptr(&client.fetcher) as *const ();
        assert_ne!(before, after);
    }

    #[test]
    fn test_assign_random_user_agent_is_seeded() {
        let mut a = SearchClient::new(SearchConfig::new("rust")).unwrap().with_rng_seed(3);
        let mut b = SearchClient::new(SearchConfig::new("rust")).unwrap().with_rng_seed(3);
        let ua_a = a.assign_random_user_agent().unwrap().to_string();
        let ua_b = b.assign_random_user_agent().unwrap().to_string();
        assert_eq!(ua_a, ua_b);
        assert_eq!(a.config().user_agent.as_deref(), Some(ua_a.as_str()));
    }
}
