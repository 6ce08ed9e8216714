//! Result page parsing.
//!
//! Google rotates its result markup regularly and serves a stripped-down
//! variant to clients it does not recognise. The parser therefore works in two
//! steps, each with explicit fallbacks:
//!
//! 1. Locate result blocks with the first block selector that matches the
//!    page, or fall back to treating every anchor in `#search` as a block.
//! 2. Run the extraction strategies on each block in order; the first one
//!    that yields a record wins. Blocks nothing can extract are skipped.

use std::collections::HashSet;

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::filter::{is_self_referential, ENGINE_DOMAIN};
use crate::{Result, ResultRecord, SearchError};

/// Result block selectors, newest markup first.
const BLOCK_SELECTORS: &[&str] = &[
    "div.g",
    "div.MjjYud",
    "div.tF2Cxc",
    "div.Gx5Zad",
    "div.ZINbbc",
];

/// Snippet containers used by the JavaScript result layout.
const SNIPPET_SELECTOR: &str = "div.VwiC3b, div[data-sncf], span.aCOpRe, div.IsZvec";

/// Base used to resolve relative redirect links such as `/url?q=...`.
const REDIRECT_BASE: &str = "https://www.google.com/";

/// Compiled selectors shared by the extraction strategies.
pub struct Selectors {
    blocks: Vec<Selector>,
    search_root: Selector,
    gbar: Selector,
    anchor: Selector,
    heading: Selector,
    snippet: Selector,
    basic_title: Selector,
    basic_snippet: Selector,
    whitespace: Regex,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("{}: {:?}", css, e)))
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            blocks: BLOCK_SELECTORS
                .iter()
                .map(|css| selector(css))
                .collect::<Result<Vec<_>>>()?,
            search_root: selector("#search")?,
            gbar: selector("#gbar")?,
            anchor: selector("a[href]")?,
            heading: selector("h3")?,
            snippet: selector(SNIPPET_SELECTOR)?,
            basic_title: selector("div.vvjwJb")?,
            basic_snippet: selector("div.BNeawe.s3v9rd, div.s3v9rd")?,
            whitespace: Regex::new(r"\s+").map_err(|e| SearchError::Parse(e.to_string()))?,
        })
    }

    fn collapse(&self, raw: &str) -> String {
        self.whitespace.replace_all(raw, " ").trim().to_string()
    }

    /// Element text with runs of whitespace collapsed.
    fn text(&self, element: ElementRef<'_>) -> String {
        let raw: String = element.text().collect();
        self.collapse(&raw)
    }

    /// Anchors to consider for a block. A block may itself be an anchor.
    fn anchors<'a>(&self, block: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        if block.value().name() == "a" && block.value().attr("href").is_some() {
            vec![block]
        } else {
            block.select(&self.anchor).collect()
        }
    }
}

/// A pure extraction strategy: block in, record out. `rank` is the position
/// the record takes on the page if the strategy succeeds.
pub type ExtractStrategy = fn(&Selectors, ElementRef<'_>, u32) -> Option<ResultRecord>;

/// Parser that turns a result page into ordered [`ResultRecord`]s.
pub struct ResultParser {
    selectors: Selectors,
    strategies: Vec<(&'static str, ExtractStrategy)>,
}

impl ResultParser {
    /// Creates a parser with the built-in strategy chain.
    pub fn new() -> Result<Self> {
        Ok(Self {
            selectors: Selectors::new()?,
            strategies: vec![
                ("basic_html", basic_html_strategy as ExtractStrategy),
                ("heading_link", heading_link_strategy),
                ("anchor_sibling", anchor_sibling_strategy),
            ],
        })
    }

    /// Parses a page into records in document order, ranked from 1.
    pub fn parse(&self, html: &str) -> Vec<ResultRecord> {
        let document = Html::parse_document(html);
        let mut records: Vec<ResultRecord> = Vec::new();

        for block in self.locate_blocks(&document) {
            let rank = records.len() as u32 + 1;
            match self.extract(block, rank) {
                Some(record) => records.push(record),
                None => debug!("Skipping result block without a usable URL"),
            }
        }

        records
    }

    fn extract(&self, block: ElementRef<'_>, rank: u32) -> Option<ResultRecord> {
        self.strategies.iter().find_map(|(name, strategy)| {
            let record = strategy(&self.selectors, block, rank)?;
            debug!("Extracted {} with the {} strategy", record.url, name);
            Some(record)
        })
    }

    fn locate_blocks<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for block_selector in &self.selectors.blocks {
            let blocks: Vec<ElementRef<'a>> = document.select(block_selector).collect();
            if !blocks.is_empty() {
                return outermost(blocks);
            }
        }

        debug!("No known result blocks, falling back to page anchors");
        if let Some(search) = document.select(&self.selectors.search_root).next() {
            return search.select(&self.selectors.anchor).collect();
        }

        // Without #search, take every anchor except the ones in the top bar.
        let top_bar: HashSet<_> = document
            .select(&self.selectors.gbar)
            .flat_map(|gbar| gbar.select(&self.selectors.anchor))
            .map(|a| a.id())
            .collect();
        document
            .select(&self.selectors.anchor)
            .filter(|a| !top_bar.contains(&a.id()))
            .collect()
    }
}

/// Drops blocks nested inside another matched block.
fn outermost(blocks: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    let ids: HashSet<_> = blocks.iter().map(|b| b.id()).collect();
    blocks
        .into_iter()
        .filter(|block| !block.ancestors().any(|ancestor| ids.contains(&ancestor.id())))
        .collect()
}

/// Target URL of an anchor, skipping links back into the engine so a block
/// falls through to its next anchor.
fn result_url(anchor: ElementRef<'_>) -> Option<String> {
    let url = normalize_result_url(anchor.value().attr("href")?)?;
    if is_self_referential(&url, ENGINE_DOMAIN) {
        debug!("Skipping anchor to the engine's own domain: {}", url);
        return None;
    }
    Some(url)
}

/// Stripped-down layout served to clients without JavaScript: the title sits
/// in `div.vvjwJb` inside the link, the snippet in `div.s3v9rd`.
fn basic_html_strategy(s: &Selectors, block: ElementRef<'_>, rank: u32) -> Option<ResultRecord> {
    s.anchors(block).into_iter().find_map(|anchor| {
        let title = anchor.select(&s.basic_title).next().map(|el| s.text(el))?;
        if title.is_empty() {
            return None;
        }
        let url = result_url(anchor)?;
        let description = block
            .select(&s.basic_snippet)
            .next()
            .map(|el| s.text(el))
            .unwrap_or_default();
        Some(ResultRecord::new(rank, title, description, url))
    })
}

/// JavaScript layout: a link wrapping an `h3`, snippet in a sibling container.
fn heading_link_strategy(s: &Selectors, block: ElementRef<'_>, rank: u32) -> Option<ResultRecord> {
    s.anchors(block).into_iter().find_map(|anchor| {
        let title = anchor.select(&s.heading).next().map(|el| s.text(el))?;
        let url = result_url(anchor)?;
        let description = block
            .select(&s.snippet)
            .next()
            .map(|el| s.text(el))
            .unwrap_or_default();
        Some(ResultRecord::new(rank, title, description, url))
    })
}

/// Last resort for unknown layouts: the link text is the title and the
/// description is the grandparent's second child, or its third when the
/// second is empty.
fn anchor_sibling_strategy(s: &Selectors, block: ElementRef<'_>, rank: u32) -> Option<ResultRecord> {
    s.anchors(block).into_iter().find_map(|anchor| {
        let url = result_url(anchor)?;
        let title = s.text(anchor);

        let description = anchor
            .parent()
            .and_then(|parent| parent.parent())
            .map(|grandparent| {
                let contents: Vec<String> = grandparent
                    .children()
                    .filter_map(|child| match child.value() {
                        Node::Text(text) if text.trim().is_empty() => None,
                        Node::Text(text) => Some(s.collapse(text)),
                        Node::Element(_) => ElementRef::wrap(child).map(|el| s.text(el)),
                        _ => None,
                    })
                    .collect();
                match contents.get(1) {
                    Some(second) if !second.is_empty() => second.clone(),
                    _ => contents.get(2).cloned().unwrap_or_default(),
                }
            })
            .unwrap_or_default();

        Some(ResultRecord::new(rank, title, description, url))
    })
}

/// Turns a result link into a bare target URL.
///
/// Google redirect links (`/url?q=...`, `/url?url=...`, relative or absolute
/// on a Google host) are unwrapped and decoded, dropping the redirect's own
/// tracking parameters. Returns `None` unless the result is an absolute
/// `http`/`https` URL with a host.
pub fn normalize_result_url(href: &str) -> Option<String> {
    let href = href.trim();
    let target = redirect_target(href).unwrap_or_else(|| href.to_string());

    let url = Url::parse(&target).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str().filter(|host| !host.is_empty())?;
    Some(target)
}

fn redirect_target(href: &str) -> Option<String> {
    let wrapper = if href.starts_with("/url?") {
        Url::parse(REDIRECT_BASE).ok()?.join(href).ok()?
    } else {
        let url = Url::parse(href).ok()?;
        let is_google = url
            .host_str()
            .map(|host| host.to_lowercase().contains("google"))
            .unwrap_or(false);
        if !is_google || url.path() != "/url" {
            return None;
        }
        url
    };

    let param = |name: &str| {
        wrapper
            .query_pairs()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    };
    param("q").or_else(|| param("url"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODERN: &str = include_str!("../tests/fixtures/modern.html");
    const BASIC: &str = include_str!("../tests/fixtures/basic.html");
    const ANCHORS: &str = include_str!("../tests/fixtures/anchors.html");

    fn parser() -> ResultParser {
        ResultParser::new().unwrap()
    }

    fn expected_rust_results() -> Vec<ResultRecord> {
        vec![
            ResultRecord::new(
                1,
                "Rust Programming Language",
                "A language empowering everyone to build reliable and efficient software.",
                "https://www.rust-lang.org/",
            ),
            ResultRecord::new(
                2,
                "The Rust Programming Language",
                "The official book on the Rust programming language.",
                "https://doc.rust-lang.org/book/",
            ),
            ResultRecord::new(
                3,
                "Rust (programming language) - Wikipedia",
                "Rust is a general-purpose programming language.",
                "https://en.wikipedia.org/wiki/Rust_(programming_language)",
            ),
        ]
    }

    #[test]
    fn test_parse_empty_html() {
        assert!(parser().parse("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_parse_modern_skips_malformed_block() {
        // Four blocks on the page, the third has no result link.
        let records = parser().parse(MODERN);
        assert_eq!(records, expected_rust_results());
    }

    #[test]
    fn test_parse_basic_html_matches_modern() {
        assert_eq!(parser().parse(BASIC), parser().parse(MODERN));
    }

    #[test]
    fn test_ranks_follow_document_order() {
        let records = parser().parse(BASIC);
        let ranks: Vec<u32> = records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_anchor_fallback() {
        let records = parser().parse(ANCHORS);
        assert_eq!(
            records,
            vec![
                ResultRecord::new(
                    1,
                    "Rust Programming Language",
                    "A language empowering everyone.",
                    "https://www.rust-lang.org/",
                ),
                ResultRecord::new(
                    2,
                    "crates.io: Rust Package Registry",
                    "The Rust community's crate registry.",
                    "https://crates.io/",
                ),
            ]
        );
    }

    #[test]
    fn test_parse_anchor_fallback_without_search_skips_top_bar() {
        let html = r#"<html><body>
            <div id="gbar"><a href="https://mail.example.com/">Mail</a></div>
            <p><a href="https://example.org/page">Example page</a></p>
        </body></html>"#;
        let records = parser().parse(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "https://example.org/page");
        assert_eq!(records[0].title, "Example page");
        assert_eq!(records[0].rank, 1);
    }

    #[test]
    fn test_missing_snippet_is_empty_string() {
        let html = r#"<div class="g"><a href="https://example.com/"><h3>Example</h3></a></div>"#;
        let records = parser().parse(html);
        assert_eq!(records, vec![ResultRecord::new(1, "Example", "", "https://example.com/")]);
    }

    #[test]
    fn test_nested_blocks_counted_once() {
        let html = r#"<div class="g"><div class="g">
            <a href="https://example.com/"><h3>Example</h3></a>
        </div></div>"#;
        assert_eq!(parser().parse(html).len(), 1);
    }

    #[test]
    fn test_normalize_plain_url() {
        assert_eq!(
            normalize_result_url("https://example.com/a?b=c").as_deref(),
            Some("https://example.com/a?b=c")
        );
    }

    #[test]
    fn test_normalize_relative_redirect() {
        assert_eq!(
            normalize_result_url("/url?q=https://example.com/page&sa=U&ved=abc&usg=xyz").as_deref(),
            Some("https://example.com/page")
        );
    }

    #[test]
    fn test_normalize_decodes_encoded_target() {
        assert_eq!(
            normalize_result_url("/url?q=https%3A%2F%2Fexample.com%2Fsearch%3Fx%3D1%26y%3D2&sa=U")
                .as_deref(),
            Some("https://example.com/search?x=1&y=2")
        );
    }

    #[test]
    fn test_block_skips_engine_anchor_for_next_link() {
        let html = r#"<html><body>
            <div class="g">
                <a href="https://translate.google.com/translate?u=https://real.example/"><h3>Translate this page</h3></a>
                <a href="https://real.example/"><h3>Real Result</h3></a>
            </div>
        </body></html>"#;
        let records = parser().parse(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Real Result");
        assert_eq!(records[0].url, "https://real.example/");
    }

    #[test]
    fn test_anchor_walk_skips_engine_links() {
        let html = r#"<html><body><div id="search">
            <div><div><a href="https://maps.google.com/?q=rust">Maps</a></div><span>Map results</span></div>
            <div><div><a href="https://crates.io/">crates.io</a></div><span>The registry.</span></div>
        </div></body></html>"#;
        let records = parser().parse(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rank, 1);
        assert_eq!(records[0].url, "https://crates.io/");
        assert_eq!(records[0].description, "The registry.");
    }

    #[test]
    fn test_normalize_absolute_google_redirect_with_url_param() {
        assert_eq!(
            normalize_result_url("http://www.google.com/url?esrc=s&q=&url=https://example.net/x")
                .as_deref(),
            Some("https://example.net/x")
        );
    }

    #[test]
    fn test_normalize_rejects_relative_and_other_schemes() {
        assert!(normalize_result_url("/search?q=rust&start=10").is_none());
        assert!(normalize_result_url("#").is_none());
        assert!(normalize_result_url("javascript:void(0)").is_none());
        assert!(normalize_result_url("mailto:someone@example.com").is_none());
        assert!(normalize_result_url("/url?sa=U").is_none());
    }
}
