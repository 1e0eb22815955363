use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::domain::lookup::{NO_RATING, RATING_FETCH_ERROR};
use crate::domain::{BookLookup, LookupError, LookupResult};
use crate::infrastructure::html;

pub const DEFAULT_RETAILER_URL: &str = "https://www.amazon.com";
pub const DEFAULT_RETAILER_NAME: &str = "Amazon";
pub const DEFAULT_SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// Retail pages refuse obvious bots, so lookups present as a browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";
const RATING_TIMEOUT: Duration = Duration::from_secs(10);
const RESULT_LINK_CLASSES: [&str; 2] = ["a-link-normal", "s-no-outline"];
const RATING_CLASS: &str = "a-icon-alt";
/// Query parameters search engines use to carry the real target of a result link.
const REDIRECT_PARAMS: [&str; 2] = ["uddg", "q"];

/// Queries the retailer's own search page and takes the first product result.
pub struct RetailSearchLookup {
    client: reqwest::Client,
    retailer: Url,
}

impl RetailSearchLookup {
    pub fn new(client: reqwest::Client, retailer_url: &str) -> Result<Self, LookupError> {
        Ok(Self {
            client,
            retailer: Url::parse(retailer_url)?,
        })
    }

    fn search_url(&self, query: &str) -> Result<Url, LookupError> {
        let mut url = self.retailer.join("/s")?;
        url.query_pairs_mut().append_pair("k", query);
        Ok(url)
    }
}

#[async_trait]
impl BookLookup for RetailSearchLookup {
    #[tracing::instrument(skip(self))]
    async fn lookup(&self, line: &str) -> Result<LookupResult, LookupError> {
        let url = self.search_url(line)?;
        let body = fetch_page(&self.client, url, None).await?;

        let link = html::anchors(&body)
            .find(|a| a.has_classes(&RESULT_LINK_CLASSES) && a.attr("href").is_some())
            .and_then(|a| a.attr("href").and_then(|href| self.retailer.join(href).ok()));

        debug!(found = link.is_some(), "retailer search parsed");
        Ok(link.map_or_else(LookupResult::not_found, |url| {
            LookupResult::link(url.to_string())
        }))
    }
}

/// Queries a general search engine restricted to the retailer's domain and
/// follows the first redirect-style result that lands on that domain.
pub struct SearchEngineLookup {
    client: reqwest::Client,
    search: Url,
    domain: String,
}

impl SearchEngineLookup {
    pub fn new(
        client: reqwest::Client,
        search_url: &str,
        retailer_url: &str,
    ) -> Result<Self, LookupError> {
        let domain = retailer_domain(retailer_url)?;
        Ok(Self {
            client,
            search: Url::parse(search_url)?,
            domain,
        })
    }

    fn search_url(&self, query: &str) -> Url {
        let mut url = self.search.clone();
        url.query_pairs_mut()
            .append_pair("q", &format!("site:{} {query}", self.domain));
        url
    }

    fn first_retail_link(&self, body: &str) -> Option<String> {
        html::anchors(body)
            .filter_map(|a| a.attr("href").and_then(|href| self.search.join(href).ok()))
            .find_map(|href| redirect_target(&href, &self.domain))
    }
}

#[async_trait]
impl BookLookup for SearchEngineLookup {
    #[tracing::instrument(skip(self))]
    async fn lookup(&self, line: &str) -> Result<LookupResult, LookupError> {
        let body = fetch_page(&self.client, self.search_url(line), None).await?;
        let link = self.first_retail_link(&body);

        debug!(found = link.is_some(), "search engine results parsed");
        Ok(link.map_or_else(LookupResult::not_found, LookupResult::link))
    }
}

/// Adds the product page's displayed rating to another lookup's link.
///
/// Rating failures never fail the lookup: they become placeholder text.
pub struct RatedLookup {
    inner: Arc<dyn BookLookup>,
    client: reqwest::Client,
}

impl RatedLookup {
    pub fn new(inner: Arc<dyn BookLookup>, client: reqwest::Client) -> Self {
        Self { inner, client }
    }

    async fn fetch_rating(&self, link: &str) -> String {
        let url = match Url::parse(link) {
            Ok(url) => url,
            Err(err) => {
                warn!(link, error = %err, "product link is not a valid URL");
                return RATING_FETCH_ERROR.to_string();
            }
        };

        match fetch_page(&self.client, url, Some(RATING_TIMEOUT)).await {
            Ok(body) => {
                html::first_span_text(&body, RATING_CLASS).unwrap_or_else(|| NO_RATING.to_string())
            }
            Err(err) => {
                warn!(link, error = %err, "failed to fetch product rating");
                RATING_FETCH_ERROR.to_string()
            }
        }
    }
}

#[async_trait]
impl BookLookup for RatedLookup {
    #[tracing::instrument(skip(self))]
    async fn lookup(&self, line: &str) -> Result<LookupResult, LookupError> {
        let result = self.inner.lookup(line).await?;
        let Some(link) = result.link.as_deref() else {
            return Ok(result);
        };
        let rating = self.fetch_rating(link).await;
        Ok(result.with_rating(rating))
    }
}

async fn fetch_page(
    client: &reqwest::Client,
    url: Url,
    timeout: Option<Duration>,
) -> Result<String, LookupError> {
    let mut request = client
        .get(url)
        .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(LookupError::Status(response.status().as_u16()));
    }
    Ok(response.text().await?)
}

/// Decode a search engine redirect link, returning the real target when it
/// is an http(s) URL on `domain` (or one of its subdomains).
fn redirect_target(href: &Url, domain: &str) -> Option<String> {
    href.query_pairs()
        .filter(|(key, _)| REDIRECT_PARAMS.iter().any(|param| key == param))
        .filter_map(|(_, value)| Url::parse(&value).ok())
        .find(|target| is_on_domain(target, domain))
        .map(String::from)
}

fn is_on_domain(url: &Url, domain: &str) -> bool {
    matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|host| {
            host == domain
                || host
                    .strip_suffix(domain)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
}

/// `https://www.amazon.com` → `amazon.com`.
fn retailer_domain(retailer_url: &str) -> Result<String, LookupError> {
    let url = Url::parse(retailer_url)?;
    let host = url
        .host_str()
        .ok_or_else(|| LookupError::InvalidUrl(format!("{retailer_url} has no host")))?;
    Ok(host.strip_prefix("www.").unwrap_or(host).to_string())
}
