//! MediaWiki extract lookups.

use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;
use url::Url;

use crate::error::{BotError, Result};

/// Reply sent when the requested page does not exist.
pub const NOT_FOUND_MESSAGE: &str = "Diese Seite existiert nicht";

const EXTRACT_SENTENCES: &str = "5";

/// Outcome of a single lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// The page exists; holds its plain-text intro extract.
    Found(String),
    NotFound,
}

impl LookupResult {
    /// Text to post back into the room.
    pub fn reply_text(&self) -> &str {
        match self {
            LookupResult::Found(extract) => extract,
            LookupResult::NotFound => NOT_FOUND_MESSAGE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    error: Option<ApiError>,
    query: Option<Query>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct Query {
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    title: String,
    #[serde(default)]
    missing: bool,
    extract: Option<String>,
}

/// HTTP client for the `action=query&prop=extracts` endpoint.
#[derive(Debug, Clone)]
pub struct WikiClient {
    http: reqwest::Client,
    api_url: Url,
    timeout: Duration,
}

impl WikiClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let api_url = Url::parse(api_url)?;
        if api_url.cannot_be_a_base() {
            return Err(BotError::Config(format!(
                "Wiki API URL '{api_url}' is not an absolute HTTP URL"
            )));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            api_url,
            timeout,
        })
    }

    /// Builds the extract query URL for `query`, encoding the title once.
    pub fn build_url(&self, query: &str) -> Result<Url> {
        if query.is_empty() {
            return Err(BotError::SearchQueryEmpty);
        }

        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("format", "json")
            .append_pair("action", "query")
            .append_pair("prop", "extracts")
            .append_pair("exlimit", "1")
            .append_key_only("explaintext")
            .append_key_only("exintro")
            .append_pair("formatversion", "2")
            .append_key_only("redirects")
            .append_pair("exsentences", EXTRACT_SENTENCES)
            .append_pair("titles", query);

        Ok(url)
    }

    /// Looks up the intro extract of the page titled `query`.
    pub async fn lookup(&self, query: &str) -> Result<LookupResult> {
        let url = self.build_url(query)?;
        debug!("Requesting {}", url);

        let response = self.http.get(url).timeout(self.timeout).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(BotError::WikiHttp { status, message });
        }

        let body = response.text().await?;
        let result = parse_response(&body)?;

        info!(
            "Lookup for '{}' finished: {}",
            query,
            match &result {
                LookupResult::Found(extract) => format!("found ({} bytes)", extract.len()),
                LookupResult::NotFound => "not found".to_string(),
            }
        );

        Ok(result)
    }
}

/// Interprets an extracts API response body.
pub fn parse_response(body: &str) -> Result<LookupResult> {
    let response: ApiResponse = serde_json::from_str(body)?;

    if let Some(error) = response.error {
        return Err(BotError::WikiApi {
            code: error.code,
            info: error.info,
        });
    }

    let Some(query) = response.query else {
        return Err(BotError::Json(
            <serde_json::Error as serde::de::Error>::missing_field("query"),
        ));
    };

    let page = query.pages.into_iter().next().ok_or(BotError::NoPages)?;

    if page.missing {
        return Ok(LookupResult::NotFound);
    }

    page.extract
        .map(LookupResult::Found)
        .ok_or(BotError::MissingExtract(page.title))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WikiClient {
        WikiClient::new("https://de.wikipedia.org/w/api.php", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn url_carries_fixed_parameters_in_order() {
        let url = client().build_url("Berlin").unwrap();

        assert_eq!(
            url.as_str(),
            "https://de.wikipedia.org/w/api.php?format=json&action=query&prop=extracts\
             &exlimit=1&explaintext&exintro&formatversion=2&redirects&exsentences=5&titles=Berlin"
        );
    }

    #[test]
    fn title_is_encoded_exactly_once() {
        let url = client().build_url("Köln Bonn").unwrap();

        assert!(url.as_str().ends_with("&titles=K%C3%B6ln+Bonn"), "{url}");
        assert!(!url.as_str().contains("%25"));

        let title = url
            .query_pairs()
            .find(|(key, _)| key == "titles")
            .map(|(_, value)| value.into_owned());
        assert_eq!(title.as_deref(), Some("Köln Bonn"));
    }

    #[test]
    fn reserved_characters_cannot_inject_parameters() {
        let url = client().build_url("AT&T=1#top").unwrap();

        assert!(url.as_str().ends_with("&titles=AT%26T%3D1%23top"), "{url}");
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn existing_query_on_api_url_is_replaced() {
        let client =
            WikiClient::new("https://example.org/w/api.php?stale=1", Duration::from_secs(5))
                .unwrap();
        let url = client.build_url("Berlin").unwrap();

        assert!(url.as_str().starts_with("https://example.org/w/api.php?format=json&"));
        assert!(!url.as_str().contains("stale"));
    }

    #[test]
    fn empty_query_is_rejected() {
        assert!(matches!(
            client().build_url(""),
            Err(BotError::SearchQueryEmpty)
        ));
    }

    #[test]
    fn relative_api_url_is_rejected() {
        assert!(matches!(
            WikiClient::new("w/api.php", Duration::from_secs(5)),
            Err(BotError::MalformedUrl(_))
        ));
        assert!(matches!(
            WikiClient::new("mailto:bot@example.org", Duration::from_secs(5)),
            Err(BotError::Config(_))
        ));
    }

    #[test]
    fn missing_page_maps_to_not_found_message() {
        let result = parse_response(r#"{"query":{"pages":[{"missing":true}]}}"#).unwrap();

        assert_eq!(result, LookupResult::NotFound);
        assert_eq!(result.reply_text(), "Diese Seite existiert nicht");
    }

    #[test]
    fn extract_is_returned_verbatim() {
        let result = parse_response(
            r#"{"query":{"pages":[{"extract":"Berlin is the capital of Germany."}]}}"#,
        )
        .unwrap();

        assert_eq!(result.reply_text(), "Berlin is the capital of Germany.");
    }

    #[test]
    fn empty_extract_is_still_found() {
        let result =
            parse_response(r#"{"query":{"pages":[{"title":"X","missing":false,"extract":""}]}}"#)
                .unwrap();

        assert_eq!(result, LookupResult::Found(String::new()));
    }

    #[test]
    fn only_the_first_page_is_used() {
        let result = parse_response(
            r#"{"query":{"pages":[{"extract":"first"},{"extract":"second"}]}}"#,
        )
        .unwrap();

        assert_eq!(result.reply_text(), "first");
    }

    #[test]
    fn empty_pages_is_an_error() {
        assert!(matches!(
            parse_response(r#"{"query":{"pages":[]}}"#),
            Err(BotError::NoPages)
        ));
    }

    #[test]
    fn unexpected_shapes_are_errors() {
        assert!(matches!(parse_response("not json"), Err(BotError::Json(_))));
        assert!(matches!(
            parse_response(r#"{"batchcomplete":true}"#),
            Err(BotError::Json(_))
        ));
        assert!(matches!(
            parse_response(r#"{"query":{"normalized":[]}}"#),
            Err(BotError::Json(_))
        ));
    }

    #[test]
    fn api_error_envelope_is_reported() {
        let err = parse_response(
            r#"{"error":{"code":"invalidtitle","info":"Bad title \"\"."}}"#,
        )
        .unwrap_err();

        assert!(matches!(err, BotError::WikiApi { ref code, .. } if code == "invalidtitle"));
    }

    #[test]
    fn invalid_title_without_extract_is_an_error() {
        let err = parse_response(
            r#"{"query":{"pages":[{"title":"<","invalidreason":"bad","invalid":true}]}}"#,
        )
        .unwrap_err();

        assert!(matches!(err, BotError::MissingExtract(ref title) if title == "<"));
    }
}
