//! [`DocumentStore`] backed by the MediaWiki Action API (`api.php`).
//!
//! Every request asks for `format=json&formatversion=2`. Logging in is left
//! to whoever builds the `reqwest::Client`: the client only fetches the CSRF
//! token for the session it is given.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use crate::config::WikiConfig;
use crate::http::build_client;
use crate::store::DocumentStore;
use crate::{Error, Result};

const FORMAT: [(&str, &str); 2] = [("format", "json"), ("formatversion", "2")];

#[derive(Debug)]
pub struct MediaWikiClient {
    http: reqwest::Client,
    api_url: Url,
    namespace: i32,
    mark_bot_edits: bool,
    csrf_token: OnceCell<String>,
}

impl MediaWikiClient {
    pub fn new(config: &WikiConfig) -> Result<Self> {
        let http = build_client(config)?;
        Self::with_client(http, config)
    }

    /// Uses an already configured client, e.g. one holding a logged-in session.
    pub fn with_client(http: reqwest::Client, config: &WikiConfig) -> Result<Self> {
        Ok(Self {
            http,
            api_url: config.api_url()?,
            namespace: config.namespace,
            mark_bot_edits: config.mark_bot_edits,
            csrf_token: OnceCell::new(),
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let value = self
            .http
            .get(self.api_url.clone())
            .query(&FORMAT)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;
        decode(value)
    }

    async fn post<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let mut form = FORMAT.to_vec();
        form.extend_from_slice(params);
        let value = self
            .http
            .post(self.api_url.clone())
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;
        decode(value)
    }

    /// The session's CSRF token, fetched on first use.
    async fn csrf_token(&self) -> Result<&str> {
        let token = self
            .csrf_token
            .get_or_try_init(|| async {
                let res: TokensResponse = self
                    .get(&[("action", "query"), ("meta", "tokens"), ("type", "csrf")])
                    .await?;
                tracing::debug!("fetched csrf token");
                Ok::<_, Error>(res.query.tokens.csrftoken)
            })
            .await?;
        Ok(token)
    }
}

/// Turns an API `error` object into [`Error::Api`], anything else into `T`.
fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    if let Some(err) = value.get("error") {
        let err: ApiError = serde_json::from_value(err.clone())?;
        return Err(Error::Api {
            code: err.code,
            info: err.info,
        });
    }
    Ok(serde_json::from_value(value)?)
}

/// `apfrom` is read inside `apnamespace`, so titles outside the main
/// namespace lose their `Prefix:` part.
fn apfrom(start: &str, namespace: i32) -> &str {
    if namespace == 0 {
        return start;
    }
    start.split_once(':').map_or(start, |(_, rest)| rest)
}

impl DocumentStore for MediaWikiClient {
    async fn list_pages(&self, start: &str, limit: usize) -> Result<Vec<String>> {
        let limit = limit.to_string();
        let namespace = self.namespace.to_string();
        let res: AllPagesResponse = self
            .get(&[
                ("action", "query"),
                ("list", "allpages"),
                ("apfrom", apfrom(start, self.namespace)),
                ("aplimit", limit.as_str()),
                ("apnamespace", namespace.as_str()),
            ])
            .await?;

        let titles: Vec<String> = res.query.allpages.into_iter().map(|p| p.title).collect();
        tracing::debug!(start, count = titles.len(), "listed pages");
        Ok(titles)
    }

    async fn read_page(&self, title: &str) -> Result<Option<String>> {
        let res: RevisionsResponse = self
            .get(&[
                ("action", "query"),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("titles", title),
            ])
            .await?;

        let page = res
            .query
            .pages
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedResponse(format!("no page returned for {title}")))?;
        if page.missing || page.invalid {
            return Ok(None);
        }
        let revision = page.revisions.into_iter().next().ok_or_else(|| {
            Error::UnexpectedResponse(format!("no revision returned for {title}"))
        })?;
        Ok(Some(revision.slots.main.content))
    }

    async fn write_page(&self, title: &str, content: &str, summary: &str) -> Result<()> {
        let token = self.csrf_token().await?;
        let mut params = vec![
            ("action", "edit"),
            ("title", title),
            ("text", content),
            ("summary", summary),
        ];
        if self.mark_bot_edits {
            params.push(("bot", "1"));
        }
        // MediaWiki wants the token as the last field.
        params.push(("token", token));

        let res: EditResponse = self.post(&params).await?;
        if res.edit.result != "Success" {
            return Err(Error::EditRejected {
                title: title.into(),
                result: res.edit.result,
            });
        }
        tracing::debug!(title, nochange = res.edit.nochange, "saved page");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct TokensResponse {
    query: TokensQuery,
}

#[derive(Debug, Deserialize)]
struct TokensQuery {
    tokens: Tokens,
}

#[derive(Debug, Deserialize)]
struct Tokens {
    csrftoken: String,
}

#[derive(Debug, Deserialize)]
struct AllPagesResponse {
    query: AllPagesQuery,
}

#[derive(Debug, Deserialize)]
struct AllPagesQuery {
    allpages: Vec<PageRecord>,
}

#[derive(Debug, Deserialize)]
struct PageRecord {
    title: String,
}

#[derive(Debug, Deserialize)]
struct RevisionsResponse {
    query: RevisionsQuery,
}

#[derive(Debug, Deserialize)]
struct RevisionsQuery {
    pages: Vec<RevisionsPage>,
}

#[derive(Debug, Deserialize)]
struct RevisionsPage {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct Revision {
    slots: Slots,
}

#[derive(Debug, Deserialize)]
struct Slots {
    main: Slot,
}

#[derive(Debug, Deserialize)]
struct Slot {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct EditResponse {
    edit: EditResult,
}

#[derive(Debug, Deserialize)]
struct EditResult {
    result: String,
    #[serde(default)]
    nochange: bool,
}
