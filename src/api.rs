// API client module: a small blocking HTTP client for the Beeminder REST
// API. Every call is one synchronous round trip; nothing is cached and
// nothing is retried.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde_json::Value;

use crate::config::Config;
use crate::error::{BeeminderError, Result};
use crate::models::{self, Datapoint, DatapointBatch, Goal, NewDatapoint, User};

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

/// Operations the terminal interface needs from the service. Implemented by
/// [`ApiClient`]; the UI only sees this trait.
pub trait GoalsApi {
    fn get_all_goals(&self, user: Option<&str>) -> Result<Vec<Goal>>;

    fn get_goal(&self, slug: &str, user: Option<&str>, with_datapoints: bool) -> Result<Goal>;

    fn get_datapoints(&self, goal_slug: &str, user: Option<&str>) -> Result<Vec<Datapoint>>;

    fn create_datapoint(
        &self,
        goal_slug: &str,
        value: f64,
        comment: Option<&str>,
        timestamp: Option<i64>,
        user: Option<&str>,
    ) -> Result<Datapoint>;

    fn get_user(&self, user: Option<&str>) -> Result<User>;
}

/// Optional paging and ordering for datapoint listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatapointQuery {
    /// Attribute to sort on, descending. The service defaults to `id`.
    pub sort: Option<String>,
    /// Return at most this many datapoints.
    pub count: Option<u32>,
    /// 1-indexed page, used with `per`.
    pub page: Option<u32>,
    pub per: Option<u32>,
}

impl DatapointQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(count) = self.count {
            params.push(("count", count.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(per) = self.per {
            params.push(("per", per.to_string()));
        }
        params
    }
}

/// Blocking Beeminder client. Holds the reqwest client and the validated
/// configuration; cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Config,
    base: Url,
}

impl ApiClient {
    /// Build the underlying HTTP client with the configured timeout.
    pub fn new(config: Config) -> Result<Self> {
        let base = Url::parse(config.base_url()).map_err(|e| {
            BeeminderError::Configuration(format!("invalid base URL '{}': {e}", config.base_url()))
        })?;
        if base.cannot_be_a_base() {
            return Err(BeeminderError::Configuration(format!(
                "base URL '{base}' cannot take a path"
            )));
        }
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("beeminder-tui/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ApiClient {
            client,
            config,
            base,
        })
    }

    /// All archived goals of a user, without datapoints.
    pub fn get_archived_goals(&self, user: Option<&str>) -> Result<Vec<Goal>> {
        let user = self.config.resolve_user(user);
        let url = self.endpoint(&["users", user, "goals", "archived.json"])?;
        models::parse_goals(self.send(self.get(url))?)
    }

    /// Datapoints of a goal with explicit ordering/paging.
    pub fn get_datapoints_with(
        &self,
        goal_slug: &str,
        query: &DatapointQuery,
        user: Option<&str>,
    ) -> Result<Vec<Datapoint>> {
        let goal_slug = require_slug(goal_slug)?;
        let user = self.config.resolve_user(user);
        let url = self.endpoint(&["users", user, "goals", goal_slug, "datapoints.json"])?;
        let request = self.get(url).query(&query.params());
        let body = self.send(request)?;
        models::parse_datapoints(goal_slug, body)
    }

    /// Create a datapoint from a full payload. The payload is validated before
    /// any request is built.
    pub fn submit_datapoint(
        &self,
        goal_slug: &str,
        datapoint: &NewDatapoint,
        user: Option<&str>,
    ) -> Result<Datapoint> {
        let goal_slug = require_slug(goal_slug)?;
        datapoint.validate()?;
        let user = self.config.resolve_user(user);

        let url = self.endpoint(&["users", user, "goals", goal_slug, "datapoints.json"])?;
        let body = self.send(self.post(url).form(&datapoint.to_form()))?;

        let created = Datapoint::parse(goal_slug, body)?;
        log::info!(
            "created datapoint {} on {goal_slug}: {}",
            created.id.as_deref().unwrap_or("?"),
            created.value
        );
        Ok(created)
    }

    /// Create several datapoints in one request. Every entry is validated
    /// before anything is sent; the service may still refuse some of them,
    /// which are reported in [`DatapointBatch::errors`].
    pub fn submit_datapoints(
        &self,
        goal_slug: &str,
        datapoints: &[NewDatapoint],
        user: Option<&str>,
    ) -> Result<DatapointBatch> {
        let goal_slug = require_slug(goal_slug)?;
        if datapoints.is_empty() {
            return Err(BeeminderError::Validation("no datapoints to submit".into()));
        }
        for (idx, datapoint) in datapoints.iter().enumerate() {
            datapoint.validate().map_err(|err| match err {
                BeeminderError::Validation(msg) => {
                    BeeminderError::Validation(format!("datapoint #{idx}: {msg}"))
                }
                other => other,
            })?;
        }
        let encoded = serde_json::to_string(datapoints)
            .map_err(|e| BeeminderError::Validation(format!("cannot encode datapoints: {e}")))?;
        let user = self.config.resolve_user(user);

        let url = self.endpoint(&[
            "users",
            user,
            "goals",
            goal_slug,
            "datapoints",
            "create_all.json",
        ])?;
        let body = self.send(self.post(url).form(&[("datapoints", encoded)]))?;

        let batch = models::parse_batch(goal_slug, body)?;
        log::info!(
            "created {} datapoints on {goal_slug}, {} refused",
            batch.created.len(),
            batch.errors.len()
        );
        Ok(batch)
    }

    // ---- private helpers ----

    /// Base URL plus one percent-encoded path segment per entry, so a slug or
    /// username can never change which endpoint is hit.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BeeminderError::Configuration(format!("base URL '{}' cannot take a path", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET request with the auth token attached. The token is never logged.
    fn get(&self, url: Url) -> RequestBuilder {
        log::debug!("GET {url}");
        self.client
            .get(url)
            .query(&[("auth_token", self.config.api_key())])
    }

    fn post(&self, url: Url) -> RequestBuilder {
        log::debug!("POST {url}");
        self.client
            .post(url)
            .query(&[("auth_token", self.config.api_key())])
    }

    /// Send, map the status to an error variant and decode the JSON body.
    fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send()?;
        let response = ensure_success(response)?;
        let text = response.text()?;
        serde_json::from_str(&text)
            .map_err(|e| BeeminderError::Validation(format!("response is not valid JSON: {e}")))
    }
}

impl GoalsApi for ApiClient {
    fn get_all_goals(&self, user: Option<&str>) -> Result<Vec<Goal>> {
        let user = self.config.resolve_user(user);
        let url = self.endpoint(&["users", user, "goals.json"])?;
        let body = self.send(self.get(url))?;
        let goals = models::parse_goals(body)?;
        log::debug!("fetched {} goals for {user}", goals.len());
        Ok(goals)
    }

    fn get_goal(&self, slug: &str, user: Option<&str>, with_datapoints: bool) -> Result<Goal> {
        let slug = require_slug(slug)?;
        let user = self.config.resolve_user(user);
        let file = format!("{slug}.json");
        let url = self.endpoint(&["users", user, "goals", file.as_str()])?;
        let request = self
            .get(url)
            .query(&[("datapoints", with_datapoints.to_string())]);
        Goal::parse(self.send(request)?)
    }

    fn get_datapoints(&self, goal_slug: &str, user: Option<&str>) -> Result<Vec<Datapoint>> {
        self.get_datapoints_with(goal_slug, &DatapointQuery::default(), user)
    }

    fn create_datapoint(
        &self,
        goal_slug: &str,
        value: f64,
        comment: Option<&str>,
        timestamp: Option<i64>,
        user: Option<&str>,
    ) -> Result<Datapoint> {
        let mut datapoint = NewDatapoint::new(value);
        if let Some(comment) = comment {
            datapoint = datapoint.with_comment(comment);
        }
        if let Some(timestamp) = timestamp {
            datapoint = datapoint.with_timestamp(timestamp);
        }
        self.submit_datapoint(goal_slug, &datapoint, user)
    }

    fn get_user(&self, user: Option<&str>) -> Result<User> {
        let user = self.config.resolve_user(user);
        let file = format!("{user}.json");
        let url = self.endpoint(&["users", file.as_str()])?;
        User::parse(self.send(self.get(url))?)
    }
}

fn require_slug(slug: &str) -> Result<&str> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(BeeminderError::Validation("goal slug must not be empty".into()));
    }
    Ok(slug)
}

/// Return the response unchanged on 2xx, otherwise the matching error variant
/// carrying the response body.
fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    log::warn!("Beeminder answered {status}: {body}");
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BeeminderError::Authentication(
            format!("{status}: check BEEMINDER_API_KEY"),
        ),
        StatusCode::NOT_FOUND => BeeminderError::NotFound(body_or_status(&body, status)),
        StatusCode::UNPROCESSABLE_ENTITY => {
            BeeminderError::Validation(body_or_status(&body, status))
        }
        _ => BeeminderError::Api {
            status: status.as_u16(),
            body,
        },
    })
}

fn body_or_status(body: &str, status: StatusCode) -> String {
    if body.trim().is_empty() {
        status.to_string()
    } else {
        body.trim().to_string()
    }
}
