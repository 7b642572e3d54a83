// Data models: typed records for the Beeminder entities this client touches,
// plus the conversions between them and raw API JSON. Everything here is a
// pure transformation; no I/O.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BeeminderError, Result};

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;

/// A single value logged against a goal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Datapoint {
    /// Slug of the owning goal. Not part of the wire format; filled in by the
    /// client from the request context.
    #[serde(skip)]
    pub goal_slug: String,
    pub id: Option<String>,
    pub value: f64,
    /// Unix seconds the value applies to.
    pub timestamp: Option<i64>,
    /// `YYYYMMDD` day the value applies to.
    pub daystamp: Option<String>,
    pub comment: Option<String>,
    pub updated_at: Option<i64>,
    pub requestid: Option<String>,
}

/// A goal as returned by `/users/{u}/goals...`. Only `slug` is mandatory; the
/// service omits most fields in some views, so everything else is optional.
/// `datapoints` is only present when the goal was fetched with detail.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Goal {
    pub slug: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub fineprint: Option<String>,
    pub goal_type: Option<String>,
    pub gunits: Option<String>,
    pub runits: Option<String>,
    pub yaxis: Option<String>,
    /// Current value.
    pub curval: Option<f64>,
    /// Target value.
    pub goalval: Option<f64>,
    /// Target date, unix seconds.
    pub goaldate: Option<i64>,
    pub rate: Option<f64>,
    pub currate: Option<f64>,
    pub pledge: Option<f64>,
    /// When the goal derails if nothing is logged, unix seconds.
    pub losedate: Option<i64>,
    /// Safety buffer in days.
    pub safebuf: Option<i64>,
    /// Deadline offset from midnight, seconds.
    pub deadline: Option<i64>,
    pub delta_text: Option<String>,
    pub limsum: Option<String>,
    pub autodata: Option<String>,
    pub updated_at: Option<i64>,
    pub won: Option<bool>,
    pub lost: Option<bool>,
    pub frozen: Option<bool>,
    pub weekends_off: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub datapoints: Option<Vec<Datapoint>>,
    pub last_datapoint: Option<Datapoint>,
}

/// Account summary returned by `/users/{u}.json`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub goals: Vec<String>,
    pub timezone: Option<String>,
    pub updated_at: Option<i64>,
    pub urgency_load: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    Active,
    Frozen,
    Won,
    Lost,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GoalStatus::Active => "ACTIVE",
            GoalStatus::Frozen => "FROZEN",
            GoalStatus::Won => "WON",
            GoalStatus::Lost => "LOST",
        };
        f.write_str(label)
    }
}

/// Payload for creating a datapoint. Serializes to the entry shape of the
/// batch endpoint.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct NewDatapoint {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daystamp: Option<String>,
    /// Client-chosen idempotency key; the service ignores repeats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requestid: Option<String>,
}

/// Outcome of a batch create. The service accepts entries individually.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatapointBatch {
    pub created: Vec<Datapoint>,
    /// Entries the service refused, as it described them.
    pub errors: Vec<Value>,
}

fn decode<T: DeserializeOwned>(what: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| BeeminderError::Validation(format!("{what}: {e}")))
}

/// Parse each element of a JSON array, skipping (and logging) the ones that
/// fail. Anything other than an array is an error.
fn parse_list<T, F>(what: &str, value: Value, parse: F) -> Result<Vec<T>>
where
    F: Fn(Value) -> Result<T>,
{
    let Value::Array(items) = value else {
        return Err(BeeminderError::Validation(format!(
            "expected a list of {what}s"
        )));
    };

    let mut parsed = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match parse(item) {
            Ok(record) => parsed.push(record),
            Err(err) => log::warn!("skipping malformed {what} #{idx}: {err}"),
        }
    }
    Ok(parsed)
}

impl Goal {
    /// Build a goal from a decoded response body.
    pub fn parse(value: Value) -> Result<Goal> {
        let mut goal: Goal = decode("goal", value)?;
        if goal.slug.trim().is_empty() {
            return Err(BeeminderError::Validation("goal: empty slug".into()));
        }

        let slug = goal.slug.clone();
        for point in goal
            .datapoints
            .iter_mut()
            .flatten()
            .chain(goal.last_datapoint.iter_mut())
        {
            point.goal_slug = slug.clone();
        }
        Ok(goal)
    }

    pub fn status(&self) -> GoalStatus {
        if self.lost.unwrap_or(false) {
            GoalStatus::Lost
        } else if self.won.unwrap_or(false) {
            GoalStatus::Won
        } else if self.frozen.unwrap_or(false) {
            GoalStatus::Frozen
        } else {
            GoalStatus::Active
        }
    }

    /// Loaded datapoints, newest first. Points without a timestamp go last.
    pub fn recent_datapoints(&self) -> Vec<&Datapoint> {
        let mut points: Vec<&Datapoint> = self.datapoints.iter().flatten().collect();
        points.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        points
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.slug)
    }
}

impl Datapoint {
    pub fn parse(goal_slug: &str, value: Value) -> Result<Datapoint> {
        let mut point: Datapoint = decode("datapoint", value)?;
        point.goal_slug = goal_slug.to_string();
        Ok(point)
    }
}

impl User {
    pub fn parse(value: Value) -> Result<User> {
        let user: User = decode("user", value)?;
        if user.username.trim().is_empty() {
            return Err(BeeminderError::Validation("user: empty username".into()));
        }
        Ok(user)
    }
}

pub fn parse_goals(value: Value) -> Result<Vec<Goal>> {
    parse_list("goal", value, Goal::parse)
}

pub fn parse_datapoints(goal_slug: &str, value: Value) -> Result<Vec<Datapoint>> {
    parse_list("datapoint", value, |item| Datapoint::parse(goal_slug, item))
}

/// Read a batch create response: either `{"successes": [..], "errors": [..]}`
/// or a bare list of created datapoints.
pub fn parse_batch(goal_slug: &str, value: Value) -> Result<DatapointBatch> {
    match value {
        Value::Array(_) => Ok(DatapointBatch {
            created: parse_datapoints(goal_slug, value)?,
            errors: Vec::new(),
        }),
        Value::Object(mut fields) => {
            let created = match fields.remove("successes") {
                Some(successes) => parse_datapoints(goal_slug, successes)?,
                None => Vec::new(),
            };
            let errors = match fields.remove("errors") {
                Some(Value::Array(errors)) => errors,
                Some(Value::Null) | None => Vec::new(),
                Some(other) => vec![other],
            };
            for err in &errors {
                log::warn!("datapoint refused on {goal_slug}: {err}");
            }
            Ok(DatapointBatch { created, errors })
        }
        _ => Err(BeeminderError::Validation(
            "expected a batch create result".into(),
        )),
    }
}

/// Turn user-entered text into a datapoint value.
pub fn parse_value(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(BeeminderError::Validation(format!(
            "'{trimmed}' is not a number"
        ))),
    }
}

impl NewDatapoint {
    pub fn new(value: f64) -> Self {
        NewDatapoint {
            value,
            ..Default::default()
        }
    }

    /// Attach a comment; blank comments are dropped.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        self.comment = Some(comment).filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_daystamp(mut self, daystamp: impl Into<String>) -> Self {
        self.daystamp = Some(daystamp.into());
        self
    }

    pub fn with_requestid(mut self, requestid: impl Into<String>) -> Self {
        self.requestid = Some(requestid.into());
        self
    }

    /// Checked before any request is built.
    pub fn validate(&self) -> Result<()> {
        if !self.value.is_finite() {
            return Err(BeeminderError::Validation(format!(
                "datapoint value must be a finite number, got {}",
                self.value
            )));
        }
        if let Some(day) = &self.daystamp {
            if day.len() != 8 || !day.chars().all(|c| c.is_ascii_digit()) {
                return Err(BeeminderError::Validation(format!(
                    "daystamp must be YYYYMMDD, got '{day}'"
                )));
            }
        }
        Ok(())
    }

    /// Form body for `POST .../datapoints.json`. Unset optionals are left out.
    pub fn to_form(&self) -> BTreeMap<&'static str, String> {
        let mut form = BTreeMap::new();
        form.insert("value", self.value.to_string());
        if let Some(comment) = &self.comment {
            form.insert("comment", comment.clone());
        }
        if let Some(timestamp) = self.timestamp {
            form.insert("timestamp", timestamp.to_string());
        }
        if let Some(daystamp) = &self.daystamp {
            form.insert("daystamp", daystamp.clone());
        }
        if let Some(requestid) = &self.requestid {
            form.insert("requestid", requestid.clone());
        }
        form
    }
}
