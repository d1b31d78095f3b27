//! Per-delivery context helpers
//!
//! A [`Context`] binds one webhook event to one authenticated client and
//! offers the identity accessors handlers build API calls from.

use std::sync::Arc;

use octocrab::Octocrab;
use serde_json::Value;

use crate::JsonObject;
use crate::config;
use crate::error::{Error, Result};
use crate::event::Event;

/// Helper bound to one event payload and one authenticated client handle.
///
/// Each matched handler gets its own `Context`; all contexts for a
/// delivery share the same payload and client.
#[derive(Clone)]
pub struct Context {
    event: Arc<Event>,
    client: Octocrab,
}

impl Context {
    pub(crate) fn new(event: Arc<Event>, client: Octocrab) -> Self {
        Self { event, client }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn payload(&self) -> &Value {
        self.event.payload()
    }

    /// The authenticated client bound to this delivery.
    pub fn client(&self) -> &Octocrab {
        &self.client
    }

    fn repo_identity(&self) -> Result<(String, String)> {
        let repository = self
            .payload()
            .get("repository")
            .ok_or(Error::MissingIdentityField("repository"))?;
        let owner = repository
            .get("owner")
            .and_then(|o| o.get("login"))
            .and_then(|l| l.as_str())
            .ok_or(Error::MissingIdentityField("repository.owner.login"))?;
        let name = repository
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or(Error::MissingIdentityField("repository.name"))?;
        Ok((owner.to_string(), name.to_string()))
    }

    fn issue_number(&self) -> Result<u64> {
        self.payload()
            .get("issue")
            .or_else(|| self.payload().get("pull_request"))
            .and_then(|i| i.get("number"))
            .and_then(|n| n.as_u64())
            .ok_or(Error::MissingIdentityField("issue.number"))
    }

    /// `{owner, repo}` for the bound repository, merged with `extra`.
    ///
    /// `extra` is merged after the derived fields, so a caller overrides
    /// the derived identity only by naming the field explicitly.
    pub fn repo(&self, extra: JsonObject) -> Result<JsonObject> {
        let (owner, name) = self.repo_identity()?;
        let mut params = JsonObject::new();
        params.insert("owner".to_string(), Value::String(owner));
        params.insert("repo".to_string(), Value::String(name));
        params.extend(extra);
        Ok(params)
    }

    /// `{owner, repo, number}` for the bound issue or pull request, merged
    /// with `extra` under the same override rule as [`repo`](Self::repo).
    pub fn issue(&self, extra: JsonObject) -> Result<JsonObject> {
        let number = self.issue_number()?;
        let mut params = self.repo(JsonObject::new())?;
        params.insert("number".to_string(), Value::from(number));
        params.extend(extra);
        Ok(params)
    }

    /// Alias of [`issue`](Self::issue) for pull-request events.
    pub fn pull_request(&self, extra: JsonObject) -> Result<JsonObject> {
        self.issue(extra)
    }

    /// True when the delivery was triggered by a bot account.
    pub fn is_bot(&self) -> bool {
        if self.event.sender_type() == Some("Bot") {
            return true;
        }
        self.event
            .sender_login()
            .map(|login| login.ends_with("[bot]"))
            .unwrap_or(false)
    }

    /// Fetch `.github/<file_name>` from the bound repository, parse it as
    /// YAML, and shallow-merge it over `defaults` (file values win).
    ///
    /// A missing file resolves to the defaults alone; any other fetch or
    /// parse failure propagates.
    pub async fn config(&self, file_name: &str, defaults: JsonObject) -> Result<JsonObject> {
        let (owner, repo) = self.repo_identity()?;
        config::fetch_repo_config(&self.client, &owner, &repo, file_name, defaults).await
    }

    /// Typed variant of [`config`](Self::config): the merged mapping
    /// deserialized into `T`.
    pub async fn config_as<T>(&self, file_name: &str, defaults: JsonObject) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let merged = self.config(file_name, defaults).await?;
        serde_json::from_value(Value::Object(merged)).map_err(|e| Error::ConfigParse {
            path: format!("{}/{}", config::CONFIG_PATH_PREFIX, file_name),
            message: e.to_string(),
        })
    }
}
