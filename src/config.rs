//! Runtime credentials and per-repository configuration files

use octocrab::Octocrab;
use serde_json::Value;
use tracing::debug;

use crate::JsonObject;
use crate::error::{Error, Result};

/// Repository directory that configuration files are read from.
pub const CONFIG_PATH_PREFIX: &str = ".github";

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8888";
const DEFAULT_WEBHOOK_PATH: &str = "/api/github/webhooks";

/// App credentials and receiver settings, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_id: u64,
    /// RSA private key in PEM form.
    pub private_key: String,
    /// Shared secret for webhook signature verification. Deliveries are
    /// accepted unverified when unset.
    pub webhook_secret: Option<String>,
    pub webhook_path: String,
    pub bind_address: String,
}

impl AppConfig {
    /// Load configuration from the environment (a `.env` file is honored).
    ///
    /// `GITHUB_APP_ID` plus either `GITHUB_PRIVATE_KEY` or
    /// `GITHUB_PRIVATE_KEY_PATH` are required; `GITHUB_WEBHOOK_SECRET`,
    /// `WEBHOOK_PATH`, and `BIND_ADDRESS` are optional.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let app_id = std::env::var("GITHUB_APP_ID")
            .map_err(|_| Error::Config("GITHUB_APP_ID is not set".to_string()))?
            .parse::<u64>()
            .map_err(|e| Error::Config(format!("GITHUB_APP_ID is not a number: {}", e)))?;

        let private_key = match std::env::var("GITHUB_PRIVATE_KEY") {
            Ok(pem) => pem,
            Err(_) => {
                let path = std::env::var("GITHUB_PRIVATE_KEY_PATH").map_err(|_| {
                    Error::Config(
                        "neither GITHUB_PRIVATE_KEY nor GITHUB_PRIVATE_KEY_PATH is set".to_string(),
                    )
                })?;
                std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("failed to read private key file '{}': {}", path, e))
                })?
            }
        };

        let webhook_secret = std::env::var("GITHUB_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let webhook_path =
            std::env::var("WEBHOOK_PATH").unwrap_or_else(|_| DEFAULT_WEBHOOK_PATH.to_string());
        if !webhook_path.starts_with('/') {
            return Err(Error::Config(format!(
                "WEBHOOK_PATH must start with '/', got '{}'",
                webhook_path
            )));
        }

        Ok(Self {
            app_id,
            private_key,
            webhook_secret,
            webhook_path,
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
        })
    }
}

/// Fetch a YAML configuration file from a repository's `.github` directory
/// and shallow-merge it over the caller's defaults (file values win).
///
/// A missing file resolves to the defaults alone; every other fetch
/// failure propagates.
pub(crate) async fn fetch_repo_config(
    client: &Octocrab,
    owner: &str,
    repo: &str,
    file_name: &str,
    defaults: JsonObject,
) -> Result<JsonObject> {
    let path = format!("{}/{}", CONFIG_PATH_PREFIX, file_name);

    let contents = match client
        .repos(owner, repo)
        .get_content()
        .path(path.as_str())
        .send()
        .await
    {
        Ok(contents) => contents,
        Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 404 => {
            debug!("no config file at {}/{}/{}, using defaults", owner, repo, path);
            return Ok(defaults);
        }
        Err(e) => return Err(Error::ConfigFetch { path, source: e }),
    };

    let raw = contents
        .items
        .into_iter()
        .next()
        .and_then(|item| item.decoded_content())
        .unwrap_or_default();

    let file_values = parse_config_yaml(&raw, &path)?;
    Ok(merge_config(defaults, file_values))
}

/// Parse a YAML config document into a JSON object.
///
/// Empty and `null` documents parse as an empty mapping; any other
/// non-mapping document is an error.
pub(crate) fn parse_config_yaml(raw: &str, path: &str) -> Result<JsonObject> {
    if raw.trim().is_empty() {
        return Ok(JsonObject::new());
    }

    let value: Value = serde_yaml::from_str(raw).map_err(|e| Error::ConfigParse {
        path: path.to_string(),
        message: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(JsonObject::new()),
        _ => Err(Error::ConfigParse {
            path: path.to_string(),
            message: "top-level YAML value is not a mapping".to_string(),
        }),
    }
}

/// Shallow merge: file values win over defaults.
pub(crate) fn merge_config(defaults: JsonObject, file_values: JsonObject) -> JsonObject {
    let mut merged = defaults;
    merged.extend(file_values);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture is not an object"),
        }
    }

    #[test]
    fn file_values_win_over_defaults() {
        let defaults = object(json!({"reviewers": 1, "label": "triage"}));
        let file = object(json!({"reviewers": 3}));

        let merged = merge_config(defaults, file);
        assert_eq!(merged["reviewers"], json!(3));
        assert_eq!(merged["label"], json!("triage"));
    }

    #[test]
    fn defaults_only_keys_survive_unchanged() {
        let defaults = object(json!({"a": [1, 2], "b": {"c": true}}));
        let merged = merge_config(defaults.clone(), JsonObject::new());
        assert_eq!(merged, defaults);
    }

    #[test]
    fn parse_yaml_mapping() {
        let parsed = parse_config_yaml("reviewers: 3\nlabel: bug\n", ".github/app.yml").unwrap();
        assert_eq!(parsed["reviewers"], json!(3));
        assert_eq!(parsed["label"], json!("bug"));
    }

    #[test]
    fn parse_empty_and_null_documents_as_empty_mapping() {
        assert!(parse_config_yaml("", ".github/app.yml").unwrap().is_empty());
        assert!(
            parse_config_yaml("   \n", ".github/app.yml")
                .unwrap()
                .is_empty()
        );
        assert!(
            parse_config_yaml("null", ".github/app.yml")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn parse_rejects_non_mapping_documents() {
        let err = parse_config_yaml("- just\n- a\n- list\n", ".github/app.yml").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));

        let err = parse_config_yaml("scalar", ".github/app.yml").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn parse_rejects_malformed_yaml() {
        let err = parse_config_yaml("a: [unclosed", ".github/app.yml").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    fn mock_client(server: &MockServer) -> Octocrab {
        Octocrab::builder()
            .base_uri(server.uri())
            .unwrap()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn missing_remote_file_resolves_to_exactly_the_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/repos/octocat/hello-world/contents/.*"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let defaults = object(json!({"reviewers": 2, "label": "triage"}));

        let merged =
            fetch_repo_config(&client, "octocat", "hello-world", "app.yml", defaults.clone())
                .await
                .unwrap();
        assert_eq!(merged, defaults);
    }

    #[tokio::test]
    async fn non_not_found_fetch_failures_propagate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/repos/octocat/hello-world/contents/.*"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"message": "server error"})),
            )
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let err = fetch_repo_config(
            &client,
            "octocat",
            "hello-world",
            "app.yml",
            JsonObject::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::ConfigFetch { .. }));
    }
}
