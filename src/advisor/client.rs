//! Advisor scores API client
//!
//! Uses ureq (sync HTTP), so no async runtime is needed. The base URL and
//! token are read from the shared config on every request.

use crate::advisor::{AdvisorError, AdvisorResult};
use crate::config::{SharedConfig, TOKEN_ENV};
use crate::models::{scores_from_json, AdvisorScore};
use tracing::debug;

/// Scores endpoint, relative to the API base URL
pub const SCORES_API_PATH: &str = "/unstable/advisor/scores/npm-package";

/// Registry segment of advisor detail links
pub const NPM_REGISTRY: &str = "npm-package";

/// Anything that can score a batch of package names
pub trait ScoreApi {
    /// Scores for `names`, as returned by the service. No retries.
    fn fetch_scores(&self, names: &[String]) -> AdvisorResult<Vec<AdvisorScore>>;
}

/// HTTP client for the advisor scores API
pub struct AdvisorClient {
    config: SharedConfig,
    agent: ureq::Agent,
}

fn make_agent(timeout_secs: u64) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // We handle status codes ourselves
        .timeout_global(Some(std::time::Duration::from_secs(timeout_secs)))
        .build()
        .new_agent()
}

impl AdvisorClient {
    /// The request timeout is fixed here; URL and token stay live.
    pub fn new(config: SharedConfig) -> Self {
        let timeout_secs = config.snapshot().timeout_secs;
        Self {
            config,
            agent: make_agent(timeout_secs),
        }
    }

    /// Base of advisor detail links for a registry, e.g.
    /// `https://snyk.io/advisor/npm-package`
    pub fn advisor_url(&self, registry: &str) -> String {
        let base = self.config.snapshot().advisor_url;
        format!("{}/{}", base.trim_end_matches('/'), registry)
    }

    fn scores_url(base_api_url: &str) -> String {
        format!("{}{}", base_api_url.trim_end_matches('/'), SCORES_API_PATH)
    }
}

impl ScoreApi for AdvisorClient {
    fn fetch_scores(&self, names: &[String]) -> AdvisorResult<Vec<AdvisorScore>> {
        let config = self.config.snapshot();
        let token = config
            .token
            .ok_or(AdvisorError::MissingToken { env_var: TOKEN_ENV })?;
        let url = Self::scores_url(&config.base_api_url);

        debug!("Requesting advisor scores for {} packages from {}", names.len(), url);

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("token {}", token))
            .header("User-Agent", concat!("advisor-lens/", env!("CARGO_PKG_VERSION")))
            .send_json(names)
            .map_err(|e| AdvisorError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(AdvisorError::Api {
                status,
                message: error_text,
            });
        }

        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| AdvisorError::Transport(e.to_string()))?;

        scores_from_json(&body).map_err(|e| AdvisorError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdvisorConfig;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(url: &str, token: Option<&str>) -> (AdvisorClient, SharedConfig) {
        let shared = SharedConfig::new(AdvisorConfig {
            base_api_url: url.to_string(),
            token: token.map(str::to_string),
            ..AdvisorConfig::default()
        });
        (AdvisorClient::new(shared.clone()), shared)
    }

    #[test]
    fn test_posts_names_with_token() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", SCORES_API_PATH)
            .match_header("authorization", "token secret-1")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!(["lodash", "left-pad"])))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"name": "lodash", "score": 0.42, "labels": {"popularity": "high"}},
                    {"name": "left-pad", "score": 0.95, "labels": {}}
                ])
                .to_string(),
            )
            .create();

        let (client, _) = client_for(&server.url(), Some("secret-1"));
        let scores = client
            .fetch_scores(&["lodash".to_string(), "left-pad".to_string()])
            .unwrap();

        mock.assert();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].name, "lodash");
        assert_eq!(scores[0].labels.get("popularity").map(String::as_str), Some("high"));
        assert_eq!(scores[1].score, 0.95);
    }

    #[test]
    fn test_reads_config_on_every_call() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", SCORES_API_PATH)
            .match_header("authorization", "token rotated")
            .with_status(200)
            .with_body("[]")
            .create();

        let (client, shared) = client_for("http://127.0.0.1:9", Some("stale"));
        shared.replace(AdvisorConfig {
            base_api_url: format!("{}/", server.url()),
            token: Some("rotated".to_string()),
            ..AdvisorConfig::default()
        });

        let scores = client.fetch_scores(&["react".to_string()]).unwrap();
        mock.assert();
        assert!(scores.is_empty());
    }

    #[test]
    fn test_error_status_is_reported() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", SCORES_API_PATH)
            .with_status(401)
            .with_body("unauthorized")
            .create();

        let (client, _) = client_for(&server.url(), Some("bad"));
        match client.fetch_scores(&["react".to_string()]) {
            Err(AdvisorError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "unauthorized");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", SCORES_API_PATH)
            .with_status(200)
            .with_body("{\"not\": \"a list\"}")
            .create();

        let (client, _) = client_for(&server.url(), Some("t"));
        assert!(matches!(
            client.fetch_scores(&["react".to_string()]),
            Err(AdvisorError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_token() {
        let (client, _) = client_for("http://127.0.0.1:9", None);
        assert!(matches!(
            client.fetch_scores(&["react".to_string()]),
            Err(AdvisorError::MissingToken { .. })
        ));
    }

    #[test]
    fn test_advisor_url() {
        let (client, _) = client_for("http://unused", None);
        assert_eq!(
            client.advisor_url(NPM_REGISTRY),
            "https://snyk.io/advisor/npm-package"
        );
    }
}
