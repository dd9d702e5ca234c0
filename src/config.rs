//! Runtime configuration: optional YAML file plus the API endpoint table.
//!
//! Resolution order for every setting is CLI flag / environment variable,
//! then the config file, then the built-in default.
//!
//! ```yaml
//! api_base_url: https://admin.example.com
//! token: eyJhbGciOi...
//! ```

use serde::Deserialize;
use std::error::Error;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Contents of the optional `config.yaml`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Load and parse a YAML config file.
#[instrument(level = "debug")]
pub async fn load_file_config(path: &str) -> Result<FileConfig, Box<dyn Error>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let config: FileConfig = serde_yaml::from_str(&raw)?;
    debug!(
        has_base_url = config.api_base_url.is_some(),
        has_token = config.token.is_some(),
        "Loaded config file"
    );
    Ok(config)
}

/// Settings after merging CLI/env over the file config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoints: Endpoints,
    pub token: Option<String>,
}

impl Settings {
    pub fn resolve(
        cli_base_url: Option<String>,
        cli_token: Option<String>,
        file: FileConfig,
    ) -> Result<Self, url::ParseError> {
        let base = cli_base_url
            .or(file.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        Ok(Self {
            endpoints: Endpoints::new(&base)?,
            token: cli_token.or(file.token),
        })
    }
}

/// Absolute URLs of the admin API resources this tool talks to.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        // A trailing slash makes `join` append instead of replacing the last segment.
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn login(&self) -> Result<Url, url::ParseError> {
        self.base.join("api/auth/login")
    }

    pub fn websites(&self) -> Result<Url, url::ParseError> {
        self.base.join("api/websites")
    }

    /// A single source, the target of updates.
    pub fn website(&self, id: &str) -> Result<Url, url::ParseError> {
        self.base.join(&format!("api/websites/{}", urlencoding::encode(id)))
    }

    /// Trigger URL for a streamed scrape job.
    ///
    /// # Arguments
    ///
    /// * `job_id` - Identifier of the source to scrape; percent-encoded into
    ///   a single path segment, so `/` or spaces cannot escape it
    ///
    /// # Returns
    ///
    /// `{base}/api/websites/{job_id}/scrape`, or the `url` parse error.
    pub fn scrape(&self, job_id: &str) -> Result<Url, url::ParseError> {
        self.base.join(&format!(
            "api/websites/{}/scrape",
            urlencoding::encode(job_id)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_from_bare_host() {
        let endpoints = Endpoints::new("http://localhost:5000").unwrap();
        assert_eq!(
            endpoints.websites().unwrap().as_str(),
            "http://localhost:5000/api/websites"
        );
        assert_eq!(
            endpoints.login().unwrap().as_str(),
            "http://localhost:5000/api/auth/login"
        );
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let endpoints = Endpoints::new("https://example.com/admin").unwrap();
        assert_eq!(
            endpoints.scrape("42").unwrap().as_str(),
            "https://example.com/admin/api/websites/42/scrape"
        );
    }

    #[test]
    fn test_scrape_id_is_encoded() {
        let endpoints = Endpoints::new("http://localhost:5000/").unwrap();
        assert_eq!(
            endpoints.scrape("a/b c").unwrap().as_str(),
            "http://localhost:5000/api/websites/a%2Fb%20c/scrape"
        );
    }

    #[test]
    fn test_website_endpoint_is_encoded() {
        let endpoints = Endpoints::new("http://localhost:5000").unwrap();
        assert_eq!(
            endpoints.website("65f1c0ffee").unwrap().as_str(),
            "http://localhost:5000/api/websites/65f1c0ffee"
        );
        assert_eq!(
            endpoints.website("a/b").unwrap().as_str(),
            "http://localhost:5000/api/websites/a%2Fb"
        );
    }

    #[test]
    fn test_settings_precedence() {
        let file = FileConfig {
            api_base_url: Some("http://file.example".to_string()),
            token: Some("file-token".to_string()),
        };

        let settings = Settings::resolve(None, Some("cli-token".to_string()), file.clone()).unwrap();
        assert_eq!(settings.endpoints.base().as_str(), "http://file.example/");
        assert_eq!(settings.token.as_deref(), Some("cli-token"));

        let settings =
            Settings::resolve(Some("http://cli.example".to_string()), None, file).unwrap();
        assert_eq!(settings.endpoints.base().as_str(), "http://cli.example/");
        assert_eq!(settings.token.as_deref(), Some("file-token"));
    }

    #[test]
    fn test_settings_default_base() {
        let settings = Settings::resolve(None, None, FileConfig::default()).unwrap();
        assert_eq!(settings.endpoints.base().as_str(), "http://localhost:5000/");
        assert!(settings.token.is_none());
    }

    #[tokio::test]
    async fn test_load_file_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "api_base_url: http://news.local\ntoken: abc123\n")
            .await
            .unwrap();

        let config = load_file_config(path.to_str().unwrap()).await.unwrap();
        assert_eq!(config.api_base_url.as_deref(), Some("http://news.local"));
        assert_eq!(config.token.as_deref(), Some("abc123"));
    }
}
