use actix_web::http::Uri;
use std::env;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be a number between 1 and 65535, got '{0}'")]
    InvalidPort(String),

    #[error("FRONTEND_ORIGIN must be a single http(s) origin like https://app.contoso.com, got '{0}'")]
    InvalidFrontendOrigin(String),
}

/// Normaliza uma origem CORS (`scheme://host[:port]`). Wildcards, paths e
/// query strings não são aceitos.
fn parse_origin(raw: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidFrontendOrigin(raw.to_string());
    let origin = raw.trim().trim_end_matches('/');
    if origin.contains('*') {
        return Err(invalid());
    }

    let uri: Uri = origin.parse().map_err(|_| invalid())?;
    let scheme_ok = matches!(uri.scheme_str(), Some("http") | Some("https"));
    let bare = uri.path_and_query().map_or(true, |pq| pq.as_str().is_empty() || pq.as_str() == "/");
    match uri.host() {
        Some(host) if scheme_ok && bare && !host.is_empty() => Ok(origin.to_string()),
        _ => Err(invalid()),
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Value of NODE_ENV (kept for parity with the frontend build)
    pub environment: String,
    /// Set when WEBSITE_INSTANCE_ID is present (Azure App Service)
    pub is_azure: bool,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub frontend_origin: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => return Err(ConfigError::InvalidPort(raw)),
            },
            None => DEFAULT_PORT,
        };

        let is_azure = non_empty("WEBSITE_INSTANCE_ID").is_some();
        let host = non_empty("HOST").unwrap_or_else(|| {
            if is_azure {
                "0.0.0.0".to_string()
            } else {
                "127.0.0.1".to_string()
            }
        });

        let frontend_origin = match non_empty("FRONTEND_ORIGIN") {
            Some(raw) => parse_origin(&raw)?,
            None => "http://localhost:3000".to_string(),
        };

        Ok(Self {
            host,
            port,
            environment: non_empty("NODE_ENV").unwrap_or_else(|| "development".to_string()),
            is_azure,
            mongodb_uri: non_empty("MONGODB_URI"),
            mongodb_database: non_empty("MONGODB_DATABASE")
                .unwrap_or_else(|| "career_canvas".to_string()),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            frontend_origin,
        })
    }

    pub fn is_production(&self) -> bool {
        self.is_azure || self.environment == "production"
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_for_local_development() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:3001");
        assert!(!config.is_production());
        assert!(config.mongodb_uri.is_none());
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn azure_instance_forces_production_and_public_bind() {
        let config = config(&[("WEBSITE_INSTANCE_ID", "abc123"), ("PORT", "8080")]).unwrap();
        assert!(config.is_azure);
        assert!(config.is_production());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn node_env_production() {
        let config = config(&[("NODE_ENV", "production")]).unwrap();
        assert!(config.is_production());
        assert!(!config.is_azure);
    }

    #[test]
    fn invalid_port_is_an_error() {
        assert!(matches!(config(&[("PORT", "http")]), Err(ConfigError::InvalidPort(_))));
        assert!(matches!(config(&[("PORT", "0")]), Err(ConfigError::InvalidPort(_))));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config(&[("MONGODB_URI", "  "), ("OPENAI_API_KEY", "")]).unwrap();
        assert!(config.mongodb_uri.is_none());
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn frontend_origin_must_be_a_plain_origin() {
        let rejected = [
            "*",
            "not a url",
            "https://*.contoso.com",
            "ftp://files.contoso.com",
            "https://app.contoso.com/tab?x=1",
        ];
        for bad in rejected {
            assert!(
                matches!(config(&[("FRONTEND_ORIGIN", bad)]), Err(ConfigError::InvalidFrontendOrigin(_))),
                "{} should be rejected",
                bad
            );
        }

        let config = config(&[("FRONTEND_ORIGIN", " https://careercanvas.contoso.com/ ")]).unwrap();
        assert_eq!(config.frontend_origin, "https://careercanvas.contoso.com");

        let with_port = super::parse_origin("http://localhost:3000").unwrap();
        assert_eq!(with_port, "http://localhost:3000");
    }
}
