use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub stripe: StripeConfig,
    #[serde(default)]
    pub storefront: StorefrontConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS; empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Accounts registered under these usernames may manage the catalog.
    #[serde(default)]
    pub staff_usernames: Vec<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            staff_usernames: Vec::new(),
        }
    }
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_page_size() -> u64 {
    10
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // No config file: build everything from the environment
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                        allowed_origins: get_env("SERVER_ALLOWED_ORIGINS")
                            .map(|v| parse_list(&v))
                            .unwrap_or_default(),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    stripe: StripeConfig {
                        secret_key: get_env("STRIPE_SECRET_KEY").unwrap_or_default(),
                        api_base: get_env("STRIPE_API_BASE")
                            .unwrap_or_else(default_stripe_api_base),
                        currency: get_env("STRIPE_CURRENCY").unwrap_or_else(default_currency),
                    },
                    storefront: StorefrontConfig {
                        page_size: get_env_parse("STOREFRONT_PAGE_SIZE", default_page_size()),
                        staff_usernames: get_env("STOREFRONT_STAFF_USERNAMES")
                            .map(|v| parse_list(&v))
                            .unwrap_or_default(),
                    },
                }
            }
            Err(e) => {
                return Err(format!("failed to read config file {config_path}: {e}").into());
            }
        };

        // Environment always wins over the file
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("SERVER_ALLOWED_ORIGINS") {
            config.server.allowed_origins = parse_list(&v);
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("STRIPE_SECRET_KEY") {
            config.stripe.secret_key = v;
        }
        if let Ok(v) = env::var("STRIPE_API_BASE") {
            config.stripe.api_base = v;
        }
        if let Ok(v) = env::var("STRIPE_CURRENCY") {
            config.stripe.currency = v;
        }
        if let Ok(v) = env::var("STOREFRONT_PAGE_SIZE")
            && let Ok(n) = v.parse()
        {
            config.storefront.page_size = n;
        }
        if let Ok(v) = env::var("STOREFRONT_STAFF_USERNAMES") {
            config.storefront.staff_usernames = parse_list(&v);
        }

        if config.storefront.page_size == 0 {
            return Err("storefront.page_size must be positive".into());
        }

        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str).map_err(|e| format!("failed to parse config file: {e}").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_file_uses_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/shop"
            max_connections = 5

            [jwt]
            secret = "s3cret"
            access_token_expires_in = 60
            refresh_token_expires_in = 120

            [stripe]
            secret_key = "sk_test_123"
        "#;
        let config = Config::parse(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.server.allowed_origins.is_empty());
        assert_eq!(config.stripe.api_base, "https://api.stripe.com");
        assert_eq!(config.stripe.currency, "usd");
        assert_eq!(config.storefront.page_size, 10);
        assert!(config.storefront.staff_usernames.is_empty());
    }

    #[test]
    fn test_parse_storefront_section() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            allowed_origins = ["https://shop.example.com"]

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [jwt]
            secret = "s3cret"
            access_token_expires_in = 60
            refresh_token_expires_in = 120

            [stripe]
            secret_key = ""
            currency = "eur"

            [storefront]
            page_size = 24
            staff_usernames = ["admin"]
        "#;
        let config = Config::parse(raw).unwrap();
        assert_eq!(config.server.allowed_origins, vec!["https://shop.example.com"]);
        assert_eq!(config.stripe.currency, "eur");
        assert_eq!(config.storefront.page_size, 24);
        assert_eq!(config.storefront.staff_usernames, vec!["admin".to_string()]);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" alice, bob ,,"), vec!["alice", "bob"]);
        assert!(parse_list("").is_empty());
    }
}
