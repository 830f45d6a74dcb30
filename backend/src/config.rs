use serde::Deserialize;

/// Application configuration
///
/// Loaded once at startup and handed to the composition root; nothing reads
/// the environment at request time.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server port
    pub server_port: u16,

    /// Allowed cross-origin caller addresses
    pub cors_origins: Vec<String>,

    /// TAAPI credential; None leaves /api/analysis reporting a
    /// configuration error
    pub taapi_key: Option<String>,

    /// TAAPI base URL
    pub taapi_url: String,

    /// CoinGecko base URL
    pub coingecko_url: String,

    /// Analysis cache TTL (seconds)
    pub cache_ttl_seconds: u64,

    /// Upstream HTTP request timeout (seconds)
    pub upstream_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            cors_origins: parse_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| {
                    "http://localhost:5173,https://trade-oracle.vercel.app".to_string()
                }),
            ),
            taapi_key: std::env::var("TAAPI_KEY").ok().filter(|k| !k.is_empty()),
            taapi_url: std::env::var("TAAPI_URL")
                .unwrap_or_else(|_| "https://api.taapi.io".to_string()),
            coingecko_url: std::env::var("COINGECKO_URL")
                .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string()),
            cache_ttl_seconds: std::env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()?,
            upstream_timeout_seconds: std::env::var("UPSTREAM_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_origin_list() {
        let origins = parse_origins("http://localhost:5173, https://trade-oracle.vercel.app ,");
        assert_eq!(
            origins,
            vec![
                "http://localhost:5173".to_string(),
                "https://trade-oracle.vercel.app".to_string(),
            ]
        );
    }

    #[test]
    fn empty_origin_list_stays_empty() {
        assert!(parse_origins("").is_empty());
        assert!(parse_origins(" , ").is_empty());
    }
}
