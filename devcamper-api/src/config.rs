/// Configuration management for the API server
///
/// This module loads configuration from environment variables (and a `.env`
/// file when present) into one typed struct that is built once at startup and
/// handed to [`AppState`](crate::app::AppState).
///
/// # Environment Variables
///
/// - `APP_ENV`: `development` (default) or `production`
/// - `API_HOST` / `API_PORT`: bind address (default: 0.0.0.0:5000)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `DATABASE_ACQUIRE_TIMEOUT_SECS`: wait for a free connection (default: 5)
/// - `JWT_SECRET`: signing secret, at least 32 characters (required)
/// - `JWT_EXPIRE`: token lifetime such as `30d`, `12h`, `900s` (default: 30d)
/// - `JWT_COOKIE_EXPIRE`: cookie lifetime in days (default: 30)
/// - `MAX_FILE_UPLOAD`: photo size ceiling in bytes (default: 1000000)
/// - `FILE_UPLOAD_PATH`: photo directory (default: ./public/uploads)
/// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_EMAIL`, `SMTP_PASSWORD`, `FROM_NAME`,
///   `FROM_EMAIL`: outbound mail; mail is only logged when `SMTP_HOST` is unset
/// - `GEOCODER_PROVIDER`, `GEOCODER_API_KEY`: address lookup
/// - `RATE_LIMIT_MAX` / `RATE_LIMIT_WINDOW_SECS`: per-client budget
///   (default: 100 per 600 seconds)
/// - `TRUSTED_PROXIES`: comma-separated proxy addresses whose `X-Forwarded-For`
///   identifies the client (default: none)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default: any)
/// - `DOTENV_PATH`: alternative `.env` file
///
/// # Example
///
/// ```no_run
/// use devcamper_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use chrono::Duration;
use devcamper_shared::db::pool::PoolSettings;
use devcamper_shared::geo::GeocoderConfig;
use devcamper_shared::mail::SmtpConfig;

/// Runtime mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: PoolSettings,
    pub jwt: JwtConfig,
    pub uploads: UploadConfig,
    /// `None` when SMTP is not configured
    pub smtp: Option<SmtpConfig>,
    pub geocoder: GeocoderConfig,
    pub rate_limit: RateLimitConfig,
    /// Empty allows any origin
    pub cors_origins: Vec<String>,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime
    pub expire: Duration,

    /// Session cookie lifetime in days
    pub cookie_expire_days: i64,
}

/// Photo upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_upload: usize,
    pub path: PathBuf,
}

/// Per-client request budget
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
    /// Peers whose `X-Forwarded-For` is believed
    pub trusted_proxies: Vec<IpAddr>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        match env::var("DOTENV_PATH") {
            Ok(path) => {
                dotenvy::from_path(path).ok();
            }
            Err(_) => {
                dotenvy::dotenv().ok();
            }
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = match var("APP_ENV", "development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "development" | "dev" | "test" => Environment::Development,
            other => anyhow::bail!("APP_ENV must be development or production, got {other}"),
        };

        let api_port = var("API_PORT", "5000").parse::<u16>()?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let mut database = PoolSettings::new(
            database_url,
            var("DATABASE_MAX_CONNECTIONS", "10").parse::<u32>()?,
        );
        if let Some(secs) = lookup("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            database.acquire_timeout = std::time::Duration::from_secs(secs.parse::<u64>()?);
        }

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let jwt_expire = parse_duration(&var("JWT_EXPIRE", "30d"))?;
        let cookie_expire_days = var("JWT_COOKIE_EXPIRE", "30").parse::<i64>()?;
        if cookie_expire_days <= 0 {
            anyhow::bail!("JWT_COOKIE_EXPIRE must be a positive number of days");
        }

        let smtp = match lookup("SMTP_HOST").filter(|h| !h.is_empty()) {
            Some(host) => Some(SmtpConfig {
                host,
                port: var("SMTP_PORT", "587").parse::<u16>()?,
                username: var("SMTP_EMAIL", ""),
                password: var("SMTP_PASSWORD", ""),
                from_name: var("FROM_NAME", "DevCamper"),
                from_email: var("FROM_EMAIL", "noreply@devcamper.io"),
            }),
            None => None,
        };

        let trusted_proxies = var("TRUSTED_PROXIES", "")
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<IpAddr>()
                    .map_err(|_| anyhow::anyhow!("TRUSTED_PROXIES has an invalid address: {p}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let cors_origins = var("CORS_ORIGINS", "")
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST", "0.0.0.0"),
                port: api_port,
                environment,
            },
            database,
            jwt: JwtConfig {
                secret: jwt_secret,
                expire: jwt_expire,
                cookie_expire_days,
            },
            uploads: UploadConfig {
                max_file_upload: var("MAX_FILE_UPLOAD", "1000000").parse::<usize>()?,
                path: PathBuf::from(var("FILE_UPLOAD_PATH", "./public/uploads")),
            },
            smtp,
            geocoder: GeocoderConfig {
                provider: var("GEOCODER_PROVIDER", "mapquest"),
                api_key: lookup("GEOCODER_API_KEY").filter(|k| !k.is_empty()),
                endpoint: None,
                timeout_secs: None,
            },
            rate_limit: RateLimitConfig {
                max_requests: var("RATE_LIMIT_MAX", "100").parse::<u32>()?,
                window_secs: var("RATE_LIMIT_WINDOW_SECS", "600").parse::<u64>()?,
                trusted_proxies,
            },
            cors_origins,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn is_production(&self) -> bool {
        self.api.environment.is_production()
    }

    /// URL scheme used in links sent to users
    pub fn public_scheme(&self) -> &'static str {
        if self.is_production() {
            "https"
        } else {
            "http"
        }
    }
}

/// Parses durations like `30d`, `12h`, `15m`, `90s` or a bare number of seconds
pub fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    let amount: i64 = number
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid duration: {value:?}"))?;

    let duration = match unit {
        "" | "s" => Duration::seconds(amount),
        "m" => Duration::minutes(amount),
        "h" => Duration::hours(amount),
        "d" => Duration::days(amount),
        _ => anyhow::bail!("Invalid duration unit in {value:?}"),
    };

    if duration <= Duration::zero() {
        anyhow::bail!("Duration must be positive: {value:?}");
    }

    Ok(duration)
}
