use serde::Deserialize;

/// Session tokens live for three days unless overridden.
pub const DEFAULT_TTL_MINUTES: i64 = 3 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SameSite {
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSite,
}

impl CookieConfig {
    /// Cross-site cookies must be `Secure`, so insecure dev setups fall back to `Lax`.
    pub fn new(name: String, secure: bool) -> Self {
        let same_site = if secure { SameSite::None } else { SameSite::Lax };
        Self {
            name,
            secure,
            same_site,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub origin: String,
    pub uploads_dir: String,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "chat-auth".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "chat-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(DEFAULT_TTL_MINUTES),
        };
        let cookie = CookieConfig::new(
            std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "jwt".into()),
            std::env::var("COOKIE_SECURE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        );
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8088),
            origin: std::env::var("ORIGIN").unwrap_or_else(|_| "http://localhost:5173".into()),
            uploads_dir: std::env::var("UPLOADS_DIR")
                .unwrap_or_else(|_| "uploads/profiles".into())
                .trim_end_matches('/')
                .to_string(),
            jwt,
            cookie,
        })
    }
}
