use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Delivery endpoints for the two third-party email APIs. Either URL may be
/// left empty, in which case that endpoint is skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub primary_url: String,
    pub primary_api_key: String,
    pub fallback_url: String,
    pub fallback_api_key: String,
    pub from_address: String,
    pub from_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub google_client_id: Option<String>,
    pub static_dir: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "jeansclub".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "jeansclub-members".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let email = EmailConfig {
            primary_url: std::env::var("EMAIL_PRIMARY_URL").unwrap_or_default(),
            primary_api_key: std::env::var("EMAIL_PRIMARY_API_KEY").unwrap_or_default(),
            fallback_url: std::env::var("EMAIL_FALLBACK_URL").unwrap_or_default(),
            fallback_api_key: std::env::var("EMAIL_FALLBACK_API_KEY").unwrap_or_default(),
            from_address: std::env::var("EMAIL_FROM_ADDRESS")
                .unwrap_or_else(|_| "club@jeansclub.example".into()),
            from_name: std::env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "Jeans Club".into()),
        };
        Ok(Self {
            database_url,
            jwt,
            email,
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").ok(),
            static_dir: std::env::var("STATIC_DIR").unwrap_or_else(|_| "public".into()),
        })
    }
}
