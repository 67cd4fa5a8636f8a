use std::net::SocketAddr;

use axum::http::{HeaderValue, header::InvalidHeaderValue};
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use super::error::InfraError;
use crate::domain::entities::price_table::PriceTable;

/// Console output format for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

pub struct StripeConfig {
    pub secret_key: SecretString,
    pub webhook_secret: SecretString,
    /// Maximum age of a webhook signature timestamp.
    pub webhook_tolerance_secs: i64,
    pub prices: PriceTable,
}

pub struct OpenAiConfig {
    /// Held server-side; clients never supply their own key.
    pub api_key: SecretString,
    pub base_url: Url,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Shared HS256 secret of the identity provider issuing access tokens.
    pub jwt_secret: SecretString,
    /// Frontend origin used to build checkout and portal redirect URLs.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub log_format: LogFormat,
    pub stripe: StripeConfig,
    pub openai: OpenAiConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let database_url: String = get_env("DATABASE_URL");
        let database_max_connections: u32 = get_env_default("DATABASE_MAX_CONNECTIONS", 5);
        let jwt_secret = SecretString::new(get_env::<String>("JWT_SECRET").into());

        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", app_origin.origin().ascii_serialization())
                .parse()
                .map_err(|e: InvalidHeaderValue| InfraError::ConfigInvalid {
                    var: "CORS_ORIGIN",
                    reason: e.to_string(),
                })?;

        let log_format = LogFormat::parse(&get_env_default("LOG_FORMAT", String::from("pretty")));

        let stripe = StripeConfig {
            secret_key: SecretString::new(get_env::<String>("STRIPE_SECRET_KEY").into()),
            webhook_secret: SecretString::new(get_env::<String>("STRIPE_WEBHOOK_SECRET").into()),
            webhook_tolerance_secs: get_env_default("STRIPE_WEBHOOK_TOLERANCE_SECS", 300),
            prices: PriceTable::new(
                std::env::var("STRIPE_PRICE_PRO_MONTHLY").ok(),
                std::env::var("STRIPE_PRICE_PRO_YEARLY").ok(),
                std::env::var("STRIPE_PRICE_ELITE_MONTHLY").ok(),
                std::env::var("STRIPE_PRICE_ELITE_YEARLY").ok(),
            ),
        };

        let openai = OpenAiConfig {
            api_key: SecretString::new(get_env::<String>("OPENAI_API_KEY").into()),
            base_url: get_env_default(
                "OPENAI_BASE_URL",
                Url::parse("https://api.openai.com/v1/").map_err(|e| {
                    InfraError::ConfigInvalid {
                        var: "OPENAI_BASE_URL",
                        reason: e.to_string(),
                    }
                })?,
            ),
            model: get_env_default("OPENAI_MODEL", String::from("gpt-4o-mini")),
            max_tokens: get_env_default("OPENAI_MAX_TOKENS", 300),
            temperature: get_env_default("OPENAI_TEMPERATURE", 0.7),
        };

        Ok(Self {
            bind_addr,
            database_url,
            database_max_connections,
            jwt_secret,
            app_origin,
            cors_origin,
            log_format,
            stripe,
            openai,
        })
    }
}
