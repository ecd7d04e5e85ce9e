// src/config/settings.rs

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context};
use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Tz;

// Administrador criado no boot quando as variáveis existem
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub media_root: PathBuf,
    pub time_zone: Tz,
    pub admin: Option<AdminBootstrap>,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{name} deve ser definida"))
}

fn parsed_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{name} inválida ('{raw}'): {e}")),
        Err(_) => Ok(default),
    }
}

impl Settings {
    /// Lê a configuração do ambiente (o `.env` já deve ter sido carregado).
    pub fn from_env() -> anyhow::Result<Self> {
        let access_minutes: i64 = parsed_or("ACCESS_TOKEN_MINUTES", 60)?;
        let refresh_days: i64 = parsed_or("REFRESH_TOKEN_DAYS", 1)?;
        if access_minutes <= 0 || refresh_days <= 0 {
            return Err(anyhow!("ACCESS_TOKEN_MINUTES e REFRESH_TOKEN_DAYS devem ser positivos"));
        }

        let time_zone = env::var("TIME_ZONE").unwrap_or_else(|_| "Asia/Kolkata".to_string());
        let time_zone: Tz = time_zone
            .parse()
            .map_err(|e| anyhow!("TIME_ZONE inválida ('{time_zone}'): {e}"))?;

        let admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(AdminBootstrap {
                    username,
                    email: env::var("ADMIN_EMAIL").unwrap_or_default(),
                    password,
                })
            }
            _ => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed_or("PORT", 8000)?,
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", 5)?,
            access_token_ttl: Duration::minutes(access_minutes),
            refresh_token_ttl: Duration::days(refresh_days),
            media_root: PathBuf::from(env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string())),
            time_zone,
            admin,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// "Hoje" no fuso da empresa.
pub fn today_in(time_zone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&time_zone).date_naive()
}
