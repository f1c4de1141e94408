use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing {0} environment variable! Create a .env file with your bot token.")]
    Missing(&'static str),
    #[error("{key} has an invalid value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Bot configuration loaded from environment variables.
///
/// | Env Var                   | Default |
/// |---------------------------|---------|
/// | `DISCORD_TOKEN`           | required |
/// | `DATA_DIR`                | `data`  |
/// | `ADMIN_ROLE_IDS`          | none (comma-separated role ids) |
/// | `DEV_GUILD_ID`            | unset, commands register globally |
/// | `CONFIRM_TIMEOUT_SECS`    | `30`    |
/// | `PAGINATION_TIMEOUT_SECS` | `120`   |
/// | `PAGE_SIZE`               | `8`     |
/// | `BOT_TIMEZONE`            | `UTC`   |
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub data_dir: PathBuf,
    pub admin_role_ids: Vec<u64>,
    pub dev_guild_id: Option<u64>,
    pub confirm_timeout: Duration,
    pub pagination_timeout: Duration,
    pub page_size: usize,
    pub timezone: Tz,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let data_dir = PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string()));

        let admin_role_ids = match get("ADMIN_ROLE_IDS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_value("ADMIN_ROLE_IDS", s))
                .collect::<Result<Vec<u64>, _>>()?,
            None => Vec::new(),
        };

        let dev_guild_id = get("DEV_GUILD_ID")
            .map(|v| parse_value("DEV_GUILD_ID", &v))
            .transpose()?;

        let confirm_secs: u64 = parse_or("CONFIRM_TIMEOUT_SECS", get("CONFIRM_TIMEOUT_SECS"), 30)?;
        let pagination_secs: u64 =
            parse_or("PAGINATION_TIMEOUT_SECS", get("PAGINATION_TIMEOUT_SECS"), 120)?;
        let page_size: usize = parse_or("PAGE_SIZE", get("PAGE_SIZE"), 8)?;
        if page_size == 0 || page_size > 25 {
            return Err(ConfigError::Invalid {
                key: "PAGE_SIZE",
                value: page_size.to_string(),
                reason: "must be between 1 and 25".to_string(),
            });
        }

        let timezone = match get("BOT_TIMEZONE") {
            Some(name) => name.parse::<Tz>().map_err(|e| ConfigError::Invalid {
                key: "BOT_TIMEZONE",
                value: name.clone(),
                reason: e.to_string(),
            })?,
            None => Tz::UTC,
        };

        Ok(Self {
            token,
            data_dir,
            admin_role_ids,
            dev_guild_id,
            confirm_timeout: Duration::from_secs(confirm_secs),
            pagination_timeout: Duration::from_secs(pagination_secs),
            page_size,
            timezone,
        })
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
