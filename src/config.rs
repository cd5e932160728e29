// Bot configuration, read once at startup and passed down explicitly.
//
// Values come from the environment (optionally seeded from a .env file).
// Parsing goes through a lookup closure so tests don't touch process env.

use std::time::Duration;

pub const DEFAULT_EMBED_COLOR: u32 = 0xffe9ec;
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RETENTION_HOURS: i64 = 168;
pub const MAX_RETENTION_HOURS: i64 = 24 * 365 * 100;
pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 30 * 60;
pub const MAX_REMINDER_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;
pub const DEFAULT_REMINDER_MESSAGE: &str = "bigbossdaddyhannie";
pub const DEFAULT_MEDIA_URL: &str = "https://cdn.discordapp.com/attachments/1191516424565436609/1316558122369941635/937bcf07.gif";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ReminderConfig {
    pub channel_id: u64,
    pub message: String,
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub application_id: Option<u64>,
    pub guild_id: Option<u64>,
    pub request_channel_id: u64,
    pub uploader_role_id: u64,
    pub embed_color: u32,
    pub media_url: Option<String>,
    /// Requests older than this are dropped by the idle sweep.
    pub retention: chrono::Duration,
    pub reminder: Option<ReminderConfig>,
    pub port: u16,
}

impl BotConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Treat empty values like unset ones
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let token = get("DISCORD_TOKEN")
            .or_else(|| get("BOT_TOKEN"))
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let request_channel_id = parse_id("REQUEST_CHANNEL_ID", get("REQUEST_CHANNEL_ID"))?
            .ok_or(ConfigError::Missing("REQUEST_CHANNEL_ID"))?;
        let uploader_role_id = parse_id("UPLOADER_ROLE_ID", get("UPLOADER_ROLE_ID"))?
            .ok_or(ConfigError::Missing("UPLOADER_ROLE_ID"))?;

        let embed_color = match get("EMBED_COLOR") {
            Some(raw) => parse_hex_color(&raw).ok_or(ConfigError::Invalid {
                name: "EMBED_COLOR",
                value: raw,
            })?,
            None => DEFAULT_EMBED_COLOR,
        };

        // "none" disables the media post entirely
        let media_url = match get("REQUEST_MEDIA_URL") {
            Some(url) if url.eq_ignore_ascii_case("none") => None,
            Some(url) => Some(url),
            None => Some(DEFAULT_MEDIA_URL.to_string()),
        };

        let retention_hours = parse_number("REQUEST_RETENTION_HOURS", get("REQUEST_RETENTION_HOURS"))?
            .unwrap_or(DEFAULT_RETENTION_HOURS);
        let retention = Some(retention_hours)
            .filter(|hours| (1..=MAX_RETENTION_HOURS).contains(hours))
            .and_then(chrono::Duration::try_hours)
            .ok_or(ConfigError::Invalid {
                name: "REQUEST_RETENTION_HOURS",
                value: retention_hours.to_string(),
            })?;

        let reminder_channel = match get("REMINDER_CHANNEL_ID") {
            Some(raw) => parse_id("REMINDER_CHANNEL_ID", Some(raw))?,
            None => parse_id("HIGHERUPS_CHANNEL_ID", get("HIGHERUPS_CHANNEL_ID"))?,
        };
        let reminder = match reminder_channel {
            Some(channel_id) => {
                let secs = parse_number("REMINDER_INTERVAL_SECS", get("REMINDER_INTERVAL_SECS"))?
                    .unwrap_or(DEFAULT_REMINDER_INTERVAL_SECS);
                if !(1..=MAX_REMINDER_INTERVAL_SECS).contains(&secs) {
                    return Err(ConfigError::Invalid {
                        name: "REMINDER_INTERVAL_SECS",
                        value: secs.to_string(),
                    });
                }
                Some(ReminderConfig {
                    channel_id,
                    message: get("REMINDER_MESSAGE")
                        .unwrap_or_else(|| DEFAULT_REMINDER_MESSAGE.to_string()),
                    interval: Duration::from_secs(secs),
                })
            }
            None => None,
        };

        Ok(Self {
            token,
            application_id: parse_id("CLIENT_ID", get("CLIENT_ID"))?,
            guild_id: parse_id("GUILD_ID", get("GUILD_ID"))?,
            request_channel_id,
            uploader_role_id,
            embed_color,
            media_url,
            retention,
            reminder,
            port: parse_number("PORT", get("PORT"))?.unwrap_or(DEFAULT_PORT),
        })
    }
}

/// Discord snowflakes are non-zero u64 values.
fn parse_id(name: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(id) if id != 0 => Ok(Some(id)),
            _ => Err(ConfigError::Invalid { name, value: raw }),
        },
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

/// Accepts `ffe9ec` or `#ffe9ec`.
pub fn parse_hex_color(raw: &str) -> Option<u32> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
