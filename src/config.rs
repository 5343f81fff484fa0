use dotenvy::dotenv;
use chrono_tz::Tz;
use serde::Deserialize;
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "config.json";
const DEFAULT_INTERVAL_SECS: u64 = 5;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
const DEFAULT_TIMEZONE: &str = "Asia/Ho_Chi_Minh";
const DEFAULT_PROFILE_BASE_URL: &str = "https://thiennguyen.app/user";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/116.0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required fields: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("unknown timezone: {0}")]
    Timezone(String),
    #[error("cannot read config file {path}: {reason}")]
    File { path: PathBuf, reason: String },
}

#[derive(Clone)]
pub struct Config {
    pub admin_id: i64,
    pub group_chat_id: i64,
    pub bot_token: String,
    pub user_id: String,
    pub interval: Duration,
    pub debug: bool,
    pub timezone: Tz,
    pub notify_debits: bool,
    pub profile_base_url: String,
    pub telegram_api_url: String,
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("admin_id", &self.admin_id)
            .field("group_chat_id", &self.group_chat_id)
            .field("bot_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("interval", &self.interval)
            .field("debug", &self.debug)
            .field("timezone", &self.timezone)
            .field("notify_debits", &self.notify_debits)
            .field("profile_base_url", &self.profile_base_url)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

/// Shape of the optional JSON config file; env vars override each key.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    admin_id: Option<i64>,
    group_chat_id: Option<i64>,
    bot_token: Option<String>,
    user_id: Option<String>,
    interval: Option<u64>,
    debug: Option<bool>,
    timezone: Option<String>,
    notify_debits: Option<bool>,
    profile_base_url: Option<String>,
    telegram_api_url: Option<String>,
    fetch_timeout: Option<u64>,
    user_agent: Option<String>,
}

pub fn load() -> Result<Config, ConfigError> {
    dotenv().ok(); // .env is optional

    let file = match config_path(env::var("CONFIG_FILE").ok(), Path::new(DEFAULT_CONFIG_FILE).is_file()) {
        Some(path) => read_file(path)?,
        None => FileConfig::default(),
    };

    resolve(file, |key| env::var(key).ok())
}

/// `CONFIG_FILE` wins; otherwise `config.json` in the working directory if present.
fn config_path(explicit: Option<String>, default_exists: bool) -> Option<PathBuf> {
    match explicit {
        Some(path) if !path.trim().is_empty() => Some(PathBuf::from(path.trim())),
        _ if default_exists => Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
        _ => None,
    }
}

fn read_file(path: PathBuf) -> Result<FileConfig, ConfigError> {
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::File {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| ConfigError::File {
        path,
        reason: e.to_string(),
    })
}

fn resolve(file: FileConfig, var: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
    let text = |key: &'static str, fallback: Option<String>| {
        var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or(fallback)
    };
    let admin_id = number(text("ADMIN_ID", None), "ADMIN_ID")?.or(file.admin_id);
    let group_chat_id = number(text("GROUPCHAT_ID", None), "GROUPCHAT_ID")?.or(file.group_chat_id);
    let interval = number(text("INTERVAL", None), "INTERVAL")?
        .or(file.interval)
        .unwrap_or(DEFAULT_INTERVAL_SECS);
    let fetch_timeout = number(text("FETCH_TIMEOUT", None), "FETCH_TIMEOUT")?
        .or(file.fetch_timeout)
        .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
    let debug = flag(text("DEBUG", None), "DEBUG")?.or(file.debug).unwrap_or(false);
    let notify_debits = flag(text("NOTIFY_DEBITS", None), "NOTIFY_DEBITS")?
        .or(file.notify_debits)
        .unwrap_or(false);

    let user_id = text("USER_ID", file.user_id).ok_or(ConfigError::Missing("USER_ID"))?;
    let bot_token = text("BOT_TOKEN", file.bot_token).ok_or(ConfigError::Missing("BOT_TOKEN"))?;
    let group_chat_id = group_chat_id
        .filter(|id| *id != 0)
        .ok_or(ConfigError::Missing("GROUPCHAT_ID"))?;
    let admin_id = admin_id
        .filter(|id| *id != 0)
        .ok_or(ConfigError::Missing("ADMIN_ID"))?;

    if interval == 0 {
        return Err(ConfigError::Invalid {
            key: "INTERVAL",
            value: interval.to_string(),
        });
    }

    let tz_name = text("TIMEZONE", file.timezone).unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    let timezone: Tz = tz_name.parse().map_err(|_| ConfigError::Timezone(tz_name))?;

    Ok(Config {
        admin_id,
        group_chat_id,
        bot_token,
        user_id,
        interval: Duration::from_secs(interval),
        debug,
        timezone,
        notify_debits,
        profile_base_url: text("PROFILE_BASE_URL", file.profile_base_url)
            .unwrap_or_else(|| DEFAULT_PROFILE_BASE_URL.to_string()),
        telegram_api_url: text("TELEGRAM_API_URL", file.telegram_api_url)
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
        fetch_timeout: Duration::from_secs(fetch_timeout),
        user_agent: text("USER_AGENT", file.user_agent)
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
    })
}

fn number<T: std::str::FromStr>(raw: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    raw.map(|v| v.parse().map_err(|_| ConfigError::Invalid { key, value: v }))
        .transpose()
}

fn flag(raw: Option<String>, key: &'static str) -> Result<Option<bool>, ConfigError> {
    raw.map(|v| match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: v }),
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("ADMIN_ID", "11"),
        ("GROUPCHAT_ID", "-1002"),
        ("BOT_TOKEN", "123:abc"),
        ("USER_ID", "sanchoicauvong"),
    ];

    #[test]
    fn defaults_fill_optional_fields() {
        let cfg = resolve(FileConfig::default(), env_of(&REQUIRED)).unwrap();
        assert_eq!(cfg.admin_id, 11);
        assert_eq!(cfg.group_chat_id, -1002);
        assert_eq!(cfg.interval, Duration::from_secs(5));
        assert!(!cfg.debug);
        assert!(!cfg.notify_debits);
        assert_eq!(cfg.timezone, chrono_tz::Asia::Ho_Chi_Minh);
        assert_eq!(cfg.profile_base_url, "https://thiennguyen.app/user");
    }

    #[test]
    fn each_required_field_is_enforced() {
        for (missing, _) in REQUIRED {
            let rest: Vec<_> = REQUIRED.iter().copied().filter(|(k, _)| *k != missing).collect();
            match resolve(FileConfig::default(), env_of(&rest)) {
                Err(ConfigError::Missing(key)) => assert_eq!(key, missing),
                other => panic!("expected missing {missing}, got {other:?}"),
            }
        }
    }

    #[test]
    fn bad_timezone_is_fatal() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("TIMEZONE", "Mars/Olympus"));
        assert!(matches!(
            resolve(FileConfig::default(), env_of(&vars)),
            Err(ConfigError::Timezone(_))
        ));
    }

    #[test]
    fn non_numeric_id_is_invalid() {
        let mut vars = REQUIRED.to_vec();
        vars[0] = ("ADMIN_ID", "admin");
        assert!(matches!(
            resolve(FileConfig::default(), env_of(&vars)),
            Err(ConfigError::Invalid { key: "ADMIN_ID", .. })
        ));
    }

    #[test]
    fn env_overrides_file() {
        let file: FileConfig = serde_json::from_str(
            r#"{"admin_id": 1, "group_chat_id": 2, "bot_token": "t", "user_id": "from-file", "interval": 30, "debug": true}"#,
        )
        .unwrap();
        let cfg = resolve(file, env_of(&[("USER_ID", "from-env"), ("DEBUG", "false")])).unwrap();

        assert_eq!(cfg.user_id, "from-env");
        assert_eq!(cfg.interval, Duration::from_secs(30));
        assert!(!cfg.debug);
        assert_eq!(cfg.admin_id, 1);
    }

    #[test]
    fn config_file_falls_back_to_config_json() {
        assert_eq!(config_path(None, true), Some(PathBuf::from("config.json")));
        assert_eq!(config_path(None, false), None);
        assert_eq!(config_path(Some("  ".into()), false), None);
        assert_eq!(
            config_path(Some("/etc/watcher.json".into()), true),
            Some(PathBuf::from("/etc/watcher.json"))
        );
    }

    #[test]
    fn token_is_not_printed() {
        let cfg = resolve(FileConfig::default(), env_of(&REQUIRED)).unwrap();
        assert!(!format!("{cfg:?}").contains("123:abc"));
    }
}
