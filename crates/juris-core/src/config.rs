//! juris-mailer configuration system.
//!
//! Values come from an optional TOML file, then environment overrides. Secrets
//! are allowed to be absent here; they fail on first collaborator use.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Env var that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "JURIS_MAILER_CONFIG";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl NotifierConfig {
    /// Load from `$JURIS_MAILER_CONFIG` or the default path, then apply env
    /// overrides and validate. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(|p| PathBuf::from(shellexpand::tilde(&p).to_string()))
            .unwrap_or_else(Self::default_path);

        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific path. No env overrides, no validation.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Get the default config path (~/.juris-mailer/config.toml).
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the juris-mailer home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".juris-mailer")
    }

    /// Override values from the environment. Unset or empty variables leave
    /// the current value in place.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SUPABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = get("SUPABASE_SERVICE_KEY") {
            self.database.service_key = v;
        }
        if let Some(v) = get("RESEND_API_KEY") {
            self.mail.api_key = v;
        }
        if let Some(v) = get("EMAIL_FROM") {
            self.mail.deadline_from = v.clone();
            self.mail.summary_from = v;
        }
        if let Some(v) = get("JURIS_MAIL_PROVIDER") {
            match v.parse() {
                Ok(kind) => self.mail.provider = kind,
                Err(e) => tracing::warn!("⚠️ Ignoring JURIS_MAIL_PROVIDER: {e}"),
            }
        }
        if let Some(v) = get("SMTP_HOST") {
            self.mail.smtp.host = v;
        }
        if let Some(v) = get("SMTP_PORT") {
            match v.parse() {
                Ok(port) => self.mail.smtp.port = port,
                Err(e) => tracing::warn!("⚠️ Ignoring SMTP_PORT '{v}': {e}"),
            }
        }
        if let Some(v) = get("SMTP_USER") {
            self.mail.smtp.username = Some(v);
        }
        if let Some(v) = get("SMTP_PASSWORD") {
            self.mail.smtp.password = Some(v);
        }
        if let Some(v) = get("APP_URL") {
            self.notify.app_url = Some(v);
        }
    }

    /// Reject settings that would make the scheduler misbehave. Secrets are
    /// not checked here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.schedule;
        if s.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("schedule.poll_interval_secs must be > 0".into()));
        }
        if s.deadline_interval_secs == 0 {
            return Err(ConfigError::Invalid("schedule.deadline_interval_secs must be > 0".into()));
        }
        if s.firing_window_secs < s.poll_interval_secs {
            return Err(ConfigError::Invalid(format!(
                "schedule.firing_window_secs ({}) must be >= poll_interval_secs ({})",
                s.firing_window_secs, s.poll_interval_secs
            )));
        }
        s.weekday()?;
        s.time()?;
        if self.database.page_size == 0 {
            return Err(ConfigError::Invalid("database.page_size must be > 0".into()));
        }
        if self.notify.privileged_roles.is_empty() {
            return Err(ConfigError::Invalid("notify.privileged_roles must not be empty".into()));
        }
        Ok(())
    }
}

/// Case store (Supabase / PostgREST) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub service_key: String,
    #[serde(default = "default_deadline_table")]
    pub deadline_table: String,
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Rows requested per PostgREST page. Keep at or below the server's
    /// `max-rows`.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_deadline_table() -> String { "demandas_juridicas".into() }
fn default_profiles_table() -> String { "user_profiles".into() }
fn default_timeout_secs() -> u64 { 30 }
fn default_page_size() -> u32 { 1000 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_key: String::new(),
            deadline_table: default_deadline_table(),
            profiles_table: default_profiles_table(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which email provider sends the messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProviderKind {
    #[default]
    Resend,
    Smtp,
    /// Log and keep messages in memory instead of sending them.
    Outbox,
}

impl FromStr for MailProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resend" => Ok(Self::Resend),
            "smtp" => Ok(Self::Smtp),
            "outbox" | "log" | "dry-run" => Ok(Self::Outbox),
            other => Err(ConfigError::Invalid(format!("unknown mail provider '{other}'"))),
        }
    }
}

/// Outbound email configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub provider: MailProviderKind,
    /// Resend API key.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_deadline_from")]
    pub deadline_from: String,
    #[serde(default = "default_summary_from")]
    pub summary_from: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

fn default_api_base() -> String { "https://api.resend.com".into() }
fn default_deadline_from() -> String { "juridico@cepalab.com.br".into() }
fn default_summary_from() -> String { "relatorios@cepalab.com.br".into() }

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: MailProviderKind::default(),
            api_key: String::new(),
            api_base: default_api_base(),
            deadline_from: default_deadline_from(),
            summary_from: default_summary_from(),
            timeout_secs: default_timeout_secs(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl MailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// SMTP transport security.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    #[default]
    Starttls,
    Tls,
    None,
}

/// SMTP provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: SmtpTls,
}

fn default_smtp_port() -> u16 { 587 }

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            username: None,
            password: None,
            tls: SmtpTls::default(),
        }
    }
}

/// When the two notification tasks fire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Sleep between scheduler checks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_deadline_interval")]
    pub deadline_interval_secs: u64,
    /// Day of the weekly summary ("monday", "mon", ...).
    #[serde(default = "default_weekly_day")]
    pub weekly_day: String,
    /// Local time of the weekly summary, "HH:MM".
    #[serde(default = "default_weekly_time")]
    pub weekly_time: String,
    /// How long after the weekly slot a check may still fire it.
    #[serde(default = "default_firing_window")]
    pub firing_window_secs: u64,
}

fn default_poll_interval() -> u64 { 60 }
fn default_deadline_interval() -> u64 { 3600 }
fn default_weekly_day() -> String { "monday".into() }
fn default_weekly_time() -> String { "08:00".into() }
fn default_firing_window() -> u64 { 300 }

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            deadline_interval_secs: default_deadline_interval(),
            weekly_day: default_weekly_day(),
            weekly_time: default_weekly_time(),
            firing_window_secs: default_firing_window(),
        }
    }
}

impl ScheduleConfig {
    pub fn weekday(&self) -> Result<Weekday, ConfigError> {
        self.weekly_day
            .trim()
            .parse::<Weekday>()
            .map_err(|_| ConfigError::Invalid(format!("schedule.weekly_day '{}'", self.weekly_day)))
    }

    pub fn time(&self) -> Result<NaiveTime, ConfigError> {
        let raw = self.weekly_time.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|_| ConfigError::Invalid(format!("schedule.weekly_time '{}' (expected HH:MM)", self.weekly_time)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn deadline_interval(&self) -> Duration {
        Duration::from_secs(self.deadline_interval_secs)
    }

    pub fn firing_window(&self) -> Duration {
        Duration::from_secs(self.firing_window_secs)
    }
}

/// Who gets notified and about what window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Deadlines in `[today, today + horizon_days]` are reminded.
    #[serde(default = "default_days")]
    pub horizon_days: u32,
    /// The weekly summary covers `[today - summary_window_days, today]`.
    #[serde(default = "default_days")]
    pub summary_window_days: u32,
    #[serde(default = "default_privileged_roles")]
    pub privileged_roles: Vec<String>,
    /// Base URL of the web app, linked from every email when set.
    #[serde(default)]
    pub app_url: Option<String>,
}

fn default_days() -> u32 { 7 }
fn default_privileged_roles() -> Vec<String> {
    vec!["super_admin".into(), "admin_empresa".into(), "diretor".into()]
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_days(),
            summary_window_days: default_days(),
            privileged_roles: default_privileged_roles(),
            app_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = NotifierConfig::default();
        config.validate().unwrap();
        assert_eq!(config.schedule.weekday().unwrap(), Weekday::Mon);
        assert_eq!(config.schedule.time().unwrap(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(config.mail.provider, MailProviderKind::Resend);
        assert_eq!(config.notify.privileged_roles.len(), 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = NotifierConfig::from_toml(
            r#"
            [schedule]
            weekly_day = "friday"
            weekly_time = "17:30"

            [mail]
            provider = "smtp"
            [mail.smtp]
            host = "smtp.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.schedule.weekday().unwrap(), Weekday::Fri);
        assert_eq!(config.schedule.poll_interval_secs, 60);
        assert_eq!(config.mail.provider, MailProviderKind::Smtp);
        assert_eq!(config.mail.smtp.port, 587);
        assert_eq!(config.database.deadline_table, "demandas_juridicas");
    }

    #[test]
    fn test_broken_toml_is_parse_error() {
        let err = NotifierConfig::from_toml("[schedule\npoll = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SUPABASE_URL", "https://db.example.com"),
            ("SUPABASE_SERVICE_KEY", "service"),
            ("RESEND_API_KEY", "re_123"),
            ("EMAIL_FROM", "avisos@example.com"),
            ("SMTP_PORT", "not-a-port"),
            ("APP_URL", ""),
        ]);
        let mut config = NotifierConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.database.url, "https://db.example.com");
        assert_eq!(config.database.service_key, "service");
        assert_eq!(config.mail.api_key, "re_123");
        assert_eq!(config.mail.deadline_from, "avisos@example.com");
        assert_eq!(config.mail.summary_from, "avisos@example.com");
        assert_eq!(config.mail.smtp.port, 587);
        assert_eq!(config.notify.app_url, None);
    }

    #[test]
    fn test_missing_secrets_do_not_fail_validation() {
        let mut config = NotifierConfig::default();
        config.apply_env(|_| None);
        assert!(config.database.url.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_schedule() {
        let mut config = NotifierConfig::default();
        config.schedule.weekly_time = "8 o'clock".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = NotifierConfig::default();
        config.schedule.firing_window_secs = 30;
        assert!(config.validate().is_err());

        let mut config = NotifierConfig::default();
        config.schedule.deadline_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let config = NotifierConfig::from_toml("[database]\npage_size = 0\n").unwrap();
        assert_eq!(config.database.timeout_secs, 30);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert_eq!(NotifierConfig::default().database.page_size, 1000);
    }

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("SMTP".parse::<MailProviderKind>().unwrap(), MailProviderKind::Smtp);
        assert_eq!("dry-run".parse::<MailProviderKind>().unwrap(), MailProviderKind::Outbox);
        assert!("pigeon".parse::<MailProviderKind>().is_err());
    }
}
