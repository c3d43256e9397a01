use std::env;
use std::sync::Arc;

use crate::alerts::{Dispatcher, EmailConfig, EmailDispatcher, LogDispatcher, WebhookDispatcher};
use crate::cli::Cli;
use crate::error::AppError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://kiosk-alerts.db";
pub const DEFAULT_API_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub recipient: String,
    pub channel: DispatchChannel,
    pub database_url: String,
    pub api_port: u16,
    /// Level triggers for other machines are skipped. `None` monitors all.
    pub monitored_machines: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchChannel {
    Log,
    Webhook { url: String },
    Smtp(EmailConfig),
}

impl DispatchChannel {
    pub fn name(&self) -> &'static str {
        match self {
            DispatchChannel::Log => "log",
            DispatchChannel::Webhook { .. } => "webhook",
            DispatchChannel::Smtp(_) => "smtp",
        }
    }

    /// Construct the dispatcher for this channel.
    pub fn build(&self) -> Result<Arc<dyn Dispatcher + Send + Sync>, AppError> {
        let dispatcher: Arc<dyn Dispatcher + Send + Sync> = match self {
            DispatchChannel::Log => Arc::new(LogDispatcher),
            DispatchChannel::Webhook { url } => Arc::new(
                WebhookDispatcher::new(url.clone())
                    .map_err(|err| AppError::Dispatcher(err.to_string()))?,
            ),
            DispatchChannel::Smtp(email) => Arc::new(
                EmailDispatcher::new(email).map_err(|err| AppError::Dispatcher(err.to_string()))?,
            ),
        };
        Ok(dispatcher)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Environment configuration with command-line flags taking precedence.
    pub fn load(cli: &Cli) -> Result<Self, String> {
        Self::from_lookup(|key| cli.override_for(key).or_else(|| env::var(key).ok()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let recipient = lookup("NOTIFY_RECIPIENT")
            .filter(|r| !r.trim().is_empty())
            .ok_or("NOTIFY_RECIPIENT is required")?;

        let channel = match lookup("DISPATCH_CHANNEL").as_deref().unwrap_or("log") {
            "log" => DispatchChannel::Log,
            "webhook" => DispatchChannel::Webhook {
                url: lookup("WEBHOOK_URL")
                    .ok_or("WEBHOOK_URL is required when DISPATCH_CHANNEL=webhook")?,
            },
            "smtp" => DispatchChannel::Smtp(
                EmailConfig::from_lookup(&lookup)
                    .ok_or("SMTP_HOST is required when DISPATCH_CHANNEL=smtp")?,
            ),
            other => return Err(format!("Invalid DISPATCH_CHANNEL: {}", other)),
        };

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let api_port = match lookup("API_PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| "API_PORT must be a valid port number")?,
            None => DEFAULT_API_PORT,
        };

        // An empty list means the variable was left blank: monitor everything.
        let monitored_machines = lookup("MONITORED_MACHINES")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|machines| !machines.is_empty());

        Ok(Self {
            recipient,
            channel,
            database_url,
            api_port,
            monitored_machines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config =
            Config::from_lookup(lookup(&[("NOTIFY_RECIPIENT", "ops@example.com")])).unwrap();

        assert_eq!(config.recipient, "ops@example.com");
        assert_eq!(config.channel, DispatchChannel::Log);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.api_port, 8080);
        assert!(config.monitored_machines.is_none());
    }

    #[test]
    fn recipient_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, "NOTIFY_RECIPIENT is required");
    }

    #[test]
    fn webhook_channel_requires_url() {
        let err = Config::from_lookup(lookup(&[
            ("NOTIFY_RECIPIENT", "ops@example.com"),
            ("DISPATCH_CHANNEL", "webhook"),
        ]))
        .unwrap_err();
        assert!(err.contains("WEBHOOK_URL"));
    }

    #[test]
    fn smtp_channel_reads_email_config() {
        let config = Config::from_lookup(lookup(&[
            ("NOTIFY_RECIPIENT", "ops@example.com"),
            ("DISPATCH_CHANNEL", "smtp"),
            ("SMTP_HOST", "smtp.example.com"),
        ]))
        .unwrap();

        match &config.channel {
            DispatchChannel::Smtp(email) => assert_eq!(email.smtp_host, "smtp.example.com"),
            other => panic!("expected smtp channel, got {:?}", other),
        }
    }

    #[test]
    fn unknown_channel_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("NOTIFY_RECIPIENT", "ops@example.com"),
            ("DISPATCH_CHANNEL", "pigeon"),
        ]))
        .unwrap_err();
        assert_eq!(err, "Invalid DISPATCH_CHANNEL: pigeon");
    }

    #[test]
    fn monitored_machines_are_split_and_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("NOTIFY_RECIPIENT", "ops@example.com"),
            ("MONITORED_MACHINES", "M-0001, M-0002,,"),
        ]))
        .unwrap();

        assert_eq!(
            config.monitored_machines,
            Some(vec!["M-0001".to_string(), "M-0002".to_string()])
        );
    }

    #[test]
    fn blank_monitored_machines_monitors_all() {
        for blank in ["", " ", ",,"] {
            let config = Config::from_lookup(lookup(&[
                ("NOTIFY_RECIPIENT", "ops@example.com"),
                ("MONITORED_MACHINES", blank),
            ]))
            .unwrap();

            assert!(config.monitored_machines.is_none(), "{:?} should monitor all", blank);
        }
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("NOTIFY_RECIPIENT", "ops@example.com"),
            ("API_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.contains("API_PORT"));
    }

    #[test]
    fn cli_flags_override_lookup() {
        let cli = Cli::parse_from([
            "kiosk-alerts",
            "--port",
            "9191",
            "--recipient",
            "cli@example.com",
        ]);
        let base = lookup(&[("NOTIFY_RECIPIENT", "env@example.com"), ("API_PORT", "8081")]);

        let config =
            Config::from_lookup(|key| cli.override_for(key).or_else(|| base(key))).unwrap();

        assert_eq!(config.recipient, "cli@example.com");
        assert_eq!(config.api_port, 9191);
    }

    #[test]
    fn channels_build_matching_dispatchers() {
        let log = DispatchChannel::Log.build().unwrap();
        assert_eq!(log.channel_name(), "log");

        let webhook = DispatchChannel::Webhook {
            url: "https://hooks.example.com/kiosk".to_string(),
        }
        .build()
        .unwrap();
        assert_eq!(webhook.channel_name(), "webhook");
    }
}
