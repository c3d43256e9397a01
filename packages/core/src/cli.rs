use clap::Parser;

/// Kiosk Alerts CLI arguments. Flags override the matching environment
/// variables.
#[derive(Debug, Default, Parser)]
#[command(
    name = "kiosk-alerts",
    version,
    about = "Low-stock and refund notifications for vending kiosks"
)]
pub struct Cli {
    /// HTTP listen port (API_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// SQLite URL for the delivery log (DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Dispatch channel: log, webhook or smtp (DISPATCH_CHANNEL)
    #[arg(long)]
    pub channel: Option<String>,

    /// Operator address receiving every notification (NOTIFY_RECIPIENT)
    #[arg(long)]
    pub recipient: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Value given on the command line for an environment variable name.
    pub fn override_for(&self, key: &str) -> Option<String> {
        match key {
            "API_PORT" => self.port.map(|port| port.to_string()),
            "DATABASE_URL" => self.database_url.clone(),
            "DISPATCH_CHANNEL" => self.channel.clone(),
            "NOTIFY_RECIPIENT" => self.recipient.clone(),
            _ => None,
        }
    }
}
