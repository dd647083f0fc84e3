mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{
    EchoPolicy, HubSettings, IdentitySettings, LogSettings, ServerSettings, Settings,
};

/// Prefix for environment overrides, e.g. `CHATHUB_SERVER__WS_PORT=9000`.
pub const ENV_PREFIX: &str = "CHATHUB";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct with every section filled in
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();
    let server = partial.server;
    let hub = partial.hub;

    Ok(Settings {
        server: ServerSettings {
            host: server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            ws_port: server
                .as_ref()
                .and_then(|s| s.ws_port)
                .unwrap_or(default.server.ws_port),
            line_port: server
                .as_ref()
                .and_then(|s| s.line_port)
                .unwrap_or(default.server.line_port),
            ws_path: server
                .as_ref()
                .and_then(|s| s.ws_path.clone())
                .unwrap_or(default.server.ws_path),
            allow_guests: server
                .as_ref()
                .and_then(|s| s.allow_guests)
                .unwrap_or(default.server.allow_guests),
            handshake_timeout_secs: server
                .as_ref()
                .and_then(|s| s.handshake_timeout_secs)
                .unwrap_or(default.server.handshake_timeout_secs),
        },
        hub: HubSettings {
            channel_capacity: hub
                .as_ref()
                .and_then(|h| h.channel_capacity)
                .unwrap_or(default.hub.channel_capacity),
            client_queue_capacity: hub
                .as_ref()
                .and_then(|h| h.client_queue_capacity)
                .unwrap_or(default.hub.client_queue_capacity),
            echo_policy: hub
                .as_ref()
                .and_then(|h| h.echo_policy)
                .unwrap_or(default.hub.echo_policy),
        },
        identity: IdentitySettings {
            users_file: partial
                .identity
                .and_then(|i| i.users_file)
                .or(default.identity.users_file),
        },
        log: LogSettings {
            level: partial
                .log
                .and_then(|l| l.level)
                .unwrap_or(default.log.level),
        },
    })
}
