use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the listeners, the hub, the identity store and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub hub: HubSettings,
    pub identity: IdentitySettings,
    pub log: LogSettings,
}

/// Configuration settings for the two listeners.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    /// Port of the WebSocket (duplex) listener.
    pub ws_port: u16,
    /// Port of the raw TCP (line) listener.
    pub line_port: u16,
    /// Only upgrade requests for this path are accepted.
    pub ws_path: String,
    /// Admit WebSocket clients without a session as guests instead of
    /// rejecting the upgrade.
    pub allow_guests: bool,
    pub handshake_timeout_secs: u64,
}

/// Configuration settings for the hub.
///
/// Bounds the hub mailboxes and every client's delivery queue, and picks the
/// self-echo rule applied during fan-out.
#[derive(Debug, Deserialize, Clone)]
pub struct HubSettings {
    pub channel_capacity: usize,
    pub client_queue_capacity: usize,
    pub echo_policy: EchoPolicy,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IdentitySettings {
    /// JSON file of `{"name", "password"}` records loaded at startup.
    pub users_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Whether the sender of a message gets it back during fan-out.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EchoPolicy {
    /// Duplex clients see their own messages, line clients do not.
    #[default]
    Native,
    Never,
    Always,
}

/// Partial configuration settings loaded from files or environment.
///
/// Every field is optional. Missing values are filled in from defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub hub: Option<PartialHubSettings>,
    pub identity: Option<PartialIdentitySettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub ws_port: Option<u16>,
    pub line_port: Option<u16>,
    pub ws_path: Option<String>,
    pub allow_guests: Option<bool>,
    pub handshake_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialHubSettings {
    pub channel_capacity: Option<usize>,
    pub client_queue_capacity: Option<usize>,
    pub echo_policy: Option<EchoPolicy>,
}

#[derive(Debug, Deserialize)]
pub struct PartialIdentitySettings {
    pub users_file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                ws_port: 8080,
                line_port: 6893,
                ws_path: "/ws/".to_string(),
                allow_guests: true,
                handshake_timeout_secs: 60,
            },
            hub: HubSettings::default(),
            identity: IdentitySettings::default(),
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            client_queue_capacity: 64,
            echo_policy: EchoPolicy::Native,
        }
    }
}
