//! Error types for the kubewatch gateway
//!
//! The admission filter itself never fails. These types cover the plumbing
//! around it: configuration, the Kubernetes watch layer and the sinks.

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Plugin error (ingestor or emitter)
    #[error("plugin '{plugin}' error: {message}")]
    Plugin { plugin: String, message: String },

    /// Metrics error
    #[error("metrics error: {0}")]
    Metrics(String),
}

/// Error type for ingestor and emitter operations
#[derive(Error, Debug)]
pub enum PluginError {
    /// Initialization failed
    #[error("initialization failed: {0}")]
    Init(String),

    /// Send failed
    #[error("send failed: {0}")]
    Send(String),

    /// Connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Watch stream failed
    #[error("watch failed: {0}")]
    Watch(String),}

impl PluginError {
    /// Attach the plugin name, producing a gateway error
    pub fn in_plugin(self, plugin: &str) -> GatewayError {
        GatewayError::Plugin {
            plugin: plugin.to_string(),
            message: self.to_string(),
        }
    }
}

impl From<PluginError> for GatewayError {
    fn from(err: PluginError) -> Self {
        err.in_plugin("unknown")
    }
}
