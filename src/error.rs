//! Error types for DishaIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DishaIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Device did not answer within the command timeout
    #[error("{stage}: device unresponsive{}", join_messages(.messages))]
    DeviceUnresponsive {
        /// Lifecycle stage that was being attempted
        stage: &'static str,
        /// Messages drained from the device error queue
        messages: Vec<String>,
    },

    /// Device answered but refused the command
    #[error("{stage}: command rejected{}", join_messages(.messages))]
    CommandRejected {
        /// Lifecycle stage that was being attempted
        stage: &'static str,
        /// Messages drained from the device error queue
        messages: Vec<String>,
    },

    /// Serial port could not be opened
    #[error("Failed to open port {port}: {reason}")]
    PortOpenFailure { port: String, reason: String },

    /// Acquisition requested before a successful initialization
    #[error("Device not initialized")]
    NotInitialized,

    /// Transition not allowed from the current lifecycle state
    #[error("Invalid lifecycle state: {0}")]
    InvalidState(String),

    /// Device type not supported by the factory
    #[error("Unknown device type: {0}")]
    UnknownDevice(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wire serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Device error messages attached to a lifecycle failure
    pub fn device_messages(&self) -> &[String] {
        match self {
            Error::DeviceUnresponsive { messages, .. } | Error::CommandRejected { messages, .. } => {
                messages
            }
            _ => &[],
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

fn join_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        String::new()
    } else {
        format!(" ({})", messages.join("; "))
    }
}
