//! Error types for ring lookups and configuration loading.

/// Errors that can occur when querying or configuring a ring.
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    /// A lookup was attempted while the ring holds no positions.
    #[error("empty circle")]
    EmptyCircle,

    /// The TOML configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
