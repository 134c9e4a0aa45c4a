/// Registry access failures, scoped so callers can report which address or
/// prefix was affected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Connection-level failure (DNS, TCP, TLS, timeout).
    Transport { detail: String },
    /// The registry rejected our credentials.
    Auth { status: u16 },
    /// The registry answered with a non-success status.
    Api { status: u16, detail: String },
    /// Lookup target does not exist in the registry.
    NotFound { address: String },
    /// The response body did not match the expected shape.
    Decode { detail: String },
}

impl RegistryError {
    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        RegistryError::Transport {
            detail: err.to_string(),
        }
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Transport { detail } => write!(f, "registry unreachable: {detail}"),
            RegistryError::Auth { status } => {
                write!(f, "registry rejected credentials (HTTP {status})")
            }
            RegistryError::Api { status, detail } => {
                write!(f, "registry API error (HTTP {status}): {detail}")
            }
            RegistryError::NotFound { address } => {
                write!(f, "address {address} not found in registry")
            }
            RegistryError::Decode { detail } => {
                write!(f, "unexpected registry response: {detail}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}
