//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the TCP listener for the configured address
//! - Transition the lifecycle from Initializing to Listening
//! - Map bind failures to distinguishable fatal exit codes
//!
//! # Design Decisions
//! - Fail fast: any bind error is fatal, the service never limps along
//! - The listener is bound before the state flips to Listening, so a
//!   ready health probe implies an acceptable socket

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::lifecycle::state::Lifecycle;

/// Error type for listener startup.
#[derive(Debug)]
pub enum BindError {
    /// The configured host/port did not parse to a socket address.
    InvalidAddress(String),
    /// Another process already holds the port.
    AddrInUse(std::io::Error),
    /// Binding the port requires privileges the process lacks.
    PermissionDenied(std::io::Error),
    /// Any other bind-time IO failure.
    Other(std::io::Error),
}

impl BindError {
    fn from_io(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::AddrInUse => BindError::AddrInUse(e),
            std::io::ErrorKind::PermissionDenied => BindError::PermissionDenied(e),
            _ => BindError::Other(e),
        }
    }

    /// Process exit code for this failure. Each cause gets its own code
    /// so supervisors can tell them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            BindError::InvalidAddress(_) => 2,
            BindError::AddrInUse(_) => 3,
            BindError::PermissionDenied(_) => 4,
            BindError::Other(_) => 5,
        }
    }
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindError::InvalidAddress(addr) => write!(f, "Invalid bind address: {}", addr),
            BindError::AddrInUse(e) => write!(f, "Address already in use: {}", e),
            BindError::PermissionDenied(e) => write!(f, "Permission denied binding address: {}", e),
            BindError::Other(e) => write!(f, "Failed to bind: {}", e),
        }
    }
}

impl std::error::Error for BindError {}

/// Bind the listener and bring the lifecycle to Listening.
///
/// On success the returned listener is accepting connections and
/// `lifecycle.current_state()` is Listening (unless a shutdown signal
/// already raced startup, in which case the drain wins and the caller's
/// serve loop exits immediately).
pub async fn start(lifecycle: &Lifecycle) -> Result<TcpListener, BindError> {
    let address = lifecycle.config().bind_address();
    let addr: SocketAddr = address
        .parse()
        .map_err(|_| BindError::InvalidAddress(address.clone()))?;

    let listener = TcpListener::bind(addr).await.map_err(BindError::from_io)?;
    let local_addr = listener.local_addr().map_err(BindError::from_io)?;

    lifecycle.mark_listening();

    tracing::info!(
        address = %local_addr,
        state = %lifecycle.current_state(),
        "Listener bound"
    );

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServiceConfig;
    use crate::lifecycle::state::LifecycleState;

    fn localhost_config(port: u16) -> ServiceConfig {
        ServiceConfig {
            bind_host: "127.0.0.1".to_string(),
            bind_port: port,
            ..ServiceConfig::default()
        }
    }

    #[tokio::test]
    async fn start_reaches_listening() {
        let lifecycle = Lifecycle::new(localhost_config(0));
        let listener = start(&lifecycle).await.unwrap();
        assert_eq!(lifecycle.current_state(), LifecycleState::Listening);
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_conflict_is_addr_in_use() {
        let first = Lifecycle::new(localhost_config(0));
        let listener = start(&first).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let second = Lifecycle::new(localhost_config(port));
        let err = start(&second).await.unwrap_err();
        assert!(matches!(err, BindError::AddrInUse(_)), "got {:?}", err);
        assert_eq!(err.exit_code(), 3);
        // First instance is unaffected.
        assert_eq!(first.current_state(), LifecycleState::Listening);
    }

    #[tokio::test]
    async fn invalid_address_is_fatal() {
        let lifecycle = Lifecycle::new(ServiceConfig {
            bind_host: "not a host".to_string(),
            ..ServiceConfig::default()
        });
        let err = start(&lifecycle).await.unwrap_err();
        assert!(matches!(err, BindError::InvalidAddress(_)));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(lifecycle.current_state(), LifecycleState::Initializing);
    }
}
