//! TCP link to the gateway.
//!
//! The transport only dials. It never retries and never reconnects; a caller
//! that wants another attempt calls [`connect`] again.

use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::{GatewayError, GatewayResult};

/// Dial `addr`, giving up after `timeout`.
pub async fn connect(addr: &str, timeout: Duration) -> GatewayResult<TcpStream> {
    debug!("connecting to gateway at {}", addr);

    let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => {
            return Err(GatewayError::ConnectFailure {
                addr: addr.to_string(),
                source,
            })
        }
        Err(_) => {
            return Err(GatewayError::ConnectTimeout {
                addr: addr.to_string(),
                timeout,
            })
        }
    };

    // Commands are a handful of bytes each; don't hold them back.
    stream.set_nodelay(true)?;
    info!("connected to gateway at {}", addr);
    Ok(stream)
}

/// Dial `addr` and split the stream into its read and write halves.
pub async fn connect_split(
    addr: &str,
    timeout: Duration,
) -> GatewayResult<(OwnedReadHalf, OwnedWriteHalf)> {
    Ok(connect(addr, timeout).await?.into_split())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let (client, server) = tokio::join!(
            connect(&addr, Duration::from_secs(5)),
            listener.accept()
        );
        assert!(client.is_ok());
        assert!(server.is_ok());
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_connect_failure() {
        // Bind then drop to get a port nobody is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = connect(&addr, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, GatewayError::ConnectFailure { .. }));
    }
}
