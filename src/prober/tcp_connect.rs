use std::io;
use std::time::Duration;

use socket2::Socket;
use tokio::io::Interest;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::prober::Outcome;
use crate::resolver::Endpoint;

/// Drive one non-blocking connect against `endpoint`, bounded by
/// `limit`.
///
/// The socket is opened non-blocking, the connect is issued, and when
/// the handshake is pending the attempt waits for readiness at most
/// `limit` before giving up. The timeout budget is consumed exactly
/// once per attempt; there is no retry. On every outcome except
/// `Connected` the socket is closed before returning.
pub async fn connect_with_timeout(endpoint: &Endpoint, limit: Duration) -> Outcome {
    // A zero wait is ambiguous between "don't wait" and "wait
    // forever" across poll implementations; reject it up front.
    if limit.is_zero() {
        return Outcome::ResourceError(io::Error::new(
            io::ErrorKind::InvalidInput,
            "connect timeout must be greater than zero",
        ));
    }

    let socket = match Socket::new(endpoint.domain, endpoint.socket_type, Some(endpoint.protocol))
    {
        Ok(s) => s,
        Err(e) => return Outcome::ResourceError(e),
    };
    if let Err(e) = socket.set_nonblocking(true) {
        return Outcome::ResourceError(e);
    }

    // Loopback can complete synchronously; EINPROGRESS means the
    // handshake is pending and we wait below. Anything else is the
    // peer or network rejecting us outright.
    match socket.connect(&endpoint.addr) {
        Ok(()) => return hand_over(socket.into()),
        Err(e) if in_progress(&e) => {}
        Err(e) => return Outcome::Refused(e),
    }

    let stream = match TcpStream::from_std(socket.into()) {
        Ok(s) => s,
        Err(e) => return Outcome::ResourceError(e),
    };

    // The handshake result can surface on either the read or the
    // write set depending on platform, so wait on both.
    let readiness = stream.ready(Interest::READABLE | Interest::WRITABLE);
    match timeout(limit, readiness).await {
        Err(_elapsed) => Outcome::TimedOut,
        Ok(Err(e)) => Outcome::ResourceError(e),
        Ok(Ok(_ready)) => match stream.take_error() {
            Err(e) => Outcome::ResourceError(e),
            // An asynchronous refusal parks the error on the socket;
            // readiness alone does not mean the connect succeeded.
            Ok(Some(e)) => Outcome::Refused(e),
            Ok(None) => match stream.into_std() {
                Ok(std_stream) => hand_over(std_stream),
                Err(e) => Outcome::ResourceError(e),
            },
        },
    }
}

fn in_progress(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINPROGRESS) || err.kind() == io::ErrorKind::WouldBlock
}

/// Success path: restore the socket to its original blocking mode
/// before the caller takes ownership.
fn hand_over(stream: std::net::TcpStream) -> Outcome {
    if let Err(e) = stream.set_nonblocking(false) {
        return Outcome::ResourceError(e);
    }
    Outcome::Connected(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver;
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    async fn loopback_endpoint(port: u16) -> Endpoint {
        let endpoints = resolver::resolve("127.0.0.1", &port.to_string())
            .await
            .unwrap();
        endpoints.into_iter().next().unwrap()
    }

    #[tokio::test]
    async fn zero_timeout_is_a_contract_violation() {
        let endpoint = loopback_endpoint(80).await;
        match connect_with_timeout(&endpoint, Duration::ZERO).await {
            Outcome::ResourceError(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidInput),
            other => panic!("expected ResourceError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn listening_port_connects_and_returns_a_live_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let endpoint = loopback_endpoint(port).await;

        match connect_with_timeout(&endpoint, Duration::from_secs(3)).await {
            Outcome::Connected(stream) => {
                let peer = stream.peer_addr().unwrap();
                assert_eq!(peer.port(), port);
            }
            other => panic!("expected Connected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_port_is_refused_promptly() {
        // Bind to grab a free port, then drop the listener so nothing
        // is accepting there.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint = loopback_endpoint(port).await;
        let start = Instant::now();
        match connect_with_timeout(&endpoint, Duration::from_secs(5)).await {
            Outcome::Refused(_) => {}
            other => panic!("expected Refused, got {other:?}"),
        }
        // Well under the timeout: refusal must not be reported as a
        // timeout.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    // Needs a black-holed route (reserved range, no RST, no SYN-ACK),
    // which CI networks do not guarantee.
    #[tokio::test]
    #[ignore]
    async fn filtered_address_times_out_within_the_budget() {
        let endpoints = resolver::resolve("10.255.255.1", "9").await.unwrap();
        let endpoint = endpoints.into_iter().next().unwrap();

        let budget = Duration::from_secs(1);
        let start = Instant::now();
        match connect_with_timeout(&endpoint, budget).await {
            Outcome::TimedOut => {}
            other => panic!("expected TimedOut, got {other:?}"),
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= budget);
        assert!(elapsed < budget + Duration::from_secs(2));
    }
}
