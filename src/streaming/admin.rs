//! TCP admin endpoint
//!
//! Accepts length-prefixed [`AdminRequest`]s, forwards each one to the
//! acquisition loop over the admin channel and writes back the
//! [`AdminResponse`]. The loop owns the device, so requests are executed
//! between ticks and never concurrently with polling.
//!
//! # Connection Lifecycle
//!
//! ```text
//! 1. Client connects to the admin address
//! 2. Server reads one request frame
//! 3. Request is queued for the loop, server waits for the reply
//! 4. Reply frame is written back
//! 5. Repeat from 2 until the client disconnects
//! ```
//!
//! Clients are served one at a time on the admin thread. A read timeout
//! lets the thread notice shutdown while a client is idle.

use crate::core::admin::{AdminCommand, AdminRequest, AdminResponse, AdminSender};
use crate::error::{Error, Result};
use crate::streaming::wire::Serializer;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Poll interval of the accept loop and read timeout on client sockets
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long a client waits for the loop to service its request
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Background TCP server for admin requests
pub struct AdminServer {
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AdminServer {
    /// Bind `bind_address` and serve requests on a background thread
    pub fn start(
        bind_address: &str,
        serializer: Serializer,
        requests: AdminSender,
    ) -> Result<Self> {
        let listener = TcpListener::bind(bind_address)
            .map_err(|e| Error::Other(format!("Failed to bind to {}: {}", bind_address, e)))?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("admin-server".to_string())
            .spawn(move || accept_loop(listener, serializer, requests, shutdown_clone))
            .map_err(|e| Error::Other(format!("Failed to spawn admin server: {}", e)))?;

        log::info!("Admin server listening on {}", local_addr);

        Ok(Self {
            local_addr,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl Drop for AdminServer {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn accept_loop(
    listener: TcpListener,
    serializer: Serializer,
    requests: AdminSender,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                log::info!("Admin client connected: {}", addr);
                if let Err(e) = serve_client(stream, &serializer, &requests, &shutdown) {
                    log::warn!("Admin client {} error: {}", addr, e);
                }
                log::info!("Admin client disconnected: {}", addr);
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                log::error!("Error accepting admin connection: {}", e);
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
    log::info!("Admin server stopped");
}

fn serve_client(
    mut stream: TcpStream,
    serializer: &Serializer,
    requests: &AdminSender,
    shutdown: &AtomicBool,
) -> Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(POLL_INTERVAL))?;

    let mut buffer = Vec::with_capacity(64);
    while !shutdown.load(Ordering::Relaxed) {
        let request = match serializer.read_message::<AdminRequest, _>(&mut stream, &mut buffer) {
            Ok(request) => request,
            Err(Error::Io(ref e))
                if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(Error::Io(ref e))
                if e.kind() == ErrorKind::UnexpectedEof
                    || e.kind() == ErrorKind::ConnectionReset =>
            {
                return Ok(());
            }
            Err(Error::Serialization(msg)) => {
                log::warn!("Malformed admin request: {}", msg);
                serializer.write_message(&mut stream, &AdminResponse::Error(msg))?;
                continue;
            }
            Err(e) => return Err(e),
        };

        log::info!("Admin request: {:?}", request);
        let response = dispatch(request, requests);
        serializer.write_message(&mut stream, &response)?;
    }

    let _ = stream.shutdown(Shutdown::Both);
    Ok(())
}

/// Hand a request to the loop and wait for its answer
fn dispatch(request: AdminRequest, requests: &AdminSender) -> AdminResponse {
    let (command, reply) = AdminCommand::with_reply(request);
    if requests.send(command).is_err() {
        return AdminResponse::Error("acquisition loop not running".to_string());
    }
    match reply.recv_timeout(REPLY_TIMEOUT) {
        Ok(response) => response,
        Err(_) => AdminResponse::Error("acquisition loop did not reply".to_string()),
    }
}

/// Send one request to an admin server and wait for the response
pub fn request(
    address: SocketAddr,
    serializer: &Serializer,
    request: AdminRequest,
) -> Result<AdminResponse> {
    let mut stream = TcpStream::connect(address)?;
    stream.set_read_timeout(Some(REPLY_TIMEOUT + Duration::from_secs(1)))?;
    serializer.write_message(&mut stream, &request)?;
    let mut buffer = Vec::new();
    serializer.read_message(&mut stream, &mut buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::admin::admin_channel;
    use crate::streaming::wire::WireFormat;

    #[test]
    fn test_request_is_forwarded_and_answered() {
        let serializer = Serializer::new(WireFormat::Json);
        let (tx, rx) = admin_channel();
        let server = AdminServer::start("127.0.0.1:0", serializer, tx).unwrap();

        // Stand-in for the acquisition loop
        let responder = thread::spawn(move || {
            let command = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(command.request, AdminRequest::ResetFilter);
            command.respond(AdminResponse::Ok);
        });

        let response = request(server.local_addr(), &serializer, AdminRequest::ResetFilter).unwrap();
        assert_eq!(response, AdminResponse::Ok);
        responder.join().unwrap();
    }

    #[test]
    fn test_loop_gone_reports_error() {
        let serializer = Serializer::new(WireFormat::Postcard);
        let (tx, rx) = admin_channel();
        drop(rx);
        let server = AdminServer::start("127.0.0.1:0", serializer, tx).unwrap();

        let response = request(server.local_addr(), &serializer, AdminRequest::ResetFilter).unwrap();
        assert!(matches!(response, AdminResponse::Error(_)));
    }

    #[test]
    fn test_bind_failure() {
        let (tx, _rx) = admin_channel();
        let result = AdminServer::start("256.0.0.1:0", Serializer::new(WireFormat::Json), tx);
        assert!(result.is_err());
    }
}
