use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use log::{error, info, trace, warn};
use std::{
    io::{self, Read, Write},
    net::{Ipv4Addr, Shutdown, SocketAddr, TcpListener, TcpStream},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{
    config::ServerConfig,
    error::ApiError,
    http::{HttpRequest, HttpResponse},
    router::Router,
    thread_pool::ThreadPool,
};

pub struct WebServer {
    pub address: SocketAddr,
    router: Arc<Router>,
    listener: TcpListener,
    pool: ThreadPool,
    io_timeout: Duration,
    shutdown: Arc<AtomicBool>,
}

/// Unread request bytes discarded before closing, so the peer gets a FIN
/// rather than a reset.
const DRAIN_LIMIT: u64 = 64 * 1024;

/// Stops a running [`WebServer`] from another thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    address: SocketAddr,
    shutdown: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);

        // The accept loop only looks at the flag once a connection arrives.
        let mut wake_address = self.address;
        if wake_address.ip().is_unspecified() {
            wake_address.set_ip(Ipv4Addr::LOCALHOST.into());
        }
        TcpStream::connect(wake_address)
            .with_context(|| format!("failed to wake server on {wake_address}"))?;
        Ok(())
    }
}

impl WebServer {
    pub fn bind(config: &ServerConfig, router: Router) -> Result<Self> {
        let listener = TcpListener::bind(&config.address)
            .with_context(|| format!("failed to bind {}", config.address))?;
        let address = listener.local_addr()?;
        let pool = ThreadPool::new(config.workers)?;

        Ok(WebServer {
            address,
            router: Arc::new(router),
            listener,
            pool,
            io_timeout: config.io_timeout,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            address: self.address,
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Accepts connections until [`ShutdownHandle::shutdown`] is called.
    /// In-flight requests are finished before this returns.
    pub fn run(self) -> Result<()> {
        info!(
            "server started on {} with {} workers",
            self.address,
            self.pool.size()
        );
        info!("awaiting connections...");

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("failed to accept connection: {e}");
                    continue;
                }
            };
            trace!("got new tcp connection!");

            let router = Arc::clone(&self.router);
            let io_timeout = self.io_timeout;
            self.pool.execute(move || {
                if let Err(e) = handle_connection(&router, stream, io_timeout) {
                    error!("error: {e:#}");
                }
            })?;
        }

        info!("server on {} stopped", self.address);
        Ok(())
    }
}

fn handle_connection(
    router: &Router,
    mut stream: TcpStream,
    io_timeout: Duration,
) -> Result<()> {
    stream.set_read_timeout(Some(io_timeout))?;
    stream.set_write_timeout(Some(io_timeout))?;

    let response = match HttpRequest::from_tcp(&stream) {
        Ok(request) => {
            trace!("{}", dump_request(&request));
            let response = router.handle_request(&request);
            info!(
                "{} {} {} -> {}",
                request.peer_ip,
                request.method,
                request.resource_path,
                colored_status(&response)
            );
            response
        }
        Err(e) => {
            warn!("malformed request: {e:#}");
            let response = ApiError::BadRequest("Malformed HTTP request".to_owned()).into_response();
            info!("{} -> {}", peer_of(&stream), colored_status(&response));
            response
        }
    };

    stream.write_all(&response.to_bytes()?)?;
    stream.flush()?;
    close_gracefully(&stream);
    Ok(())
}

/// Half-closes the socket, then discards whatever the peer still sends.
/// Closing with unread input would reset the connection and could drop the
/// response before the client reads it.
fn close_gracefully(stream: &TcpStream) {
    if let Err(e) = stream.shutdown(Shutdown::Write) {
        trace!("shutdown failed: {e}");
        return;
    }

    let mut unread = stream.take(DRAIN_LIMIT);
    if let Err(e) = io::copy(&mut unread, &mut io::sink()) {
        trace!("stopped draining connection: {e}");
    }
}

fn dump_request(request: &HttpRequest) -> String {
    let mut request_dbg = String::new();
    request_dbg.push_str("\r\n>>> Request START <<<\r\n");
    request_dbg.push_str(&format!(
        "{} {} {}\r\n",
        request.method, request.resource_path, request.version,
    ));

    request_dbg.push_str(">>> HEADERS <<<\r\n");
    for header in request.headers.values() {
        request_dbg.push_str(&format!("{}: {}\r\n", header.name, header.value));
    }

    if !request.body.is_empty() {
        request_dbg.push_str(">>> BODY <<<\r\n");
        match request.get_str_body() {
            Ok(value) => request_dbg.push_str(&format!("::TEXT DATA::\r\n{}\r\n", value)),
            Err(_) => request_dbg.push_str("::BINARY DATA::\r\n"),
        }
    }

    request_dbg.push_str(">>> Request END <<<\r\n");
    request_dbg
}

fn peer_of(stream: &TcpStream) -> String {
    stream
        .peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "unknown peer".to_owned())
}

fn colored_status(response: &HttpResponse) -> ColoredString {
    let status = response.status.to_string();
    match response.status.code() {
        200..=299 => status.green(),
        400..=499 => status.yellow(),
        _ => status.red(),
    }
}
