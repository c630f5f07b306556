//! Server lifecycle management.

use crate::log;
use anyhow::{Context, Result, anyhow};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;
use tokio::sync::watch;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let Some(port) = base_port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "failed to bind {} after {} attempts starting at port {}: {}",
        interface,
        MAX_PORT_RETRIES,
        base_port,
        last_error.map_or_else(|| "no port available".to_string(), |e| e.to_string())
    ))
}

/// Install the Ctrl+C handler.
///
/// On signal: the watch loop is told to stop and the server is unblocked so
/// the request loop returns.
pub fn install_shutdown_handler(server: Arc<Server>, shutdown_tx: watch::Sender<bool>) -> Result<()> {
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(true);
        server.unblock();
    })
    .context("failed to install Ctrl+C handler")
}

/// Wait for the watch loop to finish (max 2 seconds).
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
    log!("serve"; "watch loop still busy, exiting anyway");
}
