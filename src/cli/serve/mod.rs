//! `arrow serve`: development server with watch-and-rebuild.
//!
//! Startup order: the watcher registers first so edits made during the
//! initial build are not lost, then the site is built, then the server binds.

mod lifecycle;
mod path;
mod response;

use anyhow::{Context, Result};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use tiny_http::{Request, Server};
use tokio::sync::watch;

use crate::build::{BuildOptions, build_site, error_chain};
use crate::config::{Config, Workspace};
use crate::watch::SourceWatcher;
use crate::{debug, log, logger};

/// Threads answering HTTP requests.
const REQUEST_THREADS: usize = 4;

pub fn run(
    config: &Config,
    workspace: &Workspace,
    interface: Option<IpAddr>,
    port: Option<u16>,
) -> Result<()> {
    let source = SourceWatcher::start(&workspace.source)
        .with_context(|| format!("cannot watch `{}`", workspace.source.display()))?;
    debug!("watch"; "watching {} directories", source.watched_dirs());

    super::build::run(config, workspace)?;

    let interface = interface.unwrap_or(config.serve.interface);
    let port = port.unwrap_or(config.serve.port);
    let (server, addr) = lifecycle::bind_with_retry(interface, port)?;
    let server = Arc::new(server);
    log!("serve"; "http://{}", addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let rebuild = rebuilder(workspace, BuildOptions::from_config(&config.build));
    let watch_handle = crate::watch::spawn(source, shutdown_rx, rebuild)
        .context("failed to start watch loop")?;

    lifecycle::install_shutdown_handler(Arc::clone(&server), shutdown_tx.clone())?;

    run_request_loop(&server, &workspace.output)?;

    let _ = shutdown_tx.send(true);
    lifecycle::wait_for_shutdown(watch_handle);
    Ok(())
}

/// Full rebuild reported through the watch status line.
fn rebuilder(workspace: &Workspace, options: BuildOptions) -> impl FnMut() + Send + 'static {
    let source = workspace.source.clone();
    let output = workspace.output.clone();

    move || match build_site(&source, &output, &options) {
        Ok(report) if report.is_clean() => logger::status_success(&report.summary()),
        Ok(report) => {
            logger::status_error(&report.summary(), &report.failure_detail(&source));
        }
        Err(e) => logger::status_error("rebuild failed", &error_chain(&e)),
    }
}

/// Answer requests until the server is unblocked.
fn run_request_loop(server: &Server, output: &Path) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .thread_name(|i| format!("arrow-http-{i}"))
        .build()
        .context("failed to create request pool")?;

    for request in server.incoming_requests() {
        let output = output.to_path_buf();
        pool.spawn(move || handle_request(request, &output));
    }
    Ok(())
}

fn handle_request(request: Request, output: &Path) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let result = match path::resolve_path(&url, output) {
        Some(file) => response::respond_file(request, &file, output),
        None => response::respond_not_found(request, output),
    };

    match result {
        Ok(status) => debug!("serve"; "{} {} -> {}", method, url, status),
        Err(e) => log!("serve"; "{} {}: {}", method, url, e),
    }
}
