//! HTTP response handlers.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime::{self, HTML, PLAIN};

/// Custom not-found page inside the output tree.
const NOT_FOUND_PAGE: &str = "404.html";

/// Respond with a file, streamed from disk. Returns the status sent.
///
/// A file that disappears before it can be opened (e.g. mid-rebuild) is a 404.
pub fn respond_file(request: Request, path: &Path, output_root: &Path) -> io::Result<u16> {
    let Ok(file) = File::open(path) else {
        return respond_not_found(request, output_root);
    };
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        send_head(request, 200, content_type)?;
        return Ok(200);
    }

    request.respond(with_content_type(Response::from_file(file), content_type))?;
    Ok(200)
}

/// Respond with 404: `<output>/404.html` when present, plain text otherwise.
pub fn respond_not_found(request: Request, output_root: &Path) -> io::Result<u16> {
    let custom = File::open(output_root.join(NOT_FOUND_PAGE)).ok();
    let content_type = if custom.is_some() { HTML } else { PLAIN };

    if is_head_request(&request) {
        send_head(request, 404, content_type)?;
        return Ok(404);
    }

    match custom {
        Some(file) => send(request, 404, content_type, Response::from_file(file))?,
        None => send(
            request,
            404,
            content_type,
            Response::from_string("404 Not Found"),
        )?,
    }
    Ok(404)
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> io::Result<()> {
    request.respond(with_content_type(
        Response::empty(StatusCode(status)),
        content_type,
    ))
}

fn send<R: Read>(
    request: Request,
    status: u16,
    content_type: &'static str,
    response: Response<R>,
) -> io::Result<()> {
    request.respond(with_content_type(
        response.with_status_code(StatusCode(status)),
        content_type,
    ))
}

fn with_content_type<R: Read>(mut response: Response<R>, content_type: &'static str) -> Response<R> {
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        response.add_header(header);
    }
    response
}
