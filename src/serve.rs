//! HTTP server for previewing a report directory
//!
//! `stagegraph serve ./report` → starts server, opens browser, shows the
//! stage graph. The page is rendered from the directory's summary on every
//! request, and the detail pages it links to are served as static files,
//! so relative links behave as they do once the report is published.

use crate::config::{ReportConfig, ReportKind};
use crate::error::Result;
use crate::graph::build_report_graph;
use crate::report;
use crate::summary::{StatusRule, ValidationSummary};
use serde::Deserialize;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, warn};

#[derive(Deserialize, Debug, Default)]
pub struct PreviewParams {
    #[serde(default)]
    pub kind: Option<ReportKind>,
    #[serde(default)]
    pub status_rule: Option<StatusRule>,
}

/// What the server renders from
#[derive(Debug, Clone)]
pub struct PreviewSource {
    pub dir: PathBuf,
    pub summary_name: String,
    pub config: ReportConfig,
}

/// Start server, open browser, serve the report
pub fn start(port: u16, source: PreviewSource) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let url = format!("http://localhost:{}", port);
    let dir_str = source.dir.canonicalize().unwrap_or(source.dir.clone()).display().to_string();

    eprintln!("\n\x1b[1;32mstagegraph preview\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   Serving: {}\n", dir_str);

    // Open browser
    let _ = open::that(&url);

    // Handle requests
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &source) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

fn handle_request(request: Request, source: &PreviewSource) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/").to_string();
    let query = url.split('?').nth(1).unwrap_or("");
    debug!(method = %request.method(), %path, "request");

    if request.method() != &Method::Get {
        let response = Response::from_string("Method not allowed").with_status_code(405);
        return request.respond(response);
    }

    match path.as_str() {
        // Rendered stage graph
        "/" | "/index.html" => match render(source, query, "html") {
            Ok(body) => request.respond(Response::from_data(body).with_header(content_type("text/html"))),
            Err(e) => respond_error(request, &e),
        },

        // Graph description
        "/graph.json" => match render(source, query, "json") {
            Ok(body) => request.respond(
                Response::from_data(body).with_header(content_type("application/json")),
            ),
            Err(e) => respond_error(request, &e),
        },

        // Detail pages and their assets
        _ => match resolve_static(&source.dir, &path) {
            Some(file) if file.is_file() => request.respond(static_response(&file)),
            _ => {
                let response = Response::from_string("Not found").with_status_code(404);
                request.respond(response)
            }
        },
    }
}

fn render(source: &PreviewSource, query: &str, format: &str) -> Result<Vec<u8>> {
    let params = parse_params(query);
    let mut config = source.config.clone();
    if let Some(kind) = params.kind {
        config.kind = kind;
    }
    if let Some(rule) = params.status_rule {
        config.status_rule = rule;
    }

    let summary = ValidationSummary::load(source.dir.join(&source.summary_name))?;
    let graph = build_report_graph(&summary, &config)?;

    let mut body = Vec::new();
    match format {
        "json" => report::json::write(&mut body, &graph)?,
        _ => report::html::write(&mut body, &graph, &config)?,
    }
    Ok(body)
}

fn parse_params(query: &str) -> PreviewParams {
    if query.is_empty() {
        return PreviewParams::default();
    }
    serde_urlencoded::from_str(query).unwrap_or_else(|e| {
        warn!(%query, "ignoring preview parameters: {}", e);
        PreviewParams::default()
    })
}

fn respond_error(request: Request, err: &crate::error::Error) -> std::io::Result<()> {
    eprintln!("Render error: {}", err);
    request.respond(error_response(err))
}

fn error_response(err: &crate::error::Error) -> Response<Cursor<Vec<u8>>> {
    Response::from_string(err.to_string()).with_status_code(500)
}

/// File contents, or a 500 when the file cannot be read
fn static_response(file: &Path) -> Response<Cursor<Vec<u8>>> {
    match std::fs::read(file) {
        Ok(body) => Response::from_data(body).with_header(content_type(mime_for(file))),
        Err(e) => {
            warn!(path = %file.display(), "failed to read static file: {}", e);
            error_response(&crate::error::Error::from(e))
        }
    }
}

/// Map a URL path onto a file below `root`, refusing anything that climbs out
fn resolve_static(root: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = Path::new(url_path.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if resolved.is_dir() {
        resolved.push("index.html");
    }
    Some(resolved)
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "html" | "htm" => "text/html",
        "js" => "application/javascript",
        "css" => "text/css",
        "json" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "yaml" | "yml" | "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

fn content_type(mime: &str) -> Header {
    // Both halves are ASCII literals
    Header::from_bytes(&b"Content-Type"[..], mime.as_bytes()).unwrap()
}
