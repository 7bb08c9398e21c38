//! Request command implementation.

use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::Value;

use paykit_core::{ApiRequest, Method};
use paykit_http::AuthenticatedClient;

use crate::output;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: Method,

    /// Path relative to the API URL (e.g., /transactions)
    pub path: String,

    /// Inline JSON request body
    #[arg(long, conflicts_with = "json_file")]
    pub json: Option<String>,

    /// JSON file with the request body (use - for stdin)
    #[arg(long)]
    pub json_file: Option<String>,

    /// Extra header as NAME:VALUE (repeatable)
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,

    /// Query parameter as KEY=VALUE (repeatable)
    #[arg(long = "query", short = 'q')]
    pub query: Vec<String>,
}

pub async fn run(args: RequestArgs, client: &AuthenticatedClient) -> Result<()> {
    let mut request = ApiRequest::new(args.method, &args.path);

    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.header(name, value);
    }
    for raw in &args.query {
        let (key, value) = parse_query(raw)?;
        request = request.query(key, value);
    }
    if let Some(body) = read_body(&args)? {
        request = request.json_value(body);
    }

    let response = client.request(request).await.context("Request failed")?;

    output::body(&response)
}

fn read_body(args: &RequestArgs) -> Result<Option<Value>> {
    if let Some(ref inline) = args.json {
        return Ok(Some(
            serde_json::from_str(inline).context("Invalid JSON in --json")?,
        ));
    }

    let Some(ref path) = args.json_file else {
        return Ok(None);
    };

    let content = if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).context("Failed to read JSON file")?
    };

    Ok(Some(
        serde_json::from_str(&content).context("Invalid JSON in body file")?,
    ))
}

fn parse_header(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => bail!("Invalid header '{}': expected NAME:VALUE", raw),
    }
}

fn parse_query(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => bail!("Invalid query parameter '{}': expected KEY=VALUE", raw),
    }
}
