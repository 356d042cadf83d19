use crate::commands::service::ShotService;
use crate::error::CoreResult;
use crate::models::distribution::Distribution;
use crate::models::trend::{TrendAnalysis, ZoneTrend};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// One query against the service, from the command line or a `serve` session.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Zone and spatial summary for one season
    Distribution { year: i32 },
    /// Per-zone frequency and percentage series across all seasons
    Trends,
    /// Regressions and forecasts over the trend series
    Analysis,
    /// List seasons with backing data
    Years,
}

#[derive(Parser)]
#[command(name = "request", no_binary_name = true, disable_help_subcommand = true)]
struct RequestLine {
    #[command(subcommand)]
    request: Request,
}

/// Parse a `serve` input line such as `distribution 2019`.
pub fn parse_request(line: &str) -> Result<Request, String> {
    RequestLine::try_parse_from(line.split_whitespace())
        .map(|parsed| parsed.request)
        .map_err(|e| {
            let rendered = e.to_string();
            rendered
                .lines()
                .next()
                .unwrap_or("invalid request")
                .trim_start_matches("error: ")
                .to_string()
        })
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Distribution(Distribution),
    Trends(Vec<ZoneTrend>),
    Analysis(TrendAnalysis),
    Years(Vec<i32>),
}

pub async fn handle(service: &ShotService, request: &Request) -> CoreResult<Response> {
    let response = match *request {
        Request::Distribution { year } => {
            Response::Distribution(Arc::unwrap_or_clone(service.get_distribution(year).await?))
        }
        Request::Trends => Response::Trends(service.get_trends().await?),
        Request::Analysis => Response::Analysis(service.get_trend_analysis().await?),
        Request::Years => Response::Years(service.available_years().await?),
    };
    Ok(response)
}

/// Answer one request per input line with one JSON line, until EOF or `quit`.
///
/// Failures become `{"error", "clientError"}` lines; the session keeps going.
/// Returns the number of requests answered.
pub async fn serve<R, W>(service: &ShotService, input: R, mut output: W) -> Result<usize, String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut answered = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| format!("Failed to read request: {e}"))?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }

        let mut reply = match parse_request(line) {
            Ok(request) => match handle(service, &request).await {
                Ok(response) => serde_json::to_string(&response).unwrap_or_else(|e| {
                    error_reply(&format!("Failed to serialize response: {e}"), false)
                }),
                Err(e) => {
                    log::debug!("Request `{line}` failed: {e}");
                    error_reply(&e.to_string(), e.is_client_error())
                }
            },
            Err(reason) => error_reply(&reason, true),
        };
        reply.push('\n');

        output
            .write_all(reply.as_bytes())
            .await
            .map_err(|e| format!("Failed to write response: {e}"))?;
        output
            .flush()
            .await
            .map_err(|e| format!("Failed to write response: {e}"))?;
        answered += 1;
    }

    service.flush().await;
    log::info!("Serve session closed after {answered} requests");
    Ok(answered)
}

fn error_reply(message: &str, client_error: bool) -> String {
    json!({ "error": message, "clientError": client_error }).to_string()
}
