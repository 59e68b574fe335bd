use std::fmt::Write as _;

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use wai_core::{GraphApi, HistoryPage, HistoryRequest, ReqwestGraphApi, parse_history};

use crate::config::HistoryArgs;
use crate::now_millis;

/// Runs the `history` subcommand and prints the page to stdout.
pub async fn run(args: HistoryArgs) -> Result<()> {
    let query = HistoryRequest {
        access_token: Some(args.access_token),
        phone_number_id: Some(args.phone_number_id),
        limit: args.limit.map(serde_json::Number::from),
        cursor: args.cursor,
        before: args.before,
    }
    .validate()
    .map_err(|err| anyhow::anyhow!("{err}: {}", serde_json::to_string(&err).unwrap_or_default()))?;

    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let graph = ReqwestGraphApi::new(client, Some(&args.api_base))?;
    let response = graph.fetch_messages(&query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render_page(&parse_history(&response, now_millis())));
    }
    Ok(())
}

/// One line per message followed by the paging cursors.
pub fn render_page(page: &HistoryPage) -> String {
    let mut out = String::new();
    if page.messages.is_empty() {
        out.push_str("No messages\n");
    }
    for message in &page.messages {
        let _ = writeln!(
            out,
            "{}  {:<12} {:<10} {}",
            format_millis(message.timestamp_millis),
            message.from.as_deref().unwrap_or("-"),
            message.kind,
            message.text.as_deref().unwrap_or(""),
        );
    }
    if let Some(after) = &page.cursors.after {
        let _ = writeln!(out, "next cursor (--cursor): {after}");
    }
    if let Some(before) = &page.cursors.before {
        let _ = writeln!(out, "previous cursor (--before): {before}");
    }
    out
}

fn format_millis(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|ts| ts.format(&Rfc3339).ok())
        .unwrap_or_else(|| millis.to_string())
}
