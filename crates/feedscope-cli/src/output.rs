//! Output renderers and formatting helpers for CLI commands.

use std::io::Write;

use anyhow::anyhow;
use feedscope_api_models::{Product, ScraperConfig};
use feedscope_core::{Toast, ToastKind};
use serde::Serialize;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};
use crate::views::{ListSnapshot, RowSnapshot};

const EMPTY_LIST_MESSAGE: &str = "You haven't added any products yet.";

pub(crate) fn render_product_list(
    out: &mut impl Write,
    snapshot: &ListSnapshot,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let products: Vec<&Product> = match snapshot {
                ListSnapshot::Rows(rows) => rows.iter().map(|row| &row.product).collect(),
                _ => Vec::new(),
            };
            write_json(out, &products)
        }
        OutputFormat::Table => match snapshot {
            ListSnapshot::Loading => write_line(out, "Loading products..."),
            ListSnapshot::Error(message) => write_line(out, message),
            ListSnapshot::Empty => write_line(out, EMPTY_LIST_MESSAGE),
            ListSnapshot::Rows(rows) => {
                write_line(
                    out,
                    &format!("{:<40} {:<12} SOURCES", "PRODUCT", "STATUS"),
                )?;
                for row in rows {
                    write_line(out, &format_row(row))?;
                }
                Ok(())
            }
        },
    }
}

pub(crate) fn render_product(
    out: &mut impl Write,
    product: &Product,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, product),
        OutputFormat::Table => {
            write_line(out, &format!("id: {}", product.id))?;
            write_line(out, &format!("name: {}", product.name))?;
            if let Some(config) = &product.config {
                if let Some(query) = &config.search_query {
                    write_line(out, &format!("search query: {query}"))?;
                }
                write_line(
                    out,
                    &format!("youtube keywords: {}", config.youtube_keywords.join(", ")),
                )?;
                write_line(
                    out,
                    &format!("reddit subreddits: {}", config.reddit_subreddits.join(", ")),
                )?;
            }
            Ok(())
        }
    }
}

pub(crate) fn render_message(
    out: &mut impl Write,
    message: &str,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, &json!({ "message": message })),
        OutputFormat::Table => write_line(out, message),
    }
}

pub(crate) fn render_whoami(
    out: &mut impl Write,
    api_url: &str,
    signed_in: bool,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(
            out,
            &json!({ "api_url": api_url, "signed_in": signed_in }),
        ),
        OutputFormat::Table => {
            write_line(out, &format!("api: {api_url}"))?;
            write_line(
                out,
                if signed_in {
                    "signed in: yes"
                } else {
                    "signed in: no"
                },
            )
        }
    }
}

/// One-line rendering of a notification.
#[must_use]
pub(crate) fn format_toast(toast: &Toast) -> String {
    let tag = match toast.kind {
        ToastKind::Loading => "..",
        ToastKind::Success => "ok",
        ToastKind::Error => "error",
    };
    format!("[{tag}] {}", toast.message)
}

#[must_use]
pub(crate) fn format_row(row: &RowSnapshot) -> String {
    let product = &row.product;
    let status = row.active.map_or("idle", |kind| kind.progress_label());
    format!(
        "{:<40} {:<12} {}",
        format!("{} (ID: {})", product.name, product.id),
        status,
        format_sources(product.config.as_ref())
    )
}

#[must_use]
pub(crate) fn format_sources(config: Option<&ScraperConfig>) -> String {
    let Some(config) = config else {
        return "-".to_string();
    };
    let mut parts = Vec::new();
    if !config.youtube_keywords.is_empty() {
        parts.push(format!("youtube: {}", config.youtube_keywords.join(", ")));
    }
    if !config.reddit_subreddits.is_empty() {
        parts.push(format!("reddit: {}", config.reddit_subreddits.join(", ")));
    }
    if let Some(query) = &config.search_query {
        parts.push(format!("web: {query}"));
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" | ")
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    write_line(out, &text)
}

pub(crate) fn write_line(out: &mut impl Write, line: &str) -> CliResult<()> {
    writeln!(out, "{line}")
        .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))
}
