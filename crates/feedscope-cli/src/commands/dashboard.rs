//! Interactive dashboard shell.
//!
//! Mounts the dashboard once, then reads one command per line. After every command the
//! settled notifications are printed and, when the refresh signal moved, the list is fetched
//! again and re-rendered.

use std::io::Write;
use std::sync::Arc;

use anyhow::anyhow;
use feedscope_core::FormField;
use tokio::io::{AsyncBufRead, BufReader};

use crate::client::{CliError, CliResult};
use crate::commands::AppContext;
use crate::output::{format_toast, render_product_list, write_line};
use crate::prompt::{LineConfirm, SharedLines, shared_lines};
use crate::views::{ActionOutcome, Dashboard, SubmitOutcome};

const HELP: &str =
    "commands: ls | refresh | add | ingest <id> | report <id> | rm <id> | help | quit";

/// Parsed shell input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ShellCommand {
    List,
    Refresh,
    Add,
    Ingest(i64),
    Report(i64),
    Remove(i64),
    Help,
    Quit,
}

pub(crate) fn parse_shell_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "ls" | "list" => ShellCommand::List,
        "refresh" => ShellCommand::Refresh,
        "add" => ShellCommand::Add,
        "ingest" | "scrape" => ShellCommand::Ingest(product_id(verb, words.next())?),
        "report" => ShellCommand::Report(product_id(verb, words.next())?),
        "rm" | "delete" => ShellCommand::Remove(product_id(verb, words.next())?),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{other}' ({HELP})")),
    };
    if words.next().is_some() {
        return Err(format!("too many arguments for '{verb}'"));
    }
    Ok(Some(command))
}

fn product_id(verb: &str, raw: Option<&str>) -> Result<i64, String> {
    let raw = raw.ok_or_else(|| format!("usage: {verb} <id>"))?;
    raw.parse()
        .map_err(|_| format!("invalid product id '{raw}'"))
}

pub(crate) async fn handle_dashboard(ctx: &AppContext, out: &mut impl Write) -> CliResult<()> {
    let lines = shared_lines(BufReader::new(tokio::io::stdin()));
    run_shell(ctx, lines, out).await
}

pub(crate) async fn run_shell<R, W>(
    ctx: &AppContext,
    lines: SharedLines<R>,
    out: &mut W,
) -> CliResult<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: Write,
{
    let confirm = Arc::new(LineConfirm::new(Arc::clone(&lines)));
    let mut dashboard = Dashboard::new(ctx.api.clone(), ctx.toasts.clone(), confirm);
    if let Err(err) = dashboard.mount().await {
        tracing::debug!(error = %err, "initial load failed");
    }
    flush_toasts(ctx, out)?;
    render_product_list(out, &dashboard.list().snapshot(), ctx.output)?;
    write_line(out, HELP)?;

    loop {
        let Some(line) = read_line(&lines, out, "> ").await? else {
            break;
        };
        match parse_shell_command(&line) {
            Ok(None) => continue,
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(ShellCommand::Help)) => write_line(out, HELP)?,
            Ok(Some(ShellCommand::List)) => {
                render_product_list(out, &dashboard.list().snapshot(), ctx.output)?;
            }
            Ok(Some(command)) => execute(&dashboard, command, &lines, out).await?,
            Err(message) => write_line(out, &message)?,
        }

        flush_toasts(ctx, out)?;
        if dashboard.sync().await.is_some() {
            flush_toasts(ctx, out)?;
            render_product_list(out, &dashboard.list().snapshot(), ctx.output)?;
        }
    }
    Ok(())
}

async fn execute<R, W>(
    dashboard: &Dashboard,
    command: ShellCommand,
    lines: &SharedLines<R>,
    out: &mut W,
) -> CliResult<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write,
{
    let outcome = match command {
        ShellCommand::Refresh => {
            dashboard.request_refresh();
            return Ok(());
        }
        ShellCommand::Add => return add_product(dashboard, lines, out).await,
        ShellCommand::Ingest(id) => dashboard.list().scrape(id).await,
        ShellCommand::Report(id) => dashboard.list().report(id).await,
        ShellCommand::Remove(id) => dashboard.list().delete(id).await,
        ShellCommand::List | ShellCommand::Help | ShellCommand::Quit => return Ok(()),
    };
    match outcome {
        ActionOutcome::Cancelled => write_line(out, "Delete cancelled."),
        ActionOutcome::Rejected(rejected) => write_line(out, &rejected.to_string()),
        ActionOutcome::Completed(_) | ActionOutcome::Failed(_) => Ok(()),
    }
}

async fn add_product<R, W>(
    dashboard: &Dashboard,
    lines: &SharedLines<R>,
    out: &mut W,
) -> CliResult<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write,
{
    let form = dashboard.form();
    let kept = form.snapshot();
    if FormField::ALL.iter().any(|field| !kept.get(*field).is_empty()) {
        write_line(out, "Press enter to keep the value shown in brackets.")?;
    }
    for field in FormField::ALL {
        let current = kept.get(field);
        let prompt = match (current.is_empty(), field.required()) {
            (false, _) => format!("{} [{current}]: ", field.label()),
            (true, true) => format!("{}: ", field.label()),
            (true, false) => format!("{} (optional): ", field.label()),
        };
        let Some(value) = read_line(lines, out, &prompt).await? else {
            return write_line(out, "Add cancelled.");
        };
        let keep = value.trim().is_empty() && !current.is_empty();
        if !keep {
            form.set(field, value);
        }
    }

    match form.submit().await {
        SubmitOutcome::Created(_) => Ok(()),
        SubmitOutcome::Rejected(err) => write_line(out, &err.to_string()),
        SubmitOutcome::Failed(_) => match form.snapshot().error() {
            Some(message) => write_line(out, &format!("Error: {message}")),
            None => Ok(()),
        },
    }
}

async fn read_line<R, W>(
    lines: &SharedLines<R>,
    out: &mut W,
    prompt: &str,
) -> CliResult<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{prompt}")
        .and_then(|()| out.flush())
        .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))?;
    let next = lines.lock().await.next_line().await;
    next.map_err(|err| CliError::failure(anyhow!("failed to read input: {err}")))
}

fn flush_toasts(ctx: &AppContext, out: &mut impl Write) -> CliResult<()> {
    for toast in ctx.toasts.drain_settled() {
        write_line(out, &format_toast(&toast))?;
    }
    Ok(())
}
