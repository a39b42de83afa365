use std::io::Write;
use std::sync::Arc;

use anyhow::anyhow;
use feedscope_core::{FormField, QueueKind, refresh_channel};
use serde_json::json;

use crate::cli::{AddArgs, AskArgs, OutputFormat, ProductIdArgs, RemoveArgs};
use crate::client::{CliError, CliResult};
use crate::commands::AppContext;
use crate::output::{
    render_message, render_product, render_product_list, render_whoami, write_line,
};
use crate::prompt::{AssumeYes, Confirm};
use crate::views::{ActionOutcome, Dashboard, ProductFormView, ProductListView, SubmitOutcome};

pub(crate) async fn handle_list(ctx: &AppContext, out: &mut impl Write) -> CliResult<()> {
    let mut dashboard = Dashboard::new(ctx.api.clone(), ctx.toasts.clone(), Arc::new(AssumeYes));
    let loaded = dashboard.mount().await;
    render_product_list(out, &dashboard.list().snapshot(), ctx.output)?;
    loaded.map(|_| ()).map_err(CliError::from)
}

pub(crate) async fn handle_add(
    ctx: &AppContext,
    args: AddArgs,
    out: &mut impl Write,
) -> CliResult<()> {
    let (trigger, _listener) = refresh_channel();
    let form = ProductFormView::new(ctx.api.clone(), ctx.toasts.clone(), trigger);
    form.set(FormField::Name, args.name);
    form.set(FormField::SearchQuery, args.search_query.unwrap_or_default());
    form.set(FormField::YoutubeKeywords, args.youtube_keywords);
    form.set(FormField::RedditSubreddits, args.reddit_subreddits);

    match form.submit().await {
        SubmitOutcome::Created(product) => render_product(out, &product, ctx.output),
        SubmitOutcome::Rejected(err) => Err(CliError::validation(err.to_string())),
        SubmitOutcome::Failed(err) => Err(CliError::from(err)),
    }
}

pub(crate) async fn handle_remove(
    ctx: &AppContext,
    args: RemoveArgs,
    confirm: Arc<dyn Confirm>,
    out: &mut impl Write,
) -> CliResult<()> {
    let mut dashboard = Dashboard::new(ctx.api.clone(), ctx.toasts.clone(), confirm);
    if let Err(err) = dashboard.mount().await {
        tracing::warn!(product_id = args.id, error = %err, "product list unavailable");
    }
    settle(dashboard.list().delete(args.id).await, out, ctx.output)
}

pub(crate) async fn handle_queue(
    ctx: &AppContext,
    args: ProductIdArgs,
    kind: QueueKind,
    out: &mut impl Write,
) -> CliResult<()> {
    let (trigger, _listener) = refresh_channel();
    let list = ProductListView::new(
        ctx.api.clone(),
        ctx.toasts.clone(),
        trigger,
        Arc::new(AssumeYes),
    );
    settle(list.queue_job(args.id, kind).await, out, ctx.output)
}

fn settle(outcome: ActionOutcome, out: &mut impl Write, format: OutputFormat) -> CliResult<()> {
    match outcome {
        ActionOutcome::Completed(message) => render_message(out, &message, format),
        ActionOutcome::Cancelled => render_message(out, "Delete cancelled.", format),
        ActionOutcome::Failed(err) => Err(CliError::from(err)),
        ActionOutcome::Rejected(rejected) => Err(CliError::validation(rejected.to_string())),
    }
}

pub(crate) async fn handle_ask(
    ctx: &AppContext,
    args: AskArgs,
    out: &mut impl Write,
) -> CliResult<()> {
    let question = args.question.trim();
    if question.is_empty() {
        return Err(CliError::validation("question must not be empty"));
    }

    let mut stream = ctx
        .api
        .ask(args.id, question)
        .await
        .map_err(CliError::from)?;
    let mut answer = String::new();
    while let Some(chunk) = stream.next_chunk().await {
        let chunk = chunk.map_err(CliError::from)?;
        if matches!(ctx.output, OutputFormat::Table) {
            write!(out, "{chunk}")
                .and_then(|()| out.flush())
                .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))?;
        }
        answer.push_str(&chunk);
    }

    match ctx.output {
        OutputFormat::Table => write_line(out, ""),
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&json!({
                "product_id": args.id,
                "question": question,
                "answer": answer,
            }))
            .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            write_line(out, &text)
        }
    }
}

pub(crate) async fn handle_whoami(ctx: &AppContext, out: &mut impl Write) -> CliResult<()> {
    let signed_in = ctx.api.signed_in().await.map_err(CliError::from)?;
    render_whoami(out, ctx.api_url.as_str(), signed_in, ctx.output)
}
