//! Yes/no confirmation prompts.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::Mutex;

/// Asks the user to approve a destructive action.
#[async_trait]
pub(crate) trait Confirm: Send + Sync {
    /// Show `prompt` and return whether the user agreed.
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Approves everything (`--yes`).
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AssumeYes;

#[async_trait]
impl Confirm for AssumeYes {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Line-oriented input shared between a command loop and its prompts.
pub(crate) type SharedLines<R> = Arc<Mutex<Lines<R>>>;

/// Reads the answer from a line source. Anything other than `y`/`yes` declines,
/// including end of input.
pub(crate) struct LineConfirm<R> {
    lines: SharedLines<R>,
}

impl<R> LineConfirm<R> {
    pub(crate) const fn new(lines: SharedLines<R>) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl<R> Confirm for LineConfirm<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        let _ = std::io::stderr().flush();
        let answer = self.lines.lock().await.next_line().await;
        match answer {
            Ok(Some(line)) => is_affirmative(&line),
            Ok(None) | Err(_) => false,
        }
    }
}

/// Whether an answer counts as a yes.
pub(crate) fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Wrap a reader into shared line input.
pub(crate) fn shared_lines<R: AsyncBufRead>(reader: R) -> SharedLines<R> {
    Arc::new(Mutex::new(reader.lines()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affirmative_answers() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative(" YES \n"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("yep"));
    }

    #[tokio::test]
    async fn line_confirm_reads_one_answer_per_prompt() {
        let lines = shared_lines("yes\nno\n".as_bytes());
        let confirm = LineConfirm::new(lines);
        assert!(confirm.confirm("delete?").await);
        assert!(!confirm.confirm("delete?").await);
        assert!(!confirm.confirm("delete?").await);
    }

    #[tokio::test]
    async fn assume_yes_always_agrees() {
        assert!(AssumeYes.confirm("anything").await);
    }
}
