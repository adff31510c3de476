use std::io::{BufRead, Write};
use storili_types::StoryId;

/// Word the operator must type to confirm a delete.
pub const CONFIRM_WORD: &str = "delete";

/// Out-of-band approval for destructive operations.
pub trait Confirm {
    /// Returns `true` only if the operator approved deleting `agent_id`.
    fn confirm(&mut self, story_id: &StoryId, agent_id: &str) -> std::io::Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(&StoryId, &str) -> bool,
{
    fn confirm(&mut self, story_id: &StoryId, agent_id: &str) -> std::io::Result<bool> {
        Ok(self(story_id, agent_id))
    }
}

/// Asks on a terminal-like stream and expects [`CONFIRM_WORD`] back.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, story_id: &StoryId, agent_id: &str) -> std::io::Result<bool> {
        writeln!(self.output, "\nThis will permanently delete:")?;
        writeln!(self.output, "  Story:    {story_id}")?;
        writeln!(self.output, "  Agent ID: {agent_id}")?;
        writeln!(self.output, "\nType '{CONFIRM_WORD}' to confirm:")?;
        write!(self.output, "> ")?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim() == CONFIRM_WORD)
    }
}
