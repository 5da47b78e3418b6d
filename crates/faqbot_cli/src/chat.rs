use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use faqbot_core::{ConfidenceGate, FaqEngine, InteractionSink, ResponsePicker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

impl Speaker {
    fn label(self) -> &'static str {
        match self {
            Speaker::User => "you",
            Speaker::Bot => "bot",
        }
    }
}

/// Messages exchanged during one chat session, oldest first.
#[derive(Debug, Default)]
pub struct SessionHistory {
    turns: Vec<(Speaker, String)>,
}

impl SessionHistory {
    pub fn push(&mut self, speaker: Speaker, message: impl Into<String>) {
        self.turns.push((speaker, message.into()));
    }

    pub fn turns(&self) -> &[(Speaker, String)] {
        &self.turns
    }
}

/// Reads questions line by line until `exit`, `quit` or end of input.
///
/// `history` prints the session so far. Every other non-blank line is sent
/// to the engine, untrimmed, as one query.
pub fn run_chat<R: BufRead, W: Write>(
    engine: &FaqEngine,
    gate: &ConfidenceGate,
    picker: &mut dyn ResponsePicker,
    sink: &dyn InteractionSink,
    input: R,
    mut out: W,
) -> Result<SessionHistory> {
    let mut history = SessionHistory::default();
    let mut lines = input.lines();

    loop {
        write!(out, "you> ").context("write prompt")?;
        out.flush().context("flush prompt")?;

        let Some(line) = lines.next() else {
            writeln!(out).context("write newline")?;
            break;
        };
        let line = line.context("read input line")?;

        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            "history" => {
                for (speaker, message) in history.turns() {
                    writeln!(out, "  {}: {}", speaker.label(), message)
                        .context("write history")?;
                }
                continue;
            }
            _ => {}
        }

        let reply = engine.respond(&line, gate, picker, sink);
        history.push(Speaker::User, line);
        history.push(Speaker::Bot, reply.answer.clone());

        writeln!(out, "bot> {}", reply.answer).context("write answer")?;
        writeln!(
            out,
            "     score={:.4} accepted={} matched={}",
            reply.score(),
            reply.accepted(),
            reply.matched_question
        )
        .context("write match metadata")?;
    }

    Ok(history)
}
