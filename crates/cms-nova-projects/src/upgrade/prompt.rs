//! Request/response abstraction over operator prompts
//!
//! The engine never reads stdin directly. It asks a [`Prompter`], which is
//! backed by the terminal in the CLI and by [`ScriptedPrompter`] elsewhere.

use crate::error::{Error, Result};
use std::collections::VecDeque;

/// Source of operator answers
pub trait Prompter {
    /// Ask a question and return the raw answer line
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Ask a yes/no question
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;

    /// Display text to the operator (diffs, file lists, warnings)
    fn show(&mut self, text: &str);
}

/// An option in a single-key menu
pub trait MenuChoice: Copy + PartialEq + 'static {
    /// Key the operator types
    fn key(&self) -> &'static str;

    /// Short description shown next to the key
    fn label(&self) -> &'static str;

    /// Longer spellings accepted besides the key
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether an answer selects this option
    fn matches(&self, answer: &str) -> bool {
        let answer = answer.trim();
        answer.eq_ignore_ascii_case(self.key())
            || self.aliases().iter().any(|a| answer.eq_ignore_ascii_case(a))
    }
}

/// Ask until the answer selects one of `valid`
///
/// Invalid answers are reported and the same question is asked again.
pub fn prompt_choice<P, C>(prompter: &mut P, question: &str, valid: &[C]) -> Result<C>
where
    P: Prompter + ?Sized,
    C: MenuChoice,
{
    let menu = valid
        .iter()
        .map(|c| format!("[{}] {}", c.key(), c.label()))
        .collect::<Vec<_>>()
        .join("  ");
    let keys = valid.iter().map(|c| c.key()).collect::<Vec<_>>().join("/");

    loop {
        let answer = prompter.ask(&format!("{}\n  {}", question, menu))?;
        if let Some(choice) = valid.iter().copied().find(|c| c.matches(&answer)) {
            return Ok(choice);
        }
        prompter.show(&format!(
            "Invalid option '{}'. Choose one of: {}",
            answer.trim(),
            keys
        ));
    }
}

/// Per-file choices offered by the reconciliation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Overwrite the working copy from the target
    AcceptTemplate,
    /// Leave the local file untouched
    KeepLocal,
    /// Show the diff, then ask again
    ShowDiff,
    /// Pick hunks interactively
    Patch,
    /// Accept this and every remaining file
    AcceptAll,
    /// Keep this and every remaining file
    RejectAll,
}

impl Choice {
    /// Every option, in menu order
    pub const ALL: &'static [Choice] = &[
        Choice::AcceptTemplate,
        Choice::KeepLocal,
        Choice::ShowDiff,
        Choice::Patch,
        Choice::AcceptAll,
        Choice::RejectAll,
    ];
}

impl MenuChoice for Choice {
    fn key(&self) -> &'static str {
        match self {
            Self::AcceptTemplate => "y",
            Self::KeepLocal => "n",
            Self::ShowDiff => "d",
            Self::Patch => "p",
            Self::AcceptAll => "a",
            Self::RejectAll => "q",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::AcceptTemplate => "take template",
            Self::KeepLocal => "keep mine",
            Self::ShowDiff => "show diff",
            Self::Patch => "patch hunks",
            Self::AcceptAll => "take all remaining",
            Self::RejectAll => "keep all remaining",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::AcceptTemplate => &["yes"],
            Self::KeepLocal => &["no"],
            Self::ShowDiff => &["diff"],
            Self::Patch => &["patch"],
            Self::AcceptAll => &["all"],
            Self::RejectAll => &["none", "quit"],
        }
    }
}

/// Answers taken from a fixed script
///
/// Every question asked and every text shown is recorded. Running out of
/// answers is an error, so a flow that prompts more than expected fails
/// instead of hanging.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    /// Questions asked, in order
    pub questions: Vec<String>,
    /// Text shown, in order
    pub shown: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            questions: Vec::new(),
            shown: Vec::new(),
        }
    }

    /// Answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next_answer(&mut self, question: &str) -> Result<String> {
        self.questions.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| Error::prompt(format!("no scripted answer for: {}", question)))
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.next_answer(question)
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        loop {
            let answer = self.next_answer(question)?;
            match answer.trim().to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                other => self.show(&format!("Invalid answer '{}'. Answer y or n", other)),
            }
        }
    }

    fn show(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }
}
