use crate::interrupt::InterruptWatch;
use crate::selection::{self, Selection};
use crate::ui;
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input};

/// Source of interactive answers.
pub trait Prompt {
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;
    fn input(&self, question: &str) -> Result<String>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()
            .context("Failed to read confirmation")
    }

    fn input(&self, question: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()
            .context("Failed to read selection")
    }
}

/// Per-invocation switches shared by every stage.
pub struct Session<'a> {
    pub assume_yes: bool,
    pub dry_run: bool,
    prompt: &'a dyn Prompt,
    interrupts: InterruptWatch,
}

impl<'a> Session<'a> {
    pub fn new(assume_yes: bool, dry_run: bool, prompt: &'a dyn Prompt) -> Self {
        Self {
            assume_yes,
            dry_run,
            prompt,
            interrupts: InterruptWatch::default(),
        }
    }

    pub fn with_interrupts(mut self, interrupts: InterruptWatch) -> Self {
        self.interrupts = interrupts;
        self
    }

    pub fn interrupts(&self) -> &InterruptWatch {
        &self.interrupts
    }

    /// Yes/no gate. `--yes` answers for the user and says so.
    pub fn confirm(&self, question: &str) -> Result<bool> {
        if self.assume_yes {
            ui::info(format!("{question} yes (--yes)"));
            return Ok(true);
        }
        self.prompt.confirm(question, false)
    }

    /// Numbered pick-list. `--yes` picks everything.
    pub fn choose<'i, T>(
        &self,
        title: &str,
        items: &'i [T],
        render: impl Fn(&T) -> String,
    ) -> Result<Vec<&'i T>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        if self.assume_yes {
            ui::info(format!("{title}: selecting all {} item(s) (--yes)", items.len()));
            return Ok(items.iter().collect());
        }

        let lines: Vec<String> = items.iter().map(&render).collect();
        ui::menu(title, &lines);
        let raw = self
            .prompt
            .input("Enter numbers separated by spaces, 'all', 'none', or 'q' to quit")?;

        let Selection {
            chosen,
            invalid,
            quit,
        } = selection::select(items, &raw);
        for token in &invalid {
            ui::warn(format!("Ignoring invalid selection '{token}'"));
        }
        if quit {
            ui::info("Selection cancelled.");
        }
        Ok(chosen)
    }
}
