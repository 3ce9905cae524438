//! Interactive question capability
//!
//! Account setup asks questions through [`Prompter`] so it runs the same way
//! against a terminal, a script, or a test.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{Error, Result};

/// Something that can ask the user questions
pub trait Prompter {
    /// Pick one of `options`; returns its index
    fn select(&self, message: &str, options: &[&str], default: usize) -> Result<usize>;

    /// Free-form text answer; an empty answer yields `default` when given
    fn input(&self, message: &str, default: Option<&str>) -> Result<String>;
}

/// Prompter that replays canned answers in order
///
/// A `select` answer may be the option index or the option's first word.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
}

impl ScriptedPrompter {
    /// Create a prompter that will answer with `answers`, in order
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether every scripted answer has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.answers.borrow().is_empty()
    }

    fn next_answer(&self, message: &str) -> Result<String> {
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Prompt(format!("No answer scripted for '{message}'")))
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&self, message: &str, options: &[&str], default: usize) -> Result<usize> {
        let answer = self.next_answer(message)?;
        let answer = answer.trim();

        if answer.is_empty() {
            return Ok(default);
        }
        if let Ok(index) = answer.parse::<usize>() {
            return if index < options.len() {
                Ok(index)
            } else {
                Err(Error::Prompt(format!("Option {index} out of range")))
            };
        }

        options
            .iter()
            .position(|opt| opt.split_whitespace().next() == Some(answer))
            .ok_or_else(|| Error::Prompt(format!("'{answer}' is not one of the options")))
    }

    fn input(&self, message: &str, default: Option<&str>) -> Result<String> {
        let answer = self.next_answer(message)?;
        match default {
            Some(default) if answer.trim().is_empty() => Ok(default.to_string()),
            _ => Ok(answer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_word_and_index() {
        let prompter = ScriptedPrompter::new(["beta", "0", ""]);
        let options = ["alpha  first", "beta   second"];

        assert_eq!(prompter.select("pick", &options, 0).unwrap(), 1);
        assert_eq!(prompter.select("pick", &options, 1).unwrap(), 0);
        assert_eq!(prompter.select("pick", &options, 1).unwrap(), 1);
    }

    #[test]
    fn test_select_rejects_unknown() {
        let prompter = ScriptedPrompter::new(["gamma", "7"]);
        let options = ["alpha", "beta"];

        assert!(prompter.select("pick", &options, 0).is_err());
        assert!(prompter.select("pick", &options, 0).is_err());
    }

    #[test]
    fn test_input_default() {
        let prompter = ScriptedPrompter::new(["", "given"]);
        assert_eq!(prompter.input("q", Some("dflt")).unwrap(), "dflt");
        assert_eq!(prompter.input("q", Some("dflt")).unwrap(), "given");
    }

    #[test]
    fn test_runs_out_of_answers() {
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let err = prompter.input("Service URL", None).unwrap_err();
        assert!(matches!(err, Error::Prompt(_)));
        assert!(err.to_string().contains("Service URL"));
    }
}
