//! Interactive prompts behind a small trait so command flows can be scripted
//! in tests.

use inquire::{
    Confirm, MultiSelect, Select, Text,
    list_option::ListOption,
    validator::{StringValidator, Validation},
};

use crate::CliError;

/// Source of interactive answers.
pub(crate) trait Prompter {
    /// Ask a yes/no question. Invalid answers are re-prompted.
    fn confirm(&mut self, message: &str) -> Result<bool, CliError>;

    /// Pick exactly one of `options`, returning its index.
    fn select_one(&mut self, message: &str, options: &[String]) -> Result<usize, CliError>;

    /// Pick at least one of `options`, returning their indices in menu order.
    fn select_many(&mut self, message: &str, options: &[String]) -> Result<Vec<usize>, CliError>;

    /// Read a non-blank line of text.
    fn text(&mut self, message: &str) -> Result<String, CliError>;
}

/// Terminal prompts rendered by `inquire`.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn confirm(&mut self, message: &str) -> Result<bool, CliError> {
        Ok(Confirm::new(message).with_default(false).prompt()?)
    }

    fn select_one(&mut self, message: &str, options: &[String]) -> Result<usize, CliError> {
        let picked = Select::new(message, options.to_vec())
            .with_starting_cursor(0)
            .raw_prompt()?;
        Ok(picked.index)
    }

    fn select_many(&mut self, message: &str, options: &[String]) -> Result<Vec<usize>, CliError> {
        let picked = MultiSelect::new(message, options.to_vec())
            .with_validator(|selection: &[ListOption<&String>]| {
                if selection.is_empty() {
                    Ok(Validation::Invalid("select at least one entry".into()))
                } else {
                    Ok(Validation::Valid)
                }
            })
            .raw_prompt()?;
        Ok(picked.into_iter().map(|option| option.index).collect())
    }

    fn text(&mut self, message: &str) -> Result<String, CliError> {
        let answer = Text::new(message).with_validator(NonBlank).prompt()?;
        Ok(answer.trim().to_owned())
    }
}

#[derive(Debug, Clone, Copy)]
struct NonBlank;

impl StringValidator for NonBlank {
    fn validate(&self, input: &str) -> Result<Validation, inquire::CustomUserError> {
        if input.trim().is_empty() {
            Ok(Validation::Invalid("enter a value".into()))
        } else {
            Ok(Validation::Valid)
        }
    }
}
