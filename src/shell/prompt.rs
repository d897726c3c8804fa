//! Directory selection for commands whose path argument was left out

use std::io::{self, Write};
use std::path::PathBuf;

/// Asks the user for a directory. `None` means the user cancelled.
pub trait DirectoryPrompt {
    fn choose_directory(&mut self, title: &str) -> Option<PathBuf>;
}

/// Prompts on the terminal; an empty answer cancels.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl DirectoryPrompt for TerminalPrompt {
    fn choose_directory(&mut self, title: &str) -> Option<PathBuf> {
        let mut stdout = io::stdout();
        write!(stdout, "{} (leave empty to cancel): ", title).ok()?;
        stdout.flush().ok()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer).ok()?;
        parse_answer(&answer)
    }
}

/// Answers from a fixed list, then cancels. Useful for scripted sessions.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Vec<PathBuf>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut answers: Vec<_> = answers.into_iter().collect();
        answers.reverse();
        Self { answers }
    }
}

impl DirectoryPrompt for ScriptedPrompt {
    fn choose_directory(&mut self, _title: &str) -> Option<PathBuf> {
        self.answers.pop()
    }
}

fn parse_answer(answer: &str) -> Option<PathBuf> {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("  \n"), None);
        assert_eq!(parse_answer("/home/u/docs\n"), Some(PathBuf::from("/home/u/docs")));
    }

    #[test]
    fn test_scripted_prompt_order() {
        let mut prompt = ScriptedPrompt::new([PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(prompt.choose_directory("x"), Some(PathBuf::from("a")));
        assert_eq!(prompt.choose_directory("x"), Some(PathBuf::from("b")));
        assert_eq!(prompt.choose_directory("x"), None);
    }
}
