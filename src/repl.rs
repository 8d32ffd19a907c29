use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::assistant::{AskError, Assistant};
use crate::prompt::Lang;

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Skip,
    Quit,
    SetLang(Lang),
    UnknownLang(&'a str),
    Models,
    Ask(&'a str),
}

fn parse_command(input: &str) -> ReplCommand<'_> {
    let input = input.trim();
    if input.is_empty() {
        return ReplCommand::Skip;
    }
    if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        return ReplCommand::Quit;
    }
    if input.eq_ignore_ascii_case("/models") {
        return ReplCommand::Models;
    }
    let (command, tag) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
    if command == "/lang" {
        let tag = tag.trim();
        return match tag.to_ascii_lowercase().as_str() {
            "ur" => ReplCommand::SetLang(Lang::Urdu),
            "en" => ReplCommand::SetLang(Lang::English),
            _ => ReplCommand::UnknownLang(tag),
        };
    }
    ReplCommand::Ask(input)
}

pub async fn run_repl(assistant: &Assistant) -> Result<()> {
    let mut lang = assistant.config().default_lang;

    println!("Quran assistant");
    println!("models: {}", assistant.config().attempt_models().join(", "));
    println!("ask a question, '/lang ur|en' to switch language, '/models' to list models, or 'exit' to quit");

    loop {
        print!("[{}] > ", lang.as_str());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read stdin")?;
        if read == 0 {
            break;
        }

        match parse_command(&input) {
            ReplCommand::Skip => continue,
            ReplCommand::Quit => break,
            ReplCommand::SetLang(next) => {
                lang = next;
                println!("answers will be in {}\n", lang.as_str());
            }
            ReplCommand::UnknownLang(tag) => {
                println!("unknown language '{tag}', expected 'ur' or 'en'\n");
            }
            ReplCommand::Models => {
                for (idx, model) in assistant.config().attempt_models().iter().enumerate() {
                    println!("[{}] {}", idx + 1, model);
                }
                println!();
            }
            ReplCommand::Ask(question) => match assistant.ask(question, lang).await {
                Ok(answer) => println!("{}\n", answer.text.trim()),
                Err(AskError::EmptyQuestion) => continue,
                Err(AskError::Exhausted(err)) => {
                    println!("unable to reach any model right now: {err}\n");
                }
            },
        }
    }

    Ok(())
}
