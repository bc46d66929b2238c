use std::fs;

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::commands::{MetaCommand, parse_meta_command};
use crate::engine::Engine;
use crate::history::resolve_history_path;
use crate::printer::{OutputFormat, print_output};
use crate::sql::split_statements;

const PRIMARY_PROMPT: &str = "docdb> ";
const CONTINUATION_PROMPT: &str = "...> ";

const STATEMENT_HELP: [&str; 5] = [
    "SELECT <* | field[, field...]> FROM <collection> [WHERE field = value [AND ...]]",
    "INSERT INTO <collection> <json-object>",
    "CREATE INDEX ON <collection>(field[, field...])",
    "UPDATE <collection> SET field = value[, ...] [WHERE ...]",
    "DELETE FROM <collection> [WHERE ...]",
];

pub fn run_repl(engine: &Engine, format: OutputFormat) -> Result<()> {
    let history_path = resolve_history_path();
    if let Some(parent) = history_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context("create history directory")?;
    }

    let mut editor = DefaultEditor::new().context("initialize line editor")?;
    if let Err(err) = editor.load_history(&history_path) {
        log::debug!("no history loaded from {}: {}", history_path.display(), err);
    }

    let mut buffer = String::new();

    loop {
        let prompt = if buffer.trim().is_empty() {
            PRIMARY_PROMPT
        } else {
            CONTINUATION_PROMPT
        };
        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        if buffer.is_empty() && line.trim().is_empty() {
            continue;
        }

        buffer.push_str(&line);
        buffer.push('\n');

        let input = buffer.clone();
        let mut split = split_statements(&buffer);
        split.finish_line();
        let mut should_exit = false;

        for statement in split.statements {
            if run_statement(engine, &statement, format)? {
                should_exit = true;
                break;
            }
        }

        if should_exit {
            break;
        }

        if split.remainder.is_empty() {
            if !input.trim().is_empty() {
                let _ = editor.add_history_entry(input.trim());
            }
            buffer.clear();
        } else {
            buffer = split.remainder;
        }
    }

    if let Err(err) = editor.save_history(&history_path) {
        log::warn!("could not save history to {}: {}", history_path.display(), err);
    }
    Ok(())
}

/// Runs one meta command or statement, printing its result. Returns `true`
/// when the session should end.
pub fn run_statement(engine: &Engine, statement: &str, format: OutputFormat) -> Result<bool> {
    match parse_meta_command(statement) {
        Some(command) => handle_meta_command(engine, command),
        None => {
            match engine.execute(statement) {
                Ok(output) => print_output(&output, format),
                Err(err) => eprintln!("Error: {:#}", err),
            }
            Ok(false)
        }
    }
}

fn handle_meta_command(engine: &Engine, command: MetaCommand) -> Result<bool> {
    match command {
        MetaCommand::Quit => Ok(true),
        MetaCommand::Help => {
            print_help();
            Ok(false)
        }
        MetaCommand::Collections => {
            let names = engine.collection_names();
            for name in &names {
                println!("{}", name);
            }
            println!("({} collections)", names.len());
            Ok(false)
        }
        MetaCommand::Indexes { collection } => {
            match engine.index_fields(&collection) {
                Some(indexes) if indexes.is_empty() => println!("(no indexes)"),
                Some(indexes) => {
                    for fields in indexes {
                        println!("{}({})", collection, fields.join(", "));
                    }
                }
                None => eprintln!("Error: collection {} not found", collection),
            }
            Ok(false)
        }
    }
}

fn print_help() {
    println!("Statements:");
    for line in STATEMENT_HELP {
        println!("  {}", line);
    }
    println!("\nCommands:");
    println!("  exit, quit, \\q          Exit the REPL");
    println!("  help                    Show this message");
    println!("  .collections            List collections");
    println!("  .indexes <collection>   List a collection's indexes");
    println!("\nA statement ends at ';' or at the end of a line once every quote and JSON object is closed.");
}
