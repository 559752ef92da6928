use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use log::info;

use pure_blocks::{
    Command, DocumentEditor, EditorConfig,
    notation::{parse_with_selection, serialize},
};

const USAGE: &str = "Usage: pure-blocks [--config FILE] FIXTURE COMMAND...

FIXTURE is a file holding a document in fixture notation, or the notation
itself. Selection markers: [ anchor, ] focus, [] caret.

Commands:
  delete-backward   delete-forward   enter   line-break
  toggle-list=ol|ul|checklist   indent   outdent   toggle-checked
  align=left|center|right|justify";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    run()
}

struct Arguments {
    config: Option<PathBuf>,
    fixture: String,
    commands: Vec<Command>,
}

fn parse_arguments(mut args: impl Iterator<Item = String>) -> Result<Option<Arguments>> {
    let mut config = None;
    let mut fixture = None;
    let mut commands = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "-c" | "--config" => {
                let Some(path) = args.next() else {
                    bail!("--config needs a file argument");
                };
                config = Some(PathBuf::from(path));
            }
            _ if fixture.is_none() => fixture = Some(arg),
            _ => {
                let command = arg
                    .parse::<Command>()
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("invalid command argument '{}'", arg))?;
                commands.push(command);
            }
        }
    }
    let Some(fixture) = fixture else {
        return Ok(None);
    };
    Ok(Some(Arguments {
        config,
        fixture,
        commands,
    }))
}

fn read_fixture(argument: &str) -> Result<String> {
    let path = Path::new(argument);
    if path.is_file() {
        return fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    Ok(argument.to_string())
}

fn run() -> Result<()> {
    let Some(arguments) = parse_arguments(env::args().skip(1))? else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let config = match &arguments.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    let source = read_fixture(&arguments.fixture)?;
    let (document, selection) =
        parse_with_selection(source.trim()).context("failed to parse fixture")?;
    let mut editor = DocumentEditor::new(document, selection).with_config(config);

    for command in arguments.commands {
        let changed = editor
            .execute(command)
            .with_context(|| format!("{} failed", command))?;
        info!("{}: {}", command, if changed { "applied" } else { "no change" });
    }

    let selection = editor.selection();
    println!("{}", serialize(editor.document(), Some(&selection)));
    Ok(())
}
