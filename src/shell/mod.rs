//! Interactive command shell over [`BackupManager`]
//!
//! Each input line is split into a command word and its arguments. The
//! word is looked up in [`COMMANDS`], an explicit dispatch table, and the
//! matching handler writes its result to the output. Core errors are
//! reported and the shell keeps running.

pub mod prompt;
pub mod table;

pub use prompt::{DirectoryPrompt, ScriptedPrompt, TerminalPrompt};

use crate::backup::{BackupManager, BackupRecord, RestoreTarget};
use std::io::{self, Write};
use std::path::PathBuf;

/// Whether a command did what was asked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Failed,
}

type Handler = fn(&mut Shell, &[&str], &mut dyn Write) -> io::Result<Outcome>;

/// One entry of the dispatch table
pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    handler: Handler,
}

pub static COMMANDS: &[Command] = &[
    Command {
        name: "create",
        usage: "<name> [<path>]",
        description: "Creates a new backup with name <name> and source path <path>",
        handler: Shell::cmd_create,
    },
    Command {
        name: "update",
        usage: "<name>",
        description: "Updates all files of backup with name <name>",
        handler: Shell::cmd_update,
    },
    Command {
        name: "restore",
        usage: "<name> <target>",
        description: "Restores a backup with name <name> to dir <target> ($src for its source)",
        handler: Shell::cmd_restore,
    },
    Command {
        name: "delete",
        usage: "<name>",
        description: "Deletes a backup with name <name>",
        handler: Shell::cmd_delete,
    },
    Command {
        name: "list",
        usage: "none",
        description: "Lists all available backups",
        handler: Shell::cmd_list,
    },
    Command {
        name: "help",
        usage: "none",
        description: "Display this help message",
        handler: Shell::cmd_help,
    },
    Command {
        name: "exit",
        usage: "none",
        description: "Exits the program",
        handler: Shell::cmd_exit,
    },
];

fn lookup(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|command| command.name == name)
}

pub struct Shell {
    manager: BackupManager,
    prompt: Box<dyn DirectoryPrompt>,
    running: bool,
}

impl Shell {
    pub fn new(manager: BackupManager, prompt: Box<dyn DirectoryPrompt>) -> Self {
        Self {
            manager,
            prompt,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Read commands until `exit` or the end of input.
    pub fn run<I>(&mut self, lines: I, out: &mut dyn Write) -> io::Result<()>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        writeln!(out, "MRKBackupManager")?;
        let mut lines = lines.into_iter();

        while self.running {
            write!(out, "\n>")?;
            out.flush()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };
            self.execute_line(&line, out)?;
        }

        writeln!(out, "Exiting...")?;
        Ok(())
    }

    /// Dispatch a single command line. Blank lines do nothing.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> io::Result<Outcome> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(Outcome::Done);
        };
        let args: Vec<&str> = words.collect();

        match lookup(word) {
            Some(command) => (command.handler)(self, &args, out),
            None => {
                writeln!(out, "Command not found")?;
                Ok(Outcome::Failed)
            }
        }
    }

    /// Look up the backup named by the first argument, reporting why not.
    fn named_backup(&self, args: &[&str], out: &mut dyn Write) -> io::Result<Option<BackupRecord>> {
        let Some(name) = args.first() else {
            writeln!(out, "name cannot be empty")?;
            return Ok(None);
        };

        match self.manager.find_backup(name) {
            Ok(Some(record)) => Ok(Some(record)),
            Ok(None) => {
                writeln!(out, "backup {} doesn't exist", name)?;
                Ok(None)
            }
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                Ok(None)
            }
        }
    }

    fn path_argument(&mut self, args: &[&str], index: usize, title: &str) -> Option<PathBuf> {
        match args.get(index) {
            Some(path) => Some(PathBuf::from(path)),
            None => self.prompt.choose_directory(title),
        }
    }

    fn cmd_create(&mut self, args: &[&str], out: &mut dyn Write) -> io::Result<Outcome> {
        let Some(name) = args.first().copied() else {
            writeln!(out, "name cannot be empty")?;
            return Ok(Outcome::Failed);
        };

        match self.manager.find_backup(name) {
            Ok(Some(_)) => {
                writeln!(out, "backup {} already exists", name)?;
                return Ok(Outcome::Failed);
            }
            Ok(None) => {}
            Err(e) => return report(out, e),
        }

        let Some(source) = self.path_argument(args, 1, &format!("Source directory for {}", name))
        else {
            writeln!(out, "invalid src path")?;
            return Ok(Outcome::Failed);
        };

        match self.manager.create_backup(name, &source) {
            Ok(_) => {
                writeln!(out, "backup {} was created", name)?;
                Ok(Outcome::Done)
            }
            Err(e) => report(out, e),
        }
    }

    fn cmd_update(&mut self, args: &[&str], out: &mut dyn Write) -> io::Result<Outcome> {
        let Some(record) = self.named_backup(args, out)? else {
            return Ok(Outcome::Failed);
        };

        match self.manager.update_backup(&record) {
            Ok(_) => {
                writeln!(out, "backup {} was updated", record.name)?;
                Ok(Outcome::Done)
            }
            Err(e) => report(out, e),
        }
    }

    fn cmd_restore(&mut self, args: &[&str], out: &mut dyn Write) -> io::Result<Outcome> {
        let Some(record) = self.named_backup(args, out)? else {
            return Ok(Outcome::Failed);
        };

        let target = match args.get(1) {
            Some(raw) => RestoreTarget::parse(raw),
            None => match self.prompt.choose_directory(&format!("Restore {} into", record.name)) {
                Some(path) => path.into(),
                None => {
                    writeln!(out, "invalid target path")?;
                    return Ok(Outcome::Failed);
                }
            },
        };

        match self.manager.restore_backup(&record, &target) {
            Ok(_) => {
                writeln!(
                    out,
                    "backup {} was restored to {}",
                    record.name,
                    target.resolve(&record).display()
                )?;
                Ok(Outcome::Done)
            }
            Err(e) => report(out, e),
        }
    }

    fn cmd_delete(&mut self, args: &[&str], out: &mut dyn Write) -> io::Result<Outcome> {
        let Some(record) = self.named_backup(args, out)? else {
            return Ok(Outcome::Failed);
        };

        match self.manager.delete_backup(&record) {
            Ok(()) => {
                writeln!(out, "backup {} was deleted", record.name)?;
                Ok(Outcome::Done)
            }
            Err(e) => report(out, e),
        }
    }

    fn cmd_list(&mut self, _args: &[&str], out: &mut dyn Write) -> io::Result<Outcome> {
        match self.manager.list_backups() {
            Ok(records) => {
                write!(out, "{}", table::render_backups(&records))?;
                Ok(Outcome::Done)
            }
            Err(e) => report(out, e),
        }
    }

    fn cmd_help(&mut self, _args: &[&str], out: &mut dyn Write) -> io::Result<Outcome> {
        writeln!(
            out,
            "{}{}Description",
            table::spaced("Command", 10),
            table::spaced("Arguments", 20)
        )?;
        writeln!(out, "{}", table::rule(table::LISTING_WIDTH))?;
        for command in COMMANDS {
            writeln!(
                out,
                "{}{}{}",
                table::spaced(command.name, 10),
                table::spaced(command.usage, 20),
                command.description
            )?;
        }
        Ok(Outcome::Done)
    }

    fn cmd_exit(&mut self, _args: &[&str], _out: &mut dyn Write) -> io::Result<Outcome> {
        self.running = false;
        Ok(Outcome::Done)
    }
}

fn report(out: &mut dyn Write, e: crate::backup::BackupError) -> io::Result<Outcome> {
    writeln!(out, "error: {}", e)?;
    Ok(Outcome::Failed)
}
