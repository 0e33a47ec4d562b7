//! Shell completions command

use std::io::Write;

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::{Cli, CompletionsArgs};
use crate::error::Result;

/// Print completions for the requested shell to stdout
pub fn run(args: CompletionsArgs) -> Result<()> {
    generate(args.shell, &mut std::io::stdout().lock());
    Ok(())
}

fn generate(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "olm-run", out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut buf = Vec::new();
        generate(shell, &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_completions_bash() {
        let out = script(Shell::Bash);
        assert!(out.contains("olm-run"));
        assert!(out.contains("--operator-version"));
    }

    #[test]
    fn test_completions_zsh() {
        assert!(script(Shell::Zsh).contains("#compdef olm-run"));
    }

    #[test]
    fn test_completions_fish_lists_subcommands() {
        let out = script(Shell::Fish);
        assert!(out.contains("cleanup"));
        assert!(out.contains("run"));
    }

    #[test]
    fn test_completions_powershell_and_elvish() {
        assert!(!script(Shell::PowerShell).is_empty());
        assert!(!script(Shell::Elvish).is_empty());
    }

    #[test]
    fn test_shell_name_is_case_insensitive() {
        use clap::Parser;
        let cli = Cli::try_parse_from(["olm-run", "completions", "ZSH"]).unwrap_or_else(|e| {
            panic!("Failed to parse CLI arguments: {}", e);
        });
        match cli.command {
            crate::cli::Commands::Completions(args) => assert_eq!(args.shell, Shell::Zsh),
            _ => panic!("Expected Completions command"),
        }
    }
}
