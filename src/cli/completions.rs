use clap::Parser;
use clap_complete::Shell;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    olm-run completions bash > ~/.bash_completion.d/olm-run\n\n\
                  Generate zsh completions:\n    olm-run completions zsh > ~/.zfunc/_olm-run\n\n\
                  Generate fish completions:\n    olm-run completions fish > ~/.config/fish/completions/olm-run.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(value_enum, ignore_case = true)]
    pub shell: Shell,
}
