use clap::{ArgAction, Parser, Subcommand};

/// CLI arguments parser using `clap`
#[derive(Parser, Debug)]
#[command(name = "gitmt", version, about = "Manage multiple Git identities and their SSH keys")]
pub struct Cli {
    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    pub yes: bool,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Subcommand chosen to execute
    #[command(subcommand)]
    pub command: Commands,
}

// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Adds a new identity; prompts for any value not given
    Add {
        /// Git username
        #[arg(short, long)]
        name: Option<String>,
        /// Git email
        #[arg(short, long)]
        email: Option<String>,
        /// Unique alias, used as the github.com-<alias> SSH host
        #[arg(short, long)]
        alias: Option<String>,
        /// Apply to the current repository instead of globally
        #[arg(short, long)]
        local: bool,
    },
    /// Displays the active identity
    Current,
    /// Removes an identity with its SSH alias and key
    Remove {
        /// Id of identity to remove
        id: u32,
    },
    /// Makes an identity active and applies it to git
    Change {
        /// Id of identity to switch to
        id: u32,
        /// Apply to the current repository instead of globally
        #[arg(short, long)]
        local: bool,
    },
    /// Displays all identities
    List,
    /// Displays the global Git identity saved before gitmt first changed it
    Global,
    /// Prints the public SSH key of an identity
    Key {
        /// Id of identity
        id: u32,
    },
}
