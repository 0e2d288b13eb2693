use clap::Parser;
use colored::Colorize;

use gitmt::{
    AppError,
    cli::{Cli, Commands},
    config::Paths,
    git::{GitCli, Scope},
    keys::{KeyRemoval, KeyStatus, SshKeygen},
    logging,
    prompt::{AssumeYes, Confirm, InquireConfirm},
    storage::load_registry,
    sync::{self, Engine, NewIdentity},
    validation::{prompt_until_valid, validate_input_alias, validate_input_email, validate_input_username},
};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        if e.is_informational() {
            println!("{}", e.to_string().yellow());
            return;
        }
        eprintln!("{} {}", "error:".red().bold(), e.to_string().red());
        if let AppError::StepFailed { completed, .. } = &e {
            for step in completed.iter().rev() {
                eprintln!("  {} {} (to undo: {})", "left in place:".yellow(), step, step.compensation());
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let paths = Paths::from_env()?;
    let registry = load_registry(&paths.registry_file)?;

    let confirm: &dyn Confirm = if cli.yes { &AssumeYes } else { &InquireConfirm };
    let engine = Engine::new(&paths, &GitCli, &SshKeygen, confirm);

    match cli.command {
        Commands::Add { name, email, alias, local } => {
            let name = match name {
                Some(name) => name,
                None => prompt_until_valid(&format!("{}", "enter git username:".blue()), validate_input_username)?,
            };
            let email = match email {
                Some(email) => email,
                None => prompt_until_valid(&format!("{}", "enter git email:".blue()), validate_input_email)?,
            };
            let alias = match alias {
                Some(alias) => alias,
                None => prompt_until_valid(&format!("{}", "enter alias:".blue()), |input| {
                    validate_input_alias(input, &registry.users)
                })?,
            };

            let outcome = engine.add(registry, NewIdentity::new(&name, &email, &alias), Scope::from_local_flag(local))?;
            let user = &outcome.identity;
            println!("{} {} ({}) with id {}", "added user:".green(), user.name, user.email, user.id);
            match outcome.key {
                KeyStatus::Generated => println!("generated SSH key {}", user.ssh_key_path.display()),
                KeyStatus::Existing => println!("using existing SSH key {}", user.ssh_key_path.display()),
                KeyStatus::Declined => println!("{}", "no SSH key generated".yellow()),
            }
            if outcome.activated {
                println!("{} {}", "active user:".green(), user.alias);
            }
            println!("clone with: git clone git@github.com-{}:<owner>/<repo>.git", user.alias);
        }
        Commands::Change { id, local } => {
            let outcome = engine.change(registry, id, Scope::from_local_flag(local))?;
            let user = &outcome.identity;
            println!("{} {} <{}>", "switched to user:".green(), user.name, user.email);
        }
        Commands::Remove { id } => {
            let outcome = engine.remove(registry, id)?;
            for (step, error) in outcome.journal.failures() {
                println!("{} {}: {}", "warning:".yellow(), step, error);
            }
            if outcome.key == Some(KeyRemoval::Declined) {
                println!("kept SSH key {}", outcome.identity.ssh_key_path.display());
            }
            println!("{} {}", "removed user:".green(), outcome.identity.alias);
        }
        Commands::Current => match sync::current(&registry) {
            Some(user) => println!("{} [{}] {} <{}> ({})", "current user:".blue(), user.id, user.name, user.email, user.alias),
            None => println!("{}", "no active user".yellow()),
        },
        Commands::List => {
            let users = sync::list(&registry);
            if users.is_empty() {
                println!("{}", "no users found".yellow());
            }
            for user in users {
                let marker = if registry.active_user == Some(user.id) { "*" } else { " " };
                println!("{} [{}] {} <{}> ({})", marker.green(), user.id, user.name, user.email, user.alias);
            }
        }
        Commands::Global => match sync::global(&registry) {
            Some(global) => println!("{} {} <{}>", "global user:".blue(), global.name, global.email),
            None => println!("{}", "no global config saved".yellow()),
        },
        Commands::Key { id } => match sync::key(&registry, id)? {
            Some(public_key) => println!("{public_key}"),
            None => println!("{}", "no SSH key found".yellow()),
        },
    }

    Ok(())
}
