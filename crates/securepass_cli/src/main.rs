//! Command-line probe for `securepass_core`.
//!
//! # Responsibility
//! - Drive the credential repository against a local SQLite store.
//! - Keep output line-oriented for quick manual checks.

use clap::{Args, Parser, Subcommand};
use securepass_core::{
    default_log_level, init_logging, CredentialCard, CredentialDraft, CredentialPatch,
    CredentialRepository, Session, SqliteGateway, VaultService,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "securepass", version, about = "Manage saved website credentials")]
struct Cli {
    /// Credential store file.
    #[arg(long, env = "SECUREPASS_DB", default_value = "securepass.db")]
    db: PathBuf,

    /// Signed-in user id.
    #[arg(long, env = "SECUREPASS_USER")]
    user: Uuid,

    #[arg(long, env = "SECUREPASS_USERNAME", default_value = "local")]
    username: String,

    /// Absolute log directory. Logging stays off when unset.
    #[arg(long, env = "SECUREPASS_LOG_DIR")]
    log_dir: Option<String>,

    #[arg(long, env = "SECUREPASS_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Save a new credential.
    Add(EntryArgs),
    /// List saved credentials, newest first.
    List,
    /// List credentials matching a term.
    Search { term: String },
    /// Change fields of a saved credential.
    Edit {
        id: Uuid,
        #[command(flatten)]
        fields: EditArgs,
    },
    /// Delete a saved credential.
    Delete { id: Uuid },
    /// Print the secret of a saved credential.
    Reveal { id: Uuid },
}

#[derive(Debug, Args)]
struct EntryArgs {
    #[arg(long)]
    site: String,
    #[arg(long)]
    login: String,
    #[arg(long)]
    secret: String,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Debug, Args)]
struct EditArgs {
    #[arg(long)]
    site: Option<String>,
    #[arg(long)]
    login: Option<String>,
    #[arg(long)]
    secret: Option<String>,
    /// New URL; an empty value clears it.
    #[arg(long)]
    url: Option<String>,
    /// New email; an empty value clears it.
    #[arg(long)]
    email: Option<String>,
    /// New note; an empty value clears it.
    #[arg(long)]
    note: Option<String>,
}

impl From<EntryArgs> for CredentialDraft {
    fn from(args: EntryArgs) -> Self {
        Self {
            site_name: args.site,
            site_url: args.url,
            login_name: args.login,
            login_email: args.email,
            secret_value: args.secret,
            note: args.note,
        }
    }
}

impl From<EditArgs> for CredentialPatch {
    fn from(args: EditArgs) -> Self {
        // Blank optional values become clears via `CredentialPatch::normalized`.
        Self {
            site_name: args.site,
            site_url: args.url.map(Some),
            login_name: args.login,
            login_email: args.email.map(Some),
            secret_value: args.secret,
            note: args.note.map(Some),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let session = Session::new(cli.user, cli.username)?;
    let gateway = SqliteGateway::open(&cli.db, &session)?;
    let vault = VaultService::new(CredentialRepository::new(gateway, session));
    vault.refresh().await?;

    match cli.command {
        Command::Add(args) => {
            let card = vault.add(args.into()).await?;
            println!("added {}", card.id);
        }
        Command::List => print_cards(&vault.search("").await),
        Command::Search { term } => print_cards(&vault.search(&term).await),
        Command::Edit { id, fields } => {
            let card = vault.edit(id, fields.into()).await?;
            print_cards(std::slice::from_ref(&card));
        }
        Command::Delete { id } => {
            vault.remove(id).await?;
            println!("deleted {id}");
        }
        Command::Reveal { id } => println!("{}", vault.reveal_secret(id).await?),
    }
    Ok(())
}

fn print_cards(cards: &[CredentialCard]) {
    if cards.is_empty() {
        println!("no credentials");
        return;
    }
    for card in cards {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            card.id,
            card.site_name,
            card.login_name,
            card.login_email.as_deref().unwrap_or("-"),
            card.masked_secret,
            card.site_url.as_deref().unwrap_or("-"),
        );
    }
}
