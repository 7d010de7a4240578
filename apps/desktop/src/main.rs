use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use client_core::{
    load_settings, load_settings_from, normalize_server_url, CommandRouter, RowAction, UserClient,
};
use shared::domain::{UserField, UserId};
use tracing_subscriber::EnvFilter;

mod render;
mod session;

use session::{Awaited, Session};

#[derive(Parser, Debug)]
#[command(name = "users", about = "Manage the user directory over its WebSocket API")]
struct Args {
    /// Overrides the server url from settings (ws://, wss://, http:// or https://).
    #[arg(long)]
    server_url: Option<String>,
    /// Settings file to read instead of ./client.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    /// How long to wait for the server to acknowledge a command.
    #[arg(long, default_value_t = 5)]
    wait_secs: u64,
    /// Print the table as JSON records.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Show every user.
    List,
    /// Create a user.
    Add(UserArgs),
    /// Edit a user; omitted fields keep their current values.
    Update {
        id: String,
        #[command(flatten)]
        user: UserArgs,
    },
    /// Delete a user.
    Delete { id: String },
    /// Keep the connection open and reprint the table on every change.
    Watch,
}

#[derive(ClapArgs, Debug, Default)]
struct UserArgs {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
}

impl UserArgs {
    fn provided(&self) -> impl Iterator<Item = (UserField, &str)> + '_ {
        [
            (UserField::FirstName, &self.first_name),
            (UserField::LastName, &self.last_name),
            (UserField::Email, &self.email),
            (UserField::Password, &self.password),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|value| (field, value)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => load_settings_from(path, true),
        None => load_settings(),
    }
    .context("failed to load client settings")?;
    if let Some(server_url) = &args.server_url {
        settings.server_url = normalize_server_url(server_url)?;
    }

    let (client, events) = UserClient::connect(&settings.server_url).await?;
    tracing::info!(server_url = client.server_url(), "waiting for the user list");
    let mut session = Session::new(
        CommandRouter::new(client),
        events,
        Duration::from_secs(args.wait_secs),
    );
    session
        .wait_for(Awaited::UserList)
        .await
        .context("initial user list did not arrive")?;

    match args.command {
        CliCommand::List => {}
        CliCommand::Add(user) => {
            let form = session.router.form_mut();
            for (field, value) in user.provided() {
                form.set_field(field, value);
            }
            let submitted = session.router.form().values().clone();
            session.router.submit_add_or_update()?;
            session.wait_for(Awaited::Added(submitted)).await?;
        }
        CliCommand::Update { id, user } => {
            let id = UserId::new(id);
            if session.sync.table().row(&id).is_none() {
                bail!("no user with id {id}");
            }
            session
                .router
                .perform(RowAction::Edit(id.clone()), session.sync.table())?;
            let form = session.router.form_mut();
            for (field, value) in user.provided() {
                form.set_field(field, value);
            }
            session.router.submit_add_or_update()?;
            session.wait_for(Awaited::Updated(id)).await?;
        }
        CliCommand::Delete { id } => {
            let id = UserId::new(id);
            session.router.request_delete(id.clone())?;
            session.wait_for(Awaited::Deleted(id)).await?;
        }
        CliCommand::Watch => {
            render::print_table(session.sync.table(), args.json)?;
            return session.watch(args.json).await;
        }
    }

    render::print_table(session.sync.table(), args.json)
}
