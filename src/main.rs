use clap::Parser;
use maderogest::cli::{
    handle_add, handle_config_phone, handle_delete, handle_deliver, handle_digest, handle_edit,
    handle_get, handle_history, handle_import, handle_init, handle_list, handle_login,
    handle_logout, handle_search, handle_users_add, handle_users_delete, handle_users_list,
    handle_whoami, Cli, Commands, ConfigAction, UsersAction,
};
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr so `--json` output stays clean.
/// `RUST_LOG` overrides the default level.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("maderogest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            email,
            password,
            name,
            demo,
        } => handle_init(email, password, name, demo),
        Commands::Login { email, password } => handle_login(email, password),
        Commands::Logout => handle_logout(),
        Commands::Whoami => handle_whoami(),
        Commands::Add {
            name,
            place,
            due,
            state,
            items,
            notes,
            json,
        } => handle_add(name, place, due, state, items, notes, json),
        Commands::Edit(args) => handle_edit(args),
        Commands::Deliver { id, json } => handle_deliver(id, json),
        Commands::Delete { id, force } => handle_delete(id, force),
        Commands::List { filter, json } => handle_list(filter, json),
        Commands::Get { id, json } => handle_get(id, json),
        Commands::History { id, json } => handle_history(id, json),
        Commands::Search { query, json } => handle_search(query, json),
        Commands::Digest { json } => handle_digest(json),
        Commands::Config(config) => match config.action {
            ConfigAction::Phone { number, clear } => handle_config_phone(number, clear),
        },
        Commands::Users(users) => match users.action {
            UsersAction::List { json } => handle_users_list(json),
            UsersAction::Add {
                name,
                email,
                password,
                role,
            } => handle_users_add(name, email, password, role),
            UsersAction::Delete { id, force } => handle_users_delete(id, force),
        },
        Commands::Import { file } => handle_import(file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
