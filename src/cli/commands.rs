use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "maderogest")]
#[command(version, about = "Delivery work orders for a furniture workshop")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new workshop project in the current directory
    Init {
        /// Administrator email
        #[arg(long)]
        email: String,

        /// Administrator password
        #[arg(long)]
        password: String,

        /// Administrator display name
        #[arg(long, default_value = "Administrator")]
        name: String,

        /// Seed sample work orders
        #[arg(long)]
        demo: bool,
    },

    /// Sign in and remember the session for this checkout
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Forget the current session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Add a new work order
    Add {
        /// Work order name
        name: String,

        /// Delivery address
        #[arg(long)]
        place: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,

        /// Lifecycle state (pending, in_progress, done)
        #[arg(long, default_value = "pending")]
        state: String,

        /// Furniture item as "name[:quantity]" (repeatable)
        #[arg(long = "item", short = 'i')]
        items: Vec<String>,

        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit fields of an existing work order
    Edit(EditArgs),

    /// Mark a work order as delivered
    Deliver {
        /// Work order ID (or unique prefix)
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a work order (admin only)
    Delete {
        /// Work order ID (or unique prefix)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// List work orders, most pressing first
    List {
        /// View filter (all, urgent, warning, ok, done)
        #[arg(long, default_value = "all")]
        filter: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single work order
    Get {
        /// Work order ID (or unique prefix)
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the audit trail (admin only)
    History {
        /// Only entries for this work order
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Full-text search over names, places, notes and items
    Search {
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the daily summary of orders due soon
    Digest {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Local settings
    Config(ConfigCommand),

    /// Manage accounts (admin only)
    Users(UsersCommand),

    /// Import work orders from a JSON export
    Import {
        /// Path to a JSON array of work-order records
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Work order ID (or unique prefix)
    pub id: String,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New delivery address
    #[arg(long)]
    pub place: Option<String>,

    /// New due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// New lifecycle state (pending, in_progress, done)
    #[arg(long)]
    pub state: Option<String>,

    /// Replace the item list; "name[:quantity]", repeatable
    #[arg(long = "item", short = 'i')]
    pub items: Vec<String>,

    /// Remove every item
    #[arg(long, conflicts_with = "items")]
    pub clear_items: bool,

    /// New notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show or set the phone number the digest is addressed to
    Phone {
        /// New number; omit to show the current one
        number: Option<String>,

        /// Remove the configured number
        #[arg(long, conflicts_with = "number")]
        clear: bool,
    },
}

#[derive(Args, Debug)]
pub struct UsersCommand {
    #[command(subcommand)]
    pub action: UsersAction,
}

#[derive(Subcommand, Debug)]
pub enum UsersAction {
    /// List accounts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add an account
    Add {
        /// Display name
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Role (admin, operator)
        #[arg(long, default_value = "operator")]
        role: String,
    },

    /// Delete an account by ID or email
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}
