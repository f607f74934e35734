mod commands;
mod handlers;

pub use commands::{
    Cli, Commands, ConfigAction, ConfigCommand, EditArgs, UsersAction, UsersCommand,
};
pub use handlers::{
    handle_add, handle_config_phone, handle_delete, handle_deliver, handle_digest, handle_edit,
    handle_get, handle_history, handle_import, handle_init, handle_list, handle_login,
    handle_logout, handle_search, handle_users_add, handle_users_delete, handle_users_list,
    handle_whoami, TerminalConfirm,
};
