//! Client-side command implementations for talking to a remote server.

mod account;
mod commands;
pub mod credentials;
pub mod form;
pub mod http_client;
pub mod pickers;
mod tag;

pub use account::{run_login, run_logout, run_register};
pub use commands::TagCommands;
pub use tag::{run_tag_add, run_tag_list, run_tag_remove, run_tag_rename};

/// Dispatch a `tag` subcommand.
pub fn run_tag_command(command: TagCommands) -> anyhow::Result<()> {
    match command {
        TagCommands::List { flat } => run_tag_list(flat),
        TagCommands::Add {
            name,
            parent_id,
            non_interactive,
        } => run_tag_add(name, parent_id, non_interactive),
        TagCommands::Rename {
            tag_id,
            name,
            non_interactive,
        } => run_tag_rename(tag_id, name, non_interactive),
        TagCommands::Remove {
            tag_id,
            non_interactive,
            yes,
            force,
        } => run_tag_remove(tag_id, non_interactive, yes, force),
    }
}
