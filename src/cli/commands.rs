use clap::Subcommand;

#[derive(Subcommand)]
pub enum TagCommands {
    /// List your tags as a hierarchy
    List {
        /// Print a flat list instead of the tree
        #[arg(long)]
        flat: bool,
    },

    /// Add a new tag
    Add {
        /// Tag name
        #[arg(long)]
        name: Option<String>,

        /// Parent tag ID (omit for a root tag)
        #[arg(long)]
        parent_id: Option<i64>,

        /// Skip interactive prompts (requires --name)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Rename an existing tag
    Rename {
        /// Tag ID to rename
        #[arg(long)]
        tag_id: Option<i64>,

        /// New tag name
        #[arg(long)]
        name: Option<String>,

        /// Skip interactive prompts (requires --tag-id and --name)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Remove a tag
    Remove {
        /// Tag ID to remove
        #[arg(long)]
        tag_id: Option<i64>,

        /// Skip interactive prompts (requires --tag-id)
        #[arg(long)]
        non_interactive: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,

        /// Delete even if the tag has children, reparenting them
        #[arg(long)]
        force: bool,
    },
}
