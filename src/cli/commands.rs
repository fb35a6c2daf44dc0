use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedgrab")]
#[command(about = "RSS/Atom torrent feed poller with auto-download rules")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new feed URL (RSS, Atom or JSON Feed)
    Add {
        /// Feed URL to add
        url: String,
    },

    /// Remove a feed (interactive selection)
    Remove,

    /// List all feeds
    List,

    /// Show stored articles of a feed
    Articles {
        /// URL the feed was added with
        feed: String,

        /// Only show articles not yet marked read
        #[arg(long)]
        unread: bool,
    },

    /// Mark an article as read so rules no longer consider it
    Read {
        /// URL the feed was added with
        feed: String,

        /// Article guid as shown by `articles`
        guid: String,
    },

    /// Fetch all feeds, register new articles and queue rule matches
    Run {
        /// Dry run - show what would be queued without saving anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage auto-download rules
    Rule {
        #[command(subcommand)]
        action: RuleCommands,
    },

    /// Show the download queue
    Queue,
}

#[derive(Subcommand)]
pub enum RuleCommands {
    /// Add a rule matching article titles
    Add {
        /// Unique rule name
        name: String,

        /// Case-insensitive regex the title must match
        #[arg(long, default_value = "")]
        must_contain: String,

        /// Case-insensitive regex the title must not match
        #[arg(long, default_value = "")]
        must_not_contain: String,

        /// Only apply to the feed added with this URL
        #[arg(long)]
        feed: Option<String>,

        /// Store the rule disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Remove a rule by name
    Remove {
        name: String,
    },

    /// List all rules
    List,
}
