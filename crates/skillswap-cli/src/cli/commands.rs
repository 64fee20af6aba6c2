use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use skillswap_types::RequestStatus;

#[derive(Parser)]
#[command(name = "skill-swap")]
#[command(author, version, about = "Trade skills for time credits with your community", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database file
    #[arg(long, global = true, env = "SKILLSWAP_DB_PATH", default_value = "skill_swap.db")]
    pub db: PathBuf,

    /// Where the login session is kept between invocations
    #[arg(long, global = true, env = "SKILLSWAP_SESSION_FILE", default_value = ".session")]
    pub session_file: PathBuf,

    /// Lifetime of new sessions, in hours (at most ten years)
    #[arg(
        long,
        global = true,
        env = "SKILLSWAP_SESSION_TTL_HOURS",
        default_value_t = skillswap_core::DEFAULT_SESSION_TTL_HOURS,
        value_parser = clap::value_parser!(i64).range(1..=skillswap_core::MAX_SESSION_TTL_HOURS),
        hide = true
    )]
    pub session_ttl_hours: i64,

    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new account
    Register {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        bio: Option<String>,

        /// Read the password from the first line of stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },

    /// Log in and remember the session
    Login {
        #[arg(long)]
        username: Option<String>,

        /// Read the password from the first line of stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },

    /// End the current session
    Logout,

    /// Browse and manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage the skills you offer
    Skill {
        #[command(subcommand)]
        action: SkillAction,
    },

    /// Book and manage service requests
    Request {
        #[command(subcommand)]
        action: RequestAction,
    },

    /// Rate completed services
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },

    /// Database administration
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// List all users
    List,

    /// Show a user's profile and skills
    View { id: i64 },

    /// Update your profile (pass an empty value to clear full name or bio)
    Update {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        bio: Option<String>,
    },

    /// Delete your account
    Delete {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SkillAction {
    /// Add a skill to your profile
    Add { name: String },

    /// Remove a skill from your profile
    Remove { id: i64 },

    /// List every skill with its number of providers
    List,

    /// List your own skills
    Mine,

    /// Show who offers a skill
    Browse { id: i64 },
}

#[derive(Subcommand)]
pub enum RequestAction {
    /// Request a service from another user
    Create {
        /// Provider user ID
        #[arg(long)]
        provider: i64,

        /// Skill ID
        #[arg(long)]
        skill: i64,

        /// Service time (YYYY-MM-DDTHH:MM)
        #[arg(long)]
        time: String,

        /// Duration in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: i64,

        /// Credit cost
        #[arg(long, allow_negative_numbers = true)]
        credit: i64,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List requests you are part of
    List {
        /// Show requests for this user instead
        #[arg(long)]
        user: Option<i64>,

        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Show a request with its reviews
    View { id: i64 },

    /// Change a request's status, notes or time
    Update {
        id: i64,

        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        #[arg(long)]
        notes: Option<String>,

        /// New service time (YYYY-MM-DDTHH:MM)
        #[arg(long)]
        time: Option<String>,
    },

    /// Delete a request
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ReviewAction {
    /// Review the other party of a completed request
    Add {
        #[arg(long)]
        request: i64,

        /// Rating from 1 to 5
        #[arg(long, allow_negative_numbers = true)]
        rating: i64,

        #[arg(long)]
        comments: String,
    },

    /// List reviews written by or about a user, or left on one of your requests
    #[command(group(ArgGroup::new("target").required(true).args(["reviewer", "reviewee", "request"])))]
    List {
        #[arg(long)]
        reviewer: Option<i64>,

        #[arg(long)]
        reviewee: Option<i64>,

        /// A request you are part of
        #[arg(long)]
        request: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum DbAction {
    /// Apply pending schema migrations
    Migrate,
    /// Insert the starter skill catalogue
    Seed,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl From<StatusArg> for RequestStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => Self::Pending,
            StatusArg::Accepted => Self::Accepted,
            StatusArg::Rejected => Self::Rejected,
            StatusArg::Completed => Self::Completed,
        }
    }
}
