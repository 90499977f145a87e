use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use storefront_core::{Session, SubjectKind};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON config file. Falls back to STOREFRONT_* variables.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print Prometheus counters after the run.
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate an admin guard against a session.
    Guard(GuardArgs),
    /// Toggle a reaction against an in-memory store.
    React(ReactArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionArg {
    Unresolved,
    Anonymous,
    Authenticated,
}

#[derive(Args, Debug)]
pub struct GuardArgs {
    #[arg(long, value_enum, default_value_t = SessionArg::Authenticated)]
    pub session: SessionArg,

    #[arg(long, default_value = "console")]
    pub actor: String,

    #[arg(long, default_value = "user")]
    pub role: String,

    /// Defaults to the configured admin role.
    #[arg(long)]
    pub required: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub times: usize,
}

impl GuardArgs {
    pub fn session(&self) -> Session {
        match self.session {
            SessionArg::Unresolved => Session::Unresolved,
            SessionArg::Anonymous => Session::Anonymous,
            SessionArg::Authenticated => {
                Session::authenticated(self.actor.as_str(), self.role.as_str())
            }
        }
    }
}

#[derive(Args, Debug)]
pub struct ReactArgs {
    #[arg(long, default_value = "product")]
    pub kind: SubjectKind,

    #[arg(long)]
    pub id: String,

    /// Omit to toggle as an anonymous visitor.
    #[arg(long)]
    pub actor: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub count: u64,

    #[arg(long, default_value_t = 1)]
    pub times: usize,

    #[arg(long)]
    pub fail_writes: bool,
}

impl ReactArgs {
    pub fn session(&self) -> Session {
        match &self.actor {
            Some(actor) => Session::authenticated(actor.as_str(), "user"),
            None => Session::Anonymous,
        }
    }
}
