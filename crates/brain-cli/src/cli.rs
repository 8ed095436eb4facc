//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

/// Self-tracking accrual economy.
///
/// Tell brain what you are doing; productive time earns currency, relaxing
/// spends it, and a streak multiplier softens the spending.
#[derive(Debug, Parser)]
#[command(name = "brain", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replace the active selection. Omitted fields are cleared.
    Set {
        /// Where you are (e.g. Home).
        #[arg(short, long)]
        location: Option<String>,

        /// How you are moving (e.g. Stationary).
        #[arg(short, long)]
        movement: Option<String>,

        /// An activity; repeat for several at once.
        #[arg(short, long = "activity", value_name = "ACTIVITY")]
        activities: Vec<String>,
    },

    /// Turn one activity on or off, keeping the rest of the selection.
    Toggle {
        /// The activity label.
        activity: String,
    },

    /// Stop all activities, keeping location and movement.
    Clear,

    /// Accrue time for the running session.
    Tick,

    /// Show balance, multiplier, streak and the running session.
    Status,

    /// Summarize recorded sessions.
    Report {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the full state as JSON.
    Export,

    /// Delete all tracked data.
    Reset {
        /// Confirm the reset.
        #[arg(long)]
        yes: bool,
    },

    /// List locations, movements and activities with their rates.
    Options,

    /// Set how an activity is classified.
    #[command(group(
        ArgGroup::new("kind")
            .required(true)
            .args(["productive", "relax", "neutral"])
    ))]
    Define {
        /// The activity label.
        label: String,

        /// Earn this much per minute.
        #[arg(long, value_name = "RATE")]
        productive: Option<f64>,

        /// Spend this much per minute.
        #[arg(long, value_name = "RATE")]
        relax: Option<f64>,

        /// Neither earn nor spend.
        #[arg(long)]
        neutral: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn set_collects_repeated_activities() {
        let cli = Cli::try_parse_from([
            "brain", "set", "-l", "Home", "-a", "Work", "--activity", "Phone",
        ])
        .unwrap();
        let Some(Commands::Set {
            location,
            movement,
            activities,
        }) = cli.command
        else {
            panic!("expected set");
        };
        assert_eq!(location.as_deref(), Some("Home"));
        assert_eq!(movement, None);
        assert_eq!(activities, ["Work", "Phone"]);
    }

    #[test]
    fn define_requires_exactly_one_kind() {
        assert!(Cli::try_parse_from(["brain", "define", "Piano"]).is_err());
        assert!(
            Cli::try_parse_from(["brain", "define", "Piano", "--neutral", "--relax", "1"]).is_err()
        );
        assert!(Cli::try_parse_from(["brain", "define", "Piano", "--productive", "3"]).is_ok());
    }
}
