use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for the `carbon` binary.
#[derive(Debug, Parser)]
#[command(name = "carbon", version, about = "Record activities and estimate their CO2e emissions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Ledger file (defaults to the configured ledger_path)
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// User id to record under (defaults to the configured default_user)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Quiet mode (errors only in the log)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Estimate emissions for one activity and record the result
    Calculate {
        /// energy, transport, materials, waste, water
        #[arg(long)]
        category: String,

        /// Amount in `unit`; must be a non-negative number
        #[arg(long, allow_hyphen_values = true)]
        quantity: String,

        /// e.g. kwh, km, kg, ton, m3, liter
        #[arg(long)]
        unit: String,

        /// e.g. solar, bus, steel, recycling, treatment
        #[arg(long)]
        subcategory: Option<String>,

        /// direct, indirect, other (defaults to the configured default_scope)
        #[arg(long)]
        scope: Option<String>,

        /// Print the result without recording it
        #[arg(long)]
        no_save: bool,
    },

    /// Process a raw JSON request body (`-` reads stdin)
    Request {
        body: String,

        /// Print the result without recording it
        #[arg(long)]
        no_save: bool,
    },

    /// List the user's recorded emissions, newest first
    History,

    /// Totals for the user, by category and scope
    Summary,

    /// Delete every recorded emission of the user
    Reset,

    /// Show the emission factor table
    Factors {
        /// Only this category
        #[arg(long)]
        category: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn calculate_parses_with_global_flags() {
        let cli = Cli::try_parse_from([
            "carbon",
            "--user",
            "ana@example.com",
            "calculate",
            "--category",
            "transport",
            "--quantity",
            "10",
            "--unit",
            "km",
            "--scope",
            "indirect",
            "--no-save",
        ])
        .expect("cli should parse");

        assert_eq!(cli.user.as_deref(), Some("ana@example.com"));
        match cli.command {
            Commands::Calculate {
                category,
                quantity,
                subcategory,
                scope,
                no_save,
                ..
            } => {
                assert_eq!(category, "transport");
                assert_eq!(quantity, "10");
                assert_eq!(subcategory, None);
                assert_eq!(scope.as_deref(), Some("indirect"));
                assert!(no_save);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn negative_quantity_reaches_validation() {
        let cli = Cli::try_parse_from([
            "carbon", "calculate", "--category", "energy", "--quantity", "-3", "--unit", "kwh",
        ])
        .expect("cli should parse");
        assert!(matches!(cli.command, Commands::Calculate { ref quantity, .. } if quantity == "-3"));
    }

    #[test]
    fn calculate_requires_unit() {
        let result = Cli::try_parse_from(["carbon", "calculate", "--category", "energy", "--quantity", "3"]);
        assert!(result.is_err());
    }
}
