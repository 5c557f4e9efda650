use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "versatile-server", version, about = "Users REST backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve HTTP (default).
    Run,
    /// Database administration.
    Database {
        #[command(subcommand)]
        action: DatabaseAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum DatabaseAction {
    /// Create the database and grant the configured user.
    Create,
    /// Drop the database.
    Drop,
    /// Ensure collections and indexes exist.
    Migrate,
    /// Insert the admin user.
    Seed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_serving() {
        let cli = Cli::try_parse_from(["versatile-server"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn should_parse_database_actions() {
        let cli = Cli::try_parse_from(["versatile-server", "database", "seed"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Database {
                action: DatabaseAction::Seed
            })
        ));
    }
}
