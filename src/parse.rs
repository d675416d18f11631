use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hooked-on-flies")]
#[command(about = "Admin back office for the fly pattern catalog")]
#[command(version)]
pub(crate) struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Serve the HTTP API and image proxy
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        addr: String,
    },

    #[command(flatten)]
    Admin(AdminCommand),
}

/// Commands that need the hosted store.
#[derive(Subcommand)]
pub(crate) enum AdminCommand {
    /// Describe and classify flies with the completion service
    Enrich {
        /// Fly ids to enrich
        ids: Vec<String>,

        /// Enrich every fly missing a description, categories or season
        #[arg(long, conflicts_with = "ids")]
        incomplete: bool,

        /// Number of flies sent concurrently
        #[arg(short, long, default_value = "3")]
        group_size: usize,

        /// Delay between groups in milliseconds
        #[arg(short, long, default_value = "1000")]
        delay: u64,

        /// Write a CSV report of per-fly outcomes
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Add name-only flies from a text file (one per line) or a CSV file
    Import { file: PathBuf },

    /// Search pictures for the first fly matching a name
    SearchImages {
        term: String,

        /// Use the Nth result (1-based) as the fly's image
        #[arg(long)]
        pick: Option<usize>,
    },

    /// Upload an image for a fly, creating the fly if the name is new
    UploadImage { name: String, path: PathBuf },

    /// Add an email to the waitlist
    Waitlist {
        email: String,

        #[arg(long)]
        name: Option<String>,
    },

    /// Record a data deletion request
    DeleteRequest { email: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrich_defaults() {
        let args = Args::try_parse_from(["hooked-on-flies", "enrich", "--incomplete"]).unwrap();
        match args.command {
            Command::Admin(AdminCommand::Enrich {
                ids,
                incomplete,
                group_size,
                delay,
                output,
            }) => {
                assert!(ids.is_empty());
                assert!(incomplete);
                assert_eq!(group_size, 3);
                assert_eq!(delay, 1000);
                assert!(output.is_none());
            }
            _ => panic!("expected enrich"),
        }
    }

    #[test]
    fn test_ids_conflict_with_incomplete() {
        assert!(Args::try_parse_from(["hooked-on-flies", "enrich", "fly-1", "--incomplete"]).is_err());
    }

    #[test]
    fn test_global_verbose() {
        let args =
            Args::try_parse_from(["hooked-on-flies", "search-images", "adams", "--pick", "2", "-v"])
                .unwrap();
        assert!(args.verbose);
        assert!(matches!(args.command, Command::Admin(AdminCommand::SearchImages { pick: Some(2), .. })));
    }
}
