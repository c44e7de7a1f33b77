use clap::Subcommand;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Create the database schema and the permission catalog
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Drop every table, then recreate the schema
        #[arg(long, conflicts_with = "delete")]
        reset: bool,

        /// Drop every table and stop
        #[arg(long)]
        delete: bool,

        /// Skip the confirmation prompt for --reset and --delete
        #[arg(long, short)]
        yes: bool,
    },

    /// Seed demo users, a school unit and the Journey course
    Seed {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Password given to every demo user
        #[arg(long, default_value = "demo123")]
        password: String,
    },

    /// Show record counts
    Info {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
