use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "pkv")]
#[command(about = "Single-file paged hash-table key/value store")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new database file
    Create {
        /// Path of the database file to create
        path: String,

        /// Expected number of records; sizes the fixed page count
        elements: u64,
    },

    /// Print the value stored for a key
    Get {
        /// Path to the database file
        path: String,

        /// Key to look up (1-100 bytes)
        key: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Insert a record, overwriting any previous value for the key
    Set {
        /// Path to the database file
        path: String,

        /// Key to store under (1-100 bytes)
        key: String,

        /// Value to store (1-100 bytes)
        value: String,
    },

    /// Delete a record
    Del {
        /// Path to the database file
        path: String,

        /// Key to delete
        key: String,
    },

    /// Print a record's creation and last-modification timestamps
    Ts {
        /// Path to the database file
        path: String,

        /// Key to look up
        key: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print header-page metadata
    Info {
        /// Path to the database file
        path: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}
