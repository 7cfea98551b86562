use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the duration of media files
    Probe {
        /// Files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Extract the audio track of video files next to the originals
    Extract {
        /// Video files, or directories to search for video files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Concatenate files in order without re-encoding
    Merge {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Files to merge, in order (duplicates are ignored)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Move the file at this position one place earlier (applied first, in order)
        #[arg(long = "move-up", value_name = "INDEX")]
        move_up: Vec<usize>,

        /// Move the file at this position one place later (applied after --move-up)
        #[arg(long = "move-down", value_name = "INDEX")]
        move_down: Vec<usize>,
    },

    /// Copy the range between two times into a new file
    Trim {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Start time (MM:SS or HH:MM:SS)
        #[arg(short, long)]
        start: String,

        /// End time (MM:SS or HH:MM:SS)
        #[arg(short, long)]
        end: String,
    },

    /// Split a file in two at the given time
    Split {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Split time (MM:SS or HH:MM:SS)
        #[arg(short, long)]
        at: String,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(default_value = "config.toml")]
        path: PathBuf,
    },
}
