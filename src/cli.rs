use crate::planner::Padding;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Batch rename files while preserving their sequence numbers.
///
/// `seqren` pulls the sequence number out of every file name in a folder using
/// a mask, writes it into a new name pattern, shows the result and undoes
/// everything if you decline.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Batch rename files while preserving their sequence numbers",
    long_about = "seqren - rename a folder of numbered files in one go.

A mask is a file name with the sequence number replaced by %s:
  image%s.img       matches image01.img, image02.img, ...
  Hawaii - %s.img   turns 01 into 'Hawaii - 01.img'

QUICK EXAMPLES:
  seqren rename ~/Pictures                          # Pick a folder, answer the prompts
  seqren rename -d ./trip -e 'image%s.img' -o 'Hawaii - %s.img'
  seqren rename -d ./trip --auto -o 'Day %s' --stem --pad auto --dry-run
  seqren guess ./trip                              # Show the inferred mask

Renames are only kept after you confirm them; answering 'n' restores every
original name, including the folder's."
)]
pub struct Args {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that reads a folder.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct FolderArgs {
    /// The folder holding the files. Without --direct, PATH is its parent and
    /// the folder is picked from a list.
    pub path: PathBuf,

    /// Use PATH itself as the folder to rename in.
    #[arg(short, long)]
    pub direct: bool,

    /// Apply masks to the name without its extension, and keep the extension.
    #[arg(long)]
    pub stem: bool,

    /// Include dot-files.
    #[arg(long)]
    pub hidden: bool,

    /// Path to a YAML configuration file.
    #[arg(short, long, env = "SEQREN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// The set of available commands for the `seqren` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rename files, preview the result and confirm or undo
    ///
    /// EXAMPLES:
    ///   seqren rename -d . -e 'my note (%s)' -o 'Note %s' --stem
    ///   seqren rename -d . --auto -o 'Track %s.mp3' --yes
    ///   seqren rename -d . -e 'IMG_%s.jpg' -o '%s.jpg' -n 'Holiday 2024'
    ///
    /// Missing masks and the optional folder name are asked for interactively.
    Rename {
        #[command(flatten)]
        folder: FolderArgs,

        /// The mask the current names follow, with the sequence number as %s.
        #[arg(short, long, conflicts_with = "auto")]
        extract: Option<String>,

        /// Infer the extractor from the first file's longest run of digits.
        #[arg(short, long)]
        auto: bool,

        /// The mask for the new names.
        #[arg(short, long)]
        output: Option<String>,

        /// Also rename the folder itself. Asked for when omitted and not using --yes.
        #[arg(short = 'n', long = "folder-name")]
        folder_name: Option<String>,

        /// Zero-pad numeric tokens: none, auto, or a width.
        #[arg(long)]
        pad: Option<Padding>,

        /// Keep the renames without asking.
        #[arg(short, long)]
        yes: bool,

        /// Show the plan and stop before renaming anything.
        #[arg(long)]
        dry_run: bool,

        /// The preview format (`text`, `json` or `csv`).
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Print the extractor mask seqren would infer for a folder
    ///
    /// EXAMPLES:
    ///   seqren guess -d ./trip
    ///   seqren guess -d ./album --stem
    Guess {
        #[command(flatten)]
        folder: FolderArgs,
    },
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
