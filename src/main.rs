//! The main entry point for the `seqren` command-line application.
//!
//! This file is responsible for parsing command-line arguments and dispatching
//! to the appropriate handler in the `seqren` library.

use seqren::cli::{self, Commands, FolderArgs};
use seqren::logging;
use seqren::preview::PreviewFormat;
use seqren::renamer::{self, RenameRequest};

fn main() -> anyhow::Result<()> {
    let args = cli::parse_args();
    logging::setup_logging(args.verbose);

    match args.command {
        Commands::Rename {
            folder,
            extract,
            auto,
            output,
            folder_name,
            pad,
            yes,
            dry_run,
            format,
        } => {
            let config = folder.config.clone();
            let request = RenameRequest {
                extract,
                auto,
                output,
                folder_name,
                yes,
                dry_run,
                pad,
                format: format.as_deref().map(PreviewFormat::from),
                ..request_for(folder)
            };
            renamer::run_rename(request, config)?;
        }
        Commands::Guess { folder } => {
            let config = folder.config.clone();
            renamer::run_guess(request_for(folder), config)?;
        }
    }
    Ok(())
}

fn request_for(folder: FolderArgs) -> RenameRequest {
    RenameRequest {
        path: folder.path,
        direct: folder.direct,
        stem: folder.stem,
        hidden: folder.hidden,
        ..Default::default()
    }
}
