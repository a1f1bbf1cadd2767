//! CLI type definitions.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "tablo-rescue", version)]
#[command(about = "Rescue recordings from a Tablo external drive", long_about = None)]
#[command(after_help = "Relies on the contents of the Tablo.db file, which is only updated when \
the user presses the reset button, so it can often be out of date. Only Gen 3 or older Tablos \
are supported; Gen 4 recordings are non-exportable.")]
pub(crate) struct Cli {
    /// Path to the Tablo external drive mount point
    #[arg(value_name = "PATH")]
    pub tablo: PathBuf,

    /// Store rescued videos in DIR (default: settings file, then ~/Videos)
    #[arg(short, long, value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// Only rescue (or inspect) the recording(s) with the given id(s)
    #[arg(short = 'I', long = "id", value_name = "N", num_args = 1..)]
    pub ids: Vec<i64>,

    /// Overwrite any existing output file
    #[arg(short, long)]
    pub force: bool,

    /// Show information about recordings in the Tablo database instead of
    /// rescuing; with --id, show full details of the selected recordings
    #[arg(short = 'D', long)]
    pub dump: bool,

    /// Path to the Tablo DB (default: <PATH>/db/Tablo.db)
    #[arg(long, value_name = "FILE")]
    pub dbfile: Option<PathBuf>,

    /// Show progress messages
    #[arg(short, long)]
    pub verbose: bool,

    /// Show debug messages (timestamps + debug-level logging)
    #[arg(short, long, conflicts_with = "verbose")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ids_and_flags() {
        let cli = Cli::try_parse_from([
            "tablo-rescue", "/mnt/tablo", "-I", "12", "34", "-f", "-o", "/out",
        ])
        .unwrap();
        assert_eq!(cli.tablo, PathBuf::from("/mnt/tablo"));
        assert_eq!(cli.ids, vec![12, 34]);
        assert!(cli.force);
        assert!(!cli.dump);
        assert_eq!(cli.outdir, Some(PathBuf::from("/out")));
    }

    #[test]
    fn test_dump_with_dbfile() {
        let cli =
            Cli::try_parse_from(["tablo-rescue", "-D", "--dbfile", "/tmp/x.db", "/mnt"]).unwrap();
        assert!(cli.dump);
        assert!(cli.ids.is_empty());
        assert_eq!(cli.dbfile, Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn test_verbose_conflicts_with_debug() {
        assert!(Cli::try_parse_from(["tablo-rescue", "-v", "-d", "/mnt"]).is_err());
    }

    #[test]
    fn test_ids_must_be_numbers() {
        assert!(Cli::try_parse_from(["tablo-rescue", "/mnt", "--id", "abc"]).is_err());
    }
}
