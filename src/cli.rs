//! Command-line arguments.
use camino::Utf8PathBuf;
use clap::Parser;

/// Default log directory, relative to the working directory
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Walks the order tree, writes machine work lists and archives finished orders.
#[derive(Parser, Debug)]
#[command(
    name = "listmaker",
    version,
    about = "Prepares cutting-machine work lists and tracks order completion",
    after_help = "Without START_DIR the SourceDir from the settings file is scanned.\nA missing settings file is created with defaults and the program exits."
)]
pub struct Args {
    /// Directory holding the order folders (overrides SourceDir)
    #[arg(value_name = "START_DIR")]
    pub start_dir: Option<Utf8PathBuf>,

    /// Settings file [default: listMaker_settings.xml next to the executable]
    #[arg(long, value_name = "PATH")]
    pub settings: Option<Utf8PathBuf>,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,

    /// Resolve and report only; leave finished orders where they are
    #[arg(long)]
    pub no_relocate: bool,

    /// Directory for log files
    #[arg(long, value_name = "DIR", default_value = DEFAULT_LOG_DIR)]
    pub log_dir: Utf8PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["listmaker"]);
        assert_eq!(args.start_dir, None);
        assert_eq!(args.settings, None);
        assert!(!args.debug);
        assert!(!args.no_relocate);
        assert_eq!(args.log_dir, Utf8PathBuf::from("logs"));
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "listmaker",
            "orders",
            "--settings",
            "/etc/listmaker.xml",
            "--debug",
            "--no-relocate",
            "--log-dir",
            "/var/log/listmaker",
        ]);
        assert_eq!(args.start_dir, Some(Utf8PathBuf::from("orders")));
        assert_eq!(args.settings, Some(Utf8PathBuf::from("/etc/listmaker.xml")));
        assert!(args.debug);
        assert!(args.no_relocate);
        assert_eq!(args.log_dir, Utf8PathBuf::from("/var/log/listmaker"));
    }
}
