use clap::Parser;

use std::path::PathBuf;

use tracing::Level;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "vault")]
#[command(about = "Read and add secrets in a vault account")]
pub struct Args {
    /// Override the server base URL from the config file
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the vault config directory (defaults to ~/.vault)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Default log level; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: Level,

    #[command(subcommand)]
    pub command: crate::Command,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "vault",
            "list",
            "--config-path",
            "/tmp/v",
            "--remote",
            "http://localhost:8443/api/",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.config_path, Some(PathBuf::from("/tmp/v")));
        assert_eq!(args.remote.unwrap().port(), Some(8443));
        assert_eq!(args.log_level, Level::DEBUG);
    }

    #[test]
    fn test_show_takes_ids() {
        let args = Args::try_parse_from(["vault", "show", "12", "3", "--critical"]).unwrap();
        match args.command {
            crate::Command::Show(show) => {
                assert_eq!(show.secret_id, 12);
                assert_eq!(show.group_id, 3);
                assert!(show.critical);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_init_requires_username() {
        assert!(Args::try_parse_from(["vault", "init"]).is_err());
    }
}
