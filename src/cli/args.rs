//! Command-line interface definitions.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{ColorChoice, Parser, Subcommand};

/// Config file looked up when `-C` is not given
pub const DEFAULT_CONFIG: &str = "preview.toml";

/// Live preview for API documentation viewers
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, default_value = DEFAULT_CONFIG, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the viewer and push document updates to it
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },

    /// Inject the live-preview bootstrap into an HTML file (in place)
    #[command(visible_alias = "i")]
    Inject {
        #[command(flatten)]
        args: InjectArgs,
    },
}

/// `serve` arguments. Each overrides its `preview.toml` counterpart.
#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Document file (JSON or TOML) to watch and push
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub api: Option<PathBuf>,

    /// Directory holding the viewer's static files
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub viewer: Option<PathBuf>,

    /// Entry HTML file, relative to the viewer directory
    #[arg(long)]
    pub main_file: Option<PathBuf>,

    /// Network interface for the web server (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Web server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Regenerate and push on file changes
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub watch: Option<bool>,

    /// Open the entry page in the system browser once serving
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub open: Option<bool>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// `inject` arguments
#[derive(clap::Args, Debug, Clone)]
pub struct InjectArgs {
    /// HTML file to rewrite
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Host the bootstrap connects to (default: reload.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port of a running push server
    #[arg(short, long)]
    pub port: u16,

    /// Window event that triggers the connection (default: viewer.ready_event)
    #[arg(long)]
    pub ready_event: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_alias_and_watch_flag() {
        let cli = Cli::parse_from(["livedoc", "s", "-w"]);
        let Commands::Serve { args } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.watch, Some(true));
        assert_eq!(args.open, None);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG));
    }

    #[test]
    fn test_open_flag() {
        let cli = Cli::parse_from(["livedoc", "serve", "--open"]);
        let Commands::Serve { args } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.open, Some(true));

        let cli = Cli::parse_from(["livedoc", "serve", "-o", "false"]);
        let Commands::Serve { args } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.open, Some(false));
    }

    #[test]
    fn test_inject_requires_port() {
        assert!(Cli::try_parse_from(["livedoc", "inject", "index.html"]).is_err());
        let cli = Cli::try_parse_from(["livedoc", "i", "index.html", "-p", "54321"]).unwrap();
        let Commands::Inject { args } = cli.command else {
            panic!("expected inject");
        };
        assert_eq!(args.port, 54321);
        assert!(args.host.is_none());
    }
}
