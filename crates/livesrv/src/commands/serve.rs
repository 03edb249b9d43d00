//! Serve command: the only thing `livesrv` does.

use std::path::PathBuf;

use clap::Args;
use livesrv_config::{CliSettings, Config};
use livesrv_server::{LiveServer, open_browser, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for serving a directory.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Directory to serve (default: current directory, or `server.root`).
    root: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover livesrv.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long, env = "LIVESRV_HOST")]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long, env = "LIVESRV_PORT")]
    port: Option<u16>,

    /// Do not open a browser window.
    #[arg(long)]
    no_browser: bool,

    /// Disable live reload (serve files only).
    #[arg(long)]
    no_live_reload: bool,

    /// Use a custom reload client instead of the bundled one.
    #[arg(long)]
    inject_file: Option<PathBuf>,

    /// Watch by polling instead of native file system events.
    #[arg(long)]
    poll: bool,

    /// Polling interval in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Glob pattern to ignore, relative to the root (repeatable).
    #[arg(long = "ignore", value_name = "GLOB")]
    ignore: Vec<String>,

    /// Enable verbose output (log every request and change).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Load configuration, start the server and block until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let config_path = self.config.clone();
        let cli_settings = self.into_cli_settings();
        let config = Config::load(config_path.as_deref(), Some(&cli_settings))?;

        if let Some(path) = &config.config_path {
            output.detail(&format!("Config: {}", path.display()));
        }

        let server = LiveServer::bind(server_config_from_config(&config)).await?;
        output.success(&server.banner());
        if !config.live_reload.enabled {
            output.detail("Live reload: disabled");
        }

        if server.wants_browser() {
            open_browser(server.url());
        }

        server.serve().await?;
        Ok(())
    }

    /// Convert flags into config overrides. Flags left at their defaults do
    /// not override the file.
    fn into_cli_settings(self) -> CliSettings {
        CliSettings {
            host: self.host,
            port: self.port,
            root_dir: self.root,
            open_browser: self.no_browser.then_some(false),
            live_reload_enabled: self.no_live_reload.then_some(false),
            inject_file: self.inject_file,
            poll: self.poll.then_some(true),
            interval_ms: self.interval_ms,
            ignore: self.ignore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        serve: ServeArgs,
    }

    fn parse(args: &[&str]) -> ServeArgs {
        TestCli::try_parse_from(std::iter::once("livesrv").chain(args.iter().copied()))
            .unwrap()
            .serve
    }

    #[test]
    fn test_no_flags_override_nothing() {
        let settings = parse(&[]).into_cli_settings();
        assert_eq!(settings.root_dir, None);
        assert_eq!(settings.open_browser, None);
        assert_eq!(settings.live_reload_enabled, None);
        assert_eq!(settings.poll, None);
        assert!(settings.ignore.is_empty());
    }

    #[test]
    fn test_flags_become_overrides() {
        let settings = parse(&[
            "public",
            "--port",
            "3000",
            "--host",
            "0.0.0.0",
            "--no-browser",
            "--no-live-reload",
            "--poll",
            "--interval-ms",
            "500",
            "--ignore",
            "*.log",
            "--ignore",
            "drafts/**",
        ])
        .into_cli_settings();

        assert_eq!(settings.root_dir, Some(PathBuf::from("public")));
        assert_eq!(settings.port, Some(3000));
        assert_eq!(settings.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(settings.open_browser, Some(false));
        assert_eq!(settings.live_reload_enabled, Some(false));
        assert_eq!(settings.poll, Some(true));
        assert_eq!(settings.interval_ms, Some(500));
        assert_eq!(settings.ignore, vec!["*.log", "drafts/**"]);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result =
            TestCli::try_parse_from(["livesrv", "--port", "70000"]).map(|cli| cli.serve.verbose);
        assert!(result.is_err());
    }
}
