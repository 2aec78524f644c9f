use anyhow::{Context, Result};
use clap::Parser;
use pagekeep_common::observability::{LogConfig, LogFormat, init_logging};
use pagekeep_config::{PagekeepConfig, PagekeepConfigLoader, default_config_path};
use pagekeep_runtime::{PagekeepRuntime, RuntimeOptions};
use std::path::PathBuf;
use std::time::Duration;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn load_config(path: Option<&PathBuf>) -> Result<PagekeepConfig> {
    let loader = match (path, default_config_path()) {
        (Some(explicit), _) => PagekeepConfigLoader::new().with_file(explicit),
        (None, Some(default)) => PagekeepConfigLoader::new().with_optional_file(default),
        (None, None) => PagekeepConfigLoader::new(),
    };
    loader.load().context("loading configuration")
}

fn log_config(cfg: &PagekeepConfig, verbose: bool) -> Result<LogConfig> {
    let format: LogFormat = cfg
        .logging
        .format
        .parse()
        .map_err(anyhow::Error::msg)
        .context("logging.format")?;
    Ok(LogConfig {
        app_name: "pagekeep",
        log_dir: cfg.logging.dir.as_ref().map(PathBuf::from),
        emit_stderr: verbose || cfg.logging.stderr,
        format,
        default_filter: cfg.logging.level.clone(),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_ref())?;
    init_logging(log_config(&cfg, cli.verbose)?)?;

    let runtime = PagekeepRuntime::build(RuntimeOptions::default())?;
    runtime.cancel_on_ctrl_c();
    let handle = runtime.handle();

    let result = match cli.command {
        Commands::Extract {
            url,
            html_file,
            mode,
            no_full_content,
            max_chars,
            pretty,
        } => {
            commands::override_max_chars(&mut cfg, max_chars)?;
            let args = commands::ExtractArgs {
                url,
                html_file,
                mode,
                no_full_content,
                pretty,
            };
            runtime.block_on(commands::extract(&cfg, &handle, args))
        }
        Commands::Normalize {
            html_file,
            max_chars,
        } => {
            commands::override_max_chars(&mut cfg, max_chars)?;
            commands::normalize(&cfg, &html_file)
        }
    };

    runtime.shutdown(Duration::from_millis(250));

    match result {
        Ok(out) => {
            println!("{out}");
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "app.command_failed");
            Err(err)
        }
    }
}
