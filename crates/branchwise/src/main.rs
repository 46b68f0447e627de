// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! branchwise: attribute each commit to the one branch it was written on
//!
//! Reads the branches of a local or remote repository, infers which branch
//! each one was cut from and reports every author's commits under the branch
//! that introduced them.

use anyhow::Context;
use branchwise::config::{Command, Config, ConfigCommand};
use branchwise::resolve::{ResolveRequest, resolve, write_report};
use branchwise::settings::Settings;
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Logs go to stderr so the JSON report on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(config).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let settings_path = config.settings_path();
    let mut settings = Settings::load(&settings_path).context("Failed to load settings")?;

    match &config.command {
        Some(Command::Config(ConfigCommand::Show)) => {
            let shown = serde_json::to_string_pretty(&settings.redacted())?;
            println!("{shown}");
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Set { key, value })) => {
            settings.set(key, value)?;
            settings.save(&settings_path)?;
            info!(key = %key, path = %settings_path.display(), "Updated settings");
            Ok(())
        }
        None => {
            config.validate()?;
            let request = ResolveRequest::from_config(&config, &settings, Utc::now())?;
            let report = resolve(&request)
                .await
                .with_context(|| format!("Failed to resolve {}", request.locator))?;
            write_report(&report, config.output.as_deref()).context("Failed to write report")
        }
    }
}
