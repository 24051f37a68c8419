//! `livedoc inject`: one-shot injection against an existing HTML file.
//!
//! Rewrites the file in place. Point it at a copy, never at the only
//! version of a viewer's entry page.

use anyhow::{Context, Result};

use super::InjectArgs;
use crate::config::PreviewConfig;
use crate::inject::ScriptInjector;
use crate::log;

pub fn run_inject(args: &InjectArgs, config: &PreviewConfig) -> Result<()> {
    let host = args.host.as_deref().unwrap_or(&config.reload.host);
    let ready_event = args
        .ready_event
        .as_deref()
        .unwrap_or(&config.viewer.ready_event);

    ScriptInjector::new(host, args.port)
        .with_ready_event(ready_event)
        .inject(&args.file)
        .with_context(|| format!("Failed to inject into {}", args.file.display()))?;

    log!("inject"; "{} -> ws://{}:{}", args.file.display(), host, args.port);
    Ok(())
}
