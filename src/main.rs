// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::Map;
use tracing_subscriber::EnvFilter;

use the_labelwood::config::{load_settings, EngineSettings, Task};
use the_labelwood::engine::Session;
use the_labelwood::registry::TagRegistry;
use the_labelwood::state::AnnotationId;

struct Args {
    config: String,
    task: Option<String>,
    settings: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut positional = Vec::new();
    let mut settings = None;
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--settings" {
            let path = iter.next().context("--settings needs a file path")?;
            settings = Some(path.clone());
        } else {
            positional.push(arg.clone());
        }
    }
    let mut positional = positional.into_iter();
    let Some(config) = positional.next() else {
        bail!("missing config file");
    };
    let task = positional.next();
    if let Some(extra) = positional.next() {
        bail!("unexpected argument '{}'", extra);
    }
    Ok(Args {
        config,
        task,
        settings,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = env::args().collect();
    let args = match parse_args(&raw_args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!(
                "Usage: {} <config.xml> [task.json] [--settings settings.yaml]",
                raw_args.first().map(String::as_str).unwrap_or("the-labelwood")
            );
            std::process::exit(2);
        }
    };

    let settings = match &args.settings {
        Some(path) => load_settings(path)?,
        None => EngineSettings::default(),
    };

    let mut registry = TagRegistry::with_builtin_tags()?;
    if settings.registry.seal_after_builtin {
        registry.seal();
    }

    let markup = fs::read_to_string(&args.config)
        .with_context(|| format!("reading config {}", args.config))?;
    let task = match &args.task {
        Some(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("reading task {}", path))?;
            Task::from_json(&text)?
        }
        None => Task::new(1, Map::new()),
    };

    let mut session = Session::from_markup(Arc::new(registry), &markup, task, settings.build)?
        .with_flags(settings.feature_flags);
    for warning in session.tree().warnings() {
        eprintln!("warning: {}", warning);
    }

    let annotation = AnnotationId(1);
    session.open_annotation(annotation, Vec::new(), false)?;

    if let Some(rendered) = session.render(annotation)? {
        print!("{}", rendered.to_text());
    }

    let results = session.serialize(annotation)?;
    let payload: Vec<_> = results.iter().map(|result| result.to_value()).collect();
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
