use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use icsview_core::time::parse_tzid;
use icsview_core::{IcsviewConfig, QueryWindow, parse_occurrences_with};

use crate::render;

pub struct Args {
    pub file: PathBuf,
    pub from: Option<String>,
    pub to: Option<String>,
    pub tz: Option<String>,
    pub max_instances: Option<u16>,
    pub json: bool,
}

pub fn run(args: Args) -> Result<()> {
    let mut options = IcsviewConfig::load()
        .and_then(|config| config.options())
        .context("Failed to load config")?;

    if let Some(name) = &args.tz {
        options.local_tz = parse_tzid(name).with_context(|| format!("Invalid --tz '{}'", name))?;
    }
    if let Some(max) = args.max_instances {
        options.max_instances = max;
    }

    let window = QueryWindow::from_args(args.from.as_deref(), args.to.as_deref(), options.local_tz)
        .map_err(|e| anyhow::anyhow!(e))?;

    let content = read_input(&args.file)?;

    let mut occurrences = parse_occurrences_with(&content, &window, &options);
    occurrences.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.summary.cmp(&b.summary)));
    tracing::debug!(
        count = occurrences.len(),
        from = %window.start,
        to = %window.end,
        tz = options.local_tz.name(),
        "Expanded calendar"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
    } else {
        render::print_agenda(&occurrences, options.local_tz);
    }

    Ok(())
}

fn read_input(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read calendar from stdin")?;
        return Ok(content);
    }

    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}
