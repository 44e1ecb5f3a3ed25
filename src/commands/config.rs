use anyhow::Result;
use icsview_core::IcsviewConfig;
use owo_colors::OwoColorize;

pub fn run() -> Result<()> {
    let config_path = IcsviewConfig::config_path().map_err(|e| anyhow::anyhow!(e))?;
    let options = IcsviewConfig::load()
        .and_then(|config| config.options())
        .map_err(|e| anyhow::anyhow!(e))?;

    let status = if config_path.exists() { "" } else { " (not found, using defaults)" };

    println!("{}", "Paths".bold());
    println!("  Config:         {}{}", config_path.display(), status.dimmed());
    println!();
    println!("{}", "Options".bold());
    println!("  Timezone:       {}", options.local_tz.name());
    println!("  Max instances:  {}", options.max_instances);
    println!("  Lookbehind:     {}", format_lookbehind(options.lookbehind));

    Ok(())
}

fn format_lookbehind(lookbehind: chrono::Duration) -> String {
    match lookbehind.to_std() {
        Ok(d) => humantime::format_duration(d).to_string(),
        Err(_) => lookbehind.to_string(),
    }
}
