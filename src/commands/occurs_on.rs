use anyhow::{Context, Result};
use chrono::NaiveDate;
use icsview_core::{Schedule, occurs_on_date};

pub fn run(date: &str, schedule: Option<&str>) -> Result<()> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Expected YYYY-MM-DD", date))?;

    let schedule: Option<Schedule> = schedule
        .map(serde_json::from_str::<Schedule>)
        .transpose()
        .context("Invalid schedule JSON")?;

    println!("{}", occurs_on_date(schedule.as_ref(), date));

    Ok(())
}
