// File: snapsync/src/scheduler/cron.rs
use anyhow::{anyhow, Result};
use tracing::debug;

const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Field bounds plus the names accepted in place of numbers (first name = `min`)
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
}

const FIELDS: [FieldSpec; 6] = [
    FieldSpec { name: "second", min: 0, max: 59, names: &[] },
    FieldSpec { name: "minute", min: 0, max: 59, names: &[] },
    FieldSpec { name: "hour", min: 0, max: 23, names: &[] },
    FieldSpec { name: "day", min: 1, max: 31, names: &[] },
    FieldSpec { name: "month", min: 1, max: 12, names: &MONTH_NAMES },
    FieldSpec { name: "dayofweek", min: 0, max: 7, names: &DAY_NAMES },
];

/// Bring a job's cron expression to the 6-field form tokio-cron-scheduler
/// expects (sec min hour day month dow). Classic 5-field expressions get a
/// `0` seconds field.
pub fn normalize_schedule(schedule: &str) -> Result<String> {
    let parts: Vec<&str> = schedule.split_whitespace().collect();

    let normalized = match parts.len() {
        5 => format!("0 {}", parts.join(" ")),
        6 => parts.join(" "),
        n => {
            return Err(anyhow!(
                "Expected 5 fields (minute hour day month dayofweek) or 6 fields (with leading second). Got {} fields: '{}'",
                n,
                schedule
            ))
        }
    };

    validate_6_field_cron(&normalized)?;
    Ok(normalized)
}

pub fn validate_6_field_cron(schedule: &str) -> Result<()> {
    let parts: Vec<&str> = schedule.split_whitespace().collect();

    if parts.len() != 6 {
        return Err(anyhow!(
            "tokio-cron-scheduler requires exactly 6 fields: second minute hour day month dayofweek. Got {} fields: '{}'",
            parts.len(),
            schedule
        ));
    }

    for (field, spec) in parts.iter().zip(FIELDS.iter()) {
        validate_cron_field(field, spec)?;
    }

    debug!(
        "Validated 6-field cron: '{}' → sec:{} min:{} hour:{} day:{} month:{} dow:{}",
        schedule, parts[0], parts[1], parts[2], parts[3], parts[4], parts[5]
    );

    Ok(())
}

fn validate_cron_field(field: &str, spec: &FieldSpec) -> Result<()> {
    let FieldSpec { name, min, max, .. } = *spec;

    if field == "*" || field == "?" {
        return Ok(());
    }

    // Lists may mix single values, ranges and steps: "1,5-7,*/15"
    if field.contains(',') {
        for part in field.split(',') {
            validate_cron_field(part, spec)?;
        }
        return Ok(());
    }

    let (base, step) = match field.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (field, None),
    };

    if let Some(step) = step {
        let step = step
            .parse::<u32>()
            .map_err(|_| anyhow!("Invalid {} step value: {}", name, step))?;
        if step == 0 {
            return Err(anyhow!("{} step value cannot be 0", name));
        }
        if base == "*" {
            return Ok(());
        }
    }

    if let Some((start, end)) = base.split_once('-') {
        let start = parse_value(start, spec, "range start")?;
        let end = parse_value(end, spec, "range end")?;

        if start < min || start > max || end < min || end > max {
            return Err(anyhow!(
                "{} range {}-{} is outside valid range {}-{}",
                name,
                start,
                end,
                min,
                max
            ));
        }
        if start > end {
            return Err(anyhow!("{} range {}-{} is reversed", name, start, end));
        }
        return Ok(());
    }

    let value = parse_value(base, spec, "value")?;
    if value < min || value > max {
        return Err(anyhow!(
            "{} value {} is outside valid range {}-{}",
            name,
            value,
            min,
            max
        ));
    }

    Ok(())
}

fn parse_value(raw: &str, spec: &FieldSpec, what: &str) -> Result<u32> {
    if let Ok(value) = raw.parse::<u32>() {
        return Ok(value);
    }
    spec.names
        .iter()
        .position(|named| named.eq_ignore_ascii_case(raw))
        .map(|index| spec.min + index as u32)
        .ok_or_else(|| anyhow!("Invalid {} {}: {}", spec.name, what, raw))
}
