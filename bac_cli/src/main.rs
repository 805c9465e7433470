use bac_core::*;
use chrono::{DateTime, Local, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bactrack")]
#[command(about = "Blood alcohol content tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current BAC estimate (default)
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set or replace your physical profile
    Profile {
        /// Gender (male, female)
        #[arg(long)]
        gender: String,

        /// Body weight
        #[arg(long)]
        weight: f64,

        /// Weight unit (lb, kg, stone)
        #[arg(long, default_value = "lb")]
        weight_unit: String,
    },

    /// Log a drink
    Add {
        /// Beverage volume
        #[arg(long)]
        amount: f64,

        /// Volume unit (oz, ml)
        #[arg(long, default_value = "oz")]
        unit: String,

        /// Alcohol by volume, percent
        #[arg(long)]
        abv: f64,

        /// When it was consumed (RFC 3339 or local "YYYY-MM-DDTHH:MM");
        /// defaults to now
        #[arg(long)]
        time: Option<String>,
    },

    /// List logged drinks, newest first
    List,

    /// Delete a drink by id
    Delete { id: i64 },

    /// Delete your profile and all logged drinks
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Export the drink log to CSV
    Export {
        /// Output file (defaults to drink_log.csv in the data directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    bac_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let tracker_path = data_dir.join("tracker.json");
    let estimator = Estimator::new(config.estimator.clone());

    match cli.command {
        Some(Commands::Status { json }) => cmd_status(&tracker_path, &estimator, json),
        Some(Commands::Profile {
            gender,
            weight,
            weight_unit,
        }) => cmd_profile(&tracker_path, &gender, weight, &weight_unit),
        Some(Commands::Add {
            amount,
            unit,
            abv,
            time,
        }) => cmd_add(&tracker_path, &estimator, amount, &unit, abv, time.as_deref()),
        Some(Commands::List) => cmd_list(&tracker_path),
        Some(Commands::Delete { id }) => cmd_delete(&tracker_path, id),
        Some(Commands::Clear { yes }) => cmd_clear(&tracker_path, yes),
        Some(Commands::Export { output }) => {
            let csv_path = output.unwrap_or_else(|| data_dir.join("drink_log.csv"));
            cmd_export(&tracker_path, &csv_path)
        }
        None => {
            // Default to "status" command
            cmd_status(&tracker_path, &estimator, false)
        }
    }
}

fn cmd_status(tracker_path: &Path, estimator: &Estimator, json: bool) -> Result<()> {
    let state = TrackerState::load(tracker_path)?;
    let report = estimator.report(state.profile.as_ref(), &state.beverages);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("BAC: {} ({})", report.bac, report.bac_level.as_str());
    println!("Time to zero: {}", report.time_to_zero);
    println!("Drinks logged: {}", state.beverages.len());

    if state.profile.is_none() {
        println!();
        println!("No profile set - run 'bactrack profile' first.");
    }

    Ok(())
}

fn cmd_profile(tracker_path: &Path, gender: &str, weight: f64, weight_unit: &str) -> Result<()> {
    let gender = parse_gender_arg(gender);
    let weight_unit = parse_weight_unit_arg(weight_unit);

    let profile = UserProfile {
        gender,
        weight,
        weight_unit,
    };

    TrackerState::update(tracker_path, |state| state.set_profile(profile.clone()))?;

    println!(
        "✓ Profile saved: {}, {} {}",
        match profile.gender {
            Some(Gender::Female) => "female",
            _ => "male",
        },
        profile.weight,
        profile.weight_unit.as_str()
    );

    Ok(())
}

fn cmd_add(
    tracker_path: &Path,
    estimator: &Estimator,
    amount: f64,
    unit: &str,
    abv: f64,
    time: Option<&str>,
) -> Result<()> {
    let volume_unit = parse_volume_unit_arg(unit);
    let consumed_time = match time {
        Some(s) => parse_time_arg(s)?,
        None => Utc::now(),
    };

    let id = TrackerState::update(tracker_path, |state| {
        state.add_beverage(amount, volume_unit, abv, consumed_time)
    })?;

    println!("✓ Logged drink {}", id);

    // Refreshed estimate, same as the status view
    let state = TrackerState::load(tracker_path)?;
    let report = estimator.report(state.profile.as_ref(), &state.beverages);
    println!(
        "BAC: {} ({}), time to zero: {}",
        report.bac,
        report.bac_level.as_str(),
        report.time_to_zero
    );

    Ok(())
}

fn cmd_list(tracker_path: &Path) -> Result<()> {
    let state = TrackerState::load(tracker_path)?;
    let drinks = state.beverages_newest_first();

    if drinks.is_empty() {
        println!("No drinks logged.");
        return Ok(());
    }

    for beverage in drinks {
        let local = beverage.consumed_time.with_timezone(&Local);
        println!(
            "{}  {}  {} {}  {}% ABV",
            beverage.id,
            local.format("%Y-%m-%d %H:%M"),
            beverage.amount,
            beverage.volume_unit.as_str(),
            beverage.abv
        );
    }

    Ok(())
}

fn cmd_delete(tracker_path: &Path, id: i64) -> Result<()> {
    let removed = TrackerState::update(tracker_path, |state| Ok(state.delete_beverage(id)))?;

    if removed {
        println!("✓ Deleted drink {}", id);
    } else {
        println!("No drink with id {} found.", id);
    }

    Ok(())
}

fn cmd_clear(tracker_path: &Path, yes: bool) -> Result<()> {
    if !yes {
        print!("This deletes your profile and all logged drinks. Continue? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    TrackerState::update(tracker_path, |state| {
        state.clear();
        Ok(())
    })?;

    println!("✓ Tracker cleared.");
    Ok(())
}

fn cmd_export(tracker_path: &Path, csv_path: &Path) -> Result<()> {
    let state = TrackerState::load(tracker_path)?;
    let count = write_drink_log(&state.beverages, csv_path)?;

    println!("✓ Exported {} drinks", count);
    println!("  CSV: {}", csv_path.display());

    Ok(())
}

/// Lossy gender parse with a visible warning when the fallback fires.
fn parse_gender_arg(s: &str) -> Option<Gender> {
    let gender = Gender::parse(s);
    if gender == Some(Gender::Male) && !s.trim().eq_ignore_ascii_case("male") {
        eprintln!("Unknown gender '{}'. Using the male distribution ratio.", s);
    }
    gender
}

/// Lossy weight-unit parse with a visible warning when the fallback fires.
fn parse_weight_unit_arg(s: &str) -> WeightUnit {
    let unit = WeightUnit::parse(s);
    if unit == WeightUnit::Grams && s != "g" {
        eprintln!("Unknown weight unit '{}'. Treating the value as grams.", s);
    }
    unit
}

/// Lossy volume-unit parse with a visible warning when the fallback fires.
fn parse_volume_unit_arg(s: &str) -> VolumeUnit {
    let unit = VolumeUnit::parse(s);
    if unit == VolumeUnit::Ml && s != "ml" {
        eprintln!(
            "Unknown volume unit '{}'. Treating the value as milliliters.",
            s
        );
    }
    unit
}

/// Accepts RFC 3339 or a naive local time like the original form field.
fn parse_time_arg(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, format) {
            if let Some(local) = Local.from_local_datetime(&naive).single() {
                return Ok(local.with_timezone(&Utc));
            }
        }
    }

    Err(Error::InvalidInput(format!(
        "could not parse time '{}': expected RFC 3339 or YYYY-MM-DDTHH:MM",
        s
    )))
}
