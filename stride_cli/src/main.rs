use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stride_core::*;

#[derive(Parser)]
#[command(name = "stride")]
#[command(about = "Running training plan editor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a generated plan (settings + plan JSON from the generator)
    Adopt {
        /// Path to the generation settings JSON
        #[arg(long)]
        settings: PathBuf,

        /// Path to the generated plan JSON
        #[arg(long)]
        plan: PathBuf,
    },

    /// Import a previously exported plan document
    Import {
        /// Path to the document JSON
        file: PathBuf,
    },

    /// Export the current plan document
    Export {
        /// Destination path (stdout when omitted)
        file: Option<PathBuf>,
    },

    /// Print the current training calendar
    Show,

    /// Add a workout to a day
    Add {
        #[arg(long)]
        week: u32,

        /// Day of week (mon..sun)
        #[arg(long)]
        day: String,

        /// Workout type (rest, easy, long, interval, tempo, race, strength)
        #[arg(long = "type")]
        kind: String,

        /// Distance in the plan's current unit
        #[arg(long, conflicts_with = "time")]
        distance: Option<f64>,

        /// Duration in minutes
        #[arg(long, conflicts_with = "distance")]
        time: Option<f64>,

        #[arg(long)]
        nickname: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Edit a workout in place
    Edit {
        #[arg(long)]
        week: u32,

        #[arg(long)]
        day: String,

        /// Position within the day, 0-based
        #[arg(long)]
        index: usize,

        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long, conflicts_with = "time")]
        distance: Option<f64>,

        #[arg(long, conflicts_with = "distance")]
        time: Option<f64>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Set or clear a workout's nickname
    Nickname {
        #[arg(long)]
        week: u32,

        #[arg(long)]
        day: String,

        #[arg(long)]
        index: usize,

        /// New nickname; omit to clear
        name: Option<String>,
    },

    /// Remove a workout
    Remove {
        #[arg(long)]
        week: u32,

        #[arg(long)]
        day: String,

        #[arg(long)]
        index: usize,
    },

    /// Reorder a workout within its day
    Reorder {
        #[arg(long)]
        week: u32,

        #[arg(long)]
        day: String,

        #[arg(long)]
        from: usize,

        #[arg(long)]
        to: usize,
    },

    /// Move a workout to another day, possibly another week
    Move {
        #[arg(long)]
        from_week: u32,

        #[arg(long)]
        from_day: String,

        #[arg(long)]
        from_index: usize,

        #[arg(long)]
        to_week: u32,

        #[arg(long)]
        to_day: String,

        /// Position in the destination day (appends when omitted)
        #[arg(long)]
        to_index: Option<usize>,
    },

    /// Switch the plan's display unit (km, miles)
    Unit { unit: String },

    /// Discard the current plan and its persisted state
    Reset,
}

fn main() {
    stride_core::logging::init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("using data dir {:?}", data_dir);
    let mut session = Session::open(&data_dir)?;

    match cli.command {
        Commands::Adopt { settings, plan } => cmd_adopt(&mut session, &settings, &plan),
        Commands::Import { file } => cmd_import(&mut session, &file),
        Commands::Export { file } => cmd_export(&session, file.as_deref()),
        Commands::Show => cmd_show(&session),
        Commands::Add {
            week,
            day,
            kind,
            distance,
            time,
            nickname,
            description,
        } => {
            let spec = WorkoutSpec {
                kind: parse_kind(&kind)?,
                measure: measure_from(distance, time),
                nickname,
                description,
            };
            let day = parse_day(&day)?;
            session.add_workout(week, day, spec)?;
            println!("✓ Added workout to week {week}, {day}");
            print_week_total(&session, week);
            Ok(())
        }
        Commands::Edit {
            week,
            day,
            index,
            kind,
            distance,
            time,
            description,
        } => {
            let update = WorkoutUpdate {
                kind: kind.as_deref().map(parse_kind).transpose()?,
                measure: measure_from(distance, time),
                description,
            };
            let day = parse_day(&day)?;
            session.update_workout(week, day, index, update)?;
            println!("✓ Updated workout {index} in week {week}, {day}");
            print_week_total(&session, week);
            Ok(())
        }
        Commands::Nickname {
            week,
            day,
            index,
            name,
        } => {
            let day = parse_day(&day)?;
            session.update_nickname(week, day, index, name.as_deref().unwrap_or(""))?;
            println!("✓ Updated nickname for workout {index} in week {week}, {day}");
            Ok(())
        }
        Commands::Remove { week, day, index } => {
            let day = parse_day(&day)?;
            let removed = session.remove_workout(week, day, index)?;
            println!("✓ Removed {} workout from week {week}, {day}", removed.kind.key());
            print_week_total(&session, week);
            Ok(())
        }
        Commands::Reorder {
            week,
            day,
            from,
            to,
        } => {
            let day = parse_day(&day)?;
            session.reorder_within_day(week, day, from, to)?;
            println!("✓ Reordered week {week}, {day}: {from} → {to}");
            Ok(())
        }
        Commands::Move {
            from_week,
            from_day,
            from_index,
            to_week,
            to_day,
            to_index,
        } => {
            let from_day = parse_day(&from_day)?;
            let to_day = parse_day(&to_day)?;
            session.move_workout(
                from_week,
                from_day,
                from_index,
                to_week,
                to_day,
                to_index.unwrap_or(usize::MAX),
            )?;
            println!("✓ Moved workout to week {to_week}, {to_day}");
            print_week_total(&session, from_week);
            if to_week != from_week {
                print_week_total(&session, to_week);
            }
            Ok(())
        }
        Commands::Unit { unit } => {
            let unit = parse_unit(&unit)?;
            session.set_unit(unit)?;
            println!("✓ Plan now uses {unit}");
            Ok(())
        }
        Commands::Reset => {
            session.reset()?;
            println!("✓ Session reset");
            Ok(())
        }
    }
}

fn cmd_adopt(session: &mut Session, settings_path: &std::path::Path, plan_path: &std::path::Path) -> Result<()> {
    let settings: PlanSettings = serde_json::from_str(&std::fs::read_to_string(settings_path)?)?;
    let plan: Plan = serde_json::from_str(&std::fs::read_to_string(plan_path)?)?;

    let weeks = plan.weeks.len();
    session.adopt(settings, plan)?;
    println!("✓ Adopted {weeks}-week generated plan");
    Ok(())
}

fn cmd_import(session: &mut Session, file: &std::path::Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)?;
    session.import_json(&raw)?;
    let weeks = session.plan().map_or(0, |p| p.weeks.len());
    println!("✓ Imported {weeks}-week plan");
    Ok(())
}

fn cmd_export(session: &Session, file: Option<&std::path::Path>) -> Result<()> {
    let json = session.export_json()?;
    match file {
        Some(path) => {
            std::fs::write(path, &json)?;
            println!("✓ Exported plan to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_show(session: &Session) -> Result<()> {
    let Some(doc) = session.document() else {
        println!("No plan loaded. Use `stride adopt` or `stride import` to start.");
        return Ok(());
    };

    let unit = doc.settings.unit;
    println!("╭─────────────────────────────────────────╮");
    println!(
        "│  TRAINING PLAN · {} on {}",
        race_label(&doc.settings.race_distance),
        doc.settings.race_date
    );
    println!("╰─────────────────────────────────────────╯");

    for week in &doc.plan.weeks {
        println!();
        println!(
            "Week {} · starts {} · total {} {}",
            week.week, week.start_date, week.weekly_total, unit
        );
        for (day, bucket) in week.days.iter() {
            for (index, workout) in bucket.iter().enumerate() {
                let measure = match &workout.measure {
                    Measurement::Distance { distance } => format!("{distance} {unit}"),
                    Measurement::Time { time } => format!("{time} min"),
                };
                let nickname = workout
                    .nickname
                    .as_deref()
                    .map(|n| format!("  \"{n}\""))
                    .unwrap_or_default();
                println!("  {day} [{index}]  {:<9} {measure}{nickname}", workout.kind.key());
            }
        }
    }
    println!();
    Ok(())
}

fn print_week_total(session: &Session, week: u32) {
    if let Some(doc) = session.document() {
        if let Some(w) = doc.plan.week(week) {
            println!("  Week {} total: {} {}", week, w.weekly_total, doc.settings.unit);
        }
    }
}

fn race_label(distance: &RaceDistance) -> String {
    match distance {
        RaceDistance::FiveK => "5k".to_string(),
        RaceDistance::TenK => "10k".to_string(),
        RaceDistance::Half => "half marathon".to_string(),
        RaceDistance::Marathon => "marathon".to_string(),
        RaceDistance::Custom { km } => format!("{km} km race"),
    }
}

fn measure_from(distance: Option<f64>, time: Option<f64>) -> Option<Measurement> {
    match (distance, time) {
        (Some(distance), _) => Some(Measurement::Distance { distance }),
        (None, Some(time)) => Some(Measurement::Time { time }),
        (None, None) => None,
    }
}

fn parse_day(s: &str) -> Result<Weekday> {
    Weekday::parse(s).ok_or_else(|| {
        Error::InvalidTarget(format!(
            "unknown day \"{s}\" (expected one of: {})",
            Weekday::key_list()
        ))
    })
}

fn parse_kind(s: &str) -> Result<WorkoutType> {
    WorkoutType::from_key(&s.to_lowercase()).ok_or_else(|| {
        Error::InvalidTarget(format!(
            "unknown workout type \"{s}\" (expected one of: {})",
            WorkoutType::key_list()
        ))
    })
}

fn parse_unit(s: &str) -> Result<Unit> {
    Unit::parse(s)
        .ok_or_else(|| Error::InvalidTarget(format!("unknown unit \"{s}\" (expected km or miles)")))
}
