use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use liftlog_core::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Personal workout tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Run as of this date (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    date: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's overview (default)
    Status,

    /// Log a strength session for one exercise
    Log {
        /// Exercise id (see `liftlog exercises`)
        exercise: String,

        /// Weight used, in pounds
        #[arg(long)]
        weight: f64,

        /// Reps per set, one value per set
        #[arg(long, num_args = 1.., required = true)]
        reps: Vec<u32>,

        /// How it felt (easy, good, hard, failed)
        #[arg(long)]
        difficulty: Option<String>,

        /// Session note
        #[arg(long)]
        note: Option<String>,
    },

    /// Log a cardio session
    Cardio {
        /// Cardio type (running, swimming)
        cardio_type: String,

        /// Activity id within the type (e.g. treadmill, freestyle)
        #[arg(long)]
        activity: String,

        /// Duration in minutes
        #[arg(long)]
        duration: u32,

        /// Distance in miles
        #[arg(long)]
        distance: Option<f64>,

        /// Intensity (easy, moderate, hard)
        #[arg(long)]
        intensity: Option<String>,
    },

    /// Mark today as an intentional rest day
    Rest,

    /// Generate (or regenerate) a draft plan for today
    Plan {
        /// Focus (push, pull, legs, full, surprise)
        #[arg(long)]
        focus: Option<String>,

        /// Session length in minutes (30, 45, 60)
        #[arg(long)]
        duration: Option<u32>,

        /// Training goal (strength, hypertrophy, endurance)
        #[arg(long)]
        goal: Option<String>,

        /// Equipment restriction (machines, free)
        #[arg(long)]
        equipment: Option<String>,

        /// Seed for reproducible plans
        #[arg(long)]
        seed: Option<u64>,

        /// Reroll the existing draft instead of creating a new one
        #[arg(long)]
        regenerate: bool,
    },

    /// Start today's workout from the current draft
    Start,

    /// Finish today's workout and record a session summary
    Finish,

    /// Add an exercise to today's session
    Add {
        /// Exercise id
        exercise: String,
    },

    /// Remove an exercise from today's session
    Remove {
        /// Exercise id
        exercise: String,

        /// Discard any sets already logged today without asking
        #[arg(long)]
        yes: bool,
    },

    /// Swap a session slot for a different exercise
    Swap {
        /// Slot index (0-based, see `liftlog status`)
        index: usize,

        /// Replacement exercise id
        exercise: String,

        /// Discard any sets already logged today without asking
        #[arg(long)]
        yes: bool,
    },

    /// List the exercise catalog
    Exercises,

    /// Show achievements
    Achievements,

    /// Export all data as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Import a previously exported JSON bundle (replaces all data)
    Import {
        /// Bundle file to import
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Set up the profile
    Onboard {
        /// Display name
        #[arg(long)]
        username: String,

        /// Gym type (planet, commercial, iron, home)
        #[arg(long, default_value = "commercial")]
        gym: String,
    },

    /// Wipe all data and start over
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    let today = match &cli.date {
        Some(raw) => parse_day_key(raw)
            .ok_or_else(|| Error::Other(format!("Invalid date: {}", raw)))?,
        None => Utc::now().date_naive(),
    };

    let errors = default_catalog().validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let mut tracker = Tracker::load(Store::open(&data_dir), today);

    let result = match cli.command {
        Some(Commands::Status) | None => cmd_status(&mut tracker),
        Some(Commands::Log {
            exercise,
            weight,
            reps,
            difficulty,
            note,
        }) => cmd_log(&mut tracker, &exercise, weight, &reps, difficulty, note),
        Some(Commands::Cardio {
            cardio_type,
            activity,
            duration,
            distance,
            intensity,
        }) => cmd_cardio(&mut tracker, &cardio_type, &activity, duration, distance, intensity),
        Some(Commands::Rest) => cmd_rest(&mut tracker),
        Some(Commands::Plan {
            focus,
            duration,
            goal,
            equipment,
            seed,
            regenerate,
        }) => cmd_plan(&mut tracker, focus, duration, goal, equipment, seed, regenerate),
        Some(Commands::Start) => cmd_start(&mut tracker),
        Some(Commands::Finish) => cmd_finish(&mut tracker),
        Some(Commands::Add { exercise }) => cmd_add(&mut tracker, &exercise),
        Some(Commands::Remove { exercise, yes }) => cmd_remove(&mut tracker, &exercise, yes),
        Some(Commands::Swap {
            index,
            exercise,
            yes,
        }) => cmd_swap(&mut tracker, index, &exercise, yes),
        Some(Commands::Exercises) => cmd_exercises(&tracker),
        Some(Commands::Achievements) => cmd_achievements(&tracker),
        Some(Commands::Export { output }) => cmd_export(&tracker, output),
        Some(Commands::Import { file, yes }) => cmd_import(&mut tracker, &file, yes),
        Some(Commands::Onboard { username, gym }) => cmd_onboard(&mut tracker, username, &gym),
        Some(Commands::Reset { yes }) => cmd_reset(&mut tracker, yes),
    };

    flush_messages(&mut tracker);
    result
}

fn flush_messages(tracker: &mut Tracker) {
    for message in tracker.drain_messages() {
        println!("{}", message);
    }
}

/// Timestamp consistent with the (possibly pinned) working date
fn timestamp_for(today: NaiveDate) -> DateTime<Utc> {
    let real = Utc::now();
    if real.date_naive() == today {
        real
    } else {
        today
            .and_hms_opt(12, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or(real)
    }
}

fn parse_difficulty(raw: &str) -> Result<Difficulty> {
    match raw.to_lowercase().as_str() {
        "easy" => Ok(Difficulty::Easy),
        "good" => Ok(Difficulty::Good),
        "hard" => Ok(Difficulty::Hard),
        "failed" => Ok(Difficulty::Failed),
        other => Err(Error::Other(format!("Unknown difficulty: {}", other))),
    }
}

fn parse_focus(raw: &str) -> Result<PlanFocus> {
    match raw.to_lowercase().as_str() {
        "push" => Ok(PlanFocus::Push),
        "pull" => Ok(PlanFocus::Pull),
        "legs" => Ok(PlanFocus::Legs),
        "full" => Ok(PlanFocus::Full),
        "surprise" => Ok(PlanFocus::Surprise),
        other => Err(Error::Other(format!("Unknown focus: {}", other))),
    }
}

fn parse_equipment(raw: &str) -> Result<EquipmentFilter> {
    match raw.to_lowercase().as_str() {
        "machines" => Ok(EquipmentFilter::Machines),
        "free" => Ok(EquipmentFilter::Free),
        other => Err(Error::Other(format!("Unknown equipment filter: {}", other))),
    }
}

fn parse_gym(raw: &str) -> Result<GymKind> {
    match raw.to_lowercase().as_str() {
        "planet" => Ok(GymKind::Planet),
        "commercial" => Ok(GymKind::Commercial),
        "iron" => Ok(GymKind::Iron),
        "home" => Ok(GymKind::Home),
        other => Err(Error::Other(format!("Unknown gym type: {}", other))),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn cmd_status(tracker: &mut Tracker) -> Result<()> {
    let streak = tracker.streak();
    let score = tracker.strength_score();

    println!("╭─────────────────────────────────────────╮");
    println!("│  LIFTLOG · {}", tracker.today_key());
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Suggested focus: {}", tracker.todays_workout_type().label());
    println!(
        "  Streak: {} day(s) (best {})",
        streak.current, streak.best
    );
    println!(
        "  Strength score: {} ({}/{} exercises logged)",
        score.score, score.logged_count, score.total
    );
    println!("  Workouts this week: {}", tracker.workouts_this_week());
    if let Some(label) = tracker.last_workout_label() {
        println!("  Last workout: {}", label);
    }

    if let Some(notice) = tracker.session_start_notice() {
        println!();
        println!("  {}", notice);
    }

    if let Some(session) = tracker.active_session_today() {
        println!();
        let status = match session.status {
            SessionStatus::Draft => "draft",
            SessionStatus::InProgress => "in progress",
        };
        println!("  Session ({}):", status);
        for (index, item) in session.items.iter().enumerate() {
            println!(
                "    [{}] {} — {} set(s)",
                index,
                item.name,
                session.logged_set_count(&item.exercise_id)
            );
        }
    }

    if let Some(draft) = tracker.draft_plan_today() {
        if !tracker.draft_dismissed_today() {
            println!();
            println!("  Draft: {}", draft.label);
            for id in &draft.exercises {
                println!("    · {}", tracker.catalog().exercise_name(id));
            }
        }
    }

    Ok(())
}

fn cmd_log(
    tracker: &mut Tracker,
    exercise: &str,
    weight: f64,
    reps: &[u32],
    difficulty: Option<String>,
    note: Option<String>,
) -> Result<()> {
    let difficulty = difficulty.as_deref().map(parse_difficulty).transpose()?;
    let session = StrengthSession {
        date: timestamp_for(tracker.today()),
        sets: reps
            .iter()
            .map(|&r| SetEntry {
                weight,
                reps: r,
                difficulty,
            })
            .collect(),
        anchor_weight: Some(weight),
        anchor_reps: reps.first().copied(),
        adjusted_today: false,
        note,
        baseline_weight: None,
        baseline_reps: None,
    };

    match tracker.save_strength_session(exercise, session) {
        SaveOutcome::Saved => {
            println!(
                "✓ {} — {} set(s) at {} lb",
                tracker.catalog().exercise_name(exercise),
                reps.len(),
                weight
            );
            if tracker.settings.insights_enabled {
                if let Some(sessions) = tracker.history.get(exercise) {
                    if let Some(best) = metrics::best_for_exercise(sessions) {
                        if let Some(advice) = metrics::progression_advice(sessions, best) {
                            println!("  {}", advice.message());
                        }
                    }
                }
            }
            Ok(())
        }
        SaveOutcome::Invalid => Err(Error::Other(
            "Weight and reps must be greater than zero".into(),
        )),
        SaveOutcome::Duplicate => {
            println!("Already saved.");
            Ok(())
        }
    }
}

fn cmd_cardio(
    tracker: &mut Tracker,
    cardio_type: &str,
    activity: &str,
    duration: u32,
    distance: Option<f64>,
    intensity: Option<String>,
) -> Result<()> {
    let session = CardioSession {
        date: timestamp_for(tracker.today()),
        duration,
        distance,
        intensity,
        activity_id: activity.to_string(),
        note: None,
    };

    match tracker.save_cardio_session(cardio_type, session) {
        SaveOutcome::Saved => {
            println!("✓ Cardio — {} min of {}", duration, activity);
            Ok(())
        }
        SaveOutcome::Invalid => Err(Error::Other("Duration must be greater than zero".into())),
        SaveOutcome::Duplicate => {
            println!("Already saved.");
            Ok(())
        }
    }
}

fn cmd_rest(tracker: &mut Tracker) -> Result<()> {
    if tracker.log_rest_day() {
        println!("✓ Rest day logged. See you tomorrow.");
    } else if tracker.has_workout_today() {
        println!("Today already counts as a workout day.");
    } else {
        println!("Rest day already logged for today.");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_plan(
    tracker: &mut Tracker,
    focus: Option<String>,
    duration: Option<u32>,
    goal: Option<String>,
    equipment: Option<String>,
    seed: Option<u64>,
    regenerate: bool,
) -> Result<()> {
    let options = PlanOptions {
        goal,
        duration,
        equipment: equipment.as_deref().map(parse_equipment).transpose()?,
    };
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if regenerate {
        let passed = options.goal.is_some()
            || options.duration.is_some()
            || options.equipment.is_some();
        let arg = if passed { Some(&options) } else { None };
        if !tracker.regenerate_plan(arg, &mut rng) {
            println!("No draft to regenerate. Run `liftlog plan` first.");
            return Ok(());
        }
    } else {
        let focus = match focus.as_deref() {
            Some(raw) => parse_focus(raw)?,
            None => tracker.todays_workout_type().into(),
        };
        tracker.generate_plan(focus, &options, &mut rng);
    }

    let draft = tracker
        .draft_plan_today()
        .ok_or_else(|| Error::Plan("Draft missing after generation".into()))?;
    println!("✓ {}", draft.label);
    for id in draft.exercises.clone() {
        println!("  · {}", tracker.catalog().exercise_name(&id));
    }
    println!();
    println!("Run `liftlog start` to begin.");
    Ok(())
}

fn cmd_start(tracker: &mut Tracker) -> Result<()> {
    tracker.start_workout_from_builder();
    if let Some(notice) = tracker.session_start_notice() {
        println!("✓ {}", notice);
    }
    Ok(())
}

fn cmd_finish(tracker: &mut Tracker) -> Result<()> {
    if !tracker.finish_active_session() {
        println!("Nothing to finish — no session in progress and no sets logged.");
    }
    Ok(())
}

fn cmd_add(tracker: &mut Tracker, exercise: &str) -> Result<()> {
    if tracker.catalog().exercise(exercise).is_none()
        && !exercise.starts_with(CARDIO_KEY_PREFIX)
    {
        return Err(Error::Other(format!("Unknown exercise: {}", exercise)));
    }
    if tracker.add_exercise_from_search(exercise) == AddOutcome::AlreadyPresent {
        println!("Already in today's session.");
    }
    Ok(())
}

fn cmd_remove(tracker: &mut Tracker, exercise: &str, yes: bool) -> Result<()> {
    let confirmation = if yes {
        Confirmation::Confirmed
    } else {
        Confirmation::Unconfirmed
    };
    match tracker.remove_session_exercise(exercise, confirmation) {
        EditOutcome::Done => {
            println!("✓ Removed {}", tracker.catalog().exercise_name(exercise));
            Ok(())
        }
        EditOutcome::NeedsConfirmation => {
            let proceed = confirm(&format!(
                "{} has sets logged today; removing deletes them. Continue?",
                tracker.catalog().exercise_name(exercise)
            ))?;
            if proceed {
                tracker.remove_session_exercise(exercise, Confirmation::Confirmed);
                println!("✓ Removed {}", tracker.catalog().exercise_name(exercise));
            } else {
                println!("Kept as is.");
            }
            Ok(())
        }
        EditOutcome::NoOp => {
            println!("Not in today's session.");
            Ok(())
        }
    }
}

fn cmd_swap(tracker: &mut Tracker, index: usize, exercise: &str, yes: bool) -> Result<()> {
    if tracker.catalog().exercise(exercise).is_none() {
        return Err(Error::Other(format!("Unknown exercise: {}", exercise)));
    }
    let confirmation = if yes {
        Confirmation::Confirmed
    } else {
        Confirmation::Unconfirmed
    };
    match tracker.swap_session_exercise(index, exercise, confirmation) {
        EditOutcome::Done => {
            println!(
                "✓ Slot {} is now {}",
                index,
                tracker.catalog().exercise_name(exercise)
            );
            Ok(())
        }
        EditOutcome::NeedsConfirmation => {
            let proceed =
                confirm("That slot has sets logged today; swapping deletes them. Continue?")?;
            if proceed {
                tracker.swap_session_exercise(index, exercise, Confirmation::Confirmed);
                println!(
                    "✓ Slot {} is now {}",
                    index,
                    tracker.catalog().exercise_name(exercise)
                );
            } else {
                println!("Kept as is.");
            }
            Ok(())
        }
        EditOutcome::NoOp => {
            println!("No session slot at index {}.", index);
            Ok(())
        }
    }
}

fn cmd_exercises(tracker: &Tracker) -> Result<()> {
    let catalog = tracker.catalog();
    for id in catalog.exercise_ids() {
        if let Some(exercise) = catalog.exercise(id) {
            println!("  {:<24} {}", id, exercise.name);
        }
    }
    Ok(())
}

fn cmd_achievements(tracker: &Tracker) -> Result<()> {
    for achievement in tracker.achievements() {
        let mark = if achievement.unlocked { "✓" } else { "·" };
        println!("  {} {:<20} {}", mark, achievement.title, achievement.desc);
    }
    Ok(())
}

fn cmd_export(tracker: &Tracker, output: Option<PathBuf>) -> Result<()> {
    let bundle = bundle::export_bundle(tracker);
    let json = serde_json::to_string_pretty(&bundle)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("✓ Exported to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_import(tracker: &mut Tracker, file: &PathBuf, yes: bool) -> Result<()> {
    if !yes && !confirm("Importing replaces all existing data. Continue?")? {
        println!("Import cancelled.");
        return Ok(());
    }
    let contents = std::fs::read_to_string(file)?;
    bundle::import_bundle(tracker, &contents)?;
    println!("✓ Import complete.");
    Ok(())
}

fn cmd_onboard(tracker: &mut Tracker, username: String, gym: &str) -> Result<()> {
    tracker.profile.username = username;
    tracker.profile.gym_type = parse_gym(gym)?;
    tracker.complete_onboarding();
    println!("✓ Welcome, {}!", tracker.profile.username);
    Ok(())
}

fn cmd_reset(tracker: &mut Tracker, yes: bool) -> Result<()> {
    if !yes && !confirm("This wipes all workout data. Continue?")? {
        println!("Reset cancelled.");
        return Ok(());
    }
    tracker.reset();
    println!("✓ All data cleared.");
    Ok(())
}
