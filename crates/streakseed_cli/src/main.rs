//! Local-only command line front end for StreakSeed.
//!
//! # Responsibility
//! - Drive `HabitController` against the on-disk SQLite store.
//! - Print plain-text views of habits, stats and the pending reminder.
//!
//! # Invariants
//! - The CLI never signs in; the free-tier habit limit applies.

use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use streakseed_core::logging::{init_logging_from_config, normalize_level};
use streakseed_core::templates::new_habits;
use streakseed_core::{
    badge_definition, completion_total, current_streak, last_seven_days, longest_streak,
    AddHabitOutcome, CoreConfig, HabitController, LogNotificationSink, LogTelemetry, NewHabit,
    NoopAuth, SqliteKeyValueStore, STARTER_TEMPLATES,
};

#[derive(Parser, Debug)]
#[command(name = "streakseed")]
#[command(about = "Track daily habits and streaks from the terminal")]
#[command(version)]
struct Cli {
    /// Directory holding the local database and logs
    #[arg(long, env = "STREAKSEED_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "STREAKSEED_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List habits with their current streak
    List,
    /// Add a habit
    Add { name: String },
    /// Remove a habit by id
    Remove { id: String },
    /// Mark or unmark a day (defaults to today)
    Toggle {
        id: String,
        /// Day as YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
    /// Pause or resume a habit
    Pause { id: String },
    /// Show the starter templates
    Templates,
    /// Replace all habits with the given starter templates
    Import {
        #[arg(required = true)]
        template_ids: Vec<String>,
    },
    /// Show completion stats
    Stats,
    /// Configure the daily reminder
    Reminder(ReminderArgs),
    /// Set the IANA timezone used for "today"
    Timezone { name: String },
    /// Flip dark mode
    DarkMode,
}

#[derive(Args, Debug)]
struct ReminderArgs {
    /// Turn the reminder off
    #[arg(long, conflicts_with_all = ["at", "habit"])]
    off: bool,
    /// Time of day as HH:MM
    #[arg(long)]
    at: Option<String>,
    /// Habit id the reminder is about
    #[arg(long)]
    habit: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = CoreConfig::from_env();
    if let Some(data_dir) = &cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    if let Some(level) = &cli.log_level {
        config = CoreConfig {
            log_level: match normalize_level(level) {
                Ok(level) => level,
                Err(err) => {
                    eprintln!("error: {err}");
                    return ExitCode::FAILURE;
                }
            },
            ..config
        };
    }

    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("warning: file logging disabled: {err}");
    }

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &CoreConfig) -> Result<(), String> {
    let backend = SqliteKeyValueStore::open(config.database_path()).map_err(|err| {
        format!(
            "failed to open `{}`: {err}",
            config.database_path().display()
        )
    })?;
    let mut controller = HabitController::builder(backend)
        .with_auth(Arc::new(NoopAuth))
        .with_telemetry(Arc::new(LogTelemetry))
        .with_notifications(Arc::new(LogNotificationSink::default()))
        .build();
    info!("event=cli_command module=cli status=start command={command:?}");

    match command {
        Command::List => print_habits(&controller),
        Command::Add { name } => match controller
            .add_habit(NewHabit::new(name))
            .map_err(|err| err.to_string())?
        {
            AddHabitOutcome::Added(id) => println!("added {id}"),
            AddHabitOutcome::SignInRequired => {
                return Err("free plan holds one habit; sign in from the app to add more".into())
            }
        },
        Command::Remove { id } => {
            controller.remove_habit(&id).map_err(|err| err.to_string())?;
            println!("removed {id}");
        }
        Command::Toggle { id, date } => {
            let outcome = match date {
                Some(date) => controller.toggle_date_str(&id, &date),
                None => controller.toggle_today(&id),
            }
            .map_err(|err| err.to_string())?;
            println!("{}", if outcome.completed { "done" } else { "undone" });
            for unlock in outcome.unlocked {
                if let Some(badge) = badge_definition(&unlock.badge_id) {
                    println!("{} {} unlocked: {}", badge.icon, badge.label, badge.description);
                }
            }
        }
        Command::Pause { id } => {
            let paused = controller.toggle_pause(&id).map_err(|err| err.to_string())?;
            println!("{}", if paused { "paused" } else { "resumed" });
        }
        Command::Templates => {
            for template in STARTER_TEMPLATES {
                println!("{}  {}", template.id, template.name);
            }
        }
        Command::Import { template_ids } => {
            let ids: Vec<&str> = template_ids.iter().map(String::as_str).collect();
            let count = controller
                .import_habits(new_habits(&ids))
                .map_err(|err| err.to_string())?;
            println!("imported {count} habit(s)");
        }
        Command::Stats => print_stats(&controller),
        Command::Reminder(args) => configure_reminder(&mut controller, args)?,
        Command::Timezone { name } => {
            let mut settings = controller.settings().clone();
            settings.timezone = name;
            controller
                .update_settings(settings)
                .map_err(|err| err.to_string())?;
            println!("today is {}", controller.today());
        }
        Command::DarkMode => {
            let dark = controller.toggle_dark_mode();
            println!("dark mode {}", if dark { "on" } else { "off" });
        }
    }
    Ok(())
}

fn print_habits(controller: &HabitController<SqliteKeyValueStore>) {
    let today = controller.today();
    if controller.habits().is_empty() {
        println!("no habits yet; try `streakseed templates`");
        return;
    }
    for habit in controller.habits() {
        let badges = habit
            .badges
            .iter()
            .filter_map(|id| badge_definition(id).map(|badge| badge.icon))
            .collect::<String>();
        println!(
            "{}  {}{}  streak={} {}",
            habit.id,
            habit.name,
            if habit.paused { " (paused)" } else { "" },
            current_streak(&habit.history, today),
            badges
        );
    }
}

fn print_stats(controller: &HabitController<SqliteKeyValueStore>) {
    let today = controller.today();
    for day in last_seven_days(controller.habits(), today) {
        println!("{}  {}", day.date, "#".repeat(day.count as usize));
    }
    for habit in controller.habits() {
        println!(
            "{}: total={} longest={}",
            habit.name,
            completion_total(habit),
            longest_streak(&habit.history)
        );
    }
    match controller.pending_reminder() {
        Some(plan) => println!("next reminder at {} for {}", plan.fire_at, plan.habit_name),
        None => println!("no reminder scheduled"),
    }
}

fn configure_reminder(
    controller: &mut HabitController<SqliteKeyValueStore>,
    args: ReminderArgs,
) -> Result<(), String> {
    let mut settings = controller.settings().clone();
    let reminder = &mut settings.daily_reminder;
    reminder.enabled = !args.off;
    if let Some(at) = args.at {
        let (hour, minute) = parse_clock_time(&at)?;
        reminder.hour = hour;
        reminder.minute = minute;
    }
    if let Some(id) = args.habit {
        let habit = controller
            .habit(&id)
            .ok_or_else(|| format!("habit not found: {id}"))?;
        reminder.habit_name = habit.name.clone();
        reminder.habit_id = Some(habit.id.clone());
    }
    controller
        .update_settings(settings)
        .map_err(|err| err.to_string())?;

    match controller.pending_reminder() {
        Some(plan) => println!("next reminder at {}", plan.fire_at),
        None => println!("reminder off"),
    }
    Ok(())
}

fn parse_clock_time(value: &str) -> Result<(u32, u32), String> {
    let invalid = || format!("invalid time `{value}`; expected HH:MM");
    let (hour, minute) = value.split_once(':').ok_or_else(invalid)?;
    let hour = hour.trim().parse::<u32>().map_err(|_| invalid())?;
    let minute = minute.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok((hour, minute))
}
