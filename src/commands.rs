use std::fmt::Write as _;
use std::str::FromStr;

use anyhow::{anyhow, bail, Error, Result};
use clap::{CommandFactory, Parser, Subcommand};

use crate::{
    ambience::{Selection, SoundId, ThemeId},
    app::App,
    tasks::Task,
    timer::{SessionKind, TimerSnapshot},
};

/// A task addressed either by its 1-based position or by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    Position(usize),
    Id(String),
}

impl TaskRef {
    fn resolve<'a>(&self, tasks: &'a [Task]) -> Option<&'a Task> {
        match self {
            TaskRef::Position(position) => position.checked_sub(1).and_then(|i| tasks.get(i)),
            TaskRef::Id(id) => tasks.iter().find(|task| &task.id == id),
        }
    }
}

impl FromStr for TaskRef {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            bail!("missing task number or id");
        }
        Ok(match value.parse::<usize>() {
            Ok(position) => TaskRef::Position(position),
            Err(_) => TaskRef::Id(value.to_string()),
        })
    }
}

/// One line typed at the prompt.
#[derive(Parser, Debug)]
#[command(
    name = "deepfocus",
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_version_flag = true,
    override_usage = "<COMMAND> [ARGS]"
)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the countdown
    Start,
    /// Pause, keeping the remaining time
    Pause,
    /// Stop and refill the current session
    Reset,
    /// Switch session: focus, short or long
    Kind { kind: SessionKind },
    /// Set a session length in minutes
    Duration { kind: SessionKind, minutes: u32 },
    /// Show the timer
    Status,
    /// Add a task
    Add {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Complete or reopen a task, by number or id
    #[command(alias = "done")]
    Toggle { task: TaskRef },
    /// Delete a task, by number or id
    #[command(alias = "rm")]
    Remove { task: TaskRef },
    /// List tasks
    Tasks,
    /// Delete every task
    Clear,
    /// Toggle an ambient sound
    Sound { sound: SoundId },
    /// List ambient sounds
    Sounds,
    /// Pick a theme
    Theme { theme: ThemeId },
    /// List themes
    Themes,
    /// Toggle mute
    Mute,
    /// Toggle dark mode
    Dark,
    /// Set ambient volume
    Volume {
        #[arg(value_parser = clap::value_parser!(u32).range(0..=100))]
        percent: u32,
    },
    /// Ask for notification permission
    Notify,
    /// Show this help
    #[command(alias = "?")]
    Help,
    /// Leave
    #[command(alias = "exit")]
    Quit,
}

/// Parses one prompt line. Help requests (`-h`) come back as errors whose
/// text is the help page.
pub fn parse_line(line: &str) -> Result<Command, clap::Error> {
    Line::try_parse_from(line.split_whitespace()).map(|line| line.command)
}

pub fn help() -> String {
    Line::command().render_help().to_string()
}

pub enum Outcome {
    Reply(String),
    Quit,
}

pub fn describe_snapshot(snapshot: &TimerSnapshot) -> String {
    let state = &snapshot.state;
    format!(
        "{} {} [{:>3.0}%] {} | sessions completed: {}",
        state.kind.label(),
        snapshot.display,
        snapshot.progress_percent,
        if state.running { "running" } else { "stopped" },
        state.completed_sessions
    )
}

fn describe_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "no tasks yet".to_string();
    }
    let mut out = String::new();
    for (index, task) in tasks.iter().enumerate() {
        let mark = if task.completed { 'x' } else { ' ' };
        let _ = writeln!(out, "{:>2}. [{mark}] {}", index + 1, task.text);
    }
    out.trim_end().to_string()
}

fn describe_selection(name: &str, selection: Selection) -> String {
    match selection {
        Selection::Activated => format!("{name} on"),
        Selection::Deactivated => format!("{name} off"),
        Selection::Restricted => format!("{name} is a premium feature"),
    }
}

pub async fn execute(app: &App, command: Command) -> Result<Outcome> {
    let reply = match command {
        Command::Start => {
            if app.timer.start().await {
                describe_snapshot(&app.timer.get_snapshot().await)
            } else {
                "timer is already running or finished; reset it first".to_string()
            }
        }
        Command::Pause => {
            app.timer.pause().await;
            describe_snapshot(&app.timer.get_snapshot().await)
        }
        Command::Reset => {
            app.timer.reset().await;
            describe_snapshot(&app.timer.get_snapshot().await)
        }
        Command::Kind { kind } => {
            app.timer.change_kind(kind).await;
            describe_snapshot(&app.timer.get_snapshot().await)
        }
        Command::Duration { kind, minutes } => {
            let applied = app.update_duration(kind, minutes).await?;
            format!("{} set to {applied} min", kind.label())
        }
        Command::Status => describe_snapshot(&app.timer.get_snapshot().await),
        Command::Add { text } => match app.tasks.lock().await.add(&text.join(" ")).await? {
            Some(task) => format!("added: {}", task.text),
            None => "task text is empty".to_string(),
        },
        Command::Toggle { task: task_ref } => {
            let mut tasks = app.tasks.lock().await;
            let id = task_ref
                .resolve(tasks.tasks())
                .map(|task| task.id.clone())
                .ok_or_else(|| anyhow!("no such task"))?;
            match tasks.toggle(&id).await? {
                Some(true) => "task completed".to_string(),
                Some(false) => "task reopened".to_string(),
                None => "no such task".to_string(),
            }
        }
        Command::Remove { task: task_ref } => {
            let mut tasks = app.tasks.lock().await;
            let id = task_ref
                .resolve(tasks.tasks())
                .map(|task| task.id.clone())
                .ok_or_else(|| anyhow!("no such task"))?;
            tasks.remove(&id).await?;
            "task removed".to_string()
        }
        Command::Tasks => describe_tasks(app.tasks.lock().await.tasks()),
        Command::Clear => {
            let removed = app.tasks.lock().await.clear().await?;
            format!("removed {removed} task(s)")
        }
        Command::Sound { sound } => describe_selection(sound.name(), app.toggle_sound(sound)),
        Command::Sounds => SoundId::ALL
            .iter()
            .map(|sound| {
                let mark = if app.is_sound_active(*sound) { '*' } else { ' ' };
                format!("{mark} {:<11} {}", sound.as_str(), sound.name())
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Theme { theme } => describe_selection(theme.name(), app.select_theme(theme)),
        Command::Themes => {
            let current = app.theme();
            ThemeId::ALL
                .iter()
                .map(|theme| {
                    let mark = if *theme == current { '*' } else { ' ' };
                    format!("{mark} {:<8} {} {}", theme.as_str(), theme.name(), theme.accent_color())
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Mute => {
            if app.toggle_mute()? {
                "muted".to_string()
            } else {
                "sound on".to_string()
            }
        }
        Command::Dark => {
            if app.toggle_dark_mode()? {
                "dark mode on".to_string()
            } else {
                "dark mode off".to_string()
            }
        }
        Command::Volume { percent } => {
            let volume = app.set_volume(percent)?;
            format!("volume {:.0}%", volume * 100.0)
        }
        Command::Notify => format!("notifications: {:?}", app.request_notifications().await),
        Command::Help => help(),
        Command::Quit => return Ok(Outcome::Quit),
    };
    Ok(Outcome::Reply(reply))
}
