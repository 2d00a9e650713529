// Console front end
//
// Line-driven stand-in for the mobile screens. One select loop multiplexes
// stdin commands, live rest-timer ticks, coach replies and video probe
// results, so every state change happens on this single task.

use crate::metrics::Metrics;
use crate::models::{
    Catalog, DailyStats, DailyStatsUpdate, Difficulty, Settings, UserProfile, View, Workout,
};
use crate::services::{AdviceProvider, CoachChat, CoachError, MediaStatus, VideoProbe};
use crate::state::{SessionRules, StateChange, StateManager};
use crate::ui::player::{PlayerStep, WorkoutPlayer};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const REPLY_CHANNEL_CAPACITY: usize = 8;

pub const HELP: &str = "\
Commands:
  onboard <name> <email> <goal> <experience> [equipment,...]
  workouts [category]      list workouts
  start <workout-id>       open the workout player
  next | prev              move between exercises
  pause                    pause or resume the rest timer
  rest                     add rest time
  set <n>                  toggle set n of the current exercise
  finish                   finish the workout
  exit                     leave the player without finishing
  nav <view>               show another screen
  stats | steps <n> | water <liters>
  ask <question>           ask the AI coach
  help | quit";

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid {name}: {value}")]
    InvalidArgument { name: &'static str, value: String },
}

/// One line of console input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start(String),
    Next,
    Prev,
    Pause,
    Rest,
    /// Zero-based set index (typed 1-based)
    Set(usize),
    Finish,
    Exit,
    Nav(View),
    Onboard(UserProfile),
    Workouts(Option<String>),
    Stats,
    Steps(u32),
    Water(f64),
    Ask(String),
    Help,
    Quit,
}

fn parse_arg<T: FromStr>(value: Option<&str>, name: &'static str) -> Result<T, CommandError> {
    let value = value.ok_or(CommandError::MissingArgument(name))?;
    value.parse().map_err(|_| CommandError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut args = rest.split_whitespace();

        let command = match word.to_ascii_lowercase().as_str() {
            "start" => Command::Start(parse_arg(args.next(), "workout id")?),
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "pause" | "resume" => Command::Pause,
            "rest" | "+" => Command::Rest,
            "set" => {
                let number: usize = parse_arg(args.next(), "set number")?;
                if number == 0 {
                    return Err(CommandError::InvalidArgument {
                        name: "set number",
                        value: "0".to_string(),
                    });
                }
                Command::Set(number - 1)
            }
            "finish" => Command::Finish,
            "exit" => Command::Exit,
            "nav" | "go" => {
                let view = args.next().ok_or(CommandError::MissingArgument("view"))?;
                Command::Nav(view.parse().map_err(|_| CommandError::InvalidArgument {
                    name: "view",
                    value: view.to_string(),
                })?)
            }
            "onboard" => {
                let name: String = parse_arg(args.next(), "name")?;
                let email: String = parse_arg(args.next(), "email")?;
                let goal: String = parse_arg(args.next(), "goal")?;
                let experience: Difficulty = parse_arg(args.next(), "experience")?;
                let equipment = args
                    .next()
                    .map(|list| {
                        list.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Command::Onboard(UserProfile {
                    name,
                    email,
                    goal,
                    equipment,
                    experience,
                })
            }
            "workouts" | "ls" => Command::Workouts((!rest.is_empty()).then(|| rest.to_string())),
            "stats" => Command::Stats,
            "steps" => Command::Steps(parse_arg(args.next(), "steps")?),
            "water" => Command::Water(parse_arg(args.next(), "liters")?),
            "ask" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("question"));
                }
                Command::Ask(rest.to_string())
            }
            "help" | "?" => Command::Help,
            "quit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Result of handling one command
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue(String),
    Quit,
}

/// Interactive console application
///
/// Owns the [`StateManager`], the active [`WorkoutPlayer`] (if any) and the
/// [`CoachChat`]. Must run inside a tokio runtime.
pub struct ConsoleApp {
    state: StateManager,
    catalog: Arc<Catalog>,
    rules: SessionRules,
    player: Option<WorkoutPlayer>,
    chat: CoachChat,
    media: VideoProbe,
    metrics: Arc<Metrics>,
    reply_tx: mpsc::Sender<Result<String, CoachError>>,
    reply_rx: mpsc::Receiver<Result<String, CoachError>>,
    media_tx: mpsc::Sender<(String, MediaStatus)>,
    media_rx: mpsc::Receiver<(String, MediaStatus)>,
}

impl ConsoleApp {
    pub fn new(
        state: StateManager,
        catalog: Arc<Catalog>,
        settings: &Settings,
        provider: Arc<dyn AdviceProvider>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (reply_tx, reply_rx) = mpsc::channel(REPLY_CHANNEL_CAPACITY);
        let (media_tx, media_rx) = mpsc::channel(REPLY_CHANNEL_CAPACITY);
        Self {
            state,
            catalog,
            rules: SessionRules::from(&settings.session),
            player: None,
            chat: CoachChat::new(provider, Arc::clone(&metrics)),
            media: VideoProbe::default(),
            metrics,
            reply_tx,
            reply_rx,
            media_tx,
            media_rx,
        }
    }

    pub fn player(&self) -> Option<&WorkoutPlayer> {
        self.player.as_ref()
    }

    pub fn chat(&self) -> &CoachChat {
        &self.chat
    }

    /// Read commands from stdin until `quit` or end of input
    pub async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("{}", self.render_view());
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read console input")? else {
                        tracing::info!("Console input closed");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<Command>() {
                        Ok(command) => match self.handle(command) {
                            Flow::Continue(output) => println!("{}", output),
                            Flow::Quit => break,
                        },
                        Err(e) => println!("{}. Type 'help' for commands.", e),
                    }
                }
                Some(remaining) = next_player_tick(&mut self.player) => {
                    if let Some(line) = self.tick_line(remaining) {
                        println!("{}", line);
                    }
                }
                Some(outcome) = self.reply_rx.recv() => {
                    let reply = self.chat.complete(outcome);
                    println!("coach> {}", reply.text);
                }
                Some((exercise, status)) = self.media_rx.recv() => {
                    println!("[{}] {}", exercise, status);
                }
            }
        }

        self.close_player();
        Ok(())
    }

    /// Apply one command and describe the outcome
    pub fn handle(&mut self, command: Command) -> Flow {
        let output = match command {
            Command::Start(id) => self.start(&id),
            Command::Next => self.with_player(|app| {
                let step = app.player.as_mut().map(WorkoutPlayer::advance);
                match step {
                    Some(PlayerStep::Finished) => app.complete_workout(),
                    _ => app.render_player(),
                }
            }),
            Command::Prev => self.with_player(|app| {
                if let Some(player) = app.player.as_mut() {
                    player.previous();
                }
                app.render_player()
            }),
            Command::Pause => self.with_player(|app| {
                if let Some(player) = app.player.as_mut() {
                    player.toggle_pause();
                }
                app.render_player()
            }),
            Command::Rest => self.with_player(|app| match app.player.as_mut() {
                Some(player) => format!("Rest {}", format_clock(player.add_rest())),
                None => String::new(),
            }),
            Command::Set(index) => self.with_player(|app| {
                let result = app.player.as_mut().map(|p| p.toggle_set(index));
                match result {
                    Some(Err(e)) => e.to_string(),
                    _ => app.render_player(),
                }
            }),
            Command::Finish => self.with_player(|app| {
                if let Some(player) = app.player.as_mut() {
                    player.finish_workout();
                }
                app.complete_workout()
            }),
            Command::Exit => self.with_player(|app| {
                app.close_player();
                let changes = app.state.exit_workout();
                app.apply(&changes);
                app.render_view()
            }),
            Command::Nav(view) => self.navigate(view),
            Command::Onboard(profile) => {
                let changes = self.state.complete_onboarding(profile);
                self.apply(&changes);
                self.render_view()
            }
            Command::Workouts(category) => {
                let category = category.as_deref().unwrap_or(crate::models::catalog::ALL_CATEGORIES);
                render_workouts(&self.catalog.filter_by_category(category))
            }
            Command::Stats => render_stats(&self.state.read(|s| s.daily_stats.clone())),
            Command::Steps(steps) => self.update_stats(DailyStatsUpdate::default().steps(steps)),
            Command::Water(liters) => {
                if !liters.is_finite() || liters < 0.0 {
                    return Flow::Continue(format!("Invalid water amount: {}", liters));
                }
                self.update_stats(DailyStatsUpdate::default().water(liters))
            }
            Command::Ask(text) => self.ask(&text),
            Command::Help => HELP.to_string(),
            Command::Quit => return Flow::Quit,
        };
        Flow::Continue(output)
    }

    fn with_player(&mut self, f: impl FnOnce(&mut Self) -> String) -> String {
        if self.player.is_none() {
            return "No workout in progress. Use 'start <workout-id>' first.".to_string();
        }
        f(self)
    }

    fn apply(&self, changes: &[StateChange]) {
        self.metrics.record_state_updates(changes.len());
        for change in changes {
            tracing::debug!("State change: {:?}", change);
        }
    }

    fn start(&mut self, id: &str) -> String {
        let Some(workout) = self.catalog.workout(id) else {
            return format!("Unknown workout: {}", id);
        };

        if let Err(e) = self.open_player(Arc::clone(&workout)) {
            return e;
        }
        let changes = self.state.start_workout(workout);
        self.apply(&changes);
        self.render_player()
    }

    /// Replace the active session with a fresh one for `workout`
    fn open_player(&mut self, workout: Arc<Workout>) -> Result<(), String> {
        self.close_player();
        let player = WorkoutPlayer::new(workout, self.rules, Arc::clone(&self.metrics))
            .map_err(|e| e.to_string())?;
        self.probe_video(&player);
        self.player = Some(player);
        Ok(())
    }

    fn close_player(&mut self) {
        if let Some(player) = self.player.take() {
            player.finish();
        }
    }

    fn probe_video(&self, player: &WorkoutPlayer) {
        let exercise = player.current_exercise().clone();
        let media = self.media.clone();
        let media_tx = self.media_tx.clone();
        tokio::spawn(async move {
            let status = media.probe_exercise(&exercise).await;
            let _ = media_tx.send((exercise.name, status)).await;
        });
    }

    fn complete_workout(&mut self) -> String {
        let summary = match self.player.as_ref() {
            Some(player) => format!(
                "Workout complete: {} ({} sets done)",
                player.workout().title,
                player.state().completed_set_count()
            ),
            None => return String::new(),
        };
        self.close_player();

        let mut changes = self.state.record_workout_completed();
        changes.extend(self.state.exit_workout());
        self.apply(&changes);
        format!("{}\n{}", summary, self.render_view())
    }

    fn navigate(&mut self, view: View) -> String {
        let (current, selected) = self.state.read(|s| (s.current_view, s.selected_workout.clone()));
        if view == View::WorkoutPlayer {
            if current == View::WorkoutPlayer && self.player.is_some() {
                return self.render_view();
            }
            // The player needs a selected workout; mounting it starts a new session
            let Some(workout) = selected else {
                return "No workout selected. Use 'start <workout-id>' instead.".to_string();
            };
            if let Err(e) = self.open_player(workout) {
                return e;
            }
        } else {
            self.close_player();
        }

        let changes = self.state.navigate(view);
        self.apply(&changes);
        self.render_view()
    }

    fn update_stats(&mut self, update: DailyStatsUpdate) -> String {
        let changes = self.state.update_stats(update);
        self.apply(&changes);
        render_stats(&self.state.read(|s| s.daily_stats.clone()))
    }

    fn ask(&mut self, text: &str) -> String {
        let Some(prompt) = self.chat.begin(text) else {
            return "The coach is still typing...".to_string();
        };

        let provider = self.chat.provider();
        let reply_tx = self.reply_tx.clone();
        tokio::spawn(async move {
            let outcome = provider.advise(&prompt).await;
            let _ = reply_tx.send(outcome).await;
        });
        "coach is typing...".to_string()
    }

    /// Console line for a timer tick, only for the last seconds of rest
    fn tick_line(&self, remaining: u32) -> Option<String> {
        let player = self.player.as_ref()?;
        if remaining == 0 {
            Some("Rest over, next set!".to_string())
        } else if player.rest_warning() {
            Some(format!("Rest {}", format_clock(remaining)))
        } else {
            None
        }
    }

    fn render_view(&self) -> String {
        let view = self.state.read(|s| s.current_view);
        let body = self.render_screen();
        if view.is_full_screen() {
            body
        } else {
            format!("{}\n{}", body, render_tab_bar(view))
        }
    }

    fn render_screen(&self) -> String {
        let snapshot = self.state.snapshot();
        match snapshot.current_view {
            View::WorkoutPlayer if self.player.is_some() => self.render_player(),
            View::Onboarding => {
                "Welcome to AMAX Fit! Use 'onboard <name> <email> <goal> <experience>' to begin."
                    .to_string()
            }
            View::Dashboard => {
                let mut out = String::new();
                let name = snapshot
                    .user_profile
                    .as_ref()
                    .map(|p| p.name.as_str())
                    .unwrap_or("athlete");
                let _ = writeln!(out, "Dashboard - hello, {}", name);
                if let Some(featured) = self.catalog.featured() {
                    let _ = writeln!(out, "Featured: {} ({})", featured.title, featured.id);
                }
                out.push_str(&render_stats(&snapshot.daily_stats));
                out
            }
            View::Workouts => render_workouts(&self.catalog.filter_by_category(
                crate::models::catalog::ALL_CATEGORIES,
            )),
            View::Progress => render_stats(&snapshot.daily_stats),
            View::AiChat => {
                let mut out = String::from("AI coach");
                for message in self.chat.messages() {
                    let _ = write!(out, "\n{:?}> {}", message.role, message.text);
                }
                if !self.chat.quick_actions().is_empty() {
                    let _ = write!(out, "\nTry: {}", self.chat.quick_actions().join(" | "));
                }
                out
            }
            other => format!("[{}]", other),
        }
    }

    fn render_player(&self) -> String {
        match self.player.as_ref() {
            Some(player) => render_player(player),
            None => String::new(),
        }
    }
}

/// Await the active player's next tick; pending forever without a player
async fn next_player_tick(player: &mut Option<WorkoutPlayer>) -> Option<u32> {
    match player {
        Some(player) => player.next_tick().await,
        None => std::future::pending().await,
    }
}

/// Bottom navigation shown under every tabbed view; the active tab is bracketed
pub fn render_tab_bar(current: View) -> String {
    const TABS: [(&str, View); 5] = [
        ("Home", View::Dashboard),
        ("Workouts", View::Workouts),
        ("Coach", View::AiChat),
        ("Nutrition", View::Nutrition),
        ("Progress", View::Progress),
    ];

    let active = match current {
        View::ExerciseDetail | View::WorkoutPlayer => View::Workouts,
        other => other,
    };
    TABS.iter()
        .map(|(label, view)| {
            if *view == active {
                format!("[{}]", label)
            } else {
                label.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// `m:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn render_player(player: &WorkoutPlayer) -> String {
    let exercise = player.current_exercise();
    let state = player.state();
    let index = state.current_exercise_index;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} [{}] {}",
        player.workout().title,
        player.progress_label(),
        exercise.name
    );
    let reps = match exercise.rep_range() {
        Some((1, 1)) => "1 rep".to_string(),
        Some((min, max)) if min == max => format!("{} reps", min),
        Some((min, max)) => format!("{}-{} reps", min, max),
        None => exercise.reps.clone(),
    };
    let work = exercise
        .duration_seconds()
        .map(|seconds| format!(", {} work", format_clock(seconds)))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "{} sets x {}{}  ({})",
        exercise.sets,
        reps,
        work,
        exercise.primary_muscle().unwrap_or("Full body")
    );

    let sets: Vec<String> = (0..exercise.sets as usize)
        .map(|set| {
            let mark = if state.is_set_completed(index, set) { 'x' } else { ' ' };
            format!("{}[{}]", set + 1, mark)
        })
        .collect();
    let _ = writeln!(out, "Sets: {}", sets.join(" "));

    let timer_state = if state.is_paused { " (paused)" } else { "" };
    let warning = if player.rest_warning() { " !" } else { "" };
    let _ = writeln!(out, "Rest {}{}{}", format_clock(state.timer), timer_state, warning);
    let _ = write!(
        out,
        "Figure: {}  Next: {}",
        player.figure_cue().animation.as_str(),
        if player.is_last_exercise() { "finish" } else { "next exercise" }
    );
    out
}

pub fn render_stats(stats: &DailyStats) -> String {
    format!(
        "Steps {}/{} ({:.0}%)\nCalories {}/{} ({:.0}%)\nWater {:.1}/{:.1} L ({:.0}%)\nWorkouts completed {}",
        stats.steps,
        stats.steps_goal,
        stats.steps_progress() * 100.0,
        stats.calories,
        stats.calories_goal,
        stats.calories_progress() * 100.0,
        stats.water,
        stats.water_goal,
        stats.water_progress() * 100.0,
        stats.workouts_completed
    )
}

pub fn render_workouts(workouts: &[Arc<Workout>]) -> String {
    if workouts.is_empty() {
        return "No workouts in this category.".to_string();
    }
    workouts
        .iter()
        .map(|w| {
            format!(
                "{:<4} {} - {} min, {} kcal, {} ({} exercises)",
                w.id,
                w.title,
                w.duration_minutes,
                w.calories,
                w.difficulty,
                w.exercise_count()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
