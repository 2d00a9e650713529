// UI module - console front end and workout player
//
// This module contains:
// - WorkoutPlayer: owner of one guided session and its rest timer
// - ConsoleApp: line-driven front end wiring commands to state and services

pub mod console;
pub mod player;

pub use console::{Command, CommandError, ConsoleApp, Flow};
pub use player::{PlayerError, PlayerStep, WorkoutPlayer};
