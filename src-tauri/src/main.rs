#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_config;
mod app_constants;
mod app_runtime;
mod app_types;
mod backend_supervisor;
mod desktop_bridge;
mod desktop_bridge_commands;
mod exit_events;
mod launch_plan;
mod logging;
mod main_window;
mod process_control;
mod startup_token;

pub(crate) use app_constants::*;
pub(crate) use app_types::{AppInfo, LaunchPlan};

fn main() {
    app_runtime::run();
}
