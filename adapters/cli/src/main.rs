#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives Fleet Grid floor plans to completion.

mod layout;
mod scenario_transfer;

use std::{
    collections::HashMap,
    fs,
    io::{self, Read as _},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use fleet_grid_core::{
    Command, Event, FloorGrid, RobotId, RobotView, RunStatus, DEFAULT_TICK_BUDGET,
};
use fleet_grid_system_routing::Routing;
use fleet_grid_system_summary::summarize;
use fleet_grid_world::{self as world, query, World};

use crate::layout::{parse_layout, ParsedLayout, RobotSpec};
use crate::scenario_transfer::ScenarioSnapshot;

/// Runs a robot fleet across a floor plan and reports each robot's command log.
#[derive(Debug, Parser)]
#[command(name = "fleet-grid", version, about)]
struct Args {
    /// Path to a layout file; reads the layout from stdin when omitted.
    #[arg(long, value_name = "PATH", conflicts_with = "scenario")]
    layout: Option<PathBuf>,

    /// Tick budget before the run is declared impossible.
    #[arg(
        long,
        value_name = "TICKS",
        default_value_t = DEFAULT_TICK_BUDGET,
        conflicts_with = "scenario"
    )]
    max_ticks: u32,

    /// Print every executed drive command tick by tick.
    #[arg(long)]
    trace: bool,

    /// Print the encoded scenario string instead of running the fleet.
    #[arg(long)]
    export_scenario: bool,

    /// Run a previously exported scenario string.
    #[arg(long, value_name = "SCENARIO")]
    scenario: Option<String>,
}

/// Entry point for the Fleet Grid command-line interface.
fn main() -> Result<ExitCode> {
    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<ExitCode> {
    let (grid, robots, max_ticks) = if let Some(scenario) = args.scenario.as_deref() {
        let snapshot = ScenarioSnapshot::decode(scenario)
            .context("failed to decode the scenario string")?;
        let (grid, robots) = snapshot
            .restore()
            .context("failed to restore the scenario")?;
        (grid, robots, snapshot.max_ticks)
    } else {
        let text = read_layout_text(args.layout.as_deref())?;
        let ParsedLayout { grid, robots } =
            parse_layout(&text).context("failed to parse the layout")?;
        (grid, robots, args.max_ticks)
    };

    if args.export_scenario {
        println!(
            "{}",
            ScenarioSnapshot::capture(&grid, &robots, max_ticks).encode()
        );
        return Ok(ExitCode::SUCCESS);
    }

    run_fleet(&grid, &robots, max_ticks, args.trace)
}

fn run_fleet(
    grid: &FloorGrid,
    robots: &[RobotSpec],
    max_ticks: u32,
    trace: bool,
) -> Result<ExitCode> {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureFloor { grid: grid.clone() },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::ConfigureTickBudget { max_ticks },
        &mut events,
    );
    for spec in robots {
        world::apply(
            &mut world,
            Command::RegisterRobot {
                name: spec.name.clone(),
                start: spec.start,
                destination: spec.destination,
            },
            &mut events,
        );
    }
    for event in &events {
        if let Event::RobotRejected { name, reason } = event {
            bail!("robot {name} was rejected: {reason}");
        }
    }

    let routing = Routing::default();
    let fleet = query::robot_view(&world);
    let names: HashMap<RobotId, String> = fleet
        .iter()
        .map(|snapshot| (snapshot.id, snapshot.name.clone()))
        .collect();
    let mut assignments = Vec::new();
    routing.handle(&events, query::floor_grid(&world), &fleet, &mut assignments);
    for command in assignments {
        world::apply(&mut world, command, &mut events);
    }

    while query::run_status(&world) == RunStatus::Active {
        let tick = query::ticks_elapsed(&world);
        let mut tick_events = Vec::new();
        world::apply(&mut world, Command::Tick, &mut tick_events);
        if trace {
            print_trace(tick, &names, &tick_events);
        }
    }

    match query::run_status(&world) {
        RunStatus::Completed { .. } => {
            print_report(&query::robot_view(&world));
            Ok(ExitCode::SUCCESS)
        }
        RunStatus::Failed { budget } => {
            println!("Impossible Case Detected: No solution found after {budget} commands.");
            Ok(ExitCode::FAILURE)
        }
        RunStatus::Active => bail!("tick loop ended while the run was still active"),
    }
}

fn read_layout_text(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read layout file {}", path.display())),
        None => {
            let mut text = String::new();
            let _ = io::stdin()
                .read_to_string(&mut text)
                .context("failed to read the layout from stdin")?;
            Ok(text)
        }
    }
}

fn print_trace(tick: u32, names: &HashMap<RobotId, String>, events: &[Event]) {
    for event in events {
        match event {
            Event::DriveExecuted {
                robot,
                command,
                cell,
            } => {
                println!(
                    "[tick {tick}] {} {command} -> ({}, {})",
                    robot_name(names, *robot),
                    cell.row(),
                    cell.col()
                );
            }
            Event::RobotArrived { robot, .. } => {
                println!("[tick {tick}] {} arrived", robot_name(names, *robot));
            }
            _ => {}
        }
    }
}

fn robot_name(names: &HashMap<RobotId, String>, robot: RobotId) -> &str {
    names.get(&robot).map_or("<unknown>", String::as_str)
}

fn print_report(fleet: &RobotView) {
    for snapshot in fleet.iter() {
        let labels: Vec<&str> = snapshot
            .commands
            .iter()
            .map(|command| command.label())
            .collect();
        println!(
            "{}: {} commands ({})",
            snapshot.name,
            snapshot.commands.len(),
            labels.join(", ")
        );
    }

    let summary = summarize(fleet);
    println!("Average Commands: {:.2} commands.", summary.average_commands);
    println!("Maximum Commands: {} commands.", summary.max_commands);
}
