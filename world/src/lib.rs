#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Fleet Grid.
//!
//! The world owns every robot and advances them in lockstep: one drive
//! command per robot per tick, with cell conflicts arbitrated by
//! registration order and an opportunistic same-tick recovery pass for
//! robots that have previously waited.

use fleet_grid_core::{
    CellCoord, Command, DriveCommand, Event, FloorGrid, Heading, RegistrationError, RobotId,
    RunStatus, DEFAULT_TICK_BUDGET,
};

/// Represents the authoritative Fleet Grid world state.
#[derive(Debug)]
pub struct World {
    grid: FloorGrid,
    robots: Vec<Robot>,
    next_robot_id: u32,
    max_ticks: u32,
    ticks_elapsed: u32,
    status: RunStatus,
}

impl World {
    /// Creates a new fleet world ready for simulation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: FloorGrid::default(),
            robots: Vec::new(),
            next_robot_id: 0,
            max_ticks: DEFAULT_TICK_BUDGET,
            ticks_elapsed: 0,
            status: RunStatus::Active,
        }
    }

    fn robot_mut(&mut self, robot: RobotId) -> Option<&mut Robot> {
        self.robots.iter_mut().find(|candidate| candidate.id == robot)
    }

    fn register_robot(
        &mut self,
        name: String,
        start: CellCoord,
        destination: CellCoord,
        out_events: &mut Vec<Event>,
    ) {
        let reason = if !self.grid.is_free(start) {
            Some(RegistrationError::StartBlocked)
        } else if !self.grid.is_free(destination) {
            Some(RegistrationError::DestinationBlocked)
        } else if self.robots.iter().any(|robot| robot.cell == start) {
            Some(RegistrationError::StartOccupied)
        } else if self.robots.iter().any(|robot| robot.destination == destination) {
            Some(RegistrationError::DestinationClaimed)
        } else {
            None
        };

        match reason {
            Some(reason) => out_events.push(Event::RobotRejected { name, reason }),
            None => {
                let id = RobotId::new(self.next_robot_id);
                self.next_robot_id = self.next_robot_id.saturating_add(1);
                out_events.push(Event::RobotRegistered {
                    robot: id,
                    cell: start,
                });
                self.robots.push(Robot::new(id, name, start, destination));
            }
        }
    }

    fn advance_tick(&mut self, out_events: &mut Vec<Event>) {
        if self.ticks_elapsed >= self.max_ticks {
            self.status = RunStatus::Failed {
                budget: self.max_ticks,
            };
            out_events.push(Event::RunFailed {
                budget: self.max_ticks,
            });
            return;
        }

        let step = usize::try_from(self.ticks_elapsed).unwrap_or(usize::MAX);

        // Only Forward changes the occupied cell; every other planned command
        // claims the robot's current cell. Arrived robots claim nothing.
        let mut proposals: Vec<Option<CellCoord>> = Vec::with_capacity(self.robots.len());
        for robot in &self.robots {
            if robot.arrived {
                proposals.push(None);
                continue;
            }
            let proposal = match robot.route.get(step) {
                Some(DriveCommand::Forward) => robot.cell.translated(robot.heading.delta()),
                _ => robot.cell,
            };
            proposals.push(Some(proposal));
        }

        let mut decisions: Vec<Decision> = Vec::with_capacity(self.robots.len());
        for (index, robot) in self.robots.iter().enumerate() {
            let Some(proposal) = proposals.get(index).copied().flatten() else {
                decisions.push(Decision::Idle);
                continue;
            };
            let planned = robot.route.get(step).copied();
            let claimants = proposals
                .iter()
                .filter(|candidate| **candidate == Some(proposal))
                .count();
            let decision = if claimants > 1 {
                // The first claimant in registration order keeps its planned
                // command; every other claimant is forced to wait this tick.
                let winner = proposals
                    .iter()
                    .position(|candidate| *candidate == Some(proposal));
                if winner == Some(index) {
                    planned.map_or(Decision::ForcedWait, Decision::Planned)
                } else {
                    Decision::ForcedWait
                }
            } else {
                match planned {
                    Some(command) if robot.cell != robot.destination => Decision::Planned(command),
                    _ if robot.cell == proposal => Decision::ForcedWait,
                    _ => Decision::Idle,
                }
            };
            decisions.push(decision);
        }

        // A Forward aimed at a cell that stays occupied this tick is withheld
        // and becomes a wait. Withheld robots keep their own cell, so blockage
        // cascades along chains of followers.
        loop {
            let mut demoted = None;
            'scan: for (index, decision) in decisions.iter().enumerate() {
                if !matches!(decision, Decision::Planned(DriveCommand::Forward)) {
                    continue;
                }
                let Some(target) = proposals.get(index).copied().flatten() else {
                    continue;
                };
                for (other, occupant) in self.robots.iter().enumerate() {
                    if other == index || occupant.arrived || occupant.cell != target {
                        continue;
                    }
                    let vacating = matches!(
                        decisions.get(other),
                        Some(Decision::Planned(
                            DriveCommand::Forward | DriveCommand::Reverse
                        ))
                    );
                    if !vacating {
                        demoted = Some(index);
                        break 'scan;
                    }
                }
            }
            match demoted {
                Some(index) => {
                    if let Some(decision) = decisions.get_mut(index) {
                        *decision = Decision::ForcedWait;
                    }
                }
                None => break,
            }
        }

        for index in 0..self.robots.len() {
            match decisions.get(index).copied() {
                Some(Decision::Planned(command)) => self.execute_drive(index, command, out_events),
                Some(Decision::ForcedWait) => {
                    self.execute_drive(index, DriveCommand::Wait, out_events);
                }
                Some(Decision::Idle) | None => {}
            }
        }

        // Recovery pass: any robot that has ever waited attempts one extra
        // Forward this tick, provided the cell ahead is free floor and not
        // held by another robot still in transit.
        for index in 0..self.robots.len() {
            let target = {
                let Some(robot) = self.robots.get(index) else {
                    break;
                };
                if robot.arrived || !robot.commands.contains(&DriveCommand::Wait) {
                    continue;
                }
                robot.cell.translated(robot.heading.delta())
            };
            if !self.grid.is_free(target) {
                continue;
            }
            let occupied = self
                .robots
                .iter()
                .any(|other| !other.arrived && other.cell == target);
            if occupied {
                continue;
            }
            self.execute_drive(index, DriveCommand::Forward, out_events);
        }

        out_events.push(Event::TickAdvanced {
            tick: self.ticks_elapsed,
        });
        self.ticks_elapsed = self.ticks_elapsed.saturating_add(1);

        if self.robots.iter().all(|robot| robot.arrived) {
            self.status = RunStatus::Completed {
                ticks: self.ticks_elapsed,
            };
            out_events.push(Event::RunCompleted {
                ticks: self.ticks_elapsed,
            });
        }
    }

    fn execute_drive(&mut self, index: usize, command: DriveCommand, out_events: &mut Vec<Event>) {
        let Some(robot) = self.robots.get_mut(index) else {
            return;
        };
        if robot.arrived {
            return;
        }

        match command {
            DriveCommand::Forward => robot.cell = robot.cell.translated(robot.heading.delta()),
            DriveCommand::Reverse => {
                let (row_delta, col_delta) = robot.heading.delta();
                robot.cell = robot.cell.translated((-row_delta, -col_delta));
            }
            DriveCommand::TurnLeft => robot.heading = robot.heading.turned_left(),
            DriveCommand::TurnRight => robot.heading = robot.heading.turned_right(),
            DriveCommand::Wait => {}
        }
        robot.commands.push(command);
        out_events.push(Event::DriveExecuted {
            robot: robot.id,
            command,
            cell: robot.cell,
        });

        if robot.cell == robot.destination {
            robot.arrived = true;
            out_events.push(Event::RobotArrived {
                robot: robot.id,
                cell: robot.cell,
            });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureFloor { grid } => {
            world.grid = grid;
            world.robots.clear();
            world.next_robot_id = 0;
            world.ticks_elapsed = 0;
            world.status = RunStatus::Active;
        }
        Command::ConfigureTickBudget { max_ticks } => {
            world.max_ticks = max_ticks;
        }
        Command::RegisterRobot {
            name,
            start,
            destination,
        } => {
            world.register_robot(name, start, destination, out_events);
        }
        Command::AssignRoute { robot, route } => {
            if let Some(found) = world.robot_mut(robot) {
                found.route = route;
            }
        }
        Command::Tick => {
            if matches!(world.status, RunStatus::Active) {
                world.advance_tick(out_events);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use fleet_grid_core::{FloorGrid, RobotSnapshot, RobotView, RunStatus};

    /// Provides read-only access to the floor grid robots travel on.
    #[must_use]
    pub fn floor_grid(world: &World) -> &FloorGrid {
        &world.grid
    }

    /// Captures a read-only view of the registered fleet.
    #[must_use]
    pub fn robot_view(world: &World) -> RobotView {
        let snapshots: Vec<RobotSnapshot> = world
            .robots
            .iter()
            .map(|robot| RobotSnapshot {
                id: robot.id,
                name: robot.name.clone(),
                cell: robot.cell,
                destination: robot.destination,
                heading: robot.heading,
                arrived: robot.arrived,
                commands: robot.commands.clone(),
            })
            .collect();
        RobotView::from_snapshots(snapshots)
    }

    /// Lifecycle state of the current run.
    #[must_use]
    pub fn run_status(world: &World) -> RunStatus {
        world.status
    }

    /// Number of ticks executed since the run began.
    #[must_use]
    pub fn ticks_elapsed(world: &World) -> u32 {
        world.ticks_elapsed
    }

    /// Maximum number of ticks the current run may execute.
    #[must_use]
    pub fn tick_budget(world: &World) -> u32 {
        world.max_ticks
    }
}

#[derive(Clone, Debug)]
struct Robot {
    id: RobotId,
    name: String,
    cell: CellCoord,
    destination: CellCoord,
    heading: Heading,
    arrived: bool,
    route: Vec<DriveCommand>,
    commands: Vec<DriveCommand>,
}

impl Robot {
    fn new(id: RobotId, name: String, cell: CellCoord, destination: CellCoord) -> Self {
        Self {
            id,
            name,
            cell,
            destination,
            heading: Heading::Up,
            arrived: false,
            route: Vec::new(),
            commands: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Decision {
    Planned(DriveCommand),
    ForcedWait,
    Idle,
}
