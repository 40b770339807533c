#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic route planning system for newly registered robots.

use std::collections::VecDeque;

use fleet_grid_core::{CellCoord, Command, DriveCommand, Event, FloorGrid, Heading, RobotView};

/// Pure system that reacts to registration events and emits route
/// assignments.
#[derive(Debug, Default)]
pub struct Routing;

impl Routing {
    /// Consumes world events and immutable views to emit one
    /// [`Command::AssignRoute`] per newly registered robot.
    pub fn handle(
        &self,
        events: &[Event],
        grid: &FloorGrid,
        robots: &RobotView,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            let Event::RobotRegistered { robot, .. } = event else {
                continue;
            };
            let Some(snapshot) = robots.iter().find(|snapshot| snapshot.id == *robot) else {
                continue;
            };
            out.push(Command::AssignRoute {
                robot: *robot,
                route: plan_route(grid, snapshot.cell, snapshot.destination),
            });
        }
    }
}

/// Computes a drive sequence from `start` to `destination`.
///
/// The search explores cells breadth-first. Each dequeued state expands the
/// four candidate headings in clockwise order, charging the turns needed to
/// face the candidate before the Forward that enters it. The visited set is
/// keyed by cell alone, so the Forward count is minimal while the turn count
/// is an artifact of expansion order.
///
/// An empty result means either `start` equals `destination` or no path
/// exists; callers distinguish the two by comparing the cells.
#[must_use]
pub fn plan_route(grid: &FloorGrid, start: CellCoord, destination: CellCoord) -> Vec<DriveCommand> {
    let mut visited = vec![false; grid.rows().saturating_mul(grid.columns())];
    mark_visited(&mut visited, grid, start);

    let mut frontier: VecDeque<SearchNode> = VecDeque::new();
    frontier.push_back(SearchNode {
        cell: start,
        heading: Heading::Up,
        commands: Vec::new(),
    });

    while let Some(node) = frontier.pop_front() {
        if node.cell == destination {
            return node.commands;
        }

        for candidate in Heading::CLOCKWISE {
            let next_cell = node.cell.translated(candidate.delta());
            if !grid.is_free(next_cell) || is_visited(&visited, grid, next_cell) {
                continue;
            }
            mark_visited(&mut visited, grid, next_cell);

            let mut commands = node.commands.clone();
            commands.extend(turn_commands(node.heading, candidate));
            commands.push(DriveCommand::Forward);
            frontier.push_back(SearchNode {
                cell: next_cell,
                heading: candidate,
                commands,
            });
        }
    }

    Vec::new()
}

/// Minimal turn sequence rotating `from` until it faces `to`.
///
/// Opposite headings tie at two quarter turns either way; the tie breaks
/// clockwise, so the result never holds more than two commands.
#[must_use]
pub fn turn_commands(from: Heading, to: Heading) -> TurnSteps {
    let clockwise = (4 + to.index() - from.index()) % 4;
    let counterclockwise = (4 + from.index() - to.index()) % 4;

    let mut steps = TurnSteps::default();
    if clockwise <= counterclockwise {
        for _ in 0..clockwise {
            steps.push(DriveCommand::TurnRight);
        }
    } else {
        for _ in 0..counterclockwise {
            steps.push(DriveCommand::TurnLeft);
        }
    }

    steps
}

/// Fixed-capacity iterator over the turn commands between two headings.
#[derive(Clone, Debug, Default)]
pub struct TurnSteps {
    buffer: [Option<DriveCommand>; 2],
    len: usize,
    cursor: usize,
}

impl TurnSteps {
    fn push(&mut self, command: DriveCommand) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(command);
            self.len += 1;
        }
    }
}

impl Iterator for TurnSteps {
    type Item = DriveCommand;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

#[derive(Clone, Debug)]
struct SearchNode {
    cell: CellCoord,
    heading: Heading,
    commands: Vec<DriveCommand>,
}

fn cell_index(grid: &FloorGrid, cell: CellCoord) -> Option<usize> {
    let row = usize::try_from(cell.row()).ok()?;
    let column = usize::try_from(cell.col()).ok()?;
    if row < grid.rows() && column < grid.columns() {
        Some(row * grid.columns() + column)
    } else {
        None
    }
}

fn mark_visited(visited: &mut [bool], grid: &FloorGrid, cell: CellCoord) {
    if let Some(index) = cell_index(grid, cell) {
        if let Some(slot) = visited.get_mut(index) {
            *slot = true;
        }
    }
}

fn is_visited(visited: &[bool], grid: &FloorGrid, cell: CellCoord) -> bool {
    cell_index(grid, cell)
        .and_then(|index| visited.get(index).copied())
        .unwrap_or(false)
}
