#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Fleet-Grid engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! actually happened. Systems consume immutable snapshots and respond with
//! new command batches or pure reports.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tick budget applied to a run when no explicit budget is configured.
pub const DEFAULT_TICK_BUDGET: u32 = 25;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the floor layout and clears every registered robot.
    ConfigureFloor {
        /// Obstacle map the world should adopt for the next run.
        grid: FloorGrid,
    },
    /// Updates the maximum number of ticks a run may execute.
    ConfigureTickBudget {
        /// Upper bound on executed ticks before the run fails.
        max_ticks: u32,
    },
    /// Requests registration of a robot with a start and destination cell.
    RegisterRobot {
        /// Display name identifying the robot in logs and reports.
        name: String,
        /// Cell the robot occupies before the first tick.
        start: CellCoord,
        /// Cell the robot must reach for the run to complete.
        destination: CellCoord,
    },
    /// Stores the precomputed route the simulator replays for a robot.
    AssignRoute {
        /// Identifier of the robot receiving the route.
        robot: RobotId,
        /// Planned drive commands, indexed positionally by tick.
        route: Vec<DriveCommand>,
    },
    /// Advances the lockstep simulation by one tick.
    Tick,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a robot joined the fleet at its start cell.
    RobotRegistered {
        /// Identifier allocated to the robot in registration order.
        robot: RobotId,
        /// Cell the robot occupies after registration.
        cell: CellCoord,
    },
    /// Reports that a robot registration request was rejected.
    RobotRejected {
        /// Name provided in the rejected registration request.
        name: String,
        /// Specific reason the registration failed.
        reason: RegistrationError,
    },
    /// Indicates that one lockstep tick finished executing.
    TickAdvanced {
        /// Zero-based index of the tick that just executed.
        tick: u32,
    },
    /// Confirms that a robot emitted a drive command this tick.
    DriveExecuted {
        /// Identifier of the robot that executed the command.
        robot: RobotId,
        /// Drive command appended to the robot's log.
        command: DriveCommand,
        /// Cell the robot occupies after the command applied.
        cell: CellCoord,
    },
    /// Announces that a robot reached its destination and froze.
    RobotArrived {
        /// Identifier of the robot that arrived.
        robot: RobotId,
        /// Destination cell the robot now rests on.
        cell: CellCoord,
    },
    /// Announces that every registered robot reached its destination.
    RunCompleted {
        /// Number of ticks the run executed before completing.
        ticks: u32,
    },
    /// Announces that the run exhausted its tick budget before completion.
    RunFailed {
        /// Tick budget that was configured for the failed run.
        budget: u32,
    },
}

/// Unique identifier assigned to a robot.
///
/// Identifiers are allocated sequentially at registration, so ascending id
/// order doubles as the scan order for every conflict tie-break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RobotId(u32);

impl RobotId {
    /// Creates a new robot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as row and column coordinates.
///
/// Components are signed so translating by a heading delta is always
/// defined; whether the resulting cell is usable is the grid's decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: i32,
    col: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn col(&self) -> i32 {
        self.col
    }

    /// Returns the cell translated by the provided (row, col) delta.
    #[must_use]
    pub const fn translated(self, delta: (i32, i32)) -> Self {
        Self {
            row: self.row + delta.0,
            col: self.col + delta.1,
        }
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

/// Facing direction of a robot, one of four clockwise orientations.
///
/// The delta table is an abstract clockwise cycle over the two grid axes
/// rather than compass semantics: Up translates along +col, Right along
/// +row, Down along -col, Left along -row. The planner and the simulator
/// must agree on this table for replayed routes to stay valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Heading {
    /// Orientation with clockwise index 0; Forward translates by (0, +1).
    Up,
    /// Orientation with clockwise index 1; Forward translates by (+1, 0).
    Right,
    /// Orientation with clockwise index 2; Forward translates by (0, -1).
    Down,
    /// Orientation with clockwise index 3; Forward translates by (-1, 0).
    Left,
}

impl Heading {
    /// All headings in clockwise order, matching the planner's neighbor
    /// expansion order.
    pub const CLOCKWISE: [Heading; 4] = [Heading::Up, Heading::Right, Heading::Down, Heading::Left];

    /// Clockwise index of the heading, 0 through 3.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Heading::Up => 0,
            Heading::Right => 1,
            Heading::Down => 2,
            Heading::Left => 3,
        }
    }

    /// Heading carrying the provided clockwise index, reduced modulo 4.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Heading::Up,
            1 => Heading::Right,
            2 => Heading::Down,
            _ => Heading::Left,
        }
    }

    /// Translation applied to a (row, col) cell by one Forward step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Heading::Up => (0, 1),
            Heading::Right => (1, 0),
            Heading::Down => (0, -1),
            Heading::Left => (-1, 0),
        }
    }

    /// Heading after one clockwise quarter turn.
    #[must_use]
    pub const fn turned_right(self) -> Self {
        Self::from_index(self.index().wrapping_add(1))
    }

    /// Heading after one counterclockwise quarter turn.
    #[must_use]
    pub const fn turned_left(self) -> Self {
        Self::from_index(self.index().wrapping_add(3))
    }
}

/// Drive command a robot can emit during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriveCommand {
    /// Translate one cell along the current heading's delta.
    Forward,
    /// Translate one cell against the current heading's delta.
    Reverse,
    /// Rotate the heading one quarter turn counterclockwise.
    TurnLeft,
    /// Rotate the heading one quarter turn clockwise.
    TurnRight,
    /// Hold position and heading; still counts as an emitted command.
    Wait,
}

impl DriveCommand {
    /// Wire label used when printing command logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            DriveCommand::Forward => "forward",
            DriveCommand::Reverse => "reverse",
            DriveCommand::TurnLeft => "left",
            DriveCommand::TurnRight => "right",
            DriveCommand::Wait => "wait",
        }
    }
}

impl fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Occupancy kind of a single floor cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Traversable floor.
    Free,
    /// Blocked cell no robot may enter.
    Obstacle,
}

/// Errors that can occur while constructing a [`FloorGrid`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FloorGridError {
    /// A row's cell count differed from the first row's cell count.
    #[error("row {row} holds {found} cells where {expected} were expected")]
    NonRectangular {
        /// Zero-based index of the offending row.
        row: usize,
        /// Cell count established by the first row.
        expected: usize,
        /// Cell count found in the offending row.
        found: usize,
    },
}

/// Static rectangular obstacle map shared read-only by planner and world.
///
/// The default grid is empty, zero by zero; every cell query on it reports
/// blocked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FloorGrid {
    rows: usize,
    columns: usize,
    cells: Vec<CellKind>,
}

impl FloorGrid {
    /// Builds a grid from nested rows, enforcing rectangularity.
    pub fn from_rows(rows: Vec<Vec<CellKind>>) -> Result<Self, FloorGridError> {
        let columns = rows.first().map_or(0, Vec::len);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(FloorGridError::NonRectangular {
                    row: index,
                    expected: columns,
                    found: row.len(),
                });
            }
        }

        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * columns);
        for row in rows {
            cells.extend(row);
        }

        Ok(Self {
            rows: row_count,
            columns,
            cells,
        })
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Cells stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[CellKind] {
        &self.cells
    }

    /// Kind of the provided cell, if it lies within the grid.
    #[must_use]
    pub fn kind_at(&self, cell: CellCoord) -> Option<CellKind> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether the cell is within bounds and not an obstacle.
    #[must_use]
    pub fn is_free(&self, cell: CellCoord) -> bool {
        matches!(self.kind_at(cell), Some(CellKind::Free))
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.col()).ok()?;
        if row < self.rows && column < self.columns {
            Some(row * self.columns + column)
        } else {
            None
        }
    }
}

/// Reasons a robot registration request may be rejected by the world.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationError {
    /// The start cell is out of bounds or an obstacle.
    #[error("start cell is blocked or outside the floor")]
    StartBlocked,
    /// The destination cell is out of bounds or an obstacle.
    #[error("destination cell is blocked or outside the floor")]
    DestinationBlocked,
    /// Another robot already starts on the requested start cell.
    #[error("start cell is already occupied by another robot")]
    StartOccupied,
    /// Another robot already claims the requested destination cell.
    #[error("destination cell is already claimed by another robot")]
    DestinationClaimed,
}

/// Immutable representation of a single robot's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RobotSnapshot {
    /// Identifier assigned to the robot at registration.
    pub id: RobotId,
    /// Display name of the robot.
    pub name: String,
    /// Cell the robot currently occupies.
    pub cell: CellCoord,
    /// Cell the robot must reach.
    pub destination: CellCoord,
    /// Direction the robot currently faces.
    pub heading: Heading,
    /// Indicates whether the robot reached its destination and froze.
    pub arrived: bool,
    /// Ordered log of every drive command the robot emitted.
    pub commands: Vec<DriveCommand>,
}

/// Read-only snapshot describing the whole fleet.
#[derive(Clone, Debug, Default)]
pub struct RobotView {
    snapshots: Vec<RobotSnapshot>,
}

impl RobotView {
    /// Creates a new fleet view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<RobotSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in registration order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &RobotSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<RobotSnapshot> {
        self.snapshots
    }
}

/// Aggregated command statistics for a finished run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    /// Sum of every robot's command log length.
    pub total_commands: usize,
    /// Mean commands per robot; 0.0 when the fleet is empty.
    pub average_commands: f64,
    /// Longest single robot command log.
    pub max_commands: usize,
}

/// Lifecycle state of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The run is still executing ticks.
    Active,
    /// Every robot arrived within the budget.
    Completed {
        /// Number of ticks that executed before completion.
        ticks: u32,
    },
    /// The tick budget was exhausted before every robot arrived.
    Failed {
        /// Budget that was in force when the run failed.
        budget: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        CellCoord, CellKind, DriveCommand, FloorGrid, FloorGridError, Heading, RegistrationError,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn heading_deltas_follow_the_fixed_table() {
        assert_eq!(Heading::Up.delta(), (0, 1));
        assert_eq!(Heading::Right.delta(), (1, 0));
        assert_eq!(Heading::Down.delta(), (0, -1));
        assert_eq!(Heading::Left.delta(), (-1, 0));
    }

    #[test]
    fn headings_cycle_clockwise() {
        let mut heading = Heading::Up;
        for expected in [Heading::Right, Heading::Down, Heading::Left, Heading::Up] {
            heading = heading.turned_right();
            assert_eq!(heading, expected);
        }
        assert_eq!(Heading::Up.turned_left(), Heading::Left);
        assert_eq!(Heading::from_index(7), Heading::Left);
    }

    #[test]
    fn drive_command_labels_match_wire_names() {
        assert_eq!(DriveCommand::Forward.label(), "forward");
        assert_eq!(DriveCommand::Reverse.label(), "reverse");
        assert_eq!(DriveCommand::TurnLeft.label(), "left");
        assert_eq!(DriveCommand::TurnRight.label(), "right");
        assert_eq!(DriveCommand::Wait.to_string(), "wait");
    }

    #[test]
    fn floor_grid_reports_free_and_blocked_cells() {
        let grid = FloorGrid::from_rows(vec![
            vec![CellKind::Free, CellKind::Obstacle],
            vec![CellKind::Free, CellKind::Free],
        ])
        .expect("rectangular grid");

        assert!(grid.is_free(CellCoord::new(0, 0)));
        assert!(!grid.is_free(CellCoord::new(0, 1)));
        assert!(grid.is_free(CellCoord::new(1, 1)));
        assert!(!grid.is_free(CellCoord::new(-1, 0)));
        assert!(!grid.is_free(CellCoord::new(0, 2)));
        assert!(!grid.is_free(CellCoord::new(2, 0)));
    }

    #[test]
    fn floor_grid_rejects_ragged_rows() {
        let error = FloorGrid::from_rows(vec![
            vec![CellKind::Free, CellKind::Free],
            vec![CellKind::Free],
        ])
        .expect_err("ragged rows must be rejected");

        assert_eq!(
            error,
            FloorGridError::NonRectangular {
                row: 1,
                expected: 2,
                found: 1,
            }
        );
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn cell_coord_round_trips_through_bincode() {
        assert_round_trip(&CellCoord::new(-3, 12));
    }

    #[test]
    fn cell_kind_round_trips_through_bincode() {
        assert_round_trip(&CellKind::Obstacle);
    }

    #[test]
    fn registration_error_round_trips_through_bincode() {
        assert_round_trip(&RegistrationError::DestinationClaimed);
    }
}
