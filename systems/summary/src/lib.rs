#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure aggregation over the fleet's emitted command logs.

use fleet_grid_core::{RobotView, RunSummary};

/// Aggregates per-robot command log lengths into a run summary.
///
/// The average is 0.0 for an empty fleet.
#[must_use]
pub fn summarize(robots: &RobotView) -> RunSummary {
    let mut total_commands = 0usize;
    let mut max_commands = 0usize;
    let mut robot_count = 0usize;

    for snapshot in robots.iter() {
        let commands = snapshot.commands.len();
        total_commands = total_commands.saturating_add(commands);
        max_commands = max_commands.max(commands);
        robot_count = robot_count.saturating_add(1);
    }

    let average_commands = if robot_count == 0 {
        0.0
    } else {
        total_commands as f64 / robot_count as f64
    };

    RunSummary {
        total_commands,
        average_commands,
        max_commands,
    }
}
