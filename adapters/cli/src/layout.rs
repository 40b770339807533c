#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use fleet_grid_core::{CellCoord, CellKind, FloorGrid, FloorGridError};
use serde::{Deserialize, Serialize};

/// Token marking an impassable cell in layout text.
const OBSTACLE_TOKEN: &str = "X";
/// Token marking open floor in layout text.
const FREE_TOKEN: &str = ".";
/// Prefix introducing a robot start marker.
const START_PREFIX: char = 'A';
/// Prefix introducing a robot destination marker.
const DESTINATION_PREFIX: char = 'B';

/// Floor plan and fleet extracted from layout text.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ParsedLayout {
    /// Grid of free and obstacle cells covering the floor.
    pub grid: FloorGrid,
    /// Robots to register, ordered by the scan position of their start marker.
    pub robots: Vec<RobotSpec>,
}

/// Registration request for a single robot extracted from a layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RobotSpec {
    /// Display name derived from the marker label.
    pub name: String,
    /// Cell the robot starts on.
    pub start: CellCoord,
    /// Cell the robot must reach.
    pub destination: CellCoord,
}

/// Parses whitespace-separated layout tokens into a floor plan and fleet.
///
/// `X` marks an obstacle, `.` free floor, `A<n>` the start of robot *n* and
/// `B<n>` its destination; marker cells count as free floor. Robots are
/// ordered by the row-major position of their start marker and named
/// `Bot<n>` after the label suffix. Blank lines are skipped.
pub(crate) fn parse_layout(text: &str) -> Result<ParsedLayout, LayoutParseError> {
    let mut rows: Vec<Vec<CellKind>> = Vec::new();
    let mut starts: Vec<(u32, CellCoord)> = Vec::new();
    let mut destinations: Vec<(u32, CellCoord)> = Vec::new();

    for line in text.lines() {
        let mut cells = Vec::new();
        for token in line.split_whitespace() {
            let cell = coordinate(rows.len(), cells.len())?;
            match token {
                OBSTACLE_TOKEN => cells.push(CellKind::Obstacle),
                FREE_TOKEN => cells.push(CellKind::Free),
                _ => {
                    if let Some(label) = marker_label(token, START_PREFIX) {
                        if starts.iter().any(|(existing, _)| *existing == label) {
                            return Err(LayoutParseError::DuplicateStart { label });
                        }
                        starts.push((label, cell));
                        cells.push(CellKind::Free);
                    } else if let Some(label) = marker_label(token, DESTINATION_PREFIX) {
                        if destinations.iter().any(|(existing, _)| *existing == label) {
                            return Err(LayoutParseError::DuplicateDestination { label });
                        }
                        destinations.push((label, cell));
                        cells.push(CellKind::Free);
                    } else {
                        return Err(LayoutParseError::UnknownToken {
                            row: rows.len(),
                            column: cells.len(),
                            token: token.to_owned(),
                        });
                    }
                }
            }
        }
        if cells.is_empty() {
            continue;
        }
        rows.push(cells);
    }

    if rows.is_empty() {
        return Err(LayoutParseError::EmptyLayout);
    }
    let grid = FloorGrid::from_rows(rows).map_err(LayoutParseError::Grid)?;

    let mut robots = Vec::with_capacity(starts.len());
    for (label, start) in &starts {
        let Some((_, destination)) = destinations
            .iter()
            .find(|(candidate, _)| candidate == label)
        else {
            return Err(LayoutParseError::MissingDestination { label: *label });
        };
        robots.push(RobotSpec {
            name: format!("Bot{label}"),
            start: *start,
            destination: *destination,
        });
    }
    for (label, _) in &destinations {
        if !starts.iter().any(|(candidate, _)| candidate == label) {
            return Err(LayoutParseError::MissingStart { label: *label });
        }
    }

    Ok(ParsedLayout { grid, robots })
}

fn marker_label(token: &str, prefix: char) -> Option<u32> {
    token.strip_prefix(prefix)?.parse().ok()
}

fn coordinate(row: usize, column: usize) -> Result<CellCoord, LayoutParseError> {
    let row = i32::try_from(row).map_err(|_| LayoutParseError::Oversized)?;
    let column = i32::try_from(column).map_err(|_| LayoutParseError::Oversized)?;
    Ok(CellCoord::new(row, column))
}

/// Errors that can occur while parsing layout text.
#[derive(Debug)]
pub(crate) enum LayoutParseError {
    /// The layout contained no rows of tokens.
    EmptyLayout,
    /// The rows did not form a rectangular grid.
    Grid(FloorGridError),
    /// A token was not an obstacle, free cell or robot marker.
    UnknownToken {
        /// Zero-based row of the offending token.
        row: usize,
        /// Zero-based column of the offending token.
        column: usize,
        /// Token as it appeared in the layout text.
        token: String,
    },
    /// Two start markers carried the same label.
    DuplicateStart {
        /// Label shared by the markers.
        label: u32,
    },
    /// Two destination markers carried the same label.
    DuplicateDestination {
        /// Label shared by the markers.
        label: u32,
    },
    /// A start marker had no matching destination marker.
    MissingDestination {
        /// Label of the unmatched start marker.
        label: u32,
    },
    /// A destination marker had no matching start marker.
    MissingStart {
        /// Label of the unmatched destination marker.
        label: u32,
    },
    /// The layout exceeds the addressable coordinate range.
    Oversized,
}

impl fmt::Display for LayoutParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLayout => write!(f, "layout text contains no grid rows"),
            Self::Grid(error) => write!(f, "layout rows do not form a rectangle: {error}"),
            Self::UnknownToken { row, column, token } => {
                write!(f, "unknown token '{token}' at row {row}, column {column}")
            }
            Self::DuplicateStart { label } => {
                write!(f, "start marker A{label} appears more than once")
            }
            Self::DuplicateDestination { label } => {
                write!(f, "destination marker B{label} appears more than once")
            }
            Self::MissingDestination { label } => {
                write!(f, "start marker A{label} has no destination marker B{label}")
            }
            Self::MissingStart { label } => {
                write!(f, "destination marker B{label} has no start marker A{label}")
            }
            Self::Oversized => write!(f, "layout exceeds the addressable coordinate range"),
        }
    }
}

impl Error for LayoutParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grid(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grid_markers_and_fleet() {
        let layout = "A1 . B1\nX X .\n";
        let parsed = parse_layout(layout).expect("layout parses");

        assert_eq!(parsed.grid.rows(), 2);
        assert_eq!(parsed.grid.columns(), 3);
        assert_eq!(
            parsed.grid.kind_at(CellCoord::new(0, 0)),
            Some(CellKind::Free)
        );
        assert_eq!(
            parsed.grid.kind_at(CellCoord::new(1, 0)),
            Some(CellKind::Obstacle)
        );
        assert_eq!(
            parsed.grid.kind_at(CellCoord::new(1, 1)),
            Some(CellKind::Obstacle)
        );
        assert_eq!(
            parsed.robots,
            vec![RobotSpec {
                name: "Bot1".to_owned(),
                start: CellCoord::new(0, 0),
                destination: CellCoord::new(0, 2),
            }]
        );
    }

    #[test]
    fn orders_robots_by_start_marker_scan_position() {
        let layout = "B2 A1\nA2 B1";
        let parsed = parse_layout(layout).expect("layout parses");

        let names: Vec<&str> = parsed
            .robots
            .iter()
            .map(|robot| robot.name.as_str())
            .collect();
        assert_eq!(names, vec!["Bot1", "Bot2"]);
        assert_eq!(parsed.robots[0].start, CellCoord::new(0, 1));
        assert_eq!(parsed.robots[0].destination, CellCoord::new(1, 1));
        assert_eq!(parsed.robots[1].start, CellCoord::new(1, 0));
        assert_eq!(parsed.robots[1].destination, CellCoord::new(0, 0));
    }

    #[test]
    fn skips_blank_lines() {
        let parsed = parse_layout("\nA1 B1\n\n").expect("layout parses");
        assert_eq!(parsed.grid.rows(), 1);
        assert_eq!(parsed.grid.columns(), 2);
    }

    #[test]
    fn rejects_unknown_tokens() {
        let error = parse_layout("A1 ? B1").expect_err("unknown token rejected");
        assert!(matches!(
            error,
            LayoutParseError::UnknownToken {
                row: 0,
                column: 1,
                ..
            }
        ));
    }

    #[test]
    fn rejects_ragged_rows() {
        let error = parse_layout(". .\n.").expect_err("ragged rows rejected");
        assert!(matches!(error, LayoutParseError::Grid(_)));
    }

    #[test]
    fn rejects_duplicate_and_unmatched_markers() {
        assert!(matches!(
            parse_layout("A1 A1 B1"),
            Err(LayoutParseError::DuplicateStart { label: 1 })
        ));
        assert!(matches!(
            parse_layout("A1 ."),
            Err(LayoutParseError::MissingDestination { label: 1 })
        ));
        assert!(matches!(
            parse_layout("B7 A7 B1"),
            Err(LayoutParseError::MissingStart { label: 1 })
        ));
        assert!(matches!(
            parse_layout("  \n\n"),
            Err(LayoutParseError::EmptyLayout)
        ));
    }
}
