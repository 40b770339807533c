#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use fleet_grid_core::{CellKind, FloorGrid, FloorGridError};
use serde::{Deserialize, Serialize};

use crate::layout::RobotSpec;

const SNAPSHOT_DOMAIN: &str = "fleet";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded scenario payload.
pub(crate) const SNAPSHOT_HEADER: &str = "fleet:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of the floor plan, fleet and tick budget for a single run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScenarioSnapshot {
    /// Number of grid columns contained in the floor plan.
    pub columns: usize,
    /// Number of grid rows contained in the floor plan.
    pub rows: usize,
    /// Tick budget the run was configured with.
    pub max_ticks: u32,
    /// Row-major cells composing the floor plan.
    pub cells: Vec<CellKind>,
    /// Robots registered for the run, in registration order.
    pub robots: Vec<RobotSpec>,
}

impl ScenarioSnapshot {
    /// Captures the floor plan, fleet and budget into a transferable snapshot.
    #[must_use]
    pub(crate) fn capture(grid: &FloorGrid, robots: &[RobotSpec], max_ticks: u32) -> Self {
        Self {
            columns: grid.columns(),
            rows: grid.rows(),
            max_ticks,
            cells: grid.cells().to_vec(),
            robots: robots.to_vec(),
        }
    }

    /// Encodes the snapshot into a single-line string suitable for sharing.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializablePayload {
            max_ticks: self.max_ticks,
            cells: self.cells.clone(),
            robots: self.robots.clone(),
        };
        let json =
            serde_json::to_vec(&payload).expect("scenario snapshot serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{SNAPSHOT_HEADER}:{}x{}:{encoded}", self.columns, self.rows)
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, ScenarioTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ScenarioTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(ScenarioTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(ScenarioTransferError::MissingVersion)?;
        let dimensions = parts
            .next()
            .ok_or(ScenarioTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(ScenarioTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(ScenarioTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(ScenarioTransferError::UnsupportedVersion(
                version.to_owned(),
            ));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let expected = columns
            .checked_mul(rows)
            .ok_or_else(|| ScenarioTransferError::InvalidDimensions(dimensions.to_owned()))?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(ScenarioTransferError::InvalidEncoding)?;
        let decoded: SerializablePayload =
            serde_json::from_slice(&bytes).map_err(ScenarioTransferError::InvalidPayload)?;
        if decoded.cells.len() != expected {
            return Err(ScenarioTransferError::CellCountMismatch {
                expected,
                found: decoded.cells.len(),
            });
        }

        Ok(Self {
            columns,
            rows,
            max_ticks: decoded.max_ticks,
            cells: decoded.cells,
            robots: decoded.robots,
        })
    }

    /// Rebuilds the floor grid and fleet the snapshot was captured from.
    pub(crate) fn restore(&self) -> Result<(FloorGrid, Vec<RobotSpec>), ScenarioTransferError> {
        // Decoded snapshots never carry zero columns; the guard keeps chunks() total.
        let width = self.columns.max(1);
        let rows: Vec<Vec<CellKind>> = self.cells.chunks(width).map(<[CellKind]>::to_vec).collect();
        let grid = FloorGrid::from_rows(rows).map_err(ScenarioTransferError::InvalidGrid)?;
        Ok((grid, self.robots.clone()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializablePayload {
    max_ticks: u32,
    cells: Vec<CellKind>,
    robots: Vec<RobotSpec>,
}

/// Errors that can occur while decoding scenario transfer strings.
#[derive(Debug)]
pub(crate) enum ScenarioTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded scenario.
    MissingPrefix,
    /// The encoded scenario did not contain a version segment.
    MissingVersion,
    /// The encoded scenario did not include grid dimensions.
    MissingDimensions,
    /// The encoded scenario did not include the payload segment.
    MissingPayload,
    /// The encoded scenario used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded scenario used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded scenario.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
    /// The payload's cell list did not match the advertised dimensions.
    CellCountMismatch {
        /// Number of cells the dimensions call for.
        expected: usize,
        /// Number of cells the payload carried.
        found: usize,
    },
    /// The decoded cells could not be assembled into a floor grid.
    InvalidGrid(FloorGridError),
}

impl fmt::Display for ScenarioTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "scenario string was empty"),
            Self::MissingPrefix => write!(f, "scenario string is missing the prefix"),
            Self::MissingVersion => write!(f, "scenario string is missing the version"),
            Self::MissingDimensions => write!(f, "scenario string is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "scenario string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "scenario prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "scenario version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode scenario payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse scenario payload: {error}")
            }
            Self::CellCountMismatch { expected, found } => {
                write!(
                    f,
                    "scenario payload carries {found} cells where {expected} were expected"
                )
            }
            Self::InvalidGrid(error) => {
                write!(f, "scenario cells do not form a floor grid: {error}")
            }
        }
    }
}

impl Error for ScenarioTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            Self::InvalidGrid(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(usize, usize), ScenarioTransferError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| ScenarioTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<usize>()
        .map_err(|_| ScenarioTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<usize>()
        .map_err(|_| ScenarioTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 {
        return Err(ScenarioTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_grid_core::CellCoord;

    #[test]
    fn round_trip_obstacle_course() {
        let snapshot = ScenarioSnapshot {
            columns: 3,
            rows: 2,
            max_ticks: 40,
            cells: vec![
                CellKind::Free,
                CellKind::Obstacle,
                CellKind::Free,
                CellKind::Free,
                CellKind::Free,
                CellKind::Obstacle,
            ],
            robots: vec![RobotSpec {
                name: "Bot1".to_owned(),
                start: CellCoord::new(0, 0),
                destination: CellCoord::new(1, 1),
            }],
        };

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:3x2:")));

        let decoded = ScenarioSnapshot::decode(&encoded).expect("scenario decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn restore_rebuilds_the_captured_floor() {
        let grid = FloorGrid::from_rows(vec![
            vec![CellKind::Free, CellKind::Free],
            vec![CellKind::Obstacle, CellKind::Free],
        ])
        .expect("rectangular grid");
        let robots = vec![RobotSpec {
            name: "Bot2".to_owned(),
            start: CellCoord::new(0, 0),
            destination: CellCoord::new(1, 1),
        }];

        let snapshot = ScenarioSnapshot::capture(&grid, &robots, 25);
        let decoded = ScenarioSnapshot::decode(&snapshot.encode()).expect("scenario decodes");
        let (restored_grid, restored_robots) = decoded.restore().expect("scenario restores");

        assert_eq!(restored_grid, grid);
        assert_eq!(restored_robots, robots);
        assert_eq!(decoded.max_ticks, 25);
    }

    #[test]
    fn rejects_foreign_prefixes_and_malformed_headers() {
        assert!(matches!(
            ScenarioSnapshot::decode("depot:v1:2x2:AAAA"),
            Err(ScenarioTransferError::InvalidPrefix(_))
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("fleet:v2:2x2:AAAA"),
            Err(ScenarioTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("   "),
            Err(ScenarioTransferError::EmptyPayload)
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("fleet:v1:axb:AAAA"),
            Err(ScenarioTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("fleet:v1:0x3:AAAA"),
            Err(ScenarioTransferError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn rejects_payloads_with_missing_cells() {
        let payload = SerializablePayload {
            max_ticks: 25,
            cells: vec![CellKind::Free],
            robots: Vec::new(),
        };
        let json = serde_json::to_vec(&payload).expect("payload serializes");
        let encoded = format!("{SNAPSHOT_HEADER}:2x2:{}", STANDARD_NO_PAD.encode(json));

        assert!(matches!(
            ScenarioSnapshot::decode(&encoded),
            Err(ScenarioTransferError::CellCountMismatch {
                expected: 4,
                found: 1,
            })
        ));
    }
}
