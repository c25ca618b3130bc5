// SPDX-License-Identifier: MPL-2.0

use std::path::{Path, PathBuf};

use crate::{
    error::{Error, Result},
    linear::{quat_from_euler_degrees, Quat, Vec3},
};

/// A recorded sample of a camera path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackPoint {
    pub position: Vec3,
    pub orientation: Quat,
    /// The pivot that the up vector points away from.
    pub center: Vec3,
    /// The stop index, if this point is a stop.
    pub stop: Option<usize>,
}

impl TrackPoint {
    /// Creates a point with no stop whose center lies one unit below it in its own frame.
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            center: position - orientation * Vec3::Y,
            stop: None,
        }
    }

    pub fn with_stop(mut self, stop: usize) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_center(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    pub fn is_stop(&self) -> bool {
        self.stop.is_some()
    }
}

/// Locations of the files that make up a track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackFiles {
    pub positions: PathBuf,
    pub rotations: PathBuf,
    pub centers: Option<PathBuf>,
}

/// Reads and parses a track from disk.
pub fn load_track(files: &TrackFiles) -> Result<Vec<TrackPoint>> {
    let read = |path: &Path| {
        std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    let positions = read(&files.positions)?;
    let rotations = read(&files.rotations)?;
    let centers = files.centers.as_deref().map(read).transpose()?;

    let points = parse_track(&positions, &rotations, centers.as_deref())?;
    tracing::info!(
        points = points.len(),
        stops = points.iter().filter(|p| p.is_stop()).count(),
        positions = %files.positions.display(),
        "loaded track"
    );

    Ok(points)
}

/// Parses a track from the text of its positions, rotations, and (optionally) centers files.
///
/// Positions are `x, y, z[, stop]`, where a non-negative `stop` marks a stop. Rotations are
/// `rx, ry, rz` Euler angles in degrees. Centers are `cx, cy, cz`.
pub fn parse_track(positions: &str, rotations: &str, centers: Option<&str>) -> Result<Vec<TrackPoint>> {
    let positions = parse_rows(positions, "positions", 3, 4)?;
    let rotations = parse_rows(rotations, "rotations", 3, 3)?;
    let centers = centers
        .map(|text| parse_rows(text, "centers", 3, 3))
        .transpose()?;

    if positions.is_empty() {
        return Err(Error::EmptyTrack);
    }
    if rotations.len() != positions.len() {
        return Err(Error::TrackMismatch {
            positions: positions.len(),
            other: rotations.len(),
            what: "rotation(s)",
        });
    }
    if let Some(centers) = &centers {
        if centers.len() != positions.len() {
            return Err(Error::TrackMismatch {
                positions: positions.len(),
                other: centers.len(),
                what: "center(s)",
            });
        }
    }

    let mut points = Vec::with_capacity(positions.len());
    for (i, (position, rotation)) in positions.iter().zip(&rotations).enumerate() {
        let orientation = quat_from_euler_degrees(rotation.values[0], rotation.values[1], rotation.values[2]);
        let mut point = TrackPoint::new(position.vec3(), orientation);
        if let Some(centers) = &centers {
            point.center = centers[i].vec3();
        }
        if let Some(&stop) = position.values.get(3) {
            if stop.fract() != 0. {
                return Err(Error::TrackParse {
                    file: "positions".to_owned(),
                    line: position.line,
                    message: format!("stop index '{stop}' is not an integer"),
                });
            }
            if stop >= 0. {
                point.stop = Some(stop as usize);
            }
        }
        points.push(point);
    }

    Ok(points)
}

struct Row {
    /// The 1-based line number.
    line: usize,
    values: Vec<f32>,
}

impl Row {
    fn vec3(&self) -> Vec3 {
        Vec3::new(self.values[0], self.values[1], self.values[2])
    }
}

fn parse_rows(text: &str, file: &str, min: usize, max: usize) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_number = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let error = |message: String| Error::TrackParse {
            file: file.to_owned(),
            line: line_number,
            message,
        };

        let values = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .map(|field| {
                field
                    .parse::<f32>()
                    .map_err(|_| error(format!("'{field}' is not a number")))
            })
            .collect::<Result<Vec<f32>>>()?;

        if values.len() < min || values.len() > max {
            return Err(error(if min == max {
                format!("expected {min} fields, found {}", values.len())
            } else {
                format!("expected {min} to {max} fields, found {}", values.len())
            }));
        }

        rows.push(Row {
            line: line_number,
            values,
        });
    }

    Ok(rows)
}
