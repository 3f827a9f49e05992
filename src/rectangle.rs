use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{AppError, Result};

/// Number of lines (corner points) that make up one rectangle
pub const POINTS_PER_RECTANGLE: usize = 4;

/// Pixel-space coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Nearest pixel, ties to even
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x.round_ties_even() as i32, self.y.round_ties_even() as i32)
    }
}

/// A grasp rectangle: four corner points in file order.
///
/// Only finite coordinates are ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Rectangle([Point; POINTS_PER_RECTANGLE]);

impl Rectangle {
    /// Returns `None` if any of the 8 coordinates is NaN or infinite.
    pub fn from_points(points: [Point; POINTS_PER_RECTANGLE]) -> Option<Self> {
        points.iter().all(Point::is_finite).then_some(Self(points))
    }

    pub const fn points(&self) -> &[Point; POINTS_PER_RECTANGLE] {
        &self.0
    }

    /// The four closed edges `(p1, p2), (p2, p3), (p3, p4), (p4, p1)`
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..POINTS_PER_RECTANGLE).map(|i| (self.0[i], self.0[(i + 1) % POINTS_PER_RECTANGLE]))
    }
}

/// Outcome of parsing one annotation file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRectangles {
    /// Valid rectangles in file order
    pub rectangles: Vec<Rectangle>,

    /// Complete groups discarded for holding a non-finite coordinate
    pub rejected: usize,

    /// Lines left over after the last complete group
    pub trailing_lines: usize,
}

/// Parse rectangles from annotation text.
///
/// Every line holds one `x y` pair (extra tokens are ignored) and every 4 consecutive lines
/// form one rectangle. `origin` is only used for error messages.
///
/// # Errors
///
/// Returns `AppError` if:
/// - Reading from `reader` fails
/// - A line has fewer than two tokens
/// - A token is not a floating-point number
pub fn parse_rectangles<R: BufRead>(reader: R, origin: &Path) -> Result<ParsedRectangles> {
    let mut parsed = ParsedRectangles::default();
    let mut group: Vec<Point> = Vec::with_capacity(POINTS_PER_RECTANGLE);

    for (num, line) in reader.lines().enumerate() {
        let line = line?;
        group.push(parse_point(&line, origin, num + 1)?);

        if group.len() == POINTS_PER_RECTANGLE {
            let points = [group[0], group[1], group[2], group[3]];
            match Rectangle::from_points(points) {
                Some(rect) => parsed.rectangles.push(rect),
                None => parsed.rejected += 1,
            }
            group.clear();
        }
    }
    parsed.trailing_lines = group.len();

    if parsed.rejected > 0 || parsed.trailing_lines > 0 {
        tracing::debug!(
            "{:?}: kept {} rectangles, dropped {} with NaN, {} trailing lines",
            origin,
            parsed.rectangles.len(),
            parsed.rejected,
            parsed.trailing_lines
        );
    }
    Ok(parsed)
}

/// Find valid rectangles in an annotation file
pub fn find_rec_points(path: &Path) -> Result<Vec<Rectangle>> {
    let file = File::open(path)?;
    parse_rectangles(BufReader::new(file), path).map(|parsed| parsed.rectangles)
}

fn parse_point(line: &str, origin: &Path, line_no: usize) -> Result<Point> {
    let mut tokens = line.split_whitespace();
    let (Some(x), Some(y)) = (tokens.next(), tokens.next()) else {
        return Err(AppError::MissingCoordinate {
            path: origin.to_path_buf(),
            line: line_no,
        });
    };

    let parse = |token: &str| {
        token
            .parse::<f64>()
            .map_err(|_| AppError::InvalidCoordinate {
                path: origin.to_path_buf(),
                line: line_no,
                token: token.to_string(),
            })
    };
    Ok(Point::new(parse(x)?, parse(y)?))
}
