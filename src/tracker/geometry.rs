//! Planar geometry helpers: distances and merged-region partitioning.

use nalgebra::{Point2, Vector2};

/// A position in image coordinates (pixels).
pub type Point = Point2<f64>;

#[inline]
pub fn distance(a: &Point, b: &Point) -> f64 {
    nalgebra::distance(a, b)
}

#[inline]
pub fn midpoint(a: &Point, b: &Point) -> Point {
    nalgebra::center(a, b)
}

/// Mean of a set of points, `None` when the set is empty.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc: Vector2<f64>, p| acc + p.coords);
    Some(Point::from(sum / points.len() as f64))
}

/// Split the outline of a merged region between two previous positions.
///
/// The separating line passes through the midpoint of `first` and `second`
/// and is perpendicular to the segment joining them. A point whose
/// projection onto the normal `second - first` is negative belongs to
/// `first`, everything else (ties included) to `second`. A half that ends up
/// empty falls back to its own previous position.
pub fn split_centroids(outline: &[Point], first: &Point, second: &Point) -> (Point, Point) {
    let mid = midpoint(first, second);
    let normal: Vector2<f64> = second - first;

    let (first_half, second_half): (Vec<Point>, Vec<Point>) = outline
        .iter()
        .copied()
        .partition(|p| (*p - mid).dot(&normal) < 0.0);

    (
        centroid(&first_half).unwrap_or(*first),
        centroid(&second_half).unwrap_or(*second),
    )
}

/// Split the outline of a merged region between any number of previous
/// positions.
///
/// Two anchors use [`split_centroids`]. With more, every outline point goes
/// to its nearest anchor, later anchors winning ties. Anchors that receive no
/// points keep their own position.
pub fn partition_centroids(outline: &[Point], anchors: &[Point]) -> Vec<Point> {
    match anchors {
        [] => Vec::new(),
        [only] => vec![centroid(outline).unwrap_or(*only)],
        [first, second] => {
            let (a, b) = split_centroids(outline, first, second);
            vec![a, b]
        }
        _ => {
            let mut parts: Vec<Vec<Point>> = vec![Vec::new(); anchors.len()];
            for p in outline {
                let mut best = 0;
                let mut best_d = f64::INFINITY;
                for (i, anchor) in anchors.iter().enumerate() {
                    let d = (p - anchor).norm_squared();
                    if d <= best_d {
                        best = i;
                        best_d = d;
                    }
                }
                parts[best].push(*p);
            }
            parts
                .iter()
                .zip(anchors)
                .map(|(part, anchor)| centroid(part).unwrap_or(*anchor))
                .collect()
        }
    }
}
