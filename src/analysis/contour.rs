//! External contour extraction on binary images.
//!
//! A hand-rolled stand-in for the classical findContours: components
//! are discovered in scan order, their outer boundaries traced with
//! Moore neighbor tracing, and the traced chains reduced by dropping
//! collinear points.

use ndarray::Array2;

/// One external contour: the ordered outer boundary of a foreground
/// component, after chain reduction.
#[derive(Debug, Clone)]
pub struct Contour {
    /// Boundary points as (x, y).
    pub points: Vec<(u32, u32)>,
}

impl Contour {
    /// Enclosed area by the shoelace formula over the boundary
    /// polygon.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0f64;
        for i in 0..n {
            let (x0, y0) = self.points[i];
            let (x1, y1) = self.points[(i + 1) % n];
            acc += x0 as f64 * y1 as f64 - x1 as f64 * y0 as f64;
        }
        acc.abs() * 0.5
    }

    /// Mean y-coordinate over the boundary points.
    pub fn mean_y(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|&(_, y)| y as f64).sum::<f64>() / self.points.len() as f64
    }
}

// Clockwise Moore neighborhood, starting west.
const NEIGHBORS: [(isize, isize); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

#[inline]
fn foreground(mask: &Array2<f32>, x: isize, y: isize) -> bool {
    let (h, w) = mask.dim();
    x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h && mask[[y as usize, x as usize]] > 0.0
}

/// Moore neighbor tracing from the component's scan-order first pixel
/// (its west and north neighbors are guaranteed background).
fn trace_boundary(mask: &Array2<f32>, start: (isize, isize)) -> Vec<(u32, u32)> {
    let mut points = vec![(start.0 as u32, start.1 as u32)];
    // Enter from the west neighbor.
    let mut current = start;
    let mut backtrack_dir = 0usize;
    let (h, w) = mask.dim();
    let cap = 4 * (h * w) + 8;

    for _ in 0..cap {
        let mut found = None;
        // Scan clockwise starting just after the backtrack direction.
        for step in 1..=8 {
            let dir = (backtrack_dir + step) % 8;
            let (dx, dy) = NEIGHBORS[dir];
            let (nx, ny) = (current.0 + dx, current.1 + dy);
            if foreground(mask, nx, ny) {
                found = Some((dir, (nx, ny)));
                break;
            }
        }
        let Some((dir, next)) = found else {
            break; // isolated pixel
        };
        if next == start && points.len() > 1 {
            break;
        }
        points.push((next.0 as u32, next.1 as u32));
        // New backtrack: the direction pointing back at the previous
        // pixel, i.e. the reverse of the move, advanced by one is
        // handled by starting the scan after it.
        backtrack_dir = (dir + 4) % 8;
        current = next;
    }
    points
}

/// Drops points whose incoming and outgoing chain directions match.
fn reduce_chain(points: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    if points.len() < 3 {
        return points;
    }
    let n = points.len();
    let mut kept = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];
        let din = (cur.0 as i64 - prev.0 as i64, cur.1 as i64 - prev.1 as i64);
        let dout = (next.0 as i64 - cur.0 as i64, next.1 as i64 - cur.1 as i64);
        if din != dout {
            kept.push(cur);
        }
    }
    if kept.is_empty() {
        kept.push(points[0]);
    }
    kept
}

/// Finds the outer boundaries of all 8-connected foreground components
/// in a binary mask (nonzero = foreground).
pub fn find_external_contours(mask: &Array2<f32>) -> Vec<Contour> {
    let (h, w) = mask.dim();
    let mut labeled = Array2::<bool>::default((h, w));
    let mut contours = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if mask[[y, x]] <= 0.0 || labeled[[y, x]] {
                continue;
            }
            // First unvisited pixel of a new component.
            let boundary = trace_boundary(mask, (x as isize, y as isize));
            contours.push(Contour {
                points: reduce_chain(boundary),
            });
            // Flood the whole component so it is not traced again.
            let mut stack = vec![(x, y)];
            labeled[[y, x]] = true;
            while let Some((cx, cy)) = stack.pop() {
                for (dx, dy) in NEIGHBORS {
                    let (nx, ny) = (cx as isize + dx, cy as isize + dy);
                    if foreground(mask, nx, ny) && !labeled[[ny as usize, nx as usize]] {
                        labeled[[ny as usize, nx as usize]] = true;
                        stack.push((nx as usize, ny as usize));
                    }
                }
            }
        }
    }
    contours
}
