use corridor_core::{Point, ScalarField};

/// Sliding minimum over a disk-shaped neighborhood.
///
/// The value at each cell becomes the minimum of the input over all cells
/// within Euclidean distance `radius`: offset `(dx, dy)` is part of the
/// footprint iff `dx² + dy² ≤ radius²`. The footprint is a disk, not a
/// square, so e.g. radius 2 excludes the `(2, 2)` corner offsets.
///
/// Cells near the grid edge clamp the window to the nearest in-grid cell,
/// equivalent to replicating border values outward, so the window is
/// always full-sized. Radius 0 is the identity.
///
/// For an accumulated-cost surface this estimates the best cost reachable
/// if a crossing could be placed anywhere within `radius` cells.
pub fn disk_minimum(field: &ScalarField, radius: u32) -> ScalarField {
    if radius == 0 {
        return field.clone();
    }

    let r = radius as i32;
    // Half-width of the footprint row at each vertical offset.
    let spans: Vec<(i32, i32)> = (-r..=r)
        .map(|dy| {
            let half = ((r * r - dy * dy) as f64).sqrt().floor() as i32;
            (dy, half)
        })
        .collect();

    let bounds = field.bounds();
    let mut out = ScalarField::new_filled(bounds, f64::INFINITY);
    for p in bounds {
        let mut min = f64::INFINITY;
        for &(dy, half) in &spans {
            for dx in -half..=half {
                let q = bounds.clamp(Point::new(p.x + dx, p.y + dy));
                min = min.min(field.value(q));
            }
        }
        out.set(p, min);
    }
    out
}
