//! Batch queries over primitive pairs stored in flat buffers.
//!
//! Pair `i` is row `i` of the first buffer against row `i` of the second. Every worker owns one GJK instance and one
//! clone of each prototype view, and rebinds the views row by row. Results go to disjoint slots of the caller's slice.
//! Every driver returns the number of distance subalgorithm calls summed over all pairs.

use tracing::debug;

use crate::error::GjkError;
use crate::physics::collidables::moving_polytope::MovingPolytope;
use crate::physics::collidables::shape::IPrimitiveView;
use crate::physics::collision_detection::gjk_distance_tester::{GJKDistanceTester, Witnesses};
use crate::physics::collision_detection::support_finder::IConvexPrimitive;
use crate::physics::collision_detection::sweep_tasks::{CollisionFinder, SweepSettings};
use crate::utilities::thread_dispatcher::ThreadDispatcher;
use crate::utilities::vector::{LiftVector, Vector};

#[inline]
fn check_buffer(name: &'static str, buffer: &[f64], expected: usize) -> Result<(), GjkError> {
    if buffer.len() < expected {
        return Err(GjkError::BufferSize {
            name,
            expected,
            actual: buffer.len(),
        });
    }
    Ok(())
}

#[inline]
fn check_results(results: usize, expected: usize) -> Result<(), GjkError> {
    if results != expected {
        return Err(GjkError::ResultLength {
            expected,
            actual: results,
        });
    }
    Ok(())
}

/// Validates the buffers of a pair batch and returns its pair count.
fn pair_count<'a, P, Q>(p: &P, p_buffer: &[f64], q: &Q, q_buffer: &[f64], results: usize) -> Result<usize, GjkError>
where
    P: IPrimitiveView<'a>,
    Q: IPrimitiveView<'a>,
{
    let n = p.row_count(p_buffer);
    check_buffer("q_buffer", q_buffer, n * q.size())?;
    check_results(results, n)?;
    Ok(n)
}

/// Runs `query(gjk, p, q, index)` for every pair and stores its output in `results[index]`.
fn dispatch_pairs<'a, V, P, Q, T, F>(
    dispatcher: &ThreadDispatcher,
    p: &P,
    p_buffer: &'a [f64],
    q: &Q,
    q_buffer: &'a [f64],
    results: &mut [T],
    query: F,
) -> Result<usize, GjkError>
where
    V: Vector,
    P: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
    Q: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
    T: Send,
    F: Fn(&mut GJKDistanceTester<V>, &P, &Q, usize) -> T + Sync,
{
    dispatcher.dispatch_workers(results, |_, begin, chunk| {
        let mut gjk = GJKDistanceTester::<V>::default();
        let mut p = p.clone();
        let mut q = q.clone();
        let mut sub_calls = 0;
        for (i, slot) in chunk.iter_mut().enumerate() {
            let index = begin + i;
            p.rebind(p_buffer, index);
            q.rebind(q_buffer, index);
            *slot = query(&mut gjk, &p, &q, index);
            sub_calls += gjk.sub_call_count();
        }
        sub_calls
    })
}

/// Intersection test for every pair.
pub fn intersecting_batch<'a, V, P, Q>(
    dispatcher: &ThreadDispatcher,
    p: &P,
    p_buffer: &'a [f64],
    q: &Q,
    q_buffer: &'a [f64],
    results: &mut [bool],
) -> Result<usize, GjkError>
where
    V: Vector,
    P: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
    Q: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
{
    let n = pair_count(p, p_buffer, q, q_buffer, results.len())?;
    let sub_calls = dispatch_pairs::<V, _, _, _, _>(dispatcher, p, p_buffer, q, q_buffer, results, |gjk, p, q, _| {
        gjk.intersecting(p, q)
    })?;
    debug!(
        "Tested {} pairs for intersection on {} threads with {} sub-calls",
        n,
        dispatcher.thread_count(),
        sub_calls
    );
    Ok(sub_calls)
}

/// Squared distance of every pair.
pub fn squared_distances_batch<'a, V, P, Q>(
    dispatcher: &ThreadDispatcher,
    p: &P,
    p_buffer: &'a [f64],
    q: &Q,
    q_buffer: &'a [f64],
    results: &mut [f64],
) -> Result<usize, GjkError>
where
    V: Vector,
    P: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
    Q: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
{
    let n = pair_count(p, p_buffer, q, q_buffer, results.len())?;
    let sub_calls = dispatch_pairs::<V, _, _, _, _>(dispatcher, p, p_buffer, q, q_buffer, results, |gjk, p, q, _| {
        gjk.squared_distance(p, q)
    })?;
    debug!(
        "Computed {} squared distances on {} threads with {} sub-calls",
        n,
        dispatcher.thread_count(),
        sub_calls
    );
    Ok(sub_calls)
}

/// Closest points of every pair.
pub fn witnesses_batch<'a, V, P, Q>(
    dispatcher: &ThreadDispatcher,
    p: &P,
    p_buffer: &'a [f64],
    q: &Q,
    q_buffer: &'a [f64],
    results: &mut [Witnesses<V>],
) -> Result<usize, GjkError>
where
    V: Vector,
    P: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
    Q: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
{
    let n = pair_count(p, p_buffer, q, q_buffer, results.len())?;
    let sub_calls = dispatch_pairs::<V, _, _, _, _>(dispatcher, p, p_buffer, q, q_buffer, results, |gjk, p, q, _| {
        gjk.witnesses(p, q)
    })?;
    debug!(
        "Computed {} witness pairs on {} threads with {} sub-calls",
        n,
        dispatcher.thread_count(),
        sub_calls
    );
    Ok(sub_calls)
}

/// Intersection test of every pair thickened by `p_offsets[i]` and `q_offsets[i]`.
#[allow(clippy::too_many_arguments)]
pub fn offset_intersecting_batch<'a, V, P, Q>(
    dispatcher: &ThreadDispatcher,
    p: &P,
    p_buffer: &'a [f64],
    p_offsets: &[f64],
    q: &Q,
    q_buffer: &'a [f64],
    q_offsets: &[f64],
    results: &mut [bool],
) -> Result<usize, GjkError>
where
    V: Vector,
    P: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
    Q: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
{
    let n = pair_count(p, p_buffer, q, q_buffer, results.len())?;
    check_buffer("p_offsets", p_offsets, n)?;
    check_buffer("q_offsets", q_offsets, n)?;
    let sub_calls = dispatch_pairs::<V, _, _, _, _>(dispatcher, p, p_buffer, q, q_buffer, results, |gjk, p, q, i| {
        gjk.offset_intersecting(p, p_offsets[i], q, q_offsets[i])
    })?;
    debug!(
        "Tested {} offset pairs for intersection on {} threads with {} sub-calls",
        n,
        dispatcher.thread_count(),
        sub_calls
    );
    Ok(sub_calls)
}

/// Squared distance of every pair thickened by `p_offsets[i]` and `q_offsets[i]`.
#[allow(clippy::too_many_arguments)]
pub fn offset_squared_distances_batch<'a, V, P, Q>(
    dispatcher: &ThreadDispatcher,
    p: &P,
    p_buffer: &'a [f64],
    p_offsets: &[f64],
    q: &Q,
    q_buffer: &'a [f64],
    q_offsets: &[f64],
    results: &mut [f64],
) -> Result<usize, GjkError>
where
    V: Vector,
    P: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
    Q: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
{
    let n = pair_count(p, p_buffer, q, q_buffer, results.len())?;
    check_buffer("p_offsets", p_offsets, n)?;
    check_buffer("q_offsets", q_offsets, n)?;
    let sub_calls = dispatch_pairs::<V, _, _, _, _>(dispatcher, p, p_buffer, q, q_buffer, results, |gjk, p, q, i| {
        gjk.offset_squared_distance(p, p_offsets[i], q, q_offsets[i])
    })?;
    debug!(
        "Computed {} offset squared distances on {} threads with {} sub-calls",
        n,
        dispatcher.thread_count(),
        sub_calls
    );
    Ok(sub_calls)
}

/// Closest points of every pair thickened by `p_offsets[i]` and `q_offsets[i]`.
#[allow(clippy::too_many_arguments)]
pub fn offset_witnesses_batch<'a, V, P, Q>(
    dispatcher: &ThreadDispatcher,
    p: &P,
    p_buffer: &'a [f64],
    p_offsets: &[f64],
    q: &Q,
    q_buffer: &'a [f64],
    q_offsets: &[f64],
    results: &mut [Witnesses<V>],
) -> Result<usize, GjkError>
where
    V: Vector,
    P: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
    Q: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
{
    let n = pair_count(p, p_buffer, q, q_buffer, results.len())?;
    check_buffer("p_offsets", p_offsets, n)?;
    check_buffer("q_offsets", q_offsets, n)?;
    let sub_calls = dispatch_pairs::<V, _, _, _, _>(dispatcher, p, p_buffer, q, q_buffer, results, |gjk, p, q, i| {
        gjk.offset_witnesses(p, p_offsets[i], q, q_offsets[i])
    })?;
    debug!(
        "Computed {} offset witness pairs on {} threads with {} sub-calls",
        n,
        dispatcher.thread_count(),
        sub_calls
    );
    Ok(sub_calls)
}

/// Multipole acceptance criterion of every pair at scale `theta_squared`.
pub fn multipole_acceptance_batch<'a, V, P, Q>(
    dispatcher: &ThreadDispatcher,
    p: &P,
    p_buffer: &'a [f64],
    q: &Q,
    q_buffer: &'a [f64],
    theta_squared: f64,
    results: &mut [bool],
) -> Result<usize, GjkError>
where
    V: Vector,
    P: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
    Q: IPrimitiveView<'a> + IConvexPrimitive<V> + Sync,
{
    let n = pair_count(p, p_buffer, q, q_buffer, results.len())?;
    let sub_calls = dispatch_pairs::<V, _, _, _, _>(dispatcher, p, p_buffer, q, q_buffer, results, |gjk, p, q, _| {
        gjk.multipole_acceptance(p, q, theta_squared)
    })?;
    debug!(
        "Evaluated {} multipole acceptance tests on {} threads with {} sub-calls",
        n,
        dispatcher.thread_count(),
        sub_calls
    );
    Ok(sub_calls)
}

/// Maximum safe step of every pair of moving polytopes, starting from `t_init[i]`.
///
/// Returns the number of GJK queries summed over all pairs.
#[allow(clippy::too_many_arguments)]
pub fn safe_step_sizes_batch<'a, V: LiftVector>(
    dispatcher: &ThreadDispatcher,
    settings: SweepSettings,
    p: &MovingPolytope<'a, V>,
    p_coordinates: &'a [f64],
    p_velocities: &'a [f64],
    q: &MovingPolytope<'a, V>,
    q_coordinates: &'a [f64],
    q_velocities: &'a [f64],
    t_init: &[f64],
    results: &mut [f64],
) -> Result<usize, GjkError> {
    let n = p.row_count(p_coordinates);
    check_buffer(
        "p_velocities",
        p_velocities,
        n * MovingPolytope::<V>::velocity_size(p.point_count()),
    )?;
    check_buffer(
        "q_coordinates",
        q_coordinates,
        n * MovingPolytope::<V>::coordinate_size(q.point_count()),
    )?;
    check_buffer(
        "q_velocities",
        q_velocities,
        n * MovingPolytope::<V>::velocity_size(q.point_count()),
    )?;
    check_buffer("t_init", t_init, n)?;
    check_results(results.len(), n)?;

    let iterations = dispatcher.dispatch_workers(results, |_, begin, chunk| {
        let mut finder = CollisionFinder::<V>::new(settings);
        let mut p = *p;
        let mut q = *q;
        let mut iterations = 0;
        for (i, slot) in chunk.iter_mut().enumerate() {
            let index = begin + i;
            *slot = finder.find_maximum_safe_step_size_rows(
                &mut p,
                p_coordinates,
                p_velocities,
                &mut q,
                q_coordinates,
                q_velocities,
                index,
                t_init[index],
            );
            iterations += finder.iteration_count();
        }
        iterations
    })?;
    debug!(
        "Computed {} safe steps on {} threads with {} GJK queries",
        n,
        dispatcher.thread_count(),
        iterations
    );
    Ok(iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collidables::box_shape::Aabb;
    use crate::physics::collidables::point::Point;
    use crate::physics::collidables::polytope::Polytope;
    use crate::utilities::bounding_box::BoundingBox;
    use approx::assert_relative_eq;
    use glam::DVec2;

    const PAIR_COUNT: usize = 23;

    fn points() -> (Vec<f64>, Vec<DVec2>) {
        let positions: Vec<DVec2> = (0..PAIR_COUNT)
            .map(|i| DVec2::new(i as f64 * 0.5 - 3.0, (i % 5) as f64 - 2.0))
            .collect();
        let mut buffer = vec![0.0; PAIR_COUNT * Point::<DVec2>::SIZE];
        for (row, &p) in buffer.chunks_exact_mut(Point::<DVec2>::SIZE).zip(&positions) {
            Point::write_row(row, p);
        }
        (buffer, positions)
    }

    fn triangles() -> Vec<f64> {
        let size = Polytope::<DVec2>::row_size(3);
        let mut buffer = vec![0.0; PAIR_COUNT * size];
        for (i, row) in buffer.chunks_exact_mut(size).enumerate() {
            let shift = DVec2::new(0.0, i as f64 * 0.1);
            Polytope::write_row(
                row,
                &[
                    DVec2::new(-1.0, -1.0) + shift,
                    DVec2::new(1.0, -1.0) + shift,
                    DVec2::new(0.0, 1.0) + shift,
                ],
            );
        }
        buffer
    }

    #[test]
    fn test_batches_match_sequential_queries() {
        let (point_buffer, _) = points();
        let triangle_buffer = triangles();
        let point = Point::<DVec2>::new();
        let triangle = Polytope::<DVec2>::new(3).unwrap();

        let mut expected_distances = vec![0.0; PAIR_COUNT];
        let mut expected_intersecting = vec![false; PAIR_COUNT];
        let mut gjk = GJKDistanceTester::<DVec2>::default();
        let (mut p, mut q) = (point, triangle);
        for i in 0..PAIR_COUNT {
            p.rebind(&point_buffer, i);
            q.rebind(&triangle_buffer, i);
            expected_distances[i] = gjk.squared_distance(&p, &q);
            expected_intersecting[i] = gjk.intersecting(&p, &q);
        }
        assert!(expected_intersecting.iter().any(|&hit| hit));
        assert!(expected_intersecting.iter().any(|&hit| !hit));

        for thread_count in [1, 3, 8] {
            let dispatcher = ThreadDispatcher::new(thread_count).unwrap();

            let mut distances = vec![-1.0; PAIR_COUNT];
            squared_distances_batch::<DVec2, _, _>(
                &dispatcher,
                &point,
                &point_buffer,
                &triangle,
                &triangle_buffer,
                &mut distances,
            )
            .unwrap();
            assert_eq!(distances, expected_distances);

            let mut intersecting = vec![false; PAIR_COUNT];
            intersecting_batch::<DVec2, _, _>(
                &dispatcher,
                &point,
                &point_buffer,
                &triangle,
                &triangle_buffer,
                &mut intersecting,
            )
            .unwrap();
            assert_eq!(intersecting, expected_intersecting);

            let mut witnesses = vec![Witnesses::default(); PAIR_COUNT];
            witnesses_batch::<DVec2, _, _>(&dispatcher, &point, &point_buffer, &triangle, &triangle_buffer, &mut witnesses).unwrap();
            for (w, &d) in witnesses.iter().zip(&expected_distances) {
                assert_eq!(w.squared_distance, d);
                assert_relative_eq!((w.x - w.y).length_squared(), d, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_sub_calls_are_reduced_across_threads() {
        let (point_buffer, _) = points();
        let triangle_buffer = triangles();
        let point = Point::<DVec2>::new();
        let triangle = Polytope::<DVec2>::new(3).unwrap();
        let mut results = vec![0.0; PAIR_COUNT];

        let single = squared_distances_batch::<DVec2, _, _>(
            &ThreadDispatcher::new(1).unwrap(),
            &point,
            &point_buffer,
            &triangle,
            &triangle_buffer,
            &mut results,
        )
        .unwrap();
        let parallel = squared_distances_batch::<DVec2, _, _>(
            &ThreadDispatcher::new(4).unwrap(),
            &point,
            &point_buffer,
            &triangle,
            &triangle_buffer,
            &mut results,
        )
        .unwrap();
        assert!(single > 0);
        assert_eq!(single, parallel);
    }

    #[test]
    fn test_offset_batches() {
        let (point_buffer, positions) = points();
        let mut origin_buffer = vec![0.0; PAIR_COUNT * Point::<DVec2>::SIZE];
        for row in origin_buffer.chunks_exact_mut(Point::<DVec2>::SIZE) {
            Point::write_row(row, DVec2::ZERO);
        }
        let point = Point::<DVec2>::new();
        let p_offsets = vec![0.5; PAIR_COUNT];
        let q_offsets = vec![0.25; PAIR_COUNT];
        let dispatcher = ThreadDispatcher::new(3).unwrap();

        let mut distances = vec![0.0; PAIR_COUNT];
        offset_squared_distances_batch::<DVec2, _, _>(
            &dispatcher,
            &point,
            &point_buffer,
            &p_offsets,
            &point,
            &origin_buffer,
            &q_offsets,
            &mut distances,
        )
        .unwrap();
        let mut intersecting = vec![false; PAIR_COUNT];
        offset_intersecting_batch::<DVec2, _, _>(
            &dispatcher,
            &point,
            &point_buffer,
            &p_offsets,
            &point,
            &origin_buffer,
            &q_offsets,
            &mut intersecting,
        )
        .unwrap();
        let mut witnesses = vec![Witnesses::default(); PAIR_COUNT];
        offset_witnesses_batch::<DVec2, _, _>(
            &dispatcher,
            &point,
            &point_buffer,
            &p_offsets,
            &point,
            &origin_buffer,
            &q_offsets,
            &mut witnesses,
        )
        .unwrap();

        for i in 0..PAIR_COUNT {
            let gap = (positions[i].length() - 0.75).max(0.0);
            assert_relative_eq!(distances[i], gap * gap, epsilon = 1e-9);
            assert_eq!(intersecting[i], gap == 0.0);
            assert_relative_eq!(witnesses[i].squared_distance, gap * gap, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_multipole_acceptance_batch_on_boxes() {
        let size = Aabb::<DVec2>::SIZE;
        let mut p_buffer = vec![0.0; 2 * size];
        let mut q_buffer = vec![0.0; 2 * size];
        Aabb::write_row(&mut p_buffer[..size], &BoundingBox::new(DVec2::splat(-1.0), DVec2::splat(1.0)));
        Aabb::write_row(&mut p_buffer[size..], &BoundingBox::new(DVec2::splat(-1.0), DVec2::splat(1.0)));
        Aabb::write_row(&mut q_buffer[..size], &BoundingBox::new(DVec2::new(9.0, -1.0), DVec2::new(11.0, 1.0)));
        Aabb::write_row(&mut q_buffer[size..], &BoundingBox::new(DVec2::new(1.5, -1.0), DVec2::new(3.5, 1.0)));

        let aabb = Aabb::<DVec2>::new();
        let mut results = vec![false; 2];
        let sub_calls = multipole_acceptance_batch::<DVec2, _, _>(
            &ThreadDispatcher::new(2).unwrap(),
            &aabb,
            &p_buffer,
            &aabb,
            &q_buffer,
            1.0,
            &mut results,
        )
        .unwrap();
        assert_eq!(results, vec![true, false]);
        // Both pairs take the closed form.
        assert_eq!(sub_calls, 0);
    }

    #[test]
    fn test_safe_step_sizes_batch() {
        let coordinate_size = MovingPolytope::<DVec2>::coordinate_size(1);
        let velocity_size = MovingPolytope::<DVec2>::velocity_size(1);
        let mut p_coordinates = vec![0.0; 3 * coordinate_size];
        let mut p_velocities = vec![0.0; 3 * velocity_size];
        let mut q_coordinates = vec![0.0; 3 * coordinate_size];
        let mut q_velocities = vec![0.0; 3 * velocity_size];
        for i in 0..3 {
            let rows = i * coordinate_size..(i + 1) * coordinate_size;
            MovingPolytope::write_coordinate_row(&mut p_coordinates[rows.clone()], &[DVec2::ZERO]);
            MovingPolytope::write_coordinate_row(&mut q_coordinates[rows], &[DVec2::new(2.0 * (i + 1) as f64, 0.0)]);
            let rows = i * velocity_size..(i + 1) * velocity_size;
            MovingPolytope::write_velocity_row(&mut p_velocities[rows.clone()], &[DVec2::X]);
            MovingPolytope::write_velocity_row(&mut q_velocities[rows], &[DVec2::ZERO]);
        }

        let p = MovingPolytope::<DVec2>::new(1).unwrap();
        let q = MovingPolytope::<DVec2>::new(1).unwrap();
        let t_init = [10.0, 10.0, 1.0];
        let mut results = vec![0.0; 3];
        let iterations = safe_step_sizes_batch(
            &ThreadDispatcher::new(2).unwrap(),
            SweepSettings::default(),
            &p,
            &p_coordinates,
            &p_velocities,
            &q,
            &q_coordinates,
            &q_velocities,
            &t_init,
            &mut results,
        )
        .unwrap();

        assert!(results[0] <= 2.0 && results[0] >= 1.75, "{}", results[0]);
        assert!(results[1] <= 4.0 && results[1] >= 3.5, "{}", results[1]);
        // Contact at 6 lies beyond the step.
        assert_eq!(results[2], 1.0);
        assert!(iterations > 3);
    }

    #[test]
    fn test_validation_errors() {
        let (point_buffer, _) = points();
        let point = Point::<DVec2>::new();
        let dispatcher = ThreadDispatcher::new(2).unwrap();

        let mut results = vec![0.0; PAIR_COUNT];
        assert_eq!(
            squared_distances_batch::<DVec2, _, _>(
                &dispatcher,
                &point,
                &point_buffer,
                &point,
                &point_buffer[..point_buffer.len() - 1],
                &mut results,
            )
            .unwrap_err(),
            GjkError::BufferSize {
                name: "q_buffer",
                expected: point_buffer.len(),
                actual: point_buffer.len() - 1,
            }
        );

        let mut short = vec![0.0; PAIR_COUNT - 1];
        assert_eq!(
            squared_distances_batch::<DVec2, _, _>(&dispatcher, &point, &point_buffer, &point, &point_buffer, &mut short)
                .unwrap_err(),
            GjkError::ResultLength {
                expected: PAIR_COUNT,
                actual: PAIR_COUNT - 1,
            }
        );

        let mut flags = vec![false; PAIR_COUNT];
        assert!(matches!(
            offset_intersecting_batch::<DVec2, _, _>(
                &dispatcher,
                &point,
                &point_buffer,
                &[0.0; 3],
                &point,
                &point_buffer,
                &vec![0.0; PAIR_COUNT],
                &mut flags,
            ),
            Err(GjkError::BufferSize { name: "p_offsets", .. })
        ));
    }
}
