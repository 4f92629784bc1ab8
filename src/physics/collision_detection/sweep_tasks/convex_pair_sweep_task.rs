use tracing::{trace, warn};

use crate::physics::collidables::moving_polytope::MovingPolytope;
use crate::physics::collision_detection::gjk_distance_tester::{GJKDistanceTester, GjkSettings};
use crate::physics::collision_detection::support_finder::IMovingPrimitive;
use crate::utilities::math_helper;
use crate::utilities::vector::LiftVector;

/// Capacity of the bisection stack. Every iteration pushes at most one bound, so this also caps the iteration count.
pub const BISECTION_STACK_CAPACITY: usize = 128;

/// Tuning of a [`CollisionFinder`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepSettings {
    /// The search stops once the bracket `[a, b]` satisfies `b - a <= relative_tolerance * b`.
    pub relative_tolerance: f64,
    /// Cap on the number of GJK queries per search. Clamped to [`BISECTION_STACK_CAPACITY`].
    pub max_iterations: usize,
    /// Warm-start every GJK query but the first from the previous closest point.
    pub reuse_direction: bool,
}

impl SweepSettings {
    pub const RELATIVE_TOLERANCE_DEFAULT: f64 = 0.0625;
    pub const MAX_ITERATIONS_DEFAULT: usize = BISECTION_STACK_CAPACITY;
    pub const REUSE_DIRECTION_DEFAULT: bool = true;
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            relative_tolerance: Self::RELATIVE_TOLERANCE_DEFAULT,
            max_iterations: Self::MAX_ITERATIONS_DEFAULT,
            reuse_direction: Self::REUSE_DIRECTION_DEFAULT,
        }
    }
}

/// Conservative advancement for pairs of linearly moving primitives.
///
/// The pair is tested in space-time over a window `[a, b]`: if the two swept bodies do not intersect, no contact
/// happens anywhere in the window. The window is bisected until the largest certified time is known to within the
/// relative tolerance. Upper bounds that were found intersecting are kept on a stack so that a certified window
/// resumes from the last infeasible bound instead of restarting.
#[derive(Clone, Debug)]
pub struct CollisionFinder<V: LiftVector> {
    gjk: GJKDistanceTester<V::Lifted>,
    settings: SweepSettings,
    stack: [f64; BISECTION_STACK_CAPACITY],
    stack_len: usize,
    iteration_count: usize,
    hit_iteration_limit: bool,
}

impl<V: LiftVector> Default for CollisionFinder<V> {
    fn default() -> Self {
        Self::new(SweepSettings::default())
    }
}

impl<V: LiftVector> CollisionFinder<V> {
    pub fn new(settings: SweepSettings) -> Self {
        Self::with_gjk_settings(settings, GjkSettings::default())
    }

    pub fn with_gjk_settings(settings: SweepSettings, gjk_settings: GjkSettings) -> Self {
        Self {
            gjk: GJKDistanceTester::new(gjk_settings),
            settings: SweepSettings {
                max_iterations: math_helper::clamp(settings.max_iterations, 0, BISECTION_STACK_CAPACITY),
                ..settings
            },
            stack: [0.0; BISECTION_STACK_CAPACITY],
            stack_len: 0,
            iteration_count: 0,
            hit_iteration_limit: false,
        }
    }

    #[inline]
    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }

    /// The space-time GJK instance, holding the state of the last discrete query.
    #[inline]
    pub fn gjk(&self) -> &GJKDistanceTester<V::Lifted> {
        &self.gjk
    }

    /// Number of GJK queries made by the last search.
    #[inline]
    pub fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    /// True if the last search ran out of iterations. Its result is still a certified lower bound.
    #[inline]
    pub fn hit_iteration_limit(&self) -> bool {
        self.hit_iteration_limit
    }

    #[inline]
    fn set_window<P, Q>(p: &mut P, q: &mut Q, a: f64, b: f64)
    where
        P: IMovingPrimitive<V> + ?Sized,
        Q: IMovingPrimitive<V> + ?Sized,
    {
        p.set_first_time(a);
        p.set_second_time(b);
        q.set_first_time(a);
        q.set_second_time(b);
    }

    /// Returns the largest time in `(0, t_init]` up to which `p` and `q` can be advanced without touching, to within
    /// the relative tolerance. Both primitives are left bound to the last window the search tested.
    ///
    /// `t_init <= 0` returns zero without querying.
    pub fn find_maximum_safe_step_size<P, Q>(&mut self, p: &mut P, q: &mut Q, t_init: f64) -> f64
    where
        P: IMovingPrimitive<V> + ?Sized,
        Q: IMovingPrimitive<V> + ?Sized,
    {
        self.stack_len = 0;
        self.iteration_count = 0;
        self.hit_iteration_limit = false;
        if !(t_init > 0.0) {
            return 0.0;
        }

        let mut a = 0.0;
        let mut b = t_init;
        Self::set_window(p, q, a, b);
        p.set_time_scale(1.0);
        q.set_time_scale(1.0);

        // Scale time so that one step spans about as much as the pair does in space.
        let time_scale = (self.gjk.interior_points_squared_distance(&*p, &*q)
            + p.squared_radius()
            + q.squared_radius())
        .sqrt()
            / t_init;
        p.set_time_scale(time_scale);
        q.set_time_scale(time_scale);

        let epsilon = self.settings.relative_tolerance;
        while b - a > epsilon * b && self.iteration_count < self.settings.max_iterations {
            let reuse_direction = self.settings.reuse_direction && self.iteration_count > 0;
            self.iteration_count += 1;

            if self.gjk.intersecting_with(&*p, &*q, 1.0, reuse_direction) {
                debug_assert!(self.stack_len < BISECTION_STACK_CAPACITY);
                self.stack[self.stack_len] = b;
                self.stack_len += 1;
                b = 0.5 * (a + b);
                p.set_second_time(b);
                q.set_second_time(b);
            } else if self.stack_len > 0 {
                self.stack_len -= 1;
                a = b;
                b = self.stack[self.stack_len];
                Self::set_window(p, q, a, b);
            } else {
                trace!(
                    "Step {} certified after {} queries",
                    b, self.iteration_count
                );
                return b;
            }
        }

        if self.iteration_count >= self.settings.max_iterations {
            self.hit_iteration_limit = true;
            warn!(
                "Safe step search stopped after {} queries with bracket [{}, {}]",
                self.iteration_count, a, b
            );
            return a;
        }
        trace!(
            "Safe step bracket [{}, {}] after {} queries",
            a, b, self.iteration_count
        );
        if a <= 0.0 {
            b
        } else {
            a
        }
    }

    /// Binds `p` and `q` to row `index` of their coordinate and velocity buffers and runs
    /// [`find_maximum_safe_step_size`](Self::find_maximum_safe_step_size).
    #[allow(clippy::too_many_arguments)]
    pub fn find_maximum_safe_step_size_rows<'a>(
        &mut self,
        p: &mut MovingPolytope<'a, V>,
        p_coordinates: &'a [f64],
        p_velocities: &'a [f64],
        q: &mut MovingPolytope<'a, V>,
        q_coordinates: &'a [f64],
        q_velocities: &'a [f64],
        index: usize,
        t_init: f64,
    ) -> f64 {
        p.rebind(p_coordinates, p_velocities, index);
        q.rebind(q_coordinates, q_velocities, index);
        self.find_maximum_safe_step_size(p, q, t_init)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DVec2, DVec3};
    use proptest::prelude::*;
    use std::marker::PhantomData;

    struct MovingRows<V> {
        coordinates: Vec<f64>,
        velocities: Vec<f64>,
        point_count: usize,
        _vector: PhantomData<V>,
    }

    impl<V: LiftVector> MovingRows<V> {
        fn new(points: &[V], velocity: V) -> Self {
            let n = points.len();
            let mut coordinates = vec![0.0; MovingPolytope::<V>::coordinate_size(n)];
            let mut velocities = vec![0.0; MovingPolytope::<V>::velocity_size(n)];
            MovingPolytope::<V>::write_coordinate_row(&mut coordinates, points);
            MovingPolytope::<V>::write_velocity_row(&mut velocities, &vec![velocity; n]);
            Self {
                coordinates,
                velocities,
                point_count: n,
                _vector: PhantomData,
            }
        }

        fn view(&self) -> MovingPolytope<'_, V> {
            let mut view = MovingPolytope::new(self.point_count).unwrap();
            view.bind(&self.coordinates, &self.velocities);
            view
        }
    }

    fn box_corners(center: DVec2, half: DVec2) -> [DVec2; 4] {
        [
            center - half,
            center + DVec2::new(half.x, -half.y),
            center + half,
            center + DVec2::new(-half.x, half.y),
        ]
    }

    #[test]
    fn test_point_reaches_point() {
        let p_rows = MovingRows::new(&[DVec2::ZERO], DVec2::new(1.0, 0.0));
        let q_rows = MovingRows::new(&[DVec2::new(5.0, 0.0)], DVec2::ZERO);
        let (mut p, mut q) = (p_rows.view(), q_rows.view());

        let mut finder = CollisionFinder::<DVec2>::default();
        let t = finder.find_maximum_safe_step_size(&mut p, &mut q, 10.0);
        assert!(t <= 5.0, "{}", t);
        assert!(t >= 5.0 * (1.0 - 2.0 * SweepSettings::RELATIVE_TOLERANCE_DEFAULT), "{}", t);
        assert!(!finder.hit_iteration_limit());
        assert!(finder.iteration_count() > 1);
    }

    #[test]
    fn test_diverging_pair_takes_the_full_step() {
        let p_rows = MovingRows::new(&box_corners(DVec2::ZERO, DVec2::ONE), DVec2::new(-1.0, 0.0));
        let q_rows = MovingRows::new(&box_corners(DVec2::new(4.0, 0.0), DVec2::ONE), DVec2::new(1.0, 0.0));
        let (mut p, mut q) = (p_rows.view(), q_rows.view());

        let mut finder = CollisionFinder::<DVec2>::default();
        assert_eq!(finder.find_maximum_safe_step_size(&mut p, &mut q, 3.0), 3.0);
        assert_eq!(finder.iteration_count(), 1);
    }

    #[test]
    fn test_non_positive_step() {
        let p_rows = MovingRows::new(&[DVec2::ZERO], DVec2::new(1.0, 0.0));
        let q_rows = MovingRows::new(&[DVec2::new(5.0, 0.0)], DVec2::ZERO);
        let (mut p, mut q) = (p_rows.view(), q_rows.view());

        let mut finder = CollisionFinder::<DVec2>::default();
        assert_eq!(finder.find_maximum_safe_step_size(&mut p, &mut q, 0.0), 0.0);
        assert_eq!(finder.find_maximum_safe_step_size(&mut p, &mut q, -1.0), 0.0);
        assert_eq!(finder.iteration_count(), 0);
    }

    #[test]
    fn test_iteration_limit_returns_certified_bound() {
        let p_rows = MovingRows::new(&box_corners(DVec2::ZERO, DVec2::ONE), DVec2::ZERO);
        let q_rows = MovingRows::new(&box_corners(DVec2::new(0.5, 0.0), DVec2::ONE), DVec2::ZERO);
        let (mut p, mut q) = (p_rows.view(), q_rows.view());

        // Overlapping from the start: nothing can be certified.
        let mut finder = CollisionFinder::<DVec2>::default();
        assert_eq!(finder.find_maximum_safe_step_size(&mut p, &mut q, 1.0), 0.0);
        assert!(finder.hit_iteration_limit());
        assert_eq!(finder.iteration_count(), BISECTION_STACK_CAPACITY);

        let settings = SweepSettings {
            max_iterations: 1000,
            ..SweepSettings::default()
        };
        assert_eq!(CollisionFinder::<DVec2>::new(settings).settings().max_iterations, BISECTION_STACK_CAPACITY);
    }

    fn cube_corners(center: DVec3, half: f64) -> Vec<DVec3> {
        (0..8)
            .map(|i| {
                let corner = DVec3::new(
                    if i & 1 == 0 { -half } else { half },
                    if i & 2 == 0 { -half } else { half },
                    if i & 4 == 0 { -half } else { half },
                );
                center + corner
            })
            .collect()
    }

    #[test]
    fn test_moving_cubes() {
        // Gap of 3 closed at unit speed.
        let p_rows = MovingRows::new(&cube_corners(DVec3::ZERO, 1.0), DVec3::new(1.0, 0.0, 0.0));
        let q_rows = MovingRows::new(&cube_corners(DVec3::new(5.0, 0.5, -0.25), 1.0), DVec3::ZERO);
        let (mut p, mut q) = (p_rows.view(), q_rows.view());

        let mut finder = CollisionFinder::<DVec3>::default();
        assert_eq!(finder.gjk().ambient_dimension(), 4);
        let t = finder.find_maximum_safe_step_size(&mut p, &mut q, 6.0);
        assert!(t <= 3.0 + 1e-9, "{}", t);
        assert!(t >= 3.0 * (1.0 - 2.0 * SweepSettings::RELATIVE_TOLERANCE_DEFAULT), "{}", t);
        assert!(!finder.hit_iteration_limit());

        // Moving away along the other axis.
        let r_rows = MovingRows::new(&cube_corners(DVec3::new(0.0, 0.0, 4.0), 1.0), DVec3::new(0.0, 0.0, 2.0));
        let mut r = r_rows.view();
        let mut p = p_rows.view();
        assert_eq!(finder.find_maximum_safe_step_size(&mut p, &mut r, 6.0), 6.0);
        assert_eq!(finder.iteration_count(), 1);
    }

    #[test]
    fn test_shrinking_tolerance_approaches_contact() {
        let p_rows = MovingRows::new(&box_corners(DVec2::ZERO, DVec2::ONE), DVec2::new(1.0, 0.0));
        let q_rows = MovingRows::new(&box_corners(DVec2::new(6.3, 0.5), DVec2::ONE), DVec2::ZERO);
        let t_contact = 4.3;

        let mut previous_iterations = 0;
        for relative_tolerance in [1e-2, 1e-4, 1e-6] {
            let (mut p, mut q) = (p_rows.view(), q_rows.view());
            let mut finder = CollisionFinder::<DVec2>::new(SweepSettings {
                relative_tolerance,
                ..SweepSettings::default()
            });
            let t = finder.find_maximum_safe_step_size(&mut p, &mut q, 8.0);
            assert!(t <= t_contact + 1e-9, "{} > {}", t, t_contact);
            assert!(t >= t_contact * (1.0 - 2.0 * relative_tolerance), "{} at tolerance {}", t, relative_tolerance);
            assert!(!finder.hit_iteration_limit());
            assert!(finder.iteration_count() > previous_iterations);
            previous_iterations = finder.iteration_count();
        }
    }

    #[test]
    fn test_rows_rebind_the_views() {
        let p_first = MovingRows::new(&box_corners(DVec2::ZERO, DVec2::ONE), DVec2::ZERO);
        let p_second = MovingRows::new(&box_corners(DVec2::ZERO, DVec2::ONE), DVec2::new(1.0, 0.0));
        let q_first = MovingRows::new(&box_corners(DVec2::new(10.0, 0.0), DVec2::ONE), DVec2::ZERO);
        let q_second = MovingRows::new(&box_corners(DVec2::new(6.0, 0.0), DVec2::ONE), DVec2::ZERO);
        let p_coordinates = [p_first.coordinates.clone(), p_second.coordinates.clone()].concat();
        let p_velocities = [p_first.velocities.clone(), p_second.velocities.clone()].concat();
        let q_coordinates = [q_first.coordinates.clone(), q_second.coordinates.clone()].concat();
        let q_velocities = [q_first.velocities.clone(), q_second.velocities.clone()].concat();

        let mut p = MovingPolytope::<DVec2>::new(4).unwrap();
        let mut q = MovingPolytope::<DVec2>::new(4).unwrap();
        let mut finder = CollisionFinder::<DVec2>::default();
        let still = finder.find_maximum_safe_step_size_rows(
            &mut p, &p_coordinates, &p_velocities, &mut q, &q_coordinates, &q_velocities, 0, 8.0,
        );
        assert_eq!(still, 8.0);

        // Gap of 4 closed at unit speed.
        let moving = finder.find_maximum_safe_step_size_rows(
            &mut p, &p_coordinates, &p_velocities, &mut q, &q_coordinates, &q_velocities, 1, 8.0,
        );
        assert!(moving <= 4.0 + 1e-9 && moving >= 3.5, "{}", moving);
    }

    proptest! {
        #[test]
        fn safe_step_never_passes_first_contact(
            t_init in 1.0..10.0f64,
            contact_fraction in 0.55..0.9f64,
            speed in 0.5..5.0f64,
            p_half in (0.2..2.0f64, 0.2..2.0f64),
            q_half in (0.2..2.0f64, 0.2..2.0f64),
            y_fraction in -0.9..0.9f64,
        ) {
            let p_half = DVec2::new(p_half.0, p_half.1);
            let q_half = DVec2::new(q_half.0, q_half.1);
            let t_contact = contact_fraction * t_init;
            let gap = t_contact * speed;
            let q_center = DVec2::new(p_half.x + gap + q_half.x, y_fraction * (p_half.y + q_half.y));

            let p_rows = MovingRows::new(&box_corners(DVec2::ZERO, p_half), DVec2::new(speed, 0.0));
            let q_rows = MovingRows::new(&box_corners(q_center, q_half), DVec2::ZERO);
            let (mut p, mut q) = (p_rows.view(), q_rows.view());

            let mut finder = CollisionFinder::<DVec2>::default();
            let t = finder.find_maximum_safe_step_size(&mut p, &mut q, t_init);
            prop_assert!(t <= t_contact + 1e-9, "{} > {}", t, t_contact);
            prop_assert!(t >= t_contact * (1.0 - 2.0 * SweepSettings::RELATIVE_TOLERANCE_DEFAULT), "{} << {}", t, t_contact);
            prop_assert!(!finder.hit_iteration_limit());
        }
    }
}
