use tracing::warn;

use crate::physics::collidables::box_shape::Aabb;
use crate::physics::collision_detection::facet_table::{self, FACETS, FACET_COUNT, MAX_VERTEX_COUNT};
use crate::physics::collision_detection::support_finder::IConvexPrimitive;
use crate::utilities::math_helper::{self, EPS, EPS_SQUARED};
use crate::utilities::vector::{Vector, MAX_DIMENSION};

/// Why the last query of a [`GJKDistanceTester`] stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GjkReason {
    #[default]
    NoReason,
    /// The simplex became full dimensional, so it encloses the origin.
    FullSimplex,
    /// The new support point was affinely dependent on the simplex.
    InSimplex,
    /// The iteration budget ran out. The current estimate is still an upper bound.
    MaxIteration,
    /// The squared distance estimate stopped improving.
    SmallProgress,
    /// The support value along the search direction matched the current estimate.
    SmallResidual,
    /// The squared distance estimate dropped below the collision tolerance.
    CollisionTolerance,
    /// A separating direction was found before convergence.
    Separated,
}

/// Tuning of a [`GJKDistanceTester`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GjkSettings {
    /// Hard cap on the number of support point iterations per query.
    pub max_iterations: usize,
}

impl GjkSettings {
    pub const MAX_ITERATIONS_DEFAULT: usize = 100;
}

impl Default for GjkSettings {
    fn default() -> Self {
        Self {
            max_iterations: Self::MAX_ITERATIONS_DEFAULT,
        }
    }
}

/// Pair of closest points. `x` lies in the first primitive, `y` in the second.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Witnesses<V: Vector> {
    pub x: V,
    pub y: V,
    pub squared_distance: f64,
}

/// Gilbert-Johnson-Keerthi distance algorithm on primitives exposing a support function.
///
/// A tester owns all of its scratch state and is reused across queries; a query never allocates.
/// Share nothing between threads: every worker creates its own tester.
#[derive(Clone, Debug)]
pub struct GJKDistanceTester<V: Vector> {
    settings: GjkSettings,
    /// Minkowski difference vertices of the simplex. Only the first `simplex_size` are meaningful.
    coords: [V; MAX_VERTEX_COUNT],
    /// Support points of the second primitive that produced `coords`.
    q_supp: [V; MAX_VERTEX_COUNT],
    /// Upper triangle of the pairwise dot products of `coords`.
    dots: [[f64; MAX_VERTEX_COUNT]; MAX_VERTEX_COUNT],
    /// Upper triangle of the Gram matrix of the frame `coords[i] - coords[top]`.
    gram: [[f64; MAX_DIMENSION]; MAX_DIMENSION],
    /// Right hand sides of the barycentric systems, `<coords[top], coords[top] - coords[i]>`.
    lambda_rhs: [f64; MAX_DIMENSION],
    best_lambda: [f64; MAX_VERTEX_COUNT],
    visited: [bool; FACET_COUNT],
    v: V,
    dotvv: f64,
    olddotvv: f64,
    dotvw: f64,
    tolerance_squared: f64,
    theta_squared: f64,
    simplex_size: usize,
    closest_facet: usize,
    sub_calls: usize,
    iteration_count: usize,
    reason: GjkReason,
    separated: bool,
}

impl<V: Vector> Default for GJKDistanceTester<V> {
    fn default() -> Self {
        Self::new(GjkSettings::default())
    }
}

impl<V: Vector> GJKDistanceTester<V> {
    pub fn new(settings: GjkSettings) -> Self {
        debug_assert!(V::DIM <= MAX_DIMENSION);
        let mut visited = [false; FACET_COUNT];
        visited[0] = true;
        Self {
            settings,
            coords: [V::ZERO; MAX_VERTEX_COUNT],
            q_supp: [V::ZERO; MAX_VERTEX_COUNT],
            dots: [[0.0; MAX_VERTEX_COUNT]; MAX_VERTEX_COUNT],
            gram: [[0.0; MAX_DIMENSION]; MAX_DIMENSION],
            lambda_rhs: [0.0; MAX_DIMENSION],
            best_lambda: [0.0; MAX_VERTEX_COUNT],
            visited,
            v: V::ZERO,
            dotvv: f64::MAX,
            olddotvv: f64::MAX,
            dotvw: 0.0,
            tolerance_squared: 0.0,
            theta_squared: 1.0,
            simplex_size: 0,
            closest_facet: 0,
            sub_calls: 0,
            iteration_count: 0,
            reason: GjkReason::NoReason,
            separated: false,
        }
    }

    #[inline]
    pub fn settings(&self) -> &GjkSettings {
        &self.settings
    }

    #[inline]
    pub fn ambient_dimension(&self) -> usize {
        V::DIM
    }

    /// Termination reason of the last query.
    #[inline]
    pub fn reason(&self) -> GjkReason {
        self.reason
    }

    /// Squared distance estimate of the last query. Always an upper bound on the true squared distance.
    #[inline]
    pub fn least_squared_distance(&self) -> f64 {
        self.dotvv
    }

    #[inline]
    pub fn separated(&self) -> bool {
        self.separated
    }

    /// Closest point of the Minkowski difference to the origin found by the last query.
    #[inline]
    pub fn closest_point(&self) -> V {
        self.v
    }

    /// Number of distance subalgorithm invocations of the last query.
    #[inline]
    pub fn sub_call_count(&self) -> usize {
        self.sub_calls
    }

    #[inline]
    pub fn simplex_size(&self) -> usize {
        self.simplex_size
    }

    #[inline]
    pub fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    /// Squared distance between the interior points of two primitives.
    #[inline]
    pub fn interior_points_squared_distance<P, Q>(&self, p: &P, q: &Q) -> f64
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        (q.interior_point() - p.interior_point()).length_squared()
    }

    /// Runs the GJK iteration on `p` and `q`.
    ///
    /// # Arguments
    ///
    /// * `collision_only` - Stop as soon as a separating direction proves `theta² * |x - y|² > tolerance²` for all `x` in `p` and `y` in `q`.
    /// * `reuse_direction` - Start from the closest point of the previous query instead of the difference of the interior points.
    /// * `tolerance_squared` - Squared distance below which the pair counts as colliding. Non-positive values fall back to
    ///   `EPS² * min(r²_p, r²_q)`, then to `EPS² * max(r²_p, r²_q)`; if both radii vanish the two interior points are compared directly.
    /// * `theta_squared` - Scale applied to the squared distance in every tolerance test.
    pub fn compute<P, Q>(
        &mut self,
        p: &P,
        q: &Q,
        collision_only: bool,
        reuse_direction: bool,
        tolerance_squared: f64,
        theta_squared: f64,
    ) where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        self.separated = false;
        self.theta_squared = theta_squared;
        self.tolerance_squared = if tolerance_squared > 0.0 {
            tolerance_squared
        } else {
            let (p_radius, q_radius) = (p.squared_radius(), q.squared_radius());
            let tolerance = EPS_SQUARED * math_helper::min(p_radius, q_radius);
            if tolerance > 0.0 {
                tolerance
            } else {
                // One of them is a point; use the other.
                EPS_SQUARED * math_helper::max(p_radius, q_radius)
            }
        };
        if self.tolerance_squared <= 0.0 {
            self.handle_points(p, q);
            return;
        }

        self.sub_calls = 0;
        self.iteration_count = 0;
        self.reason = GjkReason::NoReason;
        self.simplex_size = 0;

        if !reuse_direction {
            self.v = p.interior_point() - q.interior_point();
        }
        self.dotvv = self.v.length_squared();
        self.olddotvv = self.dotvv;

        // First iteration unrolled: a single vertex needs no subalgorithm.
        let mut p_supp = V::ZERO;
        let a = p.min_support_vector(self.v, &mut p_supp);
        let b = q.max_support_vector(self.v, &mut self.q_supp[0]);
        self.dotvw = a - b;
        self.push(p_supp);
        self.closest_facet = 1;
        self.dotvv = self.dots[0][0];
        self.best_lambda[0] = 1.0;
        self.v = self.coords[0];

        loop {
            if self.theta_squared * self.dotvv < self.tolerance_squared {
                self.reason = GjkReason::CollisionTolerance;
                break;
            }
            if self.simplex_size > V::DIM {
                self.reason = GjkReason::FullSimplex;
                break;
            }
            if self.iteration_count >= self.settings.max_iterations {
                self.reason = GjkReason::MaxIteration;
                break;
            }
            self.iteration_count += 1;

            let n = self.simplex_size;
            let a = p.min_support_vector(self.v, &mut p_supp);
            let b = q.max_support_vector(self.v, &mut self.q_supp[n]);
            self.dotvw = a - b;

            // `dotvw / |v|` is the distance lower bound proven by the support plane, so the tolerance is scaled by
            // `dotvv = |v|²` rather than compared with `dotvw²` directly.
            if collision_only
                && self.dotvw > 0.0
                && self.theta_squared * self.dotvw * self.dotvw > self.tolerance_squared * self.dotvv
            {
                self.separated = true;
                self.reason = GjkReason::Separated;
                break;
            }
            if (self.dotvv - self.dotvw).abs() <= EPS * self.dotvv {
                self.reason = GjkReason::SmallResidual;
                break;
            }
            if self.push(p_supp) {
                // The new vertex is already spanned by the simplex; keep the previous estimate.
                self.simplex_size -= 1;
                self.reason = GjkReason::InSimplex;
                break;
            }

            let facet = self.prepare_distance_subalgorithm();
            self.distance_subalgorithm(facet);
            self.reduce_to_closest_facet();

            if (self.olddotvv - self.dotvv).abs() <= EPS * self.dotvv {
                self.reason = GjkReason::SmallProgress;
                break;
            }
        }

        self.separated = self.separated || self.tolerance_squared < self.theta_squared * self.dotvv;

        if self.reason == GjkReason::MaxIteration {
            warn!(
                "GJK stopped after {} iterations with squared distance estimate {}",
                self.iteration_count, self.dotvv
            );
        }
    }

    /// Both primitives are single points: compare them directly.
    fn handle_points<P, Q>(&mut self, p: &P, q: &Q)
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        self.sub_calls = 0;
        self.iteration_count = 0;
        self.simplex_size = 1;
        self.closest_facet = 1;
        self.best_lambda[0] = 1.0;
        self.q_supp[0] = q.interior_point();
        self.coords[0] = p.interior_point() - self.q_supp[0];
        self.dots[0][0] = self.coords[0].length_squared();
        self.v = self.coords[0];
        self.dotvv = self.dots[0][0];
        self.olddotvv = self.dotvv;
        self.separated = self.dotvv > 0.0;
        self.reason = if self.separated {
            GjkReason::Separated
        } else {
            GjkReason::CollisionTolerance
        };
    }

    /// Appends `p_supp - q_supp[simplex_size]` to the simplex. Returns true if the push was degenerate.
    fn push(&mut self, p_supp: V) -> bool {
        let n = self.simplex_size;
        self.coords[n] = p_supp - self.q_supp[n];
        for i in 0..=n {
            self.dots[i][n] = self.coords[i].dot(self.coords[n]);
        }
        let degenerate = self.compute_gram();
        self.simplex_size += 1;
        degenerate
    }

    /// Rebuilds the Gram matrix relative to the newest vertex from the dot products.
    fn compute_gram(&mut self) -> bool {
        let n = self.simplex_size;
        for i in 0..n {
            let r1 = self.dots[i][n];
            let r2 = self.dots[n][n] - r1;
            self.lambda_rhs[i] = r2;
            self.gram[i][i] = self.dots[i][i] + r2 - r1;
            // A vanishing edge to the new vertex means it was already in the span of the simplex.
            if self.gram[i][i] <= 0.0 {
                return true;
            }
            for j in i + 1..n {
                self.gram[i][j] = self.dots[i][j] - self.dots[j][n] + r2;
            }
        }
        false
    }

    fn prepare_distance_subalgorithm(&mut self) -> usize {
        let facet = facet_table::full(self.simplex_size);
        self.closest_facet = facet;
        self.olddotvv = self.dotvv;
        self.dotvv = f64::MAX;
        self.visited[facet] = false;
        // Faces without the newest vertex were searched in the previous iteration.
        let top = 1 << (self.simplex_size - 1);
        for (i, visited) in self.visited[..facet].iter_mut().enumerate() {
            *visited = i & top == 0;
        }
        facet
    }

    fn distance_subalgorithm(&mut self, facet: usize) {
        self.sub_calls += 1;
        self.visited[facet] = true;

        let entry = &FACETS[facet];
        let vertices = entry.vertices();
        let mut lambda = [0.0; MAX_VERTEX_COUNT];

        let interior = match entry.size {
            1 => {
                let i_last = entry.last();
                if self.dots[i_last][i_last] < self.dotvv {
                    self.closest_facet = facet;
                    self.dotvv = self.dots[i_last][i_last];
                    self.best_lambda[0] = 1.0;
                    self.v = self.coords[i_last];
                }
                return;
            }
            2 => {
                let i0 = vertices[0];
                lambda[0] = self.lambda_rhs[i0] / self.gram[i0][i0];
                lambda[1] = 1.0 - lambda[0];
                lambda[0] > EPS && lambda[1] > EPS
            }
            3 => {
                let (i0, i1) = (vertices[0], vertices[1]);
                let g00 = self.gram[i0][i0];
                let g11 = self.gram[i1][i1];
                let g01 = self.gram[i0][i1];
                let inv_det = 1.0 / (g00 * g11 - g01 * g01);
                lambda[0] = (g11 * self.lambda_rhs[i0] - g01 * self.lambda_rhs[i1]) * inv_det;
                lambda[1] = (g00 * self.lambda_rhs[i1] - g01 * self.lambda_rhs[i0]) * inv_det;
                lambda[2] = 1.0 - lambda[0] - lambda[1];
                lambda[..3].iter().all(|&l| l > EPS)
            }
            _ => self.solve_by_cholesky(vertices, &mut lambda),
        };

        if interior {
            // The closest point of an interior solution cannot lie on the faces of the facet.
            for &face in entry.faces() {
                self.visited[face] = true;
            }
            let mut closest = V::ZERO;
            for (&vertex, &weight) in vertices.iter().zip(lambda.iter()) {
                closest = closest + self.coords[vertex] * weight;
            }
            let squared_distance = closest.length_squared();
            if squared_distance < self.dotvv {
                self.closest_facet = facet;
                self.dotvv = squared_distance;
                self.v = closest;
                self.best_lambda = lambda;
            }
        } else {
            for &face in entry.faces() {
                if !self.visited[face] {
                    self.distance_subalgorithm(face);
                }
            }
        }
    }

    /// Solves the barycentric system of a facet with four or more vertices. Returns true if all weights are positive.
    fn solve_by_cholesky(&self, vertices: &[usize], lambda: &mut [f64; MAX_VERTEX_COUNT]) -> bool {
        let last = vertices.len() - 1;
        let mut g = [[0.0; MAX_DIMENSION]; MAX_DIMENSION];
        for i in 0..last {
            let ii = vertices[i];
            lambda[i] = self.lambda_rhs[ii];
            g[i][i] = self.gram[ii][ii];
            for j in i + 1..last {
                g[i][j] = self.gram[ii][vertices[j]];
                g[j][i] = g[i][j];
            }
        }

        // Upper triangular factor in place.
        for k in 0..last {
            let a = g[k][k].sqrt();
            g[k][k] = a;
            let a_inv = 1.0 / a;
            for j in k + 1..last {
                g[k][j] *= a_inv;
            }
            for i in k + 1..last {
                for j in i..last {
                    g[i][j] -= g[k][i] * g[k][j];
                }
            }
        }
        for i in 0..last {
            for j in 0..i {
                lambda[i] -= g[j][i] * lambda[j];
            }
            lambda[i] /= g[i][i];
        }
        for i in (0..last).rev() {
            for j in i + 1..last {
                lambda[i] -= g[i][j] * lambda[j];
            }
            lambda[i] /= g[i][i];
        }

        lambda[last] = 1.0 - lambda[..last].iter().sum::<f64>();
        lambda[..=last].iter().all(|&l| l > EPS)
    }

    /// Compacts the simplex down to the vertices of the closest facet.
    fn reduce_to_closest_facet(&mut self) {
        let entry = &FACETS[self.closest_facet];
        self.simplex_size = entry.size;
        let vertices = entry.vertices();
        for (i, &vi) in vertices.iter().enumerate() {
            self.coords[i] = self.coords[vi];
            self.q_supp[i] = self.q_supp[vi];
            for j in i..vertices.len() {
                self.dots[i][j] = self.dots[vi][vertices[j]];
            }
        }
    }

    /// Records the closed-form answer for two boxes in place of an iteration.
    fn use_box_distance(&mut self, p_box: &Aabb<'_, V>, q_box: &Aabb<'_, V>, separated: bool) {
        self.sub_calls = 0;
        self.iteration_count = 0;
        self.simplex_size = 0;
        self.closest_facet = 0;
        self.v = Aabb::closest_difference(p_box, q_box);
        self.dotvv = Aabb::squared_distance(p_box, q_box);
        self.olddotvv = self.dotvv;
        self.separated = separated;
        self.reason = if separated {
            GjkReason::Separated
        } else {
            GjkReason::CollisionTolerance
        };
    }

    /// Closest point of the second primitive, reconstructed from the barycentric weights of the last query.
    #[inline]
    fn witness_on_q(&self) -> V {
        (0..self.simplex_size).fold(V::ZERO, |y, j| y + self.q_supp[j] * self.best_lambda[j])
    }

    /// Returns true if the two primitives intersect.
    #[inline]
    pub fn intersecting<P, Q>(&mut self, p: &P, q: &Q) -> bool
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        self.intersecting_with(p, q, 1.0, false)
    }

    /// Returns true if there are points `x` in `p` and `y` in `q` with `theta² * |x - y|²` below the collision tolerance.
    pub fn intersecting_with<P, Q>(&mut self, p: &P, q: &Q, theta_squared: f64, reuse_direction: bool) -> bool
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        if let (Some(p_box), Some(q_box)) = (p.as_aabb(), q.as_aabb()) {
            let separated = Aabb::squared_distance(&p_box, &q_box) > 0.0;
            self.use_box_distance(&p_box, &q_box, separated);
            return !separated;
        }
        self.compute(p, q, true, reuse_direction, 0.0, theta_squared);
        !self.separated
    }

    #[inline]
    pub fn squared_distance<P, Q>(&mut self, p: &P, q: &Q) -> f64
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        self.squared_distance_with(p, q, false)
    }

    pub fn squared_distance_with<P, Q>(&mut self, p: &P, q: &Q, reuse_direction: bool) -> f64
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        if let (Some(p_box), Some(q_box)) = (p.as_aabb(), q.as_aabb()) {
            let squared_distance = Aabb::squared_distance(&p_box, &q_box);
            self.use_box_distance(&p_box, &q_box, squared_distance > 0.0);
            return squared_distance;
        }
        self.compute(p, q, false, reuse_direction, 0.0, 1.0);
        self.dotvv
    }

    /// Computes a pair of closest points and their squared distance.
    #[inline]
    pub fn witnesses<P, Q>(&mut self, p: &P, q: &Q) -> Witnesses<V>
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        self.witnesses_with(p, q, false)
    }

    pub fn witnesses_with<P, Q>(&mut self, p: &P, q: &Q, reuse_direction: bool) -> Witnesses<V>
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        self.compute(p, q, false, reuse_direction, 0.0, 1.0);
        let y = self.witness_on_q();
        Witnesses {
            x: y + self.v,
            y,
            squared_distance: self.dotvv,
        }
    }

    /// Returns true if `p` thickened by `p_offset` and `q` thickened by `q_offset` intersect.
    #[inline]
    pub fn offset_intersecting<P, Q>(&mut self, p: &P, p_offset: f64, q: &Q, q_offset: f64) -> bool
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        self.offset_intersecting_with(p, p_offset, q, q_offset, false)
    }

    pub fn offset_intersecting_with<P, Q>(
        &mut self,
        p: &P,
        p_offset: f64,
        q: &Q,
        q_offset: f64,
        reuse_direction: bool,
    ) -> bool
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        let min_distance = p_offset + q_offset;
        self.compute(p, q, true, reuse_direction, min_distance * min_distance, 1.0);
        !self.separated
    }

    /// Squared distance between the thickened primitives; zero when the thickenings overlap.
    #[inline]
    pub fn offset_squared_distance<P, Q>(&mut self, p: &P, p_offset: f64, q: &Q, q_offset: f64) -> f64
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        self.offset_squared_distance_with(p, p_offset, q, q_offset, false)
    }

    pub fn offset_squared_distance_with<P, Q>(
        &mut self,
        p: &P,
        p_offset: f64,
        q: &Q,
        q_offset: f64,
        reuse_direction: bool,
    ) -> f64
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        let min_distance = p_offset + q_offset;
        self.compute(p, q, false, reuse_direction, min_distance * min_distance, 1.0);
        let distance = math_helper::ramp(self.dotvv.sqrt() - min_distance);
        distance * distance
    }

    /// Closest points of the thickened primitives. The witnesses lie on the offset boundaries when the thickened
    /// primitives are separated; otherwise `x` and `y` are the closest points of the bare primitives.
    #[inline]
    pub fn offset_witnesses<P, Q>(&mut self, p: &P, p_offset: f64, q: &Q, q_offset: f64) -> Witnesses<V>
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        self.offset_witnesses_with(p, p_offset, q, q_offset, false)
    }

    pub fn offset_witnesses_with<P, Q>(
        &mut self,
        p: &P,
        p_offset: f64,
        q: &Q,
        q_offset: f64,
        reuse_direction: bool,
    ) -> Witnesses<V>
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        let min_distance = p_offset + q_offset;
        self.compute(p, q, false, reuse_direction, min_distance * min_distance, 1.0);
        let distance0 = self.dotvv.sqrt();
        let mut distance = distance0 - min_distance;
        let (x_scale, y_scale) = if distance > 0.0 {
            (distance / distance0, q_offset / distance0)
        } else {
            distance = 0.0;
            (1.0, 0.0)
        };
        let y = self.v * y_scale + self.witness_on_q();
        Witnesses {
            x: y + self.v * x_scale,
            y,
            squared_distance: distance * distance,
        }
    }

    /// Returns true if the pair is well separated at scale theta: `max(r²_p, r²_q) < theta² * dist²(p, q)`.
    #[inline]
    pub fn multipole_acceptance<P, Q>(&mut self, p: &P, q: &Q, theta_squared: f64) -> bool
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        self.multipole_acceptance_with(p, q, theta_squared, false)
    }

    pub fn multipole_acceptance_with<P, Q>(
        &mut self,
        p: &P,
        q: &Q,
        theta_squared: f64,
        reuse_direction: bool,
    ) -> bool
    where
        P: IConvexPrimitive<V> + ?Sized,
        Q: IConvexPrimitive<V> + ?Sized,
    {
        let max_squared_radius = math_helper::max(p.squared_radius(), q.squared_radius());
        if let (Some(p_box), Some(q_box)) = (p.as_aabb(), q.as_aabb()) {
            let accepted = max_squared_radius < theta_squared * Aabb::squared_distance(&p_box, &q_box);
            self.use_box_distance(&p_box, &q_box, accepted);
            return accepted;
        }
        self.compute(p, q, true, reuse_direction, max_squared_radius, theta_squared);
        self.separated
    }
}
