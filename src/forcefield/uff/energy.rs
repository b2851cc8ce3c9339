//! UFF interaction terms with analytic gradients
//!
//! Every term reads atom positions from a flat `[x0, y0, z0, x1, ...]` slice
//! and adds its Cartesian gradient into a slice of the same layout. Angles,
//! torsions and inversions are differentiated through the cosine of their
//! angle, so no term divides by `sin` of a quantity that can reach zero
//! except where an explicit floor is applied.

use super::params::{
    calc_bond_force_constant, calc_bond_rest_length, calc_vdw_distance, calc_vdw_well_depth,
    TorsionParams, UffAtomParams, ANGLE_CORRECTION_THRESHOLD,
};
use nalgebra::Vector3;

/// Distances below this are treated as coincident atoms
const EPSILON: f64 = 1e-10;

/// A single interaction contributing to the total energy
pub trait EnergyTerm {
    /// Energy in kcal/mol
    fn energy(&self, positions: &[f64]) -> f64;

    /// Energy in kcal/mol, adding dE/dx into `gradients`
    fn energy_and_gradient(&self, positions: &[f64], gradients: &mut [f64]) -> f64;
}

#[inline]
fn position(positions: &[f64], idx: usize) -> Vector3<f64> {
    Vector3::new(
        positions[3 * idx],
        positions[3 * idx + 1],
        positions[3 * idx + 2],
    )
}

#[inline]
fn accumulate(gradients: &mut [f64], idx: usize, g: &Vector3<f64>) {
    gradients[3 * idx] += g.x;
    gradients[3 * idx + 1] += g.y;
    gradients[3 * idx + 2] += g.z;
}

/// Chebyshev polynomials `(T_n(x), U_{n-1}(x))`
///
/// `cos(n theta) = T_n(cos theta)` and `d T_n / dx = n U_{n-1}`.
fn chebyshev(n: u32, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }
    let (mut t_prev, mut t) = (1.0, x);
    let (mut u_prev, mut u) = (0.0, 1.0);
    for _ in 1..n {
        let t_next = 2.0 * x * t - t_prev;
        t_prev = t;
        t = t_next;
        let u_next = 2.0 * x * u - u_prev;
        u_prev = u;
        u = u_next;
    }
    (t, u)
}

/// Harmonic bond stretch, `E = k/2 (r - r0)^2`
#[derive(Debug, Clone, PartialEq)]
pub struct BondStretchParams {
    pub idx1: usize,
    pub idx2: usize,
    /// Natural bond length (Angstroms)
    pub rest_length: f64,
    /// Force constant (kcal/mol/A^2)
    pub force_constant: f64,
}

impl BondStretchParams {
    pub fn new(
        idx1: usize,
        idx2: usize,
        bond_order: f64,
        p1: &UffAtomParams,
        p2: &UffAtomParams,
    ) -> Self {
        let rest_length = calc_bond_rest_length(bond_order, p1, p2);
        Self {
            idx1,
            idx2,
            rest_length,
            force_constant: calc_bond_force_constant(rest_length, p1, p2),
        }
    }
}

impl EnergyTerm for BondStretchParams {
    fn energy(&self, positions: &[f64]) -> f64 {
        let r = (position(positions, self.idx1) - position(positions, self.idx2)).norm();
        let dr = r - self.rest_length;
        0.5 * self.force_constant * dr * dr
    }

    fn energy_and_gradient(&self, positions: &[f64], gradients: &mut [f64]) -> f64 {
        let d = position(positions, self.idx1) - position(positions, self.idx2);
        let r = d.norm();
        let dr = r - self.rest_length;
        let energy = 0.5 * self.force_constant * dr * dr;

        if r > EPSILON {
            let g = d * (self.force_constant * dr / r);
            accumulate(gradients, self.idx1, &g);
            accumulate(gradients, self.idx2, &-g);
        }
        energy
    }
}

/// Angle bend about the vertex `idx2`
///
/// `order` selects the functional form: 0 is the general three-term Fourier
/// expansion around `theta0`, 1 is linear, and 2, 3, 4 are the periodic forms
/// for trigonal, square-planar and octahedral centres.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleBendParams {
    pub idx1: usize,
    pub idx2: usize,
    pub idx3: usize,
    /// Natural angle (radians)
    pub theta0: f64,
    pub force_constant: f64,
    pub order: u32,
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

impl AngleBendParams {
    pub fn new(
        idx1: usize,
        idx2: usize,
        idx3: usize,
        theta0: f64,
        force_constant: f64,
        order: u32,
    ) -> Self {
        let sin_theta0 = theta0.sin();
        let cos_theta0 = theta0.cos();
        let c2 = 1.0 / (4.0 * (sin_theta0 * sin_theta0).max(1e-8));
        let c1 = -4.0 * c2 * cos_theta0;
        let c0 = c2 * (2.0 * cos_theta0 * cos_theta0 + 1.0);
        Self {
            idx1,
            idx2,
            idx3,
            theta0,
            force_constant,
            order,
            c0,
            c1,
            c2,
        }
    }

    /// Energy and dE/d(cos theta) at a given cosine
    fn energy_and_derivative(&self, cos_theta: f64) -> (f64, f64) {
        let k = self.force_constant;
        let (mut energy, mut de_dcos) = match self.order {
            0 => (
                k * (self.c0 + self.c1 * cos_theta + self.c2 * (2.0 * cos_theta * cos_theta - 1.0)),
                k * (self.c1 + 4.0 * self.c2 * cos_theta),
            ),
            1 => (k * (1.0 + cos_theta), k),
            n => {
                let (t, u) = chebyshev(n, cos_theta);
                let n = n as f64;
                (k * (1.0 - t) / (n * n), -k * u / n)
            }
        };

        // Repulsive wall near zero degrees for the periodic forms
        if (1..=4).contains(&self.order) && cos_theta > ANGLE_CORRECTION_THRESHOLD {
            let theta = cos_theta.acos();
            let sin_theta = (1.0 - cos_theta * cos_theta).sqrt().max(1e-8);
            let penalty = (-20.0 * (theta - self.theta0 + 0.25)).exp();
            energy += penalty;
            de_dcos += 20.0 * penalty / sin_theta;
        }
        (energy, de_dcos)
    }

    /// Vertex-to-end vectors and their lengths, `None` if an arm has zero length
    fn arms(&self, positions: &[f64]) -> Option<(Vector3<f64>, Vector3<f64>, f64, f64)> {
        let vertex = position(positions, self.idx2);
        let r1 = position(positions, self.idx1) - vertex;
        let r2 = position(positions, self.idx3) - vertex;
        let (d1, d2) = (r1.norm(), r2.norm());
        if d1 < EPSILON || d2 < EPSILON {
            return None;
        }
        Some((r1 / d1, r2 / d2, d1, d2))
    }
}

impl EnergyTerm for AngleBendParams {
    fn energy(&self, positions: &[f64]) -> f64 {
        match self.arms(positions) {
            Some((u1, u2, _, _)) => self.energy_and_derivative(u1.dot(&u2).clamp(-1.0, 1.0)).0,
            None => 0.0,
        }
    }

    fn energy_and_gradient(&self, positions: &[f64], gradients: &mut [f64]) -> f64 {
        let Some((u1, u2, d1, d2)) = self.arms(positions) else {
            return 0.0;
        };
        let cos_theta = u1.dot(&u2).clamp(-1.0, 1.0);
        let (energy, de_dcos) = self.energy_and_derivative(cos_theta);

        let g1 = (u2 - u1 * cos_theta) * (de_dcos / d1);
        let g3 = (u1 - u2 * cos_theta) * (de_dcos / d2);
        accumulate(gradients, self.idx1, &g1);
        accumulate(gradients, self.idx3, &g3);
        accumulate(gradients, self.idx2, &-(g1 + g3));
        energy
    }
}

/// Dihedral i-j-k-l, `E = V/2 (1 - cos_term cos(n phi))`
#[derive(Debug, Clone, PartialEq)]
pub struct TorsionAngleParams {
    pub idx1: usize,
    pub idx2: usize,
    pub idx3: usize,
    pub idx4: usize,
    pub params: TorsionParams,
}

/// Intermediate quantities of a dihedral evaluation
struct DihedralGeometry {
    cos_phi: f64,
    b1: Vector3<f64>,
    b2: Vector3<f64>,
    b3: Vector3<f64>,
    a_hat: Vector3<f64>,
    b_hat: Vector3<f64>,
    a_norm: f64,
    b_norm: f64,
}

impl TorsionAngleParams {
    fn geometry(&self, positions: &[f64]) -> Option<DihedralGeometry> {
        let p2 = position(positions, self.idx2);
        let p3 = position(positions, self.idx3);
        let b1 = p2 - position(positions, self.idx1);
        let b2 = p3 - p2;
        let b3 = position(positions, self.idx4) - p3;

        let a = b1.cross(&b2);
        let b = b2.cross(&b3);
        let (a_norm, b_norm) = (a.norm(), b.norm());
        if a_norm < EPSILON || b_norm < EPSILON {
            return None;
        }
        let a_hat = a / a_norm;
        let b_hat = b / b_norm;
        Some(DihedralGeometry {
            cos_phi: a_hat.dot(&b_hat).clamp(-1.0, 1.0),
            b1,
            b2,
            b3,
            a_hat,
            b_hat,
            a_norm,
            b_norm,
        })
    }

    fn energy_and_derivative(&self, cos_phi: f64) -> (f64, f64) {
        let p = &self.params;
        let (t, u) = chebyshev(p.order, cos_phi);
        let half_v = 0.5 * p.force_constant;
        (
            half_v * (1.0 - p.cos_term * t),
            -half_v * p.cos_term * p.order as f64 * u,
        )
    }
}

impl EnergyTerm for TorsionAngleParams {
    fn energy(&self, positions: &[f64]) -> f64 {
        // Collinear atoms leave phi undefined; evaluate at phi = 90 degrees
        let cos_phi = self.geometry(positions).map_or(0.0, |g| g.cos_phi);
        self.energy_and_derivative(cos_phi).0
    }

    fn energy_and_gradient(&self, positions: &[f64], gradients: &mut [f64]) -> f64 {
        let Some(g) = self.geometry(positions) else {
            return self.energy_and_derivative(0.0).0;
        };
        let (energy, de_dcos) = self.energy_and_derivative(g.cos_phi);

        let da = (g.b_hat - g.a_hat * g.cos_phi) / g.a_norm;
        let db = (g.a_hat - g.b_hat * g.cos_phi) / g.b_norm;
        let gb1 = g.b2.cross(&da) * de_dcos;
        let gb2 = (da.cross(&g.b1) + g.b3.cross(&db)) * de_dcos;
        let gb3 = db.cross(&g.b2) * de_dcos;

        accumulate(gradients, self.idx1, &-gb1);
        accumulate(gradients, self.idx2, &(gb1 - gb2));
        accumulate(gradients, self.idx3, &(gb2 - gb3));
        accumulate(gradients, self.idx4, &gb3);
        energy
    }
}

/// Out-of-plane term for centre `idx2` with `idx4` as the out-of-plane atom
///
/// `E = K (C0 + C1 sin Y + C2 (1 - 2 cos^2 Y))` where Y is the angle between
/// the I-J-K plane normal and the J-L bond.
#[derive(Debug, Clone, PartialEq)]
pub struct InversionParams {
    pub idx1: usize,
    pub idx2: usize,
    pub idx3: usize,
    pub idx4: usize,
    pub force_constant: f64,
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

struct WilsonGeometry {
    cos_y: f64,
    u: Vector3<f64>,
    v: Vector3<f64>,
    n_hat: Vector3<f64>,
    w_hat: Vector3<f64>,
    n_norm: f64,
    w_norm: f64,
}

impl InversionParams {
    fn geometry(&self, positions: &[f64]) -> Option<WilsonGeometry> {
        let center = position(positions, self.idx2);
        let u = position(positions, self.idx1) - center;
        let v = position(positions, self.idx3) - center;
        let w = position(positions, self.idx4) - center;

        let n = u.cross(&v);
        let (n_norm, w_norm) = (n.norm(), w.norm());
        if u.norm() < EPSILON || v.norm() < EPSILON || n_norm < EPSILON || w_norm < EPSILON {
            return None;
        }
        let n_hat = n / n_norm;
        let w_hat = w / w_norm;
        Some(WilsonGeometry {
            cos_y: n_hat.dot(&w_hat).clamp(-1.0, 1.0),
            u,
            v,
            n_hat,
            w_hat,
            n_norm,
            w_norm,
        })
    }

    fn energy_and_derivative(&self, cos_y: f64) -> (f64, f64) {
        let sin_y = (1.0 - cos_y * cos_y).max(0.0).sqrt();
        let k = self.force_constant;
        // cos(2 omega) = 2 sin^2 Y - 1 = 1 - 2 cos^2 Y
        let energy = k * (self.c0 + self.c1 * sin_y + self.c2 * (1.0 - 2.0 * cos_y * cos_y));
        let de_dcos = k * (-self.c1 * cos_y / sin_y.max(1e-8) - 4.0 * self.c2 * cos_y);
        (energy, de_dcos)
    }
}

impl EnergyTerm for InversionParams {
    fn energy(&self, positions: &[f64]) -> f64 {
        let cos_y = self.geometry(positions).map_or(0.0, |g| g.cos_y);
        self.energy_and_derivative(cos_y).0
    }

    fn energy_and_gradient(&self, positions: &[f64], gradients: &mut [f64]) -> f64 {
        let Some(g) = self.geometry(positions) else {
            return self.energy_and_derivative(0.0).0;
        };
        let (energy, de_dcos) = self.energy_and_derivative(g.cos_y);

        let dn = (g.w_hat - g.n_hat * g.cos_y) / g.n_norm;
        let gw = (g.n_hat - g.w_hat * g.cos_y) * (de_dcos / g.w_norm);
        let gu = g.v.cross(&dn) * de_dcos;
        let gv = dn.cross(&g.u) * de_dcos;

        accumulate(gradients, self.idx1, &gu);
        accumulate(gradients, self.idx3, &gv);
        accumulate(gradients, self.idx4, &gw);
        accumulate(gradients, self.idx2, &-(gu + gv + gw));
        energy
    }
}

/// Lennard-Jones 12-6 van der Waals term, `E = D ((x/r)^12 - 2 (x/r)^6)`
#[derive(Debug, Clone, PartialEq)]
pub struct VdwParams {
    pub idx1: usize,
    pub idx2: usize,
    /// Distance at the minimum (Angstroms)
    pub x_ij: f64,
    /// Well depth (kcal/mol)
    pub d_ij: f64,
}

impl VdwParams {
    pub fn new(idx1: usize, idx2: usize, p1: &UffAtomParams, p2: &UffAtomParams) -> Self {
        Self {
            idx1,
            idx2,
            x_ij: calc_vdw_distance(p1, p2),
            d_ij: calc_vdw_well_depth(p1, p2),
        }
    }

    fn powers(&self, r: f64) -> (f64, f64) {
        let s = self.x_ij / r;
        let s6 = s.powi(6);
        (s6, s6 * s6)
    }
}

impl EnergyTerm for VdwParams {
    fn energy(&self, positions: &[f64]) -> f64 {
        let r = (position(positions, self.idx1) - position(positions, self.idx2)).norm();
        if r < EPSILON {
            return 0.0;
        }
        let (s6, s12) = self.powers(r);
        self.d_ij * (s12 - 2.0 * s6)
    }

    fn energy_and_gradient(&self, positions: &[f64], gradients: &mut [f64]) -> f64 {
        let d = position(positions, self.idx1) - position(positions, self.idx2);
        let r = d.norm();
        if r < EPSILON {
            return 0.0;
        }
        let (s6, s12) = self.powers(r);
        let de_dr = 12.0 * self.d_ij / r * (s6 - s12);
        let g = d * (de_dr / r);
        accumulate(gradients, self.idx1, &g);
        accumulate(gradients, self.idx2, &-g);
        self.d_ij * (s12 - 2.0 * s6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcefield::uff::params::get_uff_params;
    use assert_approx_eq::assert_approx_eq;

    fn p(label: &str) -> &'static UffAtomParams {
        get_uff_params(label).unwrap()
    }

    /// Compare the analytic gradient with central differences
    fn check_gradient<T: EnergyTerm>(term: &T, positions: &[f64]) {
        let mut grad = vec![0.0; positions.len()];
        let e = term.energy_and_gradient(positions, &mut grad);
        assert_approx_eq!(e, term.energy(positions), 1e-9);

        let h = 1e-6;
        for i in 0..positions.len() {
            let mut x = positions.to_vec();
            x[i] += h;
            let ep = term.energy(&x);
            x[i] -= 2.0 * h;
            let em = term.energy(&x);
            let numeric = (ep - em) / (2.0 * h);
            let tol = 1e-4 * (1.0 + numeric.abs());
            assert!(
                (numeric - grad[i]).abs() < tol,
                "coordinate {}: analytic {} numeric {}",
                i,
                grad[i],
                numeric
            );
        }
    }

    #[test]
    fn test_chebyshev() {
        let x: f64 = 0.3;
        let theta = x.acos();
        for n in 0..7u32 {
            let (t, u) = chebyshev(n, x);
            assert_approx_eq!(t, (n as f64 * theta).cos(), 1e-12);
            if n > 0 {
                assert_approx_eq!(u, (n as f64 * theta).sin() / theta.sin(), 1e-12);
            }
        }
    }

    #[test]
    fn test_bond_reference_energy() {
        let bond = BondStretchParams::new(0, 1, 1.0, p("C_3"), p("C_3"));
        assert_approx_eq!(bond.rest_length, 1.514, 1e-3);
        assert_approx_eq!(bond.force_constant, 699.5918, 1e-3);

        let positions = [0.0, 0.0, 0.0, bond.rest_length + 0.3, 0.0, 0.0];
        assert_approx_eq!(bond.energy(&positions), 31.48, 0.01);

        let at_rest = [0.0, 0.0, 0.0, 0.0, bond.rest_length, 0.0];
        assert_approx_eq!(bond.energy(&at_rest), 0.0, 1e-12);
    }

    #[test]
    fn test_bond_gradient() {
        let bond = BondStretchParams::new(0, 1, 2.0, p("C_2"), p("O_2"));
        check_gradient(&bond, &[0.1, -0.2, 0.3, 1.2, 0.4, -0.5]);
    }

    #[test]
    fn test_bond_coincident_atoms() {
        let bond = BondStretchParams::new(0, 1, 1.0, p("C_3"), p("H_"));
        let mut grad = vec![0.0; 6];
        let e = bond.energy_and_gradient(&[1.0; 6], &mut grad);
        assert!(e.is_finite());
        assert!(grad.iter().all(|&g| g == 0.0));
    }

    #[test]
    fn test_angle_minimum_at_theta0() {
        let theta0 = 109.47_f64.to_radians();
        let angle = AngleBendParams::new(0, 1, 2, theta0, 100.0, 0);
        let positions = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, theta0.cos(), theta0.sin(), 0.0];
        assert_approx_eq!(angle.energy(&positions), 0.0, 1e-10);

        let trigonal = AngleBendParams::new(0, 1, 2, 120_f64.to_radians(), 100.0, 3);
        let t = 120_f64.to_radians();
        let positions = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, t.cos(), t.sin(), 0.0];
        assert_approx_eq!(trigonal.energy(&positions), 0.0, 1e-10);

        let linear = AngleBendParams::new(0, 1, 2, std::f64::consts::PI, 100.0, 1);
        let positions = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0];
        assert_approx_eq!(linear.energy(&positions), 0.0, 1e-10);
    }

    #[test]
    fn test_angle_gradients() {
        let positions = [1.1, 0.2, -0.1, 0.0, 0.05, 0.0, -0.4, 0.9, 0.3];
        for (order, theta0) in [(0, 109.47_f64), (1, 180.0), (2, 90.0), (3, 120.0), (4, 90.0)] {
            let angle = AngleBendParams::new(0, 1, 2, theta0.to_radians(), 150.0, order);
            check_gradient(&angle, &positions);
        }
    }

    #[test]
    fn test_angle_penalty_near_zero() {
        let t0 = 120_f64.to_radians();
        let angle = AngleBendParams::new(0, 1, 2, t0, 150.0, 3);
        let t = 25_f64.to_radians();
        let positions = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.2 * t.cos(), 1.2 * t.sin(), 0.0];

        let cos_t = t.cos();
        let (tn, _) = chebyshev(3, cos_t);
        let base = 150.0 * (1.0 - tn) / 9.0;
        let penalty = (-20.0 * (t - t0 + 0.25)).exp();
        assert_approx_eq!(angle.energy(&positions), base + penalty, 1e-6 * penalty);
        check_gradient(&angle, &positions);
    }

    #[test]
    fn test_torsion_staggered_and_eclipsed() {
        let params = TorsionParams {
            force_constant: 2.119,
            order: 3,
            cos_term: -1.0,
        };
        let torsion = TorsionAngleParams {
            idx1: 0,
            idx2: 1,
            idx3: 2,
            idx4: 3,
            params,
        };
        let dihedral = |phi: f64| {
            [
                1.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.5,
                phi.cos(),
                phi.sin(),
                1.5,
            ]
        };
        assert_approx_eq!(torsion.energy(&dihedral(0.0)), 2.119, 1e-10);
        assert_approx_eq!(torsion.energy(&dihedral(60_f64.to_radians())), 0.0, 1e-10);
        assert_approx_eq!(torsion.energy(&dihedral(180_f64.to_radians())), 0.0, 1e-10);
    }

    #[test]
    fn test_torsion_gradients() {
        let positions = [1.2, 0.1, -0.3, 0.0, 0.0, 0.0, 0.1, 0.2, 1.5, 0.8, -0.9, 1.9];
        for (order, cos_term) in [(2, 1.0), (3, -1.0), (6, 1.0), (2, -1.0)] {
            let torsion = TorsionAngleParams {
                idx1: 0,
                idx2: 1,
                idx3: 2,
                idx4: 3,
                params: TorsionParams {
                    force_constant: 5.0,
                    order,
                    cos_term,
                },
            };
            check_gradient(&torsion, &positions);
        }
    }

    #[test]
    fn test_torsion_collinear_is_finite() {
        let torsion = TorsionAngleParams {
            idx1: 0,
            idx2: 1,
            idx3: 2,
            idx4: 3,
            params: TorsionParams {
                force_constant: 5.0,
                order: 3,
                cos_term: -1.0,
            },
        };
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 3.0, 0.0, 0.0];
        let mut grad = vec![0.0; 12];
        let e = torsion.energy_and_gradient(&positions, &mut grad);
        assert!(e.is_finite());
        assert!(grad.iter().all(|&g| g == 0.0));
    }

    fn carbon_inversion() -> InversionParams {
        InversionParams {
            idx1: 0,
            idx2: 1,
            idx3: 2,
            idx4: 3,
            force_constant: 2.0,
            c0: 1.0,
            c1: -1.0,
            c2: 0.0,
        }
    }

    #[test]
    fn test_inversion_planar_is_zero() {
        let positions = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.5, 0.87, 0.0, -0.5, -0.87, 0.0];
        assert_approx_eq!(carbon_inversion().energy(&positions), 0.0, 1e-12);

        let pyramidal = [1.0, 0.0, 0.3, 0.0, 0.0, 0.0, -0.5, 0.87, 0.3, -0.5, -0.87, 0.3];
        assert!(carbon_inversion().energy(&pyramidal) > 0.0);
    }

    #[test]
    fn test_inversion_gradients() {
        let positions = [1.0, 0.1, 0.3, 0.0, 0.0, 0.0, -0.5, 0.87, 0.2, -0.4, -0.9, 0.5];
        check_gradient(&carbon_inversion(), &positions);

        let w0 = 84.4339_f64.to_radians();
        let c2 = 1.0;
        let c1 = -4.0 * w0.cos();
        let c0 = -(c1 * w0.cos() + c2 * (2.0 * w0).cos());
        let phosphorus = InversionParams {
            force_constant: 22.0 / (c0 + c1 + c2) / 3.0,
            c0,
            c1,
            c2,
            ..carbon_inversion()
        };
        check_gradient(&phosphorus, &positions);
    }

    #[test]
    fn test_vdw_minimum_and_gradient() {
        let vdw = VdwParams::new(0, 1, p("C_3"), p("C_3"));
        assert_approx_eq!(vdw.x_ij, 3.851, 1e-6);
        assert_approx_eq!(vdw.d_ij, 0.105, 1e-6);

        let at_min = [0.0, 0.0, 0.0, vdw.x_ij, 0.0, 0.0];
        assert_approx_eq!(vdw.energy(&at_min), -vdw.d_ij, 1e-12);
        let mut grad = vec![0.0; 6];
        vdw.energy_and_gradient(&at_min, &mut grad);
        assert!(grad.iter().all(|g| g.abs() < 1e-10));

        check_gradient(&vdw, &[0.0, 0.1, 0.0, 3.0, 0.5, -0.4]);
        assert_eq!(vdw.energy(&[0.0; 6]), 0.0);
    }
}
