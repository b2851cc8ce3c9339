//! UFF parameter table and the formulas that derive interaction parameters
//!
//! Atom parameters follow Table 1 of Rappé et al., "UFF, a Full Periodic Table
//! Force Field for Molecular Mechanics and Molecular Dynamics Simulations",
//! J. Am. Chem. Soc. 1992, 114, 10024-10035, in the form distributed with RDKit.
//! `theta0` is stored in degrees.

/// Per-atom-type UFF parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UffAtomParams {
    /// Atom type label, e.g. "C_3" or "Fe6+2"
    pub label: &'static str,
    /// Valence bond radius (Angstroms)
    pub r1: f64,
    /// Natural valence angle (degrees)
    pub theta0: f64,
    /// van der Waals distance (Angstroms)
    pub x1: f64,
    /// van der Waals well depth (kcal/mol)
    pub d1: f64,
    /// van der Waals shape parameter
    pub zeta: f64,
    /// Effective charge
    pub z1: f64,
    /// sp3 torsional barrier (kcal/mol)
    pub v1: f64,
    /// sp2 torsional barrier (kcal/mol)
    pub u1: f64,
    /// GMP electronegativity
    pub gmp_xi: f64,
    /// GMP hardness
    pub gmp_hardness: f64,
    /// GMP radius
    pub gmp_radius: f64,
}

/// Bond-order correction scale
pub const LAMBDA: f64 = 0.1332;

/// Force constant prefactor (kcal/mol*Angstrom)
pub const G: f64 = 332.06;

/// cos(30 deg): above this an angle term gets an extra repulsive penalty
pub const ANGLE_CORRECTION_THRESHOLD: f64 = 0.8660;

#[allow(clippy::too_many_arguments)]
const fn row(
    label: &'static str,
    r1: f64,
    theta0: f64,
    x1: f64,
    d1: f64,
    zeta: f64,
    z1: f64,
    v1: f64,
    u1: f64,
    gmp_xi: f64,
    gmp_hardness: f64,
    gmp_radius: f64,
) -> UffAtomParams {
    UffAtomParams {
        label,
        r1,
        theta0,
        x1,
        d1,
        zeta,
        z1,
        v1,
        u1,
        gmp_xi,
        gmp_hardness,
        gmp_radius,
    }
}

/// The full UFF atom type table
///
/// Columns: label, r1, theta0, x1, d1, zeta, z1, v1, u1, xi, hardness, radius
#[rustfmt::skip]
#[allow(clippy::approx_constant)] // 3.141 is the hafnium vdW distance
pub static UFF_PARAMS: [UffAtomParams; 127] = [
    // Period 1
    row("H_", 0.354, 180.0, 2.886, 0.044, 12.0, 0.712, 0.0, 0.0, 4.528, 6.9452, 0.371),
    row("H_b", 0.46, 83.5, 2.886, 0.044, 12.0, 0.712, 0.0, 0.0, 4.528, 6.9452, 0.371),
    row("He4+4", 0.849, 90.0, 2.362, 0.056, 15.24, 0.098, 0.0, 0.0, 9.66, 14.92, 1.3),
    // Period 2
    row("Li", 1.336, 180.0, 2.451, 0.025, 12.0, 1.026, 0.0, 2.0, 3.006, 2.386, 1.557),
    row("Be3+2", 1.074, 109.47, 2.745, 0.085, 12.0, 1.565, 0.0, 2.0, 4.877, 4.443, 1.24),
    row("B_3", 0.838, 109.47, 4.083, 0.18, 12.052, 1.755, 0.0, 2.0, 5.11, 4.75, 0.822),
    row("B_2", 0.828, 120.0, 4.083, 0.18, 12.052, 1.755, 0.0, 2.0, 5.11, 4.75, 0.822),
    row("C_3", 0.757, 109.47, 3.851, 0.105, 12.73, 1.912, 2.119, 2.0, 5.343, 5.063, 0.759),
    row("C_R", 0.729, 120.0, 3.851, 0.105, 12.73, 1.912, 0.0, 2.0, 5.343, 5.063, 0.759),
    row("C_2", 0.732, 120.0, 3.851, 0.105, 12.73, 1.912, 0.0, 2.0, 5.343, 5.063, 0.759),
    row("C_1", 0.706, 180.0, 3.851, 0.105, 12.73, 1.912, 0.0, 2.0, 5.343, 5.063, 0.759),
    row("N_3", 0.7, 106.7, 3.66, 0.069, 13.407, 2.544, 0.45, 2.0, 6.899, 5.88, 0.715),
    row("N_R", 0.699, 120.0, 3.66, 0.069, 13.407, 2.544, 0.0, 2.0, 6.899, 5.88, 0.715),
    row("N_2", 0.685, 111.2, 3.66, 0.069, 13.407, 2.544, 0.0, 2.0, 6.899, 5.88, 0.715),
    row("N_1", 0.656, 180.0, 3.66, 0.069, 13.407, 2.544, 0.0, 2.0, 6.899, 5.88, 0.715),
    row("O_3", 0.658, 104.51, 3.5, 0.06, 14.085, 2.3, 0.018, 2.0, 8.741, 6.682, 0.669),
    row("O_3_z", 0.528, 146.0, 3.5, 0.06, 14.085, 2.3, 0.018, 2.0, 8.741, 6.682, 0.669),
    row("O_R", 0.68, 110.0, 3.5, 0.06, 14.085, 2.3, 0.0, 2.0, 8.741, 6.682, 0.669),
    row("O_2", 0.634, 120.0, 3.5, 0.06, 14.085, 2.3, 0.0, 2.0, 8.741, 6.682, 0.669),
    row("O_1", 0.639, 180.0, 3.5, 0.06, 14.085, 2.3, 0.0, 2.0, 8.741, 6.682, 0.669),
    row("F_", 0.668, 180.0, 3.364, 0.05, 14.762, 1.735, 0.0, 2.0, 10.874, 7.474, 0.706),
    row("Ne4+4", 0.92, 90.0, 3.243, 0.042, 15.44, 0.194, 0.0, 2.0, 11.04, 10.55, 1.768),
    // Period 3
    row("Na", 1.539, 180.0, 2.983, 0.03, 12.0, 1.081, 0.0, 1.25, 2.843, 2.296, 2.085),
    row("Mg3+2", 1.421, 109.47, 3.021, 0.111, 12.0, 1.787, 0.0, 1.25, 3.951, 3.693, 1.5),
    row("Al3", 1.244, 109.47, 4.499, 0.505, 11.278, 1.792, 0.0, 1.25, 4.06, 3.59, 1.201),
    row("Si3", 1.117, 109.47, 4.295, 0.402, 12.175, 2.323, 1.225, 1.25, 4.168, 3.487, 1.176),
    row("P_3+3", 1.101, 93.8, 4.147, 0.305, 13.072, 2.863, 2.4, 1.25, 5.463, 4.0, 1.102),
    row("P_3+5", 1.056, 109.47, 4.147, 0.305, 13.072, 2.863, 2.4, 1.25, 5.463, 4.0, 1.102),
    row("P_3+q", 1.056, 109.47, 4.147, 0.305, 13.072, 2.863, 2.4, 1.25, 5.463, 4.0, 1.102),
    row("S_3+2", 1.064, 92.1, 4.035, 0.274, 13.969, 2.703, 0.484, 1.25, 6.928, 4.486, 1.047),
    row("S_3+4", 1.049, 103.2, 4.035, 0.274, 13.969, 2.703, 0.484, 1.25, 6.928, 4.486, 1.047),
    row("S_3+6", 1.027, 109.47, 4.035, 0.274, 13.969, 2.703, 0.484, 1.25, 6.928, 4.486, 1.047),
    row("S_R", 1.077, 92.2, 4.035, 0.274, 13.969, 2.703, 0.0, 1.25, 6.928, 4.486, 1.047),
    row("S_2", 0.854, 120.0, 4.035, 0.274, 13.969, 2.703, 0.0, 1.25, 6.928, 4.486, 1.047),
    row("Cl", 1.044, 180.0, 3.947, 0.227, 14.866, 2.348, 0.0, 1.25, 8.564, 4.946, 0.994),
    row("Ar4+4", 1.032, 90.0, 3.868, 0.185, 15.763, 0.3, 0.0, 1.25, 9.465, 6.355, 2.108),
    // Period 4
    row("K_", 1.953, 180.0, 3.812, 0.035, 12.0, 1.165, 0.0, 0.7, 2.421, 1.92, 2.586),
    row("Ca6+2", 1.761, 90.0, 3.399, 0.238, 12.0, 2.141, 0.0, 0.7, 3.231, 2.88, 2.0),
    row("Sc3+3", 1.513, 109.47, 3.295, 0.019, 12.0, 2.592, 0.0, 0.7, 3.395, 3.08, 1.75),
    row("Ti3+4", 1.412, 109.47, 3.175, 0.017, 12.0, 2.659, 0.0, 0.7, 3.47, 3.38, 1.607),
    row("Ti6+4", 1.412, 90.0, 3.175, 0.017, 12.0, 2.659, 0.0, 0.7, 3.47, 3.38, 1.607),
    row("V_3+5", 1.402, 109.47, 3.144, 0.016, 12.0, 2.679, 0.0, 0.7, 3.65, 3.41, 1.47),
    row("Cr6+3", 1.345, 90.0, 3.023, 0.015, 12.0, 2.463, 0.0, 0.7, 3.415, 3.865, 1.402),
    row("Mn6+2", 1.382, 90.0, 2.961, 0.013, 12.0, 2.43, 0.0, 0.7, 3.325, 4.105, 1.533),
    row("Fe3+2", 1.27, 109.47, 2.912, 0.013, 12.0, 2.43, 0.0, 0.7, 3.76, 4.14, 1.393),
    row("Fe6+2", 1.335, 90.0, 2.912, 0.013, 12.0, 2.43, 0.0, 0.7, 3.76, 4.14, 1.393),
    row("Co6+3", 1.241, 90.0, 2.872, 0.014, 12.0, 2.43, 0.0, 0.7, 4.105, 4.175, 1.406),
    row("Ni4+2", 1.164, 90.0, 2.834, 0.015, 12.0, 2.43, 0.0, 0.7, 4.465, 4.205, 1.398),
    row("Cu3+1", 1.302, 109.47, 3.495, 0.005, 12.0, 1.756, 0.0, 0.7, 4.2, 4.22, 1.434),
    row("Zn3+2", 1.193, 109.47, 2.763, 0.124, 12.0, 1.308, 0.0, 0.7, 5.106, 4.285, 1.4),
    row("Ga3+3", 1.26, 109.47, 4.383, 0.415, 11.0, 1.821, 0.0, 0.7, 3.641, 3.16, 1.211),
    row("Ge3", 1.197, 109.47, 4.28, 0.379, 12.0, 2.789, 0.701, 0.7, 4.051, 3.438, 1.189),
    row("As3+3", 1.211, 92.1, 4.23, 0.309, 13.0, 2.864, 1.5, 0.7, 5.188, 3.809, 1.204),
    row("Se3+2", 1.19, 90.6, 4.205, 0.291, 14.0, 2.764, 0.335, 0.7, 6.428, 4.131, 1.224),
    row("Br", 1.192, 180.0, 4.189, 0.251, 15.0, 2.519, 0.0, 0.7, 7.79, 4.425, 1.141),
    row("Kr4+4", 1.147, 90.0, 4.141, 0.22, 16.0, 0.452, 0.0, 0.7, 8.505, 5.715, 2.27),
    // Period 5
    row("Rb", 2.26, 180.0, 4.114, 0.04, 12.0, 1.592, 0.0, 0.2, 2.331, 1.846, 2.77),
    row("Sr6+2", 2.052, 90.0, 3.641, 0.235, 12.0, 2.449, 0.0, 0.2, 3.024, 2.44, 2.415),
    row("Y_3+3", 1.698, 109.47, 3.345, 0.072, 12.0, 3.257, 0.0, 0.2, 3.83, 2.81, 1.998),
    row("Zr3+4", 1.564, 109.47, 3.124, 0.069, 12.0, 3.667, 0.0, 0.2, 3.4, 3.55, 1.758),
    row("Nb3+5", 1.473, 109.47, 3.165, 0.059, 12.0, 3.618, 0.0, 0.2, 3.55, 3.38, 1.603),
    row("Mo6+6", 1.467, 90.0, 3.052, 0.056, 12.0, 3.4, 0.0, 0.2, 3.465, 3.755, 1.53),
    row("Mo3+6", 1.484, 109.47, 3.052, 0.056, 12.0, 3.4, 0.0, 0.2, 3.465, 3.755, 1.53),
    row("Tc6+5", 1.322, 90.0, 2.998, 0.048, 12.0, 3.4, 0.0, 0.2, 3.29, 3.99, 1.5),
    row("Ru6+2", 1.478, 90.0, 2.963, 0.056, 12.0, 3.4, 0.0, 0.2, 3.575, 4.015, 1.5),
    row("Rh6+3", 1.332, 90.0, 2.929, 0.053, 12.0, 3.5, 0.0, 0.2, 3.975, 4.005, 1.509),
    row("Pd4+2", 1.338, 90.0, 2.899, 0.048, 12.0, 3.21, 0.0, 0.2, 4.32, 4.0, 1.544),
    row("Ag1+1", 1.386, 180.0, 3.148, 0.036, 12.0, 1.956, 0.0, 0.2, 4.436, 3.134, 1.622),
    row("Cd3+2", 1.403, 109.47, 2.848, 0.228, 12.0, 1.65, 0.0, 0.2, 5.034, 3.957, 1.6),
    row("In3+3", 1.459, 109.47, 4.463, 0.599, 11.0, 2.07, 0.0, 0.2, 3.506, 2.896, 1.404),
    row("Sn3", 1.398, 109.47, 4.392, 0.567, 12.0, 2.961, 0.199, 0.2, 3.987, 3.124, 1.354),
    row("Sb3+3", 1.407, 91.6, 4.42, 0.449, 13.0, 2.704, 1.1, 0.2, 4.899, 3.342, 1.404),
    row("Te3+2", 1.386, 90.25, 4.47, 0.398, 14.0, 2.882, 0.3, 0.2, 5.816, 3.526, 1.38),
    row("I_", 1.382, 180.0, 4.5, 0.339, 15.0, 2.65, 0.0, 0.2, 6.822, 3.762, 1.333),
    row("Xe4+4", 1.267, 90.0, 4.404, 0.332, 12.0, 0.556, 0.0, 0.2, 7.595, 4.975, 2.459),
    // Period 6
    row("Cs", 2.57, 180.0, 4.517, 0.045, 12.0, 1.573, 0.0, 0.1, 2.183, 1.711, 2.984),
    row("Ba6+2", 2.277, 90.0, 3.703, 0.364, 12.0, 2.727, 0.0, 0.1, 2.814, 2.396, 2.442),
    row("La3+3", 1.943, 109.47, 3.522, 0.017, 12.0, 3.3, 0.0, 0.1, 2.8355, 2.7415, 2.071),
    row("Ce6+3", 1.841, 90.0, 3.556, 0.013, 12.0, 3.3, 0.0, 0.1, 2.774, 2.692, 1.925),
    row("Pr6+3", 1.823, 90.0, 3.606, 0.01, 12.0, 3.3, 0.0, 0.1, 2.858, 2.564, 2.007),
    row("Nd6+3", 1.816, 90.0, 3.575, 0.01, 12.0, 3.3, 0.0, 0.1, 2.8685, 2.6205, 2.007),
    row("Pm6+3", 1.801, 90.0, 3.547, 0.009, 12.0, 3.3, 0.0, 0.1, 2.881, 2.673, 2.0),
    row("Sm6+3", 1.78, 90.0, 3.52, 0.008, 12.0, 3.3, 0.0, 0.1, 2.9115, 2.7195, 1.978),
    row("Eu6+3", 1.771, 90.0, 3.493, 0.008, 12.0, 3.3, 0.0, 0.1, 2.8785, 2.7875, 2.227),
    row("Gd6+3", 1.735, 90.0, 3.368, 0.009, 12.0, 3.3, 0.0, 0.1, 3.1665, 2.9745, 1.968),
    row("Tb6+3", 1.732, 90.0, 3.451, 0.007, 12.0, 3.3, 0.0, 0.1, 3.018, 2.834, 1.954),
    row("Dy6+3", 1.71, 90.0, 3.428, 0.007, 12.0, 3.3, 0.0, 0.1, 3.0555, 2.8715, 1.934),
    row("Ho6+3", 1.696, 90.0, 3.409, 0.007, 12.0, 3.416, 0.0, 0.1, 3.127, 2.891, 1.925),
    row("Er6+3", 1.673, 90.0, 3.391, 0.007, 12.0, 3.3, 0.0, 0.1, 3.1865, 2.9145, 1.915),
    row("Tm6+3", 1.66, 90.0, 3.374, 0.006, 12.0, 3.3, 0.0, 0.1, 3.2514, 2.9329, 2.0),
    row("Yb6+3", 1.637, 90.0, 3.355, 0.228, 12.0, 2.618, 0.0, 0.1, 3.2889, 2.965, 2.158),
    row("Lu6+3", 1.671, 90.0, 3.64, 0.041, 12.0, 3.271, 0.0, 0.1, 2.9629, 2.4629, 1.896),
    row("Hf3+4", 1.611, 109.47, 3.141, 0.072, 12.0, 3.921, 0.0, 0.1, 3.7, 3.4, 1.759),
    row("Ta3+5", 1.511, 109.47, 3.17, 0.081, 12.0, 4.075, 0.0, 0.1, 5.1, 2.85, 1.605),
    row("W_6+6", 1.392, 90.0, 3.069, 0.067, 12.0, 3.7, 0.0, 0.1, 4.63, 3.31, 1.538),
    row("W_3+4", 1.526, 109.47, 3.069, 0.067, 12.0, 3.7, 0.0, 0.1, 4.63, 3.31, 1.538),
    row("W_3+6", 1.38, 109.47, 3.069, 0.067, 12.0, 3.7, 0.0, 0.1, 4.63, 3.31, 1.538),
    row("Re6+5", 1.372, 90.0, 2.954, 0.066, 12.0, 3.7, 0.0, 0.1, 3.96, 3.92, 1.6),
    row("Re3+7", 1.314, 109.47, 2.954, 0.066, 12.0, 3.7, 0.0, 0.1, 3.96, 3.92, 1.6),
    row("Os6+6", 1.372, 90.0, 3.12, 0.037, 12.0, 3.7, 0.0, 0.1, 5.14, 3.63, 1.7),
    row("Ir6+3", 1.371, 90.0, 2.84, 0.073, 12.0, 3.731, 0.0, 0.1, 5.0, 4.0, 1.866),
    row("Pt4+2", 1.364, 90.0, 2.754, 0.08, 12.0, 3.382, 0.0, 0.1, 4.79, 4.43, 1.557),
    row("Au4+3", 1.262, 90.0, 3.293, 0.039, 12.0, 2.625, 0.0, 0.1, 4.894, 2.586, 1.618),
    row("Hg1+2", 1.34, 180.0, 2.705, 0.385, 12.0, 1.75, 0.0, 0.1, 6.27, 4.16, 1.6),
    row("Tl3+3", 1.518, 120.0, 4.347, 0.68, 11.0, 2.068, 0.0, 0.1, 3.2, 2.9, 1.53),
    row("Pb3", 1.459, 109.47, 4.297, 0.663, 12.0, 2.846, 0.1, 0.1, 3.9, 3.53, 1.444),
    row("Bi3+3", 1.512, 90.0, 4.37, 0.518, 13.0, 2.47, 1.0, 0.1, 4.69, 3.74, 1.514),
    row("Po3+2", 1.5, 90.0, 4.709, 0.325, 14.0, 2.33, 0.3, 0.1, 4.21, 4.21, 1.48),
    row("At", 1.545, 180.0, 4.75, 0.284, 15.0, 2.24, 0.0, 0.1, 4.75, 4.75, 1.47),
    row("Rn4+4", 1.42, 90.0, 4.765, 0.248, 16.0, 0.583, 0.0, 0.1, 5.37, 5.37, 2.2),
    // Period 7
    row("Fr", 2.88, 180.0, 4.9, 0.05, 12.0, 1.847, 0.0, 0.0, 2.0, 2.0, 2.3),
    row("Ra6+2", 2.512, 90.0, 3.677, 0.404, 12.0, 2.92, 0.0, 0.0, 2.843, 2.434, 2.2),
    row("Ac6+3", 1.983, 90.0, 3.478, 0.033, 12.0, 3.9, 0.0, 0.0, 2.835, 2.835, 2.108),
    row("Th6+4", 1.721, 90.0, 3.396, 0.026, 12.0, 4.202, 0.0, 0.0, 3.175, 2.905, 2.018),
    row("Pa6+4", 1.711, 90.0, 3.424, 0.022, 12.0, 3.9, 0.0, 0.0, 2.985, 2.905, 1.8),
    row("U_6+4", 1.684, 90.0, 3.395, 0.022, 12.0, 3.9, 0.0, 0.0, 3.341, 2.853, 1.713),
    row("Np6+4", 1.666, 90.0, 3.424, 0.019, 12.0, 3.9, 0.0, 0.0, 3.549, 2.717, 1.8),
    row("Pu6+4", 1.657, 90.0, 3.424, 0.016, 12.0, 3.9, 0.0, 0.0, 3.243, 2.819, 1.84),
    row("Am6+4", 1.66, 90.0, 3.381, 0.014, 12.0, 3.9, 0.0, 0.0, 2.9895, 3.0035, 1.942),
    row("Cm6+3", 1.801, 90.0, 3.326, 0.013, 12.0, 3.9, 0.0, 0.0, 2.8315, 3.1895, 1.9),
    row("Bk6+3", 1.761, 90.0, 3.339, 0.013, 12.0, 3.9, 0.0, 0.0, 3.1935, 3.0355, 1.9),
    row("Cf6+3", 1.75, 90.0, 3.313, 0.013, 12.0, 3.9, 0.0, 0.0, 3.197, 3.101, 1.9),
    row("Es6+3", 1.724, 90.0, 3.299, 0.012, 12.0, 3.9, 0.0, 0.0, 3.333, 3.089, 1.9),
    row("Fm6+3", 1.712, 90.0, 3.286, 0.012, 12.0, 3.9, 0.0, 0.0, 3.4, 3.1, 1.9),
    row("Md6+3", 1.689, 90.0, 3.274, 0.011, 12.0, 3.9, 0.0, 0.0, 3.47, 3.11, 1.9),
    row("No6+3", 1.679, 90.0, 3.248, 0.011, 12.0, 3.9, 0.0, 0.0, 3.475, 3.175, 1.9),
    row("Lw6+3", 1.698, 90.0, 3.236, 0.011, 12.0, 3.9, 0.0, 0.0, 3.5, 3.2, 1.9),
];

/// Look up the parameters for a UFF label
pub fn get_uff_params(label: &str) -> Option<&'static UffAtomParams> {
    UFF_PARAMS.iter().find(|p| p.label == label)
}

/// Position of a label in [`UFF_PARAMS`]
pub fn index_of_label(label: &str) -> Option<usize> {
    UFF_PARAMS.iter().position(|p| p.label == label)
}

/// Natural bond length between two atom types
///
/// `r_ij = r_i + r_j + r_BO - r_EN`, with the Pauling bond-order correction
/// `r_BO = -lambda (r_i + r_j) ln(n)` and the O'Keeffe-Brese electronegativity
/// correction `r_EN = r_i r_j (sqrt(xi_i) - sqrt(xi_j))^2 / (xi_i r_i + xi_j r_j)`.
pub fn calc_bond_rest_length(bond_order: f64, pi: &UffAtomParams, pj: &UffAtomParams) -> f64 {
    let (ri, rj) = (pi.r1, pj.r1);
    let r_bo = -LAMBDA * (ri + rj) * bond_order.ln();

    let (xi, xj) = (pi.gmp_xi, pj.gmp_xi);
    let diff = xi.sqrt() - xj.sqrt();
    let r_en = ri * rj * diff * diff / (xi * ri + xj * rj);

    ri + rj + r_bo - r_en
}

/// Bond stretch force constant `k = 2 G Z_i Z_j / r0^3`
pub fn calc_bond_force_constant(rest_length: f64, pi: &UffAtomParams, pj: &UffAtomParams) -> f64 {
    2.0 * G * pi.z1 * pj.z1 / rest_length.powi(3)
}

/// Angle bend force constant for the angle 1-2-3 (2 is the vertex)
///
/// `theta0` is in radians. r13 comes from the law of cosines.
pub fn calc_angle_force_constant(
    theta0: f64,
    bond_order12: f64,
    bond_order23: f64,
    p1: &UffAtomParams,
    p2: &UffAtomParams,
    p3: &UffAtomParams,
) -> f64 {
    let cos_theta0 = theta0.cos();
    let r12 = calc_bond_rest_length(bond_order12, p1, p2);
    let r23 = calc_bond_rest_length(bond_order23, p2, p3);
    let r13 = (r12 * r12 + r23 * r23 - 2.0 * r12 * r23 * cos_theta0).sqrt();

    let beta = 2.0 * G / (r12 * r23);
    let pre = beta * p1.z1 * p3.z1 / r13.powi(5);
    let r_term = r12 * r23;
    pre * r_term * (3.0 * r_term * (1.0 - cos_theta0 * cos_theta0) - r13 * r13 * cos_theta0)
}

/// Chalcogens: O, S, Se, Te, Po
pub fn is_in_group6(atomic_number: u8) -> bool {
    matches!(atomic_number, 8 | 16 | 34 | 52 | 84)
}

/// Hybridization of a torsion central atom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hybridization {
    SP2,
    SP3,
}

impl Hybridization {
    /// Map a label hybridization digit onto the torsion classes
    pub fn from_digit(hyb: u8) -> Option<Self> {
        match hyb {
            2 => Some(Hybridization::SP2),
            3 => Some(Hybridization::SP3),
            _ => None,
        }
    }
}

/// Torsion barrier, periodicity and phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorsionParams {
    /// Barrier height V (kcal/mol)
    pub force_constant: f64,
    /// Periodicity n
    pub order: u32,
    /// cos(n * phi0), either +1 or -1
    pub cos_term: f64,
}

/// Central-bond context needed to choose torsion parameters
#[derive(Debug, Clone, Copy)]
pub struct TorsionCenter<'a> {
    pub atomic_number: u8,
    pub hybridization: Hybridization,
    pub params: &'a UffAtomParams,
}

/// UFF equation 17: `V = 5 sqrt(U_j U_k) (1 + 4.18 ln(n))`
fn equation17(bond_order: f64, pj: &UffAtomParams, pk: &UffAtomParams) -> f64 {
    5.0 * (pj.u1 * pk.u1).sqrt() * (1.0 + 4.18 * bond_order.ln())
}

/// Torsion parameters for rotation about the bond j-k
///
/// `end_atom_is_sp2` is true when either outer atom of the dihedral is sp2.
pub fn calc_torsion_params(
    bond_order: f64,
    j: TorsionCenter<'_>,
    k: TorsionCenter<'_>,
    end_atom_is_sp2: bool,
) -> TorsionParams {
    use Hybridization::{SP2, SP3};

    let single = bond_order == 1.0;
    match (j.hybridization, k.hybridization) {
        (SP3, SP3) => {
            if single && is_in_group6(j.atomic_number) && is_in_group6(k.atomic_number) {
                let vj: f64 = if j.atomic_number == 8 { 2.0 } else { 6.8 };
                let vk: f64 = if k.atomic_number == 8 { 2.0 } else { 6.8 };
                TorsionParams {
                    force_constant: (vj * vk).sqrt(),
                    order: 2,
                    cos_term: -1.0,
                }
            } else {
                TorsionParams {
                    force_constant: (j.params.v1 * k.params.v1).sqrt(),
                    order: 3,
                    cos_term: -1.0,
                }
            }
        }
        (SP2, SP2) => TorsionParams {
            force_constant: equation17(bond_order, j.params, k.params),
            order: 2,
            cos_term: 1.0,
        },
        _ => {
            let group6_sp3 = |a: &TorsionCenter<'_>, b: &TorsionCenter<'_>| {
                a.hybridization == SP3
                    && is_in_group6(a.atomic_number)
                    && !is_in_group6(b.atomic_number)
            };
            if single && (group6_sp3(&j, &k) || group6_sp3(&k, &j)) {
                TorsionParams {
                    force_constant: equation17(bond_order, j.params, k.params),
                    order: 2,
                    cos_term: -1.0,
                }
            } else if single && end_atom_is_sp2 {
                TorsionParams {
                    force_constant: 2.0,
                    order: 3,
                    cos_term: -1.0,
                }
            } else {
                TorsionParams {
                    force_constant: 1.0,
                    order: 6,
                    cos_term: 1.0,
                }
            }
        }
    }
}

/// Inversion force constant and Fourier coefficients for a centre element
///
/// Returns `(k, c0, c1, c2)` with `k` already divided over the three
/// permutations of each centre. `c_bound_to_o` selects the stiffer constant
/// for sp2 carbon bonded to sp2 oxygen.
pub fn calc_inversion_coefficients_and_force_constant(
    atomic_number: u8,
    c_bound_to_o: bool,
) -> (f64, f64, f64, f64) {
    let (k, c0, c1, c2) = if matches!(atomic_number, 6..=8) {
        let k = if c_bound_to_o { 50.0 } else { 6.0 };
        (k, 1.0, -1.0, 0.0)
    } else {
        // Group 15 equilibrium angles (Towhee, via RDKit)
        let w0_deg: f64 = match atomic_number {
            15 => 84.4339,
            33 => 86.9735,
            51 => 87.7047,
            83 => 90.0,
            _ => 0.0,
        };
        let w0 = w0_deg.to_radians();
        let c2 = 1.0;
        let c1 = -4.0 * w0.cos();
        let c0 = -(c1 * w0.cos() + c2 * (2.0 * w0).cos());
        (22.0 / (c0 + c1 + c2), c0, c1, c2)
    };
    (k / 3.0, c0, c1, c2)
}

/// van der Waals distance, geometric mean `sqrt(x_i x_j)`
pub fn calc_vdw_distance(pi: &UffAtomParams, pj: &UffAtomParams) -> f64 {
    (pi.x1 * pj.x1).sqrt()
}

/// van der Waals well depth, geometric mean `sqrt(D_i D_j)`
pub fn calc_vdw_well_depth(pi: &UffAtomParams, pj: &UffAtomParams) -> f64 {
    (pi.d1 * pj.d1).sqrt()
}
