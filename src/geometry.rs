/// Homogeneous 4x4 transform from voxel indices (IJK) to physical space (RAS).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IjkToRas(pub [[f64; 4]; 4]);

impl Default for IjkToRas {
    fn default() -> Self {
        Self::identity()
    }
}

impl IjkToRas {
    pub fn identity() -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self(m)
    }

    /// Axis-aligned transform built from voxel spacing (i, j, k) and origin.
    pub fn from_spacing_origin(spacing: (f64, f64, f64), origin: (f64, f64, f64)) -> Self {
        let mut m = Self::identity().0;
        m[0][0] = spacing.0;
        m[1][1] = spacing.1;
        m[2][2] = spacing.2;
        m[0][3] = origin.0;
        m[1][3] = origin.1;
        m[2][3] = origin.2;
        Self(m)
    }

    /// Map a voxel index to physical coordinates
    pub fn apply(&self, ijk: (f64, f64, f64)) -> (f64, f64, f64) {
        let m = &self.0;
        let v = [ijk.0, ijk.1, ijk.2, 1.0];
        let row = |r: usize| m[r].iter().zip(v.iter()).map(|(a, b)| a * b).sum::<f64>();
        (row(0), row(1), row(2))
    }

    /// Element-wise comparison with a small tolerance, since transforms read
    /// from different files rarely match bit for bit.
    pub fn approx_eq(&self, other: &IjkToRas) -> bool {
        const EPSILON: f64 = 1e-6;
        self.0
            .iter()
            .flatten()
            .zip(other.0.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= EPSILON)
    }
}

/// Voxel grid a volume or segmentation lives on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// (depth, height, width), matching the layout of the voxel arrays
    pub dim: (usize, usize, usize),
    pub ijk_to_ras: IjkToRas,
}

impl Geometry {
    pub fn new(dim: (usize, usize, usize), ijk_to_ras: IjkToRas) -> Self {
        Self { dim, ijk_to_ras }
    }

    pub fn voxel_count(&self) -> usize {
        self.dim.0 * self.dim.1 * self.dim.2
    }

    pub fn is_aligned_with(&self, other: &Geometry) -> bool {
        self.dim == other.dim && self.ijk_to_ras.approx_eq(&other.ijk_to_ras)
    }
}
