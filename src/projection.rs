use glam::DMat4;

/// Builds 4x4 projection matrices, returned row-major.
pub trait ProjectionBuilder {
    fn ortho(&self, left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> [f64; 16];

    fn perspective(&self, fovy_radians: f64, aspect: f64, near: f64, far: f64) -> [f64; 16];
}

/// OpenGL conventions: right-handed, clip-space depth in `[-1, 1]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlProjection;

impl ProjectionBuilder for GlProjection {
    fn ortho(&self, left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> [f64; 16] {
        to_row_major(&DMat4::orthographic_rh_gl(left, right, bottom, top, near, far))
    }

    fn perspective(&self, fovy_radians: f64, aspect: f64, near: f64, far: f64) -> [f64; 16] {
        to_row_major(&DMat4::perspective_rh_gl(fovy_radians, aspect, near, far))
    }
}

pub fn to_row_major(matrix: &DMat4) -> [f64; 16] {
    matrix.transpose().to_cols_array()
}

pub fn from_row_major(rows: &[f64; 16]) -> DMat4 {
    DMat4::from_cols_array(rows).transpose()
}
