use bytemuck::{Pod, Zeroable};

/// A 4×4 column-major transform applied to quad geometry in the vertex
/// stage. Uploaded verbatim as a uniform; WGSL `mat4x4<f32>` shares the
/// same memory layout.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Pose {
    pub matrix: [f32; 16],
}

impl Pose {
    pub fn identity() -> Self {
        Self::from_matrix([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn from_matrix(matrix: [f32; 16]) -> Self {
        Self { matrix }
    }

    /// Translation in the quad's clip-space plane.
    pub fn translation(x: f32, y: f32) -> Self {
        let mut pose = Self::identity();
        pose.matrix[12] = x;
        pose.matrix[13] = y;
        pose
    }

    /// Rotation around the view axis.
    pub fn rotation_z(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        let mut pose = Self::identity();
        pose.matrix[0] = c;
        pose.matrix[1] = s;
        pose.matrix[4] = -s;
        pose.matrix[5] = c;
        pose
    }

    /// The exact bytes uploaded to the pose uniform buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_uploads_as_sixteen_floats() {
        let pose = Pose::identity();
        assert_eq!(pose.as_bytes().len(), 64);
        assert_eq!(
            bytemuck::cast_slice::<u8, f32>(pose.as_bytes()),
            &pose.matrix
        );
    }

    #[test]
    fn translation_lands_in_the_fourth_column() {
        let pose = Pose::translation(0.25, -0.5);
        assert_eq!(pose.matrix[12], 0.25);
        assert_eq!(pose.matrix[13], -0.5);
        assert_eq!(pose.matrix[0], 1.0);
    }

    #[test]
    fn zero_rotation_is_identity() {
        assert_eq!(Pose::rotation_z(0.0), Pose::identity());
    }
}
