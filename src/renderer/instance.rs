//! Per-ball instance record for GPU upload

use bytemuck::{Pod, Zeroable};

/// One ball as seen by the renderer: center, radius and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BallInstance {
    pub position: [f32; 2],
    pub radius: f32,
    pub color: [f32; 4],
}

impl BallInstance {
    /// Byte stride of one instance in a vertex buffer
    pub const STRIDE: usize = std::mem::size_of::<BallInstance>();

    pub const fn new(x: f32, y: f32, radius: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            radius,
            color,
        }
    }

    /// View a slice of instances as raw bytes for upload
    pub fn as_bytes(instances: &[BallInstance]) -> &[u8] {
        bytemuck::cast_slice(instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_tightly_packed() {
        assert_eq!(BallInstance::STRIDE, 28);
    }

    #[test]
    fn test_as_bytes() {
        let instances = [
            BallInstance::new(1.0, 2.0, 3.0, [0.5; 4]),
            BallInstance::new(4.0, 5.0, 6.0, [1.0; 4]),
        ];
        let bytes = BallInstance::as_bytes(&instances);
        assert_eq!(bytes.len(), 2 * BallInstance::STRIDE);
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(&floats[..3], &[1.0, 2.0, 3.0]);
        assert_eq!(floats[7], 4.0);
    }
}
