use glam::{Mat4, Vec2};

/// Vertical half extent of the visible world. The horizontal extent follows the aspect ratio.
pub const HALF_HEIGHT: f32 = 0.5;

/// Orthographic camera bounds in world space. Fixed once the window exists.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl CameraBounds {
    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self { left, right, bottom, top }
    }

    /// Bounds centered on the origin for a `width` x `height` window.
    pub fn from_resolution(width: u32, height: u32) -> Self {
        let ratio = width as f32 / height.max(1) as f32;
        Self::new(-ratio * HALF_HEIGHT, ratio * HALF_HEIGHT, -HALF_HEIGHT, HALF_HEIGHT)
    }

    /// Half of the visible width and height.
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new((self.right - self.left) / 2.0, (self.top - self.bottom) / 2.0)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.bottom && point.y <= self.top
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(self.left, self.right, self.bottom, self.top, -1.0, 1.0)
    }

    /// Converts a cursor position in window pixels (origin top left, y down) into world space.
    pub fn screen_to_world(&self, cursor: Vec2, window_size: Vec2) -> Vec2 {
        if window_size.x <= 0.0 || window_size.y <= 0.0 {
            return Vec2::ZERO;
        }
        let normalized = cursor / window_size;
        Vec2::new(
            self.left + normalized.x * (self.right - self.left),
            self.top - normalized.y * (self.top - self.bottom),
        )
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.left, self.right, self.bottom, self.top]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn bounds_follow_aspect_ratio() {
        let bounds = CameraBounds::from_resolution(640, 480);
        assert!((bounds.right - 2.0 / 3.0).abs() < EPSILON);
        assert!((bounds.left + 2.0 / 3.0).abs() < EPSILON);
        assert_eq!(bounds.bottom, -0.5);
        assert_eq!(bounds.top, 0.5);
    }

    #[test]
    fn window_center_maps_to_origin() {
        let bounds = CameraBounds::new(-0.667, 0.667, -0.5, 0.5);
        let world = bounds.screen_to_world(Vec2::new(320.0, 240.0), Vec2::new(640.0, 480.0));
        assert!(world.x.abs() < EPSILON);
        assert!(world.y.abs() < EPSILON);
    }

    #[test]
    fn window_corners_map_to_bounds() {
        let bounds = CameraBounds::new(-0.667, 0.667, -0.5, 0.5);
        let window = Vec2::new(640.0, 480.0);

        let top_left = bounds.screen_to_world(Vec2::ZERO, window);
        assert!((top_left - Vec2::new(-0.667, 0.5)).length() < EPSILON);

        let bottom_right = bounds.screen_to_world(window, window);
        assert!((bottom_right - Vec2::new(0.667, -0.5)).length() < EPSILON);
    }

    #[test]
    fn zero_sized_window_maps_to_origin() {
        let bounds = CameraBounds::from_resolution(640, 480);
        assert_eq!(bounds.screen_to_world(Vec2::new(10.0, 10.0), Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn projection_maps_bounds_to_clip_space() {
        let bounds = CameraBounds::from_resolution(800, 600);
        let projection = bounds.projection();
        let corner = projection.project_point3(glam::Vec3::new(bounds.right, bounds.top, 0.0));
        assert!((corner.x - 1.0).abs() < EPSILON);
        assert!((corner.y - 1.0).abs() < EPSILON);
    }
}
