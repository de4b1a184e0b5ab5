use scene_core::math::{safe_normalize, Mat4, Ray, Vec2, Vec3, Vec4};

/// 3Dカメラ
/// 位置、注視点、上方向ベクトルを持つ透視投影カメラ
///
/// Screen coordinates used throughout the editor are normalized device
/// coordinates: `x` and `y` in `[-1, 1]`, `+y` up.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// デフォルト値で新しいカメラを作成
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 45.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 100.0,
        }
    }

    /// 位置と注視点を指定してカメラを作成
    pub fn looking_at(position: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            position,
            target,
            ..Self::new(aspect)
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// View-Projection行列を構築
    pub fn build_view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// 視線方向（単位ベクトル）
    pub fn forward(&self) -> Vec3 {
        safe_normalize(self.target - self.position).unwrap_or(Vec3::NEG_Z)
    }

    /// 画面右方向
    pub fn right(&self) -> Vec3 {
        safe_normalize(self.forward().cross(self.up)).unwrap_or(Vec3::X)
    }

    /// 画面上方向
    pub fn screen_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        (point - self.position).length()
    }

    /// NDC座標からワールド空間のレイを生成
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
        let inv = self.build_view_projection_matrix().inverse();
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(self.position, far - near)
    }

    /// ワールド座標をNDC座標へ投影
    /// カメラの後ろにある点は `None`
    pub fn project_to_ndc(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.build_view_projection_matrix() * Vec4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= self.near * 0.5 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        ndc.is_finite().then(|| Vec2::new(ndc.x, ndc.y))
    }

    /// カメラ位置を設定
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// カメラの注視点を設定
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// アスペクト比を設定
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front_camera() -> Camera {
        Camera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 1.0)
    }

    #[test]
    fn test_camera_new() {
        let camera = Camera::new(16.0 / 9.0);
        assert_eq!(camera.position, Vec3::new(0.0, 2.0, 5.0));
        assert_eq!(camera.target, Vec3::ZERO);
        assert_eq!(camera.up, Vec3::Y);
    }

    #[test]
    fn test_view_projection_not_identity() {
        let vp = Camera::new(1.0).build_view_projection_matrix();
        assert_ne!(vp, Mat4::IDENTITY);
    }

    #[test]
    fn test_basis_vectors() {
        let camera = front_camera();
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-6);
        assert!((camera.right() - Vec3::X).length() < 1e-6);
        assert!((camera.screen_up() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = front_camera();
        let ray = camera.ray_from_ndc(Vec2::ZERO).unwrap();
        assert_eq!(ray.origin, camera.position);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_project_roundtrip() {
        let camera = front_camera();
        let point = Vec3::new(1.0, -0.5, 0.0);
        let ndc = camera.project_to_ndc(point).unwrap();
        assert!(ndc.x > 0.0 && ndc.y < 0.0);

        let ray = camera.ray_from_ndc(ndc).unwrap();
        let t = (point - ray.origin).dot(ray.direction);
        assert!((ray.at(t) - point).length() < 1e-3);
    }

    #[test]
    fn test_project_behind_camera() {
        let camera = front_camera();
        assert!(camera.project_to_ndc(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn test_set_aspect() {
        let mut camera = Camera::new(1.0);
        camera.set_aspect(2.0);
        assert_eq!(camera.aspect, 2.0);
    }
}
