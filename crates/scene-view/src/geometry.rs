//! Gizmoメッシュ生成
//! 各軸の描画用頂点データを生成する。頂点は単位サイズで、
//! 実際の大きさはGizmoルートノードのスケールで決まる。

use scene_core::math::{safe_normalize, Vec3};

/// Gizmo頂点データ
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GizmoVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl GizmoVertex {
    pub fn new(position: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            color,
        }
    }

    /// 頂点バッファレイアウト
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GizmoVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// 軸の色定数
pub const COLOR_X: [f32; 4] = [0.9, 0.2, 0.2, 1.0]; // 赤
pub const COLOR_Y: [f32; 4] = [0.2, 0.9, 0.2, 1.0]; // 緑
pub const COLOR_Z: [f32; 4] = [0.2, 0.2, 0.9, 1.0]; // 青
pub const COLOR_FREE: [f32; 4] = [1.0, 1.0, 1.0, 0.8]; // 白
pub const COLOR_HIGHLIGHT: [f32; 4] = [1.0, 0.85, 0.3, 1.0]; // ホバー
pub const COLOR_SELECTED: [f32; 4] = [1.0, 1.0, 0.0, 1.0]; // 選択中

/// Translate矢印の全長
pub const ARROW_LENGTH: f32 = 1.0;
/// Scale軸のシャフト長
pub const SCALE_SHAFT_LENGTH: f32 = 0.85;
/// Scale先端ボックスの一辺
pub const SCALE_BOX_SIZE: f32 = 0.1;
/// Rotateリングの半径
pub const RING_RADIUS: f32 = 1.0;

const SHAFT_THICKNESS: f32 = 0.02;
const CONE_LENGTH: f32 = 0.2;
const CONE_RADIUS: f32 = 0.06;
const RING_THICKNESS: f32 = 0.03;
const CONE_SEGMENTS: usize = 8;
const RING_SEGMENTS: usize = 32;

/// `dir` に垂直な2つの単位ベクトル
fn orthonormal_basis(dir: Vec3) -> Option<(Vec3, Vec3, Vec3)> {
    let dir = safe_normalize(dir)?;
    let helper = if dir.dot(Vec3::Y).abs() > 0.9 { Vec3::Z } else { Vec3::Y };
    let right = safe_normalize(dir.cross(helper))?;
    let up = right.cross(dir);
    Some((dir, up, right))
}

fn push_quad(vertices: &mut Vec<GizmoVertex>, quad: [Vec3; 4], color: [f32; 4]) {
    for i in [0, 1, 2, 0, 2, 3] {
        vertices.push(GizmoVertex::new(quad[i], color));
    }
}

/// 四角柱のシャフト（側面4面）
fn push_shaft(vertices: &mut Vec<GizmoVertex>, dir: Vec3, up: Vec3, right: Vec3, length: f32, color: [f32; 4]) {
    let t = SHAFT_THICKNESS;
    let end = dir * length;
    let corners = [
        up * t + right * t,
        up * t - right * t,
        -up * t - right * t,
        -up * t + right * t,
    ];
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        push_quad(vertices, [a, b, end + b, end + a], color);
    }
}

fn push_box(vertices: &mut Vec<GizmoVertex>, center: Vec3, half: f32, color: [f32; 4]) {
    let c = |x: f32, y: f32, z: f32| center + Vec3::new(x, y, z) * half;
    let corners = [
        c(-1.0, -1.0, -1.0),
        c(1.0, -1.0, -1.0),
        c(1.0, 1.0, -1.0),
        c(-1.0, 1.0, -1.0),
        c(-1.0, -1.0, 1.0),
        c(1.0, -1.0, 1.0),
        c(1.0, 1.0, 1.0),
        c(-1.0, 1.0, 1.0),
    ];
    let faces = [
        [0, 1, 2, 3], // front
        [5, 4, 7, 6], // back
        [4, 0, 3, 7], // left
        [1, 5, 6, 2], // right
        [3, 2, 6, 7], // top
        [4, 5, 1, 0], // bottom
    ];
    for face in faces {
        push_quad(vertices, face.map(|i| corners[i]), color);
    }
}

/// Translate Gizmo用の矢印メッシュを生成
pub fn create_arrow_vertices(direction: Vec3, color: [f32; 4]) -> Vec<GizmoVertex> {
    let mut vertices = Vec::new();
    let Some((dir, up, right)) = orthonormal_basis(direction) else {
        return vertices;
    };

    let shaft_length = ARROW_LENGTH - CONE_LENGTH;
    push_shaft(&mut vertices, dir, up, right, shaft_length, color);

    // コーン（矢印先端）
    let tip = dir * ARROW_LENGTH;
    let base = dir * shaft_length;
    for i in 0..CONE_SEGMENTS {
        let a1 = (i as f32 / CONE_SEGMENTS as f32) * std::f32::consts::TAU;
        let a2 = ((i + 1) as f32 / CONE_SEGMENTS as f32) * std::f32::consts::TAU;
        let p1 = base + (up * a1.cos() + right * a1.sin()) * CONE_RADIUS;
        let p2 = base + (up * a2.cos() + right * a2.sin()) * CONE_RADIUS;

        // 側面
        vertices.push(GizmoVertex::new(p1, color));
        vertices.push(GizmoVertex::new(p2, color));
        vertices.push(GizmoVertex::new(tip, color));
        // 底面
        vertices.push(GizmoVertex::new(base, color));
        vertices.push(GizmoVertex::new(p1, color));
        vertices.push(GizmoVertex::new(p2, color));
    }

    vertices
}

/// Rotate Gizmo用のリングメッシュを生成
pub fn create_ring_vertices(normal: Vec3, radius: f32, color: [f32; 4]) -> Vec<GizmoVertex> {
    let mut vertices = Vec::new();
    let Some((_, up, right)) = orthonormal_basis(normal) else {
        return vertices;
    };

    let inner = radius - RING_THICKNESS;
    let outer = radius + RING_THICKNESS;
    for i in 0..RING_SEGMENTS {
        let a1 = (i as f32 / RING_SEGMENTS as f32) * std::f32::consts::TAU;
        let a2 = ((i + 1) as f32 / RING_SEGMENTS as f32) * std::f32::consts::TAU;
        let d1 = up * a1.cos() + right * a1.sin();
        let d2 = up * a2.cos() + right * a2.sin();

        // 帯状に描画
        push_quad(&mut vertices, [d1 * inner, d1 * outer, d2 * outer, d2 * inner], color);
    }

    vertices
}

/// Scale Gizmo用のボックス付き線メッシュを生成
pub fn create_scale_axis_vertices(direction: Vec3, color: [f32; 4]) -> Vec<GizmoVertex> {
    let mut vertices = Vec::new();
    let Some((dir, up, right)) = orthonormal_basis(direction) else {
        return vertices;
    };

    push_shaft(&mut vertices, dir, up, right, SCALE_SHAFT_LENGTH, color);
    let half = SCALE_BOX_SIZE * 0.5;
    push_box(&mut vertices, dir * (SCALE_SHAFT_LENGTH + half), half, color);

    vertices
}

/// 中心ボックス（Scaleの全軸ハンドル、Translateの自由移動ハンドル）
pub fn create_box_vertices(half_extent: f32, color: [f32; 4]) -> Vec<GizmoVertex> {
    let mut vertices = Vec::new();
    push_box(&mut vertices, Vec3::ZERO, half_extent, color);
    vertices
}

/// 頂点色を一括で置き換える（状態に応じたハイライト用）
pub fn recolor(vertices: &mut [GizmoVertex], color: [f32; 4]) {
    for vertex in vertices {
        vertex.color = color;
    }
}
