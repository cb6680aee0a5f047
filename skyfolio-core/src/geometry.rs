/// Geometry primitives and the generators used to build the scene
use nalgebra::{Point3, Vector3};
use std::f32::consts::{PI, TAU};

use crate::material::Color;

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }

    fn from_parts(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Axis-aligned box centred on the origin
    pub fn box_geometry(width: f32, height: f32, depth: f32) -> Self {
        let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
        let mut mesh = Self::with_capacity(12);

        // (normal, u, v) with u x v == normal so every face winds outward
        let faces = [
            (Vector3::x(), -Vector3::z(), Vector3::y()),
            (-Vector3::x(), Vector3::z(), Vector3::y()),
            (Vector3::y(), Vector3::x(), -Vector3::z()),
            (-Vector3::y(), Vector3::x(), Vector3::z()),
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), -Vector3::x(), Vector3::y()),
        ];

        for (normal, u, v) in faces {
            let center = Point3::from(normal.component_mul(&half));
            let du = u.component_mul(&half);
            let dv = v.component_mul(&half);
            let corner = |su: f32, sv: f32| Vertex::from_parts(center + du * su + dv * sv, normal);

            let (bottom_left, bottom_right) = (corner(-1.0, -1.0), corner(1.0, -1.0));
            let (top_right, top_left) = (corner(1.0, 1.0), corner(-1.0, 1.0));
            mesh.add_triangle(Triangle::new(bottom_left, bottom_right, top_right));
            mesh.add_triangle(Triangle::new(bottom_left, top_right, top_left));
        }

        mesh
    }

    /// Create a cube mesh
    pub fn cube(size: f32) -> Self {
        Self::box_geometry(size, size, size)
    }

    /// UV sphere. Pole rows emit a single triangle per quad, so the mesh
    /// holds `width_segments * (2 * height_segments - 2)` triangles.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let stride = (width_segments + 1) as usize;

        let mut grid = Vec::with_capacity(stride * (height_segments as usize + 1));
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let position = Point3::new(
                    -radius * (u * TAU).cos() * (v * PI).sin(),
                    radius * (v * PI).cos(),
                    radius * (u * TAU).sin() * (v * PI).sin(),
                );
                let normal = position
                    .coords
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vector3::y);
                grid.push(Vertex::from_parts(position, normal));
            }
        }

        let at = |ix: u32, iy: u32| grid[iy as usize * stride + ix as usize];
        let mut mesh = Self::with_capacity((width_segments * (2 * height_segments - 2)) as usize);
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = at(ix + 1, iy);
                let b = at(ix, iy);
                let c = at(ix, iy + 1);
                let d = at(ix + 1, iy + 1);

                if iy != 0 {
                    mesh.add_triangle(Triangle::new(a, b, d));
                }
                if iy != height_segments - 1 {
                    mesh.add_triangle(Triangle::new(b, c, d));
                }
            }
        }

        mesh
    }

    /// Torus lying in the XY plane around the Z axis
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial_segments = radial_segments.max(1);
        let tubular_segments = tubular_segments.max(1);
        let stride = (tubular_segments + 1) as usize;

        let mut ring = Vec::with_capacity(stride * (radial_segments as usize + 1));
        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            for i in 0..=tubular_segments {
                let u = i as f32 / tubular_segments as f32 * TAU;
                let position = Point3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let center = Point3::new(radius * u.cos(), radius * u.sin(), 0.0);
                let normal = (position - center)
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vector3::z);
                ring.push(Vertex::from_parts(position, normal));
            }
        }

        let at = |i: u32, j: u32| ring[j as usize * stride + i as usize];
        let mut mesh = Self::with_capacity((2 * radial_segments * tubular_segments) as usize);
        for j in 1..=radial_segments {
            for i in 1..=tubular_segments {
                let a = at(i - 1, j);
                let b = at(i - 1, j - 1);
                let c = at(i, j - 1);
                let d = at(i, j);

                mesh.add_triangle(Triangle::new(a, b, d));
                mesh.add_triangle(Triangle::new(b, c, d));
            }
        }

        mesh
    }

    /// Every triangle edge as a line segment. Shared edges appear twice.
    pub fn wireframe(&self) -> LineSet {
        let mut lines = LineSet::with_capacity(self.triangles.len() * 3);
        for triangle in &self.triangles {
            let [a, b, c] = triangle.vertices.map(|v| v.position);
            lines.push(LineSegment::new(a, b));
            lines.push(LineSegment::new(b, c));
            lines.push(LineSegment::new(c, a));
        }
        lines
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// A straight segment, optionally carrying its own color
#[derive(Debug, Clone, Copy)]
pub struct LineSegment {
    pub start: Point3<f32>,
    pub end: Point3<f32>,
    pub color: Option<Color>,
}

impl LineSegment {
    pub fn new(start: Point3<f32>, end: Point3<f32>) -> Self {
        Self {
            start,
            end,
            color: None,
        }
    }

    pub fn colored(start: Point3<f32>, end: Point3<f32>, color: Color) -> Self {
        Self {
            start,
            end,
            color: Some(color),
        }
    }
}

/// Unconnected line segments
#[derive(Debug, Clone, Default)]
pub struct LineSet {
    pub segments: Vec<LineSegment>,
}

impl LineSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            segments: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, segment: LineSegment) {
        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Join consecutive points. Fewer than two points yields no segments.
    pub fn strip(points: &[Point3<f32>]) -> Self {
        Self {
            segments: points
                .windows(2)
                .map(|pair| LineSegment::new(pair[0], pair[1]))
                .collect(),
        }
    }

    /// Square grid on the XZ plane; the two centre lines get `center_color`
    pub fn grid(size: f32, divisions: u32, center_color: Color, grid_color: Color) -> Self {
        let divisions = divisions.max(1);
        let center = divisions / 2;
        let step = size / divisions as f32;
        let half = size / 2.0;

        let mut lines = Self::with_capacity(2 * (divisions as usize + 1));
        for i in 0..=divisions {
            let k = -half + i as f32 * step;
            let color = if i == center { center_color } else { grid_color };
            lines.push(LineSegment::colored(
                Point3::new(-half, 0.0, k),
                Point3::new(half, 0.0, k),
                color,
            ));
            lines.push(LineSegment::colored(
                Point3::new(k, 0.0, -half),
                Point3::new(k, 0.0, half),
                color,
            ));
        }
        lines
    }

    /// X, Y and Z axes in red, green and blue
    pub fn axes(size: f32) -> Self {
        let origin = Point3::origin();
        let axis = |end: Point3<f32>, hex| LineSegment::colored(origin, end, Color::from_hex(hex));
        Self {
            segments: vec![
                axis(Point3::new(size, 0.0, 0.0), 0xff0000),
                axis(Point3::new(0.0, size, 0.0), 0x00ff00),
                axis(Point3::new(0.0, 0.0, size), 0x0000ff),
            ],
        }
    }
}

/// Renderable shape data, shared between scene objects
#[derive(Debug, Clone)]
pub enum Geometry {
    Triangles(Mesh),
    Lines(LineSet),
}

impl From<Mesh> for Geometry {
    fn from(mesh: Mesh) -> Self {
        Geometry::Triangles(mesh)
    }
}

impl From<LineSet> for Geometry {
    fn from(lines: LineSet) -> Self {
        Geometry::Lines(lines)
    }
}
