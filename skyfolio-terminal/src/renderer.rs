/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color as TermColor, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix3, Matrix4, Point3, Vector4};
use skyfolio_core::light::shade;
use skyfolio_core::{
    Color, Geometry, LineSet, Material, Mesh, PerspectiveCamera, Renderer, Scene, StandardMaterial,
};
use std::io::{self, Write};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: u32 = 2;

/// A projected vertex in cell coordinates
#[derive(Debug, Clone, Copy)]
struct ScreenPoint {
    x: f32,
    y: f32,
    depth: f32,
}

/// Rasterizes a scene into character cells and writes it to `W`
pub struct AsciiRenderer<W: Write> {
    writer: W,
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<[u8; 3]>,
    status: Option<String>,
}

impl<W: Write> AsciiRenderer<W> {
    /// `width` and `height` are in square "pixels"; see [`CELL_ASPECT`]
    pub fn new(writer: W, width: u32, height: u32) -> Self {
        let mut renderer = Self {
            writer,
            width: 0,
            height: 0,
            depth_buffer: Vec::new(),
            char_buffer: Vec::new(),
            color_buffer: Vec::new(),
            status: None,
        };
        renderer.allocate(width, height);
        renderer
    }

    fn allocate(&mut self, width: u32, height: u32) {
        self.width = width.max(1) as usize;
        self.height = (height / CELL_ASPECT).max(1) as usize;
        let size = self.width * self.height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.char_buffer = vec![' '; size];
        self.color_buffer = vec![[255, 255, 255]; size];
    }

    /// Columns and rows of the character grid
    pub fn grid_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Text drawn over the first row of the next frame
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// The character grid, one string per row
    pub fn buffer_text(&self) -> Vec<String> {
        self.char_buffer
            .chunks(self.width)
            .map(|row| row.iter().collect())
            .collect()
    }

    pub fn rasterize(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        self.clear();
        let view_projection = camera.projection_matrix() * camera.view_matrix();

        for (_, object) in scene.objects() {
            if !object.visible {
                continue;
            }
            let model = object.transform.model_matrix();
            let mvp = view_projection * model;

            match (object.geometry.as_ref(), &object.material) {
                (Geometry::Triangles(mesh), Material::Standard(material))
                    if !material.wireframe =>
                {
                    self.fill_mesh(mesh, material, &model, &mvp, camera, scene);
                }
                (Geometry::Triangles(mesh), material) => {
                    self.draw_lines(&mesh.wireframe(), material.base_color(), &mvp, camera);
                }
                (Geometry::Lines(lines), material) => {
                    self.draw_lines(lines, material.base_color(), &mvp, camera);
                }
            }
        }
    }

    fn fill_mesh(
        &mut self,
        mesh: &Mesh,
        material: &StandardMaterial,
        model: &Matrix4<f32>,
        mvp: &Matrix4<f32>,
        camera: &PerspectiveCamera,
        scene: &Scene,
    ) {
        let normal_matrix: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into_owned();

        for triangle in &mesh.triangles {
            let mut screen = [ScreenPoint { x: 0.0, y: 0.0, depth: 0.0 }; 3];
            let mut clipped = false;
            for (slot, vertex) in screen.iter_mut().zip(&triangle.vertices) {
                match self.project(mvp, &vertex.position, camera.near) {
                    Some(point) => *slot = point,
                    None => {
                        clipped = true;
                        break;
                    }
                }
            }
            if clipped {
                continue; // Triangle is clipped
            }

            // Shade once per face at its centroid
            let centroid = Point3::from(
                (triangle.vertices[0].position.coords
                    + triangle.vertices[1].position.coords
                    + triangle.vertices[2].position.coords)
                    / 3.0,
            );
            let world_position = model.transform_point(&centroid);
            let world_normal = normal_matrix * triangle.calculate_normal();
            let color = shade(material, &world_position, &world_normal, scene.lights());

            let brightness = color.luminance().clamp(0.0, 1.0);
            let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
            let character = LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)];

            self.rasterize_triangle(&screen, character, color.to_rgb8());
        }
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenPoint; 3], character: char, rgb: [u8; 3]) {
        let [v0, v1, v2] = *coords;

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as i64;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil().min(self.width as f32 - 1.0) as i64;
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as i64;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil().min(self.height as f32 - 1.0) as i64;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let weights = barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), (px, py));
                if let Some((w0, w1, w2)) = weights {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                        self.plot(x as usize, y as usize, depth, character, rgb);
                    }
                }
            }
        }
    }

    fn draw_lines(
        &mut self,
        lines: &LineSet,
        default_color: Color,
        mvp: &Matrix4<f32>,
        camera: &PerspectiveCamera,
    ) {
        for segment in &lines.segments {
            let start = to_clip(mvp, &segment.start);
            let end = to_clip(mvp, &segment.end);
            let Some((start, end)) = clip_near(start, end, camera.near) else {
                continue;
            };
            let rgb = segment.color.unwrap_or(default_color).to_rgb8();
            let a = self.to_screen(&start);
            let b = self.to_screen(&end);
            self.draw_segment(a, b, rgb);
        }
    }

    fn draw_segment(&mut self, a: ScreenPoint, b: ScreenPoint, rgb: [u8; 3]) {
        let (max_x, max_y) = (self.width as f32 - 1.0, self.height as f32 - 1.0);
        let Some((a, b)) = clip_to_rect(a, b, max_x, max_y) else {
            return;
        };
        let character = slope_char(b.x - a.x, b.y - a.y);

        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (a.x + (b.x - a.x) * t).round();
            let y = (a.y + (b.y - a.y) * t).round();
            if x < 0.0 || y < 0.0 {
                continue;
            }
            let depth = a.depth + (b.depth - a.depth) * t;
            self.plot(x as usize, y as usize, depth, character, rgb);
        }
    }

    fn plot(&mut self, x: usize, y: usize, depth: f32, character: char, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y * self.width + x;
        if depth <= self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.char_buffer[idx] = character;
            self.color_buffer[idx] = rgb;
        }
    }

    fn project(&self, mvp: &Matrix4<f32>, point: &Point3<f32>, near: f32) -> Option<ScreenPoint> {
        let clip = to_clip(mvp, point);
        if clip.w < near {
            return None;
        }
        Some(self.to_screen(&clip))
    }

    fn to_screen(&self, clip: &Vector4<f32>) -> ScreenPoint {
        ScreenPoint {
            x: (clip.x / clip.w + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - clip.y / clip.w) * 0.5 * self.height as f32,
            depth: clip.z / clip.w,
        }
    }

    pub fn draw(&mut self) -> io::Result<()> {
        let mut current: Option<[u8; 3]> = None;

        for y in 0..self.height {
            self.writer.queue(cursor::MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let idx = y * self.width + x;
                let c = self.char_buffer[idx];
                let rgb = self.color_buffer[idx];

                if c != ' ' && current != Some(rgb) {
                    let [r, g, b] = rgb;
                    self.writer.queue(SetForegroundColor(TermColor::Rgb { r, g, b }))?;
                    current = Some(rgb);
                }
                self.writer.queue(Print(c))?;
            }
        }

        if let Some(status) = &self.status {
            let line: String = status.chars().take(self.width).collect();
            self.writer
                .queue(cursor::MoveTo(0, 0))?
                .queue(SetForegroundColor(TermColor::Yellow))?
                .queue(Print(line))?;
        }

        self.writer.queue(ResetColor)?;
        self.writer.flush()
    }
}

impl<W: Write> Renderer for AsciiRenderer<W> {
    type Error = io::Error;

    fn set_size(&mut self, width: u32, height: u32) {
        self.allocate(width, height);
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> io::Result<()> {
        self.rasterize(scene, camera);
        self.draw()
    }
}

fn to_clip(mvp: &Matrix4<f32>, point: &Point3<f32>) -> Vector4<f32> {
    mvp * Vector4::new(point.x, point.y, point.z, 1.0)
}

/// Trim a clip-space segment to the part in front of the near plane
fn clip_near(a: Vector4<f32>, b: Vector4<f32>, near: f32) -> Option<(Vector4<f32>, Vector4<f32>)> {
    match (a.w >= near, b.w >= near) {
        (true, true) => Some((a, b)),
        (false, false) => None,
        (a_in, _) => {
            let t = (near - a.w) / (b.w - a.w);
            let cut = a + (b - a) * t;
            if a_in {
                Some((a, cut))
            } else {
                Some((cut, b))
            }
        }
    }
}

/// Liang-Barsky clip of a screen segment to `[0, max_x] x [0, max_y]`
fn clip_to_rect(
    a: ScreenPoint,
    b: ScreenPoint,
    max_x: f32,
    max_y: f32,
) -> Option<(ScreenPoint, ScreenPoint)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0: f32 = 0.0;
    let mut t1: f32 = 1.0;

    for (p, q) in [(-dx, a.x), (dx, max_x - a.x), (-dy, a.y), (dy, max_y - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    let at = |t: f32| ScreenPoint {
        x: a.x + dx * t,
        y: a.y + dy * t,
        depth: a.depth + (b.depth - a.depth) * t,
    };
    Some((at(t0), at(t1)))
}

/// Pick a glyph that follows the segment's on-screen direction
fn slope_char(dx: f32, dy: f32) -> char {
    // Rows are CELL_ASPECT times taller than columns are wide
    let run = dx.abs();
    let rise = dy.abs() * CELL_ASPECT as f32;
    if rise * 2.0 < run {
        '-'
    } else if run * 2.0 < rise {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '\\'
    } else {
        '/'
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use skyfolio_core::{Light, LineSegment, SceneObject, Transform};
    use std::rc::Rc;

    fn camera_for(width: u32, height: u32) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, width as f32 / height as f32, 0.1, 1000.0);
        camera.position = Vector3::new(0.0, 0.0, 10.0);
        camera
    }

    fn lit_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_light(Light::ambient(Color::WHITE, 1.0));
        scene
    }

    #[test]
    fn test_grid_size_halves_rows() {
        let renderer = AsciiRenderer::new(Vec::new(), 80, 48);
        assert_eq!(renderer.grid_size(), (80, 24));
    }

    #[test]
    fn test_cube_covers_center() {
        let mut scene = lit_scene();
        scene.add(SceneObject::new(
            "cube",
            Rc::new(Mesh::cube(4.0).into()),
            StandardMaterial::default(),
        ));

        let mut renderer = AsciiRenderer::new(Vec::new(), 80, 48);
        renderer.render(&scene, &camera_for(80, 48)).unwrap();

        let rows = renderer.buffer_text();
        let center = rows[12].chars().nth(40).unwrap();
        assert_eq!(center, '@');
        assert!(rows[0].chars().all(|c| c == ' '));
        assert!(!renderer.writer().is_empty());
    }

    #[test]
    fn test_object_behind_camera_is_skipped() {
        let mut scene = lit_scene();
        scene.add(
            SceneObject::new("cube", Rc::new(Mesh::cube(4.0).into()), StandardMaterial::default())
                .with_transform(Transform::at(0.0, 0.0, 20.0)),
        );

        let mut renderer = AsciiRenderer::new(Vec::new(), 80, 48);
        renderer.rasterize(&scene, &camera_for(80, 48));
        assert!(renderer.buffer_text().iter().all(|row| row.trim().is_empty()));
    }

    #[test]
    fn test_line_crossing_near_plane_is_trimmed() {
        let mut lines = LineSet::new();
        lines.push(LineSegment::new(Point3::new(0.0, -1.0, -10.0), Point3::new(0.0, -1.0, 50.0)));

        let mut scene = Scene::new();
        let white = Material::LineBasic { color: Color::WHITE };
        scene.add(SceneObject::new("rail", Rc::new(lines.into()), white));

        let mut renderer = AsciiRenderer::new(Vec::new(), 80, 48);
        renderer.rasterize(&scene, &camera_for(80, 48));
        let drawn: usize = renderer
            .buffer_text()
            .iter()
            .map(|row| row.chars().filter(|c| *c != ' ').count())
            .sum();
        assert!(drawn > 0);
    }

    #[test]
    fn test_nearer_surface_wins() {
        let mut scene = lit_scene();
        let far = StandardMaterial {
            color: Color::from_hex(0x202020),
            ..StandardMaterial::default()
        };
        scene.add(
            SceneObject::new("far", Rc::new(Mesh::cube(4.0).into()), far)
                .with_transform(Transform::at(0.0, 0.0, -5.0)),
        );
        scene.add(SceneObject::new(
            "near",
            Rc::new(Mesh::cube(2.0).into()),
            StandardMaterial::default(),
        ));

        let mut renderer = AsciiRenderer::new(Vec::new(), 80, 48);
        renderer.rasterize(&scene, &camera_for(80, 48));
        assert_eq!(renderer.buffer_text()[12].chars().nth(40), Some('@'));
    }

    #[test]
    fn test_slope_glyphs() {
        assert_eq!(slope_char(10.0, 0.0), '-');
        assert_eq!(slope_char(0.0, 10.0), '|');
        assert_eq!(slope_char(4.0, 2.0), '\\');
        assert_eq!(slope_char(4.0, -2.0), '/');
    }

    #[test]
    fn test_clip_to_rect() {
        let a = ScreenPoint { x: -10.0, y: 5.0, depth: 0.0 };
        let b = ScreenPoint { x: 110.0, y: 5.0, depth: 1.0 };
        let (a, b) = clip_to_rect(a, b, 79.0, 23.0).unwrap();
        assert!((a.x - 0.0).abs() < 1e-4);
        assert!((b.x - 79.0).abs() < 1e-4);

        let outside = ScreenPoint { x: -5.0, y: -5.0, depth: 0.0 };
        let also_outside = ScreenPoint { x: -1.0, y: -9.0, depth: 0.0 };
        assert!(clip_to_rect(outside, also_outside, 79.0, 23.0).is_none());
    }
}
