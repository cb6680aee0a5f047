/// CPU-side vertex data for upload to WebGL
use skyfolio_core::{Color, Geometry, Mesh};

/// Floats per vertex: position (3), normal (3), color (3)
pub const FLOATS_PER_VERTEX: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    Triangles,
    Lines,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    pub data: Vec<f32>,
    pub mode: PrimitiveMode,
}

impl VertexData {
    pub fn vertex_count(&self) -> usize {
        self.data.len() / FLOATS_PER_VERTEX
    }
}

/// Flatten a geometry into interleaved vertices. Wireframe meshes become
/// line pairs. Vertex colors are white unless a line segment carries its
/// own color; the material color is applied in the shader.
pub fn interleave(geometry: &Geometry, wireframe: bool) -> VertexData {
    match geometry {
        Geometry::Triangles(mesh) if wireframe => lines(&mesh.wireframe()),
        Geometry::Triangles(mesh) => triangles(mesh),
        Geometry::Lines(set) => lines(set),
    }
}

fn triangles(mesh: &Mesh) -> VertexData {
    let mut data = Vec::with_capacity(mesh.triangles.len() * 3 * FLOATS_PER_VERTEX);
    for vertex in mesh.triangles.iter().flat_map(|t| t.vertices.iter()) {
        data.extend_from_slice(vertex.position.coords.as_slice());
        data.extend_from_slice(vertex.normal.as_slice());
        data.extend_from_slice(&Color::WHITE.to_array());
    }
    VertexData {
        data,
        mode: PrimitiveMode::Triangles,
    }
}

fn lines(set: &skyfolio_core::LineSet) -> VertexData {
    let mut data = Vec::with_capacity(set.len() * 2 * FLOATS_PER_VERTEX);
    for segment in &set.segments {
        let color = segment.color.unwrap_or(Color::WHITE).to_array();
        for point in [segment.start, segment.end] {
            data.extend_from_slice(point.coords.as_slice());
            // Lines are unlit; the normal slot is unused
            data.extend_from_slice(&[0.0, 0.0, 0.0]);
            data.extend_from_slice(&color);
        }
    }
    VertexData {
        data,
        mode: PrimitiveMode::Lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfolio_core::LineSet;

    #[test]
    fn test_solid_mesh_layout() {
        let geometry = Geometry::from(Mesh::cube(2.0));
        let vertices = interleave(&geometry, false);
        assert_eq!(vertices.mode, PrimitiveMode::Triangles);
        assert_eq!(vertices.vertex_count(), 36);

        // First vertex: position, then a unit normal, then white
        let first = &vertices.data[..FLOATS_PER_VERTEX];
        let normal_length = first[3..6].iter().map(|n| n * n).sum::<f32>().sqrt();
        assert!((normal_length - 1.0).abs() < 1e-6);
        assert_eq!(&first[6..9], &[1.0f32, 1.0, 1.0]);
    }

    #[test]
    fn test_wireframe_mesh_becomes_lines() {
        let geometry = Geometry::from(Mesh::cube(2.0));
        let vertices = interleave(&geometry, true);
        assert_eq!(vertices.mode, PrimitiveMode::Lines);
        assert_eq!(vertices.vertex_count(), 36 * 2);
    }

    #[test]
    fn test_segment_colors_survive() {
        let geometry = Geometry::from(LineSet::axes(5.0));
        let vertices = interleave(&geometry, false);
        assert_eq!(vertices.vertex_count(), 6);
        // X axis is red
        assert_eq!(&vertices.data[6..9], &[1.0f32, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_line_has_no_vertices() {
        let geometry = Geometry::from(LineSet::strip(&[]));
        assert_eq!(interleave(&geometry, false).vertex_count(), 0);
    }
}
