use glam::{Vec2, Vec3};

/// Reference to a vertex in either of the two vertex spaces of a [`MeshData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexIndex {
    /// Renderable vertex.
    Interior(u32),
    /// Vertex one ring outside the tile, used only for normals.
    Border(u32),
}

impl VertexIndex {
    pub fn is_border(self) -> bool {
        matches!(self, VertexIndex::Border(_))
    }
}

pub type Triangle = [VertexIndex; 3];

/// Tessellated tile geometry.
///
/// Interior vertices, UVs, triangles and normals form the renderable buffers;
/// border vertices and border triangles only feed the normal computation and
/// never leave this struct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    triangles: Vec<Triangle>,
    border_vertices: Vec<Vec3>,
    border_triangles: Vec<Triangle>,
    normals: Vec<Vec3>,
    vertices_per_line: usize,
}

impl MeshData {
    pub(crate) fn with_capacity(vertices_per_line: usize, with_border: bool) -> Self {
        let interior = vertices_per_line * vertices_per_line;
        let quads = vertices_per_line.saturating_sub(1).pow(2);
        let (border_vertices, border_triangles) = if with_border {
            (vertices_per_line * 4 + 4, vertices_per_line * 8)
        } else {
            (0, 0)
        };
        Self {
            vertices: vec![Vec3::ZERO; interior],
            uvs: vec![Vec2::ZERO; interior],
            triangles: Vec::with_capacity(quads * 2),
            border_vertices: vec![Vec3::ZERO; border_vertices],
            border_triangles: Vec::with_capacity(border_triangles),
            normals: Vec::new(),
            vertices_per_line,
        }
    }

    /// Place a vertex. UVs are ignored for border vertices.
    pub(crate) fn set_vertex(&mut self, index: VertexIndex, position: Vec3, uv: Vec2) {
        match index {
            VertexIndex::Interior(i) => {
                self.vertices[i as usize] = position;
                self.uvs[i as usize] = uv;
            }
            VertexIndex::Border(i) => self.border_vertices[i as usize] = position,
        }
    }

    /// Triangles touching any border vertex are kept apart from the renderable list.
    pub(crate) fn add_triangle(&mut self, a: VertexIndex, b: VertexIndex, c: VertexIndex) {
        if a.is_border() || b.is_border() || c.is_border() {
            self.border_triangles.push([a, b, c]);
        } else {
            self.triangles.push([a, b, c]);
        }
    }

    pub fn position(&self, index: VertexIndex) -> Vec3 {
        match index {
            VertexIndex::Interior(i) => self.vertices[i as usize],
            VertexIndex::Border(i) => self.border_vertices[i as usize],
        }
    }

    /// Unnormalized face normal, `cross(b - a, c - a)`.
    fn surface_normal(&self, [a, b, c]: Triangle) -> Vec3 {
        let point_a = self.position(a);
        let side_ab = self.position(b) - point_a;
        let side_ac = self.position(c) - point_a;
        side_ab.cross(side_ac)
    }

    /// Area-weighted vertex normals from `triangles` (and border triangles when
    /// `include_border` is set). Only interior vertices accumulate.
    pub fn calculate_normals(&self, include_border: bool) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        let border: &[Triangle] = if include_border { &self.border_triangles } else { &[] };
        for triangle in self.triangles.iter().chain(border) {
            let normal = self.surface_normal(*triangle);
            for vertex in triangle {
                if let VertexIndex::Interior(i) = vertex {
                    normals[*i as usize] += normal;
                }
            }
        }

        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }
        normals
    }

    /// Compute and freeze the normals. Called once by the builder.
    pub(crate) fn bake_normals(&mut self) {
        self.normals = self.calculate_normals(true);
    }

    /// Replace one baked normal. `normal` must already be unit length.
    pub(crate) fn override_normal(&mut self, vertex: usize, normal: Vec3) {
        self.normals[vertex] = normal;
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn border_vertices(&self) -> &[Vec3] {
        &self.border_vertices
    }

    pub fn border_triangles(&self) -> &[Triangle] {
        &self.border_triangles
    }

    pub fn vertices_per_line(&self) -> usize {
        self.vertices_per_line
    }

    /// Flat `u32` index buffer of the renderable triangles.
    pub fn index_buffer(&self) -> Vec<u32> {
        self.triangles
            .iter()
            .flat_map(|triangle| {
                triangle.iter().map(|vertex| match vertex {
                    VertexIndex::Interior(i) => *i,
                    // add_triangle never files a border vertex here
                    VertexIndex::Border(_) => unreachable!("border vertex in renderable triangle"),
                })
            })
            .collect()
    }
}
