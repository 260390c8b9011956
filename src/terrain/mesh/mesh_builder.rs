//! Height grid → triangle mesh.
//!
//! Tiles are built from a grid with one extra ring of samples on every side.
//! That ring becomes border geometry: it contributes to the normals of the
//! tile's outermost vertices and is then dropped, so neighbouring tiles shade
//! identically along their shared edge. At coarser LODs the outermost vertices
//! are shaded from the full-resolution grid instead, which the ring also covers.

use glam::{Vec2, Vec3};

use crate::terrain::grid::HeightGrid;
use crate::terrain::mesh::height_curve::HeightCurve;
use crate::terrain::mesh::mesh_data::{MeshData, VertexIndex};

/// Step between sampled grid cells at a given LOD.
pub fn simplification_increment(lod: u32) -> usize {
    if lod == 0 { 1 } else { lod as usize * 2 }
}

/// Renderable vertices along one tile edge for a logical edge size and LOD.
pub fn vertices_per_line(edge: usize, lod: u32) -> usize {
    (edge - 1) / simplification_increment(lod) + 1
}

/// Whether a tile with this logical edge can be simplified to `lod` without
/// dropping the far edge.
pub fn supports_lod(edge: usize, lod: u32) -> bool {
    edge >= 2 && (edge - 1) % simplification_increment(lod) == 0
}

/// Build a tile mesh from a bordered height grid (`edge + 2` cells wide).
pub fn build(heights: &HeightGrid, height_multiplier: f32, curve: &dyn HeightCurve, lod: u32) -> MeshData {
    let bordered_size = heights.width();
    assert_eq!(bordered_size, heights.height(), "tile height grids are square");
    assert!(bordered_size >= 3, "bordered grid needs at least one interior cell");

    let increment = simplification_increment(lod);
    let edge = bordered_size - 2;
    debug_assert!(
        edge == 1 || supports_lod(edge, lod),
        "edge {edge} cannot be simplified with increment {increment}"
    );
    let vertices_per_line = vertices_per_line(edge, lod);
    let span = (edge - 1) as f32;

    let top_left_x = span / -2.0;
    let top_left_z = span / 2.0;

    // Grid columns/rows that get a vertex: the border ring plus every
    // `increment`-th interior cell.
    let mut samples = Vec::with_capacity(vertices_per_line + 2);
    samples.push(0);
    samples.extend((0..vertices_per_line).map(|i| 1 + i * increment));
    samples.push(bordered_size - 1);
    let last = samples.len() - 1;

    let mut index_map = Vec::with_capacity(samples.len() * samples.len());
    let mut mesh_vertex_index = 0u32;
    let mut border_vertex_index = 0u32;
    for j in 0..=last {
        for i in 0..=last {
            let is_border_vertex = i == 0 || j == 0 || i == last || j == last;
            if is_border_vertex {
                index_map.push(VertexIndex::Border(border_vertex_index));
                border_vertex_index += 1;
            } else {
                index_map.push(VertexIndex::Interior(mesh_vertex_index));
                mesh_vertex_index += 1;
            }
        }
    }
    let at = |i: usize, j: usize| index_map[j * samples.len() + i];

    let mut mesh = MeshData::with_capacity(vertices_per_line, true);

    for j in 0..=last {
        for i in 0..=last {
            let (gx, gy) = (samples[i], samples[j]);
            let local_x = gx as f32 - 1.0;
            let local_y = gy as f32 - 1.0;

            let percent = if span > 0.0 { Vec2::new(local_x / span, local_y / span) } else { Vec2::ZERO };
            let height = curve.evaluate(heights.at(gx, gy)) * height_multiplier;
            let position = Vec3::new(top_left_x + local_x, height, top_left_z - local_y);

            mesh.set_vertex(at(i, j), position, percent);

            if i < last && j < last {
                let a = at(i, j);
                let b = at(i + 1, j);
                let c = at(i, j + 1);
                let d = at(i + 1, j + 1);
                mesh.add_triangle(a, d, c);
                mesh.add_triangle(d, a, b);
            }
        }
    }

    mesh.bake_normals();

    // Edge vertices are reshaded from the full-resolution cells around them,
    // so two tiles sharing an edge sum the same triangles at every LOD.
    let grid_position = |gx: usize, gy: usize| {
        let height = curve.evaluate(heights.at(gx, gy)) * height_multiplier;
        Vec3::new(top_left_x + (gx as f32 - 1.0), height, top_left_z - (gy as f32 - 1.0))
    };
    for j in 1..last {
        for i in 1..last {
            let on_edge = i == 1 || j == 1 || i == last - 1 || j == last - 1;
            if on_edge {
                let normal = full_resolution_normal(&grid_position, samples[i], samples[j]);
                mesh.override_normal((j - 1) * vertices_per_line + (i - 1), normal);
            }
        }
    }
    mesh
}

/// Normal of grid point `(gx, gy)` from the 1-cell triangles of the four cells
/// it is a corner of, split the same way `build` splits its quads.
fn full_resolution_normal(position: &dyn Fn(usize, usize) -> Vec3, gx: usize, gy: usize) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (cx, cy) in [(gx - 1, gy - 1), (gx, gy - 1), (gx - 1, gy), (gx, gy)] {
        let a = (cx, cy);
        let b = (cx + 1, cy);
        let c = (cx, cy + 1);
        let d = (cx + 1, cy + 1);
        for triangle in [[a, d, c], [d, a, b]] {
            if !triangle.contains(&(gx, gy)) {
                continue;
            }
            let [p, q, r] = triangle.map(|(x, y)| position(x, y));
            normal += (q - p).cross(r - p);
        }
    }
    normal.normalize_or_zero()
}

/// Border-free mesh over the whole grid, for single-map previews.
pub fn build_preview(heights: &HeightGrid, height_multiplier: f32, curve: &dyn HeightCurve, lod: u32) -> MeshData {
    let size = heights.width();
    assert_eq!(size, heights.height(), "preview height grids are square");
    assert!(size >= 1, "preview grid is empty");

    let increment = simplification_increment(lod);
    let vertices_per_line = (size - 1) / increment + 1;
    let span = (size - 1) as f32;
    let top_left_x = span / -2.0;
    let top_left_z = span / 2.0;

    let mut mesh = MeshData::with_capacity(vertices_per_line, false);
    let line = vertices_per_line as u32;
    let mut vertex_index = 0u32;

    for j in 0..vertices_per_line {
        for i in 0..vertices_per_line {
            let (x, y) = (i * increment, j * increment);
            let percent = if span > 0.0 { Vec2::new(x as f32 / span, y as f32 / span) } else { Vec2::ZERO };
            let height = curve.evaluate(heights.at(x, y)) * height_multiplier;
            let position = Vec3::new(top_left_x + x as f32, height, top_left_z - y as f32);
            mesh.set_vertex(VertexIndex::Interior(vertex_index), position, percent);

            if i + 1 < vertices_per_line && j + 1 < vertices_per_line {
                let a = VertexIndex::Interior(vertex_index);
                let b = VertexIndex::Interior(vertex_index + 1);
                let c = VertexIndex::Interior(vertex_index + line);
                let d = VertexIndex::Interior(vertex_index + line + 1);
                mesh.add_triangle(a, d, c);
                mesh.add_triangle(d, a, b);
            }
            vertex_index += 1;
        }
    }

    mesh.bake_normals();
    mesh
}
