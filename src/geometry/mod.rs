//! Geometry container produced by cooking a node
//!
//! A `Geometry` is a point cloud plus polygon primitives that index into it,
//! with optional named per-point attributes. Once a cook stores a geometry in
//! a node's cache it is shared behind an `Arc` and never mutated again;
//! operators that need a working copy clone it.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Name of the standard point normal attribute
pub const NORMAL_ATTRIBUTE: &str = "N";

/// A polygon as an ordered list of point indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Primitive {
    pub vertices: Vec<u32>,
}

impl Primitive {
    pub fn new(vertices: Vec<u32>) -> Self {
        Self { vertices }
    }

    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Self { vertices: vec![a, b, c] }
    }

    pub fn quad(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self { vertices: vec![a, b, c, d] }
    }
}

/// Per-point attribute storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeData {
    Float(Vec<f32>),
    Vector(Vec<Vec3>),
}

impl AttributeData {
    pub fn len(&self) -> usize {
        match self {
            AttributeData::Float(v) => v.len(),
            AttributeData::Vector(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            AttributeData::Float(_) => "float",
            AttributeData::Vector(_) => "vector",
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Mesh payload flowing between nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    points: Vec<Vec3>,
    primitives: Vec<Primitive>,
    point_attributes: BTreeMap<String, AttributeData>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(points: Vec<Vec3>, primitives: Vec<Primitive>) -> Self {
        Self {
            points,
            primitives,
            point_attributes: BTreeMap::new(),
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Total number of polygon corners
    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.vertices.len()).sum()
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [Vec3] {
        &mut self.points
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn add_point(&mut self, p: Vec3) -> u32 {
        self.points.push(p);
        (self.points.len() - 1) as u32
    }

    pub fn add_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    /// Drop every primitive, keeping the points
    pub fn clear_primitives(&mut self) {
        self.primitives.clear();
    }

    pub fn point_attribute(&self, name: &str) -> Option<&AttributeData> {
        self.point_attributes.get(name)
    }

    pub fn point_attributes(&self) -> impl Iterator<Item = (&str, &AttributeData)> {
        self.point_attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Attach a per-point attribute; its length must match the point count
    pub fn set_point_attribute(&mut self, name: &str, data: AttributeData) -> Result<(), String> {
        if data.len() != self.points.len() {
            return Err(format!(
                "attribute '{}' has {} values for {} points",
                name,
                data.len(),
                self.points.len()
            ));
        }
        self.point_attributes.insert(name.to_string(), data);
        Ok(())
    }

    pub fn remove_point_attribute(&mut self, name: &str) -> Option<AttributeData> {
        self.point_attributes.remove(name)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = *self.points.first()?;
        let (min, max) = self
            .points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Bounds { min, max })
    }

    /// Average of a primitive's points
    pub fn primitive_centroid(&self, index: usize) -> Option<Vec3> {
        let prim = self.primitives.get(index)?;
        if prim.vertices.is_empty() {
            return None;
        }
        let sum: Vec3 = prim
            .vertices
            .iter()
            .filter_map(|&v| self.points.get(v as usize))
            .copied()
            .sum();
        Some(sum / prim.vertices.len() as f32)
    }

    /// Fan-triangulated corner triples of every primitive
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        let mut tris = Vec::new();
        for prim in &self.primitives {
            for i in 1..prim.vertices.len().saturating_sub(1) {
                tris.push([prim.vertices[0], prim.vertices[i], prim.vertices[i + 1]]);
            }
        }
        tris
    }

    /// Check that every primitive is a polygon referencing existing points
    pub fn validate_topology(&self) -> Result<(), String> {
        let count = self.points.len() as u32;
        for (i, prim) in self.primitives.iter().enumerate() {
            if prim.vertices.len() < 3 {
                return Err(format!("primitive {} has {} vertices", i, prim.vertices.len()));
            }
            if let Some(bad) = prim.vertices.iter().find(|&&v| v >= count) {
                return Err(format!("primitive {} references missing point {}", i, bad));
            }
        }
        for (name, data) in &self.point_attributes {
            if data.len() != self.points.len() {
                return Err(format!("attribute '{}' length mismatch", name));
            }
        }
        Ok(())
    }

    /// Apply an affine matrix to points and normals
    pub fn transform(&mut self, matrix: Mat4) {
        for p in &mut self.points {
            *p = matrix.transform_point3(*p);
        }
        if let Some(AttributeData::Vector(normals)) = self.point_attributes.get_mut(NORMAL_ATTRIBUTE) {
            let normal_matrix = matrix.inverse().transpose();
            for n in normals.iter_mut() {
                *n = normal_matrix.transform_vector3(*n).normalize_or_zero();
            }
        }
    }

    /// Append another geometry, offsetting its indices.
    ///
    /// Attributes present on only one side are padded with zeros so every
    /// attribute keeps one value per point. An attribute that is float on
    /// one side and vector on the other is an error, and `self` is left
    /// unchanged.
    pub fn append(&mut self, other: &Geometry) -> Result<(), String> {
        for (name, data) in &other.point_attributes {
            if let Some(own) = self.point_attributes.get(name) {
                if std::mem::discriminant(own) != std::mem::discriminant(data) {
                    return Err(format!(
                        "attribute '{}' is {} on one input and {} on another",
                        name,
                        own.kind_name(),
                        data.kind_name()
                    ));
                }
            }
        }

        let offset = self.points.len() as u32;
        let own_count = self.points.len();
        let other_count = other.points.len();

        let names: BTreeSet<String> = self
            .point_attributes
            .keys()
            .chain(other.point_attributes.keys())
            .cloned()
            .collect();
        for name in names {
            let merged = match (self.point_attributes.get(&name), other.point_attributes.get(&name)) {
                (Some(AttributeData::Float(a)), Some(AttributeData::Float(b))) => {
                    AttributeData::Float(a.iter().chain(b.iter()).copied().collect())
                }
                (Some(AttributeData::Vector(a)), Some(AttributeData::Vector(b))) => {
                    AttributeData::Vector(a.iter().chain(b.iter()).copied().collect())
                }
                (Some(AttributeData::Float(a)), _) => {
                    let mut v = a.clone();
                    v.resize(own_count + other_count, 0.0);
                    AttributeData::Float(v)
                }
                (Some(AttributeData::Vector(a)), _) => {
                    let mut v = a.clone();
                    v.resize(own_count + other_count, Vec3::ZERO);
                    AttributeData::Vector(v)
                }
                (None, Some(AttributeData::Float(b))) => {
                    let mut v = vec![0.0; own_count];
                    v.extend_from_slice(b);
                    AttributeData::Float(v)
                }
                (None, Some(AttributeData::Vector(b))) => {
                    let mut v = vec![Vec3::ZERO; own_count];
                    v.extend_from_slice(b);
                    AttributeData::Vector(v)
                }
                (None, None) => continue,
            };
            self.point_attributes.insert(name, merged);
        }

        self.points.extend_from_slice(&other.points);
        self.primitives.extend(other.primitives.iter().map(|p| Primitive {
            vertices: p.vertices.iter().map(|v| v + offset).collect(),
        }));
        Ok(())
    }

    /// Flip the winding of every primitive and negate normals
    pub fn reverse_winding(&mut self) {
        for prim in &mut self.primitives {
            prim.vertices.reverse();
        }
        if let Some(AttributeData::Vector(normals)) = self.point_attributes.get_mut(NORMAL_ATTRIBUTE) {
            for n in normals.iter_mut() {
                *n = -*n;
            }
        }
    }

    /// Keep only the selected primitives and the points they use
    pub fn retain_primitives(&self, keep: impl Fn(usize) -> bool) -> Geometry {
        let mut remap: Vec<Option<u32>> = vec![None; self.points.len()];
        let mut result = Geometry::new();
        let mut used = Vec::new();

        for (i, prim) in self.primitives.iter().enumerate() {
            if !keep(i) {
                continue;
            }
            let vertices = prim
                .vertices
                .iter()
                .map(|&v| {
                    *remap[v as usize].get_or_insert_with(|| {
                        used.push(v as usize);
                        result.add_point(self.points[v as usize])
                    })
                })
                .collect();
            result.add_primitive(Primitive { vertices });
        }

        for (name, data) in &self.point_attributes {
            let picked = match data {
                AttributeData::Float(v) => AttributeData::Float(used.iter().map(|&i| v[i]).collect()),
                AttributeData::Vector(v) => AttributeData::Vector(used.iter().map(|&i| v[i]).collect()),
            };
            result.point_attributes.insert(name.clone(), picked);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Geometry {
        Geometry::from_parts(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Primitive::triangle(0, 1, 2)],
        )
    }

    #[test]
    fn test_append_offsets_indices() {
        let mut a = triangle();
        a.append(&triangle()).unwrap();
        assert_eq!(a.point_count(), 6);
        assert_eq!(a.primitives()[1].vertices, vec![3, 4, 5]);
        assert!(a.validate_topology().is_ok());
    }

    #[test]
    fn test_append_pads_one_sided_attributes() {
        let mut a = triangle();
        a.set_point_attribute("mass", AttributeData::Float(vec![1.0, 2.0, 3.0])).unwrap();
        a.append(&triangle()).unwrap();
        assert_eq!(
            a.point_attribute("mass"),
            Some(&AttributeData::Float(vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0]))
        );
    }

    #[test]
    fn test_append_rejects_mismatched_attribute_kinds() {
        let mut a = triangle();
        a.set_point_attribute("N", AttributeData::Float(vec![1.0; 3])).unwrap();
        let mut b = triangle();
        b.set_point_attribute("N", AttributeData::Vector(vec![Vec3::Z; 3])).unwrap();

        let before = a.clone();
        let err = a.append(&b).unwrap_err();
        assert!(err.contains("'N'"));
        assert_eq!(a, before);
    }

    #[test]
    fn test_validate_topology_catches_bad_index() {
        let geo = Geometry::from_parts(vec![Vec3::ZERO], vec![Primitive::triangle(0, 1, 2)]);
        assert!(geo.validate_topology().is_err());
    }

    #[test]
    fn test_transform_moves_points() {
        let mut geo = triangle();
        geo.transform(Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0)));
        assert_eq!(geo.points()[1], Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_retain_primitives_compacts_points() {
        let mut geo = triangle();
        geo.append(&triangle()).unwrap();
        let kept = geo.retain_primitives(|i| i == 1);
        assert_eq!(kept.point_count(), 3);
        assert_eq!(kept.primitives()[0].vertices, vec![0, 1, 2]);
    }
}
