//! Scene description produced by a conversion run.
//!
//! The node tree is an arena: nodes own their children by [`NodeId`] and
//! keep a non-owning parent index for ancestor walks. Everything here is
//! serializable so an emitter can work from the JSON form as well.

use std::collections::HashSet;

use an8_math::Matrix4;
use serde::Serialize;

use crate::an8::parser::WeightRecord;
use crate::animation::Animation;
use crate::geometry::Geometry;

/// Index of a node in its [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// What a scene node was created from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Object,
    Figure,
    Bone,
    Group,
    Mesh,
    Primitive,
    NamedObject,
    /// Component kind that is placed but not converted
    Unsupported,
}

/// One node of the scene tree.
#[derive(Clone, Debug, Serialize)]
pub struct SceneNode {
    /// Run-unique identifier
    pub id: String,

    /// Display name as written in the document
    pub name: String,

    pub kind: NodeKind,

    /// Transform relative to the parent node
    pub local: Matrix4,

    /// Index into [`SceneDescription::geometries`]
    pub geometry: Option<usize>,

    /// Index into [`SceneDescription::controllers`]
    pub controller: Option<usize>,

    pub parent: Option<NodeId>,

    pub children: Vec<NodeId>,
}

/// Arena of scene nodes.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, linking it under `parent`, and return its id.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        id: String,
        name: impl Into<String>,
        kind: NodeKind,
        local: Matrix4,
    ) -> NodeId {
        let node_id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            id,
            name: name.into(),
            kind,
            local,
            geometry: None,
            controller: None,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p.0].children.push(node_id),
            None => self.roots.push(node_id),
        }
        node_id
    }

    /// Panics if `id` does not belong to this graph.
    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ancestors of `id`, closest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.node(id).parent;
        std::iter::from_fn(move || {
            let next = current?;
            current = self.node(next).parent;
            Some(next)
        })
    }

    /// Node transform composed with every ancestor's, up to the root.
    pub fn bind_matrix(&self, id: NodeId) -> Matrix4 {
        self.ancestors(id)
            .fold(self.node(id).local, |acc, ancestor| {
                self.node(ancestor).local.multiply(&acc)
            })
    }

    /// Depth-first, pre-order walk over every tree.
    pub fn depth_first(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.node(id).children.iter().rev().copied());
            Some(id)
        })
    }

    /// First node in depth-first order matching `predicate`.
    pub fn find_first(&self, predicate: impl Fn(&SceneNode) -> bool) -> Option<NodeId> {
        self.depth_first().find(|id| predicate(self.node(*id)))
    }

    /// All nodes matching `predicate`, in depth-first order.
    pub fn find_all(&self, predicate: impl Fn(&SceneNode) -> bool) -> Vec<NodeId> {
        self.depth_first()
            .filter(|id| predicate(self.node(*id)))
            .collect()
    }

    /// Depth-first search below `root` (inclusive).
    pub fn find_below(
        &self,
        root: NodeId,
        predicate: impl Fn(&SceneNode) -> bool,
    ) -> Option<NodeId> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if predicate(node) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }
}

/// Hands out unique, identifier-safe names for one conversion run.
#[derive(Clone, Debug, Default)]
pub struct NameRegistry {
    used: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whitespace runs and other non-identifier characters with `_`.
    pub fn sanitize(name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        let mut in_space = false;
        for c in name.chars() {
            if c.is_whitespace() {
                if !in_space {
                    out.push('_');
                }
                in_space = true;
                continue;
            }
            in_space = false;
            out.push(if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' });
        }
        if out.is_empty() {
            out.push_str("node");
        }
        out
    }

    /// Sanitize `name` and make it unique by appending `_1`, `_2`, ...
    pub fn register(&mut self, name: &str) -> String {
        let base = Self::sanitize(name);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }
}

/// One lighting term of a material.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColorTerm {
    /// RGB, 0-1
    pub color: [f64; 3],

    pub factor: f64,

    /// Texture name as declared by a `texture` chunk
    pub texture: Option<String>,

    /// Resolved texture file path
    pub texture_file: Option<String>,

    pub blend_mode: Option<String>,

    pub alpha_mode: Option<String>,
}

impl Default for ColorTerm {
    fn default() -> Self {
        Self {
            color: [1.0; 3],
            factor: 1.0,
            texture: None,
            texture_file: None,
            blend_mode: None,
            alpha_mode: None,
        }
    }
}

/// A surface material.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Material {
    /// Run-unique identifier
    pub id: String,

    pub name: String,

    pub ambient: Option<ColorTerm>,

    pub diffuse: Option<ColorTerm>,

    pub specular: Option<ColorTerm>,

    pub emissive: Option<ColorTerm>,

    /// Opacity (0=transparent, 1=opaque)
    pub alpha: f64,

    pub phong_size: Option<f64>,

    pub brilliance: Option<f64>,
}

impl Material {
    pub fn has_textures(&self) -> bool {
        [&self.ambient, &self.diffuse, &self.specular, &self.emissive]
            .into_iter()
            .flatten()
            .any(|term| term.texture.is_some())
    }
}

/// Skin binding of one geometry to a set of joints.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Controller {
    /// Run-unique identifier
    pub id: String,

    /// Index of the skinned geometry
    pub geometry: usize,

    /// Bind matrix of the mesh node
    pub bind_shape: Matrix4,

    /// Bone nodes, in weight-index order
    pub joints: Vec<NodeId>,

    /// Inverse bind matrix of each joint
    pub inverse_bind_matrices: Vec<Matrix4>,

    /// One record per geometry point
    pub weights: Vec<WeightRecord>,
}

/// Everything a conversion run produces.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SceneDescription {
    /// Scene name (usually from filename)
    pub name: String,

    pub frames_per_second: f64,

    pub geometries: Vec<Geometry>,

    pub materials: Vec<Material>,

    pub graph: SceneGraph,

    pub controllers: Vec<Controller>,

    pub animations: Vec<Animation>,
}

impl SceneDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a geometry and return its index.
    pub fn add_geometry(&mut self, geometry: Geometry) -> usize {
        self.geometries.push(geometry);
        self.geometries.len() - 1
    }

    /// Add a controller and return its index.
    pub fn add_controller(&mut self, controller: Controller) -> usize {
        self.controllers.push(controller);
        self.controllers.len() - 1
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    /// First node with the given display name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.graph.find_first(|n| n.name == name)
    }

    pub fn geometry_of(&self, node: NodeId) -> Option<&Geometry> {
        self.graph
            .node(node)
            .geometry
            .and_then(|g| self.geometries.get(g))
    }

    pub fn total_polygon_count(&self) -> usize {
        self.geometries.iter().map(Geometry::polygon_count).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use an8_math::{DQuat, DVec3};

    fn chain() -> (SceneGraph, [NodeId; 4]) {
        let mut graph = SceneGraph::new();
        let root = graph.add_node(
            None,
            "root".into(),
            "root",
            NodeKind::Object,
            Matrix4::from_translation(DVec3::X),
        );
        let mid = graph.add_node(
            Some(root),
            "mid".into(),
            "mid",
            NodeKind::Group,
            Matrix4::from_rotation(DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2)),
        );
        let leaf = graph.add_node(
            Some(mid),
            "leaf".into(),
            "leaf",
            NodeKind::Mesh,
            Matrix4::from_translation(DVec3::Y),
        );
        let other = graph.add_node(
            Some(root),
            "other".into(),
            "leaf",
            NodeKind::Mesh,
            Matrix4::IDENTITY,
        );
        (graph, [root, mid, leaf, other])
    }

    #[test]
    fn test_links() {
        let (graph, [root, mid, leaf, other]) = chain();
        assert_eq!(graph.roots(), &[root]);
        assert_eq!(graph.node(root).children, vec![mid, other]);
        assert_eq!(graph.node(leaf).parent, Some(mid));
        assert_eq!(graph.ancestors(leaf).collect::<Vec<_>>(), vec![mid, root]);
    }

    #[test]
    fn test_bind_matrix_composes_toward_root() {
        let (graph, [root, mid, leaf, _]) = chain();
        let expected = graph
            .node(root)
            .local
            .multiply(&graph.node(mid).local)
            .multiply(&graph.node(leaf).local);
        assert!(graph.bind_matrix(leaf).approx_eq(&expected, 1e-12));
        // (0, 1, 0) rotated to (-1, 0, 0), then moved by +X
        assert!((graph.bind_matrix(leaf).translation() - DVec3::ZERO).length() < 1e-12);
        assert_eq!(graph.bind_matrix(root), graph.node(root).local);
    }

    #[test]
    fn test_find() {
        let (graph, [root, mid, leaf, other]) = chain();
        assert_eq!(graph.depth_first().collect::<Vec<_>>(), vec![root, mid, leaf, other]);
        assert_eq!(graph.find_first(|n| n.name == "leaf"), Some(leaf));
        assert_eq!(graph.find_all(|n| n.kind == NodeKind::Mesh), vec![leaf, other]);
        assert_eq!(graph.find_below(other, |n| n.name == "leaf"), Some(other));
        assert_eq!(graph.find_below(mid, |n| n.id == "other"), None);
    }

    #[test]
    fn test_name_registry() {
        let mut names = NameRegistry::new();
        assert_eq!(names.register("Big  Box"), "Big_Box");
        assert_eq!(names.register("Big Box"), "Big_Box_1");
        assert_eq!(names.register("Big\tBox"), "Big_Box_2");
        assert_eq!(names.register("a/b.c"), "a_b_c");
        assert_eq!(names.register(""), "node");
        assert_eq!(names.register(""), "node_1");
        assert!(names.contains("Big_Box_1"));
    }

    #[test]
    fn test_serializes_to_json() {
        let (graph, _) = chain();
        let scene = SceneDescription {
            name: "test".into(),
            frames_per_second: 24.0,
            graph,
            ..Default::default()
        };
        let json: serde_json::Value = serde_json::from_str(&scene.to_json().unwrap()).unwrap();
        assert_eq!(json["name"], "test");
        assert_eq!(json["graph"]["nodes"][2]["kind"], "mesh");
        assert_eq!(json["graph"]["nodes"][2]["parent"], 1);
        assert_eq!(json["graph"]["nodes"][0]["local"]["rows"][0][3], 1.0);
    }
}
