//! An8 scene conversion.
//!
//! Parses a document, then walks its objects, figures and sequences to build
//! a [`SceneDescription`].

use std::path::Path;

use thiserror::Error;

use crate::animation::sample_sequence;
use crate::config::ConvertOptions;
use crate::geometry::Geometry;
use crate::mesh::Mesh;
use crate::scene::{ColorTerm, Controller, Material, NameRegistry, NodeId, NodeKind, SceneDescription};
use crate::skin::{place_points, Skeleton, SkinBinding};
use crate::tessellate;
use an8_math::Matrix4;

use super::figure::{Figure, Sequence};
use super::object::{Component, NamedObject, Object};
use super::parser::{parse_an8, ParseError};
use super::types::{self, An8Document, Surface, SurfaceProperty};

/// Error type for scene conversion.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid mesh '{name}': {message}")]
    InvalidMesh { name: String, message: String },
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Load and convert an An8 file.
///
/// Warnings are reported through `log::warn!` only.
///
/// # Example
///
/// ```ignore
/// use an8_core::an8::load_an8;
/// use an8_core::ConvertOptions;
///
/// let scene = load_an8("walker.an8", &ConvertOptions::default())?;
/// ```
pub fn load_an8<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> LoadResult<SceneDescription> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scene".to_string());
    convert_an8_from_string(&content, &name, options, &mut |_: &str| {})
}

/// Read [`ConvertOptions`] from a JSON file.
pub fn load_options<P: AsRef<Path>>(path: P) -> LoadResult<ConvertOptions> {
    let content = std::fs::read_to_string(path)?;
    Ok(ConvertOptions::from_json(&content)?)
}

/// Convert An8 text (useful for testing).
///
/// `warn` receives every non-fatal diagnostic from parsing and conversion.
pub fn convert_an8_from_string(
    content: &str,
    name: &str,
    options: &ConvertOptions,
    warn: &mut dyn FnMut(&str),
) -> LoadResult<SceneDescription> {
    let document = parse_an8(content, options.max_depth, &mut *warn)?;
    let context = ConvertContext::new(options, warn);
    let mut builder = SceneBuilder::new(name, &document, context);

    for material in &document.materials {
        builder.process_material(material);
    }
    for object in &document.objects {
        builder.process_object(object)?;
    }
    for figure in &document.figures {
        builder.process_figure(figure)?;
    }
    for sequence in &document.sequences {
        builder.process_sequence(sequence);
    }

    Ok(builder.finish())
}

/// State shared by every stage of one conversion run.
pub struct ConvertContext<'a> {
    pub options: &'a ConvertOptions,

    /// Identifiers handed out so far
    pub names: NameRegistry,

    sink: &'a mut dyn FnMut(&str),
}

impl<'a> ConvertContext<'a> {
    pub fn new(options: &'a ConvertOptions, sink: &'a mut dyn FnMut(&str)) -> Self {
        Self {
            options,
            names: NameRegistry::new(),
            sink,
        }
    }

    /// Report a non-fatal condition.
    pub fn warn(&mut self, message: &str) {
        log::warn!("{}", message);
        (self.sink)(message);
    }
}

/// A figure's skeleton and the scene node of each of its bones.
struct Rig<'d> {
    figure: &'d str,
    skeleton: Skeleton,
    /// Parallel to `skeleton.bones`
    joints: Vec<NodeId>,
}

/// A named object bound to bones of a rig.
struct Skin<'d> {
    rig: usize,
    named: &'d NamedObject,
    binding: SkinBinding,
}

/// A component waiting to be turned into nodes.
struct Pending<'d> {
    component: &'d Component,
    parent: NodeId,
    skin: Option<usize>,
    /// Objects being instanced above this component
    chain: Vec<&'d str>,
}

/// Queue `components` under `parent` in stack order.
fn queue<'d>(
    components: &'d [Component],
    parent: NodeId,
    skin: Option<usize>,
    chain: &[&'d str],
) -> Vec<Pending<'d>> {
    components
        .iter()
        .rev()
        .map(|component| Pending {
            component,
            parent,
            skin,
            chain: chain.to_vec(),
        })
        .collect()
}

/// Internal builder for constructing a scene from a parsed document.
struct SceneBuilder<'d, 'a> {
    document: &'d An8Document,
    context: ConvertContext<'a>,
    scene: SceneDescription,
    rigs: Vec<Rig<'d>>,
    skins: Vec<Skin<'d>>,
}

impl<'d, 'a> SceneBuilder<'d, 'a> {
    fn new(name: &str, document: &'d An8Document, context: ConvertContext<'a>) -> Self {
        let mut scene = SceneDescription::new(name);
        scene.frames_per_second = context
            .options
            .resolve_frames_per_second(document.frame_rate());
        Self {
            document,
            context,
            scene,
            rigs: Vec::new(),
            skins: Vec::new(),
        }
    }

    fn add_node(&mut self, parent: Option<NodeId>, name: &str, kind: NodeKind, local: Matrix4) -> NodeId {
        let id = self.context.names.register(name);
        self.scene.graph.add_node(parent, id, name, kind, local)
    }

    /// Convert a material; the first definition of a name wins.
    fn process_material(&mut self, material: &types::Material) {
        if self.scene.material(&material.name).is_some() {
            log::debug!("Material '{}' already defined, keeping the first", material.name);
            return;
        }

        let mut converted = Material {
            id: self.context.names.register(&material.name),
            name: material.name.clone(),
            alpha: 1.0,
            ..Default::default()
        };
        if let Some(surface) = &material.surface {
            converted.diffuse = surface.diffuse.as_ref().map(|p| self.color_term(surface, p));
            converted.ambient = surface.ambient.as_ref().map(|p| self.color_term(surface, p));
            if surface.lock_ambient_diffuse {
                if let (Some(ambient), Some(diffuse)) = (&mut converted.ambient, &converted.diffuse) {
                    ambient.color = diffuse.color;
                }
            }
            converted.specular = surface.specular.as_ref().map(|p| self.color_term(surface, p));
            converted.emissive = surface.emissive.as_ref().map(|p| self.color_term(surface, p));
            converted.alpha = surface.alpha.map_or(1.0, |a| a.clamp(0, 255) as f64 / 255.0);
            converted.phong_size = surface.phong_size;
            converted.brilliance = surface.brilliance;
        }
        self.scene.materials.push(converted);
    }

    fn color_term(&self, surface: &Surface, property: &SurfaceProperty) -> ColorTerm {
        let mut term = ColorTerm::default();
        if let Some(rgb) = property.rgb.or(surface.rgb) {
            term.color = rgb.to_unit();
        }
        if let Some(factor) = property.factor {
            term.factor = factor;
        }
        if let Some(texture) = &property.texture_name {
            term.texture_file = self
                .document
                .textures
                .iter()
                .find(|t| &t.name == texture)
                .map(|t| t.file.clone());
            term.texture = Some(texture.clone());
        }
        if let Some(params) = &property.texture_params {
            term.blend_mode = params.blend_mode.clone();
            term.alpha_mode = params.alpha_mode.clone();
        }
        term
    }

    fn process_object(&mut self, object: &'d Object) -> LoadResult<()> {
        for material in &object.materials {
            self.process_material(material);
        }
        let root = self.add_node(None, &object.name, NodeKind::Object, Matrix4::IDENTITY);
        let chain = [object.name.as_str()];
        self.process_pending(queue(&object.components, root, None, &chain))
    }

    /// Turn queued components into nodes, depth-first, without recursion.
    fn process_pending(&mut self, mut stack: Vec<Pending<'d>>) -> LoadResult<()> {
        while let Some(item) = stack.pop() {
            let parent = item.parent;
            match item.component {
                Component::Mesh(chunk) => {
                    let local = chunk.base.matrix();
                    self.process_geometry(parent, &chunk.name, NodeKind::Mesh, local, chunk.to_mesh(), item.skin)?;
                }
                Component::Sphere(sphere) => {
                    let local = sphere.base.matrix();
                    let mesh = tessellate::sphere(sphere);
                    self.process_geometry(parent, &sphere.name, NodeKind::Primitive, local, mesh, item.skin)?;
                }
                Component::Cube(cube) => {
                    let local = cube.base.matrix();
                    let mesh = tessellate::cube(cube);
                    self.process_geometry(parent, &cube.name, NodeKind::Primitive, local, mesh, item.skin)?;
                }
                Component::Cylinder(cylinder) => {
                    let local = cylinder.base.matrix();
                    let mesh = tessellate::cylinder(cylinder);
                    self.process_geometry(parent, &cylinder.name, NodeKind::Primitive, local, mesh, item.skin)?;
                }
                Component::Group(group) => {
                    let node = self.add_node(Some(parent), &group.name, NodeKind::Group, group.base.matrix());
                    stack.extend(queue(&group.components, node, item.skin, &item.chain));
                }
                Component::NamedObject(named) => {
                    stack.extend(self.instance_named_object(named, parent, None, &item.chain));
                }
                Component::Unsupported(unsupported) => {
                    let message = format!(
                        "Component '{}' of type {} is not supported, placing an empty node",
                        unsupported.name,
                        unsupported.kind.chunk_name()
                    );
                    self.context.warn(&message);
                    self.add_node(Some(parent), &unsupported.name, NodeKind::Unsupported, unsupported.base.matrix());
                }
            }
        }

        Ok(())
    }

    /// Add a named-object node and queue the referenced object's
    /// components under it.
    ///
    /// `rig` is set when the named object hangs off a bone; its
    /// `weightedby` list then binds the instanced geometry to that rig.
    fn instance_named_object(
        &mut self,
        named: &'d NamedObject,
        parent: NodeId,
        rig: Option<usize>,
        chain: &[&'d str],
    ) -> Vec<Pending<'d>> {
        let node = self.add_node(Some(parent), &named.name, NodeKind::NamedObject, named.base.matrix());

        let document = self.document;
        let Some(object) = document.object(&named.object) else {
            let message = format!(
                "Named object '{}' references missing object '{}'",
                named.name, named.object
            );
            self.context.warn(&message);
            return Vec::new();
        };
        if chain.contains(&object.name.as_str()) {
            let message = format!(
                "Named object '{}' instances '{}' inside itself, skipping",
                named.name, object.name
            );
            self.context.warn(&message);
            return Vec::new();
        }

        let skin = rig.and_then(|rig| self.bind_skin(rig, named));
        let mut chain = chain.to_vec();
        chain.push(object.name.as_str());
        queue(&object.components, node, skin, &chain)
    }

    fn bind_skin(&mut self, rig: usize, named: &'d NamedObject) -> Option<usize> {
        if named.weighted_by.is_empty() {
            return None;
        }
        let binding = self.rigs[rig]
            .skeleton
            .bind(&named.weighted_by, &mut *self.context.sink);
        if binding.is_empty() {
            let message = format!("Named object '{}' has no usable weightedby bones", named.name);
            self.context.warn(&message);
            return None;
        }
        self.skins.push(Skin { rig, named, binding });
        Some(self.skins.len() - 1)
    }

    /// Add a node carrying `mesh`, synthesizing normals and skin weights
    /// as configured.
    fn process_geometry(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
        local: Matrix4,
        mut mesh: Mesh,
        skin: Option<usize>,
    ) -> LoadResult<()> {
        mesh.validate().map_err(|message| LoadError::InvalidMesh {
            name: name.to_string(),
            message,
        })?;
        let options = self.context.options;
        if options.compute_normals {
            mesh.ensure_normals(options.smoothing_angle);
        }

        let node = self.add_node(Some(parent), name, kind, local);
        if mesh.is_empty() {
            log::debug!("'{}' has no geometry", name);
            return Ok(());
        }

        let id = self.context.names.register(&format!("{}-mesh", name));
        let geometry = self.scene.add_geometry(Geometry::from_mesh(id, name, &mesh));
        self.scene.graph.node_mut(node).geometry = Some(geometry);

        if let Some(skin) = skin {
            self.process_controller(node, geometry, name, &mesh, skin);
        }
        Ok(())
    }

    fn process_controller(&mut self, node: NodeId, geometry: usize, name: &str, mesh: &Mesh, skin: usize) {
        let Skin { rig, named, ref binding } = self.skins[skin];
        let rig = &self.rigs[rig];

        let bind_shape = self.scene.graph.bind_matrix(node);
        let mut weights = match named.weight_table(name) {
            Some(table) => binding.remap_records(&table.records),
            None if self.context.options.compute_weights => {
                let points = place_points(&mesh.points, &[bind_shape]);
                binding.compute_weights(&rig.skeleton, &points)
            }
            None => {
                let message = format!("Mesh '{}' in '{}' has no weight table", name, named.name);
                self.context.warn(&message);
                return;
            }
        };
        if weights.len() != mesh.points.len() {
            let message = format!(
                "Weight table for '{}' has {} entries for {} points",
                name,
                weights.len(),
                mesh.points.len()
            );
            self.context.warn(&message);
            weights.resize(mesh.points.len(), Vec::new());
        }

        let joints: Vec<NodeId> = binding.joints.iter().map(|&bone| rig.joints[bone]).collect();
        let inverse_bind_matrices = joints
            .iter()
            .map(|&joint| self.scene.graph.bind_matrix(joint).inverse())
            .collect();
        let controller = Controller {
            id: self.context.names.register(&format!("{}-skin", name)),
            geometry,
            bind_shape,
            joints,
            inverse_bind_matrices,
            weights,
        };
        let index = self.scene.add_controller(controller);
        self.scene.graph.node_mut(node).controller = Some(index);
    }

    fn process_figure(&mut self, figure: &'d Figure) -> LoadResult<()> {
        for material in &figure.materials {
            self.process_material(material);
        }
        let root = self.add_node(None, &figure.name, NodeKind::Figure, Matrix4::IDENTITY);

        let skeleton = Skeleton::from_figure(figure);
        let mut joints: Vec<NodeId> = Vec::with_capacity(skeleton.len());
        for pose in &skeleton.bones {
            let parent = pose.parent.map_or(root, |p| joints[p]);
            joints.push(self.add_node(Some(parent), &pose.name, NodeKind::Bone, pose.local_matrix()));
        }
        self.rigs.push(Rig {
            figure: &figure.name,
            skeleton,
            joints: joints.clone(),
        });
        let rig = self.rigs.len() - 1;

        // walk_bones visits bones in the same order the skeleton lists them
        for (bone, joint) in figure.walk_bones().zip(joints) {
            for named in &bone.named_objects {
                let pending = self.instance_named_object(named, joint, Some(rig), &[]);
                self.process_pending(pending)?;
            }
        }
        Ok(())
    }

    fn process_sequence(&mut self, sequence: &'d Sequence) {
        let Some(rig) = self.rigs.iter().find(|r| r.figure == sequence.figure) else {
            let message = format!(
                "Sequence '{}' references missing figure '{}'",
                sequence.name, sequence.figure
            );
            self.context.warn(&message);
            return;
        };

        let id = self.context.names.register(&sequence.name);
        let animation = sample_sequence(
            id,
            sequence,
            &rig.skeleton,
            &rig.joints,
            self.scene.frames_per_second,
            &mut *self.context.sink,
        );
        self.scene.animations.push(animation);
    }

    /// Finish building and return the scene.
    fn finish(self) -> SceneDescription {
        let scene = self.scene;
        log::info!(
            "Converted '{}': {} nodes, {} geometries ({} polygons), {} materials, {} controllers, {} animations",
            scene.name,
            scene.graph.len(),
            scene.geometries.len(),
            scene.total_polygon_count(),
            scene.materials.len(),
            scene.controllers.len(),
            scene.animations.len()
        );
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use an8_math::DVec3;

    fn convert(text: &str) -> (SceneDescription, Vec<String>) {
        convert_with(text, &ConvertOptions::default())
    }

    fn convert_with(text: &str, options: &ConvertOptions) -> (SceneDescription, Vec<String>) {
        let mut warnings = Vec::new();
        let mut sink = |w: &str| warnings.push(w.to_string());
        let scene = convert_an8_from_string(text, "test", options, &mut sink).unwrap();
        (scene, warnings)
    }

    #[test]
    fn test_longlat_sphere_end_to_end() {
        let (scene, warnings) = convert(
            r#"object { "o" sphere { name "S" diameter 2.0 longlat { longitude 4 latitude 6 } } }"#,
        );
        assert!(warnings.is_empty());
        let node = scene.find_node("S").unwrap();
        assert_eq!(scene.graph.node(node).kind, NodeKind::Primitive);
        let geometry = scene.geometry_of(node).unwrap();
        assert_eq!(geometry.points.len(), 22);
        assert_eq!(geometry.polygon_count(), 24);
        assert!(!geometry.normals.is_empty());
    }

    #[test]
    fn test_cube_and_group_placement() {
        let (scene, _) = convert(
            r#"
object { "box object"
  group { name { "g" } base { origin { (0 5 0) } }
    cube { name { "box" } base { origin { (1 0 0) } } scale { 1 1 1 } }
  }
}
"#,
        );
        let root = scene.graph.roots()[0];
        assert_eq!(scene.graph.node(root).id, "box_object");

        let node = scene.find_node("box").unwrap();
        let geometry = scene.geometry_of(node).unwrap();
        assert_eq!(geometry.points.len(), 8);
        assert_eq!(geometry.polygon_count(), 6);

        let bind = scene.graph.bind_matrix(node);
        assert!((bind.translation() - DVec3::new(1.0, 5.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_identifiers_are_unique() {
        let (scene, _) = convert(
            r#"
object { "o"
  cube { name { "part" } }
  cube { name { "part" } }
}
"#,
        );
        let ids: Vec<&str> = scene.graph.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["o", "part", "part_1"]);
        assert_eq!(scene.geometries[0].id, "part_mesh");
        assert_eq!(scene.geometries[1].id, "part_mesh_1");
    }

    #[test]
    fn test_materials_resolve_textures() {
        let (scene, _) = convert(
            r#"
texture { "wood" file { "wood.png" } }
object { "o"
  material { "oak"
    surface {
      rgb { 255 0 0 }
      lockambdiff { }
      ambiant { factor { 0.2 } }
      diffuse { rgb { 0 255 0 } texturename { "wood" } }
      alpha { 51 }
    }
  }
  cube { name { "box" } material { "oak" } }
}
"#,
        );
        let oak = scene.material("oak").unwrap();
        let diffuse = oak.diffuse.as_ref().unwrap();
        assert_eq!(diffuse.color, [0.0, 1.0, 0.0]);
        assert_eq!(diffuse.texture_file.as_deref(), Some("wood.png"));
        let ambient = oak.ambient.as_ref().unwrap();
        assert_eq!(ambient.color, [0.0, 1.0, 0.0]);
        assert_eq!(ambient.factor, 0.2);
        assert!((oak.alpha - 0.2).abs() < 1e-12);
        assert!(oak.has_textures());

        assert_eq!(scene.geometries[0].groups[0].material.as_deref(), Some("oak"));
    }

    const FIGURE: &str = r#"
environment { framerate { 30 } }
object { "leg"
  mesh { name { "legmesh" }
    points { (0 0 0) (5 0 0) }
    faces { 3 0 0 -1 ( (0) (1) (0) ) }
  }
}
figure { "walker"
  bone { "root"
    length { 3 }
    bone { "hip"
      length { 2 }
      influence { 0 0.5 1 1 0.5 1 }
      bone { "knee"
        length { 1.5 }
        namedobject { "leg" name { "leg1" } weightedby { "hip" } weightedby { "knee" } }
      }
    }
  }
}
sequence { "walk"
  figure { "walker" }
  frames { 20 }
  jointangle { "hip" "X" track { floatkey { 15 30 "S" } } }
}
"#;

    #[test]
    fn test_figure_skin_controller() {
        let (scene, warnings) = convert(FIGURE);
        assert!(warnings.is_empty(), "{:?}", warnings);

        let hip = scene.find_node("hip").unwrap();
        let knee = scene.find_node("knee").unwrap();
        assert_eq!(scene.graph.node(knee).parent, Some(hip));

        let mesh = scene
            .graph
            .find_all(|n| n.name == "legmesh")
            .into_iter()
            .find(|&id| scene.graph.node(id).controller.is_some())
            .unwrap();
        let controller = &scene.controllers[scene.graph.node(mesh).controller.unwrap()];
        assert_eq!(controller.joints, vec![hip, knee]);

        // the knee sits at the tip of the hip
        assert!((controller.bind_shape.translation() - DVec3::new(0.0, 2.0, 0.0)).length() < 1e-12);
        let inverse_knee = controller.inverse_bind_matrices[1];
        assert!((inverse_knee.translation() - DVec3::new(0.0, -2.0, 0.0)).length() < 1e-12);

        // (0 0 0) lands inside the hip influence, (5 0 0) outside everything
        assert_eq!(controller.weights[0], vec![(0, 1.0)]);
        assert!(controller.weights[1].is_empty());
    }

    #[test]
    fn test_weight_table_with_unknown_bone() {
        let text = FIGURE.replace(
            r#"weightedby { "hip" } weightedby { "knee" }"#,
            r#"weightedby { "ghost" } weightedby { "knee" } weights { "legmesh" (1 (1 1)) (2 (0 0.5) (1 0.5)) }"#,
        );
        let (scene, warnings) = convert(&text);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ghost"));

        let controller = &scene.controllers[0];
        assert_eq!(controller.joints, vec![scene.find_node("knee").unwrap()]);
        assert_eq!(controller.weights[0], vec![(0, 1.0)]);
        assert_eq!(controller.weights[1], vec![(0, 1.0)]);
    }

    #[test]
    fn test_sequence_uses_document_frame_rate() {
        let (scene, _) = convert(FIGURE);
        assert_eq!(scene.frames_per_second, 30.0);
        let animation = &scene.animations[0];
        assert_eq!(animation.name, "walk");
        let channel = &animation.channels[0];
        assert_eq!(channel.target, scene.find_node("hip").unwrap());
        assert_eq!(channel.samples.len(), 1);
        assert_eq!(channel.samples[0].time, 0.5);

        let options = ConvertOptions {
            frames_per_second: Some(60.0),
            ..Default::default()
        };
        let (scene, _) = convert_with(FIGURE, &options);
        assert_eq!(scene.animations[0].channels[0].samples[0].time, 0.25);
    }

    #[test]
    fn test_weights_can_be_left_out() {
        let options = ConvertOptions {
            compute_weights: false,
            compute_normals: false,
            ..Default::default()
        };
        let (scene, warnings) = convert_with(FIGURE, &options);
        assert!(scene.controllers.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(scene.geometries.iter().all(|g| g.normals.is_empty()));
    }

    #[test]
    fn test_recoverable_problems_are_warnings() {
        let (scene, warnings) = convert(
            r#"
scene { "main" camera { } }
object { "o"
  namedobject { "nowhere" name { "lost" } }
  namedobject { "o" name { "self" } }
  subdivision { name { "sub" } }
}
sequence { "s" figure { "nobody" } }
"#,
        );
        assert_eq!(warnings.len(), 5, "{:?}", warnings);
        assert!(warnings[0].contains("scene"));
        assert!(warnings[1].contains("nowhere"));
        assert!(warnings[2].contains("inside itself"));
        assert!(warnings[3].contains("subdivision"));
        assert!(warnings[4].contains("nobody"));

        let sub = scene.find_node("sub").unwrap();
        assert_eq!(scene.graph.node(sub).kind, NodeKind::Unsupported);
        assert!(scene.animations.is_empty());
    }

    #[test]
    fn test_parse_errors_propagate() {
        let mut sink = |_: &str| {};
        let result = convert_an8_from_string(
            "object { \"o\" mesh { points { (0 0 0) } ",
            "broken",
            &ConvertOptions::default(),
            &mut sink,
        );
        assert!(matches!(result, Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_invalid_mesh_is_an_error() {
        let mut sink = |_: &str| {};
        let result = convert_an8_from_string(
            r#"object { "o" mesh { name { "bad" } points { (0 0 0) } faces { 3 0 0 -1 ( (0) (1) (2) ) } } }"#,
            "bad",
            &ConvertOptions::default(),
            &mut sink,
        );
        assert!(matches!(result, Err(LoadError::InvalidMesh { .. })));
    }

    #[test]
    fn test_unflagged_face_needs_a_valid_flat_normal() {
        let mut sink = |_: &str| {};
        let result = convert_an8_from_string(
            r#"object { "o" mesh { name { "tri" }
  points { (0 0 0) (1 0 0) (0 1 0) }
  normals { (0 1 0) }
  faces { 3 0 0 5 ( (0) (1) (2) ) }
} }"#,
            "tri",
            &ConvertOptions::default(),
            &mut sink,
        );
        assert!(matches!(result, Err(LoadError::InvalidMesh { .. })));
    }

    #[test]
    fn test_huge_face_count_is_a_parse_error() {
        let mut sink = |_: &str| {};
        let result = convert_an8_from_string(
            r#"object { "o" mesh { name { "big" } points { (0 0 0) } faces { 999999999999999999 0 0 -1 ( (0) ) } } }"#,
            "big",
            &ConvertOptions::default(),
            &mut sink,
        );
        assert!(matches!(result, Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_scene_serializes() {
        let (scene, _) = convert(FIGURE);
        let json = scene.to_json().unwrap();
        assert!(json.contains("\"walker\""));
        assert!(json.contains("LINEAR"));
    }
}
