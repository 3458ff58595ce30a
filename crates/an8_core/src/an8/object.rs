//! Object and component chunks.

use an8_math::{DVec2, DVec3};

use super::parser::{ChunkParser, ParseResult, WeightRecord};
use super::schema::{Chunk, Field, ValueKind};
use super::types::{Base, FloatTriple, IntTriple, Material};
use crate::mesh::{Face, Mesh};

/// `object { "name" material* component* }`
#[derive(Clone, Debug, Default)]
pub struct Object {
    pub name: String,
    pub materials: Vec<Material>,
    pub components: Vec<Component>,
}

/// `group { name base pivot component* }`
#[derive(Clone, Debug, Default)]
pub struct Group {
    pub name: String,
    pub base: Base,
    pub pivot: Base,
    pub components: Vec<Component>,
}

/// Anything that can appear inside an object or group.
#[derive(Clone, Debug)]
pub enum Component {
    Mesh(MeshChunk),
    Sphere(Sphere),
    Cube(Cube),
    Cylinder(Cylinder),
    Group(Group),
    NamedObject(NamedObject),
    Unsupported(Unsupported),
}

impl Component {
    pub fn name(&self) -> &str {
        match self {
            Component::Mesh(c) => &c.name,
            Component::Sphere(c) => &c.name,
            Component::Cube(c) => &c.name,
            Component::Cylinder(c) => &c.name,
            Component::Group(c) => &c.name,
            Component::NamedObject(c) => &c.name,
            Component::Unsupported(c) => &c.name,
        }
    }

    pub fn base(&self) -> Base {
        match self {
            Component::Mesh(c) => c.base,
            Component::Sphere(c) => c.base,
            Component::Cube(c) => c.base,
            Component::Cylinder(c) => c.base,
            Component::Group(c) => c.base,
            Component::NamedObject(c) => c.base,
            Component::Unsupported(c) => c.base,
        }
    }
}

trait HasComponents {
    fn components_mut(&mut self) -> &mut Vec<Component>;
}

impl HasComponents for Object {
    fn components_mut(&mut self) -> &mut Vec<Component> {
        &mut self.components
    }
}

impl HasComponents for Group {
    fn components_mut(&mut self) -> &mut Vec<Component> {
        &mut self.components
    }
}

fn push_mesh<T: HasComponents>(t: &mut T, p: &mut ChunkParser<'_>) -> ParseResult<()> {
    let mesh = p.chunk()?;
    t.components_mut().push(Component::Mesh(mesh));
    Ok(())
}

fn push_sphere<T: HasComponents>(t: &mut T, p: &mut ChunkParser<'_>) -> ParseResult<()> {
    let sphere = p.chunk()?;
    t.components_mut().push(Component::Sphere(sphere));
    Ok(())
}

fn push_cube<T: HasComponents>(t: &mut T, p: &mut ChunkParser<'_>) -> ParseResult<()> {
    let cube = p.chunk()?;
    t.components_mut().push(Component::Cube(cube));
    Ok(())
}

fn push_cylinder<T: HasComponents>(t: &mut T, p: &mut ChunkParser<'_>) -> ParseResult<()> {
    let cylinder = p.chunk()?;
    t.components_mut().push(Component::Cylinder(cylinder));
    Ok(())
}

fn push_group<T: HasComponents>(t: &mut T, p: &mut ChunkParser<'_>) -> ParseResult<()> {
    let group = p.chunk()?;
    t.components_mut().push(Component::Group(group));
    Ok(())
}

fn push_named_object<T: HasComponents>(t: &mut T, p: &mut ChunkParser<'_>) -> ParseResult<()> {
    let named = p.chunk()?;
    t.components_mut().push(Component::NamedObject(named));
    Ok(())
}

fn push_unsupported<T: HasComponents, const KIND: u8>(
    t: &mut T,
    p: &mut ChunkParser<'_>,
) -> ParseResult<()> {
    let mut unsupported: Unsupported = p.chunk()?;
    unsupported.kind = UnsupportedKind::from_tag(KIND);
    t.components_mut().push(Component::Unsupported(unsupported));
    Ok(())
}

const SUBDIVISION: u8 = 0;
const PATHCOM: u8 = 1;
const TEXTCOM: u8 = 2;
const MODIFIER: u8 = 3;
const IMAGE: u8 = 4;

impl Chunk for Object {
    const NAME: &'static str = "object";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("name", ValueKind::Str, |o, v| o.name = v.into_string()),
        Field::nested("material", |o, p| {
            o.materials.push(p.chunk()?);
            Ok(())
        }),
        Field::nested("mesh", push_mesh::<Self>),
        Field::nested("sphere", push_sphere::<Self>),
        Field::nested("cube", push_cube::<Self>),
        Field::nested("cylinder", push_cylinder::<Self>),
        Field::nested("group", push_group::<Self>),
        Field::nested("namedobject", push_named_object::<Self>),
        Field::nested("subdivision", push_unsupported::<Self, { SUBDIVISION }>),
        Field::nested("pathcom", push_unsupported::<Self, { PATHCOM }>),
        Field::nested("textcom", push_unsupported::<Self, { TEXTCOM }>),
        Field::nested("modifier", push_unsupported::<Self, { MODIFIER }>),
        Field::nested("image", push_unsupported::<Self, { IMAGE }>),
    ];
}

impl Chunk for Group {
    const NAME: &'static str = "group";
    const FIELDS: &'static [Field<Self>] = &[
        Field::wrapped("name", ValueKind::Str, |g, v| g.name = v.into_string()),
        Field::nested("base", |g, p| {
            g.base = p.chunk()?;
            Ok(())
        }),
        Field::nested("pivot", |g, p| {
            g.pivot = p.chunk()?;
            Ok(())
        }),
        Field::nested("mesh", push_mesh::<Self>),
        Field::nested("sphere", push_sphere::<Self>),
        Field::nested("cube", push_cube::<Self>),
        Field::nested("cylinder", push_cylinder::<Self>),
        Field::nested("group", push_group::<Self>),
        Field::nested("namedobject", push_named_object::<Self>),
        Field::nested("subdivision", push_unsupported::<Self, { SUBDIVISION }>),
        Field::nested("pathcom", push_unsupported::<Self, { PATHCOM }>),
        Field::nested("textcom", push_unsupported::<Self, { TEXTCOM }>),
        Field::nested("modifier", push_unsupported::<Self, { MODIFIER }>),
        Field::nested("image", push_unsupported::<Self, { IMAGE }>),
    ];
}

/// `mesh { ... }` with explicit geometry.
#[derive(Clone, Debug, Default)]
pub struct MeshChunk {
    pub name: String,
    pub base: Base,
    pub pivot: Base,
    pub material: Option<String>,
    pub smooth_angle: Option<f64>,
    pub material_list: Vec<String>,
    pub points: Vec<DVec3>,
    pub normals: Vec<DVec3>,
    pub texcoords: Vec<DVec2>,
    pub faces: Vec<Face>,
}

impl Chunk for MeshChunk {
    const NAME: &'static str = "mesh";
    const FIELDS: &'static [Field<Self>] = &[
        Field::wrapped("name", ValueKind::Str, |m, v| m.name = v.into_string()),
        Field::nested("base", |m, p| {
            m.base = p.chunk()?;
            Ok(())
        }),
        Field::nested("pivot", |m, p| {
            m.pivot = p.chunk()?;
            Ok(())
        }),
        Field::wrapped("material", ValueKind::Str, |m, v| {
            m.material = Some(v.into_string())
        }),
        Field::wrapped("smoothangle", ValueKind::Float, |m, v| {
            m.smooth_angle = Some(v.as_float())
        }),
        Field::nested("materiallist", |m, p| {
            let list: MaterialList = p.chunk()?;
            m.material_list = list.names;
            Ok(())
        }),
        Field::wrapped_list("points", ValueKind::Point, |m, v| m.points.push(v.as_point())),
        Field::wrapped_list("normals", ValueKind::Point, |m, v| m.normals.push(v.as_point())),
        Field::wrapped_list("texcoords", ValueKind::TexCoord, |m, v| {
            m.texcoords.push(v.as_texcoord())
        }),
        Field::custom("faces", |m, p| {
            m.faces.extend(p.face_records()?);
            Ok(())
        }),
        Field::ignored("edges"),
    ];
}

impl MeshChunk {
    /// Geometry of this chunk as a [`Mesh`].
    ///
    /// The material list falls back to the single `material` name.
    pub fn to_mesh(&self) -> Mesh {
        let materials = if self.material_list.is_empty() {
            self.material.iter().cloned().collect()
        } else {
            self.material_list.clone()
        };
        Mesh {
            points: self.points.clone(),
            normals: (!self.normals.is_empty()).then(|| self.normals.clone()),
            texcoords: (!self.texcoords.is_empty()).then(|| self.texcoords.clone()),
            faces: self.faces.clone(),
            materials,
            smooth_angle: self.smooth_angle,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct MaterialList {
    names: Vec<String>,
}

impl Chunk for MaterialList {
    const NAME: &'static str = "materiallist";
    const FIELDS: &'static [Field<Self>] = &[Field::wrapped(
        "materialname",
        ValueKind::Str,
        |l, v| l.names.push(v.into_string()),
    )];
}

/// `longlat { longitude latitude }`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LongLat {
    pub longitude: i64,
    pub latitude: i64,
}

impl Default for LongLat {
    fn default() -> Self {
        Self {
            longitude: 12,
            latitude: 8,
        }
    }
}

impl Chunk for LongLat {
    const NAME: &'static str = "longlat";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("longitude", ValueKind::Int, |l, v| l.longitude = v.as_int()),
        Field::positional("latitude", ValueKind::Int, |l, v| l.latitude = v.as_int()),
    ];
}

/// How a sphere is tessellated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SphereKind {
    LongLat(LongLat),
    Geodesic(i64),
}

#[derive(Clone, Debug)]
pub struct Sphere {
    pub name: String,
    pub base: Base,
    pub pivot: Base,
    pub material: Option<String>,
    pub diameter: f64,
    pub kind: SphereKind,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            name: String::new(),
            base: Base::default(),
            pivot: Base::default(),
            material: None,
            diameter: 10.0,
            kind: SphereKind::LongLat(LongLat::default()),
        }
    }
}

impl Chunk for Sphere {
    const NAME: &'static str = "sphere";
    const FIELDS: &'static [Field<Self>] = &[
        Field::wrapped("name", ValueKind::Str, |s, v| s.name = v.into_string()),
        Field::nested("base", |s, p| {
            s.base = p.chunk()?;
            Ok(())
        }),
        Field::nested("pivot", |s, p| {
            s.pivot = p.chunk()?;
            Ok(())
        }),
        Field::wrapped("material", ValueKind::Str, |s, v| {
            s.material = Some(v.into_string())
        }),
        Field::wrapped("diameter", ValueKind::Float, |s, v| s.diameter = v.as_float()),
        Field::nested("longlat", |s, p| {
            s.kind = SphereKind::LongLat(p.chunk()?);
            Ok(())
        }),
        Field::wrapped("geodesic", ValueKind::Int, |s, v| {
            s.kind = SphereKind::Geodesic(v.as_int())
        }),
    ];
}

#[derive(Clone, Debug)]
pub struct Cube {
    pub name: String,
    pub base: Base,
    pub pivot: Base,
    pub material: Option<String>,
    pub scale: DVec3,
    pub divisions: [i64; 3],
}

impl Default for Cube {
    fn default() -> Self {
        Self {
            name: String::new(),
            base: Base::default(),
            pivot: Base::default(),
            material: None,
            scale: DVec3::ONE,
            divisions: [1, 1, 1],
        }
    }
}

impl Chunk for Cube {
    const NAME: &'static str = "cube";
    const FIELDS: &'static [Field<Self>] = &[
        Field::wrapped("name", ValueKind::Str, |c, v| c.name = v.into_string()),
        Field::nested("base", |c, p| {
            c.base = p.chunk()?;
            Ok(())
        }),
        Field::nested("pivot", |c, p| {
            c.pivot = p.chunk()?;
            Ok(())
        }),
        Field::wrapped("material", ValueKind::Str, |c, v| {
            c.material = Some(v.into_string())
        }),
        Field::nested("scale", |c, p| {
            let scale: FloatTriple = p.chunk()?;
            c.scale = scale.0;
            Ok(())
        }),
        Field::nested("divisions", |c, p| {
            let divisions: IntTriple = p.chunk()?;
            c.divisions = divisions.0;
            Ok(())
        }),
    ];
}

#[derive(Clone, Debug)]
pub struct Cylinder {
    pub name: String,
    pub base: Base,
    pub pivot: Base,
    pub material: Option<String>,
    pub length: f64,
    pub diameter: f64,
    /// Equal to `diameter` unless given
    pub top_diameter: Option<f64>,
    pub longlat: LongLat,
    pub cap_start: bool,
    pub cap_end: bool,
}

impl Default for Cylinder {
    fn default() -> Self {
        Self {
            name: String::new(),
            base: Base::default(),
            pivot: Base::default(),
            material: None,
            length: 10.0,
            diameter: 10.0,
            top_diameter: None,
            longlat: LongLat::default(),
            cap_start: false,
            cap_end: false,
        }
    }
}

impl Chunk for Cylinder {
    const NAME: &'static str = "cylinder";
    const FIELDS: &'static [Field<Self>] = &[
        Field::wrapped("name", ValueKind::Str, |c, v| c.name = v.into_string()),
        Field::nested("base", |c, p| {
            c.base = p.chunk()?;
            Ok(())
        }),
        Field::nested("pivot", |c, p| {
            c.pivot = p.chunk()?;
            Ok(())
        }),
        Field::wrapped("material", ValueKind::Str, |c, v| {
            c.material = Some(v.into_string())
        }),
        Field::wrapped("length", ValueKind::Float, |c, v| c.length = v.as_float()),
        Field::wrapped("diameter", ValueKind::Float, |c, v| c.diameter = v.as_float()),
        Field::wrapped("topdiameter", ValueKind::Float, |c, v| {
            c.top_diameter = Some(v.as_float())
        }),
        Field::nested("longlat", |c, p| {
            c.longlat = p.chunk()?;
            Ok(())
        }),
        Field::marker("capstart", |c| c.cap_start = true),
        Field::marker("capend", |c| c.cap_end = true),
        Field::marker("startcap", |c| c.cap_start = true),
        Field::marker("endcap", |c| c.cap_end = true),
    ];
}

impl Cylinder {
    pub fn top_diameter(&self) -> f64 {
        self.top_diameter.unwrap_or(self.diameter)
    }
}

/// Weight table for one mesh of a named object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightTable {
    pub mesh: String,
    /// One record per mesh point; bone indices refer to `weighted_by`
    pub records: Vec<WeightRecord>,
}

/// `namedobject { "object" name base ... weightedby* weights* }`
///
/// An instance of another object, optionally attached to a bone.
#[derive(Clone, Debug, Default)]
pub struct NamedObject {
    pub object: String,
    pub name: String,
    pub base: Base,
    pub pivot: Base,
    pub material: Option<String>,
    pub weighted_by: Vec<String>,
    pub weights: Vec<WeightTable>,
}

impl Chunk for NamedObject {
    const NAME: &'static str = "namedobject";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("object", ValueKind::Str, |n, v| n.object = v.into_string()),
        Field::wrapped("name", ValueKind::Str, |n, v| n.name = v.into_string()),
        Field::nested("base", |n, p| {
            n.base = p.chunk()?;
            Ok(())
        }),
        Field::nested("pivot", |n, p| {
            n.pivot = p.chunk()?;
            Ok(())
        }),
        Field::wrapped("material", ValueKind::Str, |n, v| {
            n.material = Some(v.into_string())
        }),
        Field::wrapped("weightedby", ValueKind::Str, |n, v| {
            n.weighted_by.push(v.into_string())
        }),
        Field::custom("weights", |n, p| {
            let mesh = p.reader().read_string()?;
            let records = p.weight_records()?;
            n.weights.push(WeightTable { mesh, records });
            Ok(())
        }),
    ];

    fn finish(&mut self) {
        if self.name.is_empty() {
            self.name = self.object.clone();
        }
    }
}

impl NamedObject {
    pub fn weight_table(&self, mesh: &str) -> Option<&WeightTable> {
        self.weights.iter().find(|w| w.mesh == mesh)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnsupportedKind {
    #[default]
    Subdivision,
    PathCom,
    TextCom,
    Modifier,
    Image,
}

impl UnsupportedKind {
    fn from_tag(tag: u8) -> Self {
        match tag {
            PATHCOM => UnsupportedKind::PathCom,
            TEXTCOM => UnsupportedKind::TextCom,
            MODIFIER => UnsupportedKind::Modifier,
            IMAGE => UnsupportedKind::Image,
            _ => UnsupportedKind::Subdivision,
        }
    }

    pub fn chunk_name(self) -> &'static str {
        match self {
            UnsupportedKind::Subdivision => "subdivision",
            UnsupportedKind::PathCom => "pathcom",
            UnsupportedKind::TextCom => "textcom",
            UnsupportedKind::Modifier => "modifier",
            UnsupportedKind::Image => "image",
        }
    }
}

/// A component kind that is placed in the scene but not converted.
///
/// Only its name and placement are read; everything else inside is skipped
/// without per-chunk warnings.
#[derive(Clone, Debug, Default)]
pub struct Unsupported {
    pub kind: UnsupportedKind,
    pub name: String,
    pub base: Base,
}

impl Chunk for Unsupported {
    const NAME: &'static str = "unsupported component";
    const QUIET: bool = true;
    const FIELDS: &'static [Field<Self>] = &[
        Field::wrapped("name", ValueKind::Str, |u, v| u.name = v.into_string()),
        Field::nested("base", |u, p| {
            u.base = p.chunk()?;
            Ok(())
        }),
    ];
}
