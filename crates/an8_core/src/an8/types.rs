//! Top-level An8 chunk types.
//!
//! These types mirror the document as written, before any conversion to the
//! scene model. Each implements [`Chunk`] with a static field table.

use an8_math::{DQuat, DVec3, Matrix4};

use super::figure::{Figure, Sequence};
use super::object::Object;
use super::schema::{Chunk, Field, ValueKind};

/// A parsed An8 document.
#[derive(Clone, Debug, Default)]
pub struct An8Document {
    pub header: Option<Header>,
    pub description: Vec<String>,
    pub environment: Option<Environment>,
    pub textures: Vec<Texture>,
    /// Materials declared at file level
    pub materials: Vec<Material>,
    pub objects: Vec<Object>,
    pub figures: Vec<Figure>,
    pub sequences: Vec<Sequence>,
}

impl Chunk for An8Document {
    const NAME: &'static str = "document";
    const FIELDS: &'static [Field<Self>] = &[
        Field::nested("header", |d, p| {
            d.header = Some(p.chunk()?);
            Ok(())
        }),
        Field::nested("description", |d, p| {
            let description: Description = p.chunk()?;
            d.description = description.lines;
            Ok(())
        }),
        Field::nested("environment", |d, p| {
            d.environment = Some(p.chunk()?);
            Ok(())
        }),
        Field::nested("texture", |d, p| {
            d.textures.push(p.chunk()?);
            Ok(())
        }),
        Field::nested("material", |d, p| {
            d.materials.push(p.chunk()?);
            Ok(())
        }),
        Field::nested("object", |d, p| {
            d.objects.push(p.chunk()?);
            Ok(())
        }),
        Field::nested("figure", |d, p| {
            d.figures.push(p.chunk()?);
            Ok(())
        }),
        Field::nested("sequence", |d, p| {
            d.sequences.push(p.chunk()?);
            Ok(())
        }),
    ];
}

impl An8Document {
    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn figure(&self, name: &str) -> Option<&Figure> {
        self.figures.iter().find(|f| f.name == name)
    }

    /// Playback rate declared by the `environment` chunk.
    pub fn frame_rate(&self) -> Option<f64> {
        self.environment.as_ref().and_then(|e| e.framerate)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Header {
    pub version: String,
    pub build: String,
}

impl Chunk for Header {
    const NAME: &'static str = "header";
    const FIELDS: &'static [Field<Self>] = &[
        Field::wrapped("version", ValueKind::Str, |h, v| h.version = v.into_string()),
        Field::wrapped("build", ValueKind::Str, |h, v| h.build = v.into_string()),
    ];
}

#[derive(Clone, Debug, Default)]
struct Description {
    lines: Vec<String>,
}

impl Chunk for Description {
    const NAME: &'static str = "description";
    const FIELDS: &'static [Field<Self>] = &[Field::positional_list(
        "text",
        ValueKind::Str,
        |d, v| d.lines.push(v.into_string()),
    )];
}

#[derive(Clone, Debug, Default)]
pub struct Environment {
    pub framerate: Option<f64>,
    pub limit_playback: bool,
}

impl Chunk for Environment {
    const NAME: &'static str = "environment";
    const FIELDS: &'static [Field<Self>] = &[
        Field::wrapped("framerate", ValueKind::Float, |e, v| e.framerate = Some(v.as_float())),
        Field::marker("limitplayback", |e| e.limit_playback = true),
        Field::ignored("grid"),
        Field::ignored("lighting"),
        Field::ignored("light"),
        Field::ignored("film"),
    ];
}

#[derive(Clone, Debug, Default)]
pub struct Texture {
    pub name: String,
    pub file: String,
}

impl Chunk for Texture {
    const NAME: &'static str = "texture";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("name", ValueKind::Str, |t, v| t.name = v.into_string()),
        Field::wrapped("file", ValueKind::Str, |t, v| t.file = v.into_string()),
        Field::ignored("invert"),
        Field::ignored("cubemap"),
    ];
}

/// `base` and `pivot` chunks: a rigid placement.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Base {
    pub origin: DVec3,
    pub orientation: DQuat,
}

impl Chunk for Base {
    const NAME: &'static str = "base";
    const FIELDS: &'static [Field<Self>] = &[
        Field::wrapped("origin", ValueKind::Point, |b, v| b.origin = v.as_point()),
        Field::wrapped("orientation", ValueKind::Quat, |b, v| {
            b.orientation = v.as_quat()
        }),
    ];

    fn finish(&mut self) {
        self.orientation = self.orientation.normalize();
    }
}

impl Base {
    pub fn matrix(&self) -> Matrix4 {
        Matrix4::from_translation_rotation(self.origin, self.orientation)
    }
}

/// `rgb { r g b }` with 0-255 components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: i64,
    pub g: i64,
    pub b: i64,
}

impl Chunk for Rgb {
    const NAME: &'static str = "rgb";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("r", ValueKind::Int, |c, v| c.r = v.as_int()),
        Field::positional("g", ValueKind::Int, |c, v| c.g = v.as_int()),
        Field::positional("b", ValueKind::Int, |c, v| c.b = v.as_int()),
    ];
}

impl Rgb {
    /// Components scaled to 0..1.
    pub fn to_unit(self) -> [f64; 3] {
        [self.r, self.g, self.b].map(|c| c.clamp(0, 255) as f64 / 255.0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Material {
    pub name: String,
    pub surface: Option<Surface>,
    pub back_surface: Option<Surface>,
}

impl Chunk for Material {
    const NAME: &'static str = "material";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("name", ValueKind::Str, |m, v| m.name = v.into_string()),
        Field::nested("surface", |m, p| {
            m.surface = Some(p.chunk()?);
            Ok(())
        }),
        Field::nested("backsurface", |m, p| {
            m.back_surface = Some(p.chunk()?);
            Ok(())
        }),
    ];
}

#[derive(Clone, Debug, Default)]
pub struct Surface {
    pub rgb: Option<Rgb>,
    pub lock_ambient_diffuse: bool,
    pub ambient: Option<SurfaceProperty>,
    pub diffuse: Option<SurfaceProperty>,
    pub specular: Option<SurfaceProperty>,
    pub emissive: Option<SurfaceProperty>,
    /// 0-255, opaque when absent
    pub alpha: Option<i64>,
    pub brilliance: Option<f64>,
    pub phong_size: Option<f64>,
}

impl Chunk for Surface {
    const NAME: &'static str = "surface";
    const FIELDS: &'static [Field<Self>] = &[
        Field::nested("rgb", |s, p| {
            s.rgb = Some(p.chunk()?);
            Ok(())
        }),
        Field::marker("lockambdiff", |s| s.lock_ambient_diffuse = true),
        Field::nested("ambiant", |s, p| {
            s.ambient = Some(p.chunk()?);
            Ok(())
        }),
        Field::nested("ambient", |s, p| {
            s.ambient = Some(p.chunk()?);
            Ok(())
        }),
        Field::nested("diffuse", |s, p| {
            s.diffuse = Some(p.chunk()?);
            Ok(())
        }),
        Field::nested("specular", |s, p| {
            s.specular = Some(p.chunk()?);
            Ok(())
        }),
        Field::nested("emissive", |s, p| {
            s.emissive = Some(p.chunk()?);
            Ok(())
        }),
        Field::wrapped("alpha", ValueKind::Int, |s, v| s.alpha = Some(v.as_int())),
        Field::wrapped("brilliance", ValueKind::Float, |s, v| {
            s.brilliance = Some(v.as_float())
        }),
        Field::wrapped("phongsize", ValueKind::Float, |s, v| {
            s.phong_size = Some(v.as_float())
        }),
        Field::ignored("map"),
    ];
}

/// One lighting term of a surface.
#[derive(Clone, Debug, Default)]
pub struct SurfaceProperty {
    pub rgb: Option<Rgb>,
    pub factor: Option<f64>,
    pub texture_name: Option<String>,
    pub texture_params: Option<TextureParams>,
}

impl Chunk for SurfaceProperty {
    const NAME: &'static str = "surface property";
    const FIELDS: &'static [Field<Self>] = &[
        Field::nested("rgb", |s, p| {
            s.rgb = Some(p.chunk()?);
            Ok(())
        }),
        Field::wrapped("factor", ValueKind::Float, |s, v| s.factor = Some(v.as_float())),
        Field::wrapped("texturename", ValueKind::Str, |s, v| {
            s.texture_name = Some(v.into_string())
        }),
        Field::nested("textureparams", |s, p| {
            s.texture_params = Some(p.chunk()?);
            Ok(())
        }),
    ];
}

#[derive(Clone, Debug, Default)]
pub struct TextureParams {
    /// `decal`, `darken` or `lighten`
    pub blend_mode: Option<String>,
    /// `none`, `layer` or `final`
    pub alpha_mode: Option<String>,
    pub percent: Option<i64>,
}

impl Chunk for TextureParams {
    const NAME: &'static str = "textureparams";
    const FIELDS: &'static [Field<Self>] = &[
        Field::wrapped("blendmode", ValueKind::Name, |t, v| {
            t.blend_mode = Some(v.into_string())
        }),
        Field::wrapped("alphamode", ValueKind::Name, |t, v| {
            t.alpha_mode = Some(v.into_string())
        }),
        Field::wrapped("percent", ValueKind::Int, |t, v| t.percent = Some(v.as_int())),
    ];
}

/// Three positional floats, as in `scale { 1 2 1 }`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FloatTriple(pub DVec3);

impl Chunk for FloatTriple {
    const NAME: &'static str = "float triple";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("x", ValueKind::Float, |t, v| t.0.x = v.as_float()),
        Field::positional("y", ValueKind::Float, |t, v| t.0.y = v.as_float()),
        Field::positional("z", ValueKind::Float, |t, v| t.0.z = v.as_float()),
    ];
}

/// Three positional integers, as in `divisions { 1 1 1 }`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntTriple(pub [i64; 3]);

impl Chunk for IntTriple {
    const NAME: &'static str = "integer triple";
    const FIELDS: &'static [Field<Self>] = &[
        Field::positional("x", ValueKind::Int, |t, v| t.0[0] = v.as_int()),
        Field::positional("y", ValueKind::Int, |t, v| t.0[1] = v.as_int()),
        Field::positional("z", ValueKind::Int, |t, v| t.0[2] = v.as_int()),
    ];
}
