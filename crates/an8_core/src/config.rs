//! Conversion options.

use serde::Deserialize;

/// Default smoothing threshold for synthesized normals, in degrees.
pub const DEFAULT_SMOOTHING_ANGLE: f64 = 45.0;

/// Playback rate used when neither the document nor the options set one.
pub const DEFAULT_FRAMES_PER_SECOND: f64 = 24.0;

/// Deepest chunk nesting the parser accepts.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options for one conversion run.
///
/// Every field has a default, so a JSON config only needs the keys it
/// changes:
///
/// ```ignore
/// let options = ConvertOptions::from_json(r#"{ "smoothing_angle": 30.0 }"#)?;
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConvertOptions {
    /// Smoothing threshold for meshes without their own `smoothangle`
    pub smoothing_angle: f64,

    /// Overrides the document's `framerate` when set
    pub frames_per_second: Option<f64>,

    /// Maximum chunk nesting depth before parsing fails
    pub max_depth: usize,

    /// Synthesize normals for meshes that lack them
    pub compute_normals: bool,

    /// Synthesize bone weights for skinned meshes that lack a weight table
    pub compute_weights: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            smoothing_angle: DEFAULT_SMOOTHING_ANGLE,
            frames_per_second: None,
            max_depth: DEFAULT_MAX_DEPTH,
            compute_normals: true,
            compute_weights: true,
        }
    }
}

impl ConvertOptions {
    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Playback rate for a document whose `framerate` chunk held `document_rate`.
    pub fn resolve_frames_per_second(&self, document_rate: Option<f64>) -> f64 {
        let positive = |fps: &f64| *fps > 0.0;
        self.frames_per_second
            .filter(positive)
            .or(document_rate.filter(positive))
            .unwrap_or(DEFAULT_FRAMES_PER_SECOND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert_eq!(options.smoothing_angle, 45.0);
        assert_eq!(options.max_depth, 256);
        assert!(options.compute_normals);
        assert!(options.compute_weights);
    }

    #[test]
    fn test_partial_json() {
        let options = ConvertOptions::from_json(r#"{ "smoothing_angle": 30.0, "frames_per_second": 30 }"#)
            .unwrap();
        assert_eq!(options.smoothing_angle, 30.0);
        assert_eq!(options.frames_per_second, Some(30.0));
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_frames_per_second_resolution() {
        let mut options = ConvertOptions::default();
        assert_eq!(options.resolve_frames_per_second(None), 24.0);
        assert_eq!(options.resolve_frames_per_second(Some(30.0)), 30.0);
        assert_eq!(options.resolve_frames_per_second(Some(0.0)), 24.0);

        options.frames_per_second = Some(60.0);
        assert_eq!(options.resolve_frames_per_second(Some(30.0)), 60.0);

        options.frames_per_second = Some(0.0);
        assert_eq!(options.resolve_frames_per_second(Some(30.0)), 30.0);
        assert_eq!(options.resolve_frames_per_second(None), 24.0);
    }
}
