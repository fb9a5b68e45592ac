use crate::ast::{CameraDescription, Parsed, SceneDescription};
use crate::cast::CastParser;
use crate::error::{GeoError, ParseWarning};
use crate::resolver::{CastFetcher, ResolutionReport, Resolver, ResolverOptions};
use crate::scene::SceneParser;
use crate::sequence::base_directory;

/// A scene loaded end to end: parsed, then every referenced GeoCast fetched.
#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub scene: SceneDescription,
    /// Warnings from the scene document itself. Warnings from the GeoCast
    /// documents are in `report.warnings`.
    pub warnings: Vec<ParseWarning>,
    pub report: ResolutionReport,
}

impl SceneDescription {
    /// Serializes the scene into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the scene into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

impl CameraDescription {
    /// Serializes the camera into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the camera into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Parses a single GeoCast document.
///
/// # Errors
/// Returns a `GeoError::Format` if the document is structurally invalid.
pub fn parse_cast(source: &str, file_name: &str) -> Result<Parsed<CameraDescription>, GeoError> {
    Ok(CastParser::new_with_name(source, file_name).parse_document()?)
}

/// Parses a GeoScene document without fetching anything. Relative paths are
/// resolved against the directory of `file_name`, and every camera slot is
/// left pending.
///
/// # Errors
/// Returns a `GeoError::Format` if the document is structurally invalid.
pub fn parse_scene(source: &str, file_name: &str) -> Result<Parsed<SceneDescription>, GeoError> {
    Ok(SceneParser::new_with_name(source, file_name)
        .with_base_path(base_directory(file_name))
        .parse_document()?)
}

/// Fetches and parses the GeoScene at `path`, then resolves every camera
/// slot through `fetcher`.
///
/// Only the scene document itself can fail the call. A GeoCast that cannot
/// be fetched or parsed, or that lacks a `ZDataRange`, leaves its slots
/// pending and shows up in `report.failures`.
///
/// # Errors
/// Returns a `GeoError` if the scene document cannot be fetched or parsed.
pub async fn load_scene<F: CastFetcher>(path: &str, fetcher: F) -> Result<LoadedScene, GeoError> {
    load_scene_with_options(path, fetcher, ResolverOptions::default()).await
}

/// [`load_scene`] with explicit resolver options.
///
/// # Errors
/// Returns a `GeoError` if the scene document cannot be fetched or parsed.
pub async fn load_scene_with_options<F: CastFetcher>(
    path: &str,
    fetcher: F,
    options: ResolverOptions,
) -> Result<LoadedScene, GeoError> {
    let source = fetcher.fetch_text(path).await?;
    let Parsed {
        value: mut scene,
        warnings,
    } = parse_scene(&source, path)?;
    let report = Resolver::new(&fetcher)
        .with_options(options)
        .resolve(&mut scene)
        .await;
    Ok(LoadedScene {
        scene,
        warnings,
        report,
    })
}
