use crate::ast::{CameraDescription, Parsed, SceneDescription, SlotCoordinate};
use crate::cast::CastParser;
use crate::error::{FetchError, GeoError, ParseWarning};
use crate::projection::{GlProjection, ProjectionBuilder};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;

/// Retrieves the text of a referenced document.
///
/// Futures returned by a fetcher are driven on the caller's task and need
/// not be `Send`.
#[async_trait(?Send)]
pub trait CastFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError>;
}

#[async_trait(?Send)]
impl<T: CastFetcher + ?Sized> CastFetcher for &T {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        (**self).fetch_text(path).await
    }
}

/// Serves documents from memory, keyed by path.
#[async_trait(?Send)]
impl CastFetcher for HashMap<String, String> {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        self.get(path)
            .cloned()
            .ok_or_else(|| FetchError::new(path, "no such document"))
    }
}

/// Reads documents from the local filesystem.
///
/// Reads are blocking `std::fs` calls made inside the future, so fetches
/// through this fetcher run one after another even under
/// [`ResolverOptions::max_in_flight`]. Wrap a non-blocking reader in a
/// [`CastFetcher`] where overlapping disk or network reads matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFetcher;

#[async_trait(?Send)]
impl CastFetcher for FsFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        std::fs::read_to_string(path).map_err(|e| FetchError::new(path, e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Upper bound on fetches in flight at once. `None` issues every fetch
    /// immediately.
    pub max_in_flight: Option<usize>,
}

/// One GeoCast document to fetch, and every slot it fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastRequest {
    pub path: String,
    pub coordinates: Vec<SlotCoordinate>,
}

/// The outcome of one fetch and parse, still addressed to its slots.
#[derive(Debug, Clone)]
pub struct CastCompletion {
    pub path: String,
    pub coordinates: Vec<SlotCoordinate>,
    pub result: Result<Parsed<CameraDescription>, GeoError>,
}

#[derive(Debug, Clone)]
pub struct ResolutionFailure {
    pub coordinate: SlotCoordinate,
    pub path: String,
    pub error: GeoError,
}

#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    /// Slots filled by this run, in the order their documents arrived.
    pub completion_order: Vec<SlotCoordinate>,
    /// Slots left pending, with the reason.
    pub failures: Vec<ResolutionFailure>,
    /// Warnings from each fetched document, keyed by its path.
    pub warnings: Vec<(String, ParseWarning)>,
}

impl ResolutionReport {
    pub fn resolved(&self) -> usize {
        self.completion_order.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Writes a completion into each of its slots and records how it went.
    pub fn record(&mut self, scene: &mut SceneDescription, completion: CastCompletion) {
        let CastCompletion {
            path,
            coordinates,
            result,
        } = completion;
        let camera = match result {
            Ok(parsed) => {
                self.warnings
                    .extend(parsed.warnings.into_iter().map(|w| (path.clone(), w)));
                parsed.value
            }
            Err(error) => {
                log::warn!("{path} failed, {} slots stay pending: {error}", coordinates.len());
                for coordinate in coordinates {
                    self.fail(coordinate, &path, error.clone());
                }
                return;
            }
        };
        for coordinate in coordinates {
            match scene.resolve_slot(coordinate, camera.clone()) {
                Ok(()) => {
                    log::trace!("resolved {coordinate} from {path}");
                    self.completion_order.push(coordinate);
                }
                Err(error) => {
                    log::warn!("{coordinate} stays pending: {error}");
                    self.fail(coordinate, &path, error.into());
                }
            }
        }
    }

    fn fail(&mut self, coordinate: SlotCoordinate, path: &str, error: GeoError) {
        self.failures.push(ResolutionFailure {
            coordinate,
            path: path.to_string(),
            error,
        });
    }
}

/// One request per distinct pending path, across both collections, in the
/// order each path first appears. A path shared by several slots (a
/// pattern-free cast reused for every frame) is fetched once.
pub fn cast_requests(scene: &SceneDescription) -> Vec<CastRequest> {
    let mut requests: Vec<CastRequest> = Vec::new();
    let mut by_path: HashMap<&str, usize> = HashMap::new();
    for (coordinate, path) in scene.pending_slots() {
        match by_path.get(path) {
            Some(&i) => requests[i].coordinates.push(coordinate),
            None => {
                by_path.insert(path, requests.len());
                requests.push(CastRequest {
                    path: path.to_string(),
                    coordinates: vec![coordinate],
                });
            }
        }
    }
    requests
}

/// Fills the pending camera slots of a scene by fetching and parsing the
/// GeoCast document each slot names.
///
/// Each request carries its own [`SlotCoordinate`]s, so completions may
/// arrive in any order and still land in the right slots. No coordinate
/// appears in two requests, and slots are written only by
/// the future returned from [`Resolver::resolve`]; dropping that future
/// stops resolution without touching any further slot.
pub struct Resolver<F> {
    fetcher: F,
    projection: Box<dyn ProjectionBuilder>,
    options: ResolverOptions,
}

impl<F: CastFetcher> Resolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            projection: Box::new(GlProjection),
            options: ResolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_projection(mut self, builder: impl ProjectionBuilder + 'static) -> Self {
        self.projection = Box::new(builder);
        self
    }

    /// Fetches and parses one GeoCast. Cameras in a scene collection must
    /// carry a `ZDataRange`, so a document without one is a format error.
    pub async fn fetch_and_parse(&self, request: CastRequest) -> CastCompletion {
        let CastRequest { path, coordinates } = request;
        log::trace!("fetching {path} for {} slots", coordinates.len());
        let result = match self.fetcher.fetch_text(&path).await {
            Ok(text) => CastParser::new_with_name(&text, path.clone())
                .with_projection(self.projection.as_ref())
                .require_depth_range()
                .parse_document()
                .map_err(GeoError::from),
            Err(err) => Err(err.into()),
        };
        CastCompletion {
            path,
            coordinates,
            result,
        }
    }

    /// Resolves every pending slot of `scene`. Failed fetches or parses leave
    /// their slot pending and are listed in the report.
    pub async fn resolve(&self, scene: &mut SceneDescription) -> ResolutionReport {
        let requests = cast_requests(scene);
        let limit = self
            .options
            .max_in_flight
            .unwrap_or(requests.len())
            .max(1);
        log::debug!("fetching {} GeoCast documents, {} at a time", requests.len(), limit);

        let mut completions = stream::iter(requests)
            .map(|request| self.fetch_and_parse(request))
            .buffer_unordered(limit);
        let mut report = ResolutionReport::default();
        while let Some(completion) = completions.next().await {
            report.record(scene, completion);
        }
        log::debug!(
            "resolved {} camera slots, {} failed",
            report.resolved(),
            report.failures.len()
        );
        report
    }
}
