use crate::error::{ParseWarning, SlotError};
use serde::Serialize;
use std::fmt::Display;

/// A parsed document together with the non-fatal warnings collected while
/// reading it.
#[derive(Debug, PartialEq, Clone)]
pub struct Parsed<T> {
    pub value: T,
    pub warnings: Vec<ParseWarning>,
}

impl<T> Parsed<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}

// --- GeoScene ---

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SceneDescription {
    /// Dotted `major.minor` version from the signature line, without the `V`.
    pub format_version: String,
    /// Inclusive frame range from the `Sequence` line.
    pub frame_range: (i64, i64),
    pub data_format: String,
    pub cast_collection: Vec<CastEntry>,
    pub depth_cast_collection: Vec<CastEntry>,
    pub match_groups: Vec<MatchGroup>,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct CastEntry {
    pub name: String,
    pub size: [f64; 2],
    pub image_paths: Vec<String>,
    pub camera_slots: Vec<CameraSlot>,
}

/// The camera used to render one frame of a cast. A slot moves from
/// `Pending` to `Resolved` once and is never written again.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CameraSlot {
    Pending {
        path: String,
    },
    Resolved {
        path: String,
        camera: Box<CameraDescription>,
    },
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct MatchGroup {
    pub index: i64,
    pub camera_names: Vec<String>,
    pub surface_names: Vec<String>,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// `GeoCast` entries: the viewpoints.
    Cast,
    /// `GeoCastZ` entries: the world surfaces used as reprojection targets.
    DepthCast,
}

/// Where a resolved camera lands: one slot of one entry of one collection.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize)]
pub struct SlotCoordinate {
    pub collection: CollectionKind,
    pub entry: usize,
    pub slot: usize,
}

// --- GeoCast ---

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct CameraDescription {
    pub format_version: String,
    pub camera_kind: CameraKind,
    pub position: [f64; 3],
    pub view_slice: ViewSlice,
    /// Row-major.
    pub modelview_matrix: [f64; 16],
    pub projection: Projection,
    pub depth_range: Option<[f64; 2]>,
    pub world_space_depth: bool,
    pub lens_distortion: Option<LensDistortion>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum CameraKind {
    Static,
    Dynamic,
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize)]
pub struct ViewSlice {
    pub fod_angle_degrees: f64,
    pub size: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum Projection {
    Ortho {
        window_size: [f64; 2],
        proj_range: [f64; 2],
        /// Row-major.
        matrix: [f64; 16],
    },
    Perspective {
        fovy_degrees: f64,
        aspect: f64,
        clip_range: [f64; 2],
        /// Row-major.
        matrix: [f64; 16],
    },
    /// A `DataProject` kind this parser does not know. The document was read
    /// no further than the projection line.
    Unsupported { name: String },
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize)]
pub struct LensDistortion {
    pub aspect: f64,
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub p1: f64,
    pub p2: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub focal: f64,
}

impl Projection {
    /// The row-major projection matrix, absent for unsupported kinds.
    pub fn matrix(&self) -> Option<&[f64; 16]> {
        match self {
            Projection::Ortho { matrix, .. } | Projection::Perspective { matrix, .. } => Some(matrix),
            Projection::Unsupported { .. } => None,
        }
    }
}

impl CameraSlot {
    /// The GeoCast path this slot was (or will be) filled from.
    pub fn path(&self) -> &str {
        match self {
            CameraSlot::Pending { path } | CameraSlot::Resolved { path, .. } => path,
        }
    }

    pub fn camera(&self) -> Option<&CameraDescription> {
        match self {
            CameraSlot::Resolved { camera, .. } => Some(camera.as_ref()),
            CameraSlot::Pending { .. } => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CameraSlot::Pending { .. })
    }
}

impl CastEntry {
    pub fn camera(&self, slot: usize) -> Option<&CameraDescription> {
        self.camera_slots.get(slot).and_then(CameraSlot::camera)
    }

    pub fn is_resolved(&self) -> bool {
        self.camera_slots.iter().all(|s| !s.is_pending())
    }
}

impl SceneDescription {
    pub fn frame_count(&self) -> usize {
        frame_count(self.frame_range).unwrap_or(0)
    }

    /// Slot index of `frame`, if it lies inside the frame range.
    pub fn frame_slot(&self, frame: i64) -> Option<usize> {
        let (start, end) = self.frame_range;
        if frame < start || frame > end {
            return None;
        }
        usize::try_from(frame - start).ok()
    }

    pub fn collection(&self, kind: CollectionKind) -> &[CastEntry] {
        match kind {
            CollectionKind::Cast => &self.cast_collection,
            CollectionKind::DepthCast => &self.depth_cast_collection,
        }
    }

    fn collection_mut(&mut self, kind: CollectionKind) -> &mut Vec<CastEntry> {
        match kind {
            CollectionKind::Cast => &mut self.cast_collection,
            CollectionKind::DepthCast => &mut self.depth_cast_collection,
        }
    }

    /// Looks up a cast by name. Names are not required to be unique; the
    /// last declared entry wins.
    pub fn find_cast(&self, name: &str) -> Option<&CastEntry> {
        self.cast_collection.iter().rev().find(|c| c.name == name)
    }

    pub fn find_depth_cast(&self, name: &str) -> Option<&CastEntry> {
        self.depth_cast_collection.iter().rev().find(|c| c.name == name)
    }

    /// The camera for the named cast at `frame`, once resolved.
    pub fn camera_at(&self, name: &str, frame: i64) -> Option<&CameraDescription> {
        let slot = self.frame_slot(frame)?;
        self.find_cast(name)?.camera(slot)
    }

    /// Every slot still waiting for its GeoCast, with the path it waits on.
    pub fn pending_slots(&self) -> impl Iterator<Item = (SlotCoordinate, &str)> + '_ {
        [CollectionKind::Cast, CollectionKind::DepthCast]
            .into_iter()
            .flat_map(move |collection| {
                self.collection(collection)
                    .iter()
                    .enumerate()
                    .flat_map(move |(entry, cast)| {
                        cast.camera_slots
                            .iter()
                            .enumerate()
                            .filter(|(_, s)| s.is_pending())
                            .map(move |(slot, s)| {
                                (
                                    SlotCoordinate {
                                        collection,
                                        entry,
                                        slot,
                                    },
                                    s.path(),
                                )
                            })
                    })
            })
    }

    pub fn is_complete(&self) -> bool {
        self.pending_slots().next().is_none()
    }

    /// Fills a pending slot. A slot can be resolved only once.
    pub fn resolve_slot(
        &mut self,
        coordinate: SlotCoordinate,
        camera: CameraDescription,
    ) -> Result<(), SlotError> {
        let slot = self
            .collection_mut(coordinate.collection)
            .get_mut(coordinate.entry)
            .and_then(|entry| entry.camera_slots.get_mut(coordinate.slot))
            .ok_or(SlotError::OutOfRange { coordinate })?;
        match slot {
            CameraSlot::Pending { path } => {
                let path = std::mem::take(path);
                *slot = CameraSlot::Resolved {
                    path,
                    camera: Box::new(camera),
                };
                Ok(())
            }
            CameraSlot::Resolved { .. } => Err(SlotError::AlreadyResolved { coordinate }),
        }
    }
}

/// Number of frames in the inclusive `range`. `None` when the range is
/// reversed or its length does not fit in a `usize`.
pub fn frame_count((start, end): (i64, i64)) -> Option<usize> {
    if start > end {
        return None;
    }
    end.checked_sub(start)
        .and_then(|span| span.checked_add(1))
        .and_then(|count| usize::try_from(count).ok())
}

impl MatchGroup {
    /// The camera casts named by this group that exist in `scene`.
    pub fn cameras<'s>(&'s self, scene: &'s SceneDescription) -> impl Iterator<Item = &'s CastEntry> {
        self.camera_names.iter().filter_map(|n| scene.find_cast(n))
    }

    /// The surface casts named by this group that exist in `scene`.
    pub fn surfaces<'s>(&'s self, scene: &'s SceneDescription) -> impl Iterator<Item = &'s CastEntry> {
        self.surface_names
            .iter()
            .filter_map(|n| scene.find_depth_cast(n))
    }
}

impl Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionKind::Cast => write!(f, "GeoCast"),
            CollectionKind::DepthCast => write!(f, "GeoCastZ"),
        }
    }
}

impl Display for SlotCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}][{}]", self.collection, self.entry, self.slot)
    }
}
