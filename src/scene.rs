use crate::ast::{
    frame_count, CameraSlot, CastEntry, CollectionKind, MatchGroup, Parsed, SceneDescription,
};
use crate::error::{FormatError, ParseWarning};
use crate::lexer::Line;
use crate::parser::{span_of, LineParser};
use crate::sequence;

/// Parser for a GeoScene document.
///
/// ```text
/// GeoScene V<major>.<minor>
/// Sequence <start> <end>
/// DataFormat <tag>
/// GeoCast  <name> <w> <h> <imagePattern> <castPattern>    (repeated)
/// GeoCastZ <name> <w> <h> <imagePattern> <castPattern>    (repeated)
/// MatchGroup <index>                                      (repeated)
///   MatchCam <name>                                       (repeated)
///   MatchSurface <name>                                   (repeated)
/// ```
///
/// Parsing only builds the skeleton: every camera slot starts out
/// [`CameraSlot::Pending`] with the path of the GeoCast document that will
/// fill it. See [`crate::resolver::Resolver`] for the fetching side.
/// Default upper bound on the frames one `Sequence` may span.
pub const DEFAULT_MAX_FRAMES: usize = 1_000_000;

pub struct SceneParser<'a> {
    parser: LineParser<'a>,
    base_path: String,
    max_frames: usize,
}

impl<'a> SceneParser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "source.geoscene")
    }

    pub fn new_with_name(source_text: &'a str, name: impl Into<String>) -> Self {
        Self {
            parser: LineParser::new_with_name(source_text, name.into()),
            base_path: String::new(),
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }

    /// Directory that relative image and cast paths are resolved against.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Longest `Sequence` accepted, in frames.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn parse_document(mut self) -> Result<Parsed<SceneDescription>, FormatError> {
        log::trace!("[{}] parsing GeoScene", self.parser.name());
        let format_version = self.parser.expect_signature("GeoScene")?;
        let (frame_range, frames) = self.parse_sequence()?;
        let data_format_line = self.parser.expect_tag("DataFormat")?;
        let data_format = self
            .parser
            .word(&data_format_line, 1, "data format")?
            .to_string();

        let mut scene = SceneDescription {
            format_version,
            frame_range,
            data_format,
            cast_collection: Vec::new(),
            depth_cast_collection: Vec::new(),
            match_groups: Vec::new(),
        };

        while let Some(line) = self.parser.next_line() {
            match line.tag() {
                Some("GeoCast") => {
                    let entry = self.parse_cast_entry(&line, frame_range, frames)?;
                    scene.cast_collection.push(entry);
                }
                Some("GeoCastZ") => {
                    let entry = self.parse_cast_entry(&line, frame_range, frames)?;
                    scene.depth_cast_collection.push(entry);
                }
                Some("MatchGroup") => {
                    let group = self.parse_match_group(&line)?;
                    scene.match_groups.push(group);
                }
                _ => self.parser.warn_unrecognized(&line, "GeoScene"),
            }
        }

        self.check_match_names(&scene);
        log::debug!(
            "[{}] {} casts, {} depth casts, {} match groups over frames {}..={}",
            self.parser.name(),
            scene.cast_collection.len(),
            scene.depth_cast_collection.len(),
            scene.match_groups.len(),
            frame_range.0,
            frame_range.1
        );

        Ok(Parsed {
            value: scene,
            warnings: self.parser.into_warnings(),
        })
    }

    /// Returns the inclusive frame range and its length.
    fn parse_sequence(&mut self) -> Result<((i64, i64), usize), FormatError> {
        let line = self.parser.expect_tag("Sequence")?;
        let start = self.parser.integer(&line, 1, "sequence start")?;
        let end = self.parser.integer(&line, 2, "sequence end")?;
        if start > end {
            return Err(FormatError::InvalidSequence {
                src: self.parser.src(),
                span: span_of(&line),
                start,
                end,
                line: line.number,
            });
        }
        match frame_count((start, end)).filter(|&n| n <= self.max_frames) {
            Some(frames) => Ok(((start, end), frames)),
            None => Err(FormatError::SequenceTooLong {
                src: self.parser.src(),
                span: span_of(&line),
                start,
                end,
                limit: self.max_frames,
                line: line.number,
            }),
        }
    }

    /// `GeoCast <name> <w> <h> <imagePattern> <castPattern>`; the same shape
    /// serves `GeoCastZ`.
    fn parse_cast_entry(
        &mut self,
        line: &Line<'a>,
        frame_range: (i64, i64),
        frames: usize,
    ) -> Result<CastEntry, FormatError> {
        let name = self.parser.word(line, 1, "cast name")?.to_string();
        let size = [
            self.parser.number(line, 2, "width")?,
            self.parser.number(line, 3, "height")?,
        ];
        let image_pattern = self.parser.word(line, 4, "image path")?;
        let cast_pattern = self.parser.word(line, 5, "cast path")?;

        let image_paths = self.frame_paths(image_pattern, frame_range, frames);
        let camera_slots = self
            .frame_paths(cast_pattern, frame_range, frames)
            .into_iter()
            .map(|path| CameraSlot::Pending { path })
            .collect();
        Ok(CastEntry {
            name,
            size,
            image_paths,
            camera_slots,
        })
    }

    /// One path per frame. A pattern without placeholders is reused for
    /// every frame.
    fn frame_paths(&self, pattern: &str, frame_range: (i64, i64), frames: usize) -> Vec<String> {
        let mut paths = sequence::expand(pattern, Some(frame_range));
        if paths.len() == 1 && frames > 1 {
            paths = vec![paths.remove(0); frames];
        }
        paths
            .iter()
            .map(|p| sequence::join_base(&self.base_path, p))
            .collect()
    }

    /// Reads the `MatchCam` lines and then the `MatchSurface` lines of one
    /// group. The first line that continues neither run is left unconsumed
    /// for the caller.
    fn parse_match_group(&mut self, header: &Line<'a>) -> Result<MatchGroup, FormatError> {
        let index = self.parser.integer(header, 1, "match group index")?;
        let camera_names = self.parse_names("MatchCam")?;
        let surface_names = self.parse_names("MatchSurface")?;
        Ok(MatchGroup {
            index,
            camera_names,
            surface_names,
        })
    }

    fn parse_names(&mut self, tag: &str) -> Result<Vec<String>, FormatError> {
        let mut names = Vec::new();
        while self.parser.peek_tag() == Some(tag) {
            let line = self.parser.expect_tag(tag)?;
            names.push(self.parser.word(&line, 1, "name")?.to_string());
        }
        Ok(names)
    }

    fn check_match_names(&mut self, scene: &SceneDescription) {
        for group in &scene.match_groups {
            let cameras = group
                .camera_names
                .iter()
                .filter(|n| scene.find_cast(n).is_none())
                .map(|n| (CollectionKind::Cast, n));
            let surfaces = group
                .surface_names
                .iter()
                .filter(|n| scene.find_depth_cast(n).is_none())
                .map(|n| (CollectionKind::DepthCast, n));
            for (collection, name) in cameras.chain(surfaces) {
                self.parser.warn(ParseWarning::UnknownMatchName {
                    group: group.index,
                    collection,
                    name: name.clone(),
                });
            }
        }
    }
}
