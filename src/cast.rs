use crate::ast::{CameraDescription, CameraKind, LensDistortion, Parsed, Projection, ViewSlice};
use crate::error::{FormatError, ParseWarning};
use crate::lexer::Line;
use crate::parser::LineParser;
use crate::projection::{GlProjection, ProjectionBuilder};

const IMAGE_WARP_LABELS: [&str; 9] = [
    "aspect", "k1", "k2", "k3", "p1", "p2", "centerX", "centerY", "focal",
];

/// Parser for a single GeoCast camera document.
///
/// The three historical revisions of the format differ only in which
/// optional lines appear and in what order, so one grammar reads them all:
///
/// ```text
/// GeoCast V<major>.<minor>
/// StaticCamera | DynamicCamera        (before or after Pos, or on the Pos line)
/// Pos <x> <y> <z>
/// ViewSlice FODAngle <deg> Size <size>
/// ModelviewMatrix
/// <4 rows of 4 numbers>
/// DataProject Ortho Window|WindowSize <w> <h> ProjRange <near> <far>
///           | Perspective Fovy <deg> Aspect <a> ClipRange <near> <far>
/// [ImageWarp aspect <v> k1 <v> ... focal <v>]
/// [WorldSpaceDepth]
/// [ZDataRange <min> <max>]
/// ```
pub struct CastParser<'a> {
    parser: LineParser<'a>,
    projection: &'a dyn ProjectionBuilder,
    require_depth_range: bool,
}

impl<'a> CastParser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "source.geocast")
    }

    pub fn new_with_name(source_text: &'a str, name: impl Into<String>) -> Self {
        Self {
            parser: LineParser::new_with_name(source_text, name.into()),
            projection: &GlProjection,
            require_depth_range: false,
        }
    }

    /// Uses `builder` instead of the OpenGL conventions to derive the
    /// projection matrix.
    pub fn with_projection(mut self, builder: &'a dyn ProjectionBuilder) -> Self {
        self.projection = builder;
        self
    }

    /// Rejects documents without a `ZDataRange` line, as cameras that belong
    /// to a scene collection must carry one. Documents whose projection is
    /// unsupported are exempt, since they are not read past `DataProject`.
    pub fn require_depth_range(mut self) -> Self {
        self.require_depth_range = true;
        self
    }

    pub fn parse_document(mut self) -> Result<Parsed<CameraDescription>, FormatError> {
        log::trace!("[{}] parsing GeoCast", self.parser.name());
        let format_version = self.parser.expect_signature("GeoCast")?;
        let (camera_kind, position) = self.parse_camera_header()?;
        let view_slice = self.parse_view_slice()?;
        let modelview_matrix = self.parse_modelview_matrix()?;
        let projection = self.parse_projection()?;

        let mut camera = CameraDescription {
            format_version,
            camera_kind,
            position,
            view_slice,
            modelview_matrix,
            projection,
            depth_range: None,
            world_space_depth: false,
            lens_distortion: None,
        };
        if !matches!(camera.projection, Projection::Unsupported { .. }) {
            self.parse_optional_lines(&mut camera)?;
            if self.require_depth_range && camera.depth_range.is_none() {
                return Err(self.parser.err_eof("ZDataRange"));
            }
        }

        Ok(Parsed {
            value: camera,
            warnings: self.parser.into_warnings(),
        })
    }

    /// Reads the camera kind and position, which may come as
    /// `StaticCamera` + `Pos ...`, `Pos ...` + `StaticCamera`, or a single
    /// `StaticCamera Pos ...` line. Both are required.
    fn parse_camera_header(&mut self) -> Result<(CameraKind, [f64; 3]), FormatError> {
        let mut kind = None;
        let mut position = None;
        loop {
            if let (Some(kind), Some(position)) = (kind, position) {
                return Ok((kind, position));
            }
            let line = self.parser.expect_line("StaticCamera, DynamicCamera or Pos")?;
            match line.tag() {
                Some(tag @ ("StaticCamera" | "DynamicCamera")) if kind.is_none() => {
                    kind = Some(if tag == "StaticCamera" {
                        CameraKind::Static
                    } else {
                        CameraKind::Dynamic
                    });
                    if line.token(1).map(|t| t.text) == Some("Pos") {
                        position = Some(self.parse_position(&line, 2)?);
                    }
                }
                Some("Pos") if position.is_none() => {
                    position = Some(self.parse_position(&line, 1)?);
                }
                _ if kind.is_none() => {
                    return Err(self.parser.err_unexpected(&line, "StaticCamera or DynamicCamera"))
                }
                _ => return Err(self.parser.err_unexpected(&line, "Pos")),
            }
        }
    }

    fn parse_position(&self, line: &Line<'a>, first: usize) -> Result<[f64; 3], FormatError> {
        Ok([
            self.parser.number(line, first, "x")?,
            self.parser.number(line, first + 1, "y")?,
            self.parser.number(line, first + 2, "z")?,
        ])
    }

    fn parse_view_slice(&mut self) -> Result<ViewSlice, FormatError> {
        let line = self.parser.expect_tag("ViewSlice")?;
        self.parser.expect_label(&line, 1, &["FODAngle"], "view-slice")?;
        let fod_angle_degrees = self.parser.number(&line, 2, "FODAngle")?;
        self.parser.expect_label(&line, 3, &["Size"], "view-slice")?;
        let size = self.parser.number(&line, 4, "Size")?;
        Ok(ViewSlice {
            fod_angle_degrees,
            size,
        })
    }

    fn parse_modelview_matrix(&mut self) -> Result<[f64; 16], FormatError> {
        self.parser.expect_tag("ModelviewMatrix")?;
        let mut matrix = [0.0; 16];
        for row in 0..4 {
            let line = self.parser.expect_line("a modelview matrix row")?;
            for col in 0..4 {
                matrix[row * 4 + col] = self.parser.number(&line, col, "matrix element")?;
            }
        }
        Ok(matrix)
    }

    fn parse_projection(&mut self) -> Result<Projection, FormatError> {
        let line = self.parser.expect_tag("DataProject")?;
        let kind = self.parser.word(&line, 1, "projection kind")?;
        match kind {
            "Ortho" => {
                self.parser
                    .expect_label(&line, 2, &["Window", "WindowSize"], "ortho")?;
                let window_size = [
                    self.parser.number(&line, 3, "window width")?,
                    self.parser.number(&line, 4, "window height")?,
                ];
                self.parser.expect_label(&line, 5, &["ProjRange"], "ortho")?;
                let proj_range = [
                    self.parser.number(&line, 6, "near")?,
                    self.parser.number(&line, 7, "far")?,
                ];
                let [w, h] = window_size;
                let matrix = self
                    .projection
                    .ortho(-w, w, -h, h, proj_range[0], proj_range[1]);
                Ok(Projection::Ortho {
                    window_size,
                    proj_range,
                    matrix,
                })
            }
            "Perspective" => {
                self.parser.expect_label(&line, 2, &["Fovy"], "perspective")?;
                let fovy_degrees = self.parser.number(&line, 3, "Fovy")?;
                self.parser.expect_label(&line, 4, &["Aspect"], "perspective")?;
                let aspect = self.parser.number(&line, 5, "Aspect")?;
                self.parser
                    .expect_label(&line, 6, &["ClipRange"], "perspective")?;
                let clip_range = [
                    self.parser.number(&line, 7, "near")?,
                    self.parser.number(&line, 8, "far")?,
                ];
                let matrix = self.projection.perspective(
                    fovy_degrees.to_radians(),
                    aspect,
                    clip_range[0],
                    clip_range[1],
                );
                Ok(Projection::Perspective {
                    fovy_degrees,
                    aspect,
                    clip_range,
                    matrix,
                })
            }
            other => {
                self.parser.warn(ParseWarning::UnsupportedProjection {
                    kind: other.to_string(),
                    line: line.number,
                });
                Ok(Projection::Unsupported {
                    name: other.to_string(),
                })
            }
        }
    }

    /// `ImageWarp`, `WorldSpaceDepth` and `ZDataRange` are each optional and
    /// their order moved between revisions, so they are read in any order.
    fn parse_optional_lines(&mut self, camera: &mut CameraDescription) -> Result<(), FormatError> {
        while let Some(line) = self.parser.next_line() {
            match line.tag() {
                Some("ImageWarp") => camera.lens_distortion = Some(self.parse_image_warp(&line)?),
                Some("WorldSpaceDepth") => camera.world_space_depth = true,
                Some("ZDataRange") => {
                    camera.depth_range = Some([
                        self.parser.number(&line, 1, "depth min")?,
                        self.parser.number(&line, 2, "depth max")?,
                    ]);
                }
                _ => self.parser.warn_unrecognized(&line, "GeoCast"),
            }
        }
        Ok(())
    }

    fn parse_image_warp(&self, line: &Line<'a>) -> Result<LensDistortion, FormatError> {
        let mut values = [0.0; 9];
        for (i, &label) in IMAGE_WARP_LABELS.iter().enumerate() {
            self.parser
                .expect_label(line, 2 * i + 1, &[label], "image-warp")?;
            values[i] = self.parser.number(line, 2 * i + 2, label)?;
        }
        let [aspect, k1, k2, k3, p1, p2, center_x, center_y, focal] = values;
        Ok(LensDistortion {
            aspect,
            k1,
            k2,
            k3,
            p1,
            p2,
            center_x,
            center_y,
            focal,
        })
    }
}
