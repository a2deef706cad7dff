//! Wavefront OBJ loader.
//!
//! Supports the geometry subset of the format: `v`, `vt`, `vn` and `f`
//! directives with 1-based or negative (relative) indices and face elements
//! shaped `v`, `v/vt`, `v//vn` or `v/vt/vn`. Polygons are fan-triangulated
//! around their first corner. Every other directive (`mtllib`, `usemtl`, `s`,
//! `g`, `o`, ...) is ignored.
//!
//! Output vertices are identified by the index triplet that produced them, so
//! two corners referencing the same `(v, vt, vn)` share one vertex.
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info, warn};
use nalgebra::{Point3, Vector2, Vector3};
use nom::{
    bytes::complete::take_till1,
    character::complete::{char, i64 as index, space0, space1},
    combinator::{all_consuming, opt, verify},
    multi::many0,
    number::complete::float,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::{Attribute, ObjError};
use crate::geometry::{Mesh, Vertex};

/// What to do with a face element that names an undeclared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Fail the whole load with [`ObjError::OutOfRange`].
    #[default]
    Strict,
    /// Drop corners with a bad position index and treat bad texture or
    /// normal indices as absent.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Synthesize normals when any vertex ends up without one.
    pub generate_normals: bool,
    /// Store `vt u v` as `(u, 1 - v)`.
    pub flip_v: bool,
    pub index_policy: IndexPolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            generate_normals: true,
            flip_v: false,
            index_policy: IndexPolicy::Strict,
        }
    }
}

/// Load an OBJ file with strict indexing and unflipped texture coordinates.
pub fn load<P: AsRef<Path>>(path: P, generate_missing_normals: bool) -> Result<Mesh, ObjError> {
    ObjLoader::new(LoadOptions {
        generate_normals: generate_missing_normals,
        ..LoadOptions::default()
    })
    .load(path)
}

/// A face element as written in the file, before index resolution.
///
/// Zero means the sub-index is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawElement {
    v: i64,
    vt: i64,
    vn: i64,
}

/// Zero-based pool offsets identifying one output vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct IndexTriplet {
    v: usize,
    vt: Option<usize>,
    vn: Option<usize>,
}

/// A parsed, non-ignored OBJ line.
#[derive(Debug, Clone, PartialEq)]
enum Directive {
    Position(Point3<f32>),
    TexCoord(Vector2<f32>),
    Normal(Vector3<f32>),
    Face(Vec<RawElement>),
}

#[derive(Debug, Clone, Copy)]
pub struct ObjLoader {
    options: LoadOptions,
}

impl Default for ObjLoader {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

impl ObjLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Read and parse the file at `path`.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Mesh, ObjError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ObjError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!("loading OBJ model {}", path.display());
        self.parse(BufReader::new(file))
    }

    /// Parse OBJ text from any buffered reader.
    pub fn parse<R: BufRead>(&self, reader: R) -> Result<Mesh, ObjError> {
        let mut builder = MeshBuilder::new(self.options);

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            builder.line = line_no + 1;

            // Comments run to the end of the line
            let line = line.split('#').next().unwrap_or_default().trim_start();
            if line.is_empty() {
                continue;
            }

            match parse_directive(line, builder.line)? {
                Some(Directive::Position(p)) => builder.positions.push(p),
                Some(Directive::TexCoord(t)) => builder.push_tex_coord(t),
                Some(Directive::Normal(n)) => builder.normals.push(n),
                Some(Directive::Face(elements)) => builder.add_face(&elements)?,
                None => {}
            }
        }

        builder.finish()
    }
}

/// Transient state for one load call.
struct MeshBuilder {
    options: LoadOptions,
    line: usize,
    positions: Vec<Point3<f32>>,
    tex_coords: Vec<Vector2<f32>>,
    normals: Vec<Vector3<f32>>,
    cache: HashMap<IndexTriplet, u32>,
    faces: usize,
    mesh: Mesh,
}

impl MeshBuilder {
    fn new(options: LoadOptions) -> Self {
        Self {
            options,
            line: 0,
            positions: Vec::with_capacity(1024),
            tex_coords: Vec::with_capacity(1024),
            normals: Vec::with_capacity(1024),
            cache: HashMap::new(),
            faces: 0,
            mesh: Mesh::with_capacity(2048, 4096),
        }
    }

    fn push_tex_coord(&mut self, t: Vector2<f32>) {
        if self.options.flip_v {
            self.tex_coords.push(Vector2::new(t.x, 1.0 - t.y));
        } else {
            self.tex_coords.push(t);
        }
    }

    fn add_face(&mut self, elements: &[RawElement]) -> Result<(), ObjError> {
        if elements.len() < 3 {
            debug!("line {}: ignoring face with {} corners", self.line, elements.len());
            return Ok(());
        }

        let mut corners = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(triplet) = self.resolve(element)? {
                corners.push(triplet);
            }
        }
        if corners.len() < 3 {
            warn!("line {}: face lost too many corners, dropping it", self.line);
            return Ok(());
        }

        self.faces += 1;
        for i in 1..corners.len() - 1 {
            for corner in [corners[0], corners[i], corners[i + 1]] {
                let index = self.vertex_for(corner)?;
                self.mesh.indices.push(index);
            }
        }
        Ok(())
    }

    /// Resolve a raw element against the pools declared so far.
    ///
    /// `Ok(None)` means the corner was dropped under [`IndexPolicy::Skip`].
    fn resolve(&self, element: &RawElement) -> Result<Option<IndexTriplet>, ObjError> {
        let v = match self.resolve_one(element.v, self.positions.len(), Attribute::Position)? {
            Some(v) => v,
            None => return Ok(None),
        };
        let vt = self.resolve_one(element.vt, self.tex_coords.len(), Attribute::TexCoord)?;
        let vn = self.resolve_one(element.vn, self.normals.len(), Attribute::Normal)?;
        Ok(Some(IndexTriplet { v, vt, vn }))
    }

    fn resolve_one(
        &self,
        raw: i64,
        declared: usize,
        attribute: Attribute,
    ) -> Result<Option<usize>, ObjError> {
        if raw == 0 && attribute != Attribute::Position {
            return Ok(None);
        }
        match resolve_index(raw, declared) {
            Some(i) => Ok(Some(i)),
            None => match self.options.index_policy {
                IndexPolicy::Strict => Err(ObjError::OutOfRange {
                    line: self.line,
                    attribute,
                    index: raw,
                    declared,
                }),
                IndexPolicy::Skip => {
                    warn!(
                        "line {}: skipping {} index {} ({} declared)",
                        self.line, attribute, raw, declared
                    );
                    Ok(None)
                }
            },
        }
    }

    /// Look up or create the output vertex for a resolved triplet.
    fn vertex_for(&mut self, triplet: IndexTriplet) -> Result<u32, ObjError> {
        if let Some(&index) = self.cache.get(&triplet) {
            return Ok(index);
        }

        let index =
            u32::try_from(self.mesh.vertices.len()).map_err(|_| ObjError::TooManyVertices)?;
        let tex_coord = triplet
            .vt
            .map_or_else(Vector2::zeros, |i| self.tex_coords[i]);
        let normal = triplet.vn.map_or_else(Vector3::zeros, |i| self.normals[i]);
        self.mesh
            .vertices
            .push(Vertex::new(self.positions[triplet.v], normal, tex_coord));
        self.cache.insert(triplet, index);
        Ok(index)
    }

    fn finish(mut self) -> Result<Mesh, ObjError> {
        debug!(
            "parsed {} positions, {} texture coordinates, {} normals, {} faces",
            self.positions.len(),
            self.tex_coords.len(),
            self.normals.len(),
            self.faces
        );

        if self.options.generate_normals && self.mesh.ensure_normals() {
            info!("synthesized vertex normals");
        }

        info!(
            "loaded mesh with {} vertices and {} triangles",
            self.mesh.vertex_count(),
            self.mesh.triangle_count()
        );
        Ok(self.mesh)
    }
}

/// Convert an OBJ index (1-based, negative counts back from the most recent
/// declaration) into a zero-based offset into a pool of `declared` items.
fn resolve_index(raw: i64, declared: usize) -> Option<usize> {
    let declared = i64::try_from(declared).ok()?;
    let zero_based = match raw {
        0 => return None,
        r if r > 0 => r - 1,
        r => declared + r,
    };
    if (0..declared).contains(&zero_based) {
        usize::try_from(zero_based).ok()
    } else {
        None
    }
}

/// Parse one non-blank, non-comment line. Unknown directives yield `None`.
fn parse_directive(line: &str, line_no: usize) -> Result<Option<Directive>, ObjError> {
    let (rest, keyword) = keyword(line).map_err(|e| parse_error(line_no, "", e))?;

    let result = match keyword {
        "v" => complete(position)(rest).map(|(_, p)| Directive::Position(p)),
        "vt" => complete(tex_coord)(rest).map(|(_, t)| Directive::TexCoord(t)),
        "vn" => complete(normal)(rest).map(|(_, n)| Directive::Normal(n)),
        "f" => complete(face)(rest).map(|(_, f)| Directive::Face(f)),
        _ => return Ok(None),
    };

    result
        .map(Some)
        .map_err(|e| parse_error(line_no, keyword, e))
}

fn parse_error(line: usize, keyword: &str, err: nom::Err<nom::error::Error<&str>>) -> ObjError {
    let message = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) if e.input.trim().is_empty() => {
            "unexpected end of line".to_string()
        }
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            format!("unexpected input `{}`", e.input.trim())
        }
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
    };
    ObjError::Parse {
        line,
        keyword: keyword.to_string(),
        message,
    }
}

/// Require `parser` to consume the rest of the line, allowing trailing blanks.
fn complete<'a, O>(
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    all_consuming(terminated(parser, space0))
}

fn keyword(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

/// A finite number; `nan` and `inf` are rejected.
fn component(input: &str) -> IResult<&str, f32> {
    preceded(space1, verify(float, |f: &f32| f.is_finite()))(input)
}

/// `x y z` followed by an optional weight or `r g b` vertex colour, both
/// ignored.
fn position(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, (x, y, z)) = tuple((component, component, component))(input)?;
    let (input, _) = many0(component)(input)?;
    Ok((input, Point3::new(x, y, z)))
}

/// `u [v [w]]`; a missing `v` defaults to zero.
fn tex_coord(input: &str) -> IResult<&str, Vector2<f32>> {
    let (input, u) = component(input)?;
    let (input, v) = opt(component)(input)?;
    let (input, _) = opt(component)(input)?;
    Ok((input, Vector2::new(u, v.unwrap_or(0.0))))
}

fn normal(input: &str) -> IResult<&str, Vector3<f32>> {
    let (input, (x, y, z)) = tuple((component, component, component))(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

fn face(input: &str) -> IResult<&str, Vec<RawElement>> {
    many0(preceded(space1, face_element))(input)
}

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`.
fn face_element(input: &str) -> IResult<&str, RawElement> {
    let (input, v) = index(input)?;
    let (input, rest) = opt(preceded(
        char('/'),
        pair(opt(index), opt(preceded(char('/'), opt(index)))),
    ))(input)?;

    let (vt, vn) = match rest {
        None => (0, 0),
        Some((vt, vn)) => (vt.unwrap_or(0), vn.flatten().unwrap_or(0)),
    };
    Ok((input, RawElement { v, vt, vn }))
}
