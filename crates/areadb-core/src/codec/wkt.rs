// crates/areadb-core/src/codec/wkt.rs

//! # Well-Known Text
//!
//! Writer: one WKT string per feature, joined with `\n`.
//! Reader: any number of WKT geometries separated by whitespace, newlines
//! or `;`, each parsed by the `wkt` crate. `Z`, `M` and `ZM` tags are
//! accepted (measures are discarded).

use crate::error::{AreaError, Result};
use crate::geometry::{FeatureCollection, Geometry, Position};
use crate::normalize::ParsedInput;
use std::fmt::Write as _;
use std::str::FromStr;
use wkt::types::{Coord, LineString, Polygon};
use wkt::Wkt;

// -----------------------------------------------------------------------------
// WRITER
// -----------------------------------------------------------------------------

/// Fails with [`AreaError::EmptyCollection`] when there is nothing to write.
pub fn encode(model: &FeatureCollection) -> Result<Vec<u8>> {
    if model.is_empty() {
        return Err(AreaError::EmptyCollection { format: "WKT" });
    }
    let lines: Vec<String> = model.features.iter().map(|f| stringify(&f.geometry)).collect();
    Ok(lines.join("\n").into_bytes())
}

/// WKT of a single geometry.
///
/// The `Z` tag is written only when every position carries a `z`; mixed
/// geometries are written in 2D. Empty lines, rings and member polygons
/// are left out; a polygon whose outer ring is empty counts as empty.
pub fn stringify(geometry: &Geometry) -> String {
    let has_z = !geometry.is_empty() && geometry.positions().all(|p| p.z.is_some());
    let mut out = String::new();
    write_geometry(&mut out, geometry, has_z);
    out
}

fn write_geometry(out: &mut String, geometry: &Geometry, has_z: bool) {
    out.push_str(&geometry.kind().to_ascii_uppercase());
    if is_blank(geometry) {
        out.push_str(" EMPTY");
        return;
    }
    if has_z {
        out.push_str(" Z");
    }
    out.push(' ');

    match geometry {
        Geometry::Point { coordinates } => {
            out.push('(');
            write_position(out, coordinates, has_z);
            out.push(')');
        }
        Geometry::LineString { coordinates } => write_positions(out, coordinates, has_z),
        Geometry::Polygon { coordinates } => write_polygon(out, coordinates, has_z),
        Geometry::MultiLineString { coordinates } => {
            let lines: Vec<_> = coordinates.iter().filter(|l| !l.is_empty()).collect();
            write_list(out, &lines, |out, line| write_positions(out, line, has_z));
        }
        Geometry::MultiPoint { coordinates } => {
            write_list(out, coordinates, |out, p| {
                out.push('(');
                write_position(out, p, has_z);
                out.push(')');
            });
        }
        Geometry::MultiPolygon { coordinates } => {
            let polygons: Vec<_> = coordinates
                .iter()
                .filter(|p| !writable_rings(p).is_empty())
                .collect();
            write_list(out, &polygons, |out, polygon| write_polygon(out, polygon, has_z));
        }
        Geometry::GeometryCollection { geometries } => {
            write_list(out, geometries, |out, g| write_geometry(out, g, has_z));
        }
    }
}

/// Rings worth writing: none if the outer ring is empty, else the
/// non-empty ones.
fn writable_rings(rings: &[Vec<Position>]) -> Vec<&Vec<Position>> {
    match rings.first() {
        Some(outer) if !outer.is_empty() => rings.iter().filter(|r| !r.is_empty()).collect(),
        _ => Vec::new(),
    }
}

fn is_blank(geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Polygon { coordinates } => writable_rings(coordinates).is_empty(),
        Geometry::MultiPolygon { coordinates } => {
            coordinates.iter().all(|p| writable_rings(p).is_empty())
        }
        Geometry::GeometryCollection { geometries } => geometries.is_empty(),
        other => other.is_empty(),
    }
}

fn write_polygon(out: &mut String, rings: &[Vec<Position>], has_z: bool) {
    write_list(out, &writable_rings(rings), |out, ring| write_positions(out, ring, has_z));
}

fn write_list<T>(out: &mut String, items: &[T], mut item: impl FnMut(&mut String, &T)) {
    out.push('(');
    for (i, it) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item(out, it);
    }
    out.push(')');
}

fn write_positions(out: &mut String, positions: &[Position], has_z: bool) {
    write_list(out, positions, |out, p| write_position(out, p, has_z));
}

fn write_position(out: &mut String, p: &Position, has_z: bool) {
    let _ = write!(out, "{} {}", p.x, p.y);
    if has_z {
        if let Some(z) = p.z {
            let _ = write!(out, " {z}");
        }
    }
}

// -----------------------------------------------------------------------------
// READER
// -----------------------------------------------------------------------------

pub fn decode(bytes: &[u8]) -> Result<ParsedInput> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AreaError::malformed("WKT", format!("input is not UTF-8: {e}")))?;
    Ok(ParsedInput::Geometries(parse_all(text)?))
}

/// Parses every geometry in `text`.
pub fn parse_all(text: &str) -> Result<Vec<Geometry>> {
    split(text).into_iter().map(parse_one).collect()
}

/// Parses exactly one geometry.
pub fn parse(text: &str) -> Result<Geometry> {
    let mut all = parse_all(text)?;
    match all.len() {
        1 => Ok(all.remove(0)),
        n => Err(AreaError::malformed(
            "WKT",
            format!("expected one geometry, found {n}"),
        )),
    }
}

fn parse_one(text: &str) -> Result<Geometry> {
    let parsed = Wkt::<f64>::from_str(text)
        .map_err(|e| AreaError::malformed("WKT", format!("{e}: {text}")))?;
    from_wkt(parsed)
}

/// Cuts `text` into one slice per top-level geometry.
///
/// A geometry ends at the parenthesis that closes its outermost list, at a
/// trailing `EMPTY`, or at a `;`. Unbalanced input is passed on whole so
/// that the parser reports it.
fn split(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut depth = 0usize;

    for (i, c) in text.char_indices() {
        let end = i + c.len_utf8();
        match c {
            '(' => {
                start.get_or_insert(i);
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        out.push(&text[s..end]);
                    }
                }
            }
            ';' if depth == 0 => {
                if let Some(s) = start.take() {
                    out.push(text[s..i].trim());
                }
            }
            c if c.is_whitespace() => {}
            _ => {
                let s = *start.get_or_insert(i);
                let next_is_word = text[end..].chars().next().is_some_and(char::is_alphanumeric);
                if depth == 0 && !next_is_word && ends_with_empty(&text[s..end]) {
                    out.push(&text[s..end]);
                    start = None;
                }
            }
        }
    }
    if let Some(s) = start {
        let rest = text[s..].trim();
        if !rest.is_empty() {
            out.push(rest);
        }
    }
    out
}

fn ends_with_empty(chunk: &str) -> bool {
    let Some(split_at) = chunk.len().checked_sub(5) else {
        return false;
    };
    let word_start = chunk[..split_at]
        .chars()
        .next_back()
        .map_or(true, char::is_whitespace);
    word_start
        && chunk
            .get(split_at..)
            .is_some_and(|w| w.eq_ignore_ascii_case("EMPTY"))
}

fn from_wkt(parsed: Wkt<f64>) -> Result<Geometry> {
    Ok(match parsed {
        Wkt::Point(p) => match p.0 {
            Some(c) => Geometry::Point {
                coordinates: position(c)?,
            },
            None => return Err(AreaError::malformed("WKT", "POINT EMPTY has no position")),
        },
        Wkt::LineString(line) => Geometry::LineString {
            coordinates: positions(line)?,
        },
        Wkt::Polygon(polygon) => Geometry::Polygon {
            coordinates: rings(polygon)?,
        },
        Wkt::MultiPoint(points) => Geometry::MultiPoint {
            coordinates: points
                .0
                .into_iter()
                .filter_map(|p| p.0)
                .map(position)
                .collect::<Result<_>>()?,
        },
        Wkt::MultiLineString(lines) => Geometry::MultiLineString {
            coordinates: lines.0.into_iter().map(positions).collect::<Result<_>>()?,
        },
        Wkt::MultiPolygon(polygons) => Geometry::MultiPolygon {
            coordinates: polygons.0.into_iter().map(rings).collect::<Result<_>>()?,
        },
        Wkt::GeometryCollection(collection) => Geometry::GeometryCollection {
            geometries: collection.0.into_iter().map(from_wkt).collect::<Result<_>>()?,
        },
    })
}

fn rings(polygon: Polygon<f64>) -> Result<Vec<Vec<Position>>> {
    polygon.0.into_iter().map(positions).collect()
}

fn positions(line: LineString<f64>) -> Result<Vec<Position>> {
    line.0.into_iter().map(position).collect()
}

fn position(c: Coord<f64>) -> Result<Position> {
    let finite = c.x.is_finite() && c.y.is_finite() && c.z.map_or(true, f64::is_finite);
    if !finite {
        return Err(AreaError::InvalidCoordinate {
            value: format!("{} {}", c.x, c.y),
        });
    }
    Ok(match c.z {
        Some(z) => Position::with_z(c.x, c.y, z),
        None => Position::new(c.x, c.y),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Feature;

    fn square() -> Vec<Position> {
        vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 0.0),
            Position::new(1.0, 1.0),
            Position::new(0.0, 1.0),
            Position::new(0.0, 0.0),
        ]
    }

    #[test]
    fn writes_every_geometry_kind() {
        assert_eq!(stringify(&Geometry::point(6.5, 52.25)), "POINT (6.5 52.25)");
        assert_eq!(
            stringify(&Geometry::polygon(vec![square()])),
            "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))"
        );
        assert_eq!(
            stringify(&Geometry::MultiPoint {
                coordinates: vec![Position::new(1.0, 2.0), Position::new(3.0, 4.0)]
            }),
            "MULTIPOINT ((1 2), (3 4))"
        );
        assert_eq!(
            stringify(&Geometry::GeometryCollection {
                geometries: vec![
                    Geometry::point(1.0, 2.0),
                    Geometry::line_string(vec![Position::new(0.0, 0.0), Position::new(1.5, -1.0)])
                ]
            }),
            "GEOMETRYCOLLECTION (POINT (1 2), LINESTRING (0 0, 1.5 -1))"
        );
        assert_eq!(
            stringify(&Geometry::MultiPolygon { coordinates: vec![] }),
            "MULTIPOLYGON EMPTY"
        );
        assert_eq!(
            stringify(&Geometry::Point {
                coordinates: Position::with_z(1.0, 2.0, 3.0)
            }),
            "POINT Z (1 2 3)"
        );
    }

    #[test]
    fn one_line_per_feature() {
        let model = FeatureCollection::from_features(vec![
            Feature::new(Geometry::point(1.0, 2.0)),
            Feature::new(Geometry::point(3.0, 4.0)),
        ]);
        let text = String::from_utf8(encode(&model).unwrap()).unwrap();
        assert_eq!(text, "POINT (1 2)\nPOINT (3 4)");
    }

    #[test]
    fn empty_collection_is_an_error() {
        assert!(matches!(
            encode(&FeatureCollection::new()),
            Err(AreaError::EmptyCollection { format: "WKT" })
        ));
    }

    #[test]
    fn reads_what_it_writes() {
        let geometries = vec![
            Geometry::point(6.0899, 52.2558),
            Geometry::polygon(vec![square()]),
            Geometry::MultiPolygon {
                coordinates: vec![vec![square()], vec![square()]],
            },
            Geometry::GeometryCollection {
                geometries: vec![Geometry::point(-1.25, 1e-7)],
            },
        ];
        for g in geometries {
            assert_eq!(parse(&stringify(&g)).unwrap(), g);
        }
    }

    #[test]
    fn reader_is_lenient_about_syntax() {
        let all = parse_all("POINT(1 2); MULTIPOINT ((3 4), (5 6))\nLINESTRING Z (0 0 1, 1 1 2)").unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], Geometry::point(1.0, 2.0));
        assert_eq!(
            all[1],
            Geometry::MultiPoint {
                coordinates: vec![Position::new(3.0, 4.0), Position::new(5.0, 6.0)]
            }
        );
        assert_eq!(
            all[2],
            Geometry::line_string(vec![Position::with_z(0.0, 0.0, 1.0), Position::with_z(1.0, 1.0, 2.0)])
        );

        let m = parse("POINT M (1 2 9)").unwrap();
        assert_eq!(m, Geometry::point(1.0, 2.0));
        assert!(parse_all("").unwrap().is_empty());
    }

    #[test]
    fn empty_members_are_left_out() {
        let multi = Geometry::MultiPolygon {
            coordinates: vec![vec![square()], vec![]],
        };
        let text = stringify(&multi);
        assert_eq!(text, "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 1, 0 0)))");
        assert_eq!(
            parse(&text).unwrap(),
            Geometry::MultiPolygon {
                coordinates: vec![vec![square()]]
            }
        );

        let holey = Geometry::polygon(vec![square(), vec![]]);
        assert_eq!(stringify(&holey), "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))");

        // No outer ring: the holes alone do not make a polygon.
        let hollow = Geometry::polygon(vec![vec![], square()]);
        assert_eq!(stringify(&hollow), "POLYGON EMPTY");

        let lines = Geometry::MultiLineString {
            coordinates: vec![vec![], vec![Position::new(0.0, 0.0), Position::new(1.0, 1.0)]],
        };
        assert_eq!(stringify(&lines), "MULTILINESTRING ((0 0, 1 1))");
    }

    #[test]
    fn splits_on_closing_parens_and_empty() {
        assert_eq!(
            split("POINT (1 2) LINESTRING EMPTY;POLYGON ((0 0, 1 0, 0 1, 0 0))"),
            ["POINT (1 2)", "LINESTRING EMPTY", "POLYGON ((0 0, 1 0, 0 1, 0 0))"]
        );
        assert_eq!(split("  \n; "), Vec::<&str>::new());
    }

    #[test]
    fn reader_reports_bad_input() {
        assert!(matches!(parse("POINT (1)"), Err(AreaError::MalformedGeometry { .. })));
        assert!(matches!(parse("POINT (1 2"), Err(AreaError::MalformedGeometry { .. })));
        assert!(matches!(parse("CIRCLE (1 2)"), Err(AreaError::MalformedGeometry { .. })));
        assert!(matches!(parse("POINT EMPTY"), Err(AreaError::MalformedGeometry { .. })));
    }
}
