// crates/areadb-core/src/raw/kml.rs

//! # KML Document Tree
//!
//! KML is a tree of containers (`Document`, `Folder`) holding placemarks,
//! which in turn hold geometries that may nest (`MultiGeometry`). The tree
//! is modelled as tagged variants and walked with an explicit recursive
//! visitor ([`KmlDocument::flatten`]), so callers select nodes by variant
//! instead of inspecting types at runtime.
//!
//! Coordinates are `lon,lat[,alt]` tuples separated by whitespace.

use super::xml::{self, XmlNode};
use crate::error::{AreaError, Result};
use crate::geometry::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct KmlDocument {
    pub elements: Vec<KmlElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KmlElement {
    Container(Container),
    Placemark(Placemark),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Document,
    Folder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub kind: ContainerKind,
    pub name: Option<String>,
    pub children: Vec<KmlElement>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placemark {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `ExtendedData` entries (`Data/value` and `SchemaData/SimpleData`),
    /// in document order.
    pub data: Vec<(String, String)>,
    pub geometry: Option<KmlGeometry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KmlGeometry {
    Point(Position),
    LineString(Vec<Position>),
    LinearRing(Vec<Position>),
    Polygon(KmlPolygon),
    MultiGeometry(Vec<KmlGeometry>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KmlPolygon {
    pub outer: Vec<Position>,
    pub inner: Vec<Vec<Position>>,
}

/// One node of the flattened tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KmlNode<'a> {
    Container(&'a Container),
    Placemark(&'a Placemark),
    Geometry(&'a KmlGeometry),
}

// -----------------------------------------------------------------------------
// TRAVERSAL
// -----------------------------------------------------------------------------

impl KmlDocument {
    /// Parses KML text.
    ///
    /// Unknown elements are skipped; malformed coordinates are an error.
    pub fn parse(text: &str) -> Result<Self> {
        let doc = xml::parse(text)?;
        // Accept a bare Document/Placemark root as well as the usual <kml>.
        let root = doc.child("kml").unwrap_or(&doc);
        Ok(KmlDocument {
            elements: elements(root)?,
        })
    }

    /// Every container, placemark and geometry in document order
    /// (pre-order: a node is followed by its descendants).
    pub fn flatten(&self) -> Vec<KmlNode<'_>> {
        let mut out = Vec::new();
        for element in &self.elements {
            element.visit(&mut out);
        }
        out
    }

    pub fn first_placemark(&self) -> Option<&Placemark> {
        self.flatten().into_iter().find_map(|node| match node {
            KmlNode::Placemark(p) => Some(p),
            _ => None,
        })
    }

    pub fn first_polygon(&self) -> Option<&KmlPolygon> {
        self.flatten().into_iter().find_map(|node| match node {
            KmlNode::Geometry(KmlGeometry::Polygon(p)) => Some(p),
            _ => None,
        })
    }

    /// All placemarks, in document order.
    pub fn placemarks(&self) -> Vec<&Placemark> {
        self.flatten()
            .into_iter()
            .filter_map(|node| match node {
                KmlNode::Placemark(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}

impl KmlElement {
    fn visit<'a>(&'a self, out: &mut Vec<KmlNode<'a>>) {
        match self {
            KmlElement::Container(c) => {
                out.push(KmlNode::Container(c));
                for child in &c.children {
                    child.visit(out);
                }
            }
            KmlElement::Placemark(p) => {
                out.push(KmlNode::Placemark(p));
                if let Some(g) = &p.geometry {
                    g.visit(out);
                }
            }
        }
    }
}

impl KmlGeometry {
    fn visit<'a>(&'a self, out: &mut Vec<KmlNode<'a>>) {
        out.push(KmlNode::Geometry(self));
        if let KmlGeometry::MultiGeometry(parts) = self {
            for part in parts {
                part.visit(out);
            }
        }
    }
}

// -----------------------------------------------------------------------------
// CONVERSION (XML -> KML)
// -----------------------------------------------------------------------------

fn elements(node: &XmlNode) -> Result<Vec<KmlElement>> {
    let mut out = Vec::new();
    for child in &node.children {
        if let Some(e) = element(child)? {
            out.push(e);
        }
    }
    Ok(out)
}

fn element(node: &XmlNode) -> Result<Option<KmlElement>> {
    let kind = match node.name.as_str() {
        "Document" => ContainerKind::Document,
        "Folder" => ContainerKind::Folder,
        "Placemark" => return placemark(node).map(|p| Some(KmlElement::Placemark(p))),
        _ => return Ok(None),
    };
    Ok(Some(KmlElement::Container(Container {
        kind,
        name: node.child_text("name"),
        children: elements(node)?,
    })))
}

fn placemark(node: &XmlNode) -> Result<Placemark> {
    let mut geometry_out = None;
    for child in &node.children {
        if let Some(g) = geometry(child)? {
            geometry_out = Some(g);
            break;
        }
    }
    Ok(Placemark {
        name: node.child_text("name"),
        description: node.child_text("description"),
        data: node.child("ExtendedData").map(extended_data).unwrap_or_default(),
        geometry: geometry_out,
    })
}

fn extended_data(node: &XmlNode) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for data in node.children_named("Data") {
        if let Some(name) = data.attr("name") {
            let value = data.child_text("value").unwrap_or_default();
            out.push((name.to_string(), value));
        }
    }
    for schema in node.children_named("SchemaData") {
        for simple in schema.children_named("SimpleData") {
            if let Some(name) = simple.attr("name") {
                out.push((name.to_string(), simple.text.trim().to_string()));
            }
        }
    }
    out
}

fn geometry(node: &XmlNode) -> Result<Option<KmlGeometry>> {
    let g = match node.name.as_str() {
        "Point" => match coordinates_of(node)?.into_iter().next() {
            Some(p) => KmlGeometry::Point(p),
            None => return Ok(None),
        },
        "LineString" => KmlGeometry::LineString(coordinates_of(node)?),
        "LinearRing" => KmlGeometry::LinearRing(coordinates_of(node)?),
        "Polygon" => {
            let outer = match node.child("outerBoundaryIs") {
                Some(b) => ring_of(b)?,
                None => Vec::new(),
            };
            let mut inner = Vec::new();
            for boundary in node.children_named("innerBoundaryIs") {
                inner.push(ring_of(boundary)?);
            }
            KmlGeometry::Polygon(KmlPolygon { outer, inner })
        }
        "MultiGeometry" => {
            let mut parts = Vec::new();
            for child in &node.children {
                if let Some(g) = geometry(child)? {
                    parts.push(g);
                }
            }
            KmlGeometry::MultiGeometry(parts)
        }
        _ => return Ok(None),
    };
    Ok(Some(g))
}

fn ring_of(boundary: &XmlNode) -> Result<Vec<Position>> {
    match boundary.child("LinearRing") {
        Some(ring) => coordinates_of(ring),
        None => Ok(Vec::new()),
    }
}

fn coordinates_of(node: &XmlNode) -> Result<Vec<Position>> {
    match node.child("coordinates") {
        Some(c) => parse_coordinates(&c.text),
        None => Ok(Vec::new()),
    }
}

/// Parses a KML `<coordinates>` body: `lon,lat[,alt]` tuples separated by
/// whitespace. Whitespace around commas is tolerated.
pub fn parse_coordinates(text: &str) -> Result<Vec<Position>> {
    let joined = text.split(',').map(str::trim).collect::<Vec<_>>().join(",");
    joined
        .split_whitespace()
        .map(|tuple| {
            let numbers = tuple
                .split(',')
                .map(parse_number)
                .collect::<Result<Vec<f64>>>()?;
            match numbers.as_slice() {
                [x, y] => Ok(Position::new(*x, *y)),
                [x, y, z] => Ok(Position::with_z(*x, *y, *z)),
                _ => Err(AreaError::InvalidCoordinate {
                    value: tuple.to_string(),
                }),
            }
        })
        .collect()
}

fn parse_number(text: &str) -> Result<f64> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AreaError::InvalidCoordinate {
            value: text.to_string(),
        }),
    }
}
