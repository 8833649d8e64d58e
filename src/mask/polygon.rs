//! Polygon/annotation model (C13)
//!
//! Parses a girder-style annotation JSON document into the polygon list
//! consumed by the rasterizer (C5) and tile-mask computer (C6):
//! `{"annotation": {"elements": [{"type": "polyline", "points": [...], "fillColor": "...", ...}]}}`.

use serde::Deserialize;
use serde_json::Value;
use std::fs;

use crate::tiff::errors::{TiffError, TiffResult};

/// A polygon region to redact: one or more rings of `(x, y)` vertices plus the
/// fill colour to composite over tiles it touches.
///
/// More than one ring means even-odd fill (a ring list rather than a single
/// point list), e.g. an outer boundary with a hole.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub rings: Vec<Vec<(f64, f64)>>,
    pub fill_color: String,
}

#[derive(Debug, Deserialize)]
struct AnnotationDocument {
    annotation: AnnotationBody,
}

#[derive(Debug, Deserialize)]
struct AnnotationBody {
    elements: Vec<AnnotationElement>,
}

#[derive(Debug, Deserialize)]
struct AnnotationElement {
    #[serde(rename = "type")]
    element_type: String,
    #[serde(default)]
    points: Value,
    #[serde(default = "default_color")]
    #[serde(rename = "fillColor")]
    fill_color: String,
    #[serde(default = "default_color")]
    #[serde(rename = "lineColor")]
    #[allow(dead_code)]
    line_color: String,
    #[serde(default = "default_line_width")]
    #[allow(dead_code)]
    #[serde(rename = "lineWidth")]
    line_width: f64,
}

fn default_color() -> String {
    "black".to_string()
}

fn default_line_width() -> f64 {
    1.0
}

/// Loads the polygon list from an annotation JSON file
///
/// Only `"type": "polyline"` elements contribute. `points` may be a single
/// ring (`[[x,y],...]`) or multiple rings (`[[[x,y],...],[[x,y],...]]`) —
/// detected by whether the first element of `points` is itself a list.
pub fn load_polygons(path: &str) -> TiffResult<Vec<Polygon>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| TiffError::InputMalformed(format!("cannot read annotation file {}: {}", path, e)))?;
    parse_annotation(&contents)
}

/// Parses an annotation document already read into a string
pub fn parse_annotation(contents: &str) -> TiffResult<Vec<Polygon>> {
    let doc: AnnotationDocument = serde_json::from_str(contents)
        .map_err(|e| TiffError::InputMalformed(format!("invalid annotation JSON: {}", e)))?;

    let mut polygons = Vec::new();
    for element in doc.annotation.elements {
        if element.element_type != "polyline" {
            continue;
        }
        let rings = parse_points(&element.points)?;
        if rings.is_empty() {
            continue;
        }
        polygons.push(Polygon { rings, fill_color: element.fill_color });
    }

    Ok(polygons)
}

fn parse_points(points: &Value) -> TiffResult<Vec<Vec<(f64, f64)>>> {
    let Value::Array(items) = points else {
        return Ok(Vec::new());
    };
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let is_multi_ring = matches!(items[0], Value::Array(ref inner) if inner.first().map(Value::is_array).unwrap_or(false));

    if is_multi_ring {
        let mut rings = Vec::with_capacity(items.len());
        for ring in items {
            rings.push(parse_ring(ring)?);
        }
        Ok(rings)
    } else {
        Ok(vec![parse_ring(points)?])
    }
}

fn parse_ring(ring: &Value) -> TiffResult<Vec<(f64, f64)>> {
    let Value::Array(points) = ring else {
        return Err(TiffError::InputMalformed("polygon ring is not an array".to_string()));
    };

    points
        .iter()
        .map(|p| {
            let Value::Array(coords) = p else {
                return Err(TiffError::InputMalformed("polygon vertex is not an array".to_string()));
            };
            let x = coords.first().and_then(Value::as_f64)
                .ok_or_else(|| TiffError::InputMalformed("polygon vertex missing x".to_string()))?;
            let y = coords.get(1).and_then(Value::as_f64)
                .ok_or_else(|| TiffError::InputMalformed("polygon vertex missing y".to_string()))?;
            Ok((x, y))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_ring_triangle() {
        let json = r#"{
            "annotation": {
                "elements": [
                    {"type": "polyline", "points": [[10,10,0],[200,10,0],[10,200,0]], "fillColor": "red"}
                ]
            }
        }"#;
        let polygons = parse_annotation(json).unwrap();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].rings.len(), 1);
        assert_eq!(polygons[0].rings[0], vec![(10.0, 10.0), (200.0, 10.0), (10.0, 200.0)]);
        assert_eq!(polygons[0].fill_color, "red");
    }

    #[test]
    fn non_polyline_elements_are_skipped() {
        let json = r#"{"annotation": {"elements": [{"type": "rectangle", "points": [[0,0,0]]}]}}"#;
        assert!(parse_annotation(json).unwrap().is_empty());
    }

    #[test]
    fn defaults_fill_color_to_black() {
        let json = r#"{"annotation": {"elements": [
            {"type": "polyline", "points": [[0,0],[1,0],[1,1]]}
        ]}}"#;
        let polygons = parse_annotation(json).unwrap();
        assert_eq!(polygons[0].fill_color, "black");
    }

    #[test]
    fn multi_ring_polygon_detected() {
        let json = r#"{"annotation": {"elements": [
            {"type": "polyline", "points": [
                [[0,0],[10,0],[10,10],[0,10]],
                [[3,3],[7,3],[7,7],[3,7]]
            ], "fillColor": "blue"}
        ]}}"#;
        let polygons = parse_annotation(json).unwrap();
        assert_eq!(polygons[0].rings.len(), 2);
    }
}
