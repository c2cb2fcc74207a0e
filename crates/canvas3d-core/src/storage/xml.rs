//! XML encoding of designs.
//!
//! ```xml
//! <design author="..." version="1.0" date="MM/dd/yyyy">
//!   <layer>
//!     <shape type="rectangle" subtype="body" x="0" y="0" rotation="0">
//!       <point x="0" y="0"/>
//!       <point x="10" y="10"/>
//!     </shape>
//!   </layer>
//! </design>
//! ```

use super::{Design, DesignMetadata, StorageError, StorageResult};
use crate::layer::Layer;
use crate::shapes::{self, Shape, ShapeKind, ShapeTrait, SubType};
use kurbo::Point;
use roxmltree::Node;
use std::fmt::Write;

/// Serialize a design.
pub fn to_xml(design: &Design) -> String {
    let meta = &design.metadata;
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        r#"<design author="{}" version="{}" date="{}">"#,
        escape(&meta.author),
        escape(&meta.version),
        escape(&meta.date)
    );
    for layer in &design.layers {
        out.push_str("  <layer>\n");
        for shape in &layer.shapes {
            write_shape(&mut out, shape);
        }
        out.push_str("  </layer>\n");
    }
    out.push_str("</design>\n");
    out
}

fn write_shape(out: &mut String, shape: &Shape) {
    let base = shape.base();
    let _ = writeln!(
        out,
        r#"    <shape type="{}" subtype="{}" x="{}" y="{}" rotation="{}">"#,
        shape.kind().name(),
        base.subtype.name(),
        base.position.x,
        base.position.y,
        base.rotation
    );
    for p in shape.points() {
        let _ = writeln!(out, r#"      <point x="{}" y="{}"/>"#, p.x, p.y);
    }
    out.push_str("    </shape>\n");
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Parse a design. Nothing is returned unless the whole document is valid.
pub fn from_xml(text: &str) -> StorageResult<Design> {
    let doc = roxmltree::Document::parse(text).map_err(|e| StorageError::Xml(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "design" {
        return Err(StorageError::InvalidRoot(root.tag_name().name().to_string()));
    }

    let metadata = DesignMetadata {
        author: root.attribute("author").unwrap_or_default().to_string(),
        version: root.attribute("version").unwrap_or_default().to_string(),
        date: root.attribute("date").unwrap_or_default().to_string(),
    };

    let mut layers = Vec::new();
    for node in root.children().filter(Node::is_element) {
        match node.tag_name().name() {
            "layer" => layers.push(parse_layer(node)?),
            other => log::debug!("Skipping unknown element <{other}>"),
        }
    }

    if layers.is_empty() {
        return Err(StorageError::InvalidDocument("design has no layers".to_string()));
    }
    let count = layers[0].len();
    if layers.iter().any(|l| l.len() != count) {
        return Err(StorageError::InvalidDocument(
            "layers hold different numbers of shapes".to_string(),
        ));
    }

    Ok(Design { metadata, layers })
}

fn parse_layer(node: Node) -> StorageResult<Layer> {
    let mut layer = Layer::new();
    for child in node.children().filter(Node::is_element) {
        if child.tag_name().name() == "shape" {
            layer.shapes.push(parse_shape(child)?);
        }
    }
    Ok(layer)
}

fn parse_shape(node: Node) -> StorageResult<Shape> {
    let type_name = node
        .attribute("type")
        .ok_or_else(|| StorageError::InvalidShape("missing 'type' attribute".to_string()))?;
    let kind = ShapeKind::from_name(type_name)
        .ok_or_else(|| StorageError::InvalidShape(format!("unknown type '{type_name}'")))?;
    let subtype = match node.attribute("subtype") {
        Some(name) => SubType::from_name(name)
            .ok_or_else(|| StorageError::InvalidShape(format!("unknown subtype '{name}'")))?,
        None => SubType::Body,
    };
    let position = Point::new(number(node, "x")?, number(node, "y")?);
    let rotation = match node.attribute("rotation") {
        Some(_) => number(node, "rotation")?,
        None => 0.0,
    };

    let points = node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "point")
        .map(|n| Ok(Point::new(number(n, "x")?, number(n, "y")?)))
        .collect::<StorageResult<Vec<_>>>()?;

    shapes::reconstruct(kind, subtype, position, rotation, points)
        .map_err(|e| StorageError::InvalidShape(format!("{type_name}: {e}")))
}

fn number(node: Node, attribute: &str) -> StorageResult<f64> {
    let value = node.attribute(attribute).ok_or_else(|| {
        StorageError::InvalidShape(format!(
            "<{}> is missing '{attribute}'",
            node.tag_name().name()
        ))
    })?;
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| StorageError::InvalidNumber {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Polygon, Rectangle};

    fn sample() -> Design {
        let mut rect = Shape::Rectangle(Rectangle::from_corners(
            SubType::Body,
            Point::new(0.5, 0.25),
            Point::new(10.0, 10.0),
        ));
        rect.rotate(0.3);
        let mut poly = Polygon::from_points(
            SubType::Auxiliary,
            &[Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 3.0)],
        );
        poly.start_drawing();
        poly.complete_drawing().expect("valid polygon");
        let layer = Layer {
            shapes: vec![rect, Shape::Polygon(poly)],
        };
        Design {
            metadata: DesignMetadata {
                author: "A & B <c>".to_string(),
                version: "1.0".to_string(),
                date: "01/02/2024".to_string(),
            },
            layers: vec![layer.clone(), layer],
        }
    }

    #[test]
    fn test_roundtrip_preserves_geometry() {
        let design = sample();
        let parsed = from_xml(&to_xml(&design)).expect("parse");
        assert_eq!(parsed.metadata, design.metadata);
        assert_eq!(parsed.layers.len(), 2);
        let (a, b) = (&design.layers[1].shapes[0], &parsed.layers[1].shapes[0]);
        assert_eq!(a.base().position, b.base().position);
        assert_eq!(a.base().rotation, b.base().rotation);
        assert_eq!(a.points(), b.points());
        assert_eq!(parsed.layers[0].shapes[1].subtype(), SubType::Auxiliary);
        assert!(parsed.layers.iter().flat_map(|l| &l.shapes).all(|s| !s.is_drawing()));
    }

    #[test]
    fn test_wrong_root_rejected() {
        let result = from_xml("<drawing><layer/></drawing>");
        assert!(matches!(result, Err(StorageError::InvalidRoot(name)) if name == "drawing"));
    }

    #[test]
    fn test_malformed_xml_rejected() {
        assert!(matches!(from_xml("<design><layer>"), Err(StorageError::Xml(_))));
    }

    #[test]
    fn test_bad_number_rejected() {
        let text = r#"<design><layer>
            <shape type="rectangle" subtype="body" x="abc" y="0" rotation="0">
              <point x="0" y="0"/><point x="1" y="1"/>
            </shape></layer></design>"#;
        assert!(matches!(
            from_xml(text),
            Err(StorageError::InvalidNumber { attribute, .. }) if attribute == "x"
        ));
    }

    #[test]
    fn test_short_polygon_rejected() {
        let text = r#"<design><layer>
            <shape type="polygon" subtype="body" x="0" y="0" rotation="0">
              <point x="0" y="0"/><point x="1" y="1"/>
            </shape></layer></design>"#;
        assert!(matches!(from_xml(text), Err(StorageError::InvalidShape(_))));
    }

    #[test]
    fn test_unaligned_layers_rejected() {
        let text = r#"<design>
            <layer>
              <shape type="circle" subtype="body" x="0" y="0" rotation="0">
                <point x="0" y="0"/><point x="2" y="2"/>
              </shape>
            </layer>
            <layer/>
            </design>"#;
        assert!(matches!(from_xml(text), Err(StorageError::InvalidDocument(_))));
    }

    #[test]
    fn test_empty_design_rejected() {
        assert!(matches!(
            from_xml(r#"<design author="x"/>"#),
            Err(StorageError::InvalidDocument(_))
        ));
    }
}
