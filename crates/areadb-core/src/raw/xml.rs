// crates/areadb-core/src/raw/xml.rs
use crate::error::{AreaError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Minimal element tree: local names only, text concatenated per element.
#[derive(Debug, Default)]
pub(crate) struct XmlNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn named(name: &str) -> Self {
        XmlNode {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn from_start(e: &BytesStart<'_>) -> Self {
        let attrs = e
            .attributes()
            .flatten()
            .map(|a| {
                (
                    String::from_utf8_lossy(a.key.local_name().as_ref()).into_owned(),
                    String::from_utf8_lossy(&a.value).into_owned(),
                )
            })
            .collect();
        XmlNode {
            name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
            attrs,
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first child with this name.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(|c| c.text.trim().to_string())
    }
}

/// Parses a whole document. The returned node is a synthetic `#document`
/// whose children are the top-level elements.
pub(crate) fn parse(text: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(text);
    let mut stack = vec![XmlNode::named("#document")];

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => stack.push(XmlNode::from_start(e)),
            Event::Empty(ref e) => attach(&mut stack, XmlNode::from_start(e))?,
            Event::Text(ref e) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| AreaError::InvalidData("unbalanced closing tag".into()))?;
                attach(&mut stack, node)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match stack.len() {
        1 => Ok(stack.remove(0)),
        _ => Err(AreaError::InvalidData(
            "document ended inside an open element".into(),
        )),
    }
}

fn attach(stack: &mut [XmlNode], node: XmlNode) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None => Err(AreaError::InvalidData("unbalanced closing tag".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tree_with_local_names() {
        let doc = parse(
            r#"<?xml version="1.0"?>
            <kml:kml xmlns:kml="http://www.opengis.net/kml/2.2">
              <kml:Data name="a"><kml:value>x &amp; y</kml:value></kml:Data>
              <empty/>
            </kml:kml>"#,
        )
        .unwrap();
        let kml = doc.child("kml").unwrap();
        let data = kml.child("Data").unwrap();
        assert_eq!(data.attr("name"), Some("a"));
        assert_eq!(data.child_text("value").as_deref(), Some("x & y"));
        assert!(kml.child("empty").is_some());
    }

    #[test]
    fn unclosed_document_is_rejected() {
        assert!(parse("<kml><Document>").is_err());
    }
}
