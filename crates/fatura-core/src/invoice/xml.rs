//! Minimal namespace-aware element tree built on quick-xml.

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::ExtractionError;

/// One XML element with its resolved namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Namespace URI the element is bound to, if any.
    pub namespace: Option<String>,
    /// Local name without prefix.
    pub name: String,
    /// Concatenated text content directly inside this element.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<XmlElement, ExtractionError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let (ns, event) = reader
                .read_resolved_event()
                .map_err(|e| ExtractionError::Xml(e.to_string()))?;
            let namespace = namespace_uri(&ns);

            match event {
                Event::Start(e) => {
                    stack.push(XmlElement {
                        namespace,
                        name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                        ..Default::default()
                    });
                }
                Event::Empty(e) => {
                    let element = XmlElement {
                        namespace,
                        name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                        ..Default::default()
                    };
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ExtractionError::Xml("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| ExtractionError::Xml(e.to_string()))?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Event::CData(c) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(ExtractionError::Xml("unclosed element at end of document".to_string()));
        }
        root.ok_or_else(|| ExtractionError::Xml("document has no root element".to_string()))
    }

    fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// All elements below this one, in document order.
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }

    /// First element matching `.//path[0]/path[1]/...` below this one.
    pub fn find(&self, namespace: &str, path: &[&str]) -> Option<&XmlElement> {
        let (first, rest) = path.split_first()?;
        self.descendants()
            .into_iter()
            .filter(|d| d.is(namespace, first))
            .find_map(|d| d.child_path(namespace, rest))
    }

    /// Every element matching `.//name` below this one.
    pub fn find_all(&self, namespace: &str, name: &str) -> Vec<&XmlElement> {
        self.descendants()
            .into_iter()
            .filter(|d| d.is(namespace, name))
            .collect()
    }

    fn child_path(&self, namespace: &str, path: &[&str]) -> Option<&XmlElement> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        self.children
            .iter()
            .filter(|c| c.is(namespace, first))
            .find_map(|c| c.child_path(namespace, rest))
    }
}

fn namespace_uri(ns: &ResolveResult<'_>) -> Option<String> {
    match ns {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        _ => None,
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), ExtractionError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ExtractionError::Xml("multiple root elements".to_string())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "urn:test";

    #[test]
    fn test_parse_and_find() {
        let xml = r#"<?xml version="1.0"?>
            <a xmlns="urn:test"><b><c>one</c></b><b><d>two</d></b><x:c xmlns:x="urn:other">skip</x:c></a>"#;
        let root = XmlElement::parse(xml).unwrap();

        assert_eq!(root.name, "a");
        assert_eq!(root.find(NS, &["b", "d"]).map(|e| e.text.as_str()), Some("two"));
        assert_eq!(root.find(NS, &["c"]).map(|e| e.text.as_str()), Some("one"));
        assert_eq!(root.find_all(NS, "b").len(), 2);
        assert_eq!(root.find_all(NS, "c").len(), 1);
        assert!(root.find(NS, &["b", "e"]).is_none());
    }

    #[test]
    fn test_unprefixed_without_namespace_does_not_match() {
        let root = XmlElement::parse("<a><b>1</b></a>").unwrap();
        assert!(root.find(NS, &["b"]).is_none());
    }

    #[test]
    fn test_malformed() {
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("<a>").is_err());
        assert!(XmlElement::parse("").is_err());
    }
}
