//! Decoded response documents.
//!
//! A response is an element tree. Results are looked up by key and the
//! first element under that key is the one that matters, the same
//! `Result[0]` convention the service has always used.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One XML element: its name, trimmed text content and child elements in
/// document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        self.text.trim()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// All children with the given name.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First child with the given name.
    pub fn first(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Follow a dotted path of first-children, e.g. `"Request.IsValid"`.
    pub fn path(&self, path: &str) -> Option<&Element> {
        path.split('.')
            .try_fold(self, |el, segment| el.first(segment))
    }

    /// Text of the first child with the given name, if present and non-empty.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.first(name).map(Element::text).filter(|t| !t.is_empty())
    }

    /// Render in the `key -> [element, ...]` shape: leaves become strings,
    /// every child name maps to the list of its occurrences.
    pub fn to_json(&self) -> Value {
        if self.children.is_empty() {
            return Value::String(self.text().to_string());
        }
        let mut map = Map::new();
        for child in &self.children {
            let entry = map
                .entry(child.name.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(child.to_json());
            }
        }
        Value::Object(map)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }
}

/// A response to one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    operation: String,
    root: Element,
}

impl Document {
    pub fn new(operation: impl Into<String>, root: Element) -> Self {
        Self {
            operation: operation.into(),
            root,
        }
    }

    /// Parse a response body. The outermost element (`<OpResponse>`) is the
    /// document root.
    pub fn parse(operation: &str, xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack = vec![Element::new("#document")];
        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::malformed(operation, format!("invalid XML: {e}")))?;
            match event {
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    stack.push(Element::new(name));
                }
                Event::Empty(empty) => {
                    let name = String::from_utf8_lossy(empty.local_name().as_ref()).into_owned();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Element::new(name));
                    }
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| Error::malformed(operation, format!("invalid text: {e}")))?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::End(_) => {
                    let closed = stack
                        .pop()
                        .ok_or_else(|| Error::malformed(operation, "unbalanced end tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(closed),
                        None => return Err(Error::malformed(operation, "unbalanced end tag")),
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() != 1 {
            return Err(Error::malformed(operation, "unexpected end of document"));
        }
        let root = stack
            .pop()
            .and_then(|doc| doc.children.into_iter().next())
            .ok_or_else(|| Error::malformed(operation, "empty document"))?;
        Ok(Self::new(operation, root))
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn request_id(&self) -> Option<&str> {
        self.root.path("OperationRequest.RequestId").map(Element::text)
    }

    /// Top-level errors reported outside any result element.
    pub fn errors(&self) -> Option<&Element> {
        self.root
            .path("OperationRequest.Errors")
            .or_else(|| self.root.first("Errors"))
    }

    /// The first element under `key`; a missing key is a malformed response.
    pub fn result(&self, key: &str) -> Result<&Element> {
        self.root.first(key).ok_or_else(|| {
            Error::malformed(&self.operation, format!("missing result element {key}"))
        })
    }

    /// The legacy `{"Key": [ ... ]}` view, without the operation envelope.
    pub fn to_json(&self) -> Value {
        let mut value = self.root.to_json();
        if let Value::Object(map) = &mut value {
            map.remove("OperationRequest");
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATE_HIT: &str = r#"<?xml version="1.0"?>
<CreateHITResponse>
  <OperationRequest><RequestId>ece2785b-6292-4b12-a60e-4c34847a7916</RequestId></OperationRequest>
  <HIT>
    <Request><IsValid>True</IsValid></Request>
    <HITId>GBHZVQX3EHXZ2AYDY2T0</HITId>
    <HITTypeId>NYVZTQ1QVKJZXCYZCZVZ</HITTypeId>
    <Question>&lt;HTMLQuestion&gt;</Question>
  </HIT>
</CreateHITResponse>"#;

    #[test]
    fn parses_result_under_its_key() {
        let doc = Document::parse("CreateHIT", CREATE_HIT).unwrap();
        assert_eq!(doc.root().name(), "CreateHITResponse");
        assert_eq!(
            doc.request_id(),
            Some("ece2785b-6292-4b12-a60e-4c34847a7916")
        );

        let hit = doc.result("HIT").unwrap();
        assert_eq!(hit.path("Request.IsValid").unwrap().text(), "True");
        assert_eq!(hit.child_text("HITId"), Some("GBHZVQX3EHXZ2AYDY2T0"));
        assert_eq!(hit.child_text("Question"), Some("<HTMLQuestion>"));
    }

    #[test]
    fn json_view_uses_arrays_per_key() {
        let doc = Document::parse("CreateHIT", CREATE_HIT).unwrap();
        let json = doc.to_json();
        assert_eq!(json["HIT"][0]["Request"][0]["IsValid"][0], "True");
        assert_eq!(json["HIT"][0]["HITId"][0], "GBHZVQX3EHXZ2AYDY2T0");
        assert!(json.get("OperationRequest").is_none());
    }

    #[test]
    fn missing_result_key_is_malformed() {
        let doc = Document::parse("CreateHIT", "<CreateHITResponse/>").unwrap();
        let err = doc.result("HIT").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn truncated_documents_are_rejected() {
        let err = Document::parse("GetHIT", "<GetHITResponse><HIT>").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
        assert!(Document::parse("GetHIT", "").is_err());
    }

    #[test]
    fn top_level_errors_are_found() {
        let doc = Document::parse(
            "GetHIT",
            "<ErrorResponse><Errors><Error><Code>AWS.NotAuthorized</Code></Error></Errors></ErrorResponse>",
        )
        .unwrap();
        let errors = doc.errors().unwrap();
        assert_eq!(errors.path("Error.Code").unwrap().text(), "AWS.NotAuthorized");
    }
}
