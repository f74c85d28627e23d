//! XML to JSON conversion.
//!
//! Elements become objects keyed by child name, attributes become `@name`
//! keys and character data becomes `#text`. An element holding only text
//! collapses to a plain string. Repeated children turn into arrays.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};
use tessera_application::{ExtensionError, FilterDefinition, FilterRun};

use super::text_of;

const TEXT_KEY: &str = "#text";

/// `response_body | xml_to_json`
#[must_use]
pub fn xml_to_json_filter() -> FilterDefinition {
    FilterDefinition::new(
        "xml_to_json",
        FilterRun::sync(|_, input, _| xml_to_json(&text_of(&input)).map_err(ExtensionError::new)),
    )
    .with_display_name("XML to JSON")
    .with_description("Convert an XML document into a JSON value")
}

struct Element {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
        let mut fields = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| format!("invalid XML attribute: {e}"))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).to_string();
            let value = attribute
                .unescape_value()
                .map_err(|e| format!("invalid XML attribute value: {e}"))?;
            fields.insert(format!("@{key}"), Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.fields.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }

    fn into_value(self) -> Value {
        let text = self.text.trim();
        if self.fields.is_empty() {
            return if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            };
        }
        let mut fields = self.fields;
        if !text.is_empty() {
            fields.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
        }
        Value::Object(fields)
    }
}

/// Parses an XML document into `{root_name: value}`.
///
/// # Errors
/// Returns an error if the document is malformed or has no root element.
pub fn xml_to_json(xml: &str) -> Result<Value, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut document = Map::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(Element::open(&start)?),
            Ok(Event::Empty(start)) => {
                let element = Element::open(&start)?;
                close(&mut stack, &mut document, element);
            }
            Ok(Event::End(_)) => {
                let Some(element) = stack.pop() else {
                    return Err("unexpected closing tag".to_string());
                };
                close(&mut stack, &mut document, element);
            }
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|e| format!("invalid XML text: {e}"))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "invalid XML at position {}: {e}",
                    reader.error_position()
                ));
            }
        }
    }

    if !stack.is_empty() {
        return Err("unclosed XML element".to_string());
    }
    if document.is_empty() {
        return Err("XML document has no root element".to_string());
    }
    Ok(Value::Object(document))
}

fn close(stack: &mut [Element], document: &mut Map<String, Value>, element: Element) {
    let name = element.name.clone();
    let value = element.into_value();
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value),
        None => {
            document.insert(name, value);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_nested_elements_and_attributes() {
        let xml = r#"<?xml version="1.0"?>
            <order id="7">
              <item sku="a">Apple</item>
              <item sku="b">Pear</item>
              <note>fresh &amp; ripe</note>
              <empty/>
            </order>"#;
        let value = xml_to_json(xml).unwrap();
        assert_eq!(
            value,
            json!({
                "order": {
                    "@id": "7",
                    "item": [
                        {"@sku": "a", "#text": "Apple"},
                        {"@sku": "b", "#text": "Pear"}
                    ],
                    "note": "fresh & ripe",
                    "empty": null
                }
            })
        );
    }

    #[test]
    fn test_cdata_is_text() {
        let value = xml_to_json("<a><![CDATA[<raw>]]></a>").unwrap();
        assert_eq!(value, json!({"a": "<raw>"}));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(xml_to_json("<a><b></a>").is_err());
        assert!(xml_to_json("<a>").is_err());
        assert!(xml_to_json("just text").is_err());
    }
}
