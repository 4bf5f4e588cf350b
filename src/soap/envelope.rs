//! SOAP 1.1 envelope construction and result extraction.
//!
//! Requests are produced by string templating. Parameter values are inserted
//! verbatim, without XML escaping: the legacy service has only ever been fed
//! unescaped values and its tolerance for entity-encoded input is unknown.
//!
//! Responses are parsed generically into a `serde_json::Value` tree keyed by
//! local element names, then the result is read from a fixed path.

use serde_json::{Map, Value};
use xmltree::{Element, XMLNode};

/// Namespace the legacy web service declares on every method element.
pub const SERVICE_NAMESPACE: &str = "http://tempuri.org/";

/// Builds the SOAP request document for `method`.
///
/// Returns `None` when `names` and `values` differ in length; nothing is
/// emitted in that case.
///
/// # Example
///
/// ```
/// use qrscan_gateway::soap::build_envelope;
///
/// let xml = build_envelope("DajWebQRScanKorisnik", &["QRScanKorisnikSK"], &["42"]).unwrap();
/// assert!(xml.contains("<QRScanKorisnikSK>42</QRScanKorisnikSK>"));
/// assert!(build_envelope("DajWebQRScanKorisnik", &["a", "b"], &["1"]).is_none());
/// ```
pub fn build_envelope(method: &str, names: &[&str], values: &[&str]) -> Option<String> {
    if names.len() != values.len() {
        return None;
    }

    let call = if names.is_empty() {
        format!(r#"<{method} xmlns="{SERVICE_NAMESPACE}" />"#)
    } else {
        let params: String = names
            .iter()
            .zip(values)
            .map(|(name, value)| format!("      <{name}>{value}</{name}>\n"))
            .collect();
        format!("<{method} xmlns=\"{SERVICE_NAMESPACE}\">\n{params}    </{method}>")
    };

    Some(format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    {call}
  </soap:Body>
</soap:Envelope>"#
    ))
}

/// Parses an XML document into a generic value tree.
///
/// The root element becomes the single key of the returned object. Namespace
/// prefixes are dropped, attributes are ignored, leaf elements become their
/// trimmed text and repeated siblings collapse into an array.
///
/// Returns `None` if the document is not well-formed XML.
pub fn parse_document(xml: &str) -> Option<Value> {
    let root = Element::parse(xml.as_bytes()).ok()?;

    let mut document = Map::new();
    document.insert(root.name.clone(), element_to_value(&root));
    Some(Value::Object(document))
}

fn element_to_value(element: &Element) -> Value {
    let children: Vec<&Element> = element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .collect();

    if children.is_empty() {
        let text = element
            .get_text()
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        return Value::String(text);
    }

    let mut map = Map::new();
    for child in children {
        let value = element_to_value(child);
        match map.get_mut(&child.name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(child.name.clone(), value);
            }
        }
    }
    Value::Object(map)
}

/// Reads `Envelope/Body/{method}Response/{method}Result` from a parsed response.
pub fn extract_result<'a>(parsed: &'a Value, method: &str) -> Option<&'a Value> {
    let response_key = format!("{}Response", method);
    let result_key = format!("{}Result", method);

    parsed
        .get("Envelope")?
        .get("Body")?
        .get(response_key.as_str())?
        .get(result_key.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn method_children(xml: &str, method: &str) -> Vec<(String, String)> {
        let root = Element::parse(xml.as_bytes()).unwrap();
        let body = root.get_child("Body").unwrap();
        let call = body.get_child(method).unwrap();
        call.children
            .iter()
            .filter_map(XMLNode::as_element)
            .map(|e| {
                (
                    e.name.clone(),
                    e.get_text().map(|t| t.to_string()).unwrap_or_default(),
                )
            })
            .collect()
    }

    #[test]
    fn test_build_envelope_keeps_parameter_order() {
        let xml = build_envelope(
            "AzurWebQRScanKorisnik",
            &["korisniksk", "email", "lozinka", "tipazur"],
            &["0", "ana@example.com", "secret", "L"],
        )
        .unwrap();

        assert_eq!(
            method_children(&xml, "AzurWebQRScanKorisnik"),
            vec![
                ("korisniksk".to_string(), "0".to_string()),
                ("email".to_string(), "ana@example.com".to_string()),
                ("lozinka".to_string(), "secret".to_string()),
                ("tipazur".to_string(), "L".to_string()),
            ]
        );
        assert_eq!(xml.matches("<email>").count(), 1);
        assert!(xml.contains(r#"<AzurWebQRScanKorisnik xmlns="http://tempuri.org/">"#));
    }

    #[test]
    fn test_build_envelope_empty_params_self_closing() {
        let xml = build_envelope("DatumVremeWebServera", &[], &[]).unwrap();
        assert!(xml.contains(r#"<DatumVremeWebServera xmlns="http://tempuri.org/" />"#));
        assert!(!xml.contains("</DatumVremeWebServera>"));
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(xml.contains("<soap:Body>"));
    }

    #[test]
    fn test_build_envelope_rejects_mismatched_lengths() {
        assert!(build_envelope("UbaciWebQRScanKorisnik", &["email", "lozinka"], &["a"]).is_none());
        assert!(build_envelope("UbaciWebQRScanKorisnik", &[], &["a"]).is_none());
    }

    #[test]
    fn test_build_envelope_inserts_values_unescaped() {
        let xml = build_envelope("UbaciWebQRScanKorisnik", &["nazivfirme"], &["A&B <doo>"]).unwrap();
        assert!(xml.contains("<nazivfirme>A&B <doo></nazivfirme>"));
        assert!(!xml.contains("&amp;"));
    }

    #[test]
    fn test_parse_document_and_extract_result() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <AzurWebQRScanKorisnikResponse xmlns="http://tempuri.org/">
      <AzurWebQRScanKorisnikResult>1234</AzurWebQRScanKorisnikResult>
    </AzurWebQRScanKorisnikResponse>
  </soap:Body>
</soap:Envelope>"#;

        let parsed = parse_document(xml).unwrap();
        let result = extract_result(&parsed, "AzurWebQRScanKorisnik").unwrap();
        assert_eq!(result, &Value::String("1234".to_string()));
    }

    #[test]
    fn test_extract_result_missing_segments() {
        let no_result = parse_document(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body><FooResponse xmlns="http://tempuri.org/"><Other>1</Other></FooResponse></soap:Body>
</soap:Envelope>"#,
        )
        .unwrap();
        assert!(extract_result(&no_result, "Foo").is_none());

        let no_response = parse_document(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body /></soap:Envelope>"#,
        )
        .unwrap();
        assert!(extract_result(&no_response, "Foo").is_none());

        let no_envelope = parse_document("<html><body>Service Unavailable</body></html>").unwrap();
        assert!(extract_result(&no_envelope, "Foo").is_none());

        assert!(extract_result(&Value::Null, "Foo").is_none());
    }

    #[test]
    fn test_parse_document_rejects_malformed_xml() {
        assert!(parse_document("this is not xml").is_none());
        assert!(parse_document("<a><b></a>").is_none());
    }

    #[test]
    fn test_parse_document_collapses_repeated_siblings() {
        let parsed = parse_document("<Set><Row>1</Row><Row>2</Row><Name>x</Name></Set>").unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({"Set": {"Row": ["1", "2"], "Name": "x"}})
        );
    }
}
