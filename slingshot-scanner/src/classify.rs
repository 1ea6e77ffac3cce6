//! Interpretation of fetched JSON dump bodies.
//!
//! Sling's JSON rendering tags every node with a `jcr:primaryType` property.
//! The classifier is a pure function over one response: it never performs
//! I/O and never fails, folding malformed input into an `Unknown` outcome.

use serde_json::Value;

/// Node types treated as expandable containers.
pub const FOLDER_TYPES: [&str; 2] = ["sling:Folder", "nt:unstructured"];

/// Node type of a downloadable DAM asset.
pub const ASSET_TYPE: &str = "dam:Asset";

const TYPE_TAG: &str = "jcr:primaryType";
const META_PREFIX: &str = "jcr:";

/// Outcome of classifying one fetched response.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// An expandable container together with its typed child entries.
    Folder { children: Vec<ChildRef> },
    /// A leaf asset dump; nothing to expand.
    Asset,
    /// Body was not a JSON object dump.
    Unknown { reason: String },
    /// Non-2xx response; body content is irrelevant.
    Error { status: u16 },
}

/// A child entry discovered inside a folder dump.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRef {
    pub name: String,
    pub primary_type: Option<String>,
    pub kind: ChildKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Folder,
    Asset,
    Unknown,
}

/// Classify one fetched response. Pure and total.
pub fn classify(status: u16, body: &[u8]) -> Classification {
    if !(200..300).contains(&status) {
        return Classification::Error { status };
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return Classification::Unknown {
                reason: format!("invalid JSON: {e}"),
            };
        }
    };

    let Value::Object(map) = value else {
        return Classification::Unknown {
            reason: "body is not a JSON object".to_string(),
        };
    };

    if map.get(TYPE_TAG).and_then(Value::as_str) == Some(ASSET_TYPE) {
        return Classification::Asset;
    }

    // Child entries are object-valued properties; jcr:* properties are
    // node metadata, not children.
    let children = map
        .iter()
        .filter(|(key, _)| !key.starts_with(META_PREFIX))
        .filter_map(|(key, value)| {
            let Value::Object(child) = value else {
                return None;
            };
            let primary_type = child.get(TYPE_TAG).and_then(Value::as_str);
            Some(ChildRef {
                name: key.clone(),
                kind: child_kind(primary_type),
                primary_type: primary_type.map(String::from),
            })
        })
        .collect();

    Classification::Folder { children }
}

fn child_kind(primary_type: Option<&str>) -> ChildKind {
    match primary_type {
        Some(tag) if FOLDER_TYPES.contains(&tag) => ChildKind::Folder,
        Some(ASSET_TYPE) => ChildKind::Asset,
        _ => ChildKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_classify_folder_with_typed_children() {
        let dump = body(json!({
            "jcr:primaryType": "sling:Folder",
            "images": { "jcr:primaryType": "sling:Folder" },
            "logo.png": { "jcr:primaryType": "dam:Asset" },
        }));

        let Classification::Folder { children } = classify(200, &dump) else {
            panic!("expected folder classification");
        };

        assert_eq!(children.len(), 2);
        let images = children.iter().find(|c| c.name == "images").unwrap();
        assert_eq!(images.kind, ChildKind::Folder);
        let logo = children.iter().find(|c| c.name == "logo.png").unwrap();
        assert_eq!(logo.kind, ChildKind::Asset);
        assert_eq!(logo.primary_type.as_deref(), Some("dam:Asset"));
    }

    #[test]
    fn test_classify_unstructured_child_is_folder() {
        let dump = body(json!({
            "par": { "jcr:primaryType": "nt:unstructured" },
        }));

        let Classification::Folder { children } = classify(200, &dump) else {
            panic!("expected folder classification");
        };
        assert_eq!(children[0].kind, ChildKind::Folder);
    }

    #[test]
    fn test_classify_skips_jcr_metadata_keys() {
        let dump = body(json!({
            "jcr:content": { "jcr:primaryType": "nt:unstructured" },
            "jcr:createdBy": "admin",
            "real": { "jcr:primaryType": "sling:Folder" },
        }));

        let Classification::Folder { children } = classify(200, &dump) else {
            panic!("expected folder classification");
        };
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "real");
    }

    #[test]
    fn test_classify_skips_scalar_properties() {
        let dump = body(json!({
            "title": "Homepage",
            "count": 3,
            "tags": ["a", "b"],
        }));

        let Classification::Folder { children } = classify(200, &dump) else {
            panic!("expected folder classification");
        };
        assert!(children.is_empty());
    }

    #[test]
    fn test_classify_untyped_child_is_unknown() {
        let dump = body(json!({
            "rep:policy": { "jcr:primaryType": "rep:ACL" },
            "bare": {},
        }));

        let Classification::Folder { children } = classify(200, &dump) else {
            panic!("expected folder classification");
        };
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c.kind == ChildKind::Unknown));
    }

    #[test]
    fn test_classify_asset_dump_is_leaf() {
        let dump = body(json!({
            "jcr:primaryType": "dam:Asset",
            "jcr:content": { "jcr:primaryType": "dam:AssetContent" },
        }));

        assert_eq!(classify(200, &dump), Classification::Asset);
    }

    #[test]
    fn test_classify_invalid_json_is_unknown() {
        let result = classify(200, b"<html>not json</html>");
        assert!(matches!(result, Classification::Unknown { .. }));
    }

    #[test]
    fn test_classify_non_object_json_is_unknown() {
        let result = classify(200, b"[1, 2, 3]");
        assert!(matches!(result, Classification::Unknown { .. }));
    }

    #[test]
    fn test_classify_empty_body_is_unknown() {
        let result = classify(200, b"");
        assert!(matches!(result, Classification::Unknown { .. }));
    }

    #[test]
    fn test_classify_non_2xx_is_error_regardless_of_body() {
        let dump = body(json!({ "x": { "jcr:primaryType": "sling:Folder" } }));
        assert_eq!(classify(404, &dump), Classification::Error { status: 404 });
        assert_eq!(classify(500, b""), Classification::Error { status: 500 });
        assert_eq!(classify(301, b""), Classification::Error { status: 301 });
    }
}
