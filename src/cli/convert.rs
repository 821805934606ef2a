//! JSON <-> node tree conversion utilities
//!
//! A node becomes `{"name": …, "type": …, "value": …, "children": […]}`.
//! `type` is left out for strings, `value` for nodes without one.

use serde_json::{Map, Value as Json};

use super::CliError;
use crate::{Lambda, NodeId, TypeRegistry, Value};

/// Convert the top level nodes of a document to a JSON array
pub fn lambda_to_json(lambda: &Lambda, registry: &TypeRegistry) -> Json {
    Json::Array(
        lambda
            .children(lambda.root())
            .iter()
            .map(|&node| node_to_json(lambda, node, registry))
            .collect(),
    )
}

/// Convert one node and its descendants to a JSON object
pub fn node_to_json(lambda: &Lambda, node: NodeId, registry: &TypeRegistry) -> Json {
    let mut object = Map::new();
    object.insert("name".to_string(), Json::String(lambda.name(node).to_string()));
    if let Some(value) = lambda.value(node) {
        let (tag, text) = registry.describe(value, lambda);
        if tag != "string" {
            object.insert("type".to_string(), Json::String(tag));
        }
        object.insert("value".to_string(), Json::String(text));
    }
    let children: Vec<Json> = lambda
        .children(node)
        .iter()
        .map(|&child| node_to_json(lambda, child, registry))
        .collect();
    object.insert("children".to_string(), Json::Array(children));
    Json::Object(object)
}

/// Build a document from a JSON array of nodes (or a single node object)
pub fn json_to_lambda(json: &Json, registry: &TypeRegistry) -> Result<Lambda, CliError> {
    let mut lambda = Lambda::new();
    let root = lambda.root();
    match json {
        Json::Array(nodes) => {
            for node in nodes {
                let child = json_to_node(node, &mut lambda, registry)?;
                lambda.add(root, child);
            }
        }
        Json::Object(_) => {
            let child = json_to_node(json, &mut lambda, registry)?;
            lambda.add(root, child);
        }
        other => return Err(CliError::NodeShape(format!("expected an array or object, found {other}"))),
    }
    Ok(lambda)
}

fn json_to_node(json: &Json, lambda: &mut Lambda, registry: &TypeRegistry) -> Result<NodeId, CliError> {
    let Json::Object(object) = json else {
        return Err(CliError::NodeShape(format!("expected a node object, found {json}")));
    };
    let name = match object.get("name") {
        Some(Json::String(name)) => name.clone(),
        None | Some(Json::Null) => String::new(),
        Some(other) => return Err(CliError::NodeShape(format!("name must be a string, found {other}"))),
    };
    let raw = match object.get("value") {
        None | Some(Json::Null) => None,
        Some(Json::String(s)) => Some(s.clone()),
        Some(other @ (Json::Bool(_) | Json::Number(_))) => Some(other.to_string()),
        Some(other) => return Err(CliError::NodeShape(format!("value must be a scalar, found {other}"))),
    };
    let value = match (raw, object.get("type").and_then(Json::as_str)) {
        (None, _) => None,
        (Some(raw), Some(tag)) if tag != "string" => Some(registry.to_object(&raw, tag, lambda)?),
        (Some(raw), _) => Some(Value::String(raw)),
    };

    let node = lambda.create(name, value);
    if let Some(children) = object.get("children") {
        let Json::Array(children) = children else {
            return Err(CliError::NodeShape("children must be an array".to_string()));
        };
        for child in children {
            let child = json_to_node(child, lambda, registry)?;
            lambda.add(node, child);
        }
    }
    Ok(node)
}
