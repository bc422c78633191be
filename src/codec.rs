use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Strips the DynamoDB type tags off a stored item. Attributes with tags the
/// plain value space cannot represent (binary, sets) are skipped.
pub fn decode_item(item: &HashMap<String, AttributeValue>) -> Map<String, Value> {
    item.iter()
        .filter_map(|(k, v)| decode_value(v).map(|val| (k.clone(), val)))
        .collect()
}

pub fn decode_value(attr: &AttributeValue) -> Option<Value> {
    match attr {
        AttributeValue::S(s) => Some(Value::String(s.clone())),
        AttributeValue::N(n) => {
            // Numbers come back as text; prefer the integer reading
            if let Ok(i) = n.parse::<i64>() {
                Some(Value::Number(i.into()))
            } else if let Ok(f) = n.parse::<f64>() {
                serde_json::Number::from_f64(f).map(Value::Number)
            } else {
                None
            }
        }
        AttributeValue::Bool(b) => Some(Value::Bool(*b)),
        AttributeValue::Null(_) => Some(Value::Null),
        AttributeValue::L(list) => {
            let items: Vec<_> = list.iter().filter_map(decode_value).collect();
            Some(Value::Array(items))
        }
        AttributeValue::M(map) => {
            let obj: Map<_, _> = map
                .iter()
                .filter_map(|(k, v)| decode_value(v).map(|val| (k.clone(), val)))
                .collect();
            Some(Value::Object(obj))
        }
        _ => None,
    }
}

/// Wraps a plain map back into tagged attributes, ready for a PutItem.
pub fn encode_item(doc: &Map<String, Value>) -> HashMap<String, AttributeValue> {
    doc.iter()
        .filter_map(|(k, v)| encode_value(v).map(|attr| (k.clone(), attr)))
        .collect()
}

pub fn encode_value(val: &Value) -> Option<AttributeValue> {
    match val {
        Value::Null => Some(AttributeValue::Null(true)),
        Value::Bool(b) => Some(AttributeValue::Bool(*b)),
        Value::Number(n) => Some(AttributeValue::N(n.to_string())),
        Value::String(s) => Some(AttributeValue::S(s.clone())),
        Value::Array(arr) => {
            let items: Vec<_> = arr.iter().filter_map(encode_value).collect();
            Some(AttributeValue::L(items))
        }
        Value::Object(obj) => {
            let map: HashMap<String, AttributeValue> = obj
                .iter()
                .filter_map(|(k, v)| encode_value(v).map(|attr| (k.clone(), attr)))
                .collect();
            Some(AttributeValue::M(map))
        }
    }
}
