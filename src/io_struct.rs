use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Number;

/// A loosely-typed option value as it arrives in a request body.
///
/// The zint CLI takes an open-ended set of options, so anything the gateway
/// does not handle itself is carried through as one of these and turned into
/// `--key` / `--key value` tokens by the translator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Number(Number),
    Text(String),
}

impl OptionValue {
    /// String form used when the option is emitted as `--key value`.
    pub fn render(&self) -> String {
        match self {
            OptionValue::Flag(flag) => flag.to_string(),
            OptionValue::Number(number) => number.to_string(),
            OptionValue::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchReqInput {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub common: BTreeMap<String, OptionValue>,
}

impl BatchReqInput {
    /// Checks the batch invariants (at least one item, all items strings)
    /// and returns the items as plain strings.
    pub fn validated_items(&self) -> Result<Vec<String>, &'static str> {
        if self.items.is_empty() {
            return Err("No items provided");
        }
        self.items
            .iter()
            .map(|item| match item {
                serde_json::Value::String(text) => Ok(text.clone()),
                _ => Err("All items must be strings"),
            })
            .collect()
    }

    fn common_str(&self, key: &str) -> Option<String> {
        self.common.get(key).map(OptionValue::render)
    }

    pub fn filetype(&self) -> String {
        self.common_str("filetype")
            .unwrap_or_else(|| "PNG".to_string())
            .to_uppercase()
    }

    pub fn symbology(&self) -> String {
        self.common_str("type").unwrap_or_else(|| "71".to_string())
    }

    pub fn scale(&self) -> String {
        self.common_str("scale").unwrap_or_else(|| "2".to_string())
    }

    pub fn output_pattern(&self) -> String {
        self.common_str("output_pattern")
            .unwrap_or_else(|| "barcode_".to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SingleReqInput {
    #[serde(default)]
    pub data: String,
    pub filetype: Option<String>,
    #[serde(rename = "type")]
    pub symbology: Option<OptionValue>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, OptionValue>,
}

impl SingleReqInput {
    /// Builds a request from decoded query-string pairs. Every value arrives
    /// as text; a bare `?key` decodes to an empty string.
    pub fn from_query(pairs: Vec<(String, String)>) -> Self {
        let mut input = SingleReqInput::default();
        for (key, value) in pairs {
            match key.as_str() {
                "data" => input.data = value,
                "filetype" => input.filetype = Some(value),
                "type" => input.symbology = Some(OptionValue::Text(value)),
                _ => {
                    input.extra.insert(key, OptionValue::Text(value));
                }
            }
        }
        input
    }

    pub fn filetype(&self) -> String {
        self.filetype.as_deref().unwrap_or("PNG").to_uppercase()
    }

    pub fn symbology(&self) -> String {
        self.symbology
            .as_ref()
            .map(OptionValue::render)
            .unwrap_or_else(|| "58".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn option_values_deserialize_by_shape() {
        let parsed: BTreeMap<String, OptionValue> = serde_json::from_value(json!({
            "bold": true,
            "height": 12.5,
            "fg": "112233",
        }))
        .unwrap();
        assert_eq!(parsed["bold"], OptionValue::Flag(true));
        assert_eq!(parsed["height"].render(), "12.5");
        assert_eq!(parsed["fg"].render(), "112233");
    }

    #[test]
    fn batch_items_must_be_nonempty_strings() {
        let empty: BatchReqInput = serde_json::from_value(json!({"items": []})).unwrap();
        assert_eq!(empty.validated_items().unwrap_err(), "No items provided");

        let mixed: BatchReqInput = serde_json::from_value(json!({"items": ["ok", 42]})).unwrap();
        assert_eq!(
            mixed.validated_items().unwrap_err(),
            "All items must be strings"
        );

        let good: BatchReqInput = serde_json::from_value(json!({"items": ["a", "b"]})).unwrap();
        assert_eq!(good.validated_items().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn batch_defaults_apply_when_common_is_empty() {
        let input = BatchReqInput::default();
        assert_eq!(input.filetype(), "PNG");
        assert_eq!(input.symbology(), "71");
        assert_eq!(input.scale(), "2");
        assert_eq!(input.output_pattern(), "barcode_");
    }

    #[test]
    fn single_flatten_collects_unknown_keys() {
        let input: SingleReqInput = serde_json::from_value(json!({
            "data": "hello",
            "filetype": "svg",
            "type": 20,
            "scale": 3,
            "bold": true,
        }))
        .unwrap();
        assert_eq!(input.data, "hello");
        assert_eq!(input.filetype(), "SVG");
        assert_eq!(input.symbology(), "20");
        assert_eq!(input.extra.len(), 2);
        assert!(input.extra.contains_key("scale"));
        assert!(input.extra.contains_key("bold"));
    }

    #[test]
    fn single_from_query_routes_reserved_keys() {
        let input = SingleReqInput::from_query(vec![
            ("data".to_string(), "123".to_string()),
            ("type".to_string(), "58".to_string()),
            ("bold".to_string(), String::new()),
        ]);
        assert_eq!(input.data, "123");
        assert_eq!(input.symbology(), "58");
        assert_eq!(input.filetype(), "PNG");
        assert_eq!(
            input.extra.get("bold"),
            Some(&OptionValue::Text(String::new()))
        );
    }
}
