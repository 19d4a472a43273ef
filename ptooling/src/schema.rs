//! Builder for the JSON-schema object describing a tool's parameters.
//!
//! ```rust
//! use ptooling::ParameterSchema;
//! use serde_json::json;
//!
//! let schema = ParameterSchema::new()
//!     .string("path", "File to read")
//!     .integer("limit", "Maximum lines")
//!     .required("path")
//!     .build();
//!
//! assert_eq!(schema["type"], json!("object"));
//! assert_eq!(schema["required"], json!(["path"]));
//! ```

use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.typed(name, "string", description)
    }

    pub fn integer(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.typed(name, "integer", description)
    }

    pub fn number(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.typed(name, "number", description)
    }

    pub fn boolean(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.typed(name, "boolean", description)
    }

    /// Array property whose elements follow `items`.
    pub fn array(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        items: Value,
    ) -> Self {
        self.property(
            name,
            json!({"type": "array", "description": description.into(), "items": items}),
        )
    }

    fn typed(self, name: impl Into<String>, kind: &str, description: impl Into<String>) -> Self {
        self.property(name, json!({"type": kind, "description": description.into()}))
    }

    /// Adds an arbitrary property schema.
    pub fn property(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    pub fn build(self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(self.properties));
        if !self.required.is_empty() {
            schema.insert("required".to_string(), json!(self.required));
        }
        Value::Object(schema)
    }
}

impl From<ParameterSchema> for Value {
    fn from(value: ParameterSchema) -> Self {
        value.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_schema_is_an_object_without_required_list() {
        let schema = ParameterSchema::new().build();
        assert_eq!(schema, json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn properties_keep_types_and_required_is_deduplicated() {
        let schema = ParameterSchema::new()
            .boolean("recursive", "Descend into folders")
            .number("ratio", "Sampling ratio")
            .array("tags", "Labels to apply", json!({"type": "string"}))
            .required("tags")
            .required("tags")
            .build();

        assert_eq!(schema["properties"]["recursive"]["type"], json!("boolean"));
        assert_eq!(schema["properties"]["ratio"]["type"], json!("number"));
        assert_eq!(schema["properties"]["tags"]["items"], json!({"type": "string"}));
        assert_eq!(schema["required"], json!(["tags"]));
    }

    #[test]
    fn scalar_properties_carry_type_and_description() {
        let schema = ParameterSchema::new()
            .string("path", "File to read")
            .integer("limit", "Maximum lines")
            .build();

        assert_eq!(
            schema["properties"]["path"],
            json!({"type": "string", "description": "File to read"})
        );
        assert_eq!(
            schema["properties"]["limit"],
            json!({"type": "integer", "description": "Maximum lines"})
        );
    }
}
