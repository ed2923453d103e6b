//! Tool (function) calling definitions.

use crate::{Error, ErrorContext, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::json;

/// Hard cap on tool definitions in one request.
pub const MAX_TOOLS_PER_REQUEST: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    #[default]
    Function,
}

/// Tool definition (for function calling)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type", default)]
    pub tool_type: ToolType,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the arguments object.
    pub parameters: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: ToolType::Function,
            function: FunctionDefinition {
                name: name.into(),
                description: Some(description.into()),
                parameters,
                strict: None,
            },
        }
    }

    /// Ask the service to follow the schema exactly when generating arguments.
    pub fn strict(mut self, strict: bool) -> Self {
        self.function.strict = Some(strict);
        self
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Builder for the `{"type": "object", ...}` parameter schema of a function.
///
/// Every added parameter is required unless added through [`ParameterSchema::optional`].
#[derive(Debug, Clone, Default)]
pub struct ParameterSchema {
    properties: Vec<(String, serde_json::Value)>,
    required: Vec<String>,
    additional_properties: bool,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Required parameter of a JSON type (`"string"`, `"integer"`, ...).
    pub fn param(
        mut self,
        name: impl Into<String>,
        json_type: &str,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.properties.push((
            name.clone(),
            json!({"type": json_type, "description": description.into()}),
        ));
        self.required.push(name);
        self
    }

    /// Required string parameter restricted to `values`.
    pub fn enum_param(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
    ) -> Self {
        let name = name.into();
        self.properties.push((
            name.clone(),
            json!({"type": "string", "description": description.into(), "enum": values}),
        ));
        self.required.push(name);
        self
    }

    pub fn optional(
        mut self,
        name: impl Into<String>,
        json_type: &str,
        description: impl Into<String>,
    ) -> Self {
        self.properties.push((
            name.into(),
            json!({"type": json_type, "description": description.into()}),
        ));
        self
    }

    pub fn allow_additional_properties(mut self, allow: bool) -> Self {
        self.additional_properties = allow;
        self
    }

    pub fn build(self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for (name, schema) in self.properties {
            properties.insert(name, schema);
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
            "additionalProperties": self.additional_properties,
        })
    }
}

/// Tool invocation produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique within one assistant turn; echoed back by the tool result.
    pub id: String,
    #[serde(rename = "type", default)]
    pub call_type: ToolType,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Uninterpreted JSON text, as generated by the model.
    #[serde(default)]
    pub arguments: String,
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: ToolType::Function,
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Parse the argument payload. The model is free to emit invalid JSON, so this can fail.
    pub fn parse_arguments<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.function.arguments).map_err(|e| {
            Error::decode_with_context(
                format!("Invalid tool arguments: {}", e),
                ErrorContext::new()
                    .with_field_path(format!("tool_calls[{}].function.arguments", self.id))
                    .with_source("tool_call"),
            )
        })
    }
}

/// Which tool, if any, the model must call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ToolChoice {
    #[default]
    Auto,
    None,
    Required,
    /// Pinned to the named function.
    Function(String),
}

impl ToolChoice {
    pub fn function(name: impl Into<String>) -> Self {
        ToolChoice::Function(name.into())
    }
}

impl Serialize for ToolChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ToolChoice::Auto => serializer.serialize_str("auto"),
            ToolChoice::None => serializer.serialize_str("none"),
            ToolChoice::Required => serializer.serialize_str("required"),
            ToolChoice::Function(name) => PinnedChoice {
                choice_type: ToolType::Function,
                function: PinnedFunction { name: name.clone() },
            }
            .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ToolChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Mode(String),
            Pinned(PinnedChoice),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Mode(mode) => match mode.as_str() {
                "auto" => Ok(ToolChoice::Auto),
                "none" => Ok(ToolChoice::None),
                "required" => Ok(ToolChoice::Required),
                other => Err(serde::de::Error::unknown_variant(
                    other,
                    &["auto", "none", "required"],
                )),
            },
            Wire::Pinned(p) => Ok(ToolChoice::Function(p.function.name)),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PinnedChoice {
    #[serde(rename = "type")]
    choice_type: ToolType,
    function: PinnedFunction,
}

#[derive(Serialize, Deserialize)]
struct PinnedFunction {
    name: String,
}
