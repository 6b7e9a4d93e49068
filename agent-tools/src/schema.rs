//! Tool declarations advertised to models.

use agent_primitives::ToolName;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Primitive JSON type accepted by a tool parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterKind {
    /// Any JSON number.
    Number,
    /// Whole JSON number.
    Integer,
    /// JSON string.
    String,
    /// JSON boolean.
    Boolean,
}

impl ParameterKind {
    /// Returns the JSON schema type keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }
}

/// Single named parameter of a tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    description: String,
    required: bool,
}

impl Parameter {
    /// Creates a required parameter.
    #[must_use]
    pub fn required(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        }
    }

    /// Creates an optional parameter.
    #[must_use]
    pub fn optional(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter type.
    #[must_use]
    pub const fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// Returns the description shown to the model.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the model must supply this parameter.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// Ordered set of parameters a tool accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    parameters: Vec<Parameter>,
}

impl ParameterSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter, replacing any earlier parameter with the same name.
    #[must_use]
    pub fn with(mut self, parameter: Parameter) -> Self {
        self.parameters.retain(|existing| existing.name != parameter.name);
        self.parameters.push(parameter);
        self
    }

    /// Returns the declared parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Renders the schema as a JSON schema object.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for parameter in &self.parameters {
            properties.insert(
                parameter.name.clone(),
                json!({
                    "type": parameter.kind.as_str(),
                    "description": parameter.description,
                }),
            );
            if parameter.required {
                required.push(Value::from(parameter.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

/// Declaration of a tool: the name, description, and input schema a model sees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolDeclaration {
    name: ToolName,
    description: String,
    parameters: ParameterSchema,
}

impl ToolDeclaration {
    /// Creates a declaration.
    #[must_use]
    pub fn new(name: ToolName, description: impl Into<String>, parameters: ParameterSchema) -> Self {
        Self {
            name,
            description: description.into(),
            parameters,
        }
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &ToolName {
        &self.name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema.
    #[must_use]
    pub fn parameters(&self) -> &ParameterSchema {
        &self.parameters
    }
}

// Function-calling wire shape shared by Ollama and OpenAI-compatible servers.
impl Serialize for ToolDeclaration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "function")?;
        map.serialize_entry(
            "function",
            &json!({
                "name": self.name.as_str(),
                "description": self.description,
                "parameters": self.parameters.to_json_schema(),
            }),
        )?;
        map.end()
    }
}
