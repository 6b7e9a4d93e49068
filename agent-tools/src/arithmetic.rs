//! Built-in arithmetic tools.

use agent_primitives::ToolName;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Number, Value};

use crate::registry::{Tool, ToolError, ToolRegistry, ToolResult};
use crate::schema::{Parameter, ParameterKind, ParameterSchema, ToolDeclaration};

/// Binary arithmetic capabilities over two numbers `a` and `b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arithmetic {
    /// `a + b`
    Addition,
    /// `a * b`
    Multiplication,
}

impl Arithmetic {
    /// Every built-in arithmetic tool.
    pub const ALL: [Self; 2] = [Self::Addition, Self::Multiplication];

    /// Name advertised to the model.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Addition => "addition",
            Self::Multiplication => "multiplication",
        }
    }

    /// Description advertised to the model.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Addition => "Add numbers.",
            Self::Multiplication => "Multiply numbers.",
        }
    }

    /// Builds the declaration for this tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidDeclaration`] if the built-in name fails
    /// validation.
    pub fn declaration(self) -> ToolResult<ToolDeclaration> {
        let parameters = ParameterSchema::new()
            .with(Parameter::required("a", ParameterKind::Number, "first number"))
            .with(Parameter::required("b", ParameterKind::Number, "second number"));
        Ok(ToolDeclaration::new(
            ToolName::new(self.name())?,
            self.description(),
            parameters,
        ))
    }

    /// Registers every arithmetic tool with the supplied registry.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if any of the names is already
    /// registered.
    pub fn register_all(registry: &ToolRegistry) -> ToolResult<()> {
        for tool in Self::ALL {
            registry.register_tool(tool.declaration()?, tool)?;
        }
        Ok(())
    }

    /// Applies the operation.
    ///
    /// Integer operands stay integers unless the operation overflows `i64`,
    /// in which case the result falls back to `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] when the result is not a finite number.
    pub fn apply(self, a: &Number, b: &Number) -> ToolResult<Number> {
        if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
            let exact = match self {
                Self::Addition => x.checked_add(y),
                Self::Multiplication => x.checked_mul(y),
            };
            if let Some(value) = exact {
                return Ok(Number::from(value));
            }
        }

        let (x, y) = a
            .as_f64()
            .zip(b.as_f64())
            .ok_or_else(|| ToolError::execution("operands are not representable as f64"))?;
        let value = match self {
            Self::Addition => x + y,
            Self::Multiplication => x * y,
        };

        Number::from_f64(value).ok_or_else(|| {
            ToolError::execution(format!("{} produced a non-finite result", self.name()))
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Operands {
    a: Number,
    b: Number,
}

#[async_trait]
impl Tool for Arithmetic {
    async fn invoke(&self, arguments: Value) -> ToolResult<Value> {
        let operands: Operands = serde_json::from_value(arguments)
            .map_err(|err| ToolError::invalid_arguments(err.to_string()))?;
        self.apply(&operands.a, &operands.b).map(Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[tokio::test]
    async fn adds_integers() {
        let value = Arithmetic::Addition
            .invoke(json!({"a": 3, "b": 4}))
            .await
            .unwrap();
        assert_eq!(value, json!(7));
    }

    #[tokio::test]
    async fn multiplies_integers() {
        let value = Arithmetic::Multiplication
            .invoke(json!({"a": 7, "b": 77}))
            .await
            .unwrap();
        assert_eq!(value, json!(539));
    }

    #[tokio::test]
    async fn mixed_operands_use_floating_point() {
        let value = Arithmetic::Addition
            .invoke(json!({"a": 1.5, "b": 2}))
            .await
            .unwrap();
        assert_eq!(value, json!(3.5));
    }

    #[test]
    fn integer_overflow_falls_back_to_float() {
        let value = Arithmetic::Multiplication
            .apply(&Number::from(i64::MAX), &Number::from(2))
            .unwrap();
        assert!(value.is_f64());
    }

    #[test]
    fn non_finite_result_is_execution_error() {
        let a = Number::from_f64(1e308).unwrap();
        let b = Number::from_f64(10.0).unwrap();
        let err = Arithmetic::Multiplication.apply(&a, &b).expect_err("overflow to inf");
        assert!(matches!(err, ToolError::Execution { .. }));
    }

    #[tokio::test]
    async fn rejects_malformed_arguments() {
        for arguments in [
            json!({"a": 3}),
            json!({"a": "3", "b": 4}),
            json!({"a": 3, "b": 4, "c": 5}),
            Value::Null,
        ] {
            let err = Arithmetic::Addition
                .invoke(arguments)
                .await
                .expect_err("schema mismatch");
            assert!(matches!(err, ToolError::InvalidArguments { .. }));
        }
    }

    #[tokio::test]
    async fn repeated_invocation_is_stable() {
        let arguments = json!({"a": 12, "b": -5});
        let first = Arithmetic::Multiplication.invoke(arguments.clone()).await.unwrap();
        let second = Arithmetic::Multiplication.invoke(arguments).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, json!(-60));
    }

    #[tokio::test]
    async fn register_all_advertises_both_tools() {
        let registry = ToolRegistry::new();
        Arithmetic::register_all(&registry).unwrap();

        let names: Vec<_> = registry
            .declarations()
            .iter()
            .map(|d| d.name().as_str().to_owned())
            .collect();
        assert_eq!(names, ["addition", "multiplication"]);

        let handle = registry.lookup("addition").expect("registered");
        assert_eq!(handle.declaration().description(), "Add numbers.");
        assert_eq!(
            registry.invoke("multiplication", json!({"a": 7, "b": 77})).await.unwrap(),
            json!(539)
        );

        let err = Arithmetic::register_all(&registry).expect_err("already registered");
        assert!(matches!(err, ToolError::DuplicateTool { .. }));
    }
}
