//! IMPORT module registry.
//!
//! `IMPORT math, text AS t` binds function modules under their name or
//! alias; expressions reach them as `math.sqrt(x)` or `t.replace(s, a, b)`.
//! Referencing a module that is not registered is an import error raised at
//! setup, before any row is read.

use crate::rowql::sql::ast::ImportSpec;
use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::Value;
use std::collections::HashMap;

/// The registered importable modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Math,
    Text,
}

impl Module {
    fn by_name(name: &str) -> Option<Module> {
        match name.to_ascii_lowercase().as_str() {
            "math" => Some(Module::Math),
            "text" => Some(Module::Text),
            _ => None,
        }
    }

    /// Dispatches a function call within this module. Arguments follow the
    /// null-safe convention: any NULL argument short-circuits to NULL.
    pub fn call(&self, func: &str, args: &[Value]) -> SqlResult<Value> {
        if args.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }
        match self {
            Module::Math => Self::call_math(func, args),
            Module::Text => Self::call_text(func, args),
        }
    }

    fn call_math(func: &str, args: &[Value]) -> SqlResult<Value> {
        let num = |v: &Value| -> SqlResult<f64> {
            match v {
                Value::Int(i) => Ok(*i as f64),
                Value::Float(x) => Ok(*x),
                other => Err(SqlError::type_error(
                    "numeric",
                    other.type_name(),
                    Some(other.to_string()),
                )),
            }
        };
        match (func, args) {
            ("sqrt", [x]) => Ok(Value::Float(num(x)?.sqrt())),
            ("pow", [x, y]) => Ok(Value::Float(num(x)?.powf(num(y)?))),
            ("floor", [x]) => Ok(Value::Int(num(x)?.floor() as i64)),
            ("ceil", [x]) => Ok(Value::Int(num(x)?.ceil() as i64)),
            ("log", [x]) => Ok(Value::Float(num(x)?.ln())),
            _ => Err(SqlError::execution_error(
                format!("unknown function 'math.{}' with {} argument(s)", func, args.len()),
                None,
            )),
        }
    }

    fn call_text(func: &str, args: &[Value]) -> SqlResult<Value> {
        fn text(v: &Value) -> SqlResult<&str> {
            match v {
                Value::Str(s) => Ok(s.as_str()),
                other => Err(SqlError::type_error(
                    "Str",
                    other.type_name(),
                    Some(other.to_string()),
                )),
            }
        }
        match (func, args) {
            ("replace", [s, from, to]) => {
                Ok(Value::Str(text(s)?.replace(text(from)?, text(to)?)))
            }
            ("contains", [s, sub]) => Ok(Value::Bool(text(s)?.contains(text(sub)?))),
            ("starts_with", [s, prefix]) => Ok(Value::Bool(text(s)?.starts_with(text(prefix)?))),
            ("split", [s, sep]) => Ok(Value::List(
                text(s)?
                    .split(text(sep)?)
                    .map(|part| Value::Str(part.to_string()))
                    .collect(),
            )),
            _ => Err(SqlError::execution_error(
                format!("unknown function 'text.{}' with {} argument(s)", func, args.len()),
                None,
            )),
        }
    }
}

/// IMPORT bindings resolved for one run: alias → module.
#[derive(Debug, Clone, Default)]
pub struct ImportBindings {
    bindings: HashMap<String, Module>,
}

impl ImportBindings {
    pub fn empty() -> Self {
        ImportBindings::default()
    }

    /// Resolves every IMPORT entry against the registry. An unknown module
    /// is an import error before any row is processed.
    pub fn resolve(imports: &[ImportSpec]) -> SqlResult<ImportBindings> {
        let mut bindings = HashMap::new();
        for spec in imports {
            let module = Module::by_name(&spec.module).ok_or_else(|| {
                SqlError::import_error(
                    &spec.module,
                    "module is not registered (available: math, text)",
                )
            })?;
            bindings.insert(spec.binding_name().to_string(), module);
        }
        Ok(ImportBindings { bindings })
    }

    pub fn get(&self, name: &str) -> Option<Module> {
        self.bindings.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(module: &str, alias: Option<&str>) -> ImportSpec {
        ImportSpec {
            module: module.to_string(),
            alias: alias.map(|a| a.to_string()),
        }
    }

    #[test]
    fn resolves_known_modules_with_aliases() {
        let bindings =
            ImportBindings::resolve(&[spec("math", None), spec("text", Some("t"))]).unwrap();
        assert_eq!(bindings.get("math"), Some(Module::Math));
        assert_eq!(bindings.get("t"), Some(Module::Text));
        assert_eq!(bindings.get("text"), None, "alias replaces the name");
    }

    #[test]
    fn unknown_module_is_an_import_error() {
        let err = ImportBindings::resolve(&[spec("numpy", None)]).unwrap_err();
        assert!(matches!(err, SqlError::ImportError { .. }));
    }

    #[test]
    fn module_calls_are_null_safe() {
        assert_eq!(
            Module::Math.call("sqrt", &[Value::Null]).unwrap(),
            Value::Null
        );
        assert_eq!(
            Module::Math.call("sqrt", &[Value::Int(9)]).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(
            Module::Text
                .call("replace", &[
                    Value::Str("a-b".into()),
                    Value::Str("-".into()),
                    Value::Str("+".into())
                ])
                .unwrap(),
            Value::Str("a+b".into())
        );
    }

    #[test]
    fn text_functions_borrow_their_arguments() {
        assert_eq!(
            Module::Text
                .call("split", &[Value::Str("a:b:c".into()), Value::Str(":".into())])
                .unwrap(),
            Value::List(vec![
                Value::Str("a".into()),
                Value::Str("b".into()),
                Value::Str("c".into()),
            ])
        );
        assert_eq!(
            Module::Text
                .call("starts_with", &[Value::Str("rowql".into()), Value::Str("row".into())])
                .unwrap(),
            Value::Bool(true)
        );
        assert!(Module::Text
            .call("contains", &[Value::Str("x".into()), Value::Int(1)])
            .is_err());
    }
}
