//! Task parameter schema.
//!
//! A [`Param`] is common metadata plus exactly one [`ParamKind`]. Decoding
//! goes through [`RawParam`] so that a default whose type does not match the
//! declared kind is rejected instead of silently dropped.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConsoleError;

/// One task input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParam")]
pub struct Param {
    #[serde(flatten)]
    pub meta: ParamMeta,
    #[serde(flatten)]
    pub kind: ParamKind,
}

/// Attributes shared by every parameter kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamMeta {
    /// Programmatic identifier, the key in submitted input.
    pub name: String,
    /// Form label.
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortflag: Option<String>,
    pub required: bool,
}

/// Kind-specific part of a param, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParamKind {
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    /// Multi-line string.
    Text {
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Bool {
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<bool>,
    },
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<f64>,
    },
}

impl ParamKind {
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::String { .. } => ParamType::String,
            Self::Text { .. } => ParamType::Text,
            Self::Bool { .. } => ParamType::Bool,
            Self::Number { .. } => ParamType::Number,
        }
    }
}

/// The bare `type` tag of a param.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Text,
    Bool,
    Number,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Bool => "bool",
            Self::Number => "number",
        }
    }

    /// Look up a `type` tag. Unknown tags are `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(Self::String),
            "text" => Some(Self::Text),
            "bool" => Some(Self::Bool),
            "number" => Some(Self::Number),
            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Param {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn param_type(&self) -> ParamType {
        self.kind.param_type()
    }

    pub fn is_required(&self) -> bool {
        self.meta.required
    }

    /// See [`describe_param`].
    pub fn describe(&self) -> ParamDescription {
        describe_param(self)
    }
}

/// What a form needs to know to render and pre-fill one param.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDescription {
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub kind: ParamType,
    pub required: bool,
    pub constraints: ParamConstraints,
}

/// The attributes that mean something for a given kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamConstraints {
    Text {
        default: Option<String>,
        multiline: bool,
    },
    Bool {
        default: Option<bool>,
    },
    Number {
        default: Option<f64>,
    },
}

/// Describe a param by its kind and the constraints relevant to that kind.
pub fn describe_param(param: &Param) -> ParamDescription {
    let constraints = match &param.kind {
        ParamKind::String { default } => ParamConstraints::Text {
            default: default.clone(),
            multiline: false,
        },
        ParamKind::Text { default } => ParamConstraints::Text {
            default: default.clone(),
            multiline: true,
        },
        ParamKind::Bool { default } => ParamConstraints::Bool { default: *default },
        ParamKind::Number { default } => ParamConstraints::Number { default: *default },
    };

    ParamDescription {
        name: param.meta.name.clone(),
        display_name: param.meta.display_name.clone(),
        help: param.meta.help.clone(),
        kind: param.param_type(),
        required: param.meta.required,
        constraints,
    }
}

/// Param as it appears on the wire, before kind checks.
#[derive(Debug, Clone, Deserialize)]
pub struct RawParam {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub shortflag: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
}

impl TryFrom<RawParam> for Param {
    type Error = ConsoleError;

    fn try_from(raw: RawParam) -> Result<Self, Self::Error> {
        let invalid = |reason: String| ConsoleError::InvalidParam {
            name: raw.name.clone(),
            reason,
        };

        if raw.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }

        let tag = raw.kind.as_deref().filter(|tag| !tag.is_empty()).unwrap_or("string");
        let param_type =
            ParamType::from_tag(tag).ok_or_else(|| invalid(format!("unknown type '{tag}'")))?;

        let default = raw.default.as_ref();
        let kind = match param_type {
            ParamType::String => ParamKind::String {
                default: typed_default(default, param_type, Value::as_str)
                    .map_err(invalid)?
                    .map(str::to_string),
            },
            ParamType::Text => ParamKind::Text {
                default: typed_default(default, param_type, Value::as_str)
                    .map_err(invalid)?
                    .map(str::to_string),
            },
            ParamType::Bool => ParamKind::Bool {
                default: typed_default(default, param_type, Value::as_bool).map_err(invalid)?,
            },
            ParamType::Number => ParamKind::Number {
                default: typed_default(default, param_type, Value::as_f64).map_err(invalid)?,
            },
        };

        let display_name = raw
            .display_name
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| title_case(&raw.name));
        let flag = raw
            .flag
            .filter(|flag| !flag.is_empty())
            .unwrap_or_else(|| format!("--{}", raw.name));

        Ok(Self {
            meta: ParamMeta {
                name: raw.name,
                display_name,
                help: raw.help,
                flag: Some(flag),
                shortflag: raw.shortflag.filter(|flag| !flag.is_empty()),
                required: raw.required,
            },
            kind,
        })
    }
}

fn typed_default<'a, T>(
    default: Option<&'a Value>,
    param_type: ParamType,
    extract: impl Fn(&'a Value) -> Option<T>,
) -> Result<Option<T>, String> {
    match default {
        None => Ok(None),
        Some(value) => extract(value)
            .map(Some)
            .ok_or_else(|| format!("default for a {param_type} param must be a {}", expected(param_type))),
    }
}

fn expected(param_type: ParamType) -> &'static str {
    match param_type {
        ParamType::String | ParamType::Text => "string",
        ParamType::Bool => "boolean",
        ParamType::Number => "number",
    }
}

/// `run_foo` -> `Run Foo`
pub(crate) fn title_case(label: &str) -> String {
    label
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Param, ConsoleError> {
        let raw: RawParam = serde_json::from_value(value).unwrap();
        Param::try_from(raw)
    }

    #[test]
    fn test_param_defaults_applied() {
        let param = parse(json!({"name": "target_env"})).unwrap();

        assert_eq!(param.param_type(), ParamType::String);
        assert_eq!(param.meta.display_name, "Target Env");
        assert_eq!(param.meta.flag.as_deref(), Some("--target_env"));
        assert!(!param.is_required());
        assert_eq!(param.kind, ParamKind::String { default: None });
    }

    #[test]
    fn test_param_explicit_fields_kept() {
        let param = parse(json!({
            "name": "count",
            "display_name": "How many",
            "help": "Number of replicas",
            "flag": "--replicas",
            "shortflag": "-r",
            "required": true,
            "type": "number",
            "default": 3
        }))
        .unwrap();

        assert_eq!(param.meta.display_name, "How many");
        assert_eq!(param.meta.shortflag.as_deref(), Some("-r"));
        assert_eq!(param.kind, ParamKind::Number { default: Some(3.0) });
    }

    #[test]
    fn test_mismatched_default_rejected() {
        let err = parse(json!({"name": "count", "type": "number", "default": "three"})).unwrap_err();
        match err {
            ConsoleError::InvalidParam { name, reason } => {
                assert_eq!(name, "count");
                assert!(reason.contains("must be a number"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(parse(json!({"name": "dry_run", "type": "bool", "default": "yes"})).is_err());
        assert!(parse(json!({"name": "notes", "type": "text", "default": 12})).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = parse(json!({"name": "when", "type": "date"})).unwrap_err();
        assert!(err.to_string().contains("unknown type 'date'"));
    }

    #[test]
    fn test_null_default_means_no_default() {
        let param = parse(json!({"name": "flag", "type": "bool", "default": null})).unwrap();
        assert_eq!(param.kind, ParamKind::Bool { default: None });
    }

    #[test]
    fn test_describe_param() {
        let text = parse(json!({"name": "notes", "type": "text", "default": "hi"})).unwrap();
        let description = describe_param(&text);
        assert_eq!(description.kind, ParamType::Text);
        assert_eq!(
            description.constraints,
            ParamConstraints::Text {
                default: Some("hi".to_string()),
                multiline: true
            }
        );

        let number = parse(json!({"name": "count", "type": "number", "required": true})).unwrap();
        let description = number.describe();
        assert!(description.required);
        assert_eq!(description.constraints, ParamConstraints::Number { default: None });
    }

    #[test]
    fn test_param_serialization_shape() {
        let param = parse(json!({"name": "dry_run", "type": "bool", "default": false})).unwrap();
        let value = serde_json::to_value(&param).unwrap();

        assert_eq!(value["type"], "bool");
        assert_eq!(value["default"], false);
        assert_eq!(value["display_name"], "Dry Run");
        assert!(value.get("help").is_none());

        let again: Param = serde_json::from_value(value).unwrap();
        assert_eq!(again, param);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("run_foo"), "Run Foo");
        assert_eq!(title_case("DEPLOY"), "Deploy");
        assert_eq!(title_case("a__b"), "A B");
    }
}
