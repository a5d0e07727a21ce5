use crate::{
    report::{Issue, ValidationError, join_path},
    value::{Map, Value},
};
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::{fmt, sync::Arc};

///
/// SpecOptions
///

#[derive(Clone, Copy, Debug)]
pub struct SpecOptions {
    /// Attempt type casting (text → number/boolean, number → text) before
    /// type checks. Defaults apply regardless of this flag.
    pub convert: bool,
    /// Tolerate map keys that the object spec does not declare.
    pub allow_unknown: bool,
}

impl Default for SpecOptions {
    fn default() -> Self {
        Self {
            convert: true,
            allow_unknown: true,
        }
    }
}

///
/// Validation
/// Engine result contract: both halves are always present. On failure
/// `value` carries the input (best-effort coerced); on success it carries
/// the coerced/defaulted output.
///

#[derive(Clone, Debug)]
pub struct Validation {
    pub error: Option<ValidationError>,
    pub value: Value,
}

impl Validation {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

///
/// DefaultValue
///

#[derive(Clone)]
enum DefaultValue {
    Fixed(Value),
    Computed(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    fn resolve(&self) -> Value {
        match self {
            Self::Fixed(v) => v.clone(),
            Self::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(v) => write!(f, "Fixed({v:?})"),
            Self::Computed(_) => write!(f, "Computed(..)"),
        }
    }
}

///
/// SpecKind
///

#[derive(Clone, Debug)]
enum SpecKind {
    Any,
    Boolean,
    Number {
        min: Option<f64>,
        max: Option<f64>,
        integer: bool,
    },
    Text {
        min_len: Option<usize>,
        max_len: Option<usize>,
        uuid_v4: bool,
    },
    /// No portable value is callable, so this spec rejects every defined
    /// value. It exists so the declared-type table stays enumerable.
    Func,
    Array {
        items: Option<Box<Spec>>,
    },
    Object {
        fields: Vec<(String, Spec)>,
    },
}

impl SpecKind {
    const fn tag(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Boolean => "boolean",
            Self::Number { .. } => "number",
            Self::Text { .. } => "text",
            Self::Func => "func",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
        }
    }
}

///
/// Spec
/// A structural validator. Built by chaining, immutable once handed to a
/// model declaration.
///

#[derive(Clone, Debug)]
pub struct Spec {
    kind: SpecKind,
    required: bool,
    label: Option<String>,
    default: Option<DefaultValue>,
}

impl Spec {
    const fn with_kind(kind: SpecKind) -> Self {
        Self {
            kind,
            required: false,
            label: None,
            default: None,
        }
    }

    #[must_use]
    pub const fn any() -> Self {
        Self::with_kind(SpecKind::Any)
    }

    #[must_use]
    pub const fn boolean() -> Self {
        Self::with_kind(SpecKind::Boolean)
    }

    #[must_use]
    pub const fn number() -> Self {
        Self::with_kind(SpecKind::Number {
            min: None,
            max: None,
            integer: false,
        })
    }

    #[must_use]
    pub const fn text() -> Self {
        Self::with_kind(SpecKind::Text {
            min_len: None,
            max_len: None,
            uuid_v4: false,
        })
    }

    #[must_use]
    pub const fn func() -> Self {
        Self::with_kind(SpecKind::Func)
    }

    #[must_use]
    pub const fn array() -> Self {
        Self::with_kind(SpecKind::Array { items: None })
    }

    #[must_use]
    pub fn object(fields: Vec<(String, Self)>) -> Self {
        Self::with_kind(SpecKind::Object { fields })
    }

    // ---- chaining ------------------------------------------------------

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Fixed(value.into()));
        self
    }

    #[must_use]
    pub fn default_with(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Computed(Arc::new(f)));
        self
    }

    /// Minimum: numeric value for number specs, length for text specs.
    /// Any other kind is a declaration bug and fails fast.
    #[must_use]
    pub fn min(mut self, bound: f64) -> Self {
        match &mut self.kind {
            SpecKind::Number { min, .. } => *min = Some(bound),
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            SpecKind::Text { min_len, .. } => *min_len = Some(bound as usize),
            other => panic!("min() is not valid for a {} spec", other.tag()),
        }
        self
    }

    /// Maximum: numeric value for number specs, length for text specs.
    #[must_use]
    pub fn max(mut self, bound: f64) -> Self {
        match &mut self.kind {
            SpecKind::Number { max, .. } => *max = Some(bound),
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            SpecKind::Text { max_len, .. } => *max_len = Some(bound as usize),
            other => panic!("max() is not valid for a {} spec", other.tag()),
        }
        self
    }

    #[must_use]
    pub fn integer(mut self) -> Self {
        match &mut self.kind {
            SpecKind::Number { integer, .. } => *integer = true,
            other => panic!("integer() is not valid for a {} spec", other.tag()),
        }
        self
    }

    #[must_use]
    pub fn uuid_v4(mut self) -> Self {
        match &mut self.kind {
            SpecKind::Text { uuid_v4, .. } => *uuid_v4 = true,
            other => panic!("uuid_v4() is not valid for a {} spec", other.tag()),
        }
        self
    }

    #[must_use]
    pub fn items(mut self, spec: Self) -> Self {
        match &mut self.kind {
            SpecKind::Array { items } => *items = Some(Box::new(spec)),
            other => panic!("items() is not valid for a {} spec", other.tag()),
        }
        self
    }

    // ---- validation ----------------------------------------------------

    /// Validate a value. `None` means the key was not provided at all;
    /// `Some(Value::Unit)` is treated the same way.
    #[must_use]
    pub fn validate(&self, value: Option<&Value>, options: &SpecOptions) -> Validation {
        let mut issues = Vec::new();
        let out = self.check(value, "", options, &mut issues);

        Validation {
            error: if issues.is_empty() {
                None
            } else {
                Some(ValidationError::new(issues))
            },
            value: out,
        }
    }

    /// Always-throwing variant: the validated value or the error.
    pub fn attempt(&self, value: Option<&Value>, options: &SpecOptions) -> Result<Value, ValidationError> {
        let result = self.validate(value, options);
        match result.error {
            Some(err) => Err(err),
            None => Ok(result.value),
        }
    }

    fn name_for(&self, path: &str) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match path.rsplit('.').next() {
            Some(leaf) if !leaf.is_empty() => leaf.to_string(),
            _ => "value".to_string(),
        }
    }

    fn check(
        &self,
        value: Option<&Value>,
        path: &str,
        options: &SpecOptions,
        issues: &mut Vec<Issue>,
    ) -> Value {
        let input = match value {
            None | Some(Value::Unit) => {
                if let Some(default) = &self.default {
                    return default.resolve();
                }
                if self.required {
                    issues.push(Issue::new(path, format!("{} is required", self.name_for(path))));
                }
                return Value::Unit;
            }
            Some(v) => v,
        };

        match &self.kind {
            SpecKind::Any => input.clone(),
            SpecKind::Boolean => self.check_boolean(input, path, options, issues),
            SpecKind::Number { min, max, integer } => {
                self.check_number(input, path, options, issues, *min, *max, *integer)
            }
            SpecKind::Text {
                min_len,
                max_len,
                uuid_v4,
            } => self.check_text(input, path, options, issues, *min_len, *max_len, *uuid_v4),
            SpecKind::Func => {
                issues.push(Issue::new(
                    path,
                    format!("{} must be a callable", self.name_for(path)),
                ));
                input.clone()
            }
            SpecKind::Array { items } => self.check_array(input, path, options, issues, items.as_deref()),
            SpecKind::Object { fields } => self.check_object(input, path, options, issues, fields),
        }
    }

    fn check_boolean(
        &self,
        input: &Value,
        path: &str,
        options: &SpecOptions,
        issues: &mut Vec<Issue>,
    ) -> Value {
        match input {
            Value::Bool(_) => input.clone(),
            Value::Text(text) if options.convert => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => {
                    issues.push(Issue::new(
                        path,
                        format!("{} must be a boolean", self.name_for(path)),
                    ));
                    input.clone()
                }
            },
            _ => {
                issues.push(Issue::new(
                    path,
                    format!("{} must be a boolean", self.name_for(path)),
                ));
                input.clone()
            }
        }
    }

    #[allow(clippy::too_many_arguments, clippy::cast_precision_loss)]
    fn check_number(
        &self,
        input: &Value,
        path: &str,
        options: &SpecOptions,
        issues: &mut Vec<Issue>,
        min: Option<f64>,
        max: Option<f64>,
        integer: bool,
    ) -> Value {
        let coerced = match input {
            Value::Int(_) | Value::Float(_) => Some(input.clone()),
            Value::Text(text) if options.convert => {
                let trimmed = text.trim();
                trimmed
                    .parse::<i64>()
                    .map(Value::Int)
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().map(Value::Float).ok())
            }
            _ => None,
        };

        let Some(coerced) = coerced else {
            issues.push(Issue::new(
                path,
                format!("{} must be a number", self.name_for(path)),
            ));
            return input.clone();
        };

        let magnitude = match coerced {
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
            _ => unreachable!("coerced number is Int or Float"),
        };

        if integer && matches!(coerced, Value::Float(f) if f.fract() != 0.0) {
            issues.push(Issue::new(
                path,
                format!("{} must be an integer", self.name_for(path)),
            ));
        }
        if let Some(bound) = min
            && magnitude < bound
        {
            issues.push(Issue::new(
                path,
                format!("{} must be at least {bound}", self.name_for(path)),
            ));
        }
        if let Some(bound) = max
            && magnitude > bound
        {
            issues.push(Issue::new(
                path,
                format!("{} must be at most {bound}", self.name_for(path)),
            ));
        }

        coerced
    }

    #[allow(clippy::too_many_arguments)]
    fn check_text(
        &self,
        input: &Value,
        path: &str,
        options: &SpecOptions,
        issues: &mut Vec<Issue>,
        min_len: Option<usize>,
        max_len: Option<usize>,
        uuid_v4: bool,
    ) -> Value {
        let coerced = match input {
            Value::Text(_) => Some(input.clone()),
            Value::Int(i) if options.convert => Some(Value::Text(i.to_string())),
            Value::Float(f) if options.convert => Some(Value::Text(f.to_string())),
            _ => None,
        };

        let Some(coerced) = coerced else {
            issues.push(Issue::new(path, format!("{} must be text", self.name_for(path))));
            return input.clone();
        };

        let Value::Text(text) = &coerced else {
            unreachable!("coerced text is Text");
        };

        if let Some(bound) = min_len
            && text.chars().count() < bound
        {
            issues.push(Issue::new(
                path,
                format!("{} length must be at least {bound}", self.name_for(path)),
            ));
        }
        if let Some(bound) = max_len
            && text.chars().count() > bound
        {
            issues.push(Issue::new(
                path,
                format!("{} length must be at most {bound}", self.name_for(path)),
            ));
        }
        if uuid_v4 && !is_uuid_v4(text) {
            issues.push(Issue::new(
                path,
                format!("{} must be a valid v4 uuid", self.name_for(path)),
            ));
        }

        coerced
    }

    fn check_array(
        &self,
        input: &Value,
        path: &str,
        options: &SpecOptions,
        issues: &mut Vec<Issue>,
        items: Option<&Self>,
    ) -> Value {
        match input {
            Value::List(elems) => {
                let out = elems
                    .iter()
                    .enumerate()
                    .map(|(index, elem)| match items {
                        Some(spec) => spec.check(
                            Some(elem),
                            &join_path(path, &index.to_string()),
                            options,
                            issues,
                        ),
                        None => elem.clone(),
                    })
                    .collect();
                Value::List(out)
            }
            _ => {
                issues.push(Issue::new(
                    path,
                    format!("{} must be a list", self.name_for(path)),
                ));
                input.clone()
            }
        }
    }

    fn check_object(
        &self,
        input: &Value,
        path: &str,
        options: &SpecOptions,
        issues: &mut Vec<Issue>,
        fields: &[(String, Self)],
    ) -> Value {
        let Value::Map(map) = input else {
            issues.push(Issue::new(path, format!("{} must be a map", self.name_for(path))));
            return input.clone();
        };

        let mut out = Map::new();
        for (name, spec) in fields {
            let child = spec.check(map.get(name), &join_path(path, name), options, issues);
            if !child.is_unit() {
                out.insert(name.clone(), child);
            }
        }

        for (key, value) in map.iter() {
            if fields.iter().any(|(name, _)| name == key) {
                continue;
            }
            if options.allow_unknown {
                out.insert(key.clone(), value.clone());
            } else {
                issues.push(Issue::new(
                    join_path(path, key),
                    format!("{key} is not allowed"),
                ));
            }
        }

        Value::Map(out)
    }
}

/// Metadata introspection only serializes the spec's shape, not its
/// closures or bounds.
impl Serialize for Spec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("kind", self.kind.tag())?;
        map.serialize_entry("required", &self.required)?;
        map.end()
    }
}

///
/// SpecFactory
/// Handed to user validator-builder closures so declarations read as
/// `|s| s.number().min(1.0)` without importing `Spec` directly.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SpecFactory;

impl SpecFactory {
    #[must_use]
    pub const fn any(self) -> Spec {
        Spec::any()
    }

    #[must_use]
    pub const fn boolean(self) -> Spec {
        Spec::boolean()
    }

    #[must_use]
    pub const fn number(self) -> Spec {
        Spec::number()
    }

    #[must_use]
    pub const fn text(self) -> Spec {
        Spec::text()
    }

    #[must_use]
    pub const fn func(self) -> Spec {
        Spec::func()
    }

    #[must_use]
    pub const fn array(self) -> Spec {
        Spec::array()
    }
}

fn is_uuid_v4(text: &str) -> bool {
    let groups: Vec<&str> = text.split('-').collect();
    if groups.len() != 5 {
        return false;
    }
    let lens = [8, 4, 4, 4, 12];
    for (group, len) in groups.iter().zip(lens) {
        if group.len() != len || !group.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }
    }
    // version nibble then variant nibble
    groups[2].starts_with('4')
        && groups[3]
            .chars()
            .next()
            .is_some_and(|c| matches!(c.to_ascii_lowercase(), '8' | '9' | 'a' | 'b'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> SpecOptions {
        SpecOptions::default()
    }

    #[test]
    fn required_fails_on_absent_value() {
        let spec = Spec::text().required().label("name");
        let result = spec.validate(None, &opts());

        let err = result.error.expect("required text must fail on None");
        assert_eq!(err.issues[0].message, "name is required");
        assert!(result.value.is_unit());
    }

    #[test]
    fn default_applies_when_absent() {
        let spec = Spec::number().default_value(1i64);
        assert_eq!(spec.validate(None, &opts()).value, Value::Int(1));
        assert_eq!(spec.validate(Some(&Value::Unit), &opts()).value, Value::Int(1));
    }

    #[test]
    fn computed_default_resolves_each_call() {
        let spec = Spec::number().default_with(|| Value::Int(2));
        assert_eq!(spec.validate(None, &opts()).value, Value::Int(2));
    }

    #[test]
    fn number_coerces_trimmed_text() {
        let spec = Spec::number();
        let result = spec.validate(Some(&Value::Text(" 10 ".into())), &opts());
        assert!(result.is_ok());
        assert_eq!(result.value, Value::Int(10));
    }

    #[test]
    fn number_rejects_garbled_text() {
        let spec = Spec::number();
        let result = spec.validate(Some(&Value::Text("10y".into())), &opts());
        assert!(result.error.is_some());
        assert_eq!(result.value, Value::Text("10y".into()));
    }

    #[test]
    fn number_skips_coercion_without_convert() {
        let spec = Spec::number();
        let options = SpecOptions {
            convert: false,
            ..SpecOptions::default()
        };
        assert!(spec.validate(Some(&Value::Text("10".into())), &options).error.is_some());
    }

    #[test]
    fn number_bounds_report_by_label() {
        let spec = Spec::number().min(1.0).max(199.0).label("age");
        let err = spec
            .validate(Some(&Value::Int(500)), &opts())
            .error
            .expect("out of range");
        assert_eq!(err.issues[0].message, "age must be at most 199");
    }

    #[test]
    fn boolean_coerces_true_false_text() {
        let spec = Spec::boolean();
        assert_eq!(
            spec.validate(Some(&Value::Text("True".into())), &opts()).value,
            Value::Bool(true)
        );
        assert!(spec.validate(Some(&Value::Text("yep".into())), &opts()).error.is_some());
    }

    #[test]
    fn text_checks_length_and_uuid() {
        let spec = Spec::text().min(5.0).max(40.0);
        assert!(spec.validate(Some(&Value::Text("abc".into())), &opts()).error.is_some());
        assert!(spec.validate(Some(&Value::Text("abcdef".into())), &opts()).is_ok());

        let uuid = Spec::text().uuid_v4();
        assert!(
            uuid.validate(
                Some(&Value::Text("9b2b0bb2-64c8-4f5e-a4a3-6ac22e7cd347".into())),
                &opts()
            )
            .is_ok()
        );
        assert!(uuid.validate(Some(&Value::Text("not-a-uuid".into())), &opts()).error.is_some());
    }

    #[test]
    fn null_fails_typed_specs_but_passes_any() {
        assert!(Spec::number().validate(Some(&Value::Null), &opts()).error.is_some());
        assert!(Spec::any().validate(Some(&Value::Null), &opts()).is_ok());
    }

    #[test]
    fn array_items_report_indexed_paths() {
        let spec = Spec::array().items(Spec::number());
        let input = Value::List(vec![Value::Int(1), Value::Text("x".into())]);
        let err = spec.validate(Some(&input), &opts()).error.expect("bad item");
        assert_eq!(err.issues[0].path, "1");
    }

    #[test]
    fn object_applies_field_defaults_and_keeps_order() {
        let spec = Spec::object(vec![
            ("name".into(), Spec::text().required()),
            ("age".into(), Spec::number().default_value(1i64)),
        ]);

        let mut input = Map::new();
        input.insert("name", "Joe");

        let result = spec.validate(Some(&Value::Map(input)), &opts());
        assert!(result.is_ok());
        let out = result.value.as_map().unwrap();
        assert_eq!(out.keys(), vec!["name", "age"]);
        assert_eq!(out.get("age"), Some(&Value::Int(1)));
    }

    #[test]
    fn object_unknown_key_policy() {
        let spec = Spec::object(vec![("id".into(), Spec::number())]);
        let mut input = Map::new();
        input.insert("id", 1);
        input.insert("extra", true);

        assert!(spec.validate(Some(&Value::Map(input.clone())), &opts()).is_ok());

        let strict = SpecOptions {
            allow_unknown: false,
            ..SpecOptions::default()
        };
        let err = spec
            .validate(Some(&Value::Map(input)), &strict)
            .error
            .expect("unknown key");
        assert_eq!(err.issues[0].path, "extra");
    }

    #[test]
    fn attempt_returns_value_or_error() {
        let spec = Spec::number();
        assert_eq!(spec.attempt(Some(&Value::Int(3)), &opts()).unwrap(), Value::Int(3));
        assert!(spec.attempt(Some(&Value::Text("x".into())), &opts()).is_err());
    }
}
