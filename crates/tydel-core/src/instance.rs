use crate::{
    error::ValidateError,
    model::ModelClass,
};
use derive_more::{Deref, DerefMut, IntoIterator};
use std::{cell::RefCell, fmt, rc::Rc};
use tydel_schema::{
    spec::{SpecOptions, Validation},
    value::{Map, Value},
};

///
/// ParseOptions
///

#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    /// Run field validators during parse so casts and defaults land on
    /// the instance. With `convert: false` raw values are stored as-is.
    pub convert: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { convert: true }
    }
}

///
/// ValidateOptions
///

#[derive(Clone, Copy, Debug)]
pub struct ValidateOptions {
    /// Feed the validated (coerced, defaulted) output back through
    /// `parse` onto the live instance.
    pub apply: bool,
    /// Surface a failure as an error instead of returning it.
    pub raise: bool,
    pub convert: bool,
    pub allow_unknown: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            apply: false,
            raise: false,
            convert: true,
            allow_unknown: true,
        }
    }
}

///
/// FieldValue
/// What a field slot (or a parse input) can hold. `Data` is keyed input
/// that has not been materialized into a model instance yet and may
/// itself contain instances; `Plain` is portable data all the way down.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Plain(Value),
    Model(Instance),
    List(Vec<FieldValue>),
    Data(Props),
}

impl FieldValue {
    #[must_use]
    pub const fn as_model(&self) -> Option<&Instance> {
        match self {
            Self::Model(instance) => Some(instance),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_plain(&self) -> Option<&Value> {
        match self {
            Self::Plain(value) => Some(value),
            _ => None,
        }
    }

    /// Keyed data can seed a nested model parse.
    const fn is_keyed(&self) -> bool {
        matches!(self, Self::Model(_) | Self::Data(_) | Self::Plain(Value::Map(_)))
    }

    /// Project to portable data: instances serialize themselves, lists go
    /// element-wise, everything else passes through.
    #[must_use]
    pub fn to_portable(&self) -> Value {
        match self {
            Self::Plain(value) => value.clone(),
            Self::Model(instance) => instance.to_portable(),
            Self::List(items) => Value::List(items.iter().map(Self::to_portable).collect()),
            Self::Data(props) => {
                let mut map = Map::new();
                for (name, value) in props.iter() {
                    map.insert(name.clone(), value.to_portable());
                }
                Value::Map(map)
            }
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Plain(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Plain(Value::Bool(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Plain(Value::Int(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Plain(Value::Float(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Plain(Value::Text(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Plain(Value::Text(value))
    }
}

impl From<Map> for FieldValue {
    fn from(value: Map) -> Self {
        Self::Plain(Value::Map(value))
    }
}

impl From<Instance> for FieldValue {
    fn from(instance: Instance) -> Self {
        Self::Model(instance)
    }
}

impl From<Props> for FieldValue {
    fn from(props: Props) -> Self {
        Self::Data(props)
    }
}

impl From<Vec<Self>> for FieldValue {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

///
/// Props
/// Insertion-ordered parse input / slot storage: field name → value.
/// Key presence is significant (an absent key is skipped by reference
/// parsing; a present unset one is assigned through).
///

#[derive(Clone, Debug, Default, PartialEq, Deref, DerefMut, IntoIterator)]
pub struct Props(Vec<(String, FieldValue)>);

impl Props {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Insert or replace; a replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Lift a portable map into props (every entry plain).
    #[must_use]
    pub fn from_portable(map: &Map) -> Self {
        let mut props = Self::new();
        for (key, value) in map.iter() {
            props.insert(key.clone(), FieldValue::Plain(value.clone()));
        }
        props
    }

    /// Seed props from any keyed field value; non-keyed input yields
    /// empty props (the nested parse then only applies defaults).
    fn from_field_value(value: &FieldValue) -> Self {
        match value {
            FieldValue::Data(props) => props.clone(),
            FieldValue::Plain(Value::Map(map)) => Self::from_portable(map),
            FieldValue::Model(instance) => instance.slots.borrow().clone(),
            _ => Self::new(),
        }
    }
}

///
/// Instance
/// A live model object: a shared handle over ordered field slots. Clones
/// alias the same slots, so passing an instance through a reference field
/// shares it rather than copying, and re-parsing an existing nested
/// instance preserves its identity. The engine is single-threaded; the
/// per-class caches are the only cross-thread state.
///

#[derive(Clone)]
pub struct Instance {
    class: ModelClass,
    slots: Rc<RefCell<Props>>,
}

impl Instance {
    /// A bare instance: no slots at all, not even unset ones.
    #[must_use]
    pub fn new(class: &ModelClass) -> Self {
        Self {
            class: class.clone(),
            slots: Rc::new(RefCell::new(Props::new())),
        }
    }

    #[must_use]
    pub const fn class(&self) -> &ModelClass {
        &self.class
    }

    /// Identity comparison: the same live object, not value equality.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slots, &other.slots)
    }

    /// True once the field slot has been assigned, even to an unset value.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.slots.borrow().contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.slots.borrow().get(name).cloned()
    }

    /// Direct field assignment. Names outside the metadata are allowed
    /// (and surface during validation under the unknown-field policy).
    pub fn set(&self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.slots.borrow_mut().insert(name, value);
    }

    fn set_slot(&self, name: &str, value: FieldValue) {
        self.slots.borrow_mut().insert(name.to_string(), value);
    }

    /// Parse props into this instance, field by field in metadata order.
    ///
    /// Parsing never fails: invalid scalar values are stored untouched
    /// for a later `validate` to surface, and reference fields degrade to
    /// pass-through or shallow overlay rather than erroring. Returns the
    /// handle for chaining.
    pub fn parse(&self, props: &Props, options: &ParseOptions) -> Self {
        for decl in self.class.metadata().iter() {
            let name = decl.name.as_str();

            if let Some(reference) = &decl.reference {
                // Reference parsing is keyed on presence.
                let Some(value) = props.get(name) else { continue };
                // Unresolvable named targets are a declaration problem;
                // parse stays lenient and compilation reports them.
                let Some(target) = reference.resolve() else { continue };

                if reference.is_array() {
                    self.parse_array_reference(name, value, &target, options);
                } else {
                    self.parse_single_reference(name, value, &target, options);
                }
            } else if let (true, Some(spec)) = (options.convert, decl.spec.as_ref()) {
                match props.get(name) {
                    value @ (None | Some(FieldValue::Plain(_))) => {
                        let input = value.and_then(FieldValue::as_plain);
                        let result = spec.validate(input, &SpecOptions::default());
                        if result.is_ok() {
                            // coerced and defaulted output
                            self.set_slot(name, FieldValue::Plain(result.value));
                        } else {
                            // invalid input is stored untouched
                            self.set_slot(
                                name,
                                FieldValue::Plain(input.cloned().unwrap_or_default()),
                            );
                        }
                    }
                    // instances and lists are opaque to scalar validators
                    Some(other) => self.set_slot(name, other.clone()),
                }
            } else {
                let value = props
                    .get(name)
                    .cloned()
                    .unwrap_or(FieldValue::Plain(Value::Unit));
                self.set_slot(name, value);
            }
        }

        self.clone()
    }

    fn parse_array_reference(
        &self,
        name: &str,
        value: &FieldValue,
        target: &ModelClass,
        options: &ParseOptions,
    ) {
        let elems: Option<Vec<FieldValue>> = match value {
            FieldValue::List(items) => Some(items.clone()),
            FieldValue::Plain(Value::List(values)) => {
                Some(values.iter().cloned().map(FieldValue::Plain).collect())
            }
            _ => None,
        };

        let list = elems.map_or_else(Vec::new, |items| {
            items
                .into_iter()
                .map(|item| match item {
                    FieldValue::Model(instance) if instance.class().descends_from(target) => {
                        FieldValue::Model(instance)
                    }
                    other => FieldValue::Model(
                        target.build(Some(&Props::from_field_value(&other)), options),
                    ),
                })
                .collect()
        });

        self.set_slot(name, FieldValue::List(list));
    }

    fn parse_single_reference(
        &self,
        name: &str,
        value: &FieldValue,
        target: &ModelClass,
        options: &ParseOptions,
    ) {
        match value {
            // pass a matching instance, null, or explicit-unset through
            FieldValue::Model(instance) if instance.class().descends_from(target) => {
                self.set_slot(name, FieldValue::Model(instance.clone()));
            }
            FieldValue::Plain(Value::Null) => self.set_slot(name, FieldValue::Plain(Value::Null)),
            FieldValue::Plain(Value::Unit) => self.set_slot(name, FieldValue::Plain(Value::Unit)),
            value if value.is_keyed() => {
                let incoming = Props::from_field_value(value);
                match self.get(name) {
                    // re-parse into the existing child in place
                    Some(FieldValue::Model(child)) => {
                        child.parse(&incoming, options);
                    }
                    // a stored plain map cannot re-parse; overlay shallowly
                    Some(FieldValue::Plain(Value::Map(mut stored))) => {
                        for (key, item) in incoming.iter() {
                            stored.insert(key.clone(), item.to_portable());
                        }
                        self.set_slot(name, FieldValue::Plain(Value::Map(stored)));
                    }
                    _ => {
                        let child = target.build(Some(&incoming), options);
                        self.set_slot(name, FieldValue::Model(child));
                    }
                }
            }
            // a bare scalar is not usable as nested-model data
            _ => {}
        }
    }

    /// The plain-data projection: exactly the metadata fields, in
    /// metadata order. Unset fields are omitted, nulls kept, nested
    /// instances and list elements serialized recursively.
    #[must_use]
    pub fn to_portable(&self) -> Value {
        let mut out = Map::new();
        let slots = self.slots.borrow();

        for decl in self.class.metadata().iter() {
            let Some(value) = slots.get(&decl.name) else {
                continue;
            };
            if matches!(value, FieldValue::Plain(Value::Unit)) {
                continue;
            }
            out.insert(decl.name.clone(), value.to_portable());
        }

        Value::Map(out)
    }

    /// The portable form plus any slots outside the metadata, so the
    /// unknown-field policy has something to act on.
    fn portable_for_validation(&self) -> Value {
        let Value::Map(mut out) = self.to_portable() else {
            unreachable!("to_portable always yields a map");
        };

        let slots = self.slots.borrow();
        for (name, value) in slots.iter() {
            if self.class.metadata().contains(name)
                || matches!(value, FieldValue::Plain(Value::Unit))
            {
                continue;
            }
            out.insert(name.clone(), value.to_portable());
        }

        Value::Map(out)
    }

    /// Run the compiled validator against the serialized instance.
    ///
    /// Failures are returned in the result, not raised, unless `raise`
    /// asks for an error. On success with `apply`, the coerced output is
    /// parsed back onto the instance so defaults become visible.
    pub fn validate(&self, options: &ValidateOptions) -> Result<Validation, ValidateError> {
        let spec = self.class.validator().map_err(ValidateError::Compile)?;
        let portable = self.portable_for_validation();
        let result = spec.validate(
            Some(&portable),
            &SpecOptions {
                convert: options.convert,
                allow_unknown: options.allow_unknown,
            },
        );

        if let Some(error) = &result.error {
            if options.raise {
                return Err(ValidateError::Raised(error.clone()));
            }
        } else if options.apply
            && let Value::Map(map) = &result.value
        {
            self.parse(&Props::from_portable(map), &ParseOptions::default());
        }

        Ok(result)
    }

    /// Always-throwing variant: the coerced portable value, or the error.
    pub fn attempt(&self) -> Result<Value, ValidateError> {
        let result = self.validate(&ValidateOptions {
            raise: true,
            ..ValidateOptions::default()
        })?;
        Ok(result.value)
    }
}

/// Value equality: same class and value-equal slots (nested instances
/// compare by value too). Identity is [`Instance::same`].
impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.class.same(&other.class) && *self.slots.borrow() == *other.slots.borrow()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({}, {:?})", self.class.name(), self.slots.borrow())
    }
}
