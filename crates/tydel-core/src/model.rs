use crate::{
    compile,
    error::{CompileError, DeclareError},
    instance::{Instance, ParseOptions, Props},
    metadata::{self, Metadata},
};
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::{
    fmt,
    sync::{Arc, OnceLock},
};
use tydel_schema::spec::{Spec, SpecFactory};

///
/// ModelClass
/// A runtime class object. Cheap to clone (shared handle); identity is
/// the handle itself, which keys the per-class caches. Declarations are
/// frozen at `build()`, so cached results are never invalidated.
///

#[derive(Clone)]
pub struct ModelClass(Arc<ClassInner>);

pub(crate) struct ClassInner {
    name: String,
    parent: Option<ModelClass>,
    decls: Vec<FieldDecl>,
    metadata: OnceLock<Metadata>,
    validator: OnceLock<Result<Spec, CompileError>>,
}

impl ModelClass {
    /// Start declaring a new root-level model class.
    #[must_use]
    pub fn define(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            parent: None,
            decls: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.0.parent.as_ref()
    }

    /// This class's own declarations, in declaration order. Not inherited;
    /// the resolver walks the chain itself.
    #[must_use]
    pub fn own_decls(&self) -> &[FieldDecl] {
        &self.0.decls
    }

    /// Identity comparison (same class object, not same shape).
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// True if `self` is `ancestor` or extends it at any depth.
    #[must_use]
    pub fn descends_from(&self, ancestor: &Self) -> bool {
        let mut cursor = Some(self.clone());
        while let Some(class) = cursor {
            if class.same(ancestor) {
                return true;
            }
            cursor = class.parent().cloned();
        }
        false
    }

    /// Ancestor chain in root-to-leaf order, `self` included. The implicit
    /// root base contributes nothing and is represented by `parent: None`.
    #[must_use]
    pub fn ancestry(&self) -> Vec<Self> {
        let mut chain = Vec::new();
        let mut cursor = Some(self.clone());
        while let Some(class) = cursor {
            cursor = class.parent().cloned();
            chain.push(class);
        }
        chain.reverse();
        chain
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Inheritance-merged field metadata. Computed at most once per class.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        self.0.metadata.get_or_init(|| metadata::resolve(self))
    }

    /// The compiled structural validator. Computed at most once per class;
    /// a compilation failure (circular reference) is cached too and
    /// replays identically.
    pub fn validator(&self) -> Result<&Spec, CompileError> {
        compile::ensure_compiled(self)?;
        match self.0.validator.get() {
            Some(Ok(spec)) => Ok(spec),
            Some(Err(err)) => Err(err.clone()),
            None => unreachable!("ensure_compiled always populates the validator cache"),
        }
    }

    pub(crate) fn cached_validator(&self) -> Option<&Result<Spec, CompileError>> {
        self.0.validator.get()
    }

    pub(crate) fn cache_validator(&self, result: Result<Spec, CompileError>) {
        let _ = self.0.validator.set(result);
    }

    /// Class-level factory: a bare instance, parsed when props are given.
    /// Value-equal to `Instance::new` + `parse` for the same props.
    #[must_use]
    pub fn build(&self, props: Option<&Props>, options: &ParseOptions) -> Instance {
        let instance = Instance::new(self);
        if let Some(props) = props {
            instance.parse(props, options);
        }
        instance
    }
}

impl fmt::Debug for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelClass({})", self.0.name)
    }
}

///
/// FieldType
///
/// The declared-type table for fields without a custom validator builder.
/// Deliberately narrow: `Number`, `Text`, `Bool`, and `Func` get typed
/// validators; every other tag (dates, blobs, lists, unions, wrappers)
/// falls through to accept-anything. The table does not inspect arrays,
/// so array-of-model fields must use an explicit [`Reference`].
///

#[derive(Clone, Debug)]
pub enum FieldType {
    Number,
    Text,
    Bool,
    Func,
    Date,
    Blob,
    List,
    Other,
    Model(ModelClass),
}

impl FieldType {
    fn default_spec(&self) -> Spec {
        match self {
            Self::Number => Spec::number(),
            Self::Text => Spec::text(),
            Self::Bool => Spec::boolean(),
            Self::Func => Spec::func(),
            Self::Date | Self::Blob | Self::List | Self::Other => Spec::any(),
            Self::Model(_) => unreachable!("model types declare references, not specs"),
        }
    }
}

///
/// ModelTarget
/// What a reference points at. Direct targets capture the class handle;
/// named targets are looked up in the model registry at compile/parse
/// time, which is how forward and mutual references are declared (the
/// class being named does not need to exist yet).
///

#[derive(Clone)]
pub enum ModelTarget {
    Direct(ModelClass),
    Named(String),
}

impl ModelTarget {
    /// The class this target points at, if it can be determined.
    #[must_use]
    pub fn resolve(&self) -> Option<ModelClass> {
        match self {
            Self::Direct(class) => Some(class.clone()),
            Self::Named(name) => crate::registry::lookup(name),
        }
    }

    #[must_use]
    pub fn describe(&self) -> &str {
        match self {
            Self::Direct(class) => class.name(),
            Self::Named(name) => name,
        }
    }
}

///
/// Reference
/// A field whose value is, or is an array of, another model's instances.
///

#[derive(Clone)]
pub enum Reference {
    To(ModelTarget),
    ToArray(ModelTarget),
}

impl Reference {
    #[must_use]
    pub fn to(class: &ModelClass) -> Self {
        Self::To(ModelTarget::Direct(class.clone()))
    }

    #[must_use]
    pub fn to_array(class: &ModelClass) -> Self {
        Self::ToArray(ModelTarget::Direct(class.clone()))
    }

    /// Late-bound single reference, resolved through the registry.
    #[must_use]
    pub fn to_named(name: impl Into<String>) -> Self {
        Self::To(ModelTarget::Named(name.into()))
    }

    /// Late-bound array reference, resolved through the registry.
    #[must_use]
    pub fn to_array_named(name: impl Into<String>) -> Self {
        Self::ToArray(ModelTarget::Named(name.into()))
    }

    #[must_use]
    pub const fn target(&self) -> &ModelTarget {
        match self {
            Self::To(target) | Self::ToArray(target) => target,
        }
    }

    #[must_use]
    pub fn resolve(&self) -> Option<ModelClass> {
        self.target().resolve()
    }

    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::ToArray(_))
    }
}

// Prints the referenced class by name only; reference graphs may contain
// cycles, which compilation reports rather than Debug.
impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::To(target) => write!(f, "Reference::To({})", target.describe()),
            Self::ToArray(target) => write!(f, "Reference::ToArray({})", target.describe()),
        }
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("model", self.target().describe())?;
        map.serialize_entry("cardinality", if self.is_array() { "many" } else { "one" })?;
        map.end()
    }
}

///
/// FieldDecl
/// The stored intent for one field of one class. Immutable once written;
/// the merge step produces resolved copies, never edits originals.
///
/// Exactly one of `spec` / `reference` is meaningful for validation.
/// A reference field's `required` flag is recorded but not enforced by
/// the compiled validator (the nested validator is used as-is).
///

#[derive(Clone, Debug, Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<Spec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
}

///
/// ClassBuilder
/// The declaration surface. Each call records one field's validation
/// intent; nothing is resolved or compiled until the class is frozen.
///

pub struct ClassBuilder {
    name: String,
    parent: Option<ModelClass>,
    decls: Vec<FieldDecl>,
}

impl ClassBuilder {
    #[must_use]
    pub fn extends(mut self, parent: &ModelClass) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Declare a required field validated per the declared-type table.
    #[must_use]
    pub fn required(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.typed_field(name.into(), ty, true)
    }

    /// Declare an optional field validated per the declared-type table.
    #[must_use]
    pub fn optional(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.typed_field(name.into(), ty, false)
    }

    /// Declare a required field with a custom validator builder.
    #[must_use]
    pub fn required_with(self, name: impl Into<String>, builder: impl FnOnce(SpecFactory) -> Spec) -> Self {
        self.built_field(name.into(), builder, true)
    }

    /// Declare an optional field with a custom validator builder.
    #[must_use]
    pub fn optional_with(self, name: impl Into<String>, builder: impl FnOnce(SpecFactory) -> Spec) -> Self {
        self.built_field(name.into(), builder, false)
    }

    /// Declare an explicit nested-model field. This is the only way to
    /// declare array-of-model fields.
    #[must_use]
    pub fn reference(mut self, name: impl Into<String>, reference: Reference) -> Self {
        self.decls.push(FieldDecl {
            name: name.into(),
            required: false,
            spec: None,
            reference: Some(reference),
        });
        self
    }

    fn typed_field(mut self, name: String, ty: FieldType, required: bool) -> Self {
        // A model-typed field becomes a reference; any validator intent
        // attached alongside is ignored.
        let decl = if let FieldType::Model(class) = ty {
            FieldDecl {
                name,
                required,
                spec: None,
                reference: Some(Reference::To(ModelTarget::Direct(class))),
            }
        } else {
            let spec = ty.default_spec().label(name.clone());
            FieldDecl {
                name,
                required,
                spec: Some(if required { spec.required() } else { spec }),
                reference: None,
            }
        };
        self.decls.push(decl);
        self
    }

    fn built_field(
        mut self,
        name: String,
        builder: impl FnOnce(SpecFactory) -> Spec,
        required: bool,
    ) -> Self {
        let spec = builder(SpecFactory).label(name.clone());
        self.decls.push(FieldDecl {
            name,
            required,
            spec: Some(if required { spec.required() } else { spec }),
            reference: None,
        });
        self
    }

    /// Freeze the class. Duplicate declarations within one class body are
    /// programmer errors and fail here, before any instance exists.
    pub fn build(self) -> Result<ModelClass, DeclareError> {
        for (index, decl) in self.decls.iter().enumerate() {
            if self.decls[..index].iter().any(|d| d.name == decl.name) {
                return Err(DeclareError::DuplicateField {
                    class: self.name,
                    field: decl.name.clone(),
                });
            }
        }

        Ok(ModelClass(Arc::new(ClassInner {
            name: self.name,
            parent: self.parent,
            decls: self.decls,
            metadata: OnceLock::new(),
            validator: OnceLock::new(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeclareError;

    #[test]
    fn duplicate_field_fails_at_build() {
        let result = ModelClass::define("Dup")
            .required("id", FieldType::Text)
            .optional("id", FieldType::Number)
            .build();

        assert_eq!(
            result.err(),
            Some(DeclareError::DuplicateField {
                class: "Dup".into(),
                field: "id".into(),
            })
        );
    }

    #[test]
    fn redeclaring_an_inherited_field_is_allowed() {
        let base = ModelClass::define("Base")
            .optional("name", FieldType::Text)
            .build()
            .unwrap();
        let child = ModelClass::define("Child")
            .extends(&base)
            .required("name", FieldType::Text)
            .build();

        assert!(child.is_ok());
    }

    #[test]
    fn model_typed_field_becomes_a_reference() {
        let profile = ModelClass::define("Profile").build().unwrap();
        let user = ModelClass::define("User")
            .required("profile", FieldType::Model(profile.clone()))
            .build()
            .unwrap();

        let decl = &user.own_decls()[0];
        assert!(decl.spec.is_none());
        let reference = decl.reference.as_ref().unwrap();
        assert!(reference.resolve().unwrap().same(&profile));
        assert!(!reference.is_array());
    }

    #[test]
    fn identity_and_ancestry() {
        let a = ModelClass::define("A").build().unwrap();
        let b = ModelClass::define("B").extends(&a).build().unwrap();
        let c = ModelClass::define("C").extends(&b).build().unwrap();

        assert!(c.descends_from(&a));
        assert!(!a.descends_from(&c));
        assert!(c.same(&c.clone()));

        let names: Vec<String> = c.ancestry().iter().map(|k| k.name().to_string()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
