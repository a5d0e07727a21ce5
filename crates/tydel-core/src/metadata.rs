use crate::model::{FieldDecl, ModelClass};
use serde::Serialize;

///
/// Metadata
/// The inheritance-merged field catalogue for one class: field name →
/// winning declaration, in first-appearance order walking root → leaf.
/// Redeclaring a field in a subclass replaces its content but never
/// moves its position.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct Metadata {
    fields: Vec<FieldDecl>,
}

impl Metadata {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields.iter()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Fold the ancestor chain root → leaf into one flat catalogue. Later
/// (more derived) declarations overwrite earlier content in place.
///
/// Called once per class through the class's metadata cache; declarations
/// are frozen at build time so the result never needs invalidation.
pub(crate) fn resolve(class: &ModelClass) -> Metadata {
    let mut fields: Vec<FieldDecl> = Vec::new();

    for ancestor in class.ancestry() {
        for decl in ancestor.own_decls() {
            match fields.iter_mut().find(|f| f.name == decl.name) {
                Some(existing) => *existing = decl.clone(),
                None => fields.push(decl.clone()),
            }
        }
    }

    Metadata { fields }
}
