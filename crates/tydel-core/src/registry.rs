use crate::{error::DeclareError, model::ModelClass};
use std::sync::{LazyLock, RwLock};

///
/// MODELS
/// The process-wide model registry backing named reference targets.
/// Write-once-per-name: entries are never replaced or removed, so reads
/// need no coherence protocol. A racing duplicate registration is an
/// error, never a silent overwrite.
///

static MODELS: LazyLock<RwLock<Vec<ModelClass>>> = LazyLock::new(|| RwLock::new(Vec::new()));

/// Register a class under its name so `Reference::to_named` can find it.
/// Only classes that are the target of late-bound references need to be
/// registered.
pub fn register(class: &ModelClass) -> Result<(), DeclareError> {
    let mut models = MODELS
        .write()
        .expect("model registry RwLock poisoned while acquiring write lock");

    if models.iter().any(|m| m.name() == class.name()) {
        return Err(DeclareError::DuplicateModel {
            name: class.name().to_string(),
        });
    }

    models.push(class.clone());
    Ok(())
}

/// Look a registered class up by name.
#[must_use]
pub fn lookup(name: &str) -> Option<ModelClass> {
    MODELS
        .read()
        .expect("model registry RwLock poisoned while acquiring read lock")
        .iter()
        .find(|m| m.name() == name)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup() {
        let class = ModelClass::define("RegistryLookupTarget").build().unwrap();
        register(&class).unwrap();

        let found = lookup("RegistryLookupTarget").unwrap();
        assert!(found.same(&class));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let first = ModelClass::define("RegistryDupTarget").build().unwrap();
        let second = ModelClass::define("RegistryDupTarget").build().unwrap();

        register(&first).unwrap();
        assert_eq!(
            register(&second),
            Err(DeclareError::DuplicateModel {
                name: "RegistryDupTarget".into(),
            })
        );

        // First registration still wins.
        assert!(lookup("RegistryDupTarget").unwrap().same(&first));
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(lookup("RegistryNeverRegistered").is_none());
    }
}
