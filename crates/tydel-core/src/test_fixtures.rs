//! Shared class fixtures for unit tests. The registry is process-global,
//! so fixtures that register take caller-chosen unique names.

use crate::{
    model::{ModelClass, Reference},
    registry,
};

/// Two classes that reference each other by name, registered under the
/// given (unique) names.
pub(crate) fn cyclic_pair(name_a: &str, name_b: &str) -> (ModelClass, ModelClass) {
    let a = ModelClass::define(name_a)
        .reference("partner", Reference::to_named(name_b))
        .build()
        .expect("fixture class builds");
    let b = ModelClass::define(name_b)
        .reference("partner", Reference::to_named(name_a))
        .build()
        .expect("fixture class builds");

    registry::register(&a).expect("fixture name is unique");
    registry::register(&b).expect("fixture name is unique");

    (a, b)
}

/// A `User` with a nested `Profile` (which nests an `Address`) and an
/// array of `Pet`s. Classes are not registered; all references are
/// direct.
pub(crate) fn user_hierarchy() -> UserHierarchy {
    let pet = ModelClass::define("Pet")
        .optional_with("name", |s| s.text())
        .build()
        .expect("fixture class builds");

    let address = ModelClass::define("Address")
        .optional_with("province", |s| s.text())
        .optional_with("city", |s| s.text())
        .build()
        .expect("fixture class builds");

    let profile = ModelClass::define("Profile")
        .required_with("name", |s| s.text())
        .optional_with("age", |s| s.number().default_value(1i64))
        .reference("address", Reference::to(&address))
        .build()
        .expect("fixture class builds");

    let user = ModelClass::define("User")
        .required_with("id", |s| s.text())
        .reference("profile", Reference::to(&profile))
        .reference("pets", Reference::to_array(&pet))
        .build()
        .expect("fixture class builds");

    UserHierarchy {
        pet,
        address,
        profile,
        user,
    }
}

pub(crate) struct UserHierarchy {
    pub pet: ModelClass,
    pub address: ModelClass,
    pub profile: ModelClass,
    pub user: ModelClass,
}
