use crate::{error::CompileError, model::ModelClass};
use tydel_schema::spec::Spec;

/// Compile (or fetch) the structural validator for `class`, populating
/// its cache and the caches of every nested model reached on the way.
///
/// Reference fields use the referenced class's compiled validator as-is
/// (a reference's `required` flag is not enforced); array references wrap
/// it in `array().items(..)`; fields with neither a spec nor a reference
/// are unconstrained and omitted.
///
/// Cycles among model references would otherwise recurse without bound,
/// so an explicit in-progress stack cuts them and the compilation fails
/// with the offending class path. The failure is cached like a success,
/// so every later call replays it deterministically.
pub(crate) fn ensure_compiled(class: &ModelClass) -> Result<(), CompileError> {
    let mut in_progress = Vec::new();
    compile_into_cache(class, &mut in_progress).map(|_| ())
}

fn compile_into_cache(
    class: &ModelClass,
    in_progress: &mut Vec<(usize, String)>,
) -> Result<Spec, CompileError> {
    if let Some(cached) = class.cached_validator() {
        return cached.clone();
    }

    if in_progress.iter().any(|(id, _)| *id == class.id()) {
        let mut path: Vec<String> = in_progress.iter().map(|(_, name)| name.clone()).collect();
        path.push(class.name().to_string());
        return Err(CompileError::CircularReference { path });
    }

    in_progress.push((class.id(), class.name().to_string()));
    let result = compile_fields(class, in_progress);
    in_progress.pop();

    class.cache_validator(result.clone());
    result
}

fn compile_fields(
    class: &ModelClass,
    in_progress: &mut Vec<(usize, String)>,
) -> Result<Spec, CompileError> {
    let mut fields = Vec::new();

    for decl in class.metadata().iter() {
        let spec = if let Some(spec) = &decl.spec {
            spec.clone()
        } else if let Some(reference) = &decl.reference {
            let Some(target) = reference.resolve() else {
                return Err(CompileError::UnknownModel {
                    class: class.name().to_string(),
                    field: decl.name.clone(),
                    model: reference.target().describe().to_string(),
                });
            };
            let nested = compile_into_cache(&target, in_progress)?;
            if reference.is_array() {
                Spec::array().items(nested)
            } else {
                nested
            }
        } else {
            continue;
        };

        fields.push((decl.name.clone(), spec));
    }

    Ok(Spec::object(fields))
}
