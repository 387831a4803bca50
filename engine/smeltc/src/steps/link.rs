//! Link targets into executables or a shared object.

use std::path::PathBuf;

use tracing::info;

use smelt_tools::Flags;

use crate::config::BuildConfig;
use crate::error::BuildError;

#[derive(Debug, Clone, Default)]
pub struct LinkArgs {
    pub libs: Vec<String>,
    pub flags: Vec<String>,
}

/// Link every named target, preferring its archive over loose objects.
///
/// Library-mode trees (the unnamed target) are not linkable; a run with no
/// named targets at all fails with [`BuildError::NoLinkTargets`].
pub fn link_exe(config: &mut BuildConfig, args: &LinkArgs) -> Result<(), BuildError> {
    let linker = config.toolbox.linker()?;
    let project_workspace = config.project_workspace();
    let add_flags: Flags = args.flags.iter().cloned().collect();

    let mut targets: Vec<(String, Vec<PathBuf>)> = Vec::new();
    for key in config.artefacts.build_trees.keys() {
        let Some(root) = key else {
            continue;
        };
        let objects = config
            .artefacts
            .object_archives
            .get(key)
            .or_else(|| config.artefacts.object_files.get(key));
        if let Some(objects) = objects {
            targets.push((root.clone(), objects.iter().cloned().collect()));
        }
    }
    if targets.is_empty() {
        return Err(BuildError::NoLinkTargets);
    }
    targets.sort_by(|a, b| a.0.cmp(&b.0));

    for (root, objects) in targets {
        let exe = project_workspace.join(&root);
        linker
            .link(
                &objects,
                &exe,
                &args.libs,
                &add_flags,
                config.openmp,
                config.profile_name(),
            )
            .map_err(|source| BuildError::Link {
                target: root.clone(),
                source,
            })?;
        info!(target = root, exe = %exe.display(), "linked");
        config.artefacts.executables.push(exe);
    }
    Ok(())
}

/// Link the unnamed library-mode target into a shared object.
///
/// `output` may contain `$output`, substituted with the build output
/// folder. `-fPIC` and `-shared` are appended unless the caller's flags
/// already carry them.
pub fn link_shared_object(
    config: &mut BuildConfig,
    output: &str,
    args: &LinkArgs,
) -> Result<PathBuf, BuildError> {
    let linker = config.toolbox.linker()?;

    let mut flags: Flags = args.flags.iter().cloned().collect();
    for required in ["-fPIC", "-shared"] {
        if !flags.as_slice().iter().any(|f| f == required) {
            flags.add(required);
        }
    }

    let objects: Vec<PathBuf> = config
        .artefacts
        .object_archives
        .get(&None)
        .or_else(|| config.artefacts.object_files.get(&None))
        .ok_or(BuildError::NoLinkTargets)?
        .iter()
        .cloned()
        .collect();

    let out = PathBuf::from(
        output.replace("$output", &config.build_output().to_string_lossy()),
    );
    linker
        .link(
            &objects,
            &out,
            &args.libs,
            &flags,
            config.openmp,
            config.profile_name(),
        )
        .map_err(|source| BuildError::Link {
            target: output.to_string(),
            source,
        })?;
    info!(out = %out.display(), "linked shared object");
    config.artefacts.executables.push(out.clone());
    Ok(out)
}
