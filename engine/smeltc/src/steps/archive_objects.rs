//! Bundle each target's objects into an archive ahead of linking.

use std::path::PathBuf;

use tracing::info;

use crate::config::BuildConfig;
use crate::error::BuildError;

/// Create one `.a` per target from its compiled objects. Targets with no
/// objects are skipped; linking decides whether that is a problem.
pub fn archive_objects(config: &mut BuildConfig) -> Result<(), BuildError> {
    let archiver = config.toolbox.archiver()?;
    let build_output = config.build_output();

    let mut archives: Vec<(Option<String>, PathBuf)> = Vec::new();
    for (key, objects) in &config.artefacts.object_files {
        if objects.is_empty() {
            continue;
        }
        let name = key.as_deref().unwrap_or("library");
        let archive = build_output.join(format!("{name}.a"));
        let objects: Vec<PathBuf> = objects.iter().cloned().collect();

        archiver
            .create_archive(&objects, &archive)
            .map_err(|source| BuildError::Archive {
                target: name.to_string(),
                source,
            })?;
        info!(target = name, objects = objects.len(), "archived objects");
        archives.push((key.clone(), archive));
    }

    for (key, archive) in archives {
        config
            .artefacts
            .object_archives
            .entry(key)
            .or_default()
            .insert(archive);
    }
    Ok(())
}
