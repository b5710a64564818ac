//! Image path resolution for dataset records.
//!
//! Dataset image references are usually relative and the datasets move
//! around, so each reference is tried against several roots in order:
//! as-is when absolute, the dataset file's directory, the current working
//! directory, then an optional configured extra root. Missing images are
//! skipped silently so one bad reference never breaks a run.

use std::path::{Path, PathBuf};

/// Resolve image references to existing absolute paths.
pub fn resolve_image_paths(
    dataset_path: &Path,
    image_refs: &[String],
    extra_root: Option<&Path>,
) -> Vec<PathBuf> {
    if image_refs.is_empty() {
        return Vec::new();
    }

    let dataset_dir = dataset_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut found = Vec::new();
    for image_ref in image_refs {
        if image_ref.is_empty() {
            continue;
        }
        let candidate_path = Path::new(image_ref);

        if candidate_path.is_absolute() {
            if candidate_path.exists() {
                found.push(candidate_path.to_path_buf());
            }
            continue;
        }

        let mut roots = vec![dataset_dir.as_path(), cwd.as_path()];
        if let Some(root) = extra_root {
            roots.push(root);
        }

        if let Some(hit) = roots
            .iter()
            .map(|root| root.join(candidate_path))
            .find(|p| p.exists())
        {
            found.push(hit);
        }
    }
    found
}
