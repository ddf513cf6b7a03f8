//! # Contract Packaging
//!
//! A package is a bincode-encoded archive of the contract's source tree.
//! Files are sorted by their `/`-separated relative path before encoding, so
//! the same tree always yields the same bytes and the same `PackageId`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::{ContractDescriptor, PackageArtifact, PackageId};
use std::fs;
use std::path::Path;

use super::errors::LifecycleError;

/// Archive layout. Field order is part of the package hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceArchive {
    pub label: String,
    pub files: Vec<SourceFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub contents: Vec<u8>,
}

/// Build the deployable artifact for `descriptor.source_ref`.
pub fn package(descriptor: &ContractDescriptor) -> Result<PackageArtifact, LifecycleError> {
    let root = Path::new(&descriptor.source_ref);
    let fail = |reason: String| LifecycleError::Packaging {
        source_ref: descriptor.source_ref.clone(),
        reason,
    };

    if !root.is_dir() {
        return Err(fail("not a readable directory".into()));
    }

    let mut files = Vec::new();
    collect_files(root, root, &mut files).map_err(|e| fail(e.to_string()))?;
    if files.is_empty() {
        return Err(fail("no source files".into()));
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let label = descriptor.label();
    let archive = SourceArchive {
        label: label.clone(),
        files,
    };
    let bytes = bincode::serialize(&archive).map_err(|e| fail(e.to_string()))?;
    let content_hash: [u8; 32] = Sha256::digest(&bytes).into();

    Ok(PackageArtifact {
        package_id: PackageId::from_parts(&label, &content_hash),
        label,
        content_hash,
        bytes,
    })
}

/// Decode an artifact back into its archive.
pub fn unpack(artifact: &PackageArtifact) -> Result<SourceArchive, LifecycleError> {
    bincode::deserialize(&artifact.bytes).map_err(|e| LifecycleError::Packaging {
        source_ref: artifact.label.clone(),
        reason: e.to_string(),
    })
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<SourceFile>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // Symlinks are not followed: only regular files are packaged.
        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            collect_files(root, &path, out)?;
        } else if file_type.is_file() {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push(SourceFile {
                path: relative,
                contents: fs::read(&path)?,
            });
        }
    }
    Ok(())
}
