//! Archive extraction into an isolated directory.
//!
//! The destination must not exist yet; it is created here so each attempt
//! gets a clean tree. Entries that would escape the destination are rejected
//! by the underlying archive crates. A failed extraction leaves whatever was
//! written for diagnostics; there is no partial recovery.

use std::fs::File;
use std::path::Path;

use flate2::read::GzDecoder;

use updraft_core::ExtractError;

/// Archive formats recognised by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

/// Unpack `archive` into the not-yet-existing directory `dest`.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<(), ExtractError> {
    let format = ArchiveFormat::detect(archive).ok_or_else(|| ExtractError::UnsupportedFormat {
        path: archive.to_path_buf(),
    })?;
    if dest.exists() {
        return Err(ExtractError::DestinationExists {
            path: dest.to_path_buf(),
        });
    }

    let file = File::open(archive).map_err(|e| ExtractError::io(archive, e))?;
    std::fs::create_dir_all(dest).map_err(|e| ExtractError::io(dest, e))?;

    let corrupt = |detail: String| ExtractError::Archive {
        path: archive.to_path_buf(),
        detail,
    };
    match format {
        ArchiveFormat::Zip => {
            let mut zip = zip::ZipArchive::new(file).map_err(|e| corrupt(e.to_string()))?;
            zip.extract(dest).map_err(|e| corrupt(e.to_string()))?;
        }
        ArchiveFormat::TarGz => {
            let mut tar = tar::Archive::new(GzDecoder::new(file));
            tar.set_preserve_permissions(true);
            tar.unpack(dest).map_err(|e| corrupt(e.to_string()))?;
        }
    }

    tracing::debug!(archive = %archive.display(), dest = %dest.display(), "archive extracted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use flate2::{write::GzEncoder, Compression};
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[rstest]
    #[case("server.zip", Some(ArchiveFormat::Zip))]
    #[case("SERVER.ZIP", Some(ArchiveFormat::Zip))]
    #[case("server.tar.gz", Some(ArchiveFormat::TarGz))]
    #[case("server.tgz", Some(ArchiveFormat::TarGz))]
    #[case("server.rar", None)]
    #[case("server", None)]
    fn format_detected_from_name(#[case] name: &str, #[case] expected: Option<ArchiveFormat>) {
        assert_eq!(ArchiveFormat::detect(&PathBuf::from(name)), expected);
    }

    #[test]
    fn zip_extracts_nested_entries() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("build-101.zip");
        write_zip(
            &archive,
            &[("bedrock_server", b"#!/bin/sh\n"), ("behavior_packs/a.json", b"{}")],
        );

        let dest = tmp.path().join("extract-1");
        extract_archive(&archive, &dest).unwrap();

        assert_eq!(std::fs::read(dest.join("bedrock_server")).unwrap(), b"#!/bin/sh\n");
        assert!(dest.join("behavior_packs").join("a.json").is_file());
    }

    #[test]
    fn tar_gz_extracts_entries() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("build-102.tar.gz");
        write_tar_gz(&archive, &[("bin/server", b"payload")]);

        let dest = tmp.path().join("extract-2");
        extract_archive(&archive, &dest).unwrap();

        assert_eq!(std::fs::read(dest.join("bin").join("server")).unwrap(), b"payload");
    }

    #[test]
    fn existing_destination_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("b.zip");
        write_zip(&archive, &[("x", b"x")]);
        let dest = tmp.path().join("taken");
        std::fs::create_dir_all(&dest).unwrap();

        let err = extract_archive(&archive, &dest).unwrap_err();
        assert!(matches!(err, ExtractError::DestinationExists { .. }));
    }

    #[test]
    fn corrupt_zip_is_archive_error() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("b.zip");
        std::fs::write(&archive, b"this is not a zip file").unwrap();

        let err = extract_archive(&archive, &tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractError::Archive { .. }), "got: {err}");
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("b.7z");
        std::fs::write(&archive, b"x").unwrap();

        let err = extract_archive(&archive, &tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat { .. }));
        assert!(!tmp.path().join("out").exists());
    }

    #[test]
    fn missing_archive_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err =
            extract_archive(&tmp.path().join("gone.zip"), &tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }
}
