//! ZIP fixture builders shared across test modules

use std::io::Write;
use std::path::Path;

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::FileOptions;

/// Create a ZIP archive containing the given files, stored uncompressed
pub(crate) fn create_zip_archive(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

/// Create a ZIP archive with explicit directory entries followed by files
pub(crate) fn create_zip_archive_with_dirs(
    archive_path: &Path,
    dirs: &[&str],
    files: &[(&str, &[u8])],
) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for dir in dirs {
        writer.add_directory(dir.trim_end_matches('/'), options).unwrap();
    }
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

/// Create a ZIP archive whose files carry explicit Unix permission bits
pub(crate) fn create_zip_archive_with_modes(archive_path: &Path, files: &[(&str, &[u8], u32)]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, content, mode) in files {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(*mode);
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

/// Create a ZIP archive with DEFLATE-compressed files
pub(crate) fn create_deflated_zip_archive(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}
