//! Package fixtures: minimal APK/IPA archives written with `zip`

use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;

/// Bytes standing in for a PNG payload
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

/// Write a stored (uncompressed) zip with the given entries
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create fixture");
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        zip.start_file(*name, options).expect("start entry");
        zip.write_all(data).expect("write entry");
    }
    zip.finish().expect("finish zip");
}

/// Single-entry stored zip whose zip64 extra field declares `declared_size`
///
/// The real payload is `data`; only the uncompressed size in the local and
/// central headers is forged.
pub fn write_zip_with_declared_size(path: &Path, name: &str, data: &[u8], declared_size: u64) {
    const ZIP64_SENTINEL: u32 = 0xFFFF_FFFF;
    let crc = crc32fast::hash(data);
    let name_len = name.len() as u16;
    let mut extra = Vec::new();
    extra.extend_from_slice(&0x0001u16.to_le_bytes());
    extra.extend_from_slice(&8u16.to_le_bytes());
    extra.extend_from_slice(&declared_size.to_le_bytes());

    let mut out = Vec::new();
    // local file header
    out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&[0; 8]); // flags, method, time, date
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&ZIP64_SENTINEL.to_le_bytes());
    out.extend_from_slice(&name_len.to_le_bytes());
    out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&extra);
    out.extend_from_slice(data);

    // central directory
    let cd_offset = out.len() as u32;
    out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&[0; 8]); // flags, method, time, date
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&ZIP64_SENTINEL.to_le_bytes());
    out.extend_from_slice(&name_len.to_le_bytes());
    out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    out.extend_from_slice(&[0; 8]); // comment len, disk, internal attrs, external attrs (lo)
    out.extend_from_slice(&[0; 2]); // external attrs (hi)
    out.extend_from_slice(&0u32.to_le_bytes()); // local header offset
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&extra);
    let cd_size = out.len() as u32 - cd_offset;

    // end of central directory
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&[0; 4]); // disk numbers
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    std::fs::write(path, out).expect("write forged zip");
}

/// XML Info.plist from key/value pairs
pub fn info_plist(pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut dict = plist::Dictionary::new();
    for (key, value) in pairs {
        dict.insert((*key).to_string(), plist::Value::String((*value).to_string()));
    }
    let mut buf = Vec::new();
    plist::Value::Dictionary(dict)
        .to_writer_xml(&mut buf)
        .expect("serialize plist");
    buf
}

/// APK with a manifest and one launcher icon
pub fn write_apk(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    write_zip(
        &path,
        &[
            ("AndroidManifest.xml", b"binary-xml"),
            ("classes.dex", b"dex"),
            ("res/mipmap-hdpi-v4/ic_launcher.png", b"hdpi"),
            ("res/mipmap-xxhdpi-v4/ic_launcher.png", FAKE_PNG),
        ],
    );
    path
}

/// IPA whose main bundle carries `plist_pairs` and one app icon
pub fn write_ipa(dir: &Path, name: &str, app: &str, plist_pairs: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let plist_entry = format!("Payload/{}.app/Info.plist", app);
    let icon_entry = format!("Payload/{}.app/AppIcon60x60@3x.png", app);
    let plist = info_plist(plist_pairs);
    write_zip(
        &path,
        &[
            (plist_entry.as_str(), plist.as_slice()),
            (icon_entry.as_str(), FAKE_PNG),
        ],
    );
    path
}

/// IPA with an app directory but no Info.plist anywhere
pub fn write_ipa_without_manifest(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    write_zip(
        &path,
        &[
            ("Payload/Broken.app/Broken", b"mach-o"),
            ("Payload/Broken.app/AppIcon60x60@2x.png", FAKE_PNG),
        ],
    );
    path
}

/// Sorted file names directly inside `dir`, directories excluded
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
