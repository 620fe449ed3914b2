use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use indoc::indoc;
use insta::assert_snapshot;

use pexl_normalize::PackageName;

use crate::{MetadataCache, MetadataError, MetadataType};

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::write(path, content)?;
    Ok(())
}

fn pkg_info(name: &str, version: &str) -> String {
    format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n")
}

fn write_wheel(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
    let mut writer = zip::ZipWriter::new(fs_err::File::create(path)?);
    for (name, content) in entries {
        writer.start_file(*name, zip::write::SimpleFileOptions::default())?;
        writer.write_all(content.as_bytes())?;
    }
    writer.finish()?;
    Ok(())
}

fn append_tar_entries<W: Write>(builder: &mut tar::Builder<W>, entries: &[(&str, &str)]) -> Result<()> {
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, content.as_bytes())?;
    }
    Ok(())
}

fn write_tar_gz(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
    let encoder = flate2::write::GzEncoder::new(
        fs_err::File::create(path)?,
        flate2::Compression::default(),
    );
    let mut builder = tar::Builder::new(encoder);
    append_tar_entries(&mut builder, entries)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

fn write_tar_xz(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
    let mut builder = tar::Builder::new(xz2::write::XzEncoder::new(
        fs_err::File::create(path)?,
        6,
    ));
    append_tar_entries(&mut builder, entries)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

fn write_tar_bz2(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
    let mut builder = tar::Builder::new(bzip2::write::BzEncoder::new(
        fs_err::File::create(path)?,
        bzip2::Compression::default(),
    ));
    append_tar_entries(&mut builder, entries)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

#[test]
fn installed_directory() -> Result<()> {
    let site_packages = tempfile::tempdir()?;
    let root = site_packages.path();
    write_file(&root.join("foo-1.0.dist-info/METADATA"), &pkg_info("Foo", "1.0"))?;
    write_file(&root.join("foo-1.0.dist-info/RECORD"), "")?;
    write_file(
        &root.join("foo-1.0.dist-info/entry_points.txt"),
        "[console_scripts]\nfoo = foo:main\n",
    )?;
    write_file(&root.join("bar-2.0.egg-info/PKG-INFO"), &pkg_info("bar", "2.0"))?;
    write_file(&root.join("bar-2.0.egg-info/requires.txt"), "baz\n")?;

    let cache = MetadataCache::new();
    let all = cache.locate(root, &[], false)?;
    assert_eq!(all.len(), 2);

    let foo = &all[0];
    assert_eq!(foo.metadata.metadata_type, MetadataType::DistInfo);
    assert_eq!(foo.metadata.name, "Foo");
    assert_eq!(foo.metadata.project_name.as_str(), "foo");
    assert_eq!(foo.metadata.rel_path, "foo-1.0.dist-info/METADATA");
    assert_eq!(
        foo.additional_metadata_files(),
        ["foo-1.0.dist-info/RECORD", "foo-1.0.dist-info/entry_points.txt"]
    );
    assert_eq!(
        foo.read("entry_points.txt")?.as_deref(),
        Some(&b"[console_scripts]\nfoo = foo:main\n"[..])
    );
    assert_eq!(foo.read("missing.txt")?, None);
    // Sibling lookup is by exact basename.
    assert_eq!(foo.read("RECORD.bak")?, None);

    let bar = &all[1];
    assert_eq!(bar.metadata.metadata_type, MetadataType::EggInfo);
    assert_eq!(bar.read("requires.txt")?.as_deref(), Some(&b"baz\n"[..]));
    Ok(())
}

#[test]
fn cached_until_rescan() -> Result<()> {
    let site_packages = tempfile::tempdir()?;
    let root = site_packages.path();
    write_file(&root.join("foo-1.0.dist-info/METADATA"), &pkg_info("foo", "1.0"))?;

    let cache = MetadataCache::new();
    let first = cache.listing(root, MetadataType::DistInfo, false)?;
    let second = cache.listing(root, MetadataType::DistInfo, false)?;
    assert!(Arc::ptr_eq(&first, &second));

    write_file(&root.join("bar-1.0.dist-info/METADATA"), &pkg_info("bar", "1.0"))?;
    assert_eq!(cache.listing(root, MetadataType::DistInfo, false)?.len(), 1);
    let rescanned = cache.listing(root, MetadataType::DistInfo, true)?;
    assert_eq!(rescanned.len(), 2);
    assert!(!Arc::ptr_eq(&first, &rescanned));

    write_file(&root.join("baz-1.0.dist-info/METADATA"), &pkg_info("baz", "1.0"))?;
    cache.invalidate(root);
    assert_eq!(cache.listing(root, MetadataType::DistInfo, false)?.len(), 3);
    Ok(())
}

#[test]
fn wheel() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let wheel = dir.path().join("foo-1.0-py3-none-any.whl");
    let metadata = pkg_info("foo", "1.0");
    write_wheel(
        &wheel,
        &[
            ("foo/__init__.py", ""),
            ("foo-1.0.dist-info/METADATA", &metadata),
            ("foo-1.0.dist-info/WHEEL", "Wheel-Version: 1.0\n"),
            ("foo-1.0.dist-info/entry_points.txt", "[console_scripts]\nfoo = foo:main\n"),
        ],
    )?;

    let cache = MetadataCache::new();
    let files = cache.select(&wheel, None, &[], false)?.unwrap();
    assert_eq!(files.metadata.metadata_type, MetadataType::DistInfo);
    assert_eq!(files.metadata.rel_path, "foo-1.0.dist-info/METADATA");
    assert_eq!(
        files.additional_metadata_files(),
        ["foo-1.0.dist-info/WHEEL", "foo-1.0.dist-info/entry_points.txt"]
    );
    assert_eq!(
        files.read("WHEEL")?.as_deref(),
        Some(&b"Wheel-Version: 1.0\n"[..])
    );
    Ok(())
}

#[test]
fn sdists() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let egg_info = pkg_info("foo", "0.0");
    let sdist_pkg_info = pkg_info("foo", "1.0");
    let entries = [
        ("foo-1.0/setup.py", ""),
        ("foo-1.0/foo.egg-info/PKG-INFO", egg_info.as_str()),
        ("foo-1.0/PKG-INFO", sdist_pkg_info.as_str()),
    ];
    let tar_gz = dir.path().join("foo-1.0.tar.gz");
    write_tar_gz(&tar_gz, &entries)?;
    let tar_xz = dir.path().join("foo-1.0.txz");
    write_tar_xz(&tar_xz, &entries)?;
    let tar_bz2 = dir.path().join("foo-1.0.tar.bz2");
    write_tar_bz2(&tar_bz2, &entries)?;
    let zip = dir.path().join("foo-1.0.zip");
    write_wheel(&zip, &entries)?;

    let cache = MetadataCache::new();
    for sdist in [&tar_gz, &tar_xz, &tar_bz2, &zip] {
        let files = cache
            .select(sdist, None, &[], false)?
            .unwrap_or_else(|| panic!("no metadata in {}", sdist.display()));
        assert_eq!(files.metadata.metadata_type, MetadataType::PkgInfo);
        assert_eq!(files.metadata.rel_path, "foo-1.0/PKG-INFO");
        assert_eq!(files.metadata.version.to_string(), "1.0");
        assert!(files.additional_metadata_files().is_empty());
        assert_eq!(files.read("setup.py")?, None);
    }
    Ok(())
}

#[test]
fn unrecognized_locations_are_empty() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let not_a_wheel = dir.path().join("foo-1.0-py3-none-any.whl");
    write_file(&not_a_wheel, "not a zip")?;
    let not_a_tarball = dir.path().join("foo-1.0.tar.gz");
    write_file(&not_a_tarball, "not a tarball")?;
    let other = dir.path().join("foo-1.0.rpm");
    write_file(&other, "")?;

    let cache = MetadataCache::new();
    for location in [&not_a_wheel, &not_a_tarball, &other, &dir.path().join("missing")] {
        assert!(cache.locate(location, &[], false)?.is_empty(), "{}", location.display());
    }
    Ok(())
}

#[test]
fn select_by_project() -> Result<()> {
    let site_packages = tempfile::tempdir()?;
    let root = site_packages.path();
    write_file(&root.join("foo-1.0.dist-info/METADATA"), &pkg_info("foo", "1.0"))?;
    write_file(&root.join("bar-1.0.dist-info/METADATA"), &pkg_info("bar", "1.0"))?;

    let cache = MetadataCache::new();
    let bar = PackageName::new("BAR")?;
    let files = cache.select(root, Some(&bar), &[], false)?.unwrap();
    assert_eq!(files.metadata.rel_path, "bar-1.0.dist-info/METADATA");

    let missing = PackageName::new("missing")?;
    assert!(cache.select(root, Some(&missing), &[], false)?.is_none());

    let err = cache.select(root, None, &[], false).unwrap_err();
    assert!(matches!(err, MetadataError::AmbiguousDistribution { .. }));
    let message = err.to_string();
    assert!(message.starts_with("Found more than one distribution inside "));
    assert!(message.ends_with("\nbar-1.0.dist-info/METADATA\nfoo-1.0.dist-info/METADATA"));
    Ok(())
}

#[test]
fn ambiguous_project() -> Result<()> {
    let site_packages = tempfile::tempdir()?;
    let root = site_packages.path();
    write_file(&root.join("foo-1.0.dist-info/METADATA"), &pkg_info("foo", "1.0"))?;
    write_file(&root.join("foo-1.0-py3.11.egg-info/PKG-INFO"), &pkg_info("Foo", "1.0"))?;

    let cache = MetadataCache::new();
    let foo = PackageName::new("foo")?;
    let err = cache.select(root, Some(&foo), &[], false).unwrap_err();
    let message = err.to_string();
    let listing = message.split_once('\n').map(|(_, listing)| listing);
    assert_snapshot!(listing.unwrap_or_default(), @r"
    foo-1.0.dist-info/METADATA
    foo-1.0-py3.11.egg-info/PKG-INFO
    ");

    let files = cache.select(root, Some(&foo), &[MetadataType::EggInfo], false)?;
    assert_eq!(files.unwrap().metadata.metadata_type, MetadataType::EggInfo);
    Ok(())
}

#[test]
fn missing_name_is_fatal() -> Result<()> {
    let site_packages = tempfile::tempdir()?;
    let root = site_packages.path();
    write_file(
        &root.join("foo-1.0.dist-info/METADATA"),
        indoc! {"
            Metadata-Version: 2.1
            Version: 1.0
        "},
    )?;
    let cache = MetadataCache::new();
    let err = cache.locate(root, &[], false).unwrap_err();
    assert!(matches!(err, MetadataError::MissingNameOrVersion { .. }));
    Ok(())
}
