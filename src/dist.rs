use crate::{arch::Arch, error::Error};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use xz2::write::XzEncoder;

pub const NMK: &str = "nmk";
/// Installer for nmk. Also shipped uncompressed since it has to run before anything can
/// decompress.
pub const NMKUP: &str = "nmkup";

const BINARIES: [&str; 2] = [NMK, NMKUP];
// Same as the `xz` command line default.
const XZ_PRESET: u32 = 6;

pub fn compressed_name(binary: &str, arch: Arch) -> String {
    format!("{}-{}.xz", binary, arch)
}

pub fn plain_name(binary: &str, arch: Arch) -> String {
    format!("{}-{}", binary, arch)
}

/// Copies the release binaries of `arch` into `dist_dir` and returns the created files.
///
/// Creates `dist_dir` if needed. Files written before a failure are left in place.
pub fn stage_distribution(release_dir: &Path, dist_dir: &Path, arch: Arch) -> Result<Vec<PathBuf>, Error> {
    fs::create_dir_all(dist_dir).map_err(Error::staging(dist_dir))?;
    let mut staged = vec![];
    for binary in BINARIES {
        let source = release_dir.join(binary);
        let target = dist_dir.join(compressed_name(binary, arch));
        log::debug!("compressing {} to {}", source.display(), target.display());
        compress_file(&source, &target)?;
        staged.push(target);
    }

    let source = release_dir.join(NMKUP);
    let target = dist_dir.join(plain_name(NMKUP, arch));
    log::debug!("copying {} to {}", source.display(), target.display());
    fs::copy(&source, &target).map_err(Error::staging(&target))?;
    staged.push(target);

    Ok(staged)
}

/// xz-compresses `source` into `target`, replacing it atomically.
fn compress_file(source: &Path, target: &Path) -> Result<(), Error> {
    let data = fs::read(source).map_err(Error::staging(source))?;
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(dir).map_err(Error::staging(target))?;

    let mut enc = XzEncoder::new(temp, XZ_PRESET);
    enc.write_all(&data).map_err(Error::staging(target))?;
    let mut temp = enc.finish().map_err(Error::staging(target))?;
    temp.flush().map_err(Error::staging(target))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(Error::staging(target))?;
    }
    temp.persist(target).map_err(|e| Error::staging(target)(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::BTreeSet, io::Read};
    use xz2::read::XzDecoder;

    fn unxz(path: &Path) -> anyhow::Result<Vec<u8>> {
        let mut out = vec![];
        XzDecoder::new(fs::File::open(path)?).read_to_end(&mut out)?;
        Ok(out)
    }

    fn file_names(dir: &Path) -> anyhow::Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for entry in fs::read_dir(dir)? {
            names.insert(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    #[test]
    fn names_follow_binary_arch_convention() {
        assert_eq!(compressed_name(NMK, Arch::arm64), "nmk-arm64.xz");
        assert_eq!(plain_name(NMKUP, Arch::arm), "nmkup-arm");
    }

    #[test]
    fn stages_three_artifacts() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let release = dir.path().join("release");
        let dist = dir.path().join("dist");
        fs::create_dir_all(&release)?;
        fs::write(release.join(NMK), b"\x7fELF nmk payload")?;
        fs::write(release.join(NMKUP), b"\x7fELF nmkup payload")?;

        let staged = stage_distribution(&release, &dist, Arch::armv7)?;
        assert_eq!(staged.len(), 3);
        assert_eq!(
            file_names(&dist)?,
            ["nmk-armv7.xz", "nmkup-armv7", "nmkup-armv7.xz"]
                .iter()
                .map(|s| s.to_string())
                .collect::<BTreeSet<_>>()
        );
        assert_eq!(unxz(&dist.join("nmk-armv7.xz"))?, b"\x7fELF nmk payload");
        assert_eq!(unxz(&dist.join("nmkup-armv7.xz"))?, b"\x7fELF nmkup payload");
        assert_eq!(fs::read(dist.join("nmkup-armv7"))?, b"\x7fELF nmkup payload");
        Ok(())
    }

    #[test]
    fn restaging_overwrites_and_tolerates_existing_dir() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let release = dir.path().join("release");
        let dist = dir.path().join("dist");
        fs::create_dir_all(&release)?;
        fs::create_dir_all(&dist)?;
        fs::write(release.join(NMK), b"old")?;
        fs::write(release.join(NMKUP), b"old")?;
        stage_distribution(&release, &dist, Arch::amd64)?;

        fs::write(release.join(NMK), b"new")?;
        fs::write(release.join(NMKUP), b"newer")?;
        stage_distribution(&release, &dist, Arch::amd64)?;
        assert_eq!(unxz(&dist.join("nmk-amd64.xz"))?, b"new");
        assert_eq!(fs::read(dist.join("nmkup-amd64"))?, b"newer");
        assert_eq!(file_names(&dist)?.len(), 3);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn plain_copy_keeps_mode() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir()?;
        let release = dir.path().join("release");
        let dist = dir.path().join("dist");
        fs::create_dir_all(&release)?;
        fs::write(release.join(NMK), b"nmk")?;
        fs::write(release.join(NMKUP), b"nmkup")?;
        fs::set_permissions(release.join(NMKUP), fs::Permissions::from_mode(0o755))?;

        stage_distribution(&release, &dist, Arch::amd64)?;
        let mode = |name: &str| -> anyhow::Result<u32> {
            let perms = fs::metadata(dist.join(name))?.permissions();
            Ok(perms.mode() & 0o777)
        };
        assert_eq!(mode("nmkup-amd64")?, 0o755);
        assert_eq!(mode("nmk-amd64.xz")?, 0o644);
        Ok(())
    }

    #[test]
    fn missing_binary_fails_with_its_path() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let release = dir.path().join("release");
        let dist = dir.path().join("dist");
        fs::create_dir_all(&release)?;
        fs::write(release.join(NMK), b"nmk")?;

        match stage_distribution(&release, &dist, Arch::amd64) {
            Err(Error::Staging { path, .. }) => assert_eq!(path, release.join(NMKUP)),
            other => panic!("unexpected {:?}", other),
        }
        // nmk was staged before the failure and stays there
        assert!(dist.join("nmk-amd64.xz").exists());
        Ok(())
    }
}
