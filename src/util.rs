use std::io;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

pub fn ensure_dir(p: &Path) -> io::Result<()> {
    std::fs::create_dir_all(p)
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Default page resolver: the leading digits of the file name, so
/// `000012.ocr.png` is page 12. Names without a numeric prefix map to 0.
pub fn page_number(input: &Path) -> u32 {
    input
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.chars().take_while(char::is_ascii_digit).collect::<String>())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// `path` with `suffix` appended to the full file name (not replacing the
/// extension): `out.badxml` + `.hocr` gives `out.badxml.hocr`.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Move `from` over `to`, replacing any existing file.
pub fn replace_file(from: &Path, to: &Path) -> io::Result<()> {
    if from == to {
        return Ok(());
    }
    std::fs::rename(from, to)
}

/// Make `link` refer to `target` without copying its contents.
pub fn alias_file(target: &Path, link: &Path) -> io::Result<()> {
    let target = target.canonicalize()?;
    remove_stale(link)?;
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, link)
    }
    #[cfg(not(unix))]
    {
        std::fs::hard_link(&target, link)
    }
}

/// Remove whatever is at `path` without following links. Missing is fine.
pub fn remove_stale(path: &Path) -> io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => std::fs::remove_file(path),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
