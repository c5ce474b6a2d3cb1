use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// Atomic write: write to a uniquely named temp file next to `path`, then
/// rename it over `path`.
///
/// Concurrent writers to the same target never share a temp file; the last
/// rename wins. On failure the temp file is removed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn writes_and_replaces() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("record.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert_eq!(entries(tmp.path()), ["record.json"]);
    }

    #[test]
    fn missing_parent_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("no/such/dir/file.bin");
        assert!(write_atomic(&path, b"x").is_err());
    }

    #[test]
    fn leaves_unrelated_tmp_file_alone() {
        let tmp = tempfile::TempDir::new().unwrap();
        let neighbour = tmp.path().join("photo.jpg.tmp");
        std::fs::write(&neighbour, b"user data").unwrap();

        write_atomic(&tmp.path().join("photo.jpg"), b"restored").unwrap();
        assert_eq!(std::fs::read(&neighbour).unwrap(), b"user data");
    }

    #[test]
    fn failed_rename_cleans_up_temp_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("occupied");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("inside"), b"x").unwrap();

        assert!(write_atomic(&target, b"data").is_err());
        assert_eq!(entries(tmp.path()), ["occupied"]);
    }

    #[test]
    fn concurrent_writers_to_one_target_all_succeed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("shared.bin");

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        write_atomic(&path, &vec![i; 64 * 1024])?;
                    }
                    Ok::<_, std::io::Error>(())
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 64 * 1024);
        assert!(data.iter().all(|&b| b == data[0]));
        assert_eq!(entries(tmp.path()), ["shared.bin"]);
    }
}
