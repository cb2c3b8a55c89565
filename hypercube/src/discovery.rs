use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Input files found under the discovery root, each list sorted by
/// experiment index and then by path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub config_files: Vec<PathBuf>,
    pub result_files: Vec<PathBuf>,
}

impl Discovered {
    pub fn is_empty(&self) -> bool {
        self.config_files.is_empty() && self.result_files.is_empty()
    }
}

/// Walks `root` and partitions every regular file into config (`.conf`) and
/// result (`.csv`) files. Paths containing a non-empty `exclude` are dropped.
///
/// A root that does not exist yields an empty result.
pub fn discover(root: &Path, exclude: Option<&str>) -> Discovered {
    if !root.is_dir() {
        tracing::warn!("Input root does not exist: {}", root.display());
        return Discovered::default();
    }

    let mut discovered = Discovered::default();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if let Some(marker) = exclude.filter(|m| !m.is_empty()) {
            if path.to_string_lossy().contains(marker) {
                tracing::debug!("Excluded {}", path.display());
                continue;
            }
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("conf") => discovered.config_files.push(path.to_path_buf()),
            Some("csv") => discovered.result_files.push(path.to_path_buf()),
            _ => tracing::debug!("Ignored {}", path.display()),
        }
    }

    sort_by_experiment(root, &mut discovered.config_files);
    sort_by_experiment(root, &mut discovered.result_files);
    tracing::info!(
        "Discovered {} config files and {} result files under {}",
        discovered.config_files.len(),
        discovered.result_files.len(),
        root.display()
    );
    discovered
}

fn sort_by_experiment(root: &Path, files: &mut [PathBuf]) {
    files.sort_by_cached_key(|path| (leading_index(root, path), path.clone()));
}

/// Numeric value of the first path component below `root`. Non-numeric
/// components count as zero, the way `sort -n` orders them.
fn leading_index(root: &Path, path: &Path) -> u64 {
    path.strip_prefix(root)
        .ok()
        .and_then(|rel| rel.components().next())
        .and_then(|c| c.as_os_str().to_str())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "hypercube-discovery-{}-{}",
            name,
            std::process::id()
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn sorts_numerically_then_lexicographically() {
        let root = scratch_dir("sort");
        for rel in [
            "10/sim.conf",
            "2/sim.conf",
            "2/random_sample/r200.csv",
            "2/arc_epi_sample/r100.csv",
            "10/arc_epi_sample/r100.csv",
            "1/sim.conf",
            "1/notes.txt",
        ] {
            touch(&root, rel);
        }

        let discovered = discover(&root, None);
        let rel = |files: &[PathBuf]| {
            files
                .iter()
                .map(|p| p.strip_prefix(&root).unwrap().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            rel(&discovered.config_files),
            vec!["1/sim.conf", "2/sim.conf", "10/sim.conf"]
        );
        assert_eq!(
            rel(&discovered.result_files),
            vec![
                "2/arc_epi_sample/r100.csv",
                "2/random_sample/r200.csv",
                "10/arc_epi_sample/r100.csv",
            ]
        );

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn excluded_paths_are_never_discovered() {
        let root = scratch_dir("exclude");
        for rel in [
            "1/sim.conf",
            "1/arc_epi_sample/n100.csv",
            "1/arc_epi_sample/n100.conf",
            "1/arc_epi_sample/r100.csv",
        ] {
            touch(&root, rel);
        }

        let discovered = discover(&root, Some("sample/n"));
        assert!(discovered
            .config_files
            .iter()
            .chain(discovered.result_files.iter())
            .all(|p| !p.to_string_lossy().contains("sample/n")));
        assert_eq!(discovered.config_files.len(), 1);
        assert_eq!(discovered.result_files.len(), 1);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn missing_root_yields_nothing() {
        let root = std::env::temp_dir().join("hypercube-discovery-does-not-exist");
        assert!(discover(&root, None).is_empty());
    }
}
