//! Loads a work's pages from a directory.
//!
//! Scraped pages are stored one file per page as `{work}_{serial}.html`
//! (`.htm` and `.xhtml` are accepted too). Pages are returned in serial
//! order, compared numerically, so `SongShu_10.html` follows
//! `SongShu_9.html`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::backend::BackendChain;
use crate::error::{Error, Result};
use crate::page::Page;
use crate::util::decode_utf8;

const EXTENSIONS: [&str; 3] = ["html", "htm", "xhtml"];

/// Which files to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub work_name: String,
    /// Load at most this many pages.
    pub limit: Option<usize>,
}

impl LoadOptions {
    pub fn new(work_name: impl Into<String>) -> Self {
        Self {
            work_name: work_name.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The serial number of a matching file name.
    fn serial(&self, file_name: &str) -> Option<u64> {
        let rest = file_name.strip_prefix(self.work_name.as_str())?.strip_prefix('_')?;
        let (serial, ext) = rest.split_once('.')?;
        if serial.is_empty() || !serial.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !EXTENSIONS.contains(&ext) {
            return None;
        }
        Some(serial.parse().unwrap_or(u64::MAX))
    }
}

/// List the page files of a work in serial order.
///
/// Fails with [`Error::NoPages`] when nothing matches.
pub fn scan(dir: &Path, options: &LoadOptions) -> Result<Vec<PathBuf>> {
    let mut found: Vec<(u64, String, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(serial) = options.serial(&name) else {
            continue;
        };
        found.push((serial, name, entry.path()));
    }

    if found.is_empty() {
        return Err(Error::NoPages {
            dir: dir.to_path_buf(),
            work: options.work_name.clone(),
        });
    }

    found.sort();
    let limit = options.limit.unwrap_or(found.len());
    Ok(found.into_iter().take(limit).map(|(_, _, path)| path).collect())
}

/// Read and parse one page file. The page is labelled with its path.
pub fn read_page(path: &Path, backends: &BackendChain) -> Result<Page> {
    let bytes = fs::read(path)?;
    let html = decode_utf8(&bytes).ok_or_else(|| Error::Encoding {
        path: path.to_path_buf(),
    })?;
    Page::parse(path.display().to_string(), &html, backends)
}

/// Load every page of a work, in serial order.
pub fn load_pages(dir: &Path, options: &LoadOptions, backends: &BackendChain) -> Result<Vec<Page>> {
    let paths = scan(dir, options)?;
    info!(work = %options.work_name, pages = paths.len(), "loading pages");
    read_pages(&paths, backends, |_| {})
}

/// Read the given page files in order, calling `on_page` after each one
/// is parsed. Failures other than encoding errors name the page.
pub fn read_pages<F>(paths: &[PathBuf], backends: &BackendChain, mut on_page: F) -> Result<Vec<Page>>
where
    F: FnMut(&Path),
{
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            debug!(path = %path.display(), "reading page");
            let page = read_page(path, backends).map_err(|e| match e {
                Error::Encoding { .. } => e,
                other => Error::Page {
                    page: path.display().to_string(),
                    index,
                    source: Box::new(other),
                },
            })?;
            on_page(path);
            Ok(page)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) {
        fs::write(dir.path().join(name), "<html><body></body></html>").unwrap();
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_scan_orders_by_serial() {
        let dir = TempDir::new().unwrap();
        for name in ["SongShu_10.html", "SongShu_2.htm", "SongShu_1.html", "SongShu_9.xhtml"] {
            touch(&dir, name);
        }

        let paths = scan(dir.path(), &LoadOptions::new("SongShu")).unwrap();

        assert_eq!(
            names(&paths),
            vec!["SongShu_1.html", "SongShu_2.htm", "SongShu_9.xhtml", "SongShu_10.html"]
        );
    }

    #[test]
    fn test_scan_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        for name in ["SongShu_1.html", "SongShu_a.html", "Other_1.html", "SongShu_2.txt", "SongShuX_3.html"] {
            touch(&dir, name);
        }
        fs::create_dir(dir.path().join("SongShu_4.html")).unwrap();

        let paths = scan(dir.path(), &LoadOptions::new("SongShu")).unwrap();

        assert_eq!(names(&paths), vec!["SongShu_1.html"]);
    }

    #[test]
    fn test_scan_limit() {
        let dir = TempDir::new().unwrap();
        for i in 1..=5 {
            touch(&dir, &format!("W_{i}.html"));
        }

        let paths = scan(dir.path(), &LoadOptions::new("W").with_limit(2)).unwrap();

        assert_eq!(names(&paths), vec!["W_1.html", "W_2.html"]);
    }

    #[test]
    fn test_scan_work_name_is_literal() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a.b_1.html");
        touch(&dir, "axb_1.html");

        let paths = scan(dir.path(), &LoadOptions::new("a.b")).unwrap();

        assert_eq!(names(&paths), vec!["a.b_1.html"]);
    }

    #[test]
    fn test_serial() {
        let options = LoadOptions::new("SongShu");

        assert_eq!(options.serial("SongShu_007.html"), Some(7));
        assert_eq!(options.serial("SongShu_7.html.bak"), None);
        assert_eq!(options.serial("SongShu_.html"), None);
        assert_eq!(options.serial("SongShu_1a.html"), None);
    }

    #[test]
    fn test_no_pages() {
        let dir = TempDir::new().unwrap();

        let err = scan(dir.path(), &LoadOptions::new("SongShu")).unwrap_err();

        assert!(matches!(err, Error::NoPages { ref work, .. } if work == "SongShu"));
    }

    #[test]
    fn test_read_page_rejects_non_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("W_1.html");
        fs::write(&path, [0x3C, 0x70, 0x3E, 0xFF, 0xFE]).unwrap();

        let err = read_page(&path, &BackendChain::default()).unwrap_err();

        assert!(matches!(err, Error::Encoding { path: ref p } if p == &path));
    }

    #[test]
    fn test_read_pages_reports_each_page() {
        let dir = TempDir::new().unwrap();
        for i in 1..=3 {
            touch(&dir, &format!("W_{i}.html"));
        }
        let paths = scan(dir.path(), &LoadOptions::new("W")).unwrap();
        let mut seen = Vec::new();

        let pages = read_pages(&paths, &BackendChain::default(), |path| seen.push(path.to_path_buf())).unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(seen, paths);
        assert_eq!(pages[2].label, paths[2].display().to_string());
    }

    #[test]
    fn test_read_pages_names_failing_page() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "W_1.html");
        let paths = vec![dir.path().join("W_1.html"), dir.path().join("W_2.html")];
        let mut seen = 0;

        let err = read_pages(&paths, &BackendChain::default(), |_| seen += 1).unwrap_err();

        assert_eq!(seen, 1);
        assert!(matches!(err, Error::Page { index: 1, ref page, .. } if page.ends_with("W_2.html")));
    }
}
