use crate::models::{GuideCustomFormat, ReleaseProfileData};
use crate::traits::GuideProvider;
use crate::{GuideError, GuideResult};
use guidesync_core::{ContentKey, ServiceType};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Guide read from a local checkout of the guide repository
///
/// Layout:
/// - `<root>/docs/json/radarr/cf/*.json`
/// - `<root>/docs/json/sonarr/cf/*.json`
/// - `<root>/docs/json/sonarr/rp/*.json`
#[derive(Debug, Clone)]
pub struct LocalGuide {
    root_path: PathBuf,
}

impl LocalGuide {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn is_available(&self) -> bool {
        self.json_dir().is_dir()
    }

    fn json_dir(&self) -> PathBuf {
        self.root_path.join("docs").join("json")
    }

    fn custom_format_dir(&self, service: ServiceType) -> PathBuf {
        self.json_dir().join(service.as_str()).join("cf")
    }

    fn release_profile_dir(&self) -> PathBuf {
        self.json_dir().join(ServiceType::Sonarr.as_str()).join("rp")
    }
}

/// Lists `*.json` files in a directory, sorted by path
fn json_files(dir: &Path) -> GuideResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(GuideError::MissingDirectory(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|e| GuideError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

fn read_json(path: &Path) -> GuideResult<Value> {
    let contents = fs::read_to_string(path).map_err(|e| GuideError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&contents).map_err(|e| GuideError::InvalidDocument {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Parses every file with `parse`; unreadable files and duplicate keys are
/// logged and skipped so one bad guide entry cannot block the rest
fn load_all<T>(
    dir: &Path,
    parse: impl Fn(Value) -> GuideResult<T>,
    key_of: impl Fn(&T) -> &ContentKey,
) -> GuideResult<Vec<T>> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for path in json_files(dir)? {
        let parsed = read_json(&path).and_then(|doc| {
            parse(doc).map_err(|e| GuideError::InvalidDocument {
                path: path.clone(),
                reason: e.to_string(),
            })
        });

        match parsed {
            Ok(item) => {
                let key = key_of(&item).clone();
                if seen.insert(key.clone()) {
                    items.push(item);
                } else {
                    log::warn!(
                        "Duplicate guide id {} in {}; keeping the first definition",
                        key,
                        path.display()
                    );
                }
            }
            Err(e) => log::warn!("Skipping guide entry: {}", e),
        }
    }

    log::debug!("Loaded {} guide entries from {}", items.len(), dir.display());
    Ok(items)
}

impl GuideProvider for LocalGuide {
    fn custom_formats(&self, service: ServiceType) -> GuideResult<Vec<GuideCustomFormat>> {
        load_all(
            &self.custom_format_dir(service),
            GuideCustomFormat::from_document,
            |cf| &cf.trash_id,
        )
    }

    fn release_profiles(&self) -> GuideResult<Vec<ReleaseProfileData>> {
        load_all(
            &self.release_profile_dir(),
            |doc| {
                serde_json::from_value::<ReleaseProfileData>(doc)
                    .map_err(|e| GuideError::Malformed(e.to_string()))
            },
            |rp| &rp.trash_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_reads_custom_formats_per_service() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "docs/json/radarr/cf/remux.json",
            r#"{"trash_id":"a1","trash_score":100,"name":"Remux","specifications":[]}"#,
        );
        write(
            dir.path(),
            "docs/json/sonarr/cf/web.json",
            r#"{"trash_id":"s1","name":"WEB","specifications":[]}"#,
        );

        let guide = LocalGuide::new(dir.path());
        assert!(guide.is_available());

        let radarr = guide.custom_formats(ServiceType::Radarr).unwrap();
        assert_eq!(radarr.len(), 1);
        assert_eq!(radarr[0].name, "Remux");
        assert_eq!(radarr[0].default_score, Some(100));

        let sonarr = guide.custom_formats(ServiceType::Sonarr).unwrap();
        assert_eq!(sonarr[0].trash_id.as_str(), "s1");
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docs/json/radarr/cf/a.json", r#"{"trash_id":"a","name":"A"}"#);
        write(dir.path(), "docs/json/radarr/cf/b.json", "{ not json");
        write(dir.path(), "docs/json/radarr/cf/c.json", r#"{"name":"no id"}"#);
        write(dir.path(), "docs/json/radarr/cf/d.json", r#"{"trash_id":"A","name":"Dup"}"#);
        write(dir.path(), "docs/json/radarr/cf/readme.md", "ignored");

        let cfs = LocalGuide::new(dir.path())
            .custom_formats(ServiceType::Radarr)
            .unwrap();
        assert_eq!(cfs.len(), 1);
        assert_eq!(cfs[0].name, "A");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let guide = LocalGuide::new(dir.path());
        assert!(!guide.is_available());
        assert!(matches!(
            guide.custom_formats(ServiceType::Radarr),
            Err(GuideError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_reads_release_profiles() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "docs/json/sonarr/rp/sources.json",
            r#"{"trash_id":"R1","name":"Sources","ignored":[{"term":"/bad/"}]}"#,
        );

        let profiles = LocalGuide::new(dir.path()).release_profiles().unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].trash_id.as_str(), "r1");
        assert_eq!(profiles[0].ignored[0].term, "/bad/");
    }
}
