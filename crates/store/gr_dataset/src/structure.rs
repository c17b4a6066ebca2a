use crate::{CheckOutcome, DatasetLayout, REQUIRED_DIRS, REQUIRED_META_FILES};

/// Check that the required directories and metadata files exist.
///
/// Stops at the first missing entry, so nothing after it is reported as found.
pub fn check_structure(layout: &DatasetLayout) -> CheckOutcome {
    let mut outcome = CheckOutcome::new("Checking Dataset Structure");

    for dir_name in REQUIRED_DIRS {
        let dir_path = layout.root().join(dir_name);
        if !dir_path.is_dir() {
            return outcome.fail(format!("Missing directory: {}", dir_path.display()));
        }
        outcome.success(format!("Found directory: {dir_name}"));
    }

    let meta_dir = layout.meta_dir();
    for file_name in REQUIRED_META_FILES {
        if !meta_dir.join(file_name).is_file() {
            return outcome.fail(format!("Missing metadata file: {file_name}"));
        }
        outcome.success(format!("Found metadata file: {file_name}"));
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Diagnostic;

    fn make_dirs(root: &std::path::Path, dirs: &[&str]) {
        for dir in dirs {
            std::fs::create_dir_all(root.join(dir)).unwrap();
        }
    }

    #[test]
    fn test_missing_meta_dir_stops_directory_checks() {
        let tmp = tempfile::tempdir().unwrap();
        make_dirs(tmp.path(), &["data", "videos"]);

        let outcome = check_structure(&DatasetLayout::new(tmp.path()));

        assert!(!outcome.passed);
        assert_eq!(
            outcome.lines,
            vec![
                Diagnostic::Header("Checking Dataset Structure".to_owned()),
                Diagnostic::Success("Found directory: data".to_owned()),
                Diagnostic::Failure(format!(
                    "Missing directory: {}",
                    tmp.path().join("meta").display()
                )),
            ]
        );
    }

    #[test]
    fn test_missing_metadata_file() {
        let tmp = tempfile::tempdir().unwrap();
        make_dirs(tmp.path(), &["data", "meta", "videos"]);
        std::fs::write(tmp.path().join("meta/info.json"), "{}").unwrap();

        let outcome = check_structure(&DatasetLayout::new(tmp.path()));

        assert!(!outcome.passed);
        assert_eq!(
            outcome.failures().collect::<Vec<_>>(),
            vec!["Missing metadata file: modality.json"]
        );
        assert!(
            !outcome
                .lines
                .contains(&Diagnostic::Success("Found metadata file: stats.json".to_owned()))
        );
    }

    #[test]
    fn test_metadata_directory_named_like_a_file_is_not_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        make_dirs(
            tmp.path(),
            &["data", "meta/info.json", "meta/modality.json", "videos"],
        );
        std::fs::write(tmp.path().join("meta/stats.json"), "{}").unwrap();

        let outcome = check_structure(&DatasetLayout::new(tmp.path()));

        assert_eq!(
            outcome.failures().collect::<Vec<_>>(),
            vec!["Missing metadata file: info.json"]
        );
    }
}
