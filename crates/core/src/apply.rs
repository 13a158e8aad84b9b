use crate::planner::{RenameCandidate, RenamePlan};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollisionError {
    #[error("重複したリネーム先が含まれています: {}", .0.display())]
    DuplicateTarget(PathBuf),
    #[error("リネーム先が既に存在します: {}", .0.display())]
    TargetExists(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    pub applied: usize,
}

pub fn apply_plan(plan: &RenamePlan) -> Result<ApplyResult> {
    apply_plan_with_progress(plan, |_| {})
}

/// Renames every candidate in plan order, calling `on_renamed` after each
/// success. Collisions are checked for the whole batch before the first
/// rename. A filesystem error stops the run; files renamed before it keep
/// their new names.
pub fn apply_plan_with_progress<F>(plan: &RenamePlan, mut on_renamed: F) -> Result<ApplyResult>
where
    F: FnMut(&RenameCandidate),
{
    validate_targets(plan)?;

    let mut applied = 0usize;
    for candidate in &plan.candidates {
        fs::rename(&candidate.original_path, &candidate.target_path).with_context(|| {
            format!(
                "リネームに失敗しました: {} -> {}",
                candidate.original_path.display(),
                candidate.target_path.display()
            )
        })?;
        applied += 1;
        on_renamed(candidate);
    }

    Ok(ApplyResult { applied })
}

/// Fail-fast collision check. A target may not repeat inside the batch and
/// may not name any existing file, including another file of the batch that
/// has not been renamed yet.
pub fn validate_targets(plan: &RenamePlan) -> Result<(), CollisionError> {
    let mut seen = HashSet::<&PathBuf>::new();

    for candidate in &plan.candidates {
        if !seen.insert(&candidate.target_path) {
            return Err(CollisionError::DuplicateTarget(
                candidate.target_path.clone(),
            ));
        }
        // symlink_metadata so a dangling link still counts as taken
        if candidate.target_path != candidate.original_path
            && fs::symlink_metadata(&candidate.target_path).is_ok()
        {
            return Err(CollisionError::TargetExists(candidate.target_path.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_plan, apply_plan_with_progress, validate_targets, CollisionError};
    use crate::metadata::{DateSource, MediaDateRecord, MediaFile, MediaKind};
    use crate::planner::{RenameCandidate, RenamePlan, RenameStats};
    use chrono::Local;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn candidate(root: &Path, counter: u64, from: &str, to: &str) -> RenameCandidate {
        let original_path = root.join(from);
        RenameCandidate {
            counter,
            original_path: original_path.clone(),
            target_path: root.join(to),
            record: MediaDateRecord {
                file: MediaFile {
                    path: original_path,
                    extension: "jpg".to_string(),
                    kind: MediaKind::Image,
                    modified: Local::now(),
                },
                date: Local::now(),
                source: DateSource::ExifDateTimeOriginal,
            },
        }
    }

    fn plan(root: &Path, candidates: Vec<RenameCandidate>) -> RenamePlan {
        RenamePlan {
            root: root.to_path_buf(),
            prefix: String::new(),
            start: 1,
            width: 3,
            candidates,
            stats: RenameStats::default(),
        }
    }

    #[test]
    fn renames_in_plan_order_and_reports_each() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("b.jpg"), b"B").expect("write b");
        fs::write(temp.path().join("a.jpg"), b"A").expect("write a");

        let plan = plan(
            temp.path(),
            vec![
                candidate(temp.path(), 1, "b.jpg", "001_b.jpg"),
                candidate(temp.path(), 2, "a.jpg", "002_a.jpg"),
            ],
        );

        let mut reported = Vec::<PathBuf>::new();
        let result = apply_plan_with_progress(&plan, |c| reported.push(c.target_path.clone()))
            .expect("apply");

        assert_eq!(result.applied, 2);
        assert_eq!(
            reported,
            vec![temp.path().join("001_b.jpg"), temp.path().join("002_a.jpg")]
        );
        assert_eq!(
            fs::read(temp.path().join("001_b.jpg")).expect("read"),
            b"B".to_vec()
        );
        assert!(!temp.path().join("a.jpg").exists());
    }

    #[test]
    fn empty_plan_is_noop() {
        let temp = tempdir().expect("tempdir");
        let result = apply_plan(&plan(temp.path(), Vec::new())).expect("apply");
        assert_eq!(result.applied, 0);
    }

    #[test]
    fn existing_target_fails_before_any_rename() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.jpg"), b"A").expect("write a");
        fs::write(temp.path().join("b.jpg"), b"B").expect("write b");
        fs::write(temp.path().join("002_b.jpg"), b"old").expect("write leftover");

        let plan = plan(
            temp.path(),
            vec![
                candidate(temp.path(), 1, "a.jpg", "001_a.jpg"),
                candidate(temp.path(), 2, "b.jpg", "002_b.jpg"),
            ],
        );

        let err = apply_plan(&plan).expect_err("collision");
        assert_eq!(
            err.downcast_ref::<CollisionError>(),
            Some(&CollisionError::TargetExists(temp.path().join("002_b.jpg")))
        );
        assert!(temp.path().join("a.jpg").exists());
        assert!(!temp.path().join("001_a.jpg").exists());
        assert_eq!(
            fs::read(temp.path().join("002_b.jpg")).expect("read"),
            b"old".to_vec()
        );
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_at_target_is_a_collision() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.jpg"), b"A").expect("write a");
        std::os::unix::fs::symlink(temp.path().join("missing"), temp.path().join("001_a.jpg"))
            .expect("symlink");

        let plan = plan(
            temp.path(),
            vec![candidate(temp.path(), 1, "a.jpg", "001_a.jpg")],
        );

        assert_eq!(
            validate_targets(&plan),
            Err(CollisionError::TargetExists(temp.path().join("001_a.jpg")))
        );
        assert!(temp.path().join("a.jpg").exists());
        assert!(fs::symlink_metadata(temp.path().join("001_a.jpg"))
            .expect("link kept")
            .file_type()
            .is_symlink());
    }

    #[test]
    fn target_naming_another_batch_file_is_a_collision() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("x.jpg"), b"X").expect("write x");
        fs::write(temp.path().join("001_x.jpg"), b"Y").expect("write y");

        let plan = plan(
            temp.path(),
            vec![
                candidate(temp.path(), 1, "x.jpg", "001_x.jpg"),
                candidate(temp.path(), 2, "001_x.jpg", "002_001_x.jpg"),
            ],
        );

        assert_eq!(
            validate_targets(&plan),
            Err(CollisionError::TargetExists(temp.path().join("001_x.jpg")))
        );
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        let temp = tempdir().expect("tempdir");
        let plan = plan(
            temp.path(),
            vec![
                candidate(temp.path(), 1, "a.jpg", "SAME.jpg"),
                candidate(temp.path(), 1, "b.jpg", "SAME.jpg"),
            ],
        );

        assert_eq!(
            validate_targets(&plan),
            Err(CollisionError::DuplicateTarget(temp.path().join("SAME.jpg")))
        );
    }

    #[test]
    fn rename_failure_stops_without_rollback() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.jpg"), b"A").expect("write a");

        let plan = plan(
            temp.path(),
            vec![
                candidate(temp.path(), 1, "a.jpg", "001_a.jpg"),
                candidate(temp.path(), 2, "vanished.jpg", "002_vanished.jpg"),
            ],
        );

        let err = apply_plan(&plan).expect_err("second rename fails");
        assert!(err.to_string().contains("リネームに失敗しました"));
        assert!(temp.path().join("001_a.jpg").exists());
        assert!(!temp.path().join("a.jpg").exists());
    }
}
