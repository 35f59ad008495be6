//! Writing recipe records into the vault
//!
//! Every record becomes a new markdown file under the target directory.
//! Existing files are never overwritten: when the name is taken, a numeric
//! disambiguator is probed upwards from 1 (`Soup (1).md`, `Soup (2).md`, ...).
//! Probing is sequential, so each write costs one `exists` check per
//! colliding file already present.

use anyhow::Result;
use log::{debug, warn};

use crate::error::SyncError;
use crate::models::RecipeRecord;
use crate::notify::Notifier;
use crate::storage::{Vault, normalize_path, parent_dir};

/// Characters that may not appear in a file name
pub const ILLEGAL_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Name used when a title has nothing left after sanitizing
pub const FALLBACK_TITLE: &str = "Untitled";

const EXTENSION: &str = "md";

/// Make a recipe title usable as a file name.
///
/// Illegal characters become spaces and runs of whitespace collapse to one,
/// so `Pan/Fried: Eggs` turns into `Pan Fried Eggs`.
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { ' ' } else { c })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        collapsed
    }
}

/// Vault path a record is first tried at, before collision handling
pub fn target_path(target_dir: &str, title: &str) -> String {
    normalize_path(&format!(
        "{}/{}.{}",
        target_dir,
        sanitize_title(title),
        EXTENSION
    ))
}

/// What happened to one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Written { id: i64, path: String },
    WriteFailed { id: i64, path: String, reason: String },
}

impl RecordOutcome {
    pub fn id(&self) -> i64 {
        match self {
            RecordOutcome::Written { id, .. } | RecordOutcome::WriteFailed { id, .. } => *id,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, RecordOutcome::Written { .. })
    }

    /// The failure as a [`SyncError::Write`], if this record failed
    pub fn error(&self) -> Option<SyncError> {
        match self {
            RecordOutcome::WriteFailed { path, reason, .. } => Some(SyncError::Write {
                path: path.clone(),
                reason: reason.clone(),
            }),
            RecordOutcome::Written { .. } => None,
        }
    }
}

/// Per-record outcomes of one materialization pass, in manifest order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl MaterializeReport {
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.written()
    }

    /// Paths of written files
    pub fn written_paths(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                RecordOutcome::Written { path, .. } => Some(path.as_str()),
                RecordOutcome::WriteFailed { .. } => None,
            })
            .collect()
    }
}

/// Turns recipe records into uniquely named files
pub struct RecipeMaterializer<'a> {
    vault: &'a dyn Vault,
    notifier: &'a dyn Notifier,
}

impl<'a> RecipeMaterializer<'a> {
    pub fn new(vault: &'a dyn Vault, notifier: &'a dyn Notifier) -> Self {
        Self { vault, notifier }
    }

    /// Write every record, in order, under `target_dir`.
    ///
    /// `on_written` runs right after each file is created and is where the
    /// caller records the import durably. A failed write is reported and
    /// skipped; the remaining records are still processed.
    pub fn materialize(
        &self,
        target_dir: &str,
        records: &[RecipeRecord],
        on_written: &mut dyn FnMut(&RecipeRecord, &str),
    ) -> MaterializeReport {
        let mut report = MaterializeReport::default();

        for record in records {
            let path = target_path(target_dir, &record.title);
            match self.write_record(&path, record) {
                Ok(written_path) => {
                    debug!("Wrote recipe {} to {}", record.id, written_path);
                    on_written(record, &written_path);
                    report.outcomes.push(RecordOutcome::Written {
                        id: record.id,
                        path: written_path,
                    });
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    warn!("Error writing {}: {}", path, reason);
                    let outcome = RecordOutcome::WriteFailed {
                        id: record.id,
                        path,
                        reason,
                    };
                    if let Some(err) = outcome.error() {
                        self.notifier.notify(&err.to_string());
                    }
                    report.outcomes.push(outcome);
                }
            }
        }

        report
    }

    fn write_record(&self, path: &str, record: &RecipeRecord) -> Result<String> {
        if let Some(dir) = parent_dir(path)
            && !self.vault.exists(dir)?
        {
            self.vault.create_dir(dir)?;
        }

        let path = self.unused_path(path)?;
        self.vault.create_file(&path, &record.content)?;
        Ok(path)
    }

    /// First path, starting at `path` itself, that does not exist yet
    fn unused_path(&self, path: &str) -> Result<String> {
        if !self.vault.exists(path)? {
            return Ok(path.to_string());
        }

        let (base, extension) = split_extension(path);
        let mut count: u64 = 1;
        loop {
            let candidate = match extension {
                Some(ext) => format!("{} ({}).{}", base, count, ext),
                None => format!("{} ({})", base, count),
            };
            if !self.vault.exists(&candidate)? {
                return Ok(candidate);
            }
            count += 1;
        }
    }
}

/// Split `dir/name.ext` into (`dir/name`, `Some("ext")`); the dot must be in
/// the file name, not in a directory
fn split_extension(path: &str) -> (&str, Option<&str>) {
    let name_start = path.rfind('/').map_or(0, |idx| idx + 1);
    match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let split = name_start + dot;
            (&path[..split], Some(&path[split + 1..]))
        }
        _ => (path, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::storage::InMemoryVault;

    fn materialize_all(
        vault: &InMemoryVault,
        notifier: &RecordingNotifier,
        records: &[RecipeRecord],
    ) -> (MaterializeReport, Vec<i64>) {
        let mut committed = Vec::new();
        let report = RecipeMaterializer::new(vault, notifier).materialize(
            "Cooksync",
            records,
            &mut |record, _path| committed.push(record.id),
        );
        (report, committed)
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Pan/Fried: Eggs"), "Pan Fried Eggs");
        assert_eq!(sanitize_title("Soup"), "Soup");
        assert_eq!(sanitize_title(r#"a\b*c?d"e<f>g|h"#), "a b c d e f g h");
        assert_eq!(sanitize_title("  Mac  &  Cheese "), "Mac & Cheese");
        assert_eq!(sanitize_title("///"), FALLBACK_TITLE);
        assert_eq!(sanitize_title(""), FALLBACK_TITLE);
    }

    #[test]
    fn test_target_path() {
        assert_eq!(target_path("Cooksync", "Pan/Fried: Eggs"), "Cooksync/Pan Fried Eggs.md");
        assert_eq!(target_path("/Recipes//Cooksync/", "Soup"), "Recipes/Cooksync/Soup.md");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("Cooksync/Soup.md"), ("Cooksync/Soup", Some("md")));
        assert_eq!(split_extension("Cooksync/Mr. Soup.md"), ("Cooksync/Mr. Soup", Some("md")));
        assert_eq!(split_extension("v1.2/Soup"), ("v1.2/Soup", None));
    }

    #[test]
    fn test_writes_content_verbatim_and_creates_dir() {
        let vault = InMemoryVault::new();
        let notifier = RecordingNotifier::new();
        let content = "# Pan Fried Eggs\n\n- 2 eggs\n\n*Enjoy*  \n";
        let records = vec![RecipeRecord::new(7, "Pan/Fried: Eggs", content)];

        let (report, committed) = materialize_all(&vault, &notifier, &records);

        assert_eq!(report.written(), 1);
        assert_eq!(committed, vec![7]);
        assert!(vault.exists("Cooksync").unwrap());
        assert_eq!(vault.read("Cooksync/Pan Fried Eggs.md").as_deref(), Some(content));
    }

    #[test]
    fn test_collisions_get_disambiguators() {
        let vault = InMemoryVault::new();
        let notifier = RecordingNotifier::new();
        let records = vec![
            RecipeRecord::new(1, "Soup", "first"),
            RecipeRecord::new(2, "Soup?", "second"),
            RecipeRecord::new(3, "Soup", "third"),
        ];

        let (report, _) = materialize_all(&vault, &notifier, &records);

        assert_eq!(
            report.written_paths(),
            vec!["Cooksync/Soup.md", "Cooksync/Soup (1).md", "Cooksync/Soup (2).md"]
        );
        assert_eq!(vault.read("Cooksync/Soup.md").as_deref(), Some("first"));
        assert_eq!(vault.read("Cooksync/Soup (1).md").as_deref(), Some("second"));
        assert_eq!(vault.read("Cooksync/Soup (2).md").as_deref(), Some("third"));
    }

    #[test]
    fn test_existing_user_file_is_kept() {
        let vault = InMemoryVault::new();
        vault.create_dir("Cooksync").unwrap();
        vault.create_file("Cooksync/Soup.md", "my notes").unwrap();
        let notifier = RecordingNotifier::new();

        let (report, _) =
            materialize_all(&vault, &notifier, &[RecipeRecord::new(1, "Soup", "recipe")]);

        assert_eq!(report.written_paths(), vec!["Cooksync/Soup (1).md"]);
        assert_eq!(vault.read("Cooksync/Soup.md").as_deref(), Some("my notes"));
    }

    #[test]
    fn test_failed_write_is_reported_and_skipped() {
        let vault = InMemoryVault::new();
        let notifier = RecordingNotifier::new();
        let records = vec![
            RecipeRecord::new(1, "Good", "a"),
            RecipeRecord::new(2, "Broken", "b"),
            RecipeRecord::new(3, "Also Good", "c"),
        ];

        let failing = FailingVault {
            inner: &vault,
            fail_on: "Cooksync/Broken.md",
        };
        let mut committed = Vec::new();
        let report = RecipeMaterializer::new(&failing, &notifier).materialize(
            "Cooksync",
            &records,
            &mut |record, _| committed.push(record.id),
        );

        assert_eq!(committed, vec![1, 3]);
        assert_eq!(report.written(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.outcomes[1].is_written());
        assert_eq!(report.outcomes[1].id(), 2);

        let notices = notifier.messages();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].starts_with("Error writing file Cooksync/Broken.md"));
    }

    struct FailingVault<'a> {
        inner: &'a InMemoryVault,
        fail_on: &'a str,
    }

    impl Vault for FailingVault<'_> {
        fn exists(&self, path: &str) -> Result<bool> {
            self.inner.exists(path)
        }

        fn create_dir(&self, path: &str) -> Result<()> {
            self.inner.create_dir(path)
        }

        fn create_file(&self, path: &str, content: &str) -> Result<()> {
            if path == self.fail_on {
                anyhow::bail!("disk full");
            }
            self.inner.create_file(path, content)
        }
    }
}
