use std::fs;

use crate::config::Config;
use crate::logging::Diagnostics;
use crate::persistence::{PairLog, ThumbnailStore};
use crate::processing::{compute_fingerprint, ThumbnailSynthesizer};
use crate::types::SourceFile;
use crate::RunSummary;

/// Per-file stages after the walk: fingerprint, store decision, synthesis, log
#[derive(Debug)]
pub(crate) struct Pipeline {
    pub(crate) config: Config,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) store: ThumbnailStore,
    pub(crate) synthesizer: ThumbnailSynthesizer,
    pub(crate) pair_log: Option<PairLog>,
}

impl Pipeline {
    /// Run one eligible file to completion.
    ///
    /// Failures are reported and counted; they never propagate.
    pub(crate) fn process(&mut self, source: &SourceFile, summary: &mut RunSummary) {
        let path = &source.path;

        if self.config.dry_run {
            self.diagnostics
                .detail(format_args!("Would deal with {} (dryrun)", path.display()));
            summary.would_process += 1;
            return;
        }

        self.diagnostics.detail(format_args!(
            "Making thumb for {} {} in {}",
            source.kind,
            path.display(),
            self.store.root().display()
        ));

        let fingerprint = match compute_fingerprint(path) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                self.diagnostics.file_error(path, "fingerprint", &e);
                summary.failed += 1;
                return;
            }
        };
        self.diagnostics
            .trace(format_args!("{} has fingerprint {}", path.display(), fingerprint));

        let plan = match self.store.plan(&fingerprint, &self.config.sizes) {
            Ok(plan) => plan,
            Err(e) => {
                self.diagnostics.file_error(path, "plan", &e);
                summary.failed += 1;
                return;
            }
        };
        if plan.created {
            self.diagnostics.fs_modification("create_dir", &plan.dir);
        }

        for artifact in &plan.existing {
            self.diagnostics
                .notice(format_args!("{} already exists", artifact.path.display()));
            summary.already_present += 1;
        }

        if plan.pending.is_empty() {
            return;
        }

        let results = match self.synthesizer.synthesize_all(source, &plan.pending) {
            Ok(results) => results,
            Err(e) => {
                self.diagnostics.file_error(path, "synthesize", &e);
                summary.failed += 1;
                if plan.created {
                    // Only succeeds while the directory is still empty
                    let _ = fs::remove_dir(&plan.dir);
                }
                return;
            }
        };

        let mut any_failed = false;
        for (artifact, result) in results {
            match result {
                Ok(()) => {
                    summary.generated += 1;
                    self.diagnostics.notice(format_args!(
                        "Made {} thumbnail {}",
                        artifact.size,
                        artifact.path.display()
                    ));
                    self.diagnostics.fs_modification("write", &artifact.path);

                    if let Some(log) = self.pair_log.as_mut() {
                        if let Err(e) = log.record(path, &artifact.path) {
                            self.diagnostics.file_error(log.path(), "json_log", &e);
                        }
                    }
                }
                Err(e) => {
                    self.diagnostics.file_error(&artifact.path, "write", &e);
                    any_failed = true;
                }
            }
        }

        if any_failed {
            summary.failed += 1;
        }
    }
}
