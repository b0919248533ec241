// crates/sync-engine/src/engine.rs
//! Per-instance reconciliation pipeline and the run report

use crate::aggregate::{aggregate_scores, profile_associations, ScoreAggregation};
use crate::cache::IdentityCacheStore;
use crate::classifier::classify;
use crate::error::{SyncError, SyncResult};
use crate::executor::{ApplyReport, TransactionExecutor};
use crate::guide_index::GuideIndex;
use crate::quality_profile::{sync_quality_profiles, QualityProfileReport};
use crate::release_profile::{select_release_profiles, sync_release_profiles, ReleaseProfileReport};
use crate::types::{DesiredRecord, RemoteRecord, TransactionSet};
use guidesync_config::ServiceConfiguration;
use guidesync_core::{ClassifiedError, InstanceName, RecordKind, RemoteApi, ServiceType};
use guidesync_guide::{GuideCustomFormat, GuideProvider};
use std::collections::HashSet;

/// Everything one instance pass decided and did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceReport {
    pub custom_formats: TransactionSet,
    /// `None` in preview mode
    pub applied: Option<ApplyReport>,
    pub scores: ScoreAggregation,
    pub quality_profiles: QualityProfileReport,
    /// `None` when the instance has no release profiles to manage
    pub release_profiles: Option<ReleaseProfileReport>,
}

/// Reconciles one service instance at a time
pub struct SyncEngine<'a> {
    api: &'a dyn RemoteApi,
    cache: &'a dyn IdentityCacheStore,
    guide: &'a dyn GuideProvider,
    preview: bool,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        api: &'a dyn RemoteApi,
        cache: &'a dyn IdentityCacheStore,
        guide: &'a dyn GuideProvider,
    ) -> Self {
        Self {
            api,
            cache,
            guide,
            preview: false,
        }
    }

    /// Computes changes without issuing any remote mutation
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Runs custom formats, quality profile scores and release profiles
    ///
    /// The identity cache is saved after the pass, including when it fails
    /// part-way, so identifiers confirmed before the failure are kept.
    pub async fn sync_instance(&self, config: &ServiceConfiguration) -> SyncResult<InstanceReport> {
        let instance = config.instance_name();
        log::info!("Processing {} instance: {}", config.service_type(), instance);

        let result = self.run_pipeline(config).await;
        if self.preview {
            return result;
        }

        match (result, self.cache.persist(instance)) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(persist_error)) => {
                log::error!(
                    "[{}] Failed to save identity cache: {}",
                    instance,
                    persist_error
                );
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, config: &ServiceConfiguration) -> SyncResult<InstanceReport> {
        let instance = config.instance_name();
        let guide_formats = self.guide.custom_formats(config.service_type())?;
        let selected = select_custom_formats(config, &guide_formats);

        let kind = RecordKind::CustomFormat;
        let desired: Vec<DesiredRecord> = selected.iter().map(DesiredRecord::from).collect();
        let documents = self
            .api
            .get_records(kind)
            .await
            .map_err(|e| SyncError::remote("fetch", kind, "list", e))?;
        let remote = RemoteRecord::from_documents(kind, documents)?;

        let set = classify(&desired, &remote, self.cache, instance)?;
        log::info!(
            "[{}] Custom formats: {} new, {} updated, {} unchanged, {} to delete",
            instance,
            set.new_records().count(),
            set.updated().count(),
            set.unchanged().count(),
            set.deleted().count()
        );

        let applied = if self.preview {
            None
        } else {
            let executor = TransactionExecutor::new(self.api, self.cache, instance);
            Some(
                executor
                    .apply(kind, &set, config.delete_old_custom_formats())
                    .await?,
            )
        };

        let mut index = GuideIndex::build(&selected, self.cache, instance)?;
        if self.preview {
            for transaction in &set.transactions {
                if let Some(id) = transaction.remote_id().and_then(|id| id.as_i64()) {
                    index.assign_remote_id(transaction.key(), id);
                }
            }
        }

        let scores = aggregate_scores(&profile_associations(config), &index);
        let quality_profiles = sync_quality_profiles(self.api, config, &scores, self.preview).await?;

        let release_profiles = if config.service_type().supports_release_profiles()
            && !config.release_profiles().is_empty()
        {
            let guide_profiles = self.guide.release_profiles()?;
            let chosen = select_release_profiles(config, &guide_profiles);
            Some(sync_release_profiles(self.api, &chosen, self.preview).await?)
        } else {
            None
        };

        Ok(InstanceReport {
            custom_formats: set,
            applied,
            scores,
            quality_profiles,
            release_profiles,
        })
    }
}

/// Picks the guide custom formats referenced by the config, in config order
pub fn select_custom_formats(
    config: &ServiceConfiguration,
    guide: &[GuideCustomFormat],
) -> Vec<GuideCustomFormat> {
    let mut seen = HashSet::new();
    let mut selected = Vec::new();

    for key in config.custom_format_keys() {
        match guide.iter().find(|cf| cf.trash_id == key) {
            Some(cf) if seen.insert(cf.trash_id.clone()) => selected.push(cf.clone()),
            Some(_) => {}
            None => log::info!(
                "[{}] Custom format {} is not in the guide; skipping",
                config.instance_name(),
                key
            ),
        }
    }

    selected
}

/// How one instance ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceOutcome {
    Succeeded,
    Failed(String),
}

/// Status line for one instance in a run
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceStatus {
    pub instance: InstanceName,
    pub service: ServiceType,
    pub outcome: InstanceOutcome,
    /// Present when the instance succeeded
    pub report: Option<InstanceReport>,
}

/// Process-level result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

/// Summary of every instance processed in one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    instances: Vec<InstanceStatus>,
    aborted: bool,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, config: &ServiceConfiguration, report: InstanceReport) {
        self.instances.push(InstanceStatus {
            instance: config.instance_name().clone(),
            service: config.service_type(),
            outcome: InstanceOutcome::Succeeded,
            report: Some(report),
        });
    }

    pub fn record_failure(&mut self, config: &ServiceConfiguration, reason: impl Into<String>) {
        self.instances.push(InstanceStatus {
            instance: config.instance_name().clone(),
            service: config.service_type(),
            outcome: InstanceOutcome::Failed(reason.into()),
            report: None,
        });
    }

    pub fn instances(&self) -> &[InstanceStatus] {
        &self.instances
    }

    pub fn succeeded(&self) -> usize {
        self.instances
            .iter()
            .filter(|s| s.outcome == InstanceOutcome::Succeeded)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.instances.len() - self.succeeded()
    }

    /// Returns true if a configuration error stopped the run early
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.aborted || self.failed() > 0 {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        }
    }
}

/// Processes instances one after another
///
/// `connect` builds the remote client for each instance. A failing instance
/// is recorded and the next one proceeds; an error classed as a
/// configuration problem stops the run.
pub async fn run_instances<A, E, F>(
    configs: &[ServiceConfiguration],
    mut connect: F,
    cache: &dyn IdentityCacheStore,
    guide: &dyn GuideProvider,
    preview: bool,
) -> RunReport
where
    A: RemoteApi,
    E: ClassifiedError,
    F: FnMut(&ServiceConfiguration) -> Result<A, E>,
{
    let mut report = RunReport::new();

    for (position, config) in configs.iter().enumerate() {
        let instance = config.instance_name();

        let (reason, aborts_run) = match connect(config) {
            Ok(api) => {
                let engine = SyncEngine::new(&api, cache, guide).with_preview(preview);
                match engine.sync_instance(config).await {
                    Ok(instance_report) => {
                        log::info!("[{}] Completed successfully", instance);
                        report.record_success(config, instance_report);
                        continue;
                    }
                    Err(e) => (e.to_string(), e.class().aborts_run()),
                }
            }
            Err(e) => (e.to_string(), e.class().aborts_run()),
        };

        log::error!("[{}] Processing failed: {}", instance, reason);
        report.record_failure(config, reason);

        if aborts_run {
            for skipped in &configs[position + 1..] {
                report.record_failure(skipped, "Skipped after an earlier configuration error");
            }
            report.aborted = true;
            break;
        }
    }

    report
}
