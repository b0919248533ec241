use crate::models::{GuideCustomFormat, ReleaseProfileData};
use crate::GuideResult;
use guidesync_core::ServiceType;

/// Source of guide-defined desired records
///
/// Implementations return fully parsed data; entries that fail to parse are
/// the provider's concern and never reach the reconciliation engine.
pub trait GuideProvider: Send + Sync {
    /// Custom format definitions for one service
    fn custom_formats(&self, service: ServiceType) -> GuideResult<Vec<GuideCustomFormat>>;

    /// Release profile definitions (Sonarr)
    fn release_profiles(&self) -> GuideResult<Vec<ReleaseProfileData>>;
}
