//! Source of version indexes for dependency resolution.

use std::future::Future;
use std::sync::Arc;

use qpm_core::types::PackageName;

use crate::api::VersionIndex;
use crate::client::RegistryClient;
use crate::RegistryResult;

/// Anything that can answer "which versions of this package exist?"
pub trait VersionIndexProvider: Send + Sync {
    /// Fetch the version index for `name`
    fn version_index(
        &self,
        name: &PackageName,
    ) -> impl Future<Output = RegistryResult<VersionIndex>> + Send;
}

impl VersionIndexProvider for RegistryClient {
    fn version_index(
        &self,
        name: &PackageName,
    ) -> impl Future<Output = RegistryResult<VersionIndex>> + Send {
        self.fetch_version_index(name)
    }
}

impl<P: VersionIndexProvider> VersionIndexProvider for Arc<P> {
    fn version_index(
        &self,
        name: &PackageName,
    ) -> impl Future<Output = RegistryResult<VersionIndex>> + Send {
        (**self).version_index(name)
    }
}

impl<P: VersionIndexProvider> VersionIndexProvider for &P {
    fn version_index(
        &self,
        name: &PackageName,
    ) -> impl Future<Output = RegistryResult<VersionIndex>> + Send {
        (**self).version_index(name)
    }
}
