use std::future::Future;
use std::pin::Pin;

use crate::{ProviderCall, ProviderError, ProviderId, ProviderResponse};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sends one turn plus prior history to a remote model.
///
/// Implementations classify every failure into a [`crate::ProviderErrorKind`]
/// before returning it.
pub trait ProviderClient: Send + Sync {
    fn id(&self) -> ProviderId;

    fn send<'a>(
        &'a self,
        call: ProviderCall,
    ) -> ProviderFuture<'a, Result<ProviderResponse, ProviderError>>;
}
