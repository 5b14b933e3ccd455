use std::future::Future;

use crate::error::ApiResult;
use crate::sync::cache::CollectionCache;

/// Answer of the confirmation prompt shown before a destructive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    pub fn from_answer(answer: Option<&str>) -> Self {
        match answer.map(str::trim) {
            Some("yes" | "true" | "1" | "on") => Confirmation::Confirmed,
            _ => Confirmation::Declined,
        }
    }
}

/// Awaits one mutation and, only if it succeeded, invalidates the resource so
/// the next read refetches server truth. A failure leaves the cache as it
/// was.
pub async fn reconcile<T, O, Fut>(cache: &CollectionCache<T>, mutation: Fut) -> ApiResult<O>
where
    T: Send + Sync + 'static,
    Fut: Future<Output = ApiResult<O>>,
{
    match mutation.await {
        Ok(output) => {
            cache.invalidate_resource();
            Ok(output)
        }
        Err(error) => {
            log::warn!("Mutation on {} failed: {}", cache.resource(), error);
            Err(error)
        }
    }
}

/// Delete gated by the confirmation; `Ok(false)` means nothing was sent.
pub async fn confirmed_delete<T, F, Fut>(
    cache: &CollectionCache<T>,
    confirmation: Confirmation,
    delete: F,
) -> ApiResult<bool>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ApiResult<()>>,
{
    if confirmation == Confirmation::Declined {
        log::debug!("Delete on {} declined", cache.resource());
        return Ok(false);
    }
    reconcile(cache, delete()).await.map(|()| true)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ApiError;
    use crate::models::Listing;
    use crate::sync::cache::CollectionKey;

    #[test]
    fn only_explicit_answers_confirm() {
        assert_eq!(Confirmation::from_answer(Some("yes")), Confirmation::Confirmed);
        assert_eq!(Confirmation::from_answer(Some("no")), Confirmation::Declined);
        assert_eq!(Confirmation::from_answer(None), Confirmation::Declined);
    }

    #[tokio::test]
    async fn declined_delete_sends_nothing() {
        let cache: CollectionCache<u32> = CollectionCache::new("vouchers");
        let calls = AtomicUsize::new(0);
        let sent = confirmed_delete(&cache, Confirmation::Declined, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await
        .unwrap();
        assert!(!sent);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_mutation_keeps_cache_fresh() {
        let cache = CollectionCache::new("brands");
        let key = CollectionKey::all("brands");
        let fetches = AtomicUsize::new(0);
        let fetch = || {
            fetches.fetch_add(1, Ordering::SeqCst);
            async { Ok(Listing::new(vec![1u32], None)) }
        };

        cache.load(key.clone(), fetch).await;
        let failed: ApiResult<()> = reconcile(&cache, async {
            Err(ApiError::Status {
                status: 400,
                message: "nope".to_string(),
            })
        })
        .await;
        assert!(failed.is_err());

        cache.load(key.clone(), fetch).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        reconcile(&cache, async { Ok(()) }).await.unwrap();
        cache.load(key.clone(), fetch).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}
