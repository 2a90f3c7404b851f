//! Lazy iteration over continuation-paged listings.

use futures_util::stream::{self, Stream, TryStreamExt};

use crate::error::StoreError;
use crate::traits::ManagementStore;
use crate::types::{ContinuationToken, RuleGroup};
use crate::StoreResult;

enum Cursor {
    Start,
    Next(ContinuationToken),
    Done,
}

/// Streams every rule group in the store, fetching pages on demand.
///
/// The stream re-issues `list_rule_groups` with the previous page's
/// continuation until the store reports no further page. It is finite and
/// cannot be restarted; call again to list from the beginning.
pub fn rule_groups(
    store: &dyn ManagementStore,
) -> impl Stream<Item = StoreResult<RuleGroup>> + Send + '_ {
    stream::try_unfold(Cursor::Start, move |cursor| async move {
        let continuation = match cursor {
            Cursor::Done => return Ok(None),
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
        };
        let page = store.list_rule_groups(continuation.as_ref()).await?;
        let next = match page.continuation {
            Some(token) => Cursor::Next(token),
            None => Cursor::Done,
        };
        let items = stream::iter(page.items.into_iter().map(Ok::<_, StoreError>));
        Ok::<_, StoreError>(Some((items, next)))
    })
    .try_flatten()
}
