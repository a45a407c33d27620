use std::future::Future;

use idmigrate_core::errors::Result;
use idmigrate_core::model::{Page, PageCursor, PageRequest, ResourceKind};

/// Drive `cursor` to completion, requesting each page with `fetch`.
///
/// Pages are requested sequentially and concatenated in order. The first
/// failing page aborts the collection.
///
/// # Errors
///
/// Whatever `fetch` returns for a failing page.
pub async fn collect_pages<T, F, Fut>(
    resource: ResourceKind,
    mut cursor: PageCursor,
    mut fetch: F,
) -> Result<Vec<T>>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut records = Vec::new();
    while let Some(request) = cursor.next_request() {
        let page = fetch(request).await?;
        cursor.advance(page.records.len(), page.total_count);
        records.extend(page.records);
    }

    if cursor.truncated() {
        tracing::warn!(
            resource = resource.as_str(),
            page_count = cursor.pages_fetched(),
            record_count = records.len(),
            "Page limit reached; collection may be incomplete"
        );
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use idmigrate_core::{ExError, ExErrorKind};
    use std::sync::Mutex;

    fn numbers(total: u64) -> impl Fn(PageRequest) -> std::future::Ready<Result<Page<u64>>> {
        move |request: PageRequest| {
            let end = (request.offset + u64::from(request.limit)).min(total);
            let records: Vec<u64> = (request.offset..end).collect();
            std::future::ready(Ok(Page::new(records, None)))
        }
    }

    #[tokio::test]
    async fn test_collects_every_page_in_order() {
        let cursor = PageCursor::new(2, true, None);
        let all = collect_pages(ResourceKind::Users, cursor, numbers(5))
            .await
            .unwrap();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_single_page_mode_requests_once() {
        let requests = Mutex::new(Vec::new());
        let source = numbers(5);
        let cursor = PageCursor::new(2, false, None);
        let all = collect_pages(ResourceKind::Users, cursor, |request| {
            requests.lock().unwrap().push(request);
            source(request)
        })
        .await
        .unwrap();
        assert_eq!(all, vec![0, 1]);
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_page_aborts() {
        let cursor = PageCursor::new(2, true, None);
        let result: Result<Vec<u64>> = collect_pages(ResourceKind::Organizations, cursor, |r| {
            std::future::ready(if r.offset == 0 {
                Ok(Page::new(vec![1, 2], None))
            } else {
                Err(ExError::new(ExErrorKind::Fetch).with_message("second page"))
            })
        })
        .await;
        assert_eq!(result.unwrap_err().message(), "second page");
    }

    #[tokio::test]
    async fn test_max_pages_stops_early() {
        let cursor = PageCursor::new(2, true, Some(2));
        let all = collect_pages(ResourceKind::Memberships, cursor, numbers(10))
            .await
            .unwrap();
        assert_eq!(all, vec![0, 1, 2, 3]);
    }
}
