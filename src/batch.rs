//! Sequential batch resize on the GPU.
//!
//! Items run strictly one after another against the shared context. A failed
//! item never aborts the batch: [`batch_resize`] logs it and leaves an empty
//! sentinel at its index.

use tracing::warn;

use crate::encode::EncodedImage;
use crate::error::{ResizeError, ResizeResult};
use crate::gpu::{ContextProvider, resize_gpu};
use crate::request::ResizeRequest;
use crate::source::SourceImage;

/// Progress callback: `(completed, total)`.
pub type Progress<'a> = &'a mut (dyn FnMut(usize, usize) + Send);

/// Resize every source, keeping each outcome at its index.
///
/// Failures are wrapped as `BatchItemFailed`. `on_progress` fires after each
/// success with the 1-based position of that item.
pub async fn batch_resize_results(
    contexts: &ContextProvider,
    sources: &[SourceImage],
    request: &ResizeRequest,
    mut on_progress: Option<Progress<'_>>,
) -> Vec<ResizeResult<EncodedImage>> {
    let total = sources.len();
    let mut results = Vec::with_capacity(total);
    for (index, source) in sources.iter().enumerate() {
        let outcome = resize_gpu(contexts, source, request)
            .await
            .map_err(|e| ResizeError::batch_item(index, e).with_operation("batch_resize"));
        if outcome.is_ok() {
            if let Some(progress) = on_progress.as_mut() {
                progress(index + 1, total);
            }
        }
        results.push(outcome);
    }
    results
}

/// Resize every source, replacing failures with [`EncodedImage::empty`].
pub async fn batch_resize(
    contexts: &ContextProvider,
    sources: &[SourceImage],
    request: &ResizeRequest,
    on_progress: Option<Progress<'_>>,
) -> Vec<EncodedImage> {
    batch_resize_results(contexts, sources, request, on_progress)
        .await
        .into_iter()
        .map(|outcome| {
            outcome.unwrap_or_else(|e| {
                if let ResizeError::BatchItemFailed { index, source, .. } = &e {
                    warn!(index, cause = %source, category = source.category(), "batch item failed");
                } else {
                    warn!(error = %e, "batch item failed");
                }
                EncodedImage::empty()
            })
        })
        .collect()
}
