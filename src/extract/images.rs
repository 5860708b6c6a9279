//! Verification of embedded image references

use crate::extract::render::img_tag;
use crate::extract::Extracted;
use crate::fetch::Fetcher;
use std::time::Duration;

/// Checks every resolved image of `extracted` and reverts the unverifiable ones
///
/// Each reference that was rewritten to an absolute URL is checked with a
/// HEAD request bounded by `timeout`. When the check fails the description
/// goes back to the reference exactly as the page wrote it. Checking never
/// fails the extraction.
///
/// Returns the number of references that were reverted.
pub async fn verify_images(fetcher: &Fetcher, extracted: &mut Extracted, timeout: Duration) -> usize {
    let mut reverted = 0;

    for image in &extracted.images {
        if image.original == image.resolved {
            continue;
        }
        if fetcher.image_exists(&image.resolved, timeout).await {
            continue;
        }

        tracing::debug!(image = %image.resolved, "image unverifiable, keeping original reference");
        extracted.description = extracted
            .description
            .replace(&img_tag(&image.resolved), &img_tag(&image.original));
        reverted += 1;
    }

    reverted
}
