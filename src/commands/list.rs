//! List posts from the content source

use anyhow::Result;

use crate::api::ContentSource;
use crate::helpers::ViewOptions;
use crate::listing::{Listing, LoadState};
use crate::Site;

/// Walk the listing page by page, like repeated "load more" clicks.
///
/// `max_pages` limits how many pages are fetched, the first one included.
pub async fn run(site: &Site, source: &dyn ContentSource, max_pages: Option<usize>) -> Result<()> {
    let options = ViewOptions::from_config(&site.config)?;
    let listing = collect(source, site.config.page_size.max(1), max_pages).await?;

    let cards = listing.view(&options);
    println!("Posts ({}):", cards.len());
    for card in cards {
        println!("  {} - {} [{}] by {}", card.date, card.title, card.uid, card.author);
    }

    if let LoadState::Failed(message) = listing.state() {
        println!("Stopped early: {}", message);
    } else if listing.can_load_more() {
        println!(
            "More posts available after cursor {:?}",
            listing.next_cursor().unwrap_or_default()
        );
    }

    Ok(())
}

/// Load up to `max_pages` pages into a listing
pub async fn collect(
    source: &dyn ContentSource,
    page_size: usize,
    max_pages: Option<usize>,
) -> Result<Listing> {
    let mut listing = Listing::fetch(source, page_size).await?;
    let mut pages = 1;

    while listing.can_load_more() && max_pages.map_or(true, |max| pages < max) {
        if listing.load_more(source, page_size).await.is_err() {
            break;
        }
        pages += 1;
    }

    tracing::debug!("Fetched {} pages", pages);
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FixturePost, MemorySource};

    fn source() -> MemorySource {
        MemorySource::new(
            (1..=5)
                .map(|day| FixturePost {
                    uid: format!("post-{}", day),
                    first_publication_date: Some(format!("2021-04-{:02}T12:00:00Z", day)),
                    ..FixturePost::default()
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_collect_everything() {
        let listing = collect(&source(), 2, None).await.unwrap();
        assert_eq!(listing.posts().len(), 5);
        assert_eq!(listing.posts()[0].uid, "post-5");
        assert!(!listing.can_load_more());
    }

    #[tokio::test]
    async fn test_collect_respects_page_limit() {
        let listing = collect(&source(), 1, Some(2)).await.unwrap();
        assert_eq!(listing.posts().len(), 2);
        assert!(listing.can_load_more());
    }
}
