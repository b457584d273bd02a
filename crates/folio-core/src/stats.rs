//! Publication statistics derived from the year buckets.

use std::sync::Arc;

use crate::buckets::YearBuckets;
use crate::error::Result;
use crate::models::{BookChapter, ConferenceProceeding, EditedBook, JournalArticle, YearRecord};
use crate::singleton::PublicationStats;
use crate::store::DocumentStore;

#[derive(Default)]
struct Tally {
    count: usize,
    first_author: usize,
    corresponding_author: usize,
    citations: u64,
}

async fn tally<R: YearRecord>(store: &Arc<dyn DocumentStore>) -> Result<Tally> {
    let all = YearBuckets::<R>::new(store.clone()).load_all().await?;
    let mut t = Tally::default();
    for tagged in all.values().flatten() {
        t.count += 1;
        if tagged.record.is_first_author() {
            t.first_author += 1;
        }
        if tagged.record.is_corresponding_author() {
            t.corresponding_author += 1;
        }
        t.citations += u64::from(tagged.record.citations());
    }
    Ok(t)
}

/// Count every publication kind. Loads all buckets of all four kinds.
pub async fn compute_stats(store: &Arc<dyn DocumentStore>) -> Result<PublicationStats> {
    let journals = tally::<JournalArticle>(store).await?;
    let proceedings = tally::<ConferenceProceeding>(store).await?;
    let books = tally::<EditedBook>(store).await?;
    let chapters = tally::<BookChapter>(store).await?;

    let all = [&journals, &proceedings, &books, &chapters];
    Ok(PublicationStats {
        journal_articles: journals.count,
        conference_proceedings: proceedings.count,
        edited_books: books.count,
        book_chapters: chapters.count,
        total: all.iter().map(|t| t.count).sum(),
        first_author: all.iter().map(|t| t.first_author).sum(),
        corresponding_author: all.iter().map(|t| t.corresponding_author).sum(),
        citations: all.iter().map(|t| t.citations).sum(),
        updated_at: chrono::Utc::now().to_rfc3339(),
    })
}
