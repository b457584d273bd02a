//! Publication statistics overview.
//!
//! `folio stats` prints counts per publication kind, authorship counts and
//! total citations, computed from the stored buckets. With `--write` the
//! result is also saved to `portfolio/publication_stats` for the site.

use anyhow::Result;

use folio_core::catalog::PublicationKind;
use folio_core::singleton::PublicationStats;
use folio_core::stats::compute_stats;

use crate::config::Config;
use crate::{db, session};

/// Run the stats command: compute and print a summary.
pub async fn run_stats(config: &Config, identity: Option<&str>, write: bool) -> Result<()> {
    let stats = if write {
        let editor = session::editor(config, identity)?;
        let catalog = session::open_catalog(config).await?;
        catalog.refresh_stats(&editor).await?
    } else {
        let store = db::open_store(config).await?;
        compute_stats(&store).await?
    };

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Folio — Publication Stats");
    println!("=========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    for kind in PublicationKind::ALL {
        println!("  {:<24} {:>6}", kind.label(), count_for(&stats, kind));
    }
    println!("  {}", "-".repeat(31));
    println!("  {:<24} {:>6}", "Total", stats.total);
    println!();
    println!(
        "  First author:          {}",
        with_share(stats.first_author, stats.total)
    );
    println!(
        "  Corresponding author:  {}",
        with_share(stats.corresponding_author, stats.total)
    );
    println!("  Citations:             {}", stats.citations);
    if write {
        println!();
        println!("  Saved at {}", stats.updated_at);
    }
    println!();

    Ok(())
}

fn count_for(stats: &PublicationStats, kind: PublicationKind) -> usize {
    match kind {
        PublicationKind::JournalArticles => stats.journal_articles,
        PublicationKind::ConferenceProceedings => stats.conference_proceedings,
        PublicationKind::EditedBooks => stats.edited_books,
        PublicationKind::BookChapters => stats.book_chapters,
    }
}

fn with_share(count: usize, total: usize) -> String {
    if total == 0 {
        return count.to_string();
    }
    format!("{} ({}%)", count, count * 100 / total)
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_is_a_whole_percentage() {
        assert_eq!(with_share(1, 3), "1 (33%)");
        assert_eq!(with_share(0, 0), "0");
    }

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
