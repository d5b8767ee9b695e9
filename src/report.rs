// src/report.rs
// =============================================================================
// Prints the crawl results.
//
// Two formats:
// - text (default): one block per page, the page URL followed by its links,
//   indented, one per line, and a blank line between pages
// - JSON (--json): a pretty-printed array of {"url": ..., "links": [...]}
//
// Output goes to any io::Write so tests can capture it in a Vec<u8>.
// =============================================================================

use std::io::Write;

use anyhow::Result;

use crate::crawl::PageRecord;

pub fn write_report<W: Write>(out: &mut W, pages: &[PageRecord], json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, pages)?;
        writeln!(out)?;
    } else {
        write_text(out, pages)?;
    }
    out.flush()?;
    Ok(())
}

// Example:
//   https://example.com
//     - https://example.com/about
//     - https://example.com/blog
//
//   https://example.com/about
//     - https://example.com
fn write_text<W: Write>(out: &mut W, pages: &[PageRecord]) -> Result<()> {
    for page in pages {
        writeln!(out, "{}", page.url)?;
        for link in &page.links {
            writeln!(out, "  - {}", link)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
