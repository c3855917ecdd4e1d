//! Output formats for search results.
//!
//! A terminal table, a Markdown reading list, a JSON record for programs and
//! an optional CSV sheet. Writers take the papers with any summaries already
//! attached.

use crate::arxiv::{normalize_whitespace, Paper};
use crate::error::Result;
use crate::summarize::SummaryResult;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Abstract excerpt length in the Markdown report
const MARKDOWN_ABSTRACT_CHARS: usize = 400;

/// Authors shown in the table before "et al."
const TABLE_AUTHORS: usize = 3;

const NUM_WIDTH: usize = 2;
const TITLE_WIDTH: usize = 48;
const AUTHORS_WIDTH: usize = 28;
const DATE_WIDTH: usize = 10;

/// Render papers as a bordered text table (#, Title, Authors, Date).
///
/// Long cells fold onto extra lines instead of being cut.
pub fn render_table(papers: &[Paper]) -> String {
    let widths = [NUM_WIDTH, TITLE_WIDTH, AUTHORS_WIDTH, DATE_WIDTH];
    let separator = {
        let mut line = String::from("+");
        for w in widths {
            line.push_str(&"-".repeat(w + 2));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    out.push_str(&separator);
    out.push('\n');
    push_row(&mut out, &widths, &["#", "Title", "Authors", "Date"], true);
    out.push_str(&separator);
    out.push('\n');

    for (i, paper) in papers.iter().enumerate() {
        let number = (i + 1).to_string();
        let date = paper.published.format("%Y-%m-%d").to_string();
        let authors = short_authors(&paper.authors);
        let cells = [number.as_str(), paper.title.as_str(), authors.as_str(), date.as_str()];
        push_row(&mut out, &widths, &cells, false);
        out.push_str(&separator);
        out.push('\n');
    }

    out
}

fn push_row(out: &mut String, widths: &[usize; 4], cells: &[&str; 4], header: bool) {
    let wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, w)| wrap(cell, *w))
        .collect();
    let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);

    for line_idx in 0..height {
        out.push('|');
        for (col, lines) in wrapped.iter().enumerate() {
            let text = lines.get(line_idx).map(String::as_str).unwrap_or("");
            let pad = widths[col].saturating_sub(text.chars().count());
            // Number column is right-aligned
            if col == 0 && !header {
                let _ = write!(out, " {}{} |", " ".repeat(pad), text);
            } else {
                let _ = write!(out, " {}{} |", text, " ".repeat(pad));
            }
        }
        out.push('\n');
    }
}

/// Word-wrap to `width` chars; words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        loop {
            let used = current.chars().count();
            let needed = if used == 0 { word.len() } else { used + 1 + word.len() };
            if needed <= width {
                if used > 0 {
                    current.push(' ');
                }
                current.extend(word.iter());
                break;
            }
            if used > 0 {
                lines.push(std::mem::take(&mut current));
                continue;
            }
            let rest = word.split_off(width.min(word.len()));
            lines.push(word.into_iter().collect());
            word = rest;
            if word.is_empty() {
                break;
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Last names of the first authors, with "et al." when more exist
pub fn short_authors(authors: &[String]) -> String {
    let mut names = authors
        .iter()
        .take(TABLE_AUTHORS)
        .filter_map(|a| a.split_whitespace().last())
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > TABLE_AUTHORS {
        names.push_str(" et al.");
    }
    names
}

/// Write the Markdown reading list.
pub fn write_markdown(path: &Path, papers: &[Paper]) -> Result<()> {
    std::fs::write(path, render_markdown(papers))?;
    info!(path = %path.display(), papers = papers.len(), "Saved Markdown report");
    Ok(())
}

/// Markdown body for [`write_markdown`]
pub fn render_markdown(papers: &[Paper]) -> String {
    let mut out = String::from("# Research findings\n\n");

    if papers.is_empty() {
        out.push_str("> Nothing found yet. Try a more specific topic!\n");
        return out;
    }

    for (i, paper) in papers.iter().enumerate() {
        let _ = writeln!(out, "## {}. {}", i + 1, paper.title);
        let _ = writeln!(out, "- **Authors**: {}", paper.authors.join(", "));
        let _ = writeln!(out, "- **Date**: {}", paper.published.format("%Y-%m-%d"));
        let _ = writeln!(
            out,
            "- **Links**: [Read on arXiv]({}) | [PDF]({})",
            paper.entry_id, paper.pdf_url
        );
        if let Some(digest) = &paper.digest {
            let _ = writeln!(out, "- **Summary**: {}", digest.tagged());
        }

        let flat = normalize_whitespace(&paper.abstract_text);
        let excerpt: String = flat.chars().take(MARKDOWN_ABSTRACT_CHARS).collect();
        let ellipsis = if flat.chars().count() > MARKDOWN_ABSTRACT_CHARS { "..." } else { "" };
        let _ = writeln!(out, "- **Abstract**:\n  > {}{}\n", excerpt, ellipsis);
    }

    out
}

/// Machine-readable paper record
#[derive(Debug, Serialize)]
struct PaperRecord<'a> {
    title: &'a str,
    authors: &'a [String],
    published: String,
    entry_id: &'a str,
    pdf_url: &'a str,
    summary: String,
    primary_category: &'a str,
    categories: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<&'a SummaryResult>,
}

impl<'a> From<&'a Paper> for PaperRecord<'a> {
    fn from(p: &'a Paper) -> Self {
        Self {
            title: &p.title,
            authors: &p.authors,
            published: p.published.to_rfc3339(),
            entry_id: &p.entry_id,
            pdf_url: &p.pdf_url,
            summary: normalize_whitespace(&p.abstract_text),
            primary_category: &p.primary_category,
            categories: &p.categories,
            digest: p.digest.as_ref(),
        }
    }
}

/// Write the JSON record (pretty-printed array, one object per paper).
pub fn write_json(path: &Path, papers: &[Paper]) -> Result<()> {
    let records: Vec<PaperRecord> = papers.iter().map(PaperRecord::from).collect();
    let content = serde_json::to_string_pretty(&records)?;
    std::fs::write(path, content)?;
    info!(path = %path.display(), papers = papers.len(), "Saved JSON record");
    Ok(())
}

/// One CSV row
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    authors: String,
    published: String,
    entry_id: &'a str,
    pdf_url: &'a str,
    digest_source: &'static str,
    digest: &'a str,
}

/// Write a CSV sheet, one row per paper.
pub fn write_csv(path: &Path, papers: &[Paper]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(path)?;

    for paper in papers {
        wtr.serialize(CsvRow {
            title: &paper.title,
            authors: paper.authors.join("; "),
            published: paper.published.format("%Y-%m-%d").to_string(),
            entry_id: &paper.entry_id,
            pdf_url: &paper.pdf_url,
            digest_source: paper.digest.as_ref().map(|d| d.provenance.tag()).unwrap_or(""),
            digest: paper.digest.as_ref().map(|d| d.text.as_str()).unwrap_or(""),
        })?;
    }

    wtr.flush()?;
    info!(path = %path.display(), papers = papers.len(), "Saved CSV sheet");
    Ok(())
}
