//! arXiv query API: Atom feed parsing and arXiv id extraction.
//!
//! Uses `quick-xml`'s pull reader. Only the handful of Atom and `arxiv:`
//! elements the league stores are read; everything else is skipped.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use league_core::{
  paper::{ArxivDetails, ArxivEntry},
  upstream::ArxivQuery,
};
use quick_xml::{
  Reader,
  events::{BytesStart, Event},
};
use regex::Regex;
use reqwest::Client;

use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "http://export.arxiv.org/api/query";

// ─── Id extraction ───────────────────────────────────────────────────────────

static ABS_OR_PDF: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"arxiv\.org/(?:abs|pdf)/(\d+\.\d+)").expect("valid regex"));
static DOI: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"doi\.org/10\.\d+/(\d+\.\d+)").expect("valid regex"));
static RAW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+\.\d+)").expect("valid regex"));

/// Extract an arXiv id from an `arxiv.org/abs|pdf` URL, a DOI URL embedding
/// one, or any string containing a bare `NNNN.NNNNN` id. Version suffixes are
/// dropped.
pub fn extract_arxiv_id(input: &str) -> Option<String> {
  [&*ABS_OR_PDF, &*DOI, &*RAW]
    .into_iter()
    .find_map(|re| re.captures(input))
    .map(|caps| caps[1].to_owned())
}

// ─── Feed parsing ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
  Id,
  Title,
  Summary,
  Published,
  Updated,
  AuthorName,
  Doi,
  JournalRef,
}

impl Field {
  fn from_local(local: &[u8], in_author: bool) -> Option<Self> {
    Some(match local {
      b"id" => Self::Id,
      b"title" => Self::Title,
      b"summary" => Self::Summary,
      b"published" => Self::Published,
      b"updated" => Self::Updated,
      b"name" if in_author => Self::AuthorName,
      b"doi" => Self::Doi,
      b"journal_ref" => Self::JournalRef,
      _ => return None,
    })
  }
}

#[derive(Default)]
struct EntryBuilder {
  id:               String,
  title:            String,
  summary:          String,
  published:        String,
  updated:          String,
  authors:          Vec<String>,
  categories:       Vec<String>,
  primary_category: Option<String>,
  pdf_url:          Option<String>,
  abstract_url:     Option<String>,
  doi:              Option<String>,
  journal_ref:      Option<String>,
  in_author:        bool,
}

impl EntryBuilder {
  fn push_text(&mut self, field: Field, text: &str) {
    let text = collapse_whitespace(text);
    match field {
      Field::Id => self.id.push_str(&text),
      Field::Title => self.title.push_str(&text),
      Field::Summary => self.summary.push_str(&text),
      Field::Published => self.published.push_str(&text),
      Field::Updated => self.updated.push_str(&text),
      Field::AuthorName => self.authors.push(text),
      Field::Doi => self.doi = Some(text),
      Field::JournalRef => self.journal_ref = Some(text),
    }
  }

  fn element(&mut self, local: &[u8], e: &BytesStart<'_>) -> Result<()> {
    match local {
      b"author" => self.in_author = true,
      b"category" => {
        if let Some(term) = attribute(e, b"term")? {
          self.categories.push(term);
        }
      }
      b"primary_category" => self.primary_category = attribute(e, b"term")?,
      b"link" => {
        let href = attribute(e, b"href")?;
        let title = attribute(e, b"title")?;
        let rel = attribute(e, b"rel")?;
        match (title.as_deref(), rel.as_deref()) {
          (Some("pdf"), _) => self.pdf_url = href,
          (Some("abstract"), _) | (None, Some("alternate")) => self.abstract_url = href,
          _ => {}
        }
      }
      _ => {}
    }
    Ok(())
  }

  /// `None` for feed error entries, whose ids are not arXiv URLs.
  fn finish(self) -> Option<ArxivEntry> {
    let arxiv_id = extract_arxiv_id(&self.id)?;
    Some(ArxivEntry {
      title:         self.title,
      abstract_text: self.summary,
      authors:       self.authors,
      details:       ArxivDetails {
        arxiv_id,
        categories: self.categories,
        primary_category: self.primary_category,
        published: parse_date(&self.published),
        updated: parse_date(&self.updated),
        pdf_url: self.pdf_url,
        abstract_url: self.abstract_url,
        doi: self.doi,
        journal_ref: self.journal_ref,
      },
    })
  }
}

/// Parse an arXiv Atom feed into its entries, in feed order.
pub fn parse_feed(xml: &str) -> Result<Vec<ArxivEntry>> {
  let mut reader = Reader::from_str(xml);
  reader.config_mut().trim_text(true);

  let mut entries = Vec::new();
  let mut current: Option<EntryBuilder> = None;
  let mut field: Option<Field> = None;

  loop {
    match reader.read_event() {
      Ok(Event::Start(ref e)) => {
        let name = e.name();
        let local = local_name(name.as_ref());
        if local == b"entry" {
          current = Some(EntryBuilder::default());
        } else if let Some(entry) = current.as_mut() {
          entry.element(local, e)?;
          field = Field::from_local(local, entry.in_author);
        }
      }
      Ok(Event::Empty(ref e)) => {
        if let Some(entry) = current.as_mut() {
          let name = e.name();
          entry.element(local_name(name.as_ref()), e)?;
        }
      }
      Ok(Event::Text(ref t)) => {
        if let (Some(entry), Some(f)) = (current.as_mut(), field) {
          let text = t.unescape().map_err(|e| Error::Xml(e.to_string()))?;
          entry.push_text(f, &text);
        }
      }
      Ok(Event::End(ref e)) => {
        field = None;
        let name = e.name();
        match local_name(name.as_ref()) {
          b"entry" => entries.extend(current.take().and_then(EntryBuilder::finish)),
          b"author" => {
            if let Some(entry) = current.as_mut() {
              entry.in_author = false;
            }
          }
          _ => {}
        }
      }
      Ok(Event::Eof) => break,
      Err(e) => return Err(Error::Xml(e.to_string())),
      _ => {}
    }
  }

  Ok(entries)
}

fn local_name(name: &[u8]) -> &[u8] {
  match name.iter().rposition(|&b| b == b':') {
    Some(pos) => &name[pos + 1..],
    None => name,
  }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
  let attr = e
    .try_get_attribute(key)
    .map_err(|err| Error::Xml(err.to_string()))?;
  attr
    .map(|a| {
      a.unescape_value()
        .map(|v| v.into_owned())
        .map_err(|err| Error::Xml(err.to_string()))
    })
    .transpose()
}

fn collapse_whitespace(s: &str) -> String { s.split_whitespace().collect::<Vec<_>>().join(" ") }

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .ok()
    .map(|dt| dt.with_timezone(&Utc))
}

// ─── Queries ─────────────────────────────────────────────────────────────────

pub(crate) async fn fetch_entry(
  client: &Client,
  base_url: &str,
  arxiv_id: &str,
) -> Result<Option<ArxivEntry>> {
  let xml = get_feed(client, base_url, &[
    ("id_list", arxiv_id.to_owned()),
    ("max_results", "1".to_owned()),
  ])
  .await?;
  Ok(parse_feed(&xml)?.into_iter().next())
}

pub(crate) async fn search(
  client: &Client,
  base_url: &str,
  query: &ArxivQuery,
) -> Result<Vec<ArxivEntry>> {
  let xml = get_feed(client, base_url, &[
    ("search_query", format!("cat:{}", query.category)),
    ("sortBy", "submittedDate".to_owned()),
    ("sortOrder", "descending".to_owned()),
    ("start", query.start.to_string()),
    ("max_results", query.max_results.to_string()),
  ])
  .await?;
  parse_feed(&xml)
}

async fn get_feed(client: &Client, base_url: &str, params: &[(&str, String)]) -> Result<String> {
  let resp = client.get(base_url).query(params).send().await?;
  let status = resp.status();
  if !status.is_success() {
    return Err(Error::Status {
      service: "arxiv",
      status:  status.as_u16(),
      message: resp.text().await.unwrap_or_default(),
    });
  }
  Ok(resp.text().await?)
}
