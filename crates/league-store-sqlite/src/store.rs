//! [`SqliteStore`], the SQLite implementation of [`LeagueStore`].

use std::path::Path;

use chrono::Utc;
use league_core::{
  agent::{Agent, MatchResult, NewAgent},
  evaluation::{Evaluation, NewEvaluation},
  feedback::{Feedback, NewFeedback},
  lifecycle::{MatchStatus, Resolution},
  matches::{Match, MatchQuery, NewMatch},
  paper::{ArxivDetails, NewPaper, Paper, PaperQuery},
  review::{NewReview, Review},
  store::{LeagueStore, MatchRecord},
};
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    AGENT_COLUMNS, EVALUATION_COLUMNS, FEEDBACK_COLUMNS, MATCH_COLUMNS, PAPER_COLUMNS,
    REVIEW_COLUMNS, RawAgent, RawEvaluation, RawFeedback, RawMatch, RawPaper, RawReview,
    decode_enum, encode_dt, encode_list, encode_scores, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A league store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn current_status(&self, id: Uuid) -> Result<MatchStatus> {
    let id_str = encode_uuid(id);
    let status: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT status FROM matches WHERE match_id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    match status {
      Some(s) => decode_enum(&s),
      None => Err(Error::NotFound { entity: "match", id }),
    }
  }

  async fn require_match(&self, id: Uuid) -> Result<Match> {
    self
      .get_match(id)
      .await?
      .ok_or(Error::NotFound { entity: "match", id })
  }
}

// ─── Connection-level helpers ────────────────────────────────────────────────

fn exists(conn: &Connection, table: &str, id_column: &str, id: &str) -> rusqlite::Result<bool> {
  let sql = format!("SELECT 1 FROM {table} WHERE {id_column} = ?1");
  Ok(
    conn
      .query_row(&sql, rusqlite::params![id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

fn query_paper(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawPaper>> {
  conn
    .query_row(
      &format!("SELECT {PAPER_COLUMNS} FROM papers WHERE paper_id = ?1"),
      rusqlite::params![id],
      RawPaper::from_row,
    )
    .optional()
}

fn query_match(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawMatch>> {
  conn
    .query_row(
      &format!("SELECT {MATCH_COLUMNS} FROM matches m WHERE m.match_id = ?1"),
      rusqlite::params![id],
      RawMatch::from_row,
    )
    .optional()
}

fn query_reviews(conn: &Connection, match_id: &str) -> rusqlite::Result<Vec<RawReview>> {
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {REVIEW_COLUMNS} FROM reviews WHERE match_id = ?1 ORDER BY created_at, rowid"
  ))?;
  stmt
    .query_map(rusqlite::params![match_id], RawReview::from_row)?
    .collect()
}

fn query_evaluation(conn: &Connection, match_id: &str) -> rusqlite::Result<Option<RawEvaluation>> {
  conn
    .prepare_cached(&format!(
      "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE match_id = ?1"
    ))?
    .query_row(rusqlite::params![match_id], RawEvaluation::from_row)
    .optional()
}

fn query_feedback(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawFeedback>> {
  conn
    .query_row(
      &format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE feedback_id = ?1"),
      rusqlite::params![id],
      RawFeedback::from_row,
    )
    .optional()
}

// ─── Match filters ───────────────────────────────────────────────────────────

/// A [`MatchQuery`] encoded into owned column values.
///
/// Every filter is bound as a positional parameter and disabled by binding
/// NULL, so the SQL text only varies in its sort direction.
struct MatchFilter {
  status:       Option<String>,
  agent_id:     Option<String>,
  paper_id:     Option<String>,
  category:     Option<String>,
  subcategory:  Option<String>,
  year:         Option<i32>,
  head_to_head: Option<bool>,
  oldest_first: bool,
  limit:        i64,
  offset:       i64,
}

const MATCH_WHERE: &str = "
  FROM matches m
  JOIN papers p ON p.paper_id = m.paper_id
  WHERE (?1 IS NULL OR m.status = ?1)
    AND (?2 IS NULL OR m.agent1_id = ?2 OR m.agent2_id = ?2)
    AND (?3 IS NULL OR m.paper_id = ?3 OR m.opponent_paper_id = ?3)
    AND (?4 IS NULL OR p.category = ?4)
    AND (?5 IS NULL OR p.subcategory = ?5)
    AND (?6 IS NULL OR p.year = ?6)
    AND (?7 IS NULL OR (m.opponent_paper_id IS NOT NULL) = ?7)";

impl MatchFilter {
  fn new(query: &MatchQuery) -> Self {
    Self {
      status:       query.status.map(|s| s.as_ref().to_owned()),
      agent_id:     query.agent_id.map(encode_uuid),
      paper_id:     query.paper_id.map(encode_uuid),
      category:     query.category.clone(),
      subcategory:  query.subcategory.clone(),
      year:         query.year,
      head_to_head: query.head_to_head,
      oldest_first: query.oldest_first,
      // SQLite treats a negative LIMIT as unbounded.
      limit:        query.limit.map_or(-1, |l| l as i64),
      offset:       query.offset.unwrap_or(0) as i64,
    }
  }

  fn select(&self, conn: &Connection) -> rusqlite::Result<Vec<RawMatch>> {
    let direction = if self.oldest_first { "ASC" } else { "DESC" };
    let sql = format!(
      "SELECT {MATCH_COLUMNS} {MATCH_WHERE}
       ORDER BY m.created_at {direction}, m.rowid {direction}
       LIMIT ?8 OFFSET ?9"
    );
    let mut stmt = conn.prepare(&sql)?;
    stmt
      .query_map(
        rusqlite::params![
          self.status,
          self.agent_id,
          self.paper_id,
          self.category,
          self.subcategory,
          self.year,
          self.head_to_head,
          self.limit,
          self.offset,
        ],
        RawMatch::from_row,
      )?
      .collect()
  }

  fn count(&self, conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
      &format!("SELECT COUNT(*) {MATCH_WHERE}"),
      rusqlite::params![
        self.status,
        self.agent_id,
        self.paper_id,
        self.category,
        self.subcategory,
        self.year,
        self.head_to_head,
      ],
      |r| r.get(0),
    )
  }
}

// ─── Completion ──────────────────────────────────────────────────────────────

enum Completion {
  Done,
  Missing,
  WrongStatus(String),
}

fn counter_deltas(result: MatchResult) -> (i64, i64, i64, i64) {
  match result {
    MatchResult::Win => (1, 0, 0, result.points()),
    MatchResult::Draw => (0, 1, 0, result.points()),
    MatchResult::Loss => (0, 0, 1, result.points()),
  }
}

// ─── LeagueStore impl ────────────────────────────────────────────────────────

impl LeagueStore for SqliteStore {
  type Error = Error;

  // ── Papers ────────────────────────────────────────────────────────────────

  async fn add_paper(&self, input: NewPaper) -> Result<Paper> {
    input.validate()?;

    let paper = Paper {
      paper_id:      Uuid::new_v4(),
      title:         input.title,
      abstract_text: input.abstract_text,
      authors:       input.authors,
      category:      input.category,
      subcategory:   input.subcategory,
      year:          input.year,
      url:           input.url,
      arxiv_id:      input.arxiv_id.filter(|id| !id.trim().is_empty()),
      keywords:      input.keywords,
      references:    input.references,
      arxiv_details: None,
      created_at:    Utc::now(),
    };

    let id_str         = encode_uuid(paper.paper_id);
    let title          = paper.title.clone();
    let abstract_text  = paper.abstract_text.clone();
    let authors        = encode_list(&paper.authors)?;
    let category       = paper.category.clone();
    let subcategory    = paper.subcategory.clone();
    let year           = paper.year;
    let url            = paper.url.clone();
    let arxiv_id       = paper.arxiv_id.clone();
    let keywords       = encode_list(&paper.keywords)?;
    let reference_list = encode_list(&paper.references)?;
    let at_str         = encode_dt(paper.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO papers (
             paper_id, title, abstract, authors, category, subcategory, year,
             url, arxiv_id, keywords, reference_list, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            id_str,
            title,
            abstract_text,
            authors,
            category,
            subcategory,
            year,
            url,
            arxiv_id,
            keywords,
            reference_list,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(paper)
  }

  async fn get_paper(&self, id: Uuid) -> Result<Option<Paper>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(query_paper(conn, &id_str)?))
      .await?;
    raw.map(RawPaper::into_paper).transpose()
  }

  async fn find_paper_by_arxiv_id(&self, arxiv_id: &str) -> Result<Option<Paper>> {
    let arxiv_id = arxiv_id.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PAPER_COLUMNS} FROM papers WHERE arxiv_id = ?1"),
              rusqlite::params![arxiv_id],
              RawPaper::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawPaper::into_paper).transpose()
  }

  async fn list_papers(&self, query: &PaperQuery) -> Result<Vec<Paper>> {
    let category    = query.category.clone();
    let subcategory = query.subcategory.clone();
    let year        = query.year;
    let limit_val   = query.limit.map_or(-1, |l| l as i64);
    let offset_val  = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawPaper> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PAPER_COLUMNS} FROM papers
           WHERE (?1 IS NULL OR category = ?1)
             AND (?2 IS NULL OR subcategory = ?2)
             AND (?3 IS NULL OR year = ?3)
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![category, subcategory, year, limit_val, offset_val],
            RawPaper::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPaper::into_paper).collect()
  }

  async fn set_arxiv_details(&self, id: Uuid, details: ArxivDetails) -> Result<Option<Paper>> {
    let id_str       = encode_uuid(id);
    let details_json = serde_json::to_string(&details)?;

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE papers SET arxiv_details = ?2 WHERE paper_id = ?1",
          rusqlite::params![id_str, details_json],
        )?;
        Ok(query_paper(conn, &id_str)?)
      })
      .await?;
    raw.map(RawPaper::into_paper).transpose()
  }

  // ── Agents ────────────────────────────────────────────────────────────────

  async fn register_agent(&self, input: NewAgent) -> Result<Agent> {
    input.validate()?;

    let id_str   = encode_uuid(Uuid::new_v4());
    let name     = input.name;
    let model    = input.model;
    let provider = input.provider.as_ref().to_owned();
    let settings = serde_json::to_string(&input.settings)?;
    let at_str   = encode_dt(Utc::now());

    let raw: RawAgent = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO agents (agent_id, name, model, provider, settings, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (name, model) DO NOTHING",
          rusqlite::params![id_str, name, model, provider, settings, at_str],
        )?;
        Ok(conn.query_row(
          &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE name = ?1 AND model = ?2"),
          rusqlite::params![name, model],
          RawAgent::from_row,
        )?)
      })
      .await?;

    raw.into_agent()
  }

  async fn get_agent(&self, id: Uuid) -> Result<Option<Agent>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE agent_id = ?1"),
              rusqlite::params![id_str],
              RawAgent::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawAgent::into_agent).transpose()
  }

  async fn list_agents(&self) -> Result<Vec<Agent>> {
    let raws: Vec<RawAgent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {AGENT_COLUMNS} FROM agents
           ORDER BY points DESC, matches_won DESC, name ASC"
        ))?;
        let rows = stmt
          .query_map([], RawAgent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAgent::into_agent).collect()
  }

  // ── Matches ───────────────────────────────────────────────────────────────

  async fn create_match(&self, input: NewMatch) -> Result<Match> {
    input.validate()?;

    let m = Match {
      match_id:          Uuid::new_v4(),
      paper_id:          input.paper_id,
      opponent_paper_id: input.opponent_paper_id,
      agent1_id:         input.agent1_id,
      agent2_id:         input.agent2_id,
      judge_id:          input.judge_id,
      status:            MatchStatus::Pending,
      winner_id:         None,
      error:             None,
      created_at:        Utc::now(),
      completed_at:      None,
    };

    let papers: Vec<(Uuid, String)> = std::iter::once(m.paper_id)
      .chain(m.opponent_paper_id)
      .map(|id| (id, encode_uuid(id)))
      .collect();
    let agents: Vec<(Uuid, String)> = [Some(m.agent1_id), Some(m.agent2_id), m.judge_id]
      .into_iter()
      .flatten()
      .map(|id| (id, encode_uuid(id)))
      .collect();

    let match_id_str = encode_uuid(m.match_id);
    let paper_str    = encode_uuid(m.paper_id);
    let opponent_str = m.opponent_paper_id.map(encode_uuid);
    let agent1_str   = encode_uuid(m.agent1_id);
    let agent2_str   = encode_uuid(m.agent2_id);
    let judge_str    = m.judge_id.map(encode_uuid);
    let status_str   = m.status.as_ref().to_owned();
    let at_str       = encode_dt(m.created_at);

    let missing: Option<(&'static str, Uuid)> = self
      .conn
      .call(move |conn| {
        for (id, id_str) in &papers {
          if !exists(conn, "papers", "paper_id", id_str)? {
            return Ok(Some(("paper", *id)));
          }
        }
        for (id, id_str) in &agents {
          if !exists(conn, "agents", "agent_id", id_str)? {
            return Ok(Some(("agent", *id)));
          }
        }
        conn.execute(
          "INSERT INTO matches (
             match_id, paper_id, opponent_paper_id, agent1_id, agent2_id,
             judge_id, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            match_id_str,
            paper_str,
            opponent_str,
            agent1_str,
            agent2_str,
            judge_str,
            status_str,
            at_str,
          ],
        )?;
        Ok(None)
      })
      .await?;

    match missing {
      Some((entity, id)) => Err(Error::NotFound { entity, id }),
      None => Ok(m),
    }
  }

  async fn get_match(&self, id: Uuid) -> Result<Option<Match>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(query_match(conn, &id_str)?))
      .await?;
    raw.map(RawMatch::into_match).transpose()
  }

  async fn list_matches(&self, query: &MatchQuery) -> Result<Vec<Match>> {
    let filter = MatchFilter::new(query);
    let raws = self
      .conn
      .call(move |conn| Ok(filter.select(conn)?))
      .await?;
    raws.into_iter().map(RawMatch::into_match).collect()
  }

  async fn count_matches(&self, query: &MatchQuery) -> Result<u64> {
    let filter = MatchFilter::new(query);
    let n = self
      .conn
      .call(move |conn| Ok(filter.count(conn)?))
      .await?;
    Ok(n.max(0) as u64)
  }

  async fn claim_match(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let claimed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE matches SET status = 'in_progress'
           WHERE match_id = ?1 AND status = 'pending'",
          rusqlite::params![id_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    if !claimed {
      // Distinguish "already claimed" from "no such match".
      self.current_status(id).await?;
    }
    Ok(claimed)
  }

  async fn fail_match(&self, id: Uuid, message: String) -> Result<Match> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let updated = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE matches SET status = 'error', error = ?2, completed_at = ?3
           WHERE match_id = ?1 AND status IN ('pending', 'in_progress')",
          rusqlite::params![id_str, message, at_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    if !updated {
      let from = self.current_status(id).await?;
      return Err(league_core::Error::InvalidTransition { from, to: MatchStatus::Error }.into());
    }
    self.require_match(id).await
  }

  async fn complete_match(
    &self,
    id:         Uuid,
    evaluation: NewEvaluation,
    resolution: Resolution,
  ) -> Result<Match> {
    let match_id_str = encode_uuid(id);
    let eval_id_str  = encode_uuid(Uuid::new_v4());
    let review1_str  = encode_uuid(evaluation.review1_id);
    let review2_str  = encode_uuid(evaluation.review2_id);
    let winner_str   = resolution.winner_id.map(encode_uuid);
    let scores       = encode_scores(&evaluation.scores);
    let reasoning    = evaluation.reasoning;
    let at_str       = encode_dt(Utc::now());
    let results: Vec<(String, MatchResult)> = resolution
      .results
      .iter()
      .map(|(agent, result)| (encode_uuid(*agent), *result))
      .collect();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let status: Option<String> = tx
          .query_row(
            "SELECT status FROM matches WHERE match_id = ?1",
            rusqlite::params![match_id_str],
            |r| r.get(0),
          )
          .optional()?;
        match status.as_deref() {
          None => return Ok(Completion::Missing),
          Some("in_progress") => {}
          Some(other) => return Ok(Completion::WrongStatus(other.to_owned())),
        }

        tx.execute(
          &format!(
            "INSERT INTO evaluations ({EVALUATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
          ),
          rusqlite::params![
            eval_id_str,
            match_id_str,
            review1_str,
            review2_str,
            winner_str,
            scores[0],
            scores[1],
            scores[2],
            scores[3],
            scores[4],
            scores[5],
            scores[6],
            scores[7],
            scores[8],
            scores[9],
            reasoning,
            at_str,
          ],
        )?;

        for (agent_id, result) in &results {
          let (won, drawn, lost, points) = counter_deltas(*result);
          tx.execute(
            "UPDATE agents SET
               matches_played = matches_played + 1,
               matches_won    = matches_won + ?2,
               matches_drawn  = matches_drawn + ?3,
               matches_lost   = matches_lost + ?4,
               points         = points + ?5,
               updated_at     = ?6
             WHERE agent_id = ?1",
            rusqlite::params![agent_id, won, drawn, lost, points, at_str],
          )?;
        }

        tx.execute(
          "UPDATE matches SET status = 'completed', winner_id = ?2, completed_at = ?3
           WHERE match_id = ?1 AND status = 'in_progress'",
          rusqlite::params![match_id_str, winner_str, at_str],
        )?;

        tx.commit()?;
        Ok(Completion::Done)
      })
      .await?;

    match outcome {
      Completion::Done => self.require_match(id).await,
      Completion::Missing => Err(Error::NotFound { entity: "match", id }),
      Completion::WrongStatus(s) => Err(
        league_core::Error::InvalidTransition {
          from: decode_enum(&s)?,
          to:   MatchStatus::Completed,
        }
        .into(),
      ),
    }
  }

  async fn match_records(&self, query: &MatchQuery) -> Result<Vec<MatchRecord>> {
    let filter = MatchFilter::new(query);

    let raws = self
      .conn
      .call(move |conn| {
        let matches = filter.select(conn)?;
        let mut rows = Vec::with_capacity(matches.len());
        for m in matches {
          let reviews = query_reviews(conn, &m.match_id)?;
          let evaluation = query_evaluation(conn, &m.match_id)?;
          rows.push((m, reviews, evaluation));
        }
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(m, reviews, evaluation)| {
        Ok(MatchRecord {
          r#match:    m.into_match()?,
          reviews:    reviews
            .into_iter()
            .map(RawReview::into_review)
            .collect::<Result<_>>()?,
          evaluation: evaluation.map(RawEvaluation::into_evaluation).transpose()?,
        })
      })
      .collect()
  }

  // ── Reviews and evaluations ───────────────────────────────────────────────

  async fn record_review(&self, input: NewReview) -> Result<Review> {
    let review = Review {
      review_id:  Uuid::new_v4(),
      match_id:   input.match_id,
      agent_id:   input.agent_id,
      paper_id:   input.paper_id,
      body:       input.body,
      created_at: Utc::now(),
    };

    let review_id_str = encode_uuid(review.review_id);
    let match_id_str  = encode_uuid(review.match_id);
    let agent_id_str  = encode_uuid(review.agent_id);
    let paper_id_str  = encode_uuid(review.paper_id);
    let summary       = review.body.summary.clone();
    let strengths     = encode_list(&review.body.strengths)?;
    let weaknesses    = encode_list(&review.body.weaknesses)?;
    let questions     = encode_list(&review.body.questions)?;
    let rating        = review.body.rating;
    let confidence    = review.body.confidence.as_ref().to_owned();
    let at_str        = encode_dt(review.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO reviews ({REVIEW_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
          ),
          rusqlite::params![
            review_id_str,
            match_id_str,
            agent_id_str,
            paper_id_str,
            summary,
            strengths,
            weaknesses,
            questions,
            rating,
            confidence,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(review)
  }

  async fn list_reviews(&self, match_id: Uuid) -> Result<Vec<Review>> {
    let id_str = encode_uuid(match_id);
    let raws = self
      .conn
      .call(move |conn| Ok(query_reviews(conn, &id_str)?))
      .await?;
    raws.into_iter().map(RawReview::into_review).collect()
  }

  async fn get_evaluation(&self, match_id: Uuid) -> Result<Option<Evaluation>> {
    let id_str = encode_uuid(match_id);
    let raw = self
      .conn
      .call(move |conn| Ok(query_evaluation(conn, &id_str)?))
      .await?;
    raw.map(RawEvaluation::into_evaluation).transpose()
  }

  // ── Feedback ──────────────────────────────────────────────────────────────

  async fn submit_feedback(&self, input: NewFeedback) -> Result<Feedback> {
    input.validate()?;

    if self.get_match(input.match_id).await?.is_none() {
      return Err(Error::NotFound { entity: "match", id: input.match_id });
    }
    if let Some(review_id) = input.review_id {
      let reviews = self.list_reviews(input.match_id).await?;
      if !reviews.iter().any(|r| r.review_id == review_id) {
        return Err(
          league_core::Error::Validation(format!(
            "review {review_id} does not belong to match {}",
            input.match_id
          ))
          .into(),
        );
      }
    }

    let is_vote_update = input.is_vote_update();
    let new_id_str     = encode_uuid(Uuid::new_v4());
    let match_id_str   = encode_uuid(input.match_id);
    let review_id_str  = input.review_id.map(encode_uuid);
    let author         = input.author;
    let vote           = input.vote.map(|v| v.as_ref().to_owned());
    let comment        = input.comment.map(|c| c.trim().to_owned());
    let at_str         = encode_dt(Utc::now());

    let raw: RawFeedback = self
      .conn
      .call(move |conn| {
        let existing: Option<String> = if is_vote_update {
          conn
            .query_row(
              "SELECT feedback_id FROM feedback
               WHERE match_id = ?1 AND author = ?2
                 AND vote IS NOT NULL AND comment IS NULL",
              rusqlite::params![match_id_str, author],
              |r| r.get(0),
            )
            .optional()?
        } else {
          None
        };

        let id_str = match existing {
          Some(id) => {
            conn.execute(
              "UPDATE feedback SET vote = ?2, review_id = ?3, updated_at = ?4
               WHERE feedback_id = ?1",
              rusqlite::params![id, vote, review_id_str, at_str],
            )?;
            id
          }
          None => {
            conn.execute(
              "INSERT INTO feedback (
                 feedback_id, match_id, review_id, author, vote, comment, created_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
              rusqlite::params![
                new_id_str,
                match_id_str,
                review_id_str,
                author,
                vote,
                comment,
                at_str,
              ],
            )?;
            new_id_str
          }
        };

        Ok(conn.query_row(
          &format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE feedback_id = ?1"),
          rusqlite::params![id_str],
          RawFeedback::from_row,
        )?)
      })
      .await?;

    raw.into_feedback()
  }

  async fn list_feedback(&self, match_id: Uuid) -> Result<Vec<Feedback>> {
    let id_str = encode_uuid(match_id);
    let raws: Vec<RawFeedback> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FEEDBACK_COLUMNS} FROM feedback
           WHERE match_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawFeedback::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawFeedback::into_feedback).collect()
  }

  async fn like_feedback(&self, id: Uuid) -> Result<Option<Feedback>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE feedback SET likes = likes + 1 WHERE feedback_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(query_feedback(conn, &id_str)?)
      })
      .await?;
    raw.map(RawFeedback::into_feedback).transpose()
  }
}
