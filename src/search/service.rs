//! Federated search across every kind

use crate::models::{Case, Question, QuestionSet, Skill};
use crate::search::config::SearchConfig;
use crate::search::error::{Result, SearchError};
use crate::search::metrics::SEARCH_METRICS;
use crate::search::query::{QueryField, QueryParser};
use crate::search::repository::{
    CaseRepository, QuestionRepository, QuestionSetRepository, SkillRepository,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Per-kind result sections of one search
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResult {
    pub questions: Vec<Question>,
    pub question_sets: Vec<QuestionSet>,
    pub cases: Vec<Case>,
    pub skills: Vec<Skill>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
            && self.question_sets.is_empty()
            && self.cases.is_empty()
            && self.skills.is_empty()
    }

    fn place(&mut self, section: Section) {
        match section {
            Section::Questions(items) => self.questions = items,
            Section::QuestionSets(items) => self.question_sets = items,
            Section::Cases(items) => self.cases = items,
            Section::Skills(items) => self.skills = items,
        }
    }
}

/// Output of one fan-out branch
enum Section {
    Questions(Vec<Question>),
    QuestionSets(Vec<QuestionSet>),
    Cases(Vec<Case>),
    Skills(Vec<Skill>),
}

/// Parses an expression and queries every kind in parallel
pub struct SearchService {
    questions: Arc<dyn QuestionRepository>,
    question_sets: Arc<dyn QuestionSetRepository>,
    cases: Arc<dyn CaseRepository>,
    skills: Arc<dyn SkillRepository>,
    max_limit: usize,
    max_result_window: usize,
    timeout: Duration,
}

impl SearchService {
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        question_sets: Arc<dyn QuestionSetRepository>,
        cases: Arc<dyn CaseRepository>,
        skills: Arc<dyn SkillRepository>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            questions,
            question_sets,
            cases,
            skills,
            max_limit: config.max_limit,
            max_result_window: config.max_result_window,
            timeout: config.query_timeout(),
        }
    }

    /// Search every kind, bounded by the configured query timeout
    pub async fn search(&self, expr: &str, offset: usize, limit: usize) -> Result<SearchResult> {
        self.search_within(expr, offset, limit, self.timeout).await
    }

    /// Search every kind, aborting all branches once `deadline` has elapsed
    pub async fn search_within(
        &self,
        expr: &str,
        offset: usize,
        limit: usize,
        deadline: Duration,
    ) -> Result<SearchResult> {
        let started = Instant::now();
        let outcome = self.fan_out(expr, offset, limit, deadline).await;

        let label = match &outcome {
            Ok(result) => {
                SEARCH_METRICS
                    .hits_returned
                    .with_label_values(&["question"])
                    .inc_by(result.questions.len() as f64);
                SEARCH_METRICS
                    .hits_returned
                    .with_label_values(&["question_set"])
                    .inc_by(result.question_sets.len() as f64);
                SEARCH_METRICS
                    .hits_returned
                    .with_label_values(&["case"])
                    .inc_by(result.cases.len() as f64);
                SEARCH_METRICS
                    .hits_returned
                    .with_label_values(&["skill"])
                    .inc_by(result.skills.len() as f64);
                "ok"
            }
            Err(SearchError::Timeout(_)) => "timeout",
            Err(SearchError::InvalidRequest(_)) => "invalid",
            Err(_) => "error",
        };
        SEARCH_METRICS.searches.with_label_values(&[label]).inc();
        SEARCH_METRICS
            .search_latency
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        if let Err(e) = &outcome {
            warn!(expr, offset, limit, error = %e, "Search failed");
        }
        outcome
    }

    async fn fan_out(
        &self,
        expr: &str,
        offset: usize,
        limit: usize,
        deadline: Duration,
    ) -> Result<SearchResult> {
        if limit == 0 || limit > self.max_limit {
            return Err(SearchError::InvalidRequest(format!(
                "limit must be between 1 and {}, got {}",
                self.max_limit, limit
            )));
        }
        match offset.checked_add(limit) {
            Some(window) if window <= self.max_result_window => {}
            _ => {
                return Err(SearchError::InvalidRequest(format!(
                    "offset + limit must not exceed {}, got offset {}",
                    self.max_result_window, offset
                )));
            }
        }

        let parsed = QueryParser::parse(expr);
        debug!(expr, empty = parsed.is_empty(), "Parsed search expression");

        // Dropping the set aborts every branch still running
        let mut branches: JoinSet<Result<Section>> = JoinSet::new();

        let repo = Arc::clone(&self.questions);
        let keywords = parsed.keywords_for(QueryField::Question);
        branches.spawn(async move {
            repo.search_question(offset, limit, &keywords)
                .await
                .map(Section::Questions)
        });

        let repo = Arc::clone(&self.question_sets);
        let keywords = parsed.keywords_for(QueryField::QuestionSet);
        branches.spawn(async move {
            repo.search_question_set(offset, limit, &keywords)
                .await
                .map(Section::QuestionSets)
        });

        let repo = Arc::clone(&self.cases);
        let keywords = parsed.keywords_for(QueryField::Case);
        branches.spawn(async move {
            repo.search_case(offset, limit, &keywords)
                .await
                .map(Section::Cases)
        });

        let repo = Arc::clone(&self.skills);
        let keywords = parsed.keywords_for(QueryField::Skill);
        branches.spawn(async move {
            repo.search_skill(offset, limit, &keywords)
                .await
                .map(Section::Skills)
        });

        let join_all = async {
            let mut result = SearchResult::default();
            while let Some(joined) = branches.join_next().await {
                let section = joined.map_err(|e| SearchError::Branch(e.to_string()))??;
                result.place(section);
            }
            Ok::<_, SearchError>(result)
        };

        match tokio::time::timeout(deadline, join_all).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SearchError::Timeout(deadline.as_millis())),
        }
    }
}
