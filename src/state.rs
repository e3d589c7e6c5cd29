//! Application state: curriculum, generator, issued problems and learner stores.
//!
//! This module owns:
//!   - the chapter catalog (built-in plus TOML extras)
//!   - the shared random generator (seeded from config, or from entropy)
//!   - issued problems by id, bounded; the oldest are evicted first
//!   - the wrong-answer notebook and the progress book

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use chrono::{DateTime, NaiveDate, Utc};
use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_app_config_from_env, AppConfig};
use crate::curriculum::{canonical_chapter_id, catalog, chapters_for, lookup_chapter, CurriculumChapter};
use crate::domain::{Problem, WrongProblem};
use crate::store::{ProgressBook, ProgressInput, ProgressRecord, SortBy, Streak, WrongInput, WrongNotes};

/// A problem handed to a client, kept until answered or evicted.
#[derive(Clone, Debug)]
pub struct IssuedProblem {
    pub problem: Problem,
    /// Level of the chapter it was drawn for, if any.
    pub chapter_level: Option<u8>,
}

#[derive(Debug)]
pub struct IssuedProblems {
    by_id: HashMap<String, IssuedProblem>,
    order: VecDeque<String>,
    capacity: usize,
}

impl IssuedProblems {
    pub fn new(capacity: usize) -> Self {
        Self { by_id: HashMap::new(), order: VecDeque::new(), capacity: capacity.max(1) }
    }

    pub fn insert(&mut self, id: String, issued: IssuedProblem) {
        while self.order.len() >= self.capacity {
            match self.order.pop_front() {
                Some(old) => {
                    self.by_id.remove(&old);
                }
                None => break,
            }
        }
        self.order.push_back(id.clone());
        self.by_id.insert(id, issued);
    }

    pub fn get(&self, id: &str) -> Option<&IssuedProblem> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub chapters: Arc<Vec<CurriculumChapter>>,
    pub rng: Arc<Mutex<StdRng>>,
    pub issued: Arc<RwLock<IssuedProblems>>,
    pub wrong_notes: Arc<RwLock<WrongNotes>>,
    pub progress: Arc<RwLock<ProgressBook>>,
}

impl AppState {
    /// Build state from env: load config, merge chapters, seed the generator.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        Self::from_config(load_app_config_from_env().unwrap_or_default())
    }

    pub fn from_config(cfg: AppConfig) -> Self {
        let mut chapters = catalog();
        for extra in cfg.chapters.into_iter().filter_map(|c| c.into_chapter()) {
            let id = canonical_chapter_id(&extra.id);
            if chapters.iter().any(|c| c.id == extra.id || c.id == id) {
                warn!(target: "mathez_backend", id = %extra.id, "Config chapter clashes with an existing id; skipped");
                continue;
            }
            chapters.push(extra);
        }

        let rng = match cfg.rng_seed {
            Some(seed) => {
                info!(target: "mathez_backend", seed, "Deterministic problem generator");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        info!(target: "mathez_backend", chapters = chapters.len(), issued_capacity = cfg.issued_capacity, "State ready");

        Self {
            chapters: Arc::new(chapters),
            rng: Arc::new(Mutex::new(rng)),
            issued: Arc::new(RwLock::new(IssuedProblems::new(cfg.issued_capacity))),
            wrong_notes: Arc::new(RwLock::new(WrongNotes::default())),
            progress: Arc::new(RwLock::new(ProgressBook::default())),
        }
    }

    /// Run `f` with exclusive access to the shared generator.
    pub async fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().await;
        f(&mut rng)
    }

    pub fn chapter(&self, id: &str) -> Option<CurriculumChapter> {
        lookup_chapter(&self.chapters, id).cloned()
    }

    pub fn chapters_for(&self, grade: Option<u8>, semester: Option<u8>) -> Vec<CurriculumChapter> {
        chapters_for(&self.chapters, grade, semester)
    }

    /// Store a problem for later answer checking; returns its id.
    #[instrument(level = "debug", skip(self, problem), fields(operator = %problem.operator, level = problem.level))]
    pub async fn issue(&self, problem: Problem, chapter_level: Option<u8>) -> String {
        let id = Uuid::new_v4().to_string();
        self.issued.write().await.insert(id.clone(), IssuedProblem { problem, chapter_level });
        debug!(target: "problem", %id, "Issued problem");
        id
    }

    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_issued(&self, id: &str) -> Option<IssuedProblem> {
        self.issued.read().await.get(id).cloned()
    }

    #[instrument(level = "debug", skip(self, input))]
    pub async fn save_wrong(&self, input: WrongInput, now: DateTime<Utc>) -> Option<WrongProblem> {
        self.wrong_notes.write().await.save(input, now)
    }

    pub async fn list_wrong(&self, sort_by: SortBy) -> Vec<WrongProblem> {
        self.wrong_notes.read().await.list(sort_by)
    }

    pub async fn get_wrong(&self, id: &str) -> Option<WrongProblem> {
        self.wrong_notes.read().await.get(id).cloned()
    }

    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn remove_wrong(&self, id: &str) -> bool {
        self.wrong_notes.write().await.remove(id)
    }

    #[instrument(level = "debug", skip(self, input), fields(chapter_id = %input.chapter_id))]
    pub async fn save_progress(&self, input: ProgressInput, now: DateTime<Utc>) -> Option<ProgressRecord> {
        self.progress.write().await.save(input, now)
    }

    pub async fn progress_map(&self) -> std::collections::BTreeMap<String, ProgressRecord> {
        self.progress.read().await.map()
    }

    pub async fn clear_progress(&self) {
        self.progress.write().await.clear();
    }

    pub async fn streak(&self, today: NaiveDate) -> Streak {
        self.progress.read().await.streak(today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChapterCfg;
    use crate::domain::Operator;

    fn problem(n: f64) -> Problem {
        Problem {
            num1: n,
            num2: 1.0,
            operator: Operator::Add,
            answer: n + 1.0,
            level: 1,
            topic: String::new(),
            chapter_id: String::new(),
            chapter_title: String::new(),
            seed: "0".into(),
            visual: None,
        }
    }

    #[test]
    fn issued_problems_evict_oldest() {
        let mut issued = IssuedProblems::new(2);
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            issued.insert(id.to_string(), IssuedProblem { problem: problem(i as f64), chapter_level: None });
        }
        assert_eq!(issued.len(), 2);
        assert!(issued.get("a").is_none());
        assert_eq!(issued.get("c").map(|p| p.problem.num1), Some(2.0));
    }

    #[test]
    fn config_chapters_extend_but_never_replace_catalog() {
        let extra = |id: &str, title: &str| ChapterCfg {
            id: id.into(),
            grade: 3,
            semester: 2,
            level: 3,
            topic: "multiplication".into(),
            title: title.into(),
            emoji: String::new(),
            operations: vec!["*".into()],
            question_count: 5,
            description: String::new(),
        };
        let cfg = AppConfig {
            rng_seed: Some(1),
            issued_capacity: 4,
            chapters: vec![
                extra("c16-review", "복습"),
                extra("c14-circle", "원 (개정)"),
                extra("c01-add-basics", "hijack"),
                extra("c16-review", "중복"),
            ],
        };
        let builtin = |id: &str| catalog().into_iter().find(|c| c.id == id).map(|c| c.title);
        let state = AppState::from_config(cfg);
        assert_eq!(state.chapters.len(), 16);
        assert_eq!(state.chapter("c16-review").map(|c| c.title), Some("복습".to_string()));
        assert_eq!(state.chapter("c14-circle").map(|c| c.title), builtin("c14-circle"));
        assert_eq!(state.chapter("c01-number-basics").map(|c| c.title), builtin("c01-number-basics"));
    }

    #[tokio::test]
    async fn seeded_generators_agree() {
        let cfg = || AppConfig { rng_seed: Some(7), ..AppConfig::default() };
        let (a, b) = (AppState::from_config(cfg()), AppState::from_config(cfg()));
        let x: u64 = a.with_rng(|r| rand::Rng::gen(r)).await;
        let y: u64 = b.with_rng(|r| rand::Rng::gen(r)).await;
        assert_eq!(x, y);
    }
}
