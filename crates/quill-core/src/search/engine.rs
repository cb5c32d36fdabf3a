use std::collections::HashSet;
use std::str::FromStr;

use super::query::SearchQuery;
use super::similarity::{JaroWinkler, SimilarityScorer};
use super::tokenizer::{ContentSource, TokenStream};
use crate::authz::PostAuthorizationGuard;
use crate::domain::Post;
use crate::error::DomainError;
use crate::ports::PostRepository;

/// How body and title tokens are compared with the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryMatching {
    /// Each token is scored against the entire query string. A multi-word
    /// query only matches when one token is close to the whole phrase.
    #[default]
    WholeQuery,
    /// Each token is scored against every whitespace-separated query term.
    PerTerm,
}

impl FromStr for QueryMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whole" | "whole-query" => Ok(QueryMatching::WholeQuery),
            "per-term" | "term" => Ok(QueryMatching::PerTerm),
            other => Err(format!("unknown query matching mode: {}", other)),
        }
    }
}

/// Fuzzy search over a post corpus.
///
/// A post matches when one of its body tokens, or failing that one of its
/// title tokens, scores at least [`SearchEngine::MATCH_THRESHOLD`]. The scan
/// of a post stops at the first matching token.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine<S = JaroWinkler> {
    scorer: S,
    matching: QueryMatching,
    guard: PostAuthorizationGuard,
}

impl SearchEngine<JaroWinkler> {
    pub fn new() -> Self {
        Self::with_scorer(JaroWinkler)
    }
}

impl<S: SimilarityScorer> SearchEngine<S> {
    pub const MATCH_THRESHOLD: f64 = 0.9;

    pub fn with_scorer(scorer: S) -> Self {
        Self {
            scorer,
            matching: QueryMatching::default(),
            guard: PostAuthorizationGuard,
        }
    }

    pub fn with_matching(mut self, matching: QueryMatching) -> Self {
        self.matching = matching;
        self
    }

    pub fn matching(&self) -> QueryMatching {
        self.matching
    }

    /// Run `query` against a fresh snapshot of the store.
    ///
    /// Store failures are returned as-is; there are no partial results.
    pub async fn search<R>(
        &self,
        query: &SearchQuery,
        store: &R,
        source: ContentSource,
    ) -> Result<Vec<Post>, DomainError>
    where
        R: PostRepository + ?Sized,
    {
        let corpus = store.find_all().await?;
        Ok(self.filter(query, corpus, source))
    }

    /// Matching searchable posts in corpus order, each id at most once.
    pub fn filter(&self, query: &SearchQuery, corpus: Vec<Post>, source: ContentSource) -> Vec<Post> {
        let mut seen = HashSet::new();
        corpus
            .into_iter()
            .filter(|post| self.guard.is_searchable(post))
            .filter(|post| self.is_match(query, post, source))
            .filter(|post| seen.insert(post.id))
            .collect()
    }

    /// Match decision for a single post. Ignores publish state.
    pub fn is_match(&self, query: &SearchQuery, post: &Post, source: ContentSource) -> bool {
        let body = source.text(post);
        self.any_token_matches(query, TokenStream::new(&body))
            || self.any_token_matches(query, TokenStream::new(&post.title))
    }

    fn any_token_matches(&self, query: &SearchQuery, tokens: TokenStream<'_>) -> bool {
        tokens
            .into_iter()
            .any(|token| self.token_matches(query, token))
    }

    fn token_matches(&self, query: &SearchQuery, token: &str) -> bool {
        match self.matching {
            QueryMatching::WholeQuery => {
                self.scorer.score(token, query.as_str()) >= Self::MATCH_THRESHOLD
            }
            QueryMatching::PerTerm => query
                .terms()
                .any(|term| self.scorer.score(token, term) >= Self::MATCH_THRESHOLD),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::RepoError;
    use crate::testing::{InMemoryPosts, post};

    fn hello_world(published: bool) -> Post {
        let mut post = post(1, 7, "Hello World", "testing search");
        post.published = published;
        post
    }

    async fn run(engine: &SearchEngine, store: &InMemoryPosts, raw: &str) -> Vec<Post> {
        let query = SearchQuery::parse(raw).unwrap();
        engine
            .search(&query, store, ContentSource::Rendered)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_typos_match_per_term() {
        let store = InMemoryPosts::with(vec![hello_world(true)]);
        let engine = SearchEngine::new().with_matching(QueryMatching::PerTerm);

        let found = run(&engine, &store, "Helo Wrold").await;
        assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_whole_query_does_not_split_phrase() {
        let store = InMemoryPosts::with(vec![hello_world(true)]);
        let engine = SearchEngine::new();
        assert_eq!(engine.matching(), QueryMatching::WholeQuery);

        assert!(run(&engine, &store, "Helo Wrold").await.is_empty());
        assert_eq!(run(&engine, &store, "Helo").await.len(), 1);
    }

    #[tokio::test]
    async fn test_unrelated_query_returns_empty() {
        let store = InMemoryPosts::with(vec![hello_world(true)]);
        for engine in [
            SearchEngine::new(),
            SearchEngine::new().with_matching(QueryMatching::PerTerm),
        ] {
            assert!(run(&engine, &store, "zebra").await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unpublished_posts_never_returned() {
        let store = InMemoryPosts::with(vec![hello_world(false)]);
        let engine = SearchEngine::new();

        assert!(run(&engine, &store, "Hello").await.is_empty());
        assert!(run(&engine, &store, "testing").await.is_empty());
    }

    #[tokio::test]
    async fn test_title_and_body_match_returns_post_once() {
        let mut both = post(3, 7, "search", "search search");
        both.published = true;
        let store = InMemoryPosts::with(vec![both]);

        let found = run(&SearchEngine::new(), &store, "search").await;
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_snapshot_entries_deduplicated() {
        let published = hello_world(true);
        let store = InMemoryPosts::with(vec![published.clone(), published]);

        let found = run(&SearchEngine::new(), &store, "Hello").await;
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_results_follow_corpus_order_and_repeat() {
        let mut posts = Vec::new();
        for id in [5, 2, 9] {
            let mut p = post(id, 1, &format!("rust notes {}", id), "borrow checker");
            p.published = true;
            posts.push(p);
        }
        let store = InMemoryPosts::with(posts);
        let engine = SearchEngine::new();

        let first = run(&engine, &store, "checker").await;
        let second = run(&engine, &store, "checker").await;
        assert_eq!(first.iter().map(|p| p.id).collect::<Vec<_>>(), vec![5, 2, 9]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let store = InMemoryPosts::failing("down");
        let query = SearchQuery::parse("hello").unwrap();

        let err = SearchEngine::new()
            .search(&query, &store, ContentSource::Rendered)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Store(RepoError::Connection(_))));
    }

    #[test]
    fn test_markdown_source_searches_raw_text() {
        let mut p = post(4, 1, "Notes", "<p>rendered</p>");
        p.markdown = Some("ownership".to_string());
        p.published = true;
        let engine = SearchEngine::new();
        let query = SearchQuery::parse("ownership").unwrap();

        assert!(engine.is_match(&query, &p, ContentSource::Markdown));
        assert!(!engine.is_match(&query, &p, ContentSource::Rendered));
    }

    struct Counting<'a>(&'a AtomicUsize);

    impl SimilarityScorer for Counting<'_> {
        fn score(&self, a: &str, b: &str) -> f64 {
            self.0.fetch_add(1, Ordering::SeqCst);
            JaroWinkler.score(a, b)
        }
    }

    #[test]
    fn test_scan_stops_at_first_matching_token() {
        let calls = AtomicUsize::new(0);
        let engine = SearchEngine::with_scorer(Counting(&calls));
        let mut p = post(1, 1, "title words here", "match then many more tokens");
        p.published = true;
        let query = SearchQuery::parse("match").unwrap();

        assert!(engine.is_match(&query, &p, ContentSource::Rendered));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_query_matching_from_str() {
        assert_eq!("whole".parse::<QueryMatching>(), Ok(QueryMatching::WholeQuery));
        assert_eq!("Per-Term".parse::<QueryMatching>(), Ok(QueryMatching::PerTerm));
        assert!("fuzzy".parse::<QueryMatching>().is_err());
    }
}
