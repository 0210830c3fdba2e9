//! Search Module Tests
//!
//! Validates the ranking pipeline end to end, from tokenization to the
//! orchestrator's fallback rules.
//!
//! ## Test Scopes
//! - **Tokenizer**: lower-casing, non-word splitting, empty-token removal.
//! - **Lexical filter**: substring containment and widening.
//! - **Model**: vocabulary encoding, weight loading, inference range.
//! - **Orchestrator**: date gate, ML ordering, stable ties, fallback.

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::events::types::Event;
    use crate::search::engine::search;
    use crate::search::filter::{filter_candidates, matches};
    use crate::search::model::{
        HIDDEN_WIDTHS, RawWeights, RelevanceModel, RelevanceNetwork, VOCAB_FILE, Vocabulary,
        WEIGHTS_FILE,
    };
    use crate::search::tokenizer::tokenize;
    use crate::search::types::{FALLBACK_RELEVANCE, SearchMethod};
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;

    fn event(id: &str, days: i64, name: &str, description: &str, skills: &[&str]) -> Event {
        Event {
            id: id.to_string(),
            name: name.to_string(),
            date: Utc::now() + Duration::days(days),
            location: "Mumbai".to_string(),
            description: description.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            source: "Manual".to_string(),
            external_id: None,
            volunteers: vec![],
        }
    }

    fn vocabulary(tokens: &[&str]) -> Vocabulary {
        let map: HashMap<String, usize> = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();
        Vocabulary::from_map(map).unwrap()
    }

    fn zero_weights(vocab_size: usize) -> RawWeights {
        let [h1, h2] = HIDDEN_WIDTHS;
        (
            vec![vec![0.0; h1]; vocab_size * 2],
            vec![0.0; h1],
            vec![vec![0.0; h2]; h1],
            vec![0.0; h2],
            vec![vec![0.0; 1]; h2],
            vec![0.0; 1],
        )
    }

    /// Scores sigmoid(2 * overlap - 1), where overlap counts vocabulary
    /// tokens present in both the query and the event.
    fn overlap_weights(vocab_size: usize) -> RawWeights {
        let (mut w1, mut b1, mut w2, b2, mut w3, mut b3) = zero_weights(vocab_size);
        for slot in 0..vocab_size {
            w1[slot][slot] = 1.0;
            w1[vocab_size + slot][slot] = 1.0;
            b1[slot] = -1.0;
            w2[slot][0] = 1.0;
        }
        w3[0][0] = 2.0;
        b3[0] = -1.0;
        (w1, b1, w2, b2, w3, b3)
    }

    fn overlap_model(tokens: &[&str]) -> RelevanceModel {
        let network =
            RelevanceNetwork::from_parts(vocabulary(tokens), overlap_weights(tokens.len())).unwrap();
        RelevanceModel::Loaded(network)
    }

    fn ids(events: &[crate::search::types::ScoredEvent]) -> Vec<String> {
        events.iter().map(|r| r.event.id.clone()).collect()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================================
    // TOKENIZER TESTS
    // ============================================================

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Beach Cleanup-Drive, 2025!"),
            vec!["beach", "cleanup", "drive", "2025"]
        );
    }

    #[test]
    fn test_tokenize_keeps_underscores_and_drops_empty() {
        assert_eq!(tokenize("  first_aid  ...  "), vec!["first_aid"]);
        assert!(tokenize("!!! ---").is_empty());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_treats_non_ascii_as_separator() {
        assert_eq!(tokenize("café day"), vec!["caf", "day"]);
    }

    // ============================================================
    // LEXICAL FILTER TESTS
    // ============================================================

    #[test]
    fn test_filter_substring_containment() {
        let e = event("e1", 1, "Saturday Drive", "Beach Cleanup Drive", &[]);
        assert!(matches(&tokenize("cleanup"), &e));
        assert!(matches(&tokenize("clean"), &e));
        assert!(matches(&tokenize("CLEANUP"), &e));
    }

    #[test]
    fn test_filter_matches_any_field() {
        let e = event("e1", 1, "Food Bank", "Sort donations", &["Logistics"]);
        assert!(matches(&tokenize("logistics"), &e));
        assert!(matches(&tokenize("mumbai"), &e));
        assert!(matches(&tokenize("bank"), &e));
        assert!(!matches(&tokenize("coding"), &e));
    }

    #[test]
    fn test_filter_any_token_is_enough() {
        let e = event("e1", 1, "Tutoring", "Teach kids maths", &[]);
        assert!(matches(&tokenize("painting maths"), &e));
    }

    #[test]
    fn test_filter_preserves_candidate_order() {
        let candidates = vec![
            event("b", 2, "Beach day", "", &[]),
            event("x", 1, "Office", "Admin", &[]),
            event("a", 3, "beach cleanup", "", &[]),
        ];

        let outcome = filter_candidates("beach", candidates);
        assert!(!outcome.widened);
        let kept: Vec<&str> = outcome.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(kept, vec!["b", "a"]);
    }

    #[test]
    fn test_filter_widens_when_nothing_matches() {
        let candidates = vec![
            event("a", 1, "Tree planting", "", &[]),
            event("b", 2, "Blood drive", "", &[]),
        ];

        let outcome = filter_candidates("astronomy", candidates);
        assert!(outcome.widened);
        assert_eq!(outcome.events.len(), 2);
    }

    // ============================================================
    // MODEL TESTS
    // ============================================================

    #[test]
    fn test_vocabulary_encoding_drops_oov() {
        let vocab = vocabulary(&["beach", "cleanup", "teach"]);
        assert_eq!(vocab.encode("Beach party cleanup"), vec![1.0, 1.0, 0.0]);
        assert_eq!(vocab.encode("nothing here"), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_vocabulary_rejects_out_of_range_slot() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), 0);
        map.insert("b".to_string(), 5);
        assert!(Vocabulary::from_map(map).is_err());
    }

    #[test]
    fn test_vocabulary_rejects_duplicate_slot() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), 1);
        map.insert("b".to_string(), 1);
        assert!(Vocabulary::from_map(map).is_err());
    }

    #[test]
    fn test_network_scores_are_probabilities() {
        let tokens = ["beach", "cleanup", "teach", "kids"];
        let network =
            RelevanceNetwork::from_parts(vocabulary(&tokens), overlap_weights(tokens.len()))
                .unwrap();

        let none = network.score("beach cleanup", "teach kids").unwrap();
        let one = network.score("beach cleanup", "beach party").unwrap();
        let two = network.score("beach cleanup", "beach cleanup").unwrap();

        for score in [none, one, two] {
            assert!((0.0..=1.0).contains(&score));
        }
        assert!(none < one && one < two);
        assert!((none - 0.268_941_4).abs() < 1e-4);
    }

    #[test]
    fn test_network_rejects_shape_mismatch() {
        let vocab = vocabulary(&["a", "b"]);
        // Kernel sized for a 3-token vocabulary.
        let result = RelevanceNetwork::from_parts(vocab, zero_weights(3));
        assert!(matches!(result, Err(AppError::DependencyUnavailable(_))));
    }

    #[test]
    fn test_model_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let tokens = ["beach", "cleanup"];
        let vocab: HashMap<&str, usize> = tokens.iter().enumerate().map(|(i, t)| (*t, i)).collect();

        std::fs::write(dir.path().join(VOCAB_FILE), serde_json::to_string(&vocab).unwrap())
            .unwrap();
        std::fs::write(
            dir.path().join(WEIGHTS_FILE),
            serde_json::to_string(&overlap_weights(tokens.len())).unwrap(),
        )
        .unwrap();

        let model = RelevanceModel::load(dir.path());
        assert!(model.is_loaded());
    }

    #[test]
    fn test_model_load_missing_files_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let model = RelevanceModel::load(dir.path());

        match model {
            RelevanceModel::Unavailable { reason } => assert!(reason.contains(VOCAB_FILE)),
            RelevanceModel::Loaded(_) => panic!("model should not load from an empty directory"),
        }
    }

    #[test]
    fn test_model_load_shape_mismatch_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let vocab: HashMap<&str, usize> = [("beach", 0), ("cleanup", 1)].into_iter().collect();

        std::fs::write(dir.path().join(VOCAB_FILE), serde_json::to_string(&vocab).unwrap())
            .unwrap();
        std::fs::write(
            dir.path().join(WEIGHTS_FILE),
            serde_json::to_string(&zero_weights(100)).unwrap(),
        )
        .unwrap();

        assert!(!RelevanceModel::load(dir.path()).is_loaded());
    }

    // ============================================================
    // ORCHESTRATOR TESTS
    // ============================================================

    #[test]
    fn test_empty_query_is_rejected() {
        let model = RelevanceModel::unavailable("test");
        let err = search("   ", vec![event("a", 1, "x", "y", &[])], now(), &model).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_past_events_never_returned() {
        let model = RelevanceModel::unavailable("test");
        let candidates = vec![
            event("past", -2, "Beach cleanup", "", &[]),
            event("future", 2, "Library", "Sort books", &[]),
        ];

        let response = search("beach", candidates, now(), &model).unwrap();
        // The only lexical match is in the past, so the pool widens to "future".
        assert_eq!(ids(&response.results), vec!["future"]);
    }

    #[test]
    fn test_no_future_events_yields_empty_results() {
        let model = RelevanceModel::unavailable("test");
        let candidates = vec![event("past", -1, "Beach", "", &[])];

        let response = search("beach", candidates, now(), &model).unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_fallback_sorts_by_date_with_fixed_relevance() {
        let model = RelevanceModel::unavailable("no weights");
        let candidates = vec![
            event("late", 9, "Beach cleanup", "", &[]),
            event("early", 1, "Beach walk", "", &[]),
            event("mid", 4, "beach yoga", "", &[]),
            event("other", 2, "Office", "", &[]),
        ];

        let response = search("beach", candidates, now(), &model).unwrap();

        assert_eq!(response.method, SearchMethod::Filter);
        assert_eq!(ids(&response.results), vec!["early", "mid", "late"]);
        assert!(
            response
                .results
                .iter()
                .all(|r| (r.relevance - FALLBACK_RELEVANCE).abs() < f32::EPSILON)
        );
    }

    #[test]
    fn test_model_ranks_by_descending_score() {
        let model = overlap_model(&["beach", "cleanup", "teach", "kids"]);
        let candidates = vec![
            event("one", 1, "Beach walk", "walk on the beach", &[]),
            event("two", 2, "Beach day", "beach cleanup", &["cleanup"]),
            event("zero", 3, "Beach tutoring", "teach kids", &[]),
        ];

        let response = search("beach cleanup", candidates, now(), &model).unwrap();

        assert_eq!(response.method, SearchMethod::FilterMl);
        assert_eq!(ids(&response.results), vec!["two", "one", "zero"]);
        let scores: Vec<f32> = response.results.iter().map(|r| r.relevance).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_model_ties_keep_filter_order() {
        let tokens = ["alpha", "beta"];
        let network =
            RelevanceNetwork::from_parts(vocabulary(&tokens), zero_weights(tokens.len())).unwrap();
        let model = RelevanceModel::Loaded(network);

        // Every score is sigmoid(0) = 0.5, so the filter-stage order must survive.
        let candidates = vec![
            event("c", 5, "garden", "", &[]),
            event("a", 1, "garden", "", &[]),
            event("b", 3, "garden", "", &[]),
        ];

        let response = search("garden", candidates, now(), &model).unwrap();
        assert_eq!(response.method, SearchMethod::FilterMl);
        assert_eq!(ids(&response.results), vec!["c", "a", "b"]);
        assert!(response.results.iter().all(|r| (r.relevance - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_inference_failure_falls_back_to_filter() {
        let tokens = ["beach"];
        let (w1, b1, w2, b2, w3, _) = zero_weights(tokens.len());
        let poisoned = (w1, b1, w2, b2, w3, vec![f32::NAN]);
        let network = RelevanceNetwork::from_parts(vocabulary(&tokens), poisoned).unwrap();
        let model = RelevanceModel::Loaded(network);

        let candidates = vec![
            event("b", 4, "beach", "", &[]),
            event("a", 2, "beach", "", &[]),
        ];

        let response = search("beach", candidates, now(), &model).unwrap();
        assert_eq!(response.method, SearchMethod::Filter);
        assert_eq!(ids(&response.results), vec!["a", "b"]);
        assert!(response.results.iter().all(|r| r.relevance == FALLBACK_RELEVANCE));
    }

    #[test]
    fn test_results_never_empty_with_future_pool() {
        let model = overlap_model(&["beach"]);
        let candidates = vec![event("a", 1, "Knitting circle", "", &[])];

        for query in ["beach", "zzz", "??? knit"] {
            let response = search(query, candidates.clone(), now(), &model).unwrap();
            assert_eq!(response.results.len(), 1, "query {:?}", query);
        }
    }

    #[tokio::test]
    async fn test_panicked_search_task_is_internal_error() {
        let failed = tokio::task::spawn_blocking(|| -> Vec<Event> { panic!("ranking blew up") })
            .await
            .unwrap_err();

        let err = crate::search::handlers::search_task_failed(failed);
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(err.to_string().starts_with("internal error: search task failed"));
    }

    // ============================================================
    // SERIALIZATION TESTS
    // ============================================================

    #[test]
    fn test_response_shape() {
        let model = RelevanceModel::unavailable("test");
        let response = search("beach", vec![event("a", 1, "Beach", "", &[])], now(), &model).unwrap();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["method"], "filter");
        assert_eq!(json["results"][0]["id"], "a");
        assert_eq!(json["results"][0]["name"], "Beach");
        assert!((json["results"][0]["relevance"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&SearchMethod::FilterMl).unwrap(),
            "\"filter+ml\""
        );
        assert_eq!(serde_json::to_string(&SearchMethod::Filter).unwrap(), "\"filter\"");
    }
}
