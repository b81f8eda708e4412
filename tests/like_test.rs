// Copyright 2025 Rowsift Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// LIKE wildcard anchoring and placement tests

use rowsift::engine::like;
use rowsift::{EvalOptions, Evaluator, MapRow, Value};

#[test]
fn test_wildcard_anchoring_table() {
    assert!(like(Some("Alice"), Some("A*")));
    assert!(like(Some("Alice"), Some("*e")));
    assert!(like(Some("Alice"), Some("*lic*")));
    // illegal middle wildcard: unconditionally unmatchable
    assert!(!like(Some("Alice"), Some("A*e")));
    assert!(like(Some("Alice"), Some("A?ice")));
    assert!(!like(None, Some("*")));
}

#[test]
fn test_percent_is_equivalent_to_star() {
    assert!(like(Some("Alice"), Some("A%")));
    assert!(like(Some("Alice"), Some("%e")));
    assert!(like(Some("Alice"), Some("%lic%")));
    assert!(!like(Some("Alice"), Some("A%e")));
}

#[test]
fn test_case_insensitive_matching() {
    assert!(like(Some("ALICE"), Some("a*")));
    assert!(like(Some("alice"), Some("*E")));
    assert!(like(Some("Alice"), Some("alice")));
}

#[test]
fn test_exact_and_empty_patterns() {
    assert!(like(Some("Alice"), Some("Alice")));
    assert!(!like(Some("Alice"), Some("Alic")));
    assert!(like(Some(""), Some("")));
    assert!(!like(Some("x"), Some("")));
    assert!(like(Some(""), Some("*")));
}

#[test]
fn test_single_char_wildcard() {
    assert!(like(Some("cat"), Some("c?t")));
    assert!(!like(Some("coat"), Some("c?t")));
    assert!(like(Some("cat"), Some("???")));
    assert!(!like(Some("cats"), Some("???")));
    // '?' may neighbor run wildcards at the edges
    assert!(like(Some("cats"), Some("?at*")));
}

#[test]
fn test_null_never_matches() {
    assert!(!like(None, Some("anything")));
    assert!(!like(Some("anything"), None));
    assert!(!like(None, None));
}

#[test]
fn test_interior_wildcard_allowed_when_edge_anchored() {
    // the placement rule only fires when the first wildcard is not at the
    // start AND the last is not at the end
    assert!(like(Some("xayb"), Some("*a*b")));
    assert!(like(Some("aXbY"), Some("a*b*")));
    assert!(!like(Some("aXbY"), Some("a*b")));
}

#[test]
fn test_like_in_expressions() {
    let evaluator = Evaluator::new();
    let rows: Vec<MapRow> = vec![
        vec![("Name", Value::text("Alice"))].into_iter().collect(),
        vec![("Name", Value::text("Bob"))].into_iter().collect(),
        vec![("Name", Value::null_unknown())].into_iter().collect(),
    ];
    let options = EvalOptions::default();

    let matching = evaluator
        .evaluate("Name LIKE 'A*'", &rows, options)
        .unwrap();
    assert_eq!(matching.len(), 1);

    // NULL cells never match LIKE
    let matching = evaluator.evaluate("Name LIKE '*'", &rows, options).unwrap();
    assert_eq!(matching.len(), 2);

    // NOT LIKE wraps the match result
    let matching = evaluator
        .evaluate("Name NOT LIKE 'A*'", &rows, options)
        .unwrap();
    assert_eq!(matching.len(), 2);
}

#[test]
fn test_like_coerces_non_string_values() {
    let evaluator = Evaluator::new();
    let rows: Vec<MapRow> = vec![
        vec![("Code", Value::integer(1042))].into_iter().collect(),
        vec![("Code", Value::integer(2042))].into_iter().collect(),
    ];

    let matching = evaluator
        .evaluate("Code LIKE '10*'", &rows, EvalOptions::default())
        .unwrap();
    assert_eq!(matching.len(), 1);
}

#[test]
fn test_pattern_cache_grows_per_distinct_pattern() {
    let cache = rowsift::PatternCache::new();
    cache.get_or_compile("a*");
    cache.get_or_compile("a*");
    cache.get_or_compile("b*");
    assert_eq!(cache.size(), 2);
}
