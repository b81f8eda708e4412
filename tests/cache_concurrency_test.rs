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

// Cache concurrency tests: compile-once, lock-free invocation, trimming

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rowsift::{CacheTrimmer, EvalOptions, Evaluator, MapRow, PredicateCache, Value};

fn rows() -> Vec<MapRow> {
    vec![
        vec![("Age", Value::integer(30)), ("Name", Value::text("Alice"))]
            .into_iter()
            .collect(),
        vec![("Age", Value::integer(25)), ("Name", Value::text("Bob"))]
            .into_iter()
            .collect(),
    ]
}

#[test]
fn test_concurrent_compile_once() {
    let evaluator = Arc::new(Evaluator::new());
    let data = Arc::new(rows());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let evaluator = Arc::clone(&evaluator);
        let data = Arc::clone(&data);
        handles.push(thread::spawn(move || {
            let matching = evaluator
                .evaluate("Age > 25 AND Name LIKE 'A*'", &data, EvalOptions::default())
                .unwrap();
            matching.len()
        }));
    }

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }

    // every caller received a working predicate from exactly one compilation
    assert_eq!(evaluator.cache().compilations(), 1);
}

#[test]
fn test_concurrent_predicate_invocation() {
    let evaluator = Evaluator::new();
    let data = rows();
    let predicate = Arc::new(
        evaluator
            .build("Age > 25", &data, EvalOptions::default())
            .unwrap(),
    );
    let data = Arc::new(data);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let predicate = Arc::clone(&predicate);
        let data = Arc::clone(&data);
        handles.push(thread::spawn(move || {
            for _ in 0..1000 {
                assert!(predicate.matches(&data[0]).unwrap());
                assert!(!predicate.matches(&data[1]).unwrap());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_shared_cache_across_evaluators() {
    let cache = Arc::new(PredicateCache::default_sized());
    let first = Evaluator::with_cache(Arc::clone(&cache));
    let second = Evaluator::with_cache(Arc::clone(&cache));
    let data = rows();

    first
        .evaluate("Age > 25", &data, EvalOptions::default())
        .unwrap();
    second
        .evaluate("Age > 25", &data, EvalOptions::default())
        .unwrap();

    assert_eq!(cache.compilations(), 1);
}

#[test]
fn test_many_distinct_keys_under_contention() {
    let evaluator = Arc::new(Evaluator::new());
    let data = Arc::new(rows());

    let mut handles = Vec::new();
    for t in 0..8 {
        let evaluator = Arc::clone(&evaluator);
        let data = Arc::clone(&data);
        handles.push(thread::spawn(move || {
            for i in 0..20 {
                let expression = format!("Age > {}", (t * 20 + i) % 40);
                evaluator
                    .evaluate(&expression, &data, EvalOptions::default())
                    .unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // 40 distinct expressions at most, each compiled exactly once
    assert!(evaluator.cache().compilations() <= 40);
    assert!(evaluator.cache().len() <= 40);
}

#[test]
fn test_evaluation_proceeds_while_trimmer_runs() {
    let cache = Arc::new(PredicateCache::default_sized());
    let evaluator = Arc::new(Evaluator::with_cache(Arc::clone(&cache)));
    let data = Arc::new(rows());

    let mut trimmer = CacheTrimmer::start(Arc::clone(&cache), Duration::from_millis(1), 0.5);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let evaluator = Arc::clone(&evaluator);
        let data = Arc::clone(&data);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let matching = evaluator
                    .evaluate(&format!("Age > {}", i % 10), &data, EvalOptions::default())
                    .unwrap();
                assert!(matching.len() <= 2);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    trimmer.shutdown();

    // evaluation still works after the trimmer is gone
    let matching = evaluator
        .evaluate("Age > 25", &data, EvalOptions::default())
        .unwrap();
    assert_eq!(matching.len(), 1);
}

#[test]
fn test_compact_then_recompile() {
    let evaluator = Evaluator::new();
    let data = rows();

    evaluator
        .evaluate("Age > 25", &data, EvalOptions::default())
        .unwrap();
    assert_eq!(evaluator.cache().len(), 1);

    let evicted = evaluator.cache().compact(1.0);
    assert_eq!(evicted, 1);
    assert_eq!(evaluator.cache().len(), 0);

    // the key compiles again after eviction
    evaluator
        .evaluate("Age > 25", &data, EvalOptions::default())
        .unwrap();
    assert_eq!(evaluator.cache().compilations(), 2);
}
