/*
 * Copyright 2024 Vijaykumar Singh
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Scalar distance computation for the in-memory store
//!
//! - Inner product (similarity)
//! - Cosine similarity
//! - Squared Euclidean distance (L2, as reported by the store)
//! - Hamming and Jaccard distance over packed binary vectors

use std::cmp::Ordering;

use super::index::MetricType;
use super::QueryVector;
use crate::schema::FieldValue;

pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0f32;

    // Manual loop unrolling
    let len = a.len().min(b.len());
    let chunks = len / 4;
    for i in 0..chunks {
        let base = i * 4;
        sum += a[base] * b[base];
        sum += a[base + 1] * b[base + 1];
        sum += a[base + 2] * b[base + 2];
        sum += a[base + 3] * b[base + 3];
    }
    for i in (chunks * 4)..len {
        sum += a[i] * b[i];
    }
    sum
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot_product(a, a);
    let norm_b = dot_product(b, b);
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product(a, b) / (norm_a.sqrt() * norm_b.sqrt())
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

pub fn hamming(a: &[u8], b: &[u8]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x ^ y).count_ones())
        .sum::<u32>() as f32
}

pub fn jaccard(a: &[u8], b: &[u8]) -> f32 {
    let (mut both, mut either) = (0u32, 0u32);
    for (x, y) in a.iter().zip(b) {
        both += (x & y).count_ones();
        either += (x | y).count_ones();
    }
    if either == 0 {
        0.0
    } else {
        1.0 - both as f32 / either as f32
    }
}

/// Score of a stored vector against a query; `None` when the kinds do not pair up
pub fn score(metric: MetricType, query: &QueryVector, stored: &FieldValue) -> Option<f32> {
    match (metric, query, stored) {
        (MetricType::InnerProduct, QueryVector::Float(q), FieldValue::FloatVector(v)) => {
            Some(dot_product(q, v))
        }
        (MetricType::Cosine, QueryVector::Float(q), FieldValue::FloatVector(v)) => {
            Some(cosine_similarity(q, v))
        }
        (MetricType::L2, QueryVector::Float(q), FieldValue::FloatVector(v)) => Some(squared_l2(q, v)),
        (MetricType::Hamming, QueryVector::Binary(q), FieldValue::BinaryVector(v)) => {
            Some(hamming(q, v))
        }
        (MetricType::Jaccard, QueryVector::Binary(q), FieldValue::BinaryVector(v)) => {
            Some(jaccard(q, v))
        }
        _ => None,
    }
}

/// Ordering that puts the better of two scores first
pub fn rank(metric: MetricType, a: f32, b: f32) -> Ordering {
    if metric.is_similarity() {
        b.total_cmp(&a)
    } else {
        a.total_cmp(&b)
    }
}
