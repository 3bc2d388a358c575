//! Latent Semantic Analysis sentence ranking
//!
//! Builds a term/sentence matrix, takes its leading singular triplets and ranks each
//! sentence by the length of its vector in the reduced topic space
//! (Steinberger & Ježek). Everything is deterministic: the power iteration starts from
//! a fixed vector and runs sequentially.

use ndarray::{Array1, Array2, Axis};
use std::collections::BTreeMap;

use super::resources::LanguageResources;

/// Tuning for the ranking.
#[derive(Debug, Clone)]
pub struct LsaConfig {
    /// Lower bound on the number of topics kept.
    pub min_dimensions: usize,
    /// Term-frequency smoothing, `smooth + (1 - smooth) * tf / max_tf`.
    pub smoothing: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for LsaConfig {
    fn default() -> Self {
        Self {
            min_dimensions: 3,
            smoothing: 0.4,
            max_iterations: 500,
            tolerance: 1e-10,
        }
    }
}

pub struct LsaSummarizer<'r> {
    resources: &'r LanguageResources,
    config: LsaConfig,
}

impl<'r> LsaSummarizer<'r> {
    pub fn new(resources: &'r LanguageResources) -> Self {
        Self {
            resources,
            config: LsaConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LsaConfig) -> Self {
        self.config = config;
        self
    }

    /// Pick the `count` best sentences, returned in document order.
    pub fn select(&self, sentences: &[String], count: usize) -> Vec<String> {
        if sentences.is_empty() || count == 0 {
            return Vec::new();
        }
        let ranks = self.rank(sentences, count);

        let mut order: Vec<usize> = (0..sentences.len()).collect();
        order.sort_by(|&a, &b| {
            ranks[b]
                .partial_cmp(&ranks[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        let mut chosen: Vec<usize> = order.into_iter().take(count).collect();
        chosen.sort_unstable();
        chosen.into_iter().map(|i| sentences[i].clone()).collect()
    }

    /// Rank per sentence; `count` sets how many topics are kept (at least `min_dimensions`).
    pub fn rank(&self, sentences: &[String], count: usize) -> Vec<f64> {
        let matrix = self.term_matrix(sentences);
        if matrix.nrows() == 0 {
            return vec![0.0; sentences.len()];
        }
        let dimensions = self.config.min_dimensions.max(count).min(sentences.len());
        let topics = self.topics(&matrix, dimensions);

        (0..sentences.len())
            .map(|j| {
                topics
                    .iter()
                    .map(|(sigma_sq, v)| sigma_sq * v[j] * v[j])
                    .sum::<f64>()
                    .sqrt()
            })
            .collect()
    }

    fn terms(&self, sentence: &str) -> Vec<String> {
        sentence
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .filter(|w| !self.resources.is_stopword(w))
            .collect()
    }

    // terms x sentences, smoothed per sentence column
    fn term_matrix(&self, sentences: &[String]) -> Array2<f64> {
        let tokenized: Vec<Vec<String>> = sentences.iter().map(|s| self.terms(s)).collect();
        let mut dictionary: BTreeMap<&str, usize> = BTreeMap::new();
        for words in &tokenized {
            for word in words {
                let next = dictionary.len();
                dictionary.entry(word.as_str()).or_insert(next);
            }
        }

        let mut matrix = Array2::<f64>::zeros((dictionary.len(), sentences.len()));
        for (col, words) in tokenized.iter().enumerate() {
            for word in words {
                matrix[[dictionary[word.as_str()], col]] += 1.0;
            }
        }

        let smooth = self.config.smoothing;
        for mut column in matrix.axis_iter_mut(Axis(1)) {
            let max = column.iter().cloned().fold(0.0, f64::max);
            if max > 0.0 {
                column.mapv_inplace(|tf| smooth + (1.0 - smooth) * tf / max);
            }
        }
        matrix
    }

    // Leading eigenpairs of AᵀA (σ², right singular vector), by power iteration with
    // deflation against the vectors already found.
    fn topics(&self, matrix: &Array2<f64>, dimensions: usize) -> Vec<(f64, Array1<f64>)> {
        let gram = matrix.t().dot(matrix);
        let n = gram.nrows();
        let mut found: Vec<(f64, Array1<f64>)> = Vec::with_capacity(dimensions);

        for _ in 0..dimensions {
            let mut v = Array1::from_shape_fn(n, |i| 1.0 + (i as f64 + 1.0) * 1e-3);
            orthogonalize(&mut v, &found);
            if !normalize(&mut v) {
                break;
            }

            let mut converged = false;
            for _ in 0..self.config.max_iterations {
                let mut next = gram.dot(&v);
                orthogonalize(&mut next, &found);
                if !normalize(&mut next) {
                    break;
                }
                let delta = (&next - &v).mapv(f64::abs).sum();
                v = next;
                if delta < self.config.tolerance {
                    converged = true;
                    break;
                }
            }

            let sigma_sq = v.dot(&gram.dot(&v));
            if sigma_sq <= 1e-12 {
                break;
            }
            if !converged {
                tracing::trace!("power iteration hit the limit at topic {}", found.len());
            }
            found.push((sigma_sq, v));
        }
        found
    }
}

fn orthogonalize(v: &mut Array1<f64>, basis: &[(f64, Array1<f64>)]) {
    for (_, u) in basis {
        let projection = v.dot(u);
        v.scaled_add(-projection, u);
    }
}

fn normalize(v: &mut Array1<f64>) -> bool {
    let norm = v.dot(v).sqrt();
    if norm <= 1e-12 {
        return false;
    }
    v.mapv_inplace(|x| x / norm);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_keeps_document_order() {
        let resources = LanguageResources::new("en", &[]);
        let lsa = LsaSummarizer::new(&resources);
        let input = sentences(&[
            "Rust compilers check ownership rules.",
            "Borrowing rules keep references valid in Rust.",
            "Bananas are yellow.",
            "Ownership and borrowing are checked by the Rust compiler.",
        ]);
        let picked = lsa.select(&input, 2);
        assert_eq!(picked.len(), 2);
        let positions: Vec<usize> = picked
            .iter()
            .map(|p| input.iter().position(|s| s == p).unwrap())
            .collect();
        assert!(positions[0] < positions[1]);
    }

    #[test]
    fn test_rank_is_deterministic() {
        let resources = LanguageResources::new("en", &[]);
        let lsa = LsaSummarizer::new(&resources);
        let input = sentences(&[
            "Cats chase mice around the barn.",
            "Dogs guard the barn at night.",
            "Mice hide from cats and dogs.",
        ]);
        assert_eq!(lsa.rank(&input, 2), lsa.rank(&input, 2));
    }

    #[test]
    fn test_count_larger_than_input() {
        let resources = LanguageResources::new("en", &[]);
        let lsa = LsaSummarizer::new(&resources);
        let input = sentences(&["Only one sentence here."]);
        assert_eq!(lsa.select(&input, 5), input);
        assert!(lsa.select(&input, 0).is_empty());
    }

    #[test]
    fn test_stopword_only_sentences_fall_back_to_order() {
        let resources = LanguageResources::new("en", &[]);
        let lsa = LsaSummarizer::new(&resources);
        let input = sentences(&["It is.", "It was.", "It is not."]);
        assert_eq!(lsa.select(&input, 2), sentences(&["It is.", "It was."]));
    }

    #[test]
    fn test_single_topic_matches_column_norm() {
        let resources = LanguageResources::new("en", &[]);
        let lsa = LsaSummarizer::new(&resources).with_config(LsaConfig {
            min_dimensions: 2,
            ..LsaConfig::default()
        });
        // with every topic kept the rank equals the column norm of the matrix
        let input = sentences(&["Apples grow.", "Pears grow slowly."]);
        let matrix = lsa.term_matrix(&input);
        let ranks = lsa.rank(&input, 2);
        for (j, rank) in ranks.iter().enumerate() {
            let norm = matrix.column(j).dot(&matrix.column(j)).sqrt();
            assert!((rank - norm).abs() < 1e-6, "{} vs {}", rank, norm);
        }
    }
}
