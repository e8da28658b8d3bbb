//! Per-theme counts and volume ranking.

use pulse_core::{Classification, ThemeStat, ThemeTaxonomy};

fn counts(classifications: &[Classification], taxonomy: &ThemeTaxonomy) -> Vec<usize> {
    let mut counts = vec![0usize; taxonomy.len()];
    for c in classifications {
        if let Some(i) = taxonomy.position(&c.theme) {
            counts[i] += 1;
        }
    }
    counts
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Statistics for every theme in the taxonomy, zero-count themes included,
/// in declaration order.
pub fn aggregate(classifications: &[Classification], taxonomy: &ThemeTaxonomy) -> Vec<ThemeStat> {
    let total = classifications.len();
    taxonomy
        .themes()
        .iter()
        .zip(counts(classifications, taxonomy))
        .map(|(theme, count)| ThemeStat {
            theme: theme.name.clone(),
            count,
            percentage: if total == 0 {
                0.0
            } else {
                round2(count as f64 * 100.0 / total as f64)
            },
        })
        .collect()
}

/// Up to `n` themes that occur at least once, by descending count.
/// Equal counts keep taxonomy declaration order.
pub fn top_n(classifications: &[Classification], taxonomy: &ThemeTaxonomy, n: usize) -> Vec<String> {
    let mut ranked: Vec<(usize, usize)> = counts(classifications, taxonomy)
        .into_iter()
        .enumerate()
        .filter(|(_, count)| *count > 0)
        .collect();
    // sort_by is stable, so ties stay in declaration order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(n)
        .map(|(i, _)| taxonomy.themes()[i].name.clone())
        .collect()
}
