//! 2D projection and plotting of sense-embedding neighborhoods.
//!
//! For each seed sense the top-k most similar senses are gathered, all
//! gathered vectors are projected to the plane, and each neighborhood is
//! rendered as one labeled scatter cluster.

use std::path::Path;

use log::warn;
use plotters::prelude::*;

use crate::embeddings::Embeddings;
use crate::Error;

/// How many neighbors of each seed to plot.
pub const DEFAULT_TOP_K: usize = 30;

struct Cluster {
    seed: String,
    words: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

/// Renders the neighborhoods of `seeds` into an SVG scatter plot.
///
/// Seeds missing from the vocabulary are skipped with a warning; it is an
/// error if none remain.
pub fn plot_clusters<P: AsRef<Path>>(
    embeddings: &Embeddings,
    seeds: &[String],
    top_k: usize,
    output: P,
) -> Result<(), Error> {
    let mut clusters = Vec::new();
    for seed in seeds {
        if !embeddings.contains(seed) {
            warn!("Seed '{}' is not in the vocabulary, skipping.", seed);
            continue;
        }
        let mut words = Vec::new();
        let mut vectors = Vec::new();
        for (word, _) in embeddings.most_similar(seed, top_k) {
            vectors.push(embeddings.get(&word).map(|v| v.to_vec()).unwrap_or_default());
            words.push(word);
        }
        clusters.push(Cluster {
            seed: seed.clone(),
            words,
            vectors,
        });
    }
    if clusters.is_empty() {
        return Err(Error::Plot("no seed sense is in the vocabulary".into()));
    }

    // project all gathered vectors at once so clusters share one plane
    let all: Vec<&[f32]> = clusters
        .iter()
        .flat_map(|c| c.vectors.iter().map(|v| v.as_slice()))
        .collect();
    let projected = project_2d(&all);

    draw(&clusters, &projected, output)
}

/// Principal-component projection to 2D via power iteration.
///
/// Deterministic (fixed starting vectors) and dependency-free; adequate for
/// eyeballing cluster separation even if it is not t-SNE.
pub fn project_2d(vectors: &[&[f32]]) -> Vec<(f32, f32)> {
    if vectors.is_empty() {
        return Vec::new();
    }
    let dim = vectors[0].len();
    let n = vectors.len() as f32;

    let mut mean = vec![0.0f32; dim];
    for vector in vectors {
        for (m, v) in mean.iter_mut().zip(*vector) {
            *m += v / n;
        }
    }
    let centered: Vec<Vec<f32>> = vectors
        .iter()
        .map(|vector| vector.iter().zip(&mean).map(|(v, m)| v - m).collect())
        .collect();

    let first = principal_component(&centered, None);
    let second = principal_component(&centered, Some(&first));

    centered
        .iter()
        .map(|row| (dot(row, &first), dot(row, &second)))
        .collect()
}

fn principal_component(rows: &[Vec<f32>], orthogonal_to: Option<&[f32]>) -> Vec<f32> {
    let dim = rows[0].len();
    // fixed, slightly uneven start so symmetric data still converges
    let mut component: Vec<f32> = (0..dim).map(|i| 1.0 + (i as f32) * 1e-3).collect();
    normalize(&mut component);

    for _ in 0..64 {
        let mut next = vec![0.0f32; dim];
        for row in rows {
            let projection = dot(row, &component);
            for (n, r) in next.iter_mut().zip(row) {
                *n += projection * r;
            }
        }
        if let Some(first) = orthogonal_to {
            let overlap = dot(&next, first);
            for (n, f) in next.iter_mut().zip(first) {
                *n -= overlap * f;
            }
        }
        normalize(&mut next);
        component = next;
    }
    component
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalize(v: &mut [f32]) {
    let norm = dot(v, v).sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn draw<P: AsRef<Path>>(
    clusters: &[Cluster],
    projected: &[(f32, f32)],
    output: P,
) -> Result<(), Error> {
    let (mut x_min, mut x_max, mut y_min, mut y_max) = (f32::MAX, f32::MIN, f32::MAX, f32::MIN);
    for (x, y) in projected {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    let pad_x = ((x_max - x_min) * 0.1).max(1e-3);
    let pad_y = ((y_max - y_min) * 0.1).max(1e-3);

    let root = SVGBackend::new(output.as_ref(), (1600, 900)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(30)
        .build_cartesian_2d(
            x_min - pad_x..x_max + pad_x,
            y_min - pad_y..y_max + pad_y,
        )
        .map_err(plot_err)?;
    chart.configure_mesh().draw().map_err(plot_err)?;

    let mut offset = 0;
    for (index, cluster) in clusters.iter().enumerate() {
        let points = &projected[offset..offset + cluster.vectors.len()];
        offset += cluster.vectors.len();

        let color = Palette99::pick(index).to_rgba();
        chart
            .draw_series(
                points
                    .iter()
                    .map(|(x, y)| Circle::new((*x, *y), 4, color.filled())),
            )
            .map_err(plot_err)?
            .label(cluster.seed.clone())
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));

        chart
            .draw_series(points.iter().zip(&cluster.words).map(|((x, y), word)| {
                Text::new(word.clone(), (*x, *y), ("sans-serif", 12).into_font())
            }))
            .map_err(plot_err)?;
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;

    Ok(())
}

fn plot_err(e: impl std::fmt::Display) -> Error {
    Error::Plot(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn projection_preserves_cluster_separation() {
        let a1 = [10.0, 0.0, 0.1];
        let a2 = [10.0, 0.2, 0.0];
        let b1 = [-10.0, 0.0, 0.2];
        let b2 = [-10.0, 0.1, 0.0];
        let projected = project_2d(&[&a1, &a2, &b1, &b2]);

        let dist = |p: (f32, f32), q: (f32, f32)| ((p.0 - q.0).powi(2) + (p.1 - q.1).powi(2)).sqrt();
        assert!(dist(projected[0], projected[1]) < dist(projected[0], projected[2]));
        assert!(dist(projected[2], projected[3]) < dist(projected[1], projected[3]));
    }

    #[test]
    fn writes_an_svg_scatter_plot() {
        let mut vectors = IndexMap::new();
        vectors.insert("bank_bn:00008364n".to_string(), vec![1.0, 0.0, 0.0]);
        vectors.insert("money_bn:00055644n".to_string(), vec![0.9, 0.1, 0.0]);
        vectors.insert("deposit_bn:00026499n".to_string(), vec![0.8, 0.0, 0.2]);
        vectors.insert("river_bn:00067958n".to_string(), vec![0.0, 1.0, 0.0]);
        vectors.insert("shore_bn:00071341n".to_string(), vec![0.1, 0.9, 0.1]);
        let embeddings = Embeddings::new(vectors, 3);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clusters.svg");
        plot_clusters(
            &embeddings,
            &["bank_bn:00008364n".to_string(), "river_bn:00067958n".to_string()],
            2,
            &path,
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<svg") || content.contains("<svg"));
        assert!(content.contains("money_bn:00055644n"));
    }

    #[test]
    fn missing_seeds_are_an_error_only_when_all_miss() {
        let mut vectors = IndexMap::new();
        vectors.insert("bank_bn:00008364n".to_string(), vec![1.0, 0.0]);
        vectors.insert("money_bn:00055644n".to_string(), vec![0.9, 0.1]);
        let embeddings = Embeddings::new(vectors, 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clusters.svg");

        assert!(matches!(
            plot_clusters(&embeddings, &["absent".to_string()], 2, &path),
            Err(Error::Plot(_))
        ));
        plot_clusters(
            &embeddings,
            &["absent".to_string(), "bank_bn:00008364n".to_string()],
            2,
            &path,
        )
        .unwrap();
    }
}
