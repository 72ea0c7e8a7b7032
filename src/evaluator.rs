//! 一次完整的评估流程：读取 -> 裁剪 -> 归一化 -> 对齐 -> 重表达 -> 保存

use anyhow::Context;

use crate::align::{align, AlignedPair, AlignmentSummary};
use crate::config::{EvalConfig, SourceConfig, ALIGNED_FILE, SUMMARY_FILE};
use crate::error::TrajectoryError;
use crate::reexpress::reexpress_pairs;
use crate::save::{write_aligned_csv, write_summary_json};
use crate::trajectory::{crop_to_overlap, normalize, Trajectory};

/// 读取一条轨迹。`require_orientation` 为 false 时，缺少姿态列的表按纯位置读取
pub fn load_trajectory(
    source: &SourceConfig,
    require_orientation: bool,
) -> anyhow::Result<Trajectory> {
    let mut columns = source.column_map();
    let dataset = source.format.dataset();
    let table = match dataset.read_table(&source.path, &columns.names()) {
        Err(TrajectoryError::MissingColumn(name))
            if !require_orientation
                && columns
                    .orientation
                    .as_ref()
                    .is_some_and(|names| names.contains(&name)) =>
        {
            log::warn!(
                "{:?} has no orientation column `{}`, loading positions only",
                source.path,
                name
            );
            columns = columns.without_orientation();
            dataset.read_table(&source.path, &columns.names())
        }
        other => other,
    }
    .with_context(|| format!("loading {:?}", source.path))?;
    let trajectory = Trajectory::from_table(&table, &columns, source.frame)
        .with_context(|| format!("building trajectory from {:?}", source.path))?;
    if trajectory.is_empty() {
        log::warn!("{:?} has no samples", source.path);
    }
    Ok(trajectory)
}

fn log_trajectory(name: &str, trajectory: &Trajectory) {
    match (trajectory.time_range(), trajectory.mean_sample_period()) {
        (Some((start, end)), Some(period)) => log::info!(
            "{}: {} samples, [{:.6}, {:.6}] s, mean period {:.6} s",
            name,
            trajectory.len(),
            start,
            end,
            period
        ),
        _ => log::info!("{}: {} samples", name, trajectory.len()),
    }
}

/// 对齐并（可选）重表达，不写文件
pub fn evaluate(
    config: &EvalConfig,
    reference: &Trajectory,
    query: &Trajectory,
) -> anyhow::Result<(Vec<AlignedPair>, AlignmentSummary)> {
    let (reference, query) = if config.crop_to_overlap {
        crop_to_overlap(reference, query)
    } else {
        (reference.clone(), query.clone())
    };
    log_trajectory("reference", &reference);
    log_trajectory("query", &query);

    let reference = normalize(&reference, &config.reference.axis_rule, config.reference.origin)
        .context("normalizing reference")?;
    let query = normalize(&query, &config.query.axis_rule, config.query.origin)
        .context("normalizing query")?;

    let mut pairs = align(&reference, &query, config.tolerance)?;
    if let Some(reexpress) = &config.reexpress {
        pairs = reexpress_pairs(&pairs, reexpress.reference_index, reexpress.anchor)
            .context("re-expressing aligned pairs")?;
    }
    let summary = AlignmentSummary::from_pairs(&pairs, reference.len());
    Ok((pairs, summary))
}

pub fn run(config: &EvalConfig) -> anyhow::Result<AlignmentSummary> {
    let require_orientation = config.reexpress.is_some();
    let reference = load_trajectory(&config.reference, require_orientation)?;
    let query = load_trajectory(&config.query, require_orientation)?;
    let (pairs, summary) = evaluate(config, &reference, &query)?;

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {:?}", config.output_dir))?;
    write_aligned_csv(&config.output_dir.join(ALIGNED_FILE), &pairs)?;
    write_summary_json(&config.output_dir.join(SUMMARY_FILE), &summary)?;

    log::info!(
        "matched {} / dropped {} (tolerance {} s)",
        summary.matched,
        summary.dropped,
        config.tolerance
    );
    if let Some(rmse) = summary.position_rmse {
        log::info!("position rmse {:.6} m", rmse);
    }
    Ok(summary)
}
