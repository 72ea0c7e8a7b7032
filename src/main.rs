// nalgebra
// https://docs.rs/nalgebra/latest/nalgebra/
//
// ndarray
// https://docs.rs/ndarray/latest/ndarray/all.html
//
// csv
// https://docs.rs/csv/latest/csv/
mod align;
mod config;
mod dataset;
mod error;
mod evaluator;
mod global_types;
mod reexpress;
mod save;
mod trajectory;
mod utility;

use std::path::PathBuf;

use clap::Parser;

use crate::config::EvalConfig;
use crate::trajectory::AxisRule;

#[derive(Parser, Debug)]
#[command(author, version, about = "Align odometry against motion-capture ground truth")]
struct Args {
    /// JSON 配置文件，不给出时使用默认配置
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 参考轨迹（里程计）路径
    #[arg(long)]
    reference: Option<PathBuf>,

    /// 查询轨迹（动捕）路径
    #[arg(long)]
    query: Option<PathBuf>,

    /// 参考轨迹的轴规则：identity、fur_to_flu、negate_y、negate_yz 或 `x,-z,y`
    #[arg(long)]
    reference_axis_rule: Option<AxisRule>,

    #[arg(long)]
    query_axis_rule: Option<AxisRule>,

    /// 对齐容差，单位 s
    #[arg(short, long)]
    tolerance: Option<f64>,

    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<EvalConfig> {
        let mut config = match &self.config {
            Some(path) => EvalConfig::from_json_file(path)?,
            None => EvalConfig::default(),
        };
        if let Some(path) = self.reference {
            config.reference.path = path;
        }
        if let Some(path) = self.query {
            config.query.path = path;
        }
        if let Some(rule) = self.reference_axis_rule {
            config.reference.axis_rule = rule;
        }
        if let Some(rule) = self.query_axis_rule {
            config.query.axis_rule = rule;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_nanos()
        .parse_default_env()
        .init();

    let config = Args::parse().into_config()?;
    log::info!("reference: {:?}", config.reference.path);
    log::info!("query: {:?}", config.query.path);
    evaluator::run(&config)?;
    Ok(())
}
