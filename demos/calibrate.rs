//! 校准示例
//!
//! 在本机上校准 bcrypt cost，写入内存设置存储，加固策略后哈希一个密码。
//!
//! 运行: RUST_LOG=debug cargo run --example calibrate -- 0.05 8

use hashcost::calibrate::{CalibrationConfig, CostCalibrator};
use hashcost::password::Algorithm;
use hashcost::provision::{ProvisionOptions, Provisioner, harden, load_hasher, load_policy};
use hashcost::settings::InMemorySettingsStore;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let mut config = CalibrationConfig::default();
    if let Some(target) = args.next() {
        config = config.with_target_latency_secs(target.parse()?);
    }
    if let Some(start) = args.next() {
        config = config.with_starting_factor(start.parse()?);
    }
    config.validate()?;

    // 模拟宿主出厂设置
    let store = InMemorySettingsStore::with_values([
        ("registration_mode", "randompass"),
        ("require_complex_passwords", "0"),
        ("min_password_length", "6"),
        ("max_password_length", "30"),
    ]);

    let provisioner = Provisioner::new(CostCalibrator::bcrypt().with_config(config))
        .with_options(ProvisionOptions::default().with_fallback_cost(12));
    let provisioned = provisioner.install(&store)?;
    println!("stored cost: {}", provisioned.cost());

    let report = harden(&store)?;
    for change in &report.changes {
        println!(
            "changed {}: {} -> {}",
            change.key,
            change.old.as_deref().unwrap_or("<unset>"),
            change.new
        );
    }

    let password = "Correct-Horse-Battery-Staple-2024";
    load_policy(&store)?.validate(password)?;

    let hasher = load_hasher(&store, Algorithm::Bcrypt)?;
    let hash = hasher.hash(password)?;
    println!("hash: {}", hash);
    println!("verified: {}", hasher.verify(password, &hash)?);

    Ok(())
}
