use anyhow::Context;
use clap::Parser;
use pallet_dataset::{cli, config, dataset, pipeline};
use cli::{Cli, Commands};
use config::Config;
use dataset::Dataset;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load().context("設定の読み込みに失敗")?;

    match cli.command {
        Commands::Build { root, dataset, report } => {
            println!("📦 pallet-dataset - データセット更新\n");

            let root = match root {
                Some(root) => root,
                None => cli::prompt_root_folder()?,
            };
            let config = config.with_paths(dataset, report);

            // 1. 既存データセット
            println!("[1/3] 既存データセットを読み込み中...");
            let mut dataset = Dataset::load(&config.dataset_path)
                .with_context(|| format!("{} を読み込めません", config.dataset_path.display()))?;
            println!(
                "✔ {}件（処理済みファイル {}件）\n",
                dataset.len(),
                dataset.processed_files().len()
            );

            // 2. ファイル処理
            println!("[2/3] ファイルを処理中...");
            let stats = match pipeline::run(&root, &config, &mut dataset) {
                Ok(stats) => stats,
                Err(e) => {
                    error!(error = %e, "処理を中断");
                    return Err(e).context("データセット更新を中断しました");
                }
            };
            println!(
                "✔ 処理 {} / スキップ {} / エラー {}\n",
                stats.files_processed, stats.files_skipped, stats.errors
            );

            // 3. 保存
            println!("[3/3] 保存中...");
            let written = dataset.persist().context("データセットの保存に失敗")?;
            if written > 0 {
                println!("✔ データセットを保存: {} ({}件)", config.dataset_path.display(), written);
            }
            stats.save(&config.report_path).context("処理統計の保存に失敗")?;
            println!("✔ 処理統計を保存: {}", config.report_path.display());
            stats.log_summary();

            println!("\n✅ 完了（新規 {}件）", stats.new_records);
        }

        Commands::Inspect { file } => {
            let extraction = pipeline::extract_file(&file, &config)
                .with_context(|| format!("{} を抽出できません", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&extraction.to_json())?);
        }

        Commands::Info { dataset } => {
            let path = dataset.unwrap_or_else(|| config.dataset_path.clone());

            if path.exists() {
                let dataset = Dataset::load(&path)?;
                println!("データセット情報:");
                println!("  パス: {}", path.display());
                println!("  件数: {}", dataset.len());
                println!("  列数: {}", dataset.columns().len());
                println!("  処理済みファイル: {}", dataset.processed_files().len());
                if let Ok(meta) = std::fs::metadata(&path) {
                    println!("  サイズ: {} bytes", meta.len());
                }
            } else {
                println!("データセットが存在しません: {}", path.display());
            }
        }

        Commands::Config { show, reset } => {
            let mut config = config;

            if reset {
                config = Config::default();
                config.save()?;
                println!("✔ 設定を既定値に戻しました: {}", Config::config_path()?.display());
            }

            if show || !reset {
                println!("設定:");
                println!("  ファイル接頭辞: {}", config.file_prefix);
                println!("  拡張子: {}", config.extensions.join(", "));
                println!("  データセット: {}", config.dataset_path.display());
                println!("  処理統計: {}", config.report_path.display());
                println!("  既定パスワード: {}", if config.fallback_password.is_empty() { "未設定" } else { "設定済み" });
                println!("  既定温度: {}", config.default_temperature);
                println!("  Pallet Order 最大列数: {}", config.max_order_columns);
            }
        }
    }

    Ok(())
}
