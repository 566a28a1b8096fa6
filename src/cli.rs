use crate::error::{DatasetError, Result};
use clap::{Parser, Subcommand};
use dialoguer::Input;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pallet-dataset")]
#[command(about = "パレット発注・集荷計画Excelの統合データセット生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// フォルダ内の日次レポートを取り込みデータセットを更新
    Build {
        /// 日次レポートのルートフォルダ（省略時は対話入力）
        root: Option<PathBuf>,

        /// データセットの保存先
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// 処理統計の保存先
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// 1ファイルを抽出して結果をJSONで表示（データセットは変更しない）
    Inspect {
        /// 対象のExcelファイル
        #[arg(required = true)]
        file: PathBuf,
    },

    /// データセット情報を表示
    Info {
        /// データセットのパス
        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },

    /// 設定を表示/初期化
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 既定値に戻す
        #[arg(long)]
        reset: bool,
    },
}

/// ルートフォルダを対話入力（存在するフォルダが入力されるまで繰り返す）
pub fn prompt_root_folder() -> Result<PathBuf> {
    loop {
        let input: String = Input::new()
            .with_prompt("日次レポートのフォルダ")
            .interact_text()
            .map_err(|e| DatasetError::Prompt(e.to_string()))?;

        let path = PathBuf::from(input.trim().trim_matches('"'));
        if path.is_dir() {
            return Ok(path);
        }
        println!("フォルダが見つかりません: {}", path.display());
    }
}
