use clap::Parser;
use survmap::core::export::write_snapshot;
use survmap::utils::error::ErrorSeverity;
use survmap::utils::{logger, validation::Validate};
use survmap::{CliConfig, LayerEngine, LocalStorage, MapSurface, PipelineOptions, PointFilePipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting survmap");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證設定
    let settings = match cli.resolve().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let storage = LocalStorage::new(".");
    let options = PipelineOptions::from_config(&settings);
    let mut map = MapSurface::new(settings.width_px, settings.height_px);
    if settings.background_tiles {
        map.add_background_tiles();
    }

    let mut worst: Option<ErrorSeverity> = None;
    for source in settings.ordered_layers() {
        let pipeline = PointFilePipeline::new(
            storage.clone(),
            source.file.clone(),
            source.layer.clone(),
            options,
        );
        let engine = LayerEngine::new(pipeline);

        match engine.run(&mut map).await {
            Ok(summary) => {
                println!(
                    "✅ {}: {} points ({:?})",
                    summary.layer, summary.drawn_points, summary.selection
                );
            }
            Err(e) => {
                tracing::error!(
                    "❌ Layer '{}' failed: {} (Category: {:?}, Severity: {:?})",
                    source.layer.name,
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                eprintln!("❌ {}", e.user_friendly_message());

                if e.severity() == ErrorSeverity::Critical {
                    std::process::exit(exit_code(e.severity()));
                }
                worst = worst.max(Some(e.severity()));
            }
        }
    }

    write_snapshot(&storage, &settings.output_path, &map).await?;
    tracing::info!("📁 Map snapshot saved to: {}", settings.output_path);
    println!("📁 Map snapshot saved to: {}", settings.output_path);

    if let Some(severity) = worst {
        let code = exit_code(severity);
        if code > 0 {
            std::process::exit(code);
        }
    }

    Ok(())
}

// 根據錯誤嚴重程度決定退出碼，低嚴重度只警告
fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survmap::MapError;

    #[test]
    fn test_rejected_point_set_exits_non_zero() {
        let err = MapError::UnrecognizedSystem {
            layer: "reference_points".to_string(),
        };
        assert_eq!(exit_code(err.severity()), 2);
    }

    #[test]
    fn test_exit_code_by_severity() {
        assert_eq!(exit_code(ErrorSeverity::Low), 0);
        assert_eq!(exit_code(ErrorSeverity::High), 1);
        assert_eq!(exit_code(ErrorSeverity::Critical), 3);
    }
}
