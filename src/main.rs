use clap::Parser;
use std::sync::Arc;
use template_finder::adapters::interactive;
use template_finder::config::Command;
use template_finder::utils::error::ErrorSeverity;
use template_finder::utils::{logger, validation::Validate};
use template_finder::{
    present, CatalogCache, CliConfig, ConfigProvider, FilterCascade, FinderConfig,
    ImageResolver, LocalStorage, Selection, Session, TextSurface,
};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting template-finder");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, &config) {
        tracing::error!(
            "❌ template-finder failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,      // 沒有資料，但不是失敗
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3, // 目錄無法載入
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn run(cli: &CliConfig, config: &FinderConfig) -> template_finder::Result<()> {
    let cache = CatalogCache::new(
        config.source_path(),
        config.load_options()?,
        config.cache_policy(),
    );
    // 載入失敗即中止，不會對不完整的目錄進行篩選
    let catalog = cache.get()?;

    let resolver = ImageResolver::new(config.image_base());
    let stdout = std::io::stdout();
    let mut surface = TextSurface::new(stdout.lock(), config.download_extension());
    let cascade = FilterCascade::new(&catalog);

    match &cli.command {
        Command::Languages => match cascade.language_stage()? {
            Some(languages) => surface.list(&languages)?,
            None => eprintln!("ℹ️ This catalog has no Language stage"),
        },
        Command::Brands { language } => {
            surface.list(&cascade.available_brands(language.as_deref())?)?;
        }
        Command::Groups { language, brand } => {
            surface.list(&cascade.available_product_groups(language.as_deref(), brand)?)?;
        }
        Command::Templates { selection, json } => {
            let session = Session::with_selection(Arc::clone(&catalog), Selection::from(selection));
            if *json {
                let view = session.view()?;
                report_resets(&view.resets);
                let rendered = serde_json::to_string_pretty(&view.report())?;
                std::io::Write::write_all(surface.writer_mut(), rendered.as_bytes())?;
                std::io::Write::write_all(surface.writer_mut(), b"\n")?;
            } else if let Some(view) = present(&session, &mut surface, &resolver)? {
                report_resets(&view.resets);
            }
        }
        Command::Export {
            selection,
            out,
            zip,
        } => {
            let session = Session::with_selection(Arc::clone(&catalog), Selection::from(selection));
            let view = session.view()?;
            report_resets(&view.resets);

            let storage = LocalStorage::new(out);
            match zip {
                Some(archive_name) => {
                    let path =
                        storage.export_zip(&view.records, config.download_extension(), archive_name)?;
                    println!("📦 {}", path.display());
                }
                None => {
                    let written = storage.export_templates(&view.records, config.download_extension())?;
                    if written.is_empty() {
                        println!("Nothing to export for this combination.");
                    }
                    for path in written {
                        println!("📁 {}", path.display());
                    }
                }
            }
        }
        Command::Browse { selection } => {
            let mut session =
                Session::with_selection(Arc::clone(&catalog), Selection::from(selection));
            let stdin = std::io::stdin();
            interactive::browse(&mut session, &resolver, &mut surface, stdin.lock())?;
        }
    }

    Ok(())
}

fn report_resets(resets: &[template_finder::Stage]) {
    for stage in resets {
        tracing::warn!("Requested {} is not available, using the first option", stage);
        eprintln!("⚠️ Requested {} is not available here, showing the first option", stage.label());
    }
}
