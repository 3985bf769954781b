//! `calraw update` - the full pipeline.

use crate::Result;
use calraw_pipeline::coordinator::PipelineCoordinator;
use calraw_pipeline::download::HttpArchiveSource;
use calraw_pipeline::prompt::InteractivePrompt;
use calraw_pipeline::schema::SchemaRegistry;
use colored::Colorize;

/// Flags for one update invocation
#[derive(Debug, Clone)]
pub struct UpdateArgs {
    pub skip_download: bool,
    pub skip_clean: bool,
    pub skip_load: bool,
    pub keep_files: bool,
    pub noinput: bool,
    pub test_mode: bool,
    pub app: String,
}

/// Run the full download → clean → load pipeline.
pub async fn run(args: UpdateArgs) -> Result<()> {
    let mut config = super::base_config();
    config.download = !args.skip_download;
    config.clean = !args.skip_clean;
    config.load = !args.skip_load;
    config.keep_files = args.keep_files;
    config.noinput = args.noinput;
    config.test_mode = args.test_mode;
    config.app = args.app;
    let config = config.normalized();

    let registry = SchemaRegistry::for_app(&config.app)?;
    let source = HttpArchiveSource::new(config.archive_url.clone());
    let (pool, history) = super::connect().await?;

    PipelineCoordinator::new(
        &config,
        &pool,
        &history,
        &source,
        &InteractivePrompt,
        &registry,
    )
    .run()
    .await?;

    println!("{} Done!", "✓".green());
    Ok(())
}
