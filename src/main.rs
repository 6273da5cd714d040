use std::{process, sync::Arc};

use sitepdf::{
    application::{
        error::AppError,
        export::{BatchReport, ExportPlan, ExportScheduler, plan_export},
    },
    config::{self, Command, ExportArgs, Settings},
    infra::{
        browser::{ChromeConfig, ChromeRenderer},
        error::InfraError,
        manifest, telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    let command = cli_args.command.unwrap_or_default();

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        Command::Export(args) => run_export(settings, *args).await,
    }
}

async fn run_export(settings: Settings, args: ExportArgs) -> Result<(), AppError> {
    if !settings.site.directory.is_dir() {
        return Err(AppError::validation(format!(
            "site directory `{}` does not exist; build the site first",
            settings.site.directory.display()
        )));
    }

    let known = manifest::load_known_pages(&settings.site.pages_manifest)
        .await
        .map_err(InfraError::from)?;
    let plan = plan_export(&settings.export.selection, &known, &settings.export.template());

    if args.dry_run {
        print_plan(&plan);
        return Ok(());
    }

    let renderer = Arc::new(ChromeRenderer::new(ChromeConfig::from(&settings.browser)));
    let scheduler = ExportScheduler::new(renderer, settings.export.pacing());
    let report = scheduler.run_plan(&settings.site.directory, plan).await?;

    log_summary(&report);
    report.into_result()?;
    Ok(())
}

fn print_plan(plan: &ExportPlan) {
    for job in &plan.jobs {
        println!("{}\t{}", job.page, job.artifact_path().display());
    }
    for path in &plan.skipped {
        println!("{path}\tskipped (unknown page)");
    }
}

fn log_summary(report: &BatchReport) {
    for outcome in report.failed() {
        if let Some(details) = outcome.error_report() {
            warn!(
                target = "sitepdf::export",
                op = "export::summary",
                page = %outcome.page,
                error = %details,
                "Page was not exported"
            );
        }
    }

    info!(
        target = "sitepdf::export",
        op = "export::summary",
        exported = report.succeeded().count(),
        failed = report.failed_count(),
        skipped = report.skipped.len(),
        "Export summary"
    );
}
