use crate::infra::{cli_backend, parse_feed, parse_sort_key, schedule_or_error};
use clap::Args;
use estate_desk::applications::{export_csv, SortDirection, SortKey, TableQuery};
use estate_desk::auth::AuthContext;
use estate_desk::config::AppConfig;
use estate_desk::error::AppError;
use estate_desk::interviews::RescheduleResolver;
use estate_desk::loan::LoanTerms;
use estate_desk::notifications::{NotificationFeed, NotificationPoller};
use estate_desk::telemetry;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct InterviewArgs {
    /// Applicant identifier from the invitation link
    pub(crate) applicant_id: String,
    /// Email address the application was submitted with
    #[arg(long)]
    pub(crate) email: String,
}

#[derive(Args, Debug)]
pub(crate) struct LoanArgs {
    /// Amount borrowed
    #[arg(long)]
    pub(crate) principal: f64,
    /// Yearly interest rate in percent
    #[arg(long)]
    pub(crate) rate: f64,
    /// Term in years
    #[arg(long)]
    pub(crate) years: u32,
}

#[derive(Args, Debug)]
pub(crate) struct ApplicationExportArgs {
    /// Destination file; `-` writes to stdout
    #[arg(long)]
    pub(crate) output: PathBuf,
    /// Case-insensitive match on name, email or position
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Only rows with this status
    #[arg(long)]
    pub(crate) status: Option<String>,
    #[arg(long, default_value = "applied-at", value_parser = parse_sort_key)]
    pub(crate) sort: SortKey,
    #[arg(long)]
    pub(crate) descending: bool,
    /// Session token; defaults to PORTAL_SERVICE_TOKEN
    #[arg(long)]
    pub(crate) token: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct NotificationWatchArgs {
    #[arg(long, default_value = "all", value_parser = parse_feed)]
    pub(crate) feed: NotificationFeed,
    /// Exit after this many changes
    #[arg(long, default_value_t = 1)]
    pub(crate) updates: usize,
    /// Session token; defaults to PORTAL_SERVICE_TOKEN
    #[arg(long)]
    pub(crate) token: Option<String>,
}

fn load_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, config.environment)?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).map_err(io::Error::from)?;
    writeln!(handle)?;
    Ok(())
}

pub(crate) async fn run_interview(args: InterviewArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let client = cli_backend(&config, None)?.for_context(&AuthContext::Anonymous);
    let resolver = RescheduleResolver::new(client);

    let outcome = resolver
        .load(Some(&args.applicant_id), Some(&args.email))
        .await;
    print_json(&schedule_or_error(outcome)?)
}

pub(crate) fn run_loan_quote(args: LoanArgs) -> Result<(), AppError> {
    let quote = LoanTerms {
        principal: args.principal,
        annual_rate_percent: args.rate,
        years: args.years,
    }
    .quote()?;
    print_json(&quote)
}

pub(crate) async fn run_application_export(args: ApplicationExportArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let client = cli_backend(&config, args.token)?;
    let rows = client.job_applications().await?;

    let query = TableQuery {
        search: args.search,
        status: args.status,
        sort: args.sort,
        direction: if args.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        },
        ..TableQuery::default()
    };
    let selected = query.matching(&rows);

    let written = if args.output.as_os_str() == "-" {
        export_csv(io::stdout().lock(), &selected)?
    } else {
        let file = File::create(&args.output)?;
        export_csv(BufWriter::new(file), &selected)?
    };

    info!(
        written,
        fetched = rows.len(),
        output = %args.output.display(),
        "exported job applications"
    );
    Ok(())
}

pub(crate) async fn run_notification_watch(args: NotificationWatchArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let client = cli_backend(&config, args.token)?;

    let mut subscription =
        NotificationPoller::new(Arc::new(client), args.feed, &config.polling).spawn();

    let mut remaining = args.updates;
    while remaining > 0 {
        let Some(notifications) = subscription.changed().await else {
            break;
        };
        print_json(&notifications)?;
        remaining -= 1;
    }

    subscription.stop().await;
    Ok(())
}
