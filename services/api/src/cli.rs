use crate::commands::{
    run_application_export, run_interview, run_loan_quote, run_notification_watch,
    ApplicationExportArgs, InterviewArgs, LoanArgs, NotificationWatchArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use estate_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "estate-desk",
    about = "Serve and query the property portal back-office from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Show the effective interview date for an applicant
    Interview(InterviewArgs),
    /// Quote the monthly payment for a fixed-rate loan
    Loan(LoanArgs),
    /// Work with submitted job applications
    Applications {
        #[command(subcommand)]
        command: ApplicationsCommand,
    },
    /// Follow the admin notification feed
    Notifications {
        #[command(subcommand)]
        command: NotificationsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ApplicationsCommand {
    /// Write the filtered application table as CSV
    Export(ApplicationExportArgs),
}

#[derive(Subcommand, Debug)]
enum NotificationsCommand {
    /// Poll the feed and print each change as JSON
    Watch(NotificationWatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Interview(args) => run_interview(args).await,
        Command::Loan(args) => run_loan_quote(args),
        Command::Applications {
            command: ApplicationsCommand::Export(args),
        } => run_application_export(args).await,
        Command::Notifications {
            command: NotificationsCommand::Watch(args),
        } => run_notification_watch(args).await,
    }
}
