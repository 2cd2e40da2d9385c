use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use studio_report_pdf::config::Config;
use studio_report_pdf::{DocumentMetadata, Error, Labels, convert_markdown_to_pdf};

#[derive(Parser)]
#[command(name = "studio-report")]
#[command(version)]
#[command(about = "Render video-diagnostic reports to PDF, or serve the export and analyze API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown report file to PDF
    Render {
        /// Report text file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output PDF (defaults to the input path with a .pdf extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        subtitle: Option<String>,

        #[arg(long)]
        channel: Option<String>,

        #[arg(long)]
        video_title: Option<String>,

        /// Analysis period shown on the cover
        #[arg(long)]
        period: Option<String>,

        /// Cover date, YYYY-MM-DD (today if omitted)
        #[arg(long)]
        created_at: Option<String>,

        /// Label language: en or sr
        #[arg(long, env = "REPORT_LOCALE")]
        locale: Option<String>,
    },

    /// Run the HTTP server
    Serve {
        /// Listen address, overriding REPORT_BIND and PORT
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Render {
            input,
            output,
            title,
            subtitle,
            channel,
            video_title,
            period,
            created_at,
            locale,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("pdf"));
            let mut options = config.render_options();
            if let Some(locale) = locale {
                options.labels = Labels::for_locale(&locale);
            }
            let meta = DocumentMetadata {
                title,
                subtitle,
                brand: None,
                created_at,
                channel,
                video_title,
                period,
            };
            convert_markdown_to_pdf(&input, &output, &meta, &options)?;
            log::info!("wrote {}", output.display());
            Ok(())
        }
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(studio_report_pdf::server::serve(config))
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
