use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};

use regdesk::filter::{RegionFilter, StatusFilter};
use regdesk::sync::CloseHandle;
use regdesk::views::{AdminDashboard, Notice, RegistrationList, RowActions};
use regdesk::{Config, Decision, HttpRegistrationService, Role, SessionStore};

#[derive(Parser, Debug)]
#[command(name = "regdesk", version, about = "Registration approval and payment review console")]
struct Cli {
    /// Config file (defaults to the per-user config.toml if present)
    #[arg(long, env = "REGDESK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the cashier API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in seconds (0 disables)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a session token for a role
    Login {
        role: Role,
        #[arg(long)]
        token: String,
        /// Profile JSON returned by the login page
        #[arg(long)]
        data: Option<String>,
    },
    /// Forget the session for a role
    Logout { role: Role },
    /// List registrations (registrar)
    Registrations {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    /// Approve a pending registration (registrar)
    Approve { id: String },
    /// Decline a pending registration (registrar)
    Decline { id: String },
    /// Payment dashboard with totals (admin)
    Payments {
        #[arg(long, default_value = "all")]
        region: RegionFilter,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    regdesk::logging::init("info");

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(secs) = cli.timeout_secs {
        config.http_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let store = SessionStore::new(config.session_path()?);

    match cli.command {
        Command::Login { role, token, data } => {
            let data = match data {
                Some(raw) => serde_json::from_str(&raw).context("--data is not valid JSON")?,
                None => serde_json::Value::Null,
            };
            let session = store.login(role, &token, data, Utc::now(), config.session_ttl)?;
            println!(
                "Logged in as {role} until {}; continue at {}",
                session.expires_at,
                role.home()
            );
        }
        Command::Logout { role } => {
            if store.logout(role)? {
                println!("Logged out {role}");
            } else {
                println!("No {role} session");
            }
        }
        Command::Registrations { search, status } => {
            store.require(Role::Registrar, Utc::now())?;
            let service = HttpRegistrationService::new(&config)?;
            let mut view = RegistrationList::new();
            view.search = search;
            view.status_filter = status;
            let closer = view.close_handle();
            tokio::select! {
                notice = view.load(&service) => {
                    if let Some(notice) = notice {
                        report(&notice);
                    }
                }
                _ = tokio::signal::ctrl_c() => interrupted(&closer)?,
            }
            print_registrations(&view);
        }
        Command::Approve { id } => decide(&config, &store, &id, Decision::Approve).await?,
        Command::Decline { id } => decide(&config, &store, &id, Decision::Decline).await?,
        Command::Payments { region, search } => {
            store.require(Role::Admin, Utc::now())?;
            let service = HttpRegistrationService::new(&config)?;
            let mut view = AdminDashboard::new();
            view.region_filter = region;
            view.search = search;
            let closer = view.close_handle();
            tokio::select! {
                notice = view.load(&service) => {
                    if let Some(notice) = notice {
                        report(&notice);
                    }
                }
                _ = tokio::signal::ctrl_c() => interrupted(&closer)?,
            }
            print_payments(&view);
        }
        Command::Config => {
            println!("base_url      = {}", config.base_url);
            match config.http_timeout {
                Some(timeout) => println!("http_timeout  = {}s", timeout.as_secs()),
                None => println!("http_timeout  = none"),
            }
            println!("session_ttl   = {}h", config.session_ttl.as_secs() / 3600);
            println!("session_file  = {}", store.path().display());
        }
    }

    Ok(())
}

async fn decide(
    config: &Config,
    store: &SessionStore,
    id: &str,
    decision: Decision,
) -> anyhow::Result<()> {
    store.require(Role::Registrar, Utc::now())?;
    let service = HttpRegistrationService::new(config)?;
    let mut view = RegistrationList::new();
    if let Some(notice) = view.load(&service).await {
        report(&notice);
    }

    let notice = view.decide(&service, id, decision).await;
    report(&notice);
    if notice.is_error() {
        bail!("{notice}");
    }
    Ok(())
}

fn interrupted(closer: &CloseHandle) -> anyhow::Result<()> {
    closer.close();
    bail!("interrupted while loading");
}

fn report(notice: &Notice) {
    match notice {
        Notice::Success(msg) => eprintln!("ok: {msg}"),
        Notice::Error(msg) => eprintln!("error: {msg}"),
    }
}

fn cell(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn print_registrations(view: &RegistrationList) {
    let rows = view.rows();
    println!("S.No\tRegion\tEmail\tName\tMobile\tStatus\tAction");
    if rows.is_empty() {
        println!("No Records Found");
        return;
    }
    for row in rows {
        let a = &row.record.attendee;
        let action = match row.actions {
            RowActions::Decide => format!("approve/decline {}", row.record.id),
            RowActions::Approved => "✓".to_string(),
            RowActions::Declined => "✕".to_string(),
            RowActions::None => String::new(),
        };
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.serial,
            cell(&a.region),
            cell(&a.email),
            cell(&a.name),
            cell(&a.mobile),
            row.status,
            action
        );
    }
}

fn print_payments(view: &AdminDashboard) {
    let totals = view.totals();
    println!(
        "Total East: ₹ {}\tTotal West: ₹ {}\tDisplayed Total: ₹ {}",
        totals.east, totals.west, totals.displayed
    );

    let rows = view.rows();
    println!(
        "S.No\tRegion\tEmail\tName\tGender\tAge\tMobile\tRecommended By Role\tRecommender Contact\t\
         Amount Paid\tPayment Mode\tDate of Payment\tTransaction ID\tPayment Screenshot\t\
         Balance Amount\tStatus\tCreated At"
    );
    if rows.is_empty() {
        println!("No Records Found");
        return;
    }
    for row in rows {
        let r = row.record;
        let a = &r.attendee;
        let status = r.status.as_ref().map(|s| s.to_string()).unwrap_or_default();
        let created = r
            .created_at()
            .map(|dt| dt.with_timezone(&chrono::Local).format("%d/%m/%Y, %H:%M:%S").to_string())
            .unwrap_or_else(|| cell(&r.created_at).to_string());
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.serial,
            cell(&a.region),
            cell(&a.email),
            cell(&a.name),
            cell(&a.gender),
            cell(&a.age),
            cell(&a.mobile),
            cell(&a.recommended_by_role),
            cell(&a.recommender_contact),
            r.amount_paid,
            cell(&r.payment_mode),
            cell(&r.date_of_payment),
            cell(&r.transaction_id),
            cell(&r.payment_screenshot),
            row.balance_amount,
            status,
            created
        );
    }
}
