use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use aba_billing::config::{
    clear_session, config_dir, load_config, load_session, save_session, CONFIG_TEMPLATE,
};
use aba_billing::invoice::{
    csv_file_name, to_csv, ApiStatus, NewInvoice, SortDirection, SortKey, StatusChip,
};
use aba_billing::{
    BillingBoard, BillingError, Config, HttpBackend, Invoice, InvoiceQuery, Kpis, ProofFile,
    Result, Role, Session, SessionUser, UiStatus,
};

#[derive(Parser)]
#[command(name = "aba-billing")]
#[command(version, about = "Invoice reconciliation CLI for the ABA clinic", long_about = None)]
struct Cli {
    /// Path to config directory (default: XDG config dir or ~/.aba-billing)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log backend calls to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Store the session token and user issued by the clinic backend
    Login {
        /// Bearer token
        #[arg(long)]
        token: String,

        /// Numeric id of the logged-in user
        #[arg(long)]
        user_id: u64,

        /// ADMIN, PAI, PSICOLOGO or USER
        #[arg(long)]
        role: Role,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show configuration and session
    Status,

    /// List invoices visible to the logged-in user
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Number of rows to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Outstanding, overdue and paid-this-month figures
    Summary,

    /// Change an invoice's status (ADMIN)
    SetStatus {
        /// Invoice id
        id: u64,

        status: UiStatus,
    },

    /// Attach a payment proof to an invoice (PAI)
    UploadProof {
        /// Invoice id
        id: u64,

        /// Receipt or transfer confirmation (PDF or image)
        file: PathBuf,
    },

    /// Download an invoice PDF
    Download {
        /// Invoice id
        id: u64,

        /// Directory to save into (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create an invoice for a consultation (ADMIN)
    Create {
        /// Consultation id (see 'consultations')
        #[arg(short, long)]
        consultation: Option<u64>,

        /// Invoice amount
        #[arg(short, long)]
        total: Option<f64>,

        /// Human-readable invoice number
        #[arg(long)]
        number: Option<String>,

        /// Issue date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due_date: Option<String>,

        /// Initial backend status
        #[arg(long, default_value = "pending", value_parser = ["pending", "paid", "cancelled"])]
        status: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Search consultations to invoice (ADMIN)
    Consultations {
        /// Matches id, child or psychologist name
        #[arg(short, long, default_value = "")]
        query: String,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Export the filtered invoice list as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output file (default: ./faturas_<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Status chip
    #[arg(short, long, value_enum, default_value_t = StatusChip::All)]
    status: StatusChip,

    /// Free text matched against id, number and description
    #[arg(short, long)]
    query: Option<String>,

    /// Issued on or after (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Issued on or before (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    #[arg(long, value_enum, default_value_t = SortKey::Date)]
    sort: SortKey,

    /// Sort ascending (default: descending)
    #[arg(long)]
    asc: bool,
}

impl FilterArgs {
    fn to_query(&self) -> Result<InvoiceQuery> {
        Ok(InvoiceQuery {
            chip: self.status,
            text: self.query.clone(),
            from: self.from.as_deref().map(parse_date).transpose()?,
            to: self.to.as_deref().map(parse_date).transpose()?,
            sort: self.sort,
            direction: if self.asc {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            },
        })
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "aba_billing=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Login {
            token,
            user_id,
            role,
            name,
            email,
        } => cmd_login(&cfg_dir, token, user_id, role, name, email),
        Commands::Logout => cmd_logout(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::List { filters, limit } => cmd_list(&cfg_dir, &filters, limit, today),
        Commands::Summary => cmd_summary(&cfg_dir, today),
        Commands::SetStatus { id, status } => cmd_set_status(&cfg_dir, id, status, today),
        Commands::UploadProof { id, file } => cmd_upload_proof(&cfg_dir, id, &file, today),
        Commands::Download { id, output } => cmd_download(&cfg_dir, id, output, today),
        Commands::Create {
            consultation,
            total,
            number,
            date,
            due_date,
            status,
            description,
        } => {
            let draft = NewInvoice {
                consultation_id: consultation,
                total,
                number,
                date: date.as_deref().map(parse_date).transpose()?,
                due_date: due_date.as_deref().map(parse_date).transpose()?,
                status: ApiStatus::parse(&status),
                description,
            };
            cmd_create(&cfg_dir, draft, today)
        }
        Commands::Consultations { query, limit } => cmd_consultations(&cfg_dir, &query, limit),
        Commands::Export { filters, output } => cmd_export(&cfg_dir, &filters, output, today),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| BillingError::InvalidDate(s.to_string()))
}

fn ensure_initialized(cfg_dir: &Path) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(BillingError::ConfigNotFound(cfg_dir.to_path_buf()));
    }
    Ok(())
}

fn open_board(cfg_dir: &Path) -> Result<(Config, BillingBoard<HttpBackend>)> {
    ensure_initialized(cfg_dir)?;
    let config = load_config(cfg_dir)?;
    let session = load_session(cfg_dir)?;
    let backend = HttpBackend::new(&config.api);
    let board = BillingBoard::new(backend, session, config.billing.clone());
    Ok((config, board))
}

/// Open the board and fetch the invoice list
fn loaded_board(
    cfg_dir: &Path,
    today: NaiveDate,
) -> Result<(Config, BillingBoard<HttpBackend>)> {
    let (config, mut board) = open_board(cfg_dir)?;
    board.load(today)?;
    Ok((config, board))
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    if cfg_dir.exists() {
        return Err(BillingError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized billing config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point it at the clinic API:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Log in:  aba-billing login --token <TOKEN> --user-id <ID> --role <ROLE>");

    Ok(())
}

fn cmd_login(
    cfg_dir: &Path,
    token: String,
    user_id: u64,
    role: Role,
    name: Option<String>,
    email: Option<String>,
) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let session = Session::new(
        token,
        SessionUser {
            id: user_id,
            name,
            email,
            role,
        },
    );
    session.bearer()?;
    save_session(cfg_dir, &session)?;

    println!("Logged in as user #{user_id} ({role})");
    Ok(())
}

fn cmd_logout(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    if clear_session(cfg_dir)? {
        println!("Logged out.");
    } else {
        println!("No active session.");
    }
    Ok(())
}

fn cmd_status(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let config = load_config(cfg_dir)?;
    let session = load_session(cfg_dir)?;

    println!("Billing Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("API:              {}", config.api.base_url);
    println!("Currency:         {}", config.billing.currency);

    match (&session.user, session.bearer()) {
        (Some(user), Ok(_)) => {
            let name = user.name.as_deref().unwrap_or("-");
            println!("User:             #{} {} ({})", user.id, name, user.role);
        }
        _ => println!("User:             Not logged in"),
    }

    Ok(())
}

#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "DUE")]
    due: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
}

#[derive(Tabled)]
struct ConsultationRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "CHILD")]
    child: String,
    #[tabled(rename = "PSYCHOLOGIST")]
    psychologist: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

/// Column holding the amount in `InvoiceRow`
const AMOUNT_COLUMN: usize = 4;

fn format_grouped_int(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut grouped: String = out.chars().rev().collect();
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// Money with two decimals and thousands separators
fn format_money(value: f64, currency_symbol: &str) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (whole, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let grouped = format_grouped_int(whole.parse::<i64>().unwrap_or(0));
    let sign = if value < -0.005 { "-" } else { "" };
    format!("{sign}{currency_symbol} {grouped}.{frac}")
}

/// Append summary rows under the AMOUNT column of a rounded table
fn add_amount_footer(table: &str, rows: &[(&str, String)]) -> String {
    let lines: Vec<&str> = table.lines().collect();
    if lines.len() < 4 || rows.is_empty() {
        return table.to_string();
    }

    let top = lines[0];
    let Some(inner) = top.strip_prefix('╭').and_then(|s| s.strip_suffix('╮')) else {
        return table.to_string();
    };

    let widths: Vec<usize> = inner.split('┬').map(|p| p.chars().count()).collect();
    if widths.len() <= AMOUNT_COLUMN + 1 {
        return table.to_string();
    }

    let left = &widths[..AMOUNT_COLUMN];
    let right = &widths[AMOUNT_COLUMN + 1..];
    let left_width = left.iter().sum::<usize>() + left.len() - 1;
    let amount_width = widths[AMOUNT_COLUMN];

    let dashes = |cols: &[usize], joint: &str| {
        cols.iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join(joint)
    };

    let mut out = lines[..lines.len() - 1].join("\n");
    out.push('\n');
    out.push_str(&format!(
        "├{}┼{}┼{}╯\n",
        dashes(left, "┴"),
        "─".repeat(amount_width),
        dashes(right, "┴"),
    ));

    for (idx, (label, value)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "│ {:>left$} │ {:>amount$} │\n",
            label,
            value,
            left = left_width - 2,
            amount = amount_width - 2
        ));
        if idx < rows.len() - 1 {
            out.push_str(&format!(
                "├{}┼{}┤\n",
                "─".repeat(left_width),
                "─".repeat(amount_width)
            ));
        }
    }

    out.push_str(&format!(
        "╰{}┴{}╯",
        "─".repeat(left_width),
        "─".repeat(amount_width)
    ));
    out
}

fn invoice_row(inv: &Invoice, currency_symbol: &str) -> InvoiceRow {
    InvoiceRow {
        id: inv.id,
        number: inv.number.clone().unwrap_or_else(|| "-".to_string()),
        date: inv.date.to_string(),
        due: inv
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
        amount: format_money(inv.amount, currency_symbol),
        status: inv.status.to_string(),
        description: inv.description.clone(),
    }
}

fn cmd_list(
    cfg_dir: &Path,
    filters: &FilterArgs,
    limit: Option<usize>,
    today: NaiveDate,
) -> Result<()> {
    let query = filters.to_query()?;
    let (config, board) = loaded_board(cfg_dir, today)?;
    let symbol = &config.billing.currency_symbol;

    let mut shown = board.query(&query);
    let matched = shown.len();
    if let Some(n) = limit {
        shown.truncate(n);
    }

    if shown.is_empty() {
        println!("No invoices found.");
        return Ok(());
    }

    let rows: Vec<InvoiceRow> = shown.iter().map(|inv| invoice_row(inv, symbol)).collect();
    let kpis = Kpis::compute(&shown, today);
    let total: f64 = shown.iter().map(|inv| inv.amount).sum();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    let table = add_amount_footer(
        &table,
        &[
            ("TOTAL", format_money(total, symbol)),
            ("OUTSTANDING", format_money(kpis.outstanding_total, symbol)),
            ("OVERDUE", format_money(kpis.overdue_total, symbol)),
        ],
    );
    println!("{table}");

    println!();
    println!("Showing {} of {} matching invoices", shown.len(), matched);
    Ok(())
}

fn cmd_summary(cfg_dir: &Path, today: NaiveDate) -> Result<()> {
    let (config, board) = loaded_board(cfg_dir, today)?;
    let symbol = &config.billing.currency_symbol;
    let visible = board.visible();
    let kpis = board.kpis(today);

    let describe = |inv: &Invoice| {
        format!(
            "{} due {} ({})",
            inv.label(),
            inv.due_or_issue_date(),
            format_money(inv.amount, symbol)
        )
    };

    println!("Billing Summary");
    println!("{}", "-".repeat(50));
    println!("Invoices:          {}", visible.len());
    println!(
        "Outstanding:       {}",
        format_money(kpis.outstanding_total, symbol)
    );
    println!(
        "Overdue:           {} ({} invoice(s))",
        format_money(kpis.overdue_total, symbol),
        kpis.overdue_count
    );
    println!(
        "Paid this month:   {}",
        format_money(kpis.paid_this_month, symbol)
    );
    println!(
        "Next due:          {}",
        kpis.next_due.map(describe).unwrap_or_else(|| "-".to_string())
    );

    let chips: Vec<String> = StatusChip::counts(&visible)
        .into_iter()
        .map(|(chip, count)| format!("{} {}", chip.label(), count))
        .collect();
    println!("Chips:             {}", chips.join(" | "));

    if let Some(alert) = kpis.attention(today) {
        println!();
        println!("Attention: {alert}");
    }

    Ok(())
}

fn cmd_set_status(cfg_dir: &Path, id: u64, status: UiStatus, today: NaiveDate) -> Result<()> {
    let (config, mut board) = loaded_board(cfg_dir, today)?;
    let updated = board.change_status(id, status, today)?;

    println!(
        "Invoice {} is now {} ({})",
        updated.label(),
        updated.status,
        format_money(updated.amount, &config.billing.currency_symbol)
    );
    if status == UiStatus::Overdue && updated.status != UiStatus::Overdue {
        println!("  Overdue is derived from the due date; stored as pending.");
    }
    Ok(())
}

fn cmd_upload_proof(cfg_dir: &Path, id: u64, file: &Path, today: NaiveDate) -> Result<()> {
    let proof = ProofFile::from_path(file)?;
    let (_, mut board) = loaded_board(cfg_dir, today)?;
    let updated = board.upload_proof(id, &proof, today)?;

    println!("Uploaded {} for invoice {}", proof.file_name, updated.label());
    if let Some(url) = &updated.proof_url {
        println!("  Proof: {url}");
    }
    Ok(())
}

fn cmd_download(
    cfg_dir: &Path,
    id: u64,
    output: Option<PathBuf>,
    today: NaiveDate,
) -> Result<()> {
    let (_, board) = loaded_board(cfg_dir, today)?;
    let (file_name, bytes) = board.download(id)?;

    let dir = output.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)?;
    let path = dir.join(file_name);
    fs::write(&path, bytes)?;

    println!("Saved {}", path.display());
    Ok(())
}

fn cmd_create(cfg_dir: &Path, draft: NewInvoice, today: NaiveDate) -> Result<()> {
    let (config, mut board) = open_board(cfg_dir)?;
    let created = board.create(draft, today)?;

    println!("Created invoice {}", created.label());
    let consultation = created
        .consultation_id
        .map_or_else(|| "-".to_string(), |c| format!("#{c}"));
    println!("  Consultation: {consultation}");
    println!(
        "  Amount:       {}",
        format_money(created.amount, &config.billing.currency_symbol)
    );
    println!("  Status:       {}", created.status);
    Ok(())
}

fn cmd_consultations(cfg_dir: &Path, query: &str, limit: Option<usize>) -> Result<()> {
    let (config, board) = open_board(cfg_dir)?;
    let limit = limit.unwrap_or(config.billing.consultation_search_limit);
    let found = board.search_consultations(query, limit)?;

    if found.is_empty() {
        println!("No consultations found.");
        return Ok(());
    }

    let rows: Vec<ConsultationRow> = found
        .into_iter()
        .map(|c| ConsultationRow {
            id: c.id,
            date: c
                .date
                .as_deref()
                .map(|d| d.chars().take(10).collect())
                .unwrap_or_else(|| "-".to_string()),
            child: c.child_name.unwrap_or_else(|| "-".to_string()),
            psychologist: c.psychologist_name.unwrap_or_else(|| "-".to_string()),
            status: c.status.unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

fn cmd_export(
    cfg_dir: &Path,
    filters: &FilterArgs,
    output: Option<PathBuf>,
    today: NaiveDate,
) -> Result<()> {
    let query = filters.to_query()?;
    let (_, board) = loaded_board(cfg_dir, today)?;
    let rows = board.query(&query);

    let path = output.unwrap_or_else(|| PathBuf::from(csv_file_name(today)));
    fs::write(&path, to_csv(&rows))?;

    println!("Exported {} invoices to {}", rows.len(), path.display());
    Ok(())
}
