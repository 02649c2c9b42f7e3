//! `badgeboard` - CLI for the site security records
//!
//! This binary provides the command-line interface for keeping employees,
//! BOC and VRF credentials, presence and documents in one local database.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use serde::Serialize;

use badgeboard::attachment::NewAttachment;
use badgeboard::cli::{
    render_table, AirportCommand, AttachCommand, BackupCommand, Cli, Command, ConfigCommand,
    CredentialCommand, CredentialFields, EmployeeCommand, ExportCommand, ExportTarget,
    ImportCommand, ImportTarget, NotifyCommand, OutputFormat, TabCommand,
};
use badgeboard::engine::{CredentialState, ExpiryBand, PobSummary, Presence};
use badgeboard::interchange::{backup, tabular, DEFAULT_BACKUP_FILE};
use badgeboard::model::{
    Boc, Credential, CredentialDraft, CredentialKind, Employee, Snapshot, Vrf,
};
use badgeboard::query::{dispatch, expiring, AirportSchedule, LogSink};
use badgeboard::{init_logging, Config, Registry, Storage};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Only the CLI reads the wall clock
    let now = Utc::now();

    match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd),
        Command::Employee(cmd) => handle_employee(&mut open_registry(&config)?, cmd, now),
        Command::Boc(cmd) => handle_credential::<Boc>(&mut open_registry(&config)?, cmd, now),
        Command::Vrf(cmd) => handle_credential::<Vrf>(&mut open_registry(&config)?, cmd, now),
        Command::Pob(cmd) => handle_pob(&open_registry(&config)?, cmd.json, now),
        Command::Airport(cmd) => handle_airport(&open_registry(&config)?, &config, &cmd, now),
        Command::Notify(cmd) => handle_notify(&open_registry(&config)?, &config, &cmd, now),
        Command::Import(cmd) => handle_import(&mut open_registry(&config)?, &cmd, now),
        Command::Export(cmd) => handle_export(&open_registry(&config)?, &config, &cmd, now),
        Command::Backup(cmd) => handle_backup(&mut open_registry(&config)?, cmd),
        Command::Attach(cmd) => handle_attach(&open_registry(&config)?, &config, cmd, now),
        Command::Tab(cmd) => handle_tab(&open_registry(&config)?, cmd),
        Command::Stats(cmd) => handle_stats(&open_registry(&config)?, cmd.json),
    }
}

const EMPLOYEE_TABLE: &[&str] = &[
    "No",
    "Name",
    "Position",
    "POB",
    "BOC",
    "BOC Days",
    "Badge/VRF",
    "VRF Days",
    "Id",
];

const ATTACHMENT_TABLE: &[&str] = &["Id", "Category", "Name", "Type", "Bytes", "Uploaded"];

fn open_registry(config: &Config) -> Result<Registry> {
    let path = config.database_path();
    let storage =
        Storage::open(&path).with_context(|| format!("opening database {}", path.display()))?;
    Ok(Registry::open(storage)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn days_cell(days: i64) -> String {
    match ExpiryBand::of(days) {
        ExpiryBand::Expired => format!("{days} expired"),
        ExpiryBand::Critical => format!("{days} critical"),
        ExpiryBand::Warning => format!("{days} warning"),
        ExpiryBand::Ok => days.to_string(),
    }
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

// === Employees ===

fn handle_employee(
    registry: &mut Registry,
    cmd: EmployeeCommand,
    now: DateTime<Utc>,
) -> Result<()> {
    match cmd {
        EmployeeCommand::Add(fields) => {
            let employee = registry.add_employee(fields.into(), now)?;
            println!("Added {} (id {})", employee.full_name(), employee.id);
        }
        EmployeeCommand::Edit { id, fields } => {
            let employee = registry.update_employee(&id, fields.into(), now)?;
            println!("Updated {} ({})", employee.full_name(), CredentialState::of(&employee));
        }
        EmployeeCommand::Delete { id } => {
            let employee = registry.delete_employee(&id, now)?;
            println!("Deleted {}", employee.full_name());
        }
        EmployeeCommand::List(list) => {
            let view = registry.view(now);
            let mut rows = list.query.filter().apply(&view.employees, now);
            list.query.sort_config().sort(&mut rows);
            print_employees(&rows, list.format, now)?;
        }
        EmployeeCommand::Show { id, json } => {
            let employee = registry.employee(&id, now)?;
            if json {
                print_json(&employee)?;
            } else {
                let documents = registry.attachments(&id, None)?.len();
                print_employee(&employee, documents, now);
            }
        }
    }
    Ok(())
}

fn print_employees(
    employees: &[&Employee],
    format: OutputFormat,
    now: DateTime<Utc>,
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(employees)?,
        OutputFormat::Plain => {
            for e in employees {
                println!(
                    "{}. {} [{}] {} ({})",
                    e.no,
                    e.full_name(),
                    Presence::of(e, now),
                    or_dash(&e.position),
                    e.id
                );
            }
        }
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = employees
                .iter()
                .map(|e| {
                    let (access, access_days) = if e.has_badge() {
                        (format!("badge {}", e.badge), "-".to_string())
                    } else {
                        (or_dash(&e.vrf_number), days_cell(e.vrf_expiry_days))
                    };
                    vec![
                        e.no.to_string(),
                        e.full_name(),
                        or_dash(&e.position),
                        Presence::of(e, now).to_string(),
                        or_dash(&e.boc_number),
                        days_cell(e.boc_expiry_days),
                        access,
                        access_days,
                        e.id.clone(),
                    ]
                })
                .collect();
            println!("{}", render_table(EMPLOYEE_TABLE, &rows));
            println!("{} employee(s)", employees.len());
        }
    }
    Ok(())
}

fn print_employee(e: &Employee, documents: usize, now: DateTime<Utc>) {
    println!("{} (no. {})", e.full_name(), e.no);
    println!("  Id:           {}", e.id);
    println!("  Nationality:  {}", or_dash(&e.nationality));
    println!("  Passport:     {}", or_dash(&e.passport_number));
    println!("  Position:     {}", or_dash(&e.position));
    println!("  Arrival:      {}", or_dash(&e.arrival));
    println!("  Departure:    {}", or_dash(&e.departure));
    println!("  POB:          {}", Presence::of(e, now));
    println!("  Credentials:  {}", CredentialState::of(e));
    println!(
        "  BOC:          {} (expires {}, {} days)",
        or_dash(&e.boc_number),
        or_dash(&e.boc_expiry),
        days_cell(e.boc_expiry_days)
    );
    if e.has_badge() {
        println!("  Badge:        {}", e.badge);
    } else {
        println!(
            "  VRF:          {} (expires {}, {} days)",
            or_dash(&e.vrf_number),
            or_dash(&e.vrf_expiry),
            days_cell(e.vrf_expiry_days)
        );
    }
    println!("  E-mail:       {}", or_dash(&e.email));
    println!("  Mobile:       {}", or_dash(&e.mobile_phone));
    println!("  Blood type:   {}", or_dash(&e.blood_type));
    println!("  Note:         {}", or_dash(&e.note));
    println!("  Documents:    {documents}");
}

// === Credentials ===

/// Registry entry points for one credential collection.
trait CredentialOps: Credential + Serialize {
    fn records(snapshot: &Snapshot) -> &[Self];
    fn add(
        registry: &mut Registry,
        draft: CredentialDraft,
        now: DateTime<Utc>,
    ) -> badgeboard::Result<Self>;
    fn update(
        registry: &mut Registry,
        id: &str,
        draft: CredentialDraft,
        now: DateTime<Utc>,
    ) -> badgeboard::Result<Self>;
    fn candidates(
        registry: &Registry,
        employee_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> badgeboard::Result<Vec<Self>>;
}

impl CredentialOps for Boc {
    fn records(snapshot: &Snapshot) -> &[Self] {
        &snapshot.bocs
    }

    fn add(
        registry: &mut Registry,
        draft: CredentialDraft,
        now: DateTime<Utc>,
    ) -> badgeboard::Result<Self> {
        registry.add_boc(draft, now)
    }

    fn update(
        registry: &mut Registry,
        id: &str,
        draft: CredentialDraft,
        now: DateTime<Utc>,
    ) -> badgeboard::Result<Self> {
        registry.update_boc(id, draft, now)
    }

    fn candidates(
        registry: &Registry,
        employee_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> badgeboard::Result<Vec<Self>> {
        registry.boc_candidates(employee_id, now)
    }
}

impl CredentialOps for Vrf {
    fn records(snapshot: &Snapshot) -> &[Self] {
        &snapshot.vrfs
    }

    fn add(
        registry: &mut Registry,
        draft: CredentialDraft,
        now: DateTime<Utc>,
    ) -> badgeboard::Result<Self> {
        registry.add_vrf(draft, now)
    }

    fn update(
        registry: &mut Registry,
        id: &str,
        draft: CredentialDraft,
        now: DateTime<Utc>,
    ) -> badgeboard::Result<Self> {
        registry.update_vrf(id, draft, now)
    }

    fn candidates(
        registry: &Registry,
        employee_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> badgeboard::Result<Vec<Self>> {
        registry.vrf_candidates(employee_id, now)
    }
}

fn handle_credential<T: CredentialOps>(
    registry: &mut Registry,
    cmd: CredentialCommand,
    now: DateTime<Utc>,
) -> Result<()> {
    match cmd {
        CredentialCommand::Add(fields) => {
            let record = T::add(registry, fields.merge_into(CredentialDraft::default()), now)?;
            println!("Added {} {} ({})", T::KIND, record.number(), record.status());
        }
        CredentialCommand::Edit { key, fields } => {
            let record = edit_credential::<T>(registry, &key, fields, now)?;
            println!("Updated {} {} ({})", T::KIND, record.number(), record.status());
        }
        CredentialCommand::List { status, format } => {
            let view = registry.view(now);
            let records: Vec<&T> = T::records(&view)
                .iter()
                .filter(|r| status.map_or(true, |s| r.status() == s))
                .collect();
            print_credentials(&records, &view, format)?;
        }
        CredentialCommand::Candidates { employee, format } => {
            let records = T::candidates(registry, employee.as_deref(), now)?;
            let view = registry.view(now);
            print_credentials(&records.iter().collect::<Vec<_>>(), &view, format)?;
        }
    }
    Ok(())
}

fn edit_credential<T: CredentialOps>(
    registry: &mut Registry,
    key: &str,
    fields: CredentialFields,
    now: DateTime<Utc>,
) -> Result<T> {
    let view = registry.view(now);
    let records = T::records(&view);
    let Some(current) = records
        .iter()
        .find(|r| r.id() == key)
        .or_else(|| records.iter().find(|r| r.number() == key))
    else {
        bail!("{} not found: {key}", T::KIND);
    };
    let id = current.id().to_string();
    let draft = fields.merge_into(current.to_draft());
    Ok(T::update(registry, &id, draft, now)?)
}

fn print_credentials<T: CredentialOps>(
    records: &[&T],
    view: &Snapshot,
    format: OutputFormat,
) -> Result<()> {
    let holder = |r: &T| {
        r.assigned_employee_id()
            .and_then(|id| view.employee(id))
            .map_or_else(|| "-".to_string(), Employee::full_name)
    };
    let with_access = T::KIND == CredentialKind::Vrf;

    match format {
        OutputFormat::Json => print_json(records)?,
        OutputFormat::Plain => {
            for r in records {
                println!(
                    "{} {} expires {} ({}) {} holder {}",
                    T::KIND,
                    r.number(),
                    or_dash(r.expiry()),
                    days_cell(r.expiry_days()),
                    r.status(),
                    holder(r)
                );
            }
        }
        OutputFormat::Table => {
            let mut headers = vec!["Number", "Issued", "Expiry", "Days", "Status", "Holder"];
            if with_access {
                headers.push("Access");
            }
            headers.push("Comments");

            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|r| {
                    let mut row = vec![
                        r.number().to_string(),
                        or_dash(r.issued()),
                        or_dash(r.expiry()),
                        days_cell(r.expiry_days()),
                        r.status().to_string(),
                        holder(r),
                    ];
                    if with_access {
                        row.push(or_dash(r.access()));
                    }
                    row.push(or_dash(r.comments().unwrap_or_default()));
                    row
                })
                .collect();
            println!("{}", render_table(&headers, &rows));
        }
    }
    Ok(())
}

// === Queries ===

fn handle_pob(registry: &Registry, json: bool, now: DateTime<Utc>) -> Result<()> {
    let summary = PobSummary::count(&registry.snapshot().employees, now);
    if json {
        print_json(&summary)?;
    } else {
        println!("POB (on site):  {}", summary.inside);
        println!("Off site:       {}", summary.outside);
        println!("Total:          {}", summary.total);
    }
    Ok(())
}

fn schedule_window(config: &Config, days: Option<i64>) -> Result<Duration> {
    let days = days.unwrap_or(config.airport.window_days);
    if days < 1 {
        bail!("the schedule window must be at least one day");
    }
    Ok(Duration::days(days))
}

fn handle_airport(
    registry: &Registry,
    config: &Config,
    cmd: &AirportCommand,
    now: DateTime<Utc>,
) -> Result<()> {
    let window = schedule_window(config, cmd.days)?;
    let schedule = AirportSchedule::build(
        &registry.snapshot().employees,
        now,
        window,
        cmd.search.as_deref(),
    );

    match cmd.format {
        OutputFormat::Json => print_json(&schedule)?,
        OutputFormat::Plain => {
            let sections = [
                ("Arrivals", &schedule.arrivals),
                ("Departures", &schedule.departures),
            ];
            for (title, entries) in sections {
                println!("{title}:");
                if entries.is_empty() {
                    println!("  none");
                }
                for entry in entries {
                    println!(
                        "  {} {}  {} ({})",
                        entry.date_label(),
                        entry.time_label(),
                        entry.name,
                        or_dash(&entry.position)
                    );
                }
            }
        }
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = schedule
                .rows()
                .map(|entry| {
                    vec![
                        entry.movement.to_string(),
                        entry.name.clone(),
                        or_dash(&entry.position),
                        entry.date_label(),
                        entry.time_label(),
                    ]
                })
                .collect();
            println!("{}", render_table(tabular::SCHEDULE_HEADERS, &rows));
        }
    }
    Ok(())
}

fn handle_notify(
    registry: &Registry,
    config: &Config,
    cmd: &NotifyCommand,
    now: DateTime<Utc>,
) -> Result<()> {
    let threshold = cmd.days.unwrap_or(config.alerts.expiry_warning_days);
    let notifications = expiring(&registry.view(now), threshold);

    if cmd.dry_run {
        match cmd.format {
            OutputFormat::Json => print_json(&notifications)?,
            _ => {
                for n in &notifications {
                    println!("{}: {}", n.subject(), n.message());
                }
            }
        }
        return Ok(());
    }

    let mut sink = LogSink::new(config.alerts.recipient.clone());
    let sent = dispatch(&mut sink, &notifications)?;
    println!("Sent {sent} expiry notification(s)");
    Ok(())
}

// === Interchange ===

fn handle_import(registry: &mut Registry, cmd: &ImportCommand, now: DateTime<Utc>) -> Result<()> {
    let file = File::open(&cmd.file).with_context(|| format!("opening {}", cmd.file.display()))?;
    let report = match cmd.target {
        ImportTarget::Employees => registry.import_employees(tabular::read_employees(file)?, now)?,
        ImportTarget::Bocs => registry.import_bocs(tabular::read_bocs(file)?, now)?,
        ImportTarget::Vrfs => registry.import_vrfs(tabular::read_vrfs(file)?, now)?,
    };
    println!("Imported {} record(s), skipped {}", report.added, report.skipped);
    Ok(())
}

fn handle_export(
    registry: &Registry,
    config: &Config,
    cmd: &ExportCommand,
    now: DateTime<Utc>,
) -> Result<()> {
    let output: Box<dyn Write> = match &cmd.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    let view = registry.view(now);
    match cmd.target {
        ExportTarget::Employees => {
            let mut rows = cmd.query.filter().apply(&view.employees, now);
            cmd.query.sort_config().sort(&mut rows);
            tabular::write_employees(output, &rows, now)?;
        }
        ExportTarget::Bocs => tabular::write_bocs(output, &view.bocs)?,
        ExportTarget::Vrfs => tabular::write_vrfs(output, &view.vrfs)?,
        ExportTarget::Airport => {
            let window = schedule_window(config, None)?;
            let schedule = AirportSchedule::build(&view.employees, now, window, None);
            tabular::write_schedule(output, &schedule)?;
        }
    }
    Ok(())
}

fn handle_backup(registry: &mut Registry, cmd: BackupCommand) -> Result<()> {
    match cmd {
        BackupCommand::Save { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_FILE));
            backup::save(&registry.backup(), &path)?;
            println!("Saved backup to {}", path.display());
        }
        BackupCommand::Restore { file, yes } => {
            let snapshot = backup::load(&file)?;
            if !yes {
                println!(
                    "This will replace {} stored record(s) with {} from {}.",
                    registry.snapshot().len(),
                    snapshot.len(),
                    file.display()
                );
                println!("Use --yes to confirm.");
                return Ok(());
            }
            registry.restore(snapshot)?;
            println!("Restored from {}", file.display());
        }
    }
    Ok(())
}

// === Attachments ===

fn handle_attach(
    registry: &Registry,
    config: &Config,
    cmd: AttachCommand,
    now: DateTime<Utc>,
) -> Result<()> {
    match cmd {
        AttachCommand::Upload {
            employee,
            category,
            file,
        } => {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .with_context(|| format!("{} is not a file", file.display()))?;
            let content =
                fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let upload =
                NewAttachment::from_upload(employee, category, name, content, &config.attachments)?;
            let stored = registry.attach(&upload, now)?;
            if stored.deduplicated {
                println!("Identical file already stored as attachment {}", stored.id);
            } else {
                println!("Stored attachment {}", stored.id);
            }
        }
        AttachCommand::List {
            employee,
            category,
            format,
        } => {
            let attachments = registry.attachments(&employee, category)?;
            match format {
                OutputFormat::Json => print_json(&attachments)?,
                OutputFormat::Plain => {
                    for a in &attachments {
                        println!("{} {} {} ({} bytes)", a.id, a.category, a.name, a.size_bytes);
                    }
                }
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = attachments
                        .iter()
                        .map(|a| {
                            vec![
                                a.id.to_string(),
                                a.category.to_string(),
                                a.name.clone(),
                                a.mime_type.clone(),
                                a.size_bytes.to_string(),
                                a.uploaded_at.format("%Y-%m-%d %H:%M").to_string(),
                            ]
                        })
                        .collect();
                    println!("{}", render_table(ATTACHMENT_TABLE, &rows));
                }
            }
        }
        AttachCommand::Get { id, output } => {
            let attachment = registry.attachment(id)?;
            let path = output.unwrap_or_else(|| PathBuf::from(&attachment.meta.name));
            fs::write(&path, &attachment.content)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} to {}", attachment.meta.name, path.display());
        }
        AttachCommand::Remove { id } => {
            registry.remove_attachment(id)?;
            println!("Removed attachment {id}");
        }
    }
    Ok(())
}

// === Preferences and status ===

fn handle_tab(registry: &Registry, cmd: TabCommand) -> Result<()> {
    match cmd {
        TabCommand::Show => println!("{}", registry.active_tab()?),
        TabCommand::Set { tab } => {
            registry.set_active_tab(tab)?;
            println!("Active tab set to {tab}");
        }
    }
    Ok(())
}

fn handle_stats(registry: &Registry, json: bool) -> Result<()> {
    let stats = registry.storage().stats()?;
    if json {
        print_json(&stats)?;
    } else {
        println!("badgeboard status");
        println!("-----------------");
        println!("Database:      {}", registry.storage().path().display());
        println!("Schema:        v{}", stats.schema_version);
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Employees:     {}", stats.employees);
        println!("BOCs:          {}", stats.bocs);
        println!("VRFs:          {}", stats.vrfs);
        println!(
            "Attachments:   {} ({} bytes)",
            stats.attachments, stats.attachment_bytes
        );
        match stats.last_saved {
            Some(at) => println!("Last saved:    {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("Last saved:    never"),
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                print_json(config)?;
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Alerts]");
                println!("  Warning days:       {}", config.alerts.expiry_warning_days);
                println!(
                    "  Recipient:          {}",
                    config.alerts.recipient.as_deref().unwrap_or("-")
                );
                println!();
                println!("[Airport]");
                println!("  Window days:        {}", config.airport.window_days);
                println!();
                println!("[Attachments]");
                println!("  Max size (bytes):   {}", config.attachments.max_size_bytes);
                println!(
                    "  Allowed types:      {}",
                    config.attachments.allowed_mime_types.join(", ")
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
