use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use super::commands::EditArgs;
use crate::cache::SqliteCache;
use crate::config::WorkshopConfig;
use crate::demo::demo_orders;
use crate::entity::furniture::{parse_item_arg, total_units};
use crate::entity::{
    short_id, LifecycleState, RawFurnitureItem, Role, User, WorkOrder, WorkOrderDraft,
    WorkOrderRecord,
};
use crate::error::{FieldError, Result, WorkshopError};
use crate::session::{self, LocalSlots, NewUser, Session};
use crate::storage::{LoroStore, WorkshopStore};
use crate::urgency::{classify_order, countdown_label, days_remaining, Clock, SystemClock, UrgencyStatus};
use crate::view::{self, ViewFilter};
use crate::warnings::check_thresholds;
use crate::workflow::{AlwaysConfirm, Confirm, Workflow};

/// Asks on the terminal; anything but "y" declines.
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        eprint!("{} [y/N] ", prompt);
        let _ = io::stderr().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            return false;
        }
        input.trim().eq_ignore_ascii_case("y")
    }
}

/// Find the project root by looking for .maderogest/ or .git/
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(".maderogest").exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

fn require_session(slots: &LocalSlots) -> Result<Session> {
    Session::load(slots).ok_or(WorkshopError::NotLoggedIn)
}

/// Open the project, check the session and load the order collection.
fn open_workflow() -> Result<(Session, LocalSlots, Workflow<LoroStore>)> {
    let store = LoroStore::open(&find_project_root())?;
    let slots = LocalSlots::open(store.project_dir());
    let session = require_session(&slots)?;
    let workflow = Workflow::load(store, SystemClock)?;
    Ok((session, slots, workflow))
}

/// Gate for destructive commands; refuses to prompt without a terminal.
fn confirmer(force: bool) -> Result<Box<dyn Confirm>> {
    if force {
        return Ok(Box::new(AlwaysConfirm));
    }
    if !atty::is(atty::Stream::Stdin) {
        return Err(WorkshopError::NonInteractive);
    }
    Ok(Box::new(TerminalConfirm))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        WorkshopError::Validation(vec![FieldError {
            field: field.to_string(),
            message: format!("expected YYYY-MM-DD, got '{}'", value),
        }])
    })
}

fn parse_state(value: &str) -> Result<LifecycleState> {
    value.parse().map_err(WorkshopError::InvalidValue)
}

fn parse_items(args: &[String]) -> Vec<RawFurnitureItem> {
    args.iter()
        .filter_map(|arg| {
            let item = parse_item_arg(arg);
            if item.is_none() {
                eprintln!("Warning: ignoring empty item '{}'", arg);
            }
            item
        })
        .collect()
}

/// A work order plus its derived urgency, for JSON output.
#[derive(Serialize)]
struct OrderView<'a> {
    #[serde(flatten)]
    order: &'a WorkOrder,
    status: UrgencyStatus,
    days_remaining: i64,
}

impl<'a> OrderView<'a> {
    fn new(order: &'a WorkOrder, today: NaiveDate) -> Self {
        Self {
            order,
            status: classify_order(order, today),
            days_remaining: days_remaining(order.due_date, today),
        }
    }
}

fn print_order_line(order: &WorkOrder, today: NaiveDate) {
    println!(
        "  ({}) [{}] {}  {} - {}",
        order.short_id(),
        classify_order(order, today).label(),
        order.due_date.format("%d/%m/%Y"),
        order.name,
        countdown_label(order, today)
    );
    println!(
        "      {} | {} kinds, {} units",
        order.place,
        order.items.len(),
        total_units(&order.items)
    );
}

fn print_order_detail(order: &WorkOrder, today: NaiveDate) {
    println!("{} ({})", order.name, order.id);
    println!(
        "  Status:  {} - {}",
        classify_order(order, today).label(),
        countdown_label(order, today)
    );
    println!("  State:   {}", order.state.label());
    println!("  Place:   {}", order.place);
    println!("  Due:     {}", order.due_date.format("%d/%m/%Y"));
    println!("  Created: {} by {}", order.created_at.format("%Y-%m-%d %H:%M"), order.created_by);
    if let (Some(by), Some(at)) = (&order.edited_by, &order.edited_at) {
        println!("  Edited:  {} by {}", at.format("%Y-%m-%d %H:%M"), by);
    }

    println!(
        "\n  Furniture ({} kinds, {} units):",
        order.items.len(),
        total_units(&order.items)
    );
    if order.items.is_empty() {
        println!("    (none)");
    }
    for (i, item) in order.items.iter().enumerate() {
        println!("    {:02}. {}", i + 1, item.label());
    }

    if !order.notes.is_empty() {
        println!("\n  Notes: {}", order.notes);
    }
}

fn print_created(verb: &str, order: &WorkOrder, today: NaiveDate, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&OrderView::new(order, today))?);
    } else {
        println!(
            "{} work order ({}) - {} [{}, {}]",
            verb,
            order.short_id(),
            order.name,
            classify_order(order, today).label(),
            countdown_label(order, today)
        );
    }
    Ok(())
}

pub fn handle_init(email: String, password: String, name: String, demo: bool) -> Result<()> {
    let root = env::current_dir()?;

    let mut missing = Vec::new();
    if email.trim().is_empty() {
        missing.push(FieldError::required("email"));
    }
    if password.is_empty() {
        missing.push(FieldError::required("password"));
    }
    if !missing.is_empty() {
        return Err(WorkshopError::Validation(missing));
    }

    let store = LoroStore::init(&root)?;
    let admin = User::new(name, email.trim().to_string(), password, Role::Admin);
    store.upsert_user(&admin)?;

    println!("Initialized maderogest project in {}", root.display());
    println!("  Administrator: {} <{}>", admin.name, admin.email);

    if demo {
        let clock = SystemClock;
        let orders = demo_orders(clock.today(), clock.now(), &admin.id);
        for order in &orders {
            store.upsert_order(order)?;
        }
        println!("  Seeded {} sample work orders", orders.len());
    }

    Ok(())
}

pub fn handle_login(email: String, password: String) -> Result<()> {
    let store = LoroStore::open(&find_project_root())?;
    let mut slots = LocalSlots::open(store.project_dir());

    let session = session::login(&store, &email, &password)?;
    session.save(&mut slots)?;

    println!("Signed in as {} ({})", session.name, session.role);
    Ok(())
}

pub fn handle_logout() -> Result<()> {
    let store = LoroStore::open(&find_project_root())?;
    let mut slots = LocalSlots::open(store.project_dir());
    Session::clear(&mut slots)?;
    println!("Signed out.");
    Ok(())
}

pub fn handle_whoami() -> Result<()> {
    let store = LoroStore::open(&find_project_root())?;
    let slots = LocalSlots::open(store.project_dir());
    let session = require_session(&slots)?;
    println!("{} <{}> ({})", session.name, session.email, session.role);
    Ok(())
}

pub fn handle_add(
    name: String,
    place: String,
    due: String,
    state: String,
    items: Vec<String>,
    notes: String,
    json: bool,
) -> Result<()> {
    let (session, _slots, mut workflow) = open_workflow()?;

    let draft = WorkOrderDraft {
        name,
        place,
        due_date: Some(parse_date("due_date", &due)?),
        state: parse_state(&state)?,
        items: parse_items(&items),
        notes,
    };

    let order = workflow.create(&session, draft)?;
    print_created("Created", &order, workflow.today(), json)
}

pub fn handle_edit(args: EditArgs) -> Result<()> {
    let (session, _slots, mut workflow) = open_workflow()?;
    let existing = workflow.find(&args.id)?;
    let id = existing.id.clone();
    let mut draft = WorkOrderDraft::from_order(existing);

    if let Some(name) = args.name {
        draft.name = name;
    }
    if let Some(place) = args.place {
        draft.place = place;
    }
    if let Some(due) = args.due {
        draft.due_date = Some(parse_date("due_date", &due)?);
    }
    if let Some(state) = args.state {
        draft.state = parse_state(&state)?;
    }
    if args.clear_items {
        draft.items.clear();
    } else if !args.items.is_empty() {
        draft.items = parse_items(&args.items);
    }
    if let Some(notes) = args.notes {
        draft.notes = notes;
    }

    let order = workflow.update(&session, &id, draft)?;
    print_created("Updated", &order, workflow.today(), args.json)
}

pub fn handle_deliver(id: String, json: bool) -> Result<()> {
    let (session, _slots, mut workflow) = open_workflow()?;
    let order = workflow.mark_delivered(&session, &id)?;
    print_created("Delivered", &order, workflow.today(), json)
}

pub fn handle_delete(id: String, force: bool) -> Result<()> {
    let (session, _slots, mut workflow) = open_workflow()?;
    session.require_admin("delete work orders")?;

    let mut confirm = confirmer(force)?;
    let name = workflow.find(&id)?.name.clone();
    if workflow.delete(&session, &id, confirm.as_mut())? {
        println!("Deleted work order - {}", name);
    } else {
        println!("Cancelled.");
    }
    Ok(())
}

pub fn handle_list(filter: String, json: bool) -> Result<()> {
    let (_session, _slots, workflow) = open_workflow()?;
    let filter: ViewFilter = filter.parse().map_err(WorkshopError::InvalidValue)?;
    let today = workflow.today();
    let visible = workflow.view(filter);

    if json {
        let views: Vec<OrderView> = visible.iter().map(|o| OrderView::new(o, today)).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    let stats = view::stats(workflow.orders(), today);
    println!(
        "{} active | {} urgent | {} upcoming | {} delivered\n",
        stats.active, stats.urgent, stats.upcoming, stats.delivered
    );

    if visible.is_empty() {
        println!("No work orders found.");
    } else {
        println!("Work orders ({}):\n", filter);
        for order in visible {
            print_order_line(order, today);
        }
    }

    report_warnings(workflow.store());
    Ok(())
}

/// Threshold warnings from the cache; failures here never fail the command.
fn report_warnings(store: &LoroStore) {
    let Ok(cache) = SqliteCache::open(store.project_dir()) else {
        return;
    };
    if store.sync_cache(&cache).is_err() {
        return;
    }
    if let Ok(stats) = cache.get_stats() {
        for warning in check_thresholds(&stats, store.file_size()) {
            eprintln!("{}", warning);
        }
    }
}

pub fn handle_get(id: String, json: bool) -> Result<()> {
    let (_session, _slots, workflow) = open_workflow()?;
    let today = workflow.today();
    let order = workflow.find(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&OrderView::new(order, today))?);
    } else {
        print_order_detail(order, today);
    }
    Ok(())
}

pub fn handle_history(id: Option<String>, json: bool) -> Result<()> {
    let (session, _slots, workflow) = open_workflow()?;

    // Deleted orders are gone from the collection but keep their history.
    let order_id = match id {
        Some(id) => Some(
            workflow
                .find(&id)
                .map(|o| o.id.clone())
                .unwrap_or(id),
        ),
        None => None,
    };

    let entries = workflow.history(&session, order_id.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No history yet.");
    } else {
        for entry in entries {
            println!(
                "  {}  {:<16} {:<17} {} - {}",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.actor_name,
                entry.action.to_string(),
                entry.order_name,
                entry.detail
            );
        }
    }
    Ok(())
}

pub fn handle_search(query: String, json: bool) -> Result<()> {
    let (_session, _slots, workflow) = open_workflow()?;
    let store = workflow.store();

    let cache = SqliteCache::open(store.project_dir())?;
    store.sync_cache(&cache)?;
    let results = cache.search_orders(&query)?;

    if json {
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        let orders: Vec<OrderView> = workflow
            .orders()
            .iter()
            .filter(|o| ids.contains(&o.id.as_str()))
            .map(|o| OrderView::new(o, workflow.today()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&orders)?);
    } else if results.is_empty() {
        println!("No results for '{}'.", query);
    } else {
        for result in results {
            println!(
                "  ({}) [{}] {} {} - {}",
                short_id(&result.id),
                result.state,
                result.due_date,
                result.name,
                result.place
            );
            if let Some(snippet) = result.snippet {
                println!("      {}", snippet);
            }
        }
    }
    Ok(())
}

pub fn handle_digest(json: bool) -> Result<()> {
    let (_session, slots, workflow) = open_workflow()?;
    let digest = view::digest(workflow.orders(), workflow.today());
    let config = WorkshopConfig::load(&slots);

    if json {
        println!("{}", serde_json::to_string_pretty(&digest)?);
        return Ok(());
    }

    if digest.is_empty() {
        println!("No work orders due soon.");
        return Ok(());
    }

    if let Some(phone) = config.phone_digits() {
        println!("To: +{}\n", phone);
    }
    println!("{}", view::render_digest(&digest));
    Ok(())
}

pub fn handle_config_phone(number: Option<String>, clear: bool) -> Result<()> {
    let store = LoroStore::open(&find_project_root())?;
    let mut slots = LocalSlots::open(store.project_dir());
    require_session(&slots)?;

    let mut config = WorkshopConfig::load(&slots);

    if clear {
        config.notify_phone = None;
        config.save(&mut slots)?;
        println!("Notification phone cleared.");
    } else if let Some(number) = number {
        config.notify_phone = Some(number.trim().to_string());
        config.save(&mut slots)?;
        println!("Notification phone set to {}", number.trim());
    } else {
        match config.notify_phone {
            Some(phone) => println!("{}", phone),
            None => println!("No notification phone configured."),
        }
    }
    Ok(())
}

fn open_accounts() -> Result<(Session, LoroStore)> {
    let store = LoroStore::open(&find_project_root())?;
    let slots = LocalSlots::open(store.project_dir());
    let session = require_session(&slots)?;
    Ok((session, store))
}

pub fn handle_users_list(json: bool) -> Result<()> {
    let (session, store) = open_accounts()?;
    let users = session::list_users(&store, &session)?;

    if json {
        // Never print passwords
        let listed: Vec<serde_json::Value> = users
            .iter()
            .map(|u| {
                serde_json::json!({
                    "id": u.id,
                    "name": u.name,
                    "email": u.email,
                    "role": u.role,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listed)?);
    } else {
        for user in users {
            let marker = if user.id == session.user_id { " (you)" } else { "" };
            println!(
                "  ({}) [{}] {} <{}>{}",
                short_id(&user.id),
                user.role,
                user.name,
                user.email,
                marker
            );
        }
    }
    Ok(())
}

pub fn handle_users_add(name: String, email: String, password: String, role: String) -> Result<()> {
    let (session, store) = open_accounts()?;
    let role: Role = role.parse().map_err(WorkshopError::InvalidValue)?;

    let user = session::add_user(
        &store,
        &session,
        NewUser {
            name,
            email,
            password,
            role,
        },
    )?;

    println!("Created user {} <{}> ({})", user.name, user.email, user.role);
    Ok(())
}

pub fn handle_users_delete(id: String, force: bool) -> Result<()> {
    let (session, store) = open_accounts()?;
    session.require_admin("manage users")?;

    let mut confirm = confirmer(force)?;
    if session::delete_user(&store, &session, &id, confirm.as_mut())? {
        println!("Deleted user {}", id);
    } else {
        println!("Cancelled.");
    }
    Ok(())
}

pub fn handle_import(file: PathBuf) -> Result<()> {
    let (session, _slots, mut workflow) = open_workflow()?;
    let records = read_records(&file)?;
    let count = workflow.import(&session, records)?;
    println!("Imported {} work orders from {}", count, file.display());
    Ok(())
}

fn read_records(path: &Path) -> Result<Vec<WorkOrderRecord>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
