use std::path::Path;
use std::process::{Command, Output};

use chrono::{Duration, Local};
use tempfile::TempDir;

fn maderogest_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_maderogest"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    maderogest_cmd().current_dir(dir).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn in_days(n: i64) -> String {
    (Local::now().date_naive() + Duration::days(n))
        .format("%Y-%m-%d")
        .to_string()
}

/// Initialized project with the administrator signed in.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let output = run(
        tmp.path(),
        &["init", "--email=admin@workshop.test", "--password=admin123", "--name=Admin"],
    );
    assert!(output.status.success(), "init failed: {}", stderr(&output));

    let output = run(
        tmp.path(),
        &["login", "--email=admin@workshop.test", "--password=admin123"],
    );
    assert!(output.status.success(), "login failed: {}", stderr(&output));
    tmp
}

fn add_order(dir: &Path, name: &str, due: &str, items: &[&str]) -> serde_json::Value {
    let due_arg = format!("--due={}", due);
    let mut args = vec!["add", name, "--place=Av. Santa Fe 2450", due_arg.as_str(), "--json"];
    let item_args: Vec<String> = items.iter().map(|i| format!("--item={}", i)).collect();
    args.extend(item_args.iter().map(|s| s.as_str()));

    let output = run(dir, &args);
    assert!(output.status.success(), "add failed: {}", stderr(&output));
    serde_json::from_str(&stdout(&output)).unwrap()
}

#[test]
fn test_init_creates_project_directory() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["init", "--email=a@b.test", "--password=pw"]);

    assert!(output.status.success());
    assert!(tmp.path().join(".maderogest").exists());
    assert!(tmp.path().join(".maderogest/loro.db").exists());
    let ignore = std::fs::read_to_string(tmp.path().join(".maderogest/.gitignore")).unwrap();
    assert!(ignore.contains("local.json"));
}

#[test]
fn test_init_twice_fails() {
    let tmp = project();

    let output = run(tmp.path(), &["init", "--email=a@b.test", "--password=pw"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Already initialized"));
}

#[test]
fn test_command_without_init_fails() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["list"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Not in a maderogest project"));
}

#[test]
fn test_command_without_login_fails() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init", "--email=a@b.test", "--password=pw"]);

    let output = run(tmp.path(), &["list"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Not logged in"));
}

#[test]
fn test_login_is_case_insensitive_on_email() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init", "--email=admin@workshop.test", "--password=admin123"]);

    let output = run(
        tmp.path(),
        &["login", "--email=ADMIN@Workshop.test", "--password=admin123"],
    );
    assert!(output.status.success());

    let output = run(tmp.path(), &["whoami"]);
    assert!(stdout(&output).contains("admin@workshop.test"));
}

#[test]
fn test_login_wrong_password_fails() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init", "--email=admin@workshop.test", "--password=admin123"]);

    let output = run(
        tmp.path(),
        &["login", "--email=admin@workshop.test", "--password=nope"],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Incorrect email or password"));
}

#[test]
fn test_logout_forgets_session() {
    let tmp = project();

    assert!(run(tmp.path(), &["logout"]).status.success());

    let output = run(tmp.path(), &["whoami"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Not logged in"));
}

#[test]
fn test_add_normalizes_items_and_classifies() {
    let tmp = project();

    let order = add_order(tmp.path(), "Casa Palermo", &in_days(3), &["Mesa:2", "Silla"]);

    assert_eq!(order["name"], "Casa Palermo");
    assert_eq!(order["status"], "urgent");
    assert_eq!(order["days_remaining"], 3);
    assert_eq!(order["items"][0]["name"], "Mesa");
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(order["items"][1]["quantity"], 1);
    assert_eq!(order["created_by"].as_str().map(|s| s.is_empty()), Some(false));
}

#[test]
fn test_add_missing_fields_reports_each() {
    let tmp = project();

    let output = run(
        tmp.path(),
        &["add", " ", "--place=", &format!("--due={}", in_days(1))],
    );

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("name"));
    assert!(err.contains("place"));
}

#[test]
fn test_add_rejects_malformed_date() {
    let tmp = project();

    let output = run(tmp.path(), &["add", "Casa", "--place=Thames 1860", "--due=14/10/2026"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("due_date"));
}

#[test]
fn test_list_orders_due_first_and_done_last() {
    let tmp = project();
    add_order(tmp.path(), "Later", &in_days(30), &[]);
    let first = add_order(tmp.path(), "Sooner", &in_days(2), &[]);
    add_order(tmp.path(), "Middle", &in_days(10), &[]);

    let id = first["id"].as_str().unwrap();
    assert!(run(tmp.path(), &["deliver", id]).status.success());

    let output = run(tmp.path(), &["list", "--json"]);
    assert!(output.status.success());
    let list: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    let names: Vec<&str> = list.iter().map(|o| o["name"].as_str().unwrap()).collect();

    assert_eq!(names, vec!["Middle", "Later", "Sooner"]);
    assert_eq!(list[2]["status"], "done");
}

#[test]
fn test_list_filter_urgent_includes_overdue() {
    let tmp = project();
    add_order(tmp.path(), "Overdue", &in_days(-2), &[]);
    add_order(tmp.path(), "Urgent", &in_days(7), &[]);
    add_order(tmp.path(), "Warning", &in_days(8), &[]);

    let output = run(tmp.path(), &["list", "--filter=urgent", "--json"]);
    let list: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    let names: Vec<&str> = list.iter().map(|o| o["name"].as_str().unwrap()).collect();

    assert_eq!(names, vec!["Overdue", "Urgent"]);
}

#[test]
fn test_list_rejects_unknown_filter() {
    let tmp = project();

    let output = run(tmp.path(), &["list", "--filter=soon"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid filter"));
}

#[test]
fn test_edit_keeps_creator_and_stamps_editor() {
    let tmp = project();
    let order = add_order(tmp.path(), "Oficinas", &in_days(5), &["Escritorio:6"]);
    let id = order["id"].as_str().unwrap();

    let output = run(tmp.path(), &["edit", id, "--place=Florida 620", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let edited: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

    assert_eq!(edited["place"], "Florida 620");
    assert_eq!(edited["created_by"], order["created_by"]);
    assert_eq!(edited["created_at"], order["created_at"]);
    assert_eq!(edited["edited_by"], order["created_by"]);
    assert_eq!(edited["items"][0]["quantity"], 6);
}

#[test]
fn test_get_by_prefix() {
    let tmp = project();
    let order = add_order(tmp.path(), "Dúplex San Isidro", &in_days(45), &[]);
    let id = order["id"].as_str().unwrap();

    let output = run(tmp.path(), &["get", &id[..8]]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Dúplex San Isidro"));
    assert!(out.contains("ON TIME"));
}

#[test]
fn test_delete_and_history() {
    let tmp = project();
    let order = add_order(tmp.path(), "Estudio Belgrano", &in_days(4), &[]);
    let id = order["id"].as_str().unwrap().to_string();

    let output = run(tmp.path(), &["delete", &id, "--force"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(tmp.path(), &["get", &id]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("not found"));

    let output = run(tmp.path(), &["history", &id, "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let entries: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    let actions: Vec<&str> = entries.iter().map(|e| e["action"].as_str().unwrap()).collect();

    assert_eq!(actions, vec!["deleted", "created"]);
    assert_eq!(entries[0]["detail"], "Order deleted");
    assert_eq!(entries[0]["order_name"], "Estudio Belgrano");
}

#[test]
fn test_delete_without_force_in_pipe_fails() {
    let tmp = project();
    let order = add_order(tmp.path(), "Casa", &in_days(4), &[]);
    let id = order["id"].as_str().unwrap();

    let output = maderogest_cmd()
        .current_dir(tmp.path())
        .args(["delete", id])
        .stdin(std::process::Stdio::null())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("--force"));
}

#[test]
fn test_operator_cannot_delete_or_read_history() {
    let tmp = project();
    let order = add_order(tmp.path(), "Casa", &in_days(4), &[]);
    let id = order["id"].as_str().unwrap().to_string();

    let output = run(
        tmp.path(),
        &["users", "add", "Carlos", "--email=carlos@workshop.test", "--password=op123"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    run(
        tmp.path(),
        &["login", "--email=carlos@workshop.test", "--password=op123"],
    );

    let output = run(tmp.path(), &["delete", &id, "--force"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Only administrators"));

    let output = run(tmp.path(), &["history"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Only administrators"));

    // Operators can still deliver
    let output = run(tmp.path(), &["deliver", &id, "--json"]);
    assert!(output.status.success());
    let delivered: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(delivered["state"], "done");
}

#[test]
fn test_users_add_duplicate_email_fails() {
    let tmp = project();

    let output = run(
        tmp.path(),
        &["users", "add", "Other", "--email=Admin@Workshop.test", "--password=x"],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("already registered"));
}

#[test]
fn test_users_list_hides_passwords() {
    let tmp = project();

    let output = run(tmp.path(), &["users", "list", "--json"]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("admin@workshop.test"));
    assert!(!out.contains("admin123"));
}

#[test]
fn test_demo_seed_and_digest() {
    let tmp = TempDir::new().unwrap();
    run(
        tmp.path(),
        &["init", "--email=admin@workshop.test", "--password=admin123", "--demo"],
    );
    run(
        tmp.path(),
        &["login", "--email=admin@workshop.test", "--password=admin123"],
    );
    run(tmp.path(), &["config", "phone", "+54 9 11 5555-1234"]);

    let output = run(tmp.path(), &["digest"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("To: +5491155551234"));
    assert!(out.contains("MaderoGest daily summary"));
    assert!(out.contains("Departamento Barrio Norte"));
    assert!(out.contains("Casa Palermo Soho"));
    assert!(!out.contains("Estudio Belgrano"));
    assert!(out.contains("Active orders: 4"));
}

#[test]
fn test_search_finds_items_and_places() {
    let tmp = project();
    add_order(tmp.path(), "Casa", &in_days(4), &["Biblioteca esquinera:6"]);
    add_order(tmp.path(), "Oficina", &in_days(9), &["Escritorio"]);

    let output = run(tmp.path(), &["search", "biblioteca"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Casa"));
    assert!(!out.contains("Oficina"));
}

#[test]
fn test_import_legacy_records() {
    let tmp = project();
    let file = tmp.path().join("export.json");
    let records = serde_json::json!([
        {
            "nombre": "Legacy order",
            "lugar": "Arribeños 2100",
            "fecha": in_days(12),
            "estado": "en_proceso",
            "muebles": ["Mesa ratona", {"nombre": "Estante", "cantidad": "4"}]
        }
    ]);
    std::fs::write(&file, records.to_string()).unwrap();

    let output = run(tmp.path(), &["import", file.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(tmp.path(), &["list", "--json"]);
    let list: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["state"], "in_progress");
    assert_eq!(list[0]["status"], "warning");
    assert_eq!(list[0]["items"][0]["name"], "Mesa ratona");
    assert_eq!(list[0]["items"][1]["quantity"], 4);
}

#[test]
fn test_search_lists_imported_non_ascii_ids() {
    let tmp = project();
    let file = tmp.path().join("export.json");
    let records = serde_json::json!([
        {
            "id": "ñññññ",
            "nombre": "Taller Núñez",
            "lugar": "Arribeños 2100",
            "fecha": in_days(4),
            "muebles": ["Mesa"]
        }
    ]);
    std::fs::write(&file, records.to_string()).unwrap();
    let output = run(tmp.path(), &["import", file.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(tmp.path(), &["search", "Mesa"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("(ñññññ)"));

    let output = run(tmp.path(), &["get", "ñññ"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Taller Núñez"));
}

#[test]
fn test_search_with_fts_syntax_does_not_fail() {
    let tmp = project();
    add_order(tmp.path(), "Casa", &in_days(4), &["Mesa:2"]);

    for query in ["Mesa:2", "\"Mesa", "NOT"] {
        let output = run(tmp.path(), &["search", query]);
        assert!(output.status.success(), "{}: {}", query, stderr(&output));
    }
}
