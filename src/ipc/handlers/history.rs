use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use chrono::Local;
use serde_json::json;
use uuid::Uuid;

/// Appends a calculation record in insert order. Best-effort: history is a
/// side-output, and a failed write must not hide a computed result. Without
/// a selected workspace there is nothing to write to.
pub(crate) fn record(
    state: &AppState,
    kind: &str,
    result: f64,
    details: &str,
) -> Option<serde_json::Value> {
    let conn = state.db.as_ref()?;
    let id = Uuid::new_v4().to_string();
    let date = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let sort_order = db::next_sort_order(conn, "history").ok()?;
    conn.execute(
        "INSERT INTO history(id, date, kind, result, details, sort_order)
         VALUES(?, ?, ?, ?, ?, ?)",
        (&id, &date, kind, result, details, sort_order),
    )
    .ok()?;
    Some(json!({
        "id": id,
        "date": date,
        "type": kind,
        "result": result,
        "details": details,
    }))
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut stmt = match conn.prepare(
        "SELECT id, date, kind, result, details
         FROM history
         ORDER BY sort_order",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let entries: Result<Vec<serde_json::Value>, _> = stmt
        .query_map([], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "date": r.get::<_, String>(1)?,
                "type": r.get::<_, String>(2)?,
                "result": r.get::<_, f64>(3)?,
                "details": r.get::<_, String>(4)?,
            }))
        })
        .and_then(|it| it.collect());
    match entries {
        Ok(entries) => ok(&req.id, json!({ "entries": entries })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match conn.execute("DELETE FROM history", []) {
        Ok(cleared) => ok(&req.id, json!({ "cleared": cleared })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "history.list" => Some(handle_list(state, req)),
        "history.clear" => Some(handle_clear(state, req)),
        _ => None,
    }
}
