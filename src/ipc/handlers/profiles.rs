use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use chrono::Local;
use serde_json::json;
use uuid::Uuid;

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let name = req
        .params
        .get("name")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    if name.is_empty() {
        return err(&req.id, "bad_params", "params.name must not be blank", None);
    }
    let Some(sgpa) = req.params.get("sgpa").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "params.sgpa must be a number", None);
    };
    if !(0.0..=10.0).contains(&sgpa) {
        return err(&req.id, "bad_params", "sgpa must be between 0 and 10", None);
    }
    let credits = req
        .params
        .get("credits")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let subject_count = req
        .params
        .get("subjects")
        .and_then(|v| v.as_i64())
        .unwrap_or(0);

    let profile_id = Uuid::new_v4().to_string();
    let created_at = Local::now().format("%Y-%m-%d").to_string();
    let sort_order = match db::next_sort_order(conn, "profiles") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    if let Err(e) = conn.execute(
        "INSERT INTO profiles(id, name, sgpa, credits, subject_count, created_at, sort_order)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &profile_id,
            &name,
            sgpa,
            credits,
            subject_count,
            &created_at,
            sort_order,
        ),
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "profiles" })),
        );
    }

    ok(
        &req.id,
        json!({
            "id": profile_id,
            "name": name,
            "sgpa": sgpa,
            "credits": credits,
            "subjects": subject_count,
            "createdAt": created_at,
        }),
    )
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut stmt = match conn.prepare(
        "SELECT id, name, sgpa, credits, subject_count, created_at
         FROM profiles
         ORDER BY sort_order",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let profiles: Result<Vec<serde_json::Value>, _> = stmt
        .query_map([], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "name": r.get::<_, String>(1)?,
                "sgpa": r.get::<_, f64>(2)?,
                "credits": r.get::<_, f64>(3)?,
                "subjects": r.get::<_, i64>(4)?,
                "createdAt": r.get::<_, String>(5)?,
            }))
        })
        .and_then(|it| it.collect());
    match profiles {
        Ok(profiles) => ok(&req.id, json!({ "profiles": profiles })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(profile_id) = req.params.get("id").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.id", None);
    };

    match conn.execute("DELETE FROM profiles WHERE id = ?", [profile_id]) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profiles.save" => Some(handle_save(state, req)),
        "profiles.list" => Some(handle_list(state, req)),
        "profiles.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
