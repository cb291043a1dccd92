use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("gpacalc.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS history(
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            kind TEXT NOT NULL,
            result REAL NOT NULL,
            details TEXT NOT NULL,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;

    // Early workspaces relied on rowid for append order. Add and backfill
    // sort_order if needed.
    ensure_history_sort_order(&conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_history_sort ON history(sort_order)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            sgpa REAL NOT NULL,
            credits REAL NOT NULL,
            subject_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;
    ensure_profiles_subject_count(&conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_profiles_sort ON profiles(sort_order)",
        [],
    )?;

    Ok(conn)
}

/// Next append position for a table ordered by sort_order.
pub fn next_sort_order(conn: &Connection, table: &str) -> anyhow::Result<i64> {
    let sql = format!("SELECT COALESCE(MAX(sort_order), -1) + 1 FROM {}", table);
    let next: i64 = conn.query_row(&sql, [], |r| r.get(0))?;
    Ok(next)
}

fn ensure_history_sort_order(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "history", "sort_order")? {
        return Ok(());
    }

    conn.execute(
        "ALTER TABLE history ADD COLUMN sort_order INTEGER NOT NULL DEFAULT 0",
        [],
    )?;

    // Backfill using insert order.
    let mut stmt = conn.prepare("SELECT id FROM history ORDER BY rowid")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    for (i, id) in ids.iter().enumerate() {
        conn.execute(
            "UPDATE history SET sort_order = ? WHERE id = ?",
            (i as i64, id),
        )?;
    }

    Ok(())
}

fn ensure_profiles_subject_count(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "profiles", "subject_count")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE profiles ADD COLUMN subject_count INTEGER NOT NULL DEFAULT 0",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
