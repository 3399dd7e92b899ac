pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS expenses (
    id                  TEXT PRIMARY KEY,
    title               TEXT NOT NULL,
    amount              TEXT NOT NULL,
    category            TEXT NOT NULL DEFAULT '',
    type                TEXT NOT NULL,
    expense_category    TEXT NOT NULL,
    date                TEXT NOT NULL,
    description         TEXT NOT NULL DEFAULT '',
    paid                BOOLEAN NOT NULL DEFAULT 0,
    installment_current INTEGER,
    installment_total   INTEGER,
    is_recurring        BOOLEAN NOT NULL DEFAULT 0,
    parent_expense_id   TEXT REFERENCES expenses(id) ON DELETE SET NULL,
    recurring_day       INTEGER,
    detached            BOOLEAN NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    CHECK (installment_current IS NULL OR installment_current <= installment_total)
);

CREATE INDEX IF NOT EXISTS idx_expenses_scope_date ON expenses(expense_category, date);
CREATE INDEX IF NOT EXISTS idx_expenses_parent ON expenses(parent_expense_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_expenses_series_date
    ON expenses(parent_expense_id, date) WHERE parent_expense_id IS NOT NULL;

CREATE TABLE IF NOT EXISTS subscriptions (
    id            TEXT PRIMARY KEY,
    plan          TEXT NOT NULL,
    client_name   TEXT NOT NULL,
    monthly_value TEXT NOT NULL,
    month_year    TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_subscriptions_plan_month ON subscriptions(plan, month_year);

CREATE TABLE IF NOT EXISTS projects (
    id                     TEXT PRIMARY KEY,
    name                   TEXT NOT NULL,
    client                 TEXT NOT NULL,
    responsible            TEXT NOT NULL,
    estimated_value        TEXT NOT NULL,
    description            TEXT NOT NULL DEFAULT '',
    status                 TEXT NOT NULL DEFAULT 'pending',
    rejection_reasons      TEXT NOT NULL DEFAULT '[]',
    rejection_observations TEXT NOT NULL DEFAULT '',
    created_at             TEXT NOT NULL,
    updated_at             TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cash_flow (
    id          TEXT PRIMARY KEY,
    type        TEXT NOT NULL,
    amount      TEXT NOT NULL,
    title       TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    date        TEXT NOT NULL,
    month_year  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cash_flow_month ON cash_flow(month_year);

CREATE TABLE IF NOT EXISTS maintenance_runs (
    key        TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL
);

"#;

pub(crate) const CURRENT_VERSION: i32 = 2;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[(
    1,
    // Rows left behind by a deleted monthly series.
    "ALTER TABLE expenses ADD COLUMN detached BOOLEAN NOT NULL DEFAULT 0;",
)];
