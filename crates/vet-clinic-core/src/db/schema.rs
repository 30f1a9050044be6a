//! SQLite schema definition.

/// Complete database schema for vet-clinic.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Owners, Species & Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS owners (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    mobile TEXT,
    street TEXT,
    street2 TEXT,
    city TEXT,
    state TEXT,
    zip TEXT,
    country TEXT,
    notes TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_owners_name ON owners(name);

CREATE TABLE IF NOT EXISTS species (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    code TEXT CHECK (code IS NULL OR length(code) <= 10),
    description TEXT,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    owner_id TEXT NOT NULL REFERENCES owners(id),
    species_id TEXT NOT NULL REFERENCES species(id),
    breed TEXT,
    gender TEXT NOT NULL DEFAULT 'unknown',      -- male, female, unknown
    birth_date TEXT,                             -- YYYY-MM-DD
    birth_date_approximate INTEGER NOT NULL DEFAULT 0,
    color TEXT,
    microchip_number TEXT,
    weight_kg REAL,                              -- always kilograms
    weight_unit TEXT NOT NULL DEFAULT 'kg',      -- display unit: kg, lbs
    neutered INTEGER NOT NULL DEFAULT 0,
    allergies TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
CREATE INDEX IF NOT EXISTS idx_patients_owner ON patients(owner_id);

-- ============================================================================
-- Resources, Rooms & Providers
-- ============================================================================

CREATE TABLE IF NOT EXISTS resources (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('material', 'user')),
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS rooms (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    sequence INTEGER NOT NULL DEFAULT 10,
    active INTEGER NOT NULL DEFAULT 1,
    description TEXT,
    resource_id TEXT REFERENCES resources(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS provider_types (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    sequence INTEGER NOT NULL DEFAULT 10,
    is_provider INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1,
    description TEXT
);

CREATE TABLE IF NOT EXISTS providers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    provider_type_id TEXT REFERENCES provider_types(id) ON DELETE SET NULL,
    resource_id TEXT REFERENCES resources(id) ON DELETE SET NULL,
    active INTEGER NOT NULL DEFAULT 1
);

-- ============================================================================
-- Resource Combinations & Booking Types
-- ============================================================================

-- member_key = sha256 over the sorted member resource ids; the UNIQUE
-- constraint makes find-or-create a single atomic upsert.
CREATE TABLE IF NOT EXISTS resource_combinations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    member_key TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS combination_resources (
    combination_id TEXT NOT NULL REFERENCES resource_combinations(id) ON DELETE CASCADE,
    resource_id TEXT NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
    -- display order of the member in the combination name
    position INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (combination_id, resource_id)
);

CREATE INDEX IF NOT EXISTS idx_combination_resources_resource ON combination_resources(resource_id);

CREATE TABLE IF NOT EXISTS booking_types (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    duration_hours REAL NOT NULL DEFAULT 0.5,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS type_combinations (
    type_id TEXT NOT NULL REFERENCES booking_types(id) ON DELETE CASCADE,
    combination_id TEXT NOT NULL REFERENCES resource_combinations(id) ON DELETE CASCADE,
    sequence INTEGER NOT NULL DEFAULT 10,
    PRIMARY KEY (type_id, combination_id)
);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    patient_id TEXT NOT NULL REFERENCES patients(id),
    kind TEXT NOT NULL DEFAULT 'checkup',
    booking_type_id TEXT REFERENCES booking_types(id) ON DELETE SET NULL,
    start TEXT NOT NULL,                         -- YYYY-MM-DD HH:MM:SS.sss
    duration_hours REAL NOT NULL DEFAULT 0.5,
    provider_id TEXT REFERENCES providers(id) ON DELETE SET NULL,
    room_id TEXT REFERENCES rooms(id) ON DELETE SET NULL,
    combination_id TEXT REFERENCES resource_combinations(id) ON DELETE SET NULL,
    state TEXT NOT NULL DEFAULT 'scheduled',     -- scheduled, confirmed, in_progress, done, cancelled
    reason TEXT,
    diagnosis TEXT,
    treatment TEXT,
    prescription TEXT,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_state_start ON appointments(state, start);
CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_provider ON appointments(provider_id);
CREATE INDEX IF NOT EXISTS idx_appointments_room ON appointments(room_id);

-- ============================================================================
-- Problem List & Medical Notes
-- ============================================================================

CREATE TABLE IF NOT EXISTS problems (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'resolved')),
    onset_date TEXT NOT NULL,
    resolved_date TEXT,
    diagnosis_code TEXT,
    notes TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    CHECK (status = 'active' OR resolved_date IS NOT NULL)
);

CREATE INDEX IF NOT EXISTS idx_problems_patient ON problems(patient_id);

CREATE TABLE IF NOT EXISTS medical_notes (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    appointment_id TEXT REFERENCES appointments(id) ON DELETE SET NULL,
    date TEXT NOT NULL,
    author_id TEXT NOT NULL REFERENCES providers(id),
    note_type TEXT NOT NULL DEFAULT 'internal',
    subjective TEXT,
    objective TEXT,
    assessment TEXT,
    plan TEXT,
    content TEXT,
    is_private INTEGER NOT NULL DEFAULT 0,
    is_important INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_notes_patient ON medical_notes(patient_id);

CREATE TABLE IF NOT EXISTS problem_notes (
    problem_id TEXT NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
    note_id TEXT NOT NULL REFERENCES medical_notes(id) ON DELETE CASCADE,
    PRIMARY KEY (problem_id, note_id)
);
"#;
