/// Column-name constants for co2-containment tables and input exports.
/// Single source of truth - exported to Python via PyO3.

// ── Containment table columns ───────────────────────────────────────────────
pub mod containment {
    pub const DATE: &str = "date";
    pub const AMOUNT: &str = "amount";
    pub const PHASE: &str = "phase";
    pub const LOCATION: &str = "location";
    pub const ZONE: &str = "zone";
    pub const TOTAL: &str = "total";
}

// ── Phase values ────────────────────────────────────────────────────────────
pub mod phase {
    pub const GAS: &str = "gas";
    pub const AQUEOUS: &str = "aqueous";
    pub const UNDEFINED: &str = "undefined";
}

// ── Location values ─────────────────────────────────────────────────────────
pub mod location {
    pub const CONTAINED: &str = "contained";
    pub const OUTSIDE: &str = "outside";
    pub const HAZARDOUS: &str = "hazardous";
}

// ── Grid export columns ─────────────────────────────────────────────────────
pub mod grid {
    pub const X: &str = "X";
    pub const Y: &str = "Y";
    pub const VOLUME: &str = "VOLUME";
    pub const ACTNUM: &str = "ACTNUM";
}

// ── Init export columns ─────────────────────────────────────────────────────
pub mod init {
    pub const PORO: &str = "PORO";
    pub const PORV: &str = "PORV";
}

// ── Restart export columns ──────────────────────────────────────────────────
pub mod restart {
    pub const DATE: &str = "DATE";
}

// ── Polygon export columns ──────────────────────────────────────────────────
pub mod polygon {
    pub const POLY_ID: &str = "POLY_ID";
}
