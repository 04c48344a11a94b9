//! Versioned serial codec.
//!
//! `LB1|<pairing_id>|<combo_id or 0>|<code>.<index>=<part_id>,...`
//!
//! This module only handles structure. Whether the identifiers resolve is
//! decided by the composer against the catalog.

use crate::error::BuildError;
use loadout_types::build::SlotAssignment;
use loadout_types::ids::{ComboId, PairingId, PartId, SlotKey};
use loadout_types::schema::LOADOUT_SERIAL_V1;

const FIELD_SEP: char = '|';
const ENTRY_SEP: char = ',';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialFields {
    pub pairing: PairingId,
    pub combo: Option<ComboId>,
    pub parts: Vec<SlotAssignment>,
}

/// Writes `fields` in canonical order: slot ascending, then part id.
pub fn encode(fields: &SerialFields) -> String {
    let mut parts = fields.parts.clone();
    parts.sort();
    let entries: Vec<String> = parts
        .iter()
        .map(|a| format!("{}={}", a.slot, a.part))
        .collect();
    [
        LOADOUT_SERIAL_V1.to_string(),
        fields.pairing.to_string(),
        fields.combo.unwrap_or(ComboId::NONE).to_string(),
        entries.join(&ENTRY_SEP.to_string()),
    ]
    .join(&FIELD_SEP.to_string())
}

/// Structural decode. Entries are returned in the order they appear.
pub fn decode(serial: &str) -> Result<SerialFields, BuildError> {
    let malformed = |reason: String| BuildError::malformed_serial(serial, reason);
    let text = serial.trim();

    let fields: Vec<&str> = text.split(FIELD_SEP).collect();
    if fields.len() != 4 {
        return Err(malformed(format!("expected 4 fields, found {}", fields.len())));
    }
    if fields[0] != LOADOUT_SERIAL_V1 {
        return Err(malformed(format!("unknown version tag '{}'", fields[0])));
    }

    let pairing = PairingId(number(fields[1], "pairing id").map_err(malformed)?);
    let combo = Some(ComboId(number(fields[2], "combo id").map_err(malformed)?))
        .filter(|id| *id != ComboId::NONE);

    let mut parts = Vec::new();
    if !fields[3].is_empty() {
        for entry in fields[3].split(ENTRY_SEP) {
            let (slot, part) = entry
                .split_once('=')
                .ok_or_else(|| malformed(format!("slot entry '{entry}' is missing '='")))?;
            let slot: SlotKey = slot
                .parse()
                .map_err(|_| malformed(format!("slot '{slot}' is not <code>.<index>")))?;
            let part = PartId(number(part, "part id").map_err(malformed)?);
            parts.push(SlotAssignment::new(slot, part));
        }
    }

    Ok(SerialFields {
        pairing,
        combo,
        parts,
    })
}

fn number(raw: &str, what: &str) -> Result<u32, String> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{what} '{raw}' is not numeric"));
    }
    raw.parse()
        .map_err(|_| format!("{what} '{raw}' is out of range"))
}
