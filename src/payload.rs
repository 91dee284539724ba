//! Extraction of student details from the text encoded in a school ID's QR code.
//!
//! Printed IDs carry a single line such as `NOEL JHUMEL G. BLANCO 2024300617 BSIT`:
//! the holder's name, the 10-digit school ID, then the program code. The text is
//! not under our control, so parsing is two-tiered. A strict pattern wants an
//! all-uppercase program token; a relaxed one accepts any non-empty trailing
//! text. Both require the 10-digit run, which is what separates name from
//! program.
//!
//! A name that itself contains a 10-digit run is ambiguous. The anchored lazy
//! match decides it and the result is not second-guessed.
//!
//! Name and program never span a line break. `\r`, `\n`, U+2028 and U+2029
//! all end a line, so a payload carrying any of them inside a field fails.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::student::StudentForm;

// `[^\r\n\x{2028}\x{2029}]` stands in for `.`, which in this engine still
// matches `\r` and the Unicode separators.
static STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\r\n\x{2028}\x{2029}]+?)\s+([0-9]{10})\s+([A-Z]+)$")
        .expect("strict payload pattern is valid")
});

static RELAXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\r\n\x{2028}\x{2029}]+?)\s+([0-9]{10})\s*([^\r\n\x{2028}\x{2029}]*)$")
        .expect("relaxed payload pattern is valid")
});

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    #[error("cannot extract student data")]
    Unrecognized,
}

/// Fields recovered from one scanned line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedStudent {
    pub full_name: String,
    pub school_id: String,
    pub program: String,
}

impl From<ScannedStudent> for StudentForm {
    fn from(scanned: ScannedStudent) -> Self {
        Self {
            full_name: scanned.full_name,
            school_id: scanned.school_id,
            program: scanned.program,
        }
    }
}

pub fn parse(raw: &str) -> Result<ScannedStudent, PayloadError> {
    let text = raw.trim();

    if let Some(caps) = STRICT.captures(text) {
        return Ok(ScannedStudent {
            full_name: caps[1].trim().to_string(),
            school_id: caps[2].to_string(),
            program: caps[3].trim().to_string(),
        });
    }

    let caps = RELAXED.captures(text).ok_or(PayloadError::Unrecognized)?;
    let program = caps[3].trim();
    if program.is_empty() {
        return Err(PayloadError::Unrecognized);
    }

    Ok(ScannedStudent {
        full_name: caps[1].trim().to_string(),
        school_id: caps[2].to_string(),
        program: program.to_string(),
    })
}
