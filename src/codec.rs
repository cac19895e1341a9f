//! Compact text encoding of a pet's state.
//!
//! Eight fields joined by NUL: a flag character (U+0080 plus the flag bits)
//! followed by seven base-36 counters
//! (`discipline, frailty, happiness, hunger, sick, age, money`).

use crate::interface::PET_HOME;
use crate::model::{Facing, Gender, Pet};
use thiserror::Error;

const SEPARATOR: &str = "\0";
const FIELD_COUNT: usize = 8;
const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "flags",
    "discipline",
    "frailty",
    "happiness",
    "hunger",
    "sick",
    "age",
    "money",
];

const MALE: u8 = 1 << 0;
const FACING_LEFT: u8 = 1 << 1;
const MOVING: u8 = 1 << 2;
const BACK_TURNED: u8 = 1 << 3;
const CALLING: u8 = 1 << 4;
const DEAD: u8 = 1 << 5;
const NAUGHTY: u8 = 1 << 6;
/// Always set when writing, so the flag character is never the separator.
const MARKER: u8 = 1 << 7;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum DecodeError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("flag field must be a single non-NUL character below U+0100, got {0:?}")]
    Flags(String),

    #[error("field `{field}` is not base-36: {value:?}")]
    Digits { field: &'static str, value: String },

    #[error("field `{field}` must not be negative")]
    Negative { field: &'static str },
}

pub(crate) fn encode(pet: &Pet) -> String {
    let mut flags = 0u8;
    if pet.gender == Gender::Male {
        flags |= MALE;
    }
    if pet.facing == Facing::Left {
        flags |= FACING_LEFT;
    }
    if pet.moving {
        flags |= MOVING;
    }
    if pet.back_turned {
        flags |= BACK_TURNED;
    }
    if pet.calling {
        flags |= CALLING;
    }
    if pet.dead {
        flags |= DEAD;
    }
    if pet.naughty {
        flags |= NAUGHTY;
    }

    let fields = [
        char::from(flags | MARKER).to_string(),
        to_base36(pet.discipline as i128),
        to_base36(pet.frailty as i128),
        to_base36(pet.happiness as i128),
        to_base36(pet.hunger as i128),
        to_base36(pet.sick as i128),
        to_base36(pet.age as i128),
        to_base36(pet.money as i128),
    ];
    fields.join(SEPARATOR)
}

/// Rebuilds a pet from [`encode`] output. Position, animation frame and any
/// running spin are not part of the record and come back at their defaults.
pub(crate) fn decode(s: &str) -> Result<Pet, DecodeError> {
    let fields: Vec<&str> = s.split(SEPARATOR).collect();
    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }

    let flags = parse_flags(fields[0])?;
    let unsigned = |i: usize| -> Result<u64, DecodeError> {
        let v = from_base36(FIELD_NAMES[i], fields[i])?;
        u64::try_from(v).map_err(|_| DecodeError::Negative {
            field: FIELD_NAMES[i],
        })
    };

    let discipline = unsigned(1)?;
    let frailty = unsigned(2)?;
    let happiness = i64::try_from(from_base36(FIELD_NAMES[3], fields[3])?).map_err(|_| {
        DecodeError::Digits {
            field: FIELD_NAMES[3],
            value: fields[3].to_string(),
        }
    })?;
    let hunger = unsigned(4)?;
    let sick = unsigned(5)? != 0;
    let age = unsigned(6)?;
    let money = unsigned(7)?;

    let (x, y) = PET_HOME;
    Ok(Pet {
        gender: if flags & MALE != 0 {
            Gender::Male
        } else {
            Gender::Female
        },
        facing: if flags & FACING_LEFT != 0 {
            Facing::Left
        } else {
            Facing::Right
        },
        moving: flags & MOVING != 0,
        back_turned: flags & BACK_TURNED != 0,
        calling: flags & CALLING != 0,
        dead: flags & DEAD != 0,
        naughty: flags & NAUGHTY != 0,
        sick,
        discipline,
        frailty,
        happiness,
        hunger,
        age,
        money,
        x,
        y,
        frame: 0,
        spin: None,
    })
}

fn parse_flags(field: &str) -> Result<u8, DecodeError> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '\0' && (c as u32) < 0x100 => Ok(c as u8 & !MARKER),
        _ => Err(DecodeError::Flags(field.to_string())),
    }
}

fn to_base36(v: i128) -> String {
    if v == 0 {
        return "0".to_string();
    }
    let mut n = v.unsigned_abs();
    let mut digits = Vec::new();
    while n > 0 {
        let d = (n % 36) as u32;
        digits.push(char::from_digit(d, 36).unwrap_or('0'));
        n /= 36;
    }
    if v < 0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

fn from_base36(field: &'static str, value: &str) -> Result<i128, DecodeError> {
    let bad = || DecodeError::Digits {
        field,
        value: value.to_string(),
    };
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    if digits.is_empty() {
        return Err(bad());
    }
    let mut n: i128 = 0;
    for ch in digits.chars() {
        let d = ch.to_digit(36).ok_or_else(bad)?;
        n = n
            .checked_mul(36)
            .and_then(|n| n.checked_add(d as i128))
            .ok_or_else(bad)?;
        if n > u64::MAX as i128 {
            return Err(bad());
        }
    }
    Ok(if negative { -n } else { n })
}
