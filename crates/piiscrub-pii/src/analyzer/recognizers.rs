//! Pattern recognizers and their validators

use crate::analyzer::EntityType;
use regex::Regex;

/// Common first names used to anchor person-name matches
const FIRST_NAMES: &[&str] = &[
    // English
    "James", "John", "Robert", "Michael", "William", "David", "Richard", "Joseph", "Thomas",
    "Charles", "Daniel", "Matthew", "Anthony", "Mark", "Steven", "Paul", "Andrew", "Kevin",
    "Brian", "George", "Edward", "Mary", "Patricia", "Jennifer", "Linda", "Elizabeth",
    "Barbara", "Susan", "Jessica", "Sarah", "Karen", "Nancy", "Lisa", "Margaret", "Emily",
    "Emma", "Olivia", "Sophia", "Jane", "Alice", "Laura", "Rachel", "Kate",
    // German
    "Hans", "Peter", "Klaus", "Jürgen", "Wolfgang", "Stefan", "Andreas", "Uwe", "Dieter",
    "Frank", "Günter", "Max", "Lukas", "Felix", "Jonas", "Leon", "Anna", "Maria",
    "Ursula", "Monika", "Petra", "Sabine", "Claudia", "Julia", "Katharina", "Lena", "Hannah",
    "Sophie", "Greta",
];

/// Typed regex recognizer
pub(crate) struct Recognizer {
    pub(crate) entity_type: EntityType,
    regex: Regex,
    /// Capture group that forms the span (0 = whole match)
    group: usize,
    score: f32,
    validator: Option<fn(&str) -> bool>,
}

impl Recognizer {
    fn new(entity_type: EntityType, pattern: &str, score: f32) -> Result<Self, regex::Error> {
        Ok(Self {
            entity_type,
            regex: Regex::new(pattern)?,
            group: 0,
            score,
            validator: None,
        })
    }

    fn group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    fn validated(mut self, validator: fn(&str) -> bool) -> Self {
        self.validator = Some(validator);
        self
    }

    pub(crate) fn score(&self) -> f32 {
        self.score
    }

    /// Byte ranges of all validated matches
    pub(crate) fn find(&self, text: &str) -> Vec<(usize, usize)> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(self.group))
            .filter(|m| self.validator.is_none_or(|validate| validate(m.as_str())))
            .map(|m| (m.start(), m.end()))
            .collect()
    }
}

/// Recognizers shared by every language
fn common() -> Result<Vec<Recognizer>, regex::Error> {
    let first_names = FIRST_NAMES.join("|");

    Ok(vec![
        Recognizer::new(
            EntityType::EmailAddress,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            0.95,
        )?,
        // Credit cards: 13-19 digits with optional spaces/dashes
        Recognizer::new(
            EntityType::CreditCard,
            r"\b(?:\d{4}[-\s]?){3}\d{1,7}\b",
            0.95,
        )?
        .validated(luhn_valid),
        Recognizer::new(
            EntityType::IpAddress,
            r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b|\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b",
            0.95,
        )?,
        Recognizer::new(
            EntityType::IbanCode,
            r"\b[A-Z]{2}\d{2}(?:\s?[A-Z0-9]{4}){2,7}(?:\s?[A-Z0-9]{1,3})?\b",
            0.95,
        )?
        .validated(iban_valid),
        // Known first name followed by one or two capitalized words
        Recognizer::new(
            EntityType::Person,
            &format!(r"\b(?:{first_names})(?:\s+\p{{Lu}}[\p{{Ll}}-]+){{1,2}}\b"),
            0.85,
        )?,
    ])
}

/// English recognizers
pub(crate) fn english() -> Result<Vec<Recognizer>, regex::Error> {
    let mut recognizers = common()?;

    recognizers.extend([
        Recognizer::new(
            EntityType::Person,
            r"\b(?:(?:Mrs|Mr|Ms|Miss|Dr|Prof)\.?\s+)+(\p{Lu}[\p{Ll}-]+(?:\s+\p{Lu}[\p{Ll}-]+)?)",
            0.85,
        )?
        .group(1),
        // (123) 456-7890, 123-456-7890, 123.456.7890, +1 123 456 7890
        Recognizer::new(
            EntityType::PhoneNumber,
            r"(\+?\d{1,3}[-.\s]?)?(\(?\d{3}\)?[-.\s]?)?\d{3}[-.\s]?\d{4}\b",
            0.75,
        )?
        .validated(north_american_phone_valid),
        Recognizer::new(EntityType::UsSsn, r"\b\d{3}-?\d{2}-?\d{4}\b", 0.85)?
            .validated(ssn_valid),
        Recognizer::new(
            EntityType::Location,
            r"\b\d{1,5}\s+(?:\p{Lu}\p{Ll}+\s+){1,3}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way)\b",
            0.7,
        )?,
    ]);

    Ok(recognizers)
}

/// German recognizers
pub(crate) fn german() -> Result<Vec<Recognizer>, regex::Error> {
    let mut recognizers = common()?;

    recognizers.extend([
        Recognizer::new(
            EntityType::Person,
            r"\b(?:(?:Herrn|Herr|Frau|Dr|Prof)\.?\s+)+(\p{Lu}[\p{Ll}-]+(?:\s+\p{Lu}[\p{Ll}-]+)?)",
            0.85,
        )?
        .group(1),
        // +49 30 12345678, 030-12345678, 0171/1234567
        Recognizer::new(
            EntityType::PhoneNumber,
            r"(?:\+49[\s-]?|\b0)\d{2,4}[\s/-]?\d{3,8}\b",
            0.75,
        )?
        .validated(german_phone_valid),
        Recognizer::new(
            EntityType::Location,
            r"\b\p{Lu}\p{Ll}*(?:straße|strasse|str\.|weg|allee|platz|gasse|ring|damm)\s+\d{1,4}[a-z]?\b",
            0.7,
        )?,
    ]);

    Ok(recognizers)
}

fn digits_of(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Luhn checksum over the digits of a candidate card number
pub(crate) fn luhn_valid(number: &str) -> bool {
    let digits: Vec<u32> = number.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }

    let checksum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    checksum.is_multiple_of(10)
}

/// Reject SSN area/group/serial combinations that are never issued
pub(crate) fn ssn_valid(ssn: &str) -> bool {
    let digits = digits_of(ssn);

    if digits.len() != 9 {
        return false;
    }

    if digits.starts_with("000") || digits[3..5] == *"00" || digits[5..9] == *"0000" {
        return false;
    }

    // 666 is never assigned, 9xx is reserved for ITIN
    !(digits.starts_with("666") || digits.starts_with('9'))
}

/// US/Canada numbers are 10 digits, or 11 with a leading country code of 1
pub(crate) fn north_american_phone_valid(phone: &str) -> bool {
    let digits = digits_of(phone);

    if digits.len() < 10 || digits.len() > 15 {
        return false;
    }

    !(digits.len() == 11 && !digits.starts_with('1'))
}

pub(crate) fn german_phone_valid(phone: &str) -> bool {
    let digits = digits_of(phone);
    (9..=15).contains(&digits.len())
}

/// ISO 7064 mod-97 check used by IBANs
pub(crate) fn iban_valid(iban: &str) -> bool {
    let compact: Vec<char> = iban.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.len() < 15 || compact.len() > 34 {
        return false;
    }

    let rearranged = compact[4..].iter().chain(compact[..4].iter());
    let mut remainder: u32 = 0;
    for c in rearranged {
        let value = match c.to_digit(36) {
            Some(v) => v,
            None => return false,
        };
        remainder = if value < 10 {
            (remainder * 10 + value) % 97
        } else {
            (remainder * 100 + value) % 97
        };
    }

    remainder == 1
}
