use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Field delimiter shared by input and output lines.
///
/// A multi-byte character chosen upstream to avoid collision with the commas,
/// dashes and brackets that appear inside business data.
pub const DELIMITER: char = 'ç';

/// Errors raised while parsing a single record line.
///
/// Only lines with a recognized type code can fail; unrecognized codes are
/// skipped without error.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("line is missing the {0} field")]
    MissingField(&'static str),
    #[error("malformed item entry '{0}': expected id-qty-value")]
    MalformedItem(String),
    #[error("invalid decimal value '{0}'")]
    InvalidValue(String),
}

/// Discriminator parsed from the first token of an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Salesman,
    Customer,
    Sale,
    Unknown,
}

impl RecordKind {
    pub fn classify(code: &str) -> Self {
        match code {
            "001" => RecordKind::Salesman,
            "002" => RecordKind::Customer,
            "003" => RecordKind::Sale,
            _ => RecordKind::Unknown,
        }
    }
}

/// One parsed input record.
///
/// Sale lines carry a bracketed item list in the raw file; it is reduced to
/// its summed value at parse time since no aggregate consumes individual
/// items.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Salesman { cpf: String },
    Customer { cnpj: String },
    Sale { id: String, total: Decimal, salesman: String },
}

/// Parse one input line into a record.
///
/// Returns `Ok(None)` for blank lines and lines with an unrecognized type
/// code; those are dropped silently. A line with a recognized code that is
/// missing its expected fields is an error, which the caller treats as fatal
/// for the whole file.
///
/// Salesman and customer lines may carry trailing tokens (name, salary,
/// business area); only the identifying token is consumed.
pub fn parse_line(line: &str) -> Result<Option<Record>, RecordError> {
    // Empty tokens are skipped so that the tokenization treats runs of
    // delimiters the same as a single delimiter.
    let mut tokens = line.split(DELIMITER).filter(|t| !t.is_empty());

    let Some(code) = tokens.next() else {
        return Ok(None);
    };

    match RecordKind::classify(code) {
        RecordKind::Salesman => {
            let cpf = tokens.next().ok_or(RecordError::MissingField("cpf"))?;
            Ok(Some(Record::Salesman {
                cpf: cpf.to_string(),
            }))
        }
        RecordKind::Customer => {
            let cnpj = tokens.next().ok_or(RecordError::MissingField("cnpj"))?;
            Ok(Some(Record::Customer {
                cnpj: cnpj.to_string(),
            }))
        }
        RecordKind::Sale => {
            let id = tokens.next().ok_or(RecordError::MissingField("sale id"))?;
            let items = tokens.next().ok_or(RecordError::MissingField("item list"))?;
            let salesman = tokens
                .next()
                .ok_or(RecordError::MissingField("salesman name"))?;
            let total = sum_items(items)?;
            Ok(Some(Record::Sale {
                id: id.to_string(),
                total,
                salesman: salesman.to_string(),
            }))
        }
        RecordKind::Unknown => Ok(None),
    }
}

/// Sum the value field of every item in a bracketed item list.
///
/// Items are comma-separated `id-qty-value` triples; the value (third field)
/// of each triple contributes to the sum when it is non-empty. A triple with
/// fewer than three fields is malformed.
fn sum_items(items: &str) -> Result<Decimal, RecordError> {
    let inner = items.trim_start_matches('[').trim_end_matches(']');

    let mut sum = Decimal::ZERO;
    for entry in inner.split(',') {
        let fields: Vec<&str> = entry.split('-').collect();
        if fields.len() < 3 {
            return Err(RecordError::MalformedItem(entry.to_string()));
        }
        if !fields[2].is_empty() {
            let value = Decimal::from_str(fields[2])
                .map_err(|_| RecordError::InvalidValue(fields[2].to_string()))?;
            sum += value;
        }
    }

    Ok(sum)
}
