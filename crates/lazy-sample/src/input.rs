//! # Input Parsing
//!
//! Reads the whitespace-separated workload format:
//!
//! ```text
//! r w d            read, write and delete times
//! n c T            file count, concurrent readers per file, patience
//! <user> <file> <READ|WRITE|DELETE> <arrival>
//! ...
//! STOP
//! ```
//!
//! Input may also simply end after the last request. Any malformed startup value is
//! fatal; nothing is processed until the whole input parses. A file id outside the
//! configured range is not a parse error: that request is declined when taken up.

use crate::model::Workload;
use lazy_arbiter::{ArbiterConfig, ConfigError, Operation, Request, UnknownOperation};
use std::str::FromStr;
use thiserror::Error;

const STOP: &str = "STOP";

/// The sample reproduces LAZY taking up a request one second after it arrives.
pub const TAKE_UP_DELAY: u64 = 1;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Missing value for {0}")]
    Missing(&'static str),
    #[error("Invalid value for {field}: {value:?}")]
    Invalid { field: &'static str, value: String },
    #[error("Request {index}: {source}")]
    Operation {
        index: usize,
        #[source]
        source: UnknownOperation,
    },
    #[error("Request {index} is incomplete")]
    Truncated { index: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Parses a complete workload.
pub fn parse_workload(text: &str) -> Result<Workload, ParseError> {
    let mut tokens = text.split_whitespace();

    let read_time = next_value(&mut tokens, "read time")?;
    let write_time = next_value(&mut tokens, "write time")?;
    let delete_time = next_value(&mut tokens, "delete time")?;
    let resource_count = next_value(&mut tokens, "file count")?;
    let reader_capacity = next_value(&mut tokens, "concurrent readers")?;
    let patience = next_value(&mut tokens, "patience")?;

    let config = ArbiterConfig {
        read_time,
        write_time,
        delete_time,
        resource_count,
        reader_capacity,
        patience,
        admission_delay: TAKE_UP_DELAY,
        ..Default::default()
    };
    config.validate()?;

    let mut requests = Vec::new();
    while let Some(first) = tokens.next() {
        if first == STOP {
            break;
        }
        let index = requests.len();
        let user = parse_token(first, "user id")?;
        let resource = file_id(parse_token(next_field(&mut tokens, index)?, "file id")?);
        let op = next_field(&mut tokens, index)?
            .parse::<Operation>()
            .map_err(|source| ParseError::Operation { index, source })?;
        let arrival = parse_token(next_field(&mut tokens, index)?, "arrival time")?;

        requests.push(Request::new(user, resource, op, arrival));
    }

    Ok(Workload::new(config, requests))
}

fn next_value<'a, T: FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    field: &'static str,
) -> Result<T, ParseError> {
    let token = tokens.next().ok_or(ParseError::Missing(field))?;
    parse_token(token, field)
}

/// Next token of request `index`, which must be present.
fn next_field<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    index: usize,
) -> Result<&'a str, ParseError> {
    tokens.next().ok_or(ParseError::Truncated { index })
}

/// Files are numbered from 1. Ids that cannot name a file, negative ones
/// included, become 0 so the request is declined instead of failing the run.
fn file_id(raw: i64) -> u32 {
    u32::try_from(raw).unwrap_or(0)
}

fn parse_token<T: FromStr>(token: &str, field: &'static str) -> Result<T, ParseError> {
    token.parse().map_err(|_| ParseError::Invalid {
        field,
        value: token.to_string(),
    })
}
