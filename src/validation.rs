//! Message-id, newsgroup name and date validation
//!
//! Message-ids and newsgroup names follow RFC 5536; the `yyyymmdd hhmmss`
//! argument form of NEWGROUPS and NEWNEWS follows RFC 3977 Section 7.3.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::{NntpError, Result};

/// Longest message-id accepted (RFC 3977 Section 3.6)
pub const MAX_MESSAGE_ID_LENGTH: usize = 250;

/// Validates a Message-ID (RFC 5536 Section 3.1.3)
///
/// Message-IDs must have the format `<local-part@domain>`:
/// - Must start with `<` and end with `>`
/// - Must contain exactly one `@` sign
/// - Must not contain whitespace or control characters
///
/// # Examples
///
/// ```
/// use nntp_server::validation::validate_message_id;
///
/// assert!(validate_message_id("<abc123@example.com>").is_ok());
/// assert!(validate_message_id("<1@test>").is_ok());
/// assert!(validate_message_id("abc123@example.com").is_err()); // Missing brackets
/// assert!(validate_message_id("<abc123>").is_err());           // Missing @
/// ```
pub fn validate_message_id(message_id: &str) -> Result<()> {
    // Check minimum length: <a@b>
    if message_id.len() < 5 {
        return Err(NntpError::InvalidName("Message-ID too short".to_string()));
    }
    if message_id.len() > MAX_MESSAGE_ID_LENGTH {
        return Err(NntpError::InvalidName("Message-ID too long".to_string()));
    }

    if !message_id.starts_with('<') || !message_id.ends_with('>') {
        return Err(NntpError::InvalidName(
            "Message-ID must be enclosed in angle brackets: <local-part@domain>".to_string(),
        ));
    }

    let content = &message_id[1..message_id.len() - 1];

    let at_count = content.matches('@').count();
    if at_count != 1 {
        return Err(NntpError::InvalidName(format!(
            "Message-ID must contain exactly one @ sign, found {}",
            at_count
        )));
    }

    let (local, domain) = content.split_once('@').unwrap_or_default();
    if local.is_empty() {
        return Err(NntpError::InvalidName(
            "Message-ID local-part cannot be empty".to_string(),
        ));
    }
    if domain.is_empty() {
        return Err(NntpError::InvalidName(
            "Message-ID domain cannot be empty".to_string(),
        ));
    }

    if content
        .chars()
        .any(|ch| ch.is_whitespace() || ch.is_control() || ch == '<' || ch == '>')
    {
        return Err(NntpError::InvalidName(
            "Message-ID cannot contain whitespace, control characters or nested brackets"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validates a newsgroup name (RFC 5536 Section 3.1.4)
///
/// Newsgroup names must have the format `component.component.component`:
/// - Components separated by dots (.)
/// - Each component must be non-empty
/// - Components may contain: lowercase letters, digits, +, -, _
///
/// # Examples
///
/// ```
/// use nntp_server::validation::validate_newsgroup_name;
///
/// assert!(validate_newsgroup_name("comp.lang.rust").is_ok());
/// assert!(validate_newsgroup_name("alt.binaries.test").is_ok());
/// assert!(validate_newsgroup_name("comp..rust").is_err());     // Empty component
/// assert!(validate_newsgroup_name("comp/lang/rust").is_err()); // Invalid char
/// ```
pub fn validate_newsgroup_name(newsgroup: &str) -> Result<()> {
    if newsgroup.is_empty() {
        return Err(NntpError::InvalidName(
            "Newsgroup name cannot be empty".to_string(),
        ));
    }

    if newsgroup.starts_with('.') || newsgroup.ends_with('.') {
        return Err(NntpError::InvalidName(
            "Newsgroup name cannot start or end with a dot".to_string(),
        ));
    }

    for component in newsgroup.split('.') {
        if component.is_empty() {
            return Err(NntpError::InvalidName(
                "Newsgroup name cannot have empty components".to_string(),
            ));
        }

        for ch in component.chars() {
            if !(ch.is_ascii_lowercase()
                || ch.is_ascii_digit()
                || ch == '+'
                || ch == '-'
                || ch == '_')
            {
                return Err(NntpError::InvalidName(format!(
                    "Invalid character '{}' in newsgroup name (only lowercase letters, digits, +, -, _ allowed)",
                    ch
                )));
            }
        }
    }

    Ok(())
}

/// Parses an RFC 5322 date-time string into a `DateTime<Utc>`
///
/// Also accepts the common "GMT" zone spelling.
///
/// ```
/// use nntp_server::validation::parse_date;
/// use chrono::Datelike;
///
/// let date = parse_date("Tue, 20 Jan 2026 12:00:00 +0000").unwrap();
/// assert_eq!(date.year(), 2026);
/// parse_date("20 Jan 2026 12:00:00 GMT").unwrap();
/// ```
pub fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    match DateTime::parse_from_rfc2822(date_str) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => {
            if date_str.contains("GMT") {
                let normalized = date_str.replace("GMT", "+0000");
                if let Ok(dt) = DateTime::parse_from_rfc2822(&normalized) {
                    return Ok(dt.with_timezone(&Utc));
                }
            }

            Err(NntpError::InvalidName(format!(
                "Invalid date format: {} (expected RFC 5322 format)",
                date_str
            )))
        }
    }
}

/// Formats a timestamp for a Date header
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

/// Parses the `date time` arguments of NEWGROUPS / NEWNEWS (RFC 3977 Section 7.3.2)
///
/// `date` is `yyyymmdd` or `yymmdd`; `time` is `hhmmss`. A two-digit year
/// resolves to the current century when it is not after the current year,
/// and to the previous century otherwise. Times are taken as UTC whether or
/// not the client sent the GMT keyword.
///
/// ```
/// use nntp_server::validation::parse_nntp_datetime;
///
/// let dt = parse_nntp_datetime("20240115", "083000").unwrap();
/// assert_eq!(dt.to_rfc3339(), "2024-01-15T08:30:00+00:00");
/// ```
pub fn parse_nntp_datetime(date: &str, time: &str) -> Result<DateTime<Utc>> {
    let invalid = || NntpError::MalformedCommand(format!("Invalid date/time: {date} {time}"));

    if !date.bytes().all(|b| b.is_ascii_digit()) || !time.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if time.len() != 6 {
        return Err(invalid());
    }

    let (year, rest) = match date.len() {
        8 => (date[..4].parse::<i32>().map_err(|_| invalid())?, &date[4..]),
        6 => {
            let yy = date[..2].parse::<i32>().map_err(|_| invalid())?;
            let current = Utc::now().year();
            let century = current - current % 100;
            let year = if century + yy <= current {
                century + yy
            } else {
                century - 100 + yy
            };
            (year, &date[2..])
        }
        _ => return Err(invalid()),
    };
    let month = rest[..2].parse::<u32>().map_err(|_| invalid())?;
    let day = rest[2..].parse::<u32>().map_err(|_| invalid())?;
    let hour = time[..2].parse::<u32>().map_err(|_| invalid())?;
    let minute = time[2..4].parse::<u32>().map_err(|_| invalid())?;
    let second = time[4..].parse::<u32>().map_err(|_| invalid())?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)?;
    Ok(NaiveDateTime::new(date, time).and_utc())
}

/// Formats a timestamp as the `yyyymmddhhmmss` argument of a 111 DATE response
pub fn format_nntp_datetime(date: &DateTime<Utc>) -> String {
    date.format("%Y%m%d%H%M%S").to_string()
}
