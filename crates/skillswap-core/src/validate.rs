use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use skillswap_types::SwapError;

use crate::Result;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const SKILL_NAME_MAX_LEN: usize = 100;
pub const MIN_DURATION_MINUTES: i64 = 15;
pub const MIN_CREDIT_COST: i64 = 1;

/// Input format for request times, e.g. `2030-05-01T14:30`.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("username pattern compiles"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern compiles")
});

pub fn username(value: &str) -> Result<()> {
    let len = value.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(SwapError::InvalidUsername("must be at least 3 characters"));
    }
    if len > USERNAME_MAX_LEN {
        return Err(SwapError::InvalidUsername("must be at most 32 characters"));
    }
    if !USERNAME_RE.is_match(value) {
        return Err(SwapError::InvalidUsername(
            "only letters, numbers, underscores and hyphens are allowed",
        ));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<()> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(SwapError::InvalidEmail(value.to_string()))
    }
}

pub fn password(value: &str) -> Result<()> {
    if value.chars().count() < PASSWORD_MIN_LEN {
        return Err(SwapError::WeakPassword {
            min: PASSWORD_MIN_LEN,
        });
    }
    Ok(())
}

/// Returns the trimmed name.
pub fn skill_name(value: &str) -> Result<String> {
    let name = value.trim();
    if name.is_empty() {
        return Err(SwapError::InvalidSkillName("name cannot be empty"));
    }
    if name.chars().count() > SKILL_NAME_MAX_LEN {
        return Err(SwapError::InvalidSkillName("name must be at most 100 characters"));
    }
    Ok(name.to_string())
}

pub fn parse_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|_| SwapError::InvalidTime {
        value: value.to_string(),
        reason: "expected YYYY-MM-DDTHH:MM",
    })
}

/// Parses `value` and rejects times that are not after `now`.
pub fn future_time(value: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let time = parse_time(value)?;
    if time <= now {
        return Err(SwapError::InvalidTime {
            value: value.to_string(),
            reason: "service time must be in the future",
        });
    }
    Ok(time)
}

pub fn duration(minutes: i64) -> Result<()> {
    if minutes < MIN_DURATION_MINUTES {
        return Err(SwapError::InvalidDuration {
            min: MIN_DURATION_MINUTES,
        });
    }
    Ok(())
}

pub fn credit(cost: i64) -> Result<()> {
    if cost < MIN_CREDIT_COST {
        return Err(SwapError::InvalidCredit {
            min: MIN_CREDIT_COST,
        });
    }
    Ok(())
}

pub fn rating(value: i64) -> Result<u8> {
    match u8::try_from(value) {
        Ok(rating @ 1..=5) => Ok(rating),
        _ => Err(SwapError::InvalidRating(value)),
    }
}

/// Trims free text; blank input becomes `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn usernames() {
        assert!(username("bob").is_ok());
        assert!(username("mary-jane_42").is_ok());
        assert!(matches!(username("al"), Err(SwapError::InvalidUsername(_))));
        assert!(matches!(username("no spaces"), Err(SwapError::InvalidUsername(_))));
        assert!(matches!(username(&"x".repeat(33)), Err(SwapError::InvalidUsername(_))));
    }

    #[test]
    fn emails() {
        assert!(email("alice@example.com").is_ok());
        assert!(email("a.b+tag@sub.example.org").is_ok());
        assert!(email("alice@localhost").is_err());
        assert!(email("not-an-email").is_err());
    }

    #[test]
    fn passwords_need_eight_characters() {
        assert!(password("12345678").is_ok());
        assert!(matches!(password("1234567"), Err(SwapError::WeakPassword { min: 8 })));
    }

    #[test]
    fn skill_names_are_trimmed() {
        assert_eq!(skill_name("  Woodworking ").unwrap(), "Woodworking");
        assert!(skill_name("   ").is_err());
        assert!(skill_name(&"y".repeat(101)).is_err());
    }

    #[test]
    fn times_must_match_the_format_and_be_in_the_future() {
        let now = noon(2030, 1, 1);
        assert_eq!(
            future_time("2030-01-02T09:30", now).unwrap(),
            NaiveDate::from_ymd_opt(2030, 1, 2)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap()
        );
        assert!(matches!(
            future_time("2029-12-31T23:59", now),
            Err(SwapError::InvalidTime { reason: "service time must be in the future", .. })
        ));
        assert!(matches!(
            future_time("02/01/2030 10:00", now),
            Err(SwapError::InvalidTime { reason: "expected YYYY-MM-DDTHH:MM", .. })
        ));
    }

    #[test]
    fn ratings_outside_one_to_five_are_rejected() {
        for ok in 1..=5 {
            assert_eq!(rating(ok).unwrap(), ok as u8);
        }
        for bad in [-1, 0, 6, 256, i64::MAX] {
            assert!(matches!(rating(bad), Err(SwapError::InvalidRating(v)) if v == bad));
        }
    }

    #[test]
    fn duration_and_credit_minimums() {
        assert!(duration(15).is_ok());
        assert!(duration(14).is_err());
        assert!(credit(1).is_ok());
        assert!(credit(0).is_err());
    }

    #[test]
    fn blank_text_becomes_none() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" hi ".into())), Some("hi".into()));
        assert_eq!(optional_text(None), None);
    }
}
