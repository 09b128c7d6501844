use chrono::NaiveDate;

/// Activity status derived from detector output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_active: bool,
    pub deadline: Option<NaiveDate>,
}

/// Combine a detected deadline with the current date.
///
/// No detected deadline means active: absence of evidence is not evidence
/// of expiry. A deadline falling on `today` is still active — the last day
/// to apply counts.
pub fn classify(detected: Option<NaiveDate>, today: NaiveDate) -> Classification {
    match detected {
        None => Classification {
            is_active: true,
            deadline: None,
        },
        Some(deadline) => Classification {
            is_active: deadline >= today,
            deadline: Some(deadline),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    #[test]
    fn absent_deadline_defaults_to_active() {
        let c = classify(None, today());
        assert!(c.is_active);
        assert_eq!(c.deadline, None);
    }

    #[test]
    fn deadline_yesterday_is_expired() {
        let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
        let c = classify(Some(yesterday), today());
        assert!(!c.is_active);
        assert_eq!(c.deadline, Some(yesterday));
    }

    #[test]
    fn deadline_today_is_still_active() {
        let c = classify(Some(today()), today());
        assert!(c.is_active);
    }

    #[test]
    fn future_deadline_is_active() {
        let next_month = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(classify(Some(next_month), today()).is_active);
    }
}
