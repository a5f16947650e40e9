use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDate, NaiveTime, TimeZone};

use crate::models::{ViewKind, Window};

pub fn resolve_window(view: ViewKind, anchor: DateTime<FixedOffset>) -> Window {
    let date = anchor.date_naive();
    let (start, end) = match view {
        ViewKind::Day => (date, date),
        ViewKind::Week => {
            let start = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
            (start, start + Days::new(6))
        }
        ViewKind::Month => {
            let start = date - Days::new(u64::from(date.day0()));
            (start, start + Months::new(1) - Days::new(1))
        }
    };

    Window {
        start,
        end,
        offset: *anchor.offset(),
    }
}

impl Window {
    /// Calendar date of `ts` as seen from the window's offset.
    pub fn local_date(&self, ts: &DateTime<FixedOffset>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    pub fn contains(&self, ts: &DateTime<FixedOffset>) -> bool {
        let date = self.local_date(ts);
        date >= self.start && date <= self.end
    }

    pub fn start_at(&self) -> DateTime<FixedOffset> {
        self.at_local_midnight(self.start)
    }

    /// Last second of the final day.
    pub fn end_at(&self) -> DateTime<FixedOffset> {
        self.at_local_midnight(self.end + Days::new(1)) - Duration::seconds(1)
    }

    fn at_local_midnight(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        let local = date.and_time(NaiveTime::MIN);
        let utc = local - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        self.offset.from_utc_datetime(&utc)
    }
}
