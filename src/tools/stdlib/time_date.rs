//! Date functions
//!
//! Dates are numbers of days since 1 January 1960, as in SAS.

use chrono::{Datelike, Local, NaiveDate};

use crate::error::Result;
use crate::runtime::Value;
use crate::tools::{Tool, ToolRegistry};

/// Register date tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(TodayTool);
    registry.register(MdyTool);
    registry.register(YearTool);
    registry.register(MonthTool);
    registry.register(DayTool);
    registry.register(WeekdayTool);
}

/// `num_days_from_ce` of 1960-01-01
const EPOCH_DAYS_FROM_CE: i32 = 715_510;

/// Day number for a calendar date
pub fn date_value(date: NaiveDate) -> f64 {
    (date.num_days_from_ce() - EPOCH_DAYS_FROM_CE) as f64
}

/// Calendar date for a day number; `None` for missing or out of range
pub fn calendar_date(value: &Value) -> Option<NaiveDate> {
    let days = value.as_number();
    if days.is_nan() {
        return None;
    }
    let days = days.floor();
    if days.abs() > 1e7 {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(days as i32 + EPOCH_DAYS_FROM_CE)
}

fn date_part(args: &[Value], part: impl Fn(NaiveDate) -> u32) -> Value {
    calendar_date(&args[0])
        .map(|d| Value::Numeric(part(d) as f64))
        .unwrap_or_else(Value::missing)
}

/// Current date
///
/// Usage: `TODAY() -> date`
pub struct TodayTool;

impl Tool for TodayTool {
    fn name(&self) -> &str {
        "TODAY"
    }

    fn description(&self) -> &str {
        "Current date"
    }

    fn arity(&self) -> Option<usize> {
        Some(0)
    }

    fn execute(&self, _args: &[Value]) -> Result<Value> {
        Ok(Value::Numeric(date_value(Local::now().date_naive())))
    }
}

/// Date from month, day and year; invalid dates give missing
///
/// Usage: `MDY(month, day, year) -> date`
/// Example: `MDY(1, 2, 1960)` returns `1`
pub struct MdyTool;

impl Tool for MdyTool {
    fn name(&self) -> &str {
        "MDY"
    }

    fn description(&self) -> &str {
        "Date from month, day and year"
    }

    fn arity(&self) -> Option<usize> {
        Some(3)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        if args.iter().any(Value::is_missing) {
            return Ok(Value::missing());
        }
        let month = args[0].as_number() as u32;
        let day = args[1].as_number() as u32;
        let year = args[2].as_number() as i32;
        Ok(NaiveDate::from_ymd_opt(year, month, day)
            .map(|d| Value::Numeric(date_value(d)))
            .unwrap_or_else(Value::missing))
    }
}

/// Year of a date
pub struct YearTool;

impl Tool for YearTool {
    fn name(&self) -> &str {
        "YEAR"
    }

    fn description(&self) -> &str {
        "Year of a date"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(calendar_date(&args[0])
            .map(|d| Value::Numeric(d.year() as f64))
            .unwrap_or_else(Value::missing))
    }
}

/// Month of a date (1-12)
pub struct MonthTool;

impl Tool for MonthTool {
    fn name(&self) -> &str {
        "MONTH"
    }

    fn description(&self) -> &str {
        "Month of a date"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(date_part(args, |d| d.month()))
    }
}

/// Day of the month of a date
pub struct DayTool;

impl Tool for DayTool {
    fn name(&self) -> &str {
        "DAY"
    }

    fn description(&self) -> &str {
        "Day of the month of a date"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(date_part(args, |d| d.day()))
    }
}

/// Day of the week, 1 = Sunday
pub struct WeekdayTool;

impl Tool for WeekdayTool {
    fn name(&self) -> &str {
        "WEEKDAY"
    }

    fn description(&self) -> &str {
        "Day of the week (1 = Sunday)"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(date_part(args, |d| d.weekday().number_from_sunday()))
    }
}
