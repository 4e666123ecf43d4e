//! Reminders.app access.
//!
//! Each reminder list is queried by its own script, concurrently. The lists
//! are disjoint and only read, and results are merged after every task has
//! finished; order does not matter since reminders are grouped by status.

use std::fmt;

use tokio::task::JoinSet;

use crate::date_range::DateRange;
use crate::error::TimecalResult;
use crate::osascript::{FLATTEN_HANDLER, Osascript, ScriptLines, day_bound_statements, quote};

/// due|name|list|status|priority|body
const REMINDER_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStatus {
    /// Not completed and due on or before the end of the range
    Overdue,
    /// Completed and due within the range
    Completed,
}

impl ReminderStatus {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "Overdue" => Some(ReminderStatus::Overdue),
            "Completed" => Some(ReminderStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub due: String,
    pub name: String,
    pub list: String,
    pub status: ReminderStatus,
    /// Reminders.app priority: 0 none, 1 high, 5 medium, 9 low
    pub priority: u8,
    pub body: String,
}

impl Reminder {
    pub fn priority_marker(&self) -> &'static str {
        match self.priority {
            1..=4 => "🔴",
            5 => "🟡",
            6..=9 => "🟢",
            _ => "",
        }
    }
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.name, self.list)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RemindersApp {
    osascript: Osascript,
}

impl RemindersApp {
    pub fn new(osascript: Osascript) -> Self {
        RemindersApp { osascript }
    }

    /// Names of every reminder list, with their reminder counts.
    pub async fn list_names(&self) -> TimecalResult<Vec<String>> {
        let script = r#"
tell application "Reminders"
    set output to ""
    repeat with reminderList in (every list)
        set output to output & (name of reminderList) & " (" & (count of reminders of reminderList) & " reminders)" & linefeed
    end repeat
    return output
end tell
"#;
        let output = self.osascript.run(script).await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Overdue and completed reminders of the given lists.
    ///
    /// A list that fails is logged and contributes nothing.
    pub async fn fetch(&self, lists: &[String], range: &DateRange) -> Vec<Reminder> {
        let mut tasks = JoinSet::new();

        for list in lists {
            let osascript = self.osascript.clone();
            let list = list.clone();
            let script = reminder_script(&list, range);
            tasks.spawn(async move {
                let result = osascript.run(&script).await;
                (list, result)
            });
        }

        let mut reminders = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((list, Ok(output))) => {
                    let lines = ScriptLines::parse(&output, REMINDER_FIELDS);
                    lines.log_diagnostics("reminders");
                    let parsed = parse_reminders(&lines);
                    tracing::info!(list = %list, count = parsed.len(), "fetched reminders");
                    reminders.extend(parsed);
                }
                Ok((list, Err(e))) => tracing::warn!(list = %list, "could not read reminders: {e}"),
                Err(e) => tracing::warn!("reminder task failed: {e}"),
            }
        }

        reminders
    }
}

fn reminder_script(list: &str, range: &DateRange) -> String {
    format!(
        r#"{FLATTEN_HANDLER}
on pad(n)
    return text -2 thru -1 of ("0" & (n as text))
end pad

on reminderLine(rem, listName, reminderStatus)
    tell application "Reminders"
        set {{reminderName, reminderDue, reminderPriority, reminderBody}} to {{name, due date, priority, body}} of rem
    end tell
    set dueStr to ((year of reminderDue) as text) & "-" & my pad((month of reminderDue) as integer) & "-" & my pad(day of reminderDue) & " " & my pad(hours of reminderDue) & ":" & my pad(minutes of reminderDue)
    return dueStr & "|" & my flatten(reminderName) & "|" & my flatten(listName) & "|" & reminderStatus & "|" & reminderPriority & "|" & my flatten(reminderBody)
end reminderLine

{start}{end}
set output to ""
tell application "Reminders"
    try
        set currentList to list {list}
    on error errMsg
        return "ERROR accessing list " & {list} & ": " & errMsg
    end try
    repeat with rem in (reminders in currentList whose completed is false and due date is less than or equal to endDate)
        set output to output & my reminderLine(rem, {list}, "Overdue") & linefeed
    end repeat
    repeat with rem in (reminders in currentList whose completed is true and due date is greater than or equal to startDate and due date is less than or equal to endDate)
        set output to output & my reminderLine(rem, {list}, "Completed") & linefeed
    end repeat
end tell
return output
"#,
        start = day_bound_statements("startDate", range.from, false),
        end = day_bound_statements("endDate", range.to, true),
        list = quote(list),
    )
}

pub fn parse_reminders(lines: &ScriptLines) -> Vec<Reminder> {
    lines
        .records
        .iter()
        .filter_map(|record| {
            let [due, name, list, status, priority, body] = record.as_slice() else {
                return None;
            };
            let Some(status) = ReminderStatus::parse(status) else {
                tracing::warn!("unknown reminder status '{status}' for '{name}'");
                return None;
            };
            Some(Reminder {
                due: due.clone(),
                name: name.clone(),
                list: list.clone(),
                status,
                priority: priority.trim().parse().unwrap_or(0),
                body: body.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_reminders() {
        let output = "\
2025-07-30 00:00|HKU Position|Personal|Overdue|1|
2025-07-30 18:00|Leetcode|Growth|Completed|0|two problems
ERROR accessing list Trash: Can't get list
2025-07-30 18:00|Mystery|Growth|Snoozed|0|";

        let lines = ScriptLines::parse(output, REMINDER_FIELDS);
        let reminders = parse_reminders(&lines);

        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].status, ReminderStatus::Overdue);
        assert_eq!(reminders[0].priority_marker(), "🔴");
        assert_eq!(reminders[1].status, ReminderStatus::Completed);
        assert_eq!(reminders[1].body, "two problems");
        assert_eq!(reminders[1].to_string(), "Leetcode | Growth");
        assert_eq!(lines.diagnostics.len(), 1);
    }

    #[test]
    fn test_parse_reminder_with_pipe_in_name() {
        let lines = ScriptLines::parse("2025-07-30 09:00|Call A ¦ B|Personal|Overdue|5|", REMINDER_FIELDS);
        let reminders = parse_reminders(&lines);
        assert_eq!(reminders[0].name, "Call A | B");
        assert_eq!(reminders[0].list, "Personal");
        assert_eq!(reminders[0].priority_marker(), "🟡");
    }

    #[test]
    fn test_reminder_script_targets_one_list() {
        let range = DateRange::day(NaiveDate::from_ymd_opt(2025, 7, 30).unwrap());
        let script = reminder_script("Side \"Projects\"", &range);
        assert!(script.contains(r#"set currentList to list "Side \"Projects\"""#));
        assert!(script.contains("set hours of endDate to 23"));
    }

    #[tokio::test]
    async fn test_fetch_without_lists_is_empty() {
        let range = DateRange::day(NaiveDate::from_ymd_opt(2025, 7, 30).unwrap());
        assert!(RemindersApp::default().fetch(&[], &range).await.is_empty());
    }
}
