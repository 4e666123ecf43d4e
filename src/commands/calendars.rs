use anyhow::Result;
use owo_colors::OwoColorize;
use timecal_core::store::AppleScriptCalendar;
use timecal_core::summary::RemindersApp;

pub async fn run() -> Result<()> {
    let calendar = AppleScriptCalendar::default();
    let reminders = RemindersApp::default();
    let (calendars, lists) = tokio::join!(calendar.list_calendars(), reminders.list_names());

    println!("{}", "Calendars".bold());
    print_names(calendars?);

    println!("\n{}", "Reminder lists".bold());
    match lists {
        Ok(lists) => print_names(lists),
        Err(e) => println!("   {}", e.to_string().red()),
    }

    Ok(())
}

fn print_names(names: Vec<String>) {
    if names.is_empty() {
        println!("   {}", "(none)".dimmed());
    }
    for name in names {
        println!("   📅 {name}");
    }
}
