//! Terminal rendering of the dashboard view and notifications.

use colored::*;
use lib_dashboard::core::{ConnectionState, DashboardView, Notification, NotificationLevel, OrderEvent};

pub fn connection(state: ConnectionState) -> ColoredString {
    match state {
        ConnectionState::Connected => "● Connected".green().bold(),
        ConnectionState::Connecting => "● Connecting".yellow().bold(),
        ConnectionState::Disconnected => "● Disconnected".red().bold(),
    }
}

pub fn notification(note: &Notification) -> String {
    let tag = match note.level {
        NotificationLevel::Success => "[ok]".green(),
        NotificationLevel::Info => "[..]".cyan(),
        NotificationLevel::Warning => "[!!]".yellow(),
        NotificationLevel::Error => "[xx]".red(),
    };
    format!("{} {}", tag, note.message)
}

/// One line for the status bar.
pub fn summary(view: &DashboardView) -> String {
    let stats = &view.statistics;
    format!(
        "{}  orders {}  avg ${:.2}  revenue ${:.2}  success {:.1}%",
        connection(view.connection),
        stats.total_orders,
        stats.running_average,
        stats.total_revenue,
        stats.success_rate()
    )
}

/// Full panel: statistics block followed by recent orders, newest first.
pub fn dashboard(view: &DashboardView) -> String {
    let stats = &view.statistics;
    let mut out = String::new();

    out.push_str(&format!("{}  {}\n", "Order Pipeline Dashboard".bold(), connection(view.connection)));
    out.push_str(&format!("  Total Orders     {}\n", stats.total_orders));
    out.push_str(&format!("  Running Average  ${:.2}\n", stats.running_average));
    out.push_str(&format!("  Total Revenue    ${:.2}\n", stats.total_revenue));
    out.push_str(&format!("  Successful       {}\n", stats.successful_orders.to_string().green()));
    out.push_str(&format!("  Failed           {}\n", stats.failed_orders.to_string().red()));
    out.push_str(&format!("  Success Rate     {:.1}%\n", stats.success_rate()));

    out.push_str(&format!("{}\n", "Recent Orders".bold()));
    if view.orders.is_empty() {
        out.push_str(&format!("  {}\n", "No orders yet".dimmed()));
    }
    for event in &view.orders {
        out.push_str("  ");
        out.push_str(&order_line(event));
        out.push('\n');
    }
    out
}

fn order_line(event: &OrderEvent) -> String {
    let status = if event.is_success() {
        "SUCCESS".green()
    } else {
        "FAILED".red()
    };
    let mut line = format!("{}... {:<12}", event.short_id(), event.product_name);
    if let Some(quantity) = event.quantity {
        line.push_str(&format!(" x{quantity:<3}"));
    }
    if let Some(price) = event.price {
        line.push_str(&format!(" ${price:>9.2}"));
    }
    line.push_str(&format!(" {status}"));
    if let Some(reason) = &event.reason {
        line.push_str(&format!(" ({})", reason.dimmed()));
    }
    line
}
