use colored::*;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

pub struct RunPlan<'a> {
    pub mode: &'a str,
    pub target: &'a str,
    pub usernames: usize,
    pub passwords: usize,
    pub wait_s: u64,
    pub jitter_s: u64,
    pub estimated_minutes: f64,
}

pub fn print_plan(plan: &RunPlan<'_>) {
    println!("\n{}", "═══════════════════════════════════════".green().bold());
    println!("{}", "loginprobe run plan".green().bold());
    println!("{}", "═══════════════════════════════════════".green().bold());
    println!("{}: {}", "Mode".cyan().bold(), plan.mode);
    println!("{}: {}", "Target".cyan().bold(), plan.target);
    println!(
        "{}: {} usernames x {} passwords = {} attempts",
        "Attempts".cyan().bold(),
        plan.usernames,
        plan.passwords,
        plan.usernames * plan.passwords
    );
    println!(
        "{}: {}s + up to {}s jitter per attempt",
        "Pacing".cyan().bold(),
        plan.wait_s,
        plan.jitter_s
    );
    println!(
        "{}: {}",
        "Estimated max time".yellow().bold(),
        format_minutes(plan.estimated_minutes)
    );
}

pub fn format_minutes(minutes: f64) -> String {
    if minutes < 1.0 {
        format!("{:.0} secs", minutes * 60.0)
    } else {
        format!("{:.1} mins", minutes)
    }
}

pub fn candidates_table(candidates: &[String]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Username").add_attribute(Attribute::Bold),
        Cell::new("Password").add_attribute(Attribute::Bold),
    ]);

    for (i, candidate) in candidates.iter().enumerate() {
        let (username, password) = candidate.split_once('|').unwrap_or((candidate.as_str(), ""));
        table.add_row(vec![
            Cell::new((i + 1).to_string()),
            Cell::new(username).fg(Color::Green),
            Cell::new(password).fg(Color::Green),
        ]);
    }

    table.to_string()
}

pub fn print_candidates(candidates: &[String]) {
    if candidates.is_empty() {
        println!("\n{}", "No candidates found".yellow().bold());
        return;
    }

    println!("\n{} {}", "Candidates:".red().bold(), candidates.len().to_string().red().bold());
    println!("{}", candidates_table(candidates));
    for candidate in candidates {
        println!("{}", candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0.5), "30 secs");
        assert_eq!(format_minutes(90.0), "90.0 mins");
    }

    #[test]
    fn test_candidates_table_splits_pairs() {
        let rendered = candidates_table(&["admin|admin2026".to_string(), "ops|pa|ss".to_string()]);
        assert!(rendered.contains("admin2026"));
        assert!(rendered.contains("pa|ss"));
        assert!(rendered.contains("Username"));
    }
}
