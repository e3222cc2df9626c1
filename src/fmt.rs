//! Human-friendly CLI output formatters.
//!
//! Each `fmt_*` function formats one command's output for terminal display.
//! When `color` is true, ANSI escape codes are emitted via `owo_colors`.

use crate::commands::{FoodResultItem, HistoryOutput, SearchOutput, SuggestOutput, UserOutput};
use owo_colors::OwoColorize;
use std::io::{self, Write};

// ── search ──────────────────────────────────────────────────────────────────

fn fmt_item(w: &mut impl Write, item: &FoodResultItem, color: bool) -> io::Result<()> {
    let heading = match &item.measure {
        Some(measure) => format!("{} ({measure})", item.name),
        None => item.name.clone(),
    };
    let numbers = format!(
        "{:.0} kcal · {:.1}g fat · {:.1}g carbs · {:.1}g sugar · {:.0}g",
        item.calories, item.fat, item.carbs, item.sugar, item.weight
    );

    if color {
        writeln!(w, "{}  {}", heading.bold(), numbers.dimmed())?;
    } else {
        writeln!(w, "{heading}  {numbers}")?;
    }

    if !item.ingredients.is_empty() {
        writeln!(w, "  {}", item.ingredients.join(", "))?;
    }
    if !item.health_labels.is_empty() {
        let labels = item.health_labels.join(" ");
        if color {
            writeln!(w, "  {}", labels.green())?;
        } else {
            writeln!(w, "  {labels}")?;
        }
    }

    Ok(())
}

pub fn fmt_search(w: &mut impl Write, out: &SearchOutput, color: bool) -> io::Result<()> {
    if let Some(err) = &out.error {
        if color {
            writeln!(w, "{} {}", err.code.red(), err.message)?;
        } else {
            writeln!(w, "{} {}", err.code, err.message)?;
        }
        return Ok(());
    }

    for item in &out.results {
        fmt_item(w, item, color)?;
    }

    let summary = format!(
        "{} of {} results matched the filter",
        out.total_returned, out.candidates
    );
    if color {
        writeln!(w, "{}", summary.dimmed())?;
    } else {
        writeln!(w, "{summary}")?;
    }

    if !out.skipped.is_empty() {
        let note = format!("{} records skipped", out.skipped.len());
        if color {
            writeln!(w, "{}", note.yellow())?;
        } else {
            writeln!(w, "{note}")?;
        }
    }

    Ok(())
}

// ── detail ──────────────────────────────────────────────────────────────────

pub fn fmt_detail(w: &mut impl Write, item: &FoodResultItem, color: bool) -> io::Result<()> {
    fmt_item(w, item, color)?;
    writeln!(w, "  {} {}", item.food_id, item.measure_uri)?;
    Ok(())
}

// ── suggest ─────────────────────────────────────────────────────────────────

pub fn fmt_suggest(w: &mut impl Write, out: &SuggestOutput, color: bool) -> io::Result<()> {
    if out.suggestions.is_empty() {
        writeln!(w, "no suggestions")?;
        return Ok(());
    }
    for s in &out.suggestions {
        if color && out.source == "history" {
            writeln!(w, "{}", s.cyan())?;
        } else {
            writeln!(w, "{s}")?;
        }
    }
    Ok(())
}

// ── history ─────────────────────────────────────────────────────────────────

pub fn fmt_history(w: &mut impl Write, out: &HistoryOutput, color: bool) -> io::Result<()> {
    if let Some(removed) = out.removed {
        writeln!(w, "{}", if removed { "removed" } else { "not in history" })?;
    }
    // Most recent first for reading.
    for (i, term) in out.terms.iter().rev().enumerate() {
        if color {
            writeln!(w, "{} {term}", format_args!("{:>2}.", i + 1).dimmed())?;
        } else {
            writeln!(w, "{:>2}. {term}", i + 1)?;
        }
    }
    if out.terms.is_empty() {
        writeln!(w, "history is empty")?;
    }
    Ok(())
}

// ── user ────────────────────────────────────────────────────────────────────

pub fn fmt_user(w: &mut impl Write, out: &UserOutput, color: bool) -> io::Result<()> {
    let rows = [
        ("Id:", out.id.clone()),
        ("Name:", out.name.clone()),
        ("Email:", out.email.clone()),
        ("Level:", format!("{}", out.level)),
        (
            "Calories:",
            format!(
                "{:.0} / {:.0} ({:.0} left)",
                out.calories_eaten, out.calories_goal, out.remaining_calories
            ),
        ),
        ("Foods logged:", out.foods_logged.to_string()),
        ("Searches:", out.searches.join(", ")),
    ];

    for (label, value) in rows {
        if color {
            writeln!(w, "{:<16} {value}", label.bold())?;
        } else {
            writeln!(w, "{label:<16} {value}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ErrorInfo;

    fn item() -> FoodResultItem {
        FoodResultItem {
            kind: "ingredient",
            name: "Pepperoni".into(),
            measure: Some("whole".into()),
            food_id: "food_1".into(),
            measure_uri: "uri#whole".into(),
            weight: 2.0,
            calories: 9.0,
            fat: 0.87,
            carbs: 0.0,
            sugar: 0.0,
            health_labels: vec!["GLUTEN_FREE".into()],
            ingredients: Vec::new(),
        }
    }

    #[test]
    fn test_fmt_search_plain() {
        let out = SearchOutput {
            term: "pepperoni".into(),
            results: vec![item()],
            total_returned: 1,
            candidates: 2,
            skipped: Vec::new(),
            error: None,
        };
        let mut buf = Vec::new();
        fmt_search(&mut buf, &out, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Pepperoni (whole)  9 kcal"));
        assert!(text.contains("GLUTEN_FREE"));
        assert!(text.contains("1 of 2 results"));
    }

    #[test]
    fn test_fmt_search_error() {
        let out = SearchOutput {
            term: "x".into(),
            results: Vec::new(),
            total_returned: 0,
            candidates: 0,
            skipped: Vec::new(),
            error: Some(ErrorInfo {
                code: "REMOTE_UNAVAILABLE",
                message: "down".into(),
            }),
        };
        let mut buf = Vec::new();
        fmt_search(&mut buf, &out, false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "REMOTE_UNAVAILABLE down\n");
    }

    #[test]
    fn test_fmt_history_most_recent_first() {
        let out = HistoryOutput {
            terms: vec!["beef".into(), "egg".into()],
            removed: None,
        };
        let mut buf = Vec::new();
        fmt_history(&mut buf, &out, false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), " 1. egg\n 2. beef\n");
    }
}
