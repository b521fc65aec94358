// Colored terminal output for word scores, clusters and query counts.
//
// main.rs delegates all terminal formatting here.

use colored::Colorize;

use crate::cluster::ClusterAssignment;
use crate::query::Occurrences;
use crate::scoring::classifier::ClassifierReport;
use crate::scoring::{bottom_words, top_words, CategoryScores};

/// Display the strongest words of every category.
pub fn display_top_words(title: &str, scores: &CategoryScores, n: usize) {
    println!("\n{}", format!("=== {title} ===").bold());
    if scores.is_empty() {
        println!("  {}", "No categories scored.".dimmed());
        return;
    }

    for (cat, words) in scores {
        println!("\n  {} {}", cat.to_string().bold(), format!("({} words)", words.len()).dimmed());
        let top = top_words(words, n);
        if top.is_empty() {
            println!("    {}", "(no relevant words)".dimmed());
        }
        for (word, score) in top.iter().filter(|(_, s)| *s > 0.0) {
            println!("    {:<28} {:>8}", word, format!("{score:.4}").green());
        }
        for (word, score) in bottom_words(words, n.div_ceil(4)) {
            println!("    {:<28} {:>8}", word, format!("{score:.4}").red());
        }
    }
}

/// Summarize the clustering fallback's result.
pub fn display_cluster_summary(assignment: &ClusterAssignment) {
    let noise = assignment.noise_count();
    println!(
        "\n  Got {} clusters + {} samples considered noise",
        assignment.n_clusters().to_string().bold(),
        if noise > 0 {
            noise.to_string().yellow()
        } else {
            noise.to_string().normal()
        }
    );
}

/// Display classification accuracy (and F1 for multiclass problems).
pub fn display_classifier_report(report: &ClassifierReport) {
    println!(
        "\n  Classifier trained on {} documents, evaluated on {}",
        report.n_train, report.n_test
    );
    if let (Some(micro), Some(macro_)) = (report.f1_micro, report.f1_macro) {
        println!("  F1 micro-avg: {micro:.3}, F1 macro-avg: {macro_:.3}");
    }
    let acc = format!("{:.3}", report.accuracy);
    let acc = if report.accuracy >= 0.8 {
        acc.green()
    } else if report.accuracy >= 0.5 {
        acc.yellow()
    } else {
        acc.red()
    };
    println!("  Accuracy: {acc}");
}

/// Display a query x category table of occurrence fractions.
pub fn display_occurrences(results: &Occurrences) {
    let Some(first) = results.values().next() else {
        println!("  {}", "No queries to check.".dimmed());
        return;
    };
    let categories: Vec<String> = first.keys().map(|c| c.to_string()).collect();

    println!("\n{}", "=== Query occurrences ===".bold());
    print!("  {:<28}", "Query".dimmed());
    for cat in &categories {
        print!(" {:>12}", truncate(cat, 12).dimmed());
    }
    println!();
    println!("  {}", "-".repeat(28 + 13 * categories.len()).dimmed());

    for (query, per_category) in results {
        print!("  {:<28}", truncate(query, 28));
        for fraction in per_category.values() {
            print!(" {:>12.3}", fraction);
        }
        println!();
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 12), "short");
        assert_eq!(truncate("éééééééééééééé", 6), "ééé...");
    }
}
